use serde_json::{Map, Value};

use crate::error::Result;
use crate::parameters::Parameter;

use super::{load_as, load_key, AnyFunction, Function, FunctionType, KEY_TYPE};

const KEY_FUNCTION_COUNT: &str = "function count";

/// A sum of functions over one concatenated parameter vector.
///
/// Sub-function `k` owns the slice of the vector starting right after the
/// parameters of sub-functions `0..k`.
///
/// # Examples
///
/// ```
/// use peakfit_rs::functions::{Function, PeakFunction, PeakType, Polynom, SumFunctions};
///
/// let mut sum = SumFunctions::new();
/// sum.add_function(Polynom::new(1));
/// sum.add_function(PeakFunction::new(PeakType::Gaussian));
/// assert_eq!(sum.parameter_count(), 2 + 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SumFunctions {
    functions: Vec<AnyFunction>,
    /// Per aggregate parameter index: (sub-function index, first index of
    /// that sub-function's slice).
    owners: Vec<(usize, usize)>,
}

impl SumFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sub-function; its parameters go to the end of the vector.
    pub fn add_function(&mut self, f: impl Into<AnyFunction>) {
        let f = f.into();
        let index = self.functions.len();
        let first = self.owners.len();
        for _ in 0..f.parameter_count() {
            self.owners.push((index, first));
        }
        self.functions.push(f);
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn function_at(&self, i: usize) -> &AnyFunction {
        &self.functions[i]
    }

    pub fn functions(&self) -> &[AnyFunction] {
        &self.functions
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(KEY_TYPE.to_string(), FunctionType::Sum.tag().into());
        obj.insert(KEY_FUNCTION_COUNT.to_string(), self.functions.len().into());
        for (i, f) in self.functions.iter().enumerate() {
            obj.insert(format!("f{}", i + 1), f.to_json());
        }
        Value::Object(obj)
    }

    /// Append the persisted sub-functions.
    ///
    /// On error the sub-functions loaded so far are kept.
    ///
    /// # Panics
    ///
    /// Panics unless the sum is empty.
    pub(crate) fn load_json(&mut self, obj: &Map<String, Value>) -> Result<()> {
        assert!(self.functions.is_empty(), "loading into a non-empty sum of functions");

        let count: usize = load_as(obj, KEY_FUNCTION_COUNT)?;
        for i in 1..=count {
            let key = format!("f{}", i);
            let f = AnyFunction::from_json(load_key(obj, &key)?)?;
            self.add_function(f);
        }
        Ok(())
    }

    fn owner(&self, par_index: usize) -> (usize, usize) {
        let (f, first) = self.owners[par_index];
        debug_assert!(first <= par_index);
        (f, first)
    }
}

impl Function for SumFunctions {
    fn parameter_count(&self) -> usize {
        self.owners.len()
    }

    fn parameter_at(&self, i: usize) -> &Parameter {
        let (f, first) = self.owner(i);
        self.functions[f].parameter_at(i - first)
    }

    fn parameter_at_mut(&mut self, i: usize) -> &mut Parameter {
        let (f, first) = self.owner(i);
        self.functions[f].parameter_at_mut(i - first)
    }

    fn y(&self, x: f64, par_values: Option<&[f64]>) -> f64 {
        let mut sum = 0.0;
        let mut offset = 0;
        for f in &self.functions {
            let count = f.parameter_count();
            sum += f.y(x, par_values.map(|p| &p[offset..offset + count]));
            offset += count;
        }
        sum
    }

    fn dy(&self, x: f64, par_index: usize, par_values: Option<&[f64]>) -> f64 {
        let (index, first) = self.owner(par_index);
        let f = &self.functions[index];
        let count = f.parameter_count();
        f.dy(x, par_index - first, par_values.map(|p| &p[first..first + count]))
    }

    fn reset(&mut self) {
        for f in &mut self.functions {
            f.reset();
        }
    }
}
