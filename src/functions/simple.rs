use serde_json::{Map, Value};

use crate::error::Result;
use crate::parameters::Parameter;

use super::{load_as, KEY_PARAMETERS};

/// An ordered list of parameters, the storage behind every leaf function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleFunction {
    parameters: Vec<Parameter>,
}

impl SimpleFunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` unconstrained parameters.
    pub fn with_count(count: usize) -> Self {
        Self {
            parameters: vec![Parameter::new(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Grow or shrink to `count` parameters; new ones are unconstrained.
    pub fn set_parameter_count(&mut self, count: usize) {
        self.parameters.resize(count, Parameter::new());
    }

    pub fn parameter_at(&self, i: usize) -> &Parameter {
        &self.parameters[i]
    }

    pub fn parameter_at_mut(&mut self, i: usize) -> &mut Parameter {
        &mut self.parameters[i]
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// `par_values[i]` when an override vector is given, else the stored value.
    #[inline]
    pub fn par_value(&self, i: usize, par_values: Option<&[f64]>) -> f64 {
        match par_values {
            Some(values) => values[i],
            None => self.parameters[i].value(),
        }
    }

    /// Store a value with zero error.
    pub fn set_value(&mut self, i: usize, value: f64) {
        self.parameters[i].set_value(value, 0.0);
    }

    pub(crate) fn save_json(&self, obj: &mut Map<String, Value>) {
        let params = self
            .parameters
            .iter()
            .map(|p| serde_json::to_value(p).unwrap_or(Value::Null))
            .collect();
        obj.insert(KEY_PARAMETERS.to_string(), Value::Array(params));
    }

    pub(crate) fn load_json(&mut self, obj: &Map<String, Value>) -> Result<()> {
        self.parameters = load_as(obj, KEY_PARAMETERS)?;
        Ok(())
    }
}
