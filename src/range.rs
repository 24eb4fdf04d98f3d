//! Closed real intervals and ordered sets of them.
//!
//! A [`Range`] is `[min, max]` with an explicit "not set yet" state, so that an
//! empty accumulator can be told apart from a degenerate single-point interval.
//! [`Ranges`] keeps a sorted, non-overlapping list, as used for background
//! regions of a diffractogram.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::f64::{INFINITY, NAN, NEG_INFINITY};

/// A closed interval `[min, max]`.
///
/// Both endpoints are NaN while the range is invalid (nothing recorded yet).
#[derive(Debug, Clone, Copy)]
pub struct Range {
    /// Lower endpoint (inclusive)
    pub min: f64,

    /// Upper endpoint (inclusive)
    pub max: f64,
}

impl Default for Range {
    fn default() -> Self {
        Self::invalid()
    }
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_valid(), other.is_valid()) {
            (false, false) => true,
            (true, true) => self.min == other.min && self.max == other.max,
            _ => false,
        }
    }
}

impl Range {
    /// Create a range from ordered endpoints.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`. Use [`Range::safe_from`] for unordered input.
    ///
    /// # Examples
    ///
    /// ```
    /// use peakfit_rs::Range;
    ///
    /// let r = Range::new(2.0, 42.0);
    /// assert!(r.contains(2.0));
    /// assert!(r.contains(42.0));
    /// assert_eq!(r.width(), 40.0);
    /// ```
    pub fn new(min: f64, max: f64) -> Self {
        assert!(!(min > max), "invalid range: min ({}) > max ({})", min, max);
        Self { min, max }
    }

    /// The range that contains nothing, not even a point.
    pub fn invalid() -> Self {
        Self { min: NAN, max: NAN }
    }

    /// A degenerate range holding exactly one value.
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// The range `(-∞, +∞)`.
    pub fn infinite() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }

    /// Create a range from endpoints given in either order.
    pub fn safe_from(a: f64, b: f64) -> Self {
        if a > b {
            Self { min: b, max: a }
        } else {
            Self { min: a, max: b }
        }
    }

    /// Set both endpoints.
    pub fn set(&mut self, min: f64, max: f64) {
        *self = Self::new(min, max);
    }

    /// Set both endpoints, ordering them first.
    pub fn safe_set(&mut self, a: f64, b: f64) {
        *self = Self::safe_from(a, b);
    }

    /// Forget both endpoints.
    pub fn invalidate(&mut self) {
        *self = Self::invalid();
    }

    /// Whether endpoints have been set.
    pub fn is_valid(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan()
    }

    /// Invalid, or without any interior.
    pub fn is_empty(&self) -> bool {
        !self.is_valid() || self.min >= self.max
    }

    pub fn width(&self) -> f64 {
        if self.is_valid() {
            self.max - self.min
        } else {
            NAN
        }
    }

    pub fn center(&self) -> f64 {
        if self.is_valid() {
            (self.min + self.max) / 2.0
        } else {
            NAN
        }
    }

    /// Grow the range to include `value`. An invalid range becomes a point.
    pub fn extend_by(&mut self, value: f64) {
        if self.is_valid() {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        } else {
            *self = Self::point(value);
        }
    }

    /// Grow the range to include `that`. Invalid input is ignored.
    pub fn extend(&mut self, that: &Range) {
        if that.is_valid() {
            self.extend_by(that.min);
            self.extend_by(that.max);
        }
    }

    /// Whether `value` lies in `[min, max]`; never true for an invalid range.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Whether `that` lies completely inside this range.
    pub fn contains_range(&self, that: &Range) -> bool {
        self.min <= that.min && that.max <= self.max
    }

    /// Whether the two ranges share at least one point.
    pub fn intersects(&self, that: &Range) -> bool {
        self.min <= that.max && that.min <= self.max
    }

    /// The common part of both ranges, invalid if they are disjoint.
    pub fn intersect(&self, that: &Range) -> Range {
        if !self.intersects(that) {
            return Self::invalid();
        }
        Self::new(self.min.max(that.min), self.max.min(that.max))
    }

    /// Clamp `value` into the range. An invalid range leaves it unchanged.
    pub fn bound(&self, value: f64) -> f64 {
        if !self.is_valid() {
            return value;
        }
        value.max(self.min).min(self.max)
    }
}

fn finite_or_null(value: f64) -> Option<f64> {
    if value.is_infinite() {
        None
    } else {
        Some(value)
    }
}

impl Serialize for Range {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if !self.is_valid() {
            return serializer.serialize_map(Some(0))?.end();
        }

        // Infinite endpoints are written as null
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("min", &finite_or_null(self.min))?;
        map.serialize_entry("max", &finite_or_null(self.max))?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Outer Option: key present; inner Option: null means infinite
        fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<f64>::deserialize(deserializer).map(Some)
        }

        #[derive(Deserialize)]
        struct RangeHelper {
            #[serde(default, deserialize_with = "present")]
            min: Option<Option<f64>>,

            #[serde(default, deserialize_with = "present")]
            max: Option<Option<f64>>,
        }

        let helper = RangeHelper::deserialize(deserializer)?;
        match (helper.min, helper.max) {
            (None, None) => Ok(Range::invalid()),
            (Some(min), Some(max)) => {
                let min = min.unwrap_or(NEG_INFINITY);
                let max = max.unwrap_or(INFINITY);
                if min > max {
                    return Err(D::Error::custom(format!(
                        "range min ({}) must not exceed max ({})",
                        min, max
                    )));
                }
                Ok(Range { min, max })
            }
            _ => Err(D::Error::custom("range needs both 'min' and 'max'")),
        }
    }
}

/// A sorted list of non-overlapping ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Range>", into = "Vec<Range>")]
pub struct Ranges {
    ranges: Vec<Range>,
}

impl From<Vec<Range>> for Ranges {
    fn from(ranges: Vec<Range>) -> Self {
        let mut result = Ranges::new();
        for range in ranges {
            result.add(range);
        }
        result
    }
}

impl From<Ranges> for Vec<Range> {
    fn from(ranges: Ranges) -> Self {
        ranges.ranges
    }
}

impl Ranges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn at(&self, i: usize) -> &Range {
        &self.ranges[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Range> {
        self.ranges.iter()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Add a range, merging it with every member it overlaps.
    ///
    /// Returns `false` if nothing changed, i.e. the range was invalid or
    /// already covered by a single member.
    pub fn add(&mut self, range: Range) -> bool {
        if !range.is_valid() {
            return false;
        }

        let mut merged = range;
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for r in &self.ranges {
            if r.contains_range(&range) {
                return false;
            }
            if range.contains_range(r) {
                continue;
            }
            if range.contains(r.min) {
                merged.max = r.max;
            } else if range.contains(r.max) {
                merged.min = r.min;
            } else {
                kept.push(*r);
            }
        }

        kept.push(merged);
        kept.sort_by(|a, b| a.min.total_cmp(&b.min));
        self.ranges = kept;
        true
    }

    /// Remove `range` from the set, splitting members where needed.
    ///
    /// Returns whether any member was touched.
    pub fn rem(&mut self, range: Range) -> bool {
        let mut changed = false;
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for r in &self.ranges {
            if r.intersects(&range) {
                changed = true;
                if r.min < range.min {
                    kept.push(Range::new(r.min, range.min));
                }
                if r.max > range.max {
                    kept.push(Range::new(range.max, r.max));
                }
            } else {
                kept.push(*r);
            }
        }

        if changed {
            self.ranges = kept;
        }
        changed
    }
}

impl<'a> IntoIterator for &'a Ranges {
    type Item = &'a Range;
    type IntoIter = std::slice::Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
