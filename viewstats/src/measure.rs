// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Measures name the quantities that get recorded. Views subscribe to them by name.

use std::{fmt, hash::Hash, sync::Arc};

/// Unit for counts and other dimensionless values
pub const UNIT_DIMENSIONLESS: &str = "1";
/// Unit for sizes in bytes
pub const UNIT_BYTES: &str = "By";
/// Unit for durations in milliseconds
pub const UNIT_MILLISECONDS: &str = "ms";

/// Whether a measure carries whole numbers or floating point values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    /// 64-bit integers. Recorded values are truncated toward zero.
    Int64,
    /// 64-bit floats
    Float64,
}

#[derive(Debug)]
struct MeasureInner {
    name: String,
    description: String,
    unit: String,
    kind: MeasureKind,
}

/// A named quantity such as request latency or payload size.
///
/// Two measures are the same measure if they have the same name.
///
/// ```
/// use viewstats::{Measure, UNIT_MILLISECONDS};
///
/// let latency = Measure::float64("rpc/latency", "RPC latency", UNIT_MILLISECONDS);
/// let m = latency.m(12.5);
/// assert_eq!(m.value(), 12.5);
/// ```
#[derive(Clone)]
pub struct Measure(Arc<MeasureInner>);

impl Measure {
    fn new(name: &str, description: &str, unit: &str, kind: MeasureKind) -> Self {
        Self(Arc::new(MeasureInner {
            name: name.to_owned(),
            description: description.to_owned(),
            unit: unit.to_owned(),
            kind,
        }))
    }

    /// A measure of whole numbers
    pub fn int64(name: &str, description: &str, unit: &str) -> Self {
        Self::new(name, description, unit, MeasureKind::Int64)
    }

    /// A measure of floating point values
    pub fn float64(name: &str, description: &str, unit: &str) -> Self {
        Self::new(name, description, unit, MeasureKind::Float64)
    }

    /// The measure name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The measure description
    pub fn description(&self) -> &str {
        &self.0.description
    }

    /// The measure unit
    pub fn unit(&self) -> &str {
        &self.0.unit
    }

    /// The value kind
    pub fn kind(&self) -> MeasureKind {
        self.0.kind
    }

    /// Pair `value` with this measure so it can be recorded.
    pub fn m(&self, value: f64) -> Measurement {
        let value = match self.0.kind {
            MeasureKind::Int64 => value.trunc(),
            MeasureKind::Float64 => value,
        };
        Measurement {
            measure: self.clone(),
            value,
        }
    }
}

impl PartialEq for Measure {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Measure {}

impl Hash for Measure {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Measure")
            .field("name", &self.0.name)
            .field("unit", &self.0.unit)
            .field("kind", &self.0.kind)
            .finish()
    }
}

/// A value recorded against a measure
#[derive(Debug, Clone)]
pub struct Measurement {
    measure: Measure,
    value: f64,
}

impl Measurement {
    /// The measure this value belongs to
    pub fn measure(&self) -> &Measure {
        &self.measure
    }

    /// The recorded value
    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::{Measure, UNIT_BYTES, UNIT_DIMENSIONLESS};

    #[test]
    fn identity_is_the_name() {
        let a = Measure::int64("size", "request size", UNIT_BYTES);
        let b = Measure::int64("size", "something else", UNIT_DIMENSIONLESS);
        let c = Measure::int64("other", "request size", UNIT_BYTES);
        check!(a == b);
        check!(a != c);
    }

    #[test]
    fn int_measurements_truncate() {
        let m = Measure::int64("n", "", UNIT_DIMENSIONLESS);
        check!(m.m(2.9).value() == 2.0);
        check!(m.m(-2.9).value() == -2.0);
        let f = Measure::float64("f", "", UNIT_DIMENSIONLESS);
        check!(f.m(2.9).value() == 2.9);
    }
}
