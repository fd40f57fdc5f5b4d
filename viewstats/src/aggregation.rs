// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! How a view summarizes the values recorded for each of its rows.

use std::time::SystemTime;

use crate::{
    data::{AggregationData, CountData, DistributionData, LastValueData, SumData},
    error::ViewError,
};

/// The aggregation a view applies to its measure.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Number of recorded values, regardless of what they are
    Count,
    /// Running total of recorded values
    Sum,
    /// Most recently recorded value
    LastValue,
    /// Histogram over `bounds` plus running mean, variance, min and max.
    ///
    /// Bucket `i` holds values `v` with `bounds[i - 1] < v <= bounds[i]`. The first bucket has
    /// no lower bound and the last has no upper bound, so there are `bounds.len() + 1` buckets.
    Distribution {
        /// Bucket upper bounds
        bounds: Vec<f64>,
    },
}

impl Aggregation {
    /// A distribution with the given bucket bounds.
    ///
    /// The bounds are cleaned up when the view is registered: they are sorted, zero and
    /// duplicate bounds are dropped, and negative bounds fail registration.
    pub fn distribution(bounds: impl IntoIterator<Item = f64>) -> Self {
        Self::Distribution {
            bounds: bounds.into_iter().collect(),
        }
    }

    /// Short lowercase name of the aggregation kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::LastValue => "last_value",
            Self::Distribution { .. } => "distribution",
        }
    }

    /// Returns the registration-ready form of this aggregation.
    ///
    /// `view` is only used to name the offending view in errors.
    pub fn normalized(&self, view: &str) -> Result<Self, ViewError> {
        let Self::Distribution { bounds } = self else {
            return Ok(self.clone());
        };
        if bounds.iter().any(|b| b.is_nan()) {
            return Err(ViewError::InvalidBucketBounds { view: view.into() });
        }
        if bounds.iter().any(|b| *b < 0.0) {
            return Err(ViewError::NegativeBucketBounds { view: view.into() });
        }
        let mut bounds: Vec<f64> = bounds.iter().copied().filter(|b| *b > 0.0).collect();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();
        Ok(Self::Distribution { bounds })
    }

    /// Fresh accumulator state for a row created at `start`.
    pub(crate) fn new_data(&self, start: SystemTime) -> AggregationData {
        match self {
            Self::Count => AggregationData::Count(CountData { value: 0 }),
            Self::Sum => AggregationData::Sum(SumData { value: 0.0, start }),
            Self::LastValue => AggregationData::LastValue(LastValueData { value: 0.0 }),
            Self::Distribution { bounds } => {
                AggregationData::Distribution(DistributionData::new(bounds, start))
            }
        }
    }
}
