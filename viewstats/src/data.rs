// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Running statistics kept for each row of a view.
//!
//! Every accumulator updates in constant memory. Samples are folded in as they arrive and then
//! forgotten, apart from the most recent exemplar per distribution bucket.

use std::{collections::BTreeMap, sync::Arc, time::SystemTime};

/// Key/value annotations attached to a recording, kept on distribution exemplars.
pub type Attachments = BTreeMap<String, String>;

/// A representative sample retained for a distribution bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Exemplar {
    /// The sampled value
    pub value: f64,
    /// Attachments recorded with the sample
    pub attachments: Attachments,
    /// When the sample was recorded
    pub timestamp: SystemTime,
}

/// Number of values recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountData {
    /// The count
    pub value: i64,
}

/// Running total of recorded values
#[derive(Debug, Clone, PartialEq)]
pub struct SumData {
    /// The total
    pub value: f64,
    /// Time of the first recorded value
    pub start: SystemTime,
}

/// The most recently recorded value
#[derive(Debug, Clone, PartialEq)]
pub struct LastValueData {
    /// The value
    pub value: f64,
}

/// Histogram plus summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionData {
    /// Number of recorded values
    pub count: i64,
    /// Smallest recorded value
    pub min: f64,
    /// Largest recorded value
    pub max: f64,
    /// Mean of recorded values
    pub mean: f64,
    /// Sum of squared deviations from the mean
    pub sum_of_squared_dev: f64,
    /// Non-cumulative count per bucket, one more entry than there are bounds
    pub count_per_bucket: Vec<i64>,
    /// Most recent sample per bucket that carried attachments
    pub exemplars_per_bucket: Vec<Option<Exemplar>>,
    /// Bucket upper bounds, shared with the view
    pub bounds: Arc<[f64]>,
    /// Time of the first recorded value
    pub start: SystemTime,
}

impl DistributionData {
    pub(crate) fn new(bounds: &[f64], start: SystemTime) -> Self {
        Self {
            count: 0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            sum_of_squared_dev: 0.0,
            count_per_bucket: vec![0; bounds.len() + 1],
            exemplars_per_bucket: vec![None; bounds.len() + 1],
            bounds: bounds.into(),
            start,
        }
    }

    /// Sum of recorded values
    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    /// Sample variance, 0 when fewer than two values were recorded
    pub fn variance(&self) -> f64 {
        if self.count <= 1 {
            0.0
        } else {
            self.sum_of_squared_dev / (self.count - 1) as f64
        }
    }

    // Number of bounds strictly below `value`.
    fn bucket_index(&self, value: f64) -> usize {
        self.bounds.partition_point(|b| *b < value)
    }

    fn add(&mut self, value: f64, attachments: &Attachments, timestamp: SystemTime) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.sum_of_squared_dev += delta * (value - self.mean);

        let idx = self.bucket_index(value);
        self.count_per_bucket[idx] += 1;
        if !attachments.is_empty() {
            self.exemplars_per_bucket[idx] = Some(Exemplar {
                value,
                attachments: attachments.clone(),
                timestamp,
            });
        }
    }
}

/// Accumulator state of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationData {
    /// See [`CountData`]
    Count(CountData),
    /// See [`SumData`]
    Sum(SumData),
    /// See [`LastValueData`]
    LastValue(LastValueData),
    /// See [`DistributionData`]
    Distribution(DistributionData),
}

impl AggregationData {
    /// Fold one recorded value into the state.
    pub fn add(&mut self, value: f64, attachments: &Attachments, timestamp: SystemTime) {
        match self {
            Self::Count(c) => c.value += 1,
            Self::Sum(s) => s.value += value,
            Self::LastValue(l) => l.value = value,
            Self::Distribution(d) => d.add(value, attachments, timestamp),
        }
    }
}
