// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Mutex, PoisonError},
    time::SystemTime,
};

use crate::{data::AggregationData, tag::Tag, view::View};

/// Point-in-time copy of one row of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Projected tags, one per view key in key order
    pub tags: Vec<Tag>,
    /// When the row was created
    pub start: SystemTime,
    /// Accumulated statistics
    pub data: AggregationData,
}

/// A registered view together with copies of all its rows.
#[derive(Debug, Clone)]
pub struct ViewData {
    /// The canonical view
    pub view: View,
    /// Rows ordered by tag values
    pub rows: Vec<Row>,
}

/// Live row owned by a view. The tags and start time never change; the data does.
#[derive(Debug)]
pub(crate) struct RowCell {
    tags: Vec<Tag>,
    start: SystemTime,
    data: Mutex<AggregationData>,
}

impl RowCell {
    pub(crate) fn new(tags: Vec<Tag>, start: SystemTime, data: AggregationData) -> Self {
        Self {
            tags,
            start,
            data: Mutex::new(data),
        }
    }

    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&mut AggregationData) -> R) -> R {
        // poisoning is ignored
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut data)
    }

    pub(crate) fn snapshot(&self) -> Row {
        Row {
            tags: self.tags.clone(),
            start: self.start,
            data: self.with_data(|d| d.clone()),
        }
    }
}
