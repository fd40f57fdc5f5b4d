// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

use std::sync::OnceLock;

pub mod aggregation;
pub mod data;
mod error;
pub mod measure;
pub mod registry;
mod row;
mod signature;
pub mod tag;
pub mod time;
mod view;

pub use aggregation::Aggregation;
pub use data::{
    AggregationData, Attachments, CountData, DistributionData, Exemplar, LastValueData, SumData,
};
pub use error::{TagError, ViewError};
pub use measure::{
    Measure, MeasureKind, Measurement, UNIT_BYTES, UNIT_DIMENSIONLESS, UNIT_MILLISECONDS,
};
pub use registry::ViewRegistry;
pub use row::{Row, ViewData};
pub use tag::{Tag, TagKey, TagSet};
pub use view::View;

/// The process-wide registry used by the free functions of this crate and, unless told
/// otherwise, by exporters.
pub fn default_registry() -> &'static ViewRegistry {
    static DEFAULT: OnceLock<ViewRegistry> = OnceLock::new();
    DEFAULT.get_or_init(ViewRegistry::new)
}

/// [`ViewRegistry::register`] on the [`default_registry`]
pub fn register(views: &[View]) -> Result<(), ViewError> {
    default_registry().register(views)
}

/// [`ViewRegistry::unregister`] on the [`default_registry`]
pub fn unregister(views: &[View]) {
    default_registry().unregister(views)
}

/// [`ViewRegistry::find`] on the [`default_registry`]
pub fn find(name: &str) -> Option<View> {
    default_registry().find(name)
}

/// [`ViewRegistry::record`] on the [`default_registry`]
pub fn record(tags: &TagSet, measurements: &[Measurement], attachments: &Attachments) {
    default_registry().record(tags, measurements, attachments)
}

/// [`ViewRegistry::retrieve_data`] on the [`default_registry`]
pub fn retrieve_data(name: &str) -> Result<Vec<Row>, ViewError> {
    default_registry().retrieve_data(name)
}
