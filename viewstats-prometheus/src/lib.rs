// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod collector;
#[cfg(feature = "serde")]
mod config;
mod error;
mod exporter;
mod rate_limit;
mod sanitize;

#[cfg(feature = "serde")]
pub use config::ExporterConfig;
pub use error::{ScrapeError, ScrapeErrors};
pub use exporter::{ErrorHandling, Exporter, ExporterBuilder};

/// The metrics library this crate registers with, re-exported for version matching
pub use prometheus;
