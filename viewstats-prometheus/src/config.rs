// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::Deserialize;

/// Exporter settings that can be loaded from a configuration file, applied with
/// [`crate::ExporterBuilder::config`].
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use viewstats_prometheus::{Exporter, ExporterConfig};
///
/// let config: ExporterConfig = serde_json::from_str(
///     r#"{ "namespace": "myapp", "const_labels": { "region": "us-east-1" } }"#,
/// )?;
/// let exporter = Exporter::builder()
///     .views(viewstats::ViewRegistry::new())
///     .config(config)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// Prefix for every metric name
    #[serde(default)]
    pub namespace: Option<String>,
    /// Labels added to every series
    #[serde(default)]
    pub const_labels: BTreeMap<String, String>,
    /// Labels describing the resource, overriding all others
    #[serde(default)]
    pub resource_labels: BTreeMap<String, String>,
}
