// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{collections::BTreeMap, fmt};

/// A problem found while serving one scrape. The offending view or series is left out.
#[derive(Debug)]
pub enum ScrapeError {
    /// The metric or label names derived from a view are not valid Prometheus names.
    InvalidView {
        /// View name
        view: String,
        /// What the metrics library rejected
        source: prometheus::Error,
    },
    /// Two rows of one view ended up with the same label values, for example because a constant
    /// label replaced the only tag that told them apart.
    DuplicateSeries {
        /// Metric name
        name: String,
        /// Label values of the duplicated series
        labels: BTreeMap<String, String>,
    },
    /// The gathered families could not be encoded.
    Encode(prometheus::Error),
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidView { view, source } => {
                write!(f, "view \"{view}\" cannot be exported: {source}")
            }
            Self::DuplicateSeries { name, labels } => {
                write!(f, "collected metric \"{name}\" {{")?;
                for (i, (k, v)) in labels.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}={v:?}")?;
                }
                f.write_str("} was collected before with the same name and label values")
            }
            Self::Encode(err) => write!(f, "encoding failed: {err}"),
        }
    }
}

impl std::error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidView { source, .. } | Self::Encode(source) => Some(source),
            Self::DuplicateSeries { .. } => None,
        }
    }
}

/// Every [`ScrapeError`] of one scrape, plus the body rendered from what exported cleanly.
#[derive(Debug)]
pub struct ScrapeErrors {
    errors: Vec<ScrapeError>,
    body: String,
}

impl ScrapeErrors {
    pub(crate) fn new(errors: Vec<ScrapeError>, body: String) -> Self {
        Self { errors, body }
    }

    /// The individual errors
    pub fn errors(&self) -> &[ScrapeError] {
        &self.errors
    }

    /// Exposition of everything that was exported without error
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Take the exposition of everything that was exported without error
    pub fn into_body(self) -> String {
        self.body
    }
}

impl fmt::Display for ScrapeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) occurred:", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n* {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ScrapeErrors {}
