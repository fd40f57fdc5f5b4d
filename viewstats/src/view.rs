// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{aggregation::Aggregation, error::ViewError, measure::Measure, tag::TagKey};

const MAX_NAME_LEN: usize = 255;

/// An aggregation of one measure, broken down along a chosen set of tag keys.
///
/// Views are registered with a [`crate::ViewRegistry`]. On registration the view is canonicalized:
/// tag keys are sorted and deduplicated, an empty name or description is taken from the measure,
/// and distribution bounds are normalized. [`crate::ViewRegistry::find`] returns that canonical
/// form.
///
/// ```
/// use viewstats::{Aggregation, Measure, TagKey, View, UNIT_MILLISECONDS};
///
/// let latency = Measure::float64("rpc/latency", "RPC latency", UNIT_MILLISECONDS);
/// let view = View::new(&latency, Aggregation::distribution([10.0, 100.0]))
///     .with_name("rpc/latency_by_method")
///     .with_tag_keys([TagKey::new("method").unwrap()]);
/// assert_eq!(view.name, "rpc/latency_by_method");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Unique name of the view. Defaults to the measure name.
    pub name: String,
    /// Human readable description. Defaults to the measure description.
    pub description: String,
    /// The measure whose values this view aggregates
    pub measure: Measure,
    /// Dimensions of the view. Each distinct combination of values gets its own row.
    pub tag_keys: Vec<TagKey>,
    /// How values are aggregated within a row
    pub aggregation: Aggregation,
}

impl View {
    /// A view of `measure` with no tag keys, named after the measure
    pub fn new(measure: &Measure, aggregation: Aggregation) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            measure: measure.clone(),
            tag_keys: Vec::new(),
            aggregation,
        }
    }

    /// Set the view name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the view description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the tag keys the view is broken down by
    pub fn with_tag_keys(mut self, keys: impl IntoIterator<Item = TagKey>) -> Self {
        self.tag_keys = keys.into_iter().collect();
        self
    }

    /// The form this view takes once registered.
    pub(crate) fn canonicalize(&self) -> Result<View, ViewError> {
        let name = if self.name.is_empty() {
            self.measure.name().to_owned()
        } else {
            self.name.clone()
        };
        check_name(&name)?;
        let description = if self.description.is_empty() {
            self.measure.description().to_owned()
        } else {
            self.description.clone()
        };
        let mut tag_keys = self.tag_keys.clone();
        tag_keys.sort();
        tag_keys.dedup();
        let aggregation = self.aggregation.normalized(&name)?;
        Ok(View {
            name,
            description,
            measure: self.measure.clone(),
            tag_keys,
            aggregation,
        })
    }

    /// Whether a row recorded for `self` means the same thing as one recorded for `other`.
    /// Both must be canonical.
    pub(crate) fn same_shape(&self, other: &View) -> bool {
        self.measure == other.measure
            && self.aggregation == other.aggregation
            && self.tag_keys == other.tag_keys
    }
}

fn check_name(name: &str) -> Result<(), ViewError> {
    let printable = name.bytes().all(|b| (b' '..=b'~').contains(&b));
    if name.is_empty() || name.len() > MAX_NAME_LEN || !printable {
        return Err(ViewError::InvalidName(name.to_owned()));
    }
    Ok(())
}
