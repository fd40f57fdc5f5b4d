// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Translation of view rows into Prometheus metric families.

use std::{
    collections::{BTreeMap, BTreeSet},
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use hashbrown::{HashMap, HashSet};
use prometheus::{
    core::{Collector, Desc},
    proto::{self, MetricType},
};
use viewstats::{Aggregation, AggregationData, DistributionData, Row, View, ViewData, ViewRegistry};

use crate::{
    error::ScrapeError,
    sanitize::{label_name, metric_name},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything about a view's series that does not change between scrapes.
#[derive(Debug)]
struct Descriptor {
    // validated metric name and label names
    desc: Desc,
    help: String,
    kind: MetricType,
    // sanitized tag keys, in the view's key order
    tag_labels: Vec<String>,
}

// (metric name, sanitized tag keys)
type DescriptorKey = (String, Vec<String>);

struct Inner {
    views: ViewRegistry,
    namespace: Option<String>,
    const_labels: BTreeMap<String, String>,
    resource_labels: BTreeMap<String, String>,
    descriptors: Mutex<HashMap<DescriptorKey, Arc<Descriptor>>>,
    // errors of the latest collect
    errors: Mutex<Vec<ScrapeError>>,
}

/// Collector over the views of a [`ViewRegistry`].
///
/// Describes nothing up front: the set of views changes between scrapes.
#[derive(Clone)]
pub(crate) struct ViewCollector(Arc<Inner>);

impl ViewCollector {
    pub(crate) fn new(
        views: ViewRegistry,
        namespace: Option<String>,
        const_labels: &BTreeMap<String, String>,
        resource_labels: &BTreeMap<String, String>,
    ) -> Self {
        let sanitized = |labels: &BTreeMap<String, String>| -> BTreeMap<String, String> {
            labels
                .iter()
                .map(|(k, v)| (label_name(k), v.clone()))
                .collect()
        };
        Self(Arc::new(Inner {
            views,
            namespace,
            const_labels: sanitized(const_labels),
            resource_labels: sanitized(resource_labels),
            descriptors: Mutex::default(),
            errors: Mutex::default(),
        }))
    }

    /// Errors found by the latest collect, leaving none behind.
    pub(crate) fn take_errors(&self) -> Vec<ScrapeError> {
        mem::take(&mut *lock(&self.0.errors))
    }

    fn descriptor(
        &self,
        cache: &HashMap<DescriptorKey, Arc<Descriptor>>,
        view: &View,
    ) -> Result<(DescriptorKey, Arc<Descriptor>), prometheus::Error> {
        let name = metric_name(self.0.namespace.as_deref(), &view.name);
        let tag_labels: Vec<String> = view.tag_keys.iter().map(|k| label_name(k.name())).collect();
        let key = (name, tag_labels);
        let kind = kind_of(&view.aggregation);
        if let Some(desc) = cache
            .get(&key)
            .filter(|d| d.kind == kind && d.help == view.description)
        {
            return Ok((key, desc.clone()));
        }

        tracing::debug!(view = %view.name, metric = %key.0, "creating series descriptor");
        let label_names: BTreeSet<&String> = key
            .1
            .iter()
            .chain(self.0.const_labels.keys())
            .chain(self.0.resource_labels.keys())
            .collect();
        // Desc refuses an empty help string
        let desc_help = if view.description.is_empty() {
            key.0.clone()
        } else {
            view.description.clone()
        };
        let desc = Desc::new(
            key.0.clone(),
            desc_help,
            label_names.into_iter().cloned().collect(),
            std::collections::HashMap::new(),
        )?;
        let desc = Arc::new(Descriptor {
            desc,
            help: view.description.clone(),
            kind,
            tag_labels: key.1.clone(),
        });
        Ok((key, desc))
    }

    fn labels(&self, desc: &Descriptor, row: &Row) -> BTreeMap<String, String> {
        let mut labels: BTreeMap<String, String> = desc
            .tag_labels
            .iter()
            .cloned()
            .zip(row.tags.iter().map(|t| t.value.clone()))
            .collect();
        for (k, v) in self.0.const_labels.iter().chain(&self.0.resource_labels) {
            labels.insert(k.clone(), v.clone());
        }
        labels
    }

    fn family(
        &self,
        desc: &Descriptor,
        data: &ViewData,
        errors: &mut Vec<ScrapeError>,
    ) -> proto::MetricFamily {
        let mut family = proto::MetricFamily::default();
        family.set_name(desc.desc.fq_name.clone());
        family.set_help(desc.help.clone());
        family.set_field_type(desc.kind);

        let mut seen = HashSet::with_capacity(data.rows.len());
        for row in &data.rows {
            let labels = self.labels(desc, row);
            if !seen.insert(labels.clone()) {
                errors.push(ScrapeError::DuplicateSeries {
                    name: desc.desc.fq_name.clone(),
                    labels,
                });
                continue;
            }
            family.mut_metric().push(metric(labels, &row.data));
        }
        family
    }
}

impl Collector for ViewCollector {
    fn desc(&self) -> Vec<&Desc> {
        Vec::new()
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let snapshot = self.0.views.snapshot();
        let mut errors = Vec::new();
        let mut families = Vec::with_capacity(snapshot.len());

        let mut cache = lock(&self.0.descriptors);
        let mut live = HashMap::with_capacity(snapshot.len());
        for data in &snapshot {
            match self.descriptor(&cache, &data.view) {
                Ok((key, desc)) => {
                    families.push(self.family(&desc, data, &mut errors));
                    live.insert(key, desc);
                }
                Err(source) => errors.push(ScrapeError::InvalidView {
                    view: data.view.name.clone(),
                    source,
                }),
            }
        }
        // drop descriptors of views that have gone away
        *cache = live;
        drop(cache);

        *lock(&self.0.errors) = errors;
        families
    }
}

fn kind_of(aggregation: &Aggregation) -> MetricType {
    match aggregation {
        Aggregation::Count => MetricType::COUNTER,
        Aggregation::Sum => MetricType::UNTYPED,
        Aggregation::LastValue => MetricType::GAUGE,
        Aggregation::Distribution { .. } => MetricType::HISTOGRAM,
    }
}

fn metric(labels: BTreeMap<String, String>, data: &AggregationData) -> proto::Metric {
    let mut metric = proto::Metric::default();
    for (name, value) in labels {
        let mut pair = proto::LabelPair::default();
        pair.set_name(name);
        pair.set_value(value);
        metric.mut_label().push(pair);
    }
    match data {
        AggregationData::Count(c) => {
            let mut counter = proto::Counter::default();
            counter.set_value(c.value as f64);
            metric.set_counter(counter);
        }
        AggregationData::Sum(s) => {
            let mut untyped = proto::Untyped::default();
            untyped.set_value(s.value);
            metric.set_untyped(untyped);
        }
        AggregationData::LastValue(l) => {
            let mut gauge = proto::Gauge::default();
            gauge.set_value(l.value);
            metric.set_gauge(gauge);
        }
        AggregationData::Distribution(d) => metric.set_histogram(histogram(d)),
    }
    metric
}

/// Cumulative buckets, one per bound. The encoder adds `+Inf` from the sample count.
fn histogram(data: &DistributionData) -> proto::Histogram {
    let mut histogram = proto::Histogram::default();
    histogram.set_sample_count(data.count as u64);
    histogram.set_sample_sum(data.sum());
    let mut cumulative = 0;
    for (bound, count) in data.bounds.iter().zip(&data.count_per_bucket) {
        cumulative += *count as u64;
        let mut bucket = proto::Bucket::default();
        bucket.set_upper_bound(*bound);
        bucket.set_cumulative_count(cumulative);
        histogram.mut_bucket().push(bucket);
    }
    histogram
}
