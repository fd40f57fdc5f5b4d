// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The table of registered views and the recording path into their rows.

use std::{
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::SystemTime,
};

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::{
    data::Attachments,
    error::ViewError,
    measure::Measurement,
    row::{Row, RowCell, ViewData},
    signature,
    tag::TagSet,
    time::TimeSource,
    view::View,
};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A registered view and its rows, keyed by signature.
#[derive(Debug)]
struct ViewEntry {
    view: View,
    rows: RwLock<HashMap<Box<[u8]>, Arc<RowCell>>>,
}

impl ViewEntry {
    fn new(view: View) -> Self {
        Self {
            view,
            rows: RwLock::default(),
        }
    }

    fn add(&self, tags: &TagSet, value: f64, attachments: &Attachments, timestamp: SystemTime) {
        let sig = signature::encode(&self.view.tag_keys, tags);
        let existing = read(&self.rows).get(sig.as_slice()).cloned();
        let row = match existing {
            Some(row) => row,
            None => {
                let mut rows = write(&self.rows);
                // another producer may have created the row since the read lock was released
                rows.entry_ref(sig.as_slice())
                    .or_insert_with(|| {
                        tracing::trace!(view = %self.view.name, "creating row");
                        Arc::new(RowCell::new(
                            signature::project(&self.view.tag_keys, tags),
                            timestamp,
                            self.view.aggregation.new_data(timestamp),
                        ))
                    })
                    .clone()
            }
        };
        row.with_data(|data| data.add(value, attachments, timestamp));
    }

    fn rows(&self) -> Vec<Row> {
        let cells: Vec<Arc<RowCell>> = read(&self.rows).values().cloned().collect();
        let mut rows: Vec<Row> = cells.iter().map(|c| c.snapshot()).collect();
        rows.sort_by(|a, b| a.tags.cmp(&b.tags));
        rows
    }
}

#[derive(Debug, Default)]
struct Views {
    by_name: HashMap<String, Arc<ViewEntry>>,
    // measure name -> views of that measure
    by_measure: HashMap<String, SmallVec<[Arc<ViewEntry>; 2]>>,
}

impl Views {
    fn insert(&mut self, view: View) {
        let entry = Arc::new(ViewEntry::new(view));
        self.by_measure
            .entry(entry.view.measure.name().to_owned())
            .or_default()
            .push(entry.clone());
        self.by_name.insert(entry.view.name.clone(), entry);
    }

    fn remove(&mut self, name: &str) -> Option<Arc<ViewEntry>> {
        let entry = self.by_name.remove(name)?;
        let measure = entry.view.measure.name();
        if let Some(subscribed) = self.by_measure.get_mut(measure) {
            subscribed.retain(|e| !Arc::ptr_eq(e, &entry));
            if subscribed.is_empty() {
                self.by_measure.remove(measure);
            }
        }
        Some(entry)
    }

    fn sorted(&self) -> Vec<Arc<ViewEntry>> {
        let mut entries: Vec<_> = self.by_name.values().cloned().collect();
        entries.sort_by(|a, b| a.view.name.cmp(&b.view.name));
        entries
    }
}

#[derive(Debug)]
struct Inner {
    views: RwLock<Views>,
    time_source: TimeSource,
}

/// A table of registered views that recorded measurements are aggregated into.
///
/// Cloning is cheap and clones share the same table. Most programs use the process-wide
/// [`crate::default_registry`]; tests and embedders can create their own.
///
/// ```
/// use viewstats::{Aggregation, Measure, TagKey, TagSet, View, ViewRegistry, UNIT_BYTES};
///
/// let registry = ViewRegistry::new();
/// let size = Measure::int64("http/request_size", "request size", UNIT_BYTES);
/// let method = TagKey::new("method").unwrap();
/// registry
///     .register(&[View::new(&size, Aggregation::Sum).with_tag_keys([method.clone()])])
///     .unwrap();
///
/// let mut tags = TagSet::new();
/// tags.insert(&method, "GET").unwrap();
/// registry.record(&tags, &[size.m(512.0), size.m(256.0)], &Default::default());
///
/// let rows = registry.retrieve_data("http/request_size").unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].tags[0].value, "GET");
/// ```
#[derive(Debug, Clone)]
pub struct ViewRegistry(Arc<Inner>);

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::with_time_source(TimeSource::default())
    }
}

impl ViewRegistry {
    /// Create an empty registry using the system clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry that timestamps recordings with `time_source`
    pub fn with_time_source(time_source: TimeSource) -> Self {
        Self(Arc::new(Inner {
            views: RwLock::default(),
            time_source,
        }))
    }

    /// Register `views`, after which they receive every measurement of their measure.
    ///
    /// Registering a view identical in shape to one already registered under the same name does
    /// nothing. The batch is validated as a whole first: on error nothing is registered.
    pub fn register(&self, views: &[View]) -> Result<(), ViewError> {
        let canonical = views
            .iter()
            .map(View::canonicalize)
            .collect::<Result<Vec<_>, _>>()?;

        let mut table = write(&self.0.views);
        let mut fresh: Vec<View> = Vec::with_capacity(canonical.len());
        for view in canonical {
            let existing = table
                .by_name
                .get(&view.name)
                .map(|e| &e.view)
                .or_else(|| fresh.iter().find(|v| v.name == view.name));
            match existing {
                Some(existing) if existing.same_shape(&view) => {}
                Some(_) => return Err(ViewError::NameConflict { name: view.name }),
                None => fresh.push(view),
            }
        }
        for view in fresh {
            tracing::debug!(
                view = %view.name,
                measure = view.measure.name(),
                aggregation = view.aggregation.kind_name(),
                "registered view"
            );
            table.insert(view);
        }
        Ok(())
    }

    /// Remove `views` and discard their rows. Views that are not registered are ignored.
    pub fn unregister(&self, views: &[View]) {
        let mut table = write(&self.0.views);
        for view in views {
            let name = if view.name.is_empty() {
                view.measure.name()
            } else {
                &view.name
            };
            if table.remove(name).is_some() {
                tracing::debug!(view = name, "unregistered view");
            }
        }
    }

    /// The registered view called `name`, in canonical form
    pub fn find(&self, name: &str) -> Option<View> {
        read(&self.0.views)
            .by_name
            .get(name)
            .map(|e| e.view.clone())
    }

    /// All registered views ordered by name
    pub fn views(&self) -> Vec<View> {
        read(&self.0.views)
            .sorted()
            .into_iter()
            .map(|e| e.view.clone())
            .collect()
    }

    /// Record `measurements` with `tags`, timestamped by the registry's time source.
    pub fn record(&self, tags: &TagSet, measurements: &[Measurement], attachments: &Attachments) {
        self.record_at(tags, measurements, attachments, self.0.time_source.now());
    }

    /// Record `measurements` with `tags` at `timestamp`.
    ///
    /// Each measurement is added to the matching row of every view of its measure. Measurements
    /// with no subscribed views are dropped.
    pub fn record_at(
        &self,
        tags: &TagSet,
        measurements: &[Measurement],
        attachments: &Attachments,
        timestamp: SystemTime,
    ) {
        let table = read(&self.0.views);
        for m in measurements {
            let Some(entries) = table.by_measure.get(m.measure().name()) else {
                tracing::trace!(measure = m.measure().name(), "no views for measure, dropping");
                continue;
            };
            for entry in entries {
                entry.add(tags, m.value(), attachments, timestamp);
            }
        }
    }

    /// Copies of the rows of view `name`, or `None` if it is not registered.
    pub fn collected_rows(&self, name: &str) -> Option<Vec<Row>> {
        let entry = read(&self.0.views).by_name.get(name).cloned()?;
        Some(entry.rows())
    }

    /// Copies of the rows of view `name`.
    pub fn retrieve_data(&self, name: &str) -> Result<Vec<Row>, ViewError> {
        self.collected_rows(name).ok_or_else(|| ViewError::UnknownView {
            name: name.to_owned(),
        })
    }

    /// Discard all rows of view `name` while keeping it registered. Returns whether the view
    /// exists.
    pub fn clear_rows(&self, name: &str) -> bool {
        let Some(entry) = read(&self.0.views).by_name.get(name).cloned() else {
            return false;
        };
        write(&entry.rows).clear();
        true
    }

    /// Every registered view with copies of its rows, ordered by view name.
    ///
    /// Each row is copied under its own lock, so recording into other rows carries on while a
    /// snapshot is taken.
    pub fn snapshot(&self) -> Vec<ViewData> {
        let entries = read(&self.0.views).sorted();
        entries
            .into_iter()
            .map(|e| ViewData {
                rows: e.rows(),
                view: e.view.clone(),
            })
            .collect()
    }
}
