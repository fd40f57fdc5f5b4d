// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Turning view names and tag keys into Prometheus metric and label names.

const LABEL_KEY_LIMIT: usize = 100;

/// Replace every character outside `[A-Za-z0-9_]` with `_`, and prefix names that start with a
/// digit or an underscore with `key_` / `key`.
pub(crate) fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "key_");
    } else if out.starts_with('_') {
        out.insert_str(0, "key");
    }
    out
}

/// Label name for a tag key or a configured label key. Keys are cut to 100 characters first.
pub(crate) fn label_name(key: &str) -> String {
    match key.char_indices().nth(LABEL_KEY_LIMIT) {
        Some((end, _)) => sanitize(&key[..end]),
        None => sanitize(key),
    }
}

/// Metric name for a view, with an optional namespace prefix.
pub(crate) fn metric_name(namespace: Option<&str>, view: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => sanitize(&format!("{ns}_{view}")),
        _ => sanitize(view),
    }
}
