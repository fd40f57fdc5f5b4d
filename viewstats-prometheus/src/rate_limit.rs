// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

fn secs_since_start() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs()
}

/// Lets one caller through per interval, across all threads.
pub(crate) struct RateLimit {
    next_allowed: AtomicU64,
}

impl RateLimit {
    pub(crate) const fn new() -> Self {
        Self {
            next_allowed: AtomicU64::new(0),
        }
    }

    /// Whether the caller may proceed. At most one caller wins per `interval`, which must be at
    /// least a second.
    pub(crate) fn allow(&self, interval: Duration) -> bool {
        debug_assert!(interval >= Duration::from_secs(1));
        let now = secs_since_start();
        let next = self.next_allowed.load(Ordering::Relaxed);
        if now < next {
            return false;
        }
        let after = now.saturating_add(interval.as_secs());
        self.next_allowed
            .compare_exchange(next, after, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }
}

/// `rate_limited!(interval, expr)` evaluates `expr` at most once per `interval` for each call site.
///
/// Used for logs about a persistent problem, such as a scrape that keeps failing, so the first
/// occurrence is logged and then only a reminder now and then.
macro_rules! rate_limited {
    ($interval:expr, $call:expr) => {{
        static LIMIT: $crate::rate_limit::RateLimit = $crate::rate_limit::RateLimit::new();
        if LIMIT.allow($interval) {
            $call;
        }
    }};
}
pub(crate) use rate_limited;
