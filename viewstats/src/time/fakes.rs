// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

use super::Time;

/// Timesource that is loaded with one time and only moves when told to.
///
/// Clones share the same clock, so a test can keep one handle and give another to a registry.
///
/// ```
/// use std::time::{Duration, UNIX_EPOCH};
/// use viewstats::time::{TimeSource, fakes::ManualTime};
///
/// let clock = ManualTime::at_time(UNIX_EPOCH);
/// let ts = TimeSource::custom(clock.clone());
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(ts.now(), UNIX_EPOCH + Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ManualTime(Arc<Mutex<SystemTime>>);

impl ManualTime {
    /// Create a clock that reads `time` until it is changed
    pub fn at_time(time: impl Into<SystemTime>) -> Self {
        Self(Arc::new(Mutex::new(time.into())))
    }

    /// Replace the current time
    pub fn update_time(&self, time: impl Into<SystemTime>) {
        *self.0.lock().unwrap() = time.into();
    }

    /// Move the current time forward by `by`
    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Time for ManualTime {
    fn now(&self) -> SystemTime {
        *self.0.lock().unwrap()
    }
}
