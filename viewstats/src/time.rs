// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Where a [`crate::ViewRegistry`] gets the timestamps for rows and exemplars when the caller
//! does not supply one.

use std::{fmt, sync::Arc, time::SystemTime};

/// Module containing fake time sources for testing
///
/// To enable this module, you must enable the `test-util` feature.
#[cfg(feature = "test-util")]
pub mod fakes;

/// Trait for providing custom time sources
pub trait Time: Send + Sync + fmt::Debug {
    /// Get the current system time
    fn now(&self) -> SystemTime;
}

/// Time source used by a [`crate::ViewRegistry`].
#[derive(Clone, Default)]
pub enum TimeSource {
    /// Use the system time
    #[default]
    System,
    /// Use a custom time source
    Custom(Arc<dyn Time>),
}

impl fmt::Debug for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "TimeSource::System"),
            Self::Custom(_) => write!(f, "TimeSource::Custom(...)"),
        }
    }
}

impl TimeSource {
    /// Wrap a custom [`Time`] implementation.
    ///
    /// ```
    /// use std::time::{SystemTime, UNIX_EPOCH};
    /// use viewstats::time::{Time, TimeSource};
    ///
    /// #[derive(Debug)]
    /// struct Epoch;
    /// impl Time for Epoch {
    ///     fn now(&self) -> SystemTime {
    ///         UNIX_EPOCH
    ///     }
    /// }
    ///
    /// assert_eq!(TimeSource::custom(Epoch).now(), UNIX_EPOCH);
    /// ```
    pub fn custom(time: impl Time + 'static) -> Self {
        Self::Custom(Arc::new(time))
    }

    /// Get the current [`SystemTime`] from this time source
    pub fn now(&self) -> SystemTime {
        match self {
            Self::System => SystemTime::now(),
            Self::Custom(ts) => ts.now(),
        }
    }
}
