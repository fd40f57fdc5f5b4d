// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Why a tag key or tag value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The key name is empty, longer than 255 bytes, or contains non-printable ASCII.
    InvalidKeyName(String),
    /// The value is longer than 255 bytes or contains non-printable ASCII.
    InvalidValue {
        /// Key the value was supplied for
        key: String,
        /// The rejected value
        value: String,
    },
    /// [`crate::TagSet::insert`] was called for a key that is already present.
    AlreadyPresent(String),
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyName(name) => write!(f, "invalid tag key name `{name}`"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for tag key `{key}`")
            }
            Self::AlreadyPresent(key) => write!(f, "tag key `{key}` is already present"),
        }
    }
}

impl std::error::Error for TagError {}

/// Errors returned when registering views or reading their data.
///
/// Registration is atomic: if any view in a batch yields one of these errors, none of the views
/// in that batch are installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// A distribution bucket bound was negative.
    NegativeBucketBounds {
        /// Name of the view carrying the bounds
        view: String,
    },
    /// A distribution bucket bound was NaN.
    InvalidBucketBounds {
        /// Name of the view carrying the bounds
        view: String,
    },
    /// The view name is empty, longer than 255 bytes, or contains non-printable ASCII.
    InvalidName(String),
    /// A different view is already registered under this name.
    NameConflict {
        /// The contested view name
        name: String,
    },
    /// No view is registered under this name.
    UnknownView {
        /// The requested view name
        name: String,
    },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeBucketBounds { view } => {
                write!(f, "negative bucket bounds not supported (view `{view}`)")
            }
            Self::InvalidBucketBounds { view } => {
                write!(f, "bucket bounds must be numbers (view `{view}`)")
            }
            Self::InvalidName(name) => write!(f, "invalid view name `{name}`"),
            Self::NameConflict { name } => write!(
                f,
                "cannot register view `{name}`: a different view with the same name is already registered"
            ),
            Self::UnknownView { name } => write!(f, "cannot retrieve data; view `{name}` is not registered"),
        }
    }
}

impl std::error::Error for ViewError {}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::{TagError, ViewError};

    #[test]
    fn messages_name_the_culprit() {
        let conflict = ViewError::NameConflict {
            name: "latency".into(),
        };
        check!(conflict.to_string().contains("`latency`"));
        let negative = ViewError::NegativeBucketBounds { view: "v".into() };
        check!(negative.to_string().starts_with("negative bucket bounds"));
        let invalid = TagError::InvalidValue {
            key: "k".into(),
            value: "\u{7}".into(),
        };
        check!(invalid.to_string() == "invalid value `\u{7}` for tag key `k`");
    }
}
