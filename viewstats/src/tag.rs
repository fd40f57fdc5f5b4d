// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Tag keys, tags and the tag sets that are recorded alongside measurements.

use std::{borrow::Borrow, fmt, sync::Arc};

use smallvec::SmallVec;

use crate::error::TagError;

const MAX_LEN: usize = 255;

fn is_valid(s: &str) -> bool {
    s.len() <= MAX_LEN && s.bytes().all(|b| (b' '..=b'~').contains(&b))
}

/// The name of one tag dimension.
///
/// Cheap to clone. Ordered and compared by name, which is the order views keep their keys in.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagKey(Arc<str>);

impl TagKey {
    /// Create a tag key. The name must be non-empty, at most 255 bytes, and printable ASCII.
    ///
    /// ```
    /// use viewstats::TagKey;
    ///
    /// assert!(TagKey::new("method").is_ok());
    /// assert!(TagKey::new("").is_err());
    /// ```
    pub fn new(name: impl AsRef<str>) -> Result<Self, TagError> {
        let name = name.as_ref();
        if name.is_empty() || !is_valid(name) {
            return Err(TagError::InvalidKeyName(name.to_owned()));
        }
        Ok(Self(name.into()))
    }

    /// The key name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TagKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key and the value it takes for one measurement or row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    /// The dimension
    pub key: TagKey,
    /// The value along that dimension. Empty when a row's tags did not carry the key.
    pub value: String,
}

/// An ordered-by-key set of tags with at most one value per key.
///
/// ```
/// use viewstats::{TagKey, TagSet};
///
/// let method = TagKey::new("method").unwrap();
/// let mut tags = TagSet::new();
/// tags.insert(&method, "GET").unwrap();
/// tags.upsert(&method, "PUT").unwrap();
/// assert_eq!(tags.get(&method), Some("PUT"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    // sorted by key
    tags: SmallVec<[Tag; 4]>,
}

impl TagSet {
    /// An empty tag set
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &TagKey) -> Result<usize, usize> {
        self.tags.binary_search_by(|t| t.key.cmp(key))
    }

    fn check_value(key: &TagKey, value: &str) -> Result<(), TagError> {
        if is_valid(value) {
            Ok(())
        } else {
            Err(TagError::InvalidValue {
                key: key.name().to_owned(),
                value: value.to_owned(),
            })
        }
    }

    /// Add `key` with `value`, failing if `key` is already present.
    pub fn insert(&mut self, key: &TagKey, value: impl Into<String>) -> Result<(), TagError> {
        let value = value.into();
        Self::check_value(key, &value)?;
        match self.position(key) {
            Ok(_) => Err(TagError::AlreadyPresent(key.name().to_owned())),
            Err(at) => {
                self.tags.insert(
                    at,
                    Tag {
                        key: key.clone(),
                        value,
                    },
                );
                Ok(())
            }
        }
    }

    /// Set `key` to `value`, whether or not it is already present.
    pub fn upsert(&mut self, key: &TagKey, value: impl Into<String>) -> Result<(), TagError> {
        let value = value.into();
        Self::check_value(key, &value)?;
        match self.position(key) {
            Ok(at) => self.tags[at].value = value,
            Err(at) => self.tags.insert(
                at,
                Tag {
                    key: key.clone(),
                    value,
                },
            ),
        }
        Ok(())
    }

    /// Replace the value of `key` if it is present. Returns whether anything was updated.
    pub fn update(&mut self, key: &TagKey, value: impl Into<String>) -> Result<bool, TagError> {
        let value = value.into();
        Self::check_value(key, &value)?;
        match self.position(key) {
            Ok(at) => {
                self.tags[at].value = value;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &TagKey) -> Option<String> {
        let at = self.position(key).ok()?;
        Some(self.tags.remove(at).value)
    }

    /// The value of `key`, if present
    pub fn get(&self, key: &TagKey) -> Option<&str> {
        let at = self.position(key).ok()?;
        Some(&self.tags[at].value)
    }

    /// Iterate the tags in key order
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set has no tags
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Builds a set where later values for a key win. Invalid values are dropped with a debug log,
/// since collecting cannot fail.
impl<V: Into<String>> FromIterator<(TagKey, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (TagKey, V)>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for (key, value) in iter {
            if let Err(err) = set.upsert(&key, value) {
                tracing::debug!(%err, "dropping tag");
            }
        }
        set
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}
