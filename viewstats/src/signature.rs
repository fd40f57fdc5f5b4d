// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Projection of a recorded tag set onto a view's keys, and the row signature derived from it.
//!
//! A signature is the sequence of projected values in key order, each written as a LEB128 length
//! followed by its bytes. The keys themselves are implied by the view, so two projections share a
//! signature exactly when they carry the same values.

use smallvec::SmallVec;

use crate::tag::{Tag, TagKey, TagSet};

/// Row lookup key. Inline for typical tag sizes so the hot path doesn't allocate.
pub(crate) type Signature = SmallVec<[u8; 64]>;

fn write_len(buf: &mut Signature, mut len: usize) {
    loop {
        let byte = (len & 0x7f) as u8;
        len >>= 7;
        if len == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Signature of `tags` as seen by a view keyed on `keys`. Missing keys encode as empty values.
pub(crate) fn encode(keys: &[TagKey], tags: &TagSet) -> Signature {
    let mut buf = Signature::new();
    for key in keys {
        let value = tags.get(key).unwrap_or_default();
        write_len(&mut buf, value.len());
        buf.extend_from_slice(value.as_bytes());
    }
    buf
}

/// One tag per key, in key order, with empty values for keys `tags` does not carry.
pub(crate) fn project(keys: &[TagKey], tags: &TagSet) -> Vec<Tag> {
    keys.iter()
        .map(|key| Tag {
            key: key.clone(),
            value: tags.get(key).unwrap_or_default().to_owned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::{encode, project};
    use crate::tag::{TagKey, TagSet};

    fn keys(names: &[&str]) -> Vec<TagKey> {
        names.iter().map(|n| TagKey::new(n).unwrap()).collect()
    }

    fn tags(pairs: &[(&str, &str)]) -> TagSet {
        pairs
            .iter()
            .map(|(k, v)| (TagKey::new(k).unwrap(), *v))
            .collect()
    }

    #[test]
    fn separator_characters_do_not_collide() {
        let ks = keys(&["a", "b"]);
        let left = encode(&ks, &tags(&[("a", "x,"), ("b", "y")]));
        let right = encode(&ks, &tags(&[("a", "x"), ("b", ",y")]));
        check!(left != right);

        let left = encode(&ks, &tags(&[("a", ""), ("b", "ab")]));
        let right = encode(&ks, &tags(&[("a", "a"), ("b", "b")]));
        check!(left != right);
    }

    #[test]
    fn missing_key_is_an_empty_value() {
        let ks = keys(&["a", "b"]);
        let missing = tags(&[("b", "v")]);
        let empty = tags(&[("a", ""), ("b", "v")]);
        check!(encode(&ks, &missing) == encode(&ks, &empty));
        let projected = project(&ks, &missing);
        check!(projected.len() == 2);
        check!(projected[0].value == "");
        check!(projected[1].value == "v");
    }

    #[test]
    fn keys_outside_the_view_are_ignored() {
        let ks = keys(&["a"]);
        check!(
            encode(&ks, &tags(&[("a", "1"), ("z", "2")])) == encode(&ks, &tags(&[("a", "1")]))
        );
    }

    #[test]
    fn long_values_use_multi_byte_lengths() {
        let ks = keys(&["a"]);
        let long = "x".repeat(200);
        let sig = encode(&ks, &tags(&[("a", &long)]));
        check!(sig[..2] == [0xc8, 0x01]);
        check!(sig.len() == 202);
    }
}
