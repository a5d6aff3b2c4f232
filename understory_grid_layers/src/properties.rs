// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat property map for persisting layer state.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::GridError;

/// An ordered string-to-string map that a whole stack saves into and restores from.
///
/// Layers store their state under `"{prefix}.{name}"` keys as comma separated
/// primitive lists, so the map round-trips through any flat key/value store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Joins a prefix and a name into a key.
    #[must_use]
    pub fn key(prefix: &str, name: &str) -> String {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    }

    /// Raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Sets a raw value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stores a list of numbers as `"3,0,1"`.
    pub fn set_list(&mut self, key: impl Into<String>, values: impl IntoIterator<Item = usize>) {
        let parts: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        self.set(key, parts.join(","));
    }

    /// Reads a list stored by [`Properties::set_list`].
    pub fn list(&self, key: &str) -> Result<Option<Vec<usize>>, GridError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }
        raw.split(',')
            .map(|part| part.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
            .map_err(|_| malformed(key, "expected comma separated non-negative integers"))
    }

    /// Stores `(position, value)` pairs as `"0:150,2:35"`.
    pub fn set_pairs(
        &mut self,
        key: impl Into<String>,
        pairs: impl IntoIterator<Item = (usize, u32)>,
    ) {
        let parts: Vec<String> = pairs
            .into_iter()
            .map(|(position, value)| format!("{position}:{value}"))
            .collect();
        self.set(key, parts.join(","));
    }

    /// Reads pairs stored by [`Properties::set_pairs`].
    pub fn pairs(&self, key: &str) -> Result<Option<Vec<(usize, u32)>>, GridError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }
        let mut out = Vec::new();
        for part in raw.split(',') {
            let (position, value) = part
                .split_once(':')
                .ok_or_else(|| malformed(key, "expected `position:value` pairs"))?;
            let position = position
                .trim()
                .parse()
                .map_err(|_| malformed(key, "position is not a non-negative integer"))?;
            let value = value
                .trim()
                .parse()
                .map_err(|_| malformed(key, "value is not a non-negative integer"))?;
            out.push((position, value));
        }
        Ok(Some(out))
    }

    /// Reads a single number.
    pub fn number(&self, key: &str) -> Result<Option<u32>, GridError> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| malformed(key, "expected a non-negative integer"))
            })
            .transpose()
    }
}

pub(crate) fn malformed(key: &str, reason: &'static str) -> GridError {
    GridError::MalformedState {
        key: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::Properties;
    use crate::GridError;

    #[test]
    fn lists_and_pairs_round_trip() {
        let mut props = Properties::new();
        props.set_list(Properties::key("grid", "columnIndexOrder"), [3, 0, 1, 2]);
        props.set_pairs(Properties::key("grid", "columnWidth.sizes"), [(0, 150), (2, 35)]);
        props.set_list("empty", []);

        assert_eq!(props.get("grid.columnIndexOrder"), Some("3,0,1,2"));
        assert_eq!(
            props.list("grid.columnIndexOrder").unwrap(),
            Some(alloc::vec![3, 0, 1, 2])
        );
        assert_eq!(
            props.pairs("grid.columnWidth.sizes").unwrap(),
            Some(alloc::vec![(0, 150), (2, 35)])
        );
        assert_eq!(props.list("empty").unwrap(), Some(alloc::vec![]));
        assert_eq!(props.list("missing").unwrap(), None);
    }

    #[test]
    fn malformed_values_name_their_key() {
        let mut props = Properties::new();
        props.set("order", "1,x");
        props.set("sizes", "1-2");
        assert!(matches!(
            props.list("order"),
            Err(GridError::MalformedState { key, .. }) if key == "order"
        ));
        assert!(props.pairs("sizes").is_err());
    }
}
