//! The keyed report every verb produces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map from a group path or status key to a list of strings.
///
/// Keys never map to an empty list, so an empty report means "nothing to
/// say" and the CLI exits successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    entries: BTreeMap<String, Vec<String>>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `values` under `key`; an empty list is ignored.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        if values.is_empty() {
            return;
        }
        self.entries.entry(key.into()).or_default().extend(values);
    }

    /// Append one value under `key`.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, vec![value.into()]);
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: Self) {
        for (key, values) in other.entries {
            self.insert(key, values);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, Vec<String>)> for Report {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        let mut report = Self::new();
        for (key, values) in iter {
            report.insert(key, values);
        }
        report
    }
}
