//! Record types produced by reading an array file.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Attribute keys that mark a value as missing.
const MISSING_SENTINEL_KEYS: [&str; 2] = ["missing_value", "_FillValue"];

/// String metadata attached to one dimension or variable (`units`, `long_name`, ...).
///
/// An absent key and a key holding an empty string are different things:
/// [`AttributeMap::get`] returns `None` for the former and `Some("")` for the latter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMap(BTreeMap<String, String>);

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn units(&self) -> Option<&str> {
        self.get("units")
    }

    pub fn long_name(&self) -> Option<&str> {
        self.get("long_name")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Values of one dimension or variable plus its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionData {
    pub values: Vec<f64>,
    pub attributes: AttributeMap,
}

impl DimensionData {
    pub fn new(values: Vec<f64>, attributes: AttributeMap) -> Self {
        Self { values, attributes }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values with `missing_value`/`_FillValue` sentinels and NaN replaced by `None`.
    pub fn masked_values(&self) -> Vec<Option<f64>> {
        let sentinels: Vec<f64> = MISSING_SENTINEL_KEYS
            .iter()
            .filter_map(|key| self.attributes.get(key))
            .filter_map(|raw| raw.trim().parse::<f64>().ok())
            .filter(|v| !v.is_nan())
            .collect();

        self.values
            .iter()
            .map(|&v| {
                if v.is_nan() || sentinels.contains(&v) {
                    None
                } else {
                    Some(v)
                }
            })
            .collect()
    }
}

/// Requested dimensions of one fetched file, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    entries: BTreeMap<String, DimensionData>,
}

impl DatasetRecord {
    pub(crate) fn from_entries(entries: BTreeMap<String, DimensionData>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&DimensionData> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, DimensionData> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a DatasetRecord {
    type Item = (&'a String, &'a DimensionData);
    type IntoIter = btree_map::Iter<'a, String, DimensionData>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, DimensionData)> for DatasetRecord {
    fn from_iter<I: IntoIterator<Item = (String, DimensionData)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
