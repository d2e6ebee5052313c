//! リソースタグ

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NAME_TAG: &str = "Name";
pub const ENVIRONMENT_TAG: &str = "Environment";
pub const PROJECT_TAG: &str = "Project";

/// リソースに付与するキー/値のタグ集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Name` タグだけを持つタグ集合
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().with(NAME_TAG, name)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME_TAG)
    }

    /// `Name` がまだなければ設定する
    pub fn ensure_name(&mut self, name: &str) {
        self.0
            .entry(NAME_TAG.to_string())
            .or_insert_with(|| name.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
