use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{RevealError, RevealResult};

/// Stable, session-unique asset identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// One user-supplied image.
pub struct Asset {
    pub id: AssetId,
    /// Image reference: a path relative to the asset root (raster formats or SVG).
    pub source: String,
}

impl Asset {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: AssetId::new(id),
            source: source.into(),
        }
    }
}

/// Ordered asset sequence. Order drives the round-robin default assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssetList(Vec<Asset>);

impl AssetList {
    /// Build a list, rejecting empty or duplicate ids.
    pub fn new(assets: Vec<Asset>) -> RevealResult<Self> {
        let mut seen = HashSet::with_capacity(assets.len());
        for a in &assets {
            if a.id.0.trim().is_empty() {
                return Err(RevealError::validation("asset id must be non-empty"));
            }
            if !seen.insert(&a.id) {
                return Err(RevealError::validation(format!(
                    "duplicate asset id '{}'",
                    a.id
                )));
            }
        }
        Ok(Self(assets))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Asset> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&Asset> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.0.iter()
    }

    pub fn index_of(&self, id: &AssetId) -> Option<usize> {
        self.0.iter().position(|a| &a.id == id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.index_of(id).is_some()
    }

    /// Strict lookup for callers that must know about dangling references.
    pub fn require(&self, id: &AssetId) -> RevealResult<&Asset> {
        self.0
            .iter()
            .find(|a| &a.id == id)
            .ok_or_else(|| RevealError::asset_missing(id.0.clone()))
    }

    /// Round-robin default for slot `index`: `assets[index % len]`.
    pub fn round_robin(&self, index: usize) -> Option<&Asset> {
        if self.0.is_empty() {
            None
        } else {
            self.0.get(index % self.0.len())
        }
    }
}

impl<'de> Deserialize<'de> for AssetList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = Vec::<Asset>::deserialize(deserializer)?;
        AssetList::new(v).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a AssetList {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
