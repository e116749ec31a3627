use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{RevealError, RevealResult};
use crate::scene::asset::AssetList;
use crate::scene::mapping::{CharMapping, rebuild_mappings};
use crate::scene::settings::Settings;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProjectDef {
    settings: Settings,
    assets: AssetList,
    mappings: Vec<CharMapping>,
}

/// Input document bundling settings, the ordered asset list, and optional per-character
/// overrides. Loading never writes anything back.
#[derive(Clone, Debug)]
pub struct Project {
    pub settings: Settings,
    pub assets: AssetList,
    /// Always `settings.text.chars().count()` long after loading.
    pub mappings: Vec<CharMapping>,
}

impl Project {
    /// Build a project from parts; mappings are rebuilt against the text and assets.
    pub fn new(settings: Settings, assets: AssetList, mappings: &[CharMapping]) -> RevealResult<Self> {
        let settings = settings.normalized();
        settings.validate()?;
        let mappings = rebuild_mappings(&settings.text, &assets, mappings);
        Ok(Self {
            settings,
            assets,
            mappings,
        })
    }

    /// Parse a project from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> RevealResult<Self> {
        let def: ProjectDef = serde_json::from_reader(r)
            .map_err(|e| RevealError::serde(format!("parse project JSON: {e}")))?;
        Self::new(def.settings, def.assets, &def.mappings)
    }

    /// Parse a project from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> RevealResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RevealError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}
