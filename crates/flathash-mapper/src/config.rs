use std::path::Path;

use flathash_hint::TypeHintingMode;
use flathash_path::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

/// Configuration fixed when a mapper is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MapperConfig {
    /// Which object positions receive type hints.
    pub type_hinting: TypeHintingMode,
    /// Maximum container nesting accepted in either direction.
    pub max_depth: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            type_hinting: TypeHintingMode::Lenient,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MapperConfig {
    /// A configuration that hints every object.
    pub fn neutral() -> Self {
        Self {
            type_hinting: TypeHintingMode::Neutral,
            ..Default::default()
        }
    }

    /// A configuration that hints polymorphic positions only.
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Parses a TOML document. Missing keys take their default.
    pub fn from_toml_str(text: &str) -> MapperResult<Self> {
        toml::from_str(text).map_err(|err| MapperError::Config(err.to_string()))
    }

    /// Reads a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> MapperResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| MapperError::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
