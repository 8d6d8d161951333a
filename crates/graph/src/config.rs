use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How step records are matched to open track nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    /// Steps arrive in depth-first order; each step must continue the track on
    /// top of the work stack.
    #[default]
    Strict,

    /// Steps may resume any open track; the most recently opened node of the
    /// matching track is continued.
    Keyed,
}

/// Configuration for a shower recorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Output file prefix; the run number and extension are appended
    pub base_name: String,

    /// Output file extension (without the dot)
    pub extension: String,

    /// Track id the driver assigns to the primary particle
    pub primary_track_id: u32,

    pub ordering: OrderingMode,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            base_name: "shower".to_string(),
            extension: "cg".to_string(),
            primary_track_id: 1,
            ordering: OrderingMode::Strict,
        }
    }
}

impl RecorderConfig {
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| GraphError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GraphError::resource(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_name.is_empty() {
            return Err(GraphError::config("base_name must not be empty"));
        }
        if self.extension.is_empty() || self.extension.chars().any(char::is_whitespace) {
            return Err(GraphError::config(format!(
                "extension {:?} must be a non-empty word",
                self.extension
            )));
        }
        if self.primary_track_id == 0 {
            return Err(GraphError::config("primary_track_id must be > 0"));
        }
        Ok(())
    }

    /// Output path for `run`: `<base_name><run>.<extension>`.
    pub fn output_path(&self, run: u32) -> PathBuf {
        PathBuf::from(format!("{}{}.{}", self.base_name, run, self.extension))
    }
}
