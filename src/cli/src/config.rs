use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use twophase::{SolverConfig, tables::default_cache_path};

/// Everything `cubelogic` reads from its TOML configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub solver: SolverConfig,
    /// Load and store tables in a cache file.
    pub table_cache: bool,
    /// Overrides the platform cache directory.
    pub cache_path: Option<PathBuf>,
    /// Overrides the platform data directory.
    pub history_path: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            table_cache: true,
            cache_path: None,
            history_path: None,
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn table_cache_path(&self) -> Option<PathBuf> {
        if !self.table_cache {
            return None;
        }
        self.cache_path.clone().or_else(default_cache_path)
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_path.clone().or_else(|| {
            let mut data = dirs::data_local_dir()?;
            data.push("cubelogic");
            data.push("solves.jsonl");
            Some(data)
        })
    }
}
