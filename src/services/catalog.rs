use crate::models::Criterion;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading a criteria catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog not found: {0}")]
    NotFound(String),

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One display group of criteria in the catalog, providing the default
/// section order when the caller does not submit one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionGroup {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
}

/// Reference to the backing item source for a catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub provider_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRef {
    pub data_source: DataSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Datasets {
    #[serde(default)]
    pub primary: Option<DatasetRef>,
}

/// Externally supplied catalog description: available criteria, display
/// grouping, backing data source and provider presets. Read-only input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub filters: Vec<Criterion>,
    #[serde(default)]
    pub sections: Vec<SectionGroup>,
    #[serde(default)]
    pub datasets: Datasets,
    #[serde(default)]
    pub preset_filters: Option<Value>,
}

impl CatalogConfig {
    pub fn data_source(&self) -> Option<&DataSource> {
        self.datasets
            .primary
            .as_ref()
            .map(|dataset| &dataset.data_source)
    }

    /// Fixed query terms the provider should always receive for this catalog.
    pub fn preset_query(&self) -> Option<&str> {
        self.preset_filters
            .as_ref()
            .and_then(|presets| presets.get("query"))
            .and_then(|query| query.as_str())
    }

    /// Default section order: the display groups' criteria restricted to
    /// known keys, falling back to catalog order when no groups are defined.
    pub fn default_section_order(&self) -> Vec<String> {
        let known: HashSet<&str> = self
            .filters
            .iter()
            .map(|criterion| criterion.key.as_str())
            .collect();

        let grouped: Vec<String> = self
            .sections
            .iter()
            .flat_map(|group| group.filters.iter())
            .filter(|key| known.contains(key.as_str()))
            .cloned()
            .collect();

        if grouped.is_empty() {
            self.filters
                .iter()
                .map(|criterion| criterion.key.clone())
                .collect()
        } else {
            grouped
        }
    }
}

/// Loads criteria catalogs from a directory of JSON config files.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    config_dir: PathBuf,
}

impl CatalogStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    fn path_for(&self, config_key: &str) -> Result<PathBuf, CatalogError> {
        // Keys map directly onto file names; reject anything that could
        // escape the config directory.
        let valid = !config_key.is_empty()
            && config_key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(CatalogError::NotFound(config_key.to_string()));
        }
        Ok(self.config_dir.join(format!("{}.json", config_key)))
    }

    /// Load and parse the catalog for a config key.
    pub fn load(&self, config_key: &str) -> Result<CatalogConfig, CatalogError> {
        let raw = self.read(config_key)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load the raw catalog document, for the config endpoint.
    pub fn load_raw(&self, config_key: &str) -> Result<Value, CatalogError> {
        let raw = self.read(config_key)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn read(&self, config_key: &str) -> Result<String, CatalogError> {
        let path = self.path_for(config_key)?;
        if !path.exists() {
            return Err(CatalogError::NotFound(config_key.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Enumerate the catalog keys available in the config directory.
    pub fn list_keys(&self) -> Result<Vec<String>, CatalogError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.config_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}
