//! Rules module manifest parsing.
//!
//! Each module is a directory holding a `manifest.yaml`:
//!
//! ```yaml
//! id: fivee_stock
//! name: "D&D 5e (Stock)"
//! version: 0.1.0
//! subsystems: [classes, feats, companions]
//! entry_point: "dndcs_rulesets.fivee_stock.module:FiveEStockModule"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LoaderError, LoaderResult};

/// File name discovery looks for in each module directory.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Parsed `manifest.yaml`, annotated with where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleModuleManifest {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Accepts a string or a bare number (`version: 1.2`)
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Subdirectories auto-loaded as data units
    #[serde(default)]
    pub subsystems: Vec<String>,

    /// `location:ClassName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_entry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    entrypoint: Option<String>,

    /// Directory containing the manifest (absolute after discovery)
    #[serde(skip)]
    pub manifest_dir: PathBuf,

    /// Search root the module was found under
    #[serde(skip)]
    pub root: PathBuf,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "version must be a string or number, got {:?}",
            other
        ))),
    }
}

impl RuleModuleManifest {
    /// Minimal manifest, mostly for tests and programmatic registration.
    pub fn new(id: impl Into<String>, entry_point: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: String::new(),
            description: None,
            icon: None,
            subsystems: Vec::new(),
            entry_point: Some(entry_point.into()),
            file_entry: None,
            entrypoint: None,
            manifest_dir: PathBuf::new(),
            root: PathBuf::new(),
        }
    }

    /// Load `manifest.yaml`, recording its directory as `manifest_dir`.
    pub fn from_file(path: &Path) -> LoaderResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;
        let mut manifest = Self::parse(&content, path)?;
        manifest.manifest_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse manifest YAML without filesystem annotations.
    pub fn from_str(content: &str) -> LoaderResult<Self> {
        let manifest = Self::parse(content, Path::new(MANIFEST_FILE))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn parse(content: &str, path: &Path) -> LoaderResult<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| LoaderError::ManifestParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if value.is_null() {
            return Err(LoaderError::InvalidManifest {
                manifest_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                message: "manifest is empty".to_string(),
            });
        }
        serde_yaml::from_value(value).map_err(|e| LoaderError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn validate(&self) -> LoaderResult<()> {
        if self.id.trim().is_empty() {
            return Err(LoaderError::InvalidManifest {
                manifest_dir: self.manifest_dir.clone(),
                message: "Module id cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = dir.into();
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_subsystems(mut self, subsystems: &[&str]) -> Self {
        self.subsystems = subsystems.iter().map(|s| s.to_string()).collect();
        self
    }

    /// The entry point, checking `entry_point`, `file_entry`, then
    /// `entrypoint`.
    pub fn entry(&self) -> Option<&str> {
        self.entry_point
            .as_deref()
            .or(self.file_entry.as_deref())
            .or(self.entrypoint.as_deref())
            .filter(|e| !e.trim().is_empty())
    }

    /// Name to show users; falls back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
