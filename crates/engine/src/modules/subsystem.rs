//! Data units and subsystem auto-loading.
//!
//! A module can spread its data across subdirectories listed under
//! `subsystems` in its manifest. Every `.yaml`/`.yml`/`.json` file in such a
//! directory is parsed into a [`Unit`]; rulesets then read the tables each
//! unit exports (top-level keys such as `FEATS` or `CLASSES`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::entry_point::has_unit_extension;
use super::manifest::RuleModuleManifest;
use crate::error::{LoaderError, LoaderResult};

/// File stems treated as package markers rather than data.
const PACKAGE_INIT_STEMS: [&str; 2] = ["mod", "__init__"];

/// One parsed data file.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// File stem, e.g. `basic` for `feats/basic.yaml`
    pub name: String,
    pub path: PathBuf,
    pub document: serde_yaml::Value,
}

impl Unit {
    /// Parse a unit file; JSON files go through `serde_json`, everything
    /// else through `serde_yaml`.
    pub fn load(path: &Path) -> LoaderResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let parsed: Result<serde_yaml::Value, String> = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        let document = parsed.map_err(|message| LoaderError::UnitParse {
            path: path.to_path_buf(),
            message,
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            path: path.to_path_buf(),
            document,
        })
    }

    /// Build a unit from an in-memory YAML document.
    pub fn from_yaml(name: impl Into<String>, content: &str) -> LoaderResult<Self> {
        let name = name.into();
        let document = serde_yaml::from_str(content).map_err(|e| LoaderError::UnitParse {
            path: PathBuf::from(&name),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: PathBuf::from(&name),
            name,
            document,
        })
    }

    /// Raw value of an exported table, if the unit defines it.
    pub fn export(&self, table: &str) -> Option<&serde_yaml::Value> {
        self.document.get(table)
    }

    /// Exported table deserialized into `T`.
    pub fn export_as<T: DeserializeOwned>(&self, table: &str) -> LoaderResult<Option<T>> {
        let Some(value) = self.export(table) else {
            return Ok(None);
        };
        serde_yaml::from_value(value.clone())
            .map(Some)
            .map_err(|e| LoaderError::UnitParse {
                path: self.path.clone(),
                message: format!("{}: {}", table, e),
            })
    }
}

fn is_unit_file(path: &Path) -> bool {
    if !path.is_file() || !has_unit_extension(path) {
        return false;
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    !PACKAGE_INIT_STEMS.contains(&stem)
}

/// Parse every unit file directly inside `dir`, sorted by file name.
pub fn load_units(dir: &Path) -> LoaderResult<Vec<Unit>> {
    let entries = std::fs::read_dir(dir).map_err(|e| LoaderError::io(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_unit_file(path))
        .collect();
    files.sort();
    files.iter().map(|path| Unit::load(path)).collect()
}

/// Shared base for rulesets: the manifest plus its auto-loaded subsystems.
#[derive(Debug, Clone)]
pub struct ModuleBase {
    manifest: RuleModuleManifest,
    subsystems: BTreeMap<String, Vec<Unit>>,
}

impl ModuleBase {
    /// Load every subsystem directory the manifest lists.
    ///
    /// Missing directories are skipped. A manifest without a directory
    /// (built programmatically) has no subsystems.
    pub fn new(manifest: RuleModuleManifest) -> LoaderResult<Self> {
        let mut subsystems = BTreeMap::new();

        if !manifest.manifest_dir.as_os_str().is_empty() {
            for section in &manifest.subsystems {
                let dir = manifest.manifest_dir.join(section);
                if !dir.is_dir() {
                    warn!(module = %manifest.id, "Subsystem directory missing: {:?}", dir);
                    continue;
                }
                let units = load_units(&dir)?;
                debug!(
                    module = %manifest.id,
                    subsystem = %section,
                    units = units.len(),
                    "Loaded subsystem"
                );
                if !units.is_empty() {
                    subsystems.insert(section.clone(), units);
                }
            }
        }

        Ok(Self {
            manifest,
            subsystems,
        })
    }

    pub fn manifest(&self) -> &RuleModuleManifest {
        &self.manifest
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    /// Units of one subsystem, empty if it was not loaded.
    pub fn subsystem(&self, name: &str) -> &[Unit] {
        self.subsystems.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn subsystem_names(&self) -> Vec<&str> {
        self.subsystems.keys().map(String::as_str).collect()
    }

    /// All units, in the order the manifest lists its subsystems.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.manifest
            .subsystems
            .iter()
            .flat_map(move |name| self.subsystem(name).iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dir");
        }
        std::fs::write(path, content).expect("write file");
    }

    #[test]
    fn loads_units_sorted_and_skips_package_init() {
        let temp_dir = TempDir::new().expect("temp dir");
        let feats = temp_dir.path().join("feats");
        write(&feats.join("b_more.yaml"), "FEATS: [{name: Lucky}]\n");
        write(&feats.join("a_basic.json"), r#"{"FEATS": [{"name": "Alert"}]}"#);
        write(&feats.join("__init__.yaml"), "ignored: true\n");
        write(&feats.join("mod.yml"), "ignored: true\n");
        write(&feats.join("notes.txt"), "not a unit");

        let units = load_units(&feats).expect("units");
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["a_basic", "b_more"]);
    }

    #[test]
    fn module_base_collects_listed_subsystems() {
        let temp_dir = TempDir::new().expect("temp dir");
        write(&temp_dir.path().join("feats/basic.yaml"), "FEATS: []\n");
        write(&temp_dir.path().join("unlisted/basic.yaml"), "FEATS: []\n");

        let manifest = RuleModuleManifest::new("homebrew", "x:Y")
            .with_manifest_dir(temp_dir.path())
            .with_subsystems(&["feats", "spells"]);
        let base = ModuleBase::new(manifest).expect("module base");

        assert_eq!(base.subsystem_names(), vec!["feats"]);
        assert_eq!(base.subsystem("feats").len(), 1);
        assert!(base.subsystem("spells").is_empty());
        assert_eq!(base.units().count(), 1);
    }

    #[test]
    fn unparsable_unit_fails_loading() {
        let temp_dir = TempDir::new().expect("temp dir");
        write(&temp_dir.path().join("feats/broken.yaml"), "FEATS: [unclosed\n");

        let manifest = RuleModuleManifest::new("homebrew", "x:Y")
            .with_manifest_dir(temp_dir.path())
            .with_subsystems(&["feats"]);
        assert!(matches!(
            ModuleBase::new(manifest),
            Err(LoaderError::UnitParse { .. })
        ));
    }

    #[test]
    fn export_as_deserializes_tables() {
        let unit = Unit::from_yaml("inline", "COMPANIONS:\n  owl: {ac: 11}\n").expect("unit");
        let table: Option<BTreeMap<String, serde_yaml::Value>> =
            unit.export_as("COMPANIONS").expect("table");
        assert!(table.is_some_and(|t| t.contains_key("owl")));

        let missing: Option<Vec<String>> = unit.export_as("FEATS").expect("no table");
        assert!(missing.is_none());

        let wrong: LoaderResult<Option<Vec<String>>> = unit.export_as("COMPANIONS");
        assert!(wrong.is_err());
    }
}
