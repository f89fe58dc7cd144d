//! `entry_point` parsing and location resolution.
//!
//! An entry point reads `location:ClassName`. The location is either a data
//! unit file next to the manifest (`rules.yaml`, `sub/rules.json`), a bare
//! identifier naming such a sibling file without extension, or a dotted
//! import path registered in the [`RulesetRegistry`].

use std::path::{Path, PathBuf};

use super::registry::RulesetRegistry;
use crate::error::{LoaderError, LoaderResult};

/// Extensions recognized for data unit files.
pub const UNIT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// A parsed `location:ClassName` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub location: String,
    pub class_name: String,
}

/// Where the location part of an entry point resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLocation {
    /// A unit file, loaded and handed to the ruleset factory
    File(PathBuf),
    /// A registered import path
    Import(String),
}

impl EntryPoint {
    /// Split on the single `:`; both halves must be non-empty.
    pub fn parse(raw: &str, manifest_dir: &Path) -> LoaderResult<Self> {
        let bad = || LoaderError::BadEntryPoint {
            entry_point: raw.to_string(),
            manifest_dir: manifest_dir.to_path_buf(),
        };

        let mut parts = raw.split(':');
        let (Some(location), Some(class_name), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(bad());
        };

        let location = location.trim();
        let class_name = class_name.trim();
        if location.is_empty() || class_name.is_empty() {
            return Err(bad());
        }

        Ok(Self {
            location: location.to_string(),
            class_name: class_name.to_string(),
        })
    }

    /// Whether the location names a file rather than an identifier.
    pub fn is_file_location(&self) -> bool {
        has_unit_extension(Path::new(&self.location))
            || self.location.contains('/')
            || self.location.contains('\\')
    }

    /// Resolve the location against the manifest directory and registry.
    pub fn resolve(
        &self,
        manifest_dir: &Path,
        registry: &RulesetRegistry,
    ) -> LoaderResult<EntryLocation> {
        if self.is_file_location() {
            let path = manifest_dir.join(&self.location);
            if !path.is_file() {
                return Err(LoaderError::MissingFile { path });
            }
            return Ok(EntryLocation::File(path));
        }

        // A sibling unit file shadows a registered import path
        for ext in UNIT_EXTENSIONS {
            let candidate = manifest_dir.join(format!("{}.{}", self.location, ext));
            if candidate.is_file() {
                return Ok(EntryLocation::File(candidate));
            }
        }

        if registry.has_import_path(&self.location) {
            return Ok(EntryLocation::Import(self.location.clone()));
        }

        Err(LoaderError::UnresolvedLocation {
            location: self.location.clone(),
            manifest_dir: manifest_dir.to_path_buf(),
        })
    }
}

pub(crate) fn has_unit_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| UNIT_EXTENSIONS.iter().any(|u| ext.eq_ignore_ascii_case(u)))
}
