//! Error types for module loading and the engine facade.

use std::path::PathBuf;

use dndcs_domain::DomainError;
use thiserror::Error;

/// Errors raised while discovering, resolving or instantiating a rules module.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Reading a manifest or unit file failed.
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `manifest.yaml` is not valid YAML for a manifest.
    #[error("Failed to parse manifest {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    /// Manifest parsed but is unusable (e.g. empty id).
    #[error("Invalid manifest in {}: {message}", manifest_dir.display())]
    InvalidManifest {
        manifest_dir: PathBuf,
        message: String,
    },

    /// No `entry_point` (or alias) in the manifest.
    #[error("No entry_point in manifest for {id} at {}", manifest_dir.display())]
    MissingEntryPoint { id: String, manifest_dir: PathBuf },

    /// `entry_point` is not of the form `location:ClassName`.
    #[error(
        "Bad entry_point '{entry_point}' (expected 'location:ClassName') in {}",
        manifest_dir.display()
    )]
    BadEntryPoint {
        entry_point: String,
        manifest_dir: PathBuf,
    },

    /// File location in `entry_point` does not exist.
    #[error("entry_point points to missing file: {}", path.display())]
    MissingFile { path: PathBuf },

    /// Bare location is neither a sibling unit file nor a registered import path.
    #[error("Cannot resolve entry location '{location}' from {}", manifest_dir.display())]
    UnresolvedLocation {
        location: String,
        manifest_dir: PathBuf,
    },

    /// Class name is not in the ruleset registry.
    #[error("Unknown ruleset class '{class_name}' for module in {}", manifest_dir.display())]
    UnknownClass {
        class_name: String,
        manifest_dir: PathBuf,
    },

    /// A data unit (entry file or subsystem file) could not be parsed.
    #[error("Failed to parse unit {}: {message}", path.display())]
    UnitParse { path: PathBuf, message: String },
}

impl LoaderError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for loader operations.
pub type LoaderResult<T> = std::result::Result<T, LoaderError>;

/// Errors surfaced by [`crate::Engine`].
#[derive(Error, Debug)]
pub enum EngineError {
    /// No discovered manifest has this id.
    #[error("Rules module not found: {0}")]
    ModuleNotFound(String),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
