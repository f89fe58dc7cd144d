//! Module discovery from the configured search roots.
//!
//! Roots are searched in this order (first wins on duplicates):
//!
//! 1. `<working_dir>/mods` (drop-in modules)
//! 2. each entry of `DNDCS_MODULE_PATH`
//! 3. the per-OS user modules directory
//! 4. repository add-on roots `main-Addons/` and `modules/` (if present)
//! 5. rulesets shipped with the engine (if present)
//! 6. caller-supplied extra roots
//!
//! Each module is a directory directly under a root containing a
//! `manifest.yaml`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::manifest::{RuleModuleManifest, MANIFEST_FILE};
use crate::config::EngineConfig;
use crate::error::LoaderError;

/// A manifest that could not be loaded. Other modules stay discoverable.
#[derive(Debug)]
pub struct ManifestFailure {
    pub manifest_path: PathBuf,
    pub error: LoaderError,
}

/// Outcome of scanning the search roots.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Parsed manifests in discovery order
    pub manifests: Vec<RuleModuleManifest>,
    pub failures: Vec<ManifestFailure>,
}

impl Discovery {
    /// First manifest in discovery order with this id.
    pub fn find(&self, id: &str) -> Option<&RuleModuleManifest> {
        self.manifests.iter().find(|m| m.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.manifests.iter().map(|m| m.id.as_str()).collect()
    }
}

/// Ordered, deduplicated list of roots to scan.
///
/// Paths are canonicalized when they exist and made absolute otherwise;
/// the first occurrence of each resolved path is kept.
pub fn module_search_paths(config: &EngineConfig, extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = vec![config.dropin_dir()];
    paths.extend(config.module_path.iter().cloned());
    paths.extend(config.user_modules_dir.iter().cloned());
    paths.extend(config.repo_roots().into_iter().filter(|p| p.exists()));
    paths.extend(config.builtin_roots.iter().filter(|p| p.exists()).cloned());
    paths.extend(config.extra_roots.iter().cloned());
    paths.extend(extra.iter().cloned());

    let mut seen = HashSet::new();
    paths
        .into_iter()
        .map(|p| resolve_path(&p, &config.working_dir))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

fn resolve_path(path: &Path, working_dir: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

/// Scan every root for `*/manifest.yaml`.
pub fn discover_modules(roots: &[PathBuf]) -> Discovery {
    let mut discovery = Discovery::default();
    for root in roots {
        discover_in_directory(root, &mut discovery);
    }
    info!(
        modules = discovery.manifests.len(),
        failures = discovery.failures.len(),
        "Discovered rules modules"
    );
    discovery
}

/// Discover modules directly under `root`, in directory-name order.
pub fn discover_in_directory(root: &Path, discovery: &mut Discovery) {
    if !root.is_dir() {
        return;
    }
    debug!("Scanning modules directory: {:?}", root);

    let entries = match std::fs::read_dir(root) {
        Ok(e) => e,
        Err(e) => {
            warn!("Failed to read modules directory {:?}: {}", root, e);
            return;
        }
    };

    let mut module_dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    module_dirs.sort();

    for dir in module_dirs {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            continue;
        }

        match RuleModuleManifest::from_file(&manifest_path) {
            Ok(manifest) => {
                debug!(
                    "Discovered module: {} v{} at {:?}",
                    manifest.id, manifest.version, dir
                );
                discovery.manifests.push(manifest.with_root(root));
            }
            Err(error) => {
                warn!("Failed to load manifest from {:?}: {}", manifest_path, error);
                discovery.failures.push(ManifestFailure {
                    manifest_path,
                    error,
                });
            }
        }
    }
}
