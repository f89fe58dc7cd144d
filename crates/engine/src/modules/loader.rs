//! Resolving manifests to ruleset factories and instantiating them.
//!
//! A module moves through: discovered (manifest parsed) → resolved (entry
//! point bound to a factory) → instantiated (factory called).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dndcs_domain::RulesModule;
use tracing::{debug, info};

use super::discovery::{discover_modules, module_search_paths, Discovery};
use super::entry_point::{EntryLocation, EntryPoint};
use super::manifest::RuleModuleManifest;
use super::registry::{ModuleContext, RulesetFactory, RulesetRegistry};
use super::subsystem::Unit;
use crate::config::EngineConfig;
use crate::error::{LoaderError, LoaderResult};

/// A manifest whose entry point has been bound to a factory.
#[derive(Clone)]
pub struct ResolvedModule {
    pub manifest: RuleModuleManifest,
    pub entry: EntryPoint,
    pub location: EntryLocation,
    factory: RulesetFactory,
}

impl fmt::Debug for ResolvedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedModule")
            .field("id", &self.manifest.id)
            .field("entry", &self.entry)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// An instantiated rules module together with its manifest.
#[derive(Clone)]
pub struct LoadedModule {
    manifest: RuleModuleManifest,
    rules: Arc<dyn RulesModule>,
}

impl LoadedModule {
    pub fn new(manifest: RuleModuleManifest, rules: Arc<dyn RulesModule>) -> Self {
        Self { manifest, rules }
    }

    pub fn manifest(&self) -> &RuleModuleManifest {
        &self.manifest
    }

    pub fn rules(&self) -> &Arc<dyn RulesModule> {
        &self.rules
    }

    pub fn id(&self) -> &str {
        self.rules.id()
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("id", &self.rules.id())
            .field("manifest_dir", &self.manifest.manifest_dir)
            .finish()
    }
}

/// Discovers and loads rules modules.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    config: EngineConfig,
    registry: RulesetRegistry,
}

impl ModuleLoader {
    pub fn new(config: EngineConfig, registry: RulesetRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &RulesetRegistry {
        &self.registry
    }

    /// Search roots in precedence order, with `extra` appended last.
    pub fn search_paths(&self, extra: &[PathBuf]) -> Vec<PathBuf> {
        module_search_paths(&self.config, extra)
    }

    /// Scan all search roots. Re-run to pick up newly dropped-in modules.
    pub fn discover(&self) -> Discovery {
        discover_modules(&self.search_paths(&[]))
    }

    /// Bind a manifest's entry point to a registered factory.
    pub fn resolve(&self, manifest: &RuleModuleManifest) -> LoaderResult<ResolvedModule> {
        let raw = manifest.entry().ok_or_else(|| LoaderError::MissingEntryPoint {
            id: manifest.id.clone(),
            manifest_dir: manifest.manifest_dir.clone(),
        })?;
        let entry = EntryPoint::parse(raw, &manifest.manifest_dir)?;
        let location = entry.resolve(&manifest.manifest_dir, &self.registry)?;

        let factory = match &location {
            EntryLocation::File(_) => self.registry.factory(&entry.class_name),
            EntryLocation::Import(path) => self.registry.factory_via(path, &entry.class_name),
        }
        .ok_or_else(|| LoaderError::UnknownClass {
            class_name: entry.class_name.clone(),
            manifest_dir: manifest.manifest_dir.clone(),
        })?;

        debug!(module = %manifest.id, ?location, class = %entry.class_name, "Resolved entry point");

        Ok(ResolvedModule {
            manifest: manifest.clone(),
            entry,
            location,
            factory,
        })
    }

    /// Call the factory, loading the entry unit first for file entry points.
    pub fn instantiate(&self, resolved: ResolvedModule) -> LoaderResult<LoadedModule> {
        let entry_unit = match &resolved.location {
            EntryLocation::File(path) => Some(Unit::load(path)?),
            EntryLocation::Import(_) => None,
        };
        let context = ModuleContext {
            manifest: resolved.manifest.clone(),
            entry_unit,
        };
        let rules = (resolved.factory)(context)?;

        info!(
            module = %resolved.manifest.id,
            version = %resolved.manifest.version,
            "Loaded rules module"
        );
        Ok(LoadedModule::new(resolved.manifest, rules))
    }

    /// Resolve and instantiate in one step.
    pub fn load(&self, manifest: &RuleModuleManifest) -> LoaderResult<LoadedModule> {
        let resolved = self.resolve(manifest)?;
        self.instantiate(resolved)
    }

    /// Load the first discovered module with this id.
    ///
    /// `Ok(None)` when no manifest has the id; an error only when the
    /// matching module fails to load.
    pub fn load_module_by_manifest_id(&self, id: &str) -> LoaderResult<Option<LoadedModule>> {
        let discovery = self.discover();
        match discovery.find(id) {
            Some(manifest) => self.load(manifest).map(Some),
            None => {
                debug!(module = %id, "No manifest with this id");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dndcs_domain::{Ability, Character, DerivedStats, Skill};
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;

    /// Minimal ruleset used to observe what the loader hands to factories.
    struct EchoModule {
        id: String,
        entry_unit: Option<String>,
    }

    impl RulesModule for EchoModule {
        fn id(&self) -> &str {
            &self.id
        }

        fn display_name(&self) -> &str {
            self.entry_unit.as_deref().unwrap_or("no unit")
        }

        fn template_abilities(&self) -> BTreeMap<Ability, i32> {
            BTreeMap::new()
        }

        fn template_skills(&self) -> Vec<Skill> {
            Vec::new()
        }

        fn validate(&self, _character: &Character) -> Vec<String> {
            Vec::new()
        }

        fn derive(&self, _character: &Character) -> DerivedStats {
            DerivedStats::default()
        }
    }

    fn registry_with_echo() -> RulesetRegistry {
        let mut registry = RulesetRegistry::builtin();
        registry.register("EchoModule", |ctx: ModuleContext| {
            let module: Arc<dyn RulesModule> = Arc::new(EchoModule {
                id: ctx.manifest.id.clone(),
                entry_unit: ctx.entry_unit.map(|u| u.name),
            });
            Ok(module)
        });
        registry
    }

    fn write_module(root: &Path, dir: &str, manifest: &str) -> PathBuf {
        let module_dir = root.join(dir);
        std::fs::create_dir_all(&module_dir).expect("create module dir");
        std::fs::write(module_dir.join("manifest.yaml"), manifest).expect("write manifest");
        module_dir
    }

    fn loader_for(root: &Path) -> ModuleLoader {
        let config = EngineConfig::isolated(root).with_extra_root(root.join("addons"));
        ModuleLoader::new(config, registry_with_echo())
    }

    #[test]
    fn unknown_id_returns_none() {
        let temp_dir = TempDir::new().expect("temp dir");
        let loader = loader_for(temp_dir.path());
        let loaded = loader
            .load_module_by_manifest_id("nonexistent")
            .expect("lookup succeeds");
        assert!(loaded.is_none());
    }

    #[test]
    fn loads_module_through_import_path() {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().canonicalize().expect("canonical temp dir");
        write_module(
            &root.join("addons"),
            "stock_copy",
            "id: stock_copy\nentry_point: 'dndcs_rulesets.fivee_stock.module:FiveEStockModule'\n",
        );

        let loader = loader_for(&root);
        let loaded = loader
            .load_module_by_manifest_id("stock_copy")
            .expect("loads")
            .expect("found");
        assert_eq!(loaded.id(), "stock_copy");
        assert_eq!(
            loaded.manifest().manifest_dir,
            root.join("addons").join("stock_copy")
        );
    }

    #[test]
    fn file_entry_point_hands_unit_to_factory() {
        let temp_dir = TempDir::new().expect("temp dir");
        let module_dir = write_module(
            &temp_dir.path().join("addons"),
            "echo",
            "id: echo\nentry_point: 'rules.yaml:EchoModule'\n",
        );
        std::fs::write(module_dir.join("rules.yaml"), "FEATS: []\n").expect("write unit");

        let loader = loader_for(temp_dir.path());
        let loaded = loader
            .load_module_by_manifest_id("echo")
            .expect("loads")
            .expect("found");
        assert_eq!(loaded.rules().display_name(), "rules");
    }

    #[test]
    fn bare_identifier_uses_sibling_unit() {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().canonicalize().expect("canonical temp dir");
        let module_dir = write_module(
            &root.join("addons"),
            "echo",
            "id: echo\nentry_point: 'rules:EchoModule'\n",
        );
        std::fs::write(module_dir.join("rules.json"), "{}").expect("write unit");

        let loader = loader_for(&root);
        let resolved = loader
            .resolve(&loader.discover().manifests[0])
            .expect("resolves");
        assert_eq!(resolved.location, EntryLocation::File(module_dir.join("rules.json")));
    }

    #[test]
    fn unknown_class_is_an_error_for_that_module_only() {
        let temp_dir = TempDir::new().expect("temp dir");
        let addons = temp_dir.path().join("addons");
        write_module(&addons, "bad", "id: bad\nentry_point: 'rules.yaml:Missing'\n");
        std::fs::write(addons.join("bad").join("rules.yaml"), "{}\n").expect("write unit");
        write_module(
            &addons,
            "good",
            "id: good\nentry_point: 'dndcs.modules.fivee_stock.module:FiveEStockModule'\n",
        );

        let loader = loader_for(temp_dir.path());
        let err = loader
            .load_module_by_manifest_id("bad")
            .expect_err("unknown class");
        assert!(matches!(err, LoaderError::UnknownClass { .. }));

        assert!(loader
            .load_module_by_manifest_id("good")
            .expect("loads")
            .is_some());
    }

    #[test]
    fn missing_and_bad_entry_points() {
        let temp_dir = TempDir::new().expect("temp dir");
        let loader = loader_for(temp_dir.path());

        let missing = RuleModuleManifest::from_str("id: nothing\n").expect("manifest");
        assert!(matches!(
            loader.resolve(&missing),
            Err(LoaderError::MissingEntryPoint { .. })
        ));

        let bad = RuleModuleManifest::new("bad", "no-colon");
        assert!(matches!(
            loader.resolve(&bad),
            Err(LoaderError::BadEntryPoint { .. })
        ));

        let missing_file = RuleModuleManifest::new("gone", "gone.yaml:EchoModule")
            .with_manifest_dir(temp_dir.path());
        assert!(matches!(
            loader.load(&missing_file),
            Err(LoaderError::MissingFile { .. })
        ));
    }

    #[test]
    fn first_root_wins_for_duplicate_ids() {
        let temp_dir = TempDir::new().expect("temp dir");
        write_module(
            &temp_dir.path().join("mods"),
            "override",
            "id: fivee_stock\nentry_point: 'rules.yaml:EchoModule'\n",
        );
        std::fs::write(
            temp_dir.path().join("mods").join("override").join("rules.yaml"),
            "{}\n",
        )
        .expect("write unit");

        let config = EngineConfig::isolated(temp_dir.path())
            .with_builtin_root(crate::config::builtin_rulesets_dir());
        let loader = ModuleLoader::new(config, registry_with_echo());
        let loaded = loader
            .load_module_by_manifest_id("fivee_stock")
            .expect("loads")
            .expect("found");
        // The drop-in copy shadows the built-in ruleset
        assert_eq!(loaded.rules().display_name(), "rules");
    }
}
