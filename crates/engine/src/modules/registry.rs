//! Ruleset factory registry.
//!
//! Maps the class names used in manifest entry points to constructors, and
//! records which dotted import paths export which classes. Built-in rulesets
//! are registered by [`RulesetRegistry::builtin`]; callers may add their own.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use dndcs_domain::RulesModule;

use super::manifest::RuleModuleManifest;
use super::subsystem::Unit;
use crate::error::LoaderResult;
use crate::rulesets::fivee_stock::FiveEStockModule;

/// Everything a factory receives to build a ruleset.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    pub manifest: RuleModuleManifest,
    /// The unit file named by a file entry point, if any
    pub entry_unit: Option<Unit>,
}

impl ModuleContext {
    pub fn new(manifest: RuleModuleManifest) -> Self {
        Self {
            manifest,
            entry_unit: None,
        }
    }
}

/// Constructor for a ruleset.
pub type RulesetFactory =
    Arc<dyn Fn(ModuleContext) -> LoaderResult<Arc<dyn RulesModule>> + Send + Sync>;

/// Registry of ruleset classes.
#[derive(Clone, Default)]
pub struct RulesetRegistry {
    factories: BTreeMap<String, RulesetFactory>,
    import_paths: BTreeMap<String, BTreeSet<String>>,
}

impl fmt::Debug for RulesetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesetRegistry")
            .field("classes", &self.class_names())
            .field("import_paths", &self.import_paths)
            .finish()
    }
}

impl RulesetRegistry {
    /// Create a registry with all built-in rulesets.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(FiveEStockModule::CLASS_NAME, |ctx| {
            let module: Arc<dyn RulesModule> = Arc::new(FiveEStockModule::from_context(ctx)?);
            Ok(module)
        });
        for path in FiveEStockModule::IMPORT_PATHS {
            registry.register_import_path(path, FiveEStockModule::CLASS_NAME);
        }
        registry
    }

    /// Create an empty registry without built-in rulesets.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
            import_paths: BTreeMap::new(),
        }
    }

    /// Register a factory under a class name, replacing any previous one.
    pub fn register<F>(&mut self, class_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(ModuleContext) -> LoaderResult<Arc<dyn RulesModule>> + Send + Sync + 'static,
    {
        self.factories.insert(class_name.into(), Arc::new(factory));
        self
    }

    /// Declare that `import_path` exports `class_name`.
    pub fn register_import_path(
        &mut self,
        import_path: impl Into<String>,
        class_name: impl Into<String>,
    ) -> &mut Self {
        self.import_paths
            .entry(import_path.into())
            .or_default()
            .insert(class_name.into());
        self
    }

    pub fn has_import_path(&self, import_path: &str) -> bool {
        self.import_paths.contains_key(import_path)
    }

    /// Factory for a class name.
    pub fn factory(&self, class_name: &str) -> Option<RulesetFactory> {
        self.factories.get(class_name).cloned()
    }

    /// Factory for a class reached through an import path; the path must
    /// export the class.
    pub fn factory_via(&self, import_path: &str, class_name: &str) -> Option<RulesetFactory> {
        let exports = self.import_paths.get(import_path)?;
        if !exports.contains(class_name) {
            return None;
        }
        self.factory(class_name)
    }

    /// List all registered class names.
    pub fn class_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
