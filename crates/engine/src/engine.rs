//! Engine facade.
//!
//! Ties configuration, discovery and loading together and routes each
//! character to the rules module it names (or the configured default).

use std::path::PathBuf;

use dndcs_domain::{Character, DerivedStats, DomainError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::modules::{Discovery, LoadedModule, ModuleLoader, RuleModuleManifest, RulesetRegistry};

/// What a module picker needs to show for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl From<&RuleModuleManifest> for ModuleSummary {
    fn from(manifest: &RuleModuleManifest) -> Self {
        Self {
            id: manifest.id.clone(),
            name: manifest.display_name().to_string(),
            version: manifest.version.clone(),
            description: manifest.description.clone(),
            icon: manifest.icon.clone(),
        }
    }
}

/// Entry point for hosts: list modules, create, validate and derive
/// characters.
#[derive(Debug, Clone)]
pub struct Engine {
    loader: ModuleLoader,
}

impl Engine {
    pub fn new(config: EngineConfig, registry: RulesetRegistry) -> Self {
        Self {
            loader: ModuleLoader::new(config, registry),
        }
    }

    /// Configuration from `.env` files and the environment, with the
    /// built-in rulesets registered.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::load(), RulesetRegistry::builtin())
    }

    pub fn config(&self) -> &EngineConfig {
        self.loader.config()
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    pub fn search_paths(&self, extra: &[PathBuf]) -> Vec<PathBuf> {
        self.loader.search_paths(extra)
    }

    pub fn discover(&self) -> Discovery {
        self.loader.discover()
    }

    /// One summary per module id, in discovery order.
    pub fn list_modules(&self) -> Vec<ModuleSummary> {
        let discovery = self.discover();
        let mut summaries: Vec<ModuleSummary> = Vec::new();
        for manifest in &discovery.manifests {
            if summaries.iter().any(|s| s.id == manifest.id) {
                continue;
            }
            summaries.push(ModuleSummary::from(manifest));
        }
        summaries
    }

    pub fn load_module(&self, id: &str) -> EngineResult<LoadedModule> {
        self.loader
            .load_module_by_manifest_id(id)?
            .ok_or_else(|| EngineError::ModuleNotFound(id.to_string()))
    }

    pub fn default_module(&self) -> EngineResult<LoadedModule> {
        self.load_module(&self.config().default_module_id)
    }

    /// The character's module, or the default when it names none.
    pub fn module_for(&self, character: &Character) -> EngineResult<LoadedModule> {
        let id = character.module.trim();
        if id.is_empty() {
            self.default_module()
        } else {
            self.load_module(id)
        }
    }

    /// A level-`level` character seeded with the module's templates.
    pub fn new_character(
        &self,
        name: &str,
        level: i32,
        module_id: Option<&str>,
    ) -> EngineResult<Character> {
        let module = match module_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.load_module(id)?,
            None => self.default_module()?,
        };
        let rules = module.rules();

        let mut character = Character::new(name, level).with_module(module.id());
        for (ability, score) in rules.template_abilities() {
            character = character.with_ability(ability, score);
        }
        for skill in rules.template_skills() {
            character = character.with_skill(skill);
        }
        Ok(character)
    }

    #[instrument(skip_all, fields(character = %character.name))]
    pub fn validate(&self, character: &Character) -> EngineResult<Vec<String>> {
        let module = self.module_for(character)?;
        let issues = module.rules().validate(character);
        debug!(module = %module.id(), issues = issues.len(), "Validated character");
        Ok(issues)
    }

    #[instrument(skip_all, fields(character = %character.name))]
    pub fn derive(&self, character: &Character) -> EngineResult<DerivedStats> {
        let module = self.module_for(character)?;
        Ok(module.rules().derive(character))
    }

    /// Parse a character payload, reporting shape problems as
    /// [`DomainError::InvalidCharacter`].
    pub fn parse_character(&self, json: &str) -> EngineResult<Character> {
        Character::from_json(json).map_err(EngineError::from)
    }
}

/// Parse without an engine at hand.
pub fn parse_character(json: &str) -> Result<Character, DomainError> {
    Character::from_json(json)
}
