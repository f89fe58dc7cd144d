//! DnDCS engine library.
//!
//! Finds rules modules on disk, loads them through the ruleset registry and
//! routes characters to them.
//!
//! ## Structure
//!
//! - `config` - Environment-driven settings passed to the [`Engine`]
//! - `modules/` - Manifests, discovery, entry points, subsystems and loading
//! - `rulesets/` - Rulesets compiled into the engine (stock 5e)
//! - `engine` - Facade used by hosts

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod modules;
pub mod rulesets;

pub use config::EngineConfig;
pub use engine::{parse_character, Engine, ModuleSummary};
pub use error::{EngineError, EngineResult, LoaderError, LoaderResult};
pub use logging::init_tracing;
pub use modules::{
    Discovery, LoadedModule, ModuleBase, ModuleContext, ModuleLoader, RuleModuleManifest,
    RulesetRegistry, Unit,
};
pub use rulesets::FiveEStockModule;
