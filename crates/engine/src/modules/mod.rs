//! Rules module discovery and loading.

pub mod discovery;
pub mod entry_point;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod subsystem;

pub use discovery::{
    discover_in_directory, discover_modules, module_search_paths, Discovery, ManifestFailure,
};
pub use entry_point::{EntryLocation, EntryPoint, UNIT_EXTENSIONS};
pub use loader::{LoadedModule, ModuleLoader, ResolvedModule};
pub use manifest::{RuleModuleManifest, MANIFEST_FILE};
pub use registry::{ModuleContext, RulesetFactory, RulesetRegistry};
pub use subsystem::{load_units, ModuleBase, Unit};
