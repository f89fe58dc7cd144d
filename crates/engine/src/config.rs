//! Engine configuration.
//!
//! Settings come from the process environment, optionally seeded from
//! `.env.local` / `.env` in the working directory. The resulting
//! [`EngineConfig`] is passed explicitly to the [`crate::Engine`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Module used when neither the character nor the environment names one.
pub const DEFAULT_MODULE_ID: &str = "fivee_stock";

/// Log filter used when neither `RUST_LOG` nor `DNDCS_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "dndcs_engine=info,dndcs_domain=info";

pub const ENV_DEFAULT_MODULE_ID: &str = "DNDCS_DEFAULT_MODULE_ID";
pub const ENV_MODULE_PATH: &str = "DNDCS_MODULE_PATH";
pub const ENV_LOG: &str = "DNDCS_LOG";

/// Drop-in modules directory, relative to the working directory.
const DROPIN_DIR: &str = "mods";

/// Repository add-on roots, relative to the working directory.
const REPO_ROOTS: [&str; 2] = ["main-Addons", "modules"];

/// Runtime configuration for module discovery and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Rules module id used for characters that do not name one
    pub default_module_id: String,
    /// Base for the drop-in (`mods/`) and repository add-on roots
    pub working_dir: PathBuf,
    /// Entries of `DNDCS_MODULE_PATH`, tilde-expanded
    pub module_path: Vec<PathBuf>,
    /// Per-OS user modules directory, if one can be determined
    pub user_modules_dir: Option<PathBuf>,
    /// Directories shipped with the engine
    pub builtin_roots: Vec<PathBuf>,
    /// Caller-supplied roots searched last
    pub extra_roots: Vec<PathBuf>,
    pub log_filter: String,
}

impl EngineConfig {
    /// Load `.env.local` then `.env` from the working directory, then read
    /// the environment.
    pub fn load() -> Self {
        let working_dir = current_dir();
        load_dotenv(&working_dir);
        Self::from_vars(|key| std::env::var(key).ok()).with_working_dir(working_dir)
    }

    /// Read configuration from the process environment only.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_module_id = lookup(ENV_DEFAULT_MODULE_ID)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MODULE_ID.to_string());

        let module_path = lookup(ENV_MODULE_PATH)
            .map(|raw| parse_module_path(&raw))
            .unwrap_or_default();

        let log_filter = lookup(ENV_LOG)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            default_module_id,
            working_dir: current_dir(),
            module_path,
            user_modules_dir: user_modules_dir(),
            builtin_roots: vec![builtin_rulesets_dir()],
            extra_roots: Vec::new(),
            log_filter,
        }
    }

    /// Configuration that only searches what the caller adds explicitly.
    ///
    /// No user directory and no built-in roots; drop-in and repository roots
    /// still resolve against `working_dir`.
    pub fn isolated(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_module_id: DEFAULT_MODULE_ID.to_string(),
            working_dir: working_dir.into(),
            module_path: Vec::new(),
            user_modules_dir: None,
            builtin_roots: Vec::new(),
            extra_roots: Vec::new(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    pub fn with_default_module_id(mut self, id: impl Into<String>) -> Self {
        self.default_module_id = id.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_module_path(mut self, paths: Vec<PathBuf>) -> Self {
        self.module_path = paths;
        self
    }

    pub fn with_user_modules_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_modules_dir = dir;
        self
    }

    pub fn with_builtin_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.builtin_roots.push(dir.into());
        self
    }

    pub fn with_extra_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_roots.push(dir.into());
        self
    }

    /// `<working_dir>/mods`
    pub fn dropin_dir(&self) -> PathBuf {
        self.working_dir.join(DROPIN_DIR)
    }

    /// `<working_dir>/main-Addons` and `<working_dir>/modules`
    pub fn repo_roots(&self) -> Vec<PathBuf> {
        REPO_ROOTS.iter().map(|r| self.working_dir.join(r)).collect()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Directory of rulesets shipped inside this crate.
pub fn builtin_rulesets_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("rulesets")
}

/// Per-OS user modules directory.
///
/// `$XDG_CONFIG_HOME/dndcs/modules` on Linux,
/// `~/Library/Application Support/DnDCS/modules` on macOS and
/// `%APPDATA%\DnDCS\modules` on Windows.
pub fn user_modules_dir() -> Option<PathBuf> {
    let app_dir = if cfg!(any(target_os = "windows", target_os = "macos")) {
        "DnDCS"
    } else {
        "dndcs"
    };
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(app_dir).join("modules"))
}

/// Split a platform path list, skipping blanks and expanding `~`.
pub fn parse_module_path(raw: &str) -> Vec<PathBuf> {
    std::env::split_paths(&OsString::from(raw))
        .filter_map(|p| {
            let entry = p.to_string_lossy().trim().to_string();
            if entry.is_empty() {
                None
            } else {
                Some(expand_tilde(&entry))
            }
        })
        .collect()
}

fn expand_tilde(entry: &str) -> PathBuf {
    let home = || directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    if entry == "~" {
        if let Some(home) = home() {
            return home;
        }
    } else if let Some(rest) = entry
        .strip_prefix("~/")
        .or_else(|| entry.strip_prefix("~\\"))
    {
        if let Some(home) = home() {
            return home.join(rest);
        }
    }
    PathBuf::from(entry)
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load environment files from `dir`, preferring local overrides.
///
/// Variables already set in the process are never overwritten, so the first
/// file to define a key wins.
pub fn load_dotenv(dir: &Path) {
    for filename in [".env.local", ".env"] {
        let path = dir.join(filename);
        if path.exists() {
            if let Err(e) = dotenvy::from_path(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load env file");
            }
        }
    }
}
