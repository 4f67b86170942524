//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/costtree/costtree.toml`
//! 3. Local config: `<dir>/.costtree.toml` (working directory or `-C <dir>`)
//! 4. Environment variables: `COSTTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "CompanyTree.json";

/// Raw settings for intermediate parsing (all optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub output: Option<PathBuf>,
    pub pretty: Option<bool>,
    pub strict_expenses: Option<bool>,
    pub root_markers: Option<Vec<String>>,
}

/// Unified configuration for costtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Where `build` writes the company tree (default: CompanyTree.json)
    pub output: PathBuf,
    /// Pretty-print the JSON document
    pub pretty: bool,
    /// Fail when travels reference companies missing from the company list
    pub strict_expenses: bool,
    /// `parentId` values that mean "no parent"
    pub root_markers: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            pretty: true,
            strict_expenses: false,
            root_markers: vec![String::new(), "0".into()],
        }
    }
}

/// Get the XDG config directory for costtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "costtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("costtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".costtree.toml")
}

/// Expand shell variables and tilde in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are added to base
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Duplicates are de-duplicated
///
/// # Examples
/// ```ignore
/// merge_array(&["", "0"], &["root"]) // → ["", "0", "root"]
/// merge_array(&["", "0"], &["!0"])   // → [""]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: HashSet<String> = base.iter().cloned().collect();

    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.remove(negated);
        } else {
            result.insert(pattern.clone());
        }
    }

    // Convert to sorted Vec for deterministic output
    let mut vec: Vec<String> = result.into_iter().collect();
    vec.sort();
    vec
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.output.to_string_lossy().as_ref());
        self.output = PathBuf::from(expanded);
    }

    /// Apply global config onto defaults: every specified value REPLACES.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            output: global.output.clone().unwrap_or_else(|| self.output.clone()),
            pretty: global.pretty.unwrap_or(self.pretty),
            strict_expenses: global.strict_expenses.unwrap_or(self.strict_expenses),
            root_markers: global
                .root_markers
                .clone()
                .unwrap_or_else(|| self.root_markers.clone()),
        }
    }

    /// Merge local config onto self: scalars replace, `root_markers` unions
    /// with negation support.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            root_markers: overlay
                .root_markers
                .as_ref()
                .map(|o| merge_array(&self.root_markers, o))
                .unwrap_or_else(|| self.root_markers.clone()),
            ..self.apply_global(&RawSettings {
                root_markers: None,
                ..overlay.clone()
            })
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.costtree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config (REPLACES defaults)
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        // 3. Local config (arrays UNION with global)
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("local config: {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (replace - explicit override)
        current = current.apply_env_overrides(None)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply COSTTREE_* environment variables as explicit overrides.
    ///
    /// `source` replaces the process environment when given.
    fn apply_env_overrides(
        mut self,
        source: Option<config::Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        // Values stay strings; numeric-looking markers such as "0" must not
        // turn into integers before the list is split.
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("COSTTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .source(source),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(config.get_string("output"), "COSTTREE_OUTPUT")? {
            self.output = PathBuf::from(val);
        }
        if let Some(val) = env_value(config.get_bool("pretty"), "COSTTREE_PRETTY")? {
            self.pretty = val;
        }
        if let Some(val) = env_value(
            config.get_bool("strict_expenses"),
            "COSTTREE_STRICT_EXPENSES",
        )? {
            self.strict_expenses = val;
        }
        if let Some(val) = env_value(config.get_string("root_markers"), "COSTTREE_ROOT_MARKERS")? {
            self.root_markers = split_markers(&val);
        }

        Ok(self)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# costtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/costtree/costtree.toml
#   Local:  <dir>/.costtree.toml   (working directory or -C <dir>)
#   Env:    COSTTREE_* environment variables (explicit overrides)
#
# Local root_markers UNION with global ones; "!value" removes an inherited marker.

# File written by `costtree build`
# output = "CompanyTree.json"

# Pretty-print the JSON document
# pretty = true

# Fail when travels reference companies missing from the company list
# strict_expenses = false

# parentId values that mean "no parent"
# root_markers = ["", "0"]
"#
        .to_string()
    }
}

/// An unset variable is `None`; a set one that does not parse is an error.
fn env_value<T>(
    result: Result<T, ConfigError>,
    var: &str,
) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("{var}: {e}"),
        }),
    }
}

/// Comma-separated marker list; surrounding whitespace is dropped, empty
/// entries are kept since `""` is itself a marker.
fn split_markers(val: &str) -> Vec<String> {
    val.split(',').map(|m| m.trim().to_string()).collect()
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
