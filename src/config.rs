//! Configuration module for the binding generator.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `BF_` and use double underscores
//! to separate nested levels:
//! - `BF_ROOT_MODULE=OCP` sets `root_module`
//! - `BF_BIND__OUTPUT_DIR=out` sets `bind.output_dir`
//! - `BF_LOGGING__LEVEL=debug` sets `logging.level`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory holding the settings file, searched for in the current
/// directory and its ancestors.
pub const CONFIG_DIR: &str = ".bindforge";

const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Text written at the top of every generated source unit
    #[serde(default)]
    pub preamble: String,

    /// Name of the extension module that hosts every submodule
    #[serde(default = "default_root_module")]
    pub root_module: String,

    /// Header discovery and parsing
    #[serde(default)]
    pub parse: ParseConfig,

    /// Emission settings
    #[serde(default)]
    pub bind: BindConfig,

    /// Global exclusions
    #[serde(default)]
    pub exclude: ExcludeConfig,

    /// Per-module settings, keyed by module name
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,

    /// Per-class settings, keyed by register name
    #[serde(default)]
    pub classes: BTreeMap<String, ClassConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ParseConfig {
    /// Directory scanned for headers by the tree-sitter front end
    #[serde(default = "default_include_dir")]
    pub include_dir: PathBuf,

    /// Suffixes of headers considered for binding
    #[serde(default = "default_header_extensions")]
    pub header_extensions: Vec<String>,

    /// Header file names that are never bound
    #[serde(default)]
    pub excluded_headers: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BindConfig {
    /// Headers included by every generated unit
    #[serde(default = "default_common_headers")]
    pub common_headers: Vec<String>,

    /// Directory the generated sources are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Reference-counted root type; it and its descendants get handle ownership
    #[serde(default = "default_handle_root")]
    pub handle_root: String,

    /// Holder template for handle ownership
    #[serde(default = "default_handle_holder")]
    pub handle_holder: String,

    /// Holder template for shared ownership
    #[serde(default = "default_shared_holder")]
    pub shared_holder: String,

    /// Holder template for classes whose destructor is not public
    #[serde(default = "default_nodelete_holder")]
    pub nodelete_holder: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ExcludeConfig {
    /// Glob patterns matched against class register names
    #[serde(default)]
    pub classes: Vec<String>,

    /// Base classes never emitted in a base list
    #[serde(default)]
    pub base_classes: Vec<String>,

    /// Excluded modules keyed by platform (`linux`, `macos`, `windows`) or `any`
    #[serde(default)]
    pub modules: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ModuleConfig {
    #[serde(default)]
    pub excluded_functions: Vec<String>,

    #[serde(default)]
    pub excluded_classes: Vec<String>,

    #[serde(default)]
    pub excluded_typedefs: Vec<String>,

    /// Headers added to the module unit before the module includes
    #[serde(default)]
    pub extra_headers: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ClassConfig {
    /// Source lines injected before the class registration
    #[serde(default)]
    pub before: Vec<String>,

    /// Source lines injected after the class registration
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub excluded_methods: Vec<String>,

    /// Constructors excluded by their parameter type list, e.g. `"const gp_Pnt &"`.
    /// An empty string excludes the default constructor.
    #[serde(default)]
    pub excluded_constructors: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when `BINDFORGE_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_root_module() -> String {
    "OCCT".to_string()
}
fn default_include_dir() -> PathBuf {
    PathBuf::from("inc")
}
fn default_header_extensions() -> Vec<String> {
    vec![".hxx".to_string(), ".h".to_string()]
}
fn default_common_headers() -> Vec<String> {
    vec!["pybind11/pybind11.h".to_string()]
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("src")
}
fn default_handle_root() -> String {
    "Standard_Transient".to_string()
}
fn default_handle_holder() -> String {
    "opencascade::handle".to_string()
}
fn default_shared_holder() -> String {
    "std::shared_ptr".to_string()
}
fn default_nodelete_holder() -> String {
    "shared_ptr_nodelete".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            preamble: String::new(),
            root_module: default_root_module(),
            parse: ParseConfig::default(),
            bind: BindConfig::default(),
            exclude: ExcludeConfig::default(),
            modules: BTreeMap::new(),
            classes: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            include_dir: default_include_dir(),
            header_extensions: default_header_extensions(),
            excluded_headers: Vec::new(),
        }
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            common_headers: default_common_headers(),
            output_dir: default_output_dir(),
            handle_root: default_handle_root(),
            handle_holder: default_handle_holder(),
            shared_holder: default_shared_holder(),
            nodelete_holder: default_nodelete_holder(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Platform key used for `[exclude.modules]`
pub fn platform_key() -> &'static str {
    std::env::consts::OS
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single underscore
            // stays part of the field name
            .merge(Env::prefixed("BF_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for the config directory,
    /// from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'bindforge init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Excluded modules for the current platform plus the `any` list
    pub fn excluded_modules(&self) -> impl Iterator<Item = &String> {
        ["any", platform_key()]
            .into_iter()
            .filter_map(|key| self.exclude.modules.get(key))
            .flatten()
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Same as [`Settings::init_config_file`] rooted at `dir`
    pub fn init_config_file_in(
        dir: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# bindforge configuration file

# Version of the configuration schema
version = 1

# Text written at the top of every generated source unit
preamble = ""

# Extension module hosting one submodule per header prefix
root_module = "OCCT"

[parse]
# Directory scanned by `--headers` when no directory is given
include_dir = "inc"

# Only headers with these suffixes are bound
header_extensions = [".hxx", ".h"]

# Header file names that are never bound
excluded_headers = []

[bind]
# Included at the top of every generated unit
common_headers = ["pybind11/pybind11.h"]

# Generated sources land here (replaced atomically on success)
output_dir = "src"

# Classes deriving from this type are held by `handle_holder`
handle_root = "{handle_root}"
handle_holder = "opencascade::handle"
shared_holder = "std::shared_ptr"
nodelete_holder = "shared_ptr_nodelete"

[exclude]
# Glob patterns matched against class register names
classes = []

# Base classes never emitted in a base list
base_classes = []

[exclude.modules]
# Modules excluded on every platform; other keys are platform names
# as reported by Rust (linux, macos, windows)
any = []

# Per-module settings
# [modules.gp]
# excluded_functions = []
# excluded_classes = []
# excluded_typedefs = []
# extra_headers = []

# Per-class settings
# [classes.gp_Pnt]
# before = []
# after = []
# excluded_methods = []
# excluded_constructors = []

[logging]
# Default log filter, overridden by BINDFORGE_LOG
level = "warn"
"#,
            handle_root = default_handle_root(),
        );

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}
