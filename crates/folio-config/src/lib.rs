//! Configuration management for Folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Files ending in
//! `.json`, `.yaml` or `.yml` are accepted when passed explicitly.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Path values and converter command arguments support `${VAR}` and
//! `${VAR:-default}` expansion.
//!
//! ## Theme Overrides
//!
//! `[[override]]` entries map reference paths to an alternate theme. They are
//! tried in file order and the first anchored pattern that matches wins, see
//! [`Config::theme_for`].

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override worker thread count.
    pub threads: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Project data directory, relative to the config file.
const PROJECT_DIRNAME: &str = ".folio";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    source: SourceConfigRaw,
    output: OutputConfigRaw,
    cache: CacheConfigRaw,
    theme: ThemeConfigRaw,
    #[serde(rename = "override")]
    overrides: Vec<OverrideConfigRaw>,
    #[serde(rename = "converter")]
    converters_raw: Option<Vec<ConverterConfig>>,
    /// Worker pool configuration.
    pub build: BuildConfig,
    /// Live reload configuration.
    pub watch: WatchConfig,

    /// Resolved source configuration (set after loading).
    #[serde(skip)]
    pub source_resolved: SourceConfig,
    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Resolved base theme (set after loading).
    #[serde(skip)]
    pub theme_resolved: ThemeConfig,
    /// Resolved path-pattern overrides, in declaration order.
    #[serde(skip)]
    pub overrides_resolved: Vec<PathOverride>,
    /// External converters, in registration order.
    #[serde(skip)]
    pub converters: Vec<ConverterConfig>,
    /// Project directory for folio data (`.folio/`).
    #[serde(skip)]
    pub project_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceConfigRaw {
    path: Option<String>,
    index_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    path: Option<String>,
    static_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    dir: Option<String>,
    enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ThemeConfigRaw {
    path: Option<String>,
    layout: Option<String>,
    contexts: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OverrideConfigRaw {
    pattern: String,
    theme_path: Option<String>,
    layout: Option<String>,
}

/// Resolved source tree configuration.
#[derive(Debug, Default)]
pub struct SourceConfig {
    /// Root of the markup source tree.
    pub path: PathBuf,
    /// Stem of the document that stands for its directory (`index`).
    pub index_name: String,
}

/// Resolved output tree configuration.
#[derive(Debug, Default)]
pub struct OutputConfig {
    /// Root of the generated site.
    pub path: PathBuf,
    /// Folder under the output root receiving theme assets.
    pub static_dir: String,
}

impl OutputConfig {
    /// Absolute location of the static asset folder.
    #[must_use]
    pub fn static_path(&self) -> PathBuf {
        self.path.join(&self.static_dir)
    }
}

/// Resolved content cache configuration.
#[derive(Debug, Default)]
pub struct CacheConfig {
    /// Flat directory holding one file per cache key.
    pub dir: PathBuf,
    /// When false, every node is regenerated and nothing is read back.
    pub enabled: bool,
}

/// Resolved theme configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThemeConfig {
    /// Theme directory (`templates/` and `static/`). `None` selects the built-in theme.
    pub path: Option<PathBuf>,
    /// Template name used for pages.
    pub layout: String,
    /// Extra values exposed to templates.
    pub contexts: BTreeMap<String, serde_json::Value>,
}

/// Theme chosen for one reference path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeSelection<'a> {
    /// Theme directory, `None` for the built-in theme.
    pub path: Option<&'a Path>,
    /// Template name.
    pub layout: &'a str,
}

/// A path-pattern theme override.
#[derive(Debug)]
pub struct PathOverride {
    pattern: Regex,
    /// Replacement theme directory.
    pub theme_path: Option<PathBuf>,
    /// Replacement layout template.
    pub layout: Option<String>,
}

impl PathOverride {
    /// Build an override from a pattern that must match the whole reference path.
    pub fn new(
        pattern: &str,
        theme_path: Option<PathBuf>,
        layout: Option<String>,
    ) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            ConfigError::Pattern {
                pattern: pattern.to_owned(),
                source,
            }
        })?;
        Ok(Self {
            pattern,
            theme_path,
            layout,
        })
    }

    /// Whether this override applies to `reference_path`.
    #[must_use]
    pub fn matches(&self, reference_path: &str) -> bool {
        self.pattern.is_match(reference_path)
    }
}

/// An external markup converter.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ConverterConfig {
    /// File extensions handled, without the dot (matched case-insensitively).
    pub extensions: Vec<String>,
    /// Program and arguments. `{input}` is replaced by the source path.
    pub command: Vec<String>,
}

impl ConverterConfig {
    fn default_rst() -> Self {
        Self {
            extensions: vec!["rst".to_owned()],
            command: vec!["rst2html".to_owned(), "{input}".to_owned()],
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Worker threads for interpretation and emission. 0 uses all cores.
    pub threads: usize,
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a batch of changes triggers a rebuild.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Config file extension is not one of toml, json, yaml, yml.
    #[error("Unsupported configuration format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    /// Override pattern is not a valid regex.
    #[error("Invalid override pattern {pattern:?}: {source}")]
    Pattern {
        /// Pattern as written in the config.
        pattern: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`source.path`").
        field: String,
        /// Error message (e.g., "${`DOCS_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    ///
    /// Relative directories resolve against the current directory.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.source_resolved.path = absolute(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.output_resolved.path = absolute(output_dir);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
        }
        if let Some(threads) = settings.threads {
            self.build.threads = threads;
        }
    }

    /// Theme for a reference path.
    ///
    /// The first override whose pattern matches wins. Fields the override
    /// leaves unset fall back to the base theme.
    #[must_use]
    pub fn theme_for(&self, reference_path: &str) -> ThemeSelection<'_> {
        let base = ThemeSelection {
            path: self.theme_resolved.path.as_deref(),
            layout: &self.theme_resolved.layout,
        };

        self.overrides_resolved
            .iter()
            .find(|o| o.matches(reference_path))
            .map_or(base, |o| ThemeSelection {
                path: o.theme_path.as_deref().or(base.path),
                layout: o.layout.as_deref().unwrap_or(base.layout),
            })
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let project_dir = base.join(PROJECT_DIRNAME);
        Self {
            source: SourceConfigRaw::default(),
            output: OutputConfigRaw::default(),
            cache: CacheConfigRaw::default(),
            theme: ThemeConfigRaw::default(),
            overrides: Vec::new(),
            converters_raw: None,
            build: BuildConfig::default(),
            watch: WatchConfig::default(),
            source_resolved: SourceConfig {
                path: base.join("docs"),
                index_name: "index".to_owned(),
            },
            output_resolved: OutputConfig {
                path: base.join("build"),
                static_dir: "_static".to_owned(),
            },
            cache_resolved: CacheConfig {
                dir: project_dir.join("cache"),
                enabled: true,
            },
            theme_resolved: ThemeConfig {
                path: None,
                layout: "default.html".to_owned(),
                contexts: BTreeMap::new(),
            },
            overrides_resolved: Vec::new(),
            converters: vec![ConverterConfig::default_rst()],
            project_dir,
            config_path: None,
        }
    }

    /// Load configuration from a specific file, choosing the parser by extension.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        let mut config: Self = match extension.as_deref() {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        config.resolve(&absolute(config_dir))?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.source_resolved.index_name, "source.index_name")?;
        require_non_empty(&self.theme_resolved.layout, "theme.layout")?;

        let static_dir = &self.output_resolved.static_dir;
        require_non_empty(static_dir, "output.static_dir")?;
        if static_dir.contains(['/', '\\']) || static_dir == "." || static_dir == ".." {
            return Err(ConfigError::Validation(format!(
                "output.static_dir must be a single folder name, got {static_dir:?}"
            )));
        }

        for (i, converter) in self.converters.iter().enumerate() {
            if converter.command.first().is_none_or(String::is_empty) {
                return Err(ConfigError::Validation(format!(
                    "converter[{i}].command cannot be empty"
                )));
            }
            if converter.extensions.iter().all(String::is_empty) {
                return Err(ConfigError::Validation(format!(
                    "converter[{i}].extensions must list at least one extension"
                )));
            }
        }

        Ok(())
    }

    /// Expand environment variables and resolve relative paths against the config directory.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let resolve_path = |raw: Option<&str>, default: &str, field: &str| {
            expand::expand_env(raw.unwrap_or(default), field).map(|p| config_dir.join(p))
        };

        self.project_dir = config_dir.join(PROJECT_DIRNAME);

        self.source_resolved = SourceConfig {
            path: resolve_path(self.source.path.as_deref(), "docs", "source.path")?,
            index_name: self
                .source
                .index_name
                .clone()
                .unwrap_or_else(|| "index".to_owned()),
        };

        self.output_resolved = OutputConfig {
            path: resolve_path(self.output.path.as_deref(), "build", "output.path")?,
            static_dir: self
                .output
                .static_dir
                .clone()
                .unwrap_or_else(|| "_static".to_owned()),
        };

        self.cache_resolved = CacheConfig {
            dir: match self.cache.dir.as_deref() {
                Some(dir) => config_dir.join(expand::expand_env(dir, "cache.dir")?),
                None => self.project_dir.join("cache"),
            },
            enabled: self.cache.enabled.unwrap_or(true),
        };

        self.theme_resolved = ThemeConfig {
            path: self
                .theme
                .path
                .as_deref()
                .map(|p| expand::expand_env(p, "theme.path").map(|p| config_dir.join(p)))
                .transpose()?,
            layout: self
                .theme
                .layout
                .clone()
                .unwrap_or_else(|| "default.html".to_owned()),
            contexts: std::mem::take(&mut self.theme.contexts),
        };

        self.overrides_resolved = self
            .overrides
            .iter()
            .map(|o| {
                let theme_path = o
                    .theme_path
                    .as_deref()
                    .map(|p| {
                        expand::expand_env(p, "override.theme_path").map(|p| config_dir.join(p))
                    })
                    .transpose()?;
                PathOverride::new(&o.pattern, theme_path, o.layout.clone())
            })
            .collect::<Result<_, _>>()?;

        self.converters = match self.converters_raw.take() {
            Some(converters) => converters
                .into_iter()
                .map(|c| {
                    let command = c
                        .command
                        .iter()
                        .map(|arg| expand::expand_env(arg, "converter.command"))
                        .collect::<Result<_, _>>()?;
                    Ok(ConverterConfig {
                        extensions: c.extensions,
                        command,
                    })
                })
                .collect::<Result<_, ConfigError>>()?,
            None => vec![ConverterConfig::default_rst()],
        };

        Ok(())
    }
}

/// `path` made absolute against the current directory, unchanged on failure.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
