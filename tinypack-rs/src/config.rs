//! Build configuration.
//!
//! A [`BundleConfig`] is usually deserialized from a `tinypack.config.json`
//! file. Every section is optional; missing fields fall back to the defaults
//! documented on each type.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::error::{BundleError, Result};
use crate::path::normalize_path;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILE_NAME: &str = "tinypack.config.json";

/// Entry name used when `entry` is a single path.
pub const DEFAULT_ENTRY_NAME: &str = "main";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleConfig {
    pub entry: EntryConfig,
    /// Root directory for entry paths and module ids. Defaults to the
    /// current working directory.
    pub context: Option<PathBuf>,
    pub output: OutputConfig,
    pub module: ModuleConfig,
    pub resolve: ResolveConfig,
    /// Names of built-in plugins to apply.
    pub plugins: Vec<String>,
}

impl BundleConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| BundleError::config(err.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| BundleError::config(err.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json)
            .map_err(|err| BundleError::config(format!("{}: {}", path.display(), err)))
    }

    /// Absolute, normalized context directory.
    pub fn context_dir(&self) -> Result<PathBuf> {
        let context = match &self.context {
            Some(context) if context.is_absolute() => context.clone(),
            maybe_context => {
                let cwd = std::env::current_dir().map_err(|err| {
                    BundleError::config(format!("cannot determine working directory: {}", err))
                })?;
                match maybe_context {
                    Some(context) => cwd.join(context),
                    None => cwd,
                }
            }
        };
        Ok(normalize_path(&context))
    }

    /// Output directory, relative paths are taken from `context`.
    pub fn output_dir(&self, context: &Path) -> PathBuf {
        normalize_path(&context.join(&self.output.path))
    }
}

/// Either a single entry path (named [`DEFAULT_ENTRY_NAME`]) or an ordered
/// mapping from entry name to path.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Single(String),
    Named(IndexMap<String, String>),
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig::Single("./src/index.js".to_string())
    }
}

impl EntryConfig {
    /// `(name, path)` pairs in declaration order.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        match self {
            EntryConfig::Single(path) => vec![(DEFAULT_ENTRY_NAME, path.as_str())],
            EntryConfig::Named(entries) => entries
                .iter()
                .map(|(name, path)| (name.as_str(), path.as_str()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    /// File name pattern, `[name]` is replaced by the entry name.
    pub filename: String,
    /// Remove the output directory before writing.
    pub clean: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dist"),
            filename: "[name].js".to_string(),
            clean: false,
        }
    }
}

impl OutputConfig {
    pub fn filename_for(&self, entry_name: &str) -> String {
        self.filename.replace("[name]", entry_name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    pub rules: Vec<RuleConfig>,
}

/// `{ test, exclude?, use }`: the loaders in `use` apply to every file whose
/// path matches `test` and does not match `exclude`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(deserialize_with = "deserialize_regex")]
    pub test: Regex,
    #[serde(default, deserialize_with = "deserialize_optional_regex")]
    pub exclude: Option<Regex>,
    #[serde(rename = "use", deserialize_with = "deserialize_one_or_many")]
    pub loaders: Vec<String>,
}

impl RuleConfig {
    pub fn new(test: &str, loaders: &[&str]) -> Result<Self> {
        Ok(Self {
            test: compile_pattern(test)?,
            exclude: None,
            loaders: loaders.iter().map(|loader| loader.to_string()).collect(),
        })
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        self.exclude = Some(compile_pattern(pattern)?);
        Ok(self)
    }

    /// Whether this rule applies to `path` (forward-slash form).
    pub fn matches(&self, path: &str) -> bool {
        self.test.is_match(path)
            && !self
                .exclude
                .as_ref()
                .is_some_and(|exclude| exclude.is_match(path))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    /// Extensions probed, in order, after the specifier itself.
    pub extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".js".to_string()],
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|err| BundleError::config(format!("invalid pattern '{}': {}", pattern, err)))
}

fn deserialize_regex<'de, D>(deserializer: D) -> std::result::Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    let pattern = String::deserialize(deserializer)?;
    Regex::new(&pattern).map_err(serde::de::Error::custom)
}

fn deserialize_optional_regex<'de, D>(deserializer: D) -> std::result::Result<Option<Regex>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|pattern| Regex::new(&pattern))
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn deserialize_one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(loader) => vec![loader],
        OneOrMany::Many(loaders) => loaders,
    })
}
