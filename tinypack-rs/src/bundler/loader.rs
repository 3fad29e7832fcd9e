//! Loader pipeline.
//!
//! A loader is a text-to-text transform selected by matching a module's path
//! against the configured rules. Loaders from every matching rule are
//! concatenated in rule order and then run right to left, so for
//! `use: ["a", "b"]` the module source becomes `a(b(raw))`.

use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use super::text::{JsonLoader, StripBomLoader};
use crate::config::RuleConfig;
use crate::error::{BundleError, Result};
use crate::path::to_unix_path;

pub trait Loader {
    fn name(&self) -> &str;

    /// Transforms the module source. `path` is informational.
    fn transform(&self, source: &str, path: &Path) -> anyhow::Result<String>;
}

/// Adapts a closure into a named [`Loader`].
pub struct FnLoader<F> {
    name: String,
    transform: F,
}

impl<F> FnLoader<F>
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    pub fn new(name: impl Into<String>, transform: F) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }
}

impl<F> Loader for FnLoader<F>
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, source: &str, _path: &Path) -> anyhow::Result<String> {
        (self.transform)(source)
    }
}

/// Maps the loader references used in rules to loader values.
///
/// The default registry contains the built-in `strip-bom` and `json` loaders.
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Rc<dyn Loader>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(StripBomLoader);
        registry.register(JsonLoader);
        registry
    }
}

impl LoaderRegistry {
    pub fn empty() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    /// Registers `loader` under its name, replacing any loader of the same name.
    pub fn register(&mut self, loader: impl Loader + 'static) {
        self.loaders
            .insert(loader.name().to_string(), Rc::new(loader));
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Loader>> {
        self.loaders.get(name).cloned()
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.loaders.keys().collect();
        names.sort();
        f.debug_struct("LoaderRegistry")
            .field("loaders", &names)
            .finish()
    }
}

struct CompiledRule {
    rule: RuleConfig,
    loaders: Vec<Rc<dyn Loader>>,
}

/// Rules with their loader references resolved.
pub struct LoaderPipeline {
    rules: Vec<CompiledRule>,
}

impl LoaderPipeline {
    /// Resolves every loader reference in `rules`. An unknown reference is a
    /// configuration error.
    pub fn new(rules: &[RuleConfig], registry: &LoaderRegistry) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let loaders = rule
                    .loaders
                    .iter()
                    .map(|name| {
                        registry.get(name).ok_or_else(|| {
                            BundleError::config(format!("unknown loader '{}'", name))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledRule {
                    rule: rule.clone(),
                    loaders,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Loaders that apply to `path`, in declaration order.
    pub fn loaders_for(&self, path: &Path) -> Vec<Rc<dyn Loader>> {
        let path = to_unix_path(&path.to_string_lossy());
        self.rules
            .iter()
            .filter(|compiled| compiled.rule.matches(&path))
            .flat_map(|compiled| compiled.loaders.iter().cloned())
            .collect()
    }

    /// Runs the loaders for `path` over `source`, last declared first.
    pub fn apply(&self, path: &Path, source: String) -> Result<String> {
        self.loaders_for(path)
            .iter()
            .rev()
            .try_fold(source, |source, loader| {
                debug!("applying loader '{}' to {}", loader.name(), path.display());
                loader
                    .transform(&source, path)
                    .map_err(|source| BundleError::Transform {
                        loader: loader.name().to_string(),
                        path: path.to_path_buf(),
                        source,
                    })
            })
    }
}
