//! Module graph construction.
//!
//! Modules are built depth-first from each entry. Every canonical id has a
//! [`BuildStatus`] for the whole run, so a file is built at most once no
//! matter how many modules (or entries) require it, and cyclic requires
//! terminate.

use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use super::loader::LoaderPipeline;
use super::rewrite::DependencyRewriter;
use crate::error::{BundleError, Result};
use crate::path::module_id;

/// One source file's build artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Canonical id, unique across the build.
    pub id: String,
    /// Entry that first discovered this module.
    pub entry_name: String,
    pub path: PathBuf,
    /// Transformed and rewritten source, embedded verbatim in the output.
    pub source: String,
    /// Files first discovered while rewriting this module.
    pub dependencies: Vec<PathBuf>,
    /// Every module id `source` requires.
    pub requires: Vec<String>,
}

/// Build state of a module id. Ids that were never visited have no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Building,
    Built,
}

pub struct GraphBuilder {
    root: PathBuf,
    pipeline: LoaderPipeline,
    rewriter: DependencyRewriter,
    status: IndexMap<String, BuildStatus>,
    modules: IndexMap<String, Module>,
}

impl GraphBuilder {
    pub fn new(root: impl Into<PathBuf>, pipeline: LoaderPipeline, rewriter: DependencyRewriter) -> Self {
        Self {
            root: root.into(),
            pipeline,
            rewriter,
            status: IndexMap::new(),
            modules: IndexMap::new(),
        }
    }

    /// Builds the module at `entry_path` and everything it transitively
    /// requires that has not been built yet, then returns the entry module.
    ///
    /// Modules are visited in the same order a recursive depth-first build
    /// would visit them.
    pub fn build(&mut self, entry_name: &str, entry_path: &Path) -> Result<&Module> {
        let entry_id = module_id(&self.root, entry_path);
        let mut pending = vec![entry_path.to_path_buf()];
        while let Some(path) = pending.pop() {
            let id = module_id(&self.root, &path);
            if self.status.contains_key(&id) {
                continue;
            }
            let module = match self.build_module(entry_name, &path, &id) {
                Ok(module) => module,
                Err(err) => {
                    // a failed module counts as unvisited
                    self.status.shift_remove(&id);
                    return Err(err);
                }
            };
            pending.extend(module.dependencies.iter().rev().cloned());
            self.modules.insert(id, module);
        }
        // Only modules that finished building keep a status, so the entry is
        // in `modules` whether it was built now or by an earlier entry.
        Ok(&self.modules[&entry_id])
    }

    fn build_module(&mut self, entry_name: &str, path: &Path, id: &str) -> Result<Module> {
        debug!("building {} for entry '{}'", id, entry_name);
        self.status.insert(id.to_string(), BuildStatus::Building);

        let raw = fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let transformed = self.pipeline.apply(path, raw)?;

        let status = &self.status;
        let rewritten = self
            .rewriter
            .rewrite(&transformed, path, |dep_id| status.contains_key(dep_id))?;

        self.status.insert(id.to_string(), BuildStatus::Built);
        Ok(Module {
            id: id.to_string(),
            entry_name: entry_name.to_string(),
            path: path.to_path_buf(),
            source: rewritten.code,
            dependencies: rewritten.dependencies,
            requires: rewritten.requires,
        })
    }

    pub fn status(&self, id: &str) -> Option<BuildStatus> {
        self.status.get(id).copied()
    }

    /// Built modules in build order.
    pub fn modules(&self) -> &IndexMap<String, Module> {
        &self.modules
    }

    pub fn into_modules(self) -> IndexMap<String, Module> {
        self.modules
    }
}
