//! Build orchestration.
//!
//! A [`Compiler`] owns all state of one build. [`Compiler::run`] consumes it,
//! so every build starts from a fresh instance.

use indexmap::IndexMap;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

use crate::bundler::{
    assemble, render_chunk, DependencyRewriter, Entry, GraphBuilder, LoaderPipeline,
    LoaderRegistry, Resolver,
};
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::hooks::{HookPoint, Hooks};
use crate::path::normalize_path;
use crate::plugin::{builtin_plugin, Plugin};

/// Result of a successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Output file path to generated text, one per entry.
    pub assets: IndexMap<PathBuf, String>,
    /// Files written to disk, in entry order.
    pub files: Vec<PathBuf>,
    /// Every built module, in build order.
    pub modules: Vec<ModuleSummary>,
    pub chunks: Vec<ChunkSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    pub id: String,
    pub entry_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    pub name: String,
    /// Id of the entry module.
    pub entry: String,
    /// Ids of the modules embedded in the chunk.
    pub modules: Vec<String>,
    pub asset: PathBuf,
}

pub struct Compiler {
    config: BundleConfig,
    context: PathBuf,
    pipeline: LoaderPipeline,
    hooks: Hooks,
}

impl Compiler {
    /// Creates a compiler with the built-in loaders, applying the built-in
    /// plugins named in `config.plugins`.
    pub fn new(config: BundleConfig) -> Result<Self> {
        Self::with_loaders(config, LoaderRegistry::default())
    }

    /// Like [`Compiler::new`], resolving loader references against `registry`.
    pub fn with_loaders(config: BundleConfig, registry: LoaderRegistry) -> Result<Self> {
        let context = config.context_dir()?;
        let pipeline = LoaderPipeline::new(&config.module.rules, &registry)?;
        let plugins = config
            .plugins
            .iter()
            .map(|name| builtin_plugin(name))
            .collect::<Result<Vec<_>>>()?;

        let mut compiler = Self {
            config,
            context,
            pipeline,
            hooks: Hooks::new(),
        };
        for plugin in &plugins {
            compiler.apply_plugin(plugin.as_ref());
        }
        Ok(compiler)
    }

    pub fn apply_plugin(&mut self, plugin: &dyn Plugin) {
        debug!("applying plugin '{}'", plugin.name());
        plugin.apply(&mut self.hooks);
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Builds every entry and writes one asset per entry.
    ///
    /// Nothing is written unless the whole graph builds, every chunk renders
    /// and the `emit` taps succeed.
    pub fn run(self) -> Result<BuildOutput> {
        let Compiler {
            config,
            context,
            pipeline,
            mut hooks,
        } = self;

        let output_dir = config.output_dir(&context);
        if config.output.clean && context.starts_with(&output_dir) {
            return Err(BundleError::config(format!(
                "output.clean would remove {}, which contains the context {}",
                output_dir.display(),
                context.display()
            )));
        }

        hooks.call(HookPoint::Run)?;

        let resolver = Resolver::new(config.resolve.extensions.clone());
        let rewriter = DependencyRewriter::new(&context, resolver);
        let mut graph = GraphBuilder::new(&context, pipeline, rewriter);

        let mut entries = Vec::new();
        for (name, path) in config.entry.entries() {
            let entry_path = normalize_path(&context.join(path));
            let module = graph.build(name, &entry_path)?;
            entries.push(Entry {
                name: name.to_string(),
                module_id: module.id.clone(),
            });
        }
        let modules = graph.into_modules();
        let chunks = assemble(&modules, &entries);

        let mut assets = IndexMap::new();
        let mut chunk_summaries = Vec::new();
        for chunk in &chunks {
            let asset_path = output_dir.join(config.output.filename_for(&chunk.name));
            if assets.contains_key(&asset_path) {
                return Err(BundleError::config(format!(
                    "multiple entries emit to the same file {}",
                    asset_path.display()
                )));
            }
            debug!(
                "rendering chunk '{}' with {} modules to {}",
                chunk.name,
                chunk.modules.len(),
                asset_path.display()
            );
            assets.insert(asset_path.clone(), render_chunk(chunk));
            chunk_summaries.push(ChunkSummary {
                name: chunk.name.clone(),
                entry: chunk.entry_module.id.clone(),
                modules: chunk.modules.iter().map(|module| module.id.clone()).collect(),
                asset: asset_path,
            });
        }

        hooks.call(HookPoint::Emit)?;

        if config.output.clean && output_dir.exists() {
            debug!("cleaning {}", output_dir.display());
            fs::remove_dir_all(&output_dir).map_err(|source| BundleError::Write {
                path: output_dir.clone(),
                source,
            })?;
        }
        let files = write_assets(&assets)?;

        hooks.call(HookPoint::Done)?;

        Ok(BuildOutput {
            assets,
            files,
            modules: modules
                .values()
                .map(|module| ModuleSummary {
                    id: module.id.clone(),
                    entry_name: module.entry_name.clone(),
                })
                .collect(),
            chunks: chunk_summaries,
        })
    }
}

fn write_assets(assets: &IndexMap<PathBuf, String>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(assets.len());
    for (path, content) in assets {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| BundleError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| BundleError::Write {
            path: path.clone(),
            source,
        })?;
        info!("wrote {}", path.display());
        files.push(path.clone());
    }
    Ok(files)
}
