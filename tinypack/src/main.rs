use anyhow::{bail, Context};
use clap::Parser;
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use std::path::{Path, PathBuf};
use tinypack_rs::config::{EntryConfig, CONFIG_FILE_NAME, DEFAULT_ENTRY_NAME};
use tinypack_rs::{BuildOutput, BundleConfig, Compiler};

/// tinypack: Bundles CommonJS modules into one self-contained script per entry
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file. Defaults to tinypack.config.json in the
    /// working directory when that file exists
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Entry point as `name=path`, or a bare path for the `main` entry. May be repeated
    #[clap(short, long)]
    pub entry: Vec<String>,

    /// Root directory for entry paths and module ids
    #[clap(long)]
    pub context: Option<PathBuf>,

    /// Directory the bundles are written to
    #[clap(short, long)]
    pub output_path: Option<PathBuf>,

    /// Bundle file name, `[name]` is replaced by the entry name
    #[clap(long)]
    pub output_filename: Option<String>,

    /// Comma separated extensions tried when resolving a require
    #[clap(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Remove the output directory before writing
    #[clap(long)]
    pub clean: bool,

    /// Print the modules embedded in each bundle
    #[clap(long)]
    pub stats: bool,

    /// Enable debug logging
    #[clap(short, long)]
    pub verbose: bool,
}

fn main() {
    let args: Args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(err) = run(&args) {
        eprintln!("tinypack: {:#}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args)?;

    let output = Compiler::new(config)?.run()?;
    for file in &output.files {
        println!("{}", file.display());
    }
    if args.stats {
        println!("{}", format_stats(&output));
    }
    Ok(())
}

/// Loads the config file. A config without `context` is rooted at the
/// directory holding the file.
fn load_config(path: Option<&Path>) -> anyhow::Result<BundleConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(CONFIG_FILE_NAME).is_file() => Path::new(CONFIG_FILE_NAME),
        None => {
            debug!("no {} found, using defaults", CONFIG_FILE_NAME);
            return Ok(BundleConfig::default());
        }
    };
    debug!("loading config from {}", path.display());
    let mut config = BundleConfig::from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;

    if let Some(base) = path.parent().filter(|base| !base.as_os_str().is_empty()) {
        config.context = Some(match config.context.take() {
            Some(context) => base.join(context),
            None => base.to_path_buf(),
        });
    }
    Ok(config)
}

fn apply_overrides(config: &mut BundleConfig, args: &Args) -> anyhow::Result<()> {
    if !args.entry.is_empty() {
        config.entry = parse_entries(&args.entry)?;
    }
    if let Some(context) = &args.context {
        config.context = Some(context.clone());
    }
    if let Some(path) = &args.output_path {
        config.output.path = path.clone();
    }
    if let Some(filename) = &args.output_filename {
        config.output.filename = filename.clone();
    }
    if let Some(extensions) = &args.extensions {
        config.resolve.extensions = extensions.clone();
    }
    if args.clean {
        config.output.clean = true;
    }
    Ok(())
}

fn parse_entries(values: &[String]) -> anyhow::Result<EntryConfig> {
    if let [single] = values {
        if !single.contains('=') {
            return Ok(EntryConfig::Single(single.clone()));
        }
    }
    let mut entries = IndexMap::new();
    for value in values {
        let (name, path) = match value.split_once('=') {
            Some((name, path)) => (name, path),
            None => (DEFAULT_ENTRY_NAME, value.as_str()),
        };
        if name.is_empty() || path.is_empty() {
            bail!("Invalid entry '{}', expected name=path", value);
        }
        if entries.insert(name.to_string(), path.to_string()).is_some() {
            bail!("Entry '{}' given more than once", name);
        }
    }
    Ok(EntryConfig::Named(entries))
}

fn format_stats(output: &BuildOutput) -> String {
    output
        .chunks
        .iter()
        .map(|chunk| {
            let modules = chunk.modules.iter().map(|id| format!("  {}", id)).join("\n");
            format!("{} -> {}\n{}", chunk.name, chunk.asset.display(), modules)
        })
        .join("\n")
}
