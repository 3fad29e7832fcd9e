// Allow uninlined format args for cleaner format!/debug! calls
#![allow(clippy::uninlined_format_args)]
#![doc = include_str!("../README.md")]

pub mod bundler;
pub mod compiler;
pub mod config;
pub mod error;
pub mod hooks;
pub mod path;
pub mod plugin;

pub use anyhow;
pub use compiler::{BuildOutput, ChunkSummary, Compiler, ModuleSummary};
pub use config::BundleConfig;
pub use error::{BundleError, Result};
pub use hooks::{HookPoint, Hooks};
pub use plugin::Plugin;
