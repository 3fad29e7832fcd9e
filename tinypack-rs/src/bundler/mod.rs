//! CommonJS bundler core.
//!
//! The bundler turns entry files into self-contained scripts by:
//! 1. Running each file through the loaders whose rules match its path
//! 2. Rewriting every `require("...")` to the canonical id of the resolved file
//! 3. Building newly discovered files depth-first, once per build
//! 4. Grouping built modules into one chunk per entry
//! 5. Rendering each chunk with a small module registry and caching `require`
//!
//! # Architecture
//!
//! - `loader`: Loader trait, registry and the per-file loader pipeline
//! - `text`: Built-in loaders and JS string escaping
//! - `resolve`: Extension probing for relative specifiers
//! - `rewrite`: Parses a module, rewrites its requires and prints it back
//! - `graph`: Depth-first module graph construction
//! - `chunk`: Per-entry module grouping
//! - `emit`: Runtime template rendering

mod chunk;
mod emit;
mod graph;
mod loader;
mod resolve;
mod rewrite;
mod text;

pub use chunk::{assemble, Chunk, Entry};
pub use emit::render_chunk;
pub use graph::{BuildStatus, GraphBuilder, Module};
pub use loader::{FnLoader, Loader, LoaderPipeline, LoaderRegistry};
pub use resolve::Resolver;
pub use rewrite::{DependencyRewriter, Rewritten, REQUIRE_IDENT};
pub use text::{js_string_literal, strip_bom, JsonLoader, StripBomLoader};
