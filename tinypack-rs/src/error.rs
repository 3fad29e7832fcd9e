use std::path::PathBuf;
use thiserror::Error;

use crate::hooks::HookPoint;

pub type Result<T> = std::result::Result<T, BundleError>;

/// Fatal build errors. Any of these aborts the run before assets are written.
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Module not found: Cannot resolve '{specifier}' in '{directory}'")]
    Resolution { specifier: String, directory: String },

    #[error("Failed to read {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Loader '{loader}' failed on {}: {source}", path.display())]
    Transform {
        loader: String,
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to print {}: {message}", path.display())]
    Print { path: PathBuf, message: String },

    #[error("Plugin '{tap}' failed in the {hook} hook: {source}")]
    Hook {
        hook: HookPoint,
        tap: String,
        source: anyhow::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to write {}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BundleError {
    pub fn config(message: impl Into<String>) -> Self {
        BundleError::Config(message.into())
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BundleError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn print(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BundleError::Print {
            path: path.into(),
            message: message.into(),
        }
    }
}
