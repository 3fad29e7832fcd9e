//! Relative specifier resolution by extension probing.

use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{BundleError, Result};
use crate::path::{normalize_path, to_unix_path};

#[derive(Debug, Clone)]
pub struct Resolver {
    extensions: Vec<String>,
}

impl Resolver {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Resolves `specifier` against `directory`. The joined path is tried as
    /// written, then with each extension appended in order; the first existing
    /// file wins.
    pub fn resolve(&self, specifier: &str, directory: &Path) -> Result<PathBuf> {
        let base = normalize_path(&directory.join(specifier));
        let candidates = std::iter::once("").chain(self.extensions.iter().map(String::as_str));
        for extension in candidates {
            let mut candidate = OsString::from(base.as_os_str());
            candidate.push(extension);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                debug!("resolved '{}' to {}", specifier, candidate.display());
                return Ok(candidate);
            }
        }
        Err(BundleError::Resolution {
            specifier: specifier.to_string(),
            directory: to_unix_path(&directory.to_string_lossy()),
        })
    }
}
