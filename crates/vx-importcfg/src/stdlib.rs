//! Standard library package index.
//!
//! The toolchain ships a newline-delimited list of its standard packages.
//! Entries are trimmed and blank lines skipped; nothing else is validated,
//! so a garbage line just becomes a package nobody imports. Lines that are
//! not UTF-8 cannot name an import path and are dropped.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StdlibError {
    #[error("failed to read standard library package list {path}: {source}")]
    ReadError {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Set of standard library package paths, in manifest order
#[derive(Debug, Default, Clone)]
pub struct StdlibIndex {
    packages: Vec<String>,
    members: HashSet<String>,
}

impl StdlibIndex {
    pub fn from_path(path: &Utf8Path) -> Result<Self, StdlibError> {
        let contents = std::fs::read(path).map_err(|source| StdlibError::ReadError {
            path: path.to_owned(),
            source,
        })?;
        let index = Self::parse_bytes(&contents);
        tracing::debug!("loaded {} standard library packages from {}", index.len(), path);
        Ok(index)
    }

    pub fn parse(contents: &str) -> Self {
        Self::parse_bytes(contents.as_bytes())
    }

    /// Never fails: a line that is not UTF-8 is skipped like a blank one.
    pub fn parse_bytes(contents: &[u8]) -> Self {
        let mut index = Self::default();
        for line in contents.split(|&b| b == b'\n') {
            let Ok(line) = std::str::from_utf8(line) else {
                tracing::trace!("skipping non-UTF-8 standard library entry");
                continue;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if index.members.insert(line.to_string()) {
                index.packages.push(line.to_string());
            }
        }
        index
    }

    pub fn contains(&self, import_path: &str) -> bool {
        self.members.contains(import_path)
    }

    /// Packages in the order they appear in the manifest
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StdlibIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut index = Self::default();
        for pkg in iter {
            let pkg = pkg.into();
            if index.members.insert(pkg.clone()) {
                index.packages.push(pkg);
            }
        }
        index
    }
}
