//! Direct dependency descriptors and their lookup index.

use std::collections::HashMap;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("badly formed archive spec: {0} (expected importpath[:alias...]=packagepath=file)")]
    Malformed(String),

    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// A compiled dependency the unit being built may import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Build graph label, for diagnostics only
    pub label: String,
    /// Import path source files use to reference this package
    pub import_path: String,
    /// Additional import paths that also resolve here (vendored, re-exported)
    pub import_path_aliases: Vec<String>,
    /// Canonical package path, the compiler's symbol table key
    pub package_path: String,
    /// Compiled archive on disk
    pub file: Utf8PathBuf,
}

impl Archive {
    /// An archive whose import path and package path coincide
    pub fn new(import_path: impl Into<String>, file: impl Into<Utf8PathBuf>) -> Self {
        let import_path = import_path.into();
        Self {
            label: String::new(),
            package_path: import_path.clone(),
            import_path,
            import_path_aliases: Vec::new(),
            file: file.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_package_path(mut self, package_path: impl Into<String>) -> Self {
        self.package_path = package_path.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.import_path_aliases.push(alias.into());
        self
    }

    /// Label if one was given, otherwise the package path
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.package_path
        } else {
            &self.label
        }
    }
}

/// Parses `importpath[:alias...]=packagepath=file`.
///
/// A relative `file` is resolved against the current directory.
impl FromStr for Archive {
    type Err = ArchiveError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = spec.split('=').collect();
        let [import_paths, package_path, file] = parts.as_slice() else {
            return Err(ArchiveError::Malformed(spec.to_string()));
        };

        let mut import_paths = import_paths.split(':');
        let import_path = import_paths.next().unwrap_or_default();
        if import_path.is_empty() || package_path.is_empty() || file.is_empty() {
            return Err(ArchiveError::Malformed(spec.to_string()));
        }

        Ok(Archive {
            label: String::new(),
            import_path: import_path.to_string(),
            import_path_aliases: import_paths.map(str::to_string).collect(),
            package_path: package_path.to_string(),
            file: absolutize(Utf8Path::new(file))?,
        })
    }
}

fn absolutize(path: &Utf8Path) -> Result<Utf8PathBuf, ArchiveError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let cwd = std::env::current_dir().map_err(ArchiveError::CurrentDir)?;
    let cwd = Utf8PathBuf::try_from(cwd)
        .map_err(|e| ArchiveError::CurrentDir(std::io::Error::other(e)))?;
    Ok(cwd.join(path))
}

/// Lookup tables from import path to archive.
///
/// Primary import paths and aliases live in separate maps so that a primary
/// path always wins over another archive's alias.
#[derive(Debug)]
pub struct ArchiveIndex<'a> {
    by_import_path: HashMap<&'a str, &'a Archive>,
    by_alias: HashMap<&'a str, &'a Archive>,
}

impl<'a> ArchiveIndex<'a> {
    pub fn new(archives: &'a [Archive]) -> Self {
        let mut by_import_path = HashMap::new();
        let mut by_alias = HashMap::new();

        for arc in archives {
            by_import_path.insert(arc.import_path.as_str(), arc);
            for alias in &arc.import_path_aliases {
                by_alias.insert(alias.as_str(), arc);
            }
        }

        ArchiveIndex {
            by_import_path,
            by_alias,
        }
    }

    pub fn resolve(&self, import_path: &str) -> Option<&'a Archive> {
        self.by_import_path
            .get(import_path)
            .or_else(|| self.by_alias.get(import_path))
            .copied()
    }

    /// Every import path this index can resolve, sorted
    pub fn known_import_paths(&self) -> Vec<String> {
        let mut known: Vec<String> = self
            .by_import_path
            .keys()
            .chain(self.by_alias.keys())
            .map(|p| p.to_string())
            .collect();
        known.sort();
        known.dedup();
        known
    }
}
