//! Strict dependency checking.
//!
//! Every import a source file declares must be satisfied by either a
//! standard library package or a *direct* dependency of the unit being
//! built. Packages that are merely reachable through some other dependency
//! are rejected: the build graph and the compiler must agree on edges.
//!
//! All unresolved imports are collected before failing so the whole list
//! can be fixed in one go. A dependency cycle through the recompile list is
//! the exception: it aborts immediately.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::archive::{Archive, ArchiveIndex};
use crate::stdlib::StdlibIndex;

/// Pseudo-package of the foreign function interface; never a real dependency
pub const FFI_PSEUDO_PACKAGE: &str = "C";

/// One import declaration in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Import path exactly as written in source
    pub path: String,
}

/// A parsed source file: its name and the imports it declares, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub filename: String,
    pub imports: Vec<Import>,
}

impl SourceFile {
    pub fn new<I, S>(filename: impl Into<String>, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filename: filename.into(),
            imports: imports
                .into_iter()
                .map(|path| Import { path: path.into() })
                .collect(),
        }
    }

    /// Read an imports listing: one `<filename> <import-path>` pair per line.
    ///
    /// Files appear in order of first mention; blank lines are skipped.
    pub fn from_listing(contents: &str) -> Result<Vec<SourceFile>, ListingError> {
        let mut files: Vec<SourceFile> = Vec::new();

        for (idx, line) in contents.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [filename, path] = fields.as_slice() else {
                if fields.is_empty() {
                    continue;
                }
                return Err(ListingError {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };

            let import = Import {
                path: path.to_string(),
            };
            match files.iter_mut().find(|f| f.filename == *filename) {
                Some(file) => file.imports.push(import),
                None => files.push(SourceFile {
                    filename: filename.to_string(),
                    imports: vec![import],
                }),
            }
        }

        Ok(files)
    }
}

#[derive(Debug, Error)]
#[error("malformed imports listing at line {line}: {content:?}")]
pub struct ListingError {
    pub line: usize,
    pub content: String,
}

/// How an import path was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Standard library package, located through the toolchain layout
    Stdlib,
    /// Direct dependency, by primary import path or alias
    Archive(&'a Archive),
}

/// Resolved imports keyed by import path; iteration is sorted
pub type ImportMap<'a> = BTreeMap<String, Resolution<'a>>;

/// An import no known package satisfies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDep {
    pub filename: String,
    pub import_path: String,
}

/// Every unresolved import of a unit, plus what could have been imported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyError {
    pub missing: Vec<MissingDep>,
    pub known: Vec<String>,
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "missing strict dependencies:")?;
        for dep in &self.missing {
            writeln!(f, "\t{}: import of {:?}", dep.filename, dep.import_path)?;
        }
        if self.known.is_empty() {
            writeln!(f, "No dependencies were provided.")?;
        } else {
            writeln!(f, "Known dependencies are:")?;
            for imp in &self.known {
                writeln!(f, "\t{imp}")?;
            }
        }
        write!(
            f,
            "Check that imports in source files match importpath attributes in deps."
        )
    }
}

impl std::error::Error for DependencyError {}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("dependency cycle detected between {unit:?} and {import_path:?} in file {filename:?}")]
    Cycle {
        unit: String,
        import_path: String,
        filename: String,
    },

    #[error(transparent)]
    Missing(#[from] DependencyError),
}

/// Whether an import is outside strict dependency checking entirely
pub fn is_unchecked(import_path: &str) -> bool {
    import_path == FFI_PSEUDO_PACKAGE || is_relative(import_path)
}

/// Relative imports (`./x`, `../x`) are not supported; they pass unchecked.
pub fn is_relative(import_path: &str) -> bool {
    import_path.starts_with("./") || import_path.starts_with("../")
}

/// Verify every import in `files` against the standard library and the
/// direct dependencies in `archives`.
///
/// `unit` is the import path of the package being compiled and
/// `recompile_internal_deps` the packages this invocation is itself
/// rebuilding; importing one of those is a cycle.
pub fn check_imports<'a>(
    files: &[SourceFile],
    archives: &'a [Archive],
    stdlib: &StdlibIndex,
    unit: &str,
    recompile_internal_deps: &[String],
) -> Result<ImportMap<'a>, CheckError> {
    let index = ArchiveIndex::new(archives);
    let recompile: HashSet<&str> = recompile_internal_deps.iter().map(String::as_str).collect();

    let mut imports = ImportMap::new();
    let mut missing: Vec<MissingDep> = Vec::new();
    let mut reported: HashSet<&str> = HashSet::new();

    for file in files {
        for imp in &file.imports {
            let path = imp.path.as_str();
            if imports.contains_key(path) || reported.contains(path) || is_unchecked(path) {
                continue;
            }

            if recompile.contains(path) {
                return Err(CheckError::Cycle {
                    unit: unit.to_string(),
                    import_path: path.to_string(),
                    filename: file.filename.clone(),
                });
            }

            let resolution = if stdlib.contains(path) {
                Resolution::Stdlib
            } else if let Some(arc) = index.resolve(path) {
                Resolution::Archive(arc)
            } else {
                tracing::debug!("{}: unresolved import {:?}", file.filename, path);
                reported.insert(path);
                missing.push(MissingDep {
                    filename: file.filename.clone(),
                    import_path: path.to_string(),
                });
                continue;
            };
            imports.insert(path.to_string(), resolution);
        }
    }

    if !missing.is_empty() {
        return Err(DependencyError {
            missing,
            known: index.known_import_paths(),
        }
        .into());
    }

    tracing::debug!("{}: resolved {} imports", unit, imports.len());
    Ok(imports)
}
