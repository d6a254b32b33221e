//! importcfg text format and scratch file handling.
//!
//! ```text
//! packagefile <package-path>=<archive-file>
//! importmap <import-path>=<package-path>
//! modinfo "<quoted provenance block>"
//! ```

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use vx_modinfo::ModInfoError;

use crate::stdlib::StdlibError;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Stdlib(#[from] StdlibError),

    #[error(
        "internal error: package {package_path} provided multiple times (by {first} and {second}). This should have been detected during analysis."
    )]
    DuplicatePackage {
        package_path: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    ModInfo(#[from] ModInfoError),

    #[error("failed to create importcfg in {dir}: {source}")]
    CreateError {
        dir: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write importcfg {path}: {source}")]
    WriteError {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("importcfg path in {dir} is not valid UTF-8")]
    NonUtf8Path { dir: Utf8PathBuf },
}

/// In-memory importcfg, written out in one go once complete
#[derive(Debug, Default)]
pub struct Importcfg {
    buf: String,
}

impl Importcfg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packagefile(&mut self, package_path: &str, file: &Utf8Path) {
        self.line("packagefile", package_path, file.as_str());
    }

    pub fn importmap(&mut self, import_path: &str, package_path: &str) {
        self.line("importmap", import_path, package_path);
    }

    pub fn modinfo(&mut self, block: &[u8]) {
        self.buf.push_str("modinfo ");
        self.buf.push_str(&vx_modinfo::quote_bytes(block));
        self.buf.push('\n');
    }

    fn line(&mut self, directive: &str, key: &str, value: &str) {
        self.buf.push_str(directive);
        self.buf.push(' ');
        self.buf.push_str(key);
        self.buf.push('=');
        self.buf.push_str(value);
        self.buf.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Write to a fresh `importcfg*` file in `dir` and return its path.
    ///
    /// The file is removed again if anything fails; on success the caller
    /// owns it and must delete it when done.
    pub fn write_to_dir(&self, dir: &Utf8Path) -> Result<Utf8PathBuf, EmitError> {
        self.write_with(dir, |file, bytes| {
            file.write_all(bytes)?;
            file.flush()
        })
    }

    fn write_with(
        &self,
        dir: &Utf8Path,
        write: impl FnOnce(&mut NamedTempFile, &[u8]) -> std::io::Result<()>,
    ) -> Result<Utf8PathBuf, EmitError> {
        // Every early return below drops `file`, which unlinks it.
        let mut file = tempfile::Builder::new()
            .prefix("importcfg")
            .tempfile_in(dir)
            .map_err(|source| EmitError::CreateError {
                dir: dir.to_owned(),
                source,
            })?;

        let path = Utf8Path::from_path(file.path())
            .ok_or_else(|| EmitError::NonUtf8Path {
                dir: dir.to_owned(),
            })?
            .to_owned();

        write(&mut file, self.buf.as_bytes()).map_err(|source| EmitError::WriteError {
            path: path.clone(),
            source,
        })?;

        file.keep().map_err(|e| EmitError::WriteError {
            path: path.clone(),
            source: e.error,
        })?;

        tracing::debug!("wrote {}", path);
        Ok(path)
    }
}
