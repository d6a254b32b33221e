//! Checksum ledger parsing.
//!
//! The ledger is a machine-generated, line-oriented file that records the
//! content hashes of every module version the build has seen:
//!
//! ```text
//! example.com/lib v1.2.0 h1:Xxp2...=
//! example.com/lib v1.2.0/mod h1:Q2bN...=
//! ```
//!
//! Each non-blank line carries exactly three whitespace-separated fields:
//! module path, version, checksum. Anything else means the file was produced
//! by a broken tool, so a malformed line aborts the whole build.
//!
//! Checksums accumulate under `"path@version"` in encounter order; the first
//! one is the primary checksum.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Placeholder hash of an empty module manifest.
///
/// Old toolchains wrote this for modules they never downloaded. It carries no
/// information, so it is dropped on load.
pub const EMPTY_MODULE_HASH: &str = "h1:G7mAYYxgmS0lVkHyy2hEOLQCFB0DlQFTMLWggykrydY=";

/// Errors that can occur while loading a checksum ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "internal error: malformed checksum ledger:\n{path}:{line}: wrong number of fields {fields}"
    )]
    Malformed {
        path: Utf8PathBuf,
        line: usize,
        fields: usize,
    },

    #[error("internal error: malformed checksum ledger:\n{path}:{line}: invalid UTF-8")]
    NotUtf8 { path: Utf8PathBuf, line: usize },
}

/// Parsed checksum ledger, keyed by `"path@version"`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChecksumLedger {
    entries: HashMap<String, Vec<String>>,
}

impl ChecksumLedger {
    /// Load a ledger from disk.
    ///
    /// A missing file is an empty ledger: modules without recorded hashes
    /// are simply left out of the provenance record.
    pub fn from_path(path: &Utf8Path) -> Result<Self, LedgerError> {
        match std::fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(contents) => Self::parse(path, &contents),
                Err(e) => {
                    let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
                    Err(LedgerError::NotUtf8 {
                        path: path.to_owned(),
                        line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
                    })
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("checksum ledger {} does not exist, using empty ledger", path);
                Ok(Self::default())
            }
            Err(source) => Err(LedgerError::ReadError {
                path: path.to_owned(),
                source,
            }),
        }
    }

    /// Parse ledger contents. `path` is only used for diagnostics.
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Self, LedgerError> {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();

        for (idx, line) in contents.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 3 {
                return Err(LedgerError::Malformed {
                    path: path.to_owned(),
                    line: idx + 1,
                    fields: fields.len(),
                });
            }
            if fields[2] == EMPTY_MODULE_HASH {
                continue;
            }

            let key = format!("{}@{}", fields[0], fields[1]);
            entries.entry(key).or_default().push(fields[2].to_string());
        }

        Ok(Self { entries })
    }

    /// All checksums recorded for `key` (`"path@version"`), in file order
    pub fn checksums(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The primary (first-seen) checksum for `key`
    pub fn primary(&self, key: &str) -> Option<&str> {
        self.checksums(key)
            .and_then(|sums| sums.first())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<ChecksumLedger, LedgerError> {
        ChecksumLedger::parse(Utf8Path::new("test.sum"), contents)
    }

    #[test]
    fn parse_simple_ledger() {
        let ledger = parse(
            "example.com/a v1.0.0 h1:aaa=\n\
             example.com/a v1.0.0/mod h1:bbb=\n\
             example.com/b v0.2.1 h1:ccc=\n",
        )
        .unwrap();

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.primary("example.com/a@v1.0.0"), Some("h1:aaa="));
        assert_eq!(ledger.primary("example.com/a@v1.0.0/mod"), Some("h1:bbb="));
        assert_eq!(ledger.primary("example.com/b@v0.2.1"), Some("h1:ccc="));
        assert_eq!(ledger.primary("example.com/c@v1.0.0"), None);
    }

    #[test]
    fn repeated_keys_keep_encounter_order() {
        let ledger = parse(
            "example.com/a v1.0.0 h1:first=\n\
             example.com/a v1.0.0 h1:second=\n",
        )
        .unwrap();

        assert_eq!(
            ledger.checksums("example.com/a@v1.0.0").unwrap(),
            ["h1:first=".to_string(), "h1:second=".to_string()]
        );
        assert_eq!(ledger.primary("example.com/a@v1.0.0"), Some("h1:first="));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let ledger = parse("\n   \nexample.com/a v1.0.0 h1:aaa=\n\n\t\n").unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn empty_module_hash_is_dropped() {
        let contents = format!(
            "example.com/a v1.0.0/mod {EMPTY_MODULE_HASH}\nexample.com/a v1.0.0 h1:aaa=\n"
        );
        let ledger = parse(&contents).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.checksums("example.com/a@v1.0.0/mod"), None);
        assert_eq!(ledger.primary("example.com/a@v1.0.0"), Some("h1:aaa="));
    }

    #[test]
    fn reject_two_fields() {
        let err = parse("example.com/a v1.0.0 h1:aaa=\nexample.com/b v1.0.0\n").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Malformed {
                line: 2,
                fields: 2,
                ..
            }
        ));
        assert!(err.to_string().starts_with("internal error"));
    }

    #[test]
    fn reject_four_fields() {
        let err = parse("example.com/a v1.0.0 h1:aaa= extra\n").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Malformed {
                line: 1,
                fields: 4,
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let ledger = ChecksumLedger::from_path(&base.join("missing.sum")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let path = base.join("bad.sum");
        std::fs::write(&path, "one two\n").unwrap();

        let err = ChecksumLedger::from_path(&path).unwrap_err();
        assert!(err.to_string().contains(path.as_str()));
    }

    #[test]
    fn non_utf8_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let path = base.join("bad.sum");
        std::fs::write(
            &path,
            b"example.com/a v1.0.0 h1:aaa=\nexample.com/\xff v1 h1:b=\n",
        )
        .unwrap();

        let err = ChecksumLedger::from_path(&path).unwrap_err();
        assert!(matches!(err, LedgerError::NotUtf8 { line: 2, .. }));
        assert!(err.to_string().starts_with("internal error"));
    }
}
