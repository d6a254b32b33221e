//! Module manifest parsing.
//!
//! Only the parts needed for provenance are understood: the `module`
//! directive and the `require` list. Everything else (`go`, `toolchain`,
//! `replace`, `exclude`, `retract`, ...) is skipped, including their blocks.
//!
//! ```text
//! module example.com/app
//!
//! require example.com/lib v1.2.0
//!
//! require (
//!     example.com/other v0.3.0
//!     example.com/deep v1.0.1 // indirect
//! )
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Malformed {
        path: Utf8PathBuf,
        line: usize,
        message: String,
    },
}

/// A single `require` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Module path
    pub path: String,
    /// Exact version
    pub version: String,
}

impl Requirement {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }

    /// Ledger key: `"path@version"`
    pub fn key(&self) -> String {
        format!("{}@{}", self.path, self.version)
    }
}

/// Parsed module manifest
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleManifest {
    /// Main module path, if declared
    pub module: Option<String>,
    /// Requirements in declared order
    pub requirements: Vec<Requirement>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Require,
    Ignored,
}

impl ModuleManifest {
    pub fn from_path(path: &Utf8Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::ReadError {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    /// Parse manifest contents. `path` is only used for diagnostics.
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Self, ManifestError> {
        let mut manifest = ModuleManifest::default();
        let mut block = Block::None;

        for (idx, raw) in contents.lines().enumerate() {
            let lineno = idx + 1;
            let malformed = |message: String| ManifestError::Malformed {
                path: path.to_owned(),
                line: lineno,
                message,
            };

            let code = raw.find("//").map_or(raw, |pos| &raw[..pos]);
            let tokens: Vec<&str> = code.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }

            match block {
                Block::Require | Block::Ignored if tokens == [")"] => {
                    block = Block::None;
                }
                Block::Require => {
                    manifest
                        .requirements
                        .push(parse_requirement(&tokens).map_err(malformed)?);
                }
                Block::Ignored => {}
                Block::None => {
                    let opens_block = tokens.len() == 2 && tokens[1] == "(";
                    match tokens[0] {
                        "module" => {
                            if tokens.len() != 2 {
                                return Err(malformed(
                                    "usage: module module/path".to_string(),
                                ));
                            }
                            manifest.module = Some(unquote(tokens[1]).to_string());
                        }
                        "require" if opens_block => block = Block::Require,
                        "require" => {
                            manifest
                                .requirements
                                .push(parse_requirement(&tokens[1..]).map_err(malformed)?);
                        }
                        _ if opens_block => block = Block::Ignored,
                        _ => {}
                    }
                }
            }
        }

        if block != Block::None {
            return Err(ManifestError::Malformed {
                path: path.to_owned(),
                line: contents.lines().count(),
                message: "unterminated block".to_string(),
            });
        }

        Ok(manifest)
    }
}

fn parse_requirement(tokens: &[&str]) -> Result<Requirement, String> {
    let [path, version] = tokens else {
        return Err("usage: require module/path v1.2.3".to_string());
    };
    Ok(Requirement::new(unquote(path), unquote(version)))
}

fn unquote(token: &str) -> &str {
    for quote in ['"', '`'] {
        if let Some(inner) = token
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    token
}
