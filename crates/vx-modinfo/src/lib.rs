//! Build provenance for vx
//!
//! Linked binaries carry a provenance block recording the path, version and
//! primary checksum of every required module, so that tooling can later tell
//! exactly what went into a binary without rebuilding it.
//!
//! ## Layout
//!
//! ```text
//! MODINFO_START (16 bytes)
//! dep\t<module-path>\t<version>\t<checksum>\n
//! ...
//! MODINFO_END (16 bytes)
//! ```
//!
//! The markers are fixed byte strings, so the block can be located inside a
//! binary by scanning, without parsing the object format.

pub mod ledger;
pub mod manifest;
pub mod quote;

use camino::Utf8PathBuf;
use thiserror::Error;

pub use ledger::{ChecksumLedger, EMPTY_MODULE_HASH, LedgerError};
pub use manifest::{ManifestError, ModuleManifest, Requirement};
pub use quote::quote_bytes;

/// Start marker of an embedded provenance block
pub const MODINFO_START: [u8; 16] = [
    0x30, 0x77, 0xaf, 0x0c, 0x92, 0x74, 0x08, 0x02, 0x41, 0xe1, 0xc1, 0x07, 0xe6, 0xd6, 0x18, 0xe6,
];

/// End marker of an embedded provenance block
pub const MODINFO_END: [u8; 16] = [
    0xf9, 0x32, 0x43, 0x31, 0x86, 0x18, 0x20, 0x72, 0x00, 0x82, 0x42, 0x10, 0x41, 0x16, 0xd8, 0xf2,
];

#[derive(Debug, Error)]
pub enum ModInfoError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Render the provenance records for `requirements`, without markers.
///
/// Modules with no ledger entry (or an entry with no checksums) are left
/// out: provenance is best-effort metadata, not a build input.
pub fn records(requirements: &[Requirement], ledger: &ChecksumLedger) -> String {
    let mut out = String::new();
    for req in requirements {
        let Some(sum) = ledger.primary(&req.key()) else {
            tracing::debug!("no checksum recorded for {}, omitting from modinfo", req.key());
            continue;
        };
        out.push_str("dep\t");
        out.push_str(&req.path);
        out.push('\t');
        out.push_str(&req.version);
        out.push('\t');
        out.push_str(sum);
        out.push('\n');
    }
    out
}

/// Wrap a record body between the provenance markers.
pub fn frame(body: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(MODINFO_START.len() + body.len() + MODINFO_END.len());
    out.extend_from_slice(&MODINFO_START);
    out.extend_from_slice(body.as_bytes());
    out.extend_from_slice(&MODINFO_END);
    out
}

/// Encode a complete provenance block for `requirements`.
pub fn encode(requirements: &[Requirement], ledger: &ChecksumLedger) -> Vec<u8> {
    frame(&records(requirements, ledger))
}

/// Extract the record body from a framed provenance block, if it is one.
pub fn unframe(block: &[u8]) -> Option<&[u8]> {
    block
        .strip_prefix(MODINFO_START.as_slice())?
        .strip_suffix(MODINFO_END.as_slice())
}

/// Where to find the inputs for a provenance block.
///
/// Either source may be absent. A missing module manifest yields no
/// requirements; a missing ledger yields no checksums. In both cases the
/// block degrades to the bare markers.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceSources {
    pub module_manifest: Option<Utf8PathBuf>,
    pub checksum_ledger: Option<Utf8PathBuf>,
}

impl ProvenanceSources {
    /// Load both sources and encode the provenance block.
    ///
    /// Malformed inputs are still errors; only absence degrades.
    pub fn encode(&self) -> Result<Vec<u8>, ModInfoError> {
        let requirements = match &self.module_manifest {
            Some(path) if path.exists() => ModuleManifest::from_path(path)?.requirements,
            Some(path) => {
                tracing::warn!("module manifest {} not found, modinfo will be empty", path);
                Vec::new()
            }
            None => Vec::new(),
        };

        let ledger = match &self.checksum_ledger {
            Some(path) => ChecksumLedger::from_path(path)?,
            None => ChecksumLedger::default(),
        };
        if ledger.is_empty() && !requirements.is_empty() {
            tracing::warn!(
                "no checksums available for {} required modules, modinfo will be empty",
                requirements.len()
            );
        }

        Ok(encode(&requirements, &ledger))
    }
}
