//! importcfg for linking a binary.
//!
//! Unlike the compile variant this covers the whole transitive closure: the
//! complete standard library, every archive in the link, and a provenance
//! block for the binary's metadata.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use vx_modinfo::ProvenanceSources;

use crate::archive::Archive;
use crate::emit::{EmitError, Importcfg};
use crate::layout::StdlibLayout;
use crate::stdlib::StdlibIndex;

/// Render the link importcfg.
///
/// `archives` is emitted in the given order. Two archives with the same
/// package path mean the build graph is broken upstream, which is reported
/// as an internal error.
pub fn link_importcfg(
    archives: &[Archive],
    stdlib: &StdlibIndex,
    layout: &StdlibLayout,
    modinfo: &[u8],
) -> Result<Importcfg, EmitError> {
    let mut cfg = Importcfg::new();

    for pkg in stdlib.iter() {
        cfg.packagefile(pkg, &layout.archive_path(pkg));
    }

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for arc in archives {
        if let Some(first) = seen.insert(&arc.package_path, arc.display_name()) {
            return Err(EmitError::DuplicatePackage {
                package_path: arc.package_path.clone(),
                first: first.to_string(),
                second: arc.display_name().to_string(),
            });
        }
        cfg.packagefile(&arc.package_path, &arc.file);
    }

    cfg.modinfo(modinfo);
    Ok(cfg)
}

/// Write the link importcfg into `dir` and return its path.
///
/// Nothing is written if the archives are inconsistent or provenance cannot
/// be loaded. The caller is responsible for deleting the file.
pub fn build_importcfg_for_link(
    archives: &[Archive],
    stdlib_list: &Utf8Path,
    layout: &StdlibLayout,
    provenance: &ProvenanceSources,
    dir: &Utf8Path,
) -> Result<Utf8PathBuf, EmitError> {
    let stdlib = StdlibIndex::from_path(stdlib_list)?;
    let modinfo = provenance.encode()?;
    let cfg = link_importcfg(archives, &stdlib, layout, &modinfo)?;

    let path = cfg.write_to_dir(dir)?;
    tracing::info!(
        "wrote link importcfg for {} archives and {} standard packages to {}",
        archives.len(),
        stdlib.len(),
        path
    );
    Ok(path)
}
