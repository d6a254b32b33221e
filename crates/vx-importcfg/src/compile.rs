//! importcfg for compiling a single package.

use camino::{Utf8Path, Utf8PathBuf};

use crate::check::{ImportMap, Resolution};
use crate::emit::{EmitError, Importcfg};
use crate::layout::StdlibLayout;

/// Render the compile importcfg for a checked import map.
///
/// Lines follow the sorted import path order, so the same inputs always
/// produce the same bytes.
pub fn compile_importcfg(imports: &ImportMap<'_>, layout: &StdlibLayout) -> Importcfg {
    let mut cfg = Importcfg::new();

    for (import_path, resolution) in imports {
        match resolution {
            Resolution::Stdlib => {
                cfg.packagefile(import_path, &layout.archive_path(import_path));
            }
            Resolution::Archive(arc) => {
                if *import_path != arc.package_path {
                    cfg.importmap(import_path, &arc.package_path);
                }
                cfg.packagefile(&arc.package_path, &arc.file);
            }
        }
    }

    cfg
}

/// Write the compile importcfg into `dir` and return its path.
///
/// The caller is responsible for deleting the file.
pub fn build_importcfg_for_compile(
    imports: &ImportMap<'_>,
    layout: &StdlibLayout,
    dir: &Utf8Path,
) -> Result<Utf8PathBuf, EmitError> {
    let path = compile_importcfg(imports, layout).write_to_dir(dir)?;
    tracing::info!("wrote compile importcfg for {} imports to {}", imports.len(), path);
    Ok(path)
}
