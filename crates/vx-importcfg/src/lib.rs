//! Strict dependency checking and importcfg generation for vx
//!
//! The build graph resolves dependencies by declared edges; the compiler
//! resolves them by import string. This crate keeps the two in agreement:
//!
//! 1. [`check_imports`] verifies that every import of a unit is a standard
//!    library package or a direct dependency, and rejects imports of packages
//!    the current invocation is itself recompiling.
//! 2. [`build_importcfg_for_compile`] turns the checked imports into the
//!    importcfg the compiler reads.
//! 3. [`build_importcfg_for_link`] writes the importcfg for the linker from
//!    the full transitive closure, with an embedded provenance block.
//!
//! ## Usage
//!
//! ```no_run
//! use camino::Utf8Path;
//! use vx_importcfg::{Archive, SourceFile, StdlibIndex, StdlibLayout};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stdlib = StdlibIndex::from_path(Utf8Path::new("packages.txt"))?;
//! let archives = vec!["example.com/a=example.com/a=out/a.a".parse::<Archive>()?];
//! let files = vec![SourceFile::new("main.src", ["fmt", "example.com/a"])];
//!
//! let imports = vx_importcfg::check_imports(&files, &archives, &stdlib, "example.com/app", &[])?;
//! let layout = StdlibLayout::from_env("linux_amd64")?;
//! let cfg = vx_importcfg::build_importcfg_for_compile(&imports, &layout, Utf8Path::new("."))?;
//! println!("importcfg: {cfg}");
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod check;
pub mod compile;
pub mod emit;
pub mod layout;
pub mod link;
pub mod stdlib;

pub use archive::{Archive, ArchiveError, ArchiveIndex};
pub use check::{
    CheckError, DependencyError, ImportMap, MissingDep, Resolution, SourceFile, check_imports,
};
pub use compile::{build_importcfg_for_compile, compile_importcfg};
pub use emit::{EmitError, Importcfg};
pub use layout::{LayoutError, StdlibLayout};
pub use link::{build_importcfg_for_link, link_importcfg};
pub use stdlib::{StdlibError, StdlibIndex};
pub use vx_modinfo::ProvenanceSources;
