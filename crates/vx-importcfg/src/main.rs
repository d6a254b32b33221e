//! vx-importcfg - strict dependency check and importcfg writer
//!
//! Invoked once per compile or link action. Prints the path of the written
//! importcfg on stdout; any failure exits non-zero with the full diagnostic
//! on stderr.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use vx_importcfg::{
    Archive, ProvenanceSources, SourceFile, StdlibIndex, StdlibLayout,
    build_importcfg_for_compile, build_importcfg_for_link, check_imports,
};

#[derive(Parser, Debug)]
#[command(name = "vx-importcfg", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a package's imports and write its compile importcfg
    Compile {
        #[command(flatten)]
        common: CommonArgs,

        /// Import path of the package being compiled
        #[arg(long)]
        importpath: String,

        /// Imports listing: one `<filename> <import-path>` per line
        #[arg(long)]
        imports: Utf8PathBuf,

        /// Packages this invocation recompiles; importing one is a cycle
        #[arg(long = "recompile-internal-dep")]
        recompile_internal_deps: Vec<String>,
    },

    /// Write the link importcfg for a binary
    Link {
        #[command(flatten)]
        common: CommonArgs,

        /// Module manifest recording required module versions
        #[arg(long)]
        module_manifest: Option<Utf8PathBuf>,

        /// Checksum ledger for required modules
        #[arg(long)]
        checksum_ledger: Option<Utf8PathBuf>,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Standard library package list
    #[arg(long)]
    stdlib_list: Utf8PathBuf,

    /// Platform directory under the standard library root
    #[arg(long)]
    install_suffix: String,

    /// Directory to write the importcfg into
    #[arg(long, default_value = ".")]
    out_dir: Utf8PathBuf,

    /// Dependency archive: importpath[:alias...]=packagepath=file
    #[arg(long = "arc")]
    archives: Vec<Archive>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vx_importcfg=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(path) => {
            println!("{path}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {e:?}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Utf8PathBuf> {
    match cli.command {
        Command::Compile {
            common,
            importpath,
            imports,
            recompile_internal_deps,
        } => {
            let layout = StdlibLayout::from_env(common.install_suffix)?;
            let stdlib = StdlibIndex::from_path(&common.stdlib_list)?;

            let listing = std::fs::read_to_string(&imports)
                .wrap_err_with(|| format!("failed to read imports listing {imports}"))?;
            let files = SourceFile::from_listing(&listing)?;

            let resolved = check_imports(
                &files,
                &common.archives,
                &stdlib,
                &importpath,
                &recompile_internal_deps,
            )?;
            Ok(build_importcfg_for_compile(
                &resolved,
                &layout,
                &common.out_dir,
            )?)
        }
        Command::Link {
            common,
            module_manifest,
            checksum_ledger,
        } => {
            let layout = StdlibLayout::from_env(common.install_suffix)?;
            let provenance = ProvenanceSources {
                module_manifest,
                checksum_ledger,
            };
            Ok(build_importcfg_for_link(
                &common.archives,
                &common.stdlib_list,
                &layout,
                &provenance,
                &common.out_dir,
            )?)
        }
    }
}
