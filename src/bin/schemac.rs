//! # Schema Compiler CLI
//!
//! Compiles every `*.skm` file in a schema directory into compiled
//! descriptors, provisions each object's backing file, and records the
//! result in the manifest (drives C3). Thin glue over
//! [`slotdb::schema::compiler`]; see spec §6.6.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use slotdb::config::Environment;
use slotdb::error::exit_code_for;
use slotdb::schema::compiler;

/// Compiles a directory of schema files into the object registry, creating
/// each object's backing file at its provisioned length.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of `*.skm` schema files. Defaults to `<install>/db/skm`.
    #[arg(short, long)]
    schema_dir: Option<PathBuf>,
    /// Directory backing files are provisioned under. Defaults to `<install>/db/db`.
    #[arg(short, long)]
    db_dir: Option<PathBuf>,
    /// Manifest file path. Defaults to `<install>/db/manifest`.
    #[arg(short, long)]
    manifest: Option<PathBuf>,
}

fn main() {
    slotdb::logging::init();
    let cli = Cli::parse();
    let env = Environment::from_env();

    let schema_dir = cli.schema_dir.unwrap_or_else(|| env.schema_dir());
    let db_dir = cli.db_dir.unwrap_or_else(|| env.db_dir());
    let manifest_path = cli.manifest.unwrap_or_else(|| env.manifest_path());

    match compiler::compile_directory(&schema_dir, &db_dir, &manifest_path) {
        Ok(outcome) => {
            for (path, error) in &outcome.failures {
                tracing::error!(schema = %path.display(), error = %error, "schema failed to compile");
            }
            for path in &outcome.misaligned {
                tracing::warn!(schema = %path.display(), "record size is not a multiple of 4");
            }
            tracing::info!(
                compiled = outcome.registry.len(),
                failed = outcome.failures.len(),
                misaligned = outcome.misaligned.len(),
                "schema compilation complete"
            );
            process::exit(exit_code_for(outcome.code()));
        }
        Err(e) => {
            tracing::error!(error = %e, "schema compilation aborted");
            process::exit(exit_code_for(e.code()));
        }
    }
}
