//! # InstantiateDB CLI
//!
//! Ensures a backing file exists at its provisioned length for a named,
//! already-registered object (drives C3 step 3 / C4). Thin glue; see spec
//! §6.6.

use std::process;

use clap::Parser;

use slotdb::config::Environment;
use slotdb::error::exit_code_for;
use slotdb::key::Object;
use slotdb::schema::{compiler, manifest};

/// Provisions (or re-verifies) the backing file for one registered object.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Object name. Must already appear in the manifest (run `schemac` first).
    object: String,
}

fn main() {
    slotdb::logging::init();
    let cli = Cli::parse();
    let env = Environment::from_env();

    let Some(object) = Object::new(&cli.object) else {
        eprintln!("invalid object name: {}", cli.object);
        process::exit(exitcode::USAGE);
    };

    let registry = match manifest::load(&env.manifest_path()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("failed to load manifest: {e}");
            process::exit(exit_code_for(e.code()));
        }
    };

    let Some(descriptor) = registry.lookup(&object) else {
        eprintln!("object {object} is not registered; run schemac first");
        process::exit(exitcode::NOINPUT);
    };

    match compiler::provision_backing_file(&env.db_dir(), &descriptor) {
        Ok(()) => {
            tracing::info!(object = %object, bytes = descriptor.file_size(), "backing file provisioned");
            process::exit(exitcode::OK);
        }
        Err(e) => {
            eprintln!("failed to provision {object}: {e}");
            process::exit(exit_code_for(e.code()));
        }
    }
}
