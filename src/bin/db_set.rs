//! # DBSet CLI
//!
//! Writes a single value to a given `OFRI` (drives C4). Thin glue; see
//! spec §6.6.

use std::process;

use clap::Parser;

use slotdb::config::Environment;
use slotdb::error::exit_code_for;
use slotdb::key::{Object, Ofri};
use slotdb::schema::manifest;
use slotdb::store::mapped::MappedView;

/// Writes `value` to one `OFRI`, converted per the field's type code.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Object name.
    object: String,
    /// Field ordinal, 0-based in declaration order.
    field: u32,
    /// Record index.
    record: u32,
    /// Element index within the field.
    index: u32,
    /// Textual value to write, converted per the field's type code.
    value: String,
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
        eprintln!("object {object} is not registered");
        process::exit(exitcode::NOINPUT);
    };

    let mut view = match MappedView::open(&env.db_dir(), descriptor) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("failed to open {object}: {e}");
            process::exit(exit_code_for(e.code()));
        }
    };

    let ofri = Ofri {
        object: object.clone(),
        field: cli.field,
        record: cli.record,
        index: cli.index,
    };

    match view.write_value(&ofri, &cli.value) {
        Ok(()) => {
            tracing::info!(ofri = %ofri, value = %cli.value, "wrote value");
            process::exit(exitcode::OK);
        }
        Err(e) => {
            eprintln!("failed to write {ofri}: {e}");
            process::exit(exit_code_for(e.code()));
        }
    }
}
