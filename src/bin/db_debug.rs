//! # DBDebug CLI
//!
//! Prints the resolved field descriptor and current value for a single
//! `OFRI` (drives C2 + C4). Thin glue; see spec §6.6.

use std::process;

use clap::Parser;

use slotdb::config::Environment;
use slotdb::error::exit_code_for;
use slotdb::key::{Object, Ofri};
use slotdb::schema::manifest;
use slotdb::store::mapped::MappedView;

/// Prints an object's compiled layout and the current value at one `OFRI`.
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
    #[arg(default_value_t = 0)]
    index: u32,
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

    let ofri = Ofri {
        object: object.clone(),
        field: cli.field,
        record: cli.record,
        index: cli.index,
    };

    let view = match MappedView::open(&env.db_dir(), descriptor) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("failed to open {object}: {e}");
            process::exit(exit_code_for(e.code()));
        }
    };

    let Some(field) = view.descriptor().field(ofri.field) else {
        eprintln!("{ofri} has no such field");
        process::exit(exitcode::DATAERR);
    };

    let value = match view.read_value(&ofri) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("failed to read {ofri}: {e}");
            process::exit(exit_code_for(e.code()));
        }
    };

    let dump = serde_json::json!({
        "object": object.as_str(),
        "record_size": view.descriptor().record_size(),
        "record_count": view.descriptor().record_count(),
        "field": {
            "name": field.name(),
            "type_code": field.type_code().as_char().to_string(),
            "num_elements": field.num_elements(),
            "offset": field.offset(),
        },
        "ofri": ofri.to_string(),
        "value": value,
    });
    println!("{}", serde_json::to_string_pretty(&dump).expect("dump serializes"));
}
