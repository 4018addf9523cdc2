//! # Listener CLI
//!
//! Runs the update daemon against a registered object with a configurable
//! worker-thread count (drives C7 + C8). Thin glue; see spec §6.6.

use std::process;
use std::sync::Arc;

use clap::Parser;

use slotdb::config::Environment;
use slotdb::daemon::UpdateDaemon;
use slotdb::error::exit_code_for;
use slotdb::key::Object;
use slotdb::schema::manifest;

/// Starts the update daemon, listening for framed `DB_READ`/`DB_WRITE`
/// requests and fanning write notifications out to subscribers.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Object to monitor. Must already be registered (run `schemac` first).
    object: String,
    /// Number of monitor worker threads. Defaults to the host's CPU count.
    #[arg(short, long)]
    threads: Option<usize>,
    /// Port to bind. Defaults to `$KDB_INET_PORT`.
    #[arg(short, long)]
    port: Option<String>,
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

    if registry.lookup(&object).is_none() {
        eprintln!("object {object} is not registered; run schemac first");
        process::exit(exitcode::NOINPUT);
    }

    let threads = cli.threads.unwrap_or_else(num_cpus::get);
    let port = cli.port.unwrap_or_else(|| env.inet_port().to_string());

    let daemon = match UpdateDaemon::start(Arc::new(registry), env.db_dir(), &port, threads) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to start listener: {e}");
            process::exit(exit_code_for(e.code()));
        }
    };

    tracing::info!(
        object = %object,
        port = daemon.local_port().unwrap_or_default(),
        threads = daemon.worker_count(),
        "listener started"
    );

    // The acceptor and worker pool each run on their own threads; park the
    // main thread so `daemon` stays alive for the life of the process.
    loop {
        std::thread::park();
    }
}
