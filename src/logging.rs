//! # Logging Module
//!
//! Installs a `tracing` subscriber once per process. Every binary calls
//! [`init`] at the top of `main`, in place of the reference implementation's
//! `Logger` singleton and `LOG_INFO`/`LOG_WARN`/`LOG_DEBUG` macros.

use tracing_subscriber::EnvFilter;

/// Installs the process-wide `tracing` subscriber. Honors `RUST_LOG`,
/// defaulting to `info` when unset. Safe to call more than once; later
/// calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
