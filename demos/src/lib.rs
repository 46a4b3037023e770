/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Shared setup for the demo binaries.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs a formatting subscriber honouring `RUST_LOG`, defaulting to
/// `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt().with_env_filter(filter).with_thread_names(true).init();
}
