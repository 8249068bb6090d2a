//! Tracing subscriber bootstrap for the demo binary, mirroring the
//! teacher's top-level `main.rs` (`FmtSubscriber` + `EnvFilter::from_default_env()`).

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber reading level filters from
/// `RUST_LOG`. Safe to call once per process; a second call is a no-op
/// (the error from `set_global_default` is swallowed since library code
/// may have already installed a subscriber).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
