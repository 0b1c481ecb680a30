use env_logger::{Builder, Env};
use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global logger. Safe to call from every entry point; only the
/// first call does anything. `RUST_LOG` overrides the built-in directives.
pub fn initialize_logger() {
    INIT.call_once(|| {
        let env = Env::default().default_filter_or("info,magnetite=debug");
        Builder::from_env(env).format_timestamp_millis().init();
    });
}
