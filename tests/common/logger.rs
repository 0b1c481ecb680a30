use env_logger::{Builder, Env};
use std::sync::Once;

static INIT: Once = Once::new();

/// Test-harness logger setup; capture-friendly and installed once per binary.
/// `RUST_LOG` overrides the built-in directives.
pub fn initialize_logger() {
    INIT.call_once(|| {
        let env = Env::default().default_filter_or("info,magnetite=debug");
        Builder::from_env(env)
            .format_timestamp_millis()
            .is_test(true)
            .init();
    });
}
