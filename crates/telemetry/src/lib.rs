//! Minimal `tracing` setup shared by tests and binaries in this workspace.
//!
//! `evmtrace-core` only depends on the `tracing` facade, never on a
//! subscriber, so it can be embedded in any host. This crate is where the
//! workspace's tests and any downstream binary install one.

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a `fmt` subscriber driven by `RUST_LOG` (defaulting to `info`).
///
/// Safe to call from every test in every crate — only the first call takes
/// effect, later ones are no-ops.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_when_called_twice() {
        init_test_tracing();
        init_test_tracing();
    }
}
