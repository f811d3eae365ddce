use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins; otherwise `fallback` (e.g. "info" or "seekart_lib=debug").
pub fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global console subscriber. Later calls are no-ops, so tests
/// and the desktop shell can both call it.
pub fn init(fallback: &str) {
    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter(fallback))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(fallback, "logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init("debug");
        init("warn");
    }

    #[test]
    fn bad_directives_fall_back() {
        let filter = filter("[[not a directive");
        assert!(!filter.to_string().is_empty());
    }
}
