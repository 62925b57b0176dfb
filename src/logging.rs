//! Subscriber setup shared by the binaries.
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    filter_or_default(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

fn filter_or_default(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the compact fmt subscriber.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_defaults_to_info() {
        assert_eq!(filter_or_default(None).to_string(), "info");
        assert_eq!(filter_or_default(Some("  ")).to_string(), "info");
    }

    #[test]
    fn explicit_directives_win() {
        assert_eq!(filter_or_default(Some("debug")).to_string(), "debug");
    }
}
