//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "warn";

/// Pick the active filter directive.
///
/// Precedence: CLI flag, then `RUST_LOG`, then the config file, then
/// [`DEFAULT_FILTER`]. Blank values are skipped.
pub fn resolve_filter(cli: Option<&str>, env: Option<&str>, config: Option<&str>) -> String {
    [cli, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install a stderr subscriber. Returns `false` if the directive was invalid
/// and the default was used, or if a subscriber was already installed.
pub fn init(cli: Option<&str>, config: Option<&str>) -> bool {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = resolve_filter(cli, env.as_deref(), config);

    let (env_filter, valid) = match EnvFilter::try_new(&directive) {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(DEFAULT_FILTER), false),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true),
    );

    if subscriber.try_init().is_err() {
        return false;
    }

    if !valid {
        tracing::warn!(%directive, "invalid log filter, using default");
    }
    tracing::debug!(%directive, "tracing initialized");
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_wins() {
        assert_eq!(resolve_filter(Some("debug"), Some("info"), Some("trace")), "debug");
    }

    #[test]
    fn env_before_config() {
        assert_eq!(resolve_filter(None, Some("info"), Some("trace")), "info");
        assert_eq!(resolve_filter(None, None, Some("trace")), "trace");
    }

    #[test]
    fn blank_values_fall_through() {
        assert_eq!(resolve_filter(Some("  "), Some(""), None), DEFAULT_FILTER);
    }
}
