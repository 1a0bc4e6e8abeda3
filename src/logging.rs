//! Tracing subscriber setup.
//!
//! Logs go to stderr so `forecast` and `counties` output stays pipeable.
//! `RUST_LOG` overrides the default filter there. The TUI owns the terminal,
//! so it installs no subscriber at all and ignores `RUST_LOG`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for the server and one-shot commands.
pub const DEFAULT_FILTER: &str = "ev_dash=info,tower_http=info";

/// Where log output may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Nothing is written, whatever the environment says.
    Silent,
}

pub fn init(target: LogTarget) {
    let Some(directives) = filter_directives(target, std::env::var(EnvFilter::DEFAULT_ENV).ok()) else {
        return;
    };
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Filter directives for `target`, or `None` when nothing should be logged.
fn filter_directives(target: LogTarget, env: Option<String>) -> Option<String> {
    match target {
        LogTarget::Silent => None,
        LogTarget::Stderr => Some(
            env.filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_honors_rust_log() {
        assert_eq!(
            filter_directives(LogTarget::Stderr, Some("ev_dash=debug".to_string())).as_deref(),
            Some("ev_dash=debug")
        );
        assert_eq!(filter_directives(LogTarget::Stderr, None).as_deref(), Some(DEFAULT_FILTER));
        assert_eq!(
            filter_directives(LogTarget::Stderr, Some("  ".to_string())).as_deref(),
            Some(DEFAULT_FILTER)
        );
    }

    #[test]
    fn silent_ignores_rust_log() {
        assert_eq!(filter_directives(LogTarget::Silent, Some("trace".to_string())), None);
        assert_eq!(filter_directives(LogTarget::Silent, None), None);
    }
}
