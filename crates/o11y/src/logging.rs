use std::sync::Once;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt,
};

static INIT: Once = Once::new();

#[derive(Clone, Debug)]
pub struct Config {
    /// Either a simple level like "warn" or a full EnvFilter string
    /// e.g. "warn,dsnparse_core=trace".
    pub level: Option<String>,
    /// Emit logs as JSON lines when true; otherwise plain text.
    pub json: bool,
    /// Include target info in logs.
    pub with_targets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Some("warn".to_owned()),
            json: false,
            with_targets: false,
        }
    }
}

/// Filter directive to use: `RUST_LOG` wins, then the configured level.
fn filter_directive(cfg: &Config, env: Option<String>) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| cfg.level.clone())
        .unwrap_or_else(|| "warn".into())
}

/// Install the global subscriber. Logs go to stderr so stdout stays free
/// for command output. Later calls are no-ops.
pub fn init(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut result: Result<(), String> = Ok(());
    INIT.call_once(|| {
        let _ = LogTracer::init();

        let directive = filter_directive(cfg, std::env::var("RUST_LOG").ok());
        let filter = EnvFilter::try_new(&directive)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let fmt_layer = if cfg.json {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(cfg.with_targets)
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(cfg.with_targets)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = Registry::default().with(filter).with(fmt_layer);
        result = tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| e.to_string());
    });
    result.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_configured_level() {
        let cfg = Config {
            level: Some("info".into()),
            ..Config::default()
        };
        assert_eq!(filter_directive(&cfg, Some("debug".into())), "debug");
        assert_eq!(filter_directive(&cfg, Some("  ".into())), "info");
        assert_eq!(filter_directive(&cfg, None), "info");
    }

    #[test]
    fn falls_back_to_warn() {
        let cfg = Config {
            level: None,
            ..Config::default()
        };
        assert_eq!(filter_directive(&cfg, None), "warn");
    }
}
