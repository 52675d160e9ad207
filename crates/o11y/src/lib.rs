//! Logging and panic reporting for the `dsnparse` binary.
//!
//! Call [`init_all`] once at startup, before any DSN is parsed.

pub mod logging;
pub mod panic;

/// What [`init_all`] sets up.
#[derive(Clone, Debug)]
pub struct O11yConfig {
    pub logging: logging::Config,
    /// Route panics through `tracing` so a crash shows up in JSON logs
    /// with its location instead of only as raw stderr text.
    pub install_panic_hook: bool,
}

impl Default for O11yConfig {
    fn default() -> Self {
        Self {
            logging: logging::Config::default(),
            install_panic_hook: true,
        }
    }
}

/// Install the subscriber, then the panic hook when enabled.
///
/// The hook is installed after logging so its `error!` has somewhere to go.
pub fn init_all(cfg: &O11yConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&cfg.logging)?;
    if cfg.install_panic_hook {
        panic::install_hook();
    }
    Ok(())
}
