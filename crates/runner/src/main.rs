use anyhow::{Context, Result, bail};
use clap::Parser;
use dsnparse_config::{AppConfig, load_cfg};
use dsnparse_core::Dsn;
use dsnparse_runner::version::{VERSION, build_info};
use dsnparse_runner::{Report, collect_targets};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Parse connection strings and print their components.
#[derive(Parser, Debug)]
#[command(name = "dsnparse", version = VERSION)]
struct Args {
    /// Connection strings to parse
    dsns: Vec<String>,
    /// YAML config file or directory with named DSN entries
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print one JSON object per DSN
    #[arg(long)]
    json: bool,
    /// Print passwords instead of masking them
    #[arg(long)]
    show_secrets: bool,
    /// Log level or EnvFilter directive (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,
    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let app_cfg = match &args.config {
        Some(path) => load_cfg(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    let cfg = o11y::O11yConfig {
        logging: o11y::logging::Config {
            level: args.log_level.clone().or(app_cfg.logging.level.clone()),
            json: args.log_json || app_cfg.logging.json,
            with_targets: app_cfg.logging.with_targets,
        },
        install_panic_hook: true,
    };

    let _ = o11y::init_all(&cfg);
    debug!(build = %build_info(), "dsnparse starting");

    let targets = collect_targets(&args.dsns, &app_cfg.dsns);
    if targets.is_empty() {
        bail!("no DSN given: pass one or more DSNs or --config <file|dir>");
    }
    info!(count = targets.len(), "parsing dsns");

    let mut stdout = io::stdout().lock();
    for (i, target) in targets.iter().enumerate() {
        let dsn = Dsn::parse(target.raw);
        debug!(name = ?target.name, dsn = %dsn, "dsn parsed");

        let report = Report::new(target.name, &dsn, args.show_secrets);
        if args.json {
            let line = report.to_json().context("serialize report")?;
            writeln!(stdout, "{line}")?;
        } else {
            if i > 0 {
                writeln!(stdout)?;
            }
            write!(stdout, "{}", report.to_text())?;
        }
    }
    stdout.flush()?;

    Ok(())
}
