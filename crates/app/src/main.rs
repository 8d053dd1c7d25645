use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use folio_core::Report;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod audit;
mod config;
mod context;
mod registry;
mod runner;
mod watch;

use audit::AuditLog;
use config::AppConfig;
use context::{AccessGate, RequestContext};
use registry::Registry;
use runner::Runner;

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Statement processing shell")]
struct Cli {
    /// Configuration file (defaults to ./folio.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered operations
    List,

    /// Run an operation on one document
    Run {
        operation: String,
        input: PathBuf,

        /// Operator name recorded in the usage log
        #[arg(long)]
        user: String,

        #[arg(long, env = "FOLIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Output folder (default: <output_root>/<operation>)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process every PDF dropped into a folder until interrupted
    Watch {
        operation: String,
        dir: PathBuf,

        #[arg(long)]
        user: String,

        #[arg(long, env = "FOLIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Parent of per-file output folders (default: <output_root>/<operation>)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the usage log
    Log {
        /// Delete the usage log instead
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,lopdf=warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("reading working directory")?;
    let config = AppConfig::load(cli.config.as_deref(), &cwd).context("loading configuration")?;
    let runner = Runner::new(
        Registry::with_builtin(&config.extraction),
        AuditLog::new(config.audit_log.clone()),
    );

    match cli.command {
        Command::List => {
            for operation in runner.registry().iter() {
                println!("{:<20} {}", operation.name(), operation.description());
            }
        }

        Command::Run { operation, input, user, password, out, json } => {
            let ctx = sign_in(&user, password.as_deref())?;
            let out = out.unwrap_or_else(|| config.output_dir_for(&operation));
            let report = runner
                .run(&ctx, &operation, &input, &out)
                .await
                .with_context(|| format!("{operation} failed on {}", input.display()))?;
            print_report(&report, json)?;
        }

        Command::Watch { operation, dir, user, password, out } => {
            let ctx = sign_in(&user, password.as_deref())?;
            if runner.registry().get(&operation).is_none() {
                bail!(
                    "unknown operation `{operation}` (available: {})",
                    runner.registry().names().join(", ")
                );
            }
            let root = out.unwrap_or_else(|| config.output_dir_for(&operation));
            watch_folder(&runner, &ctx, &operation, &dir, &root).await?;
        }

        Command::Log { clear } => {
            let log = AuditLog::new(config.audit_log.clone());
            if clear {
                if log.clear()? {
                    println!("Usage log cleared.");
                } else {
                    println!("No usage log yet.");
                }
            } else {
                let records = log.read_all()?;
                if records.is_empty() {
                    println!("No usage log yet.");
                }
                for r in records {
                    println!("{}  {:<12} {:<16} {:<32} {}", r.timestamp, r.operator, r.operation, r.file, r.outcome);
                }
            }
        }
    }

    Ok(())
}

fn sign_in(user: &str, password: Option<&str>) -> Result<RequestContext> {
    let gate = AccessGate::from_env();
    if !gate.is_configured() {
        bail!("no access key configured (set {})", context::ACCESS_KEY_ENV);
    }
    let ctx = gate.authenticate(user, password);
    ctx.require()?;
    Ok(ctx)
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        let map: serde_json::Map<String, serde_json::Value> = report
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        let width = report.fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (label, value) in &report.fields {
            println!("{label:<width$}  {value}");
        }
    }
    Ok(())
}

const SETTLE_INTERVAL: Duration = Duration::from_millis(250);
const SETTLE_ATTEMPTS: u32 = 40;

async fn watch_folder(
    runner: &Runner,
    ctx: &RequestContext,
    operation: &str,
    dir: &Path,
    root: &Path,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<PathBuf>(64);
    // The watcher must be kept alive for the duration of the loop.
    let _watcher = watch::spawn_pdf_watcher(dir, tx)
        .with_context(|| format!("watching {}", dir.display()))?;
    tracing::info!(dir = %dir.display(), operation, "watching for new PDFs");

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(path) = received else { break };
                if !watch::wait_until_stable(&path, SETTLE_INTERVAL, SETTLE_ATTEMPTS).await {
                    tracing::warn!(file = %path.display(), "file did not settle, skipping");
                    continue;
                }
                let out = watch::output_dir_for(root, &path);
                match runner.run(ctx, operation, &path, &out).await {
                    Ok(report) => {
                        println!("{}", path.display());
                        print_report(&report, false)?;
                    }
                    Err(e) => tracing::warn!(file = %path.display(), "{e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("stopping watcher");
                break;
            }
        }
    }
    Ok(())
}
