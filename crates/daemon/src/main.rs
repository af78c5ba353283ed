#![forbid(unsafe_code)]

//! pagewatch daemon: captures the configured pages on an interval and mails a
//! diff when a page changes visibly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pagewatch_core::{FsArtifactStore, Notifier, ScanConfig, Scanner};
use pagewatch_daemon::container::ContainerRuntime;
use pagewatch_daemon::imagemagick::DockerComparator;
use pagewatch_daemon::mailer::SmtpMailer;
use pagewatch_daemon::rasterize::DockerRasterizer;
use pagewatch_daemon::spawn_scheduler;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Deployment settings. Monitoring parameters come from the environment
/// (PAGES, INTERVAL, THRESHOLD, WIDTH, HEIGHT, SCALE, FUZZ, SMTP_*).
#[derive(Parser, Debug)]
#[command(name = "pagewatch", version, about = "Watch web pages for visual changes")]
struct Args {
    /// Directory holding baseline screenshots. Also bind-mounted into containers.
    #[arg(long, default_value = "/output")]
    output_dir: PathBuf,

    /// Container CLI used to run the rasterizer and comparator.
    #[arg(long, default_value = "docker")]
    docker: String,

    /// Rasterizer image: `<url> <file> <W>px*<H>px <scale>`.
    #[arg(long, default_value = "herzog31/rasterize")]
    rasterize_image: String,

    /// Image providing ImageMagick `compare`.
    #[arg(long, default_value = "herzog31/imagemagick")]
    imagemagick_image: String,

    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ScanConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Err(e).context("load configuration from environment");
        }
    };
    info!(?config, "configuration loaded");

    let output_dir = make_abs(&args.output_dir)?;
    let store = FsArtifactStore::open(&output_dir)?;
    let scratch_root = output_dir.join(".scratch");
    tokio::fs::create_dir_all(&scratch_root)
        .await
        .with_context(|| format!("create scratch dir {}", scratch_root.display()))?;
    let runtime = ContainerRuntime::new(args.docker, scratch_root);

    let mailer = SmtpMailer::new(&config.smtp)?;
    let scanner = Arc::new(Scanner::new(
        Arc::clone(&config),
        Arc::new(store),
        Arc::new(DockerRasterizer::new(runtime.clone(), args.rasterize_image)),
        Arc::new(DockerComparator::new(runtime, args.imagemagick_image)),
        Notifier::new(Arc::new(mailer)),
    ));

    info!(
        pages = config.pages.len(),
        interval_secs = config.interval.as_secs(),
        output_dir = %output_dir.display(),
        "monitoring started"
    );
    let scheduler = spawn_scheduler(scanner, config.interval);

    // In-flight scans are not drained; a cut-short cycle leaves at most a stale
    // current capture, which the next cycle overwrites.
    tokio::select! {
        _ = signal::ctrl_c() => info!("shutdown requested"),
        res = scheduler => res.context("scheduler task ended")?,
    }
    Ok(())
}

fn make_abs(p: &Path) -> anyhow::Result<PathBuf> {
    if p.is_absolute() {
        Ok(p.to_path_buf())
    } else {
        Ok(std::env::current_dir().context("resolve working directory")?.join(p))
    }
}
