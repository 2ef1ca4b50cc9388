use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_refresh::{
    aliases::AliasTable, config::Config, output, pipeline::run_pipeline, template::Template,
};

#[derive(Parser)]
#[command(name = "iptv-refresh")]
#[command(version)]
#[command(about = "Aggregate, validate and rank IPTV live-stream sources")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Output directory (overrides config file)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Skip the throughput measurement on HTTP probes
    #[arg(long)]
    no_speed_test: bool,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("iptv_refresh={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting iptv-refresh v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(Path::new(&cli.config))?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(output_dir) = cli.output_dir {
        config.output.dir = output_dir;
    }
    if cli.no_speed_test {
        config.filter.open_speed_test = false;
    }

    let template = Template::load(config.template_file.as_deref())?;
    let aliases = AliasTable::load(config.alias_file.as_deref())?;

    let report = run_pipeline(&config).await?;

    let generated_at = Utc::now();
    output::write_outputs(
        &config.output,
        &report.ranked,
        &template,
        &aliases,
        &report.stats,
        generated_at,
    )?;

    info!(
        channels = report.stats.channels_ranked,
        urls = report.stats.urls_ranked,
        elapsed_secs = report.stats.elapsed_seconds,
        "update completed"
    );
    Ok(())
}
