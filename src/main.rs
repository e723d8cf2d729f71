use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rss_export::config::{ExportConfig, TranslatorConfig, DEFAULT_FEED_URL, DEFAULT_TARGET_LANGUAGE};
use rss_export::export::run_export;

#[derive(Parser, Debug)]
#[command(
    name = "rss-export",
    about = "Export an RSS feed to CSV, optionally translated via Azure Translator",
    after_help = "Translation is enabled when TRANSLATOR_SERVICE_REGION, \
                  TRANSLATOR_TEXT_RESOURCE_KEY and TRANSLATOR_TEXT_ENDPOINT are all set."
)]
struct Args {
    /// RSS feed to export
    #[arg(long, value_name = "URL", default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// CSV file to write (overwritten)
    #[arg(short, long, value_name = "FILE", default_value = "out.csv")]
    output: PathBuf,

    /// Target language for translation
    #[arg(long, value_name = "LANG", default_value = DEFAULT_TARGET_LANGUAGE)]
    to: String,

    /// Prefix the CSV with a UTF-8 byte-order mark
    #[arg(long)]
    bom: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rss_export=info")),
        )
        .init();

    let args = Args::parse();

    let translator =
        TranslatorConfig::from_env(&args.to).context("Invalid translator configuration")?;
    let config = ExportConfig::new(&args.feed_url, args.output, args.bom, translator)
        .context("Invalid export configuration")?;
    tracing::debug!(?config, "Starting export");

    let summary = run_export(&config)
        .await
        .with_context(|| format!("Export to '{}' failed", config.output_path.display()))?;

    println!(
        "Wrote {} rows{} to {}",
        summary.rows,
        if summary.translated { " (translated)" } else { "" },
        summary.output_path.display()
    );
    Ok(())
}
