use std::path::PathBuf;

use ad_select_core::catalog::Catalog;
use ad_select_core::config::ServiceConfig;
use ad_select_core::logging;
use ad_select_core::selection::AdSelector;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "ad-select")]
#[command(about = "Select the advertisement to render for a customer and marketplace")]
struct Cli {
    /// Catalog snapshot directory; overrides `catalog_dir` from the config file.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long)]
    marketplace: String,

    /// Omit for an anonymous customer.
    #[arg(long)]
    customer: Option<String>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Print selection metadata alongside the advertisement.
    #[arg(long)]
    report: bool,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logger(&config.logging, cli.verbose);

    let catalog_dir = config
        .resolve_catalog_dir(cli.catalog)
        .ok_or("no catalog directory given (use --catalog or catalog_dir in the config file)")?;

    let catalog = Catalog::open(&catalog_dir)?;
    tracing::info!(
        catalog_version = %catalog.manifest().catalog_version,
        contents = catalog.manifest().content_count,
        "Catalog opened"
    );

    let selector = AdSelector::new(&catalog, &catalog);
    let report = selector.select_with_report(cli.customer.as_deref(), Some(cli.marketplace.as_str()))?;

    let output = if cli.report {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.advertisement)?
    };
    println!("{output}");

    Ok(())
}
