use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use super::config::{Cli, CrawlMode, SiteProfile};
use super::crawl::{Crawler, HttpSource};
use super::types::CrawlSummary;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_profile(cli: &Cli) -> io::Result<SiteProfile> {
    let mut profile = match &cli.profile {
        Some(path) => SiteProfile::from_path(path).map_err(io::Error::other)?,
        None => SiteProfile::default(),
    };
    if let Some(ref ua) = cli.user_agent {
        profile.user_agent = ua.clone();
    }
    profile.validate().map_err(io::Error::other)?;
    Ok(profile)
}

fn report(summary: &CrawlSummary, fetch_failures: &[String]) {
    for url in fetch_failures {
        eprintln!("not retrieved: {url}");
    }
    eprintln!(
        "finished crawl: pages={} rows={} fetch_failures={} skipped={} output={}",
        summary.pages_scraped,
        summary.rows_written,
        summary.fetch_failures,
        summary.skipped_pages,
        summary.output_path.display()
    );
}

pub async fn run() -> io::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let profile = load_profile(&cli)?;
    let source = HttpSource::new(&profile.user_agent).map_err(io::Error::other)?;
    let mut crawler = Crawler::new(profile, source, cli.output_dir.clone());

    let summary = match cli.mode() {
        CrawlMode::All => crawler.crawl_all().await,
        CrawlMode::Categories(urls) => crawler.crawl_categories(&urls).await,
        CrawlMode::Products(urls) => crawler.crawl_products(&urls).await,
    }
    .map_err(io::Error::other)?;

    report(&summary, crawler.fetch_failures());
    Ok(())
}
