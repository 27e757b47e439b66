//! Spot price CLI - Elering electricity prices in c/kWh
//!
//! Fetches today's prices (cached for a few minutes on disk) and prints them
//! as a table or as JSON.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use spotprice::cache::CacheStore;
use spotprice::cli::Cli;
use spotprice::config::Config;
use spotprice::pipeline;
use spotprice::prices::PriceFetcher;
use spotprice::render::render_table;

/// Installs the log subscriber on stderr, `warn` unless `RUST_LOG` says otherwise
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_cli(&cli)?;
    let cache = CacheStore::at(config.cache_path.clone());
    let fetcher = PriceFetcher::new(cache, config.timeout, &config.user_agent)?;

    let snapshot = pipeline::run(&config, &fetcher).await;
    let exported = snapshot.export(config.display_tz);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&exported)?);
    } else {
        print!("{}", render_table(&exported));
    }

    Ok(())
}
