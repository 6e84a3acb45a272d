use std::env;

use anyhow::{Context, Result, bail};
use tracing::info;

use tripmind::{TripMindConfig, TripPlanner, logging, normalize_query, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = TripMindConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging)?;

    let cache = TripPlanner::cache_from_config(&config);
    let planner = TripPlanner::from_config(&config, cache.clone())?;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return web::run(config, planner, cache).await;
    }

    let joined = args.join(" ");
    let Some(query) = normalize_query(&joined) else {
        bail!("Location cannot be empty");
    };
    info!("Running single query: {}", query);
    let plan = planner.process_query(query).await;
    println!("{}", serde_json::to_string_pretty(&plan)?);

    Ok(())
}
