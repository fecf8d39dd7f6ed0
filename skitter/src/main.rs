use anyhow::Context;
use clap::Parser;
use skitter_frontier::{Frontier, FrontierConfig, Order};
use std::fs;

mod arguments;

use arguments::Args;
use skitter::seeds;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.quiet {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<FrontierConfig>(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => FrontierConfig::default(),
    };

    let mut frontier = Frontier::new(config)?;

    let urls = seeds::load_urls_from_file(&args.seeds).map_err(anyhow::Error::msg)?;
    let seed_count = urls.len();
    for url in &urls {
        frontier.admit(url, None, None).await;
    }

    let order = if args.lifo { Order::Lifo } else { Order::Fifo };
    let released = frontier.next_ready(order);
    for record in &released {
        println!("{}  depth={} index={}", record.url, record.depth, record.index);
    }

    println!(
        "released {} of {} seed(s); {} pending, {} active",
        released.len(),
        seed_count,
        frontier.pending_count(),
        frontier.active_count()
    );

    Ok(())
}
