use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use daily_art_poster::config;
use daily_art_poster::logging;
use daily_art_poster::store::StateStore;

#[derive(Debug, Parser)]
#[command(author, version, about = "Show the post queue and recent posting history")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// How many queued posts and log entries to list
    #[arg(long, default_value = "10")]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    let store = StateStore::new(cfg.data_dir());

    let queue = store.queue().load().await?;
    let used = store.load_used().await?;
    let log = store.load_log().await?;

    println!("Data dir: {}", store.data_dir().display());
    println!(
        "Queue: {} posts (refill below {}, growth {})",
        queue.len(),
        cfg.queue.min_size,
        cfg.queue.growth
    );
    for (i, post) in queue.iter().take(args.limit).enumerate() {
        let stale = if used.contains(post.artwork_id()) {
            " [already used]"
        } else {
            ""
        };
        println!(
            "  {:>2}. #{} \"{}\" by {} ({}){}",
            i + 1,
            post.artwork_id(),
            post.artwork.title,
            post.artwork.artist,
            post.kind.as_str(),
            stale
        );
    }
    if queue.len() > args.limit {
        println!("  ... {} more", queue.len() - args.limit);
    }

    println!("Used artworks: {}", used.len());
    println!("Posting log: {} entries", log.len());
    for entry in log.recent(args.limit).iter().rev() {
        println!(
            "  {} post {} artwork #{} \"{}\" by {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.post_id,
            entry.object_id,
            entry.title,
            entry.artist
        );
    }
    Ok(())
}
