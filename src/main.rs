use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use daily_art_poster::config;
use daily_art_poster::generator::TemplateGenerator;
use daily_art_poster::logging;
use daily_art_poster::orchestrator::DailyPostOrchestrator;
use daily_art_poster::publisher;
use daily_art_poster::replenish::QueueReplenisher;
use daily_art_poster::source::MetClient;
use daily_art_poster::store::StateStore;
use daily_art_poster::terms;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Publish today's artwork post, refilling the queue first when it runs low"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    // Credentials first: a run that cannot publish should not touch the queue.
    let publisher = publisher::from_config(&cfg.publisher).await?;
    let source = MetClient::from_settings(&cfg.source)?;
    let generator = TemplateGenerator::new();
    let terms = terms::load(&cfg.terms_file()).await;
    let store = StateStore::new(cfg.data_dir());

    let replenisher = QueueReplenisher::new(
        &source,
        &generator,
        &terms,
        cfg.queue.clone(),
        cfg.retry.backoff(),
    );
    let orchestrator = DailyPostOrchestrator::new(&store, &replenisher, publisher.as_ref());

    info!(data_dir = %store.data_dir().display(), "starting daily post run");
    match orchestrator.run().await {
        Ok(outcome) => {
            info!(
                post_id = %outcome.post_id,
                object_id = outcome.object_id,
                remaining = outcome.remaining,
                "daily post complete"
            );
            println!("Posted \"{}\" by {}", outcome.title, outcome.artist);
            println!("Post ID: {}", outcome.post_id);
            if let Some(url) = &outcome.post_url {
                println!("URL: {url}");
            }
            println!("Queue remaining: {}", outcome.remaining);
            Ok(())
        }
        Err(err) => {
            error!(%err, "daily post run failed");
            Err(err.into())
        }
    }
}
