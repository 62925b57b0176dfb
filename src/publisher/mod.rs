//! Outbound side: where a post ends up.
use anyhow::Result;
use async_trait::async_trait;

use crate::config::{PublisherKind, PublisherSettings};

pub mod facebook;
pub mod telegram;

pub use facebook::FacebookPublisher;
pub use telegram::TelegramPublisher;

/// Publishes one image with a caption and returns the remote post id.
///
/// A failed publish is final for the current run; callers do not retry.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check credentials before any other work is done.
    async fn verify(&self) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, image_url: &str, caption: &str) -> Result<String>;

    /// Public link for a post id, when the platform has one.
    fn post_url(&self, _post_id: &str) -> Option<String> {
        None
    }
}

/// Build the publisher selected in the configuration.
pub async fn from_config(settings: &PublisherSettings) -> Result<Box<dyn Publisher>> {
    match settings.kind {
        PublisherKind::Facebook => Ok(Box::new(
            FacebookPublisher::connect(&settings.facebook).await?,
        )),
        PublisherKind::Telegram => Ok(Box::new(TelegramPublisher::from_settings(
            &settings.telegram,
        ))),
    }
}
