use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use teloxide::payloads::SendPhotoSetters;
use teloxide::requests::Requester;
use teloxide::types::{ChatId, InputFile};
use teloxide::Bot;
use tracing::info;

use super::Publisher;
use crate::config::TelegramSettings;

/// Telegram's limit on photo captions, in UTF-16 code units.
pub const CAPTION_LIMIT: usize = 1024;

/// Sends the post as a photo message to one chat or channel.
#[derive(Debug, Clone)]
pub struct TelegramPublisher {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramPublisher {
    pub fn from_settings(settings: &TelegramSettings) -> Self {
        Self {
            bot: Bot::new(settings.bot_token.clone()),
            chat_id: ChatId(settings.chat_id),
        }
    }
}

/// Cut `caption` to Telegram's limit, ending with an ellipsis when shortened.
pub fn fit_caption(caption: &str) -> String {
    if caption.encode_utf16().count() <= CAPTION_LIMIT {
        return caption.to_string();
    }
    let budget = CAPTION_LIMIT - '…'.len_utf16();
    let mut used = 0;
    let mut cut = String::new();
    for ch in caption.chars() {
        used += ch.len_utf16();
        if used > budget {
            break;
        }
        cut.push(ch);
    }
    cut.push('…');
    cut
}

#[async_trait]
impl Publisher for TelegramPublisher {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn verify(&self) -> Result<()> {
        let me = self
            .bot
            .get_me()
            .await
            .context("telegram bot token rejected")?;
        info!(bot = %me.username(), "telegram credentials ok");
        Ok(())
    }

    async fn publish(&self, image_url: &str, caption: &str) -> Result<String> {
        let url = Url::parse(image_url).with_context(|| format!("invalid image URL: {image_url}"))?;
        let message = self
            .bot
            .send_photo(self.chat_id, InputFile::url(url))
            .caption(fit_caption(caption))
            .await
            .context("telegram sendPhoto failed")?;
        Ok(message.id.0.to_string())
    }
}
