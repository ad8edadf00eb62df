use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ChatAction};
use tracing::{error, info, warn};

use crate::dispatcher::{Replier, ResponseDispatcher};
use crate::platform::IncomingMessage;

/// Telegram rejects messages over 4096 chars; chunk below that.
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Replies into the chat a message came from.
pub struct TelegramReplier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramReplier {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl Replier for TelegramReplier {
    async fn reply(&self, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LENGTH) {
            self.bot
                .send_message(self.chat_id, chunk)
                .await
                .context("Failed to send Telegram message")?;
        }
        Ok(())
    }

    async fn typing(&self) {
        self.bot
            .send_chat_action(self.chat_id, ChatAction::Typing)
            .await
            .ok();
    }
}

/// Resolve the bot's own @handle via `getMe`.
pub async fn fetch_handle(bot: &Bot) -> Result<String> {
    let me = bot
        .get_me()
        .await
        .context("Failed to fetch bot identity from Telegram")?;
    me.user
        .username
        .clone()
        .context("Telegram bot account has no username")
}

/// Advertise /start and /help in the Telegram command menu.
pub async fn register_commands(bot: &Bot) {
    let commands = vec![
        BotCommand::new("start", "Introduce the bot"),
        BotCommand::new("help", "Show how to ask for a joke"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("Failed to register bot commands: {}", e);
    }
}

/// Run the Telegram bot platform
pub async fn run(bot: Bot, dispatcher: Arc<ResponseDispatcher>) -> Result<()> {
    info!("Starting Telegram platform as @{}...", dispatcher.handle());

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dispatcher: Arc<ResponseDispatcher>,
) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t.to_string(),
        None => return Ok(()),
    };

    let incoming = IncomingMessage {
        platform: "telegram".to_string(),
        chat_id: msg.chat.id.0.to_string(),
        user_name: msg
            .from
            .as_ref()
            .map(|u| u.first_name.clone())
            .unwrap_or_default(),
        text,
        bot_handle: dispatcher.handle().to_string(),
    };

    info!(
        "{} message from {} in chat {}: {}",
        incoming.platform, incoming.user_name, incoming.chat_id, incoming.text
    );

    let replier = TelegramReplier::new(bot, msg.chat.id);

    if let Err(e) = dispatcher.handle_incoming(&replier, &incoming).await {
        error!("Failed to reply in chat {}: {:#}", incoming.chat_id, e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_single_chunk() {
        assert_eq!(split_message("a joke", 4000), vec!["a joke".to_string()]);
    }

    #[test]
    fn test_long_message_splits_on_whitespace() {
        let text = "word ".repeat(20);
        let chunks = split_message(&text, 12);
        assert!(chunks.iter().all(|c| c.len() <= 12));
        assert_eq!(chunks.concat(), text);
        assert!(chunks[0].ends_with(' '));
    }

    #[test]
    fn test_split_respects_utf8_boundaries() {
        let text = "é".repeat(10);
        let chunks = split_message(&text, 5);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.len() <= 5));
    }
}
