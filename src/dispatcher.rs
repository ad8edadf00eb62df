use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::llm::Completion;
use crate::mention::{GenerationRequest, Mention, MentionParser};
use crate::platform::IncomingMessage;
use crate::prompt;

pub const EMPTY_TOPIC_TEXT: &str = "Please provide a topic after mentioning me.";

/// Sends replies back to the chat a message came from.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, text: &str) -> Result<()>;

    /// Best-effort progress indicator while a joke is generated.
    async fn typing(&self) {}
}

/// Chat commands the bot answers directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Unknown(String),
}

/// A command is `/` directly followed by a letter, digit or `_`, the same
/// shape Telegram marks as a `bot_command` entity.
pub fn is_command_text(text: &str) -> bool {
    text.strip_prefix('/')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse `/cmd` or `/cmd@handle`. Returns `None` for plain text and for
/// commands addressed to a different bot. Names match case-insensitively.
pub fn parse_command(text: &str, handle: &str) -> Option<Command> {
    if !is_command_text(text) {
        return None;
    }
    let word = text[1..].split_whitespace().next().unwrap_or("");
    let (name, target) = match word.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (word, None),
    };
    if target.is_some_and(|t| !t.eq_ignore_ascii_case(handle)) {
        return None;
    }
    Some(match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        _ => Command::Unknown(name.to_string()),
    })
}

pub fn start_text(handle: &str) -> String {
    format!(
        "Hello, I'm a joking AI. Mention me with a topic, e.g. '@{} python'.",
        handle
    )
}

pub fn help_text(handle: &str) -> String {
    format!(
        "Send a message like '@{} anime' to get a joke about anime.",
        handle
    )
}

pub fn usage_hint(handle: &str) -> String {
    format!("Please mention me with a topic, like '@{} cats'.", handle)
}

pub fn acknowledgement(topic: &str) -> String {
    format!("Generating a joke about '{}'...", topic)
}

/// Run the completion for one request and return trimmed, non-empty text.
pub async fn generate_joke(
    completion: &dyn Completion,
    request: &GenerationRequest,
) -> Result<String> {
    let prompt = prompt::build(request.topic());
    let text = completion.complete(&prompt).await?;
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("the model returned an empty response");
    }
    Ok(text.to_string())
}

/// Routes one inbound message to exactly one reply branch.
pub struct ResponseDispatcher {
    parser: MentionParser,
    completion: Arc<dyn Completion>,
}

impl ResponseDispatcher {
    pub fn new(parser: MentionParser, completion: Arc<dyn Completion>) -> Self {
        Self { parser, completion }
    }

    pub fn handle(&self) -> &str {
        self.parser.handle()
    }

    /// Route one inbound message: commands to `handle_command`, everything
    /// else to `handle_text`. Commands for other bots get no reply.
    pub async fn handle_incoming(
        &self,
        replier: &dyn Replier,
        incoming: &IncomingMessage,
    ) -> Result<()> {
        if incoming.is_command() {
            match parse_command(&incoming.text, &incoming.bot_handle) {
                Some(command) => self.handle_command(replier, &command).await,
                None => {
                    debug!("Ignoring command for another bot: {}", incoming.text);
                    Ok(())
                }
            }
        } else {
            self.handle_text(replier, &incoming.text).await
        }
    }

    /// Handle non-command text. Errors returned here come only from the
    /// replier; generation failures are reported to the user instead.
    pub async fn handle_text(&self, replier: &dyn Replier, text: &str) -> Result<()> {
        match self.parser.parse(text) {
            Mention::NotMentioned => {
                debug!("No mention of @{} in message", self.handle());
                replier.reply(&usage_hint(self.handle())).await
            }
            Mention::EmptyTopic => replier.reply(EMPTY_TOPIC_TEXT).await,
            Mention::Topic(request) => self.handle_request(replier, &request).await,
        }
    }

    async fn handle_request(
        &self,
        replier: &dyn Replier,
        request: &GenerationRequest,
    ) -> Result<()> {
        info!("Generating a joke about '{}'", request.topic());

        replier
            .reply(&acknowledgement(request.topic()))
            .await
            .context("Failed to send acknowledgement")?;
        replier.typing().await;

        match generate_joke(self.completion.as_ref(), request).await {
            Ok(joke) => replier.reply(&joke).await,
            Err(e) => {
                error!("Joke generation failed: {:#}", e);
                replier.reply(&format!("Error: {:#}", e)).await
            }
        }
    }

    pub async fn handle_command(&self, replier: &dyn Replier, command: &Command) -> Result<()> {
        match command {
            Command::Start => replier.reply(&start_text(self.handle())).await,
            Command::Help => replier.reply(&help_text(self.handle())).await,
            Command::Unknown(name) => {
                debug!("Ignoring unknown command /{}", name);
                Ok(())
            }
        }
    }
}
