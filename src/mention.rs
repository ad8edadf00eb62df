use anyhow::{Context, Result};
use regex::Regex;

/// A validated request for one joke. The topic is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
}

impl GenerationRequest {
    /// Returns `None` when the topic is blank after trimming.
    pub fn new(topic: &str) -> Option<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            None
        } else {
            Some(Self {
                topic: topic.to_string(),
            })
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Outcome of scanning a message for a mention of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mention {
    /// `@handle` followed by whitespace and a topic was not found.
    NotMentioned,
    /// The bot was mentioned but only whitespace followed.
    EmptyTopic,
    Topic(GenerationRequest),
}

/// Matches `@<handle>` followed by whitespace and captures the rest of the line.
///
/// The handle is compared literally and case-sensitively.
#[derive(Debug, Clone)]
pub struct MentionParser {
    handle: String,
    pattern: Regex,
}

impl MentionParser {
    pub fn new(handle: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"@{}\s+(.+)", regex::escape(handle)))
            .with_context(|| format!("Failed to build mention pattern for @{}", handle))?;
        Ok(Self {
            handle: handle.to_string(),
            pattern,
        })
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Only the first mention in the message is considered.
    pub fn parse(&self, text: &str) -> Mention {
        let Some(captures) = self.pattern.captures(text) else {
            return Mention::NotMentioned;
        };
        let captured = captures.get(1).map_or("", |m| m.as_str());
        match GenerationRequest::new(captured) {
            Some(request) => Mention::Topic(request),
            None => Mention::EmptyTopic,
        }
    }
}
