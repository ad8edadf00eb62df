pub mod telegram;

/// A text message received from a chat platform, alive for one reply cycle.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Platform identifier (e.g., "telegram")
    pub platform: String,
    /// Platform-specific chat/channel ID as string
    pub chat_id: String,
    /// Display name of the sender
    pub user_name: String,
    /// The message text
    pub text: String,
    /// The bot's own handle when the message arrived
    pub bot_handle: String,
}

impl IncomingMessage {
    pub fn is_command(&self) -> bool {
        crate::dispatcher::is_command_text(&self.text)
    }
}
