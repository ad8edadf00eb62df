use serde::Serialize;

pub const SYSTEM_INSTRUCTION: &str = "You are a joking AI. Give only one joke about the given topic. \
     Do not continue the conversation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// The fixed two-turn prompt sent for every joke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub system: Turn,
    pub user: Turn,
}

impl PromptSpec {
    /// Turns in the order they are sent to the model.
    pub fn turns(&self) -> [&Turn; 2] {
        [&self.system, &self.user]
    }
}

/// Build the joke prompt. The topic is inserted verbatim.
pub fn build(topic: &str) -> PromptSpec {
    PromptSpec {
        system: Turn {
            role: Role::System,
            content: SYSTEM_INSTRUCTION.to_string(),
        },
        user: Turn {
            role: Role::User,
            content: format!("Generate a joke about {}.", topic),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_order_and_roles() {
        let prompt = build("cats");
        let turns = prompt.turns();
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[1].content, "Generate a joke about cats.");
    }

    #[test]
    fn test_topic_is_not_escaped_or_truncated() {
        let topic = "  {topic} <b>rust</b> \"quotes\" and a very long tail ".repeat(20);
        let prompt = build(&topic);
        assert!(prompt.user.content.contains(&topic));
    }

    #[test]
    fn test_system_instruction_is_fixed() {
        assert_eq!(build("a").system, build("b").system);
        assert!(build("a").system.content.contains("only one joke"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }
}
