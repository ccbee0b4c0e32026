use serde::{Deserialize, Serialize};

/// Seed message shown before any user interaction.
pub const GREETING: &str = "Bonjour 👋 Posez votre question sur Lyon.";

/// Substituted when the service resolves without any usable answer text.
pub const EMPTY_ANSWER_PLACEHOLDER: &str =
    "Je n'ai pas trouvé de réponse à cette question, pouvez-vous reformuler ?";

/// One turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The sender of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

/// Append-only message log plus the in-flight request flag.
///
/// Turns are never edited or removed; the log only grows. At most one
/// request is outstanding at a time: `append_user` and `begin_pending`
/// both refuse while `pending` is set.
pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
}

impl Conversation {
    /// Starts a conversation seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![Message {
                role: Role::Assistant,
                content: GREETING.to_string(),
            }],
            pending: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Input is locked exactly while a response is outstanding.
    pub fn input_locked(&self) -> bool {
        self.pending
    }

    /// Appends a user turn. Returns false without appending when the
    /// trimmed text is empty or a response is still outstanding.
    pub fn append_user(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.pending {
            return false;
        }
        self.messages.push(Message {
            role: Role::User,
            content: text.to_string(),
        });
        true
    }

    /// Marks a request as outstanding. Returns false if one already is.
    pub fn begin_pending(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn end_pending(&mut self) {
        self.pending = false;
    }

    /// Appends an assistant turn. Blank text becomes the fixed placeholder
    /// so the log never holds an empty bubble.
    pub fn append_assistant(&mut self, text: String) {
        let content = if text.trim().is_empty() {
            EMPTY_ANSWER_PLACEHOLDER.to_string()
        } else {
            text
        };
        self.messages.push(Message {
            role: Role::Assistant,
            content,
        });
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
