//! Append-only conversation history exchanged with a language model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Speaker of a single conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One role-tagged turn carrying one or more text segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![text.into()],
        }
    }

    /// All text segments joined with newlines.
    pub fn text(&self) -> String {
        self.parts.join("\n")
    }
}

/// Ordered, immutable sequence of turns.
///
/// Extending a conversation produces a new, longer value; the original stays
/// untouched so intermediate histories remain inspectable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Arc<[Turn]>,
}

impl Conversation {
    pub fn new(turns: impl IntoIterator<Item = Turn>) -> Self {
        Self {
            turns: turns.into_iter().collect(),
        }
    }

    /// Return a new conversation with `turn` appended.
    #[must_use]
    pub fn with(&self, turn: Turn) -> Self {
        self.extended([turn])
    }

    /// Return a new conversation with all `turns` appended in order.
    #[must_use]
    pub fn extended(&self, turns: impl IntoIterator<Item = Turn>) -> Self {
        Self {
            turns: self.turns.iter().cloned().chain(turns).collect(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
