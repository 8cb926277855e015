//! Conversation history for follow-up questions.
//!
//! History is a flat list of user/assistant turns, optionally persisted
//! as a JSON file so a session survives process restarts. The rendered
//! form is folded into the synthesis prompt.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::Result;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The querying user.
    User,

    /// The synthesized answer.
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke.
    pub role: Role,

    /// What was said.
    pub content: String,
}

/// An append-only conversation log.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    path: Option<PathBuf>,
}

impl ConversationHistory {
    /// Create an in-memory history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load history from `path`, starting empty if the file is absent.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let turns = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };

        debug!("Loaded {} conversation turns", turns.len());
        Ok(Self {
            turns,
            path: Some(path),
        })
    }

    /// Persist the history, if it has a backing file.
    pub async fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let content = serde_json::to_string_pretty(&self.turns)?;

            // Write atomically using a temp file
            let temp_path = path.with_extension("json.tmp");
            fs::write(&temp_path, &content).await?;
            fs::rename(&temp_path, path).await?;
            debug!("Saved {} conversation turns", self.turns.len());
        }
        Ok(())
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::User,
            content: content.into(),
        });
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    /// All turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Whether no turns have been recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the history for prompt inclusion.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "USER",
                    Role::Assistant => "ASSISTANT",
                };
                format!("{role}: {}", turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
