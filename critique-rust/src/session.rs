use crate::{
    parser::CritiqueOutcome,
    request::{Goal, NormalizedImage, NormalizedInput},
    schema::CritiqueResult,
    Category,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Critique(Box<CritiqueResult>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: TurnContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<NormalizedImage>,
}

/// A caller-owned conversation: the submission, the critique, and every
/// follow-up after it. Turns are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub goal: Goal,
    /// Category of the submission that opened the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default)]
    turns: Vec<ConversationTurn>,
}

impl Session {
    #[must_use]
    pub fn new(goal: Goal) -> Self {
        Self {
            goal,
            ..Default::default()
        }
    }

    /// Rebuild a session from turns the caller kept.
    #[must_use]
    pub fn with_turns(mut self, turns: Vec<ConversationTurn>) -> Self {
        self.turns = turns;
        self
    }

    /// Start a session from a submission and what it produced.
    #[must_use]
    pub fn from_submission(
        input: &NormalizedInput,
        category: Category,
        outcome: &CritiqueOutcome,
    ) -> Self {
        let mut session = Self {
            goal: input.goal,
            category: Some(category),
            audience: input.audience.clone(),
            platform: input.platform.clone(),
            turns: vec![],
        };
        session.push_user(input.text.clone(), input.images.clone());
        session.push_outcome(outcome.clone());
        session
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn push_user(&mut self, text: impl Into<String>, attachments: Vec<NormalizedImage>) {
        self.turns.push(ConversationTurn {
            role: Role::User,
            content: TurnContent::Text(text.into()),
            attachments,
        });
    }

    pub fn push_agent_text(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role: Role::Agent,
            content: TurnContent::Text(text.into()),
            attachments: vec![],
        });
    }

    pub fn push_agent_critique(&mut self, critique: CritiqueResult) {
        self.turns.push(ConversationTurn {
            role: Role::Agent,
            content: TurnContent::Critique(Box::new(critique)),
            attachments: vec![],
        });
    }

    pub fn push_outcome(&mut self, outcome: CritiqueOutcome) {
        match outcome {
            CritiqueOutcome::Critique(critique) => self.push_agent_critique(*critique),
            CritiqueOutcome::Text(text) => self.push_agent_text(text),
        }
    }

    /// The most recent structured critique, if any.
    #[must_use]
    pub fn latest_critique(&self) -> Option<&CritiqueResult> {
        self.turns.iter().rev().find_map(|turn| match &turn.content {
            TurnContent::Critique(critique) => Some(critique.as_ref()),
            TurnContent::Text(_) => None,
        })
    }
}
