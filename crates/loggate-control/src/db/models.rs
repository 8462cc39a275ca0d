//! Database models for the control plane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Desired lifecycle state of an input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputState {
    #[default]
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "STOPPED")]
    Stopped,
    #[serde(rename = "PAUSED")]
    Paused,
}

impl InputState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Paused => "PAUSED",
        }
    }

    /// Parse the stored representation; unknown values fall back to
    /// `Running` so a hand-edited row cannot wedge restoration.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "STOPPED" => Self::Stopped,
            "PAUSED" => Self::Paused,
            _ => Self::Running,
        }
    }
}

/// A persisted input definition.
///
/// `global`, `node_id`, and `creator_user_id` are carried through opaquely;
/// the core never interprets them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InputRecord {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub configuration: serde_json::Value,
    pub global: bool,
    pub node_id: String,
    pub creator_user_id: String,
    pub created_at: DateTime<Utc>,
    pub desired_state: String,
}

impl InputRecord {
    pub fn desired_state(&self) -> InputState {
        InputState::parse(&self.desired_state)
    }
}

/// Input for creating a new row.
#[derive(Debug, Clone, Default)]
pub struct NewInput {
    /// Assigned by the store when `None`.
    pub id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub configuration: serde_json::Value,
    pub global: bool,
    pub node_id: String,
    pub creator_user_id: String,
    pub desired_state: InputState,
}

/// Replacement values for an existing row.
#[derive(Debug, Clone)]
pub struct InputUpdate {
    pub kind: String,
    pub title: String,
    pub configuration: serde_json::Value,
    pub desired_state: InputState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_state_round_trips() {
        for state in [InputState::Running, InputState::Stopped, InputState::Paused] {
            assert_eq!(InputState::parse(state.as_str()), state);
        }
    }

    #[test]
    fn unknown_state_falls_back_to_running() {
        assert_eq!(InputState::parse("BROKEN"), InputState::Running);
    }
}
