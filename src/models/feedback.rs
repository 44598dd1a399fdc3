use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::label::LabelValue;
use super::progress::SessionState;
use crate::error::SessionError;

/// A swipe gesture, parsed at the HTTP boundary.
///
/// - `Accept`: the predicted value is right (swipe right)
/// - `Reject`: the predicted value is wrong (swipe left)
/// - `Undo`: revert the latest verdict of the session (swipe down)
/// - `Save`: save & exit, keeping progress for later (swipe up)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAction {
    Accept,
    Reject,
    Undo,
    Save,
}

impl FeedbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Undo => "undo",
            Self::Save => "save",
        }
    }

    /// The label written by this action, if it is a verdict.
    pub fn label(&self) -> Option<LabelValue> {
        match self {
            Self::Accept => Some(LabelValue::Correct),
            Self::Reject => Some(LabelValue::Wrong),
            Self::Undo | Self::Save => None,
        }
    }
}

impl FromStr for FeedbackAction {
    type Err = SessionError;

    /// Accepts both the action names and the gesture names sent by the
    /// swipe frontend (`correct`, `wrong`, `save_exit`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "correct" => Ok(Self::Accept),
            "reject" | "wrong" => Ok(Self::Reject),
            "undo" => Ok(Self::Undo),
            "save" | "save_exit" => Ok(Self::Save),
            _ => Err(SessionError::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for FeedbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body of `POST /api/feedback`.
///
/// `action` stays a string here so unknown actions are reported as
/// [`SessionError::InvalidAction`] instead of a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    /// Ignored for `undo` and `save`.
    #[serde(default)]
    pub image_name: String,
    pub attitude: String,
    pub action: String,
    pub user: String,
}

/// Acknowledgement of a recorded action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackAck {
    pub status: String,
    /// Session state after the action.
    pub state: SessionState,
    /// The image now presented, if any.
    pub current: Option<String>,
    pub judged: usize,
}

impl FeedbackAck {
    pub fn success(state: SessionState, current: Option<String>, judged: usize) -> Self {
        Self {
            status: "success".to_string(),
            state,
            current,
            judged,
        }
    }
}
