use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::label::{LabelRecord, LabelValue};
use crate::corpus::AttitudeCorpus;

/// Durable review progress for one (user, attitude) pair.
///
/// Stored under `progress:{user}:{attitude}`. Created by the first request
/// for an image and never deleted; saving only marks it dormant.
///
/// # Invariant
/// `current`, when set, is an image of the attitude's corpus that is not in
/// `judged`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionProgress {
    pub user: String,
    pub attitude: String,
    /// Images in the order they were first presented.
    pub shown: Vec<String>,
    /// Judgments in the order they were made. Undo pops from the end.
    pub judged: Vec<Judgment>,
    /// The image currently presented and awaiting a verdict.
    pub current: Option<String>,
    /// Set by save & exit, cleared when the session is resumed.
    #[serde(default)]
    pub dormant: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One verdict in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Judgment {
    pub image: String,
    pub value: LabelValue,
    /// The label this judgment overwrote, restored on undo.
    pub previous: Option<LabelRecord>,
}

impl SessionProgress {
    pub fn new(user: &str, attitude: &str, now: DateTime<Utc>) -> Self {
        Self {
            user: user.to_string(),
            attitude: attitude.to_string(),
            shown: Vec::new(),
            judged: Vec::new(),
            current: None,
            dormant: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_judged(&self, image: &str) -> bool {
        self.judged.iter().any(|j| j.image == image)
    }

    pub fn was_shown(&self, image: &str) -> bool {
        self.shown.iter().any(|s| s == image)
    }

    pub fn shown_set(&self) -> HashSet<&str> {
        self.shown.iter().map(String::as_str).collect()
    }

    /// Lifecycle state against the attitude's current corpus.
    ///
    /// Images added to the corpus since the last selection keep a session
    /// out of `Exhausted` even though no image is current yet.
    pub fn state(&self, corpus: &AttitudeCorpus) -> SessionState {
        if self.dormant {
            return SessionState::Dormant;
        }
        let presenting = self
            .current
            .as_deref()
            .is_some_and(|image| corpus.contains(image) && !self.is_judged(image));
        if presenting {
            return SessionState::Presenting;
        }

        let shown = self.shown_set();
        if corpus.names().any(|name| !shown.contains(name)) {
            SessionState::Presenting
        } else {
            SessionState::Exhausted
        }
    }

    pub fn summary(&self, corpus: &AttitudeCorpus) -> SessionSummary {
        SessionSummary {
            user: self.user.clone(),
            attitude: self.attitude.clone(),
            state: self.state(corpus),
            shown: self.shown.len(),
            judged: self.judged.len(),
            current: self.current.clone(),
            updated_at: Some(self.updated_at),
        }
    }
}

/// Lifecycle of a (user, attitude) session.
///
/// - `Fresh`: no image has been requested yet
/// - `Presenting`: an image is shown and awaits a verdict, or an unseen
///   image is waiting for the next request
/// - `Exhausted`: every image has been shown; only undo or new images in the
///   corpus can reopen it
/// - `Dormant`: saved and exited, resumable by requesting the next image
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Fresh,
    Presenting,
    Exhausted,
    Dormant,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Presenting => "presenting",
            Self::Exhausted => "exhausted",
            Self::Dormant => "dormant",
        }
    }
}

/// Read-only view of a session, returned by status queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub user: String,
    pub attitude: String,
    pub state: SessionState,
    pub shown: usize,
    pub judged: usize,
    pub current: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    pub fn fresh(user: &str, attitude: &str) -> Self {
        Self {
            user: user.to_string(),
            attitude: attitude.to_string(),
            state: SessionState::Fresh,
            shown: 0,
            judged: 0,
            current: None,
            updated_at: None,
        }
    }
}
