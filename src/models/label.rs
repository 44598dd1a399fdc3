use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reviewer's verdict on the predicted attitude value of an image.
///
/// - `Correct`: the prediction matches the image (swipe right / accept)
/// - `Wrong`: the prediction does not match (swipe left / reject)
///
/// An image with no label is undecided.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LabelValue {
    Correct,
    Wrong,
}

impl LabelValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Wrong => "wrong",
        }
    }
}

/// The persisted label for one (attitude, image) pair.
///
/// Stored under `label:{attitude}:{image}`. A later write for the same pair
/// replaces the earlier one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelRecord {
    pub value: LabelValue,
    /// The reviewer who wrote this label.
    pub user: String,
    pub updated_at: DateTime<Utc>,
}
