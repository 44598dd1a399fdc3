use serde::{Deserialize, Serialize};

/// A labeling dimension, with its review progress.
///
/// `total` is the size of the attitude's corpus and `progress` the number of
/// those images carrying a label. `correct + wrong == progress`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attitude {
    pub name: String,
    pub progress: usize,
    pub total: usize,
    #[serde(default)]
    pub correct: usize,
    #[serde(default)]
    pub wrong: usize,
}
