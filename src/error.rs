//! Error taxonomy for the session engine.

use thiserror::Error;

use crate::db::StoreError;

/// Errors surfaced by the session facade.
///
/// Running out of images is not an error; see [`crate::models::NextImage`].
#[derive(Error, Debug)]
pub enum SessionError {
    /// The key-value store failed or timed out. Safe to retry.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// Feedback arrived for a (user, attitude) pair that never asked for an image.
    #[error("no session for user '{user}' on attitude '{attitude}'")]
    SessionNotFound { user: String, attitude: String },

    #[error("unknown attitude '{0}'")]
    UnknownAttitude(String),

    #[error("invalid action '{0}'")]
    InvalidAction(String),

    #[error("image '{image}' is not in the corpus for attitude '{attitude}'")]
    ImageNotInCorpus { attitude: String, image: String },

    #[error("nothing to undo")]
    NothingToUndo,

    /// User ids are embedded in storage keys and may not be empty or contain ':'.
    #[error("invalid user id '{0}'")]
    InvalidUser(String),
}

impl SessionError {
    /// True for errors caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::StorageUnavailable(_))
    }
}
