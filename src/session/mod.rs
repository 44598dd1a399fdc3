//! The session facade: the only entry point the HTTP layer talks to.
//!
//! # Concurrency
//!
//! Every operation on a (user, attitude) pair runs under that pair's lock
//! from [`KeyedLocks`], so selection and feedback for one session never
//! interleave. Verdicts and undo also hold the attitude's [`LabelIndex`]
//! from reading the stored label until the label and progress writes are
//! committed as one batch. Lock order is session, then label index, then
//! the store's connection.

mod locks;
mod recorder;
mod selection;

pub use locks::KeyedLocks;
pub use selection::{select_next, Selection};

use std::sync::Arc;

use chrono::Utc;

use crate::catalog::{AttitudeCatalog, LabelIndex};
use crate::corpus::{self, AttitudeCorpus, ImageCorpus};
use crate::db::{get_json, progress_key, KvStore, WriteOp};
use crate::error::SessionError;
use crate::models::*;

pub struct SessionService {
    store: Arc<dyn KvStore>,
    catalog: AttitudeCatalog,
    locks: KeyedLocks,
}

impl SessionService {
    /// Build the service, loading the label index from `store`.
    pub fn new(store: Arc<dyn KvStore>, corpus: Arc<ImageCorpus>) -> Result<Self, SessionError> {
        let catalog = AttitudeCatalog::load(corpus, store.as_ref())?;
        Ok(Self {
            store,
            catalog,
            locks: KeyedLocks::new(),
        })
    }

    pub fn list_attitudes(&self) -> Vec<Attitude> {
        self.catalog.list_attitudes()
    }

    pub fn get_attitude(&self, name: &str) -> Option<Attitude> {
        self.catalog.get_attitude(name)
    }

    /// The image to present to `user` for `attitude`.
    ///
    /// Creates the session on first use and resumes a dormant one. Returns the
    /// same image until it is judged.
    pub fn next_image(&self, user: &str, attitude: &str) -> Result<NextImage, SessionError> {
        validate_user(user)?;
        let images = self.attitude_corpus(attitude)?;

        let key = progress_key(user, attitude);
        let slot = self.locks.slot(&key);
        let _guard = slot.lock().expect("session lock poisoned");

        let now = Utc::now();
        let stored: Option<SessionProgress> = get_json(self.store.as_ref(), &key)?;
        let mut progress = stored
            .clone()
            .unwrap_or_else(|| SessionProgress::new(user, attitude, now));

        if progress.dormant {
            tracing::debug!("Resuming session {}/{}", user, attitude);
            progress.dormant = false;
        }

        let selection = select_next(&mut progress, images);

        if stored.as_ref() != Some(&progress) {
            progress.updated_at = now;
            let op = WriteOp::put_json(key, &progress)?;
            self.store.batch_write(std::slice::from_ref(&op))?;
        }

        match selection.image() {
            Some(image) => {
                tracing::debug!("Presenting {} to {} for {}", image, user, attitude);
                Ok(NextImage::Image(image_ref(images, image)))
            }
            None => {
                tracing::debug!("Session {}/{} exhausted", user, attitude);
                Ok(NextImage::Exhausted)
            }
        }
    }

    /// Record a swipe for `user` on `attitude`.
    ///
    /// `image` is only consulted for verdicts. Retrying an action is safe: a
    /// repeated verdict leaves the session and labels untouched.
    pub fn record_feedback(
        &self,
        user: &str,
        attitude: &str,
        image: &str,
        action: FeedbackAction,
    ) -> Result<FeedbackAck, SessionError> {
        validate_user(user)?;
        let images = self.attitude_corpus(attitude)?;

        let key = progress_key(user, attitude);
        let slot = self.locks.slot(&key);
        let _guard = slot.lock().expect("session lock poisoned");

        let stored = get_json::<SessionProgress>(self.store.as_ref(), &key)?.ok_or_else(|| {
            SessionError::SessionNotFound {
                user: user.to_string(),
                attitude: attitude.to_string(),
            }
        })?;

        // Save writes progress only
        let labels = match action {
            FeedbackAction::Save => None,
            _ => Some(self.label_index(attitude)?),
        };

        let existing = match (&labels, action.label()) {
            (Some(labels), Some(_)) if images.contains(image) => {
                labels.stored(self.store.as_ref(), image)?
            }
            _ => None,
        };

        let now = Utc::now();
        let mut progress = stored.clone();
        let change = recorder::apply(&mut progress, images, image, action, existing, now)?;

        // Move on to the next image once the current one is judged
        if !progress.dormant {
            select_next(&mut progress, images);
        }

        let mut ops = Vec::with_capacity(2);
        if progress != stored {
            progress.updated_at = now;
            ops.push(WriteOp::put_json(key, &progress)?);
        }

        match labels {
            Some(labels) => labels.commit(self.store.as_ref(), &change, ops)?,
            None if !ops.is_empty() => self.store.batch_write(&ops)?,
            None => {}
        }

        tracing::debug!(
            "Recorded {} on {:?} for {}/{}: now {}",
            action,
            image,
            user,
            attitude,
            progress.state(images).as_str()
        );

        Ok(FeedbackAck::success(
            progress.state(images),
            progress.current.clone(),
            progress.judged.len(),
        ))
    }

    /// Current state of a session without modifying it.
    pub fn session_status(
        &self,
        user: &str,
        attitude: &str,
    ) -> Result<SessionSummary, SessionError> {
        validate_user(user)?;
        let images = self.attitude_corpus(attitude)?;

        let key = progress_key(user, attitude);
        let progress: Option<SessionProgress> = get_json(self.store.as_ref(), &key)?;
        Ok(progress
            .map(|p| p.summary(images))
            .unwrap_or_else(|| SessionSummary::fresh(user, attitude)))
    }

    fn attitude_corpus(&self, attitude: &str) -> Result<&AttitudeCorpus, SessionError> {
        self.catalog
            .corpus()
            .attitude(attitude)
            .ok_or_else(|| SessionError::UnknownAttitude(attitude.to_string()))
    }

    fn label_index<'a>(&'a self, attitude: &'a str) -> Result<LabelIndex<'a>, SessionError> {
        self.catalog
            .lock_labels(attitude)
            .ok_or_else(|| SessionError::UnknownAttitude(attitude.to_string()))
    }
}

fn validate_user(user: &str) -> Result<(), SessionError> {
    if user.trim().is_empty() || user.contains(':') {
        return Err(SessionError::InvalidUser(user.to_string()));
    }
    Ok(())
}

fn image_ref(images: &AttitudeCorpus, name: &str) -> ImageRef {
    ImageRef {
        image_path: corpus::image_path(name),
        image_name: name.to_string(),
        attitude_value: images.attitude_value(name).unwrap_or_default().to_string(),
    }
}
