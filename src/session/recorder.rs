use chrono::{DateTime, Utc};

use crate::catalog::LabelChange;
use crate::corpus::AttitudeCorpus;
use crate::error::SessionError;
use crate::models::{FeedbackAction, Judgment, LabelRecord, SessionProgress};

/// Apply one action to a session, returning the label change it requires.
///
/// `existing` is the label stored for `image` before this action; a new
/// verdict remembers it so undo can put it back.
pub fn apply(
    progress: &mut SessionProgress,
    corpus: &AttitudeCorpus,
    image: &str,
    action: FeedbackAction,
    existing: Option<LabelRecord>,
    now: DateTime<Utc>,
) -> Result<LabelChange, SessionError> {
    match action {
        FeedbackAction::Accept | FeedbackAction::Reject => {
            record_verdict(progress, corpus, image, action, existing, now)
        }
        FeedbackAction::Undo => undo(progress),
        FeedbackAction::Save => {
            progress.dormant = true;
            Ok(LabelChange::Unchanged)
        }
    }
}

fn record_verdict(
    progress: &mut SessionProgress,
    corpus: &AttitudeCorpus,
    image: &str,
    action: FeedbackAction,
    existing: Option<LabelRecord>,
    now: DateTime<Utc>,
) -> Result<LabelChange, SessionError> {
    if !corpus.contains(image) {
        return Err(SessionError::ImageNotInCorpus {
            attitude: progress.attitude.clone(),
            image: image.to_string(),
        });
    }

    let Some(value) = action.label() else {
        return Err(SessionError::InvalidAction(action.to_string()));
    };

    match progress.judged.iter().position(|j| j.image == image) {
        // Same verdict again: nothing to do
        Some(i) if progress.judged[i].value == value => return Ok(LabelChange::Unchanged),
        // A changed verdict becomes the most recent judgment
        Some(i) => {
            let mut judgment = progress.judged.remove(i);
            judgment.value = value;
            progress.judged.push(judgment);
        }
        None => {
            progress.judged.push(Judgment {
                image: image.to_string(),
                value,
                previous: existing,
            });
            if !progress.was_shown(image) {
                progress.shown.push(image.to_string());
            }
        }
    }

    if progress.current.as_deref() == Some(image) {
        progress.current = None;
    }
    progress.dormant = false;

    Ok(LabelChange::Set {
        image: image.to_string(),
        record: LabelRecord {
            value,
            user: progress.user.clone(),
            updated_at: now,
        },
    })
}

fn undo(progress: &mut SessionProgress) -> Result<LabelChange, SessionError> {
    let last = progress.judged.pop().ok_or(SessionError::NothingToUndo)?;

    // An image presented but not yet judged goes back into the queue
    if let Some(current) = progress.current.take() {
        if current != last.image {
            progress.shown.retain(|s| s != &current);
        }
    }

    if !progress.was_shown(&last.image) {
        progress.shown.push(last.image.clone());
    }
    progress.current = Some(last.image.clone());
    progress.dormant = false;

    Ok(LabelChange::Revert {
        image: last.image,
        user: progress.user.clone(),
        value: last.value,
        restore: last.previous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::ImageCorpus;
    use crate::models::LabelValue;

    fn corpus() -> ImageCorpus {
        ImageCorpus::from_entries([("quality", "a.jpg", "high"), ("quality", "b.jpg", "low")])
    }

    fn presenting(image: &str) -> SessionProgress {
        let mut progress = SessionProgress::new("u1", "quality", Utc::now());
        progress.shown.push(image.to_string());
        progress.current = Some(image.to_string());
        progress
    }

    #[test]
    fn accept_judges_and_clears_current() {
        let corpus = corpus();
        let mut progress = presenting("a.jpg");

        let change = apply(
            &mut progress,
            corpus.attitude("quality").unwrap(),
            "a.jpg",
            FeedbackAction::Accept,
            None,
            Utc::now(),
        )
        .unwrap();

        assert!(matches!(
            change,
            LabelChange::Set { ref image, ref record } if image == "a.jpg" && record.value == LabelValue::Correct
        ));
        assert!(progress.is_judged("a.jpg"));
        assert!(progress.current.is_none());
    }

    #[test]
    fn repeating_a_verdict_changes_nothing() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = presenting("a.jpg");

        apply(&mut progress, images, "a.jpg", FeedbackAction::Reject, None, Utc::now()).unwrap();
        let after_first = progress.clone();
        let change =
            apply(&mut progress, images, "a.jpg", FeedbackAction::Reject, None, Utc::now()).unwrap();

        assert_eq!(change, LabelChange::Unchanged);
        assert_eq!(progress, after_first);
    }

    #[test]
    fn changing_a_verdict_keeps_one_judgment() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = presenting("a.jpg");

        apply(&mut progress, images, "a.jpg", FeedbackAction::Accept, None, Utc::now()).unwrap();
        apply(&mut progress, images, "a.jpg", FeedbackAction::Reject, None, Utc::now()).unwrap();

        assert_eq!(progress.judged.len(), 1);
        assert_eq!(progress.judged[0].value, LabelValue::Wrong);
    }

    #[test]
    fn changed_verdict_is_undone_first() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = presenting("a.jpg");

        apply(&mut progress, images, "a.jpg", FeedbackAction::Accept, None, Utc::now()).unwrap();
        progress.shown.push("b.jpg".to_string());
        apply(&mut progress, images, "b.jpg", FeedbackAction::Accept, None, Utc::now()).unwrap();
        apply(&mut progress, images, "a.jpg", FeedbackAction::Reject, None, Utc::now()).unwrap();

        let order: Vec<_> = progress.judged.iter().map(|j| j.image.as_str()).collect();
        assert_eq!(order, vec!["b.jpg", "a.jpg"]);

        let change = apply(&mut progress, images, "", FeedbackAction::Undo, None, Utc::now()).unwrap();

        assert!(matches!(
            change,
            LabelChange::Revert { ref image, value: LabelValue::Wrong, restore: None, .. } if image == "a.jpg"
        ));
        assert_eq!(progress.current.as_deref(), Some("a.jpg"));
        assert!(progress.is_judged("b.jpg"));
    }

    #[test]
    fn verdict_on_foreign_image_is_rejected() {
        let corpus = corpus();
        let mut progress = presenting("a.jpg");

        let err = apply(
            &mut progress,
            corpus.attitude("quality").unwrap(),
            "z.jpg",
            FeedbackAction::Accept,
            None,
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, SessionError::ImageNotInCorpus { .. }));
        assert!(progress.judged.is_empty());
    }

    #[test]
    fn undo_restores_previous_label_and_requeues_current() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = presenting("a.jpg");
        let earlier = LabelRecord {
            value: LabelValue::Wrong,
            user: "u0".to_string(),
            updated_at: Utc::now(),
        };

        apply(&mut progress, images, "a.jpg", FeedbackAction::Accept, Some(earlier.clone()), Utc::now())
            .unwrap();
        progress.shown.push("b.jpg".to_string());
        progress.current = Some("b.jpg".to_string());

        let change = apply(&mut progress, images, "", FeedbackAction::Undo, None, Utc::now()).unwrap();

        assert_eq!(
            change,
            LabelChange::Revert {
                image: "a.jpg".to_string(),
                user: "u1".to_string(),
                value: LabelValue::Correct,
                restore: Some(earlier),
            }
        );
        assert_eq!(progress.current.as_deref(), Some("a.jpg"));
        assert!(progress.judged.is_empty());
        assert!(!progress.was_shown("b.jpg"));
    }

    #[test]
    fn undo_without_history_fails() {
        let corpus = corpus();
        let mut progress = presenting("a.jpg");

        let err = apply(
            &mut progress,
            corpus.attitude("quality").unwrap(),
            "",
            FeedbackAction::Undo,
            None,
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, SessionError::NothingToUndo));
        assert_eq!(progress.current.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn save_marks_dormant_and_keeps_current() {
        let corpus = corpus();
        let mut progress = presenting("a.jpg");

        let change = apply(
            &mut progress,
            corpus.attitude("quality").unwrap(),
            "",
            FeedbackAction::Save,
            None,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(change, LabelChange::Unchanged);
        assert!(progress.dormant);
        assert_eq!(progress.current.as_deref(), Some("a.jpg"));
    }
}
