use crate::corpus::AttitudeCorpus;
use crate::models::SessionProgress;

/// Outcome of choosing what to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The image already presented and still awaiting a verdict.
    Current(String),
    /// A newly picked image, now recorded as shown and current.
    Advanced(String),
    /// Every image of the corpus has been shown.
    Exhausted,
}

impl Selection {
    pub fn image(&self) -> Option<&str> {
        match self {
            Self::Current(image) | Self::Advanced(image) => Some(image),
            Self::Exhausted => None,
        }
    }
}

/// Pick the image to present for a session, updating `progress` in place.
///
/// An unjudged current image is returned again, so a refresh or client retry
/// never skips an image. Otherwise the first image by name that was never
/// shown becomes current.
pub fn select_next(progress: &mut SessionProgress, corpus: &AttitudeCorpus) -> Selection {
    if let Some(current) = progress.current.as_deref() {
        if corpus.contains(current) && !progress.is_judged(current) {
            return Selection::Current(current.to_string());
        }
        tracing::warn!(
            "Dropping stale current image {} for {}/{}",
            current,
            progress.user,
            progress.attitude
        );
        progress.current = None;
    }

    let next = {
        let shown = progress.shown_set();
        corpus
            .names()
            .find(|name| !shown.contains(name))
            .map(str::to_string)
    };

    match next {
        Some(image) => {
            progress.shown.push(image.clone());
            progress.current = Some(image.clone());
            Selection::Advanced(image)
        }
        None => Selection::Exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::ImageCorpus;
    use crate::models::{Judgment, LabelValue};
    use chrono::Utc;

    fn corpus() -> ImageCorpus {
        ImageCorpus::from_entries([
            ("quality", "c.jpg", "x"),
            ("quality", "a.jpg", "x"),
            ("quality", "b.jpg", "x"),
        ])
    }

    #[test]
    fn picks_images_in_name_order() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = SessionProgress::new("u1", "quality", Utc::now());

        assert_eq!(select_next(&mut progress, images), Selection::Advanced("a.jpg".into()));
        assert_eq!(progress.current.as_deref(), Some("a.jpg"));
        assert_eq!(progress.shown, vec!["a.jpg"]);
    }

    #[test]
    fn repeats_the_unjudged_current_image() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = SessionProgress::new("u1", "quality", Utc::now());

        select_next(&mut progress, images);
        let before = progress.clone();

        assert_eq!(select_next(&mut progress, images), Selection::Current("a.jpg".into()));
        assert_eq!(progress, before);
    }

    #[test]
    fn skips_shown_images() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = SessionProgress::new("u1", "quality", Utc::now());
        progress.shown = vec!["a.jpg".into(), "c.jpg".into()];

        assert_eq!(select_next(&mut progress, images).image(), Some("b.jpg"));
    }

    #[test]
    fn reports_exhaustion() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = SessionProgress::new("u1", "quality", Utc::now());
        progress.shown = vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into()];

        assert_eq!(select_next(&mut progress, images), Selection::Exhausted);
        assert!(progress.current.is_none());
    }

    #[test]
    fn never_presents_a_judged_image_as_current() {
        let corpus = corpus();
        let images = corpus.attitude("quality").unwrap();
        let mut progress = SessionProgress::new("u1", "quality", Utc::now());
        progress.shown = vec!["a.jpg".into()];
        progress.current = Some("a.jpg".into());
        progress.judged.push(Judgment {
            image: "a.jpg".into(),
            value: LabelValue::Correct,
            previous: None,
        });

        assert_eq!(select_next(&mut progress, images), Selection::Advanced("b.jpg".into()));
    }
}
