//! The immutable set of labelable images.
//!
//! Images live in one directory tree; each image has a result file with the
//! same relative stem under a results directory, holding one
//! `attitude: value` line per attitude the model predicted. An image belongs
//! to the corpus of every attitude named in its result file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// URL prefix the HTTP layer serves the images directory under.
pub const IMAGE_ROUTE: &str = "/images";

pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("cannot scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot read result file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The images of one attitude, keyed and ordered by name.
#[derive(Debug, Clone, Default)]
pub struct AttitudeCorpus {
    images: BTreeMap<String, String>,
}

impl AttitudeCorpus {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn contains(&self, image: &str) -> bool {
        self.images.contains_key(image)
    }

    /// The predicted value for `image`, shown to the reviewer.
    pub fn attitude_value(&self, image: &str) -> Option<&str> {
        self.images.get(image).map(String::as_str)
    }

    /// Image names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageCorpus {
    attitudes: BTreeMap<String, AttitudeCorpus>,
}

impl ImageCorpus {
    /// Scan an images directory and its results directory.
    ///
    /// Images without a result file belong to no attitude and are skipped.
    pub fn scan<S: AsRef<str>>(
        images_dir: &Path,
        results_dir: &Path,
        extensions: &[S],
    ) -> Result<Self, CorpusError> {
        let mut corpus = Self::default();
        let mut skipped = 0usize;

        for entry in WalkDir::new(images_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| CorpusError::Walk {
                path: images_dir.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(images_dir) else {
                continue;
            };
            let name = corpus_name(relative);

            let result_path = results_dir.join(relative).with_extension("txt");
            if !result_path.is_file() {
                tracing::debug!("No result file for {}, skipping", name);
                skipped += 1;
                continue;
            }

            let content =
                std::fs::read_to_string(&result_path).map_err(|source| CorpusError::Read {
                    path: result_path.clone(),
                    source,
                })?;

            for (attitude, value) in parse_result_file(&content) {
                corpus.insert(&attitude, &name, &value);
            }
        }

        tracing::info!(
            "Scanned corpus in {}: {} attitudes, {} images without results",
            images_dir.display(),
            corpus.attitudes.len(),
            skipped
        );

        Ok(corpus)
    }

    /// Build a corpus from `(attitude, image, value)` triples.
    pub fn from_entries<I, A, N, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, N, V)>,
        A: AsRef<str>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut corpus = Self::default();
        for (attitude, image, value) in entries {
            corpus.insert(attitude.as_ref(), image.as_ref(), value.as_ref());
        }
        corpus
    }

    fn insert(&mut self, attitude: &str, image: &str, value: &str) {
        if attitude.is_empty() || attitude.contains(':') || image.is_empty() {
            tracing::warn!("Ignoring unusable corpus entry {:?} / {:?}", attitude, image);
            return;
        }
        self.attitudes
            .entry(attitude.to_string())
            .or_default()
            .images
            .insert(image.to_string(), value.to_string());
    }

    pub fn attitude(&self, name: &str) -> Option<&AttitudeCorpus> {
        self.attitudes.get(name)
    }

    /// Attitudes in ascending name order.
    pub fn attitudes(&self) -> impl Iterator<Item = (&str, &AttitudeCorpus)> {
        self.attitudes.iter().map(|(name, corpus)| (name.as_str(), corpus))
    }
}

/// Parse `attitude: value` lines. Lines without a colon are ignored.
pub fn parse_result_file(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// URL path under which an image is served, one encoded segment per
/// directory level.
pub fn image_path(name: &str) -> String {
    let encoded: Vec<_> = name.split('/').map(urlencoding::encode).collect();
    format!("{IMAGE_ROUTE}/{}", encoded.join("/"))
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn corpus_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_attitude_lines() {
        let parsed = parse_result_file("quality: high\nrelevance:low\n\nnoise\n: orphan\n");
        assert_eq!(
            parsed,
            vec![
                ("quality".to_string(), "high".to_string()),
                ("relevance".to_string(), "low".to_string()),
            ]
        );
    }

    #[test]
    fn value_keeps_text_after_first_colon() {
        let parsed = parse_result_file("time: 12:30");
        assert_eq!(parsed, vec![("time".to_string(), "12:30".to_string())]);
    }

    #[test]
    fn scan_groups_images_by_attitude() {
        let images = tempfile::tempdir().unwrap();
        let results = tempfile::tempdir().unwrap();

        fs::write(images.path().join("b.jpg"), b"").unwrap();
        fs::write(images.path().join("a.JPG"), b"").unwrap();
        fs::write(images.path().join("c.jpg"), b"").unwrap();
        fs::write(images.path().join("notes.md"), b"").unwrap();
        fs::write(results.path().join("a.txt"), "quality: high\nmood: calm\n").unwrap();
        fs::write(results.path().join("b.txt"), "quality: low\n").unwrap();

        let corpus = ImageCorpus::scan(images.path(), results.path(), DEFAULT_EXTENSIONS).unwrap();

        let quality = corpus.attitude("quality").unwrap();
        assert_eq!(quality.names().collect::<Vec<_>>(), vec!["a.JPG", "b.jpg"]);
        assert_eq!(quality.attitude_value("b.jpg"), Some("low"));
        assert_eq!(corpus.attitude("mood").unwrap().len(), 1);
        assert!(!quality.contains("c.jpg"));
        assert_eq!(
            corpus.attitudes().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["mood", "quality"]
        );
    }

    #[test]
    fn scan_uses_relative_names_for_nested_images() {
        let images = tempfile::tempdir().unwrap();
        let results = tempfile::tempdir().unwrap();
        fs::create_dir_all(images.path().join("set1")).unwrap();
        fs::create_dir_all(results.path().join("set1")).unwrap();
        fs::write(images.path().join("set1/x.png"), b"").unwrap();
        fs::write(results.path().join("set1/x.txt"), "quality: ok").unwrap();

        let corpus = ImageCorpus::scan(images.path(), results.path(), DEFAULT_EXTENSIONS).unwrap();

        assert!(corpus.attitude("quality").unwrap().contains("set1/x.png"));
    }

    #[test]
    fn scan_fails_on_missing_images_dir() {
        let results = tempfile::tempdir().unwrap();
        let missing = results.path().join("nope");
        let err = ImageCorpus::scan(&missing, results.path(), DEFAULT_EXTENSIONS).unwrap_err();
        assert!(matches!(err, CorpusError::Walk { .. }));
    }

    #[test]
    fn image_path_encodes_each_segment() {
        assert_eq!(image_path("a.jpg"), "/images/a.jpg");
        assert_eq!(image_path("set 1/x#2?.jpg"), "/images/set%201/x%232%3F.jpg");
        assert_eq!(image_path("100%.png"), "/images/100%25.png");
    }

    #[test]
    fn entries_with_colon_in_attitude_are_dropped() {
        let corpus = ImageCorpus::from_entries([("a:b", "x.jpg", "v"), ("ok", "x.jpg", "v")]);
        assert!(corpus.attitude("a:b").is_none());
        assert!(corpus.attitude("ok").is_some());
    }
}
