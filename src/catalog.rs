//! Attitude catalog and its label index.
//!
//! Label storage is scanned once when the catalog is built. After that every
//! label write goes through a [`LabelIndex`], which holds the attitude's lock
//! while the stored label is read, the store batch is applied and the index
//! is updated, so the progress counters always match what was committed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::corpus::ImageCorpus;
use crate::db::{get_json, label_key, parse_label_key, KvStore, StoreError, WriteOp, LABEL_PREFIX};
use crate::models::{Attitude, LabelRecord, LabelValue};

/// How a committed batch changes the label of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    Unchanged,
    /// Store `record` as the image's label.
    Set { image: String, record: LabelRecord },
    /// Take back the label `user` wrote with `value`: put `restore` back, or
    /// clear the label when there is nothing to restore. Skipped when the
    /// stored label is no longer the one `user` wrote.
    Revert {
        image: String,
        user: String,
        value: LabelValue,
        restore: Option<LabelRecord>,
    },
}

pub struct AttitudeCatalog {
    corpus: Arc<ImageCorpus>,
    labels: HashMap<String, Mutex<HashMap<String, LabelValue>>>,
}

impl AttitudeCatalog {
    /// Build the catalog from the corpus and the labels already stored.
    ///
    /// Fails as a whole if label storage cannot be scanned or holds an
    /// undecodable record. Labels for images outside the corpus are ignored.
    pub fn load(corpus: Arc<ImageCorpus>, store: &dyn KvStore) -> Result<Self, StoreError> {
        let mut labels: HashMap<String, HashMap<String, LabelValue>> = corpus
            .attitudes()
            .map(|(name, _)| (name.to_string(), HashMap::new()))
            .collect();

        let mut ignored = 0usize;
        for (key, raw) in store.scan_prefix(LABEL_PREFIX)? {
            let record: LabelRecord =
                serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    key: key.clone(),
                    source,
                })?;

            let known = parse_label_key(&key).filter(|(attitude, image)| {
                corpus
                    .attitude(attitude)
                    .map(|c| c.contains(image))
                    .unwrap_or(false)
            });

            match known {
                Some((attitude, image)) => {
                    if let Some(index) = labels.get_mut(attitude) {
                        index.insert(image.to_string(), record.value);
                    }
                }
                None => ignored += 1,
            }
        }

        if ignored > 0 {
            tracing::warn!("Ignored {} stored labels outside the corpus", ignored);
        }

        Ok(Self {
            corpus,
            labels: labels
                .into_iter()
                .map(|(name, index)| (name, Mutex::new(index)))
                .collect(),
        })
    }

    pub fn corpus(&self) -> &ImageCorpus {
        &self.corpus
    }

    /// Every attitude of the corpus with its progress, ordered by name.
    pub fn list_attitudes(&self) -> Vec<Attitude> {
        self.corpus
            .attitudes()
            .map(|(name, images)| self.summarize(name, images.len()))
            .collect()
    }

    pub fn get_attitude(&self, name: &str) -> Option<Attitude> {
        self.corpus
            .attitude(name)
            .map(|images| self.summarize(name, images.len()))
    }

    /// The label currently recorded for an image, as seen by the index.
    pub fn label_of(&self, attitude: &str, image: &str) -> Option<LabelValue> {
        let index = self.labels.get(attitude)?;
        let index = index.lock().expect("label index lock poisoned");
        index.get(image).copied()
    }

    /// Lock the labels of `attitude` for a read-modify-write.
    ///
    /// Label writes of one attitude run one at a time; hold the returned
    /// index only while handling a label change.
    pub fn lock_labels<'a>(&'a self, attitude: &'a str) -> Option<LabelIndex<'a>> {
        let index = self.labels.get(attitude)?;
        Some(LabelIndex {
            attitude,
            labels: index.lock().expect("label index lock poisoned"),
        })
    }

    fn summarize(&self, name: &str, total: usize) -> Attitude {
        let (correct, wrong) = self
            .labels
            .get(name)
            .map(|index| {
                let index = index.lock().expect("label index lock poisoned");
                index.values().fold((0, 0), |(c, w), value| match value {
                    LabelValue::Correct => (c + 1, w),
                    LabelValue::Wrong => (c, w + 1),
                })
            })
            .unwrap_or((0, 0));

        Attitude {
            name: name.to_string(),
            progress: correct + wrong,
            total,
            correct,
            wrong,
        }
    }
}

/// Exclusive access to one attitude's labels, from [`AttitudeCatalog::lock_labels`].
pub struct LabelIndex<'a> {
    attitude: &'a str,
    labels: MutexGuard<'a, HashMap<String, LabelValue>>,
}

impl LabelIndex<'_> {
    /// The label stored for `image`.
    pub fn stored(
        &self,
        store: &dyn KvStore,
        image: &str,
    ) -> Result<Option<LabelRecord>, StoreError> {
        get_json(store, &label_key(self.attitude, image))
    }

    /// Apply `change` and `ops` as one batch and, only if that succeeds, fold
    /// the change into the index.
    pub fn commit(
        mut self,
        store: &dyn KvStore,
        change: &LabelChange,
        mut ops: Vec<WriteOp>,
    ) -> Result<(), StoreError> {
        let update = match change {
            LabelChange::Unchanged => None,
            LabelChange::Set { image, record } => Some((image, Some(record))),
            LabelChange::Revert {
                image,
                user,
                value,
                restore,
            } => {
                let stored = self.stored(store, image)?;
                if stored.is_some_and(|r| &r.user == user && r.value == *value) {
                    Some((image, restore.as_ref()))
                } else {
                    tracing::info!(
                        "Label of {}/{} was rewritten since {} judged it; leaving it",
                        self.attitude,
                        image,
                        user
                    );
                    None
                }
            }
        };

        if let Some((image, record)) = update {
            let key = label_key(self.attitude, image);
            let op = match record {
                Some(record) => WriteOp::put_json(key, record)?,
                None => WriteOp::Delete { key },
            };
            ops.insert(0, op);
        }

        if ops.is_empty() {
            return Ok(());
        }
        store.batch_write(&ops)?;

        match update {
            Some((image, Some(record))) => {
                self.labels.insert(image.clone(), record.value);
            }
            Some((image, None)) => {
                self.labels.remove(image);
            }
            None => {}
        }

        Ok(())
    }
}
