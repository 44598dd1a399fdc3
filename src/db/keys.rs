//! Keyspace layout.
//!
//! - `progress:{user}:{attitude}` → [`SessionProgress`](crate::models::SessionProgress)
//! - `label:{attitude}:{image}` → [`LabelRecord`](crate::models::LabelRecord)
//!
//! Users and attitudes never contain `:`, so the image part of a label key
//! may contain anything.

pub const PROGRESS_PREFIX: &str = "progress:";
pub const LABEL_PREFIX: &str = "label:";

pub fn progress_key(user: &str, attitude: &str) -> String {
    format!("{PROGRESS_PREFIX}{user}:{attitude}")
}

pub fn label_key(attitude: &str, image: &str) -> String {
    format!("{LABEL_PREFIX}{attitude}:{image}")
}

/// Split a label key into `(attitude, image)`.
pub fn parse_label_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix(LABEL_PREFIX)?;
    let (attitude, image) = rest.split_once(':')?;
    if attitude.is_empty() || image.is_empty() {
        return None;
    }
    Some((attitude, image))
}
