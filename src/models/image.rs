use serde::{Deserialize, Serialize};

/// An image presented to a reviewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// URL path the client loads the image from.
    pub image_path: String,
    /// Corpus-relative name, the image's identity within an attitude.
    pub image_name: String,
    /// The predicted value the reviewer is asked to judge.
    pub attitude_value: String,
}

/// Result of asking for the next image.
///
/// `Exhausted` is a normal outcome: every image of the attitude has been
/// shown to this user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextImage {
    Image(ImageRef),
    Exhausted,
}

impl NextImage {
    pub fn image(&self) -> Option<&ImageRef> {
        match self {
            Self::Image(image) => Some(image),
            Self::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Wire form of [`NextImage`]: `{exhausted: false, imagePath, ...}` or
/// `{exhausted: true, attitude}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NextImageResponse {
    pub exhausted: bool,
    pub attitude: String,
    #[serde(flatten)]
    pub image: Option<ImageRef>,
}

impl NextImageResponse {
    pub fn new(attitude: impl Into<String>, next: NextImage) -> Self {
        match next {
            NextImage::Image(image) => Self {
                exhausted: false,
                attitude: attitude.into(),
                image: Some(image),
            },
            NextImage::Exhausted => Self {
                exhausted: true,
                attitude: attitude.into(),
                image: None,
            },
        }
    }
}
