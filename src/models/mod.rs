//! Domain models for the swipe review service.
//!
//! # Core Concepts
//!
//! ## Catalog
//!
//! - [`Attitude`]: A labeling dimension with its corpus size and label count.
//! - [`ImageRef`]: An image of an attitude's corpus, with the predicted value to judge.
//! - [`LabelRecord`]: The persisted verdict for one (attitude, image) pair.
//!
//! ## Sessions
//!
//! - [`SessionProgress`]: Durable per-(user, attitude) review state, resumable across visits.
//! - [`FeedbackAction`]: The closed set of swipe gestures a reviewer can send.
//! - [`NextImage`]: Either the image to present or the end of the queue.

mod attitude;
mod feedback;
mod image;
mod label;
mod progress;

pub use attitude::*;
pub use feedback::*;
pub use image::*;
pub use label::*;
pub use progress::*;
