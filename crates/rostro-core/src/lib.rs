//! rostro-core — On-device face descriptor engine.
//!
//! Derives fixed-length feature vectors from a coarse color-block
//! sampling of a photo and scores them by Euclidean similarity. This is
//! an explicit approximation, not a trained recognition model.

pub mod descriptor;
pub mod sampler;
pub mod types;

pub use descriptor::{Descriptor, DEFAULT_BLOCK_SIDE, DEFAULT_MAX_DISTANCE};
pub use sampler::{PixelGrid, DEFAULT_SAMPLE_SIDE};
pub use types::{EnrollmentRecord, MatchResult, Scanner};
