//! Image acquisition seam.
//!
//! Acquisition is the one cooperative suspension point in a
//! verification call and is owned by the collaborator behind
//! [`ImageSource`] — including any timeout. The collaborator must
//! answer with either a decodable payload or an explicit cancellation;
//! the engine treats cancellation as a no-op, never as an extraction
//! failure.

use thiserror::Error;

/// Outcome of one acquisition attempt.
pub enum Acquisition {
    /// A photo payload was captured. Decodability is the engine's
    /// problem from here on.
    Image(Vec<u8>),
    /// The user (or collaborator) backed out before a photo existed.
    Cancelled,
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("image acquisition failed: {0}")]
    Failed(String),
}

/// Single-shot image acquisition collaborator.
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    async fn acquire(&mut self) -> Result<Acquisition, SourceError>;
}

/// Source over an already-captured payload. The CLI uses this for
/// images read from disk; tests use it for synthetic payloads.
pub struct StaticSource {
    payload: Option<Vec<u8>>,
}

impl StaticSource {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
        }
    }

    /// A source that always cancels.
    pub fn cancelled() -> Self {
        Self { payload: None }
    }
}

impl ImageSource for StaticSource {
    async fn acquire(&mut self) -> Result<Acquisition, SourceError> {
        match self.payload.take() {
            Some(payload) => Ok(Acquisition::Image(payload)),
            None => Ok(Acquisition::Cancelled),
        }
    }
}
