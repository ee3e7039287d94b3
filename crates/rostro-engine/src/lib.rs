//! rostro-engine — The verification service.
//!
//! Orchestrates capture → sampling → extraction → scoring → threshold
//! decision for three flows: enrollment (`register`), 1:1 verification
//! against one identity (`verify_one`) and 1:N identification against
//! the whole roster (`identify`). Each call runs the pipeline
//! single-threaded start to finish; the only suspension point is the
//! externally owned acquisition step behind [`ImageSource`].

pub mod source;

use chrono::Utc;
use rostro_core::descriptor::{self, ExtractError, Descriptor};
use rostro_core::sampler::{self, SampleError};
use rostro_core::types::{EnrollmentRecord, FirstMatchScanner, MatchResult, Scanner};
use rostro_core::{DEFAULT_BLOCK_SIDE, DEFAULT_MAX_DISTANCE, DEFAULT_SAMPLE_SIDE};
use rostro_store::{EnrollmentStore, Profile, ProfileDirectory, StoreError};
use thiserror::Error;

pub use source::{Acquisition, ImageSource, SourceError, StaticSource};

/// Minimum similarity for acceptance unless overridden.
pub const DEFAULT_THRESHOLD: f32 = 0.6;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Blocks(#[from] ExtractError),
    #[error("extraction produced an empty descriptor")]
    EmptyDescriptor,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("descriptor extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("identity not enrolled: {0}")]
    UnknownIdentity(String),
    /// Store faults (including corrupt persisted records) propagate
    /// unmodified for the caller to log and handle.
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("image source failed: {0}")]
    Source(String),
}

/// Result of a flow that went through acquisition. Cancellation is an
/// explicit no-op, distinct from every [`EngineError`].
#[derive(Debug, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

/// Pipeline parameters. Defaults match the verification path: 64-pixel
/// grid, 8-pixel blocks, the empirical 2.0 distance ceiling and a 0.6
/// acceptance threshold.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub sample_side: u32,
    pub block_side: u32,
    pub max_distance: f32,
    pub threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_side: DEFAULT_SAMPLE_SIDE,
            block_side: DEFAULT_BLOCK_SIDE,
            max_distance: DEFAULT_MAX_DISTANCE,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// The verification service over one enrollment store.
///
/// No locking is provided: `register` takes `&mut self`, so sharing a
/// verifier across writers requires an external mutex.
pub struct Verifier<S: EnrollmentStore> {
    store: S,
    settings: Settings,
}

impl<S: EnrollmentStore> Verifier<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, Settings::default())
    }

    pub fn with_settings(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Run sampling + extraction on a raw payload.
    ///
    /// Never yields a partial descriptor: malformed payloads and empty
    /// extraction results are errors.
    pub fn extract(&self, image: &[u8]) -> Result<Descriptor, EngineError> {
        let grid = sampler::sample(image, self.settings.sample_side)
            .map_err(ExtractionError::Sample)?;
        let descriptor = descriptor::extract(&grid, self.settings.block_side)
            .map_err(ExtractionError::Blocks)?;
        if descriptor.is_empty() {
            return Err(ExtractionError::EmptyDescriptor.into());
        }
        Ok(descriptor)
    }

    /// Enroll `image` under `identity_key`, overwriting any previous
    /// enrollment for that key. Returns the stored descriptor.
    pub fn register(&mut self, identity_key: &str, image: &[u8]) -> Result<Descriptor, EngineError> {
        let descriptor = self.extract(image)?;
        self.store.upsert(EnrollmentRecord {
            identity_key: identity_key.to_string(),
            raw_image: image.to_vec(),
            descriptor: descriptor.clone(),
            enrolled_at: Utc::now(),
        })?;
        tracing::info!(
            identity = %identity_key,
            descriptor_len = descriptor.len(),
            "identity enrolled"
        );
        Ok(descriptor)
    }

    /// 1:1 verification of `image` against one enrolled identity.
    pub fn verify_one(&self, image: &[u8], identity_key: &str) -> Result<MatchResult, EngineError> {
        let probe = self.extract(image)?;
        let record = self
            .store
            .get(identity_key)?
            .ok_or_else(|| EngineError::UnknownIdentity(identity_key.to_string()))?;

        let similarity = probe.similarity_with(&record.descriptor, self.settings.max_distance);
        let accepted = similarity >= self.settings.threshold;
        tracing::info!(
            identity = %identity_key,
            similarity,
            accepted,
            "1:1 verification decided"
        );
        Ok(MatchResult {
            identity_key: Some(identity_key.to_string()),
            similarity,
            accepted,
        })
    }

    /// 1:N identification: scan the roster in storage order and accept
    /// the first enrollment clearing the threshold.
    ///
    /// On rejection the result carries the best similarity seen during
    /// the scan and no identity key.
    pub fn identify(&self, image: &[u8]) -> Result<MatchResult, EngineError> {
        let scanner = FirstMatchScanner {
            max_distance: self.settings.max_distance,
        };
        self.identify_with(image, &scanner)
    }

    /// 1:N identification under a caller-chosen scan policy (e.g.
    /// [`rostro_core::types::BestMatchScanner`]).
    pub fn identify_with(
        &self,
        image: &[u8],
        scanner: &dyn Scanner,
    ) -> Result<MatchResult, EngineError> {
        let probe = self.extract(image)?;
        let roster = self.store.list_all()?;
        let result = scanner.scan(&probe, &roster, self.settings.threshold);
        tracing::info!(
            roster_size = roster.len(),
            identity = result.identity_key.as_deref().unwrap_or("-"),
            similarity = result.similarity,
            accepted = result.accepted,
            "1:N identification decided"
        );
        Ok(result)
    }

    /// [`identify`](Self::identify), then correlate an accepted key to
    /// its roster profile via the identity collaborator.
    pub fn identify_profile(
        &self,
        image: &[u8],
        roster: &impl ProfileDirectory,
    ) -> Result<(MatchResult, Option<Profile>), EngineError> {
        let result = self.identify(image)?;
        let profile = match result.identity_key.as_deref() {
            Some(key) => roster.profile(key)?,
            None => None,
        };
        Ok((result, profile))
    }

    /// Acquire a photo and enroll it. Cancellation leaves the store
    /// untouched.
    pub async fn register_from_source(
        &mut self,
        identity_key: &str,
        source: &mut impl ImageSource,
    ) -> Result<Outcome<Descriptor>, EngineError> {
        match self.acquire(source).await? {
            Some(image) => Ok(Outcome::Completed(self.register(identity_key, &image)?)),
            None => Ok(Outcome::Cancelled),
        }
    }

    /// Acquire a photo and verify it 1:1.
    pub async fn verify_from_source(
        &self,
        identity_key: &str,
        source: &mut impl ImageSource,
    ) -> Result<Outcome<MatchResult>, EngineError> {
        match self.acquire(source).await? {
            Some(image) => Ok(Outcome::Completed(self.verify_one(&image, identity_key)?)),
            None => Ok(Outcome::Cancelled),
        }
    }

    /// Acquire a photo and identify it 1:N.
    pub async fn identify_from_source(
        &self,
        source: &mut impl ImageSource,
    ) -> Result<Outcome<MatchResult>, EngineError> {
        match self.acquire(source).await? {
            Some(image) => Ok(Outcome::Completed(self.identify(&image)?)),
            None => Ok(Outcome::Cancelled),
        }
    }

    async fn acquire(&self, source: &mut impl ImageSource) -> Result<Option<Vec<u8>>, EngineError> {
        match source
            .acquire()
            .await
            .map_err(|e| EngineError::Source(e.to_string()))?
        {
            Acquisition::Image(payload) => Ok(Some(payload)),
            Acquisition::Cancelled => {
                tracing::info!("acquisition cancelled, nothing to do");
                Ok(None)
            }
        }
    }
}
