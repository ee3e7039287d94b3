use crate::descriptor::{Descriptor, DEFAULT_MAX_DISTANCE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored enrollment: one identity key, the raw photo it was
/// enrolled from, and the descriptor derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub identity_key: String,
    /// Original photo payload as submitted (opaque bytes).
    pub raw_image: Vec<u8>,
    pub descriptor: Descriptor,
    pub enrolled_at: DateTime<Utc>,
}

/// Result of scoring a probe descriptor against one or more
/// enrollments. Computed fresh per call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Key of the accepted identity, if any.
    pub identity_key: Option<String>,
    /// Similarity in [0, 1]. On a rejected 1:N scan this is the best
    /// similarity observed, kept for diagnostics.
    pub similarity: f32,
    pub accepted: bool,
}

impl MatchResult {
    pub fn rejected(similarity: f32) -> Self {
        Self {
            identity_key: None,
            similarity,
            accepted: false,
        }
    }
}

/// Strategy for scanning a roster of enrollments with a probe
/// descriptor.
pub trait Scanner {
    fn scan(&self, probe: &Descriptor, roster: &[EnrollmentRecord], threshold: f32) -> MatchResult;
}

/// First-match scan in storage order.
///
/// Returns the FIRST enrollment whose similarity clears the threshold.
/// A weaker early match can shadow a stronger later one; this is kept
/// for compatibility with existing enrollments. Use
/// [`BestMatchScanner`] where that shadowing is unacceptable.
pub struct FirstMatchScanner {
    pub max_distance: f32,
}

impl Default for FirstMatchScanner {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl Scanner for FirstMatchScanner {
    fn scan(&self, probe: &Descriptor, roster: &[EnrollmentRecord], threshold: f32) -> MatchResult {
        let mut best_sim = 0.0f32;

        for record in roster {
            let sim = probe.similarity_with(&record.descriptor, self.max_distance);
            if sim >= threshold {
                tracing::debug!(
                    identity = %record.identity_key,
                    similarity = sim,
                    "scan accepted"
                );
                return MatchResult {
                    identity_key: Some(record.identity_key.clone()),
                    similarity: sim,
                    accepted: true,
                };
            }
            if sim > best_sim {
                best_sim = sim;
            }
        }

        MatchResult::rejected(best_sim)
    }
}

/// Best-match scan: always traverses the whole roster and keeps the
/// maximum similarity.
pub struct BestMatchScanner {
    pub max_distance: f32,
}

impl Default for BestMatchScanner {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl Scanner for BestMatchScanner {
    fn scan(&self, probe: &Descriptor, roster: &[EnrollmentRecord], threshold: f32) -> MatchResult {
        let mut best_sim = 0.0f32;
        let mut best_idx: Option<usize> = None;

        for (i, record) in roster.iter().enumerate() {
            let sim = probe.similarity_with(&record.descriptor, self.max_distance);
            if best_idx.is_none() || sim > best_sim {
                best_sim = sim;
                best_idx = Some(i);
            }
        }

        match best_idx {
            Some(idx) if best_sim >= threshold => MatchResult {
                identity_key: Some(roster[idx].identity_key.clone()),
                similarity: best_sim,
                accepted: true,
            },
            _ => MatchResult::rejected(best_sim),
        }
    }
}
