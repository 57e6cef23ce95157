//! Change-triggered recording of the pose trajectory.
//!
//! A sample is recorded only when at least one axis moves more than the
//! threshold away from the last *recorded* sample. Slow drift that never
//! crosses the deadband in a single step relative to that sample is ignored.

use crate::{constants::DEFAULT_RECORD_THRESHOLD, pose_estimation::Pose};
use std::sync::{Arc, RwLock};

/// Recorder shared between the tick loop (writer) and exporters (readers)
pub type SharedRecorder = Arc<RwLock<PoseHistoryRecorder>>;

/// Deadband filter plus append-only pose log
#[derive(Debug, Clone)]
pub struct PoseHistoryRecorder {
    threshold: f64,
    last_recorded: Option<Pose>,
    history: Vec<Pose>,
}

impl Default for PoseHistoryRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_THRESHOLD)
    }
}

impl PoseHistoryRecorder {
    /// Create an empty recorder with a per-axis threshold in degrees
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_recorded: None,
            history: Vec::new(),
        }
    }

    /// Wrap the recorder for sharing across threads
    #[must_use]
    pub fn into_shared(self) -> SharedRecorder {
        Arc::new(RwLock::new(self))
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Offer a sample using the recorder's configured threshold
    pub fn record(&mut self, candidate: Pose) -> bool {
        self.consider_sample(candidate, self.threshold)
    }

    /// Offer a sample; returns whether it was appended to the history
    ///
    /// The first sample is always accepted. Later samples are accepted when
    /// `|Δroll|`, `|Δpitch|` or `|Δyaw|` against the last recorded sample
    /// exceeds `threshold`. Non-finite samples are never recorded.
    pub fn consider_sample(&mut self, candidate: Pose, threshold: f64) -> bool {
        if !candidate.is_finite() {
            log::debug!("Refusing non-finite pose at {}", candidate.timestamp_ms);
            return false;
        }

        let accept = match &self.last_recorded {
            None => true,
            Some(last) => candidate.differs_from(last, threshold),
        };

        if accept {
            self.history.push(candidate);
            self.last_recorded = Some(candidate);
        }
        accept
    }

    /// Drop every recorded sample and forget the last one
    pub fn clear(&mut self) {
        log::info!("Clearing pose history ({} samples)", self.history.len());
        self.history.clear();
        self.last_recorded = None;
    }

    #[must_use]
    pub fn last_recorded(&self) -> Option<&Pose> {
        self.last_recorded.as_ref()
    }

    /// Recorded samples in chronological order
    #[must_use]
    pub fn history(&self) -> &[Pose] {
        &self.history
    }

    /// Owned copy of the history for use outside the lock
    #[must_use]
    pub fn snapshot(&self) -> Vec<Pose> {
        self.history.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
