//! Cheating (anomaly) probability derived from head pose.

use crate::{pose_estimation::Pose, Error, Result};

/// Probability in `[0, 1]` that the current pose is anomalous
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CheatingScore(f64);

impl CheatingScore {
    /// Validate a raw classifier output
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a finite probability
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::ClassifierError(format!("Score {value} is not a probability")))
        }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Score as a percentage for display
    #[must_use]
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }
}

/// Pretrained classifier mapping a pose's angles to a cheating probability
pub trait AnomalyClassifier: Send + Sync {
    /// Score a pose
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails
    fn score(&self, pose: &Pose) -> Result<f64>;

    /// Get classifier name
    fn name(&self) -> &str;
}

/// Keeps only the latest successful score
///
/// Failed or out-of-range classifications leave the previous score in place.
#[derive(Debug, Clone, Default)]
pub struct ScoreTracker {
    latest: Option<CheatingScore>,
}

impl ScoreTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `pose` and return the score now held
    pub fn update(&mut self, classifier: &dyn AnomalyClassifier, pose: &Pose) -> Option<CheatingScore> {
        match classifier.score(pose).and_then(CheatingScore::new) {
            Ok(score) => self.latest = Some(score),
            Err(e) => log::warn!("{} failed, keeping previous score: {}", classifier.name(), e),
        }
        self.latest
    }

    #[must_use]
    pub fn latest(&self) -> Option<CheatingScore> {
        self.latest
    }

    pub fn reset(&mut self) {
        self.latest = None;
    }
}
