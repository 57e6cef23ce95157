//! Head pose estimation from detector output.
//!
//! Two strategies share one capability:
//! - [`geometric::GeometricPoseEstimator`] derives angles from six coarse
//!   keypoints and the detection box with closed-form formulas.
//! - [`learned::LearnedPoseEstimator`] feeds standardized pairwise-distance
//!   features through a pretrained regression model.
//!
//! [`PoseEstimator`] wraps both so call sites dispatch on the detection kind
//! instead of duplicating the pipeline.

pub mod geometric;
pub mod learned;

use crate::{landmarks::Detection, Error, Result};
use geometric::GeometricPoseEstimator;
use learned::LearnedPoseEstimator;

/// Head orientation in degrees at a capture time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Rotation around the front-back axis
    pub roll: f64,
    /// Rotation around the side-side axis
    pub pitch: f64,
    /// Rotation around the vertical axis
    pub yaw: f64,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl Pose {
    #[must_use]
    pub fn new(roll: f64, pitch: f64, yaw: f64, timestamp_ms: i64) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            timestamp_ms,
        }
    }

    /// Angles as `[roll, pitch, yaw]`
    #[must_use]
    pub fn angles(&self) -> [f64; 3] {
        [self.roll, self.pitch, self.yaw]
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.angles().iter().all(|a| a.is_finite())
    }

    /// Whether any single axis differs from `other` by more than `threshold`
    #[must_use]
    pub fn differs_from(&self, other: &Pose, threshold: f64) -> bool {
        self.angles()
            .iter()
            .zip(other.angles())
            .any(|(a, b)| (a - b).abs() > threshold)
    }
}

/// Which strategy produced a pose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorKind {
    Geometric,
    Learned,
}

impl std::fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geometric => write!(f, "geometric"),
            Self::Learned => write!(f, "learned"),
        }
    }
}

/// Pose estimation capability with one variant per strategy
pub enum PoseEstimator {
    Geometric(GeometricPoseEstimator),
    Learned(LearnedPoseEstimator),
}

impl PoseEstimator {
    #[must_use]
    pub fn kind(&self) -> EstimatorKind {
        match self {
            Self::Geometric(_) => EstimatorKind::Geometric,
            Self::Learned(_) => EstimatorKind::Learned,
        }
    }

    /// Whether every asset the strategy needs is loaded
    #[must_use]
    pub fn is_ready(&self) -> bool {
        match self {
            Self::Geometric(_) => true,
            Self::Learned(estimator) => estimator.is_ready(),
        }
    }

    /// Estimate a pose for a detection captured at `timestamp_ms`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The detection kind does not match the strategy
    /// - The learned strategy is not ready
    /// - The geometry is degenerate or the model output is unusable
    pub fn estimate(&self, detection: &Detection, timestamp_ms: i64) -> Result<Pose> {
        match (self, detection) {
            (Self::Geometric(estimator), Detection::Keypoints { keypoints, bbox, frame }) => {
                estimator.estimate(keypoints, bbox, frame, timestamp_ms)
            }
            (Self::Learned(estimator), Detection::Landmarks(landmarks)) => estimator.estimate(landmarks, timestamp_ms),
            (estimator, _) => Err(Error::InvalidInput(format!(
                "The {} estimator cannot use this detection kind",
                estimator.kind()
            ))),
        }
    }
}

impl From<GeometricPoseEstimator> for PoseEstimator {
    fn from(estimator: GeometricPoseEstimator) -> Self {
        Self::Geometric(estimator)
    }
}

impl From<LearnedPoseEstimator> for PoseEstimator {
    fn from(estimator: LearnedPoseEstimator) -> Self {
        Self::Learned(estimator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkSet;

    #[test]
    fn test_differs_from_any_axis() {
        let base = Pose::new(0.0, 0.0, 0.0, 0);
        assert!(!base.differs_from(&Pose::new(2.0, -2.0, 1.9, 1), 2.0));
        assert!(Pose::new(0.0, 0.0, 2.01, 1).differs_from(&base, 2.0));
        assert!(Pose::new(-3.0, 0.0, 0.0, 1).differs_from(&base, 2.0));
    }

    #[test]
    fn test_is_finite() {
        assert!(Pose::new(1.0, 2.0, 3.0, 0).is_finite());
        assert!(!Pose::new(f64::NAN, 2.0, 3.0, 0).is_finite());
        assert!(!Pose::new(1.0, f64::INFINITY, 3.0, 0).is_finite());
    }

    #[test]
    fn test_mismatched_detection_kind() {
        let estimator = PoseEstimator::from(GeometricPoseEstimator::new());
        let detection = Detection::Landmarks(LandmarkSet::from_tuples(&[(0.0, 0.0), (1.0, 1.0)]));
        assert!(matches!(estimator.estimate(&detection, 0), Err(Error::InvalidInput(_))));
        assert!(estimator.is_ready());
        assert_eq!(estimator.kind(), EstimatorKind::Geometric);
    }
}
