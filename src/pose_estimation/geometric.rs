//! Closed-form pose heuristic for the six-keypoint face detector.
//!
//! The gains are empirical calibration constants; the result is an
//! approximation, not a physical inverse projection.

use super::Pose;
use crate::{
    constants::{
        EXPECTED_NOSE_MOUTH_RATIO, MAX_ANGLE_DEGREES, PITCH_DISTANCE_GAIN, PITCH_POSITION_GAIN, YAW_NOSE_GAIN,
        YAW_POSITION_GAIN,
    },
    landmarks::{BoundingBox, CoarseKeypoints, FrameSize},
    Error, Result,
};

/// Unclamped `(roll, pitch, yaw)` in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Geometric head pose estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricPoseEstimator;

impl GeometricPoseEstimator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Angles before clamping
    ///
    /// # Errors
    ///
    /// Returns an error if the bounding box or the frame has no usable area
    pub fn raw_angles(&self, keypoints: &CoarseKeypoints, bbox: &BoundingBox, frame: &FrameSize) -> Result<RawAngles> {
        if bbox.is_degenerate() {
            return Err(Error::DegenerateGeometry(format!(
                "Bounding box {:.1}x{:.1} has no area",
                bbox.width(),
                bbox.height()
            )));
        }
        if frame.is_degenerate() {
            return Err(Error::DegenerateGeometry(format!(
                "Frame {}x{} has no area",
                frame.width, frame.height
            )));
        }

        let box_width = bbox.width();
        let box_height = bbox.height();
        let center = bbox.center();

        // Eye-line tilt
        let roll = (keypoints.left_eye.y - keypoints.right_eye.y)
            .atan2(keypoints.left_eye.x - keypoints.right_eye.x)
            .to_degrees();

        // Box position mapped to [-1, 1] across the frame
        let normalized_x = (center.x / frame.width - 0.5) * 2.0;
        let normalized_y = (center.y / frame.height - 0.5) * 2.0;

        let nose_offset_x = keypoints.nose.x - keypoints.eye_center().x;
        let yaw = normalized_x * YAW_POSITION_GAIN + (nose_offset_x / box_width) * YAW_NOSE_GAIN;

        let expected_dist = box_height * EXPECTED_NOSE_MOUTH_RATIO;
        let nose_to_mouth = nalgebra::distance(&keypoints.nose, &keypoints.mouth);
        let pitch_from_dist = ((nose_to_mouth - expected_dist) / expected_dist) * PITCH_DISTANCE_GAIN;
        let pitch = normalized_y * PITCH_POSITION_GAIN + pitch_from_dist;

        Ok(RawAngles { roll, pitch, yaw })
    }

    /// Estimate a pose clamped to `[-90, 90]` degrees on every axis
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The bounding box or the frame is degenerate
    /// - The keypoints produce non-finite angles
    pub fn estimate(
        &self,
        keypoints: &CoarseKeypoints,
        bbox: &BoundingBox,
        frame: &FrameSize,
        timestamp_ms: i64,
    ) -> Result<Pose> {
        let raw = self.raw_angles(keypoints, bbox, frame)?;
        let pose = Pose::new(clamp_angle(raw.roll), clamp_angle(raw.pitch), clamp_angle(raw.yaw), timestamp_ms);

        if !pose.is_finite() {
            return Err(Error::InvalidInput("Keypoints produced non-finite angles".to_string()));
        }
        Ok(pose)
    }
}

fn clamp_angle(value: f64) -> f64 {
    value.clamp(-MAX_ANGLE_DEGREES, MAX_ANGLE_DEGREES)
}
