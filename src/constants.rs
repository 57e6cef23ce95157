//! Constants used throughout the pipeline

/// Number of facial landmarks produced by the fine-grained detector
pub const NUM_FACIAL_LANDMARKS: usize = 68;

/// Number of keypoints produced by the coarse detector
pub const NUM_COARSE_KEYPOINTS: usize = 6;

/// Number of regression outputs (roll, pitch, yaw)
pub const NUM_POSE_OUTPUTS: usize = 3;

/// Default recording deadband in degrees
pub const DEFAULT_RECORD_THRESHOLD: f64 = 2.0;

/// Default frames per second for the tick scheduler
pub const DEFAULT_FPS: f64 = 30.0;

/// Default frame size assumed by the geometric estimator
pub const DEFAULT_FRAME_WIDTH: f64 = 640.0;
pub const DEFAULT_FRAME_HEIGHT: f64 = 480.0;

/// Geometric estimator limits and calibration constants
pub const MAX_ANGLE_DEGREES: f64 = 90.0;
pub const YAW_POSITION_GAIN: f64 = 45.0;
pub const YAW_NOSE_GAIN: f64 = 30.0;
pub const PITCH_POSITION_GAIN: f64 = 30.0;
pub const PITCH_DISTANCE_GAIN: f64 = 20.0;
pub const EXPECTED_NOSE_MOUTH_RATIO: f64 = 0.2;

/// Prefix of exported history files
pub const EXPORT_FILE_PREFIX: &str = "head_pose_history";
