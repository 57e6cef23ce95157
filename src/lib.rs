//! Head pose monitoring library: pose estimation, trajectory recording and export.
//!
//! This library turns per-frame facial landmarks into head orientation
//! (roll, pitch, yaw) and keeps a change-triggered record of it:
//! - Pairwise-distance features standardized with fitted scaler parameters
//! - A pretrained regression model (ONNX Runtime) or a geometric heuristic
//!   for the pose itself
//! - A deadband recorder that only keeps materially different orientations
//! - CSV export of the recorded trajectory
//!
//! The processing pipeline per tick:
//! 1. Detection (landmarks or six coarse keypoints) supplied by the caller
//! 2. Feature extraction and standardization (learned strategy)
//! 3. Pose estimation by the selected strategy
//! 4. Optional cheating-probability scoring
//! 5. Recording when any axis moved more than the threshold
//!
//! # Examples
//!
//! ## Geometric Estimation
//!
//! ```
//! use head_pose_monitor::{
//!     landmarks::{BoundingBox, CoarseKeypoints, FrameSize},
//!     pose_estimation::geometric::GeometricPoseEstimator,
//! };
//! use nalgebra::Point2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keypoints = CoarseKeypoints::from_slice(&[
//!     Point2::new(300.0, 220.0), // right eye
//!     Point2::new(340.0, 220.0), // left eye
//!     Point2::new(320.0, 240.0), // nose
//!     Point2::new(320.0, 260.0), // mouth
//!     Point2::new(270.0, 230.0), // right ear
//!     Point2::new(370.0, 230.0), // left ear
//! ])?;
//! let bbox = BoundingBox::new(Point2::new(270.0, 190.0), Point2::new(370.0, 290.0));
//!
//! let pose = GeometricPoseEstimator::new().estimate(&keypoints, &bbox, &FrameSize::new(640.0, 480.0), 0)?;
//! println!("Roll: {:.2}°, Pitch: {:.2}°, Yaw: {:.2}°", pose.roll, pose.pitch, pose.yaw);
//! # Ok(())
//! # }
//! ```
//!
//! ## Recording and Export
//!
//! ```
//! use head_pose_monitor::{
//!     export::{CsvSchema, HistoryExporter},
//!     pose_estimation::Pose,
//!     recorder::PoseHistoryRecorder,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = PoseHistoryRecorder::new(2.0);
//! recorder.record(Pose::new(0.0, 0.0, 0.0, 1000));
//! recorder.record(Pose::new(0.0, 1.0, 0.0, 1033)); // inside the deadband
//! recorder.record(Pose::new(0.0, 3.0, 0.0, 1066)); // recorded
//!
//! let csv = HistoryExporter::new(CsvSchema::Simple).export(recorder.history())?;
//! assert_eq!(csv.lines().count(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Complete Pipeline Example
//!
//! ```no_run
//! use head_pose_monitor::{
//!     assets::FileAssetLoader,
//!     features::FeatureExtractor,
//!     landmarks::{Detection, LandmarkSet},
//!     pipeline::{PipelineContext, TickOutcome},
//!     pose_estimation::learned::LearnedPoseEstimator,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let estimator = LearnedPoseEstimator::new(FeatureExtractor::new(68)?);
//! let mut pipeline = PipelineContext::new(estimator.into(), 2.0);
//! pipeline.load_assets(&FileAssetLoader::new("assets/pose_regressor.onnx", "assets/scaler.json"))?;
//!
//! # let landmarks: Vec<(f64, f64)> = Vec::new();
//! let detection = Detection::Landmarks(LandmarkSet::from_tuples(&landmarks));
//! if let TickOutcome::Recorded(pose) = pipeline.tick(Some(&detection), 1000) {
//!     println!("Recorded yaw {:.2}°", pose.yaw);
//! }
//! pipeline.dispose();
//! # Ok(())
//! # }
//! ```

/// Detector output types (landmarks, keypoints, boxes)
pub mod landmarks;

/// Pairwise-distance feature extraction
pub mod features;

/// Feature standardization with fitted scaler parameters
pub mod scaler;

/// Pose estimation strategies (geometric and learned)
pub mod pose_estimation;

/// Change-triggered pose history recording
pub mod recorder;

/// CSV export of the pose history
pub mod export;

/// Cheating-probability classifier interface and score tracking
pub mod classifier;

/// Model and scaler asset loading
pub mod assets;

/// `ONNX` Runtime backed models
#[cfg(feature = "onnx")]
pub mod onnx;

/// Cancellable tick loop and clocks
pub mod scheduler;

/// Per-tick pipeline context
pub mod pipeline;

/// Replay application module
pub mod app;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
