//! Regression-model pose estimator for full landmark sets.

use super::Pose;
use crate::{
    constants::NUM_POSE_OUTPUTS,
    features::{FeatureExtractor, FeatureVector},
    landmarks::LandmarkSet,
    scaler::{FeatureStandardizer, ScalerParameters},
    Error, Result,
};
use std::sync::Arc;

/// Pretrained regression model mapping standardized features to angles
///
/// Implementations must treat the input as read-only and release any
/// per-call buffers before returning.
pub trait RegressionModel: Send + Sync {
    /// Run the model; a well-formed model returns `[roll, pitch, yaw]` in degrees
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails
    fn predict(&self, features: &FeatureVector) -> Result<Vec<f64>>;

    /// Expected input width, when the model declares one
    fn input_len(&self) -> Option<usize> {
        None
    }

    /// Get model name
    fn name(&self) -> &str;
}

/// Landmarks -> features -> standardization -> regression model
pub struct LearnedPoseEstimator {
    extractor: FeatureExtractor,
    standardizer: FeatureStandardizer,
    model: Option<Arc<dyn RegressionModel>>,
}

impl LearnedPoseEstimator {
    /// Create an estimator with no assets loaded yet
    #[must_use]
    pub fn new(extractor: FeatureExtractor) -> Self {
        log::info!(
            "Initializing LearnedPoseEstimator for {} landmarks ({} features)",
            extractor.num_landmarks(),
            extractor.output_len()
        );
        Self {
            extractor,
            standardizer: FeatureStandardizer::new(),
            model: None,
        }
    }

    /// Install the loaded model and scaler together
    ///
    /// # Errors
    ///
    /// Returns a validation error if the scaler or the model width does not
    /// match the extractor's feature length; nothing is installed in that case
    pub fn install_assets(&mut self, model: Arc<dyn RegressionModel>, scaler: Arc<ScalerParameters>) -> Result<()> {
        let expected = self.extractor.output_len();
        if scaler.len() != expected {
            return Err(Error::ModelValidationError(format!(
                "Scaler has {} features, extractor produces {}",
                scaler.len(),
                expected
            )));
        }
        if let Some(width) = model.input_len() {
            if width != expected {
                return Err(Error::ModelValidationError(format!(
                    "Model '{}' expects {} features, extractor produces {}",
                    model.name(),
                    width,
                    expected
                )));
            }
        }

        log::info!("Learned estimator ready with model '{}'", model.name());
        self.standardizer.install(scaler);
        self.model = Some(model);
        Ok(())
    }

    /// Both the model and the scaler are loaded
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.model.is_some() && self.standardizer.is_ready()
    }

    #[must_use]
    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    #[must_use]
    pub fn standardizer(&self) -> &FeatureStandardizer {
        &self.standardizer
    }

    /// Estimate an unclamped pose from a landmark set
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model or scaler is not loaded
    /// - The landmark count is wrong
    /// - The model fails or returns anything but three finite values
    pub fn estimate(&self, landmarks: &LandmarkSet, timestamp_ms: i64) -> Result<Pose> {
        let model = match &self.model {
            Some(model) if self.standardizer.is_ready() => model,
            _ => return Err(Error::NotReady("Regression model or scaler not loaded".to_string())),
        };

        let features = self.extractor.extract(landmarks)?;
        let standardized = self.standardizer.standardize(&features)?;
        let output = model.predict(&standardized)?;

        let [roll, pitch, yaw] = <[f64; NUM_POSE_OUTPUTS]>::try_from(output.as_slice()).map_err(|_| {
            Error::ModelOutputError(format!(
                "Model '{}' returned {} values, expected {}",
                model.name(),
                output.len(),
                NUM_POSE_OUTPUTS
            ))
        })?;

        let pose = Pose::new(roll, pitch, yaw, timestamp_ms);
        if !pose.is_finite() {
            return Err(Error::ModelOutputError(format!(
                "Model '{}' returned non-finite angles",
                model.name()
            )));
        }
        Ok(pose)
    }
}
