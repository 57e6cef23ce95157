//! Per-feature standardization with externally fitted parameters.

use crate::{features::FeatureVector, Error, Result};
use ndarray::{Array1, Zip};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Raw scaler asset as exported by the training pipeline
#[derive(Debug, Deserialize)]
struct ScalerAsset {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Fitted standardization parameters (`mean`, `scale`) of equal length
///
/// Construction rejects empty, mismatched, non-finite or zero-scale
/// parameters, so standardization never divides by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalerParameters {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl ScalerParameters {
    /// Validate and wrap scaler parameters
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - `mean` and `scale` differ in length or are empty
    /// - any value is not finite
    /// - any `scale` entry is zero
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.is_empty() {
            return Err(Error::ConfigError("Scaler parameters are empty".to_string()));
        }
        if mean.len() != scale.len() {
            return Err(Error::ConfigError(format!(
                "Scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if let Some(k) = mean.iter().position(|m| !m.is_finite()) {
            return Err(Error::ConfigError(format!("Scaler mean[{k}] is not finite")));
        }
        if let Some(k) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(Error::ConfigError(format!(
                "Scaler scale[{k}] = {} cannot be used as a divisor",
                scale[k]
            )));
        }

        Ok(Self {
            mean: Array1::from(mean),
            scale: Array1::from(scale),
        })
    }

    /// Parse parameters from the JSON asset format `{"mean": [...], "scale": [...]}`
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the parameters are invalid
    pub fn from_json_str(content: &str) -> Result<Self> {
        let asset: ScalerAsset = serde_json::from_str(content)?;
        Self::new(asset.mean, asset.scale)
    }

    /// Load parameters from a JSON asset file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds invalid parameters
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading scaler parameters from: {}", path.as_ref().display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Number of features the parameters were fitted on
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    #[must_use]
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    #[must_use]
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    fn check_len(&self, features: &FeatureVector) -> Result<()> {
        if features.len() == self.len() {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Feature vector has {} entries, scaler expects {}",
                features.len(),
                self.len()
            )))
        }
    }
}

/// Applies `(x - mean) / scale` once parameters are installed
///
/// Without parameters the transform is an identity pass-through; use
/// [`FeatureStandardizer::is_ready`] to tell the two cases apart.
#[derive(Debug, Clone, Default)]
pub struct FeatureStandardizer {
    params: Option<Arc<ScalerParameters>>,
}

impl FeatureStandardizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parameters(params: Arc<ScalerParameters>) -> Self {
        Self { params: Some(params) }
    }

    /// Install the shared parameters; readiness flips to true
    pub fn install(&mut self, params: Arc<ScalerParameters>) {
        self.params = Some(params);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.params.is_some()
    }

    #[must_use]
    pub fn parameters(&self) -> Option<&ScalerParameters> {
        self.params.as_deref()
    }

    /// Standardize a feature vector
    ///
    /// # Errors
    ///
    /// Returns an error if the vector length differs from the parameter length
    pub fn standardize(&self, features: &FeatureVector) -> Result<FeatureVector> {
        let Some(params) = &self.params else {
            return Ok(features.clone());
        };
        params.check_len(features)?;

        let standardized = Zip::from(features.as_array())
            .and(&params.mean)
            .and(&params.scale)
            .map_collect(|&x, &mean, &scale| (x - mean) / scale);
        Ok(FeatureVector(standardized))
    }

    /// Invert [`Self::standardize`]: `x' * scale + mean`
    ///
    /// # Errors
    ///
    /// Returns an error if the vector length differs from the parameter length
    pub fn destandardize(&self, features: &FeatureVector) -> Result<FeatureVector> {
        let Some(params) = &self.params else {
            return Ok(features.clone());
        };
        params.check_len(features)?;

        let restored = Zip::from(features.as_array())
            .and(&params.mean)
            .and(&params.scale)
            .map_collect(|&x, &mean, &scale| x * scale + mean);
        Ok(FeatureVector(restored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_standardize_values() {
        let params = ScalerParameters::new(vec![1.0, 2.0, 3.0], vec![2.0, 0.5, 1.0]).unwrap();
        let standardizer = FeatureStandardizer::with_parameters(Arc::new(params));
        let out = standardizer
            .standardize(&FeatureVector::from(vec![3.0, 2.5, -1.0]))
            .unwrap();
        assert_eq!(out.to_vec(), vec![1.0, 1.0, -4.0]);
    }

    #[test]
    fn test_not_ready_is_identity() {
        let standardizer = FeatureStandardizer::new();
        assert!(!standardizer.is_ready());
        let input = FeatureVector::from(vec![5.0, 6.0]);
        assert_eq!(standardizer.standardize(&input).unwrap(), input);
    }

    #[test]
    fn test_length_mismatch() {
        let params = ScalerParameters::new(vec![0.0; 3], vec![1.0; 3]).unwrap();
        let standardizer = FeatureStandardizer::with_parameters(Arc::new(params));
        let result = standardizer.standardize(&FeatureVector::from(vec![1.0, 2.0]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let result = ScalerParameters::new(vec![0.0, 0.0], vec![1.0, 0.0]);
        match result {
            Err(Error::ConfigError(msg)) => assert!(msg.contains("scale[1]")),
            other => panic!("Expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(ScalerParameters::new(vec![], vec![]).is_err());
        assert!(ScalerParameters::new(vec![0.0], vec![1.0, 1.0]).is_err());
        assert!(ScalerParameters::new(vec![f64::NAN], vec![1.0]).is_err());
        assert!(ScalerParameters::new(vec![0.0], vec![f64::INFINITY]).is_err());
    }

    #[test]
    fn test_from_json() {
        let params = ScalerParameters::from_json_str(r#"{"mean": [1.5, -2.0], "scale": [0.5, 4.0]}"#).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.mean()[0], 1.5);
        assert_eq!(params.scale()[1], 4.0);

        assert!(matches!(
            ScalerParameters::from_json_str(r#"{"mean": [1.0]}"#),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            ScalerParameters::from_json_str(r#"{"mean": [1.0], "scale": [0.0]}"#),
            Err(Error::ConfigError(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_standardize_roundtrip(
            rows in prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3, 0.01f64..100.0, any::<bool>()), 1..64)
        ) {
            let features: Vec<f64> = rows.iter().map(|r| r.0).collect();
            let mean: Vec<f64> = rows.iter().map(|r| r.1).collect();
            let scale: Vec<f64> = rows.iter().map(|r| if r.3 { r.2 } else { -r.2 }).collect();

            let standardizer = FeatureStandardizer::with_parameters(Arc::new(ScalerParameters::new(mean, scale).unwrap()));
            let input = FeatureVector::from(features.clone());
            let restored = standardizer
                .destandardize(&standardizer.standardize(&input).unwrap())
                .unwrap();

            for (orig, back) in features.iter().zip(restored.to_vec()) {
                prop_assert!((orig - back).abs() <= 1e-9 * orig.abs().max(1.0));
            }
        }
    }
}
