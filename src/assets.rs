//! Loading of the regression model, scaler and classifier assets.

use crate::{
    classifier::AnomalyClassifier,
    pose_estimation::learned::RegressionModel,
    scaler::ScalerParameters,
    Result,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Supplies the two assets the learned estimator needs
///
/// Each asset is loaded independently; the pipeline only becomes ready when
/// both succeed.
pub trait AssetLoader {
    /// Load the pretrained regression model
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded
    fn load_model(&self) -> Result<Arc<dyn RegressionModel>>;

    /// Load the fitted scaler parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be read or are invalid
    fn load_scaler(&self) -> Result<Arc<ScalerParameters>>;
}

/// Loads the model and scaler from files on disk
#[derive(Debug, Clone)]
pub struct FileAssetLoader {
    model_path: PathBuf,
    scaler_path: PathBuf,
}

impl FileAssetLoader {
    #[must_use]
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, scaler_path: Q) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            scaler_path: scaler_path.as_ref().to_path_buf(),
        }
    }
}

impl AssetLoader for FileAssetLoader {
    #[cfg(feature = "onnx")]
    fn load_model(&self) -> Result<Arc<dyn RegressionModel>> {
        Ok(Arc::new(crate::onnx::OnnxRegressionModel::new(&self.model_path)?))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_model(&self) -> Result<Arc<dyn RegressionModel>> {
        Err(crate::Error::ModelError(format!(
            "Cannot load {}: built without the `onnx` feature",
            self.model_path.display()
        )))
    }

    fn load_scaler(&self) -> Result<Arc<ScalerParameters>> {
        Ok(Arc::new(ScalerParameters::from_file(&self.scaler_path)?))
    }
}

/// Load the cheating classifier from an `ONNX` file
///
/// # Errors
///
/// Returns an error if the model cannot be loaded
#[cfg(feature = "onnx")]
pub fn load_classifier<P: AsRef<Path>>(path: P) -> Result<Box<dyn AnomalyClassifier>> {
    Ok(Box::new(crate::onnx::OnnxAnomalyClassifier::new(path)?))
}

/// Load the cheating classifier from an `ONNX` file
///
/// # Errors
///
/// Always fails: the crate was built without the `onnx` feature
#[cfg(not(feature = "onnx"))]
pub fn load_classifier<P: AsRef<Path>>(path: P) -> Result<Box<dyn AnomalyClassifier>> {
    Err(crate::Error::ModelError(format!(
        "Cannot load {}: built without the `onnx` feature",
        path.as_ref().display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Write;

    #[test]
    fn test_load_scaler_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mean": [0.5, 1.5, 2.5], "scale": [1.0, 2.0, 3.0]}}"#).unwrap();

        let loader = FileAssetLoader::new("missing.onnx", file.path());
        let scaler = loader.load_scaler().unwrap();
        assert_eq!(scaler.len(), 3);
    }

    #[test]
    fn test_missing_scaler_file() {
        let loader = FileAssetLoader::new("missing.onnx", "definitely/not/here.json");
        assert!(matches!(loader.load_scaler(), Err(Error::Io(_))));
    }

    #[test]
    fn test_missing_model_file() {
        let loader = FileAssetLoader::new("definitely/not/here.onnx", "scaler.json");
        assert!(loader.load_model().is_err());
    }
}
