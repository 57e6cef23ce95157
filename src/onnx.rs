//! `ONNX` Runtime backed models: the pose regression model and the anomaly classifier.

use crate::{
    classifier::AnomalyClassifier,
    features::FeatureVector,
    pose_estimation::{learned::RegressionModel, Pose},
    Error, Result,
};
use ndarray::{Array2, CowArray};
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Build an optimized session for a model file
fn build_session(name: &str, model_path: &Path) -> Result<Session> {
    let environment = Arc::new(
        Environment::builder()
            .with_name(name)
            .with_log_level(ort::LoggingLevel::Warning)
            .build()?,
    );

    let session = ort::SessionBuilder::new(&environment)?
        .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
        .with_model_from_file(model_path)?;

    if session.inputs.is_empty() {
        return Err(Error::ModelError(format!("Model {} has no inputs", model_path.display())));
    }
    if session.outputs.is_empty() {
        return Err(Error::ModelError(format!("Model {} has no outputs", model_path.display())));
    }
    Ok(session)
}

/// Run a `[1, n]` float input through the session and flatten the first output
///
/// Input and output tensors are dropped when this returns.
fn run_row(session: &Session, row: Vec<f32>) -> Result<Vec<f64>> {
    let width = row.len();
    let input = Array2::from_shape_vec((1, width), row)?;
    let cow_array = CowArray::from(input.into_dyn());
    let input_tensor = Value::from_array(session.allocator(), &cow_array)?;

    let outputs = session.run(vec![input_tensor])?;
    let first = outputs
        .into_iter()
        .next()
        .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;

    let tensor = first.try_extract::<f32>()?;
    let values = tensor.view().iter().map(|&v| f64::from(v)).collect();
    Ok(values)
}

/// Declared width of the last input dimension, if static
fn declared_input_width(session: &Session) -> Option<usize> {
    session
        .inputs
        .first()
        .and_then(|input| input.dimensions.last().copied().flatten())
        .and_then(|d| usize::try_from(d).ok())
}

/// Pose regression network exported to `ONNX`
///
/// Takes a `[1, L]` standardized feature row and yields `[roll, pitch, yaw]`.
pub struct OnnxRegressionModel {
    session: Session,
    name: String,
    input_len: Option<usize>,
}

impl OnnxRegressionModel {
    /// Load the regression model from an `ONNX` file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs or outputs
    /// - The ONNX runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        log::info!("Initializing OnnxRegressionModel with model: {}", model_path.display());

        let session = build_session("pose_regressor", model_path)?;
        let input_len = declared_input_width(&session);
        let name = model_path
            .file_stem()
            .map_or_else(|| "pose_regressor".to_string(), |s| s.to_string_lossy().into_owned());

        Ok(Self {
            session,
            name,
            input_len,
        })
    }
}

impl RegressionModel for OnnxRegressionModel {
    #[allow(clippy::cast_possible_truncation)] // model runs in f32
    fn predict(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let row: Vec<f32> = features.as_array().iter().map(|&v| v as f32).collect();
        run_row(&self.session, row)
    }

    fn input_len(&self) -> Option<usize> {
        self.input_len
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cheating-probability classifier taking `[roll, pitch, yaw]`
pub struct OnnxAnomalyClassifier {
    session: Session,
}

impl OnnxAnomalyClassifier {
    /// Load the classifier from an `ONNX` file
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or declares a width other than 3
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        log::info!("Initializing OnnxAnomalyClassifier with model: {}", model_path.display());

        let session = build_session("anomaly_classifier", model_path)?;
        if let Some(width) = declared_input_width(&session) {
            if width != 3 {
                return Err(Error::ModelValidationError(format!(
                    "Classifier expects {width} inputs, pose provides 3"
                )));
            }
        }
        Ok(Self { session })
    }
}

impl AnomalyClassifier for OnnxAnomalyClassifier {
    #[allow(clippy::cast_possible_truncation)]
    fn score(&self, pose: &Pose) -> Result<f64> {
        let row: Vec<f32> = pose.angles().iter().map(|&v| v as f32).collect();
        let output = run_row(&self.session, row)?;
        // Single sigmoid unit, or [p(normal), p(cheating)] from a softmax head
        output
            .last()
            .copied()
            .ok_or_else(|| Error::ClassifierError("Classifier returned no values".to_string()))
    }

    fn name(&self) -> &str {
        "onnx_anomaly_classifier"
    }
}
