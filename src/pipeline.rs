//! Per-tick pose pipeline with an explicit lifecycle.
//!
//! `PipelineContext::new` → `load_assets` → `tick`* → `dispose`.
//! The context owns the estimator, the shared recorder and the latest pose
//! and score. A tick never returns an error: every failure is reported as a
//! [`TickOutcome`] so the scheduling loop keeps running.

use crate::{
    assets::AssetLoader,
    classifier::{AnomalyClassifier, CheatingScore, ScoreTracker},
    export::HistoryExporter,
    landmarks::Detection,
    pose_estimation::{EstimatorKind, Pose, PoseEstimator},
    recorder::{PoseHistoryRecorder, SharedRecorder},
    scheduler::CancelHandle,
    Error, Result,
};
use std::sync::{Arc, PoisonError};

/// Result of one processing tick
#[derive(Debug)]
pub enum TickOutcome {
    /// The detector found no face this frame
    NoDetection,
    /// The estimator's assets are not loaded
    NotReady,
    /// The detection could not produce a pose (bad input, degenerate geometry, model failure)
    Skipped(Error),
    /// A pose was estimated and appended to the history
    Recorded(Pose),
    /// A pose was estimated but stayed inside the recording deadband
    Unchanged(Pose),
    /// The pipeline was torn down; any estimate from this tick was dropped
    Discarded,
}

impl TickOutcome {
    /// Pose produced this tick, if any
    #[must_use]
    pub fn pose(&self) -> Option<&Pose> {
        match self {
            Self::Recorded(pose) | Self::Unchanged(pose) => Some(pose),
            _ => None,
        }
    }
}

/// Lifecycle state of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Created, assets not loaded (learned strategy only)
    Loading,
    Ready,
    /// An asset failed to load; the pipeline never becomes ready
    Failed(String),
    Disposed,
}

/// Explicit owner of all state shared across ticks
pub struct PipelineContext {
    estimator: PoseEstimator,
    recorder: SharedRecorder,
    classifier: Option<Box<dyn AnomalyClassifier>>,
    scores: ScoreTracker,
    latest_pose: Option<Pose>,
    cancel: CancelHandle,
    load_failure: Option<String>,
}

impl PipelineContext {
    /// Create a pipeline around an estimator and a recording threshold in degrees
    #[must_use]
    pub fn new(estimator: PoseEstimator, record_threshold: f64) -> Self {
        log::info!(
            "Creating {} pose pipeline (record threshold {:.1} deg)",
            estimator.kind(),
            record_threshold
        );
        Self {
            estimator,
            recorder: PoseHistoryRecorder::new(record_threshold).into_shared(),
            classifier: None,
            scores: ScoreTracker::new(),
            latest_pose: None,
            cancel: CancelHandle::new(),
            load_failure: None,
        }
    }

    /// Attach a cheating classifier run on every estimated pose
    #[must_use]
    pub fn with_classifier(mut self, classifier: Box<dyn AnomalyClassifier>) -> Self {
        log::info!("Anomaly classifier attached: {}", classifier.name());
        self.classifier = Some(classifier);
        self
    }

    /// Share a stop flag with a scheduler so disposal also stops the loop
    #[must_use]
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Load the model and scaler for the learned strategy
    ///
    /// Both assets are requested independently. If either fails, neither is
    /// installed and the pipeline stays not-ready for its whole lifetime.
    /// The geometric strategy needs no assets and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns the first asset or validation error encountered
    pub fn load_assets(&mut self, loader: &dyn AssetLoader) -> Result<()> {
        let PoseEstimator::Learned(estimator) = &mut self.estimator else {
            return Ok(());
        };
        if let Some(reason) = &self.load_failure {
            return Err(Error::NotReady(format!("Asset loading already failed: {reason}")));
        }

        let model = loader.load_model();
        match &model {
            Ok(m) => log::info!("Regression model '{}' loaded", m.name()),
            Err(e) => log::error!("Regression model failed to load: {}", e),
        }
        let scaler = loader.load_scaler();
        match &scaler {
            Ok(s) => log::info!("Scaler parameters loaded ({} features)", s.len()),
            Err(e) => log::error!("Scaler parameters failed to load: {}", e),
        }

        let installed = model.and_then(|model| scaler.and_then(|scaler| estimator.install_assets(model, scaler)));
        if let Err(e) = &installed {
            self.load_failure = Some(e.to_string());
        }
        installed
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        if self.cancel.is_cancelled() {
            PipelineState::Disposed
        } else if let Some(reason) = &self.load_failure {
            PipelineState::Failed(reason.clone())
        } else if self.estimator.is_ready() {
            PipelineState::Ready
        } else {
            PipelineState::Loading
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == PipelineState::Ready
    }

    #[must_use]
    pub fn estimator_kind(&self) -> EstimatorKind {
        self.estimator.kind()
    }

    /// Process one frame's detection captured at `now_ms`
    pub fn tick(&mut self, detection: Option<&Detection>, now_ms: i64) -> TickOutcome {
        if self.cancel.is_cancelled() {
            return TickOutcome::Discarded;
        }
        let Some(detection) = detection else {
            return TickOutcome::NoDetection;
        };
        if !self.is_ready() {
            return TickOutcome::NotReady;
        }

        let pose = match self.estimator.estimate(detection, now_ms) {
            Ok(pose) => pose,
            Err(Error::NotReady(_)) => return TickOutcome::NotReady,
            Err(e) => {
                log::debug!("No pose at {}: {}", now_ms, e);
                return TickOutcome::Skipped(e);
            }
        };

        // Teardown may have happened while the model was running
        if self.cancel.is_cancelled() {
            log::debug!("Pipeline disposed during inference, dropping pose at {}", now_ms);
            return TickOutcome::Discarded;
        }

        self.latest_pose = Some(pose);
        if let Some(classifier) = &self.classifier {
            self.scores.update(classifier.as_ref(), &pose);
        }

        let recorded = self
            .recorder
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .record(pose);
        if recorded {
            TickOutcome::Recorded(pose)
        } else {
            TickOutcome::Unchanged(pose)
        }
    }

    #[must_use]
    pub fn latest_pose(&self) -> Option<Pose> {
        self.latest_pose
    }

    #[must_use]
    pub fn latest_score(&self) -> Option<CheatingScore> {
        self.scores.latest()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.recorder.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Copy of the recorded history taken under the read lock
    #[must_use]
    pub fn history_snapshot(&self) -> Vec<Pose> {
        self.recorder.read().unwrap_or_else(PoisonError::into_inner).snapshot()
    }

    /// Handle to the recorder for readers on other threads
    #[must_use]
    pub fn recorder(&self) -> SharedRecorder {
        Arc::clone(&self.recorder)
    }

    /// Render the recorded history as CSV
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyHistory`] when nothing has been recorded
    pub fn export(&self, exporter: &HistoryExporter) -> Result<String> {
        exporter.export(&self.history_snapshot())
    }

    /// Empty the history; the next pose is always recorded
    pub fn clear(&mut self) {
        self.recorder.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Stop flag observed by ticks and any scheduler sharing it
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Tear the pipeline down; later ticks are discarded
    pub fn dispose(&mut self) {
        if !self.cancel.is_cancelled() {
            log::info!("Disposing pose pipeline with {} recorded poses", self.history_len());
        }
        self.cancel.cancel();
        self.latest_pose = None;
    }
}
