//! Replay application: drives recorded detections through the pose pipeline.
//!
//! Detections are read from a JSON-lines file, one frame per line:
//!
//! ```text
//! {"timestamp_ms": 1000, "landmarks": [[x, y], ...]}
//! {"timestamp_ms": 1033, "keypoints": [[x, y], ...6], "bbox": [[x0, y0], [x1, y1]], "frame": [640, 480]}
//! {"timestamp_ms": 1066}
//! ```
//!
//! A line with neither `landmarks` nor `keypoints` is a frame without a face.

use crate::{
    assets::{load_classifier, FileAssetLoader},
    config::{Config, EstimatorMode},
    export::HistoryExporter,
    features::FeatureExtractor,
    landmarks::{BoundingBox, CoarseKeypoints, Detection, FrameSize, LandmarkSet},
    pipeline::{PipelineContext, TickOutcome},
    pose_estimation::{geometric::GeometricPoseEstimator, learned::LearnedPoseEstimator, PoseEstimator},
    scheduler::{Clock, ManualClock, SystemClock, TickControl, TickScheduler},
    Error, Result,
};
use log::{debug, info, warn};
use nalgebra::Point2;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Log a status line every this many ticks
const STATUS_INTERVAL: u64 = 30;

/// One recorded frame of detector output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameRecord {
    /// Capture time; the scheduler clock is used when absent
    pub timestamp_ms: Option<i64>,
    /// Fine-grained landmark set
    pub landmarks: Option<Vec<[f64; 2]>>,
    /// Six coarse keypoints
    pub keypoints: Option<Vec<[f64; 2]>>,
    /// Detection box as `[top_left, bottom_right]`
    pub bbox: Option<[[f64; 2]; 2]>,
    /// Frame size as `[width, height]`
    pub frame: Option<[f64; 2]>,
}

impl FrameRecord {
    /// Parse one JSON line
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a valid frame record
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Convert to a detection; `Ok(None)` means no face in this frame
    ///
    /// # Errors
    ///
    /// Returns an error if keypoints are present without a box or with the wrong count
    pub fn to_detection(&self, default_frame: FrameSize) -> Result<Option<Detection>> {
        let to_point = |p: &[f64; 2]| Point2::new(p[0], p[1]);

        if let Some(landmarks) = &self.landmarks {
            return Ok(Some(Detection::Landmarks(LandmarkSet::new(
                landmarks.iter().map(to_point).collect(),
            ))));
        }

        let Some(keypoints) = &self.keypoints else {
            return Ok(None);
        };
        let points: Vec<Point2<f64>> = keypoints.iter().map(to_point).collect();
        let keypoints = CoarseKeypoints::from_slice(&points)?;
        let [top_left, bottom_right] = self
            .bbox
            .ok_or_else(|| Error::InvalidInput("Keypoint frame has no bounding box".to_string()))?;
        let frame = self.frame.map_or(default_frame, |[w, h]| FrameSize::new(w, h));

        Ok(Some(Detection::Keypoints {
            keypoints,
            bbox: BoundingBox::new(to_point(&top_left), to_point(&bottom_right)),
            frame,
        }))
    }
}

/// Streams frame records from a JSON-lines file
pub struct ReplaySource {
    lines: Lines<BufReader<File>>,
    line_number: usize,
    finished: bool,
}

impl ReplaySource {
    /// Open a replay file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening replay file: {}", path.as_ref().display());
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_number: 0,
            finished: false,
        })
    }

    /// Next frame, or `None` at end of input
    ///
    /// Blank lines are skipped; malformed lines are reported as errors so the
    /// caller can treat them as missed frames. A read failure other than
    /// invalid UTF-8 ends the input after it is reported once.
    pub fn next_frame(&mut self) -> Option<Result<FrameRecord>> {
        if self.finished {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    if e.kind() != ErrorKind::InvalidData {
                        self.finished = true;
                    }
                    return Some(Err(e.into()));
                }
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(FrameRecord::parse(&line).map_err(|e| {
                Error::InvalidInput(format!("Line {}: {}", self.line_number, e))
            }));
        }
    }
}

/// Replay application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JSON-lines detection file
    pub input: PathBuf,
    /// Loaded or default configuration file contents
    pub settings: Config,
    /// Pace ticks with the wall clock instead of replaying as fast as possible
    pub realtime: bool,
    /// Skip writing the CSV file at the end
    pub no_export: bool,
}

/// Counters reported after a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub poses: u64,
    pub recorded: usize,
    pub missed: u64,
    pub skipped: u64,
    pub exported: Option<PathBuf>,
}

/// Build a pipeline from configuration, loading its assets
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the learned
/// strategy's assets fail to load
pub fn build_pipeline(settings: &Config) -> Result<PipelineContext> {
    settings.validate()?;

    let estimator: PoseEstimator = match settings.pipeline.estimator {
        EstimatorMode::Learned => {
            LearnedPoseEstimator::new(FeatureExtractor::new(settings.pipeline.num_landmarks)?).into()
        }
        EstimatorMode::Geometric => GeometricPoseEstimator::new().into(),
    };
    let mut pipeline = PipelineContext::new(estimator, settings.pipeline.record_threshold);

    if settings.pipeline.estimator == EstimatorMode::Learned {
        let loader = FileAssetLoader::new(&settings.assets.pose_model, &settings.assets.scaler);
        pipeline.load_assets(&loader)?;
    }

    if let Some(path) = &settings.assets.classifier {
        match load_classifier(path) {
            Ok(classifier) => pipeline = pipeline.with_classifier(classifier),
            Err(e) => warn!("Cheating classifier unavailable, continuing without scores: {}", e),
        }
    }

    Ok(pipeline)
}

/// Main application struct
pub struct HeadPoseApp {
    config: AppConfig,
    pipeline: PipelineContext,
    scheduler: TickScheduler,
    exporter: HistoryExporter,
    source: ReplaySource,
    default_frame: FrameSize,
}

impl HeadPoseApp {
    /// Create the application and load its assets
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened or the pipeline cannot be built
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing Head Pose Monitor");
        let pipeline = build_pipeline(&config.settings)?;
        Self::with_pipeline(config, pipeline)
    }

    /// Create the application around an already built pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened or the FPS is invalid
    pub fn with_pipeline(config: AppConfig, pipeline: PipelineContext) -> Result<Self> {
        let source = ReplaySource::open(&config.input)?;

        let clock: Arc<dyn Clock> = if config.realtime {
            Arc::new(SystemClock)
        } else {
            Arc::new(ManualClock::new(SystemClock.now_ms()))
        };
        let scheduler = TickScheduler::with_fps(clock, config.settings.scheduler.target_fps)?;
        let pipeline = pipeline.with_cancel_handle(scheduler.cancel_handle());

        let exporter = HistoryExporter::new(config.settings.export.schema);
        let default_frame = FrameSize::new(config.settings.pipeline.frame_width, config.settings.pipeline.frame_height);

        Ok(Self {
            config,
            pipeline,
            scheduler,
            exporter,
            source,
            default_frame,
        })
    }

    #[must_use]
    pub fn pipeline(&self) -> &PipelineContext {
        &self.pipeline
    }

    /// Replay every frame, then export the recorded history
    ///
    /// # Errors
    ///
    /// Returns an error if the export file cannot be written
    pub fn run(&mut self) -> Result<RunSummary> {
        info!(
            "Starting replay at {:.1} fps with the {} estimator",
            self.config.settings.scheduler.target_fps,
            self.pipeline.estimator_kind()
        );

        let mut summary = RunSummary::default();
        let pipeline = &mut self.pipeline;
        let source = &mut self.source;
        let default_frame = self.default_frame;

        let ticks = self.scheduler.run(|now_ms| {
            let Some(next) = source.next_frame() else {
                info!("End of replay input reached");
                return TickControl::Stop;
            };

            let (detection, timestamp) = match next {
                Ok(record) => {
                    let timestamp = record.timestamp_ms.unwrap_or(now_ms);
                    match record.to_detection(default_frame) {
                        Ok(detection) => (detection, timestamp),
                        Err(e) => {
                            warn!("Unusable frame at {}: {}", timestamp, e);
                            (None, timestamp)
                        }
                    }
                }
                Err(e) => {
                    warn!("Skipping frame: {}", e);
                    (None, now_ms)
                }
            };

            match pipeline.tick(detection.as_ref(), timestamp) {
                TickOutcome::Recorded(_) | TickOutcome::Unchanged(_) => summary.poses += 1,
                TickOutcome::NoDetection => summary.missed += 1,
                TickOutcome::NotReady | TickOutcome::Skipped(_) => summary.skipped += 1,
                TickOutcome::Discarded => return TickControl::Stop,
            }

            if summary.poses > 0 && summary.poses % STATUS_INTERVAL == 0 {
                if let Some(pose) = pipeline.latest_pose() {
                    let score = pipeline
                        .latest_score()
                        .map_or_else(|| "n/a".to_string(), |s| format!("{:.1}%", s.percent()));
                    debug!(
                        "Roll {:.2}°, Pitch {:.2}°, Yaw {:.2}° | cheating {} | {} recorded",
                        pose.roll,
                        pose.pitch,
                        pose.yaw,
                        score,
                        pipeline.history_len()
                    );
                }
            }
            TickControl::Continue
        });

        summary.ticks = ticks;
        summary.recorded = self.pipeline.history_len();
        info!(
            "Replay finished: {} ticks, {} poses, {} recorded, {} without face, {} skipped",
            summary.ticks, summary.poses, summary.recorded, summary.missed, summary.skipped
        );

        if !self.config.no_export {
            let history = self.pipeline.history_snapshot();
            let written = self
                .exporter
                .write_to_dir(&self.config.settings.export.directory, &history, chrono::Utc::now());
            match written {
                Ok(path) => summary.exported = Some(path),
                Err(Error::EmptyHistory) => warn!("Nothing to export: no poses were recorded"),
                Err(e) => {
                    self.pipeline.dispose();
                    return Err(e);
                }
            }
        }

        self.pipeline.dispose();
        Ok(summary)
    }
}
