//! Detector output types consumed by the pose pipeline.

use crate::{constants::NUM_COARSE_KEYPOINTS, Error, Result};
use nalgebra::Point2;

/// Ordered set of 2-D facial landmarks from a single detection
///
/// Position `i` always refers to the same anatomical landmark, so the order
/// must be preserved from the detector to the feature extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point2<f64>>,
}

impl LandmarkSet {
    /// Wrap detector points without changing their order
    #[must_use]
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    /// Build a landmark set from `(x, y)` tuples
    #[must_use]
    pub fn from_tuples(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    /// Number of landmarks
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set holds no landmarks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmarks in detector order
    #[must_use]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }
}

/// The six keypoints of the coarse face detector, in detector order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseKeypoints {
    pub right_eye: Point2<f64>,
    pub left_eye: Point2<f64>,
    pub nose: Point2<f64>,
    pub mouth: Point2<f64>,
    pub right_ear: Point2<f64>,
    pub left_ear: Point2<f64>,
}

impl CoarseKeypoints {
    /// Build keypoints from an ordered slice
    /// `[rightEye, leftEye, nose, mouth, rightEar, leftEar]`
    ///
    /// # Errors
    ///
    /// Returns an error if the slice does not hold exactly six points
    pub fn from_slice(points: &[Point2<f64>]) -> Result<Self> {
        match points {
            &[right_eye, left_eye, nose, mouth, right_ear, left_ear] => Ok(Self {
                right_eye,
                left_eye,
                nose,
                mouth,
                right_ear,
                left_ear,
            }),
            _ => Err(Error::InvalidInput(format!(
                "Expected {} keypoints, got {}",
                NUM_COARSE_KEYPOINTS,
                points.len()
            ))),
        }
    }

    /// Midpoint between the two eyes
    #[must_use]
    pub fn eye_center(&self) -> Point2<f64> {
        nalgebra::center(&self.right_eye, &self.left_eye)
    }
}

/// Axis-aligned detection box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top_left: Point2<f64>,
    pub bottom_right: Point2<f64>,
}

impl BoundingBox {
    #[must_use]
    pub fn new(top_left: Point2<f64>, bottom_right: Point2<f64>) -> Self {
        Self { top_left, bottom_right }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.bottom_right.x - self.top_left.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom_right.y - self.top_left.y
    }

    #[must_use]
    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.top_left, &self.bottom_right)
    }

    /// A box with no usable area cannot anchor the geometric ratios
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let (w, h) = (self.width(), self.height());
        !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
    }
}

/// Dimensions of the frame the detection came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl FrameSize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// One detector result for a frame
///
/// Frames without a face are represented as `None` by callers, not as a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// Full landmark set, routed to the learned estimator
    Landmarks(LandmarkSet),
    /// Coarse keypoints with their box, routed to the geometric estimator
    Keypoints {
        keypoints: CoarseKeypoints,
        bbox: BoundingBox,
        frame: FrameSize,
    },
}
