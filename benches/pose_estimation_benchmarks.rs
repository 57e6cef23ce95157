//! Benchmarks for feature extraction, standardization and pose estimation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use head_pose_monitor::{
    features::{feature_len, FeatureExtractor, FeatureVector},
    landmarks::{BoundingBox, CoarseKeypoints, FrameSize, LandmarkSet},
    pose_estimation::{
        geometric::GeometricPoseEstimator,
        learned::{LearnedPoseEstimator, RegressionModel},
    },
    scaler::{FeatureStandardizer, ScalerParameters},
    Result,
};
use nalgebra::Point2;
use std::sync::Arc;

/// Landmarks on a circle, like a face outline
fn ring_landmarks(n: usize) -> LandmarkSet {
    let points = (0..n)
        .map(|i| {
            let angle = (i as f64) * 2.0 * std::f64::consts::PI / n as f64;
            Point2::new(320.0 + 100.0 * angle.cos(), 240.0 + 100.0 * angle.sin())
        })
        .collect();
    LandmarkSet::new(points)
}

fn scaler_for(n: usize) -> Arc<ScalerParameters> {
    let len = feature_len(n);
    let mean = (0..len).map(|k| (k % 17) as f64).collect();
    let scale = (0..len).map(|k| 1.0 + (k % 5) as f64).collect();
    Arc::new(ScalerParameters::new(mean, scale).expect("valid scaler"))
}

/// Linear stand-in for the regression model: three weighted sums
struct SumModel;

impl RegressionModel for SumModel {
    fn predict(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let values = features.as_array();
        let sum: f64 = values.sum();
        Ok(vec![sum * 1e-3, -sum * 1e-3, values[0]])
    }

    fn name(&self) -> &str {
        "sum"
    }
}

fn benchmark_feature_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_extraction");

    for n in [6, 21, 68] {
        let extractor = FeatureExtractor::new(n).expect("valid landmark count");
        let landmarks = ring_landmarks(n);
        group.bench_with_input(BenchmarkId::new("pairwise_distances", n), &landmarks, |b, landmarks| {
            b.iter(|| {
                let features = extractor.extract(black_box(landmarks)).expect("extraction failed");
                black_box(features);
            });
        });
    }

    let extractor = FeatureExtractor::new(68).expect("valid landmark count");
    let features = extractor.extract(&ring_landmarks(68)).expect("extraction failed");
    let standardizer = FeatureStandardizer::with_parameters(scaler_for(68));
    group.bench_function("standardize_2278", |b| {
        b.iter(|| {
            let standardized = standardizer.standardize(black_box(&features)).expect("standardize failed");
            black_box(standardized);
        });
    });

    group.finish();
}

fn benchmark_pose_estimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_estimation");

    let mut learned = LearnedPoseEstimator::new(FeatureExtractor::new(68).expect("valid landmark count"));
    learned
        .install_assets(Arc::new(SumModel), scaler_for(68))
        .expect("assets install");
    let landmarks = ring_landmarks(68);
    group.bench_function("learned_68_landmarks", |b| {
        b.iter(|| {
            let pose = learned.estimate(black_box(&landmarks), 0).expect("estimation failed");
            black_box(pose);
        });
    });

    let keypoints = CoarseKeypoints::from_slice(&[
        Point2::new(300.0, 220.0),
        Point2::new(340.0, 220.0),
        Point2::new(325.0, 240.0),
        Point2::new(320.0, 262.0),
        Point2::new(270.0, 230.0),
        Point2::new(370.0, 230.0),
    ])
    .expect("six keypoints");
    let bbox = BoundingBox::new(Point2::new(270.0, 190.0), Point2::new(370.0, 290.0));
    let frame = FrameSize::new(640.0, 480.0);
    let geometric = GeometricPoseEstimator::new();
    group.bench_function("geometric_keypoints", |b| {
        b.iter(|| {
            let pose = geometric
                .estimate(black_box(&keypoints), &bbox, &frame, 0)
                .expect("estimation failed");
            black_box(pose);
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_feature_extraction, benchmark_pose_estimation);
criterion_main!(benches);
