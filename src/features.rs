//! Pairwise-distance feature extraction from facial landmarks.
//!
//! Feature `k` is the Euclidean distance between the landmark pair `(i, j)`
//! at canonical index `k`, where pairs are enumerated with `i < j`, `i` as the
//! outer loop and `j` as the inner loop, both ascending. The scaler parameters
//! and the regression model were fit against this exact ordering.

use crate::{landmarks::LandmarkSet, Error, Result};
use ndarray::Array1;

/// Fixed-length vector of pairwise landmark distances
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(pub Array1<f64>);

impl FeatureVector {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_array(&self) -> &Array1<f64> {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(Array1::from(values))
    }
}

/// Number of features produced from `n` landmarks
#[must_use]
pub const fn feature_len(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

/// Canonical feature index of the pair `(i, j)` among `n` landmarks
///
/// Returns `None` unless `i < j < n`.
#[must_use]
pub fn pair_index(i: usize, j: usize, n: usize) -> Option<usize> {
    if i >= j || j >= n {
        return None;
    }
    // Pairs before row i: (n-1) + (n-2) + ... + (n-i)
    let row_start = i * (2 * n - i - 1) / 2;
    Some(row_start + (j - i - 1))
}

/// Landmark pair `(i, j)` stored at canonical feature index `k`
#[must_use]
pub fn pair_at(k: usize, n: usize) -> Option<(usize, usize)> {
    let mut remaining = k;
    for i in 0..n.saturating_sub(1) {
        let row_len = n - i - 1;
        if remaining < row_len {
            return Some((i, i + 1 + remaining));
        }
        remaining -= row_len;
    }
    None
}

/// Converts landmark sets of a fixed size into pairwise-distance features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureExtractor {
    num_landmarks: usize,
}

impl FeatureExtractor {
    /// Create an extractor for detectors producing `num_landmarks` points
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two landmarks are requested
    pub fn new(num_landmarks: usize) -> Result<Self> {
        if num_landmarks < 2 {
            return Err(Error::InvalidInput(format!(
                "At least 2 landmarks are required for pairwise features, got {num_landmarks}"
            )));
        }
        Ok(Self { num_landmarks })
    }

    #[must_use]
    pub fn num_landmarks(&self) -> usize {
        self.num_landmarks
    }

    /// Length of every feature vector this extractor produces
    #[must_use]
    pub fn output_len(&self) -> usize {
        feature_len(self.num_landmarks)
    }

    /// Compute the pairwise-distance feature vector
    ///
    /// # Errors
    ///
    /// Returns an error if the landmark count differs from the configured one
    pub fn extract(&self, landmarks: &LandmarkSet) -> Result<FeatureVector> {
        if landmarks.len() != self.num_landmarks {
            return Err(Error::InvalidInput(format!(
                "Expected {} landmarks, got {}",
                self.num_landmarks,
                landmarks.len()
            )));
        }

        let points = landmarks.points();
        let mut distances = Vec::with_capacity(self.output_len());
        for (i, p) in points.iter().enumerate() {
            for q in &points[i + 1..] {
                distances.push(nalgebra::distance(p, q));
            }
        }

        Ok(FeatureVector::from(distances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_square() -> LandmarkSet {
        LandmarkSet::from_tuples(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)])
    }

    #[test]
    fn test_unit_square_features() {
        let extractor = FeatureExtractor::new(4).unwrap();
        let features = extractor.extract(&unit_square()).unwrap();

        let sqrt2 = std::f64::consts::SQRT_2;
        let expected = [1.0, 1.0, sqrt2, sqrt2, 1.0, 1.0];
        assert_eq!(features.len(), 6);
        for (got, want) in features.to_vec().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_swapping_points_moves_distances() {
        // Swap points 0 and 3 of a non-symmetric quad and check pairs follow the map
        let original = [(0.0, 0.0), (3.0, 0.0), (0.0, 4.0), (2.0, 7.0)];
        let swapped = [(2.0, 7.0), (3.0, 0.0), (0.0, 4.0), (0.0, 0.0)];
        let extractor = FeatureExtractor::new(4).unwrap();
        let a = extractor.extract(&LandmarkSet::from_tuples(&original)).unwrap().to_vec();
        let b = extractor.extract(&LandmarkSet::from_tuples(&swapped)).unwrap().to_vec();

        let perm = |idx: usize| match idx {
            0 => 3,
            3 => 0,
            other => other,
        };
        for k in 0..6 {
            let (i, j) = pair_at(k, 4).unwrap();
            let (pi, pj) = (perm(i).min(perm(j)), perm(i).max(perm(j)));
            let k_swapped = pair_index(pi, pj, 4).unwrap();
            assert!((a[k] - b[k_swapped]).abs() < 1e-12);
        }

        // (0,1) in the original is 3.0; after the swap it lives at pair (1,3)
        assert!((a[0] - 3.0).abs() < 1e-12);
        assert!((b[pair_index(1, 3, 4).unwrap()] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_landmark_count() {
        let extractor = FeatureExtractor::new(68).unwrap();
        let result = extractor.extract(&unit_square());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_extractor_requires_two_points() {
        assert!(FeatureExtractor::new(1).is_err());
        assert!(FeatureExtractor::new(0).is_err());
        assert_eq!(FeatureExtractor::new(68).unwrap().output_len(), 2278);
    }

    #[test]
    fn test_pair_index_canonical_order() {
        let order = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
        for (k, &(i, j)) in order.iter().enumerate() {
            assert_eq!(pair_index(i, j, 4), Some(k));
            assert_eq!(pair_at(k, 4), Some((i, j)));
        }
        assert_eq!(pair_index(2, 1, 4), None);
        assert_eq!(pair_index(1, 4, 4), None);
        assert_eq!(pair_at(6, 4), None);
    }

    proptest! {
        #[test]
        fn prop_feature_length(n in 2usize..40, seed in 0.0f64..100.0) {
            let points: Vec<(f64, f64)> = (0..n)
                .map(|i| (seed + i as f64 * 1.5, (i as f64 * 0.7).sin() * seed))
                .collect();
            let extractor = FeatureExtractor::new(n).unwrap();
            let features = extractor.extract(&LandmarkSet::from_tuples(&points)).unwrap();
            prop_assert_eq!(features.len(), n * (n - 1) / 2);
            prop_assert!(features.as_array().iter().all(|d| *d >= 0.0 && d.is_finite()));
        }

        #[test]
        fn prop_pair_index_roundtrip(n in 2usize..80, k_frac in 0.0f64..1.0) {
            let len = feature_len(n);
            let k = ((len as f64 - 1.0) * k_frac) as usize;
            let (i, j) = pair_at(k, n).unwrap();
            prop_assert_eq!(pair_index(i, j, n), Some(k));
        }
    }
}
