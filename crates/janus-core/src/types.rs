use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Externally supplied identifier grouping enrolled signatures under one subject.
///
/// Not checked for uniqueness; the same id may receive signatures across
/// many enroll calls.
pub type SubjectId = i64;

/// Engine-internal disambiguator for a stored face. Meaningless outside the engine.
pub type FaceId = u64;

/// Score reported by verification when either template has no usable signature.
pub const REJECTION_SCORE: f32 = -1.5;

/// Outcome of comparing two subjects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Similarity {
    /// No signature pair was available to compare.
    NoComparison,
    /// Higher = more similar.
    Score(f32),
}

impl Similarity {
    /// Wrap a raw engine score, folding NaN into [`Similarity::NoComparison`].
    pub fn from_raw(score: f32) -> Self {
        if score.is_nan() {
            Similarity::NoComparison
        } else {
            Similarity::Score(score)
        }
    }

    /// Fold a NaN `Score` from an engine into [`Similarity::NoComparison`].
    pub fn sanitized(self) -> Self {
        match self {
            Similarity::Score(s) => Similarity::from_raw(s),
            Similarity::NoComparison => Similarity::NoComparison,
        }
    }

    pub fn score(&self) -> Option<f32> {
        match *self {
            Similarity::Score(s) => Some(s),
            Similarity::NoComparison => None,
        }
    }

    /// Descending rank order: larger scores first, `NoComparison` after every score.
    pub fn rank_cmp(&self, other: &Similarity) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Similarity::Score(a), Similarity::Score(b)) => b.total_cmp(a),
            (Similarity::Score(_), Similarity::NoComparison) => Ordering::Less,
            (Similarity::NoComparison, Similarity::Score(_)) => Ordering::Greater,
            (Similarity::NoComparison, Similarity::NoComparison) => Ordering::Equal,
        }
    }
}

/// Region of a detected face, with optional facial landmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl FaceRegion {
    /// Length of the shorter side in pixels.
    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// Extracted biometric signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub values: Vec<f32>,
}

impl Signature {
    /// Build a signature, L2-normalizing the vector.
    ///
    /// Non-finite components, or a norm that overflows, are rejected: they
    /// cannot be written to a record set blob and read back.
    pub fn normalized(raw: Vec<f32>) -> Result<Self, EngineError> {
        if raw.iter().any(|x| !x.is_finite()) {
            return Err(EngineError::Analyzer("non-finite signature value".into()));
        }
        let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        if !norm.is_finite() {
            return Err(EngineError::Analyzer("signature norm overflows".into()));
        }
        let values = if norm > 0.0 {
            raw.iter().map(|x| x / norm).collect()
        } else {
            raw
        };
        Ok(Self { values })
    }

    /// Cosine similarity in [-1, 1], or `None` when the dimensions differ.
    ///
    /// Zero vectors score 0.0.
    pub fn similarity(&self, other: &Signature) -> Option<f32> {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return None;
        }

        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        Some(if denom > 0.0 { dot / denom } else { 0.0 })
    }
}
