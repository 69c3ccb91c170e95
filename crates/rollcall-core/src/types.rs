use serde::{Deserialize, Serialize};

use crate::gallery::Gallery;

/// Euclidean distance at or below which two embeddings count as the same
/// person. The usual operating point for 512-dim L2-normalized embeddings;
/// lower it to trade recall for precision.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

/// Where a face sits in the frame it was detected on.
///
/// Edges are in pixel coordinates of that frame, which is the downscaled
/// frame during live capture. Use [`scale`](Self::scale) to map back to the
/// full-resolution frame before drawing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceLocation {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
    pub confidence: f32,
}

impl FaceLocation {
    /// Map this location into the coordinate space of a frame `factor` times
    /// larger on each axis (the inverse of detection downscaling).
    pub fn scale(&self, factor: f32) -> FaceLocation {
        FaceLocation {
            top: self.top * factor,
            right: self.right * factor,
            bottom: self.bottom * factor,
            left: self.left * factor,
            confidence: self.confidence,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

/// Face embedding vector (512-dimensional for the bundled embedder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    /// Euclidean distance to another embedding. Lower = more similar.
    pub fn distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Whether `other` is close enough to count as the same person.
    pub fn is_match(&self, other: &Embedding, threshold: f32) -> bool {
        self.distance(other) <= threshold
    }
}

/// Result of matching one probe embedding against the gallery.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Accepted identity, if any. Case-sensitive gallery key.
    pub name: Option<String>,
    /// Distance to the closest gallery entry, matched or not.
    pub distance: f32,
}

/// Strategy for resolving a probe embedding to a known identity.
pub trait Matcher {
    fn match_probe(&self, probe: &Embedding, gallery: &Gallery, threshold: f32) -> MatchResult;
}

/// Nearest-neighbor matcher over the whole gallery.
///
/// Computes an accept flag for every entry plus the arg-min of the distance
/// list, and accepts only when the flag at the arg-min index is set. Ties in
/// minimum distance resolve to the lowest index.
pub struct NearestMatcher;

impl Matcher for NearestMatcher {
    fn match_probe(&self, probe: &Embedding, gallery: &Gallery, threshold: f32) -> MatchResult {
        let faces = gallery.faces();

        let flags: Vec<bool> = faces
            .iter()
            .map(|f| probe.is_match(&f.embedding, threshold))
            .collect();

        let mut best_idx = 0usize;
        let mut best_dist = f32::INFINITY;
        for (i, face) in faces.iter().enumerate() {
            let dist = probe.distance(&face.embedding);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }

        if flags[best_idx] {
            MatchResult {
                name: Some(faces[best_idx].name.clone()),
                distance: best_dist,
            }
        } else {
            MatchResult {
                name: None,
                distance: best_dist,
            }
        }
    }
}
