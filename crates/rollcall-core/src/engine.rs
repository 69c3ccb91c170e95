//! Capability interface over face detection and embedding.
//!
//! The gallery builder and the capture loop only see [`FaceEngine`]; the
//! ONNX-backed [`OnnxFaceEngine`] is the production implementation.

use thiserror::Error;

use crate::detector::{DetectorError, FaceDetector};
use crate::embedder::{EmbedderError, FaceEmbedder};
use crate::types::{Embedding, FaceLocation};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("embedder error: {0}")]
    Embedder(#[from] EmbedderError),
}

/// A face found in a frame, not yet identified.
#[derive(Debug, Clone)]
pub struct ProbeFace {
    pub location: FaceLocation,
    pub embedding: Embedding,
}

/// Detection + embedding collaborator.
///
/// Implementations return every face found in the RGB24 frame, best first.
/// A frame with no faces is an empty list, never an error.
pub trait FaceEngine {
    fn probe_faces(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<ProbeFace>, EngineError>;
}

/// Production engine: ONNX face detector feeding an ONNX embedder.
pub struct OnnxFaceEngine {
    detector: FaceDetector,
    embedder: FaceEmbedder,
}

impl OnnxFaceEngine {
    /// Load both models. Fails fast if either file is missing.
    pub fn load(detect_model: &str, embed_model: &str) -> Result<Self, EngineError> {
        let detector = FaceDetector::load(detect_model)?;
        let embedder = FaceEmbedder::load(embed_model)?;
        Ok(Self { detector, embedder })
    }
}

impl FaceEngine for OnnxFaceEngine {
    fn probe_faces(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<ProbeFace>, EngineError> {
        let locations = self.detector.detect(rgb, width, height)?;
        let mut probes = Vec::with_capacity(locations.len());
        for location in locations {
            let embedding = self.embedder.extract(rgb, width, height, &location)?;
            probes.push(ProbeFace {
                location,
                embedding,
            });
        }
        Ok(probes)
    }
}
