//! ONNX face embedder via ONNX Runtime.
//!
//! Crops the detected face with a small margin, resizes the RGB crop to
//! 112x112, and produces an L2-normalized 512-dim embedding.

use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

use crate::sampling;
use crate::types::{Embedding, FaceLocation};

const EMBED_INPUT_SIZE: usize = 112;
const EMBED_MEAN: f32 = 127.5;
const EMBED_STD: f32 = 127.5; // symmetric normalization, not 128.0
const EMBED_DIM: usize = 512;
const EMBED_MODEL_VERSION: &str = "w600k_r50";
/// Fraction of the box size added on each side before cropping. Detection
/// boxes hug the face; the embedder was trained on slightly looser crops.
const CROP_MARGIN: f32 = 0.125;

#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("model file not found: {0} — download a w600k-class embedder and place it in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

pub struct FaceEmbedder {
    session: Session,
}

impl FaceEmbedder {
    /// Load the embedding ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, EmbedderError> {
        if !Path::new(model_path).exists() {
            return Err(EmbedderError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(path = model_path, "loaded face embedding model");
        Ok(Self { session })
    }

    /// Extract an embedding for one detected face in an RGB24 frame.
    pub fn extract(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
        face: &FaceLocation,
    ) -> Result<Embedding, EmbedderError> {
        let input = preprocess(rgb, width as usize, height as usize, face);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("embedding extraction: {e}")))?;
        let raw: Vec<f32> = raw_data.to_vec();

        if raw.len() != EMBED_DIM {
            return Err(EmbedderError::InferenceFailed(format!(
                "expected {EMBED_DIM}-dim embedding, got {}",
                raw.len()
            )));
        }

        Ok(Embedding {
            values: l2_normalize(raw),
            model_version: Some(EMBED_MODEL_VERSION.to_string()),
        })
    }
}

fn l2_normalize(raw: Vec<f32>) -> Vec<f32> {
    let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        raw.iter().map(|x| x / norm).collect()
    } else {
        raw
    }
}

/// Crop the face box (expanded by [`CROP_MARGIN`]) and bilinear-resize it to
/// a normalized NCHW tensor.
fn preprocess(rgb: &[u8], width: usize, height: usize, face: &FaceLocation) -> Array4<f32> {
    let margin_x = face.width() * CROP_MARGIN;
    let margin_y = face.height() * CROP_MARGIN;
    let left = face.left - margin_x;
    let top = face.top - margin_y;
    let crop_w = (face.width() + 2.0 * margin_x).max(1.0);
    let crop_h = (face.height() + 2.0 * margin_y).max(1.0);

    let size = EMBED_INPUT_SIZE;
    let step_x = crop_w / size as f32;
    let step_y = crop_h / size as f32;

    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        let src_y = top + (y as f32 + 0.5) * step_y - 0.5;
        for x in 0..size {
            let src_x = left + (x as f32 + 0.5) * step_x - 0.5;
            for c in 0..3 {
                let pixel = sampling::bilinear(rgb, width, height, c, src_x, src_y);
                tensor[[0, c, y, x]] = (pixel - EMBED_MEAN) / EMBED_STD;
            }
        }
    }

    tensor
}
