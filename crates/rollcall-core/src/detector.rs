//! Anchor-free ONNX face detector (SCRFD family) via ONNX Runtime.
//!
//! Decodes score/bbox heads at three strides and suppresses overlaps with
//! NMS. Results are sorted by descending confidence, so the first location
//! is always the best face in the frame.

use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

use crate::sampling;
use crate::types::FaceLocation;

const DETECT_INPUT_SIZE: usize = 320;
const DETECT_MEAN: f32 = 127.5;
const DETECT_STD: f32 = 128.0;
const DETECT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DETECT_NMS_THRESHOLD: f32 = 0.4;
const DETECT_STRIDES: [usize; 3] = [8, 16, 32];
const DETECT_ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download a 500m-class detector and place it in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Metadata for mapping letterboxed coordinates back to the frame.
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Output tensor indices for one stride: (score_idx, bbox_idx).
type StrideOutputIndices = (usize, usize);

pub struct FaceDetector {
    session: Session,
    /// Per-stride output indices [(score, bbox)] for strides [8, 16, 32].
    stride_indices: [StrideOutputIndices; 3],
}

impl FaceDetector {
    /// Load the detection ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            "loaded face detection model"
        );

        if output_names.len() < 6 {
            return Err(DetectorError::InferenceFailed(format!(
                "detector needs 6 outputs (3 strides x score/bbox), got {}",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::debug!(?stride_indices, "detector output tensor mapping");

        Ok(Self {
            session,
            stride_indices,
        })
    }

    /// Detect faces in an RGB24 frame, best first.
    pub fn detect(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceLocation>, DetectorError> {
        let (input, letterbox) = preprocess(rgb, width as usize, height as usize);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut candidates = Vec::new();
        for (stride_pos, &stride) in DETECT_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx) = self.stride_indices[stride_pos];

            let (_, scores) = outputs[score_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("scores stride {stride}: {e}")))?;
            let (_, bboxes) = outputs[bbox_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("bboxes stride {stride}: {e}")))?;

            candidates.extend(decode_stride(
                scores,
                bboxes,
                stride,
                &letterbox,
                DETECT_CONFIDENCE_THRESHOLD,
            ));
        }

        let mut result = nms(candidates, DETECT_NMS_THRESHOLD);
        result.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(result)
    }
}

/// Letterbox an RGB24 frame into a NCHW float tensor in one pass: each
/// tensor cell bilinear-samples the source directly, pad cells take the
/// mean value so they normalize to zero.
fn preprocess(rgb: &[u8], width: usize, height: usize) -> (Array4<f32>, Letterbox) {
    let size = DETECT_INPUT_SIZE;
    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let new_w = (width as f32 * scale).round() as usize;
    let new_h = (height as f32 * scale).round() as usize;
    let pad_x = (size - new_w) as f32 / 2.0;
    let pad_y = (size - new_h) as f32 / 2.0;
    let inv_scale = 1.0 / scale;

    let pad_x_start = pad_x.floor() as usize;
    let pad_y_start = pad_y.floor() as usize;

    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        for x in 0..size {
            let inside = y >= pad_y_start
                && y < pad_y_start + new_h
                && x >= pad_x_start
                && x < pad_x_start + new_w;
            for c in 0..3 {
                let pixel = if inside {
                    let src_x = ((x - pad_x_start) as f32 + 0.5) * inv_scale - 0.5;
                    let src_y = ((y - pad_y_start) as f32 + 0.5) * inv_scale - 0.5;
                    sampling::bilinear(rgb, width, height, c, src_x, src_y)
                } else {
                    DETECT_MEAN
                };
                tensor[[0, c, y, x]] = (pixel - DETECT_MEAN) / DETECT_STD;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

/// Discover output tensor ordering by name ("score_8", "bbox_16", ...);
/// fall back to positional [0-2]=scores, [3-5]=bboxes when names are
/// generic.
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let named = DETECT_STRIDES
        .iter()
        .all(|&stride| find("score", stride).is_some() && find("bbox", stride).is_some());

    if named {
        tracing::info!("detector: using name-based output tensor mapping");
        std::array::from_fn(|i| {
            let stride = DETECT_STRIDES[i];
            (find("score", stride).unwrap(), find("bbox", stride).unwrap())
        })
    } else {
        tracing::info!(
            ?names,
            "detector: output names not recognized, using positional mapping"
        );
        [(0, 3), (1, 4), (2, 5)]
    }
}

/// Decode one stride level into frame-space face locations.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    stride: usize,
    letterbox: &Letterbox,
    threshold: f32,
) -> Vec<FaceLocation> {
    let grid = DETECT_INPUT_SIZE / stride;
    let num_anchors = grid * grid * DETECT_ANCHORS_PER_CELL;

    let mut detections = Vec::new();
    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let cell = idx / DETECT_ANCHORS_PER_CELL;
        let anchor_cx = (cell % grid) as f32 * stride as f32;
        let anchor_cy = (cell / grid) as f32 * stride as f32;

        let off = idx * 4;
        if off + 3 >= bboxes.len() {
            continue;
        }
        let x1 = anchor_cx - bboxes[off] * stride as f32;
        let y1 = anchor_cy - bboxes[off + 1] * stride as f32;
        let x2 = anchor_cx + bboxes[off + 2] * stride as f32;
        let y2 = anchor_cy + bboxes[off + 3] * stride as f32;

        detections.push(FaceLocation {
            top: (y1 - letterbox.pad_y) / letterbox.scale,
            right: (x2 - letterbox.pad_x) / letterbox.scale,
            bottom: (y2 - letterbox.pad_y) / letterbox.scale,
            left: (x1 - letterbox.pad_x) / letterbox.scale,
            confidence: score,
        });
    }

    detections
}

/// Non-Maximum Suppression over face locations.
fn nms(mut detections: Vec<FaceLocation>, iou_threshold: f32) -> Vec<FaceLocation> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(detections[i].clone());
        for j in (i + 1)..detections.len() {
            if !suppressed[j] && iou(&detections[i], &detections[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Intersection-over-Union of two face locations.
fn iou(a: &FaceLocation, b: &FaceLocation) -> f32 {
    let left = a.left.max(b.left);
    let top = a.top.max(b.top);
    let right = a.right.min(b.right);
    let bottom = a.bottom.min(b.bottom);

    let inter = (right - left).max(0.0) * (bottom - top).max(0.0);
    let union = a.width() * a.height() + b.width() * b.height() - inter;

    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}
