use std::path::PathBuf;

use rollcall_core::DEFAULT_MATCH_THRESHOLD;

/// Runtime configuration, loaded from environment variables. CLI flags
/// override individual fields after loading.
pub struct Config {
    /// Directory of reference images, one person per file.
    pub gallery_dir: PathBuf,
    /// Attendance record file, truncated at startup.
    pub ledger_path: PathBuf,
    /// V4L2 device path.
    pub camera_device: String,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Embedding distance at or below which a face is accepted.
    pub match_threshold: f32,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            gallery_dir: std::env::var("ROLLCALL_GALLERY_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("known_faces")),
            ledger_path: std::env::var("ROLLCALL_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("attendance.csv")),
            camera_device: std::env::var("ROLLCALL_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir: std::env::var("ROLLCALL_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            match_threshold: env_f32("ROLLCALL_MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD),
        }
    }

    /// Path to the face detection model.
    pub fn detect_model_path(&self) -> String {
        self.model_dir
            .join("det_500m.onnx")
            .to_string_lossy()
            .into_owned()
    }

    /// Path to the face embedding model.
    pub fn embed_model_path(&self) -> String {
        self.model_dir
            .join("w600k_r50.onnx")
            .to_string_lossy()
            .into_owned()
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
