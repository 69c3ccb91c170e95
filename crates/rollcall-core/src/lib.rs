//! rollcall-core — known-face gallery, matching, and attendance bookkeeping.
//!
//! Detection and embedding run behind the [`FaceEngine`] capability trait;
//! the bundled implementation uses ONNX Runtime for CPU inference.

pub mod detector;
pub mod embedder;
pub mod engine;
pub mod gallery;
pub mod ledger;
mod sampling;
pub mod types;

pub use engine::{EngineError, FaceEngine, OnnxFaceEngine, ProbeFace};
pub use gallery::{Gallery, GalleryError, KnownFace};
pub use ledger::{AttendanceLedger, LedgerError};
pub use types::{Embedding, FaceLocation, MatchResult, Matcher, NearestMatcher, DEFAULT_MATCH_THRESHOLD};
