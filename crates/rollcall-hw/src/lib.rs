//! rollcall-hw — webcam capture for the attendance loop.
//!
//! Provides V4L2-based color capture and the RGB frame plumbing the rest of
//! the pipeline runs on.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo};
pub use frame::{downscale, Frame, FrameError};
