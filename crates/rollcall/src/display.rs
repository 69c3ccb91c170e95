//! Live preview window.

use minifb::{Key, Window, WindowOptions};
use rollcall_hw::Frame;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("window: {0}")]
    Window(String),
}

/// Rendering surface for the annotated feed, with a polled stop signal.
pub trait Display {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;
    fn stop_requested(&self) -> bool;
}

/// On-screen window backed by `minifb`. Stop = window closed or Q pressed.
pub struct WindowDisplay {
    window: Window,
    buffer: Vec<u32>,
}

impl WindowDisplay {
    pub fn open(title: &str, width: usize, height: usize) -> Result<Self, DisplayError> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| DisplayError::Window(e.to_string()))?;
        window.set_target_fps(60);

        Ok(Self {
            window,
            buffer: vec![0; width * height],
        })
    }
}

impl Display for WindowDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let pixels = (frame.width * frame.height) as usize;
        self.buffer.resize(pixels, 0);

        // RGB24 -> 0RGB
        for (slot, px) in self.buffer.iter_mut().zip(frame.data.chunks_exact(3)) {
            *slot = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
        }

        self.window
            .update_with_buffer(&self.buffer, frame.width as usize, frame.height as usize)
            .map_err(|e| DisplayError::Window(e.to_string()))
    }

    fn stop_requested(&self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Q)
    }
}
