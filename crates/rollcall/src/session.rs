//! The capture/detect/match/annotate/record loop.
//!
//! One thread, strictly sequential per frame: acquire, downscale, detect,
//! match, annotate, record, render, poll for stop. Any iteration failure
//! ends the run; there is no per-frame retry.

use thiserror::Error;

use rollcall_core::{
    AttendanceLedger, EngineError, FaceEngine, Gallery, LedgerError, Matcher,
};
use rollcall_hw::{frame, CameraError, Frame};

use crate::annotate;
use crate::display::{Display, DisplayError};
use crate::notifier::Notifier;

/// Fixed per-axis reduction applied before detection to bound its cost.
/// Locations are scaled back up by the same factor for annotation.
pub const DETECT_DOWNSCALE: u32 = 4;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("frame acquisition failed: {0}")]
    Frame(#[from] CameraError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Source of live frames. Lets tests drive the loop without hardware.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError>;
}

impl FrameSource for rollcall_hw::Camera {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        self.capture_frame()
    }
}

/// One attendance run: all collaborators wired together.
pub struct Session<'a> {
    pub source: &'a mut dyn FrameSource,
    pub engine: &'a mut dyn FaceEngine,
    pub matcher: &'a dyn Matcher,
    pub gallery: &'a Gallery,
    pub ledger: &'a AttendanceLedger,
    pub notifier: &'a dyn Notifier,
    pub display: &'a mut dyn Display,
    pub match_threshold: f32,
}

impl Session<'_> {
    /// Run until the user asks to stop or an iteration fails.
    ///
    /// The stop signal is polled once per iteration, after rendering; an
    /// iteration always finishes its detection and recording first.
    pub fn run(&mut self) -> Result<(), SessionError> {
        loop {
            let mut frame = self.source.next_frame()?;
            let small = frame::downscale(&frame, DETECT_DOWNSCALE);
            let probes = self.engine.probe_faces(&small.data, small.width, small.height)?;

            for probe in &probes {
                let result =
                    self.matcher
                        .match_probe(&probe.embedding, self.gallery, self.match_threshold);
                let Some(name) = result.name else {
                    continue;
                };

                let label = name.to_uppercase();
                let location = probe.location.scale(DETECT_DOWNSCALE as f32);
                annotate::draw_match(&mut frame, &location, &label);
                tracing::debug!(name = %label, distance = result.distance, "match accepted");

                if self.ledger.record_if_absent(&label)? {
                    self.notifier
                        .info("Attendance Marked", &format!("Attendance marked for {label}."));
                }
            }

            self.display.show(&frame)?;
            if self.display.stop_requested() {
                tracing::info!("stop requested, ending session");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::{Embedding, FaceLocation, KnownFace, NearestMatcher, ProbeFace};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct VecSource {
        frames: VecDeque<Frame>,
    }

    impl VecSource {
        fn with_blank_frames(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| Frame {
                    data: vec![0; 640 * 480 * 3],
                    width: 640,
                    height: 480,
                    sequence: i as u32,
                })
                .collect();
            Self { frames }
        }
    }

    impl FrameSource for VecSource {
        fn next_frame(&mut self) -> Result<Frame, CameraError> {
            self.frames
                .pop_front()
                .ok_or_else(|| CameraError::CaptureFailed("no more frames".into()))
        }
    }

    /// Returns the same probes for every frame.
    struct StubEngine {
        probes: Vec<ProbeFace>,
    }

    impl FaceEngine for StubEngine {
        fn probe_faces(
            &mut self,
            _rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<ProbeFace>, EngineError> {
            Ok(self.probes.clone())
        }
    }

    /// Records every shown frame, stops the loop once the source is drained.
    struct RecordingDisplay {
        shown: Vec<Frame>,
        stop_after: usize,
    }

    impl Display for RecordingDisplay {
        fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
            self.shown.push(frame.clone());
            Ok(())
        }

        fn stop_requested(&self) -> bool {
            self.shown.len() >= self.stop_after
        }
    }

    #[derive(Default)]
    struct MemNotifier {
        messages: RefCell<Vec<String>>,
    }

    impl Notifier for MemNotifier {
        fn alert(&self, _title: &str, message: &str) {
            self.messages.borrow_mut().push(format!("alert: {message}"));
        }

        fn info(&self, _title: &str, message: &str) {
            self.messages.borrow_mut().push(format!("info: {message}"));
        }
    }

    fn emb(values: &[f32]) -> Embedding {
        Embedding {
            values: values.to_vec(),
            model_version: None,
        }
    }

    fn alice_gallery() -> Gallery {
        Gallery::from_faces(vec![KnownFace {
            name: "alice".to_string(),
            embedding: emb(&[1.0, 0.0]),
        }])
        .unwrap()
    }

    fn probe_at(values: &[f32]) -> ProbeFace {
        ProbeFace {
            location: FaceLocation {
                top: 20.0,
                right: 60.0,
                bottom: 80.0,
                left: 30.0,
                confidence: 0.95,
            },
            embedding: emb(values),
        }
    }

    struct Harness {
        source: VecSource,
        engine: StubEngine,
        gallery: Gallery,
        ledger: AttendanceLedger,
        notifier: MemNotifier,
        display: RecordingDisplay,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(frames: usize, probes: Vec<ProbeFace>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let ledger = AttendanceLedger::new(dir.path().join("attendance.csv"));
            ledger.reset().unwrap();
            Self {
                source: VecSource::with_blank_frames(frames),
                engine: StubEngine { probes },
                gallery: alice_gallery(),
                ledger,
                notifier: MemNotifier::default(),
                display: RecordingDisplay {
                    shown: vec![],
                    stop_after: frames,
                },
                _dir: dir,
            }
        }

        fn run(&mut self) -> Result<(), SessionError> {
            Session {
                source: &mut self.source,
                engine: &mut self.engine,
                matcher: &NearestMatcher,
                gallery: &self.gallery,
                ledger: &self.ledger,
                notifier: &self.notifier,
                display: &mut self.display,
                match_threshold: 0.6,
            }
            .run()
        }

        fn ledger_contents(&self) -> String {
            std::fs::read_to_string(self.ledger.path()).unwrap()
        }
    }

    #[test]
    fn test_happy_path_records_and_annotates() {
        let mut h = Harness::new(1, vec![probe_at(&[1.0, 0.0])]);
        h.run().unwrap();

        let contents = h.ledger_contents();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("Name,Time"));
        assert!(lines.next().unwrap().starts_with("ALICE,"));

        assert_eq!(h.notifier.messages.borrow().len(), 1);
        assert!(h.notifier.messages.borrow()[0].contains("ALICE"));

        // The rendered frame carries the annotation (blank input, so any
        // non-black pixel came from drawing).
        assert_eq!(h.display.shown.len(), 1);
        assert!(h.display.shown[0].data.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_no_match_writes_nothing() {
        let mut h = Harness::new(1, vec![probe_at(&[-1.0, 0.0])]);
        h.run().unwrap();

        assert_eq!(h.ledger_contents(), "Name,Time\n");
        assert!(h.notifier.messages.borrow().is_empty());
        // No annotation either: the frame went out untouched.
        assert!(h.display.shown[0].data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_repeat_sightings_record_once_but_annotate_every_frame() {
        let mut h = Harness::new(3, vec![probe_at(&[1.0, 0.0])]);
        h.run().unwrap();

        let contents = h.ledger_contents();
        assert_eq!(contents.matches("ALICE").count(), 1);
        // One notification, on the first sighting only.
        assert_eq!(h.notifier.messages.borrow().len(), 1);
        // Every rendered frame still shows the box.
        assert_eq!(h.display.shown.len(), 3);
        assert!(h
            .display
            .shown
            .iter()
            .all(|f| f.data.iter().any(|&b| b != 0)));
    }

    #[test]
    fn test_faceless_frames_render_clean() {
        let mut h = Harness::new(2, vec![]);
        h.run().unwrap();
        assert_eq!(h.ledger_contents(), "Name,Time\n");
        assert_eq!(h.display.shown.len(), 2);
    }

    #[test]
    fn test_acquisition_failure_terminates_with_error() {
        let mut h = Harness::new(2, vec![]);
        h.display.stop_after = 10; // never stop voluntarily
        let err = h.run().unwrap_err();
        assert!(matches!(err, SessionError::Frame(_)));
        // Both frames rendered before the failing third acquisition.
        assert_eq!(h.display.shown.len(), 2);
    }

    #[test]
    fn test_location_rescaled_to_full_frame() {
        // Probe at left=30 in quarter coordinates: the box must land at
        // x = 120 in the rendered frame, not x = 30.
        let mut h = Harness::new(1, vec![probe_at(&[1.0, 0.0])]);
        h.run().unwrap();
        let shown = &h.display.shown[0];
        assert_ne!(shown.pixel(120, 200), (0, 0, 0)); // left edge at 4x
        assert_eq!(shown.pixel(30, 200), (0, 0, 0)); // unscaled position untouched
    }
}
