//! Known-face gallery built from a directory of reference images.
//!
//! One image per person; the file stem is the identity key. Unreadable files
//! and images with no detectable face are skipped, not fatal.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineError, FaceEngine};
use crate::types::Embedding;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery directory not found: {0} — create it and add one image per person")]
    DirectoryMissing(PathBuf),
    #[error("failed to list gallery directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no images in {0} — add one image per person to enroll them")]
    NoImages(PathBuf),
    #[error("no usable face in any image under {0} — each image needs one clear face")]
    NoUsableFaces(PathBuf),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A single enrolled identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownFace {
    /// Identity key: the reference image's file stem, case-sensitive.
    /// Upper-cased only at display/record time.
    pub name: String,
    pub embedding: Embedding,
}

/// The set of known faces used as the match reference.
///
/// Non-empty by construction: matching against an empty gallery has no
/// defined arg-min, so [`build`] refuses to produce one.
#[derive(Debug, Clone)]
pub struct Gallery {
    faces: Vec<KnownFace>,
}

impl Gallery {
    /// Returns `None` when `faces` is empty.
    pub fn from_faces(faces: Vec<KnownFace>) -> Option<Gallery> {
        if faces.is_empty() {
            None
        } else {
            Some(Gallery { faces })
        }
    }

    pub fn faces(&self) -> &[KnownFace] {
        &self.faces
    }
}

/// Build a gallery from every readable image in `dir`.
///
/// Files are visited in filename order so the same directory always produces
/// the same gallery. The first detected face of each image contributes that
/// image's embedding.
pub fn build(dir: &Path, engine: &mut dyn FaceEngine) -> Result<Gallery, GalleryError> {
    if !dir.is_dir() {
        return Err(GalleryError::DirectoryMissing(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| GalleryError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut faces = Vec::new();
    let mut decoded = 0usize;

    for path in &paths {
        let img = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(err) => {
                tracing::warn!(file = %path.display(), error = %err, "skipping unreadable image");
                continue;
            }
        };
        decoded += 1;

        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let probes = engine.probe_faces(img.as_raw(), img.width(), img.height())?;
        match probes.into_iter().next() {
            Some(probe) => {
                tracing::debug!(name, "enrolled face");
                faces.push(KnownFace {
                    name,
                    embedding: probe.embedding,
                });
            }
            None => {
                tracing::warn!(file = %path.display(), "no face found in image; skipping");
            }
        }
    }

    if decoded == 0 {
        return Err(GalleryError::NoImages(dir.to_path_buf()));
    }

    let gallery = Gallery::from_faces(faces)
        .ok_or_else(|| GalleryError::NoUsableFaces(dir.to_path_buf()))?;

    tracing::info!(
        dir = %dir.display(),
        enrolled = gallery.faces().len(),
        "gallery loaded"
    );
    Ok(gallery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ProbeFace;
    use crate::types::FaceLocation;
    use image::{Rgb, RgbImage};
    use std::path::Path;

    /// Treats any image with at least one bright pixel as containing a face.
    struct BrightnessEngine;

    impl FaceEngine for BrightnessEngine {
        fn probe_faces(
            &mut self,
            rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<ProbeFace>, EngineError> {
            if rgb.iter().any(|&b| b > 127) {
                Ok(vec![ProbeFace {
                    location: FaceLocation {
                        top: 0.0,
                        right: 4.0,
                        bottom: 4.0,
                        left: 0.0,
                        confidence: 0.9,
                    },
                    embedding: Embedding {
                        values: vec![rgb[0] as f32 / 255.0],
                        model_version: None,
                    },
                }])
            } else {
                Ok(vec![])
            }
        }
    }

    fn write_image(dir: &Path, file: &str, value: u8) {
        let img = RgbImage::from_pixel(8, 8, Rgb([value, value, value]));
        img.save(dir.join(file)).unwrap();
    }

    #[test]
    fn test_missing_directory_is_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = build(&missing, &mut BrightnessEngine).unwrap_err();
        assert!(matches!(err, GalleryError::DirectoryMissing(_)));
    }

    #[test]
    fn test_empty_directory_is_no_images() {
        let dir = tempfile::tempdir().unwrap();
        let err = build(dir.path(), &mut BrightnessEngine).unwrap_err();
        assert!(matches!(err, GalleryError::NoImages(_)));
    }

    #[test]
    fn test_undecodable_only_directory_is_no_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
        let err = build(dir.path(), &mut BrightnessEngine).unwrap_err();
        assert!(matches!(err, GalleryError::NoImages(_)));
    }

    #[test]
    fn test_faceless_only_directory_is_no_usable_faces() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "dark.png", 0);
        let err = build(dir.path(), &mut BrightnessEngine).unwrap_err();
        assert!(matches!(err, GalleryError::NoUsableFaces(_)));
    }

    #[test]
    fn test_faceless_image_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "alice.png", 255);
        write_image(dir.path(), "blank.png", 0);
        let gallery = build(dir.path(), &mut BrightnessEngine).unwrap();
        assert_eq!(gallery.faces().len(), 1);
        assert_eq!(gallery.faces()[0].name, "alice");
    }

    #[test]
    fn test_undecodable_file_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "alice.png", 255);
        std::fs::write(dir.path().join("broken.png"), b"garbage").unwrap();
        let gallery = build(dir.path(), &mut BrightnessEngine).unwrap();
        assert_eq!(gallery.faces().len(), 1);
    }

    #[test]
    fn test_names_come_from_file_stems_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "zoe.png", 200);
        write_image(dir.path(), "Amir.png", 210);
        write_image(dir.path(), "bea.png", 220);
        let gallery = build(dir.path(), &mut BrightnessEngine).unwrap();
        let names: Vec<&str> = gallery.faces().iter().map(|f| f.name.as_str()).collect();
        // Sorted by filename, and keys keep their original case.
        assert_eq!(names, vec!["Amir", "bea", "zoe"]);
    }

    #[test]
    fn test_empty_gallery_unrepresentable() {
        assert!(Gallery::from_faces(vec![]).is_none());
    }
}
