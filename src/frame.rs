use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to read frame file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode frame file '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Decorative border drawn over every result. Loaded once at startup and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbaImage,
}

impl Frame {
    /// Loads the frame from `path` and resizes it to a `size × size` square.
    pub fn load(path: &Path, size: u32) -> Result<Self, FrameError> {
        let decoded = load_frame(path)?;
        Ok(Self::from_image(&decoded, size))
    }

    pub fn from_image(image: &DynamicImage, size: u32) -> Self {
        let image = imageops::resize(&image.to_rgba8(), size, size, FilterType::Lanczos3);
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

pub fn load_frame(path: &Path) -> Result<DynamicImage, FrameError> {
    let bytes = std::fs::read(path).map_err(|source| FrameError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    image::load_from_memory(&bytes).map_err(|source| FrameError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
