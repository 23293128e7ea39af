use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{imageops, RgbaImage};
use thiserror::Error;

use crate::history::CropRecord;
use crate::input::WriteMode;
use crate::report::CropLabel;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not a valid directory path: {}", .0.display())]
    InvalidDirectory(PathBuf),
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Everything that ends up in a written frame's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSnapshot {
    pub label: CropLabel,
    /// Zero-based source index.
    pub source: usize,
    pub record: CropRecord,
    pub frame: u64,
    pub mode: WriteMode,
}

impl FrameSnapshot {
    pub fn file_name(&self) -> String {
        let scale = match self.mode {
            WriteMode::Scaled => "",
            WriteMode::Exact => "_1to1",
        };
        format!(
            "{}_{:02}{}_{}_frame_{:07}.png",
            self.label,
            self.source + 1,
            scale,
            self.record,
            self.frame
        )
    }
}

pub trait ImageStorage {
    /// Writes `image` for `snapshot`; `viewport` is the host's drawing size used by
    /// [`WriteMode::Scaled`].
    fn write_frame(
        &self,
        image: &RgbaImage,
        snapshot: &FrameSnapshot,
        viewport: (u32, u32),
    ) -> StorageResult<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct ImageWriter {
    image_dir: PathBuf,
}

impl ImageWriter {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
        }
    }

    /// Current directory, used when no image directory is configured.
    pub fn with_default_dir() -> StorageResult<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn target_path(&self, snapshot: &FrameSnapshot) -> StorageResult<PathBuf> {
        if !self.image_dir.is_dir() {
            return Err(StorageError::InvalidDirectory(self.image_dir.clone()));
        }
        Ok(self.image_dir.join(snapshot.file_name()))
    }
}

impl ImageStorage for ImageWriter {
    fn write_frame(
        &self,
        image: &RgbaImage,
        snapshot: &FrameSnapshot,
        viewport: (u32, u32),
    ) -> StorageResult<PathBuf> {
        let path = self.target_path(snapshot)?;
        match snapshot.mode {
            WriteMode::Exact => image.save(&path)?,
            WriteMode::Scaled => scaled_to_viewport(image, viewport).save(&path)?,
        }
        tracing::info!(path = %path.display(), "frame written");
        Ok(path)
    }
}

pub fn scaled_to_viewport(image: &RgbaImage, viewport: (u32, u32)) -> RgbaImage {
    let (width, height) = viewport;
    if (width, height) == image.dimensions() || width == 0 || height == 0 {
        return image.clone();
    }
    imageops::resize(image, width, height, imageops::FilterType::Nearest)
}

/// Removes a written file; missing files are not an error.
pub fn discard_written(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StorageError::Io(err)),
    }
}
