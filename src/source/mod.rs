//! Contracts for the external collaborators that decode frames and apply crops.

use image::RgbaImage;
use thiserror::Error;

use crate::alignment::{SourceSubsampling, Subsampling};
use crate::history::CropRecord;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("clip{clip} failed to load: {message}")]
    Load { clip: usize, message: String },
    #[error("clip{clip} frame {frame} could not be rendered: {message}")]
    FrameFetch {
        clip: usize,
        frame: u64,
        message: String,
    },
    #[error("clip{clip} rejected crop {record}: {message}")]
    CropApply {
        clip: usize,
        record: CropRecord,
        message: String,
    },
}

impl SourceError {
    /// Builds a load error for the zero-based source index.
    pub fn load(index: usize, message: impl Into<String>) -> Self {
        Self::Load {
            clip: index + 1,
            message: message.into(),
        }
    }

    pub fn frame_fetch(index: usize, frame: u64, message: impl Into<String>) -> Self {
        Self::FrameFetch {
            clip: index + 1,
            frame,
            message: message.into(),
        }
    }

    pub fn crop_apply(index: usize, record: CropRecord, message: impl Into<String>) -> Self {
        Self::CropApply {
            clip: index + 1,
            record,
            message: message.into(),
        }
    }
}

/// Static description of one source as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub format_name: String,
    pub width: u32,
    pub height: u32,
    pub subsampling: Subsampling,
    pub frame_count: u64,
    pub fps_num: u64,
    pub fps_den: u64,
}

pub trait FrameProvider {
    fn frame(&mut self, index: usize, frame: u64) -> SourceResult<RgbaImage>;
}

pub trait CropTarget {
    fn source_count(&self) -> usize;
    /// Crops source `index` of the original, uncropped stream. Must leave the source
    /// untouched on error.
    fn apply_crop(&mut self, index: usize, record: CropRecord) -> SourceResult<()>;
}

pub trait MediaBackend: FrameProvider + CropTarget {
    fn descriptors(&self) -> Vec<SourceDescriptor>;
    /// Prepares a source for display (format conversion, first-frame check).
    fn prepare(&mut self, index: usize) -> SourceResult<()>;
}

/// A source after the initial load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub descriptor: SourceDescriptor,
    pub load_error: Option<String>,
}

impl LoadedSource {
    pub fn is_placeholder(&self) -> bool {
        self.load_error.is_some()
    }

    pub fn alignment_input(&self) -> SourceSubsampling {
        if self.is_placeholder() {
            SourceSubsampling::Failed
        } else {
            SourceSubsampling::Loaded(self.descriptor.subsampling)
        }
    }
}

/// Prepares every source; failures become placeholders instead of aborting.
pub fn load_sources<B: MediaBackend + ?Sized>(backend: &mut B) -> Vec<LoadedSource> {
    backend
        .descriptors()
        .into_iter()
        .enumerate()
        .map(|(index, descriptor)| {
            let load_error = match backend.prepare(index) {
                Ok(()) => {
                    tracing::info!(
                        clip = index + 1,
                        format = %descriptor.format_name,
                        width = descriptor.width,
                        height = descriptor.height,
                        "source loaded"
                    );
                    None
                }
                Err(err) => {
                    tracing::warn!(%err, "source replaced by placeholder");
                    Some(err.to_string())
                }
            };
            LoadedSource {
                descriptor,
                load_error,
            }
        })
        .collect()
}

/// Restricts crop application to the sources that actually loaded.
pub struct LoadedTargets<'a, B: ?Sized> {
    backend: &'a mut B,
    indices: Vec<usize>,
}

impl<'a, B: CropTarget + ?Sized> LoadedTargets<'a, B> {
    pub fn new(backend: &'a mut B, sources: &[LoadedSource]) -> Self {
        let indices = sources
            .iter()
            .enumerate()
            .filter(|(_, source)| !source.is_placeholder())
            .map(|(index, _)| index)
            .collect();
        Self { backend, indices }
    }
}

impl<B: CropTarget + ?Sized> CropTarget for LoadedTargets<'_, B> {
    fn source_count(&self) -> usize {
        self.indices.len()
    }

    fn apply_crop(&mut self, index: usize, record: CropRecord) -> SourceResult<()> {
        let source = self.indices.get(index).copied().ok_or_else(|| {
            SourceError::crop_apply(index, record, "no such loaded source")
        })?;
        self.backend.apply_crop(source, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubBackend {
        failing: Vec<usize>,
        applied: Vec<(usize, CropRecord)>,
    }

    fn descriptor(subsampling: Subsampling) -> SourceDescriptor {
        SourceDescriptor {
            format_name: "YUV420P8".to_string(),
            width: 64,
            height: 48,
            subsampling,
            frame_count: 10,
            fps_num: 25,
            fps_den: 1,
        }
    }

    impl FrameProvider for StubBackend {
        fn frame(&mut self, _index: usize, _frame: u64) -> SourceResult<RgbaImage> {
            Ok(RgbaImage::new(64, 48))
        }
    }

    impl CropTarget for StubBackend {
        fn source_count(&self) -> usize {
            3
        }

        fn apply_crop(&mut self, index: usize, record: CropRecord) -> SourceResult<()> {
            self.applied.push((index, record));
            Ok(())
        }
    }

    impl MediaBackend for StubBackend {
        fn descriptors(&self) -> Vec<SourceDescriptor> {
            vec![
                descriptor(Subsampling::new(2, 2)),
                descriptor(Subsampling::new(4, 1)),
                descriptor(Subsampling::NONE),
            ]
        }

        fn prepare(&mut self, index: usize) -> SourceResult<()> {
            if self.failing.contains(&index) {
                return Err(SourceError::load(index, "unsupported format"));
            }
            Ok(())
        }
    }

    #[test]
    fn failed_source_becomes_placeholder_excluded_from_alignment() {
        let mut backend = StubBackend {
            failing: vec![1],
            applied: Vec::new(),
        };
        let sources = load_sources(&mut backend);

        assert_eq!(sources.len(), 3);
        assert!(!sources[0].is_placeholder());
        assert!(sources[1].is_placeholder());
        assert_eq!(
            sources[1].load_error.as_deref(),
            Some("clip2 failed to load: unsupported format")
        );
        assert_eq!(sources[1].alignment_input(), SourceSubsampling::Failed);
        assert_eq!(
            sources[0].alignment_input(),
            SourceSubsampling::Loaded(Subsampling::new(2, 2))
        );
    }

    #[test]
    fn loaded_targets_skip_placeholders() {
        let mut backend = StubBackend {
            failing: vec![1],
            applied: Vec::new(),
        };
        let sources = load_sources(&mut backend);
        let record = CropRecord::new(32, 24, 0, 0);
        {
            let mut targets = LoadedTargets::new(&mut backend, &sources);
            assert_eq!(targets.source_count(), 2);
            targets
                .apply_crop(0, record)
                .expect("first loaded source should accept");
            targets
                .apply_crop(1, record)
                .expect("second loaded source should accept");
            assert!(targets.apply_crop(2, record).is_err());
        }
        assert_eq!(backend.applied, vec![(0, record), (2, record)]);
    }
}
