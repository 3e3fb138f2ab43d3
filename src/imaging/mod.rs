//! Derivative renderer: one uploaded photograph in, three JPEG renditions out.
//!
//! | Variant | Geometry | Quality |
//! |---|---|---|
//! | full | width capped at 1920px, never upscaled | 85 |
//! | medium | fit inside 800x600, never upscaled | 85 |
//! | thumbnail | cover-crop to exactly 300x200, centred | 80 |
//!
//! The full-size rendition is a progressive JPEG written with `jpeg-encoder`;
//! the others are baseline JPEGs from the `image` crate. Resampling uses
//! `Lanczos3`.

pub mod calculations;

use std::io;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::error::{EncodingError, LimitError, LimitErrorKind};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat};
use thiserror::Error;

use crate::domain::upload::UploadedFile;
use crate::models::config::ImagePipelineConfig;
use crate::storage::{Variant, derivative_path, remove_if_present, write_atomic};

use calculations::{cap_width, fit_inside};

pub const FULL_MAX_WIDTH: u32 = 1920;
pub const FULL_QUALITY: u8 = 85;
pub const MEDIUM_BOUNDS: (u32, u32) = (800, 600);
pub const MEDIUM_QUALITY: u8 = 85;
pub const THUMBNAIL_SIZE: (u32, u32) = (300, 200);
pub const THUMBNAIL_QUALITY: u8 = 80;

/// Reasons a single upload is dropped from its batch.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{filename}: extension is not allowed")]
    DisallowedExtension { filename: String },
    #[error("{filename}: {size} bytes exceeds the limit of {max} bytes")]
    TooLarge { filename: String, size: u64, max: u64 },
    #[error("failed to render {filename}: {source}")]
    RenderFailed {
        filename: String,
        #[source]
        source: ImageError,
    },
    #[error("failed to write {} for {filename}: {source}", path.display())]
    WriteFailed {
        filename: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Upload constraints checked before anything is decoded or written.
#[derive(Debug, Clone)]
pub struct RenderPolicy {
    allowed_extensions: Vec<String>,
    max_bytes: u64,
}

impl RenderPolicy {
    pub fn new(allowed_extensions: Vec<String>, max_bytes: u64) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            max_bytes,
        }
    }

    pub fn from_config(config: &ImagePipelineConfig) -> Self {
        Self::new(config.normalized_extensions(), config.max_file_size_bytes)
    }

    /// Check the extension and the byte length of `file`.
    pub fn validate(&self, file: &UploadedFile) -> Result<(), RenderError> {
        let allowed = file
            .extension()
            .is_some_and(|ext| self.allowed_extensions.contains(&ext));
        if !allowed {
            return Err(RenderError::DisallowedExtension {
                filename: file.original_name.clone(),
            });
        }

        let size = file.bytes.len() as u64;
        if size > self.max_bytes {
            return Err(RenderError::TooLarge {
                filename: file.original_name.clone(),
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// One encoded rendition.
#[derive(Debug, Clone)]
pub struct Rendition {
    pub variant: Variant,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// The three renditions of one upload, encoded in memory.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub full: Rendition,
    pub medium: Rendition,
    pub thumbnail: Rendition,
}

impl RenderedImage {
    pub fn renditions(&self) -> [&Rendition; 3] {
        [&self.full, &self.medium, &self.thumbnail]
    }

    /// Write every rendition next to `base_path` (the full-size path).
    ///
    /// Each file is written atomically. When one write fails the renditions
    /// already written for this upload are removed again.
    pub fn write_to(&self, filename: &str, base_path: &Path) -> Result<(), RenderError> {
        let mut written: Vec<PathBuf> = Vec::with_capacity(3);
        for rendition in self.renditions() {
            let path = derivative_path(base_path, rendition.variant);
            if let Err(source) = write_atomic(&path, &rendition.bytes) {
                for done in &written {
                    if let Err(e) = remove_if_present(done) {
                        log::warn!("Failed to remove partial artifact {}: {e}", done.display());
                    }
                }
                return Err(RenderError::WriteFailed {
                    filename: filename.to_string(),
                    path,
                    source,
                });
            }
            log::debug!(
                "Wrote {} rendition {}x{} to {}",
                rendition.variant.as_str(),
                rendition.width,
                rendition.height,
                path.display()
            );
            written.push(path);
        }
        Ok(())
    }
}

/// Decode `bytes` and encode the full, medium and thumbnail renditions.
pub fn render(filename: &str, bytes: &[u8]) -> Result<RenderedImage, RenderError> {
    let failed = |source: ImageError| RenderError::RenderFailed {
        filename: filename.to_string(),
        source,
    };

    let source = image::load_from_memory(bytes).map_err(failed)?;
    let dimensions = source.dimensions();

    let full = {
        let (w, h) = cap_width(dimensions, FULL_MAX_WIDTH);
        let resized = if (w, h) == dimensions {
            source.clone()
        } else {
            source.resize_exact(w, h, FilterType::Lanczos3)
        };
        encode_progressive(Variant::Full, &resized, FULL_QUALITY).map_err(failed)?
    };

    let medium = {
        let (w, h) = fit_inside(dimensions, MEDIUM_BOUNDS);
        let resized = if (w, h) == dimensions {
            source.clone()
        } else {
            source.resize_exact(w, h, FilterType::Lanczos3)
        };
        encode(Variant::Medium, &resized, MEDIUM_QUALITY).map_err(failed)?
    };

    let thumbnail = {
        let (w, h) = THUMBNAIL_SIZE;
        let cropped = source.resize_to_fill(w, h, FilterType::Lanczos3);
        encode(Variant::Thumbnail, &cropped, THUMBNAIL_QUALITY).map_err(failed)?
    };

    Ok(RenderedImage {
        full,
        medium,
        thumbnail,
    })
}

fn encode(variant: Variant, image: &DynamicImage, quality: u8) -> Result<Rendition, ImageError> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&rgb)?;
    Ok(Rendition {
        variant,
        width: rgb.width(),
        height: rgb.height(),
        bytes,
    })
}

fn encode_progressive(
    variant: Variant,
    image: &DynamicImage,
    quality: u8,
) -> Result<Rendition, ImageError> {
    let rgb = image.to_rgb8();
    let width = jpeg_dimension(rgb.width())?;
    let height = jpeg_dimension(rgb.height())?;

    let mut bytes = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut bytes, quality);
    encoder.set_progressive(true);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| ImageError::Encoding(EncodingError::new(ImageFormat::Jpeg.into(), e)))?;

    Ok(Rendition {
        variant,
        width: rgb.width(),
        height: rgb.height(),
        bytes,
    })
}

/// JPEG frames store each edge as 16 bits.
fn jpeg_dimension(value: u32) -> Result<u16, ImageError> {
    u16::try_from(value)
        .map_err(|_| ImageError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError)))
}
