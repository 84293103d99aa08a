//! # Image Processing Module
//!
//! In-memory container work for the recompressor. The heavy optimization is
//! delegated to external tools (see `tool_runner`); this module only moves
//! pixels in and out of containers.
//!
//! | Operation     | Input           | Output        | Library |
//! |---------------|-----------------|---------------|---------|
//! | sniff         | file bytes      | JPEG / PNG    | `image` (magic bytes) |
//! | decode        | JPEG/PNG bytes  | pixel buffer  | `image` |
//! | encode JPEG   | pixel buffer    | JPEG bytes    | `image` |
//! | encode PNG    | pixel buffer    | PNG bytes     | `image` |
//! | encode WebP   | pixel buffer    | WebP bytes    | `webp` (libwebp, lossy) |
//!
//! The container is always identified from content, never from the file
//! extension.

use image::{DynamicImage, ImageFormat, ImageOutputFormat};
use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;

use crate::error::{CompressError, Result};

/// Largest width or height libwebp accepts
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Container of the image currently flowing through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
}

impl SourceFormat {
    pub fn image_format(&self) -> ImageFormat {
        match self {
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Png => ImageFormat::Png,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Jpeg => f.write_str("jpeg"),
            SourceFormat::Png => f.write_str("png"),
        }
    }
}

/// A decoded pixel buffer tagged with its container format
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: SourceFormat,
}

impl DecodedImage {
    pub fn new(image: DynamicImage, format: SourceFormat) -> Self {
        Self { image, format }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Identify the container from its magic bytes
pub fn sniff_format(bytes: &[u8]) -> Result<SourceFormat> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok(SourceFormat::Jpeg),
        Ok(ImageFormat::Png) => Ok(SourceFormat::Png),
        Ok(other) => Err(CompressError::UnsupportedFormat(format!(
            "{:?} (only JPEG and PNG are accepted)",
            other
        ))),
        Err(_) => Err(CompressError::UnsupportedFormat(
            "unrecognized container (only JPEG and PNG are accepted)".to_string(),
        )),
    }
}

/// Sniff and decode source file bytes
pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    let format = sniff_format(bytes)?;
    let image = image::load_from_memory_with_format(bytes, format.image_format())
        .map_err(CompressError::Decode)?;
    Ok(DecodedImage::new(image, format))
}

/// Decode bytes that are expected to be in `format`
pub fn decode_as(bytes: &[u8], format: SourceFormat) -> image::ImageResult<DynamicImage> {
    image::load_from_memory_with_format(bytes, format.image_format())
}

fn write_container(img: &DynamicImage, format: ImageOutputFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .map_err(|e| CompressError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Encode as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let flattened = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Cow::Borrowed(img),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    };
    write_container(&flattened, ImageOutputFormat::Jpeg(quality))
}

/// Encode as PNG, keeping alpha and 16-bit depth
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let storable = match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16()))
        }
        _ => Cow::Borrowed(img),
    };
    write_container(&storable, ImageOutputFormat::Png)
}

/// Lossy WebP at `quality` (1-100). Images with an alpha channel are
/// encoded RGBA, everything else RGB.
pub fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 || width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(CompressError::Encode(format!(
            "{}x{} is outside the WebP limits (1-{} per side)",
            width, height, WEBP_MAX_DIMENSION
        )));
    }

    let memory = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode(f32::from(quality))
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode(f32::from(quality))
    };

    Ok(memory.to_vec())
}
