//! # Alpha detection
//!
//! Decides whether a decoded PNG needs its transparency preserved. Two
//! strategies are available and they disagree on one class of input: a PNG
//! that declares an alpha channel but keeps every pixel fully opaque.
//!
//! | Strategy     | Looks at                 | Declared-but-unused alpha |
//! |--------------|--------------------------|---------------------------|
//! | `PixelScan`  | every alpha sample       | no alpha (JPEG path)      |
//! | `ColorModel` | the declared color type  | alpha (PNG optimizer path)|
//!
//! `PixelScan` is the default.

use image::{DynamicImage, ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Strategy used to decide if an image carries transparency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaDetection {
    /// Scan every pixel for an alpha sample below full opacity
    #[default]
    PixelScan,
    /// Treat any alpha-capable color type as transparent
    ColorModel,
}

impl AlphaDetection {
    pub fn has_alpha(&self, img: &DynamicImage) -> bool {
        match self {
            AlphaDetection::PixelScan => scan_pixels(img),
            AlphaDetection::ColorModel => img.color().has_alpha(),
        }
    }
}

impl FromStr for AlphaDetection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "pixel-scan" | "scan" => Ok(AlphaDetection::PixelScan),
            "color-model" | "model" => Ok(AlphaDetection::ColorModel),
            other => Err(format!("unknown alpha detection strategy: {}", other)),
        }
    }
}

fn scan_pixels(img: &DynamicImage) -> bool {
    match img {
        DynamicImage::ImageLumaA8(buf) => any_transparent(buf, u8::MAX),
        DynamicImage::ImageRgba8(buf) => any_transparent(buf, u8::MAX),
        DynamicImage::ImageLumaA16(buf) => any_transparent(buf, u16::MAX),
        DynamicImage::ImageRgba16(buf) => any_transparent(buf, u16::MAX),
        DynamicImage::ImageRgba32F(buf) => buf.pixels().any(|p| p.0[3] < 1.0),
        other if other.color().has_alpha() => {
            any_transparent(&other.to_rgba16(), u16::MAX)
        }
        _ => false,
    }
}

/// Alpha is always the last channel of the alpha-carrying pixel types
fn any_transparent<P>(buf: &ImageBuffer<P, Vec<P::Subpixel>>, opaque: P::Subpixel) -> bool
where
    P: Pixel,
{
    buf.pixels().any(|p| {
        let channels = p.channels();
        channels[channels.len() - 1] != opaque
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    fn opaque_rgba() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255])))
    }

    fn one_translucent_pixel() -> DynamicImage {
        let mut buf = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        buf.put_pixel(7, 7, Rgba([10, 20, 30, 254]));
        DynamicImage::ImageRgba8(buf)
    }

    #[test]
    fn test_pixel_scan_finds_single_translucent_pixel() {
        assert!(AlphaDetection::PixelScan.has_alpha(&one_translucent_pixel()));
    }

    #[test]
    fn test_declared_but_unused_alpha() {
        let img = opaque_rgba();
        assert!(!AlphaDetection::PixelScan.has_alpha(&img));
        assert!(AlphaDetection::ColorModel.has_alpha(&img));
    }

    #[test]
    fn test_rgb_has_no_alpha() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        assert!(!AlphaDetection::PixelScan.has_alpha(&img));
        assert!(!AlphaDetection::ColorModel.has_alpha(&img));
    }

    #[test]
    fn test_gray_alpha_and_16_bit() {
        let gray = DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(2, 2, LumaA([9, 0])));
        assert!(AlphaDetection::PixelScan.has_alpha(&gray));

        let deep = DynamicImage::ImageRgba16(ImageBuffer::from_pixel(2, 2, Rgba([1u16, 2, 3, u16::MAX])));
        assert!(!AlphaDetection::PixelScan.has_alpha(&deep));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("pixel-scan".parse::<AlphaDetection>().unwrap(), AlphaDetection::PixelScan);
        assert_eq!("color_model".parse::<AlphaDetection>().unwrap(), AlphaDetection::ColorModel);
        assert!("guess".parse::<AlphaDetection>().is_err());
    }
}
