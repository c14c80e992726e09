//! Image preparation: fetched bytes → baseline JPEG for a DCT XObject.
//!
//! Search results are usually JPEG already, but fetched bytes can be PNG or
//! carry an alpha channel or CMYK data. Decoding and re-encoding as 8-bit
//! RGB JPEG gives the renderer a single format it can embed as-is with
//! `/DCTDecode`, and tells the composer the pixel size it needs to keep the
//! aspect ratio.

use crate::error::FetchError;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::io::Cursor;
use tracing::debug;

/// An image ready for embedding.
#[derive(Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// Baseline JPEG, RGB, 8 bits per component.
    pub jpeg: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl PreparedImage {
    /// Height over width.
    pub fn aspect_ratio(&self) -> f32 {
        self.pixel_height as f32 / self.pixel_width as f32
    }
}

impl fmt::Debug for PreparedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedImage")
            .field("jpeg", &format_args!("<{} bytes>", self.jpeg.len()))
            .field("pixel_width", &self.pixel_width)
            .field("pixel_height", &self.pixel_height)
            .finish()
    }
}

/// Decode fetched bytes and re-encode them for the PDF.
///
/// `url` is only used to label the error.
pub fn prepare_image(url: &str, bytes: &[u8]) -> Result<PreparedImage, FetchError> {
    let decode_err = |detail: String| FetchError::Decode {
        url: url.to_string(),
        detail,
    };

    let img = image::load_from_memory(bytes).map_err(|e| decode_err(e.to_string()))?;
    let rgb = img.to_rgb8();
    let (pixel_width, pixel_height) = rgb.dimensions();
    if pixel_width == 0 || pixel_height == 0 {
        return Err(decode_err("image has no pixels".into()));
    }

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .map_err(|e| decode_err(e.to_string()))?;
    debug!(
        "Prepared {}x{} image → {} bytes JPEG",
        pixel_width,
        pixel_height,
        jpeg.len()
    );

    Ok(PreparedImage {
        jpeg,
        pixel_width,
        pixel_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 128])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode png");
        buf
    }

    #[test]
    fn png_with_alpha_becomes_jpeg() {
        let prepared = prepare_image("http://img/1.png", &png_bytes(40, 20)).expect("prepare");
        assert_eq!(prepared.pixel_width, 40);
        assert_eq!(prepared.pixel_height, 20);
        assert_eq!(&prepared.jpeg[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        assert!((prepared.aspect_ratio() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = prepare_image("http://img/bad.jpg", b"<html>not found</html>").unwrap_err();
        match err {
            FetchError::Decode { url, .. } => assert_eq!(url, "http://img/bad.jpg"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let prepared = prepare_image("u", &png_bytes(4, 4)).unwrap();
        let dbg = format!("{prepared:?}");
        assert!(dbg.contains("bytes>"));
        assert!(dbg.len() < 200);
    }
}
