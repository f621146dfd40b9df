//! Input validation applied before an image is fingerprinted.

use image::ImageFormat;

use crate::error::{Error, Result};

/// Default upper bound on accepted image size (20 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Image container formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

/// Identify the image format from its magic bytes and enforce the size bound.
///
/// Only the header is inspected; the image is not decoded.
pub fn inspect_image(bytes: &[u8], max_bytes: usize) -> Result<ImageKind> {
    if bytes.is_empty() {
        return Err(Error::MalformedInput("Empty image buffer".into()));
    }
    if bytes.len() > max_bytes {
        return Err(Error::MalformedInput(format!(
            "Image too large: {} bytes exceeds maximum of {max_bytes} bytes",
            bytes.len()
        )));
    }

    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok(ImageKind::Jpeg),
        Ok(ImageFormat::Png) => Ok(ImageKind::Png),
        Ok(ImageFormat::Gif) => Ok(ImageKind::Gif),
        Ok(ImageFormat::WebP) => Ok(ImageKind::WebP),
        Ok(other) => Err(Error::MalformedInput(format!(
            "Unsupported image format: {other:?}. Allowed: JPEG, PNG, GIF, WebP"
        ))),
        Err(_) => Err(Error::MalformedInput(
            "Not a recognized image (unknown magic bytes)".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_accepts_known_formats() {
        assert_eq!(inspect_image(PNG_HEADER, 1024).unwrap(), ImageKind::Png);
        assert_eq!(inspect_image(JPEG_HEADER, 1024).unwrap(), ImageKind::Jpeg);
        assert_eq!(inspect_image(b"GIF89a\x01\x00", 1024).unwrap(), ImageKind::Gif);
        assert_eq!(
            inspect_image(b"RIFF\x24\x00\x00\x00WEBPVP8 ", 1024).unwrap(),
            ImageKind::WebP
        );
    }

    #[test]
    fn test_rejects_empty_buffer() {
        assert!(matches!(inspect_image(b"", 1024), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_rejects_non_image() {
        assert!(matches!(
            inspect_image(b"<html>not an image</html>", 1024),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_buffer() {
        assert!(matches!(
            inspect_image(PNG_HEADER, 8),
            Err(Error::MalformedInput(_))
        ));
        assert!(inspect_image(PNG_HEADER, PNG_HEADER.len()).is_ok());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ImageKind::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageKind::WebP.mime_type(), "image/webp");
    }
}
