//! Encoding: raw bytes or a rendered page → base64 [`ModelInputPart`].
//!
//! Multimodal APIs take binary inputs inline as base64 strings paired with a
//! media type. Uploaded images are passed through untouched; rendered PDF
//! pages are first written out as PNG (or JPEG when configured).

use crate::config::PageImageFormat;
use crate::error::ReviewError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// One unit of model input: a base64 payload and its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInputPart {
    /// Standard-alphabet, padded base64.
    pub data: String,
    pub media_type: String,
}

impl ModelInputPart {
    /// Decode the payload back into the original bytes.
    pub fn decoded(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }

    /// Size of the decoded payload in bytes, computed from the base64 length.
    pub fn byte_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|&b| b == b'=').count();
        ((self.data.len() / 4) * 3).saturating_sub(padding.min(2))
    }
}

/// Encode bytes as a model part carrying `media_type` verbatim.
pub fn encode_bytes(bytes: &[u8], media_type: &str) -> ModelInputPart {
    ModelInputPart {
        data: STANDARD.encode(bytes),
        media_type: media_type.to_string(),
    }
}

/// Encode a rasterised page in the configured image format.
pub fn encode_page(
    img: &DynamicImage,
    format: PageImageFormat,
    page_num: usize,
) -> Result<ModelInputPart, ReviewError> {
    let mut buf = Vec::new();
    // JPEG has no alpha channel; flatten before writing.
    let written = match format {
        PageImageFormat::Png => img.write_to(&mut Cursor::new(&mut buf), format.image_format()),
        PageImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), format.image_format()),
    };
    written.map_err(|e| ReviewError::ImageEncodingFailed {
        page: page_num,
        detail: e.to_string(),
    })?;

    let part = encode_bytes(&buf, format.media_type());
    debug!(
        "Encoded page {} → {} bytes base64 ({})",
        page_num,
        part.data.len(),
        part.media_type
    );
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn encode_bytes_round_trips() {
        let original: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let part = encode_bytes(&original, "image/webp");
        assert_eq!(part.media_type, "image/webp");
        assert_eq!(part.decoded().unwrap(), original);
        assert_eq!(part.byte_len(), original.len());
    }

    #[test]
    fn byte_len_of_malformed_payload_is_zero() {
        let part = ModelInputPart {
            data: "==".into(),
            media_type: "image/png".into(),
        };
        assert_eq!(part.byte_len(), 0);
    }

    #[test]
    fn byte_len_handles_padding() {
        for len in 0..8 {
            let bytes = vec![7u8; len];
            assert_eq!(encode_bytes(&bytes, "x/y").byte_len(), len, "len {len}");
        }
    }

    #[test]
    fn encode_page_png() {
        let part = encode_page(&red_square(), PageImageFormat::Png, 1).expect("encode should succeed");
        assert_eq!(part.media_type, "image/png");
        let decoded = part.decoded().expect("valid base64");
        assert_eq!(&decoded[..4], b"\x89PNG");
    }

    #[test]
    fn encode_page_jpeg_drops_alpha() {
        let part = encode_page(&red_square(), PageImageFormat::Jpeg, 2).expect("encode should succeed");
        assert_eq!(part.media_type, "image/jpeg");
        let decoded = part.decoded().unwrap();
        assert_eq!(&decoded[..2], b"\xFF\xD8");
    }
}
