//! Image uploads
//!
//! Avatars, icons and banners are uploaded inline as `data:` URIs. The MIME
//! type is sniffed from the leading magic bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::DataUriError;

const PNG_MAGIC: &[u8] = b"\x89\x50\x4E\x47\x0D\x0A\x1A\x0A";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";

/// Image formats accepted by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Detect the format from the leading bytes of an image
    pub fn sniff(data: &[u8]) -> Result<Self, DataUriError> {
        if data.is_empty() {
            return Err(DataUriError::Empty);
        }

        if data.starts_with(PNG_MAGIC) {
            Ok(Self::Png)
        } else if data.starts_with(JPEG_MAGIC)
            || matches!(data.get(6..10), Some(b"JFIF" | b"Exif"))
        {
            Ok(Self::Jpeg)
        } else if data.starts_with(GIF87_MAGIC) || data.starts_with(GIF89_MAGIC) {
            Ok(Self::Gif)
        } else if data.starts_with(b"RIFF") && data.get(8..12) == Some(&b"WEBP"[..]) {
            Ok(Self::Webp)
        } else {
            Err(DataUriError::UnsupportedImage)
        }
    }

    /// MIME type for this format
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

/// Encode raw image bytes as a `data:<mime>;base64,<payload>` URI
pub fn image_data_uri(data: &[u8]) -> Result<String, DataUriError> {
    let format = ImageFormat::sniff(data)?;
    Ok(format!(
        "data:{};base64,{}",
        format.mime_type(),
        STANDARD.encode(data)
    ))
}
