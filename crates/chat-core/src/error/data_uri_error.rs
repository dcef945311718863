//! Errors raised while encoding binary uploads

use thiserror::Error;

/// Errors produced when turning raw image bytes into a data URI
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataUriError {
    #[error("Unsupported image type given")]
    UnsupportedImage,

    #[error("Image data is empty")]
    Empty,
}
