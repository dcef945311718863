//! zlib-stream frame reassembly
//!
//! With `compress=zlib-stream` the gateway sends one zlib stream for the whole
//! connection, split into binary frames. A message is complete when the
//! buffered bytes end with the sync-flush marker `00 00 ff ff`. The inflate
//! context must persist across messages because later messages reference the
//! dictionary built by earlier ones.

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;

/// Trailer of every complete zlib-stream message
pub const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

/// Output buffer growth step while inflating
const INFLATE_CHUNK: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("zlib inflate failed: {0}")]
    Inflate(#[from] flate2::DecompressError),

    #[error("inflated frame is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Buffers compressed fragments and inflates complete messages
pub struct FrameAssembler {
    buffer: Vec<u8>,
    inflater: Decompress,
}

impl FrameAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            inflater: Decompress::new(true),
        }
    }

    /// Feed one binary frame
    ///
    /// Returns `Ok(None)` while the message is still incomplete. On
    /// completion the whole buffer is inflated and cleared, even if inflating
    /// fails.
    pub fn push(&mut self, fragment: &[u8]) -> Result<Option<String>, FrameError> {
        self.buffer.extend_from_slice(fragment);

        if !self.buffer.ends_with(&ZLIB_SUFFIX) {
            tracing::trace!(buffered = self.buffer.len(), "Awaiting more frame fragments");
            return Ok(None);
        }

        let compressed = std::mem::take(&mut self.buffer);
        let inflated = self.inflate(&compressed)?;
        Ok(Some(String::from_utf8(inflated)?))
    }

    /// Pass an uncompressed text frame through unchanged
    pub fn push_text(&mut self, text: String) -> String {
        text
    }

    /// Bytes waiting for the end-of-message marker
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn inflate(&mut self, input: &[u8]) -> Result<Vec<u8>, FrameError> {
        let mut output = Vec::with_capacity(input.len().saturating_mul(4).max(INFLATE_CHUNK));
        let mut consumed = 0;

        loop {
            if output.len() == output.capacity() {
                output.reserve(INFLATE_CHUNK);
            }

            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();
            let status = self
                .inflater
                .decompress_vec(&input[consumed..], &mut output, FlushDecompress::Sync)?;
            let read = (self.inflater.total_in() - before_in) as usize;
            let written = self.inflater.total_out() - before_out;
            consumed += read;

            let drained = consumed == input.len() && output.len() < output.capacity();
            if matches!(status, Status::StreamEnd) || drained || (read == 0 && written == 0) {
                break;
            }
        }

        Ok(output)
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameAssembler")
            .field("buffered", &self.buffer.len())
            .field("total_in", &self.inflater.total_in())
            .field("total_out", &self.inflater.total_out())
            .finish()
    }
}
