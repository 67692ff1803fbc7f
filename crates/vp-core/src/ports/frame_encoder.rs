use thiserror::Error;

use crate::ports::VideoFrame;

/// How a captured frame is turned into a still.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Flip horizontally to match the mirrored preview
    pub mirror: bool,
    /// Fill the buffer white before drawing the frame
    pub flash: bool,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("frame buffer does not match {width}x{height} RGBA")]
    MalformedFrame { width: u32, height: u32 },
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("jpeg encode failed: {0}")]
    Encode(String),
}

/// Off-screen image processing for captures and selected files.
pub trait FrameEncoderPort: Send + Sync {
    fn encode_frame(&self, frame: &VideoFrame, options: CaptureOptions) -> Result<Vec<u8>, EncodeError>;

    /// Decodes an arbitrary image file and re-encodes it as JPEG.
    fn normalize_image(&self, bytes: &[u8], jpeg_quality: u8) -> Result<Vec<u8>, EncodeError>;
}
