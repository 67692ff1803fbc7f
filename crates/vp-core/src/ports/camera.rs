use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// User-facing camera; the preview is mirrored.
    Front,
    Back,
}

/// One decoded video frame, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl VideoFrame {
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device found")]
    DeviceNotFound,
    #[error("camera stream lost: {0}")]
    StreamLost(String),
    #[error("camera failure: {0}")]
    Other(String),
}

/// Access to the host's video devices.
#[async_trait]
pub trait CameraDevicePort: Send + Sync {
    async fn open_stream(&self, facing: CameraFacing) -> Result<Box<dyn VideoStreamPort>, CameraError>;
}

/// A live device stream. Holding one holds the device lock.
pub trait VideoStreamPort: Send + Sync {
    /// Most recent frame, `None` until the device has produced one.
    fn latest_frame(&self) -> Option<VideoFrame>;

    /// Stops every underlying track. Must be safe to call more than once.
    fn stop(&mut self);
}
