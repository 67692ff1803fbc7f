//! Camera lifecycle and countdown capture for the Photo step.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

use vp_core::ports::{
    CameraDevicePort, CameraFacing, CaptureOptions, CountdownKind, FrameEncoderPort,
    VideoStreamPort, WizardEventPort,
};
use vp_core::wizard::ResourceError;
use vp_core::{CapturedPhoto, PhotoSource};

use crate::timer::CountdownTimer;

struct CameraInner {
    stream: Option<Box<dyn VideoStreamPort>>,
    capturing: bool,
    /// Bumped on every close so a countdown that outlives its stream is discarded.
    epoch: u64,
}

/// Owns the front camera stream while the Photo step needs it.
///
/// 相机会话：离开拍照步骤时必须释放设备。
pub struct CameraCaptureSession {
    device: Arc<dyn CameraDevicePort>,
    encoder: Arc<dyn FrameEncoderPort>,
    events: Arc<dyn WizardEventPort>,
    countdown: CountdownTimer,
    countdown_secs: u32,
    jpeg_quality: u8,
    inner: Mutex<CameraInner>,
}

impl CameraCaptureSession {
    pub fn new(
        device: Arc<dyn CameraDevicePort>,
        encoder: Arc<dyn FrameEncoderPort>,
        events: Arc<dyn WizardEventPort>,
        countdown_secs: u32,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            device,
            encoder,
            events,
            countdown: CountdownTimer::new("camera.capture"),
            countdown_secs,
            jpeg_quality,
            inner: Mutex::new(CameraInner {
                stream: None,
                capturing: false,
                epoch: 0,
            }),
        }
    }

    /// Opens the front camera. A second call while open is a no-op.
    pub async fn open(&self) -> Result<(), ResourceError> {
        let mut inner = self.inner.lock().await;
        if inner.stream.is_some() {
            return Ok(());
        }

        let stream = self
            .device
            .open_stream(CameraFacing::Front)
            .await
            .map_err(|err| {
                warn!(error = %err, "failed to open camera");
                ResourceError::CameraUnavailable {
                    reason: err.to_string(),
                }
            })?;
        inner.stream = Some(stream);
        inner.capturing = false;
        info!("camera opened");
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.stream.is_some()
    }

    /// Runs the capture countdown and grabs the latest frame.
    ///
    /// Returns `Ok(None)` when there is nothing to capture: no open stream, a
    /// capture already counting down, no frame yet, or the session was closed
    /// during the countdown. On success the stream is stopped.
    pub async fn capture(&self, with_flash: bool) -> Result<Option<CapturedPhoto>, ResourceError> {
        let epoch = {
            let mut inner = self.inner.lock().await;
            if inner.stream.is_none() {
                debug!("capture requested without an open camera");
                return Ok(None);
            }
            if inner.capturing {
                debug!("capture already counting down");
                return Ok(None);
            }
            let has_frame = inner
                .stream
                .as_ref()
                .is_some_and(|stream| stream.latest_frame().is_some());
            if !has_frame {
                debug!("camera has not produced a frame yet");
                return Ok(None);
            }
            inner.capturing = true;
            inner.epoch
        };

        let (fired_tx, fired_rx) = oneshot::channel();
        let events = Arc::clone(&self.events);
        self.events
            .emit_countdown_tick(CountdownKind::Capture, self.countdown_secs);
        self.countdown.start(
            self.countdown_secs,
            move |remaining| events.emit_countdown_tick(CountdownKind::Capture, remaining),
            move || {
                let _ = fired_tx.send(());
            },
        );

        if fired_rx.await.is_err() {
            debug!("capture countdown cancelled");
            return Ok(None);
        }

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!("camera closed during countdown, dropping capture");
            return Ok(None);
        }
        inner.capturing = false;

        let Some(frame) = inner.stream.as_ref().and_then(|stream| stream.latest_frame()) else {
            warn!("camera produced no frame to capture");
            return Ok(None);
        };

        let options = CaptureOptions {
            mirror: true,
            flash: with_flash,
            jpeg_quality: self.jpeg_quality,
        };
        let jpeg = self.encoder.encode_frame(&frame, options).map_err(|err| {
            warn!(error = %err, "failed to encode captured frame");
            ResourceError::CaptureFailed {
                reason: err.to_string(),
            }
        })?;

        if let Some(mut stream) = inner.stream.take() {
            stream.stop();
        }
        info!(
            width = frame.width,
            height = frame.height,
            flash = with_flash,
            bytes = jpeg.len(),
            "photo captured"
        );
        Ok(Some(CapturedPhoto::from_jpeg(jpeg, PhotoSource::Camera)))
    }

    /// Cancels any countdown and stops the stream. Safe to call repeatedly.
    pub async fn close(&self) {
        self.countdown.cancel();
        let mut inner = self.inner.lock().await;
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.capturing = false;
        if let Some(mut stream) = inner.stream.take() {
            stream.stop();
            info!("camera released");
        }
    }
}
