//! Port interfaces for the application layer
//!
//! Ports define the contract between the wizard use cases and the
//! infrastructure that talks to the backend, the camera and the host UI.
//! Use cases depend only on these traits; adapters live in `vp-infra` or are
//! supplied by the embedding application.

mod camera;
mod clock;
mod errors;
mod frame_encoder;
mod otp_api;
mod session;
mod visitor_api;
mod wizard_event;

pub use camera::{CameraDevicePort, CameraError, CameraFacing, VideoFrame, VideoStreamPort};
pub use clock::ClockPort;
pub use errors::ApiError;
pub use frame_encoder::{CaptureOptions, EncodeError, FrameEncoderPort};
pub use otp_api::OtpApiPort;
pub use session::{AccessTokenPort, SessionExpiredPort};
pub use visitor_api::{SelfieUpload, SelfieUploadPort, VisitorApiPort};
pub use wizard_event::{CountdownKind, WizardEventPort};
