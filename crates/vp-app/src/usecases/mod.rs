//! Registration wizard use cases
//!
//! Each capability (phone verification, camera, selfie upload, submission)
//! is a standalone use case; the orchestrator sequences them through the
//! wizard state machine.

pub mod camera;
pub mod otp;
pub mod submission;
pub mod upload;
pub mod wizard;

pub use camera::CameraCaptureSession;
pub use otp::{OtpError, OtpVerificationFlow};
pub use submission::{RegistrationSubmission, SubmissionError, SubmissionPhase};
pub use upload::{PhotoUploadPipeline, UploadError};
pub use wizard::{WizardOrchestrator, WizardOrchestratorDeps};
