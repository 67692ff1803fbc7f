//! VisitorPass Application Orchestration Layer
//!
//! This crate contains the registration wizard use cases and their runtime orchestration.

pub mod timer;
pub mod usecases;

pub use timer::CountdownTimer;
pub use usecases::{
    CameraCaptureSession, OtpVerificationFlow, PhotoUploadPipeline, RegistrationSubmission,
    WizardOrchestrator, WizardOrchestratorDeps,
};
