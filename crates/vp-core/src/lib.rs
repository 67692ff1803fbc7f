//! # vp-core
//!
//! Core domain models and business logic for the VisitorPass registration wizard.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

pub mod config;
pub mod ids;
pub mod ports;
pub mod registration;
pub mod wizard;

// Re-export commonly used types at the crate root
pub use config::WizardConfig;
pub use ids::{PhotoId, TransactionId, VisitorId};
pub use registration::{
    CapturedPhoto, OtpChallenge, OtpState, PassDetails, PassNumber, PhotoSource,
    RegistrationForm, SelfieUploadResult, VisitDuration, VisitPurpose, VisitorPass,
};
pub use wizard::{
    StepGateError, SubmissionStatus, ValidationError, WizardAction, WizardError, WizardEvent,
    WizardState, WizardStateMachine, WizardStep,
};
