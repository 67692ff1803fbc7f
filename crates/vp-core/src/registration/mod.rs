//! Registration domain: the form aggregate and the values produced along the wizard.

mod form;
mod otp;
mod pass;
mod photo;
mod purpose;
mod request;
pub mod validation;

pub use form::RegistrationForm;
pub use otp::{OtpChallenge, OtpState};
pub use pass::{PassDetails, PassNumber, VisitorPass};
pub use photo::{CapturedPhoto, PhotoSource, SelfieUploadResult};
pub use purpose::{VisitDuration, VisitPurpose};
pub use request::RegistrationRequest;
pub use validation::{OtpCode, PhoneNumber};
