use crate::registration::{
    CapturedPhoto, SelfieUploadResult, VisitDuration, VisitPurpose, VisitorPass,
};
use crate::wizard::{WizardError, WizardStep};

/// Events that drive the wizard.
///
/// 驱动向导的事件。
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    // Verification step
    PhoneEntered { phone: String },
    OtpCodeEntered { code: String },
    /// OTP flow confirmed the code.
    OtpVerified,
    TermsToggled { accepted: bool },

    // Navigation
    GoTo { step: WizardStep },
    Next,
    /// Backward jump for correction; never re-validates.
    Edit { step: WizardStep },

    // Photo step
    PhotoCaptured { photo: CapturedPhoto },
    /// Retake: drop the photo and reopen the camera.
    PhotoCleared,
    SelfieUploaded { result: SelfieUploadResult },

    // Form steps
    PurposeSelected { purpose: VisitPurpose },
    DetailsEntered {
        full_name: String,
        company: String,
        government_id: String,
    },
    MeetingEntered {
        person_to_meet: String,
        department: String,
        visit_duration: Option<VisitDuration>,
    },

    // Results (from orchestrator)
    RegistrationSubmitted,
    PassIssued { pass: VisitorPass },
    OperationFailed { error: WizardError },

    // Control
    DismissError,
    FillAnother,
    Teardown,
}
