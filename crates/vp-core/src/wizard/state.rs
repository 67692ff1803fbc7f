use serde::Serialize;

use crate::registration::{RegistrationForm, VisitorPass};
use crate::wizard::{WizardError, WizardStep};

/// Progress of the two-phase submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    NotSubmitted,
    /// Visitor request exists server-side; the pass is still outstanding.
    Registered,
    Completed,
}

/// Wizard session state.
///
/// 向导会话状态。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WizardState {
    pub active: WizardStep,
    pub form: RegistrationForm,
    /// Inline, dismissible error from the last operation
    pub error: Option<WizardError>,
    pub submission: SubmissionStatus,
    pub pass: Option<VisitorPass>,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pass has been issued; only reset and teardown apply from here.
    pub fn is_terminal(&self) -> bool {
        self.pass.is_some()
    }
}
