//! Wizard state machine.
//!
//! Defines a pure state transition function for the registration wizard.
//! Scripted conveniences (terms checkbox -> Photo, purpose select -> Details,
//! upload done -> Purpose) are ordinary transitions here, guarded by the same
//! entry preconditions as a manual `GoTo`.

use crate::registration::RegistrationForm;
use crate::wizard::{
    StepGateError, SubmissionStatus, ValidationError, WizardAction, WizardError, WizardEvent,
    WizardState, WizardStep,
};

/// Pure wizard state machine.
///
/// 纯状态机：不包含副作用。
pub struct WizardStateMachine;

impl WizardStateMachine {
    /// Checks the entry precondition of `step` and of every step before it.
    pub fn can_enter(step: WizardStep, form: &RegistrationForm) -> Result<(), StepGateError> {
        WizardStep::ALL
            .into_iter()
            .take_while(|gated| *gated <= step)
            .try_for_each(|gated| Self::entry_gate(gated, form))
    }

    fn entry_gate(step: WizardStep, form: &RegistrationForm) -> Result<(), StepGateError> {
        match step {
            WizardStep::Verification => Ok(()),
            WizardStep::Photo => {
                if !form.is_verified() {
                    Err(StepGateError::PhoneNotVerified)
                } else if !form.terms_accepted() {
                    Err(StepGateError::TermsNotAccepted)
                } else {
                    Ok(())
                }
            }
            WizardStep::Purpose => match (form.photo(), form.selfie()) {
                (Some(_), Some(_)) => Ok(()),
                _ => Err(StepGateError::PhotoNotUploaded),
            },
            WizardStep::Details => form
                .purpose()
                .map(|_| ())
                .ok_or(StepGateError::PurposeNotSelected),
            WizardStep::Meeting => {
                if form.has_details() {
                    Ok(())
                } else {
                    Err(StepGateError::DetailsIncomplete)
                }
            }
            WizardStep::Review => {
                if form.has_meeting() {
                    Ok(())
                } else {
                    Err(StepGateError::MeetingIncomplete)
                }
            }
        }
    }

    pub fn transition(state: WizardState, event: WizardEvent) -> (WizardState, Vec<WizardAction>) {
        if state.is_terminal()
            && !matches!(
                event,
                WizardEvent::FillAnother | WizardEvent::Teardown | WizardEvent::DismissError
            )
        {
            return (state, Vec::new());
        }

        match event {
            WizardEvent::PhoneEntered { phone } => {
                if state.form.is_verified() {
                    return Self::fail(state, ValidationError::PhoneLocked.into());
                }
                let form = state.form.with_phone(phone);
                (WizardState { form, ..state }, Vec::new())
            }
            WizardEvent::OtpCodeEntered { code } => {
                let form = state.form.with_otp_code(code);
                (WizardState { form, ..state }, Vec::new())
            }
            WizardEvent::OtpVerified => {
                if state.form.is_verified() {
                    return (state, Vec::new());
                }
                let form = state.form.mark_verified();
                Self::advance_to_photo_if_ready(WizardState {
                    form,
                    error: None,
                    ..state
                })
            }
            WizardEvent::TermsToggled { accepted } => {
                let form = state.form.with_terms_accepted(accepted);
                let state = WizardState { form, ..state };
                if accepted {
                    Self::advance_to_photo_if_ready(state)
                } else {
                    (state, Vec::new())
                }
            }
            WizardEvent::GoTo { step } => Self::go_to(state, step),
            WizardEvent::Next => match state.active.next() {
                Some(step) => Self::go_to(state, step),
                None => (state, Vec::new()),
            },
            WizardEvent::Edit { step } => {
                if step <= state.active {
                    Self::move_to(state, step)
                } else {
                    Self::go_to(state, step)
                }
            }
            WizardEvent::PhotoCaptured { photo } => {
                if state.active != WizardStep::Photo {
                    return (state, Vec::new());
                }
                let form = state.form.with_photo(photo);
                (
                    WizardState {
                        form,
                        error: None,
                        ..state
                    },
                    vec![WizardAction::InvalidateUpload, WizardAction::ReleaseCamera],
                )
            }
            WizardEvent::PhotoCleared => {
                if state.active != WizardStep::Photo {
                    return (state, Vec::new());
                }
                let form = state.form.without_photo();
                (
                    WizardState {
                        form,
                        error: None,
                        ..state
                    },
                    vec![WizardAction::InvalidateUpload, WizardAction::OpenCamera],
                )
            }
            WizardEvent::SelfieUploaded { result } => {
                let belongs_to_photo = state
                    .form
                    .photo()
                    .is_some_and(|photo| photo.id() == &result.photo_id);
                if !belongs_to_photo {
                    return (state, Vec::new());
                }
                let form = state.form.with_selfie(result);
                let state = WizardState {
                    form,
                    error: None,
                    ..state
                };
                if state.active == WizardStep::Photo {
                    Self::go_to(state, WizardStep::Purpose)
                } else {
                    (state, Vec::new())
                }
            }
            WizardEvent::PurposeSelected { purpose } => {
                let form = state.form.with_purpose(purpose);
                let state = WizardState {
                    form,
                    error: None,
                    ..state
                };
                if state.active == WizardStep::Purpose {
                    Self::go_to(state, WizardStep::Details)
                } else {
                    (state, Vec::new())
                }
            }
            WizardEvent::DetailsEntered {
                full_name,
                company,
                government_id,
            } => {
                let form = state.form.with_details(full_name, company, government_id);
                (WizardState { form, ..state }, Vec::new())
            }
            WizardEvent::MeetingEntered {
                person_to_meet,
                department,
                visit_duration,
            } => {
                let form = state
                    .form
                    .with_meeting(person_to_meet, department, visit_duration);
                (WizardState { form, ..state }, Vec::new())
            }
            WizardEvent::RegistrationSubmitted => (
                WizardState {
                    submission: SubmissionStatus::Registered,
                    ..state
                },
                Vec::new(),
            ),
            WizardEvent::PassIssued { pass } => (
                WizardState {
                    submission: SubmissionStatus::Completed,
                    pass: Some(pass),
                    error: None,
                    ..state
                },
                Vec::new(),
            ),
            WizardEvent::OperationFailed { error } => Self::fail(state, error),
            WizardEvent::DismissError => (WizardState { error: None, ..state }, Vec::new()),
            WizardEvent::FillAnother => (
                WizardState::new(),
                vec![
                    WizardAction::ReleaseCamera,
                    WizardAction::CancelTimers,
                    WizardAction::ResetSession,
                ],
            ),
            WizardEvent::Teardown => (
                state,
                vec![WizardAction::ReleaseCamera, WizardAction::CancelTimers],
            ),
        }
    }

    fn go_to(state: WizardState, target: WizardStep) -> (WizardState, Vec<WizardAction>) {
        if target == state.active {
            return (state, Vec::new());
        }
        if target < state.active {
            return Self::move_to(state, target);
        }
        match Self::can_enter(target, &state.form) {
            Ok(()) => Self::move_to(state, target),
            Err(gate) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(from = ?state.active, to = ?target, reason = %gate, "wizard step locked");
                Self::fail(state, gate.into())
            }
        }
    }

    fn move_to(state: WizardState, target: WizardStep) -> (WizardState, Vec<WizardAction>) {
        let mut actions = Vec::new();
        if state.active == WizardStep::Photo && target != WizardStep::Photo {
            actions.push(WizardAction::ReleaseCamera);
        }
        if target == WizardStep::Photo && state.active != WizardStep::Photo && state.form.photo().is_none() {
            actions.push(WizardAction::OpenCamera);
        }
        (
            WizardState {
                active: target,
                error: None,
                ..state
            },
            actions,
        )
    }

    fn advance_to_photo_if_ready(state: WizardState) -> (WizardState, Vec<WizardAction>) {
        let ready = state.active == WizardStep::Verification
            && state.form.is_verified()
            && state.form.terms_accepted();
        if ready {
            Self::go_to(state, WizardStep::Photo)
        } else {
            (state, Vec::new())
        }
    }

    fn fail(state: WizardState, error: WizardError) -> (WizardState, Vec<WizardAction>) {
        (
            WizardState {
                error: Some(error),
                ..state
            },
            Vec::new(),
        )
    }
}
