//! Wizard domain module.
//!
//! This module defines the registration wizard state machine types.

mod action;
mod error;
mod event;
mod state;
pub mod state_machine;
mod step;

pub use action::WizardAction;
pub use error::{ResourceError, StepGateError, ValidationError, WizardError};
pub use event::WizardEvent;
pub use state::{SubmissionStatus, WizardState};
pub use state_machine::WizardStateMachine;
pub use step::WizardStep;
