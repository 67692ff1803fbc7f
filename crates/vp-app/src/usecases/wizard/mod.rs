//! Wizard use cases.
//!
//! This module exposes the registration wizard orchestrator.

mod context;
pub mod orchestrator;

pub use orchestrator::{WizardOrchestrator, WizardOrchestratorDeps};
