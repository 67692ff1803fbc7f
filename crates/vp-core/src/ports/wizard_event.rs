use async_trait::async_trait;
use serde::Serialize;

use crate::wizard::WizardState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownKind {
    OtpResend,
    Capture,
}

/// Outbound notifications for the host UI.
#[async_trait]
pub trait WizardEventPort: Send + Sync {
    async fn emit_wizard_state_changed(&self, state: WizardState);

    /// Called from timer context; implementations must not block.
    fn emit_countdown_tick(&self, kind: CountdownKind, remaining_secs: u32);
}
