use async_trait::async_trait;
use tracing::{debug, info, warn};

use vp_core::ports::{CountdownKind, WizardEventPort};
use vp_core::wizard::WizardState;

/// Event sink for headless hosts: every notification becomes a log record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWizardEventSink;

#[async_trait]
impl WizardEventPort for TracingWizardEventSink {
    async fn emit_wizard_state_changed(&self, state: WizardState) {
        match &state.error {
            Some(error) => warn!(
                step = ?state.active,
                submission = ?state.submission,
                error = %error,
                "wizard state changed"
            ),
            None => info!(
                step = ?state.active,
                submission = ?state.submission,
                has_pass = state.pass.is_some(),
                "wizard state changed"
            ),
        }
    }

    fn emit_countdown_tick(&self, kind: CountdownKind, remaining_secs: u32) {
        debug!(kind = ?kind, remaining_secs, "countdown tick");
    }
}
