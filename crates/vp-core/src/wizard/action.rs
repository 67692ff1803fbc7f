/// Side-effects produced by wizard transitions.
///
/// 状态迁移产生的副作用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    /// Acquire the front camera stream.
    OpenCamera,
    /// Release every camera track (idempotent).
    ReleaseCamera,
    /// Drop any pending or completed upload bound to a previous photo.
    InvalidateUpload,
    /// Cancel the OTP cooldown and capture countdown.
    CancelTimers,
    /// Reset OTP, upload and submission sub-processes for a fresh session.
    ResetSession,
}
