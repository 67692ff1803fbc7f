//! Phone verification by one-time code.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use vp_core::ports::{ApiError, ClockPort, CountdownKind, OtpApiPort, WizardEventPort};
use vp_core::registration::{OtpCode, PhoneNumber};
use vp_core::{OtpChallenge, OtpState, TransactionId, ValidationError, WizardError};

use crate::timer::CountdownTimer;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("incorrect verification code")]
    CodeRejected,
    /// The flow was reset while this request was outstanding.
    #[error("verification request superseded")]
    Stale,
}

impl OtpError {
    /// Error to surface inline, or `None` for a result nobody is waiting for.
    pub fn into_wizard_error(self) -> Option<WizardError> {
        match self {
            Self::Validation(err) => Some(err.into()),
            Self::Api(err) => Some(err.into()),
            Self::CodeRejected => Some(WizardError::ServerRejection {
                message: Self::CodeRejected.to_string(),
            }),
            Self::Stale => None,
        }
    }
}

struct OtpInner {
    state: OtpState,
    phone: Option<PhoneNumber>,
    generation: u64,
}

/// Drives `Idle -> Sending -> Sent -> Verifying -> Verified` against the OTP api.
///
/// 手机号验证流程，含重发冷却计时。
pub struct OtpVerificationFlow {
    api: Arc<dyn OtpApiPort>,
    clock: Arc<dyn ClockPort>,
    events: Arc<dyn WizardEventPort>,
    cooldown_secs: u32,
    cooldown: CountdownTimer,
    inner: Arc<Mutex<OtpInner>>,
}

impl OtpVerificationFlow {
    pub fn new(
        api: Arc<dyn OtpApiPort>,
        clock: Arc<dyn ClockPort>,
        events: Arc<dyn WizardEventPort>,
        cooldown_secs: u32,
    ) -> Self {
        Self {
            api,
            clock,
            events,
            cooldown_secs,
            cooldown: CountdownTimer::new("otp.resend_cooldown"),
            inner: Arc::new(Mutex::new(OtpInner {
                state: OtpState::Idle,
                phone: None,
                generation: 0,
            })),
        }
    }

    pub fn state(&self) -> OtpState {
        self.lock().state.clone()
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.lock()
            .state
            .challenge()
            .map(|challenge| challenge.cooldown_remaining)
            .unwrap_or(0)
    }

    /// Sends a code to `phone` and starts the resend cooldown.
    pub async fn request_code(&self, phone: &str) -> Result<TransactionId, OtpError> {
        let phone = PhoneNumber::parse(phone)?;

        let (previous, previous_phone, generation) = {
            let mut inner = self.lock();
            match &inner.state {
                OtpState::Verified => return Err(ValidationError::AlreadyVerified.into()),
                state if state.is_in_flight() => {
                    return Err(ValidationError::RequestInFlight.into())
                }
                OtpState::Sent { challenge } if challenge.cooldown_remaining > 0 => {
                    return Err(ValidationError::ResendCooldown {
                        remaining_secs: challenge.cooldown_remaining,
                    }
                    .into())
                }
                _ => {}
            }
            let previous = std::mem::replace(&mut inner.state, OtpState::Sending);
            let previous_phone = inner.phone.replace(phone.clone());
            (previous, previous_phone, inner.generation)
        };

        let result = self.api.send_otp(&phone).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            return Err(OtpError::Stale);
        }

        let transaction_id = match result {
            Ok(id) if !id.is_empty() => id,
            Ok(_) => {
                inner.state = previous;
                inner.phone = previous_phone;
                warn!("send otp returned an empty transaction id");
                return Err(ApiError::Decode("missing transaction id".to_string()).into());
            }
            Err(err) => {
                inner.state = previous;
                inner.phone = previous_phone;
                warn!(error = %err, "send otp failed");
                return Err(err.into());
            }
        };

        inner.state = OtpState::Sent {
            challenge: OtpChallenge {
                transaction_id: transaction_id.clone(),
                sent_at_ms: self.clock.now_ms(),
                cooldown_remaining: self.cooldown_secs,
            },
        };
        drop(inner);

        self.start_cooldown(generation);
        info!(transaction_id = %transaction_id, "otp sent");
        Ok(transaction_id)
    }

    /// Resends to the last phone number once the cooldown has elapsed.
    pub async fn resend(&self) -> Result<TransactionId, OtpError> {
        let phone = self
            .lock()
            .phone
            .clone()
            .ok_or(ValidationError::NoActiveChallenge)?;
        self.request_code(phone.as_str()).await
    }

    pub async fn verify_code(&self, code: &str) -> Result<(), OtpError> {
        let code = OtpCode::parse(code)?;

        let (transaction_id, generation) = {
            let mut inner = self.lock();
            let challenge = match &inner.state {
                OtpState::Verified => return Err(ValidationError::AlreadyVerified.into()),
                OtpState::Idle => return Err(ValidationError::NoActiveChallenge.into()),
                OtpState::Sending | OtpState::Verifying { .. } => {
                    return Err(ValidationError::RequestInFlight.into())
                }
                OtpState::Sent { challenge } => challenge.clone(),
            };
            let transaction_id = challenge.transaction_id.clone();
            inner.state = OtpState::Verifying { challenge };
            (transaction_id, inner.generation)
        };

        let result = self.api.verify_otp(&transaction_id, &code).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            return Err(OtpError::Stale);
        }

        match result {
            Ok(true) => {
                inner.state = OtpState::Verified;
                drop(inner);
                self.cooldown.cancel();
                info!(transaction_id = %transaction_id, "phone verified");
                Ok(())
            }
            Ok(false) => {
                Self::back_to_sent(&mut inner);
                warn!(transaction_id = %transaction_id, "otp rejected");
                Err(OtpError::CodeRejected)
            }
            Err(err) => {
                Self::back_to_sent(&mut inner);
                warn!(transaction_id = %transaction_id, error = %err, "verify otp failed");
                Err(err.into())
            }
        }
    }

    /// Stops the cooldown; a new code may be requested immediately.
    pub fn cancel_cooldown(&self) {
        self.cooldown.cancel();
        let mut inner = self.lock();
        if let OtpState::Sent { challenge } | OtpState::Verifying { challenge } = &mut inner.state
        {
            challenge.cooldown_remaining = 0;
        }
    }

    /// Forgets the phone and any challenge. Outstanding requests resolve as [`OtpError::Stale`].
    pub fn reset(&self) {
        self.cooldown.cancel();
        let mut inner = self.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.state = OtpState::Idle;
        inner.phone = None;
    }

    fn start_cooldown(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let events = Arc::clone(&self.events);
        self.events
            .emit_countdown_tick(CountdownKind::OtpResend, self.cooldown_secs);
        self.cooldown.start(
            self.cooldown_secs,
            move |remaining| {
                let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
                if guard.generation != generation {
                    return;
                }
                if let OtpState::Sent { challenge } | OtpState::Verifying { challenge } =
                    &mut guard.state
                {
                    challenge.cooldown_remaining = remaining;
                }
                drop(guard);
                events.emit_countdown_tick(CountdownKind::OtpResend, remaining);
            },
            || {},
        );
    }

    fn back_to_sent(inner: &mut OtpInner) {
        let state = std::mem::replace(&mut inner.state, OtpState::Idle);
        inner.state = match state {
            OtpState::Verifying { challenge } => OtpState::Sent { challenge },
            other => other,
        };
    }

    fn lock(&self) -> MutexGuard<'_, OtpInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::{mock, predicate::eq};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tokio::time::{sleep, Duration};
    use vp_core::WizardState;

    mock! {
        pub OtpApi {}

        #[async_trait]
        impl OtpApiPort for OtpApi {
            async fn send_otp(&self, phone: &PhoneNumber) -> Result<TransactionId, ApiError>;
            async fn verify_otp(
                &self,
                transaction_id: &TransactionId,
                code: &OtpCode,
            ) -> Result<bool, ApiError>;
        }
    }

    struct FixedClock;

    impl ClockPort for FixedClock {
        fn now_ms(&self) -> i64 {
            1_700_000_000_000
        }
    }

    struct SilentEvents;

    #[async_trait]
    impl WizardEventPort for SilentEvents {
        async fn emit_wizard_state_changed(&self, _state: WizardState) {}

        fn emit_countdown_tick(&self, _kind: CountdownKind, _remaining_secs: u32) {}
    }

    fn flow(api: MockOtpApi) -> OtpVerificationFlow {
        OtpVerificationFlow::new(Arc::new(api), Arc::new(FixedClock), Arc::new(SilentEvents), 30)
    }

    /// Holds `verify_otp`, and `send_otp` when `gate_send`, until released.
    struct GatedOtpApi {
        sends: AtomicUsize,
        verifies: AtomicUsize,
        gate_send: bool,
        release: Notify,
    }

    impl GatedOtpApi {
        fn new(gate_send: bool) -> Arc<Self> {
            Arc::new(Self {
                sends: AtomicUsize::new(0),
                verifies: AtomicUsize::new(0),
                gate_send,
                release: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl OtpApiPort for GatedOtpApi {
        async fn send_otp(&self, _phone: &PhoneNumber) -> Result<TransactionId, ApiError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.gate_send {
                self.release.notified().await;
            }
            Ok(TransactionId::from("txn-gated"))
        }

        async fn verify_otp(
            &self,
            _transaction_id: &TransactionId,
            _code: &OtpCode,
        ) -> Result<bool, ApiError> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(true)
        }
    }

    fn gated_flow(api: Arc<GatedOtpApi>) -> Arc<OtpVerificationFlow> {
        Arc::new(OtpVerificationFlow::new(
            api,
            Arc::new(FixedClock),
            Arc::new(SilentEvents),
            30,
        ))
    }

    fn sending_api(times: usize) -> MockOtpApi {
        let mut api = MockOtpApi::new();
        api.expect_send_otp()
            .times(times)
            .returning(|_| Ok(TransactionId::from("txn-1")));
        api
    }

    #[tokio::test]
    async fn request_code_rejects_malformed_phone_without_network() {
        let flow = flow(sending_api(0));
        let err = flow.request_code("12345").await.expect_err("short phone");
        assert_eq!(
            err,
            OtpError::Validation(ValidationError::InvalidPhone { expected_digits: 10 })
        );
        assert_eq!(flow.state(), OtpState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn resend_is_blocked_until_cooldown_elapses() {
        let flow = flow(sending_api(2));

        flow.request_code("9999999999").await.expect("first send");
        assert_eq!(flow.cooldown_remaining(), 30);

        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(flow.cooldown_remaining(), 20);
        let err = flow.resend().await.expect_err("cooldown active");
        assert_eq!(
            err,
            OtpError::Validation(ValidationError::ResendCooldown { remaining_secs: 20 })
        );

        sleep(Duration::from_secs(20)).await;
        assert_eq!(flow.cooldown_remaining(), 0);
        flow.resend().await.expect("resend after cooldown");
    }

    #[tokio::test]
    async fn verify_without_challenge_is_rejected_locally() {
        let flow = flow(MockOtpApi::new());
        let err = flow.verify_code("1234").await.expect_err("no challenge");
        assert_eq!(err, OtpError::Validation(ValidationError::NoActiveChallenge));
    }

    #[tokio::test]
    async fn wrong_code_returns_to_sent_and_correct_code_verifies() {
        let mut api = sending_api(1);
        api.expect_verify_otp()
            .with(eq(TransactionId::from("txn-1")), eq(OtpCode::parse("0000").unwrap()))
            .times(1)
            .returning(|_, _| Ok(false));
        api.expect_verify_otp()
            .with(eq(TransactionId::from("txn-1")), eq(OtpCode::parse("1234").unwrap()))
            .times(1)
            .returning(|_, _| Ok(true));
        let flow = flow(api);

        flow.request_code("9999999999").await.expect("send");
        let err = flow.verify_code("0000").await.expect_err("wrong code");
        assert_eq!(err, OtpError::CodeRejected);
        assert!(matches!(flow.state(), OtpState::Sent { .. }));

        flow.verify_code("1234").await.expect("verify");
        assert_eq!(flow.state(), OtpState::Verified);

        let err = flow.request_code("9999999999").await.expect_err("verified");
        assert_eq!(err, OtpError::Validation(ValidationError::AlreadyVerified));
    }

    #[tokio::test]
    async fn network_failure_restores_previous_state() {
        let mut api = MockOtpApi::new();
        api.expect_send_otp()
            .times(1)
            .returning(|_| Err(ApiError::Network("offline".into())));
        let flow = flow(api);

        let err = flow.request_code("9999999999").await.expect_err("offline");
        assert!(matches!(err, OtpError::Api(ApiError::Network(_))));
        assert_eq!(flow.state(), OtpState::Idle);
    }

    #[tokio::test]
    async fn empty_transaction_id_is_a_decode_error() {
        let mut api = MockOtpApi::new();
        api.expect_send_otp()
            .times(1)
            .returning(|_| Ok(TransactionId::from("")));
        let flow = flow(api);

        let err = flow.request_code("9999999999").await.expect_err("empty id");
        assert!(matches!(err, OtpError::Api(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let flow = flow(sending_api(1));
        flow.request_code("9999999999").await.expect("send");
        flow.reset();
        assert_eq!(flow.state(), OtpState::Idle);
        assert_eq!(flow.cooldown_remaining(), 0);
        let err = flow.resend().await.expect_err("phone forgotten");
        assert_eq!(err, OtpError::Validation(ValidationError::NoActiveChallenge));
    }

    #[tokio::test]
    async fn failed_send_to_new_phone_keeps_previous_phone() {
        let mut api = MockOtpApi::new();
        api.expect_send_otp()
            .with(eq(PhoneNumber::parse("9999999999").unwrap()))
            .times(2)
            .returning(|_| Ok(TransactionId::from("txn-1")));
        api.expect_send_otp()
            .with(eq(PhoneNumber::parse("8888888888").unwrap()))
            .times(1)
            .returning(|_| Err(ApiError::Network("offline".into())));
        let flow = flow(api);

        flow.request_code("9999999999").await.expect("first send");
        flow.cancel_cooldown();
        let err = flow.request_code("8888888888").await.expect_err("offline");
        assert!(matches!(err, OtpError::Api(ApiError::Network(_))));

        flow.resend().await.expect("resend to the original phone");
    }

    #[tokio::test]
    async fn reset_during_send_drops_late_transaction() {
        let api = GatedOtpApi::new(true);
        let flow = gated_flow(api.clone());

        let task = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.request_code("9999999999").await })
        };
        while api.sends.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(flow.state(), OtpState::Sending);

        flow.reset();
        api.release.notify_one();

        assert_eq!(task.await.expect("join"), Err(OtpError::Stale));
        assert_eq!(flow.state(), OtpState::Idle);
        assert_eq!(flow.cooldown_remaining(), 0);
        assert_eq!(
            flow.verify_code("1234").await,
            Err(OtpError::Validation(ValidationError::NoActiveChallenge))
        );
    }

    #[tokio::test]
    async fn reset_during_verify_drops_late_verdict() {
        let api = GatedOtpApi::new(false);
        let flow = gated_flow(api.clone());
        flow.request_code("9999999999").await.expect("send");

        let task = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.verify_code("1234").await })
        };
        while api.verifies.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(matches!(flow.state(), OtpState::Verifying { .. }));

        flow.reset();
        api.release.notify_one();

        assert_eq!(task.await.expect("join"), Err(OtpError::Stale));
        assert_eq!(flow.state(), OtpState::Idle);
    }
}
