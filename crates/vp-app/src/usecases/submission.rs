//! Two-phase submission: register the visitor request, then generate the pass.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use vp_core::ports::{ApiError, ClockPort, VisitorApiPort};
use vp_core::registration::RegistrationRequest;
use vp_core::{
    PassNumber, RegistrationForm, ValidationError, VisitorId, VisitorPass, WizardError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionPhase {
    Idle,
    /// Phase one succeeded; a retry only generates the pass.
    Registered { visitor_id: VisitorId },
    Completed { pass: VisitorPass },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("registration failed: {0}")]
    Register(#[source] ApiError),
    #[error("pass generation failed for visitor {visitor_id}: {source}")]
    GeneratePass {
        visitor_id: VisitorId,
        #[source]
        source: ApiError,
    },
    #[error("a submission is already in progress")]
    InFlight,
    /// The session was reset while the submission was outstanding.
    #[error("submission superseded")]
    Superseded,
}

impl SubmissionError {
    pub fn into_wizard_error(self) -> Option<WizardError> {
        match self {
            Self::Validation(err) => Some(err.into()),
            Self::Register(err) | Self::GeneratePass { source: err, .. } => Some(err.into()),
            Self::InFlight => Some(ValidationError::RequestInFlight.into()),
            Self::Superseded => None,
        }
    }
}

struct SubmissionInner {
    phase: SubmissionPhase,
    in_flight: bool,
    generation: u64,
}

/// 提交登记并生成访客通行证（两阶段）。
pub struct RegistrationSubmission {
    api: Arc<dyn VisitorApiPort>,
    clock: Arc<dyn ClockPort>,
    inner: Mutex<SubmissionInner>,
}

impl RegistrationSubmission {
    pub fn new(api: Arc<dyn VisitorApiPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            api,
            clock,
            inner: Mutex::new(SubmissionInner {
                phase: SubmissionPhase::Idle,
                in_flight: false,
                generation: 0,
            }),
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.lock().phase.clone()
    }

    /// Submits `form` and returns the issued pass.
    ///
    /// Registration is skipped when it already succeeded for the same visitor,
    /// so a failed pass generation can be retried without registering twice.
    /// Once completed, the same pass is returned without further calls.
    pub async fn submit(&self, form: &RegistrationForm) -> Result<VisitorPass, SubmissionError> {
        let selfie = form
            .selfie()
            .filter(|selfie| !selfie.visitor_id.is_empty())
            .ok_or(ValidationError::MissingVisitorIdentity)?;
        let request = RegistrationRequest::from_form(form)?;
        let visitor_id = selfie.visitor_id.clone();

        let (already_registered, generation) = {
            let mut inner = self.lock();
            if let SubmissionPhase::Completed { pass } = &inner.phase {
                return Ok(pass.clone());
            }
            if inner.in_flight {
                return Err(SubmissionError::InFlight);
            }
            inner.in_flight = true;
            let registered = matches!(
                &inner.phase,
                SubmissionPhase::Registered { visitor_id: registered } if *registered == visitor_id
            );
            (registered, inner.generation)
        };

        let outcome = self
            .run_phases(form, &request, &visitor_id, already_registered, generation)
            .await;

        let mut inner = self.lock();
        if inner.generation == generation {
            inner.in_flight = false;
        }
        outcome
    }

    async fn run_phases(
        &self,
        form: &RegistrationForm,
        request: &RegistrationRequest,
        visitor_id: &VisitorId,
        already_registered: bool,
        generation: u64,
    ) -> Result<VisitorPass, SubmissionError> {
        if already_registered {
            info!(visitor_id = %visitor_id, "visitor already registered, retrying pass generation");
        } else {
            self.api
                .submit_request(visitor_id, request)
                .await
                .map_err(|err| {
                    warn!(visitor_id = %visitor_id, error = %err, "visitor registration failed");
                    SubmissionError::Register(err)
                })?;
            self.advance(
                generation,
                SubmissionPhase::Registered {
                    visitor_id: visitor_id.clone(),
                },
            )?;
            info!(visitor_id = %visitor_id, "visitor request registered");
        }

        let details = self.api.generate_pass(visitor_id).await.map_err(|err| {
            warn!(visitor_id = %visitor_id, error = %err, "pass generation failed");
            SubmissionError::GeneratePass {
                visitor_id: visitor_id.clone(),
                source: err,
            }
        })?;

        // Validated above; only the issue time can still be off.
        let selfie = form
            .selfie()
            .ok_or(ValidationError::MissingVisitorIdentity)?;
        let issued_at =
            DateTime::<Utc>::from_timestamp_millis(self.clock.now_ms()).unwrap_or_else(Utc::now);
        let pass_number = PassNumber::generate(&mut rand::rng());
        let pass = VisitorPass::assemble(form, selfie, details, pass_number, issued_at)?;

        self.advance(generation, SubmissionPhase::Completed { pass: pass.clone() })?;
        info!(
            visitor_id = %visitor_id,
            pass_number = %pass.pass_number,
            "visitor pass issued"
        );
        Ok(pass)
    }

    fn advance(&self, generation: u64, phase: SubmissionPhase) -> Result<(), SubmissionError> {
        let mut inner = self.lock();
        if inner.generation != generation {
            return Err(SubmissionError::Superseded);
        }
        inner.phase = phase;
        Ok(())
    }

    /// Forgets all progress. An outstanding submission resolves as superseded.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.phase = SubmissionPhase::Idle;
        inner.in_flight = false;
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use vp_core::{
        CapturedPhoto, PassDetails, PhotoSource, SelfieUploadResult, VisitDuration, VisitPurpose,
    };

    struct ScriptedVisitorApi {
        submit_calls: AtomicUsize,
        pass_calls: AtomicUsize,
        pass_results: Mutex<VecDeque<Result<PassDetails, ApiError>>>,
    }

    impl ScriptedVisitorApi {
        fn new(pass_results: Vec<Result<PassDetails, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                submit_calls: AtomicUsize::new(0),
                pass_calls: AtomicUsize::new(0),
                pass_results: Mutex::new(pass_results.into()),
            })
        }
    }

    #[async_trait]
    impl VisitorApiPort for ScriptedVisitorApi {
        async fn submit_request(
            &self,
            _visitor_id: &VisitorId,
            _request: &RegistrationRequest,
        ) -> Result<(), ApiError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn generate_pass(&self, _visitor_id: &VisitorId) -> Result<PassDetails, ApiError> {
            self.pass_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(PassDetails::default()))
        }
    }

    /// Holds `submit_request` until released.
    struct GatedVisitorApi {
        submit_calls: AtomicUsize,
        pass_calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl VisitorApiPort for GatedVisitorApi {
        async fn submit_request(
            &self,
            _visitor_id: &VisitorId,
            _request: &RegistrationRequest,
        ) -> Result<(), ApiError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(())
        }

        async fn generate_pass(&self, _visitor_id: &VisitorId) -> Result<PassDetails, ApiError> {
            self.pass_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PassDetails::default())
        }
    }

    struct FixedClock;

    impl ClockPort for FixedClock {
        fn now_ms(&self) -> i64 {
            1_700_000_000_000
        }
    }

    fn complete_form() -> RegistrationForm {
        let photo = CapturedPhoto::from_jpeg(vec![1, 2, 3], PhotoSource::Camera);
        let selfie = SelfieUploadResult {
            visitor_id: VisitorId::from("V1"),
            selfie_url: "https://cdn.example.com/V1.jpg".into(),
            photo_id: photo.id().clone(),
        };
        RegistrationForm::new()
            .with_phone("9999999999")
            .mark_verified()
            .with_terms_accepted(true)
            .with_photo(photo)
            .with_selfie(selfie)
            .with_purpose(VisitPurpose::Interview)
            .with_details("Ada Lovelace", "Acme", "GOV-1")
            .with_meeting("Grace Hopper", "Engineering", VisitDuration::from_hours(2).ok())
    }

    #[tokio::test]
    async fn pass_generation_retry_skips_registration() {
        let api = ScriptedVisitorApi::new(vec![Err(ApiError::Network("timeout".into()))]);
        let submission = RegistrationSubmission::new(api.clone(), Arc::new(FixedClock));
        let form = complete_form();

        let err = submission.submit(&form).await.expect_err("pass generation fails");
        assert!(matches!(err, SubmissionError::GeneratePass { .. }));
        assert_eq!(
            submission.phase(),
            SubmissionPhase::Registered {
                visitor_id: VisitorId::from("V1")
            }
        );

        let pass = submission.submit(&form).await.expect("retry succeeds");
        assert_eq!(api.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.pass_calls.load(Ordering::SeqCst), 2);
        assert!(pass.pass_number.as_str().starts_with("VP-"));
        assert_eq!(pass.visitor_id, VisitorId::from("V1"));
    }

    #[tokio::test]
    async fn completed_submission_returns_the_same_pass() {
        let api = ScriptedVisitorApi::new(Vec::new());
        let submission = RegistrationSubmission::new(api.clone(), Arc::new(FixedClock));
        let form = complete_form();

        let first = submission.submit(&form).await.expect("submit");
        let second = submission.submit(&form).await.expect("resubmit");

        assert_eq!(first, second);
        assert_eq!(api.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.pass_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn validity_window_falls_back_to_visit_duration() {
        let api = ScriptedVisitorApi::new(Vec::new());
        let submission = RegistrationSubmission::new(api, Arc::new(FixedClock));

        let pass = submission.submit(&complete_form()).await.expect("submit");

        assert_eq!(pass.issued_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(pass.valid_from, pass.issued_at);
        assert_eq!(pass.valid_until - pass.valid_from, chrono::Duration::hours(2));
    }

    #[tokio::test]
    async fn missing_selfie_fails_before_any_call() {
        let api = ScriptedVisitorApi::new(Vec::new());
        let submission = RegistrationSubmission::new(api.clone(), Arc::new(FixedClock));
        let form = RegistrationForm::new()
            .with_phone("9999999999")
            .with_purpose(VisitPurpose::Business);

        let err = submission.submit(&form).await.expect_err("no selfie");
        assert_eq!(
            err,
            SubmissionError::Validation(ValidationError::MissingVisitorIdentity)
        );
        assert_eq!(api.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reset_forgets_registration() {
        let api = ScriptedVisitorApi::new(vec![Err(ApiError::Network("timeout".into()))]);
        let submission = RegistrationSubmission::new(api.clone(), Arc::new(FixedClock));
        let form = complete_form();

        let _ = submission.submit(&form).await;
        submission.reset();
        assert_eq!(submission.phase(), SubmissionPhase::Idle);

        submission.submit(&form).await.expect("fresh submit");
        assert_eq!(api.submit_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reset_between_phases_supersedes_submission() {
        let api = Arc::new(GatedVisitorApi {
            submit_calls: AtomicUsize::new(0),
            pass_calls: AtomicUsize::new(0),
            release: Notify::new(),
        });
        let submission = Arc::new(RegistrationSubmission::new(api.clone(), Arc::new(FixedClock)));

        let task = {
            let submission = Arc::clone(&submission);
            tokio::spawn(async move { submission.submit(&complete_form()).await })
        };
        while api.submit_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        submission.reset();
        api.release.notify_one();

        assert_eq!(task.await.expect("join"), Err(SubmissionError::Superseded));
        assert_eq!(submission.phase(), SubmissionPhase::Idle);
        assert_eq!(api.pass_calls.load(Ordering::SeqCst), 0);
    }
}
