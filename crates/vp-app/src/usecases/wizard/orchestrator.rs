//! Wizard orchestrator.
//!
//! This module coordinates the wizard state machine and its side effects.
//! Every public operation returns the resulting [`WizardState`]; failures are
//! recorded in `WizardState::error` rather than returned, since none of them
//! ends the session.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use vp_core::ports::{
    CameraDevicePort, ClockPort, FrameEncoderPort, OtpApiPort, SelfieUploadPort, VisitorApiPort,
    WizardEventPort,
};
use vp_core::{
    CapturedPhoto, OtpState, PhotoSource, ValidationError, VisitDuration, VisitPurpose,
    WizardAction, WizardConfig, WizardError, WizardEvent, WizardState, WizardStateMachine,
    WizardStep,
};

use crate::usecases::camera::CameraCaptureSession;
use crate::usecases::otp::OtpVerificationFlow;
use crate::usecases::submission::{RegistrationSubmission, SubmissionError};
use crate::usecases::upload::PhotoUploadPipeline;
use crate::usecases::wizard::context::WizardContext;

/// Ports the orchestrator is wired with.
pub struct WizardOrchestratorDeps {
    pub otp_api: Arc<dyn OtpApiPort>,
    pub selfie_api: Arc<dyn SelfieUploadPort>,
    pub visitor_api: Arc<dyn VisitorApiPort>,
    pub camera: Arc<dyn CameraDevicePort>,
    pub encoder: Arc<dyn FrameEncoderPort>,
    pub clock: Arc<dyn ClockPort>,
    pub events: Arc<dyn WizardEventPort>,
}

/// Orchestrator that drives wizard state and side effects.
///
/// 向导编排器：状态机 + 副作用执行。
pub struct WizardOrchestrator {
    context: Arc<WizardContext>,

    otp: Arc<OtpVerificationFlow>,
    camera: Arc<CameraCaptureSession>,
    upload: Arc<PhotoUploadPipeline>,
    submission: Arc<RegistrationSubmission>,

    encoder: Arc<dyn FrameEncoderPort>,
    events: Arc<dyn WizardEventPort>,
    flash_by_default: bool,
    jpeg_quality: u8,
}

impl WizardOrchestrator {
    pub fn new(deps: WizardOrchestratorDeps, config: &WizardConfig) -> Self {
        let otp = OtpVerificationFlow::new(
            deps.otp_api,
            Arc::clone(&deps.clock),
            Arc::clone(&deps.events),
            config.otp.resend_cooldown_secs,
        );
        let camera = CameraCaptureSession::new(
            deps.camera,
            Arc::clone(&deps.encoder),
            Arc::clone(&deps.events),
            config.camera.countdown_secs,
            config.camera.jpeg_quality,
        );
        let upload = PhotoUploadPipeline::new(deps.selfie_api);
        let submission = RegistrationSubmission::new(deps.visitor_api, deps.clock);

        Self {
            context: WizardContext::default().arc(),
            otp: Arc::new(otp),
            camera: Arc::new(camera),
            upload: Arc::new(upload),
            submission: Arc::new(submission),
            encoder: deps.encoder,
            events: deps.events,
            flash_by_default: config.camera.flash_by_default,
            jpeg_quality: config.camera.jpeg_quality,
        }
    }

    // ---- Verification step ----

    /// Sends a one-time code to `phone` and records it on the form.
    ///
    /// The form only takes the number once the code went out, so the phone on
    /// the form is always the one the live challenge belongs to.
    pub async fn request_otp(&self, phone: String) -> WizardState {
        let state = self.context.get_state().await;
        if state.form.is_verified() {
            return self.dispatch(WizardEvent::PhoneEntered { phone }).await;
        }

        let generation = self.context.generation();
        match self.otp.request_code(&phone).await {
            Ok(_) => {
                self.dispatch_if_current(generation, WizardEvent::PhoneEntered { phone })
                    .await;
                self.dispatch_if_current(generation, WizardEvent::DismissError)
                    .await
            }
            Err(err) => self.report(generation, err.into_wizard_error()).await,
        }
    }

    pub async fn resend_otp(&self) -> WizardState {
        let generation = self.context.generation();
        match self.otp.resend().await {
            Ok(_) => self.dispatch_if_current(generation, WizardEvent::DismissError).await,
            Err(err) => self.report(generation, err.into_wizard_error()).await,
        }
    }

    pub async fn verify_otp(&self, code: String) -> WizardState {
        self.dispatch(WizardEvent::OtpCodeEntered { code: code.clone() })
            .await;

        let generation = self.context.generation();
        match self.otp.verify_code(&code).await {
            Ok(()) => self.dispatch_if_current(generation, WizardEvent::OtpVerified).await,
            Err(err) => self.report(generation, err.into_wizard_error()).await,
        }
    }

    pub async fn set_terms_accepted(&self, accepted: bool) -> WizardState {
        self.dispatch(WizardEvent::TermsToggled { accepted }).await
    }

    pub fn otp_state(&self) -> OtpState {
        self.otp.state()
    }

    pub fn otp_cooldown_remaining(&self) -> u32 {
        self.otp.cooldown_remaining()
    }

    // ---- Photo step ----

    /// Runs the capture countdown and stores the mirrored frame.
    ///
    /// `with_flash` falls back to the configured default. The dispatch lock is
    /// not held during the countdown, so navigation can still cancel it.
    pub async fn capture_photo(&self, with_flash: Option<bool>) -> WizardState {
        let state = self.context.get_state().await;
        if state.active != WizardStep::Photo || state.form.photo().is_some() {
            debug!(step = ?state.active, "capture ignored");
            return state;
        }

        let generation = self.context.generation();
        let flash = with_flash.unwrap_or(self.flash_by_default);
        match self.camera.capture(flash).await {
            Ok(Some(photo)) => {
                self.dispatch_if_current(generation, WizardEvent::PhotoCaptured { photo })
                    .await
            }
            Ok(None) => self.context.get_state().await,
            Err(err) => self.report(generation, Some(err.into())).await,
        }
    }

    /// Uses an image file instead of the camera.
    pub async fn select_photo_file(&self, bytes: Vec<u8>) -> WizardState {
        match self.encoder.normalize_image(&bytes, self.jpeg_quality) {
            Ok(jpeg) => {
                let photo = CapturedPhoto::from_jpeg(jpeg, PhotoSource::File);
                self.dispatch(WizardEvent::PhotoCaptured { photo }).await
            }
            Err(err) => {
                warn!(error = %err, "selected file rejected");
                self.dispatch(WizardEvent::OperationFailed {
                    error: ValidationError::InvalidImage(err.to_string()).into(),
                })
                .await
            }
        }
    }

    /// Discards the photo and its uploaded identity, then reopens the camera.
    pub async fn retake_photo(&self) -> WizardState {
        self.dispatch(WizardEvent::PhotoCleared).await
    }

    /// Uploads the current photo; success advances to Purpose.
    pub async fn upload_photo(&self) -> WizardState {
        let state = self.context.get_state().await;
        let Some(photo) = state.form.photo().cloned() else {
            return self
                .dispatch(WizardEvent::OperationFailed {
                    error: ValidationError::MissingPhoto.into(),
                })
                .await;
        };

        let generation = self.context.generation();
        match self.upload.upload(&photo).await {
            Ok(result) => {
                self.dispatch_if_current(generation, WizardEvent::SelfieUploaded { result })
                    .await
            }
            Err(err) => self.report(generation, err.into_wizard_error()).await,
        }
    }

    // ---- Form steps ----

    pub async fn select_purpose(&self, purpose: VisitPurpose) -> WizardState {
        self.dispatch(WizardEvent::PurposeSelected { purpose }).await
    }

    pub async fn update_details(
        &self,
        full_name: String,
        company: String,
        government_id: String,
    ) -> WizardState {
        self.dispatch(WizardEvent::DetailsEntered {
            full_name,
            company,
            government_id,
        })
        .await
    }

    pub async fn update_meeting(
        &self,
        person_to_meet: String,
        department: String,
        visit_duration: Option<VisitDuration>,
    ) -> WizardState {
        self.dispatch(WizardEvent::MeetingEntered {
            person_to_meet,
            department,
            visit_duration,
        })
        .await
    }

    // ---- Navigation ----

    pub async fn go_to(&self, step: WizardStep) -> WizardState {
        self.dispatch(WizardEvent::GoTo { step }).await
    }

    pub async fn next(&self) -> WizardState {
        self.dispatch(WizardEvent::Next).await
    }

    /// Backward jump for correction; never re-validates.
    pub async fn edit(&self, step: WizardStep) -> WizardState {
        self.dispatch(WizardEvent::Edit { step }).await
    }

    // ---- Submission ----

    /// Registers the visitor and generates the pass.
    ///
    /// If registration succeeds but pass generation fails, the state records
    /// `SubmissionStatus::Registered` and a later `submit` only retries the pass.
    pub async fn submit(&self) -> WizardState {
        let state = self.context.get_state().await;
        if state.is_terminal() {
            return state;
        }
        if state.active != WizardStep::Review {
            debug!(step = ?state.active, "submit outside review");
            return self
                .dispatch(WizardEvent::OperationFailed {
                    error: ValidationError::NotOnReview.into(),
                })
                .await;
        }
        if let Err(gate) = WizardStateMachine::can_enter(WizardStep::Review, &state.form) {
            return self
                .dispatch(WizardEvent::OperationFailed { error: gate.into() })
                .await;
        }

        let generation = self.context.generation();
        match self.submission.submit(&state.form).await {
            Ok(pass) => {
                self.dispatch_if_current(generation, WizardEvent::PassIssued { pass })
                    .await
            }
            Err(err @ SubmissionError::GeneratePass { .. }) => {
                self.dispatch_if_current(generation, WizardEvent::RegistrationSubmitted)
                    .await;
                self.report(generation, err.into_wizard_error()).await
            }
            Err(err) => self.report(generation, err.into_wizard_error()).await,
        }
    }

    // ---- Control ----

    pub async fn dismiss_error(&self) -> WizardState {
        self.dispatch(WizardEvent::DismissError).await
    }

    /// Starts over with an empty form. Late responses from the previous run are dropped.
    pub async fn fill_another(&self) -> WizardState {
        self.dispatch(WizardEvent::FillAnother).await
    }

    /// Releases the camera and stops every timer, keeping the form.
    pub async fn teardown(&self) -> WizardState {
        self.context.bump_generation();
        self.dispatch(WizardEvent::Teardown).await
    }

    pub async fn get_state(&self) -> WizardState {
        self.context.get_state().await
    }

    /// Applies `event` through the state machine and executes the resulting actions.
    pub async fn dispatch(&self, event: WizardEvent) -> WizardState {
        self.dispatch_inner(None, event).await
    }

    /// Like [`dispatch`](Self::dispatch), but drops `event` if the session was
    /// reset or torn down since `generation` was read.
    async fn dispatch_if_current(&self, generation: u64, event: WizardEvent) -> WizardState {
        self.dispatch_inner(Some(generation), event).await
    }

    async fn report(&self, generation: u64, error: Option<WizardError>) -> WizardState {
        match error {
            Some(error) => {
                self.dispatch_if_current(generation, WizardEvent::OperationFailed { error })
                    .await
            }
            None => self.context.get_state().await,
        }
    }

    async fn dispatch_inner(&self, expected: Option<u64>, event: WizardEvent) -> WizardState {
        // Serialize dispatches so the transition, its actions and the state
        // update run as one unit.
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        let name = event_name(&event);

        if let Some(generation) = expected {
            if generation != self.context.generation() {
                debug!(event = name, "dropping result from a previous session");
                return self.context.get_state().await;
            }
        }

        let span = info_span!("usecase.wizard_orchestrator.dispatch", event = %name);
        async {
            let mut current = self.context.get_state().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                let from = current.active;
                let event_name = event_name(&event);
                let (next, actions) = WizardStateMachine::transition(current, event);
                info!(
                    from = ?from,
                    to = ?next.active,
                    event = %event_name,
                    error = next.error.as_ref().map(tracing::field::display),
                    "wizard state transition"
                );
                let follow_up_events = self.execute_actions(actions).await;
                self.set_state_and_emit(next.clone()).await;
                current = next;
                pending_events.extend(follow_up_events);
            }

            current
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(&self, actions: Vec<WizardAction>) -> Vec<WizardEvent> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            debug!(?action, "wizard executing action");
            match action {
                WizardAction::OpenCamera => {
                    if let Err(err) = self.camera.open().await {
                        follow_up_events.push(WizardEvent::OperationFailed { error: err.into() });
                    }
                }
                WizardAction::ReleaseCamera => self.camera.close().await,
                WizardAction::InvalidateUpload => self.upload.invalidate(),
                WizardAction::CancelTimers => self.otp.cancel_cooldown(),
                WizardAction::ResetSession => {
                    let generation = self.context.bump_generation();
                    self.otp.reset();
                    self.upload.invalidate();
                    self.submission.reset();
                    info!(generation, "wizard session reset");
                }
            }
        }
        follow_up_events
    }

    async fn set_state_and_emit(&self, state: WizardState) {
        self.context.set_state(state.clone()).await;
        self.events.emit_wizard_state_changed(state).await;
    }
}

fn event_name(event: &WizardEvent) -> &'static str {
    match event {
        WizardEvent::PhoneEntered { .. } => "PhoneEntered",
        WizardEvent::OtpCodeEntered { .. } => "OtpCodeEntered",
        WizardEvent::OtpVerified => "OtpVerified",
        WizardEvent::TermsToggled { .. } => "TermsToggled",
        WizardEvent::GoTo { .. } => "GoTo",
        WizardEvent::Next => "Next",
        WizardEvent::Edit { .. } => "Edit",
        WizardEvent::PhotoCaptured { .. } => "PhotoCaptured",
        WizardEvent::PhotoCleared => "PhotoCleared",
        WizardEvent::SelfieUploaded { .. } => "SelfieUploaded",
        WizardEvent::PurposeSelected { .. } => "PurposeSelected",
        WizardEvent::DetailsEntered { .. } => "DetailsEntered",
        WizardEvent::MeetingEntered { .. } => "MeetingEntered",
        WizardEvent::RegistrationSubmitted => "RegistrationSubmitted",
        WizardEvent::PassIssued { .. } => "PassIssued",
        WizardEvent::OperationFailed { .. } => "OperationFailed",
        WizardEvent::DismissError => "DismissError",
        WizardEvent::FillAnother => "FillAnother",
        WizardEvent::Teardown => "Teardown",
    }
}
