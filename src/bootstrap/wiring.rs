//! # Dependency Injection / 依赖注入模块
//!
//! Builds the infra adapters and hands them to the use cases as port trait
//! objects. Assembly only, no decisions.
//! 仅负责组装，不做决策。

use std::sync::Arc;

use anyhow::Context;
use vp_app::{WizardOrchestrator, WizardOrchestratorDeps};
use vp_core::config::WizardConfig;
use vp_core::ports::{
    AccessTokenPort, CameraDevicePort, OtpApiPort, SelfieUploadPort, SessionExpiredPort,
    VisitorApiPort, WizardEventPort,
};
use vp_infra::{
    ApiClient, HttpOtpApi, HttpVisitorApi, ImageFrameEncoder, LoggingSessionExpired,
    StaticAccessToken, SystemClock,
};

/// HTTP adapters sharing one client.
pub struct BackendClients {
    pub otp: Arc<HttpOtpApi>,
    pub visitor: Arc<HttpVisitorApi>,
}

/// Builds the backend adapters for a static token.
pub fn wire_backend(config: &WizardConfig, token: Option<String>) -> anyhow::Result<BackendClients> {
    let tokens: Arc<dyn AccessTokenPort> = Arc::new(StaticAccessToken::new(token));
    let session_expired: Arc<dyn SessionExpiredPort> = Arc::new(LoggingSessionExpired);
    let client = ApiClient::new(&config.api, tokens, session_expired)
        .context("Failed to build API client")?;
    let client = Arc::new(client);

    Ok(BackendClients {
        otp: Arc::new(HttpOtpApi::new(client.clone())),
        visitor: Arc::new(HttpVisitorApi::new(client)),
    })
}

/// Wires a full wizard around a host-supplied camera and event sink.
/// 相机与事件端口由宿主提供。
pub fn wire_orchestrator(
    config: &WizardConfig,
    backend: BackendClients,
    camera: Arc<dyn CameraDevicePort>,
    events: Arc<dyn WizardEventPort>,
) -> WizardOrchestrator {
    let otp_api: Arc<dyn OtpApiPort> = backend.otp;
    let selfie_api: Arc<dyn SelfieUploadPort> = backend.visitor.clone();
    let visitor_api: Arc<dyn VisitorApiPort> = backend.visitor;

    WizardOrchestrator::new(
        WizardOrchestratorDeps {
            otp_api,
            selfie_api,
            visitor_api,
            camera,
            encoder: Arc::new(ImageFrameEncoder::new()),
            clock: Arc::new(SystemClock),
            events,
        },
        config,
    )
}
