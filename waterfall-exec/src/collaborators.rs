//! Seams for the screenshot and accessibility work the orchestrator wraps. Implementations live
//! with the caller; these helpers only turn them into [`OperationDescriptor`]s.

use std::sync::Arc;

use async_trait::async_trait;

use waterfall_core::ContextHints;

use crate::executor::{OperationDescriptor, OperationError};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureRequest {
    pub page: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(default)]
    pub full_page: bool,
}

impl CaptureRequest {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            ..Default::default()
        }
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn viewport(mut self, viewport: impl Into<String>) -> Self {
        self.viewport = Some(viewport.into());
        self
    }

    fn hints(&self) -> ContextHints {
        ContextHints {
            page: Some(self.page.clone()),
            theme: self.theme.clone(),
            viewport: self.viewport.clone(),
        }
    }
}

#[async_trait]
pub trait ScreenshotCapture: Send + Sync {
    /// Raw image bytes.
    async fn capture(&self, req: &CaptureRequest) -> Result<Vec<u8>, OperationError>;

    fn fallback_count(&self) -> usize {
        0
    }

    /// Alternative capture strategy `idx` (0-based, `< fallback_count()`).
    async fn capture_fallback(
        &self,
        idx: usize,
        _req: &CaptureRequest,
    ) -> Result<Vec<u8>, OperationError> {
        Err(OperationError::failed(format!("no screenshot fallback {idx}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditViolation {
    pub rule_id: String,
    pub impact: String,
    pub description: String,
    #[serde(default)]
    pub nodes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditReport {
    pub page: String,
    #[serde(default)]
    pub violations: Vec<AuditViolation>,
    #[serde(default)]
    pub passes: usize,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[async_trait]
pub trait AccessibilityAudit: Send + Sync {
    async fn audit(&self, req: &CaptureRequest) -> Result<AuditReport, OperationError>;

    fn fallback_count(&self) -> usize {
        0
    }

    async fn audit_fallback(
        &self,
        idx: usize,
        _req: &CaptureRequest,
    ) -> Result<AuditReport, OperationError> {
        Err(OperationError::failed(format!("no accessibility fallback {idx}")))
    }
}

/// `screenshot:<page>` with one fallback per strategy the capturer offers.
pub fn screenshot_operation(
    capture: Arc<dyn ScreenshotCapture>,
    req: CaptureRequest,
) -> OperationDescriptor<Vec<u8>> {
    let mut op = {
        let capture = capture.clone();
        let req = req.clone();
        OperationDescriptor::new(format!("screenshot:{}", req.page), move || {
            let capture = capture.clone();
            let req = req.clone();
            async move { capture.capture(&req).await }
        })
    };
    for idx in 0..capture.fallback_count() {
        let capture = capture.clone();
        let req = req.clone();
        op = op.fallback(move || {
            let capture = capture.clone();
            let req = req.clone();
            async move { capture.capture_fallback(idx, &req).await }
        });
    }
    op.hints(req.hints())
}

/// `accessibility:<page>`, built the same way as [`screenshot_operation`].
pub fn accessibility_operation(
    audit: Arc<dyn AccessibilityAudit>,
    req: CaptureRequest,
) -> OperationDescriptor<AuditReport> {
    let mut op = {
        let audit = audit.clone();
        let req = req.clone();
        OperationDescriptor::new(format!("accessibility:{}", req.page), move || {
            let audit = audit.clone();
            let req = req.clone();
            async move { audit.audit(&req).await }
        })
    };
    for idx in 0..audit.fallback_count() {
        let audit = audit.clone();
        let req = req.clone();
        op = op.fallback(move || {
            let audit = audit.clone();
            let req = req.clone();
            async move { audit.audit_fallback(idx, &req).await }
        });
    }
    op.hints(req.hints())
}
