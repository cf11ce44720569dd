use chrono::{DateTime, Utc};

/// Optional page/theme/viewport labels attached to an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContextHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
}

impl ContextHints {
    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn viewport(mut self, viewport: impl Into<String>) -> Self {
        self.viewport = Some(viewport.into());
        self
    }

    /// Field-by-field merge; values present in `overrides` replace ours.
    pub fn merged(&self, overrides: &ContextHints) -> ContextHints {
        ContextHints {
            page: overrides.page.clone().or_else(|| self.page.clone()),
            theme: overrides.theme.clone().or_else(|| self.theme.clone()),
            viewport: overrides.viewport.clone().or_else(|| self.viewport.clone()),
        }
    }
}

/// Per-call execution state. A fresh context is built for every operation call and only
/// `attempt_number` changes while retrying.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub operation_name: String,
    #[serde(default, flatten)]
    pub hints: ContextHints,
    pub timestamp: DateTime<Utc>,
    pub attempt_number: u32,
    pub max_retries: u32,
}

impl ExecutionContext {
    pub fn new(operation_name: impl Into<String>, hints: ContextHints, max_retries: u32) -> Self {
        Self {
            operation_name: operation_name.into(),
            hints,
            timestamp: Utc::now(),
            attempt_number: 1,
            max_retries,
        }
    }

    /// Total attempts the retry loop may make (initial attempt plus retries).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
