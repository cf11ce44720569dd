use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{Category, ExecutionContext, LogLevel};

/// Error details captured alongside a log entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Metadata bag. Analysis only reads the two well-known recovery keys; anything else is
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_attempt: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_success: Option<bool>,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LogMetadata {
    pub fn recovery(attempt: u32, success: bool) -> Self {
        Self {
            recovery_attempt: Some(attempt),
            recovery_success: Some(success),
            extra: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub category: Category,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ExecutionContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LogMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl LogEntry {
    pub fn operation_name(&self) -> Option<&str> {
        self.context.as_ref().map(|c| c.operation_name.as_str())
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    /// A recovery-category entry whose metadata reports success.
    pub fn is_successful_recovery(&self) -> bool {
        self.category == Category::Recovery
            && self
                .metadata
                .as_ref()
                .and_then(|m| m.recovery_success)
                .unwrap_or(false)
    }
}

/// An entry as submitted by a caller, before id/timestamp assignment and category
/// resolution.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub level: LogLevel,
    pub category: Option<Category>,
    pub message: String,
    pub context: Option<ExecutionContext>,
    pub error: Option<ErrorInfo>,
    pub metadata: Option<LogMetadata>,
    pub stack_trace: Option<String>,
}

impl NewLogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            category: None,
            message: message.into(),
            context: None,
            error: None,
            metadata: None,
            stack_trace: None,
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub fn metadata(mut self, metadata: LogMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn stack_trace(mut self, stack: impl Into<String>) -> Self {
        self.stack_trace = Some(stack.into());
        self
    }

    pub fn into_entry(self, timestamp: DateTime<Utc>) -> LogEntry {
        let category = Category::infer(
            self.category,
            self.context.as_ref().map(|c| c.operation_name.as_str()),
            &self.message,
        );
        LogEntry {
            id: Uuid::new_v4(),
            timestamp,
            level: self.level,
            category,
            message: self.message,
            context: self.context,
            error: self.error,
            metadata: self.metadata,
            stack_trace: self.stack_trace,
        }
    }
}
