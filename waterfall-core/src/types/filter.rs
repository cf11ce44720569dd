use chrono::{DateTime, Utc};

use crate::types::{Category, LogEntry, LogLevel};

/// Inclusive time window. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Minimum level (inclusive).
    pub level: Option<LogLevel>,
    pub category: Option<Category>,
    pub range: TimeRange,
    pub operation_name: Option<String>,
    pub page: Option<String>,
    pub theme: Option<String>,
    pub limit: Option<usize>,
}

impl LogFilter {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if self.level.is_some_and(|min| entry.level < min) {
            return false;
        }
        if self.category.is_some_and(|c| entry.category != c) {
            return false;
        }
        if !self.range.contains(entry.timestamp) {
            return false;
        }
        let ctx = entry.context.as_ref();
        if let Some(op) = &self.operation_name {
            if ctx.map(|c| c.operation_name.as_str()) != Some(op.as_str()) {
                return false;
            }
        }
        if let Some(page) = &self.page {
            if ctx.and_then(|c| c.hints.page.as_deref()) != Some(page.as_str()) {
                return false;
            }
        }
        if let Some(theme) = &self.theme {
            if ctx.and_then(|c| c.hints.theme.as_deref()) != Some(theme.as_str()) {
                return false;
            }
        }
        true
    }

    /// Filter and order newest-first. Entries must be given oldest-first (insertion order);
    /// equal timestamps then keep the most recently inserted entry first.
    pub fn apply<'a>(
        &self,
        entries: impl DoubleEndedIterator<Item = &'a LogEntry>,
    ) -> Vec<LogEntry> {
        let mut out: Vec<LogEntry> = entries.rev().filter(|e| self.matches(e)).cloned().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}
