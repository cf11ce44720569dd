use crate::analysis::ErrorSummary;
use crate::types::{Category, LogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    HighScreenshotFailureRate,
    AccessibilityFailures,
    ComparisonFailures,
    FrequentTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorPattern {
    pub kind: PatternKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub description: String,
    pub occurrences: usize,
    pub impact: Impact,
    pub suggestion: String,
}

struct CategoryRule {
    kind: PatternKind,
    category: Category,
    threshold: usize,
    impact: Impact,
    description: &'static str,
    suggestion: &'static str,
}

const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        kind: PatternKind::HighScreenshotFailureRate,
        category: Category::Screenshot,
        threshold: 5,
        impact: Impact::High,
        description: "High screenshot failure rate",
        suggestion: "Wait for the page to settle before capturing and raise the screenshot timeout",
    },
    CategoryRule {
        kind: PatternKind::AccessibilityFailures,
        category: Category::Accessibility,
        threshold: 3,
        impact: Impact::Medium,
        description: "Recurring accessibility audit failures",
        suggestion: "Verify the audit engine is injected and the page is ready before auditing",
    },
    CategoryRule {
        kind: PatternKind::ComparisonFailures,
        category: Category::Comparison,
        threshold: 3,
        impact: Impact::Medium,
        description: "Recurring visual comparison failures",
        suggestion: "Review baseline images and the diff threshold used for visual comparison",
    },
];

const TIMEOUT_THRESHOLD: usize = 5;
const TIMEOUT_SUGGESTION: &str =
    "Increase operation timeouts or investigate slow page loads and network conditions";

const LOW_RECOVERY_THRESHOLD: f64 = 0.5;
const DOMINANT_CATEGORY_SHARE: f64 = 0.4;

pub fn detect_patterns(entries: &[&LogEntry]) -> Vec<ErrorPattern> {
    let errors: Vec<&LogEntry> = entries.iter().copied().filter(|e| e.is_error()).collect();
    let mut patterns = Vec::new();

    for rule in CATEGORY_RULES {
        let occurrences = errors.iter().filter(|e| e.category == rule.category).count();
        if occurrences > rule.threshold {
            patterns.push(ErrorPattern {
                kind: rule.kind,
                category: Some(rule.category),
                description: rule.description.to_string(),
                occurrences,
                impact: rule.impact,
                suggestion: rule.suggestion.to_string(),
            });
        }
    }

    let timeouts = errors.iter().filter(|e| mentions_timeout(e)).count();
    if timeouts > TIMEOUT_THRESHOLD {
        patterns.push(ErrorPattern {
            kind: PatternKind::FrequentTimeouts,
            category: None,
            description: "Frequent timeout errors".to_string(),
            occurrences: timeouts,
            impact: Impact::High,
            suggestion: TIMEOUT_SUGGESTION.to_string(),
        });
    }

    patterns
}

fn mentions_timeout(entry: &LogEntry) -> bool {
    let hit = |s: &str| s.to_ascii_lowercase().contains("timeout");
    hit(&entry.message) || entry.error.as_ref().is_some_and(|e| hit(&e.message))
}

/// Deduplicated pattern suggestions followed by the rate/share warnings.
pub fn recommendations(summary: &ErrorSummary, patterns: &[ErrorPattern]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for p in patterns {
        if !out.contains(&p.suggestion) {
            out.push(p.suggestion.clone());
        }
    }

    if summary.total_errors == 0 {
        return out;
    }

    if summary.recovery_rate < LOW_RECOVERY_THRESHOLD {
        out.push(format!(
            "Recovery rate is {:.0}%; add fallback strategies for frequently failing operations",
            summary.recovery_rate * 100.0
        ));
    }

    for (category, count) in &summary.errors_by_category {
        let share = *count as f64 / summary.total_errors as f64;
        if share > DOMINANT_CATEGORY_SHARE {
            out.push(format!(
                "{category} errors account for {:.0}% of all errors; prioritise stabilising them",
                share * 100.0
            ));
        }
    }

    out
}
