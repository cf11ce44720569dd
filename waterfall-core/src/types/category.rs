use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Screenshot,
    Accessibility,
    Comparison,
    System,
    Recovery,
}

// Checked in this order; the first keyword found wins.
static KEYWORDS: LazyLock<Vec<(Regex, Category)>> = LazyLock::new(|| {
    [
        ("screenshot", Category::Screenshot),
        ("accessibility", Category::Accessibility),
        ("comparison", Category::Comparison),
        ("recovery", Category::Recovery),
    ]
    .into_iter()
    .map(|(kw, cat)| (Regex::new(&format!("(?i){kw}")).expect("valid"), cat))
    .collect()
});

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Screenshot,
        Category::Accessibility,
        Category::Comparison,
        Category::System,
        Category::Recovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Screenshot => "screenshot",
            Category::Accessibility => "accessibility",
            Category::Comparison => "comparison",
            Category::System => "system",
            Category::Recovery => "recovery",
        }
    }

    /// Resolve the category of an entry.
    ///
    /// An explicit tag always wins. Otherwise the operation name is matched against the
    /// category keywords, then the message, and anything unmatched is `System`.
    pub fn infer(explicit: Option<Category>, operation_name: Option<&str>, message: &str) -> Self {
        if let Some(c) = explicit {
            return c;
        }
        operation_name
            .and_then(match_keyword)
            .or_else(|| match_keyword(message))
            .unwrap_or(Category::System)
    }
}

fn match_keyword(text: &str) -> Option<Category> {
    KEYWORDS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, cat)| *cat)
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_tag_wins_over_heuristics() {
        let c = Category::infer(Some(Category::Comparison), Some("screenshot-home"), "timeout");
        assert_eq!(c, Category::Comparison);
    }

    #[test]
    fn operation_name_checked_before_message() {
        let c = Category::infer(None, Some("runAccessibilityAudit"), "screenshot failed");
        assert_eq!(c, Category::Accessibility);
    }

    #[test]
    fn falls_back_to_message_then_system() {
        assert_eq!(
            Category::infer(None, Some("navigate"), "Screenshot buffer empty"),
            Category::Screenshot
        );
        assert_eq!(Category::infer(None, None, "boom"), Category::System);
    }
}
