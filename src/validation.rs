//! Submission checks run before anything reaches the store.

use url::Url;

use crate::models::{Category, NewFact};

pub const MAX_TEXT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("text is empty")]
    EmptyText,

    #[error("text is {len} characters (max {max})", max = MAX_TEXT_CHARS)]
    TextTooLong { len: usize },

    #[error("no category selected")]
    EmptyCategory,

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("invalid source: {0}")]
    InvalidSource(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("submission rejected: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Characters left before hitting the text limit. Negative once over.
pub fn remaining_chars(text: &str) -> i64 {
    MAX_TEXT_CHARS as i64 - text.chars().count() as i64
}

pub fn is_submittable(text: &str, source: &str, category: &str) -> bool {
    text_issue(text).is_none() && !category.is_empty() && source_issue(source).is_none()
}

/// Checks every rule and returns the typed draft, or all the rules that failed.
pub fn validate_submission(
    text: &str,
    source: &str,
    category: &str,
) -> Result<NewFact, ValidationError> {
    let mut issues = Vec::new();

    if let Some(issue) = text_issue(text) {
        issues.push(issue);
    }
    if let Some(issue) = source_issue(source) {
        issues.push(issue);
    }

    let parsed_category = if category.is_empty() {
        issues.push(ValidationIssue::EmptyCategory);
        None
    } else {
        match category.parse::<Category>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                issues.push(ValidationIssue::UnknownCategory(category.to_string()));
                None
            }
        }
    };

    match parsed_category {
        Some(category) if issues.is_empty() => Ok(NewFact {
            text: text.to_string(),
            source: source.to_string(),
            category,
        }),
        _ => Err(ValidationError { issues }),
    }
}

fn text_issue(text: &str) -> Option<ValidationIssue> {
    let len = text.chars().count();
    if len == 0 {
        Some(ValidationIssue::EmptyText)
    } else if len > MAX_TEXT_CHARS {
        Some(ValidationIssue::TextTooLong { len })
    } else {
        None
    }
}

fn source_issue(source: &str) -> Option<ValidationIssue> {
    match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => None,
        Ok(url) => Some(ValidationIssue::InvalidSource(format!(
            "unsupported scheme '{}'",
            url.scheme()
        ))),
        Err(err) => Some(ValidationIssue::InvalidSource(err.to_string())),
    }
}
