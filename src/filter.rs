//! Event admission: severity threshold and category allow-list
//!
//! Every event entering the retention store passes through here. A
//! rejected event is a normal outcome and leaves no trace.

use std::collections::BTreeSet;

use crate::event::RawEvent;
use crate::severity::Severity;

/// An event that passed the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub severity: Severity,
    pub category: String,
    pub message: String,
}

/// Decides which raw events enter the retention store
#[derive(Debug, Clone)]
pub struct EventFilter {
    minimum_severity: Severity,
    /// `None` accepts every category
    category_filter: Option<BTreeSet<String>>,
}

impl EventFilter {
    pub fn new(minimum_severity: Severity, category_filter: Option<BTreeSet<String>>) -> Self {
        Self {
            minimum_severity,
            category_filter,
        }
    }

    /// Apply the filter to a raw event
    ///
    /// Severity is checked before the text is parsed. Returns `None` for
    /// events below the threshold, without a parseable `[category]`
    /// prefix, or whose category is outside the allow-list.
    pub fn accept(&self, event: &RawEvent) -> Option<Accepted> {
        let severity = Severity::from(event.kind);
        if severity < self.minimum_severity {
            return None;
        }

        let (category, message) = split_category(&event.text)?;

        if let Some(allowed) = &self.category_filter {
            if !allowed.contains(category) {
                return None;
            }
        }

        Some(Accepted {
            severity,
            category: category.to_string(),
            message: message.to_string(),
        })
    }
}

/// Split a `[category] message` line
///
/// Returns `None` when the prefix is missing, unterminated, or empty;
/// such text carries no category and cannot be attributed.
fn split_category(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('[')?;
    let close = rest.find(']')?;
    let category = &rest[..close];
    if category.is_empty() {
        return None;
    }
    Some((category, rest[close + 1..].trim_start()))
}
