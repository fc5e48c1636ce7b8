// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event pattern matching and subscriptions

/// Pattern for matching event names
///
/// Supports:
///   - Exact: "record:saved"
///   - Single wildcard: "record:*" matches "record:saved", "record:updated"
///   - Tail wildcard: "sync:**" matches every sync event
///
/// The pattern is split into segments once, at construction.
#[derive(Clone, Debug)]
pub struct EventPattern {
    raw: String,
    segments: Vec<String>,
}

impl EventPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = if pattern.is_empty() {
            Vec::new()
        } else {
            pattern.split(':').map(str::to_string).collect()
        };
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// Check if this pattern matches an event name
    pub fn matches(&self, event_name: &str) -> bool {
        // Empty pattern matches nothing
        if self.segments.is_empty() {
            return false;
        }
        if self.raw == "*" {
            return true;
        }

        let mut event = event_name.split(':');
        for segment in &self.segments {
            if segment == "**" {
                return true;
            }
            match event.next() {
                Some(part) if segment == "*" || segment == part => {}
                _ => return false,
            }
        }
        event.next().is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl From<&str> for EventPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

/// Subscriber handle for unsubscribing
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub String);

/// A subscription to specific event patterns
#[derive(Clone, Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub patterns: Vec<EventPattern>,
    pub description: String,
}

impl Subscription {
    pub fn new(
        id: impl Into<String>,
        patterns: Vec<EventPattern>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: SubscriberId(id.into()),
            patterns,
            description: description.into(),
        }
    }

    /// Subscription that receives every event
    pub fn everything(id: impl Into<String>) -> Self {
        Self::new(id, vec![EventPattern::new("**")], "all events")
    }

    /// Check if any pattern matches the event
    pub fn matches(&self, event_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(event_name))
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
