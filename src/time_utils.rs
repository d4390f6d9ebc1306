//! Time utility functions
//!
//! Relative time phrases for the "last contacted" line of the page.

use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;

/// Describe `then` relative to `now`, e.g. "5 minutes ago"
pub fn relative_to(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    HumanTime::from(then - now).to_string()
}

/// Describe the previous client contact, or "never" if there was none
pub fn describe_last_contact(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match last {
        Some(then) => relative_to(then, now),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_to_past() {
        let now = Utc::now();
        let text = relative_to(now - Duration::minutes(5), now);
        assert!(text.contains("minutes"), "unexpected: {}", text);
        assert!(text.ends_with("ago"), "unexpected: {}", text);
    }

    #[test]
    fn test_relative_to_hours() {
        let now = Utc::now();
        let text = relative_to(now - Duration::hours(3), now);
        assert!(text.contains("hours"), "unexpected: {}", text);
    }

    #[test]
    fn test_describe_last_contact_never() {
        assert_eq!(describe_last_contact(None, Utc::now()), "never");
    }

    #[test]
    fn test_describe_last_contact_some() {
        let now = Utc::now();
        let text = describe_last_contact(Some(now - Duration::days(2)), now);
        assert!(text.contains("days"), "unexpected: {}", text);
    }
}
