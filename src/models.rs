use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// One notification: constructed per request, fanned out, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, icon: Option<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon,
        }
    }

    /// Title and body must be present and non-empty. Whitespace counts as
    /// content; only the empty string fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.title.is_empty() || self.body.is_empty() {
            return Err(AppError::validation("Missing title or body"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_notification_passes_validation() {
        let notification = Notification::new("Hi", "There", None);
        assert!(notification.validate().is_ok());
    }

    #[test]
    fn empty_title_or_body_is_rejected() {
        for (title, body) in [("", "There"), ("Hi", ""), ("", "")] {
            let err = Notification::new(title, body, None).validate().unwrap_err();
            assert_eq!(err.to_string(), "Missing title or body");
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn whitespace_counts_as_content() {
        let notification = Notification::new(" ", "There", None);
        assert!(notification.validate().is_ok());
    }

    #[test]
    fn icon_is_skipped_when_absent() {
        let json = serde_json::to_value(Notification::new("Hi", "There", None)).unwrap();
        assert!(json.get("icon").is_none());

        let json =
            serde_json::to_value(Notification::new("Hi", "There", Some("bell.png".into()))).unwrap();
        assert_eq!(json["icon"], "bell.png");
    }
}
