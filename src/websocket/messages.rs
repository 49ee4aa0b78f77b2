/// Wire frame pushed to connected clients
use serde::{Deserialize, Serialize};

use crate::models::Notification;

/// The JSON text frame every live connection receives on a broadcast.
///
/// The shape is the notification itself; `icon` is omitted from the JSON when
/// absent so minimal clients see exactly `{title, body}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationFrame {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NotificationFrame {
    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<&Notification> for NotificationFrame {
    fn from(notification: &Notification) -> Self {
        Self {
            title: notification.title.clone(),
            body: notification.body.clone(),
            icon: notification.icon.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_without_icon_is_two_fields() {
        let frame = NotificationFrame::from(&Notification::new("Hi", "There", None));
        assert_eq!(frame.to_json().unwrap(), r#"{"title":"Hi","body":"There"}"#);
    }

    #[test]
    fn frame_carries_icon_when_present() {
        let frame =
            NotificationFrame::from(&Notification::new("Hi", "There", Some("bell.png".into())));
        let json = frame.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["icon"], "bell.png");
    }

    #[test]
    fn frame_round_trips() {
        let frame = NotificationFrame::from(&Notification::new("Hi", "There", None));
        let restored = NotificationFrame::from_json(&frame.to_json().unwrap()).unwrap();
        assert_eq!(restored, frame);
    }
}
