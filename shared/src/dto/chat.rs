//! # Chat Data Transfer Objects
//!
//! Wire structures exchanged with the chat REST endpoints and the message broker.
//!
//! The backend speaks camelCase JSON, so every type here carries
//! `#[serde(rename_all = "camelCase")]`. Optional fields are omitted when `None`.

use serde::{Deserialize, Serialize};

/// A chat counterpart (staff member, student, or parent account).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Contact {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class_name: None,
            section: None,
        }
    }

    /// Label used in contact lists, e.g. `"Asha Rao (7-B)"`.
    pub fn display_label(&self) -> String {
        match (&self.class_name, &self.section) {
            (Some(class), Some(section)) => format!("{} ({}-{})", self.name, class, section),
            (Some(class), None) => format!("{} ({})", self.name, class),
            _ => self.name.clone(),
        }
    }
}

/// Remote reference to an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: u64,
}

/// Chat message as published to `/app/chat`, broadcast on `/topic/messages`,
/// and returned by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender_id: String,
    pub sender_name: String,
    pub recipient_id: String,
    pub recipient_name: String,
    #[serde(default)]
    pub content: String,
    /// RFC 3339 instant captured when the message was assembled.
    pub timestamp: String,
    pub school_id: String,
    pub session: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Client-generated id used to recognise the broker echoing our own sends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Message {
    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    /// Fresh client id for tagging an outgoing message.
    pub fn new_client_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Response body of `POST /chat/upload`.
///
/// Only `fileUrl` is guaranteed; the other fields override the locally known
/// values when the server normalises them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// Generic error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(alias = "message")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> Message {
        Message {
            sender_id: "t-1".to_string(),
            sender_name: "Meera".to_string(),
            recipient_id: "s-9".to_string(),
            recipient_name: "Ravi".to_string(),
            content: "Hello".to_string(),
            timestamp: "2026-10-16T09:00:00+00:00".to_string(),
            school_id: "sch-1".to_string(),
            session: "2026-27".to_string(),
            attachment: None,
            client_id: None,
        }
    }

    #[test]
    fn test_message_uses_camel_case_and_omits_absent_fields() {
        let json = serde_json::to_value(sample_message()).unwrap();

        assert_eq!(json["senderId"], "t-1");
        assert_eq!(json["recipientName"], "Ravi");
        assert_eq!(json["schoolId"], "sch-1");
        assert!(json.get("attachment").is_none());
        assert!(json.get("clientId").is_none());
    }

    #[test]
    fn test_message_parses_backend_payload_with_attachment() {
        let raw = r#"{
            "senderId": "s-9", "senderName": "Ravi",
            "recipientId": "t-1", "recipientName": "Meera",
            "content": "", "timestamp": "2026-10-16T09:01:00Z",
            "schoolId": "sch-1", "session": "2026-27",
            "attachment": {"fileName": "hw.pdf", "fileUrl": "http://x/hw.pdf",
                           "fileType": "application/pdf", "fileSize": 2048}
        }"#;

        let message: Message = serde_json::from_str(raw).unwrap();

        assert!(message.has_attachment());
        assert_eq!(message.attachment.unwrap().file_size, 2048);
        assert_eq!(message.client_id, None);
    }

    #[test]
    fn test_message_missing_required_field_is_rejected() {
        let raw = r#"{"senderId": "s-9", "content": "hi"}"#;
        assert!(serde_json::from_str::<Message>(raw).is_err());
    }

    #[test]
    fn test_contact_display_label() {
        let mut contact = Contact::new("s-9", "Ravi");
        assert_eq!(contact.display_label(), "Ravi");

        contact.class_name = Some("7".to_string());
        assert_eq!(contact.display_label(), "Ravi (7)");

        contact.section = Some("B".to_string());
        assert_eq!(contact.display_label(), "Ravi (7-B)");
    }

    #[test]
    fn test_upload_response_only_requires_file_url() {
        let response: UploadResponse = serde_json::from_str(r#"{"fileUrl":"http://x/f.png"}"#).unwrap();
        assert_eq!(response.file_url, "http://x/f.png");
        assert_eq!(response.file_name, None);
    }
}
