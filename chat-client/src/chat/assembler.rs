//! # Message Assembler
//!
//! Pure construction of outgoing [`Message`] records from compose-box state.

use chrono::{DateTime, SecondsFormat, Utc};
use shared::dto::chat::{Attachment, Contact, Message};

/// Who is sending, and in which school context.
///
/// Passed in explicitly by the host; nothing is looked up from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub id: String,
    pub name: String,
    pub school_id: String,
    /// Academic session, e.g. `"2026-27"`
    pub session: String,
}

impl SenderIdentity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        school_id: impl Into<String>,
        session: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            school_id: school_id.into(),
            session: session.into(),
        }
    }
}

/// Why a send request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Blank content and no attachment
    EmptyMessage,
    NoContactSelected,
}

/// Check whether a send would produce a message at all.
pub fn check_sendable(content: &str, has_attachment: bool, contact: Option<&Contact>) -> Result<(), IgnoreReason> {
    if contact.is_none() {
        return Err(IgnoreReason::NoContactSelected);
    }
    if content.trim().is_empty() && !has_attachment {
        return Err(IgnoreReason::EmptyMessage);
    }
    Ok(())
}

/// Build a message stamped with the current time. `None` when nothing should be sent.
///
/// Content goes out exactly as typed; whitespace only decides whether it is blank.
pub fn assemble(
    content: &str,
    contact: Option<&Contact>,
    sender: &SenderIdentity,
    attachment: Option<Attachment>,
) -> Option<Message> {
    assemble_at(content, contact, sender, attachment, Utc::now())
}

/// [`assemble`] with an explicit capture instant.
pub fn assemble_at(
    content: &str,
    contact: Option<&Contact>,
    sender: &SenderIdentity,
    attachment: Option<Attachment>,
    now: DateTime<Utc>,
) -> Option<Message> {
    check_sendable(content, attachment.is_some(), contact).ok()?;
    let contact = contact?;

    Some(Message {
        sender_id: sender.id.clone(),
        sender_name: sender.name.clone(),
        recipient_id: contact.id.clone(),
        recipient_name: contact.name.clone(),
        content: content.to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        school_id: sender.school_id.clone(),
        session: sender.session.clone(),
        attachment,
        client_id: Some(Message::new_client_id()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn me() -> SenderIdentity {
        SenderIdentity::new("t-1", "Meera", "sch-1", "2026-27")
    }

    fn contact_x() -> Contact {
        Contact::new("s-9", "Ravi")
    }

    fn photo() -> Attachment {
        Attachment {
            file_name: "photo.png".to_string(),
            file_url: "http://x/f.png".to_string(),
            file_type: "image/png".to_string(),
            file_size: 4,
        }
    }

    #[test]
    fn test_assemble_text_message() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();

        let message = assemble_at("Hello", Some(&contact_x()), &me(), None, now).unwrap();

        assert_eq!(message.sender_id, "t-1");
        assert_eq!(message.sender_name, "Meera");
        assert_eq!(message.recipient_id, "s-9");
        assert_eq!(message.recipient_name, "Ravi");
        assert_eq!(message.content, "Hello");
        assert_eq!(message.timestamp, "2026-10-16T09:30:00.000Z");
        assert_eq!(message.school_id, "sch-1");
        assert_eq!(message.session, "2026-27");
        assert_eq!(message.attachment, None);
        assert!(message.client_id.is_some());
    }

    #[test]
    fn test_attachment_only_message_has_empty_content() {
        let message = assemble("", Some(&contact_x()), &me(), Some(photo())).unwrap();

        assert_eq!(message.content, "");
        assert_eq!(message.attachment.unwrap().file_url, "http://x/f.png");
    }

    #[test]
    fn test_blank_content_without_attachment_is_refused() {
        assert_eq!(assemble("", Some(&contact_x()), &me(), None), None);
        assert_eq!(assemble(" \n\t", Some(&contact_x()), &me(), None), None);
    }

    #[test]
    fn test_no_contact_is_refused() {
        assert_eq!(assemble("Hi", None, &me(), None), None);
        assert_eq!(assemble("", None, &me(), Some(photo())), None);
    }

    #[test]
    fn test_check_sendable_reasons() {
        assert_eq!(check_sendable("Hi", false, None), Err(IgnoreReason::NoContactSelected));
        assert_eq!(check_sendable("  ", false, Some(&contact_x())), Err(IgnoreReason::EmptyMessage));
        assert_eq!(check_sendable("  ", true, Some(&contact_x())), Ok(()));
    }

    #[test]
    fn test_content_is_sent_as_typed() {
        let typed = "  see you at 9\n  - bring the register\n";

        let message = assemble(typed, Some(&contact_x()), &me(), None).unwrap();

        assert_eq!(message.content, typed);
    }

    #[test]
    fn test_each_message_gets_its_own_client_id() {
        let a = assemble("one", Some(&contact_x()), &me(), None).unwrap();
        let b = assemble("two", Some(&contact_x()), &me(), None).unwrap();
        assert_ne!(a.client_id, b.client_id);
    }
}
