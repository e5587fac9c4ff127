use serde::{Deserialize, Serialize};

use super::User;

/// Maximum characters of a message shown in a preview row
const PREVIEW_MAX_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Private,
    Group,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Media,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    /// Unix seconds
    pub timestamp: i64,
    pub sender: User,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "isForwarded", default)]
    pub forwarded: bool,
}

impl Message {
    /// One-line summary for list views
    pub fn summary(&self) -> String {
        match self.kind {
            MessageKind::Media => "[photo]".to_string(),
            _ if self.content.chars().count() > PREVIEW_MAX_CHARS => {
                let head: String = self.content.chars().take(PREVIEW_MAX_CHARS).collect();
                format!("{}…", head)
            }
            _ => self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPreview {
    pub id: i64,
    pub name: String,
    #[serde(rename = "conversationPhoto", default)]
    pub photo: Option<String>,
    #[serde(rename = "conversationType")]
    pub kind: ConversationKind,
    #[serde(rename = "latestMessage", default)]
    pub latest_message: Option<Message>,
}

impl ConversationPreview {
    pub fn preview_line(&self) -> String {
        match &self.latest_message {
            Some(msg) => format!("{}: {}", msg.sender.username, msg.summary()),
            None => "(no messages yet)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREVIEW_JSON: &str = r#"[
        {"id": 1, "name": "mario", "conversationPhoto": null, "conversationType": "private",
         "latestMessage": {"id": 10, "timestamp": 1700000000, "sender": {"id": 2, "username": "mario", "profile-photo": ""},
                           "type": "text", "content": "ciao!", "media": null, "status": "sent", "isForwarded": false}},
        {"id": 2, "name": "team", "conversationPhoto": "aGk=", "conversationType": "group", "latestMessage": null}
    ]"#;

    #[test]
    fn test_parse_conversation_previews() {
        let previews: Vec<ConversationPreview> = serde_json::from_str(PREVIEW_JSON).unwrap();
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].kind, ConversationKind::Private);
        assert_eq!(previews[0].preview_line(), "mario: ciao!");
        assert_eq!(previews[1].kind, ConversationKind::Group);
        assert_eq!(previews[1].preview_line(), "(no messages yet)");
    }

    #[test]
    fn test_unknown_kinds_do_not_fail_parsing() {
        let json = r#"{"id": 5, "name": "x", "conversationType": "channel"}"#;
        let preview: ConversationPreview = serde_json::from_str(json).unwrap();
        assert_eq!(preview.kind, ConversationKind::Unknown);
    }

    #[test]
    fn test_message_summary_truncates_and_labels_media() {
        let sender = User {
            id: 1,
            username: "a".to_string(),
            profile_photo: None,
        };
        let mut msg = Message {
            id: 1,
            timestamp: 0,
            sender,
            kind: MessageKind::Text,
            content: "x".repeat(50),
            media: None,
            status: "sent".to_string(),
            forwarded: false,
        };
        assert_eq!(msg.summary().chars().count(), PREVIEW_MAX_CHARS + 1);

        msg.kind = MessageKind::Media;
        assert_eq!(msg.summary(), "[photo]");
    }
}
