// ── wweb Atoms: Payload Types ──────────────────────────────────────────────
// Plain struct/enum definitions for everything that crosses the session
// boundary: events, messages, chats, outbound content.
// Atoms layer rule: no I/O, no side effects, no imports from engine/.
//
// Field names follow the web messaging library's JSON (camelCase) so the
// sidecar bridge can forward its objects unchanged.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Messages ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    /// Serialized message id.
    pub id: String,
    /// Library message type: "chat", "image", "location", "revoked"...
    #[serde(rename = "type")]
    pub kind: String,
    pub from: String,
    pub to: String,
    /// Group participant that sent the message (None in 1:1 chats).
    pub author: Option<String>,
    pub from_me: bool,
    pub notify_name: Option<String>,
    pub body: String,
    pub timestamp: i64,
    pub has_media: bool,
    pub has_quoted_msg: bool,
    pub location: Option<Location>,
}

impl Message {
    /// Chat the message belongs to, seen from this session.
    pub fn chat_id(&self) -> &str {
        if self.from_me { &self.to } else { &self.from }
    }

    /// Address of the person who wrote the message.
    pub fn sender_id(&self) -> &str {
        self.author.as_deref().unwrap_or(&self.from)
    }

    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from ", self.kind)?;
        if self.from_me {
            write!(f, "myself")?;
        } else {
            write!(f, "{}({})", self.from, self.notify_name.as_deref().unwrap_or("?"))?;
        }
        write!(f, " to {} -> {}", self.to, self.body)
    }
}

/// Delivery acknowledgement level reported for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum MessageAck {
    Failed,
    Pending,
    Server,
    Device,
    Read,
    Played,
}

impl TryFrom<i8> for MessageAck {
    type Error = String;

    fn try_from(code: i8) -> Result<Self, String> {
        match code {
            -1 => Ok(MessageAck::Failed),
            0 => Ok(MessageAck::Pending),
            1 => Ok(MessageAck::Server),
            2 => Ok(MessageAck::Device),
            3 => Ok(MessageAck::Read),
            4 => Ok(MessageAck::Played),
            other => Err(format!("unknown ack code {}", other)),
        }
    }
}

impl From<MessageAck> for i8 {
    fn from(ack: MessageAck) -> i8 {
        match ack {
            MessageAck::Failed => -1,
            MessageAck::Pending => 0,
            MessageAck::Server => 1,
            MessageAck::Device => 2,
            MessageAck::Read => 3,
            MessageAck::Played => 4,
        }
    }
}

// ── Chats, contacts, session info ──────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Chat {
    pub id: String,
    pub name: String,
    pub is_group: bool,
    /// Present only for group chats.
    pub group: Option<GroupMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupMetadata {
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// User part of the creator's address.
    pub owner: Option<String>,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub id: String,
    pub number: String,
    pub pushname: Option<String>,
}

/// Identity of the logged-in account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfo {
    pub pushname: String,
    /// User part of our own wire address.
    pub number: String,
    pub platform: String,
}

/// Group membership / metadata change delivered by the library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupNotification {
    pub id: String,
    pub chat_id: String,
    pub author: Option<String>,
    pub recipients: Vec<String>,
    /// "add", "remove", "leave", "invite", "subject", "description", "picture"...
    #[serde(rename = "type")]
    pub kind: String,
    pub body: String,
}

impl fmt::Display for GroupNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.kind, self.chat_id)?;
        if let Some(author) = &self.author {
            write!(f, " by {}", author)?;
        }
        if !self.recipients.is_empty() {
            write!(f, " [{}]", self.recipients.join(", "))?;
        }
        Ok(())
    }
}

// ── Outbound content ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMedia {
    pub mimetype: String,
    /// Base64 payload.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl MessageMedia {
    pub fn from_bytes(mimetype: impl Into<String>, bytes: &[u8], filename: Option<String>) -> Self {
        MessageMedia {
            mimetype: mimetype.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            filename,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buttons {
    pub body: String,
    pub buttons: Vec<String>,
    pub title: Option<String>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub body: String,
    pub button_text: String,
    pub sections: Vec<ListSection>,
    pub title: Option<String>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRow {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Anything the session can send into a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Media(MessageMedia),
    Location(Location),
    Buttons(Buttons),
    List(List),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<MessageMedia> for Content {
    fn from(m: MessageMedia) -> Self {
        Content::Media(m)
    }
}

impl From<Location> for Content {
    fn from(l: Location) -> Self {
        Content::Location(l)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Contact ids to mention.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_message_id: Option<String>,
}

/// Chat-level mutation understood by the session driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum ChatAction {
    SendSeen,
    Pin,
    Archive,
    MuteUntil(DateTime<Utc>),
    SendStateTyping,
    SendStateRecording,
    ClearState,
    Leave,
    SetSubject(String),
    SetDescription(String),
}

// ── Session events ─────────────────────────────────────────────────────────

/// Everything the session surfaces, tagged with the library's event names
/// so webhook payloads `{ "event": ..., "data": ... }` decode directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Event {
    #[serde(rename = "loading_screen")]
    Loading { percent: u8, message: String },
    #[serde(rename = "qr")]
    QrReceived(String),
    #[serde(rename = "authenticated")]
    Authenticated,
    #[serde(rename = "auth_failure")]
    AuthenticationFailed(String),
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "change_state")]
    StateChanged(String),
    #[serde(rename = "disconnected")]
    Disconnected(String),
    #[serde(rename = "message_create")]
    MessageCreated(Message),
    #[serde(rename = "message_revoke_everyone")]
    MessageRevokedByEveryone {
        after: Message,
        #[serde(default)]
        before: Option<Message>,
    },
    #[serde(rename = "message_revoke_me")]
    MessageRevokedByMe(Message),
    #[serde(rename = "message_ack")]
    MessageAcknowledged { message: Message, ack: MessageAck },
    #[serde(rename = "message")]
    InboundMessage(Message),
    #[serde(rename = "group_join")]
    UserJoined(GroupNotification),
    #[serde(rename = "group_leave")]
    UserLeft(GroupNotification),
    #[serde(rename = "group_update")]
    GroupUpdated(GroupNotification),
}

impl Event {
    /// Library event name, as used on the wire and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Loading { .. } => "loading_screen",
            Event::QrReceived(_) => "qr",
            Event::Authenticated => "authenticated",
            Event::AuthenticationFailed(_) => "auth_failure",
            Event::Ready => "ready",
            Event::StateChanged(_) => "change_state",
            Event::Disconnected(_) => "disconnected",
            Event::MessageCreated(_) => "message_create",
            Event::MessageRevokedByEveryone { .. } => "message_revoke_everyone",
            Event::MessageRevokedByMe(_) => "message_revoke_me",
            Event::MessageAcknowledged { .. } => "message_ack",
            Event::InboundMessage(_) => "message",
            Event::UserJoined(_) => "group_join",
            Event::UserLeft(_) => "group_leave",
            Event::GroupUpdated(_) => "group_update",
        }
    }

    /// Connection-state events, as opposed to message and group events.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Event::Loading { .. }
                | Event::QrReceived(_)
                | Event::Authenticated
                | Event::AuthenticationFailed(_)
                | Event::Ready
                | Event::StateChanged(_)
                | Event::Disconnected(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_display_names_sender() {
        let msg = Message {
            kind: "chat".into(),
            from: "6281@c.us".into(),
            to: "6282@c.us".into(),
            notify_name: Some("Budi".into()),
            body: "halo".into(),
            ..Default::default()
        };
        assert_eq!(msg.to_string(), "chat from 6281@c.us(Budi) to 6282@c.us -> halo");
    }

    #[test]
    fn message_display_own_message() {
        let msg = Message { kind: "chat".into(), from_me: true, to: "x@c.us".into(), body: "b".into(), ..Default::default() };
        assert_eq!(msg.to_string(), "chat from myself to x@c.us -> b");
    }

    #[test]
    fn chat_id_follows_direction() {
        let mut msg = Message { from: "a@c.us".into(), to: "b@c.us".into(), ..Default::default() };
        assert_eq!(msg.chat_id(), "a@c.us");
        msg.from_me = true;
        assert_eq!(msg.chat_id(), "b@c.us");
    }

    #[test]
    fn event_decodes_library_payloads() {
        let qr: Event = serde_json::from_value(json!({"event": "qr", "data": "2@abc"})).unwrap();
        assert_eq!(qr, Event::QrReceived("2@abc".into()));

        let ready: Event = serde_json::from_value(json!({"event": "ready", "data": null})).unwrap();
        assert_eq!(ready, Event::Ready);

        let loading: Event = serde_json::from_value(json!({
            "event": "loading_screen",
            "data": {"percent": 40, "message": "WhatsApp"}
        })).unwrap();
        assert_eq!(loading, Event::Loading { percent: 40, message: "WhatsApp".into() });
    }

    #[test]
    fn ack_event_decodes_numeric_code() {
        let ev: Event = serde_json::from_value(json!({
            "event": "message_ack",
            "data": {"message": {"id": "m1", "body": "x"}, "ack": 3}
        })).unwrap();
        match ev {
            Event::MessageAcknowledged { message, ack } => {
                assert_eq!(message.id, "m1");
                assert_eq!(ack, MessageAck::Read);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ack_rejects_unknown_code() {
        assert!(MessageAck::try_from(9).is_err());
        assert_eq!(i8::from(MessageAck::Failed), -1);
    }

    #[test]
    fn revoke_everyone_before_is_optional() {
        let ev: Event = serde_json::from_value(json!({
            "event": "message_revoke_everyone",
            "data": {"after": {"id": "m2", "type": "revoked"}}
        })).unwrap();
        assert!(matches!(ev, Event::MessageRevokedByEveryone { before: None, .. }));
    }

    #[test]
    fn lifecycle_classification() {
        assert!(Event::Ready.is_lifecycle());
        assert!(Event::Disconnected("NAVIGATION".into()).is_lifecycle());
        assert!(!Event::InboundMessage(Message::default()).is_lifecycle());
        assert_eq!(Event::GroupUpdated(GroupNotification::default()).name(), "group_update");
    }

    #[test]
    fn media_from_bytes_encodes_base64() {
        let media = MessageMedia::from_bytes("text/plain", b"hi", Some("a.txt".into()));
        assert_eq!(media.data, "aGk=");
    }
}
