// wweb Engine: Default Command Table
//
// Ordered (matcher, action) pairs scanned top to bottom by the dispatcher;
// the first match wins and scanning stops. More specific entries must come
// before broader ones that would also match (`shadowed()` reports mistakes).
//
// Actions check their own preconditions and return
// `EngineError::Precondition(explanation)`; the dispatcher replies with it.

use super::driver::SessionDriver;
use crate::atoms::constants::{GROUP_ONLY_REPLY, MUTE_SECS, RESEND_MEDIA_CAPTION, WIRE_USER_SUFFIX};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{
    Buttons, Chat, ChatAction, Content, List, ListRow, ListSection, Location, Message, SendOptions,
};
use log::{debug, info};

// ── Matching ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Exact(&'static str),
    /// Literal prefix; the text after it is the command argument.
    Prefix(&'static str),
}

impl Matcher {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Exact(lit) => text == *lit,
            Matcher::Prefix(lit) => text.starts_with(lit),
        }
    }

    pub fn literal(&self) -> &'static str {
        match self {
            Matcher::Exact(lit) | Matcher::Prefix(lit) => lit,
        }
    }

    /// Text following the literal ("" for exact matches).
    pub fn argument<'a>(&self, text: &'a str) -> &'a str {
        match self {
            Matcher::Exact(_) => "",
            Matcher::Prefix(lit) => text.get(lit.len()..).unwrap_or(""),
        }
    }
}

// ── Actions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PingReply,
    Ping,
    Echo,
    SendTo,
    Chats,
    Info,
    MediaInfo,
    QuoteInfo,
    ResendMedia,
    Location,
    Status,
    Mention,
    Delete,
    Pin,
    Archive,
    Mute,
    Typing,
    Recording,
    ClearState,
    JumpTo,
    Buttons,
    List,
    Reaction,
    Join,
    Leave,
    GroupInfo,
    Subject,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub matcher: Matcher,
    pub action: Action,
}

const fn exact(lit: &'static str, action: Action) -> Command {
    Command { matcher: Matcher::Exact(lit), action }
}

const fn prefix(lit: &'static str, action: Action) -> Command {
    Command { matcher: Matcher::Prefix(lit), action }
}

pub const DEFAULT_COMMANDS: &[Command] = &[
    // personal chats
    exact("!ping reply", Action::PingReply),
    exact("!ping", Action::Ping),
    prefix("!echo ", Action::Echo),
    prefix("!sendto ", Action::SendTo),
    exact("!chats", Action::Chats),
    exact("!info", Action::Info),
    exact("!mediainfo", Action::MediaInfo),
    exact("!quoteinfo", Action::QuoteInfo),
    exact("!resendmedia", Action::ResendMedia),
    exact("!location", Action::Location),
    prefix("!status ", Action::Status),
    exact("!mention", Action::Mention),
    exact("!delete", Action::Delete),
    exact("!pin", Action::Pin),
    exact("!archive", Action::Archive),
    exact("!mute", Action::Mute),
    exact("!typing", Action::Typing),
    exact("!recording", Action::Recording),
    exact("!clearstate", Action::ClearState),
    exact("!jumpto", Action::JumpTo),
    exact("!buttons", Action::Buttons),
    exact("!list", Action::List),
    exact("!reaction", Action::Reaction),
    // group chats
    prefix("!join ", Action::Join),
    exact("!leave", Action::Leave),
    exact("!groupinfo", Action::GroupInfo),
    prefix("!subject ", Action::Subject),
    prefix("!description ", Action::Description),
];

#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: Vec<Command>,
}

impl Default for CommandTable {
    fn default() -> Self {
        CommandTable::new(DEFAULT_COMMANDS.to_vec())
    }
}

impl CommandTable {
    pub fn new(commands: Vec<Command>) -> Self {
        CommandTable { commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// First entry whose matcher accepts `text`.
    pub fn find(&self, text: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.matcher.matches(text))
    }

    /// `(earlier, later)` index pairs where the earlier entry would match
    /// the later entry's literal, so the later one can never fire for it.
    pub fn shadowed(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (j, later) in self.commands.iter().enumerate() {
            for (i, earlier) in self.commands[..j].iter().enumerate() {
                if earlier.matcher.matches(later.matcher.literal()) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

// ── Execution ──────────────────────────────────────────────────────────

impl Command {
    pub async fn run(&self, driver: &dyn SessionDriver, msg: &Message) -> EngineResult<()> {
        let arg = self.matcher.argument(&msg.body);
        debug!("[dispatch] {:?} for {}", self.action, msg.id);

        match self.action {
            Action::PingReply => {
                driver.reply(msg, "pong".into()).await?;
            }
            Action::Ping => {
                driver.send_message(&msg.from, "pong".into(), SendOptions::default()).await?;
            }
            Action::Echo => {
                driver.reply(msg, arg.into()).await?;
            }
            Action::SendTo => {
                let (number, text) = arg
                    .split_once(' ')
                    .map(|(n, t)| (n, t.trim_start()))
                    .filter(|(n, t)| !n.is_empty() && !t.is_empty())
                    .ok_or_else(|| EngineError::precondition("Usage: !sendto <number> <message>"))?;
                let to = if number.contains(WIRE_USER_SUFFIX) {
                    number.to_string()
                } else {
                    format!("{}{}", number, WIRE_USER_SUFFIX)
                };
                driver.update_chat(msg.chat_id(), ChatAction::SendSeen).await?;
                driver.send_message(&to, text.into(), SendOptions::default()).await?;
            }
            Action::Chats => {
                let chats = driver.chats().await?;
                let text = format!("The bot has {} chats open.", chats.len());
                driver.send_message(&msg.from, text.into(), SendOptions::default()).await?;
            }
            Action::Info => {
                let info = driver.info().await?;
                let text = format!(
                    "*Connection info*\nUser name: {}\nMy number: {}\nPlatform: {}",
                    info.pushname, info.number, info.platform
                );
                driver.send_message(&msg.from, text.into(), SendOptions::default()).await?;
            }
            Action::MediaInfo => {
                if !msg.has_media {
                    return Err(EngineError::precondition("This message has no media attached."));
                }
                let media = driver.download_media(&msg.id).await?;
                let text = format!(
                    "*Media info*\nMimeType: {}\nFilename: {}\nData (length): {}",
                    media.mimetype,
                    media.filename.as_deref().unwrap_or("-"),
                    media.data.len()
                );
                driver.reply(msg, text.into()).await?;
            }
            Action::QuoteInfo => {
                let quoted = quoted(driver, msg).await?;
                let text = format!(
                    "*Quoted message info*\nID: {}\nType: {}\nAuthor: {}\nTimestamp: {}\nHas Media? {}",
                    quoted.id,
                    quoted.kind,
                    quoted.sender_id(),
                    quoted.timestamp,
                    quoted.has_media
                );
                driver.reply(&quoted, text.into()).await?;
            }
            Action::ResendMedia => {
                let quoted = quoted(driver, msg).await?;
                if !quoted.has_media {
                    return Err(EngineError::precondition("The quoted message has no media."));
                }
                let media = driver.download_media(&quoted.id).await?;
                let options = SendOptions {
                    caption: Some(RESEND_MEDIA_CAPTION.into()),
                    ..Default::default()
                };
                driver.send_message(&msg.from, media.into(), options).await?;
            }
            Action::Location => {
                let location = Location {
                    latitude: 37.422,
                    longitude: -122.084,
                    description: Some("Googleplex\nGoogle Headquarters".into()),
                };
                driver.reply(msg, location.into()).await?;
            }
            Action::Status => {
                let status = arg.trim();
                if status.is_empty() {
                    return Err(EngineError::precondition("Usage: !status <text>"));
                }
                driver.set_status(status).await?;
                driver.reply(msg, format!("Status was updated to *{}*", status).into()).await?;
            }
            Action::Mention => {
                let contact = driver.contact(msg.sender_id()).await?;
                let options = SendOptions {
                    mentions: vec![contact.id.clone()],
                    ..Default::default()
                };
                let text = format!("Hi @{}!", contact.number);
                driver.send_message(msg.chat_id(), text.into(), options).await?;
            }
            Action::Delete => {
                let quoted = quoted(driver, msg).await?;
                if !quoted.from_me {
                    return Err(EngineError::precondition("I can only delete my own messages"));
                }
                driver.delete_message(&quoted.id, true).await?;
            }
            Action::Pin => driver.update_chat(msg.chat_id(), ChatAction::Pin).await?,
            Action::Archive => driver.update_chat(msg.chat_id(), ChatAction::Archive).await?,
            Action::Mute => {
                let until = chrono::Utc::now() + chrono::Duration::seconds(MUTE_SECS);
                driver.update_chat(msg.chat_id(), ChatAction::MuteUntil(until)).await?;
            }
            Action::Typing => driver.update_chat(msg.chat_id(), ChatAction::SendStateTyping).await?,
            Action::Recording => driver.update_chat(msg.chat_id(), ChatAction::SendStateRecording).await?,
            Action::ClearState => driver.update_chat(msg.chat_id(), ChatAction::ClearState).await?,
            Action::JumpTo => {
                let quoted = quoted(driver, msg).await?;
                driver.open_chat_window_at(&quoted.id).await?;
            }
            Action::Buttons => {
                let buttons = Buttons {
                    body: "Button body".into(),
                    buttons: vec!["bt1".into(), "bt2".into(), "bt3".into()],
                    title: Some("title".into()),
                    footer: Some("footer".into()),
                };
                driver.send_message(&msg.from, Content::Buttons(buttons), SendOptions::default()).await?;
            }
            Action::List => {
                let list = List {
                    body: "List body".into(),
                    button_text: "btnText".into(),
                    sections: vec![ListSection {
                        title: "sectionTitle".into(),
                        rows: vec![
                            ListRow { title: "ListItem1".into(), description: Some("desc".into()) },
                            ListRow { title: "ListItem2".into(), description: None },
                        ],
                    }],
                    title: Some("Title".into()),
                    footer: Some("footer".into()),
                };
                driver.send_message(&msg.from, Content::List(list), SendOptions::default()).await?;
            }
            Action::Reaction => driver.react(&msg.id, "👍").await?,
            Action::Join => {
                let code = arg.split_whitespace().next().unwrap_or("");
                match driver.accept_invite(code).await {
                    Ok(chat_id) => {
                        info!("[dispatch] Joined group {}", chat_id);
                        driver.reply(msg, "Joined the group!".into()).await?;
                    }
                    Err(e) => {
                        debug!("[dispatch] Invite {:?} rejected: {}", code, e);
                        driver.reply(msg, "That invite code seems to be invalid.".into()).await?;
                    }
                }
            }
            Action::Leave => {
                let chat = group_chat(driver, msg).await?;
                driver.update_chat(&chat.id, ChatAction::Leave).await?;
            }
            Action::GroupInfo => {
                let chat = group_chat(driver, msg).await?;
                let group = chat.group.unwrap_or_default();
                let text = format!(
                    "*Group Details*\nName: {}\nDescription: {}\nCreated At: {}\nCreated By: {}\nParticipant count: {}",
                    chat.name,
                    group.description.as_deref().unwrap_or(""),
                    group.created_at.map(|t| t.to_rfc2822()).unwrap_or_default(),
                    group.owner.as_deref().unwrap_or(""),
                    group.participants.len()
                );
                driver.reply(msg, text.into()).await?;
            }
            Action::Subject => {
                let chat = group_chat(driver, msg).await?;
                driver.update_chat(&chat.id, ChatAction::SetSubject(arg.to_string())).await?;
            }
            Action::Description => {
                let chat = group_chat(driver, msg).await?;
                driver.update_chat(&chat.id, ChatAction::SetDescription(arg.to_string())).await?;
            }
        }
        Ok(())
    }
}

async fn quoted(driver: &dyn SessionDriver, msg: &Message) -> EngineResult<Message> {
    const NO_QUOTE: &str = "Quote a message to use this command.";
    if !msg.has_quoted_msg {
        return Err(EngineError::precondition(NO_QUOTE));
    }
    driver
        .quoted_message(&msg.id)
        .await?
        .ok_or_else(|| EngineError::precondition(NO_QUOTE))
}

async fn group_chat(driver: &dyn SessionDriver, msg: &Message) -> EngineResult<Chat> {
    let chat = driver.chat(msg.chat_id()).await?;
    if !chat.is_group {
        return Err(EngineError::precondition(GROUP_ONLY_REPLY));
    }
    Ok(chat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_reply_beats_ping() {
        let table = CommandTable::default();
        assert_eq!(table.find("!ping reply").unwrap().action, Action::PingReply);
        assert_eq!(table.find("!ping").unwrap().action, Action::Ping);
    }

    #[test]
    fn prefix_commands_need_argument_separator() {
        let table = CommandTable::default();
        assert_eq!(table.find("!echo hi").unwrap().action, Action::Echo);
        assert!(table.find("!echo").is_none());
        assert!(table.find("!echoes").is_none());
    }

    #[test]
    fn unmatched_text_finds_nothing() {
        let table = CommandTable::default();
        assert!(table.find("hello there").is_none());
        assert!(table.find("!PING").is_none());
        assert!(table.find(" !ping").is_none());
    }

    #[test]
    fn default_table_has_no_shadowing() {
        assert!(CommandTable::default().shadowed().is_empty());
    }

    #[test]
    fn shadowing_is_detected() {
        let table = CommandTable::new(vec![
            prefix("!ping", Action::Ping),
            exact("!ping reply", Action::PingReply),
        ]);
        assert_eq!(table.shadowed(), vec![(0, 1)]);
        assert_eq!(table.find("!ping reply").unwrap().action, Action::Ping);
    }

    #[test]
    fn argument_is_text_after_prefix() {
        let m = Matcher::Prefix("!echo ");
        assert_eq!(m.argument("!echo hi there"), "hi there");
        assert_eq!(Matcher::Exact("!pin").argument("!pin"), "");
    }

    #[test]
    fn every_documented_trigger_is_routable() {
        let table = CommandTable::default();
        for text in [
            "!chats", "!info", "!mediainfo", "!quoteinfo", "!resendmedia", "!location",
            "!status busy", "!mention", "!delete", "!pin", "!archive", "!mute", "!typing",
            "!recording", "!clearstate", "!jumpto", "!buttons", "!list", "!reaction",
            "!join ABC", "!leave", "!groupinfo", "!subject New", "!description Desc",
            "!sendto 62811 hi",
        ] {
            assert!(table.find(text).is_some(), "{} should match", text);
        }
    }
}
