// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the parser, the pipeline stages, the store and the relay.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Namespace for deriving stable message ids.
const MESSAGE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6c1e_9a4e_0f3b_4d8e_9d1a_53c2_77b0_a41f);

/// The chat channel portion of a [`ChatCode`] (its low seven bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatType(pub u8);

impl ChatType {
    pub const DEBUG: Self = Self(1);
    pub const URGENT: Self = Self(2);
    pub const NOTICE: Self = Self(3);
    pub const SAY: Self = Self(10);
    pub const SHOUT: Self = Self(11);
    pub const TELL_OUTGOING: Self = Self(12);
    pub const TELL_INCOMING: Self = Self(13);
    pub const PARTY: Self = Self(14);
    pub const ALLIANCE: Self = Self(15);
    pub const LINKSHELL_1: Self = Self(16);
    pub const FREE_COMPANY: Self = Self(24);
    pub const NOVICE_NETWORK: Self = Self(27);
    pub const CUSTOM_EMOTE: Self = Self(28);
    pub const STANDARD_EMOTE: Self = Self(29);
    pub const YELL: Self = Self(30);
    pub const CROSS_PARTY: Self = Self(32);
    pub const PVP_TEAM: Self = Self(36);
    pub const CROSS_LINKSHELL_1: Self = Self(37);
    pub const DAMAGE: Self = Self(41);
    pub const MISS: Self = Self(42);
    pub const ACTION: Self = Self(43);
    pub const ITEM: Self = Self(44);
    pub const HEALING: Self = Self(45);
    pub const GAIN_BUFF: Self = Self(46);
    pub const GAIN_DEBUFF: Self = Self(47);
    pub const LOSE_BUFF: Self = Self(48);
    pub const LOSE_DEBUFF: Self = Self(49);
    pub const ALARM: Self = Self(55);
    pub const ECHO: Self = Self(56);
    pub const SYSTEM: Self = Self(57);
    pub const BATTLE_SYSTEM: Self = Self(58);
    pub const GATHERING_SYSTEM: Self = Self(59);
    pub const ERROR: Self = Self(60);
    pub const NPC_DIALOGUE: Self = Self(61);
    pub const LOOT_NOTICE: Self = Self(62);
    pub const PROGRESS: Self = Self(64);
    pub const LOOT_ROLL: Self = Self(65);
    pub const CRAFTING: Self = Self(66);
    pub const GATHERING: Self = Self(67);
    pub const NPC_ANNOUNCEMENT: Self = Self(68);
    pub const RETAINER_SALE: Self = Self(71);
    pub const PERIODIC_RECRUITMENT: Self = Self(72);
    pub const RANDOM_NUMBER: Self = Self(74);

    /// Combat log categories, which are optionally kept out of the database.
    pub fn is_battle(self) -> bool {
        matches!(
            self,
            Self::DAMAGE
                | Self::MISS
                | Self::ACTION
                | Self::ITEM
                | Self::HEALING
                | Self::GAIN_BUFF
                | Self::LOSE_BUFF
                | Self::GAIN_DEBUFF
                | Self::LOSE_DEBUFF
                | Self::BATTLE_SYSTEM
        )
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw chat category code as emitted by the host.
///
/// Layout: bits 0..7 carry the [`ChatType`], bits 7..11 the target kind and
/// bits 11..15 the source kind. Source and target are exposed as single-bit
/// flags (`1 << kind`) so tab filters can test them with a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatCode(pub u16);

impl ChatCode {
    /// The chat channel of this code.
    pub fn chat_type(self) -> ChatType {
        ChatType((self.0 & 0x7F) as u8)
    }

    /// Source kind as a single-bit flag.
    pub fn source(self) -> u16 {
        1 << ((self.0 >> 11) & 0xF)
    }

    /// Target kind as a single-bit flag.
    pub fn target(self) -> u16 {
        1 << ((self.0 >> 7) & 0xF)
    }

    pub fn is_battle(self) -> bool {
        self.chat_type().is_battle()
    }
}

/// Raw markup bytes as produced by the host for one sender or content line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Markup(pub Vec<u8>);

impl Markup {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Markup {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Markup {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

/// A chat line exactly as the host reported it.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub code: ChatCode,
    pub sender_id: u32,
    pub sender: Markup,
    pub content: Markup,
}

/// Staging record passed from the capture stage to the worker.
///
/// Ownership moves through the two queues; no stage keeps a copy.
#[derive(Debug)]
pub struct PendingMessage {
    /// Local character the line was received on.
    pub receiver: u64,
    /// Resolved sender identity, `0` while unresolved.
    pub content_id: u64,
    pub code: ChatCode,
    pub sender_id: u32,
    pub sender: Markup,
    pub content: Markup,
}

/// Which half of a message a chunk was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkSource {
    /// Synthesised by the pipeline (for example sender name decoration).
    None,
    Sender,
    Content,
}

/// Identifier of an icon in the host's bitmap font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Icon(pub u32);

impl Icon {
    pub const AUTO_TRANSLATE_BEGIN: Self = Self(54);
    pub const AUTO_TRANSLATE_END: Self = Self(55);
}

/// What a span of chunks links to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    Player { name: String, world_id: u32 },
    Item { item_id: u32 },
    MapLink { territory_id: u32, map_id: u32, x: u32, y: u32 },
    Quest { quest_id: u32 },
    Status { status_id: u32 },
    /// Recruitment notice link carried by a typed link token.
    PartyFinderNotification { listing_id: u32 },
    /// Plugin command link.
    Plugin { plugin: String, command_id: u32 },
    /// The auto-translate phrase itself.
    AutoTranslate { group: u32, key: u32 },
    /// Party finder listing decoded from a vendor-specific raw token.
    PartyFinder { listing_id: u32 },
    /// Achievement reference decoded from a vendor-specific raw token.
    Achievement { achievement_id: u32 },
}

/// A run of styled text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub source: ChunkSource,
    pub link: Option<LinkTarget>,
    pub content: String,
    /// Foreground colour as RGBA.
    pub foreground: Option<u32>,
    /// Glow colour as RGBA.
    pub glow: Option<u32>,
    pub italic: bool,
    /// Category whose default colour applies when `foreground` is unset.
    pub fallback_colour: Option<ChatType>,
}

impl TextChunk {
    /// Plain text with no styling.
    pub fn plain(source: ChunkSource, content: impl Into<String>) -> Self {
        Self {
            source,
            link: None,
            content: content.into(),
            foreground: None,
            glow: None,
            italic: false,
            fallback_colour: None,
        }
    }
}

/// A single glyph from the icon font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconChunk {
    pub source: ChunkSource,
    pub link: Option<LinkTarget>,
    pub icon: Icon,
}

/// The parser's output unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    Text(TextChunk),
    Icon(IconChunk),
}

impl Chunk {
    pub fn link(&self) -> Option<&LinkTarget> {
        match self {
            Chunk::Text(text) => text.link.as_ref(),
            Chunk::Icon(icon) => icon.link.as_ref(),
        }
    }

    pub fn as_text(&self) -> Option<&TextChunk> {
        match self {
            Chunk::Text(text) => Some(text),
            Chunk::Icon(_) => None,
        }
    }
}

/// A fully processed, displayable chat line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub receiver: u64,
    /// Resolved sender identity, `None` when resolution failed or was impossible.
    pub content_id: Option<u64>,
    pub code: ChatCode,
    pub sender: Vec<Chunk>,
    pub content: Vec<Chunk>,
    #[serde(skip)]
    pub sender_source: Markup,
    #[serde(skip)]
    pub content_source: Markup,
    pub date: DateTime<Utc>,
}

impl Message {
    /// Build a message from processed parts, deriving its stable id.
    pub fn new(
        pending: PendingMessage,
        sender: Vec<Chunk>,
        content: Vec<Chunk>,
        date: DateTime<Utc>,
    ) -> Self {
        let id = Self::derive_id(
            pending.receiver,
            pending.code,
            &pending.sender,
            &pending.content,
            date,
        );
        Self {
            id,
            receiver: pending.receiver,
            content_id: (pending.content_id != 0).then_some(pending.content_id),
            code: pending.code,
            sender,
            content,
            sender_source: pending.sender,
            content_source: pending.content,
            date,
        }
    }

    /// Stable id over everything that identifies a line.
    ///
    /// The same line received twice at the same instant maps to the same id,
    /// which lets the store upsert instead of duplicating it.
    pub fn derive_id(
        receiver: u64,
        code: ChatCode,
        sender: &Markup,
        content: &Markup,
        date: DateTime<Utc>,
    ) -> Uuid {
        let mut name = Vec::with_capacity(20 + sender.0.len() + content.0.len());
        name.extend_from_slice(&receiver.to_le_bytes());
        name.extend_from_slice(&date.timestamp_micros().to_le_bytes());
        name.extend_from_slice(&code.0.to_le_bytes());
        name.extend_from_slice(&(sender.0.len() as u32).to_le_bytes());
        name.extend_from_slice(&sender.0);
        name.extend_from_slice(&content.0);
        Uuid::new_v5(&MESSAGE_ID_NAMESPACE, &name)
    }
}

/// Sender decoration for a chat type, e.g. `[` before and `] ` after a name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameFormat {
    pub before: String,
    pub after: String,
}

/// When a tab counts new messages as unread.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnreadMode {
    /// Every matching message is unread.
    #[default]
    All,
    /// Messages the user is already looking at are not unread.
    Unseen,
    /// Never show an unread marker.
    None,
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A one-off message surfaced to the user by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Result of a bulk read from the message store.
#[derive(Debug, Default)]
pub struct MessageBatch {
    /// Messages that were rebuilt successfully, oldest first.
    pub messages: Vec<Message>,
    /// Ids of rows that could not be rebuilt.
    pub failed_ids: Vec<Uuid>,
}

impl MessageBatch {
    pub fn did_error(&self) -> bool {
        !self.failed_ids.is_empty()
    }
}

/// Events pushed to relay subscribers, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    NewMessage { messages: Vec<Message> },
    SwitchChannel { channel_name: String },
    ChannelList { channels: BTreeMap<String, u32> },
}

impl RelayEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayEvent::NewMessage { .. } => "new_message",
            RelayEvent::SwitchChannel { .. } => "switch_channel",
            RelayEvent::ChannelList { .. } => "channel_list",
        }
    }
}
