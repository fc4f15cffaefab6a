// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encoder for markup streams.
//!
//! Hosts that produce plain strings use this to hand over styled lines, and
//! tests use it to write readable fixtures.

use chatline_core::types::Markup;

use crate::integer::write_packed;
use crate::payload::link_kind;
use crate::raw::{COLOUR_POP, LINK_TERMINATOR};
use crate::token::{kind, END, START};

/// Padding that follows the id in party finder and achievement payloads.
const LINK_TAIL: [u8; 4] = [0x01, 0x01, 0xFF, 0x01];

/// Chaining builder for a [`Markup`] stream.
///
/// ```
/// use chatline_markup::MarkupBuilder;
///
/// let markup = MarkupBuilder::new()
///     .italic(true)
///     .text("Hi")
///     .italic(false)
///     .build();
/// assert!(!markup.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct MarkupBuilder {
    bytes: Vec<u8>,
}

impl MarkupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal text. Frame start bytes are dropped so text can never open a macro.
    pub fn text(mut self, text: &str) -> Self {
        self.bytes
            .extend(text.as_bytes().iter().copied().filter(|b| *b != START));
        self
    }

    pub fn new_line(self) -> Self {
        self.frame(kind::NEW_LINE, &[])
    }

    pub fn italic(self, on: bool) -> Self {
        self.integer_frame(kind::ITALIC, u32::from(on))
    }

    /// UI foreground colour as RGBA; `0` closes the innermost colour.
    pub fn foreground(self, rgba: u32) -> Self {
        self.integer_frame(kind::UI_FOREGROUND, rgba)
    }

    /// UI glow colour as RGBA; `0` closes the innermost glow.
    pub fn glow(self, rgba: u32) -> Self {
        self.integer_frame(kind::UI_GLOW, rgba)
    }

    /// Raw colour payload carrying an ARGB value.
    pub fn colour(self, argb: u32) -> Self {
        self.integer_frame(kind::COLOUR, argb)
    }

    pub fn colour_pop(self) -> Self {
        self.frame(kind::COLOUR, &[COLOUR_POP])
    }

    /// Raw edge glow: `Some((r, g, b))` opens when nothing is open, any form closes.
    pub fn edge_glow(self, rgb: Option<(u8, u8, u8)>) -> Self {
        match rgb {
            Some((r, g, b)) => self.frame(kind::EDGE_COLOUR, &[0xF6, r, g, b]),
            None => self.frame(kind::EDGE_COLOUR, &[COLOUR_POP]),
        }
    }

    pub fn icon(self, icon: u32) -> Self {
        self.integer_frame(kind::ICON, icon)
    }

    /// An auto-translate phrase, already resolved to text by the host.
    pub fn auto_translate(self, group: u32, key: u32, phrase: &str) -> Self {
        let mut body = Vec::new();
        write_packed(&mut body, group);
        write_packed(&mut body, key);
        body.extend_from_slice(phrase.as_bytes());
        self.frame(kind::AUTO_TRANSLATE, &body)
    }

    pub fn player_link(self, name: &str, world_id: u32) -> Self {
        let mut body = vec![link_kind::PLAYER];
        write_packed(&mut body, world_id);
        body.extend_from_slice(name.as_bytes());
        self.frame(kind::LINK, &body)
    }

    pub fn item_link(self, item_id: u32) -> Self {
        self.link_frame(link_kind::ITEM, &[item_id])
    }

    pub fn map_link(self, territory_id: u32, map_id: u32, x: u32, y: u32) -> Self {
        self.link_frame(link_kind::MAP, &[territory_id, map_id, x, y])
    }

    pub fn quest_link(self, quest_id: u32) -> Self {
        self.link_frame(link_kind::QUEST, &[quest_id])
    }

    pub fn status_link(self, status_id: u32) -> Self {
        self.link_frame(link_kind::STATUS, &[status_id])
    }

    pub fn party_finder_notification(self, listing_id: u32) -> Self {
        self.link_frame(link_kind::PARTY_FINDER_NOTIFICATION, &[listing_id])
    }

    pub fn plugin_link(self, plugin: &str, command_id: u32) -> Self {
        let mut body = vec![link_kind::PLUGIN];
        write_packed(&mut body, command_id);
        body.extend_from_slice(plugin.as_bytes());
        self.frame(kind::LINK, &body)
    }

    pub fn party_finder(self, listing_id: u32) -> Self {
        self.padded_link(link_kind::PARTY_FINDER, listing_id)
    }

    pub fn achievement(self, achievement_id: u32) -> Self {
        self.padded_link(link_kind::ACHIEVEMENT, achievement_id)
    }

    pub fn link_terminator(mut self) -> Self {
        self.bytes.extend_from_slice(&LINK_TERMINATOR);
        self
    }

    pub fn nbsp(self) -> Self {
        self.frame(kind::NON_BREAKING_SPACE, &[])
    }

    /// Appends bytes verbatim, framed or not.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Markup {
        Markup(self.bytes)
    }

    fn frame(mut self, kind: u8, body: &[u8]) -> Self {
        self.bytes.push(START);
        self.bytes.push(kind);
        write_packed(&mut self.bytes, body.len() as u32);
        self.bytes.extend_from_slice(body);
        self.bytes.push(END);
        self
    }

    fn integer_frame(self, kind: u8, value: u32) -> Self {
        let mut body = Vec::with_capacity(5);
        write_packed(&mut body, value);
        self.frame(kind, &body)
    }

    fn link_frame(self, subtype: u8, values: &[u32]) -> Self {
        let mut body = vec![subtype];
        for value in values {
            write_packed(&mut body, *value);
        }
        self.frame(kind::LINK, &body)
    }

    fn padded_link(self, subtype: u8, id: u32) -> Self {
        let mut body = vec![subtype];
        write_packed(&mut body, id);
        body.extend_from_slice(&LINK_TAIL);
        self.frame(kind::LINK, &body)
    }
}
