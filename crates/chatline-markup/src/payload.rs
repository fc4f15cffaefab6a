// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed view over tokens.
//!
//! Known macro kinds decode into a [`Payload`] variant. Anything that is not
//! understood here, including known kinds with bodies that fail to decode,
//! is passed on as [`Payload::Raw`] for byte-layout inspection.

use chatline_core::types::{Icon, LinkTarget};

use crate::integer::read_packed;
use crate::token::{kind, MacroToken, Token};

/// Link subtypes that decode into a typed [`LinkTarget`].
pub mod link_kind {
    pub const PLAYER: u8 = 0x01;
    pub const ITEM: u8 = 0x03;
    pub const ACHIEVEMENT: u8 = 0x06;
    pub const MAP: u8 = 0x04;
    pub const QUEST: u8 = 0x05;
    pub const PARTY_FINDER_NOTIFICATION: u8 = 0x08;
    pub const STATUS: u8 = 0x09;
    pub const PARTY_FINDER: u8 = 0x0A;
    pub const PLUGIN: u8 = 0x0F;
    pub const TERMINATOR: u8 = 0xCF;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<'a> {
    Text(&'a [u8]),
    NewLine,
    Italic(bool),
    /// Foreground colour as RGBA; `None` closes the innermost colour.
    Foreground(Option<u32>),
    /// Glow colour as RGBA; `None` closes the innermost glow.
    Glow(Option<u32>),
    Icon(Icon),
    AutoTranslate { group: u32, key: u32, phrase: String },
    Link(LinkTarget),
    Raw(&'a [u8]),
}

impl<'a> Payload<'a> {
    pub fn classify(token: Token<'a>) -> Self {
        match token {
            Token::Text(text) => Payload::Text(text),
            Token::Malformed(raw) => Payload::Raw(raw),
            Token::Macro(m) => decode_macro(m).unwrap_or(Payload::Raw(m.raw)),
        }
    }
}

fn single_integer(body: &[u8]) -> Option<u32> {
    let mut cursor = body;
    read_packed(&mut cursor)
}

fn decode_macro(m: MacroToken<'_>) -> Option<Payload<'_>> {
    let payload = match m.kind {
        kind::NEW_LINE => Payload::NewLine,
        kind::ITALIC => Payload::Italic(single_integer(m.body)? != 0),
        kind::ICON => Payload::Icon(Icon(single_integer(m.body)?)),
        kind::UI_FOREGROUND => {
            Payload::Foreground(Some(single_integer(m.body)?).filter(|c| *c != 0))
        }
        kind::UI_GLOW => Payload::Glow(Some(single_integer(m.body)?).filter(|c| *c != 0)),
        kind::AUTO_TRANSLATE => {
            let mut cursor = m.body;
            let group = read_packed(&mut cursor)?;
            let key = read_packed(&mut cursor)?;
            Payload::AutoTranslate {
                group,
                key,
                phrase: String::from_utf8_lossy(cursor).into_owned(),
            }
        }
        kind::LINK => Payload::Link(decode_link(m.body)?),
        _ => return None,
    };
    Some(payload)
}

fn decode_link(body: &[u8]) -> Option<LinkTarget> {
    let (&subtype, mut cursor) = body.split_first()?;
    let target = match subtype {
        link_kind::PLAYER => {
            let world_id = read_packed(&mut cursor)?;
            LinkTarget::Player {
                name: String::from_utf8_lossy(cursor).into_owned(),
                world_id,
            }
        }
        link_kind::ITEM => LinkTarget::Item {
            item_id: read_packed(&mut cursor)?,
        },
        link_kind::MAP => LinkTarget::MapLink {
            territory_id: read_packed(&mut cursor)?,
            map_id: read_packed(&mut cursor)?,
            x: read_packed(&mut cursor)?,
            y: read_packed(&mut cursor)?,
        },
        link_kind::QUEST => LinkTarget::Quest {
            quest_id: read_packed(&mut cursor)?,
        },
        link_kind::PARTY_FINDER_NOTIFICATION => LinkTarget::PartyFinderNotification {
            listing_id: read_packed(&mut cursor)?,
        },
        link_kind::STATUS => LinkTarget::Status {
            status_id: read_packed(&mut cursor)?,
        },
        link_kind::PLUGIN => {
            let command_id = read_packed(&mut cursor)?;
            LinkTarget::Plugin {
                plugin: String::from_utf8_lossy(cursor).into_owned(),
                command_id,
            }
        }
        _ => return None,
    };
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Tokens;

    fn classify(bytes: &[u8]) -> Vec<Payload<'_>> {
        Tokens::new(bytes).map(Payload::classify).collect()
    }

    #[test]
    fn italic_on_and_off() {
        let bytes = [0x02, 0x1A, 0x02, 0x02, 0x03, 0x02, 0x1A, 0x02, 0x01, 0x03];
        assert_eq!(
            classify(&bytes),
            vec![Payload::Italic(true), Payload::Italic(false)]
        );
    }

    #[test]
    fn zero_foreground_closes() {
        let bytes = [0x02, 0x48, 0x02, 0x01, 0x03];
        assert_eq!(classify(&bytes), vec![Payload::Foreground(None)]);
    }

    #[test]
    fn item_link() {
        let bytes = [0x02, 0x27, 0x03, 0x03, 0x0B, 0x03];
        assert_eq!(
            classify(&bytes),
            vec![Payload::Link(LinkTarget::Item { item_id: 10 })]
        );
    }

    #[test]
    fn unknown_link_subtypes_stay_raw() {
        let bytes = [0x02, 0x27, 0x03, 0x0A, 0x0B, 0x03];
        assert_eq!(classify(&bytes), vec![Payload::Raw(&bytes)]);
    }

    #[test]
    fn undecodable_body_falls_back_to_raw() {
        // icon with an empty body has no integer to read
        let bytes = [0x02, 0x12, 0x01, 0x03];
        assert_eq!(classify(&bytes), vec![Payload::Raw(&bytes)]);
    }

    #[test]
    fn unknown_kind_is_raw() {
        let bytes = [0x02, 0x13, 0x02, 0xEC, 0x03];
        assert_eq!(classify(&bytes), vec![Payload::Raw(&bytes)]);
    }
}
