// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural classification of raw macro payloads.
//!
//! Some payloads carry no typed meaning but are still recognisable by their
//! byte layout. Each raw payload maps to exactly one [`RawShape`]; layouts
//! that match nothing become [`RawShape::Unknown`] and are skipped.

use chatline_core::types::LinkTarget;

use crate::integer::read_packed;
use crate::payload::link_kind;
use crate::token::{kind, END, START};

/// Body byte that closes the innermost colour scope.
pub const COLOUR_POP: u8 = 0xEC;

/// The fixed payload that ends a link span.
pub const LINK_TERMINATOR: [u8; 10] = [
    START,
    kind::LINK,
    0x07,
    link_kind::TERMINATOR,
    0x01,
    0x01,
    0x01,
    0xFF,
    0x01,
    END,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawShape {
    /// Colour scope: `Some(rgba)` opens, `None` closes. Colour `0` reopens
    /// the current top.
    Colour(Option<u32>),
    /// Edge glow: closes if a glow is open, otherwise may open one.
    Glow(Option<u32>),
    PartyFinder(u32),
    Achievement(u32),
    NonBreakingSpace,
    LinkTerminator,
    Unknown,
}

impl RawShape {
    pub fn classify(raw: &[u8]) -> Self {
        let len = raw.len();
        match raw.get(1).copied() {
            Some(kind::COLOUR) => colour(raw),
            Some(kind::EDGE_COLOUR) if len > 1 => RawShape::Glow(glow(raw)),
            Some(kind::LINK) if len > 7 && raw[3] == link_kind::PARTY_FINDER => {
                packed_from(raw, 4).map_or(RawShape::Unknown, RawShape::PartyFinder)
            }
            Some(kind::LINK) if len > 5 && raw[3] == link_kind::ACHIEVEMENT => {
                packed_from(raw, 4).map_or(RawShape::Unknown, RawShape::Achievement)
            }
            Some(kind::NON_BREAKING_SPACE) if len == 4 => RawShape::NonBreakingSpace,
            _ if raw == LINK_TERMINATOR => RawShape::LinkTerminator,
            _ => RawShape::Unknown,
        }
    }

    /// The link this shape opens, if any.
    pub fn link(&self) -> Option<LinkTarget> {
        match *self {
            RawShape::PartyFinder(listing_id) => Some(LinkTarget::PartyFinder { listing_id }),
            RawShape::Achievement(achievement_id) => {
                Some(LinkTarget::Achievement { achievement_id })
            }
            _ => None,
        }
    }
}

fn packed_from(raw: &[u8], offset: usize) -> Option<u32> {
    let mut cursor = raw.get(offset..)?;
    read_packed(&mut cursor)
}

fn colour(raw: &[u8]) -> RawShape {
    // skip START, kind and the length prefix
    let Some(mut body) = raw.get(2..) else {
        return RawShape::Unknown;
    };
    if read_packed(&mut body).is_none() {
        return RawShape::Unknown;
    }
    if body.first() == Some(&COLOUR_POP) {
        return RawShape::Colour(None);
    }
    match read_packed(&mut body) {
        // ARGB on the wire, RGBA in chunks
        Some(argb) => RawShape::Colour(Some(argb.rotate_left(8))),
        None => RawShape::Unknown,
    }
}

/// `None` here means "close", which the decoder ignores when nothing is open.
fn glow(raw: &[u8]) -> Option<u32> {
    if raw.len() > 6 && raw[2] == 0x05 && raw[3] == 0xF6 {
        Some(u32::from_be_bytes([raw[4], raw[5], raw[6], 0xFF]))
    } else {
        None
    }
}
