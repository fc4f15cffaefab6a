// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Markup stream to chunk decoding.
//!
//! Decoding is a fold over the token stream. All style state (italic flag,
//! colour stacks and the open link) lives in a [`Decoder`] local to one
//! [`parse`] call, so the function is pure and can run on any thread.

use chatline_core::types::{
    ChatType, Chunk, ChunkSource, Icon, IconChunk, LinkTarget, TextChunk,
};
use tracing::trace;

use crate::payload::Payload;
use crate::raw::RawShape;
use crate::token::Tokens;

/// Private-use glyphs the host wraps auto-translate phrases in.
pub const AUTO_TRANSLATE_OPEN: char = '\u{E040}';
pub const AUTO_TRANSLATE_CLOSE: char = '\u{E041}';

/// Decode a markup stream into chunks.
///
/// Never fails: anything that cannot be understood is skipped.
pub fn parse(markup: &[u8], source: ChunkSource, fallback: Option<ChatType>) -> Vec<Chunk> {
    Tokens::new(markup)
        .map(Payload::classify)
        .fold(Decoder::new(source, fallback), Decoder::step)
        .finish()
}

/// Fold state for one [`parse`] call.
#[derive(Debug)]
pub struct Decoder {
    source: ChunkSource,
    fallback: Option<ChatType>,
    italic: bool,
    foreground: Vec<u32>,
    glow: Vec<u32>,
    link: Option<LinkTarget>,
    chunks: Vec<Chunk>,
}

impl Decoder {
    pub fn new(source: ChunkSource, fallback: Option<ChatType>) -> Self {
        Self {
            source,
            fallback,
            italic: false,
            foreground: Vec::new(),
            glow: Vec::new(),
            link: None,
            chunks: Vec::new(),
        }
    }

    pub fn step(mut self, payload: Payload<'_>) -> Self {
        match payload {
            Payload::Text(bytes) => self.text_bytes(bytes),
            Payload::NewLine => self.push_text("\n".to_owned()),
            Payload::Italic(on) => self.italic = on,
            Payload::Foreground(colour) => scope(&mut self.foreground, colour),
            Payload::Glow(colour) => scope(&mut self.glow, colour),
            Payload::Icon(icon) => self.push_icon(icon, self.link.clone()),
            Payload::AutoTranslate { group, key, phrase } => {
                self.auto_translate(group, key, &phrase)
            }
            Payload::Link(target) => self.link = Some(target),
            Payload::Raw(raw) => self.raw(raw),
        }
        self
    }

    pub fn finish(self) -> Vec<Chunk> {
        self.chunks
    }

    fn raw(&mut self, raw: &[u8]) {
        let shape = RawShape::classify(raw);
        match shape {
            RawShape::Colour(None) => {
                self.foreground.pop();
            }
            RawShape::Colour(Some(0)) => {
                if let Some(&top) = self.foreground.last() {
                    self.foreground.push(top);
                }
            }
            RawShape::Colour(Some(colour)) => self.foreground.push(colour),
            RawShape::Glow(colour) => {
                if self.glow.pop().is_none() {
                    self.glow.extend(colour);
                }
            }
            RawShape::PartyFinder(_) | RawShape::Achievement(_) => self.link = shape.link(),
            RawShape::NonBreakingSpace => self.push_text(" ".to_owned()),
            RawShape::LinkTerminator => self.link = None,
            RawShape::Unknown => trace!(len = raw.len(), "skipping unrecognised payload"),
        }
    }

    fn text_bytes(&mut self, bytes: &[u8]) {
        let visible = bytes
            .iter()
            .position(|b| *b == 0)
            .map_or(bytes, |nul| &bytes[..nul]);
        if !visible.is_empty() {
            self.push_text(String::from_utf8_lossy(visible).into_owned());
        }
    }

    fn auto_translate(&mut self, group: u32, key: u32, phrase: &str) {
        let decoded = format!("{AUTO_TRANSLATE_OPEN} {phrase} {AUTO_TRANSLATE_CLOSE}");
        let chars: Vec<char> = decoded.chars().collect();
        let inner: String = if chars.len() > 4 {
            chars[2..chars.len() - 2].iter().collect()
        } else {
            String::new()
        };

        self.push_icon(
            Icon::AUTO_TRANSLATE_BEGIN,
            Some(LinkTarget::AutoTranslate { group, key }),
        );
        self.push_text(inner);
        self.push_icon(Icon::AUTO_TRANSLATE_END, self.link.clone());
    }

    fn push_text(&mut self, content: String) {
        self.chunks.push(Chunk::Text(TextChunk {
            source: self.source,
            link: self.link.clone(),
            content,
            foreground: self.foreground.last().copied(),
            glow: self.glow.last().copied(),
            italic: self.italic,
            fallback_colour: self.fallback,
        }));
    }

    fn push_icon(&mut self, icon: Icon, link: Option<LinkTarget>) {
        self.chunks.push(Chunk::Icon(IconChunk {
            source: self.source,
            link,
            icon,
        }));
    }
}

/// Enable pushes, disable pops; popping an empty stack does nothing.
fn scope(stack: &mut Vec<u32>, colour: Option<u32>) {
    match colour {
        Some(colour) => stack.push(colour),
        None => {
            stack.pop();
        }
    }
}
