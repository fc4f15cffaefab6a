// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splits a markup stream into literal text runs and macro payloads.
//!
//! Macros are framed as `START kind len body END`. The tokenizer trusts the
//! length prefix and never fails: a frame that is cut short or has no end
//! byte comes out as [`Token::Malformed`] and tokenizing continues after it.

use crate::integer::read_packed;

/// First byte of every macro payload.
pub const START: u8 = 0x02;
/// Last byte of every macro payload.
pub const END: u8 = 0x03;

/// Macro kind bytes that have a typed meaning.
pub mod kind {
    pub const NEW_LINE: u8 = 0x10;
    pub const ICON: u8 = 0x12;
    pub const COLOUR: u8 = 0x13;
    pub const EDGE_COLOUR: u8 = 0x14;
    pub const ITALIC: u8 = 0x1A;
    pub const NON_BREAKING_SPACE: u8 = 0x1D;
    pub const LINK: u8 = 0x27;
    pub const AUTO_TRANSLATE: u8 = 0x2E;
    pub const UI_FOREGROUND: u8 = 0x48;
    pub const UI_GLOW: u8 = 0x49;
}

/// One framed macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroToken<'a> {
    pub kind: u8,
    pub body: &'a [u8],
    /// The whole frame, `START` through `END`.
    pub raw: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a [u8]),
    Macro(MacroToken<'a>),
    /// Bytes that start like a macro but do not frame correctly.
    Malformed(&'a [u8]),
}

/// Iterator over the tokens of a markup stream.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a [u8],
}

impl<'a> Tokens<'a> {
    pub fn new(markup: &'a [u8]) -> Self {
        Self { rest: markup }
    }

    fn take(&mut self, len: usize) -> &'a [u8] {
        let (head, tail) = self.rest.split_at(len.min(self.rest.len()));
        self.rest = tail;
        head
    }

    fn next_macro(&mut self) -> Token<'a> {
        let frame = self.rest;
        let Some(&kind) = frame.get(1) else {
            return Token::Malformed(self.take(frame.len()));
        };

        let mut cursor = frame.get(2..).unwrap_or_default();
        let Some(len) = read_packed(&mut cursor) else {
            return Token::Malformed(self.take(frame.len()));
        };
        let header = frame.len() - cursor.len();

        let body_end = match usize::try_from(len)
            .ok()
            .and_then(|len| header.checked_add(len))
        {
            Some(end) if end < frame.len() => end,
            _ => return Token::Malformed(self.take(frame.len())),
        };

        let raw = self.take(body_end + 1);
        if raw.last() != Some(&END) {
            return Token::Malformed(raw);
        }
        Token::Macro(MacroToken {
            kind,
            body: &raw[header..body_end],
            raw,
        })
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rest.first()? {
            &START => Some(self.next_macro()),
            _ => {
                let len = self
                    .rest
                    .iter()
                    .position(|b| *b == START)
                    .unwrap_or(self.rest.len());
                Some(Token::Text(self.take(len)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(bytes: &[u8]) -> Vec<Token<'_>> {
        Tokens::new(bytes).collect()
    }

    #[test]
    fn plain_text_is_one_token() {
        assert_eq!(tokens(b"hello"), vec![Token::Text(b"hello")]);
    }

    #[test]
    fn macro_between_text_runs() {
        let bytes = [b'a', 0x02, 0x1A, 0x02, 0x02, 0x03, b'b'];
        let toks = tokens(&bytes);
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0], Token::Text(b"a"));
        assert_eq!(
            toks[1],
            Token::Macro(MacroToken {
                kind: kind::ITALIC,
                body: &[0x02],
                raw: &bytes[1..6],
            })
        );
        assert_eq!(toks[2], Token::Text(b"b"));
    }

    #[test]
    fn empty_body_macro() {
        let bytes = [0x02, 0x1D, 0x01, 0x03];
        match tokens(&bytes).as_slice() {
            [Token::Macro(m)] => {
                assert_eq!(m.kind, kind::NON_BREAKING_SPACE);
                assert!(m.body.is_empty());
                assert_eq!(m.raw, &bytes);
            }
            other => panic!("unexpected tokens {other:?}"),
        }
    }

    #[test]
    fn body_may_contain_frame_bytes() {
        // body [0x02, 0x03] is two packed integers, not a nested frame
        let bytes = [0x02, 0x12, 0x03, 0x02, 0x03, 0x03, b'x'];
        let toks = tokens(&bytes);
        assert!(matches!(toks[0], Token::Macro(m) if m.body == [0x02, 0x03]));
        assert_eq!(toks[1], Token::Text(b"x"));
    }

    #[test]
    fn truncated_frame_is_malformed() {
        let bytes = [b'a', 0x02, 0x13, 0x09, 0xEC];
        let toks = tokens(&bytes);
        assert_eq!(toks, vec![Token::Text(b"a"), Token::Malformed(&bytes[1..])]);
    }

    #[test]
    fn missing_end_byte_is_malformed_but_tokenizing_continues() {
        let bytes = [0x02, 0x1A, 0x02, 0x02, 0x07, b'z'];
        let toks = tokens(&bytes);
        assert_eq!(toks, vec![Token::Malformed(&bytes[..5]), Token::Text(b"z")]);
    }

    #[test]
    fn lone_start_byte() {
        assert_eq!(tokens(&[0x02]), vec![Token::Malformed(&[0x02])]);
    }
}
