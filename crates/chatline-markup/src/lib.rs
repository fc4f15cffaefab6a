// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich-text markup decoding for Chatline.
//!
//! A chat line arrives as a byte stream of literal text interleaved with
//! framed control payloads. [`parse`] turns such a stream into a sequence of
//! style-annotated [`Chunk`]s; [`MarkupBuilder`] produces streams.

pub mod builder;
pub mod integer;
pub mod parser;
pub mod payload;
pub mod raw;
pub mod token;

use chatline_core::types::Chunk;

pub use builder::MarkupBuilder;
pub use parser::{parse, Decoder};
pub use payload::Payload;
pub use raw::RawShape;
pub use token::{Token, Tokens};

/// Concatenated text content of `chunks`, icons omitted.
pub fn raw_text(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .filter_map(Chunk::as_text)
        .map(|text| text.content.as_str())
        .collect()
}
