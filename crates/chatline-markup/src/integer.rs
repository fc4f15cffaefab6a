// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Packed integer encoding used for macro lengths and numeric arguments.
//!
//! A byte below [`PACKED_THRESHOLD`] encodes `byte - 1` on its own. Larger
//! marker bytes carry a presence mask in `(marker + 1) & 0x0F`; each set bit
//! means one more byte follows, most significant slot first.

/// Marker bytes at or above this value introduce a multi-byte integer.
pub const PACKED_THRESHOLD: u8 = 0xD0;

/// Decodes one packed integer from the front of `input`, advancing it.
///
/// Returns `None` when `input` runs out before the integer is complete.
pub fn read_packed(input: &mut &[u8]) -> Option<u32> {
    let (&marker, rest) = input.split_first()?;
    *input = rest;

    if marker < PACKED_THRESHOLD {
        return Some(u32::from(marker).wrapping_sub(1));
    }

    let mask = (u32::from(marker) + 1) & 0x0F;
    let mut slots = [0u8; 4];
    for index in (0..4).rev() {
        if mask & (1 << index) != 0 {
            let (&byte, rest) = input.split_first()?;
            slots[index] = byte;
            *input = rest;
        }
    }
    Some(u32::from_le_bytes(slots))
}

/// Appends the packed encoding of `value` to `out`.
pub fn write_packed(out: &mut Vec<u8>, value: u32) {
    if value < u32::from(PACKED_THRESHOLD) - 1 {
        out.push(value as u8 + 1);
        return;
    }

    let bytes = value.to_le_bytes();
    let mask = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b != 0)
        .fold(0u8, |mask, (i, _)| mask | (1 << i));
    out.push(0xEF + mask);
    for index in (0..4).rev() {
        if mask & (1 << index) != 0 {
            out.push(bytes[index]);
        }
    }
}
