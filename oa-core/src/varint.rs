//! Two distinct variable-length integer encodings are used by the
//! protocol, and this module keeps them apart rather than conflating
//! them behind one name:
//!
//! - [`read_leb128`]/[`write_leb128`]: little-endian base-128, used for
//!   each asset quantity in the marker payload. The accumulator is a
//!   `u128` because the codec itself enforces no length bound (per
//!   `spec.md` §4.1) and must be able to round-trip a value as large as
//!   `2^64`, which does not fit in `u64`. Range-checking against the
//!   protocol's `[0, 2^63 - 1]` asset-quantity limit happens one layer up,
//!   in the marker payload parser.
//! - [`read_compact_int`]/[`write_compact_int`]: Bitcoin's compact-size
//!   ("var_int") encoding, used for the asset-quantity count and the
//!   metadata length prefix in the marker payload. This one is bounded to
//!   `u64` by the Bitcoin wire format itself.

use crate::error::{CoreError, CoreResult};
use std::io::{Read, Write};

/// Decodes a LEB128-encoded unsigned integer from `reader`.
///
/// Reads one byte at a time; each byte contributes its low seven bits to
/// the accumulator, shifted left by `7 * i`. The high bit, when clear,
/// terminates the read. No length bound is enforced here.
pub fn read_leb128<R: Read>(reader: &mut R) -> CoreResult<u128> {
    let mut result: u128 = 0;
    let mut shift: u32 = 0;
    loop {
        let mut byte = [0u8; 1];
        reader
            .read_exact(&mut byte)
            .map_err(|_| CoreError::Truncated)?;
        let byte = byte[0];
        result |= u128::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    Ok(result)
}

/// Encodes `value` as LEB128, writing groups of seven low bits with the
/// high bit set on all but the last. Zero encodes as a single `0x00`
/// byte.
pub fn write_leb128<W: Write>(writer: &mut W, mut value: u128) -> CoreResult<usize> {
    if value == 0 {
        writer.write_all(&[0x00])?;
        return Ok(1);
    }

    let mut written = 0;
    while value != 0 {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        writer.write_all(&[byte])?;
        written += 1;
    }
    Ok(written)
}

/// Calculates the minimum prefix length for a compact-size encoding of
/// `number`.
pub fn prefix_byte_len(number: u64) -> u8 {
    match number {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

fn first_byte_from_len(len: u8) -> Option<u8> {
    match len {
        3 => Some(0xfd),
        5 => Some(0xfe),
        9 => Some(0xff),
        _ => None,
    }
}

fn prefix_len_from_first_byte(byte: u8) -> u8 {
    match byte {
        0..=0xfc => 1,
        0xfd => 3,
        0xfe => 5,
        0xff => 9,
    }
}

/// Reads a Bitcoin-style compact-size variable-length integer.
///
/// Fails with [`CoreError::NonMinimalVarInt`] if the encoding used more
/// bytes than the minimal encoding of the resulting value requires.
pub fn read_compact_int<R: Read>(reader: &mut R) -> CoreResult<u64> {
    let mut prefix = [0u8; 1];
    reader
        .read_exact(&mut prefix)
        .map_err(|_| CoreError::Truncated)?;
    let prefix_len = prefix_len_from_first_byte(prefix[0]);

    let number = if prefix_len > 1 {
        let mut buf = [0u8; 8];
        reader
            .read_exact(&mut buf[..prefix_len as usize - 1])
            .map_err(|_| CoreError::Truncated)?;
        u64::from_le_bytes(buf)
    } else {
        prefix[0] as u64
    };

    if prefix_byte_len(number) < prefix_len {
        Err(CoreError::NonMinimalVarInt)
    } else {
        Ok(number)
    }
}

/// Writes `number` as a Bitcoin-style compact-size variable-length
/// integer, using the minimal encoding (1, 3, 5, or 9 bytes).
pub fn write_compact_int<W: Write>(writer: &mut W, number: u64) -> CoreResult<usize> {
    let prefix_len = prefix_byte_len(number);
    let written = match first_byte_from_len(prefix_len) {
        None => {
            writer.write_all(&[number as u8])?;
            1
        }
        Some(prefix) => {
            writer.write_all(&[prefix])?;
            let body = number.to_le_bytes();
            writer.write_all(&body[..prefix_len as usize - 1])?;
            prefix_len as usize
        }
    };
    Ok(written)
}
