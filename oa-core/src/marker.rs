//! The Open Assets marker output payload: tag, asset quantity list, and
//! metadata. See `spec.md` §4.3 and §6 for the bit-exact wire format.

use crate::varint::{read_compact_int, read_leb128, write_compact_int, write_leb128};
use std::io::{Cursor, Read, Write};

/// The four-byte tag that opens every marker payload: ASCII `"OA"`,
/// protocol major version 1, minor version 0.
const OPEN_ASSETS_TAG: [u8; 4] = [b'O', b'A', 0x01, 0x00];

/// The maximum value an asset quantity may take: `2^63 - 1`.
pub const MAX_ASSET_QUANTITY: u64 = (1u64 << 63) - 1;

/// A parsed Open Assets marker payload: the ordered asset-quantity list
/// (one slot per non-marker output, at most `outputs.len() - 1` entries)
/// and an opaque metadata byte string.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MarkerPayload {
    /// One entry per output slot, in output order, skipping the marker
    /// output itself.
    pub asset_quantities: Vec<u64>,
    /// Opaque application metadata.
    pub metadata: Vec<u8>,
}

impl MarkerPayload {
    /// Constructs a new payload. Does not validate `asset_quantities`
    /// against [`MAX_ASSET_QUANTITY`]; that check is only meaningful on
    /// the parse side, since this constructor is used to build outgoing
    /// payloads where the caller controls the values directly.
    pub fn new(asset_quantities: Vec<u64>, metadata: Vec<u8>) -> Self {
        Self {
            asset_quantities,
            metadata,
        }
    }

    /// Parses a marker payload from its raw `OP_RETURN` pushdata bytes.
    ///
    /// Returns `None` (never an error) on any malformed input: a tag
    /// mismatch, an out-of-range quantity, a short read in any field, or
    /// trailing bytes after the metadata. This mirrors the protocol's
    /// design decision (`spec.md` §7) that a malformed marker yields an
    /// uncolored transaction rather than a rejected one.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let mut cursor = Cursor::new(payload);

        let mut tag = [0u8; 4];
        cursor.read_exact(&mut tag).ok()?;
        if tag != OPEN_ASSETS_TAG {
            return None;
        }

        let count = read_compact_int(&mut cursor).ok()?;
        let mut asset_quantities = Vec::with_capacity(count.min(1 << 20) as usize);
        for _ in 0..count {
            let quantity = read_leb128(&mut cursor).ok()?;
            if quantity > MAX_ASSET_QUANTITY as u128 {
                return None;
            }
            asset_quantities.push(quantity as u64);
        }

        let metadata_len = read_compact_int(&mut cursor).ok()?;
        let mut metadata = vec![0u8; metadata_len as usize];
        cursor.read_exact(&mut metadata).ok()?;

        // The stream must be fully consumed: any trailing byte, including
        // a single stray one, makes the marker invalid.
        let mut trailer = [0u8; 1];
        match cursor.read(&mut trailer) {
            Ok(0) => {}
            _ => return None,
        }

        Some(MarkerPayload {
            asset_quantities,
            metadata,
        })
    }

    /// Serializes the payload to its canonical, minimal wire encoding.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_all(&OPEN_ASSETS_TAG).expect("Vec write is infallible");
        write_compact_int(&mut out, self.asset_quantities.len() as u64)
            .expect("Vec write is infallible");
        for quantity in &self.asset_quantities {
            write_leb128(&mut out, *quantity as u128).expect("Vec write is infallible");
        }
        write_compact_int(&mut out, self.metadata.len() as u64).expect("Vec write is infallible");
        out.extend_from_slice(&self.metadata);
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_parses_the_literal_fixture_vector() {
        // OA 01 00 | 02 | 01 AC 02 | 06 "abcdef"
        let mut payload = vec![b'O', b'A', 0x01, 0x00, 0x02, 0x01, 0xAC, 0x02, 0x06];
        payload.extend_from_slice(b"abcdef");

        let marker = MarkerPayload::parse(&payload).unwrap();
        assert_eq!(marker.asset_quantities, vec![1, 300]);
        assert_eq!(marker.metadata, b"abcdef");
    }

    #[test]
    fn it_rejects_a_wrong_tag_byte() {
        let payload = [b'O', b'B', 0x01, 0x00, 0x00, 0x00];
        assert_eq!(MarkerPayload::parse(&payload), None);

        let payload = [b'O', b'A', 0x02, 0x00, 0x00, 0x00];
        assert_eq!(MarkerPayload::parse(&payload), None);
    }

    #[test]
    fn it_rejects_a_trailing_byte() {
        let mut payload = MarkerPayload::new(vec![1], b"x".to_vec()).serialize();
        payload.push(0xff);
        assert_eq!(MarkerPayload::parse(&payload), None);
    }

    #[test]
    fn it_rejects_a_quantity_above_the_maximum() {
        let mut payload = vec![b'O', b'A', 0x01, 0x00, 0x01];
        // LEB128 for 2^63, one above MAX_ASSET_QUANTITY.
        let mut buf = vec![];
        write_leb128(&mut buf, 1u128 << 63).unwrap();
        payload.extend(buf);
        payload.push(0x00); // empty metadata
        assert_eq!(MarkerPayload::parse(&payload), None);
    }

    #[test]
    fn it_round_trips_for_well_formed_markers() {
        let cases = vec![
            MarkerPayload::new(vec![], vec![]),
            MarkerPayload::new(vec![0], vec![]),
            MarkerPayload::new(vec![1, 300, MAX_ASSET_QUANTITY], b"hello".to_vec()),
            MarkerPayload::new(vec![5; 50], vec![7u8; 300]),
        ];
        for marker in cases {
            let bytes = marker.serialize();
            assert_eq!(MarkerPayload::parse(&bytes).as_ref(), Some(&marker));
        }
    }

    #[test]
    fn it_fails_on_a_short_read_in_any_field() {
        // Tag only, no count byte.
        assert_eq!(
            MarkerPayload::parse(&[b'O', b'A', 0x01, 0x00]),
            None
        );
        // Count says 1 quantity, but none follows.
        assert_eq!(
            MarkerPayload::parse(&[b'O', b'A', 0x01, 0x00, 0x01]),
            None
        );
        // Metadata length says 5, only 2 bytes follow.
        assert_eq!(
            MarkerPayload::parse(&[b'O', b'A', 0x01, 0x00, 0x00, 0x05, 0x01, 0x02]),
            None
        );
    }
}
