//! The Open Assets marker script pattern: `OP_RETURN <pushdata(payload)>`.
//!
//! Scripts are treated as opaque byte vectors with no general execution
//! semantics, following `bitcoins::types::script`'s treatment of
//! `ScriptPubkey` -- this module only ever needs to recognize one
//! two-operator pattern and build its canonical encoding, never to
//! interpret arbitrary Script.

const OP_RETURN: u8 = 0x6a;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;

/// Attempts to match `script` against the marker pattern: a script whose
/// bytes decode to exactly two operators, `OP_RETURN` followed by a
/// single pushdata. Returns the pushdata payload on a match.
///
/// Any trailing opcode after the pushdata, a missing pushdata, a
/// truncated pushdata length, a malformed script (length-prefix
/// overruns), or an initial opcode other than `OP_RETURN` all cause this
/// to return `None` -- a malformed script is never a hard error, only
/// "this output carries no marker".
pub fn parse_marker_script(script: &[u8]) -> Option<Vec<u8>> {
    let mut bytes = script.iter().copied();

    if bytes.next()? != OP_RETURN {
        return None;
    }

    let payload = read_pushdata(&mut bytes)?;

    // Any further byte (another opcode, more pushdata) makes this a
    // non-match: the pattern is exactly two operators.
    if bytes.next().is_some() {
        return None;
    }

    Some(payload)
}

/// Reads one pushdata operator (an `OP_PUSHBYTES_n` opcode byte
/// immediately followed by `n` bytes, or an `OP_PUSHDATAn` opcode
/// followed by an `n`-byte little-endian length and then that many
/// bytes) from `bytes`, returning the pushed payload.
fn read_pushdata(bytes: &mut impl Iterator<Item = u8>) -> Option<Vec<u8>> {
    let opcode = bytes.next()?;
    let len = match opcode {
        0x01..=0x4b => opcode as usize,
        OP_PUSHDATA1 => bytes.next()? as usize,
        OP_PUSHDATA2 => {
            let lo = bytes.next()? as usize;
            let hi = bytes.next()? as usize;
            lo | (hi << 8)
        }
        OP_PUSHDATA4 => {
            let b0 = bytes.next()? as usize;
            let b1 = bytes.next()? as usize;
            let b2 = bytes.next()? as usize;
            let b3 = bytes.next()? as usize;
            b0 | (b1 << 8) | (b2 << 16) | (b3 << 24)
        }
        // OP_0 pushes an empty byte string; any other opcode is not a
        // pushdata at all.
        0x00 => 0,
        _ => return None,
    };

    let payload: Vec<u8> = bytes.take(len).collect();
    if payload.len() != len {
        // The pushdata's declared length overran the available bytes.
        return None;
    }
    Some(payload)
}

/// Builds the canonical `OP_RETURN <minimal-pushdata(payload)>` script
/// for `payload`.
pub fn build_marker_script(payload: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(payload.len() + 6);
    script.push(OP_RETURN);
    push_minimal_pushdata(&mut script, payload);
    script
}

fn push_minimal_pushdata(out: &mut Vec<u8>, payload: &[u8]) {
    let len = payload.len();
    if len == 0 {
        out.push(0x00);
    } else if len <= 0x4b {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(OP_PUSHDATA1);
        out.push(len as u8);
    } else if len <= 0xffff {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(OP_PUSHDATA4);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(payload);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_round_trips_the_marker_pattern() {
        let cases: &[&[u8]] = &[b"", b"abcdef", &[0u8; 200], &[1u8; 500]];
        for payload in cases {
            let script = build_marker_script(payload);
            assert_eq!(parse_marker_script(&script).as_deref(), Some(*payload));
        }
    }

    #[test]
    fn it_rejects_a_script_without_op_return() {
        let script = [0x76, 0xa9, 0x14];
        assert_eq!(parse_marker_script(&script), None);
    }

    #[test]
    fn it_rejects_a_trailing_opcode() {
        let mut script = build_marker_script(b"abc");
        script.push(OP_RETURN);
        assert_eq!(parse_marker_script(&script), None);
    }

    #[test]
    fn it_rejects_a_missing_pushdata() {
        let script = [OP_RETURN];
        assert_eq!(parse_marker_script(&script), None);
    }

    #[test]
    fn it_rejects_a_truncated_pushdata_length() {
        // OP_PUSHDATA2 claims a 2-byte length but only one byte follows.
        let script = [OP_RETURN, OP_PUSHDATA2, 0x05];
        assert_eq!(parse_marker_script(&script), None);
    }

    #[test]
    fn it_rejects_a_pushdata_that_overruns_the_script() {
        // Claims 10 bytes of payload but only provides 2.
        let script = [OP_RETURN, 0x0a, 0x01, 0x02];
        assert_eq!(parse_marker_script(&script), None);
    }

    #[test]
    fn it_builds_minimal_pushdata_at_size_boundaries() {
        assert_eq!(build_marker_script(&[]), vec![OP_RETURN, 0x00]);
        assert_eq!(
            build_marker_script(&[0u8; 0x4b])[1],
            0x4b
        );
        assert_eq!(
            build_marker_script(&[0u8; 0x4c])[1],
            OP_PUSHDATA1
        );
        assert_eq!(
            build_marker_script(&[0u8; 0x100])[1],
            OP_PUSHDATA2
        );
    }
}
