// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Historical uuencode codec for STDOUT/STDERR payloads.
//!
//! The agent ships captured streams in the classic uuencode format: a
//! `begin` header, lines prefixed with an encoded byte count, 4 characters
//! per 3 bytes in the 0x20..0x60 alphabet, a zero-length terminator line,
//! and `end`. Both the space and backtick encodings of zero are accepted on
//! decode; encode emits backtick (the sharutils convention).

use rj_core::RjError;

const LINE_BYTES: usize = 45;

fn enc_char(v: u8) -> u8 {
    if v == 0 {
        b'`'
    } else {
        v + 0x20
    }
}

fn dec_char(c: u8) -> Result<u8, RjError> {
    match c {
        0x20..=0x60 => Ok((c - 0x20) & 0x3F),
        other => Err(RjError::EncodingError(format!(
            "invalid uuencode character 0x{:02x}",
            other
        ))),
    }
}

/// Encode bytes in historical uuencode framing.
///
/// Used by fakes and tests; the real encoder lives in the agent script.
pub fn uuencode(name: &str, data: &[u8]) -> String {
    let mut out = format!("begin 644 {}\n", name);
    for chunk in data.chunks(LINE_BYTES) {
        out.push(enc_char(chunk.len() as u8) as char);
        for group in chunk.chunks(3) {
            let b0 = group[0];
            let b1 = group.get(1).copied().unwrap_or(0);
            let b2 = group.get(2).copied().unwrap_or(0);
            out.push(enc_char(b0 >> 2) as char);
            out.push(enc_char(((b0 & 0x03) << 4) | (b1 >> 4)) as char);
            out.push(enc_char(((b1 & 0x0F) << 2) | (b2 >> 6)) as char);
            out.push(enc_char(b2 & 0x3F) as char);
        }
        out.push('\n');
    }
    out.push_str("`\nend\n");
    out
}

/// Decode a uuencoded payload back into bytes.
///
/// Tolerates a missing `begin` header and a missing `end` trailer, since the
/// payload has already been stripped out of its reply frame.
pub fn uudecode(payload: &str) -> Result<Vec<u8>, RjError> {
    let mut out = Vec::new();

    for line in payload.lines() {
        if line.starts_with("begin ") {
            continue;
        }
        if line == "end" {
            break;
        }
        let bytes = line.as_bytes();
        let Some(&len_char) = bytes.first() else {
            // blank line: treat like the zero-length terminator
            break;
        };
        let len = dec_char(len_char)? as usize;
        if len == 0 {
            break;
        }

        let groups = bytes[1..].chunks_exact(4);
        if groups.len() * 3 < len {
            return Err(RjError::EncodingError(format!(
                "uuencode line too short for its count ({} bytes expected)",
                len
            )));
        }

        let mut decoded = Vec::with_capacity(groups.len() * 3);
        for group in groups {
            let c0 = dec_char(group[0])?;
            let c1 = dec_char(group[1])?;
            let c2 = dec_char(group[2])?;
            let c3 = dec_char(group[3])?;
            decoded.push((c0 << 2) | (c1 >> 4));
            decoded.push(((c1 & 0x0F) << 4) | (c2 >> 2));
            decoded.push(((c2 & 0x03) << 6) | c3);
        }
        decoded.truncate(len);
        out.extend_from_slice(&decoded);
    }

    Ok(out)
}

#[cfg(test)]
#[path = "uu_tests.rs"]
mod tests;
