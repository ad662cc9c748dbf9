// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply framing: OK/ERROR tag classification and prompt detection.

use rj_core::RjError;

/// Tag line of a reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// One decoded reply frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: ReplyStatus,
    /// Payload lines joined with `\n`, without the tag line.
    pub payload: String,
    /// Exit status of the agent-side handler, from the prompt suffix.
    /// Exposed for debugging only; correctness never depends on it.
    pub handler_status: i32,
}

impl Reply {
    /// Convert an ERROR frame into the taxonomy; pass OK payloads through.
    pub fn into_result(self) -> Result<String, RjError> {
        match self.status {
            ReplyStatus::Ok => Ok(self.payload),
            ReplyStatus::Error => Err(map_agent_error(&self.payload)),
        }
    }
}

/// Parse a `PROMPT-<e>->` sentinel at the start of a line.
///
/// Returns the embedded handler exit status, or `None` when the line is not
/// a prompt. Reply boundaries are identified exclusively by this sentinel.
pub fn parse_prompt(line: &str) -> Option<i32> {
    let rest = line.trim_end().strip_prefix("PROMPT-")?;
    let digits = rest.strip_suffix("->")?;
    digits.parse().ok()
}

/// Decode the lines read between two prompts into a reply.
///
/// The tag is the first line equal to `OK` or `ERROR`; anything before it is
/// stray output (the caller may log it) and is discarded. A frame without a
/// tag is malformed. A NOOP elicits no tag at all, which the channel layer
/// never routes here.
pub fn decode_frame(lines: &[String], handler_status: i32) -> Result<Reply, RjError> {
    let tag_index = lines
        .iter()
        .position(|l| l == "OK" || l == "ERROR")
        .ok_or_else(|| {
            RjError::EncodingError(format!(
                "reply frame missing OK/ERROR tag ({} lines)",
                lines.len()
            ))
        })?;

    let status = if lines[tag_index] == "OK" {
        ReplyStatus::Ok
    } else {
        ReplyStatus::Error
    };

    Ok(Reply {
        status,
        payload: lines[tag_index + 1..].join("\n"),
        handler_status,
    })
}

/// Map an agent ERROR message onto the error taxonomy.
///
/// The agent reports errors as free-form text; a prefix table keys the
/// well-known messages. Anything unrecognized is a plain remote failure.
pub fn map_agent_error(message: &str) -> RjError {
    let msg = message.trim();
    if msg.contains("not known") || msg.contains("has no ") || msg.contains("no pid given") {
        RjError::DoesNotExist(msg.to_string())
    } else if msg.contains("incorrect state") {
        RjError::IncorrectState(msg.to_string())
    } else if msg.contains("unknown (") {
        RjError::BadParameter(msg.to_string())
    } else {
        // covers "suspend failed", "resume failed", "cancel failed" and the rest
        RjError::NoSuccess(msg.to_string())
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
