// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client verbs and their wire encoding.

use rj_core::{JobId, RjError};

/// One protocol verb, as issued by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Spawn a job; the payload is the literal command line to execute
    Run { command: String },
    /// Read the current state token
    State { id: JobId },
    /// Block server-side until terminal or until `timeout_secs` elapses,
    /// then report the current state token
    Wait { id: JobId, timeout_secs: Option<u64> },
    /// Read the exit code of a terminal job
    Result { id: JobId },
    /// SIGSTOP the job
    Suspend { id: JobId },
    /// SIGCONT the job
    Resume { id: JobId },
    /// SIGKILL the job
    Cancel { id: JobId },
    /// Append a line to the job's stdin feed
    Stdin { id: JobId, data: String },
    /// Fetch captured stdout (uuencoded payload)
    Stdout { id: JobId },
    /// Fetch captured stderr (uuencoded payload)
    Stderr { id: JobId },
    /// List job ids
    List,
    /// Remove one job record, or sweep all terminal ones
    Purge { id: Option<JobId> },
    /// Terminate the session
    Quit,
    /// Keepalive; elicits only the next prompt
    Noop,
    /// Diagnostic echo
    Log { text: String },
}

/// Encode a verb as a single LF-terminated line.
///
/// The wire is line-atomic: any argument containing a line break is rejected
/// with `EncodingError` rather than silently splitting into two verbs.
pub fn encode(verb: &Verb) -> Result<String, RjError> {
    let tokens: Vec<&str> = match verb {
        Verb::Run { command } => vec!["RUN", command],
        Verb::State { id } => vec!["STATE", id.as_str()],
        Verb::Wait { id, timeout_secs: None } => vec!["WAIT", id.as_str()],
        Verb::Wait {
            id,
            timeout_secs: Some(secs),
        } => {
            return encode_tokens(&["WAIT", id.as_str(), &secs.to_string()]);
        }
        Verb::Result { id } => vec!["RESULT", id.as_str()],
        Verb::Suspend { id } => vec!["SUSPEND", id.as_str()],
        Verb::Resume { id } => vec!["RESUME", id.as_str()],
        Verb::Cancel { id } => vec!["CANCEL", id.as_str()],
        Verb::Stdin { id, data } => vec!["STDIN", id.as_str(), data],
        Verb::Stdout { id } => vec!["STDOUT", id.as_str()],
        Verb::Stderr { id } => vec!["STDERR", id.as_str()],
        Verb::List => vec!["LIST"],
        Verb::Purge { id: None } => vec!["PURGE"],
        Verb::Purge { id: Some(id) } => vec!["PURGE", id.as_str()],
        Verb::Quit => vec!["QUIT"],
        Verb::Noop => vec!["NOOP"],
        Verb::Log { text } => vec!["LOG", text],
    };
    encode_tokens(&tokens)
}

fn encode_tokens(tokens: &[&str]) -> Result<String, RjError> {
    for token in tokens {
        if token.contains('\n') || token.contains('\r') {
            return Err(RjError::EncodingError(format!(
                "argument contains a line break: {:?}",
                token
            )));
        }
    }
    let mut line = tokens.join(" ");
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
#[path = "verb_tests.rs"]
mod tests;
