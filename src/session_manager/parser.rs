//! Parsers for the fixed, line-based output of the TurboVNC server scripts
//!
//! Remote output is untrusted; every parser returns an empty/absent result
//! rather than failing.

use super::types::{OneTimePassword, SessionId};

/// `vncserver -sessionlist`: identifiers on the first stdout line, space separated.
///
/// Empty tokens from repeated spaces are dropped; order and duplicates are kept.
pub fn parse_session_list(stdout: &[String]) -> Vec<SessionId> {
    stdout
        .first()
        .map(|line| line.split_whitespace().map(SessionId::from).collect())
        .unwrap_or_default()
}

/// `vncserver -sessionstart`: the new identifier is the first token of the first line
pub fn parse_start_output(stdout: &[String]) -> Option<SessionId> {
    stdout
        .first()
        .and_then(|line| line.split_whitespace().next())
        .map(SessionId::from)
}

/// `vncpasswd -o`: strip all whitespace, then everything up to and including the last `:`
pub fn parse_credential_line(line: &str) -> Option<OneTimePassword> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    let secret = match compact.rfind(':') {
        Some(idx) => &compact[idx + 1..],
        None => compact.as_str(),
    };
    (!secret.is_empty()).then(|| OneTimePassword::new(secret))
}
