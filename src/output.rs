//! Rendering result envelopes for the terminal.
//!
//! `Ok` goes to stdout; every other status goes to stderr, prefixed with the
//! status name so scripts can tell failures apart.

use pulsar_proto::ResultEnvelope;
use std::io::{self, Write};

/// Which stream a rendered result went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

/// Collapse control characters so an error stays on one line
pub fn sanitize_error(msg: &str) -> String {
    msg.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text for `envelope` and the stream it belongs on
pub fn format_envelope(envelope: &ResultEnvelope) -> (Channel, String) {
    if envelope.is_ok() {
        (Channel::Stdout, envelope.text().to_string())
    } else {
        (
            Channel::Stderr,
            format!("{}: {}", envelope.status, sanitize_error(envelope.text())),
        )
    }
}

/// Write an envelope to the matching writer
pub fn render_to<O: Write, E: Write>(
    envelope: &ResultEnvelope,
    out: &mut O,
    err: &mut E,
) -> io::Result<Channel> {
    let (channel, text) = format_envelope(envelope);
    match channel {
        Channel::Stdout => {
            if !text.is_empty() {
                writeln!(out, "{}", text)?;
            }
        }
        Channel::Stderr => writeln!(err, "{}", text)?,
    }
    Ok(channel)
}

/// Write an envelope to stdout or stderr
pub fn render(envelope: &ResultEnvelope) -> io::Result<Channel> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    render_to(envelope, &mut stdout.lock(), &mut stderr.lock())
}
