/// Classification of inbound terminal messages
use serde_json::Value;
use tracing::debug;

use crate::protocol::TerminalMessage;

/// Prefix of the xterm window manipulation sequence `ESC [ 8 ; rows ; cols t`
const RESIZE_ESCAPE_PREFIX: &str = "\x1b[8;";

/// Default columns of a structured resize without `cols`
const DEFAULT_RESIZE_COLS: i64 = 100;
/// Default rows of a structured resize without `rows`
const DEFAULT_RESIZE_ROWS: i64 = 24;

/// What the relay should do with one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Resize request; values are not yet bounds checked
    Resize { cols: i64, rows: i64 },
    /// Raw bytes for the remote shell
    Input(Vec<u8>),
    /// Client asked to close
    Close,
    /// Control frame with nothing to forward
    Ignore,
}

/// Classify a message received from the client.
///
/// A structured `{"type":"resize",...}` payload is tried first, then the escape
/// sequence form. Anything else, malformed resize payloads included, is input.
pub fn classify(message: TerminalMessage) -> Inbound {
    match message {
        TerminalMessage::Text(text) => classify_text(text),
        TerminalMessage::Binary(bytes) => match String::from_utf8(bytes) {
            Ok(text) => classify_text(text),
            Err(err) => Inbound::Input(err.into_bytes()),
        },
        TerminalMessage::Ping(_) | TerminalMessage::Pong(_) => Inbound::Ignore,
        TerminalMessage::Close => Inbound::Close,
    }
}

fn classify_text(text: String) -> Inbound {
    if let Some((cols, rows)) = parse_structured_resize(&text) {
        return Inbound::Resize { cols, rows };
    }
    if let Some((cols, rows)) = parse_escape_resize(&text) {
        return Inbound::Resize { cols, rows };
    }
    Inbound::Input(text.into_bytes())
}

/// `{"type":"resize","cols":N,"rows":M}`; returns `(cols, rows)`
pub fn parse_structured_resize(text: &str) -> Option<(i64, i64)> {
    if !(text.starts_with('{') && text.ends_with('}')) {
        return None;
    }
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!("Brace-delimited input is not JSON, forwarding: {}", e);
            return None;
        }
    };
    if value.get("type").and_then(Value::as_str) != Some("resize") {
        return None;
    }
    let cols = dimension(value.get("cols"), DEFAULT_RESIZE_COLS)?;
    let rows = dimension(value.get("rows"), DEFAULT_RESIZE_ROWS)?;
    Some((cols, rows))
}

/// Missing field takes the default; numbers and numeric strings are accepted.
/// Fractional numbers are truncated towards zero.
fn dimension(field: Option<&Value>, default: i64) -> Option<i64> {
    match field {
        None => Some(default),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    }
}

/// `ESC [ 8 ; rows ; cols t`; returns `(cols, rows)`
pub fn parse_escape_resize(text: &str) -> Option<(i64, i64)> {
    let body = text.strip_prefix(RESIZE_ESCAPE_PREFIX)?;
    let end = body.find('t')?;
    let (rows, cols) = body[..end].split_once(';')?;
    let cols = cols.split(';').next()?;
    Some((cols.trim().parse().ok()?, rows.trim().parse().ok()?))
}
