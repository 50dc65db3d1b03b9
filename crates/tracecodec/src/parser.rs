//! Parsers for the two textual trace formats.
//!
//! Raw traces have one event per line in the form
//!
//! ```text
//! T20|acq(L2a45c47085)|361
//! ```
//!
//! that is `<thread>|<action>(<operand>)|<data>`. Canonical traces are the
//! space-separated form produced by [`crate::emitter`]:
//!
//! ```text
//! Acq 20 0 0
//! ```

use crate::registry::{Category, Registry};
use crate::types::*;

/// Actions of the raw format, in the order their prefixes are tried.
///
/// `rel` must be tested before `r`, otherwise releases would parse as reads.
const ACTION_PREFIXES: [(&str, EventKind); 6] = [
    ("rel", EventKind::Release),
    ("w", EventKind::Write),
    ("fork", EventKind::Fork),
    ("join", EventKind::Join),
    ("acq", EventKind::Acquire),
    ("r", EventKind::Read),
];

/// A parsed raw line.
///
/// Read/Write events carry a zero value; the caller decides whether to
/// use `data` or a synthesized value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent<'a> {
    pub event: Event,
    /// The third field of the line, verbatim.
    pub data: Option<&'a str>,
}

/// Parse one raw trace line, canonicalizing lock and variable names through
/// `registry`.
pub fn parse_raw_line<'a>(
    line: &'a str,
    registry: &mut Registry,
) -> Result<RawEvent<'a>, LineErrorKind> {
    let mut fields = line.trim().splitn(3, '|');
    let thread = fields
        .next()
        .filter(|s| !s.is_empty())
        .ok_or(LineErrorKind::MissingField("thread"))?;
    let action = fields.next().ok_or(LineErrorKind::MissingField("action"))?;
    let data = fields.next();

    let thread_id = parse_thread_token(thread)?;
    let (kind, operand) = split_action(action)?;

    let operand_id = match kind {
        EventKind::Fork | EventKind::Join => parse_thread_token(operand)?,
        EventKind::Acquire | EventKind::Release => {
            registry.resolve(Category::Lock, name(operand)?)
        }
        _ => registry.resolve(Category::Variable, name(operand)?),
    };
    let event = Event::new(kind, thread_id, operand_id, 0);

    Ok(RawEvent { event, data })
}

/// Split `acq(L1)` into its kind and operand.
fn split_action(action: &str) -> Result<(EventKind, &str), LineErrorKind> {
    let kind = ACTION_PREFIXES
        .iter()
        .find(|(prefix, _)| action.starts_with(prefix))
        .map(|(_, kind)| *kind)
        .ok_or_else(|| LineErrorKind::UnknownAction(action.to_string()))?;

    let missing_paren = || LineErrorKind::MissingParenthesis(action.to_string());
    let open = action.find('(').ok_or_else(missing_paren)?;
    let operand = action[open + 1..]
        .strip_suffix(')')
        .ok_or_else(missing_paren)?;
    Ok((kind, operand))
}

fn name(operand: &str) -> Result<&str, LineErrorKind> {
    if operand.is_empty() {
        Err(LineErrorKind::InvalidOperand(operand.to_string()))
    } else {
        Ok(operand)
    }
}

/// Parse a `T<digits>` thread token.
pub fn parse_thread_token(token: &str) -> Result<u32, LineErrorKind> {
    token
        .strip_prefix('T')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| LineErrorKind::InvalidThread(token.to_string()))
}

/// Parse a recorded data field as a value. Any signed decimal integer is
/// accepted; range checks belong to the binary encoder.
pub fn parse_value(data: &str) -> Result<i64, LineErrorKind> {
    data.trim()
        .parse()
        .map_err(|_| LineErrorKind::InvalidValue(data.to_string()))
}

/// Parse one canonical trace line back into an event.
pub fn parse_canonical_line(line: &str) -> Result<Event, LineErrorKind> {
    let mut fields = line.split_whitespace();
    let mut next = |what: &'static str| fields.next().ok_or(LineErrorKind::MissingField(what));

    let kind_str = next("kind")?;
    let kind = EventKind::from_mnemonic(kind_str)
        .ok_or_else(|| LineErrorKind::UnknownKind(kind_str.to_string()))?;
    let thread_str = next("thread")?;
    let thread_id = thread_str
        .parse()
        .map_err(|_| LineErrorKind::InvalidThread(thread_str.to_string()))?;
    let operand_str = next("operand")?;
    let value_str = next("value")?;

    if let Some(extra) = fields.next() {
        return Err(LineErrorKind::TrailingField(extra.to_string()));
    }

    let invalid_operand = || LineErrorKind::InvalidOperand(operand_str.to_string());
    let operand_id: u32 = if kind.is_access() {
        operand_str
            .strip_prefix("X_")
            .and_then(|id| id.parse().ok())
            .ok_or_else(invalid_operand)?
    } else {
        operand_str.parse().map_err(|_| invalid_operand())?
    };
    let value = parse_value(value_str)?;

    // Only Read/Write carry a value, and Begin/End render their operand as 0.
    if !kind.is_access() && value != 0 {
        return Err(LineErrorKind::InvalidValue(value_str.to_string()));
    }
    if matches!(kind, EventKind::Begin | EventKind::End) && operand_id != 0 {
        return Err(invalid_operand());
    }

    Ok(match kind {
        EventKind::Begin => Event::begin(thread_id),
        EventKind::End => Event::end(thread_id),
        _ => Event::new(kind, thread_id, operand_id, value),
    })
}
