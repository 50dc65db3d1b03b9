//! Whole-trace conversions.
//!
//! A [`TraceConverter`] converts the contents of one raw trace. It owns the
//! identifier registry for that trace, so ids never leak between traces.
//! Any malformed line aborts the conversion; no partial output is returned.

use std::fmt::Write as _;
use std::io::Read;

use crate::binary::{self, Decoded, Words};
use crate::emitter::Emitter;
use crate::parser::{self, RawEvent};
use crate::registry::{LockIds, Registry};
use crate::types::*;
use crate::values::{RandomValues, SynthesizedValues, ValuePolicy, ValueSource};

/// Converts one raw trace to the canonical or binary format.
pub struct TraceConverter<S = RandomValues> {
    registry: Registry,
    policy: ValuePolicy,
    values: SynthesizedValues<S>,
}

impl TraceConverter<RandomValues> {
    /// A converter with separate lock ids and randomly synthesized values.
    pub fn new() -> Self {
        Self::with_source(
            LockIds::Separate,
            ValuePolicy::Synthesized,
            RandomValues::from_entropy(),
        )
    }
}

impl Default for TraceConverter<RandomValues> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ValueSource> TraceConverter<S> {
    pub fn with_source(lock_ids: LockIds, policy: ValuePolicy, source: S) -> Self {
        Self {
            registry: Registry::new(lock_ids),
            policy,
            values: SynthesizedValues::new(source),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parse the raw line `line` (1-based `line_no`) into an event with its
    /// value filled in.
    pub fn parse_line(&mut self, line_no: usize, line: &str) -> Result<Event, LineError> {
        let RawEvent { mut event, data } = parser::parse_raw_line(line, &mut self.registry)
            .map_err(|kind| LineError::new(line_no, kind))?;

        if event.kind.is_access() {
            event.value = match self.policy {
                ValuePolicy::Recorded => {
                    let data = data.ok_or(LineError::new(
                        line_no,
                        LineErrorKind::MissingField("data"),
                    ))?;
                    parser::parse_value(data).map_err(|kind| LineError::new(line_no, kind))?
                }
                ValuePolicy::Synthesized if event.kind == EventKind::Write => {
                    self.values.write(event.operand_id)
                }
                ValuePolicy::Synthesized => self.values.read(event.operand_id),
            };
        }
        Ok(event)
    }

    /// Parse every line of a raw trace, skipping blank lines.
    pub fn parse_trace(&mut self, input: &str) -> Result<Vec<(usize, Event)>, LineError> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(input) {
            events.push((line_no, self.parse_line(line_no, line)?));
        }
        Ok(events)
    }

    /// Convert a raw trace to canonical text.
    pub fn to_canonical(&mut self, input: &str) -> Result<String, ConvertError> {
        let mut emitter = Emitter::new();
        for (line_no, line) in numbered_lines(input) {
            let event = self.parse_line(line_no, line).map_err(|e| {
                log::debug!("error parsing line {}: {:?}", line_no, line);
                e
            })?;
            emitter.push(event);
        }
        Ok(emitter.finish())
    }

    /// Convert a raw trace to a binary trace.
    ///
    /// Fork and Join have no binary encoding and are left out.
    pub fn to_binary(&mut self, input: &str) -> Result<Vec<u8>, ConvertError> {
        let events = self.parse_trace(input)?;
        encode_events(events)
    }
}

/// Convert a canonical trace to a binary trace.
///
/// Fork, Join, Begin and End lines are parsed and validated but have no
/// binary encoding and are left out.
pub fn canonical_to_binary(input: &str) -> Result<Vec<u8>, ConvertError> {
    let events = numbered_lines(input)
        .map(|(line_no, line)| {
            parser::parse_canonical_line(line)
                .map(|event| (line_no, event))
                .map_err(|kind| LineError::new(line_no, kind))
        })
        .collect::<Result<Vec<_>, _>>()?;
    encode_events(events)
}

fn encode_events(events: Vec<(usize, Event)>) -> Result<Vec<u8>, ConvertError> {
    let mut out = Vec::with_capacity(events.len() * binary::WORD_SIZE);
    let mut skipped = 0usize;
    for (line, event) in events {
        if event.kind.nibble().is_none() {
            skipped += 1;
            continue;
        }
        let word = binary::encode(&event).map_err(|source| ConvertError::Encode { line, source })?;
        out.extend_from_slice(&word.to_le_bytes());
    }
    if skipped > 0 {
        log::debug!("skipped {} lifecycle events without binary encoding", skipped);
    }
    Ok(out)
}

/// Non-blank lines with their 1-based line numbers.
fn numbered_lines(input: &str) -> impl Iterator<Item = (usize, &str)> {
    input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// A human-readable listing of a binary trace.
#[derive(Debug)]
pub struct Listing {
    pub text: String,
    /// Number of words decoded, including ones with unknown kinds.
    pub words: usize,
    pub unknown: usize,
    /// Set if the stream ended in an error.
    pub error: Option<DecodeError>,
}

/// Decode a binary trace into a listing, one two-line entry per word.
///
/// Decoding stops at the first stream error, which is recorded in the
/// listing; everything decoded before it is kept.
pub fn describe_binary(reader: impl Read) -> Listing {
    let mut listing = Listing {
        text: String::new(),
        words: 0,
        unknown: 0,
        error: None,
    };

    for word in Words::new(reader) {
        let word = match word {
            Ok(word) => word,
            Err(e) => {
                listing.error = Some(e);
                break;
            }
        };
        listing.words += 1;

        let (name, thread_id, operand_id, value) = match binary::decode(word) {
            Decoded::Event(e) => (kind_name(e.kind), e.thread_id, e.operand_id, e.value),
            Decoded::Unknown {
                thread_id,
                operand_id,
                value,
                ..
            } => {
                listing.unknown += 1;
                ("unknown", thread_id, operand_id, value)
            }
        };
        // Writing to a String cannot fail.
        let _ = writeln!(
            listing.text,
            "Raw event (uint64_t): {}\n{} {} {} {}\n",
            word, name, thread_id, operand_id, value
        );
    }

    listing
}

fn kind_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Read => "read",
        EventKind::Write => "write",
        EventKind::Acquire => "acq",
        EventKind::Release => "rel",
        _ => "unknown",
    }
}
