//! Rendering of events in the canonical textual format.
//!
//! Each line is `<Kind> <thread> <operand> <value>`. Fork and Join carry an
//! implied lifecycle event for the target thread: a `Fork` line is directly
//! followed by `Begin <target> 0 0`, and a `Join` line is directly preceded
//! by `End <target> 0 0`. Downstream analyzers rely on that ordering.

use std::fmt::Write;

use crate::types::{Event, EventKind};

/// The events one parsed event stands for, in emission order.
pub fn expand(event: Event) -> impl Iterator<Item = Event> {
    let (first, second) = match event.kind {
        EventKind::Fork => (event, Some(Event::begin(event.operand_id))),
        EventKind::Join => (Event::end(event.operand_id), Some(event)),
        _ => (event, None),
    };
    std::iter::once(first).chain(second)
}

/// Render one event as a canonical line, without a line terminator.
pub fn emit_line(event: &Event) -> String {
    let mut out = String::new();
    write_line(&mut out, event);
    out
}

/// Append the canonical rendering of `event` to `out`.
pub fn write_line(out: &mut String, event: &Event) {
    let kind = event.kind.mnemonic();
    // Writing to a String cannot fail.
    let _ = match event.kind {
        EventKind::Read | EventKind::Write => write!(
            out,
            "{} {} X_{} {}",
            kind, event.thread_id, event.operand_id, event.value
        ),
        EventKind::Begin | EventKind::End => write!(out, "{} {} 0 0", kind, event.thread_id),
        EventKind::Acquire | EventKind::Release | EventKind::Fork | EventKind::Join => write!(
            out,
            "{} {} {} {}",
            kind, event.thread_id, event.operand_id, event.value
        ),
    };
}

/// Accumulates canonical lines into a single text blob.
///
/// Lines are separated by `\n`; the blob has no trailing newline.
#[derive(Debug, Default)]
pub struct Emitter {
    out: String,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `event` together with any lifecycle event it implies.
    pub fn push(&mut self, event: Event) {
        for e in expand(event) {
            if !self.out.is_empty() {
                self.out.push('\n');
            }
            write_line(&mut self.out, &e);
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}
