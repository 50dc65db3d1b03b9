//! Binary trace format.
//!
//! A binary trace is a flat sequence of little-endian 64-bit words, one per
//! event. Only data and lock events have a binary encoding.
//!
//! | Bits  | Width | Field                                  |
//! |-------|-------|----------------------------------------|
//! | 60-63 | 4     | Kind: 0 Read, 1 Write, 2 Acq, 3 Rel    |
//! | 52-59 | 8     | Thread ID                              |
//! | 32-51 | 20    | Variable or lock ID                    |
//! | 0-31  | 32    | Value                                  |

use std::io::{self, Read, Write};

use crate::types::*;

/// Size of one encoded event in bytes.
pub const WORD_SIZE: usize = 8;

const KIND_SHIFT: u32 = 60;
const KIND_MASK: u64 = 0xF;
const THREAD_SHIFT: u32 = 52;
const THREAD_MASK: u64 = 0xFF;
const OPERAND_SHIFT: u32 = 32;
const OPERAND_MASK: u64 = 0xF_FFFF;
const VALUE_MASK: u64 = 0xFFFF_FFFF;

/// Largest thread id that fits in a word.
pub const MAX_THREAD_ID: u32 = THREAD_MASK as u32;
/// Largest variable or lock id that fits in a word.
pub const MAX_OPERAND_ID: u32 = OPERAND_MASK as u32;
/// Largest value that fits in a word. Negative values do not fit.
pub const MAX_VALUE: i64 = VALUE_MASK as i64;

/// Pack an event into a word.
pub fn encode(event: &Event) -> Result<u64, EncodeError> {
    let kind = event
        .kind
        .nibble()
        .ok_or(EncodeError::UnsupportedKind(event.kind))?;
    if event.thread_id > MAX_THREAD_ID {
        return Err(EncodeError::ThreadIdOutOfRange(event.thread_id));
    }
    if event.operand_id > MAX_OPERAND_ID {
        return Err(EncodeError::OperandIdOutOfRange(event.operand_id));
    }
    if !(0..=MAX_VALUE).contains(&event.value) {
        return Err(EncodeError::ValueOutOfRange(event.value));
    }

    Ok((kind as u64) << KIND_SHIFT
        | (event.thread_id as u64) << THREAD_SHIFT
        | (event.operand_id as u64) << OPERAND_SHIFT
        | event.value as u64)
}

/// An unpacked word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Event(Event),
    /// The kind nibble is not a known event kind. The remaining fields are
    /// still extracted so the word can be reported.
    Unknown {
        kind: u8,
        thread_id: u32,
        operand_id: u32,
        value: i64,
    },
}

/// Unpack a word. Never fails; unknown kinds are returned as
/// [`Decoded::Unknown`].
pub fn decode(word: u64) -> Decoded {
    let kind = ((word >> KIND_SHIFT) & KIND_MASK) as u8;
    let thread_id = ((word >> THREAD_SHIFT) & THREAD_MASK) as u32;
    let operand_id = ((word >> OPERAND_SHIFT) & OPERAND_MASK) as u32;
    let value = (word & VALUE_MASK) as i64;

    match EventKind::from_nibble(kind) {
        Some(kind) => Decoded::Event(Event::new(kind, thread_id, operand_id, value)),
        None => {
            log::warn!("unknown event kind {} in word {:#018x}", kind, word);
            Decoded::Unknown {
                kind,
                thread_id,
                operand_id,
                value,
            }
        }
    }
}

/// Write one word.
pub fn write_word(writer: &mut impl Write, word: u64) -> io::Result<()> {
    writer.write_all(&word.to_le_bytes())
}

/// Iterates over the words of a binary trace.
///
/// Iteration ends at a clean word boundary. A non-empty tail shorter than
/// a word yields [`DecodeError::Truncated`] once, after which the iterator
/// is exhausted. IO errors are also yielded once and end iteration.
pub struct Words<R> {
    reader: R,
    offset: u64,
    done: bool,
}

impl<R: Read> Words<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Byte offset of the next word.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read up to a full word, returning how many bytes were filled.
    fn fill(&mut self, buf: &mut [u8; WORD_SIZE]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < WORD_SIZE {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for Words<R> {
    type Item = Result<u64, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = [0u8; WORD_SIZE];
        match self.fill(&mut buf) {
            Ok(WORD_SIZE) => {
                self.offset += WORD_SIZE as u64;
                Some(Ok(u64::from_le_bytes(buf)))
            }
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(len) => {
                self.done = true;
                Some(Err(DecodeError::Truncated {
                    offset: self.offset,
                    len,
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(DecodeError::Io(e)))
            }
        }
    }
}
