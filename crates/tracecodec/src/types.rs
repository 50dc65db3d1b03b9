use std::fmt;

// === Error types ===

/// A malformed line in a textual trace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct LineError {
    /// 1-based line number within the trace.
    pub line: usize,
    pub kind: LineErrorKind,
}

impl LineError {
    pub fn new(line: usize, kind: LineErrorKind) -> Self {
        Self { line, kind }
    }
}

/// What was wrong with a malformed line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineErrorKind {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("unknown action: {0:?}")]
    UnknownAction(String),

    #[error("unknown event kind: {0:?}")]
    UnknownKind(String),

    #[error("missing parenthesis in {0:?}")]
    MissingParenthesis(String),

    #[error("invalid thread token: {0:?}")]
    InvalidThread(String),

    #[error("invalid operand: {0:?}")]
    InvalidOperand(String),

    #[error("invalid value: {0:?}")]
    InvalidValue(String),

    #[error("unexpected trailing field: {0:?}")]
    TrailingField(String),
}

/// Errors that can occur when packing an event into a binary word.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("thread id {0} does not fit in 8 bits")]
    ThreadIdOutOfRange(u32),

    #[error("operand id {0} does not fit in 20 bits")]
    OperandIdOutOfRange(u32),

    #[error("value {0} does not fit in an unsigned 32-bit field")]
    ValueOutOfRange(i64),

    #[error("{0:?} events have no binary encoding")]
    UnsupportedKind(EventKind),
}

/// Errors that can occur when reading words from a binary trace.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The stream ended in the middle of a word.
    #[error("truncated word at byte offset {offset}: {len} trailing bytes")]
    Truncated { offset: u64, len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort the conversion of a whole trace.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Line(#[from] LineError),

    #[error("line {line}: {source}")]
    Encode {
        line: usize,
        #[source]
        source: EncodeError,
    },
}

// === Events ===

/// The kind of a trace event.
///
/// Discriminants match the kind nibble of the binary format for the
/// kinds that have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    Read = 0,
    Write = 1,
    Acquire = 2,
    Release = 3,
    Begin = 4,
    End = 5,
    Fork = 6,
    Join = 7,
}

impl EventKind {
    /// The mnemonic used in canonical textual traces.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Write => "Write",
            Self::Acquire => "Acq",
            Self::Release => "Rel",
            Self::Begin => "Begin",
            Self::End => "End",
            Self::Fork => "Fork",
            Self::Join => "Join",
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Some(match s {
            "Read" => Self::Read,
            "Write" => Self::Write,
            "Acq" => Self::Acquire,
            "Rel" => Self::Release,
            "Begin" => Self::Begin,
            "End" => Self::End,
            "Fork" => Self::Fork,
            "Join" => Self::Join,
            _ => return None,
        })
    }

    /// Kind nibble in the binary format, if the kind is encodable.
    pub fn nibble(self) -> Option<u8> {
        match self {
            Self::Read | Self::Write | Self::Acquire | Self::Release => Some(self as u8),
            _ => None,
        }
    }

    pub(crate) fn from_nibble(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Read),
            1 => Some(Self::Write),
            2 => Some(Self::Acquire),
            3 => Some(Self::Release),
            _ => None,
        }
    }

    /// Read or Write.
    pub fn is_access(self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }

    /// Acquire or Release.
    pub fn is_lock(self) -> bool {
        matches!(self, Self::Acquire | Self::Release)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One event of a concurrent execution trace.
///
/// `operand_id` holds the variable id for Read/Write, the lock id for
/// Acquire/Release and a thread id for Fork/Join/Begin/End.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub kind: EventKind,
    pub thread_id: u32,
    pub operand_id: u32,
    pub value: i64,
}

impl Event {
    pub fn new(kind: EventKind, thread_id: u32, operand_id: u32, value: i64) -> Self {
        Self {
            kind,
            thread_id,
            operand_id,
            value,
        }
    }

    pub fn read(thread_id: u32, var_id: u32, value: i64) -> Self {
        Self::new(EventKind::Read, thread_id, var_id, value)
    }

    pub fn write(thread_id: u32, var_id: u32, value: i64) -> Self {
        Self::new(EventKind::Write, thread_id, var_id, value)
    }

    pub fn acquire(thread_id: u32, lock_id: u32) -> Self {
        Self::new(EventKind::Acquire, thread_id, lock_id, 0)
    }

    pub fn release(thread_id: u32, lock_id: u32) -> Self {
        Self::new(EventKind::Release, thread_id, lock_id, 0)
    }

    pub fn fork(thread_id: u32, child: u32) -> Self {
        Self::new(EventKind::Fork, thread_id, child, 0)
    }

    pub fn join(thread_id: u32, child: u32) -> Self {
        Self::new(EventKind::Join, thread_id, child, 0)
    }

    /// Start of the lifecycle of thread `tid`.
    pub fn begin(tid: u32) -> Self {
        Self::new(EventKind::Begin, tid, tid, 0)
    }

    /// End of the lifecycle of thread `tid`.
    pub fn end(tid: u32) -> Self {
        Self::new(EventKind::End, tid, tid, 0)
    }
}
