//! Codec for concurrency execution traces.
//!
//! Traces record thread fork/join, memory reads/writes and lock
//! acquire/release events. This crate converts between three forms:
//!
//! - raw traces, one pipe-delimited event per line (`T20|acq(L2a45c47085)|361`),
//! - canonical traces with dense integer ids (`Acq 20 0 0`),
//! - binary traces, one little-endian 64-bit word per event.
//!
//! Lock and variable names are mapped to ids in first-seen order by a
//! [`Registry`] that lives for the conversion of a single trace.
//!
//! # Binary format
//!
//! | Bits  | Width | Field                                  |
//! |-------|-------|----------------------------------------|
//! | 60-63 | 4     | Kind: 0 Read, 1 Write, 2 Acq, 3 Rel    |
//! | 52-59 | 8     | Thread ID                              |
//! | 32-51 | 20    | Variable or lock ID                    |
//! | 0-31  | 32    | Value                                  |
//!
//! # Usage
//!
//! ```
//! use tracecodec::TraceConverter;
//!
//! let input = "T2|fork(T1)|0\nT20|acq(L2a45c47085)|361\nT20|rel(L2a45c47085)|361";
//! let output = TraceConverter::new().to_canonical(input).unwrap();
//! assert_eq!(output, "Fork 2 1 0\nBegin 1 0 0\nAcq 20 0 0\nRel 20 0 0");
//! ```

pub mod binary;
pub mod convert;
pub mod emitter;
pub mod parser;
pub mod registry;
pub mod types;
pub mod values;

pub use binary::{decode, encode, Decoded, Words};
pub use convert::{canonical_to_binary, describe_binary, Listing, TraceConverter};
pub use registry::{Category, LockIds, Registry};
pub use types::{ConvertError, DecodeError, EncodeError, Event, EventKind, LineError, LineErrorKind};
pub use values::{RandomValues, ValuePolicy, ValueSource};
