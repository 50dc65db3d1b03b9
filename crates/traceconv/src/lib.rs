//! Batch conversion of trace files with `tracecodec`.
//!
//! Each file is converted independently: it gets its own identifier
//! registry, and a file that fails to convert does not stop the batch.

pub mod batch;
pub mod config;
