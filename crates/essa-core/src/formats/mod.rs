//! # Formats
//!
//! Pure byte/text transformations. No file I/O.
//!
//! - [`csv`]: results table as RFC 4180 CSV
//! - [`persistence`]: session snapshots (magic header + postcard)

pub mod csv;
pub mod persistence;

pub use persistence::{MAX_SNAPSHOT_SIZE, SnapshotHeader, session_from_bytes, session_to_bytes};
