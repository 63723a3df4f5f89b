//! Provides input/output functionality for scene files.
//!
//! Filters are trait objects keyed by file extension so that plugins can add
//! formats at startup. The [`compression`] helpers resolve a filename into a
//! format and an optional gzip layer.

pub mod compression;
pub mod traits;
pub mod xyz;
