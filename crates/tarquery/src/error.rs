//! Error types for archive queries.

use thiserror::Error;

use crate::header::HeaderError;

/// Errors returned by [`TarArchive`](crate::TarArchive) operations.
///
/// Structural errors (`BadMagic`, `BadVersion`, `BadChecksum`) come from
/// [`TarArchive::validate`](crate::TarArchive::validate) and abort it at the
/// first offending record. Lookup misses in the classification and listing
/// queries are reported as `Ok(false)` / `Ok(None)` rather than errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A numeric header field could not be decoded.
    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    /// The magic tag of a record is not `"ustar\0"`.
    #[error("bad magic in header at offset {offset}")]
    BadMagic {
        /// Byte offset of the record.
        offset: u64,
    },

    /// The version tag of a record is not `"00"`.
    #[error("bad version in header at offset {offset}")]
    BadVersion {
        /// Byte offset of the record.
        offset: u64,
    },

    /// The stored checksum does not match the recomputed one.
    #[error("bad checksum in header at offset {offset}: stored {stored:?}, computed {computed}")]
    BadChecksum {
        /// Byte offset of the record.
        offset: u64,
        /// Decoded checksum field, `None` if it is not valid octal.
        stored: Option<u64>,
        /// Checksum computed over the record.
        computed: u64,
    },

    /// No entry exists at the requested path.
    #[error("no such entry: {0}")]
    NotFound(String),

    /// A file operation was attempted on a directory.
    #[error("is a directory: {0}")]
    IsDirectory(String),

    /// A read started beyond the end of the file.
    #[error("offset {offset} is beyond the end of a {size} byte file")]
    OffsetOutOfRange {
        /// Requested offset.
        offset: u64,
        /// Declared file size.
        size: u64,
    },

    /// Following symbolic links did not reach a non-link entry in time.
    #[error("too many levels of symbolic links resolving {path} ({hops} hops)")]
    SymlinkLoop {
        /// The path the resolution started from.
        path: String,
        /// Number of links followed before giving up.
        hops: usize,
    },

    /// A resolved link path exceeds the configured maximum length.
    #[error("resolved path exceeds limit: {len} bytes > {limit} bytes")]
    PathTooLong {
        /// Length of the resolved path.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The declared size of an entry cannot be represented.
    #[error("invalid entry size: {0}")]
    InvalidSize(u64),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
