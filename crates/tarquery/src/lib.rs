//! Read-only queries over classic (UStar) tar archives.
//!
//! A [`TarArchive`] wraps any seekable stream and answers questions about it
//! without building an index: each query walks the 512-byte header records
//! from the start of the stream, skipping each member's data blocks, until
//! it finds what it needs or reaches the all-zero end-of-archive block.
//!
//! - [`TarArchive::validate`] checks magic, version and checksum of every
//!   header and counts them.
//! - [`TarArchive::exists`], [`is_dir`](TarArchive::is_dir),
//!   [`is_file`](TarArchive::is_file) and
//!   [`is_symlink`](TarArchive::is_symlink) classify a path.
//! - [`TarArchive::list`] returns the immediate children of a directory.
//! - [`TarArchive::read_file`] copies file bytes from an offset.
//!
//! Symbolic links are followed by `list` and `read_file`, relative to the
//! directory containing the link, up to [`Limits::max_symlink_hops`] hops.
//!
//! Only the classic fixed header layout is understood; GNU long-name and PAX
//! extension records are walked over like any other member but not applied.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use tarquery::TarArchive;
//!
//! let mut builder = tar::Builder::new(Vec::new());
//! let mut header = tar::Header::new_ustar();
//! header.set_size(5);
//! header.set_mode(0o644);
//! builder.append_data(&mut header, "hello.txt", &b"hello"[..]).unwrap();
//! let data = builder.into_inner().unwrap();
//!
//! let mut archive = TarArchive::new(Cursor::new(data));
//! assert_eq!(archive.validate().unwrap(), 1);
//! assert!(archive.is_file("hello.txt").unwrap());
//!
//! let mut buf = [0u8; 3];
//! let read = archive.read_file("hello.txt", 2, &mut buf).unwrap();
//! assert_eq!(&buf[..read.written], b"llo");
//! assert_eq!(read.remaining, 0);
//! ```

mod archive;
mod entry;
mod error;
pub mod header;
mod limits;
pub mod path;
pub mod walk;

pub use archive::{FileRead, ListStatus, TarArchive};
pub use entry::Entry;
pub use error::{ArchiveError, Result};
pub use header::{Header, HeaderError, TypeFlag, BLOCK_SIZE};
pub use limits::Limits;
