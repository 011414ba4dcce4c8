//! Decoded metadata for a single archive member.

use crate::header::{HeaderError, TypeFlag, BLOCK_SIZE};
use crate::walk::Record;

/// One archive member, decoded from its header record.
///
/// Unlike [`Header`](crate::Header), an `Entry` owns its strings and does
/// not borrow from any buffer, so it can outlive the walk that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Byte offset of the header record in the archive.
    pub offset: u64,

    /// Member path as stored (UStar prefix joined), lossily decoded as UTF-8.
    pub path: String,

    /// Classification from the `typeflag` byte.
    pub type_flag: TypeFlag,

    /// Declared payload length in bytes.
    pub size: u64,

    /// The `linkname` field, `None` when empty.
    pub link_target: Option<String>,

    /// Permission bits; zero if the field cannot be decoded.
    pub mode: u32,

    /// Modification time as a Unix timestamp; zero if the field cannot be
    /// decoded.
    pub mtime: u64,
}

impl Entry {
    /// Only the size field is required to decode; queries never look at
    /// `mode` or `mtime`.
    pub(crate) fn from_record(record: &Record) -> Result<Self, HeaderError> {
        let header = &record.header;
        let link = header.link_name_bytes();
        Ok(Self {
            offset: record.offset,
            path: header.path_lossy().into_owned(),
            type_flag: header.type_flag(),
            size: header.entry_size()?,
            link_target: (!link.is_empty()).then(|| String::from_utf8_lossy(link).into_owned()),
            mode: header.mode().unwrap_or_default(),
            mtime: header.mtime().unwrap_or_default(),
        })
    }

    /// Byte offset of the first data byte.
    #[must_use]
    pub fn data_offset(&self) -> u64 {
        self.offset + BLOCK_SIZE as u64
    }

    /// True for directory records, and for pre-POSIX regular records whose
    /// name ends in `/` (how old tar wrote directories).
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.type_flag.is_dir()
            || (self.type_flag == TypeFlag::LegacyRegular && self.path.ends_with('/'))
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.type_flag.is_regular() && !self.is_dir()
    }

    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.type_flag.is_symlink()
    }

    /// The link target of a symbolic link; empty if the record has none.
    #[must_use]
    pub fn symlink_target(&self) -> Option<&str> {
        if !self.is_symlink() {
            return None;
        }
        Some(self.link_target.as_deref().unwrap_or(""))
    }

    /// Short human readable kind, as printed by listings.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        if self.is_dir() {
            "directory"
        } else if self.is_file() {
            "file"
        } else if self.is_symlink() {
            "symlink"
        } else if self.type_flag == TypeFlag::HardLink {
            "hardlink"
        } else {
            "other"
        }
    }
}
