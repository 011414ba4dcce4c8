//! Zerocopy view of a classic UStar header record.
//!
//! Every member of a tar archive is described by one 512-byte record:
//!
//! | Offset | Size | Field     | Encoding                              |
//! |--------|------|-----------|---------------------------------------|
//! | 0      | 100  | name      | NUL-terminated if shorter than 100    |
//! | 100    | 8    | mode      | octal ASCII                           |
//! | 108    | 8    | uid       | octal ASCII                           |
//! | 116    | 8    | gid       | octal ASCII                           |
//! | 124    | 12   | size      | octal ASCII (or base-256)             |
//! | 136    | 12   | mtime     | octal ASCII (or base-256)             |
//! | 148    | 8    | checksum  | octal ASCII                           |
//! | 156    | 1    | typeflag  | see [`TypeFlag`]                      |
//! | 157    | 100  | linkname  | symlink / hard link target            |
//! | 257    | 6    | magic     | `"ustar\0"`                           |
//! | 263    | 2    | version   | `"00"`                                |
//! | 265    | 32   | uname     | owner user name                       |
//! | 297    | 32   | gname     | owner group name                      |
//! | 329    | 8    | devmajor  | octal ASCII                           |
//! | 337    | 8    | devminor  | octal ASCII                           |
//! | 345    | 155  | prefix    | leading path components               |
//!
//! Decoding is pure: nothing here checks magic, version or checksum. The
//! archive validator does that with the accessors below.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Size of a header record, and of every data block, in bytes.
pub const BLOCK_SIZE: usize = 512;

/// Magic tag of a UStar header, including its terminator.
pub const USTAR_MAGIC: &[u8; 6] = b"ustar\0";

/// Version tag of a UStar header (no terminator).
pub const USTAR_VERSION: &[u8; 2] = b"00";

/// Byte range of the checksum field inside a record.
pub const CHECKSUM_RANGE: Range<usize> = 148..156;

/// Errors raised while decoding header fields.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// Fewer than [`BLOCK_SIZE`] bytes were supplied.
    #[error("insufficient data: expected {BLOCK_SIZE} bytes, got {0}")]
    InsufficientData(usize),

    /// A numeric field holds something other than octal digits.
    #[error("invalid octal field: {0:?}")]
    InvalidOctal(Vec<u8>),
}

/// Entry classification stored in the `typeflag` byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeFlag {
    /// Regular file (`'0'`).
    Regular,
    /// Regular file written by pre-POSIX tar (`'\0'`).
    LegacyRegular,
    /// Hard link to an earlier member (`'1'`).
    HardLink,
    /// Symbolic link (`'2'`).
    Symlink,
    /// Directory (`'5'`).
    Directory,
    /// Anything else: devices, FIFOs, extension records.
    Other(u8),
}

impl TypeFlag {
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' => TypeFlag::Regular,
            b'\0' => TypeFlag::LegacyRegular,
            b'1' => TypeFlag::HardLink,
            b'2' => TypeFlag::Symlink,
            b'5' => TypeFlag::Directory,
            other => TypeFlag::Other(other),
        }
    }

    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            TypeFlag::Regular => b'0',
            TypeFlag::LegacyRegular => b'\0',
            TypeFlag::HardLink => b'1',
            TypeFlag::Symlink => b'2',
            TypeFlag::Directory => b'5',
            TypeFlag::Other(b) => b,
        }
    }

    /// True for both the POSIX and the legacy regular-file flag.
    #[must_use]
    pub fn is_regular(self) -> bool {
        matches!(self, TypeFlag::Regular | TypeFlag::LegacyRegular)
    }

    #[must_use]
    pub fn is_dir(self) -> bool {
        self == TypeFlag::Directory
    }

    #[must_use]
    pub fn is_symlink(self) -> bool {
        self == TypeFlag::Symlink
    }
}

impl From<u8> for TypeFlag {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

/// One 512-byte header record with named fields.
///
/// The struct is a plain byte layout, so it can be viewed in place over a
/// buffer ([`Header::from_bytes`]) or copied out of one.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Header {
    pub name: [u8; 100],
    pub mode: [u8; 8],
    pub uid: [u8; 8],
    pub gid: [u8; 8],
    pub size: [u8; 12],
    pub mtime: [u8; 12],
    pub checksum: [u8; 8],
    pub typeflag: u8,
    pub linkname: [u8; 100],
    pub magic: [u8; 6],
    pub version: [u8; 2],
    pub uname: [u8; 32],
    pub gname: [u8; 32],
    pub devmajor: [u8; 8],
    pub devminor: [u8; 8],
    pub prefix: [u8; 155],
    pub pad: [u8; 12],
}

impl Header {
    /// View the first [`BLOCK_SIZE`] bytes of `bytes` as a header.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InsufficientData`] if the slice is too short.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Header, HeaderError> {
        if bytes.len() < BLOCK_SIZE {
            return Err(HeaderError::InsufficientData(bytes.len()));
        }
        Header::ref_from_bytes(&bytes[..BLOCK_SIZE])
            .map_err(|_| HeaderError::InsufficientData(bytes.len()))
    }

    /// View an exactly sized block as a header.
    #[must_use]
    pub fn from_bytes_exact(bytes: &[u8; BLOCK_SIZE]) -> &Header {
        zerocopy::transmute_ref!(bytes)
    }

    /// The record as raw bytes.
    #[must_use]
    pub fn as_block(&self) -> &[u8; BLOCK_SIZE] {
        zerocopy::transmute_ref!(self)
    }

    #[must_use]
    pub fn type_flag(&self) -> TypeFlag {
        TypeFlag::from_byte(self.typeflag)
    }

    /// The `name` field up to its terminator.
    #[must_use]
    pub fn name_bytes(&self) -> &[u8] {
        truncate_null(&self.name)
    }

    /// The UStar `prefix` field up to its terminator.
    #[must_use]
    pub fn prefix_bytes(&self) -> &[u8] {
        truncate_null(&self.prefix)
    }

    /// The member path: `prefix/name` when a prefix is present.
    #[must_use]
    pub fn path_bytes(&self) -> Cow<'_, [u8]> {
        let prefix = self.prefix_bytes();
        if prefix.is_empty() {
            return Cow::Borrowed(self.name_bytes());
        }
        let mut path = Vec::with_capacity(prefix.len() + 1 + self.name_bytes().len());
        path.extend_from_slice(prefix);
        path.push(b'/');
        path.extend_from_slice(self.name_bytes());
        Cow::Owned(path)
    }

    /// The member path as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn path_lossy(&self) -> Cow<'_, str> {
        match self.path_bytes() {
            Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
            Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    #[must_use]
    pub fn link_name_bytes(&self) -> &[u8] {
        truncate_null(&self.linkname)
    }

    /// Declared length of the data payload.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the field cannot be decoded.
    pub fn entry_size(&self) -> Result<u64, HeaderError> {
        parse_numeric(&self.size)
    }

    /// Permission bits.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the field cannot be decoded
    /// or does not fit in 32 bits.
    pub fn mode(&self) -> Result<u32, HeaderError> {
        let mode = parse_numeric(&self.mode)?;
        u32::try_from(mode).map_err(|_| HeaderError::InvalidOctal(self.mode.to_vec()))
    }

    pub fn uid(&self) -> Result<u64, HeaderError> {
        parse_numeric(&self.uid)
    }

    pub fn gid(&self) -> Result<u64, HeaderError> {
        parse_numeric(&self.gid)
    }

    pub fn mtime(&self) -> Result<u64, HeaderError> {
        parse_numeric(&self.mtime)
    }

    /// The checksum recorded in the header.
    pub fn stored_checksum(&self) -> Result<u64, HeaderError> {
        parse_octal(&self.checksum)
    }

    /// Unsigned sum of all record bytes, with the checksum field counted as
    /// eight ASCII spaces.
    #[must_use]
    pub fn compute_checksum(&self) -> u64 {
        self.as_bytes()
            .iter()
            .enumerate()
            .map(|(i, &byte)| {
                if CHECKSUM_RANGE.contains(&i) {
                    u64::from(b' ')
                } else {
                    u64::from(byte)
                }
            })
            .sum()
    }

    #[must_use]
    pub fn has_ustar_magic(&self) -> bool {
        self.magic == *USTAR_MAGIC
    }

    #[must_use]
    pub fn has_ustar_version(&self) -> bool {
        self.version == *USTAR_VERSION
    }

    /// True when every byte of the record is zero.
    #[must_use]
    pub fn is_zero_block(&self) -> bool {
        self.as_bytes().iter().all(|&b| b == 0)
    }

    /// Number of bytes between the end of this header and the next one.
    ///
    /// Returns `None` if the padded size overflows.
    pub fn padded_size(&self) -> Result<Option<u64>, HeaderError> {
        Ok(self.entry_size()?.checked_next_multiple_of(BLOCK_SIZE as u64))
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("path", &self.path_lossy())
            .field("type_flag", &self.type_flag())
            .field("size", &self.entry_size().ok())
            .field(
                "linkname",
                &String::from_utf8_lossy(self.link_name_bytes()),
            )
            .finish_non_exhaustive()
    }
}

/// Decode an octal ASCII field.
///
/// Leading spaces are skipped and the digits end at the first space or NUL,
/// so `"0000644\0"`, `"   644 "` and `"644"` all decode to `0o644`. An
/// empty field is zero.
///
/// # Errors
///
/// Returns [`HeaderError::InvalidOctal`] on any other character or on
/// overflow.
pub fn parse_octal(bytes: &[u8]) -> Result<u64, HeaderError> {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let digits = &bytes[start..];
    let digits = match digits.iter().position(|&b| b == b' ' || b == b'\0') {
        Some(end) => &digits[..end],
        None => digits,
    };

    digits.iter().try_fold(0u64, |acc, &byte| {
        if !(b'0'..=b'7').contains(&byte) {
            return Err(HeaderError::InvalidOctal(bytes.to_vec()));
        }
        acc.checked_mul(8)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or_else(|| HeaderError::InvalidOctal(bytes.to_vec()))
    })
}

/// Decode a numeric field that is either octal ASCII or, when the high bit
/// of its first byte is set, big-endian base-256.
pub fn parse_numeric(bytes: &[u8]) -> Result<u64, HeaderError> {
    match bytes.first() {
        Some(&first) if first & 0x80 != 0 => {
            bytes[1..].iter().try_fold(u64::from(first & 0x7f), |acc, &byte| {
                acc.checked_mul(256)
                    .and_then(|v| v.checked_add(u64::from(byte)))
                    .ok_or_else(|| HeaderError::InvalidOctal(bytes.to_vec()))
            })
        }
        _ => parse_octal(bytes),
    }
}

/// Cut a fixed-size field at its first NUL byte.
#[must_use]
pub fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}
