//! Sequential walk over the header records of an archive.
//!
//! The walk never relies on where a previous operation left the stream
//! cursor: it carries the offset of the next record itself and seeks there
//! before every read.

use std::io::{self, Read, Seek, SeekFrom};

use log::trace;

use crate::error::{ArchiveError, Result};
use crate::header::{Header, BLOCK_SIZE};

/// A header record together with its position in the archive.
#[derive(Debug, Clone, Copy)]
pub struct Record {
    /// Byte offset of the header record.
    pub offset: u64,
    /// The decoded header.
    pub header: Header,
}

impl Record {
    /// Offset of the record that follows this one.
    pub fn next_offset(&self) -> Result<u64> {
        self.header
            .padded_size()?
            .and_then(|padded| padded.checked_add(self.offset + BLOCK_SIZE as u64))
            .ok_or_else(|| ArchiveError::InvalidSize(self.header.entry_size().unwrap_or(u64::MAX)))
    }
}

/// Peek at the block starting at `offset` and report whether the archive
/// ends there.
///
/// Up to two blocks are read but only the first is inspected: the archive
/// ends if it is all zeros or if fewer than [`BLOCK_SIZE`] bytes remain in
/// the stream. The stream cursor is restored before returning.
pub fn at_end_of_archive<R: Read + Seek>(reader: &mut R, offset: u64) -> io::Result<bool> {
    let saved = reader.stream_position()?;
    reader.seek(SeekFrom::Start(offset))?;
    let mut peek = [0u8; 2 * BLOCK_SIZE];
    let filled = read_up_to(reader, &mut peek);
    reader.seek(SeekFrom::Start(saved))?;
    let filled = filled?;

    if filled < BLOCK_SIZE {
        return Ok(true);
    }
    Ok(Header::from_bytes(&peek).is_ok_and(Header::is_zero_block))
}

/// Iterator over the header records of an archive, from offset zero up to
/// the end-of-archive marker.
///
/// The next record's offset is only computed when it is requested, so a
/// caller can inspect a record (for example its magic tag) before its size
/// field is decoded. After the first error the walk is finished.
#[derive(Debug)]
pub struct HeaderWalk<'r, R> {
    reader: &'r mut R,
    offset: u64,
    previous: Option<Record>,
    done: bool,
}

impl<'r, R: Read + Seek> HeaderWalk<'r, R> {
    pub fn new(reader: &'r mut R) -> Self {
        Self::starting_at(reader, 0)
    }

    pub fn starting_at(reader: &'r mut R, offset: u64) -> Self {
        Self {
            reader,
            offset,
            previous: None,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<Record>> {
        if let Some(previous) = self.previous.take() {
            self.offset = previous.next_offset()?;
        }

        if at_end_of_archive(&mut *self.reader, self.offset)? {
            trace!("end of archive at offset {}", self.offset);
            return Ok(None);
        }

        let mut block = [0u8; BLOCK_SIZE];
        self.reader.seek(SeekFrom::Start(self.offset))?;
        self.reader.read_exact(&mut block)?;

        let record = Record {
            offset: self.offset,
            header: *Header::from_bytes_exact(&block),
        };
        trace!("header at offset {}: {:?}", record.offset, record.header);
        self.previous = Some(record);
        Ok(Some(record))
    }
}

impl<R: Read + Seek> Iterator for HeaderWalk<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill as much of `buf` as the stream allows, returning the byte count.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
