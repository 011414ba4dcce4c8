//! Queries over a seekable tar archive.

use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::entry::Entry;
use crate::error::{ArchiveError, Result};
use crate::limits::Limits;
use crate::path;
use crate::walk::HeaderWalk;

/// Result of a [`TarArchive::read_file`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRead {
    /// Bytes written to the start of the destination buffer.
    pub written: usize,
    /// Bytes left in the file after the ones written. Zero means the read
    /// reached the end of the file.
    pub remaining: u64,
}

/// Result of a [`TarArchive::list_into`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStatus {
    /// Entries written to the output slice.
    pub written: usize,
    /// Immediate children the directory actually has.
    pub total: usize,
}

impl ListStatus {
    /// True if the output slice was too small for every child.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.total > self.written
    }
}

/// Read-only view of a tar archive held in a seekable stream.
///
/// There is no index: every query walks the headers from the start of the
/// stream. Queries take `&mut self` because they move the stream cursor;
/// open one stream per concurrent user.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use tarquery::TarArchive;
///
/// let mut archive = TarArchive::new(File::open("archive.tar")?);
/// let headers = archive.validate()?;
/// println!("{headers} headers");
///
/// if let Some(children) = archive.list("Folder/")? {
///     for child in children {
///         println!("{child}");
///     }
/// }
/// # Ok::<(), tarquery::ArchiveError>(())
/// ```
#[derive(Debug)]
pub struct TarArchive<R> {
    reader: R,
    limits: Limits,
}

impl<R: Read + Seek> TarArchive<R> {
    /// Wrap `reader` with default [`Limits`].
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, Limits::default())
    }

    /// Wrap `reader` with custom [`Limits`].
    pub fn with_limits(reader: R, limits: Limits) -> Self {
        Self { reader, limits }
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn walk(&mut self) -> HeaderWalk<'_, R> {
        HeaderWalk::new(&mut self.reader)
    }

    /// Check the magic tag, version tag and checksum of every header.
    ///
    /// Returns the number of headers in the archive. The first bad record
    /// stops the walk: magic is checked before version, version before
    /// checksum.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::BadMagic`], [`ArchiveError::BadVersion`] or
    /// [`ArchiveError::BadChecksum`] for a bad record; I/O and size decoding
    /// errors are passed through.
    pub fn validate(&mut self) -> Result<usize> {
        let mut count = 0;
        for record in self.walk() {
            let record = record?;
            let header = &record.header;
            let offset = record.offset;

            if !header.has_ustar_magic() {
                return Err(ArchiveError::BadMagic { offset });
            }
            if !header.has_ustar_version() {
                return Err(ArchiveError::BadVersion { offset });
            }
            let stored = header.stored_checksum().ok();
            let computed = header.compute_checksum();
            if stored != Some(computed) {
                return Err(ArchiveError::BadChecksum {
                    offset,
                    stored,
                    computed,
                });
            }
            count += 1;
        }
        debug!("validated {count} headers");
        Ok(count)
    }

    /// Every member of the archive, in archive order.
    pub fn entries(&mut self) -> Result<Vec<Entry>> {
        self.walk()
            .map(|record| -> Result<Entry> { Ok(Entry::from_record(&record?)?) })
            .collect()
    }

    /// Find the first member stored under `path`.
    ///
    /// Paths are compared whole after normalization, so a trailing `/` and
    /// `.` segments such as a leading `./` do not matter. Symbolic links are
    /// not followed.
    pub fn lookup(&mut self, path: &str) -> Result<Option<Entry>> {
        if path::is_root(path) {
            return Ok(None);
        }
        for record in self.walk() {
            let record = record?;
            if path::matches(&record.header.path_lossy(), path) {
                return Ok(Some(Entry::from_record(&record)?));
            }
        }
        Ok(None)
    }

    /// True if a member is stored at `path`.
    pub fn exists(&mut self, path: &str) -> Result<bool> {
        Ok(self.lookup(path)?.is_some())
    }

    /// True if `path` is a directory member.
    pub fn is_dir(&mut self, path: &str) -> Result<bool> {
        Ok(self.lookup(path)?.is_some_and(|e| e.is_dir()))
    }

    /// True if `path` is a regular file member.
    pub fn is_file(&mut self, path: &str) -> Result<bool> {
        Ok(self.lookup(path)?.is_some_and(|e| e.is_file()))
    }

    /// True if `path` is a symbolic link member.
    pub fn is_symlink(&mut self, path: &str) -> Result<bool> {
        Ok(self.lookup(path)?.is_some_and(|e| e.is_symlink()))
    }

    /// Find the member `path` refers to, following symbolic links.
    ///
    /// Returns `None` if `path`, or any link target along the way, does not
    /// exist.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::SymlinkLoop`] once more than
    /// [`Limits::max_symlink_hops`] links have been followed, and
    /// [`ArchiveError::PathTooLong`] if a target exceeds
    /// [`Limits::max_path_len`].
    pub fn resolve(&mut self, path: &str) -> Result<Option<Entry>> {
        let mut current = path.to_owned();
        let mut hops = 0;
        loop {
            let Some(entry) = self.lookup(&current)? else {
                return Ok(None);
            };
            let Some(target) = entry.symlink_target() else {
                return Ok(Some(entry));
            };
            if hops >= self.limits.max_symlink_hops {
                return Err(ArchiveError::SymlinkLoop {
                    path: path.to_owned(),
                    hops,
                });
            }
            hops += 1;

            let next = path::resolve_link(&entry.path, target);
            if next.len() > self.limits.max_path_len {
                return Err(ArchiveError::PathTooLong {
                    len: next.len(),
                    limit: self.limits.max_path_len,
                });
            }
            debug!("{current} -> {next}");
            current = next;
        }
    }

    /// Directory path to list for `path`, or `None` if it is not a directory.
    fn directory(&mut self, path: &str) -> Result<Option<String>> {
        if path::is_root(path) {
            return Ok(Some(String::new()));
        }
        Ok(self
            .resolve(path)?
            .filter(Entry::is_dir)
            .map(|entry| entry.path))
    }

    /// Paths of the immediate children of directory `path`, in archive order.
    ///
    /// A symbolic link is followed to its target directory. The empty path
    /// (or `/`) lists the top level of the archive. Returns `None` if no
    /// directory exists at `path`.
    pub fn list(&mut self, path: &str) -> Result<Option<Vec<String>>> {
        let Some(dir) = self.directory(path)? else {
            return Ok(None);
        };

        let mut children = Vec::new();
        for record in self.walk() {
            let record = record?;
            let name = record.header.path_lossy();
            if path::child_name(&dir, &name).is_some() {
                children.push(name.into_owned());
            }
        }
        debug!("{} children under {dir:?}", children.len());
        Ok(Some(children))
    }

    /// Like [`list`](Self::list), writing into a caller-provided slice.
    ///
    /// At most `out.len()` children are written; the returned
    /// [`ListStatus`] tells how many were written and how many exist.
    pub fn list_into(&mut self, path: &str, out: &mut [String]) -> Result<Option<ListStatus>> {
        let Some(children) = self.list(path)? else {
            return Ok(None);
        };
        let total = children.len();
        let mut written = 0;
        for (slot, child) in out.iter_mut().zip(children) {
            *slot = child;
            written += 1;
        }
        Ok(Some(ListStatus { written, total }))
    }

    /// Read file `path` starting at `offset` into `buf`.
    ///
    /// Symbolic links are followed. Reads `min(buf.len(), size - offset)`
    /// bytes; an `offset` equal to the file size is an empty, successful
    /// read.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotFound`] if nothing exists at `path`,
    /// [`ArchiveError::IsDirectory`] for directories,
    /// [`ArchiveError::OffsetOutOfRange`] if `offset` is past the end, plus
    /// the link resolution errors of [`resolve`](Self::resolve).
    pub fn read_file(&mut self, path: &str, offset: u64, buf: &mut [u8]) -> Result<FileRead> {
        let entry = self.file_entry(path)?;
        self.read_entry(&entry, offset, buf)
    }

    /// Read the whole content of file `path`.
    pub fn read_to_vec(&mut self, path: &str) -> Result<Vec<u8>> {
        let entry = self.file_entry(path)?;
        let len = usize::try_from(entry.size).map_err(|_| ArchiveError::InvalidSize(entry.size))?;
        let mut data = vec![0u8; len];
        self.read_entry(&entry, 0, &mut data)?;
        Ok(data)
    }

    fn file_entry(&mut self, path: &str) -> Result<Entry> {
        let entry = self
            .resolve(path)?
            .ok_or_else(|| ArchiveError::NotFound(path.to_owned()))?;
        if entry.is_dir() {
            return Err(ArchiveError::IsDirectory(path.to_owned()));
        }
        Ok(entry)
    }

    fn read_entry(&mut self, entry: &Entry, offset: u64, buf: &mut [u8]) -> Result<FileRead> {
        if offset > entry.size {
            return Err(ArchiveError::OffsetOutOfRange {
                offset,
                size: entry.size,
            });
        }
        let available = entry.size - offset;
        let written = usize::try_from(available).map_or(buf.len(), |a| a.min(buf.len()));

        self.reader
            .seek(SeekFrom::Start(entry.data_offset() + offset))?;
        self.reader.read_exact(&mut buf[..written])?;

        Ok(FileRead {
            written,
            remaining: available - written as u64,
        })
    }
}
