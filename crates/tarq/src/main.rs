//! tarq - query classic tar archives without extracting them.
//!
//! Every subcommand opens the archive read-only and answers from its
//! headers: `check` validates every header, `stat` classifies paths, `ls`
//! lists a directory, `cat` prints (part of) a file, `entries` dumps all
//! members. Set `RUST_LOG=debug` to trace the header walk.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

use tarquery::{Entry, TarArchive};

/// Query classic tar archives.
#[derive(Parser, Debug)]
#[command(name = "tarq", version, about)]
struct Cli {
    /// The tar archive to open.
    archive: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every header and print how many there are.
    Check,

    /// Print whether each path exists and what kind of entry it is.
    Stat {
        /// Paths inside the archive.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// List the immediate children of a directory.
    Ls {
        /// Directory inside the archive; the archive root if omitted.
        #[arg(default_value = "")]
        path: String,
    },

    /// Print the content of a file, following symbolic links.
    Cat {
        /// File inside the archive.
        path: String,

        /// Byte offset to start reading at.
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Maximum number of bytes to print.
        #[arg(long)]
        length: Option<u64>,

        /// Print a hex dump instead of raw bytes.
        #[arg(long)]
        hexdump: bool,
    },

    /// Print every member in archive order.
    Entries,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let file = File::open(&cli.archive)
        .with_context(|| format!("opening {}", cli.archive.display()))?;
    let mut archive = TarArchive::new(file);
    let mut out = BufWriter::new(io::stdout().lock());

    match cli.command {
        Command::Check => cmd_check(&mut archive, &mut out)?,
        Command::Stat { paths } => cmd_stat(&mut archive, &paths, &mut out)?,
        Command::Ls { path } => cmd_ls(&mut archive, &path, &mut out)?,
        Command::Cat {
            path,
            offset,
            length,
            hexdump,
        } => cmd_cat(&mut archive, &path, offset, length, hexdump, &mut out)?,
        Command::Entries => cmd_entries(&mut archive, &mut out)?,
    }

    out.flush()?;
    Ok(())
}

fn cmd_check(archive: &mut TarArchive<File>, out: &mut impl Write) -> Result<()> {
    let count = archive.validate().context("validating archive")?;
    writeln!(out, "{count} headers")?;
    Ok(())
}

fn cmd_stat(archive: &mut TarArchive<File>, paths: &[String], out: &mut impl Write) -> Result<()> {
    for path in paths {
        match archive.lookup(path)? {
            Some(entry) => writeln!(out, "{path}\t{}", describe(&entry))?,
            None => writeln!(out, "{path}\tmissing")?,
        }
    }
    Ok(())
}

fn cmd_ls(archive: &mut TarArchive<File>, path: &str, out: &mut impl Write) -> Result<()> {
    let Some(children) = archive.list(path)? else {
        bail!("{path}: no such directory");
    };
    for child in children {
        writeln!(out, "{child}")?;
    }
    Ok(())
}

fn cmd_cat(
    archive: &mut TarArchive<File>,
    path: &str,
    offset: u64,
    length: Option<u64>,
    hexdump: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut position = offset;
    let mut left = length.unwrap_or(u64::MAX);

    while left > 0 {
        let want = usize::try_from(left).map_or(buf.len(), |l| l.min(buf.len()));
        let read = archive
            .read_file(path, position, &mut buf[..want])
            .with_context(|| format!("reading {path} at offset {position}"))?;
        debug!("read {} bytes, {} remaining", read.written, read.remaining);

        let chunk = &buf[..read.written];
        if hexdump {
            write_hexdump(out, position, chunk)?;
        } else {
            out.write_all(chunk)?;
        }

        position += read.written as u64;
        left -= read.written as u64;
        if read.remaining == 0 || read.written == 0 {
            break;
        }
    }
    Ok(())
}

fn cmd_entries(archive: &mut TarArchive<File>, out: &mut impl Write) -> Result<()> {
    for entry in archive.entries()? {
        writeln!(
            out,
            "{:>10} {:04o} {:>10} {}",
            entry.offset,
            entry.mode,
            entry.size,
            format_path(&entry)
        )?;
    }
    Ok(())
}

fn describe(entry: &Entry) -> String {
    match entry.symlink_target() {
        Some(target) => format!("symlink -> {target}"),
        None if entry.is_file() => format!("file, {} bytes", entry.size),
        None => entry.kind().to_owned(),
    }
}

fn format_path(entry: &Entry) -> String {
    match entry.symlink_target() {
        Some(target) => format!("{} -> {target}", entry.path),
        None => entry.path.clone(),
    }
}

/// Sixteen bytes per line: offset, hex bytes, printable characters.
fn write_hexdump(out: &mut impl Write, start: u64, bytes: &[u8]) -> io::Result<()> {
    for (i, line) in bytes.chunks(16).enumerate() {
        write!(out, "{:08x}:  ", start + (i * 16) as u64)?;
        for byte in line {
            write!(out, "{byte:02x} ")?;
        }
        for _ in line.len()..16 {
            write!(out, "   ")?;
        }
        write!(out, " ")?;
        for &byte in line {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '.'
            };
            write!(out, "{c}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
