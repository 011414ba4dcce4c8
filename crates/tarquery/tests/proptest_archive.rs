//! Property-based checks over generated archives.
//!
//! Archives are produced with the `tar` crate from generated directory trees
//! and then queried through [`TarArchive`].

use std::collections::BTreeMap;
use std::io::Cursor;

use proptest::prelude::*;
use tarquery::{ArchiveError, TarArchive};

/// Strategy for a single path segment.
fn segment_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_.-]{0,11}")
        .expect("valid regex")
}

/// Strategy for a map of file name to content under a single directory.
fn files_strategy() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    proptest::collection::btree_map(
        segment_strategy(),
        proptest::collection::vec(any::<u8>(), 0..2048),
        0..12,
    )
}

fn build(dir: &str, files: &BTreeMap<String, Vec<u8>>, nested: &[String]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut header = tar::Header::new_ustar();
    header.set_mode(0o755);
    header.set_size(0);
    header.set_entry_type(tar::EntryType::Directory);
    builder
        .append_data(&mut header, format!("{dir}/"), std::io::empty())
        .unwrap();

    for (name, content) in files {
        let mut header = tar::Header::new_ustar();
        header.set_mode(0o644);
        header.set_size(content.len() as u64);
        header.set_entry_type(tar::EntryType::Regular);
        builder
            .append_data(&mut header, format!("{dir}/{name}"), content.as_slice())
            .unwrap();
    }

    for name in nested {
        let mut header = tar::Header::new_ustar();
        header.set_mode(0o644);
        header.set_size(1);
        header.set_entry_type(tar::EntryType::Regular);
        builder
            .append_data(&mut header, format!("{dir}/sub/{name}"), &b"n"[..])
            .unwrap();
    }

    builder.into_inner().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_validate_counts_every_header(
        dir in segment_strategy(),
        files in files_strategy(),
        nested in proptest::collection::vec(segment_strategy(), 0..4),
    ) {
        let data = build(&dir, &files, &nested);
        let mut archive = TarArchive::new(Cursor::new(data));
        prop_assert_eq!(archive.validate().unwrap(), 1 + files.len() + nested.len());
    }

    #[test]
    fn test_chunked_reads_reconstruct_content(
        dir in segment_strategy(),
        files in files_strategy(),
        chunk in 1usize..700,
    ) {
        let data = build(&dir, &files, &[]);
        let mut archive = TarArchive::new(Cursor::new(data));
        let mut buf = vec![0u8; chunk];

        for (name, content) in &files {
            let path = format!("{dir}/{name}");
            let mut collected = Vec::new();
            let mut offset = 0u64;
            loop {
                let read = archive.read_file(&path, offset, &mut buf).unwrap();
                collected.extend_from_slice(&buf[..read.written]);
                offset += read.written as u64;
                prop_assert_eq!(read.remaining, content.len() as u64 - offset);
                if read.remaining == 0 {
                    break;
                }
            }
            prop_assert_eq!(&collected, content);

            let past_end = archive.read_file(&path, content.len() as u64 + 1, &mut buf);
            let is_out_of_range = matches!(past_end, Err(ArchiveError::OffsetOutOfRange { .. }));
            prop_assert!(is_out_of_range);
        }
    }

    #[test]
    fn test_list_returns_direct_children_only(
        dir in segment_strategy(),
        files in files_strategy(),
        nested in proptest::collection::vec(segment_strategy(), 1..4),
    ) {
        let data = build(&dir, &files, &nested);
        let mut archive = TarArchive::new(Cursor::new(data));

        let listed = archive.list(&dir).unwrap().unwrap();
        let expected: Vec<String> = files.keys().map(|name| format!("{dir}/{name}")).collect();
        prop_assert_eq!(listed, expected);
    }

    #[test]
    fn test_unknown_paths_do_not_exist(
        dir in segment_strategy(),
        files in files_strategy(),
        probe in segment_strategy(),
    ) {
        prop_assume!(!files.contains_key(&probe));
        let data = build(&dir, &files, &[]);
        let mut archive = TarArchive::new(Cursor::new(data));

        let path = format!("{dir}/{probe}");
        prop_assert!(!archive.exists(&path).unwrap());
        prop_assert!(!archive.is_file(&path).unwrap());
        prop_assert!(!archive.is_dir(&path).unwrap());
        prop_assert!(!archive.is_symlink(&path).unwrap());
    }
}
