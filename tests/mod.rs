//! Main test module for cron-backup
//!
//! This module includes all test suites:
//! - Integration tests for the scheduler driving real archives
//! - Chaos tests for unreadable sources and broken destinations
//! - Property-based tests for completeness and round-trip fidelity

pub mod property;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Contents of an archive: entry name to data (`None` for directories)
pub fn read_archive(path: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut out = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let name = file.name().to_string();
        if file.is_dir() {
            out.insert(name, None);
        } else {
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            out.insert(name, Some(data));
        }
    }
    out
}

/// Entry names in archive order
pub fn archive_order(path: &Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[cfg(test)]
mod edge_cases {
    use super::*;
    use cron_backup::Archiver;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_source_directory() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let out = dest.path().join("empty.zip");

        let summary = Archiver::new().archive_to(&out, source.path()).unwrap();
        assert_eq!(summary.entries, 0);
        assert!(read_archive(&out).is_empty());
    }

    #[test]
    fn test_empty_directories_preserved() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("a/b/c")).unwrap();
        fs::create_dir(source.path().join("lonely")).unwrap();
        let out = dest.path().join("dirs.zip");

        let summary = Archiver::new().archive_to(&out, source.path()).unwrap();
        assert_eq!(summary.entries, 4);
        assert_eq!(summary.files, 0);
        assert_eq!(
            archive_order(&out),
            vec!["a/", "a/b/", "a/b/c/", "lonely/"]
        );
    }

    #[test]
    fn test_special_filenames() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let special_names = vec![
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file.with.dots.txt",
            "file@with#special$chars.txt",
            "file(with)parens.txt",
            "ünïcødé.txt",
        ];

        let mut written = Vec::new();
        for name in &special_names {
            let path = source.path().join(name);
            if fs::write(&path, format!("Content of {}", name)).is_err() {
                // Skip if OS doesn't support this filename
                continue;
            }
            written.push(*name);
        }

        let out = dest.path().join("names.zip");
        Archiver::new().archive_to(&out, source.path()).unwrap();

        let contents = read_archive(&out);
        assert_eq!(contents.len(), written.len());
        for name in written {
            assert_eq!(
                contents[name],
                Some(format!("Content of {}", name).into_bytes())
            );
        }
    }

    #[test]
    fn test_deep_nesting() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let mut dir = source.path().to_path_buf();
        let mut expected = String::new();
        for i in 0..20 {
            dir = dir.join(format!("d{}", i));
            expected.push_str(&format!("d{}/", i));
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("leaf.txt"), b"leaf").unwrap();
        expected.push_str("leaf.txt");

        let out = dest.path().join("deep.zip");
        let summary = Archiver::new().archive_to(&out, source.path()).unwrap();
        assert_eq!(summary.entries, 21);
        assert_eq!(read_archive(&out)[&expected], Some(b"leaf".to_vec()));
    }

    #[test]
    fn test_old_timestamps_are_clamped() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let file = source.path().join("ancient.txt");
        fs::write(&file, b"old").unwrap();
        filetime::set_file_mtime(&file, filetime::FileTime::from_unix_time(0, 0)).unwrap();

        let out = dest.path().join("old.zip");
        Archiver::new().archive_to(&out, source.path()).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let entry = archive.by_name("ancient.txt").unwrap();
        assert_eq!(entry.last_modified().year(), 1980);
    }

    #[test]
    fn test_modification_time_recorded() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let file = source.path().join("dated.txt");
        fs::write(&file, b"x").unwrap();
        // 2021-06-15 12:00:00 UTC; year and month survive any local offset
        filetime::set_file_mtime(&file, filetime::FileTime::from_unix_time(1_623_758_400, 0))
            .unwrap();

        let out = dest.path().join("dated.zip");
        Archiver::new().archive_to(&out, source.path()).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let modified = archive.by_name("dated.txt").unwrap().last_modified();
        assert_eq!(modified.year(), 2021);
        assert_eq!(modified.month(), 6);
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_is_header_only() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let fifo = source.path().join("pipe");
        let made = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !made {
            // mkfifo unavailable on this system
            return;
        }
        fs::write(source.path().join("real.txt"), b"data").unwrap();

        let out = dest.path().join("fifo.zip");
        let summary = Archiver::new().archive_to(&out, source.path()).unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.files, 1);

        let contents = read_archive(&out);
        assert_eq!(contents["pipe"], Some(Vec::new()));
        assert_eq!(contents["real.txt"], Some(b"data".to_vec()));

        // Only permission bits survive, the entry reads back as a regular file
        let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let pipe = archive.by_name("pipe").unwrap();
        assert_eq!(pipe.size(), 0);
        assert_eq!(pipe.unix_mode().map(|m| m & 0o170000), Some(0o100000));
    }

    #[test]
    fn test_root_not_present_as_entry() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("only.txt"), b"1").unwrap();
        let out = dest.path().join("root.zip");

        Archiver::new().archive_to(&out, source.path()).unwrap();
        assert_eq!(archive_order(&out), vec!["only.txt"]);
    }
}
