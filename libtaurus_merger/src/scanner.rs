use std::path::{Path, PathBuf};

use super::error::ScannerError;

/// The Taurus files found in one subdirectory of the input
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
    pub total_size_bytes: u64,
}

/// List the immediate subdirectories of the input root.
///
/// Entries are kept in the order the filesystem returns them; cochannel matching depends on it.
pub fn scan_directories(root: &Path) -> Result<Vec<PathBuf>, ScannerError> {
    if !root.exists() {
        return Err(ScannerError::BadFilePath(root.to_path_buf()));
    }
    let mut dirs: Vec<PathBuf> = Vec::new();
    for item in root.read_dir()? {
        let path = item?.path();
        // is_dir follows symlinks, DirEntry::file_type does not
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

/// List the files of a directory whose name ends with `suffix`, in scan order
pub fn scan_files(directory: &Path, suffix: &str) -> Result<DirectoryListing, ScannerError> {
    if !directory.exists() {
        return Err(ScannerError::BadFilePath(directory.to_path_buf()));
    }
    let mut listing = DirectoryListing {
        directory: directory.to_path_buf(),
        ..Default::default()
    };
    for item in directory.read_dir()? {
        let path = item?.path();
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Could not read {}, skipping it: {e}", path.to_string_lossy());
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(suffix))
            .unwrap_or(false);
        if matches {
            listing.total_size_bytes += metadata.len();
            listing.files.push(path);
        }
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan() {
        let root = tempfile::tempdir().unwrap();
        let day = root.path().join("day1");
        std::fs::create_dir(&day).unwrap();
        std::fs::create_dir(root.path().join("day2")).unwrap();
        std::fs::write(root.path().join("stray.seed"), b"x").unwrap();
        std::fs::write(day.join("XX.STA.00.HHZ_20200101_000000.seed"), b"abcd").unwrap();
        std::fs::write(day.join("XX.STA.00.HHN_20200101_000000.seed"), b"ab").unwrap();
        std::fs::write(day.join("notes.txt"), b"hello").unwrap();
        std::fs::create_dir(day.join("sub.seed")).unwrap();

        let mut dirs = scan_directories(root.path()).unwrap();
        dirs.sort();
        assert_eq!(dirs, vec![day.clone(), root.path().join("day2")]);

        let listing = scan_files(&day, "seed").unwrap();
        assert_eq!(listing.files.len(), 2);
        assert_eq!(listing.total_size_bytes, 6);
        assert!(listing
            .files
            .iter()
            .all(|f| f.to_string_lossy().ends_with(".seed")));

        assert!(matches!(
            scan_directories(&root.path().join("missing")),
            Err(ScannerError::BadFilePath(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let storage = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let real_day = storage.path().join("day1");
        std::fs::create_dir(&real_day).unwrap();
        std::fs::write(real_day.join("XX.STA.00.HHZ_20200101_000000.seed"), b"abc").unwrap();
        let real_file = storage.path().join("XX.STA.00.HHN_20200101_000000.seed");
        std::fs::write(&real_file, b"abcde").unwrap();

        symlink(&real_day, root.path().join("day1")).unwrap();
        let day2 = root.path().join("day2");
        std::fs::create_dir(&day2).unwrap();
        symlink(&real_file, day2.join("XX.STA.00.HHN_20200101_000000.seed")).unwrap();
        symlink(
            storage.path().join("gone.seed"),
            day2.join("XX.STA.00.HHE_20200101_000000.seed"),
        )
        .unwrap();

        let mut dirs = scan_directories(root.path()).unwrap();
        dirs.sort();
        assert_eq!(dirs, vec![root.path().join("day1"), day2.clone()]);

        let linked_day = scan_files(&root.path().join("day1"), "seed").unwrap();
        assert_eq!(linked_day.files.len(), 1);
        assert_eq!(linked_day.total_size_bytes, 3);

        // The dangling link is skipped
        let linked_file = scan_files(&day2, "seed").unwrap();
        assert_eq!(
            linked_file.files,
            vec![day2.join("XX.STA.00.HHN_20200101_000000.seed")]
        );
        assert_eq!(linked_file.total_size_bytes, 5);
    }
}
