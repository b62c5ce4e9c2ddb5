//! Owner-only file helpers used by the profile catalogue.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Write},
    path::Path,
};

use tempfile::NamedTempFile;

/// Permission bits for the state directory.
pub const PRIVATE_DIR_MODE: u32 = 0o700;
/// Permission bits for files inside the state directory.
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Outcome of `ensure_private_dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    Existing,
    Created,
}

/// Make sure `dir` exists, creating it (and its parents) owner-only when absent.
///
/// Any stat failure other than "not found" is returned unchanged.
pub fn ensure_private_dir(dir: &Path) -> Result<DirStatus, io::Error> {
    match fs::metadata(dir) {
        Ok(metadata) if metadata.is_dir() => Ok(DirStatus::Existing),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", dir.display()),
        )),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            create_private_dir(dir)?;
            Ok(DirStatus::Created)
        }
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<(), io::Error> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new()
        .recursive(true)
        .mode(PRIVATE_DIR_MODE)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<(), io::Error> {
    fs::create_dir_all(dir)
}

/// Read the whole file, creating it empty (owner read/write) if it does not exist.
pub fn read_or_create_private(path: &Path) -> Result<Vec<u8>, io::Error> {
    match File::open(path) {
        Ok(mut file) => {
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer)?;
            Ok(buffer)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            create_private_file(path)?;
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

fn create_private_file(path: &Path) -> Result<File, io::Error> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_FILE_MODE);
    }
    options.open(path)
}

/// Replace `path` with `contents` through a sibling temporary file and a rename.
///
/// Readers observe either the previous contents or the new ones, never a
/// truncated file. There is no locking: the last rename wins.
pub fn write_private_atomic(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(parent)?;
    set_private_permissions(staged.as_file())?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_private_permissions(file: &File) -> Result<(), io::Error> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(PRIVATE_FILE_MODE))
}

#[cfg(not(unix))]
fn set_private_permissions(_file: &File) -> Result<(), io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn ensure_private_dir_creates_then_reports_existing() {
        let temp = tempdir().expect("can create temp directory");
        let dir = temp.path().join("nested").join(".machine");

        assert_eq!(
            ensure_private_dir(&dir).expect("first call creates"),
            DirStatus::Created
        );
        assert_eq!(
            ensure_private_dir(&dir).expect("second call succeeds"),
            DirStatus::Existing
        );
        assert!(dir.is_dir());
    }

    #[test]
    fn ensure_private_dir_rejects_regular_file() {
        let temp = tempdir().expect("can create temp directory");
        let file = temp.path().join("occupied");
        fs::write(&file, b"not a dir").expect("can write file");

        assert!(ensure_private_dir(&file).is_err());
    }

    #[test]
    fn read_or_create_private_creates_empty_file() {
        let temp = tempdir().expect("can create temp directory");
        let path = temp.path().join("catalogue.json");

        let contents = read_or_create_private(&path).expect("read succeeds");

        assert!(contents.is_empty());
        assert!(path.is_file(), "missing file should be created");
    }

    #[test]
    fn write_private_atomic_replaces_contents() {
        let temp = tempdir().expect("can create temp directory");
        let path = temp.path().join("catalogue.json");
        fs::write(&path, b"a much longer previous payload").expect("can seed file");

        write_private_atomic(&path, b"{}").expect("write succeeds");

        assert_eq!(fs::read(&path).expect("can read back"), b"{}");
        let leftovers = fs::read_dir(temp.path())
            .expect("can list directory")
            .count();
        assert_eq!(leftovers, 1, "temporary file must not be left behind");
    }

    #[cfg(unix)]
    #[test]
    fn created_entries_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().expect("can create temp directory");
        let dir = temp.path().join(".machine");
        ensure_private_dir(&dir).expect("can create dir");
        let path = dir.join("catalogue.json");
        write_private_atomic(&path, b"{}").expect("write succeeds");

        let dir_mode = fs::metadata(&dir).expect("dir metadata").permissions().mode();
        let file_mode = fs::metadata(&path).expect("file metadata").permissions().mode();
        assert_eq!(dir_mode & 0o777, PRIVATE_DIR_MODE);
        assert_eq!(file_mode & 0o777, PRIVATE_FILE_MODE);
    }
}
