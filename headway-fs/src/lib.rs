//! Capability-based file access for dataset inputs and report outputs.
//!
//! Paths are UTF-8 (`camino`) and every operation resolves an ambient
//! directory first, then works relative to it through `cap-std`.
#![forbid(unsafe_code)]

use std::io::{self, Read};
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Read a whole UTF-8 text file, such as a dataset document.
pub fn read_utf8(path: &Utf8Path) -> io::Result<String> {
    let mut file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Write `contents` to `path`, creating missing parent directories.
pub fn write_utf8(path: &Utf8Path, contents: &str) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_parent(path)?;
    dir.write(name.as_str(), contents)
}

/// Return whether `path` exists and is a regular file.
///
/// A missing parent directory counts as "not a file" rather than an error.
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match open_parent(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn open_parent(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }
    let (base, relative) = split_root(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

/// Split `parent` into an ambient base directory and the path below it.
fn split_root(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();
    let (base, relative) = match std_parent.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;
    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        match TempDir::new() {
            Ok(dir) => dir,
            Err(err) => panic!("create temporary directory: {err}"),
        }
    }

    fn utf8(dir: &TempDir, relative: &str) -> Utf8PathBuf {
        match Utf8PathBuf::from_path_buf(dir.path().join(relative)) {
            Ok(path) => path,
            Err(path) => panic!("non-UTF-8 temporary path {}", path.display()),
        }
    }

    #[rstest]
    fn writes_into_new_directories_and_reads_back(temp_dir: TempDir) {
        let path = utf8(&temp_dir, "reports/today/report.json");
        let written = write_utf8(&path, "{\"buffer\":600.0}");
        assert!(written.is_ok(), "write failed: {written:?}");
        let read = read_utf8(&path);
        assert_eq!(read.ok().as_deref(), Some("{\"buffer\":600.0}"));
    }

    #[rstest]
    fn detects_regular_files(temp_dir: TempDir) {
        let path = utf8(&temp_dir, "dataset.json");
        assert!(matches!(is_regular_file(&path), Ok(false)));
        assert!(write_utf8(&path, "{}").is_ok());
        assert!(matches!(is_regular_file(&path), Ok(true)));
        let nested = utf8(&temp_dir, "nested/inner.json");
        assert!(write_utf8(&nested, "{}").is_ok());
        let directory = utf8(&temp_dir, "nested");
        assert!(matches!(is_regular_file(&directory), Ok(false)));
    }

    #[rstest]
    fn missing_parents_are_not_files(temp_dir: TempDir) {
        let path = utf8(&temp_dir, "absent/dataset.json");
        assert!(matches!(is_regular_file(&path), Ok(false)));
    }

    #[rstest]
    fn reading_a_missing_file_fails(temp_dir: TempDir) {
        let path = utf8(&temp_dir, "absent.json");
        let err = read_utf8(&path).err().map(|err| err.kind());
        assert_eq!(err, Some(io::ErrorKind::NotFound));
    }
}
