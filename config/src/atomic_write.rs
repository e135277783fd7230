use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Replaces `path` with `contents`. The bytes land in a sibling temp file
/// first, so readers see either the old file or the new one.
pub(crate) fn write_file_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        )
    })?;
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn replaces_contents_without_leaving_temp_files() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("settings.json");

        write_file_atomically(&path, b"one")?;
        write_file_atomically(&path, b"two")?;

        assert_eq!(fs::read_to_string(&path)?, "two");
        let entries = fs::read_dir(path.parent().unwrap_or(dir.path()))?
            .collect::<io::Result<Vec<_>>>()?;
        assert_eq!(entries.len(), 1);
        Ok(())
    }

    #[test]
    fn path_without_parent_is_rejected() {
        let err = write_file_atomically(Path::new(""), b"x").expect_err("no parent directory");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
