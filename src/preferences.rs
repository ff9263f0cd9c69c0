//! User preference loading.
//!
//! The preference file is plain text read at call time. The bridge tolerates
//! its absence ([`load_preferences`]); the interactive `run` command does not
//! ([`read_preferences`]).

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::StudioError;

/// Location of the preference file, relative to the project root.
pub const USER_PREFERENCE_PATH: &str = "knowledge/user_preference.txt";

/// Read the full preference file, returning an empty string when it is absent.
///
/// Other read failures are logged and also resolve to an empty string.
pub fn load_preferences(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no user preference file");
            String::new()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable user preference file");
            String::new()
        }
    }
}

/// Read the full preference file; a missing or unreadable file is an error.
pub fn read_preferences(path: impl AsRef<Path>) -> Result<String, StudioError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| StudioError::PreferenceRead {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_empty() {
        assert_eq!(load_preferences("nonexistent"), "");
    }

    #[test]
    fn test_load_reads_full_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_preference.txt");
        fs::write(&path, "Likes light roasts.\nNo sugar.\n").unwrap();

        assert_eq!(load_preferences(&path), "Likes light roasts.\nNo sugar.\n");
        assert_eq!(read_preferences(&path).unwrap(), "Likes light roasts.\nNo sugar.\n");
    }

    #[test]
    fn test_read_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let err = read_preferences(&path).unwrap_err();
        match err {
            StudioError::PreferenceRead { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_preferences(dir.path()), "");
    }
}
