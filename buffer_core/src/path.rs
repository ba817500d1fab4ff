//! File identity for buffers

use std::ffi::OsStr;
use std::fmt;
use std::path::{self, Path, PathBuf};

#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

/// Name shown for buffers that have no file behind them
pub const UNTITLED_NAME: &str = "Untitled";

/// Path of a buffer, or the untitled sentinel
///
/// A path is untitled when it is empty or ends with a directory separator
/// (a directory was chosen but no file name yet).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_support", serde(transparent))]
pub struct FilePath(PathBuf);

impl FilePath {
    pub fn untitled() -> Self {
        Self(PathBuf::new())
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Normalizes a user-supplied name to an absolute path
    ///
    /// Surrounding double quotes are stripped. Relative names resolve
    /// against the working directory; if that fails the name is kept as is.
    pub fn absolute(name: impl AsRef<Path>) -> Self {
        let raw = name.as_ref();
        let text = raw.to_string_lossy();
        let trimmed = text
            .strip_prefix('"')
            .map(|rest| rest.strip_suffix('"').unwrap_or(rest));
        let name: &Path = match trimmed {
            Some(unquoted) => Path::new(unquoted),
            None => raw,
        };
        if name.as_os_str().is_empty() {
            return Self::untitled();
        }
        match path::absolute(name) {
            Ok(abs) => Self(abs),
            Err(_) => Self(name.to_path_buf()),
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Raw bytes of the path, as written to recent and session files
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_os_str().as_encoded_bytes()
    }

    /// Path from raw bytes read back from a state file
    ///
    /// Any byte string is a path on unix. Elsewhere the bytes must be
    /// UTF-8, and `None` is returned otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;
            Some(Self::new(OsStr::from_bytes(bytes)))
        }
        #[cfg(not(unix))]
        {
            std::str::from_utf8(bytes).ok().map(Self::new)
        }
    }

    /// True when any name, even a directory, has been set
    pub fn is_set(&self) -> bool {
        !self.0.as_os_str().is_empty()
    }

    pub fn is_untitled(&self) -> bool {
        let text = self.0.to_string_lossy();
        match text.chars().last() {
            None => true,
            Some(last) => path::is_separator(last),
        }
    }

    /// Compares path identity, ignoring case on case-insensitive platforms
    pub fn same_name_as(&self, other: impl AsRef<Path>) -> bool {
        let other = other.as_ref();
        if other.as_os_str().is_empty() {
            return false;
        }
        names_equal(self.0.as_os_str(), other.as_os_str())
    }

    /// File name component, without the directory
    pub fn file_name(&self) -> Option<&str> {
        if self.is_untitled() {
            return None;
        }
        self.0.file_name().and_then(OsStr::to_str)
    }

    pub fn extension(&self) -> Option<&str> {
        if self.is_untitled() {
            return None;
        }
        self.0.extension().and_then(OsStr::to_str)
    }

    /// Title for tabs and menus
    pub fn display_name(&self) -> String {
        match self.file_name() {
            Some(name) => name.to_string(),
            None if self.is_untitled() => UNTITLED_NAME.to_string(),
            None => self.0.display().to_string(),
        }
    }
}

#[cfg(windows)]
fn names_equal(a: &OsStr, b: &OsStr) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

#[cfg(not(windows))]
fn names_equal(a: &OsStr, b: &OsStr) -> bool {
    a == b
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for FilePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for FilePath {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untitled_sentinel() {
        assert!(FilePath::untitled().is_untitled());
        assert!(!FilePath::untitled().is_set());
        let dir_only = format!("{}tmp{}", path::MAIN_SEPARATOR, path::MAIN_SEPARATOR);
        let dir = FilePath::new(dir_only);
        assert!(dir.is_untitled());
        assert!(dir.is_set());
    }

    #[test]
    fn test_titled_path() {
        let path = FilePath::new("/home/user/notes.txt");
        assert!(!path.is_untitled());
        assert_eq!(path.file_name(), Some("notes.txt"));
        assert_eq!(path.extension(), Some("txt"));
        assert_eq!(path.display_name(), "notes.txt");
    }

    #[test]
    fn test_untitled_display_name() {
        assert_eq!(FilePath::untitled().display_name(), UNTITLED_NAME);
        assert_eq!(FilePath::untitled().file_name(), None);
    }

    #[test]
    fn test_same_name_as() {
        let path = FilePath::new("/src/main.rs");
        assert!(path.same_name_as("/src/main.rs"));
        assert!(!path.same_name_as("/src/lib.rs"));
        assert!(!path.same_name_as(""));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_same_name_is_case_sensitive() {
        let path = FilePath::new("/src/Main.rs");
        assert!(!path.same_name_as("/src/main.rs"));
    }

    #[test]
    fn test_absolute_resolves_relative_names() {
        let path = FilePath::absolute("relative.txt");
        assert!(path.as_path().is_absolute());
        assert_eq!(path.file_name(), Some("relative.txt"));
    }

    #[test]
    fn test_absolute_strips_quotes() {
        let path = FilePath::absolute("\"quoted.txt\"");
        assert_eq!(path.file_name(), Some("quoted.txt"));
    }

    #[test]
    fn test_bytes_round_trip() {
        let path = FilePath::new("/src/notes one.txt");
        assert_eq!(path.as_bytes(), b"/src/notes one.txt");
        assert_eq!(FilePath::from_bytes(path.as_bytes()), Some(path));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_bytes_are_a_path_on_unix() {
        let path = FilePath::from_bytes(b"/tmp/caf\xe9.txt").unwrap();
        assert_eq!(path.as_bytes(), b"/tmp/caf\xe9.txt");
        assert!(!path.is_untitled());
    }

    #[test]
    fn test_absolute_of_empty_is_untitled() {
        assert!(FilePath::absolute("").is_untitled());
    }
}
