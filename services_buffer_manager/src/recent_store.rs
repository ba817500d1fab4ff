//! Recent-files list on disk
//!
//! One absolute path per line, oldest first, path bytes written verbatim.
//! Reading pushes each line onto the stack in file order, so the last line
//! ends up on top.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use buffer_core::{FilePath, RecentFileStack, SelectionRange};

use crate::session::byte_lines;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentStore {
    path: PathBuf,
}

impl RecentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pushes the stored paths onto `stack`, returning how many were read
    ///
    /// At most `stack.capacity()` lines are read. The file is read whole
    /// before the stack is touched. Lines that are not a path on this
    /// platform are skipped.
    pub fn load_into(&self, stack: &mut RecentFileStack) -> io::Result<usize> {
        let bytes = fs::read(&self.path)?;
        let mut count = 0;
        for line in byte_lines(&bytes).take(stack.capacity()) {
            match FilePath::from_bytes(line) {
                Some(path) => {
                    stack.push(&path, SelectionRange::default(), 0);
                    count += 1;
                }
                None => tracing::debug!(
                    line = %String::from_utf8_lossy(line),
                    "recent entry skipped"
                ),
            }
        }
        Ok(count)
    }

    pub fn save(&self, stack: &RecentFileStack) -> io::Result<()> {
        let mut out = Vec::new();
        for entry in stack.persisted_order() {
            out.extend_from_slice(entry.path.as_bytes());
            out.push(b'\n');
        }
        fs::write(&self.path, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(names: &[&str]) -> RecentFileStack {
        let mut stack = RecentFileStack::new(4);
        for name in names {
            stack.push(&FilePath::new(*name), SelectionRange::default(), 0);
        }
        stack
    }

    #[test]
    fn test_save_writes_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecentStore::new(dir.path().join("recent"));
        store.save(&stack_of(&["/a", "/b", "/c"])).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "/a\n/b\n/c\n");
    }

    #[test]
    fn test_load_restores_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecentStore::new(dir.path().join("recent"));
        let original = stack_of(&["/a", "/b", "/c"]);
        store.save(&original).unwrap();

        let mut restored = RecentFileStack::new(4);
        assert_eq!(store.load_into(&mut restored).unwrap(), 3);
        assert_eq!(restored, original);
    }

    #[test]
    fn test_load_reads_at_most_capacity_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recent");
        fs::write(&path, "/1\n/2\n/3\n/4\n/5\n/6\n").unwrap();

        let mut stack = RecentFileStack::new(4);
        RecentStore::new(&path).load_into(&mut stack).unwrap();
        let names: Vec<String> = stack.iter().map(|rf| rf.path.to_string()).collect();
        assert_eq!(names, vec!["/4", "/3", "/2", "/1"]);
    }

    #[test]
    fn test_missing_file_leaves_stack_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut stack = stack_of(&["/a"]);
        let store = RecentStore::new(dir.path().join("nope"));
        assert!(store.load_into(&mut stack).is_err());
        assert_eq!(stack.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecentStore::new(dir.path().join("recent"));
        let mut original = RecentFileStack::new(4);
        for name in [&b"/a"[..], &b"/caf\xe9.txt"[..], &b"/c"[..]] {
            let path = FilePath::from_bytes(name).unwrap();
            original.push(&path, SelectionRange::default(), 0);
        }
        store.save(&original).unwrap();
        assert_eq!(fs::read(store.path()).unwrap(), b"/a\n/caf\xe9.txt\n/c\n");

        let mut restored = RecentFileStack::new(4);
        assert_eq!(store.load_into(&mut restored).unwrap(), 3);
        assert_eq!(restored, original);
    }
}
