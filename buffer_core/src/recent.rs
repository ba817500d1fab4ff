//! Recently closed files
//!
//! A fixed number of positions, most recent first. Holes only ever appear at
//! the tail: every operation shifts entries toward position 0 when one is
//! taken out.

use std::path::Path;

use crate::path::FilePath;
use crate::slot::SelectionRange;

/// Default number of remembered files
pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// A closed file and where its cursor was
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentFile {
    pub path: FilePath,
    pub selection: SelectionRange,
    pub scroll_line: usize,
}

impl RecentFile {
    pub fn new(path: FilePath, selection: SelectionRange, scroll_line: usize) -> Self {
        Self {
            path,
            selection,
            scroll_line,
        }
    }

    /// Entry without view state, as read back from the recent file
    pub fn at_start(path: FilePath) -> Self {
        Self::new(path, SelectionRange::default(), 0)
    }
}

/// Bounded stack of recent files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentFileStack {
    entries: Vec<Option<RecentFile>>,
}

impl RecentFileStack {
    /// Creates an empty stack with room for `capacity` files (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity.max(1)],
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of set entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries[0].is_none()
    }

    pub fn get(&self, pos: usize) -> Option<&RecentFile> {
        self.entries.get(pos).and_then(Option::as_ref)
    }

    pub fn top(&self) -> Option<&RecentFile> {
        self.get(0)
    }

    /// Set entries, most recent first
    pub fn iter(&self) -> impl Iterator<Item = &RecentFile> {
        self.entries.iter().flatten()
    }

    /// Records a file at position 0
    ///
    /// An existing entry for the same path is promoted instead of duplicated;
    /// otherwise the oldest entry falls off the end. Untitled paths are
    /// ignored.
    pub fn push(&mut self, path: &FilePath, selection: SelectionRange, scroll_line: usize) {
        if path.is_untitled() {
            return;
        }
        let last = self.entries.len() - 1;
        let eq_pos = self
            .entries
            .iter()
            .rposition(|e| matches!(e, Some(rf) if rf.path.same_name_as(path)))
            .unwrap_or(last);

        self.entries[..=eq_pos].rotate_right(1);
        self.entries[0] = Some(RecentFile::new(path.clone(), selection, scroll_line));
        tracing::trace!(path = %path, promoted_from = eq_pos, "recent file pushed");
    }

    /// Forgets `path`, closing the gap it leaves
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<RecentFile> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return None;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| matches!(e, Some(rf) if rf.path.same_name_as(path)))?;
        let removed = self.entries[pos].take();
        self.entries[pos..].rotate_left(1);
        removed
    }

    /// Discards the most recent entry
    pub fn drop_top(&mut self) -> Option<RecentFile> {
        let top = self.entries[0].take();
        self.entries.rotate_left(1);
        top
    }

    /// Position of the oldest set entry
    pub fn oldest_position(&self) -> Option<usize> {
        self.entries.iter().rposition(Option::is_some)
    }

    /// Last slot's entry, which reopening the top may push off the stack
    pub fn tail(&self) -> Option<&RecentFile> {
        self.entries.last().and_then(Option::as_ref)
    }

    /// Rotates the stack after its top entry has been reopened
    ///
    /// Moves every entry up one position and sends the old top to the first
    /// hole. `evicted` is the tail entry captured before the reopen; if the
    /// reopen pushed it off the stack it is put back ahead of the old top.
    pub fn rotate(&mut self, evicted: Option<RecentFile>) {
        let evicted = evicted.filter(|rf| !self.iter().any(|e| e.path.same_name_as(&rf.path)));
        let current = self.entries[0].take();
        self.entries.rotate_left(1);

        let mut pending = evicted.into_iter().chain(current);
        for entry in self.entries.iter_mut().filter(|e| e.is_none()) {
            match pending.next() {
                Some(rf) => *entry = Some(rf),
                None => break,
            }
        }
    }

    /// Entries in the order they are written out: oldest first
    pub fn persisted_order(&self) -> impl Iterator<Item = &RecentFile> {
        self.entries.iter().rev().flatten()
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
    }
}

impl Default for RecentFileStack {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}
