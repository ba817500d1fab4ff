//! Per-buffer identity and view state

use std::time::SystemTime;

#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

use crate::document::DocumentHandle;
use crate::path::FilePath;

/// How the document's bytes map to text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub enum EncodingMode {
    /// Single-byte code page
    #[default]
    EightBit,
    /// UTF-8 with a byte-order mark
    Utf8Bom,
    /// UTF-8 without a byte-order mark
    Utf8,
    /// UTF-8 declared by a coding cookie in the first lines
    Utf8Cookie,
}

impl EncodingMode {
    pub fn is_unicode(&self) -> bool {
        !matches!(self, EncodingMode::EightBit)
    }
}

/// Selection as a pair of document offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct SelectionRange {
    pub anchor: usize,
    pub caret: usize,
}

impl SelectionRange {
    pub const fn new(anchor: usize, caret: usize) -> Self {
        Self { anchor, caret }
    }

    /// Empty selection with the caret at `position`
    pub const fn caret_at(position: usize) -> Self {
        Self {
            anchor: position,
            caret: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.caret
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.caret)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.caret)
    }
}

/// One open buffer
///
/// The document handle is created lazily and survives `reset`: a slot that
/// is closed keeps its document for reuse, and handles are only given back
/// when the pool is torn down.
#[derive(Debug, Default)]
pub struct Slot {
    pub path: FilePath,
    pub(crate) document: Option<DocumentHandle>,
    pub dirty: bool,
    pub encoding: EncodingMode,
    pub mod_time: Option<SystemTime>,
    pub selection: SelectionRange,
    pub scroll_line: usize,
    pub fixed_font: bool,
    pub extension_override: Option<String>,
}

impl Slot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_document(document: DocumentHandle) -> Self {
        Self {
            document: Some(document),
            ..Self::default()
        }
    }

    /// Returns the slot to the untitled, clean state, keeping its document
    pub fn reset(&mut self) {
        let document = self.document.take();
        *self = Self {
            document,
            ..Self::default()
        };
    }

    pub fn document(&self) -> Option<&DocumentHandle> {
        self.document.as_ref()
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn is_untitled(&self) -> bool {
        self.path.is_untitled()
    }

    /// Untitled, clean and never edited
    pub fn is_pristine(&self) -> bool {
        self.is_untitled() && !self.dirty
    }

    /// Extension used to pick per-language properties
    pub fn effective_extension(&self) -> Option<&str> {
        match &self.extension_override {
            Some(ext) => Some(ext.as_str()),
            None => self.path.extension(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_slot_is_pristine() {
        let slot = Slot::new();
        assert!(slot.is_pristine());
        assert!(!slot.has_document());
        assert_eq!(slot.encoding, EncodingMode::EightBit);
    }

    #[test]
    fn test_reset_keeps_document() {
        let mut slot = Slot::with_document(DocumentHandle::from_raw(3));
        slot.path = FilePath::new("/a/b.txt");
        slot.dirty = true;
        slot.selection = SelectionRange::new(4, 9);
        slot.scroll_line = 12;
        slot.encoding = EncodingMode::Utf8Bom;

        slot.reset();

        assert!(slot.is_pristine());
        assert_eq!(slot.selection, SelectionRange::default());
        assert_eq!(slot.scroll_line, 0);
        assert_eq!(slot.encoding, EncodingMode::EightBit);
        assert_eq!(slot.document(), Some(&DocumentHandle::from_raw(3)));
    }

    #[test]
    fn test_selection_bounds() {
        let sel = SelectionRange::new(10, 4);
        assert_eq!(sel.start(), 4);
        assert_eq!(sel.end(), 10);
        assert!(!sel.is_empty());
        assert!(SelectionRange::caret_at(5).is_empty());
    }

    #[test]
    fn test_extension_override() {
        let mut slot = Slot::new();
        slot.path = FilePath::new("/x/build.txt");
        assert_eq!(slot.effective_extension(), Some("txt"));
        slot.extension_override = Some("cmake".to_string());
        assert_eq!(slot.effective_extension(), Some("cmake"));
    }

    #[test]
    fn test_unicode_modes() {
        assert!(!EncodingMode::EightBit.is_unicode());
        assert!(EncodingMode::Utf8.is_unicode());
        assert!(EncodingMode::Utf8Cookie.is_unicode());
    }
}
