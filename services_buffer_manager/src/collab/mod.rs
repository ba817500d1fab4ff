//! Collaborator traits for the buffer manager
//!
//! The manager never talks to an editing surface, a dialog or a tab strip
//! directly. Everything outside the pool goes through one of these traits so
//! the same orchestration runs under a real editor or the in-memory fakes.
//!
//! ## Philosophy
//!
//! - **Explicit, not implicit**: Every engine call is a trait method
//! - **Minimal surface**: Only what open/close/switch/save need
//! - **Deterministic**: Fakes are scripted and replayable

pub mod fake;

pub use fake::{MemoryEngine, ObserverEvent, RecordingObserver, ScriptedPrompt};

use buffer_core::{DocumentHandle, EncodingMode, FilePath, RecentFile, SelectionRange};

use crate::BufferListEntry;

/// Text-editing engine holding the documents
///
/// The engine shows one bound document at a time; view-state and text calls
/// act on that document.
pub trait DocumentEngine {
    /// The document the engine was created with
    ///
    /// Asked for exactly once, when the pool is allocated.
    fn default_document(&mut self) -> DocumentHandle;

    /// Creates a fresh empty document
    fn create_document(&mut self) -> DocumentHandle;

    /// Gives a document back to the engine
    fn release_document(&mut self, document: DocumentHandle);

    /// Makes `document` the one shown and edited
    fn bind_document(&mut self, document: &DocumentHandle);

    fn selection(&self) -> SelectionRange;

    fn set_selection(&mut self, selection: SelectionRange);

    /// First visible line
    fn scroll_anchor(&self) -> usize;

    fn set_scroll_anchor(&mut self, line: usize);

    fn is_read_only(&self) -> bool;

    fn set_read_only(&mut self, read_only: bool);

    /// Empties the bound document, dropping its undo history
    fn clear_document(&mut self);

    fn text(&self) -> String;

    /// Replaces the bound document's text, dropping its undo history
    fn set_text(&mut self, text: &str);

    /// Marks the bound document as unmodified
    fn set_save_point(&mut self);
}

/// Converts file bytes to and from editor text
pub trait TextCodec {
    fn decode(&self, bytes: &[u8]) -> (String, EncodingMode);

    fn encode(&self, text: &str, encoding: EncodingMode) -> Vec<u8>;
}

/// UTF-8 byte-order mark
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Codec that only recognizes a UTF-8 byte-order mark
///
/// Anything without a mark is treated as 8-bit text and decoded lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl TextCodec for Utf8Codec {
    fn decode(&self, bytes: &[u8]) -> (String, EncodingMode) {
        match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => (String::from_utf8_lossy(rest).into_owned(), EncodingMode::Utf8Bom),
            None => (String::from_utf8_lossy(bytes).into_owned(), EncodingMode::EightBit),
        }
    }

    fn encode(&self, text: &str, encoding: EncodingMode) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(text.len() + UTF8_BOM.len());
        // Cookie-declared files are written without a mark
        if encoding == EncodingMode::Utf8Bom {
            bytes.extend_from_slice(UTF8_BOM);
        }
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }
}

/// Answer to a save question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Yes,
    No,
    Cancel,
}

/// User-facing questions
pub trait SavePrompt {
    /// "Save changes to `path`?" (the path is untitled for new buffers)
    fn ask_save(&mut self, path: &FilePath) -> PromptChoice;

    /// "The file was modified outside; reload it?"
    fn ask_reload(&mut self, path: &FilePath) -> bool;

    /// Asks for a file name to save an untitled buffer under
    fn choose_save_path(&mut self, current: &FilePath) -> Option<FilePath>;
}

/// Prompt used when none is installed: never discards and never overwrites
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelPrompt;

impl SavePrompt for CancelPrompt {
    fn ask_save(&mut self, _path: &FilePath) -> PromptChoice {
        PromptChoice::Cancel
    }

    fn ask_reload(&mut self, _path: &FilePath) -> bool {
        false
    }

    fn choose_save_path(&mut self, _current: &FilePath) -> Option<FilePath> {
        None
    }
}

/// Receives buffer list updates (tab strip, buffers menu)
pub trait BufferObserver {
    fn on_buffer_list_changed(&mut self, entries: &[BufferListEntry]);

    fn on_buffer_activated(&mut self, index: usize);

    fn on_recent_changed(&mut self, _recent: &[RecentFile]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_detects_bom() {
        let codec = Utf8Codec;
        let (text, mode) = codec.decode(b"\xEF\xBB\xBFhello");
        assert_eq!(text, "hello");
        assert_eq!(mode, EncodingMode::Utf8Bom);
        assert_eq!(codec.encode(&text, mode), b"\xEF\xBB\xBFhello".to_vec());
    }

    #[test]
    fn test_codec_plain_bytes_are_eight_bit() {
        let codec = Utf8Codec;
        let (text, mode) = codec.decode(b"plain");
        assert_eq!(text, "plain");
        assert_eq!(mode, EncodingMode::EightBit);
    }

    #[test]
    fn test_codec_cookie_written_without_bom() {
        let codec = Utf8Codec;
        assert_eq!(codec.encode("x", EncodingMode::Utf8Cookie), b"x".to_vec());
        assert_eq!(codec.encode("x", EncodingMode::Utf8), b"x".to_vec());
    }

    #[test]
    fn test_cancel_prompt_never_agrees() {
        let mut prompt = CancelPrompt;
        let path = FilePath::new("/a.txt");
        assert_eq!(prompt.ask_save(&path), PromptChoice::Cancel);
        assert!(!prompt.ask_reload(&path));
        assert!(prompt.choose_save_path(&path).is_none());
    }
}
