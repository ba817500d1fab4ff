//! In-memory collaborators
//!
//! Used by the tests and by the `bufferd` host. The engine keeps every
//! document in a map; the prompt answers from queues; the observer records
//! what it was told. Prompt and observer are cheap handles over shared state
//! so a test can keep a clone after handing one to the manager.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use buffer_core::{DocumentHandle, FilePath, RecentFile, SelectionRange};

use super::{BufferObserver, DocumentEngine, PromptChoice, SavePrompt};
use crate::BufferListEntry;

/// Raw id of the engine's initial document
pub const DEFAULT_DOCUMENT_ID: u64 = 0;

/// One document held by [`MemoryEngine`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    pub text: String,
    pub selection: SelectionRange,
    pub scroll_line: usize,
    pub read_only: bool,
    saved_text: String,
}

impl MemoryDocument {
    /// Text differs from what it was at the last save point
    pub fn is_modified(&self) -> bool {
        self.text != self.saved_text
    }

    fn clamp_selection(&mut self) {
        let len = self.text.len();
        self.selection = SelectionRange::new(
            self.selection.anchor.min(len),
            self.selection.caret.min(len),
        );
    }
}

/// Document engine backed by a map of strings
#[derive(Debug)]
pub struct MemoryEngine {
    documents: BTreeMap<u64, MemoryDocument>,
    next_id: u64,
    bound: Option<u64>,
    released: Vec<u64>,
}

impl MemoryEngine {
    /// Creates an engine holding only its default document, bound
    pub fn new() -> Self {
        let mut documents = BTreeMap::new();
        documents.insert(DEFAULT_DOCUMENT_ID, MemoryDocument::default());
        Self {
            documents,
            next_id: DEFAULT_DOCUMENT_ID + 1,
            bound: Some(DEFAULT_DOCUMENT_ID),
            released: Vec::new(),
        }
    }

    /// Raw id of the bound document
    pub fn bound(&self) -> Option<u64> {
        self.bound
    }

    pub fn document(&self, raw: u64) -> Option<&MemoryDocument> {
        self.documents.get(&raw)
    }

    pub fn bound_document(&self) -> Option<&MemoryDocument> {
        self.bound.and_then(|raw| self.documents.get(&raw))
    }

    /// Documents created and not yet released
    pub fn live_documents(&self) -> usize {
        self.documents.len()
    }

    /// Raw ids passed to `release_document`, in call order
    pub fn released(&self) -> &[u64] {
        &self.released
    }

    fn bound_mut(&mut self) -> Option<&mut MemoryDocument> {
        match self.bound {
            Some(raw) => self.documents.get_mut(&raw),
            None => None,
        }
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentEngine for MemoryEngine {
    fn default_document(&mut self) -> DocumentHandle {
        DocumentHandle::from_raw(DEFAULT_DOCUMENT_ID)
    }

    fn create_document(&mut self) -> DocumentHandle {
        let raw = self.next_id;
        self.next_id += 1;
        self.documents.insert(raw, MemoryDocument::default());
        DocumentHandle::from_raw(raw)
    }

    fn release_document(&mut self, document: DocumentHandle) {
        let raw = document.raw();
        self.documents.remove(&raw);
        self.released.push(raw);
        if self.bound == Some(raw) {
            self.bound = None;
        }
    }

    fn bind_document(&mut self, document: &DocumentHandle) {
        debug_assert!(
            self.documents.contains_key(&document.raw()),
            "binding unknown document {}",
            document
        );
        self.bound = Some(document.raw());
    }

    fn selection(&self) -> SelectionRange {
        self.bound_document().map(|d| d.selection).unwrap_or_default()
    }

    fn set_selection(&mut self, selection: SelectionRange) {
        if let Some(doc) = self.bound_mut() {
            doc.selection = selection;
            doc.clamp_selection();
        }
    }

    fn scroll_anchor(&self) -> usize {
        self.bound_document().map(|d| d.scroll_line).unwrap_or(0)
    }

    fn set_scroll_anchor(&mut self, line: usize) {
        if let Some(doc) = self.bound_mut() {
            doc.scroll_line = line;
        }
    }

    fn is_read_only(&self) -> bool {
        self.bound_document().map(|d| d.read_only).unwrap_or(false)
    }

    fn set_read_only(&mut self, read_only: bool) {
        if let Some(doc) = self.bound_mut() {
            doc.read_only = read_only;
        }
    }

    fn clear_document(&mut self) {
        if let Some(doc) = self.bound_mut() {
            doc.text.clear();
            doc.saved_text.clear();
            doc.selection = SelectionRange::default();
            doc.scroll_line = 0;
        }
    }

    fn text(&self) -> String {
        self.bound_document().map(|d| d.text.clone()).unwrap_or_default()
    }

    fn set_text(&mut self, text: &str) {
        if let Some(doc) = self.bound_mut() {
            doc.text = text.to_string();
            doc.clamp_selection();
        }
    }

    fn set_save_point(&mut self) {
        if let Some(doc) = self.bound_mut() {
            doc.saved_text = doc.text.clone();
        }
    }
}

/// A question the manager asked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptRequest {
    Save(FilePath),
    Reload(FilePath),
    SavePath(FilePath),
}

#[derive(Debug, Default)]
struct PromptState {
    save_answers: VecDeque<PromptChoice>,
    reload_answers: VecDeque<bool>,
    save_paths: VecDeque<FilePath>,
    fallback: Option<PromptChoice>,
    requests: Vec<PromptRequest>,
}

/// Prompt answering from queued replies
///
/// Once a queue runs dry, save questions get the fallback answer
/// (`Cancel` unless set), reload questions get `false` and save-path
/// questions get `None`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    state: Rc<RefCell<PromptState>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompt that gives `choice` to every save question
    pub fn answering(choice: PromptChoice) -> Self {
        let prompt = Self::new();
        prompt.state.borrow_mut().fallback = Some(choice);
        prompt
    }

    pub fn queue_save(&self, choice: PromptChoice) {
        self.state.borrow_mut().save_answers.push_back(choice);
    }

    pub fn queue_reload(&self, answer: bool) {
        self.state.borrow_mut().reload_answers.push_back(answer);
    }

    pub fn queue_save_path(&self, path: impl Into<FilePath>) {
        self.state.borrow_mut().save_paths.push_back(path.into());
    }

    pub fn set_fallback(&self, choice: PromptChoice) {
        self.state.borrow_mut().fallback = Some(choice);
    }

    /// Every question asked so far
    pub fn requests(&self) -> Vec<PromptRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn save_questions(&self) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|r| matches!(r, PromptRequest::Save(_)))
            .count()
    }
}

impl SavePrompt for ScriptedPrompt {
    fn ask_save(&mut self, path: &FilePath) -> PromptChoice {
        let mut state = self.state.borrow_mut();
        state.requests.push(PromptRequest::Save(path.clone()));
        let fallback = state.fallback.unwrap_or(PromptChoice::Cancel);
        state.save_answers.pop_front().unwrap_or(fallback)
    }

    fn ask_reload(&mut self, path: &FilePath) -> bool {
        let mut state = self.state.borrow_mut();
        state.requests.push(PromptRequest::Reload(path.clone()));
        state.reload_answers.pop_front().unwrap_or(false)
    }

    fn choose_save_path(&mut self, current: &FilePath) -> Option<FilePath> {
        let mut state = self.state.borrow_mut();
        state.requests.push(PromptRequest::SavePath(current.clone()));
        state.save_paths.pop_front()
    }
}

/// A notification the manager sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    ListChanged(Vec<BufferListEntry>),
    Activated(usize),
    RecentChanged(Vec<FilePath>),
}

/// Observer that records every notification
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<ObserverEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.borrow().clone()
    }

    /// Most recent buffer list pushed
    pub fn last_list(&self) -> Option<Vec<BufferListEntry>> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            ObserverEvent::ListChanged(entries) => Some(entries.clone()),
            _ => None,
        })
    }

    /// Most recent recent-files menu pushed
    pub fn last_recent(&self) -> Option<Vec<FilePath>> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            ObserverEvent::RecentChanged(paths) => Some(paths.clone()),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl BufferObserver for RecordingObserver {
    fn on_buffer_list_changed(&mut self, entries: &[BufferListEntry]) {
        self.events
            .borrow_mut()
            .push(ObserverEvent::ListChanged(entries.to_vec()));
    }

    fn on_buffer_activated(&mut self, index: usize) {
        self.events.borrow_mut().push(ObserverEvent::Activated(index));
    }

    fn on_recent_changed(&mut self, recent: &[RecentFile]) {
        self.events.borrow_mut().push(ObserverEvent::RecentChanged(
            recent.iter().map(|rf| rf.path.clone()).collect(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_starts_with_default_bound() {
        let mut engine = MemoryEngine::new();
        let doc = engine.default_document();
        assert_eq!(doc.raw(), DEFAULT_DOCUMENT_ID);
        assert_eq!(engine.bound(), Some(DEFAULT_DOCUMENT_ID));
        engine.release_document(doc);
        assert_eq!(engine.live_documents(), 0);
    }

    #[test]
    fn test_engine_documents_are_independent() {
        let mut engine = MemoryEngine::new();
        let a = engine.create_document();
        let b = engine.create_document();
        engine.bind_document(&a);
        engine.set_text("alpha");
        engine.bind_document(&b);
        assert_eq!(engine.text(), "");
        engine.bind_document(&a);
        assert_eq!(engine.text(), "alpha");
        engine.release_document(a);
        engine.release_document(b);
    }

    #[test]
    fn test_engine_save_point() {
        let mut engine = MemoryEngine::new();
        engine.set_text("x");
        assert!(engine.bound_document().unwrap().is_modified());
        engine.set_save_point();
        assert!(!engine.bound_document().unwrap().is_modified());
    }

    #[test]
    fn test_engine_clamps_selection() {
        let mut engine = MemoryEngine::new();
        engine.set_text("abc");
        engine.set_selection(SelectionRange::new(1, 50));
        assert_eq!(engine.selection(), SelectionRange::new(1, 3));
    }

    #[test]
    fn test_scripted_prompt_queues() {
        let prompt = ScriptedPrompt::answering(PromptChoice::No);
        prompt.queue_save(PromptChoice::Yes);
        let mut handle = prompt.clone();
        let path = FilePath::new("/a");
        assert_eq!(handle.ask_save(&path), PromptChoice::Yes);
        assert_eq!(handle.ask_save(&path), PromptChoice::No);
        assert!(!handle.ask_reload(&path));
        assert_eq!(prompt.save_questions(), 2);
        assert_eq!(prompt.requests().len(), 3);
    }

    #[test]
    fn test_recording_observer_shares_events() {
        let observer = RecordingObserver::new();
        let mut handle = observer.clone();
        handle.on_buffer_activated(2);
        assert_eq!(observer.events(), vec![ObserverEvent::Activated(2)]);
        observer.clear();
        assert!(observer.events().is_empty());
    }
}
