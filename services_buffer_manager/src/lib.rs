//! # Buffer Manager Service
//!
//! Orchestrates a fixed set of open files on top of `buffer_core`: opening,
//! closing, switching, saving, recent files and sessions.
//!
//! ## Philosophy
//!
//! - **Prompt before touching**: A cancelled question leaves every slot as
//!   it was
//! - **One source of truth**: The current path, name and extension are read
//!   from the current slot, never mirrored
//! - **Collaborators behind traits**: Engine, prompt, codec and observers
//!   are swappable, and fakes ship with the crate
//! - **Handles go back once**: Every document is released through the
//!   engine exactly once, at quit or on drop
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A text editor (editing is the engine's business)
//! - An encoding detector (the codec is opaque)
//! - A tab strip or menu (observers render those)

pub mod collab;
pub mod commands;
pub mod config;
mod files;
pub mod recent_store;
pub mod session;

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use buffer_core::{
    BufferPool, FilePath, PoolError, RecentFile, RecentFileStack, SelectionRange, Slot,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use collab::{
    BufferObserver, CancelPrompt, DocumentEngine, PromptChoice, SavePrompt, TextCodec, Utf8Codec,
};
pub use commands::{parse_command, BufferCommand, CommandResult};
pub use config::BufferSettings;
pub use recent_store::RecentStore;
pub use session::{SessionError, SessionLoad, SessionRecord, SessionStore};

/// Buffer manager errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManagerError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Empty or untitled file name")]
    EmptyPath,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("No recent file at position {0}")]
    NoRecentEntry(usize),

    #[error("Buffer is read-only")]
    ReadOnly,

    #[error("Could not open file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Could not save file '{path}': {reason}")]
    Save { path: String, reason: String },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Manager result
pub type ManagerResult<T> = Result<T, ManagerError>;

/// How [`BufferManager::open`] treats a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags {
    /// Re-read the file even when it is already open
    pub force_reload: bool,
    /// The caller already asked about the current buffer's changes
    pub no_save_if_dirty: bool,
}

impl OpenFlags {
    pub fn force_reload() -> Self {
        Self {
            force_reload: true,
            ..Self::default()
        }
    }
}

/// Result of opening a file or a new buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenOutcome {
    /// File read into the buffer at this index
    Opened(usize),
    /// Empty buffer: a new untitled one, or a name with no file behind it
    Created(usize),
    /// File was already open; its buffer became current
    Switched(usize),
    /// User cancelled while room was being made
    Cancelled,
}

impl OpenOutcome {
    pub fn index(&self) -> Option<usize> {
        match self {
            OpenOutcome::Opened(i) | OpenOutcome::Created(i) | OpenOutcome::Switched(i) => Some(*i),
            OpenOutcome::Cancelled => None,
        }
    }
}

/// Result of closing buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseOutcome {
    Closed,
    Cancelled,
    /// The last buffer was closed and settings ask for the host to quit
    QuitRequested,
}

/// Result of a save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveOutcome {
    Saved(FilePath),
    /// No file name was chosen for an untitled buffer
    Cancelled,
}

/// Result of [`BufferManager::quit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuitOutcome {
    /// State written, every document handed back to the engine
    Released,
    Cancelled,
}

/// Result of restoring a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Restored {
        opened: usize,
        malformed_line: Option<usize>,
    },
    Cancelled,
}

/// One row of the buffers menu / tab strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferListEntry {
    pub index: usize,
    pub title: String,
    pub path: FilePath,
    pub dirty: bool,
    pub current: bool,
}

impl BufferListEntry {
    fn new(index: usize, slot: &Slot, current: bool) -> Self {
        Self {
            index,
            title: slot.path.display_name(),
            path: slot.path.clone(),
            dirty: slot.dirty,
            current,
        }
    }
}

impl fmt::Display for BufferListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.current { '>' } else { ' ' };
        write!(f, "{} {} {}", marker, self.index + 1, self.title)?;
        if self.dirty {
            write!(f, " *")?;
        }
        Ok(())
    }
}

/// The buffer manager
///
/// Owns the pool, the recent-files stack and the engine. All operations are
/// synchronous and run on the caller's thread.
pub struct BufferManager<E: DocumentEngine> {
    engine: E,
    pool: BufferPool,
    recent: RecentFileStack,
    settings: BufferSettings,
    prompt: Box<dyn SavePrompt>,
    codec: Box<dyn TextCodec>,
    observers: Vec<Box<dyn BufferObserver>>,
    /// Modification time already asked about while the buffer was dirty
    mod_time_asked: Option<SystemTime>,
    released: bool,
}

impl<E: DocumentEngine> BufferManager<E> {
    /// Creates a manager and allocates its pool
    ///
    /// Slot 0 takes the engine's default document. Until a prompt is
    /// installed every save question is answered with Cancel.
    pub fn new(mut engine: E, settings: BufferSettings) -> ManagerResult<Self> {
        let mut pool = BufferPool::new();
        pool.allocate(settings.capacity(), || engine.default_document())?;
        let recent = RecentFileStack::new(settings.recent_capacity);
        tracing::info!(
            capacity = pool.capacity(),
            zorder = settings.zorder_switching,
            "buffer manager ready"
        );

        Ok(Self {
            engine,
            pool,
            recent,
            settings,
            prompt: Box::new(CancelPrompt),
            codec: Box::new(Utf8Codec),
            observers: Vec::new(),
            mod_time_asked: None,
            released: false,
        })
    }

    pub fn with_prompt(mut self, prompt: Box<dyn SavePrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_codec(mut self, codec: Box<dyn TextCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn BufferObserver>) {
        self.observers.push(observer);
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn recent(&self) -> &RecentFileStack {
        &self.recent
    }

    pub fn settings(&self) -> &BufferSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.pool.current()
    }

    pub fn current_slot(&self) -> &Slot {
        self.pool.current_slot()
    }

    pub fn current_path(&self) -> &FilePath {
        &self.pool.current_slot().path
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Records the engine's modified state for the current buffer
    ///
    /// The host calls this when the engine leaves or reaches its save point.
    pub fn set_current_dirty(&mut self, dirty: bool) {
        let slot = self.pool.current_slot_mut();
        if slot.dirty != dirty {
            slot.dirty = dirty;
            self.notify_list_changed();
        }
    }

    /// Appends text to the current buffer and marks it dirty
    pub fn append_text(&mut self, text: &str) -> ManagerResult<()> {
        if self.engine.is_read_only() {
            return Err(ManagerError::ReadOnly);
        }
        let mut content = self.engine.text();
        content.push_str(text);
        self.engine.set_text(&content);
        self.engine.set_selection(SelectionRange::caret_at(content.len()));
        self.set_current_dirty(true);
        Ok(())
    }

    /// Rows for the buffers menu, in slot order
    pub fn buffer_list(&self) -> Vec<BufferListEntry> {
        let current = self.pool.current();
        self.pool
            .slots()
            .iter()
            .enumerate()
            .map(|(index, slot)| BufferListEntry::new(index, slot, index == current))
            .collect()
    }

    /// Startup: recent list, then either the given files or the last session
    pub fn start<P: AsRef<Path>>(&mut self, files: &[P]) -> ManagerResult<()> {
        if self.settings.save_recent {
            if let Err(err) = self.load_recent() {
                tracing::debug!(error = %err, "no recent list loaded");
            }
        }

        if files.is_empty() {
            if self.pool.capacity() > 1 && self.settings.save_session {
                match self.load_session(None) {
                    Ok(outcome) => tracing::info!(?outcome, "startup session"),
                    Err(err) => tracing::debug!(error = %err, "no session restored"),
                }
            }
            return Ok(());
        }

        for file in files {
            self.open(file, OpenFlags::default())?;
        }
        Ok(())
    }

    /// Opens `path`, or switches to it if it is already open
    ///
    /// A name with no file behind it opens as an empty buffer carrying that
    /// name. When no slot is free the current buffer is offered for saving
    /// and then reused; its identity goes onto the recent stack. With
    /// `force_reload` an already open file is re-read in its own slot.
    pub fn open(&mut self, path: impl AsRef<Path>, flags: OpenFlags) -> ManagerResult<OpenOutcome> {
        let path = FilePath::absolute(path);
        if path.is_untitled() {
            return Err(ManagerError::EmptyPath);
        }
        self.end_cycling();

        let existing = self.pool.index_of(&path);
        if let Some(index) = existing {
            self.switch_to(index)?;
            if !flags.force_reload {
                return Ok(OpenOutcome::Switched(index));
            }
        }

        let contents = files::read_file(&path)?;
        if existing.is_none() {
            if !self.can_make_room(!flags.no_save_if_dirty) {
                tracing::info!(path = %path, "open cancelled");
                return Ok(OpenOutcome::Cancelled);
            }
            if self.pool.has_room() {
                self.new_buffer()?;
            } else {
                self.recycle_current();
            }
        }

        let index = self.pool.current();
        let slot = self.pool.current_slot_mut();
        slot.path = path.clone();
        slot.extension_override = None;

        let created = contents.is_none();
        self.load_into_current(contents);
        self.recent.remove(&path);
        tracing::info!(path = %path, index, created, "file opened");
        self.notify_all();

        Ok(if created {
            OpenOutcome::Created(index)
        } else {
            OpenOutcome::Opened(index)
        })
    }

    /// Starts an untitled buffer
    pub fn new_document(&mut self) -> ManagerResult<OpenOutcome> {
        self.end_cycling();
        if !self.can_make_room(true) {
            return Ok(OpenOutcome::Cancelled);
        }
        let index = self.new_buffer()?;
        tracing::debug!(index, "new buffer");
        self.notify_all();
        Ok(OpenOutcome::Created(index))
    }

    /// Closes the current buffer after offering to save it
    pub fn close(&mut self) -> CloseOutcome {
        self.end_cycling();
        if self.save_if_unsure(false) == PromptChoice::Cancel {
            return CloseOutcome::Cancelled;
        }
        self.close_current(false)
    }

    /// Closes every buffer; cancelling any save question keeps them all
    pub fn close_all(&mut self) -> CloseOutcome {
        self.end_cycling();
        self.close_all_buffers(false)
    }

    /// Makes the buffer at `index` current
    pub fn switch_to(&mut self, index: usize) -> ManagerResult<()> {
        let changed = index != self.pool.current();
        self.set_document_at(index)?;
        if changed {
            tracing::debug!(index, cycling = self.pool.is_cycling(), "buffer switched");
            self.notify_activated();
            self.notify_list_changed();
        }
        if let Err(err) = self.check_reload() {
            tracing::warn!(error = %err, "reload on switch failed");
        }
        Ok(())
    }

    /// Next buffer in slot order, wrapping around
    pub fn next(&mut self) -> ManagerResult<()> {
        let next = (self.pool.current() + 1) % self.pool.len();
        self.switch_to(next)
    }

    /// Previous buffer in slot order, wrapping around
    pub fn prev(&mut self) -> ManagerResult<()> {
        let len = self.pool.len();
        let prev = (self.pool.current() + len - 1) % len;
        self.switch_to(prev)
    }

    /// Steps to the next buffer in MRU order, inside a cycling session
    ///
    /// Falls back to [`next`](Self::next) when Z-order switching is off.
    pub fn next_zorder(&mut self) -> ManagerResult<()> {
        if !self.settings.zorder_switching {
            return self.next();
        }
        self.pool.begin_cycling();
        let next = self.pool.next_in_order();
        self.switch_to(next)
    }

    /// Steps to the previous buffer in MRU order, inside a cycling session
    pub fn prev_zorder(&mut self) -> ManagerResult<()> {
        if !self.settings.zorder_switching {
            return self.prev();
        }
        self.pool.begin_cycling();
        let prev = self.pool.prev_in_order();
        self.switch_to(prev)
    }

    /// Ends a cycling session, promoting the buffer it landed on
    pub fn end_cycling(&mut self) {
        if self.pool.is_cycling() {
            self.pool.end_cycling();
            tracing::debug!(current = self.pool.current(), "cycling committed");
        }
    }

    /// Writes state and hands every document back to the engine
    ///
    /// Dirty buffers are offered for saving first; a Cancel keeps everything
    /// open. Quitting twice is a no-op.
    pub fn quit(&mut self) -> QuitOutcome {
        if self.released {
            return QuitOutcome::Released;
        }
        self.end_cycling();
        if self.save_all(false, false) == PromptChoice::Cancel {
            return QuitOutcome::Cancelled;
        }
        self.snapshot_current();

        if self.settings.save_recent {
            // Slot 0 is pushed last so it comes back as the most recent file.
            for slot in self.pool.slots().iter().rev() {
                self.recent.push(&slot.path, slot.selection, slot.scroll_line);
            }
            if let Err(err) = self.save_recent() {
                tracing::warn!(error = %err, "recent list not written");
            }
        }
        if self.settings.save_session && self.pool.capacity() > 1 {
            if let Err(err) = self.save_session(None) {
                tracing::warn!(error = %err, "session not written");
            }
        }

        self.release_documents();
        tracing::info!("buffer manager released");
        QuitOutcome::Released
    }

    /// Writes the open titled buffers to a session file
    ///
    /// `None` writes the default session in the state directory.
    pub fn save_session(&mut self, path: Option<&Path>) -> ManagerResult<usize> {
        self.snapshot_current();
        let current = self.pool.current();
        let records: Vec<SessionRecord> = self
            .pool
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_untitled())
            .map(|(index, slot)| {
                SessionRecord::new(slot.path.clone(), slot.selection.caret, index == current)
            })
            .collect();

        let store = self.session_store(path);
        store.save(&records)?;
        tracing::info!(path = %store.path().display(), buffers = records.len(), "session saved");
        Ok(records.len())
    }

    /// Replaces the open buffers with a saved session
    ///
    /// Every buffer is closed first (a Cancel aborts). Files that no longer
    /// exist are skipped. Loading stops at a malformed record and keeps what
    /// was opened before it.
    pub fn load_session(&mut self, path: Option<&Path>) -> ManagerResult<SessionOutcome> {
        let store = self.session_store(path);
        let load = store.load(self.pool.capacity())?;

        self.end_cycling();
        if self.close_all_buffers(true) == CloseOutcome::Cancelled {
            return Ok(SessionOutcome::Cancelled);
        }

        let mut current = None;
        let mut opened = 0;
        for record in &load.records {
            if !record.path.as_path().is_file() {
                tracing::debug!(path = %record.path, "session file missing, skipped");
                continue;
            }
            let already_open = self.pool.index_of(FilePath::absolute(&record.path)).is_some();
            match self.open(&record.path, OpenFlags::force_reload()) {
                Ok(OpenOutcome::Cancelled) => continue,
                Ok(_) => {
                    if !already_open {
                        opened += 1;
                    }
                    self.engine.set_selection(SelectionRange::caret_at(record.position));
                    self.pool.current_slot_mut().selection = self.engine.selection();
                    if record.is_current {
                        current = Some(self.pool.current());
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %record.path, error = %err, "session file not opened")
                }
            }
        }
        if let Some(index) = current {
            self.switch_to(index)?;
        }

        tracing::info!(path = %store.path().display(), opened, "session restored");
        Ok(SessionOutcome::Restored {
            opened,
            malformed_line: load.malformed_line,
        })
    }

    /// Reads the recent list from the state directory
    pub fn load_recent(&mut self) -> ManagerResult<usize> {
        let store = RecentStore::new(self.settings.recent_path());
        let count = store
            .load_into(&mut self.recent)
            .map_err(|e| ManagerError::Read {
                path: store.path().display().to_string(),
                reason: e.to_string(),
            })?;
        self.notify_recent_changed();
        Ok(count)
    }

    /// Writes the recent list to the state directory
    pub fn save_recent(&self) -> ManagerResult<()> {
        let store = RecentStore::new(self.settings.recent_path());
        store.save(&self.recent).map_err(|e| ManagerError::Save {
            path: store.path().display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Reopens the recent file at `pos`, restoring its cursor
    ///
    /// With an empty stack, position 0 starts a new buffer instead.
    pub fn open_recent(&mut self, pos: usize) -> ManagerResult<OpenOutcome> {
        let entry = self.recent.get(pos).cloned();
        if entry.is_none() && pos != 0 {
            return Err(ManagerError::NoRecentEntry(pos));
        }
        self.end_cycling();
        if !self.can_make_room(true) {
            return Ok(OpenOutcome::Cancelled);
        }

        match entry {
            None => {
                let index = self.new_buffer()?;
                self.notify_all();
                Ok(OpenOutcome::Created(index))
            }
            Some(rf) => {
                let flags = OpenFlags {
                    no_save_if_dirty: true,
                    ..OpenFlags::default()
                };
                let outcome = self.open(&rf.path, flags)?;
                if outcome != OpenOutcome::Cancelled {
                    self.display_around(&rf);
                }
                Ok(outcome)
            }
        }
    }

    /// Reopens the oldest recent file
    pub fn recent_next(&mut self) -> ManagerResult<Option<OpenOutcome>> {
        match self.recent.oldest_position() {
            Some(pos) => self.open_recent(pos).map(Some),
            None => Ok(None),
        }
    }

    /// Reopens the most recent file and rotates the stack
    ///
    /// Repeating it walks back through the recent files.
    pub fn recent_prev(&mut self) -> ManagerResult<Option<OpenOutcome>> {
        if self.recent.is_empty() {
            return Ok(None);
        }
        let evicted = self.recent.tail().cloned();
        let outcome = self.open_recent(0)?;
        self.recent.rotate(evicted);
        self.notify_recent_changed();
        Ok(Some(outcome))
    }

    /// Forgets the most recent file
    pub fn drop_recent_top(&mut self) -> Option<RecentFile> {
        let top = self.recent.drop_top();
        self.notify_recent_changed();
        top
    }

    fn session_store(&self, path: Option<&Path>) -> SessionStore {
        match path {
            Some(path) => SessionStore::new(path),
            None => SessionStore::new(self.settings.default_session_path()),
        }
    }

    /// Copies the engine's view state into the current slot
    fn snapshot_current(&mut self) {
        let selection = self.engine.selection();
        let scroll_line = self.engine.scroll_anchor();
        let slot = self.pool.current_slot_mut();
        slot.selection = selection;
        slot.scroll_line = scroll_line;
    }

    /// Shows the current slot's document, creating it on first use
    fn bind_current(&mut self) {
        let index = self.pool.current();
        let engine = &mut self.engine;
        match self.pool.ensure_document(index, || engine.create_document()) {
            Ok(document) => engine.bind_document(document),
            Err(err) => tracing::error!(index, error = %err, "current slot has no document"),
        }
    }

    fn restore_current(&mut self) {
        let slot = self.pool.current_slot();
        let (selection, scroll_line) = (slot.selection, slot.scroll_line);
        self.engine.set_selection(selection);
        self.engine.set_scroll_anchor(scroll_line);
    }

    fn display_around(&mut self, rf: &RecentFile) {
        self.engine.set_selection(rf.selection);
        self.engine.set_scroll_anchor(rf.scroll_line);
        self.snapshot_current();
    }

    /// Switches without notifications or reload checks
    fn set_document_at(&mut self, index: usize) -> ManagerResult<()> {
        if index >= self.pool.len() {
            return Err(PoolError::IndexOutOfRange {
                index,
                len: self.pool.len(),
            }
            .into());
        }
        if index == self.pool.current() {
            return Ok(());
        }
        self.snapshot_current();
        self.pool.set_current(index)?;
        self.bind_current();
        self.restore_current();
        Ok(())
    }

    /// Pushes the current buffer onto the recent stack and empties its slot
    fn recycle_current(&mut self) {
        self.snapshot_current();
        let slot = self.pool.current_slot();
        self.recent.push(&slot.path, slot.selection, slot.scroll_line);
        self.pool.current_slot_mut().reset();
        self.engine.set_read_only(false);
        self.engine.clear_document();
    }

    /// Makes an untitled, clean buffer current
    ///
    /// The initial untouched buffer is reused; otherwise a slot is added, or
    /// the current one recycled when the pool is full.
    fn new_buffer(&mut self) -> ManagerResult<usize> {
        self.snapshot_current();
        let reuse_initial = self.pool.len() == 1 && self.pool.current_slot().is_pristine();
        if !reuse_initial {
            if self.pool.has_room() {
                let index = self.pool.add();
                self.set_document_at(index)?;
            } else {
                self.recycle_current();
            }
        }

        self.bind_current();
        self.pool.current_slot_mut().reset();
        self.engine.set_read_only(false);
        self.engine.clear_document();
        Ok(self.pool.current())
    }

    /// Closes the current buffer without asking
    fn close_current(&mut self, loading_session: bool) -> CloseOutcome {
        let closing_last;
        if self.pool.capacity() == 1 {
            // Single-slot: the slot is emptied in place, nothing else moves.
            closing_last = true;
            self.pool.remove_current(false);
            self.engine.set_read_only(false);
            self.engine.clear_document();
        } else {
            self.snapshot_current();
            let slot = self.pool.current_slot();
            let closed = slot.path.clone();
            self.recent.push(&slot.path, slot.selection, slot.scroll_line);

            closing_last = self.pool.len() == 1;
            self.pool.remove_current(self.settings.zorder_switching);
            self.bind_current();
            if closing_last {
                self.engine.set_read_only(false);
                self.engine.clear_document();
            }
            self.restore_current();
            tracing::info!(path = %closed, current = self.pool.current(), "buffer closed");
        }
        self.notify_all();

        if closing_last && self.settings.quit_on_close_last && !loading_session {
            CloseOutcome::QuitRequested
        } else {
            CloseOutcome::Closed
        }
    }

    fn close_all_buffers(&mut self, loading_session: bool) -> CloseOutcome {
        if self.save_all(false, false) == PromptChoice::Cancel {
            return CloseOutcome::Cancelled;
        }
        while self.pool.len() > 1 {
            self.close_current(loading_session);
        }
        self.close_current(loading_session)
    }

    fn release_documents(&mut self) {
        for document in self.pool.take_documents() {
            self.engine.release_document(document);
        }
        self.released = true;
    }

    fn notify_list_changed(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let entries = self.buffer_list();
        for observer in &mut self.observers {
            observer.on_buffer_list_changed(&entries);
        }
    }

    fn notify_activated(&mut self) {
        let index = self.pool.current();
        for observer in &mut self.observers {
            observer.on_buffer_activated(index);
        }
    }

    fn notify_recent_changed(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let recent: Vec<RecentFile> = self.recent.iter().cloned().collect();
        for observer in &mut self.observers {
            observer.on_recent_changed(&recent);
        }
    }

    fn notify_all(&mut self) {
        self.notify_list_changed();
        self.notify_activated();
        self.notify_recent_changed();
    }
}

impl<E: DocumentEngine> Drop for BufferManager<E> {
    fn drop(&mut self) {
        // Handles already given back by quit() are no longer in the pool.
        self.release_documents();
    }
}
