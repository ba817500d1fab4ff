//! File-facing operations: reading, saving, save questions and reloads

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use buffer_core::{EncodingMode, FilePath, SelectionRange};

use crate::collab::{DocumentEngine, PromptChoice};
use crate::{BufferManager, ManagerError, ManagerResult, SaveOutcome};

/// Bytes read from disk, with the time they were last modified
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileContents {
    pub bytes: Vec<u8>,
    pub mod_time: Option<SystemTime>,
}

/// Reads a whole file; a missing file is `None`
pub(crate) fn read_file(path: &FilePath) -> ManagerResult<Option<FileContents>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(FileContents {
            bytes,
            mod_time: modified_time(path.as_path()),
        })),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ManagerError::Read {
            path: path.to_string(),
            reason: err.to_string(),
        }),
    }
}

pub(crate) fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

impl<E: DocumentEngine> BufferManager<E> {
    /// Saves the current buffer
    ///
    /// An untitled buffer asks for a name first; no name means
    /// [`SaveOutcome::Cancelled`].
    pub fn save(&mut self) -> ManagerResult<SaveOutcome> {
        if self.pool.current_slot().is_untitled() {
            let current = self.pool.current_slot().path.clone();
            return match self.prompt.choose_save_path(&current) {
                Some(path) => self.save_as(path),
                None => Ok(SaveOutcome::Cancelled),
            };
        }
        self.write_current()
    }

    /// Saves the current buffer under a new name
    ///
    /// The buffer keeps its old name if the write fails.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> ManagerResult<SaveOutcome> {
        let path = FilePath::absolute(path);
        if path.is_untitled() {
            return Err(ManagerError::EmptyPath);
        }

        let previous = std::mem::replace(&mut self.pool.current_slot_mut().path, path.clone());
        match self.write_current() {
            Ok(outcome) => {
                self.recent.remove(&path);
                self.notify_recent_changed();
                Ok(outcome)
            }
            Err(err) => {
                self.pool.current_slot_mut().path = previous;
                Err(err)
            }
        }
    }

    /// Saves every dirty buffer
    ///
    /// With `always_yes` nothing is asked; otherwise each dirty buffer gets
    /// the usual question and the first Cancel stops the pass. The current
    /// buffer and the MRU order are the same afterwards.
    pub fn save_all(&mut self, force_question: bool, always_yes: bool) -> PromptChoice {
        let was_cycling = self.pool.is_cycling();
        if !was_cycling {
            self.pool.begin_cycling();
        }
        let original = self.pool.current();

        let mut choice = PromptChoice::Yes;
        for index in 0..self.pool.len() {
            if !self.pool.slots()[index].dirty {
                continue;
            }
            if let Err(err) = self.set_document_at(index) {
                tracing::error!(index, error = %err, "save all could not visit buffer");
                continue;
            }
            choice = if always_yes {
                self.save_succeeded()
            } else {
                self.save_if_unsure(force_question)
            };
            if choice == PromptChoice::Cancel {
                break;
            }
        }

        if let Err(err) = self.set_document_at(original) {
            tracing::error!(index = original, error = %err, "save all could not return");
        }
        if !was_cycling {
            self.pool.end_cycling();
        }
        self.notify_list_changed();
        choice
    }

    /// Silently writes every dirty buffer that has a name
    pub fn save_titled_buffers(&mut self) -> ManagerResult<usize> {
        let was_cycling = self.pool.is_cycling();
        if !was_cycling {
            self.pool.begin_cycling();
        }
        let original = self.pool.current();

        let mut saved = 0;
        let mut result = Ok(());
        for index in 0..self.pool.len() {
            let slot = &self.pool.slots()[index];
            if !slot.dirty || slot.is_untitled() {
                continue;
            }
            result = self
                .set_document_at(index)
                .and_then(|()| self.write_current().map(|_| ()));
            if result.is_err() {
                break;
            }
            saved += 1;
        }

        if let Err(err) = self.set_document_at(original) {
            tracing::error!(index = original, error = %err, "save could not return");
        }
        if !was_cycling {
            self.pool.end_cycling();
        }
        result.map(|()| saved)
    }

    /// The editor gained or lost focus
    pub fn activate(&mut self, active: bool) -> ManagerResult<()> {
        if active {
            self.check_reload()?;
        } else if self.settings.save_on_deactivate {
            let saved = self.save_titled_buffers()?;
            tracing::debug!(saved, "saved on deactivate");
        }
        Ok(())
    }

    /// Reloads the current file if it changed on disk
    ///
    /// Only with `load_on_activate`. A dirty buffer asks first, and only
    /// once per external modification.
    pub fn check_reload(&mut self) -> ManagerResult<bool> {
        if !self.settings.load_on_activate {
            return Ok(false);
        }
        let slot = self.pool.current_slot();
        if slot.is_untitled() {
            return Ok(false);
        }
        let Some(new_time) = modified_time(slot.path.as_path()) else {
            return Ok(false);
        };
        if slot.mod_time == Some(new_time) {
            return Ok(false);
        }

        if slot.dirty {
            if self.mod_time_asked == Some(new_time) {
                return Ok(false);
            }
            self.mod_time_asked = Some(new_time);
            let path = slot.path.clone();
            if !self.prompt.ask_reload(&path) {
                tracing::debug!(path = %path, "reload declined");
                return Ok(false);
            }
        }

        self.reload_current()?;
        Ok(true)
    }

    /// Discards changes, re-reading the current file
    pub fn revert(&mut self) -> ManagerResult<()> {
        if self.pool.current_slot().is_untitled() {
            return Err(ManagerError::EmptyPath);
        }
        self.reload_current()
    }

    /// Offers to save the current buffer
    ///
    /// Clean buffers and empty untitled ones are not asked about. Without
    /// `are_you_sure` a named buffer is saved silently.
    pub(crate) fn save_if_unsure(&mut self, force_question: bool) -> PromptChoice {
        let slot = self.pool.current_slot();
        if !slot.dirty {
            return PromptChoice::No;
        }
        let untitled = slot.is_untitled();
        if untitled && !force_question && self.engine.text().is_empty() {
            return PromptChoice::No;
        }

        if self.settings.are_you_sure || untitled || force_question {
            let path = slot.path.clone();
            match self.prompt.ask_save(&path) {
                PromptChoice::Yes => self.save_succeeded(),
                other => other,
            }
        } else {
            self.save_succeeded()
        }
    }

    /// Saves, mapping the outcome to a prompt answer
    fn save_succeeded(&mut self) -> PromptChoice {
        match self.save() {
            Ok(SaveOutcome::Saved(_)) => PromptChoice::Yes,
            Ok(SaveOutcome::Cancelled) => PromptChoice::Cancel,
            Err(err) => {
                tracing::error!(error = %err, "save failed");
                PromptChoice::Cancel
            }
        }
    }

    /// True once the current slot can be given to another file
    pub(crate) fn can_make_room(&mut self, may_save: bool) -> bool {
        if self.pool.has_room() || !may_save {
            return true;
        }
        self.save_if_unsure(true) != PromptChoice::Cancel
    }

    /// Loads file contents into the current slot, or empties it
    pub(crate) fn load_into_current(&mut self, contents: Option<FileContents>) {
        let (text, encoding, mod_time) = match contents {
            Some(contents) => {
                let (text, encoding) = self.codec.decode(&contents.bytes);
                (text, encoding, contents.mod_time)
            }
            None => (String::new(), EncodingMode::default(), None),
        };

        self.engine.set_read_only(false);
        self.engine.set_text(&text);
        self.engine.set_save_point();
        self.engine.set_selection(SelectionRange::default());
        self.engine.set_scroll_anchor(0);
        self.engine.set_read_only(self.settings.read_only);

        let slot = self.pool.current_slot_mut();
        slot.encoding = encoding;
        slot.mod_time = mod_time;
        slot.dirty = false;
        slot.selection = SelectionRange::default();
        slot.scroll_line = 0;
        self.mod_time_asked = mod_time;
    }

    /// Re-reads the current file, keeping the cursor where it was
    fn reload_current(&mut self) -> ManagerResult<()> {
        let path = self.pool.current_slot().path.clone();
        let contents = read_file(&path)?.ok_or_else(|| ManagerError::Read {
            path: path.to_string(),
            reason: "file no longer exists".to_string(),
        })?;

        let selection = self.engine.selection();
        let scroll_line = self.engine.scroll_anchor();
        self.load_into_current(Some(contents));
        self.engine.set_selection(selection);
        self.engine.set_scroll_anchor(scroll_line);
        self.snapshot_current();

        tracing::info!(path = %path, "file reloaded");
        self.notify_list_changed();
        Ok(())
    }

    fn write_current(&mut self) -> ManagerResult<SaveOutcome> {
        let slot = self.pool.current_slot();
        let path = slot.path.clone();
        let bytes = self.codec.encode(&self.engine.text(), slot.encoding);
        fs::write(&path, bytes).map_err(|err| ManagerError::Save {
            path: path.to_string(),
            reason: err.to_string(),
        })?;

        let mod_time = modified_time(path.as_path());
        self.engine.set_save_point();
        let slot = self.pool.current_slot_mut();
        slot.mod_time = mod_time;
        slot.dirty = false;
        self.mod_time_asked = mod_time;

        tracing::info!(path = %path, "file saved");
        self.notify_list_changed();
        Ok(SaveOutcome::Saved(path))
    }
}
