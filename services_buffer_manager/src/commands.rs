//! Command interface for the buffer manager
//!
//! One line of text per command, the way a menu or a script drives the
//! manager. This is NOT an editor command language: text editing is limited
//! to appending, enough to make buffers dirty.

use std::fmt;
use std::path::Path;

use buffer_core::FilePath;
use serde::{Deserialize, Serialize};

use crate::collab::{DocumentEngine, PromptChoice};
use crate::{
    BufferListEntry, BufferManager, CloseOutcome, ManagerError, ManagerResult, OpenFlags,
    OpenOutcome, QuitOutcome, SaveOutcome, SessionOutcome,
};

/// Buffer command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferCommand {
    /// Open a file, or switch to it
    Open { path: String },
    /// Start an untitled buffer
    New,
    Close,
    CloseAll,
    Save,
    SaveAs { path: String },
    /// Save every dirty buffer without asking
    SaveAll,
    Next,
    Prev,
    /// Step through the MRU order
    NextZOrder,
    PrevZOrder,
    /// Commit the buffer a Z-order walk landed on
    EndCycling,
    /// Switch by slot index (0-based)
    Switch { index: usize },
    List,
    /// Show the recent list, or reopen the entry at a 0-based position
    Recent { position: Option<usize> },
    RecentNext,
    RecentPrev,
    RecentDrop,
    SessionSave { path: Option<String> },
    SessionLoad { path: Option<String> },
    Revert,
    /// Append text to the current buffer
    Type { text: String },
    /// Editor gained focus
    Activate,
    /// Editor lost focus
    Deactivate,
    Quit,
}

/// Result of executing a buffer command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandResult {
    /// File read into a buffer
    Opened { index: usize, path: FilePath },
    /// Empty buffer made current
    Created { index: usize, path: FilePath },
    /// Current buffer changed
    Switched { index: usize },
    /// Buffer closed; `current` is the buffer shown now
    Closed { current: usize },
    Saved { path: FilePath },
    List { entries: Vec<BufferListEntry> },
    Recent { paths: Vec<FilePath> },
    /// Command succeeded with message
    Success { message: String },
    /// The user cancelled a question
    Cancelled,
    /// The last buffer was closed and the host should exit
    QuitRequested,
    /// Every document was handed back; the host should exit
    Released,
    /// Command failed with error
    Error { message: String },
}

fn label(path: &FilePath) -> String {
    if path.is_untitled() {
        path.display_name()
    } else {
        path.to_string()
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Opened { index, path } => {
                write!(f, "opened {} {}", index + 1, label(path))
            }
            CommandResult::Created { index, path } => {
                write!(f, "created {} {}", index + 1, label(path))
            }
            CommandResult::Switched { index } => write!(f, "switched {}", index + 1),
            CommandResult::Closed { current } => write!(f, "closed, current {}", current + 1),
            CommandResult::Saved { path } => write!(f, "saved {}", label(path)),
            CommandResult::List { entries } => {
                let lines: Vec<String> = entries.iter().map(ToString::to_string).collect();
                write!(f, "{}", lines.join("\n"))
            }
            CommandResult::Recent { paths } => {
                if paths.is_empty() {
                    return write!(f, "recent: (empty)");
                }
                let lines: Vec<String> = paths
                    .iter()
                    .enumerate()
                    .map(|(i, path)| format!("recent {} {}", i + 1, path))
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
            CommandResult::Success { message } => write!(f, "{}", message),
            CommandResult::Cancelled => write!(f, "cancelled"),
            CommandResult::QuitRequested => write!(f, "quit requested"),
            CommandResult::Released => write!(f, "released"),
            CommandResult::Error { message } => write!(f, "error: {}", message),
        }
    }
}

impl<E: DocumentEngine> BufferManager<E> {
    /// Executes a buffer command
    pub fn execute_command(&mut self, command: BufferCommand) -> CommandResult {
        tracing::debug!(command = %format_command(&command), "executing");
        let result = self.execute_command_inner(command);
        if let CommandResult::Error { message } = &result {
            tracing::warn!(error = %message, "command failed");
        }
        result
    }

    fn execute_command_inner(&mut self, command: BufferCommand) -> CommandResult {
        match command {
            BufferCommand::Open { path } => {
                let outcome = self.open(&path, OpenFlags::default());
                self.open_result(outcome)
            }
            BufferCommand::New => {
                let outcome = self.new_document();
                self.open_result(outcome)
            }
            BufferCommand::Close => {
                let outcome = self.close();
                self.close_result(outcome)
            }
            BufferCommand::CloseAll => {
                let outcome = self.close_all();
                self.close_result(outcome)
            }
            BufferCommand::Save => {
                let outcome = self.save();
                self.save_result(outcome)
            }
            BufferCommand::SaveAs { path } => {
                let outcome = self.save_as(&path);
                self.save_result(outcome)
            }
            BufferCommand::SaveAll => match self.save_all(false, true) {
                PromptChoice::Cancel => CommandResult::Cancelled,
                _ => CommandResult::Success {
                    message: "all buffers saved".to_string(),
                },
            },
            BufferCommand::Next => self.switch_result(|mgr| mgr.next()),
            BufferCommand::Prev => self.switch_result(|mgr| mgr.prev()),
            BufferCommand::NextZOrder => self.switch_result(|mgr| mgr.next_zorder()),
            BufferCommand::PrevZOrder => self.switch_result(|mgr| mgr.prev_zorder()),
            BufferCommand::EndCycling => self.switch_result(|mgr| {
                mgr.end_cycling();
                Ok(())
            }),
            BufferCommand::Switch { index } => self.switch_result(|mgr| mgr.switch_to(index)),
            BufferCommand::List => CommandResult::List {
                entries: self.buffer_list(),
            },
            BufferCommand::Recent { position: None } => CommandResult::Recent {
                paths: self.recent.iter().map(|rf| rf.path.clone()).collect(),
            },
            BufferCommand::Recent {
                position: Some(pos),
            } => {
                let outcome = self.open_recent(pos);
                self.open_result(outcome)
            }
            BufferCommand::RecentNext => {
                let outcome = self.recent_next();
                self.recent_result(outcome)
            }
            BufferCommand::RecentPrev => {
                let outcome = self.recent_prev();
                self.recent_result(outcome)
            }
            BufferCommand::RecentDrop => match self.drop_recent_top() {
                Some(rf) => CommandResult::Success {
                    message: format!("dropped {}", rf.path),
                },
                None => empty_recent(),
            },
            BufferCommand::SessionSave { path } => {
                match self.save_session(path.as_deref().map(Path::new)) {
                    Ok(count) => CommandResult::Success {
                        message: format!("session saved: {} buffers", count),
                    },
                    Err(err) => error_result(err),
                }
            }
            BufferCommand::SessionLoad { path } => {
                match self.load_session(path.as_deref().map(Path::new)) {
                    Ok(SessionOutcome::Restored {
                        opened,
                        malformed_line,
                    }) => {
                        let mut message = format!("session loaded: {} buffers", opened);
                        if let Some(line) = malformed_line {
                            message.push_str(&format!(" (stopped at line {})", line));
                        }
                        CommandResult::Success { message }
                    }
                    Ok(SessionOutcome::Cancelled) => CommandResult::Cancelled,
                    Err(err) => error_result(err),
                }
            }
            BufferCommand::Revert => match self.revert() {
                Ok(()) => CommandResult::Success {
                    message: format!("reverted {}", self.current_path()),
                },
                Err(err) => error_result(err),
            },
            BufferCommand::Type { text } => match self.append_text(&text) {
                Ok(()) => CommandResult::Success {
                    message: format!("typed {} bytes", text.len()),
                },
                Err(err) => error_result(err),
            },
            BufferCommand::Activate => self.activation_result(true),
            BufferCommand::Deactivate => self.activation_result(false),
            BufferCommand::Quit => match self.quit() {
                QuitOutcome::Released => CommandResult::Released,
                QuitOutcome::Cancelled => CommandResult::Cancelled,
            },
        }
    }

    fn open_result(&self, outcome: ManagerResult<OpenOutcome>) -> CommandResult {
        let path = self.current_path().clone();
        match outcome {
            Ok(OpenOutcome::Opened(index)) => CommandResult::Opened { index, path },
            Ok(OpenOutcome::Created(index)) => CommandResult::Created { index, path },
            Ok(OpenOutcome::Switched(index)) => CommandResult::Switched { index },
            Ok(OpenOutcome::Cancelled) => CommandResult::Cancelled,
            Err(err) => error_result(err),
        }
    }

    fn recent_result(&self, outcome: ManagerResult<Option<OpenOutcome>>) -> CommandResult {
        match outcome {
            Ok(Some(outcome)) => self.open_result(Ok(outcome)),
            Ok(None) => empty_recent(),
            Err(err) => error_result(err),
        }
    }

    fn close_result(&self, outcome: CloseOutcome) -> CommandResult {
        match outcome {
            CloseOutcome::Closed => CommandResult::Closed {
                current: self.current_index(),
            },
            CloseOutcome::Cancelled => CommandResult::Cancelled,
            CloseOutcome::QuitRequested => CommandResult::QuitRequested,
        }
    }

    fn save_result(&self, outcome: ManagerResult<SaveOutcome>) -> CommandResult {
        match outcome {
            Ok(SaveOutcome::Saved(path)) => CommandResult::Saved { path },
            Ok(SaveOutcome::Cancelled) => CommandResult::Cancelled,
            Err(err) => error_result(err),
        }
    }

    fn switch_result<F>(&mut self, switch: F) -> CommandResult
    where
        F: FnOnce(&mut Self) -> ManagerResult<()>,
    {
        match switch(self) {
            Ok(()) => CommandResult::Switched {
                index: self.current_index(),
            },
            Err(err) => error_result(err),
        }
    }

    fn activation_result(&mut self, active: bool) -> CommandResult {
        match self.activate(active) {
            Ok(()) => CommandResult::Success {
                message: (if active { "activated" } else { "deactivated" }).to_string(),
            },
            Err(err) => error_result(err),
        }
    }
}

fn error_result(err: ManagerError) -> CommandResult {
    CommandResult::Error {
        message: err.to_string(),
    }
}

fn empty_recent() -> CommandResult {
    CommandResult::Success {
        message: "recent list empty".to_string(),
    }
}

/// Parses a command line into a BufferCommand
///
/// Examples:
/// - "open notes.txt" -> Open { path: "notes.txt" }
/// - "switch 2" -> Switch { index: 1 }
/// - "recent 1" -> Recent { position: Some(0) }
/// - "session load work.session" -> SessionLoad { path: Some(..) }
///
/// Everything after the command word is one argument, so paths may contain
/// spaces. Indexes and positions are 1-based on input.
pub fn parse_command(input: &str) -> ManagerResult<BufferCommand> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ManagerError::InvalidCommand("Empty command".to_string()));
    }
    let (word, rest) = match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    match word {
        "open" => required(argument, "open <path>").map(|path| BufferCommand::Open { path }),
        "new" => Ok(BufferCommand::New),
        "close" => Ok(BufferCommand::Close),
        "closeall" => Ok(BufferCommand::CloseAll),
        "save" => Ok(BufferCommand::Save),
        "saveas" => required(argument, "saveas <path>").map(|path| BufferCommand::SaveAs { path }),
        "saveall" => Ok(BufferCommand::SaveAll),
        "next" => Ok(BufferCommand::Next),
        "prev" | "previous" => Ok(BufferCommand::Prev),
        "znext" => Ok(BufferCommand::NextZOrder),
        "zprev" => Ok(BufferCommand::PrevZOrder),
        "zend" => Ok(BufferCommand::EndCycling),
        "switch" => {
            let index = required(argument, "switch <number>")?;
            parse_ordinal(&index).map(|index| BufferCommand::Switch { index })
        }
        "list" => Ok(BufferCommand::List),
        "recent" => match argument {
            None => Ok(BufferCommand::Recent { position: None }),
            Some(pos) => parse_ordinal(&pos).map(|pos| BufferCommand::Recent {
                position: Some(pos),
            }),
        },
        "recentnext" => Ok(BufferCommand::RecentNext),
        "recentprev" => Ok(BufferCommand::RecentPrev),
        "recentdrop" => Ok(BufferCommand::RecentDrop),
        "session" => parse_session(rest),
        "revert" => Ok(BufferCommand::Revert),
        "type" => required(argument, "type <text>").map(|text| BufferCommand::Type {
            text: text.replace("\\n", "\n"),
        }),
        "activate" => Ok(BufferCommand::Activate),
        "deactivate" => Ok(BufferCommand::Deactivate),
        "quit" => Ok(BufferCommand::Quit),
        unknown => Err(ManagerError::InvalidCommand(format!(
            "Unknown command: {}",
            unknown
        ))),
    }
}

fn required(argument: Option<String>, usage: &str) -> ManagerResult<String> {
    argument.ok_or_else(|| ManagerError::InvalidCommand(format!("Usage: {}", usage)))
}

/// Parses a 1-based number into a 0-based index
fn parse_ordinal(text: &str) -> ManagerResult<usize> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(ManagerError::InvalidCommand(format!(
            "Expected a number from 1: {}",
            text
        ))),
    }
}

fn parse_session(rest: &str) -> ManagerResult<BufferCommand> {
    let (action, path) = match rest.split_once(char::is_whitespace) {
        Some((action, path)) => (action, Some(path.trim().to_string())),
        None => (rest, None),
    };
    let path = path.filter(|p| !p.is_empty());
    match action {
        "save" => Ok(BufferCommand::SessionSave { path }),
        "load" => Ok(BufferCommand::SessionLoad { path }),
        _ => Err(ManagerError::InvalidCommand(
            "Usage: session save|load [path]".to_string(),
        )),
    }
}

/// Formats a BufferCommand back into its command line
pub fn format_command(command: &BufferCommand) -> String {
    match command {
        BufferCommand::Open { path } => format!("open {}", path),
        BufferCommand::New => "new".to_string(),
        BufferCommand::Close => "close".to_string(),
        BufferCommand::CloseAll => "closeall".to_string(),
        BufferCommand::Save => "save".to_string(),
        BufferCommand::SaveAs { path } => format!("saveas {}", path),
        BufferCommand::SaveAll => "saveall".to_string(),
        BufferCommand::Next => "next".to_string(),
        BufferCommand::Prev => "prev".to_string(),
        BufferCommand::NextZOrder => "znext".to_string(),
        BufferCommand::PrevZOrder => "zprev".to_string(),
        BufferCommand::EndCycling => "zend".to_string(),
        BufferCommand::Switch { index } => format!("switch {}", index + 1),
        BufferCommand::List => "list".to_string(),
        BufferCommand::Recent { position: None } => "recent".to_string(),
        BufferCommand::Recent {
            position: Some(pos),
        } => format!("recent {}", pos + 1),
        BufferCommand::RecentNext => "recentnext".to_string(),
        BufferCommand::RecentPrev => "recentprev".to_string(),
        BufferCommand::RecentDrop => "recentdrop".to_string(),
        BufferCommand::SessionSave { path: None } => "session save".to_string(),
        BufferCommand::SessionSave { path: Some(path) } => format!("session save {}", path),
        BufferCommand::SessionLoad { path: None } => "session load".to_string(),
        BufferCommand::SessionLoad { path: Some(path) } => format!("session load {}", path),
        BufferCommand::Revert => "revert".to_string(),
        BufferCommand::Type { text } => format!("type {}", text.replace('\n', "\\n")),
        BufferCommand::Activate => "activate".to_string(),
        BufferCommand::Deactivate => "deactivate".to_string(),
        BufferCommand::Quit => "quit".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemoryEngine;
    use crate::BufferSettings;

    fn create_test_manager() -> BufferManager<MemoryEngine> {
        let settings = BufferSettings {
            buffers: 3,
            ..BufferSettings::default()
        };
        BufferManager::new(MemoryEngine::new(), settings).unwrap()
    }

    #[test]
    fn test_parse_open_with_spaces() {
        let cmd = parse_command("open /my docs/notes.txt").unwrap();
        assert_eq!(
            cmd,
            BufferCommand::Open {
                path: "/my docs/notes.txt".to_string()
            }
        );
    }

    #[test]
    fn test_parse_switch_is_one_based() {
        assert_eq!(
            parse_command("switch 2").unwrap(),
            BufferCommand::Switch { index: 1 }
        );
        assert!(parse_command("switch 0").is_err());
        assert!(parse_command("switch").is_err());
    }

    #[test]
    fn test_parse_recent() {
        assert_eq!(
            parse_command("recent").unwrap(),
            BufferCommand::Recent { position: None }
        );
        assert_eq!(
            parse_command("recent 3").unwrap(),
            BufferCommand::Recent { position: Some(2) }
        );
    }

    #[test]
    fn test_parse_session() {
        assert_eq!(
            parse_command("session save").unwrap(),
            BufferCommand::SessionSave { path: None }
        );
        assert_eq!(
            parse_command("session load /tmp/work.session").unwrap(),
            BufferCommand::SessionLoad {
                path: Some("/tmp/work.session".to_string())
            }
        );
        assert!(parse_command("session").is_err());
    }

    #[test]
    fn test_parse_type_unescapes_newlines() {
        assert_eq!(
            parse_command("type one\\ntwo").unwrap(),
            BufferCommand::Type {
                text: "one\ntwo".to_string()
            }
        );
    }

    #[test]
    fn test_parse_invalid_command() {
        assert!(matches!(
            parse_command("frobnicate"),
            Err(ManagerError::InvalidCommand(_))
        ));
        assert!(parse_command("   ").is_err());
    }

    #[test]
    fn test_format_parses_back() {
        for line in ["open /a b.txt", "switch 3", "recent 2", "session save /s", "type x\\ny"] {
            let cmd = parse_command(line).unwrap();
            assert_eq!(format_command(&cmd), line);
        }
    }

    #[test]
    fn test_execute_list() {
        let mut mgr = create_test_manager();
        match mgr.execute_command(BufferCommand::List) {
            CommandResult::List { entries } => {
                assert_eq!(entries.len(), 1);
                assert!(entries[0].current);
            }
            other => panic!("Expected List result, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_new_and_switch() {
        let mut mgr = create_test_manager();
        mgr.execute_command(BufferCommand::Type {
            text: "x".to_string(),
        });
        let result = mgr.execute_command(BufferCommand::New);
        assert!(matches!(result, CommandResult::Created { index: 1, .. }));
        let result = mgr.execute_command(BufferCommand::Switch { index: 0 });
        assert_eq!(result, CommandResult::Switched { index: 0 });
    }

    #[test]
    fn test_execute_switch_out_of_range() {
        let mut mgr = create_test_manager();
        let result = mgr.execute_command(BufferCommand::Switch { index: 5 });
        assert!(matches!(result, CommandResult::Error { .. }));
    }

    #[test]
    fn test_execute_close_dirty_cancelled_by_default() {
        let mut mgr = create_test_manager();
        mgr.execute_command(BufferCommand::Type {
            text: "draft".to_string(),
        });
        assert_eq!(mgr.execute_command(BufferCommand::Close), CommandResult::Cancelled);
        assert!(mgr.current_slot().dirty);
    }

    #[test]
    fn test_execute_recent_empty() {
        let mut mgr = create_test_manager();
        assert_eq!(
            mgr.execute_command(BufferCommand::RecentDrop),
            empty_recent()
        );
        assert_eq!(
            mgr.execute_command(BufferCommand::Recent { position: Some(2) }),
            CommandResult::Error {
                message: ManagerError::NoRecentEntry(2).to_string()
            }
        );
    }

    #[test]
    fn test_result_display() {
        let result = CommandResult::Created {
            index: 0,
            path: FilePath::untitled(),
        };
        assert_eq!(result.to_string(), "created 1 Untitled");
        assert_eq!(CommandResult::Switched { index: 2 }.to_string(), "switched 3");
        assert_eq!(
            CommandResult::Recent { paths: vec![] }.to_string(),
            "recent: (empty)"
        );
    }
}
