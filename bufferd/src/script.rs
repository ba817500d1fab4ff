//! # Command Script Parser
//!
//! Line-based scripts for deterministic runs and demos.
//!
//! ## Format
//!
//! Each line is one buffer command (`open notes.txt`, `switch 2`, `znext`)
//! or one prompt answer queued for the next question of that kind:
//! - `answer yes|no|cancel`: next save question
//! - `answer-reload yes|no`: next reload question
//! - `answer-path <path>`: next "save as" file name
//!
//! Blank lines and lines starting with `#` are skipped.
//!
//! ## Example
//!
//! ```text
//! # Edit a file, then close it saving the change
//! open notes.txt
//! type hello\n
//! answer yes
//! close
//! ```

use std::collections::VecDeque;

use services_buffer_manager::{parse_command, BufferCommand, PromptChoice};
use thiserror::Error;

/// Script error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Empty script")]
    EmptyScript,
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Command(BufferCommand),
    AnswerSave(PromptChoice),
    AnswerReload(bool),
    AnswerPath(String),
}

impl ScriptStep {
    /// Parses one non-comment line
    pub fn parse(line: &str) -> Result<Self, String> {
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word {
            "answer" => parse_choice(rest).map(ScriptStep::AnswerSave),
            "answer-reload" => match parse_choice(rest)? {
                PromptChoice::Yes => Ok(ScriptStep::AnswerReload(true)),
                PromptChoice::No => Ok(ScriptStep::AnswerReload(false)),
                PromptChoice::Cancel => Err("Reload answers are yes or no".to_string()),
            },
            "answer-path" if !rest.is_empty() => Ok(ScriptStep::AnswerPath(rest.to_string())),
            "answer-path" => Err("Usage: answer-path <path>".to_string()),
            _ => parse_command(line)
                .map(ScriptStep::Command)
                .map_err(|e| e.to_string()),
        }
    }
}

/// Parses `yes`, `no` or `cancel`
pub fn parse_choice(text: &str) -> Result<PromptChoice, String> {
    match text.to_ascii_lowercase().as_str() {
        "yes" | "y" => Ok(PromptChoice::Yes),
        "no" | "n" => Ok(PromptChoice::No),
        "cancel" | "c" => Ok(PromptChoice::Cancel),
        other => Err(format!("Invalid answer: {}", other)),
    }
}

/// Command script
#[derive(Debug, Clone, Default)]
pub struct CommandScript {
    steps: VecDeque<(usize, ScriptStep)>,
}

impl CommandScript {
    /// Parses a script from text
    pub fn from_text(text: &str) -> Result<Self, ScriptError> {
        let mut steps = VecDeque::new();

        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let step = ScriptStep::parse(line).map_err(|message| ScriptError::ParseError {
                line: line_num + 1,
                message,
            })?;
            steps.push_back((line_num + 1, step));
        }

        if steps.is_empty() {
            return Err(ScriptError::EmptyScript);
        }

        Ok(Self { steps })
    }

    /// Next step and the line it came from
    pub fn next_step(&mut self) -> Option<(usize, ScriptStep)> {
        self.steps.pop_front()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_skips_comments() {
        let script = CommandScript::from_text(
            "# header\n\nopen /tmp/a.txt\n  # indented comment\nlist\n",
        )
        .unwrap();
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_steps_keep_line_numbers() {
        let mut script = CommandScript::from_text("new\n\nanswer no\nclose\n").unwrap();
        assert_eq!(script.next_step(), Some((1, ScriptStep::Command(BufferCommand::New))));
        assert_eq!(
            script.next_step(),
            Some((3, ScriptStep::AnswerSave(PromptChoice::No)))
        );
        assert_eq!(script.next_step(), Some((4, ScriptStep::Command(BufferCommand::Close))));
        assert_eq!(script.next_step(), None);
    }

    #[test]
    fn test_answers() {
        assert_eq!(
            ScriptStep::parse("answer CANCEL"),
            Ok(ScriptStep::AnswerSave(PromptChoice::Cancel))
        );
        assert_eq!(
            ScriptStep::parse("answer-reload y"),
            Ok(ScriptStep::AnswerReload(true))
        );
        assert_eq!(
            ScriptStep::parse("answer-path /tmp/out file.txt"),
            Ok(ScriptStep::AnswerPath("/tmp/out file.txt".to_string()))
        );
        assert!(ScriptStep::parse("answer-reload cancel").is_err());
        assert!(ScriptStep::parse("answer-path").is_err());
        assert!(ScriptStep::parse("answer maybe").is_err());
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let err = CommandScript::from_text("new\nfly away\n").unwrap_err();
        match err {
            ScriptError::ParseError { line, .. } => assert_eq!(line, 2),
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(
            CommandScript::from_text("# nothing\n\n").unwrap_err(),
            ScriptError::EmptyScript
        );
    }
}
