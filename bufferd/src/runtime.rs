//! # Host Runtime
//!
//! Feeds script steps (or standard input lines) to the buffer manager and
//! prints what each command did.

use std::io::{self, BufRead};
use std::path::PathBuf;

use buffer_core::FilePath;
use services_buffer_manager::collab::{MemoryEngine, ScriptedPrompt};
use services_buffer_manager::{
    BufferManager, BufferSettings, CommandResult, ManagerError, PromptChoice, QuitOutcome,
};
use thiserror::Error;

use crate::script::{CommandScript, ScriptError, ScriptStep};

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostRuntimeError {
    #[error("Buffer manager error: {0}")]
    Manager(#[from] ManagerError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Input error: {0}")]
    Input(String),
}

/// Host runtime configuration
#[derive(Debug, Clone)]
pub struct HostRuntimeConfig {
    pub settings: BufferSettings,
    /// Command script; standard input is read when absent
    pub script: Option<String>,
    /// Files to open at startup instead of the saved session
    pub files: Vec<PathBuf>,
    /// Answer to save questions the script did not queue an answer for
    pub default_answer: PromptChoice,
}

impl Default for HostRuntimeConfig {
    fn default() -> Self {
        Self {
            settings: BufferSettings::default(),
            script: None,
            files: Vec::new(),
            default_answer: PromptChoice::Cancel,
        }
    }
}

/// Host runtime
pub struct HostRuntime {
    manager: BufferManager<MemoryEngine>,
    /// Shared with the manager; script answers are queued here
    prompt: ScriptedPrompt,
    script: Option<CommandScript>,
    transcript: Vec<String>,
    steps: usize,
    finished: bool,
}

impl HostRuntime {
    /// Creates the runtime and starts the manager
    pub fn new(config: HostRuntimeConfig) -> Result<Self, HostRuntimeError> {
        let script = config
            .script
            .as_deref()
            .map(CommandScript::from_text)
            .transpose()?;

        let prompt = ScriptedPrompt::answering(config.default_answer);
        let mut manager = BufferManager::new(MemoryEngine::new(), config.settings)?
            .with_prompt(Box::new(prompt.clone()));
        manager.start(&config.files)?;
        tracing::info!(buffers = manager.len(), "host runtime started");

        Ok(Self {
            manager,
            prompt,
            script,
            transcript: Vec::new(),
            steps: 0,
            finished: false,
        })
    }

    pub fn manager(&self) -> &BufferManager<MemoryEngine> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut BufferManager<MemoryEngine> {
        &mut self.manager
    }

    /// Every line printed so far
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Number of commands executed
    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Runs the script, or standard input, then quits
    pub fn run(&mut self) -> Result<(), HostRuntimeError> {
        match self.script.take() {
            Some(mut script) => {
                while let Some((line, step)) = script.next_step() {
                    if self.finished {
                        tracing::warn!(
                            line,
                            remaining = script.len() + 1,
                            "steps after quit ignored"
                        );
                        break;
                    }
                    tracing::debug!(line, "script step");
                    self.apply(step);
                }
            }
            None => self.run_stdin()?,
        }
        self.shutdown();
        Ok(())
    }

    fn run_stdin(&mut self) -> Result<(), HostRuntimeError> {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.map_err(|e| HostRuntimeError::Input(e.to_string()))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match ScriptStep::parse(line) {
                Ok(step) => self.apply(step),
                Err(message) => self.emit(format!("error: {}", message)),
            }
            if self.finished {
                break;
            }
        }
        Ok(())
    }

    /// Executes one step, printing the command's result
    pub fn apply(&mut self, step: ScriptStep) {
        match step {
            ScriptStep::AnswerSave(choice) => self.prompt.queue_save(choice),
            ScriptStep::AnswerReload(answer) => self.prompt.queue_reload(answer),
            ScriptStep::AnswerPath(path) => self.prompt.queue_save_path(FilePath::absolute(path)),
            ScriptStep::Command(command) => {
                self.steps += 1;
                let result = self.manager.execute_command(command);
                self.emit(result.to_string());
                match result {
                    CommandResult::Released => self.finished = true,
                    CommandResult::QuitRequested => self.shutdown(),
                    _ => {}
                }
            }
        }
    }

    /// Quits the manager unless a command already did
    fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        match self.manager.quit() {
            QuitOutcome::Released => self.emit("released".to_string()),
            QuitOutcome::Cancelled => {
                tracing::warn!("quit cancelled at exit, unsaved changes dropped");
                self.emit("cancelled".to_string());
            }
        }
    }

    fn emit(&mut self, line: String) {
        println!("{}", line);
        self.transcript.push(line);
    }
}
