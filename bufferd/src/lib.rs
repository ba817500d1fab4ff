//! # Buffer Host Runtime
//!
//! Drives a buffer manager from a command script or from standard input.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: The manager never prints; the host prints one
//!   result per command
//! - **Questions are scripted**: Save and reload prompts are answered from
//!   the script, so runs are deterministic
//! - **No editing surface**: Documents live in memory; files on disk are real
//!
//! ## Responsibilities
//!
//! The host runtime:
//! - Loads settings and starts the manager (recent list, session or files)
//! - Executes buffer commands in order
//! - Quits cleanly, writing the recent list and session when enabled
//!
//! ## Non-Responsibilities
//!
//! The host does NOT:
//! - Render text or tabs
//! - Edit documents beyond appending text

pub mod runtime;
pub mod script;

pub use runtime::{HostRuntime, HostRuntimeConfig, HostRuntimeError};
pub use script::{CommandScript, ScriptError, ScriptStep};
