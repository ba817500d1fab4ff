//! # Buffer Core
//!
//! Bookkeeping for a fixed set of open documents.
//!
//! ## Philosophy
//!
//! - **No I/O**: Nothing here touches the filesystem or an editing surface
//! - **Three consistent indexes**: Slot position, open order and MRU order
//!   are updated together by every operation
//! - **Ownership over convention**: Document handles are move-only, so a
//!   handle can never sit in two live slots
//! - **Deterministic**: Same operation sequence => same pool and ring state
//!
//! ## Design
//!
//! The core provides:
//! - BufferPool: Fixed-capacity slot array with a current cursor
//! - MruRing: Arena-backed circular list giving the Z-order, with a sticky
//!   cycling session
//! - RecentFileStack: Bounded most-recent-first list of closed files
//! - Slot / FilePath / DocumentHandle: Per-buffer identity and view state

pub mod document;
pub mod error;
pub mod path;
pub mod pool;
pub mod recent;
pub mod ring;
pub mod slot;

pub use document::DocumentHandle;
pub use error::{PoolError, PoolResult};
pub use path::FilePath;
pub use pool::BufferPool;
pub use recent::{RecentFile, RecentFileStack, DEFAULT_RECENT_CAPACITY};
pub use ring::{CycleState, MruRing};
pub use slot::{EncodingMode, SelectionRange, Slot};
