//! Watch mode for htms.
//!
//! Watches the source tree and rebuilds on change, running at most one build
//! at a time.

pub mod latch;
pub mod rebuild;
pub mod watcher;

pub use latch::{BuildGuard, BuildLatch, LatchState};
pub use rebuild::Rebuilder;
pub use watcher::{FileWatcher, WatchEvent};
