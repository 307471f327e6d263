//! Single-slot build latch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Whether a build is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    Idle,
    Building,
}

/// Admits at most one build at a time.
///
/// [`try_begin`](BuildLatch::try_begin) moves the latch from `Idle` to
/// `Building` and hands out a guard; dropping the guard moves it back, also
/// when the build fails or panics. While `Building`, further attempts are
/// refused rather than queued.
#[derive(Debug, Clone)]
pub struct BuildLatch {
    state: Arc<Mutex<LatchState>>,
}

impl Default for BuildLatch {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(LatchState::Idle)),
        }
    }
}

impl BuildLatch {
    /// Create an idle latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a build unless one is already running.
    pub fn try_begin(&self) -> Option<BuildGuard> {
        let mut state = lock(&self.state);
        match *state {
            LatchState::Building => None,
            LatchState::Idle => {
                *state = LatchState::Building;
                Some(BuildGuard {
                    state: Arc::clone(&self.state),
                })
            }
        }
    }

    pub fn state(&self) -> LatchState {
        *lock(&self.state)
    }
}

/// Held for the duration of one build.
#[derive(Debug)]
pub struct BuildGuard {
    state: Arc<Mutex<LatchState>>,
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        *lock(&self.state) = LatchState::Idle;
    }
}

// The state is a plain enum, so a poisoned lock still holds a valid value.
fn lock(state: &Mutex<LatchState>) -> MutexGuard<'_, LatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
