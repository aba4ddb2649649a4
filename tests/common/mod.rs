//! Helpers shared by the integration tests

use std::sync::{Mutex, MutexGuard};

static FORK_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that fork. The test runner is multi-threaded and a child
/// forked while a sibling test holds the allocator or stderr lock can hang.
pub fn serial() -> MutexGuard<'static, ()> {
    FORK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
