//! Per-subtree mutation locks.
//!
//! Deposits, withdrawals and fan-outs against one goal tree must not
//! interleave: each fan-out computation has to see the children's balances as
//! of the start of its own operation. The engine therefore takes an exclusive
//! lock on the **root** of the affected tree before reading balances and
//! releases it only after the whole entry batch is written.
//!
//! Acquisition waits a bounded time; on timeout the caller gets a retryable
//! [`EngineError::ConcurrencyConflict`]. No operation blocks indefinitely.
use std::{
    collections::HashSet,
    sync::{Condvar, Mutex, PoisonError},
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Debug, Default)]
pub(crate) struct SubtreeLocks {
    held: Mutex<HashSet<Uuid>>,
    released: Condvar,
}

impl SubtreeLocks {
    /// Acquires the lock for a tree root, waiting at most `wait`.
    pub(crate) fn acquire(&self, root: Uuid, wait: Duration) -> ResultEngine<SubtreeGuard<'_>> {
        let deadline = Instant::now() + wait;
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);

        while held.contains(&root) {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(EngineError::ConcurrencyConflict(format!(
                    "goal tree {root} is locked by another operation"
                )));
            };
            let (guard, timeout) = self
                .released
                .wait_timeout(held, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            held = guard;
            if timeout.timed_out() && held.contains(&root) {
                return Err(EngineError::ConcurrencyConflict(format!(
                    "goal tree {root} is locked by another operation"
                )));
            }
        }

        held.insert(root);
        Ok(SubtreeGuard { locks: self, root })
    }
}

/// RAII guard; dropping it releases the subtree and wakes waiters.
#[derive(Debug)]
pub(crate) struct SubtreeGuard<'a> {
    locks: &'a SubtreeLocks,
    root: Uuid,
}

impl Drop for SubtreeGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.root);
        self.locks.released.notify_all();
    }
}
