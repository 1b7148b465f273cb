#![forbid(unsafe_code)]

//! In-memory task store with change notification.
//!
//! # Design
//!
//! [`TaskStore`] is a cloneable handle over shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Every mutation that changes the collection
//! bumps the version and hands the full task list to all live subscribers,
//! in registration order.
//!
//! # Invariants
//!
//! 1. Task ids are unique within the store.
//! 2. `version` increments by exactly 1 on each collection-changing mutation.
//! 3. A mutation that leaves the collection equal is a no-op: no version
//!    bump, no notification.
//! 4. [`TaskStore::update_many`] validates every task before applying any of
//!    them, then notifies once.
//! 5. Dead subscribers (dropped [`Subscription`] guards) are pruned lazily.
//!
//! # Failure Modes
//!
//! - Unknown or duplicate ids return [`StoreError`]; the store is unchanged.
//! - Subscribers may mutate the store from their callback: no borrow is held
//!   while callbacks run. The nested mutation notifies on its own.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span};
use web_time::Instant;

use crate::logging::TARGET_STORE;
use crate::task::{ColumnId, Task, TaskId};

type CallbackRc = Rc<dyn Fn(&[Task])>;
type CallbackWeak = Weak<dyn Fn(&[Task])>;

/// Store mutation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task {0} already exists")]
    DuplicateTask(TaskId),
    #[error("task {0} does not exist")]
    UnknownTask(TaskId),
}

struct StoreInner {
    tasks: Vec<Task>,
    version: u64,
    subscribers: Vec<CallbackWeak>,
}

/// Shared, observable task collection.
///
/// Cloning a `TaskStore` creates a new handle to the **same** collection.
pub struct TaskStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Clone for TaskStore {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TaskStore")
            .field("tasks", &inner.tasks.len())
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl TaskStore {
    /// Create a store seeded with `tasks`. Later duplicates of an id are
    /// dropped.
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut unique: Vec<Task> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !unique.iter().any(|t| t.id == task.id) {
                unique.push(task);
            }
        }
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                tasks: unique,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the full collection.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.inner.borrow().tasks.clone()
    }

    /// Access the collection by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&[Task]) -> R) -> R {
        f(&self.inner.borrow().tasks)
    }

    /// Clone of the task with `id`.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        let inner = self.inner.borrow();
        inner.tasks.iter().find(|t| &t.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().tasks.is_empty()
    }

    /// Current version number.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered subscribers (including dead ones not yet pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Insert a new task.
    pub fn add(&self, task: Task) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.tasks.iter().any(|t| t.id == task.id) {
                return Err(StoreError::DuplicateTask(task.id));
            }
            debug!(target: TARGET_STORE, task = %task.id, column = %task.column_id, "task added");
            inner.tasks.push(task);
            inner.version += 1;
        }
        self.notify();
        Ok(())
    }

    /// Replace the stored task with the same id.
    pub fn update(&self, task: Task) -> Result<(), StoreError> {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let Some(slot) = inner.tasks.iter_mut().find(|t| t.id == task.id) else {
                return Err(StoreError::UnknownTask(task.id));
            };
            if *slot == task {
                false
            } else {
                *slot = task;
                inner.version += 1;
                true
            }
        };
        if changed {
            self.notify();
        }
        Ok(())
    }

    /// Replace several tasks and notify once.
    ///
    /// Every id must exist; otherwise nothing is applied.
    pub fn update_many(&self, tasks: Vec<Task>) -> Result<(), StoreError> {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            if let Some(missing) = tasks
                .iter()
                .find(|task| !inner.tasks.iter().any(|t| t.id == task.id))
            {
                return Err(StoreError::UnknownTask(missing.id.clone()));
            }
            let mut changed = 0usize;
            for task in tasks {
                if let Some(slot) = inner.tasks.iter_mut().find(|t| t.id == task.id)
                    && *slot != task
                {
                    *slot = task;
                    changed += 1;
                }
            }
            if changed > 0 {
                inner.version += 1;
            }
            debug!(target: TARGET_STORE, changed, "batch update applied");
            changed > 0
        };
        if changed {
            self.notify();
        }
        Ok(())
    }

    /// Remove the task with `id`.
    pub fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.borrow_mut();
            let Some(pos) = inner.tasks.iter().position(|t| &t.id == id) else {
                return Err(StoreError::UnknownTask(id.clone()));
            };
            inner.tasks.remove(pos);
            inner.version += 1;
            debug!(target: TARGET_STORE, task = %id, "task deleted");
        }
        self.notify();
        Ok(())
    }

    /// Remove every task of `column`, returning how many were removed.
    pub fn remove_by_column(&self, column: &ColumnId) -> usize {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.tasks.len();
            inner.tasks.retain(|t| &t.column_id != column);
            let removed = before - inner.tasks.len();
            if removed > 0 {
                inner.version += 1;
            }
            removed
        };
        if removed > 0 {
            debug!(target: TARGET_STORE, column = %column, removed, "column tasks removed");
            self.notify();
        }
        removed
    }

    /// Remove every task.
    pub fn wipe(&self) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            if inner.tasks.is_empty() {
                false
            } else {
                inner.tasks.clear();
                inner.version += 1;
                true
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Subscribe to collection changes.
    ///
    /// Returns a [`Subscription`] guard. Dropping the guard unsubscribes the
    /// callback.
    pub fn subscribe(&self, callback: impl Fn(&[Task]) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner.borrow_mut().subscribers.push(weak);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    fn notify(&self) {
        let (callbacks, tasks, version): (Vec<CallbackRc>, Vec<Task>, u64) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks = inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (callbacks, inner.tasks.clone(), inner.version)
        };
        if callbacks.is_empty() {
            return;
        }

        let start = Instant::now();
        let _span = debug_span!(
            "store.notify",
            version,
            tasks = tasks.len(),
            subscribers = callbacks.len()
        )
        .entered();
        for cb in &callbacks {
            cb(&tasks);
        }
        debug!(
            target: TARGET_STORE,
            version,
            duration_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
            "subscribers notified"
        );
    }
}

/// RAII guard for a store subscriber.
///
/// Dropping the `Subscription` drops the strong callback reference, so the
/// store skips (and later prunes) the callback.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
