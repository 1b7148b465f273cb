#![forbid(unsafe_code)]

//! Participant conflict detection.
//!
//! Two tasks conflict iff their time ranges overlap as open intervals
//! (`start1 < end2 && start2 < end1`) and they share at least one
//! participant. A task is flagged when it conflicts with *any* other task in
//! the scope being checked; by default that scope is the whole workspace, not
//! the column the task is displayed in.
//!
//! # Invariants
//!
//! 1. The relation is symmetric: `tasks_conflict(a, b) == tasks_conflict(b, a)`.
//! 2. Back-to-back tasks (`a.end == b.start`) never conflict.
//! 3. A task never conflicts with itself (same id).
//! 4. [`ConflictIndex`] answers exactly like [`has_participant_conflict`].
//!
//! # Complexity
//!
//! | Operation                    | Cost                                  |
//! |------------------------------|---------------------------------------|
//! | `has_participant_conflict`   | O(n · p) for n tasks, p participants  |
//! | full refresh (naive)         | O(n² · p)                             |
//! | `ConflictIndex::build`       | O(n · p)                              |
//! | `ConflictIndex::has_conflict`| O(bucket sizes)                       |

use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};

use crate::color::TaskColor;
use crate::task::{ParticipantId, Task, TaskId};

/// Which tasks a conflict check runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConflictScope {
    /// Every task in the store, regardless of column.
    #[default]
    Workspace,
    /// Only tasks sharing the checked task's column.
    Column,
}

/// Open-interval overlap test. Touching endpoints do not overlap.
#[inline]
#[must_use]
pub fn time_ranges_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}

/// Whether the two tasks have at least one participant in common.
#[must_use]
pub fn shares_participant(a: &Task, b: &Task) -> bool {
    let (small, large) = if a.participants.len() <= b.participants.len() {
        (a, b)
    } else {
        (b, a)
    };
    small
        .participants
        .iter()
        .any(|participant| large.participants.contains(participant))
}

/// Whether two distinct tasks double-book a participant.
#[must_use]
pub fn tasks_conflict(a: &Task, b: &Task) -> bool {
    a.id != b.id
        && time_ranges_overlap(a.start(), a.end(), b.start(), b.end())
        && shares_participant(a, b)
}

/// Tasks in `all` that conflict with `task`.
pub fn conflicting_tasks<'a>(
    task: &'a Task,
    all: &'a [Task],
) -> impl Iterator<Item = &'a Task> + 'a {
    all.iter().filter(move |other| tasks_conflict(task, other))
}

/// Whether any task in `all` conflicts with `task`.
#[must_use]
pub fn has_participant_conflict(task: &Task, all: &[Task]) -> bool {
    conflicting_tasks(task, all).next().is_some()
}

/// Same check as [`has_participant_conflict`], restricted by `scope`.
#[must_use]
pub fn has_conflict_in_scope(task: &Task, all: &[Task], scope: ConflictScope) -> bool {
    match scope {
        ConflictScope::Workspace => has_participant_conflict(task, all),
        ConflictScope::Column => all
            .iter()
            .filter(|other| other.column_id == task.column_id)
            .any(|other| tasks_conflict(task, other)),
    }
}

/// Map the conflict flag to a display color.
#[must_use]
pub fn color_for(conflict: bool) -> TaskColor {
    if conflict {
        TaskColor::WARNING
    } else {
        TaskColor::NEUTRAL
    }
}

/// Display color of `task` checked against the whole of `all`.
#[must_use]
pub fn task_color(task: &Task, all: &[Task]) -> TaskColor {
    color_for(has_participant_conflict(task, all))
}

// ---------------------------------------------------------------------------
// ConflictIndex
// ---------------------------------------------------------------------------

/// Participant-bucketed view of a task set for repeated conflict queries.
///
/// Each participant maps to the tasks it attends, so a query only compares
/// against tasks that could possibly share a participant.
#[derive(Debug)]
pub struct ConflictIndex<'a> {
    tasks: &'a [Task],
    by_participant: AHashMap<&'a ParticipantId, Vec<usize>>,
}

impl<'a> ConflictIndex<'a> {
    /// Index every task in `tasks`.
    #[must_use]
    pub fn build(tasks: &'a [Task]) -> Self {
        let mut by_participant: AHashMap<&'a ParticipantId, Vec<usize>> = AHashMap::new();
        for (idx, task) in tasks.iter().enumerate() {
            for participant in &task.participants {
                by_participant.entry(participant).or_default().push(idx);
            }
        }
        Self {
            tasks,
            by_participant,
        }
    }

    /// Number of indexed tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the index holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether `task` conflicts with any indexed task.
    ///
    /// `task` does not need to be part of the index.
    #[must_use]
    pub fn has_conflict(&self, task: &Task) -> bool {
        task.participants.iter().any(|participant| {
            self.by_participant.get(participant).is_some_and(|bucket| {
                bucket.iter().any(|&idx| {
                    let other = &self.tasks[idx];
                    other.id != task.id
                        && time_ranges_overlap(task.start(), task.end(), other.start(), other.end())
                })
            })
        })
    }

    /// Color of `task` against the indexed set.
    #[must_use]
    pub fn color(&self, task: &Task) -> TaskColor {
        color_for(self.has_conflict(task))
    }

    /// Ids of every indexed task that conflicts with at least one other.
    #[must_use]
    pub fn conflicted_ids(&self) -> AHashSet<&'a TaskId> {
        self.tasks
            .iter()
            .filter(|task| self.has_conflict(task))
            .map(|task| &task.id)
            .collect()
    }
}
