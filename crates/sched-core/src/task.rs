#![forbid(unsafe_code)]

//! Task model.
//!
//! A [`Task`] is a time-boxed item placed in one column and attended by a
//! set of participants. The store owns tasks; everything else reads them.
//!
//! # Invariants
//!
//! 1. `start < end` for every constructed task.
//! 2. Participant order is irrelevant: the set is kept sorted, so two tasks
//!    built from the same participants in different orders compare equal.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::color::TaskColor;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The raw identifier.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Unique task identifier.
    TaskId
);
string_id!(
    /// Identifier of the column (room, track) a task is placed in.
    ColumnId
);
string_id!(
    /// Identifier of a person assigned to tasks.
    ParticipantId
);

impl TaskId {
    /// Fresh random identifier for a task created from the UI.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Which edges of an event may be dragged to resize it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resizable {
    pub before_start: bool,
    pub after_end: bool,
}

impl Resizable {
    /// Neither edge resizable.
    pub const NONE: Self = Self {
        before_start: false,
        after_end: false,
    };

    /// Both edges resizable.
    pub const BOTH: Self = Self {
        before_start: true,
        after_end: true,
    };

    /// Whether any edge is resizable.
    #[inline]
    #[must_use]
    pub const fn any(self) -> bool {
        self.before_start || self.after_end
    }
}

/// Errors raised when building or moving a task.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task {id}: start {start} is not before end {end}")]
    InvalidTimeRange {
        id: TaskId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A scheduled item.
///
/// Deserialization re-runs the `start < end` check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawTask"))]
pub struct Task {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    pub participants: BTreeSet<ParticipantId>,
    pub draggable: bool,
    pub resizable: Resizable,
    pub color: TaskColor,
}

impl Task {
    /// Build a draggable, fully resizable task with the neutral color.
    pub fn new(
        id: impl Into<TaskId>,
        column_id: impl Into<ColumnId>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, TaskError> {
        let id = id.into();
        check_range(&id, start, end)?;
        Ok(Self {
            id,
            column_id: column_id.into(),
            title: title.into(),
            start,
            end,
            participants: BTreeSet::new(),
            draggable: true,
            resizable: Resizable::BOTH,
            color: TaskColor::NEUTRAL,
        })
    }

    /// Replace the participant set.
    #[must_use]
    pub fn with_participants<I, P>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        self.participants = participants.into_iter().map(Into::into).collect();
        self
    }

    /// Move or resize the task, re-checking `start < end`.
    pub fn with_times(
        mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, TaskError> {
        check_range(&self.id, start, end)?;
        self.start = start;
        self.end = end;
        Ok(self)
    }

    #[inline]
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[inline]
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `participant` is assigned to this task.
    #[must_use]
    pub fn has_participant(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }
}

/// Wire form of [`Task`] before range validation.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawTask {
    id: TaskId,
    column_id: ColumnId,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    participants: BTreeSet<ParticipantId>,
    draggable: bool,
    resizable: Resizable,
    color: TaskColor,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTask> for Task {
    type Error = TaskError;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        check_range(&raw.id, raw.start, raw.end)?;
        Ok(Self {
            id: raw.id,
            column_id: raw.column_id,
            title: raw.title,
            start: raw.start,
            end: raw.end,
            participants: raw.participants,
            draggable: raw.draggable,
            resizable: raw.resizable,
            color: raw.color,
        })
    }
}

fn check_range(id: &TaskId, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), TaskError> {
    if start < end {
        Ok(())
    } else {
        Err(TaskError::InvalidTimeRange {
            id: id.clone(),
            start,
            end,
        })
    }
}
