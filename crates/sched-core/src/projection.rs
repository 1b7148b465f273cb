#![forbid(unsafe_code)]

//! Projection of stored tasks into renderable calendar events.
//!
//! Every store emission rebuilds the whole visible list for one column:
//! filter by column, color each task against the full task set, and disable
//! resizing on mobile devices. There is no incremental diffing.
//!
//! # Invariants
//!
//! 1. Colors are computed against every task in the store (see
//!    [`ConflictScope::Workspace`]), not only the filtered column.
//! 2. On [`DeviceClass::Mobile`] every projected event has
//!    [`Resizable::NONE`], whatever the stored task says.
//! 3. A refresh never reuses a previous color: after any change the list is
//!    rebuilt from scratch.

use std::collections::BTreeSet;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::color::TaskColor;
use crate::conflict::{self, ConflictIndex, ConflictScope};
use crate::logging::TARGET_PROJECTION;
use crate::task::{ColumnId, ParticipantId, Resizable, Task, TaskError, TaskId};

/// Device class reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceClass {
    #[inline]
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }

    /// Map the host's boolean "is mobile" signal.
    #[must_use]
    pub const fn from_is_mobile(is_mobile: bool) -> Self {
        if is_mobile {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    /// Resize capability granted to stored tasks on this device.
    #[must_use]
    pub const fn default_resizable(self) -> Resizable {
        if self.is_mobile() {
            Resizable::NONE
        } else {
            Resizable::BOTH
        }
    }
}

/// A task as handed to the calendar renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisualEvent {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub participants: BTreeSet<ParticipantId>,
    pub draggable: bool,
    pub resizable: Resizable,
    pub color: TaskColor,
}

impl VisualEvent {
    /// Whether this event is drawn with the conflict color.
    #[must_use]
    pub fn is_conflicted(&self) -> bool {
        self.color.is_warning()
    }
}

/// Project the tasks of `column` for rendering.
#[must_use]
pub fn project(
    column: &ColumnId,
    all: &[Task],
    device: DeviceClass,
    scope: ConflictScope,
) -> Vec<VisualEvent> {
    let column_tasks: Vec<Task>;
    let checked: &[Task] = match scope {
        ConflictScope::Workspace => all,
        ConflictScope::Column => {
            column_tasks = all
                .iter()
                .filter(|task| &task.column_id == column)
                .cloned()
                .collect();
            &column_tasks
        }
    };
    let index = ConflictIndex::build(checked);

    all.iter()
        .filter(|task| &task.column_id == column)
        .map(|task| VisualEvent {
            id: task.id.clone(),
            column_id: task.column_id.clone(),
            title: task.title.clone(),
            start: task.start(),
            end: task.end(),
            participants: task.participants.clone(),
            draggable: task.draggable,
            resizable: if device.is_mobile() {
                Resizable::NONE
            } else {
                task.resizable
            },
            color: index.color(task),
        })
        .collect()
}

/// Normalize a task before it is written to the store: neutral color,
/// draggable, and edge resizing granted according to `device`.
#[must_use]
pub fn normalize_for_store(mut task: Task, device: DeviceClass) -> Task {
    task.color = TaskColor::NEUTRAL;
    task.draggable = true;
    task.resizable = device.default_resizable();
    task
}

/// Column-scoped projection state.
#[derive(Debug, Clone)]
pub struct EventProjection {
    column: ColumnId,
    device: DeviceClass,
    scope: ConflictScope,
    events: Rc<[VisualEvent]>,
    refreshes: u64,
}

impl EventProjection {
    /// Create an empty projection for `column`.
    #[must_use]
    pub fn new(column: impl Into<ColumnId>, device: DeviceClass) -> Self {
        Self {
            column: column.into(),
            device,
            scope: ConflictScope::default(),
            events: Rc::from([]),
            refreshes: 0,
        }
    }

    /// Use a different conflict scope for subsequent refreshes.
    #[must_use]
    pub fn with_scope(mut self, scope: ConflictScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn column(&self) -> &ColumnId {
        &self.column
    }

    #[must_use]
    pub const fn device(&self) -> DeviceClass {
        self.device
    }

    #[must_use]
    pub const fn scope(&self) -> ConflictScope {
        self.scope
    }

    /// Events produced by the last refresh.
    #[must_use]
    pub fn events(&self) -> &[VisualEvent] {
        &self.events
    }

    /// Shared handle to the last refresh. A later refresh replaces the
    /// projection's list and leaves this one untouched.
    #[must_use]
    pub fn shared_events(&self) -> Rc<[VisualEvent]> {
        Rc::clone(&self.events)
    }

    /// Number of full rebuilds performed so far.
    #[must_use]
    pub const fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    /// Look up a projected event by id.
    #[must_use]
    pub fn find(&self, id: &TaskId) -> Option<&VisualEvent> {
        self.events.iter().find(|event| &event.id == id)
    }

    /// Rebuild from a fresh store emission.
    pub fn refresh(&mut self, all: &[Task]) {
        self.events = Rc::from(project(&self.column, all, self.device, self.scope));
        self.refreshes += 1;
        debug!(
            target: TARGET_PROJECTION,
            column = %self.column,
            events = self.events.len(),
            conflicted = self.events.iter().filter(|e| e.is_conflicted()).count(),
            mobile = self.device.is_mobile(),
            "projection rebuilt"
        );
    }

    /// Switch device class and rebuild.
    pub fn set_device_class(&mut self, device: DeviceClass, all: &[Task]) {
        self.device = device;
        self.refresh(all);
    }

    /// Build the write-back list after the calendar moved or resized `id`.
    ///
    /// Every event of the column comes back normalized, and the moved one
    /// carries its new times. An unknown `id` yields an empty list.
    pub fn times_changed(
        &self,
        id: &TaskId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<Vec<Task>, TaskError> {
        if self.find(id).is_none() {
            return Ok(Vec::new());
        }
        self.events
            .iter()
            .map(|event| {
                let (start, end) = if &event.id == id {
                    (new_start, new_end)
                } else {
                    (event.start, event.end)
                };
                let task = Task::new(
                    event.id.clone(),
                    self.column.clone(),
                    event.title.clone(),
                    start,
                    end,
                )?
                .with_participants(event.participants.iter().cloned());
                Ok(normalize_for_store(task, self.device))
            })
            .collect()
    }

    /// Recompute a single event's color the slow way. Used by tests and
    /// diagnostics to cross-check the indexed refresh.
    #[must_use]
    pub fn naive_color(&self, task: &Task, all: &[Task]) -> TaskColor {
        conflict::color_for(conflict::has_conflict_in_scope(task, all, self.scope))
    }
}
