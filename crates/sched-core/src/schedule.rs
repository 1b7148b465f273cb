#![forbid(unsafe_code)]

//! One calendar column: store subscription, write-back, and dialog routing.
//!
//! [`ScheduleColumn`] keeps an [`EventProjection`] current by subscribing to
//! the [`TaskStore`], pushes drag/resize results back to the store, and turns
//! task or segment selection into [`DialogRequest`]s for the host's dialog
//! launcher. Analytics are reported through the injected sink.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::analytics::{AnalyticsEvent, AnalyticsSink, NoopAnalytics};
use crate::config::ScheduleConfig;
use crate::logging::TARGET_SCHEDULE;
use crate::projection::{DeviceClass, EventProjection, VisualEvent, normalize_for_store};
use crate::store::{StoreError, Subscription, TaskStore};
use crate::task::{ColumnId, Task, TaskError, TaskId};

/// Errors surfaced by column actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether a dialog creates a new task or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Add,
    Edit,
}

/// Payload handed to the dialog launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogRequest {
    pub mode: DialogMode,
    /// Dialog title; the task title when editing.
    pub title: Option<String>,
    /// Task prefilled in the form, already placed in this column.
    pub task: Task,
}

impl DialogRequest {
    /// Whether the dialog offers a delete action.
    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.mode == DialogMode::Edit
    }
}

/// How the user closed a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Save(Task),
    Delete(TaskId),
    Dismissed,
}

/// Controller for one displayed column.
pub struct ScheduleColumn {
    column: ColumnId,
    store: TaskStore,
    config: ScheduleConfig,
    analytics: Rc<dyn AnalyticsSink>,
    projection: Rc<RefCell<EventProjection>>,
    _subscription: Subscription,
}

impl std::fmt::Debug for ScheduleColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleColumn")
            .field("column", &self.column)
            .field("config", &self.config)
            .field("events", &self.projection.borrow().events().len())
            .finish_non_exhaustive()
    }
}

impl ScheduleColumn {
    /// Attach a column view to `store` with no-op analytics.
    #[must_use]
    pub fn new(
        column: impl Into<ColumnId>,
        store: TaskStore,
        device: DeviceClass,
        config: ScheduleConfig,
    ) -> Self {
        Self::with_analytics(column, store, device, config, Rc::new(NoopAnalytics))
    }

    /// Attach a column view to `store`, reporting to `analytics`.
    #[must_use]
    pub fn with_analytics(
        column: impl Into<ColumnId>,
        store: TaskStore,
        device: DeviceClass,
        config: ScheduleConfig,
        analytics: Rc<dyn AnalyticsSink>,
    ) -> Self {
        let column = column.into();
        let projection = Rc::new(RefCell::new(EventProjection::new(column.clone(), device)));
        store.with(|tasks| projection.borrow_mut().refresh(tasks));

        let weak = Rc::downgrade(&projection);
        let subscription = store.subscribe(move |tasks| {
            if let Some(projection) = weak.upgrade() {
                projection.borrow_mut().refresh(tasks);
            }
        });

        Self {
            column,
            store,
            config: config.validated(),
            analytics,
            projection,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn column(&self) -> &ColumnId {
        &self.column
    }

    #[must_use]
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    #[must_use]
    pub fn device(&self) -> DeviceClass {
        self.projection.borrow().device()
    }

    /// Clone of the currently projected events.
    #[must_use]
    pub fn events(&self) -> Vec<VisualEvent> {
        self.projection.borrow().events().to_vec()
    }

    /// Run `f` against the current projection without cloning it.
    ///
    /// `f` reads a snapshot and may mutate the store; the rebuild that
    /// follows does not touch the slice it holds.
    pub fn with_events<R>(&self, f: impl FnOnce(&[VisualEvent]) -> R) -> R {
        let events = self.projection.borrow().shared_events();
        f(&events)
    }

    /// React to a device-class change from the host.
    pub fn set_device_class(&self, device: DeviceClass) {
        let all = self.store.snapshot();
        self.projection.borrow_mut().set_device_class(device, &all);
    }

    /// Apply a drag or resize reported by the calendar.
    ///
    /// Every task of the column is written back, normalized, in one batch.
    pub fn event_times_changed(
        &self,
        id: &TaskId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<(), ScheduleError> {
        self.analytics.track(AnalyticsEvent::TaskDragResize);
        let updates = {
            let projection = self.projection.borrow();
            projection.times_changed(id, new_start, new_end)?
        };
        if updates.is_empty() {
            debug!(target: TARGET_SCHEDULE, task = %id, "times changed for unknown event");
            return Ok(());
        }
        info!(
            target: TARGET_SCHEDULE,
            task = %id,
            written = updates.len(),
            "event times changed"
        );
        self.store.update_many(updates)?;
        Ok(())
    }

    /// Build an edit dialog for a selected task. Unknown ids yield `None`.
    #[must_use]
    pub fn open_task(&self, id: &TaskId) -> Option<DialogRequest> {
        let event = self.projection.borrow().find(id).cloned()?;
        self.analytics.track(AnalyticsEvent::OpenEditTaskModal);
        let mut task = Task::new(
            event.id,
            self.column.clone(),
            event.title.clone(),
            event.start,
            event.end,
        )
        .ok()?
        .with_participants(event.participants);
        task.draggable = event.draggable;
        task.resizable = event.resizable;
        task.color = event.color;
        Some(DialogRequest {
            mode: DialogMode::Edit,
            title: Some(event.title),
            task,
        })
    }

    /// Build an add dialog for a click on the empty segment starting at `start`.
    pub fn open_segment(&self, start: DateTime<Utc>) -> Result<DialogRequest, ScheduleError> {
        self.analytics.track(AnalyticsEvent::OpenNewTaskModal);
        let end = start + self.config.segment_length();
        let task = Task::new(
            TaskId::generate(),
            self.column.clone(),
            String::new(),
            start,
            end,
        )?;
        Ok(DialogRequest {
            mode: DialogMode::Add,
            title: None,
            task: normalize_for_store(task, self.device()),
        })
    }

    /// Apply what the user did in a dialog opened with `mode`.
    pub fn complete_dialog(
        &self,
        mode: DialogMode,
        outcome: DialogOutcome,
    ) -> Result<(), ScheduleError> {
        match (mode, outcome) {
            (_, DialogOutcome::Dismissed) => Ok(()),
            (DialogMode::Add, DialogOutcome::Save(task)) => self.add_task(task),
            (DialogMode::Edit, DialogOutcome::Save(task)) => self.edit_task(task),
            (_, DialogOutcome::Delete(id)) => self.delete_task(&id),
        }
    }

    /// Normalize and insert a new task.
    pub fn add_task(&self, task: Task) -> Result<(), ScheduleError> {
        let task = normalize_for_store(task, self.device());
        info!(target: TARGET_SCHEDULE, task = %task.id, column = %task.column_id, "task added");
        self.store.add(task)?;
        Ok(())
    }

    /// Normalize and replace an existing task.
    pub fn edit_task(&self, task: Task) -> Result<(), ScheduleError> {
        let task = normalize_for_store(task, self.device());
        info!(target: TARGET_SCHEDULE, task = %task.id, "task edited");
        self.store.update(task)?;
        Ok(())
    }

    /// Remove a task.
    pub fn delete_task(&self, id: &TaskId) -> Result<(), ScheduleError> {
        info!(target: TARGET_SCHEDULE, task = %id, "task deleted");
        self.store.delete(id)?;
        Ok(())
    }
}
