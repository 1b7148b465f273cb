#![forbid(unsafe_code)]

//! Fire-and-forget usage analytics.
//!
//! The scheduler reports a handful of interaction events to an injected
//! [`AnalyticsSink`]. Sinks are best-effort: `track` returns nothing and
//! must not panic, so a missing or failing backend never changes control
//! flow. [`NoopAnalytics`] is the default.

use std::fmt;

/// An interaction worth counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsEvent {
    /// An event was dragged or resized on the calendar.
    TaskDragResize,
    /// The "new task" dialog was opened from an empty segment.
    OpenNewTaskModal,
    /// The "edit task" dialog was opened from a task.
    OpenEditTaskModal,
}

impl AnalyticsEvent {
    /// Stable name sent to the analytics backend.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TaskDragResize => "task-drag-resize",
            Self::OpenNewTaskModal => "open-new-task-modal",
            Self::OpenEditTaskModal => "open-edit-task-modal",
        }
    }
}

impl fmt::Display for AnalyticsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receiver of analytics events.
pub trait AnalyticsSink {
    fn track(&self, event: AnalyticsEvent);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn track(&self, _event: AnalyticsEvent) {}
}

impl<S: AnalyticsSink + ?Sized> AnalyticsSink for std::rc::Rc<S> {
    fn track(&self, event: AnalyticsEvent) {
        (**self).track(event);
    }
}
