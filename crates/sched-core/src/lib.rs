#![forbid(unsafe_code)]

//! Core: task model, conflict detection, and calendar event projection.
//!
//! # Role in the scheduler
//! `sched-core` owns everything that does not depend on a touch surface.
//! Tasks live in a [`store::TaskStore`]; every change to the store is
//! projected into renderable [`projection::VisualEvent`]s for one column,
//! with colors derived from the [`conflict`] engine.
//!
//! # Primary responsibilities
//! - **Task**: the scheduled item, its participants and resize capability.
//! - **ConflictEngine**: pure double-booking detection across the workspace.
//! - **EventProjection**: full-rebuild projection of a column for rendering.
//! - **ScheduleColumn**: routes drag/resize write-backs, dialog requests,
//!   and analytics for one column.
//!
//! # How it fits in the system
//! `sched-web` consumes the projected events to resolve taps and drives the
//! long-press drag handoff. This crate never touches a DOM.

pub mod analytics;
pub mod color;
pub mod config;
pub mod conflict;
pub mod logging;
pub mod projection;
pub mod schedule;
pub mod store;
pub mod task;

pub use analytics::{AnalyticsEvent, AnalyticsSink, NoopAnalytics};
pub use color::{Rgb, TaskColor};
pub use config::ScheduleConfig;
pub use conflict::{ConflictIndex, ConflictScope};
pub use projection::{DeviceClass, EventProjection, VisualEvent};
pub use schedule::{DialogMode, DialogOutcome, DialogRequest, ScheduleColumn, ScheduleError};
pub use store::{StoreError, Subscription, TaskStore};
pub use task::{ColumnId, ParticipantId, Resizable, Task, TaskError, TaskId};
