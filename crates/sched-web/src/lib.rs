#![forbid(unsafe_code)]

//! `sched-web` is the touch layer of the column scheduler.
//!
//! Design goals:
//! - **Host-driven input**: the embedding page forwards raw touch events and
//!   applies the returned [`touch::Propagation`].
//! - **Deterministic time**: every entry point takes `now`; timers only fire
//!   from [`gesture::GestureRecognizer::poll`].
//! - **No DOM binding**: the document is reached through
//!   [`surface::CalendarSurface`], so the recognizer runs unchanged in tests.
//!
//! Tap resolution yields a [`gesture::GestureAction::TaskSelected`] that the
//! host feeds to `sched_core::ScheduleColumn::open_task`.

pub mod gesture;
pub mod surface;
pub mod synth;
pub mod touch;

pub use gesture::{
    GestureAction, GestureConfig, GestureIgnoredReason, GestureOutcome, GesturePhase,
    GestureRecognizer, GestureState, TouchDispatch,
};
#[cfg(any(test, feature = "test-helpers"))]
pub use surface::MemorySurface;
pub use surface::{CalendarSurface, ElementId, EventMarks};
pub use synth::{SyntheticTouch, SyntheticTouchEvent, SyntheticTouchKind, TouchEventSynthesizer};
pub use touch::{NodeId, Point, Propagation, RawTouchEvent, TouchPoint};
