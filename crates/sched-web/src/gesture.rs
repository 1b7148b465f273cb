#![forbid(unsafe_code)]

//! Touch gesture recognition for calendar events: tap, scroll, or
//! long-press then drag.
//!
//! [`GestureRecognizer`] sits in front of an external drag library. It sees
//! every raw touch first (the host registers it in the capturing phase) and
//! decides, per touch sequence, who owns the interaction:
//!
//! - a short, stationary contact is a **tap** and raises
//!   [`GestureAction::TaskSelected`];
//! - moving past the tolerance before the long-press delay is a **scroll**
//!   and the browser keeps the gesture;
//! - holding still until the delay elapses **unlocks dragging**: the element
//!   is marked, a haptic pulse fires, and a synthetic start/move pair hands
//!   the gesture to the drag library.
//!
//! # State Machine
//!
//! ```text
//! Idle ──start──▶ AwaitingLongPress ──timer──▶ Dragging
//!                   │        │
//!                   │        └──move > tolerance──▶ Scrolling
//!                   └──end (short, still)──▶ TapResolved
//! any ──end/cancel/cleanup──▶ Idle
//! ```
//!
//! Time is host-driven. The recognizer never sleeps; the host calls
//! [`GestureRecognizer::poll`] once [`GestureRecognizer::next_deadline`]
//! has passed, which fires the long-press timer and the synthesizer's
//! delayed move.
//!
//! # Invariants
//!
//! 1. At most one gesture is tracked; at most one long-press deadline is
//!    pending.
//! 2. A tap and a drag handoff never both happen in one sequence.
//! 3. Once the synthetic start is dispatched the gesture stays `Dragging`
//!    until end/cancel/cleanup.
//! 4. Cleanup is idempotent: it leaves `Idle`, no deadline, and no marks on
//!    any element.
//!
//! # Failure Modes
//!
//! Every failed lookup (no event element under the finger, no task behind
//! the element, no touch point) yields an [`GestureOutcome::Ignored`]
//! dispatch and leaves the gesture state as it was.

use std::time::Duration;

use tracing::{debug, trace};
use web_time::Instant;

use sched_core::logging::TARGET_GESTURE;
use sched_core::{TaskId, VisualEvent};

use crate::surface::{
    CalendarSurface, ElementId, EventMarks, resolve_task_id, strip_all_marks,
    strip_marks_everywhere,
};
use crate::synth::TouchEventSynthesizer;
use crate::touch::{Propagation, RawTouchEvent, TouchPoint};

const MAX_DELAY: Duration = Duration::from_secs(10);
const MIN_DELAY: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds and timeouts for touch disambiguation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Stationary hold that unlocks dragging (default: 500ms).
    pub long_press_delay: Duration,
    /// Per-axis movement in px that turns a hold into a scroll (default: 10).
    pub move_tolerance: f64,
    /// Longest contact still classified as a tap (default: 500ms).
    pub tap_max_duration: Duration,
    /// Gap between the synthetic start and move (default: 10ms).
    pub synthetic_move_delay: Duration,
    /// Haptic pulse length on drag unlock (default: 50ms).
    pub haptic_pulse: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_delay: Duration::from_millis(500),
            move_tolerance: 10.0,
            tap_max_duration: Duration::from_millis(500),
            synthetic_move_delay: Duration::from_millis(10),
            haptic_pulse: Duration::from_millis(50),
        }
    }
}

impl GestureConfig {
    /// Load overrides from environment variables.
    ///
    /// Reads:
    /// - `SCHED_LONG_PRESS_MS`
    /// - `SCHED_MOVE_TOLERANCE_PX`
    /// - `SCHED_TAP_MAX_MS`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    #[must_use]
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        if let Some(delay) = millis("SCHED_LONG_PRESS_MS") {
            config.long_press_delay = delay;
        }
        let tolerance = lookup("SCHED_MOVE_TOLERANCE_PX")
            .and_then(|v| v.trim().parse::<f64>().ok());
        if let Some(px) = tolerance {
            config.move_tolerance = px;
        }
        if let Some(max) = millis("SCHED_TAP_MAX_MS") {
            config.tap_max_duration = max;
        }
        config.validated()
    }

    /// Clamp timings to 1ms-10s; a negative or non-finite tolerance falls
    /// back to the default.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.long_press_delay = self.long_press_delay.clamp(MIN_DELAY, MAX_DELAY);
        self.tap_max_duration = self.tap_max_duration.clamp(MIN_DELAY, MAX_DELAY);
        self.synthetic_move_delay = self.synthetic_move_delay.min(MAX_DELAY);
        self.haptic_pulse = self.haptic_pulse.min(MAX_DELAY);
        if !self.move_tolerance.is_finite() || self.move_tolerance < 0.0 {
            self.move_tolerance = Self::default().move_tolerance;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Phase of the tracked touch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    AwaitingLongPress,
    /// Handed off to the drag library.
    Dragging,
    /// Browser scroll owns the sequence.
    Scrolling,
    TapResolved,
}

impl GesturePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingLongPress => "awaiting_long_press",
            Self::Dragging => "dragging",
            Self::Scrolling => "scrolling",
            Self::TapResolved => "tap_resolved",
        }
    }
}

/// Per-sequence tracking record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureState {
    pub phase: GesturePhase,
    /// Where the finger landed.
    pub origin: Option<TouchPoint>,
    pub started_at: Option<Instant>,
    pub element: Option<ElementId>,
    pub task_id: Option<TaskId>,
    /// Pending long-press timer.
    pub long_press_deadline: Option<Instant>,
}

// ---------------------------------------------------------------------------
// Dispatch records
// ---------------------------------------------------------------------------

/// Which entry point produced a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchInput {
    Start,
    Move,
    End,
    Cancel,
    Timer,
    Cleanup,
}

/// Why an input left the gesture untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureIgnoredReason {
    /// Target is not inside a calendar event.
    NoEventElement,
    /// The element already belongs to the drag library.
    DragInFlight,
    /// No task could be matched to the element.
    UnresolvedTask,
    /// Another touch sequence is still awaiting its long press.
    GestureInProgress,
    NoTouchPoint,
    NoActiveGesture,
    Scrolling,
}

/// Result category of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Ignored(GestureIgnoredReason),
    /// Long-press timer armed.
    Armed,
    /// Movement within tolerance while the timer runs.
    Tracking,
    ScrollDetected,
    TapResolved,
    /// Contact ended while pending but was too long or moved too far.
    TapRejected,
    DragActivated,
    /// Synthetic follow-up move dispatched.
    HandoffCompleted,
    CleanedUp,
}

/// Action for collaborators outside the gesture layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureAction {
    /// A tap landed on this event; open its dialog.
    TaskSelected(VisualEvent),
}

/// Structured log record for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureLogEntry {
    pub sequence: u64,
    pub input: TouchInput,
    /// Phase reached by this dispatch.
    pub phase: GesturePhase,
    pub element: Option<ElementId>,
}

/// Result of one recognizer entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchDispatch {
    pub propagation: Propagation,
    pub outcome: GestureOutcome,
    pub action: Option<GestureAction>,
    pub log: GestureLogEntry,
}

impl TouchDispatch {
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self.outcome, GestureOutcome::Ignored(_))
    }

    /// The selected event, if this dispatch resolved a tap on a known task.
    #[must_use]
    pub fn selected(&self) -> Option<&VisualEvent> {
        match &self.action {
            Some(GestureAction::TaskSelected(event)) => Some(event),
            None => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GestureRecognizer
// ---------------------------------------------------------------------------

/// Single-pointer touch recognizer for a calendar column.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    state: GestureState,
    synth: TouchEventSynthesizer,
    next_sequence: u64,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureRecognizer {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        let config = config.validated();
        Self {
            config,
            state: GestureState::default(),
            synth: TouchEventSynthesizer::new(config.synthetic_move_delay),
            next_sequence: 1,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GestureConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> GesturePhase {
        self.state.phase
    }

    #[must_use]
    pub const fn state(&self) -> &GestureState {
        &self.state
    }

    #[must_use]
    pub const fn synthesizer(&self) -> &TouchEventSynthesizer {
        &self.synth
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.state.long_press_deadline, self.synth.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Handle `touchstart` on the calendar container.
    pub fn touch_start<S: CalendarSurface + ?Sized>(
        &mut self,
        event: &RawTouchEvent,
        now: Instant,
        surface: &mut S,
        events: &[VisualEvent],
    ) -> TouchDispatch {
        let Some(element) = surface.closest_event(event.target) else {
            return self.ignored(
                TouchInput::Start,
                GestureIgnoredReason::NoEventElement,
                None,
                Propagation::Continue,
            );
        };
        match self.state.phase {
            GesturePhase::Dragging if surface.is_drag_allowed(element) => {
                return self.ignored(
                    TouchInput::Start,
                    GestureIgnoredReason::DragInFlight,
                    Some(element),
                    Propagation::Continue,
                );
            }
            GesturePhase::AwaitingLongPress => {
                return self.ignored(
                    TouchInput::Start,
                    GestureIgnoredReason::GestureInProgress,
                    Some(element),
                    Propagation::Stop,
                );
            }
            GesturePhase::Idle => {}
            // The previous sequence never delivered its end.
            GesturePhase::Dragging | GesturePhase::Scrolling | GesturePhase::TapResolved => {
                self.clear(surface);
            }
        }

        // From here on the drag library must not see this start.
        let Some(touch) = event.primary_touch().copied() else {
            return self.ignored(
                TouchInput::Start,
                GestureIgnoredReason::NoTouchPoint,
                Some(element),
                Propagation::Stop,
            );
        };
        let Some(task_id) = resolve_task_id(surface, element, events) else {
            return self.ignored(
                TouchInput::Start,
                GestureIgnoredReason::UnresolvedTask,
                Some(element),
                Propagation::Stop,
            );
        };

        surface.add_marks(element, EventMarks::WAITING);
        self.state = GestureState {
            phase: GesturePhase::AwaitingLongPress,
            origin: Some(touch),
            started_at: Some(now),
            element: Some(element),
            task_id: Some(task_id),
            long_press_deadline: Some(now + self.config.long_press_delay),
        };
        self.record(
            TouchInput::Start,
            GestureOutcome::Armed,
            Propagation::Stop,
            None,
        )
    }

    /// Handle `touchmove` on the calendar container.
    pub fn touch_move<S: CalendarSurface + ?Sized>(
        &mut self,
        event: &RawTouchEvent,
        _now: Instant,
        surface: &mut S,
        _events: &[VisualEvent],
    ) -> TouchDispatch {
        let Some(element) = surface.closest_event(event.target) else {
            return self.ignored(
                TouchInput::Move,
                GestureIgnoredReason::NoEventElement,
                None,
                Propagation::Continue,
            );
        };
        let reason = match self.state.phase {
            GesturePhase::AwaitingLongPress => None,
            GesturePhase::Dragging => Some(GestureIgnoredReason::DragInFlight),
            GesturePhase::Scrolling => Some(GestureIgnoredReason::Scrolling),
            GesturePhase::Idle | GesturePhase::TapResolved => {
                Some(GestureIgnoredReason::NoActiveGesture)
            }
        };
        if let Some(reason) = reason {
            return self.ignored(
                TouchInput::Move,
                reason,
                Some(element),
                Propagation::Continue,
            );
        }
        let Some(origin) = self.state.origin else {
            return self.ignored(
                TouchInput::Move,
                GestureIgnoredReason::NoActiveGesture,
                Some(element),
                Propagation::Continue,
            );
        };
        let Some(touch) = event.primary_touch() else {
            return self.ignored(
                TouchInput::Move,
                GestureIgnoredReason::NoTouchPoint,
                Some(element),
                Propagation::Continue,
            );
        };

        let (dx, dy) = touch.client.axis_delta(origin.client);
        let tolerance = self.config.move_tolerance;
        if dx > tolerance || dy > tolerance {
            let tracked = self.state.element.unwrap_or(element);
            surface.remove_marks(tracked, EventMarks::WAITING | EventMarks::ACTIVE);
            self.state.long_press_deadline = None;
            self.state.task_id = None;
            self.state.phase = GesturePhase::Scrolling;
            return self.record(
                TouchInput::Move,
                GestureOutcome::ScrollDetected,
                Propagation::Continue,
                None,
            );
        }
        self.record(
            TouchInput::Move,
            GestureOutcome::Tracking,
            Propagation::Stop,
            None,
        )
    }

    /// Handle `touchend` on the calendar container.
    pub fn touch_end<S: CalendarSurface + ?Sized>(
        &mut self,
        event: &RawTouchEvent,
        now: Instant,
        surface: &mut S,
        events: &[VisualEvent],
    ) -> TouchDispatch {
        if self.state.phase != GesturePhase::AwaitingLongPress {
            self.clear(surface);
            return self.record(
                TouchInput::End,
                GestureOutcome::CleanedUp,
                Propagation::Continue,
                None,
            );
        }

        let elapsed = self
            .state
            .started_at
            .map_or(Duration::MAX, |start| now.saturating_duration_since(start));
        let lifted = event.primary_changed().or_else(|| event.primary_touch());
        let tolerance = self.config.move_tolerance;
        let stayed_still = match (lifted, self.state.origin) {
            (Some(touch), Some(origin)) => {
                let (dx, dy) = touch.client.axis_delta(origin.client);
                dx < tolerance && dy < tolerance
            }
            _ => false,
        };

        if elapsed < self.config.tap_max_duration && stayed_still {
            self.state.long_press_deadline = None;
            self.state.phase = GesturePhase::TapResolved;
            let selected = self
                .state
                .task_id
                .as_ref()
                .and_then(|id| events.iter().find(|e| &e.id == id))
                .cloned();
            if selected.is_none() {
                debug!(
                    target: TARGET_GESTURE,
                    task = ?self.state.task_id,
                    "tapped task no longer projected"
                );
            }
            let dispatch = self.record(
                TouchInput::End,
                GestureOutcome::TapResolved,
                Propagation::Continue,
                selected.map(GestureAction::TaskSelected),
            );
            self.clear(surface);
            return dispatch;
        }

        strip_marks_everywhere(surface, EventMarks::WAITING);
        let dispatch = self.record(
            TouchInput::End,
            GestureOutcome::TapRejected,
            Propagation::Continue,
            None,
        );
        self.state = GestureState::default();
        dispatch
    }

    /// Handle `touchcancel`: abandon the gesture.
    pub fn touch_cancel<S: CalendarSurface + ?Sized>(&mut self, surface: &mut S) -> TouchDispatch {
        self.clear(surface);
        self.record(
            TouchInput::Cancel,
            GestureOutcome::CleanedUp,
            Propagation::Continue,
            None,
        )
    }

    /// Reset to `Idle`, drop every timer and strip every mark. Idempotent.
    pub fn cleanup<S: CalendarSurface + ?Sized>(&mut self, surface: &mut S) -> TouchDispatch {
        self.clear(surface);
        self.record(
            TouchInput::Cleanup,
            GestureOutcome::CleanedUp,
            Propagation::Continue,
            None,
        )
    }

    /// Fire whatever timer is due at `now`.
    ///
    /// Returns `None` when nothing was due.
    pub fn poll<S: CalendarSurface + ?Sized>(
        &mut self,
        now: Instant,
        surface: &mut S,
    ) -> Option<TouchDispatch> {
        if self.state.phase == GesturePhase::AwaitingLongPress
            && self.state.long_press_deadline.is_some_and(|due| now >= due)
        {
            return Some(self.activate_drag(now, surface));
        }
        if self.synth.poll(now, surface) {
            return Some(self.record(
                TouchInput::Timer,
                GestureOutcome::HandoffCompleted,
                Propagation::Continue,
                None,
            ));
        }
        None
    }

    fn activate_drag<S: CalendarSurface + ?Sized>(
        &mut self,
        now: Instant,
        surface: &mut S,
    ) -> TouchDispatch {
        self.state.long_press_deadline = None;
        let (Some(element), Some(origin)) = (self.state.element, self.state.origin) else {
            self.clear(surface);
            return self.ignored(
                TouchInput::Timer,
                GestureIgnoredReason::NoActiveGesture,
                None,
                Propagation::Continue,
            );
        };

        surface.remove_marks(element, EventMarks::WAITING);
        surface.add_marks(element, EventMarks::ACTIVE | EventMarks::DRAG_ENABLED);
        surface.set_drag_allowed(element);
        let haptic = surface.vibrate(self.config.haptic_pulse);
        self.state.phase = GesturePhase::Dragging;
        self.synth.begin(element, &origin, now, surface);
        debug!(target: TARGET_GESTURE, element = element.0, haptic, "long press unlocked drag");
        self.record(
            TouchInput::Timer,
            GestureOutcome::DragActivated,
            Propagation::Continue,
            None,
        )
    }

    fn clear<S: CalendarSurface + ?Sized>(&mut self, surface: &mut S) {
        self.synth.cancel();
        strip_all_marks(surface);
        self.state = GestureState::default();
    }

    fn ignored(
        &mut self,
        input: TouchInput,
        reason: GestureIgnoredReason,
        element: Option<ElementId>,
        propagation: Propagation,
    ) -> TouchDispatch {
        let sequence = self.bump_sequence();
        trace!(
            target: TARGET_GESTURE,
            sequence,
            input = ?input,
            reason = ?reason,
            phase = self.state.phase.as_str(),
            "touch ignored"
        );
        TouchDispatch {
            propagation,
            outcome: GestureOutcome::Ignored(reason),
            action: None,
            log: GestureLogEntry {
                sequence,
                input,
                phase: self.state.phase,
                element,
            },
        }
    }

    fn record(
        &mut self,
        input: TouchInput,
        outcome: GestureOutcome,
        propagation: Propagation,
        action: Option<GestureAction>,
    ) -> TouchDispatch {
        let sequence = self.bump_sequence();
        let log = GestureLogEntry {
            sequence,
            input,
            phase: self.state.phase,
            element: self.state.element,
        };
        debug!(
            target: TARGET_GESTURE,
            sequence,
            input = ?input,
            outcome = ?outcome,
            phase = log.phase.as_str(),
            element = log.element.map(|e| e.0),
            stopped = propagation.is_stopped(),
            "gesture transition"
        );
        TouchDispatch {
            propagation,
            outcome,
            action,
            log,
        }
    }

    fn bump_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        sequence
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;
    use crate::synth::SyntheticTouchKind;
    use crate::touch::{NodeId, Point};
    use chrono::{TimeZone, Utc};
    use sched_core::projection::project;
    use sched_core::{ConflictScope, DeviceClass, Task};
    use std::collections::HashMap;

    const MS_10: Duration = Duration::from_millis(10);
    const MS_100: Duration = Duration::from_millis(100);
    const MS_200: Duration = Duration::from_millis(200);
    const MS_500: Duration = Duration::from_millis(500);
    const MS_510: Duration = Duration::from_millis(510);
    const MS_600: Duration = Duration::from_millis(600);

    struct Fixture {
        gr: GestureRecognizer,
        surface: MemorySurface,
        events: Vec<VisualEvent>,
        standup: ElementId,
        node: NodeId,
        t: Instant,
    }

    fn fixture() -> Fixture {
        let start = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
        let tasks = vec![
            Task::new("standup", "room-1", "Standup", start, end)
                .unwrap(),
            Task::new("review", "room-1", "Review", start, end).unwrap(),
        ];
        let events = project(
            &"room-1".into(),
            &tasks,
            DeviceClass::Mobile,
            ConflictScope::Workspace,
        );
        let mut surface = MemorySurface::new();
        let standup = surface.add_event("Standup 09:00 - 10:00");
        surface.add_event("Review 09:00 - 10:00");
        let node = surface.add_child(standup);
        Fixture {
            gr: GestureRecognizer::default(),
            surface,
            events,
            standup,
            node,
            t: Instant::now(),
        }
    }

    fn touch(x: f64, y: f64) -> TouchPoint {
        TouchPoint::at(0, Point::new(x, y))
    }

    impl Fixture {
        fn start(&mut self, x: f64, y: f64, at: Duration) -> TouchDispatch {
            let event = RawTouchEvent::contact(self.node, touch(x, y));
            self.gr.touch_start(&event, self.t + at, &mut self.surface, &self.events)
        }

        fn moved(&mut self, x: f64, y: f64, at: Duration) -> TouchDispatch {
            let event = RawTouchEvent::contact(self.node, touch(x, y));
            self.gr.touch_move(&event, self.t + at, &mut self.surface, &self.events)
        }

        fn end(&mut self, x: f64, y: f64, at: Duration) -> TouchDispatch {
            let event = RawTouchEvent::lift(self.node, touch(x, y));
            self.gr.touch_end(&event, self.t + at, &mut self.surface, &self.events)
        }

        fn poll(&mut self, at: Duration) -> Option<TouchDispatch> {
            self.gr.poll(self.t + at, &mut self.surface)
        }
    }

    // --- Tap ---

    #[test]
    fn tap_selects_task_without_synthesis() {
        let mut f = fixture();
        let start = f.start(100.0, 100.0, Duration::ZERO);
        assert_eq!(start.outcome, GestureOutcome::Armed);
        assert_eq!(start.propagation, Propagation::Stop);
        assert_eq!(f.surface.marks(f.standup), EventMarks::WAITING);
        assert!(f.poll(MS_100).is_none());

        let end = f.end(102.0, 101.0, MS_200);
        assert_eq!(end.outcome, GestureOutcome::TapResolved);
        assert_eq!(end.log.phase, GesturePhase::TapResolved);
        assert_eq!(end.selected().map(|e| e.id.as_str()), Some("standup"));

        assert!(f.surface.dispatched().is_empty());
        assert!(f.surface.is_clean());
        assert_eq!(f.gr.phase(), GesturePhase::Idle);
        assert!(f.poll(MS_600).is_none());
    }

    #[test]
    fn tap_at_tolerance_is_rejected() {
        // Tap test is strict: exactly 10 px is not "under" the tolerance.
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        let end = f.end(110.0, 100.0, MS_100);
        assert_eq!(end.outcome, GestureOutcome::TapRejected);
        assert!(end.action.is_none());
        assert!(f.surface.is_clean());
    }

    #[test]
    fn slow_release_before_timer_is_rejected() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        // Host did not get to poll before the finger lifted.
        let end = f.end(100.0, 100.0, MS_500);
        assert_eq!(end.outcome, GestureOutcome::TapRejected);
        assert!(end.action.is_none());
        assert_eq!(f.gr.phase(), GesturePhase::Idle);
        assert!(f.gr.next_deadline().is_none());
        assert!(f.poll(MS_600).is_none());
        assert!(f.surface.dispatched().is_empty());
    }

    #[test]
    fn tap_on_vanished_task_fires_no_action() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        f.events.clear();
        let end = f.end(100.0, 100.0, MS_100);
        assert_eq!(end.outcome, GestureOutcome::TapResolved);
        assert!(end.action.is_none());
    }

    // --- Long press ---

    #[test]
    fn long_press_hands_off_to_drag_library() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        assert_eq!(f.gr.next_deadline(), Some(f.t + MS_500));

        assert!(f.poll(Duration::from_millis(499)).is_none());
        let fired = f.poll(MS_500).unwrap();
        assert_eq!(fired.outcome, GestureOutcome::DragActivated);
        assert_eq!(f.gr.phase(), GesturePhase::Dragging);
        assert_eq!(
            f.surface.marks(f.standup),
            EventMarks::ACTIVE | EventMarks::DRAG_ENABLED
        );
        assert!(f.surface.is_drag_allowed(f.standup));
        assert_eq!(f.surface.vibrations(), &[Duration::from_millis(50)]);

        let sent = f.surface.dispatched();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, SyntheticTouchKind::Start);
        assert_eq!(sent[0].touch().unwrap().client, Point::new(100.0, 100.0));

        assert_eq!(f.gr.next_deadline(), Some(f.t + MS_510));
        let handoff = f.poll(MS_510).unwrap();
        assert_eq!(handoff.outcome, GestureOutcome::HandoffCompleted);
        let sent = f.surface.dispatched();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].kind, SyntheticTouchKind::Move);
        assert_eq!(sent[1].touch().unwrap().client, Point::new(101.0, 101.0));
        assert!(f.poll(MS_600).is_none());
    }

    #[test]
    fn drag_in_flight_input_passes_through() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        f.poll(MS_500);

        // The synthetic start re-enters the container listener.
        let again = f.start(100.0, 100.0, MS_500);
        assert_eq!(
            again.outcome,
            GestureOutcome::Ignored(GestureIgnoredReason::DragInFlight)
        );
        assert_eq!(again.propagation, Propagation::Continue);
        let moved = f.moved(180.0, 240.0, MS_600);
        assert_eq!(
            moved.outcome,
            GestureOutcome::Ignored(GestureIgnoredReason::DragInFlight)
        );
        assert_eq!(moved.propagation, Propagation::Continue);

        let end = f.end(180.0, 240.0, Duration::from_millis(900));
        assert_eq!(end.outcome, GestureOutcome::CleanedUp);
        assert!(end.action.is_none());
        assert!(f.surface.is_clean());
        assert_eq!(f.gr.phase(), GesturePhase::Idle);
    }

    #[test]
    fn release_before_synthetic_move_drops_it() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        f.poll(MS_500);
        f.end(100.0, 100.0, Duration::from_millis(505));
        assert!(f.poll(MS_510).is_none());
        assert_eq!(f.surface.dispatched().len(), 1);
    }

    #[test]
    fn missing_haptics_does_not_block_drag() {
        let mut f = fixture();
        f.surface.set_haptics(false);
        f.start(100.0, 100.0, Duration::ZERO);
        assert_eq!(
            f.poll(MS_500).unwrap().outcome,
            GestureOutcome::DragActivated
        );
        assert!(f.surface.vibrations().is_empty());
    }

    // --- Scroll ---

    #[test]
    fn scroll_cancels_long_press() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        let moved = f.moved(115.0, 100.0, MS_100);
        assert_eq!(moved.outcome, GestureOutcome::ScrollDetected);
        assert_eq!(moved.propagation, Propagation::Continue);
        assert_eq!(f.gr.phase(), GesturePhase::Scrolling);
        assert!(f.gr.state().task_id.is_none());
        assert!(f.gr.next_deadline().is_none());
        assert!(f.surface.is_clean());

        assert!(f.poll(MS_600).is_none());
        let later = f.moved(100.0, 100.0, Duration::from_millis(700));
        assert_eq!(
            later.outcome,
            GestureOutcome::Ignored(GestureIgnoredReason::Scrolling)
        );
        f.end(100.0, 100.0, Duration::from_millis(800));
        assert!(f.surface.dispatched().is_empty());
        assert_eq!(f.gr.phase(), GesturePhase::Idle);
    }

    #[test]
    fn small_moves_keep_suppressing_propagation() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        let moved = f.moved(108.0, 92.0, MS_100);
        assert_eq!(moved.outcome, GestureOutcome::Tracking);
        assert_eq!(moved.propagation, Propagation::Stop);
        // Exactly the tolerance is not a scroll.
        let moved = f.moved(110.0, 90.0, MS_200);
        assert_eq!(moved.outcome, GestureOutcome::Tracking);
        assert_eq!(
            f.poll(MS_500).unwrap().outcome,
            GestureOutcome::DragActivated
        );
    }

    #[test]
    fn vertical_displacement_alone_scrolls() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        assert_eq!(
            f.moved(100.0, 88.5, MS_10).outcome,
            GestureOutcome::ScrollDetected
        );
    }

    // --- Ignored inputs ---

    #[test]
    fn start_outside_events_is_noop() {
        let mut f = fixture();
        let outside = f.surface.add_background();
        let event = RawTouchEvent::contact(outside, touch(5.0, 5.0));
        let dispatch = f.gr.touch_start(&event, f.t, &mut f.surface, &f.events);
        assert_eq!(
            dispatch.outcome,
            GestureOutcome::Ignored(GestureIgnoredReason::NoEventElement)
        );
        assert_eq!(dispatch.propagation, Propagation::Continue);
        assert_eq!(f.gr.phase(), GesturePhase::Idle);
    }

    #[test]
    fn unresolved_task_aborts_silently_but_stops_propagation() {
        let mut f = fixture();
        let lunch = f.surface.add_event("Lunch");
        let event = RawTouchEvent::contact(MemorySurface::node_of(lunch), touch(5.0, 5.0));
        let dispatch = f.gr.touch_start(&event, f.t, &mut f.surface, &f.events);
        assert_eq!(
            dispatch.outcome,
            GestureOutcome::Ignored(GestureIgnoredReason::UnresolvedTask)
        );
        assert_eq!(dispatch.propagation, Propagation::Stop);
        assert!(f.surface.is_clean());
        assert!(f.gr.next_deadline().is_none());
    }

    #[test]
    fn second_start_while_pending_is_ignored() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        let second = f.start(300.0, 300.0, MS_100);
        assert_eq!(
            second.outcome,
            GestureOutcome::Ignored(GestureIgnoredReason::GestureInProgress)
        );
        assert_eq!(
            f.gr.state().origin.map(|t| t.client),
            Some(Point::new(100.0, 100.0))
        );
        assert_eq!(f.gr.next_deadline(), Some(f.t + MS_500));
    }

    #[test]
    fn move_without_gesture_is_ignored() {
        let mut f = fixture();
        let moved = f.moved(150.0, 150.0, MS_100);
        assert_eq!(
            moved.outcome,
            GestureOutcome::Ignored(GestureIgnoredReason::NoActiveGesture)
        );
        assert_eq!(f.gr.phase(), GesturePhase::Idle);
    }

    // --- Cleanup ---

    #[test]
    fn cleanup_is_idempotent() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        f.poll(MS_500);

        f.gr.cleanup(&mut f.surface);
        let first = f.gr.state().clone();
        f.gr.cleanup(&mut f.surface);
        assert_eq!(f.gr.state(), &first);
        assert_eq!(first, GestureState::default());
        assert!(f.surface.is_clean());
        assert!(f.gr.next_deadline().is_none());
    }

    #[test]
    fn cancel_abandons_pending_gesture() {
        let mut f = fixture();
        f.start(100.0, 100.0, Duration::ZERO);
        let dispatch = f.gr.touch_cancel(&mut f.surface);
        assert_eq!(dispatch.outcome, GestureOutcome::CleanedUp);
        assert!(f.poll(MS_600).is_none());
        assert!(f.surface.dispatched().is_empty());
        assert!(f.surface.is_clean());
    }

    #[test]
    fn sequences_increase_across_dispatches() {
        let mut f = fixture();
        let a = f.start(100.0, 100.0, Duration::ZERO).log.sequence;
        let b = f.moved(101.0, 100.0, MS_10).log.sequence;
        let c = f.end(101.0, 100.0, MS_100).log.sequence;
        assert!(a < b && b < c);
    }

    // --- Config ---

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn config_defaults() {
        let config = GestureConfig::default();
        assert_eq!(config.long_press_delay, MS_500);
        assert_eq!(config.move_tolerance, 10.0);
        assert_eq!(config.tap_max_duration, MS_500);
        assert_eq!(config.synthetic_move_delay, MS_10);
        assert_eq!(config.haptic_pulse, Duration::from_millis(50));
    }

    #[test]
    fn config_env_overrides_and_validation() {
        let config = GestureConfig::from_env_with(env(&[
            ("SCHED_LONG_PRESS_MS", "650"),
            ("SCHED_MOVE_TOLERANCE_PX", "-3"),
            ("SCHED_TAP_MAX_MS", "0"),
        ]));
        assert_eq!(config.long_press_delay, Duration::from_millis(650));
        assert_eq!(config.move_tolerance, 10.0);
        assert_eq!(config.tap_max_duration, Duration::from_millis(1));

        let config = GestureConfig::from_env_with(env(&[("SCHED_MOVE_TOLERANCE_PX", "4.5")]));
        assert_eq!(config.move_tolerance, 4.5);
    }

    #[test]
    fn custom_delay_moves_deadline() {
        let mut f = fixture();
        f.gr = GestureRecognizer::new(GestureConfig {
            long_press_delay: Duration::from_millis(300),
            ..GestureConfig::default()
        });
        f.start(100.0, 100.0, Duration::ZERO);
        assert_eq!(
            f.poll(Duration::from_millis(300)).unwrap().outcome,
            GestureOutcome::DragActivated
        );
    }
}
