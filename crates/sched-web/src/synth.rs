#![forbid(unsafe_code)]

//! Synthetic touch sequences that hand a gesture to the drag library.
//!
//! The drag library only starts tracking on native-shaped input, so the
//! handoff replays a `touchstart` at the original coordinates and, one short
//! delay later, a `touchmove` shifted by 1 px on both axes. The move crosses
//! the library's own start threshold.
//!
//! The delay is host-driven: [`TouchEventSynthesizer::begin`] dispatches the
//! start and queues the move; the host calls [`TouchEventSynthesizer::poll`]
//! once [`TouchEventSynthesizer::next_deadline`] has passed.

use std::time::Duration;

use tracing::debug;
use web_time::{Instant, SystemTime, UNIX_EPOCH};

use sched_core::logging::TARGET_SYNTH;

use crate::surface::{CalendarSurface, ElementId};
use crate::touch::{Point, TouchPoint};

/// Touch ellipse radius reported on both axes.
pub const SYNTHETIC_RADIUS: f64 = 2.5;
/// Pressure reported on synthetic touches.
pub const SYNTHETIC_FORCE: f64 = 0.5;
/// Offset applied to the follow-up move on both axes.
pub const SYNTHETIC_MOVE_OFFSET: f64 = 1.0;

/// Event type of a synthetic touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticTouchKind {
    Start,
    Move,
}

impl SyntheticTouchKind {
    /// DOM event type name.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::Start => "touchstart",
            Self::Move => "touchmove",
        }
    }
}

/// Constructor payload for a DOM `Touch`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticTouch {
    pub identifier: i64,
    pub target: ElementId,
    pub client: Point,
    pub screen: Point,
    pub page: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    pub rotation_angle: f64,
    pub force: f64,
}

impl SyntheticTouch {
    fn from_touch(identifier: i64, target: ElementId, touch: &TouchPoint) -> Self {
        Self {
            identifier,
            target,
            client: touch.client,
            screen: touch.screen,
            page: touch.page,
            radius_x: SYNTHETIC_RADIUS,
            radius_y: SYNTHETIC_RADIUS,
            rotation_angle: 0.0,
            force: SYNTHETIC_FORCE,
        }
    }
}

/// Constructor payload for a DOM `TouchEvent`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticTouchEvent {
    pub kind: SyntheticTouchKind,
    pub target: ElementId,
    pub cancelable: bool,
    pub bubbles: bool,
    pub touches: Vec<SyntheticTouch>,
    pub target_touches: Vec<SyntheticTouch>,
    pub changed_touches: Vec<SyntheticTouch>,
}

impl SyntheticTouchEvent {
    fn single(kind: SyntheticTouchKind, touch: SyntheticTouch) -> Self {
        Self {
            kind,
            target: touch.target,
            cancelable: true,
            bubbles: true,
            touches: vec![touch],
            target_touches: vec![touch],
            changed_touches: vec![touch],
        }
    }

    /// The single touch carried by this event.
    #[must_use]
    pub fn touch(&self) -> Option<&SyntheticTouch> {
        self.changed_touches.first()
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    due: Instant,
    target: ElementId,
    origin: TouchPoint,
}

/// Builds and dispatches the start/move handoff pair.
#[derive(Debug, Clone)]
pub struct TouchEventSynthesizer {
    move_delay: Duration,
    last_identifier: i64,
    pending: Option<PendingMove>,
    dispatched: u64,
}

impl TouchEventSynthesizer {
    #[must_use]
    pub const fn new(move_delay: Duration) -> Self {
        Self {
            move_delay,
            last_identifier: 0,
            pending: None,
            dispatched: 0,
        }
    }

    #[must_use]
    pub const fn move_delay(&self) -> Duration {
        self.move_delay
    }

    /// Total synthetic events dispatched.
    #[must_use]
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// When the queued move becomes due, if one is queued.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Dispatch the synthetic start on `target` and queue the move.
    ///
    /// A move still queued from an earlier handoff is replaced.
    pub fn begin<S: CalendarSurface + ?Sized>(
        &mut self,
        target: ElementId,
        origin: &TouchPoint,
        now: Instant,
        surface: &mut S,
    ) {
        let identifier = self.next_identifier(wall_clock_ms());
        let event = SyntheticTouchEvent::single(
            SyntheticTouchKind::Start,
            SyntheticTouch::from_touch(identifier, target, origin),
        );
        self.dispatch(&event, surface);
        self.pending = Some(PendingMove {
            due: now + self.move_delay,
            target,
            origin: *origin,
        });
    }

    /// Dispatch the queued move if it is due. Returns whether it was sent.
    pub fn poll<S: CalendarSurface + ?Sized>(&mut self, now: Instant, surface: &mut S) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        if now < pending.due {
            return false;
        }
        self.pending = None;
        let identifier = self.next_identifier(wall_clock_ms());
        let moved = pending
            .origin
            .offset(SYNTHETIC_MOVE_OFFSET, SYNTHETIC_MOVE_OFFSET);
        let event = SyntheticTouchEvent::single(
            SyntheticTouchKind::Move,
            SyntheticTouch::from_touch(identifier, pending.target, &moved),
        );
        self.dispatch(&event, surface);
        true
    }

    /// Drop the queued move. Safe when nothing is queued.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!(target: TARGET_SYNTH, "queued synthetic move dropped");
        }
    }

    /// Identifier for the next event: `wall_ms`, bumped past the previous
    /// one so identifiers strictly increase.
    pub(crate) fn next_identifier(&mut self, wall_ms: i64) -> i64 {
        let id = wall_ms.max(self.last_identifier.saturating_add(1));
        self.last_identifier = id;
        id
    }

    fn dispatch<S: CalendarSurface + ?Sized>(
        &mut self,
        event: &SyntheticTouchEvent,
        surface: &mut S,
    ) {
        surface.dispatch_touch(event);
        self.dispatched += 1;
        if let Some(touch) = event.touch() {
            debug!(
                target: TARGET_SYNTH,
                kind = event.kind.event_type(),
                element = event.target.0,
                identifier = touch.identifier,
                x = touch.client.x,
                y = touch.client.y,
                "synthetic touch dispatched"
            );
        }
    }
}

fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
