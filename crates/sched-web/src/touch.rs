#![forbid(unsafe_code)]

//! Raw touch input as delivered by the host.
//!
//! The host converts each browser `TouchEvent` into a [`RawTouchEvent`] and
//! applies the returned [`Propagation`] itself. Only the first touch point
//! is ever consulted; multi-finger input is out of scope.

/// Viewport-space position in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same point shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Absolute displacement from `origin`, per axis.
    #[must_use]
    pub fn axis_delta(self, origin: Self) -> (f64, f64) {
        ((self.x - origin.x).abs(), (self.y - origin.y).abs())
    }
}

/// Opaque handle for a host node (the raw event target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// One contact point of a touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub identifier: i64,
    pub client: Point,
    pub screen: Point,
    pub page: Point,
}

impl TouchPoint {
    /// Touch whose client, screen and page coordinates coincide.
    #[must_use]
    pub const fn at(identifier: i64, position: Point) -> Self {
        Self {
            identifier,
            client: position,
            screen: position,
            page: position,
        }
    }

    /// Same touch moved by `(dx, dy)` in every coordinate space.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            identifier: self.identifier,
            client: self.client.offset(dx, dy),
            screen: self.screen.offset(dx, dy),
            page: self.page.offset(dx, dy),
        }
    }
}

/// A raw touch event forwarded by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTouchEvent {
    pub target: NodeId,
    /// Points still in contact (`TouchEvent.touches`).
    pub touches: Vec<TouchPoint>,
    /// Points that changed in this event (`TouchEvent.changedTouches`).
    pub changed_touches: Vec<TouchPoint>,
}

impl RawTouchEvent {
    /// A finger landing (or moving) at `point`.
    #[must_use]
    pub fn contact(target: NodeId, point: TouchPoint) -> Self {
        Self {
            target,
            touches: vec![point],
            changed_touches: vec![point],
        }
    }

    /// A finger lifting at `point`: no remaining contacts.
    #[must_use]
    pub fn lift(target: NodeId, point: TouchPoint) -> Self {
        Self {
            target,
            touches: Vec::new(),
            changed_touches: vec![point],
        }
    }

    /// First point still in contact.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }

    /// First changed point; this is where a lifted finger was last seen.
    #[must_use]
    pub fn primary_changed(&self) -> Option<&TouchPoint> {
        self.changed_touches.first()
    }
}

/// What the host must do with the event after the recognizer saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Let the event reach other listeners.
    #[default]
    Continue,
    /// Call `stopImmediatePropagation()`.
    Stop,
}

impl Propagation {
    #[must_use]
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stop)
    }
}
