#![forbid(unsafe_code)]

//! The calendar's rendered event elements, as seen by the recognizer.
//!
//! [`CalendarSurface`] is the only way the gesture layer touches the host
//! document: it looks up event elements, toggles the visual marks, sets the
//! `data-drag-allowed` attribute and dispatches synthetic touches. Browser
//! hosts implement it over the DOM; tests use [`MemorySurface`].

use std::time::Duration;

use bitflags::bitflags;
use sched_core::{TaskId, VisualEvent};

use crate::synth::SyntheticTouchEvent;
use crate::touch::NodeId;

/// Handle for one rendered calendar-event element (`.cal-event`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

/// Attribute set on an element once long-press has unlocked dragging.
pub const DRAG_ALLOWED_ATTRIBUTE: &str = "data-drag-allowed";

bitflags! {
    /// Visual marks the recognizer places on event elements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMarks: u8 {
        /// Long-press timer running.
        const WAITING      = 0b001;
        /// Long-press fired.
        const ACTIVE       = 0b010;
        /// Element handed to the drag library.
        const DRAG_ENABLED = 0b100;
    }
}

impl EventMarks {
    /// CSS class names for the set marks, in a fixed order.
    #[must_use]
    pub fn class_names(self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(3);
        if self.contains(Self::WAITING) {
            names.push("long-press-waiting");
        }
        if self.contains(Self::ACTIVE) {
            names.push("long-press-active");
        }
        if self.contains(Self::DRAG_ENABLED) {
            names.push("drag-enabled");
        }
        names
    }
}

/// Host document access needed by the gesture layer.
///
/// Every method must be safe to call on elements that carry nothing:
/// removing an absent mark or clearing an absent attribute is a no-op.
pub trait CalendarSurface {
    /// Nearest calendar-event ancestor of `node` (inclusive).
    fn closest_event(&self, node: NodeId) -> Option<ElementId>;

    /// Task id stored as explicit element metadata, if the renderer set one.
    fn event_task_id(&self, element: ElementId) -> Option<TaskId>;

    /// Rendered text of the element.
    fn text_content(&self, element: ElementId) -> String;

    fn add_marks(&mut self, element: ElementId, marks: EventMarks);
    fn remove_marks(&mut self, element: ElementId, marks: EventMarks);
    fn marks(&self, element: ElementId) -> EventMarks;

    fn set_drag_allowed(&mut self, element: ElementId);
    fn clear_drag_allowed(&mut self, element: ElementId);
    fn is_drag_allowed(&self, element: ElementId) -> bool;

    /// Every calendar-event element currently rendered.
    fn event_elements(&self) -> Vec<ElementId>;

    /// Dispatch a synthetic touch event on its target element.
    fn dispatch_touch(&mut self, event: &SyntheticTouchEvent);

    /// Trigger a haptic pulse. Returns `false` when unsupported.
    fn vibrate(&mut self, pulse: Duration) -> bool;
}

/// Remove `marks` from every event element.
pub fn strip_marks_everywhere<S: CalendarSurface + ?Sized>(surface: &mut S, marks: EventMarks) {
    for element in surface.event_elements() {
        surface.remove_marks(element, marks);
    }
}

/// Remove every mark and the drag-allowed attribute from every event
/// element. Idempotent.
pub fn strip_all_marks<S: CalendarSurface + ?Sized>(surface: &mut S) {
    for element in surface.event_elements() {
        surface.remove_marks(element, EventMarks::all());
        surface.clear_drag_allowed(element);
    }
}

/// Find the task behind `element`.
///
/// Explicit metadata wins. Otherwise the first projected event whose title
/// prefixes the element's text is taken; empty titles never match.
pub fn resolve_task_id<S: CalendarSurface + ?Sized>(
    surface: &S,
    element: ElementId,
    events: &[VisualEvent],
) -> Option<TaskId> {
    if let Some(id) = surface.event_task_id(element) {
        return Some(id);
    }
    let text = surface.text_content(element);
    events
        .iter()
        .find(|event| {
            !event.title.is_empty() && text.starts_with(event.title.as_str())
        })
        .map(|event| event.id.clone())
}

#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MemorySurface;

#[cfg(any(test, feature = "test-helpers"))]
mod memory {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use sched_core::TaskId;

    use super::{CalendarSurface, ElementId, EventMarks};
    use crate::synth::SyntheticTouchEvent;
    use crate::touch::NodeId;

    #[derive(Debug, Clone, Default)]
    struct ElementRecord {
        text: String,
        task_id: Option<TaskId>,
        marks: EventMarks,
        drag_allowed: bool,
    }

    /// Recording in-memory surface.
    ///
    /// Each event element owns one node (its own box) plus any child nodes
    /// added with [`MemorySurface::add_child`]. Nodes created with
    /// [`MemorySurface::add_background`] belong to no event.
    #[derive(Debug, Clone)]
    pub struct MemorySurface {
        elements: BTreeMap<ElementId, ElementRecord>,
        nodes: BTreeMap<NodeId, Option<ElementId>>,
        next_id: u32,
        haptics: bool,
        dispatched: Vec<SyntheticTouchEvent>,
        vibrations: Vec<Duration>,
    }

    impl Default for MemorySurface {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MemorySurface {
        #[must_use]
        pub fn new() -> Self {
            Self {
                elements: BTreeMap::new(),
                nodes: BTreeMap::new(),
                next_id: 1,
                haptics: true,
                dispatched: Vec::new(),
                vibrations: Vec::new(),
            }
        }

        fn allocate(&mut self) -> u32 {
            let id = self.next_id;
            self.next_id += 1;
            id
        }

        /// Render an event element showing `text`.
        pub fn add_event(&mut self, text: impl Into<String>) -> ElementId {
            let raw = self.allocate();
            let element = ElementId(raw);
            self.elements.insert(
                element,
                ElementRecord {
                    text: text.into(),
                    ..ElementRecord::default()
                },
            );
            self.nodes.insert(NodeId(raw), Some(element));
            element
        }

        /// Render an event element carrying explicit task-id metadata.
        pub fn add_event_with_id(
            &mut self,
            text: impl Into<String>,
            id: impl Into<TaskId>,
        ) -> ElementId {
            let element = self.add_event(text);
            if let Some(record) = self.elements.get_mut(&element) {
                record.task_id = Some(id.into());
            }
            element
        }

        /// Add a child node inside `element`.
        pub fn add_child(&mut self, element: ElementId) -> NodeId {
            let node = NodeId(self.allocate());
            self.nodes.insert(node, Some(element));
            node
        }

        /// Add a node outside every event element.
        pub fn add_background(&mut self) -> NodeId {
            let node = NodeId(self.allocate());
            self.nodes.insert(node, None);
            node
        }

        /// The element's own node.
        #[must_use]
        pub const fn node_of(element: ElementId) -> NodeId {
            NodeId(element.0)
        }

        pub fn set_haptics(&mut self, available: bool) {
            self.haptics = available;
        }

        /// Synthetic events dispatched so far.
        #[must_use]
        pub fn dispatched(&self) -> &[SyntheticTouchEvent] {
            &self.dispatched
        }

        pub fn take_dispatched(&mut self) -> Vec<SyntheticTouchEvent> {
            std::mem::take(&mut self.dispatched)
        }

        /// Successful haptic pulses so far.
        #[must_use]
        pub fn vibrations(&self) -> &[Duration] {
            &self.vibrations
        }

        /// Whether no element carries a mark or the drag-allowed attribute.
        #[must_use]
        pub fn is_clean(&self) -> bool {
            self.elements
                .values()
                .all(|record| record.marks.is_empty() && !record.drag_allowed)
        }
    }

    impl CalendarSurface for MemorySurface {
        fn closest_event(&self, node: NodeId) -> Option<ElementId> {
            self.nodes.get(&node).copied().flatten()
        }

        fn event_task_id(&self, element: ElementId) -> Option<TaskId> {
            self.elements.get(&element).and_then(|r| r.task_id.clone())
        }

        fn text_content(&self, element: ElementId) -> String {
            self.elements
                .get(&element)
                .map(|r| r.text.clone())
                .unwrap_or_default()
        }

        fn add_marks(&mut self, element: ElementId, marks: EventMarks) {
            if let Some(record) = self.elements.get_mut(&element) {
                record.marks.insert(marks);
            }
        }

        fn remove_marks(&mut self, element: ElementId, marks: EventMarks) {
            if let Some(record) = self.elements.get_mut(&element) {
                record.marks.remove(marks);
            }
        }

        fn marks(&self, element: ElementId) -> EventMarks {
            self.elements
                .get(&element)
                .map(|r| r.marks)
                .unwrap_or_default()
        }

        fn set_drag_allowed(&mut self, element: ElementId) {
            if let Some(record) = self.elements.get_mut(&element) {
                record.drag_allowed = true;
            }
        }

        fn clear_drag_allowed(&mut self, element: ElementId) {
            if let Some(record) = self.elements.get_mut(&element) {
                record.drag_allowed = false;
            }
        }

        fn is_drag_allowed(&self, element: ElementId) -> bool {
            self.elements.get(&element).is_some_and(|r| r.drag_allowed)
        }

        fn event_elements(&self) -> Vec<ElementId> {
            self.elements.keys().copied().collect()
        }

        fn dispatch_touch(&mut self, event: &SyntheticTouchEvent) {
            self.dispatched.push(event.clone());
        }

        fn vibrate(&mut self, pulse: Duration) -> bool {
            if self.haptics {
                self.vibrations.push(pulse);
            }
            self.haptics
        }
    }
}
