//! Property-based invariant tests for the touch recognizer.
//!
//! Arbitrary sequences of start/move/end/cancel/poll inputs are replayed
//! against a recording surface. After every step:
//!
//! 1. A long-press deadline is pending only while awaiting a long press.
//! 2. At most one synthetic start is dispatched per handoff, and every
//!    synthetic move directly follows its start.
//! 3. A tap never coincides with a synthetic dispatch in the same sequence.
//! 4. End, cancel and cleanup always leave the surface unmarked and the
//!    recognizer idle.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use sched_core::projection::project;
use sched_core::{ConflictScope, DeviceClass, Task, VisualEvent};
use sched_web::{
    GestureOutcome, GesturePhase, GestureRecognizer, MemorySurface, NodeId, Point, RawTouchEvent,
    SyntheticTouchKind, TouchPoint,
};
use web_time::Instant;

#[derive(Debug, Clone)]
enum Step {
    Start { node: usize, x: f64, y: f64 },
    Move { node: usize, x: f64, y: f64 },
    End { node: usize, x: f64, y: f64 },
    Cancel,
    Poll,
    Cleanup,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    let at = || (0usize..4, 0.0f64..400.0, 0.0f64..400.0);
    prop_oneof![
        at().prop_map(|(node, x, y)| Step::Start { node, x, y }),
        at().prop_map(|(node, x, y)| Step::Move { node, x, y }),
        at().prop_map(|(node, x, y)| Step::End { node, x, y }),
        Just(Step::Cancel),
        Just(Step::Poll),
        Just(Step::Cleanup),
    ]
}

fn scenario_strategy() -> impl Strategy<Value = Vec<(Step, u64)>> {
    proptest::collection::vec((step_strategy(), 0u64..400), 1..40)
}

fn events() -> Vec<VisualEvent> {
    let start = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
    let tasks = vec![
        Task::new("a", "room-1", "Alpha", start, end).unwrap(),
        Task::new("b", "room-1", "Beta", start, end).unwrap(),
    ];
    project(
        &"room-1".into(),
        &tasks,
        DeviceClass::Mobile,
        ConflictScope::Workspace,
    )
}

/// Nodes: Alpha element, Beta child node, unresolvable element, background.
fn surface() -> (MemorySurface, Vec<NodeId>) {
    let mut surface = MemorySurface::new();
    let alpha = surface.add_event("Alpha 09:00");
    let beta = surface.add_event("Beta 09:00");
    let beta_child = surface.add_child(beta);
    let stray = surface.add_event("Gamma");
    let background = surface.add_background();
    let nodes = vec![
        MemorySurface::node_of(alpha),
        beta_child,
        MemorySurface::node_of(stray),
        background,
    ];
    (surface, nodes)
}

proptest! {
    #[test]
    fn recognizer_invariants_hold(steps in scenario_strategy()) {
        let events = events();
        let (mut surface, nodes) = surface();
        let mut gr = GestureRecognizer::default();
        let t0 = Instant::now();
        let mut elapsed = Duration::ZERO;
        let mut tapped_this_sequence = false;
        let mut dispatched_at_start = 0usize;

        for (step, gap) in steps {
            elapsed += Duration::from_millis(gap);
            let now = t0 + elapsed;
            let touch = |x: f64, y: f64| TouchPoint::at(0, Point::new(x, y));

            match step {
                Step::Start { node, x, y } => {
                    let raw = RawTouchEvent::contact(nodes[node], touch(x, y));
                    let d = gr.touch_start(&raw, now, &mut surface, &events);
                    if d.outcome == GestureOutcome::Armed {
                        tapped_this_sequence = false;
                        dispatched_at_start = surface.dispatched().len();
                    }
                }
                Step::Move { node, x, y } => {
                    let raw = RawTouchEvent::contact(nodes[node], touch(x, y));
                    gr.touch_move(&raw, now, &mut surface, &events);
                }
                Step::End { node, x, y } => {
                    let raw = RawTouchEvent::lift(nodes[node], touch(x, y));
                    let d = gr.touch_end(&raw, now, &mut surface, &events);
                    if d.outcome == GestureOutcome::TapResolved {
                        tapped_this_sequence = true;
                        let sent = surface.dispatched().len();
                        prop_assert_eq!(sent, dispatched_at_start);
                    }
                    prop_assert_eq!(gr.phase(), GesturePhase::Idle);
                    prop_assert!(surface.is_clean());
                }
                Step::Cancel => {
                    gr.touch_cancel(&mut surface);
                    prop_assert_eq!(gr.phase(), GesturePhase::Idle);
                    prop_assert!(surface.is_clean());
                }
                Step::Poll => {
                    if let Some(d) = gr.poll(now, &mut surface) {
                        let activated = d.outcome == GestureOutcome::DragActivated;
                        prop_assert!(!(tapped_this_sequence && activated));
                    }
                }
                Step::Cleanup => {
                    gr.cleanup(&mut surface);
                    prop_assert_eq!(gr.phase(), GesturePhase::Idle);
                    prop_assert!(surface.is_clean());
                    prop_assert!(gr.next_deadline().is_none());
                }
            }

            // 1. Deadline only while awaiting.
            let awaiting = gr.phase() == GesturePhase::AwaitingLongPress;
            let pending = gr.state().long_press_deadline.is_some();
            prop_assert_eq!(pending, awaiting);
            prop_assert_eq!(gr.phase() == GesturePhase::TapResolved, false);

            // 2. Synthetic sequence shape: no move without a preceding start.
            let sent = surface.dispatched();
            for (i, event) in sent.iter().enumerate() {
                if event.kind == SyntheticTouchKind::Move {
                    prop_assert!(i > 0 && sent[i - 1].kind == SyntheticTouchKind::Start);
                }
            }
            for pair in sent.windows(2) {
                let (a, b) = (pair[0].touch().unwrap(), pair[1].touch().unwrap());
                prop_assert!(b.identifier > a.identifier);
            }
        }
    }
}
