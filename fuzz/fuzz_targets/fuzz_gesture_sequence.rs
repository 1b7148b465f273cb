#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use sched_core::projection::project;
use sched_core::{ConflictScope, DeviceClass, Task};
use sched_web::{
    GesturePhase, GestureRecognizer, GestureState, MemorySurface, Point, RawTouchEvent, TouchPoint,
};
use web_time::Instant;

#[derive(Debug, Arbitrary)]
enum Input {
    Start { node: u8, x: i16, y: i16 },
    Move { node: u8, x: i16, y: i16, held: bool },
    End { node: u8, x: i16, y: i16 },
    Cancel,
    Poll,
    Cleanup,
}

fuzz_target!(|script: Vec<(Input, u16)>| {
    let start = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
    let tasks = vec![
        Task::new("a", "room-1", "Alpha", start, end).unwrap(),
        Task::new("b", "room-1", "Beta", start, end).unwrap(),
    ];
    let events = project(
        &"room-1".into(),
        &tasks,
        DeviceClass::Mobile,
        ConflictScope::Workspace,
    );

    let mut surface = MemorySurface::new();
    let alpha = surface.add_event("Alpha");
    let beta = surface.add_event_with_id("Beta", "b");
    let nodes = [
        MemorySurface::node_of(alpha),
        surface.add_child(beta),
        MemorySurface::node_of(surface.add_event("Gamma")),
        surface.add_background(),
    ];
    let pick = |raw: u8| nodes[usize::from(raw) % nodes.len()];
    let touch = |x: i16, y: i16| TouchPoint::at(0, Point::new(f64::from(x), f64::from(y)));

    let mut gr = GestureRecognizer::default();
    let t0 = Instant::now();
    let mut now = t0;

    for (input, gap) in script.into_iter().take(256) {
        now += Duration::from_millis(u64::from(gap % 1_000));
        match input {
            Input::Start { node, x, y } => {
                let event = RawTouchEvent::contact(pick(node), touch(x, y));
                gr.touch_start(&event, now, &mut surface, &events);
            }
            Input::Move { node, x, y, held } => {
                let mut event = RawTouchEvent::contact(pick(node), touch(x, y));
                if !held {
                    event.touches.clear();
                }
                gr.touch_move(&event, now, &mut surface, &events);
            }
            Input::End { node, x, y } => {
                let event = RawTouchEvent::lift(pick(node), touch(x, y));
                gr.touch_end(&event, now, &mut surface, &events);
                assert_eq!(gr.phase(), GesturePhase::Idle);
                assert!(surface.is_clean(), "marks left after touch end");
            }
            Input::Cancel => {
                gr.touch_cancel(&mut surface);
                assert!(surface.is_clean(), "marks left after touch cancel");
            }
            Input::Poll => {
                gr.poll(now, &mut surface);
            }
            Input::Cleanup => {
                gr.cleanup(&mut surface);
                assert_eq!(gr.state(), &GestureState::default());
                assert!(gr.next_deadline().is_none());
            }
        }
        assert_eq!(
            gr.state().long_press_deadline.is_some(),
            gr.phase() == GesturePhase::AwaitingLongPress,
            "deadline out of sync with phase"
        );
    }
});
