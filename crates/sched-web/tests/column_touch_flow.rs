//! End-to-end flow: store → column projection → touch recognizer → dialog.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use sched_core::{
    AnalyticsEvent, AnalyticsSink, DeviceClass, DialogMode, DialogOutcome, Resizable,
    ScheduleColumn, ScheduleConfig, Task, TaskColor, TaskStore, VisualEvent,
};
use sched_web::{
    CalendarSurface, GestureOutcome, GesturePhase, GestureRecognizer, MemorySurface, Point,
    RawTouchEvent, SyntheticTouchKind, TouchPoint,
};
use web_time::Instant;

#[derive(Default)]
struct Recorder(RefCell<Vec<AnalyticsEvent>>);

impl AnalyticsSink for Recorder {
    fn track(&self, event: AnalyticsEvent) {
        self.0.borrow_mut().push(event);
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0).unwrap()
}

fn seed() -> TaskStore {
    TaskStore::new(vec![
        Task::new("standup", "room-1", "Standup", at(9), at(10))
            .unwrap()
            .with_participants(["ann", "ben"]),
        Task::new("review", "room-1", "Review", at(11), at(12))
            .unwrap()
            .with_participants(["cat"]),
        Task::new("offsite", "room-2", "Offsite", at(9), at(17))
            .unwrap()
            .with_participants(["cat"]),
    ])
}

fn lift(node: sched_web::NodeId, x: f64, y: f64) -> RawTouchEvent {
    RawTouchEvent::lift(node, TouchPoint::at(0, Point::new(x, y)))
}

fn press(node: sched_web::NodeId, x: f64, y: f64) -> RawTouchEvent {
    RawTouchEvent::contact(node, TouchPoint::at(0, Point::new(x, y)))
}

#[test]
fn tap_opens_edit_dialog_for_conflicted_task() {
    let store = seed();
    let recorder = Rc::new(Recorder::default());
    let column = ScheduleColumn::with_analytics(
        "room-1",
        store.clone(),
        DeviceClass::Mobile,
        ScheduleConfig::default(),
        recorder.clone(),
    );

    let events = column.events();
    assert_eq!(events.len(), 2);
    let review = events.iter().find(|e| e.id.as_str() == "review").unwrap();
    // cat is in the room-2 offsite all day.
    assert_eq!(review.color, TaskColor::WARNING);
    assert!(events.iter().all(|e| e.resizable == Resizable::NONE));

    let mut surface = MemorySurface::new();
    surface.add_event("Standup 09:00");
    let review_el = surface.add_event("Review 11:00");
    let node = surface.add_child(review_el);

    let mut gr = GestureRecognizer::default();
    let t = Instant::now();
    gr.touch_start(&press(node, 40.0, 300.0), t, &mut surface, &events);
    let lifted_at = t + Duration::from_millis(120);
    let end = gr.touch_end(&lift(node, 41.0, 302.0), lifted_at, &mut surface, &events);

    let selected = end.selected().expect("tap selects review");
    let request = column.open_task(&selected.id).expect("review is projected");
    assert_eq!(request.mode, DialogMode::Edit);
    assert_eq!(request.title.as_deref(), Some("Review"));
    assert!(request.can_delete());
    assert_eq!(
        *recorder.0.borrow(),
        vec![AnalyticsEvent::OpenEditTaskModal]
    );

    column
        .complete_dialog(DialogMode::Edit, DialogOutcome::Delete(selected.id.clone()))
        .unwrap();
    assert!(column.events().iter().all(|e| e.id.as_str() != "review"));
    assert!(surface.is_clean());
    assert!(surface.dispatched().is_empty());
}

#[test]
fn long_press_drag_then_write_back_recolors() {
    let store = seed();
    let column = ScheduleColumn::new(
        "room-1",
        store.clone(),
        DeviceClass::Mobile,
        ScheduleConfig::default(),
    );
    let events = column.events();

    let mut surface = MemorySurface::new();
    let standup_el = surface.add_event_with_id("Standup 09:00", "standup");
    let node = MemorySurface::node_of(standup_el);

    let mut gr = GestureRecognizer::default();
    let t = Instant::now();
    gr.touch_start(&press(node, 60.0, 120.0), t, &mut surface, &events);
    while let Some(deadline) = gr.next_deadline() {
        gr.poll(deadline, &mut surface);
    }
    assert_eq!(gr.phase(), GesturePhase::Dragging);
    let kinds: Vec<SyntheticTouchKind> = surface.dispatched().iter().map(|e| e.kind).collect();
    let handoff = vec![SyntheticTouchKind::Start, SyntheticTouchKind::Move];
    assert_eq!(kinds, handoff);
    assert!(surface.is_drag_allowed(standup_el));

    // The drag library drops standup onto cat's offsite hours and reports it.
    let standup = store.get(&"standup".into()).unwrap();
    let moved = standup.with_participants(["cat"]);
    store.update(moved).unwrap();
    column
        .event_times_changed(&"standup".into(), at(13), at(14))
        .unwrap();

    let current = column.events();
    let lifted_at = t + Duration::from_secs(2);
    let end = gr.touch_end(&lift(node, 60.0, 400.0), lifted_at, &mut surface, &current);
    assert_eq!(end.outcome, GestureOutcome::CleanedUp);
    assert!(surface.is_clean());

    let stored = store.get(&"standup".into()).unwrap();
    assert_eq!((stored.start(), stored.end()), (at(13), at(14)));
    assert_eq!(stored.resizable, Resizable::NONE);
    let projected = column.events();
    let standup = projected
        .iter()
        .find(|e| e.id.as_str() == "standup")
        .unwrap();
    assert!(standup.is_conflicted());
}

#[test]
fn device_switch_restores_resize_handles() {
    let store = seed();
    let config = ScheduleConfig::default();
    let column = ScheduleColumn::new("room-1", store, DeviceClass::Mobile, config);
    assert!(column.events().iter().all(|e| !e.resizable.any()));
    column.set_device_class(DeviceClass::Desktop);
    let handles = |e: &VisualEvent| e.resizable == Resizable::BOTH;
    assert!(column.events().iter().all(handles));
}
