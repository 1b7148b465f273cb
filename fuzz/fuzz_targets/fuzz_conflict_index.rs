#![no_main]

use arbitrary::Arbitrary;
use chrono::{Duration, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use sched_core::Task;
use sched_core::conflict::{ConflictIndex, has_participant_conflict, tasks_conflict};

#[derive(Debug, Arbitrary)]
struct RawTask {
    column: u8,
    start_slot: u8,
    len_slots: u8,
    participants: u8,
}

fuzz_target!(|raw: Vec<RawTask>| {
    let base = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
    let tasks: Vec<Task> = raw
        .iter()
        .take(128)
        .enumerate()
        .filter_map(|(i, r)| {
            let start = base + Duration::minutes(i64::from(r.start_slot) * 5);
            let end = start + Duration::minutes(i64::from(r.len_slots) * 5);
            // Zero-length slots are rejected by the constructor.
            let column = format!("c{}", r.column % 4);
            let task = Task::new(format!("t{i}"), column, "", start, end).ok()?;
            let who = (0..8u8)
                .filter(|bit| r.participants & (1 << bit) != 0)
                .map(|bit| format!("p{bit}"));
            Some(task.with_participants(who))
        })
        .collect();

    let index = ConflictIndex::build(&tasks);
    for a in &tasks {
        let naive = has_participant_conflict(a, &tasks);
        assert_eq!(index.has_conflict(a), naive);
        for b in &tasks {
            assert_eq!(tasks_conflict(a, b), tasks_conflict(b, a));
        }
    }
});
