//! Catalog data shared by the schedule and endpoint tests.

use super::blocks::find_block;
use crate::catalog::{Day, Room, ScheduleAssignment, Section, SectionState, Snapshot, Subject};

pub fn room(id: i64, code: &str, name: &str) -> Room {
    Room {
        id,
        code: code.to_string(),
        name: name.to_string(),
        capacity: 20,
    }
}

pub fn assignment(
    day: Day,
    block_number: u8,
    room_id: Option<i64>,
    room_code: Option<&str>,
) -> ScheduleAssignment {
    let block = find_block(block_number).expect("fixture block must exist");
    ScheduleAssignment {
        day,
        block_number,
        room_id,
        room_code: room_code.map(str::to_string),
        room_name: None,
        start_time: block.start_time.to_string(),
        end_time: block.end_time.to_string(),
    }
}

pub fn section(
    id: i64,
    section_number: u32,
    instructor: &str,
    schedule_assignments: Vec<ScheduleAssignment>,
) -> Section {
    Section {
        id,
        section_number,
        instructor: instructor.to_string(),
        capacity: 20,
        enrolled: 12,
        state: SectionState::Active,
        schedule_assignments,
    }
}

pub fn subject(id: i64, name: &str, sections: Vec<Section>) -> Subject {
    Subject {
        id,
        name: name.to_string(),
        sections,
    }
}

pub fn snapshot(rooms: Vec<Room>, subjects: Vec<Subject>) -> Snapshot {
    Snapshot {
        rooms,
        subjects,
        fetched_at: chrono::Utc::now(),
    }
}

/// Two sections of different subjects booked into LG1-402 on Monday block 3.
///
/// Section A (id 100) references the room by code only, section B (id 200)
/// by id only. Section B also holds Tuesday block 5 in LG1-403.
pub fn scenario() -> Snapshot {
    snapshot(
        vec![
            room(1, "LG1-402", "Cocina 402"),
            room(2, "LG1-403", "Pastelería 403"),
        ],
        vec![
            subject(
                10,
                "Cocina Básica",
                vec![section(
                    100,
                    1,
                    "M. Rojas",
                    vec![assignment(Day::Monday, 3, None, Some("LG1-402"))],
                )],
            ),
            subject(
                20,
                "Panadería",
                vec![section(
                    200,
                    1,
                    "J. Pérez",
                    vec![
                        assignment(Day::Monday, 3, Some(1), None),
                        assignment(Day::Tuesday, 5, Some(2), Some("LG1-403")),
                    ],
                )],
            ),
        ],
    )
}
