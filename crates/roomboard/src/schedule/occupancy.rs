//! Occupancy index: which sections claim which (room, day, block).
//!
//! Room references are resolved once, while the index is built. The catalog
//! fills an assignment's `roomId`, its `roomCode` or both, so every reference
//! is mapped onto canonical [`RoomKey`]s: an id stays an id, a code becomes
//! the id of the room carrying that code, and a code no room carries stays
//! a code. Lookups resolve the queried room the same way and match on any
//! shared key.

use crate::catalog::{Day, Room, ScheduleAssignment, Section, SectionState, Snapshot, Subject};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Canonical room identity used as index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKey {
    Id(i64),
    Code(String),
}

/// A room reference as callers supply it: by id, by code, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub code: Option<String>,
}

impl RoomRef {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            code: None,
        }
    }

    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            id: None,
            code: Some(code.into()),
        }
    }

    pub fn of(room: &Room) -> Self {
        Self {
            id: Some(room.id),
            code: Some(room.code.clone()),
        }
    }

    pub fn of_assignment(assignment: &ScheduleAssignment) -> Self {
        Self {
            id: assignment.room_id,
            code: assignment.room_code.clone(),
        }
    }

    /// Interprets a raw query value without a catalog at hand. Numeric values
    /// may be either an id or a code, so both are kept.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            id: raw.parse().ok(),
            code: Some(raw.to_string()).filter(|c| !c.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.code.as_deref().map_or(true, |c| c.trim().is_empty())
    }
}

/// The section sitting in an occupied cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    pub subject_id: i64,
    pub subject_name: String,
    pub section_id: i64,
    pub section_number: u32,
    pub instructor: String,
    pub state: SectionState,
}

impl Occupant {
    fn new(subject: &Subject, section: &Section) -> Self {
        Self {
            subject_id: subject.id,
            subject_name: subject.name.clone(),
            section_id: section.id,
            section_number: section.section_number,
            instructor: section.instructor.clone(),
            state: section.state,
        }
    }
}

/// A (room, day, block) claimed by more than one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub room: RoomKey,
    pub day: Day,
    pub block_number: u8,
    pub occupants: Vec<Occupant>,
}

type Cell = (RoomKey, Day, u8);

#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    ids_by_code: HashMap<String, i64>,
    cells: BTreeMap<Cell, Vec<Occupant>>,
}

impl OccupancyIndex {
    /// Scans every assignment of every section of every subject.
    pub fn build(snapshot: &Snapshot) -> Self {
        let ids_by_code = snapshot
            .rooms
            .iter()
            .map(|room| (room.code.trim().to_string(), room.id))
            .collect();

        let mut index = Self {
            ids_by_code,
            cells: BTreeMap::new(),
        };

        for subject in &snapshot.subjects {
            for section in &subject.sections {
                for assignment in &section.schedule_assignments {
                    for key in index.resolve(&RoomRef::of_assignment(assignment)) {
                        let occupants = index
                            .cells
                            .entry((key, assignment.day, assignment.block_number))
                            .or_default();
                        if !occupants.iter().any(|o| o.section_id == section.id) {
                            occupants.push(Occupant::new(subject, section));
                        }
                    }
                }
            }
        }

        // Catalog order must not leak into results
        for occupants in index.cells.values_mut() {
            occupants.sort_by_key(|o| (o.subject_id, o.section_id));
        }

        index
    }

    /// Maps a room reference onto the canonical keys it stands for.
    pub fn resolve(&self, room: &RoomRef) -> Vec<RoomKey> {
        let mut keys = Vec::with_capacity(2);
        if let Some(id) = room.id {
            keys.push(RoomKey::Id(id));
        }
        if let Some(code) = room.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            let key = match self.ids_by_code.get(code) {
                Some(&id) => RoomKey::Id(id),
                None => RoomKey::Code(code.to_string()),
            };
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Block numbers occupied in `room` on `day`.
    pub fn occupied_blocks(&self, room: &RoomRef, day: Day) -> BTreeSet<u8> {
        self.resolve(room)
            .into_iter()
            .flat_map(|key| {
                self.cells
                    .range((key.clone(), day, u8::MIN)..=(key, day, u8::MAX))
                    .map(|((_, _, block), _)| *block)
            })
            .collect()
    }

    /// Sections occupying one cell, without duplicates.
    pub fn occupants(&self, room: &RoomRef, day: Day, block: u8) -> Vec<&Occupant> {
        let mut found: Vec<&Occupant> = Vec::new();
        for key in self.resolve(room) {
            if let Some(occupants) = self.cells.get(&(key, day, block)) {
                for occupant in occupants {
                    if !found.iter().any(|o| o.section_id == occupant.section_id) {
                        found.push(occupant);
                    }
                }
            }
        }
        found
    }

    #[cfg(test)]
    pub fn is_occupied(&self, room: &RoomRef, day: Day, block: u8) -> bool {
        self.resolve(room)
            .into_iter()
            .any(|key| self.cells.contains_key(&(key, day, block)))
    }

    /// True when `assignment` claims `block` on `day` in one of `keys`.
    pub fn claims(&self, assignment: &ScheduleAssignment, keys: &[RoomKey], day: Day, block: u8) -> bool {
        assignment.day == day
            && assignment.block_number == block
            && self
                .resolve(&RoomRef::of_assignment(assignment))
                .iter()
                .any(|key| keys.contains(key))
    }

    /// Every cell claimed by two or more sections, in index order.
    pub fn conflicts(&self) -> Vec<Conflict> {
        self.cells
            .iter()
            .filter(|(_, occupants)| occupants.len() > 1)
            .map(|((room, day, block), occupants)| Conflict {
                room: room.clone(),
                day: *day,
                block_number: *block,
                occupants: occupants.clone(),
            })
            .collect()
    }

    /// Iterates occupied cells in index order as (key, day, block, section ids).
    pub(crate) fn cells(&self) -> impl Iterator<Item = (&RoomKey, Day, u8, Vec<i64>)> {
        self.cells.iter().map(|((key, day, block), occupants)| {
            (
                key,
                *day,
                *block,
                occupants.iter().map(|o| o.section_id).collect(),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::fixtures::*;

    #[test]
    fn test_shared_cell_is_occupied_once() {
        let index = OccupancyIndex::build(&scenario());

        let blocks = index.occupied_blocks(&RoomRef::by_code("LG1-402"), Day::Monday);
        assert_eq!(blocks, BTreeSet::from([3]));

        assert!(index.occupied_blocks(&RoomRef::by_code("LG1-402"), Day::Tuesday).is_empty());
    }

    #[test]
    fn test_code_and_id_only_assignments_both_register() {
        // Section A only carries a code, section B only an id
        let index = OccupancyIndex::build(&scenario());

        let by_id = index.occupants(&RoomRef::by_id(1), Day::Monday, 3);
        let by_code = index.occupants(&RoomRef::by_code("LG1-402"), Day::Monday, 3);
        let ids = |v: Vec<&Occupant>| v.iter().map(|o| o.section_id).collect::<Vec<_>>();

        assert_eq!(ids(by_id), vec![100, 200]);
        assert_eq!(ids(by_code), vec![100, 200]);
    }

    #[test]
    fn test_unknown_room_code_still_matches_by_code() {
        let snapshot = snapshot(
            vec![room(1, "LG1-402", "Cocina 402")],
            vec![subject(
                30,
                "Vinos",
                vec![section(
                    300,
                    1,
                    "A. Soto",
                    vec![assignment(Day::Friday, 7, None, Some("EXT-01"))],
                )],
            )],
        );
        let index = OccupancyIndex::build(&snapshot);

        assert_eq!(
            index.occupied_blocks(&RoomRef::by_code("EXT-01"), Day::Friday),
            BTreeSet::from([7])
        );
        assert!(index.occupied_blocks(&RoomRef::by_id(1), Day::Friday).is_empty());
    }

    #[test]
    fn test_assignment_with_mismatched_id_and_code_occupies_both() {
        let snapshot = snapshot(
            vec![room(1, "LG1-402", "Cocina 402"), room(2, "LG1-403", "Pastelería 403")],
            vec![subject(
                30,
                "Vinos",
                vec![section(
                    300,
                    1,
                    "A. Soto",
                    vec![assignment(Day::Monday, 2, Some(1), Some("LG1-403"))],
                )],
            )],
        );
        let index = OccupancyIndex::build(&snapshot);

        assert!(index.is_occupied(&RoomRef::by_id(1), Day::Monday, 2));
        assert!(index.is_occupied(&RoomRef::by_code("LG1-403"), Day::Monday, 2));
        assert_eq!(index.occupants(&RoomRef::by_id(2), Day::Monday, 2).len(), 1);
    }

    #[test]
    fn test_query_matches_union_of_assignments() {
        let index = OccupancyIndex::build(&scenario());
        let snapshot = scenario();

        for room in &snapshot.rooms {
            for day in Day::ALL {
                let expected: BTreeSet<u8> = snapshot
                    .subjects
                    .iter()
                    .flat_map(|s| &s.sections)
                    .flat_map(|s| &s.schedule_assignments)
                    .filter(|a| a.day == day)
                    .filter(|a| a.room_id == Some(room.id) || a.room_code.as_deref() == Some(room.code.as_str()))
                    .map(|a| a.block_number)
                    .collect();
                assert_eq!(index.occupied_blocks(&RoomRef::of(room), day), expected);
            }
        }
    }

    #[test]
    fn test_iteration_order_does_not_matter() {
        let forward = scenario();
        let mut reversed = scenario();
        reversed.subjects.reverse();
        for subject in &mut reversed.subjects {
            subject.sections.reverse();
            for section in &mut subject.sections {
                section.schedule_assignments.reverse();
            }
        }

        let a = OccupancyIndex::build(&forward);
        let b = OccupancyIndex::build(&reversed);

        assert_eq!(a.conflicts(), b.conflicts());
        for day in Day::ALL {
            assert_eq!(
                a.occupied_blocks(&RoomRef::by_id(1), day),
                b.occupied_blocks(&RoomRef::by_id(1), day)
            );
        }
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let snapshot = scenario();
        let first = OccupancyIndex::build(&snapshot);
        let second = OccupancyIndex::build(&snapshot);

        assert_eq!(first.cells().collect::<Vec<_>>(), second.cells().collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_subjects_occupy_nothing() {
        let snapshot = snapshot(vec![room(1, "LG1-402", "Cocina 402")], vec![]);
        let index = OccupancyIndex::build(&snapshot);

        assert!(index.is_empty());
        for day in Day::ALL {
            assert!(index.occupied_blocks(&RoomRef::by_id(1), day).is_empty());
        }
        assert!(index.conflicts().is_empty());
    }

    #[test]
    fn test_conflicts_report_shared_cells() {
        let index = OccupancyIndex::build(&scenario());
        let conflicts = index.conflicts();

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].room, RoomKey::Id(1));
        assert_eq!(conflicts[0].day, Day::Monday);
        assert_eq!(conflicts[0].block_number, 3);
        assert_eq!(conflicts[0].occupants.len(), 2);
    }

    #[test]
    fn test_duplicate_assignment_in_one_section_is_not_a_conflict() {
        let snapshot = snapshot(
            vec![room(1, "LG1-402", "Cocina 402")],
            vec![subject(
                30,
                "Vinos",
                vec![section(
                    300,
                    1,
                    "A. Soto",
                    vec![
                        assignment(Day::Monday, 4, Some(1), None),
                        assignment(Day::Monday, 4, None, Some("LG1-402")),
                    ],
                )],
            )],
        );
        let index = OccupancyIndex::build(&snapshot);

        assert!(index.conflicts().is_empty());
        assert_eq!(index.occupants(&RoomRef::by_id(1), Day::Monday, 4).len(), 1);
    }

    #[test]
    fn test_room_ref_parse() {
        assert_eq!(
            RoomRef::parse(" 12 "),
            RoomRef {
                id: Some(12),
                code: Some("12".to_string())
            }
        );
        assert_eq!(RoomRef::parse("LG1-402"), RoomRef::by_code("LG1-402"));
        assert!(RoomRef::parse("  ").is_empty());
    }
}
