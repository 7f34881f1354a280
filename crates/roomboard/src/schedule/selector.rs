//! Block selection for one section's weekly schedule.
//!
//! The operator picks a room and a day, then chooses blocks. Occupied blocks
//! are disabled unless the section being edited already held that exact
//! (room, day, block) when editing started, so a section can re-save its own
//! slots.

use super::blocks::{find_block, SystemBlock, SYSTEM_BLOCKS};
use super::occupancy::{OccupancyIndex, RoomRef};
use crate::catalog::{Day, Room, ScheduleAssignment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockAvailability {
    pub number: u8,
    pub start_time: &'static str,
    pub end_time: &'static str,
    /// Some section, possibly the edited one, holds this block
    pub occupied: bool,
    /// The edited section held this block when editing started
    pub self_owned: bool,
    pub selectable: bool,
}

/// Availability of every system block in `room` on `day`.
///
/// # Arguments
/// * `initial` - The edited section's assignments as they were before editing
pub fn availability(
    index: &OccupancyIndex,
    room: &RoomRef,
    day: Day,
    initial: &[ScheduleAssignment],
) -> Vec<BlockAvailability> {
    let keys = index.resolve(room);
    let occupied = index.occupied_blocks(room, day);

    SYSTEM_BLOCKS
        .iter()
        .map(|block| {
            let occupied = occupied.contains(&block.number);
            let self_owned = initial
                .iter()
                .any(|a| index.claims(a, &keys, day, block.number));
            BlockAvailability {
                number: block.number,
                start_time: block.start_time,
                end_time: block.end_time,
                occupied,
                self_owned,
                selectable: !occupied || self_owned,
            }
        })
        .collect()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("No blocks selected")]
    EmptySelection,

    #[error("Block {0} is not a system block")]
    UnknownBlock(u8),

    #[error("Block {block} in {room_code} on {day} is occupied by another section")]
    BlockUnavailable {
        block: u8,
        room_code: String,
        day: Day,
    },

    #[error("No pending assignment at index {index} (draft has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Pending assignment list of one section being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// `None` for a section the catalog doesn't know yet
    pub section_id: Option<i64>,
    pub initial: Vec<ScheduleAssignment>,
    pub pending: Vec<ScheduleAssignment>,
}

impl Draft {
    /// Starts editing with the section's current schedule as the pending list.
    pub fn new(section_id: Option<i64>, initial: Vec<ScheduleAssignment>) -> Self {
        Self {
            section_id,
            pending: initial.clone(),
            initial,
        }
    }

    pub fn availability(
        &self,
        index: &OccupancyIndex,
        room: &RoomRef,
        day: Day,
    ) -> Vec<BlockAvailability> {
        availability(index, room, day, &self.initial)
    }

    /// Appends one assignment per chosen block, copying the room and the
    /// system block's times.
    ///
    /// Either every block is accepted or none is. Blocks already pending for
    /// the same room and day are skipped.
    ///
    /// # Returns
    /// * `Ok(n)` - Number of assignments appended
    /// * `Err(SelectorError)` - If a block is unknown or not selectable
    pub fn confirm(
        &mut self,
        index: &OccupancyIndex,
        room: &Room,
        day: Day,
        blocks: &[u8],
    ) -> Result<usize, SelectorError> {
        if blocks.is_empty() {
            return Err(SelectorError::EmptySelection);
        }

        let room_ref = RoomRef::of(room);
        let slots = self.availability(index, &room_ref, day);

        let mut chosen: Vec<&'static SystemBlock> = Vec::with_capacity(blocks.len());
        for &number in blocks {
            let block = find_block(number).ok_or(SelectorError::UnknownBlock(number))?;
            if !slots.iter().any(|s| s.number == number && s.selectable) {
                return Err(SelectorError::BlockUnavailable {
                    block: number,
                    room_code: room.code.clone(),
                    day,
                });
            }
            if !chosen.iter().any(|c| c.number == number) {
                chosen.push(block);
            }
        }

        let keys = index.resolve(&room_ref);
        let before = self.pending.len();
        for block in chosen {
            if self
                .pending
                .iter()
                .any(|a| index.claims(a, &keys, day, block.number))
            {
                continue;
            }
            self.pending.push(ScheduleAssignment {
                day,
                block_number: block.number,
                room_id: Some(room.id),
                room_code: Some(room.code.clone()),
                room_name: Some(room.name.clone()),
                start_time: block.start_time.to_string(),
                end_time: block.end_time.to_string(),
            });
        }

        Ok(self.pending.len() - before)
    }

    /// Removes the pending assignment at `index`.
    pub fn remove(&mut self, index: usize) -> Result<ScheduleAssignment, SelectorError> {
        if index >= self.pending.len() {
            return Err(SelectorError::IndexOutOfRange {
                index,
                len: self.pending.len(),
            });
        }
        Ok(self.pending.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::fixtures::*;

    fn block(slots: &[BlockAvailability], number: u8) -> &BlockAvailability {
        slots.iter().find(|s| s.number == number).unwrap()
    }

    fn section_a_initial() -> Vec<ScheduleAssignment> {
        vec![assignment(Day::Monday, 3, None, Some("LG1-402"))]
    }

    #[test]
    fn test_new_section_sees_occupied_block_disabled() {
        let index = OccupancyIndex::build(&scenario());
        let slots = availability(&index, &RoomRef::by_code("LG1-402"), Day::Monday, &[]);

        assert_eq!(slots.len(), SYSTEM_BLOCKS.len());
        assert!(block(&slots, 3).occupied);
        assert!(!block(&slots, 3).selectable);
        assert!(block(&slots, 4).selectable);
    }

    #[test]
    fn test_own_block_stays_selectable() {
        let index = OccupancyIndex::build(&scenario());
        let initial = section_a_initial();

        let slots = availability(&index, &RoomRef::by_code("LG1-402"), Day::Monday, &initial);
        let own = block(&slots, 3);
        assert!(own.occupied);
        assert!(own.self_owned);
        assert!(own.selectable);

        // Same room queried by id resolves to the same key
        let slots = availability(&index, &RoomRef::by_id(1), Day::Monday, &initial);
        assert!(block(&slots, 3).selectable);

        // Another day in the same room gets no exemption
        let slots = availability(&index, &RoomRef::by_id(1), Day::Tuesday, &initial);
        assert!(!block(&slots, 3).self_owned);
    }

    #[test]
    fn test_self_exclusion_does_not_leak_to_other_sessions() {
        let index = OccupancyIndex::build(&scenario());
        let mut editing_a = Draft::new(Some(100), section_a_initial());
        let editing_c = Draft::new(None, vec![]);

        let room = RoomRef::by_id(1);
        assert!(block(&editing_a.availability(&index, &room, Day::Monday), 3).selectable);
        assert!(!block(&editing_c.availability(&index, &room, Day::Monday), 3).selectable);

        // Removing the slot from A's pending list keeps it re-selectable for A
        editing_a.remove(0).unwrap();
        assert!(block(&editing_a.availability(&index, &room, Day::Monday), 3).selectable);
        assert!(index.is_occupied(&room, Day::Monday, 3));
    }

    #[test]
    fn test_confirm_appends_room_and_block_times() {
        let snapshot = scenario();
        let index = OccupancyIndex::build(&snapshot);
        let mut draft = Draft::new(None, vec![]);

        let added = draft
            .confirm(&index, &snapshot.rooms[0], Day::Monday, &[4, 5, 4])
            .unwrap();
        assert_eq!(added, 2);

        let first = &draft.pending[0];
        assert_eq!(first.block_number, 4);
        assert_eq!(first.room_id, Some(1));
        assert_eq!(first.room_code.as_deref(), Some("LG1-402"));
        assert_eq!(first.room_name.as_deref(), Some("Cocina 402"));
        assert_eq!(first.start_time, "10:15");
        assert_eq!(first.end_time, "10:55");

        // Re-confirming pending blocks adds nothing
        assert_eq!(
            draft.confirm(&index, &snapshot.rooms[0], Day::Monday, &[5]).unwrap(),
            0
        );
    }

    #[test]
    fn test_confirm_rejects_occupied_block_atomically() {
        let snapshot = scenario();
        let index = OccupancyIndex::build(&snapshot);
        let mut draft = Draft::new(None, vec![]);

        let err = draft
            .confirm(&index, &snapshot.rooms[0], Day::Monday, &[4, 3])
            .unwrap_err();
        assert_eq!(
            err,
            SelectorError::BlockUnavailable {
                block: 3,
                room_code: "LG1-402".to_string(),
                day: Day::Monday,
            }
        );
        assert!(draft.pending.is_empty());
    }

    #[test]
    fn test_confirm_own_block_after_removal() {
        let snapshot = scenario();
        let index = OccupancyIndex::build(&snapshot);
        let mut draft = Draft::new(Some(100), section_a_initial());

        // Already pending: nothing to add
        assert_eq!(
            draft.confirm(&index, &snapshot.rooms[0], Day::Monday, &[3]).unwrap(),
            0
        );

        draft.remove(0).unwrap();
        assert_eq!(
            draft.confirm(&index, &snapshot.rooms[0], Day::Monday, &[3]).unwrap(),
            1
        );
    }

    #[test]
    fn test_confirm_validation_errors() {
        let snapshot = scenario();
        let index = OccupancyIndex::build(&snapshot);
        let mut draft = Draft::new(None, vec![]);

        assert_eq!(
            draft.confirm(&index, &snapshot.rooms[0], Day::Monday, &[]),
            Err(SelectorError::EmptySelection)
        );
        assert_eq!(
            draft.confirm(&index, &snapshot.rooms[0], Day::Monday, &[21]),
            Err(SelectorError::UnknownBlock(21))
        );
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut draft = Draft::new(Some(100), section_a_initial());
        assert_eq!(
            draft.remove(1),
            Err(SelectorError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(draft.remove(0).unwrap().block_number, 3);
        assert!(draft.pending.is_empty());
        assert_eq!(draft.initial.len(), 1);
    }
}
