/// Room occupancy: the index over all sections' assignments and the views
/// built on it (block selector, day grid, conflict report)
mod blocks;
mod grid;
mod occupancy;
mod selector;

#[cfg(test)]
pub(crate) mod fixtures;

pub use blocks::SYSTEM_BLOCKS;
pub use grid::GridView;
pub use occupancy::{OccupancyIndex, RoomKey, RoomRef};
pub use selector::{availability, Draft, SelectorError};

use crate::catalog::{Room, Section, Snapshot, Subject};
use sha2::{Digest, Sha256};

/// An immutable catalog snapshot together with the index built from it.
#[derive(Debug)]
pub struct Board {
    pub snapshot: Snapshot,
    pub index: OccupancyIndex,
    /// Changes only when rooms or occupied cells change
    pub fingerprint: String,
}

impl Board {
    pub fn new(snapshot: Snapshot) -> Self {
        let index = OccupancyIndex::build(&snapshot);
        let fingerprint = fingerprint(&snapshot.rooms, &index);
        Self {
            snapshot,
            index,
            fingerprint,
        }
    }

    /// Finds a room by id first, then by code.
    pub fn find_room(&self, room: &RoomRef) -> Option<&Room> {
        let rooms = &self.snapshot.rooms;
        room.id
            .and_then(|id| rooms.iter().find(|r| r.id == id))
            .or_else(|| {
                let code = room.code.as_deref()?.trim();
                rooms.iter().find(|r| r.code == code)
            })
    }

    /// Interprets a raw room query against the catalog rooms.
    ///
    /// A number names the room with that id when there is one, then the room
    /// whose code it is. Only a number neither matches keeps both readings.
    pub fn parse_room(&self, raw: &str) -> RoomRef {
        let raw = raw.trim();
        let rooms = &self.snapshot.rooms;
        match raw.parse::<i64>() {
            Ok(id) if rooms.iter().any(|r| r.id == id) => RoomRef::by_id(id),
            Ok(_) if rooms.iter().any(|r| r.code == raw) => RoomRef::by_code(raw),
            _ => RoomRef::parse(raw),
        }
    }

    pub fn find_section(&self, section_id: i64) -> Option<(&Subject, &Section)> {
        self.snapshot.subjects.iter().find_map(|subject| {
            subject
                .sections
                .iter()
                .find(|s| s.id == section_id)
                .map(|section| (subject, section))
        })
    }

    /// Human-readable room for a canonical key.
    pub fn room_label(&self, key: &RoomKey) -> String {
        match key {
            RoomKey::Id(id) => self
                .snapshot
                .rooms
                .iter()
                .find(|r| r.id == *id)
                .map(|r| r.code.clone())
                .unwrap_or_else(|| format!("#{id}")),
            RoomKey::Code(code) => code.clone(),
        }
    }
}

fn fingerprint(rooms: &[Room], index: &OccupancyIndex) -> String {
    let mut rooms: Vec<&Room> = rooms.iter().collect();
    rooms.sort_by_key(|r| r.id);

    let mut hasher = Sha256::new();
    for room in rooms {
        hasher.update(format!("room:{}:{}:{}\n", room.id, room.code, room.name));
    }
    for (key, day, block, sections) in index.cells() {
        hasher.update(format!("cell:{key:?}:{day}:{block}:{sections:?}\n"));
    }
    let digest = hasher.finalize();
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}
