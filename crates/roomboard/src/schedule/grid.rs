/// Read-only rooms × blocks grid for one day
use super::blocks::{SystemBlock, SYSTEM_BLOCKS};
use super::occupancy::{Occupant, OccupancyIndex, RoomRef};
use crate::catalog::{Day, Room};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub day: Day,
    pub rooms: Vec<Room>,
    pub rows: Vec<GridRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridRow {
    pub block: SystemBlock,
    /// One cell per room, in the same order as `GridView::rooms`
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub occupants: Vec<Occupant>,
    pub conflict: bool,
    /// Hover text, absent for empty cells
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl GridCell {
    fn new(occupants: Vec<Occupant>, block: &SystemBlock) -> Self {
        if occupants.is_empty() {
            return Self::default();
        }

        let detail = occupants
            .iter()
            .map(|o| {
                format!(
                    "{} · Section {} · {} ({}-{})",
                    o.subject_name, o.section_number, o.instructor, block.start_time, block.end_time
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            conflict: occupants.len() > 1,
            occupants,
            detail: Some(detail),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }
}

impl GridView {
    /// Builds the grid for `day` with one row per system block and one column
    /// per room, keeping the catalog's room order.
    pub fn for_day(index: &OccupancyIndex, rooms: &[Room], day: Day) -> Self {
        let refs: Vec<RoomRef> = rooms.iter().map(RoomRef::of).collect();

        let rows = SYSTEM_BLOCKS
            .iter()
            .map(|block| GridRow {
                block: *block,
                cells: refs
                    .iter()
                    .map(|room| {
                        let occupants = index
                            .occupants(room, day, block.number)
                            .into_iter()
                            .cloned()
                            .collect();
                        GridCell::new(occupants, block)
                    })
                    .collect(),
            })
            .collect();

        Self {
            day,
            rooms: rooms.to_vec(),
            rows,
        }
    }

    pub fn occupied_cells(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| &row.cells)
            .filter(|cell| !cell.is_empty())
            .count()
    }
}
