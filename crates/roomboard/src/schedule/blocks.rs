/// The institution's fixed daily time blocks, shared by every room and day
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemBlock {
    pub number: u8,
    pub start_time: &'static str,
    pub end_time: &'static str,
}

impl SystemBlock {
    const fn new(number: u8, start_time: &'static str, end_time: &'static str) -> Self {
        Self {
            number,
            start_time,
            end_time,
        }
    }
}

/// 40-minute blocks starting every 45 minutes from 08:00.
pub const SYSTEM_BLOCKS: [SystemBlock; 20] = [
    SystemBlock::new(1, "08:00", "08:40"),
    SystemBlock::new(2, "08:45", "09:25"),
    SystemBlock::new(3, "09:30", "10:10"),
    SystemBlock::new(4, "10:15", "10:55"),
    SystemBlock::new(5, "11:00", "11:40"),
    SystemBlock::new(6, "11:45", "12:25"),
    SystemBlock::new(7, "12:30", "13:10"),
    SystemBlock::new(8, "13:15", "13:55"),
    SystemBlock::new(9, "14:00", "14:40"),
    SystemBlock::new(10, "14:45", "15:25"),
    SystemBlock::new(11, "15:30", "16:10"),
    SystemBlock::new(12, "16:15", "16:55"),
    SystemBlock::new(13, "17:00", "17:40"),
    SystemBlock::new(14, "17:45", "18:25"),
    SystemBlock::new(15, "18:30", "19:10"),
    SystemBlock::new(16, "19:15", "19:55"),
    SystemBlock::new(17, "20:00", "20:40"),
    SystemBlock::new(18, "20:45", "21:25"),
    SystemBlock::new(19, "21:30", "22:10"),
    SystemBlock::new(20, "22:15", "22:55"),
];

/// Looks up a system block by its number.
pub fn find_block(number: u8) -> Option<&'static SystemBlock> {
    SYSTEM_BLOCKS.iter().find(|b| b.number == number)
}
