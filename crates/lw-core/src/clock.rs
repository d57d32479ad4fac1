use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::TimeBlock;

/// Segments in one time block.
pub const SEGMENTS_PER_BLOCK: u32 = 4;
/// Time blocks in one day.
pub const BLOCKS_PER_DAY: u32 = 4;

/// Tracks in-game time: a day counter, the time block within the day, and the
/// segment within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameClock {
    /// Day number, starting at 1.
    pub day: u32,
    /// Current block of the day.
    pub block: TimeBlock,
    /// Segment within the block (`0..SEGMENTS_PER_BLOCK`).
    pub segment: u32,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            day: 1,
            block: TimeBlock::Morning,
            segment: 0,
        }
    }
}

impl GameClock {
    /// Clock at the start of the given day and block.
    pub fn at(day: u32, block: TimeBlock) -> Self {
        Self {
            day,
            block,
            segment: 0,
        }
    }

    fn segment_of_day(&self) -> u32 {
        self.block.index() * SEGMENTS_PER_BLOCK + self.segment
    }

    /// Advance by a number of segments, rolling blocks and days over.
    /// Returns the number of days crossed.
    pub fn advance_segments(&mut self, segments: u32) -> u32 {
        let per_day = SEGMENTS_PER_BLOCK * BLOCKS_PER_DAY;
        let total = self.segment_of_day() + segments;
        let days = total / per_day;
        let within = total % per_day;
        self.day += days;
        self.block = TimeBlock::from_index(within / SEGMENTS_PER_BLOCK);
        self.segment = within % SEGMENTS_PER_BLOCK;
        days
    }

    /// Jump to the start of a later block today. No-op if the clock is
    /// already at or past that block.
    pub fn advance_to_block(&mut self, block: TimeBlock) -> bool {
        if block <= self.block {
            return false;
        }
        self.block = block;
        self.segment = 0;
        true
    }

    /// Jump to the start of the given block on the next day.
    pub fn advance_to_next_day(&mut self, block: TimeBlock) {
        self.day += 1;
        self.block = block;
        self.segment = 0;
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} {} ({}/{})", self.day, self.block, self.segment, SEGMENTS_PER_BLOCK)
    }
}
