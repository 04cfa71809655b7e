//! Output Bus
//!
//! Up to four accumulators shared by every voice of a chip. The unit adds
//! its contribution into the slot selected by the control 2 pan bits.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of accumulator slots
pub const OUTPUT_SLOTS: usize = 4;

/// Output slot selected by control 2 bits 6-7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Pan {
    /// Bits 00: no output on a stereo chip
    #[default]
    Slot0,
    /// Bits 01: right
    Slot1,
    /// Bits 10: left
    Slot2,
    /// Bits 11: left + right
    Slot3,
}

impl Pan {
    /// Map a slot index (masked to 0-3)
    pub fn from_index(index: usize) -> Self {
        match index & 0x03 {
            0 => Pan::Slot0,
            1 => Pan::Slot1,
            2 => Pan::Slot2,
            _ => Pan::Slot3,
        }
    }

    /// Slot index
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Four-slot accumulator bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputBus {
    slots: [i32; OUTPUT_SLOTS],
}

impl OutputBus {
    /// Create a cleared bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every slot (once per output tick, before voices accumulate)
    pub fn clear(&mut self) {
        self.slots = [0; OUTPUT_SLOTS];
    }

    /// Add a contribution into a slot
    pub fn accumulate(&mut self, pan: Pan, value: i32) {
        let slot = &mut self.slots[pan.index()];
        *slot = slot.wrapping_add(value);
    }

    /// Raw slot values
    pub fn slots(&self) -> &[i32; OUTPUT_SLOTS] {
        &self.slots
    }
}

impl Index<Pan> for OutputBus {
    type Output = i32;

    fn index(&self, pan: Pan) -> &i32 {
        &self.slots[pan.index()]
    }
}

impl IndexMut<Pan> for OutputBus {
    fn index_mut(&mut self, pan: Pan) -> &mut i32 {
        &mut self.slots[pan.index()]
    }
}
