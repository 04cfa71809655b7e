//! Address / Memory Controller
//!
//! Derives the start, end and limit addresses from their register pairs and
//! tracks the live nibble cursor. Register pairs are expressed in units of
//! `1 << (port_shift - dram_shift)` bytes; `start`, `end` and `limit` are kept
//! as byte addresses and compared against the cursor doubled into nibble space.

use super::registers::{Register, RegisterBank};
use super::tables::{DRAM_RIGHT_SHIFT, NIBBLE_ADDRESS_MASK};

/// Dummy reads required before external memory is accessed through $08
pub const DUMMY_READS: u8 = 2;

/// Start/end/limit window plus the live cursor
#[derive(Debug, Clone)]
pub struct AddressController {
    /// Chip-dependent address shift (8 for YM2610, 5 for YM2608/Y8950)
    port_shift: u32,
    /// Memory-type dependent right shift applied to `port_shift`
    dram_shift: u32,
    start: u32,
    end: u32,
    limit: u32,
    /// Current nibble address
    now_addr: u32,
    /// Remaining dummy reads
    memread: u8,
}

impl AddressController {
    /// Create a controller for a chip with the given address shift
    pub fn new(port_shift: u32) -> Self {
        let mut ctrl = Self {
            port_shift,
            dram_shift: 0,
            start: 0,
            end: 0,
            limit: 0,
            now_addr: 0,
            memread: 0,
        };
        ctrl.reset(0x01);
        ctrl
    }

    /// Reset the window; the limit is opened fully so chips without a
    /// limit register never wrap.
    pub fn reset(&mut self, control2: u8) {
        self.now_addr = 0;
        self.start = 0;
        self.end = 0;
        self.limit = u32::MAX;
        self.dram_shift = DRAM_RIGHT_SHIFT[(control2 & 0x03) as usize];
    }

    /// Effective left shift from register units to byte addresses
    pub fn shift(&self) -> u32 {
        self.port_shift.saturating_sub(self.dram_shift)
    }

    /// Re-derive the start address from $02/$03
    pub fn derive_start(&mut self, regs: &RegisterBank) {
        self.start = regs.pair(Register::StartLo, Register::StartHi) << self.shift();
    }

    /// Re-derive the end address from $04/$05 (inclusive of the last unit)
    pub fn derive_end(&mut self, regs: &RegisterBank) {
        let shift = self.shift();
        self.end = regs.pair(Register::StopLo, Register::StopHi) << shift;
        self.end += (1 << shift) - 1;
    }

    /// Re-derive the limit address from $0C/$0D
    pub fn derive_limit(&mut self, regs: &RegisterBank) {
        self.limit = regs.pair(Register::LimitLo, Register::LimitHi) << self.shift();
    }

    /// Apply a memory-type selector. Returns true when the shift changed and
    /// the whole window was re-derived.
    pub fn set_memory_type(&mut self, selector: u8, regs: &RegisterBank) -> bool {
        let dram_shift = DRAM_RIGHT_SHIFT[(selector & 0x03) as usize];
        if dram_shift == self.dram_shift {
            return false;
        }
        self.dram_shift = dram_shift;
        self.derive_start(regs);
        self.derive_end(regs);
        self.derive_limit(regs);
        true
    }

    /// Byte start address
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Byte end address (inclusive)
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Byte limit address
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Start address in nibble space
    pub fn start_nibble(&self) -> u32 {
        self.start << 1
    }

    /// End address in nibble space
    pub fn end_nibble(&self) -> u32 {
        self.end << 1
    }

    /// Limit address in nibble space
    pub fn limit_nibble(&self) -> u32 {
        self.limit << 1
    }

    /// Current nibble cursor
    pub fn now_addr(&self) -> u32 {
        self.now_addr
    }

    /// Byte address under the cursor
    pub fn byte_addr(&self) -> u32 {
        self.now_addr >> 1
    }

    /// Overwrite the cursor, masked to the nibble bus
    pub fn set_now_addr(&mut self, addr: u32) {
        self.now_addr = addr & NIBBLE_ADDRESS_MASK;
    }

    /// Move the cursor to the start of the window
    pub fn rewind(&mut self) {
        self.now_addr = self.start_nibble();
    }

    /// True when the cursor sits on the limit address
    pub fn at_limit(&self) -> bool {
        self.now_addr == self.limit_nibble()
    }

    /// True when the cursor sits on the end address
    pub fn at_end(&self) -> bool {
        self.now_addr == self.end_nibble()
    }

    /// Advance by one nibble, wrapping at the 25-bit nibble bus
    pub fn advance_nibble(&mut self) {
        self.now_addr = (self.now_addr + 1) & NIBBLE_ADDRESS_MASK;
    }

    /// Advance by one byte (two nibbles), wrapping like [`Self::advance_nibble`];
    /// used by $08 memory access
    pub fn advance_byte(&mut self) {
        self.now_addr = (self.now_addr + 2) & NIBBLE_ADDRESS_MASK;
    }

    /// Arm the dummy-read countdown
    pub fn arm_dummy_reads(&mut self) {
        self.memread = DUMMY_READS;
    }

    /// Remaining dummy reads
    pub fn memread(&self) -> u8 {
        self.memread
    }

    pub(crate) fn set_memread(&mut self, memread: u8) {
        self.memread = memread;
    }
}
