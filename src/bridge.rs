//! Host collaborators
//!
//! The unit reaches host-owned memory and the owning chip's status register
//! only through these two capabilities. Both are optional on a `DeltaT`; an
//! unattached capability behaves as a silent no-op.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Byte-level access to the external ROM/RAM behind the unit
pub trait MemoryBridge: Send {
    /// Read one byte at a byte address
    fn read_byte(&self, addr: u32) -> u8;

    /// Write one byte at a byte address on behalf of `chip`
    ///
    /// Default implementation ignores the write (ROM).
    fn write_byte(&mut self, _chip: u8, _addr: u32, _value: u8) {}
}

/// Status-register side channel of the owning chip
pub trait StatusSink: Send {
    /// Set `mask` bits in the status register of `chip`
    fn set_bits(&mut self, chip: u8, mask: u8);

    /// Clear `mask` bits in the status register of `chip`
    fn clear_bits(&mut self, chip: u8, mask: u8);
}

/// Plain memory image. Reads past the end return 0, writes past the end
/// are dropped.
impl MemoryBridge for Vec<u8> {
    fn read_byte(&self, addr: u32) -> u8 {
        self.get(addr as usize).copied().unwrap_or(0)
    }

    fn write_byte(&mut self, _chip: u8, addr: u32, value: u8) {
        if let Some(slot) = self.get_mut(addr as usize) {
            *slot = value;
        }
    }
}

/// Read-only memory image
impl MemoryBridge for Box<[u8]> {
    fn read_byte(&self, addr: u32) -> u8 {
        self.get(addr as usize).copied().unwrap_or(0)
    }
}

/// Memory shared between the host and the unit
///
/// Cloning yields another handle to the same bytes, so the host can load or
/// inspect RAM while the unit holds its own handle.
#[derive(Debug, Clone, Default)]
pub struct SharedMemory {
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl SharedMemory {
    /// Wrap an existing image
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(RwLock::new(bytes)),
        }
    }

    /// Zero-filled memory of `len` bytes
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Copy of the current contents
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    /// True when no memory is mapped
    pub fn is_empty(&self) -> bool {
        self.bytes.read().is_empty()
    }

    /// Host-side byte poke
    pub fn poke(&self, addr: u32, value: u8) {
        if let Some(slot) = self.bytes.write().get_mut(addr as usize) {
            *slot = value;
        }
    }

    /// Host-side byte peek
    pub fn peek(&self, addr: u32) -> u8 {
        self.bytes.read().get(addr as usize).copied().unwrap_or(0)
    }
}

impl MemoryBridge for SharedMemory {
    fn read_byte(&self, addr: u32) -> u8 {
        self.peek(addr)
    }

    fn write_byte(&mut self, _chip: u8, addr: u32, value: u8) {
        self.poke(addr, value);
    }
}

/// Status byte shared between the host and the unit
///
/// Models a single chip; the chip id passed by the unit is not used.
#[derive(Debug, Clone, Default)]
pub struct SharedStatus {
    bits: Arc<Mutex<u8>>,
}

impl SharedStatus {
    /// Create a cleared status byte
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status bits
    pub fn bits(&self) -> u8 {
        *self.bits.lock()
    }

    /// True when every bit in `mask` is set
    pub fn contains(&self, mask: u8) -> bool {
        mask != 0 && self.bits() & mask == mask
    }

    /// Host-side acknowledge (the chip's flag-reset register)
    pub fn acknowledge(&self, mask: u8) {
        *self.bits.lock() &= !mask;
    }
}

impl StatusSink for SharedStatus {
    fn set_bits(&mut self, _chip: u8, mask: u8) {
        *self.bits.lock() |= mask;
    }

    fn clear_bits(&mut self, _chip: u8, mask: u8) {
        *self.bits.lock() &= !mask;
    }
}
