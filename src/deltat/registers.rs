//! Delta-T Register Definitions
//!
//! Defines the 16-entry register window of the ADPCM-B unit and the bit
//! layouts of the two control registers.

use bitflags::bitflags;
use std::fmt;

/// Number of register slots in the unit.
pub const REGISTER_COUNT: usize = 16;

/// Delta-T Register Address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Control 1: START/REC/MEMDATA/REPEAT/SPOFF/RESET - $00
    Control1 = 0x00,
    /// Control 2: pan and memory type - $01
    Control2 = 0x01,
    /// Start address (low byte) - $02
    StartLo = 0x02,
    /// Start address (high byte) - $03
    StartHi = 0x03,
    /// Stop address (low byte) - $04
    StopLo = 0x04,
    /// Stop address (high byte) - $05
    StopHi = 0x05,
    /// Prescaler (low byte) - $06
    PrescaleLo = 0x06,
    /// Prescaler (high byte) - $07
    PrescaleHi = 0x07,
    /// ADPCM data port - $08
    Data = 0x08,
    /// Delta-N playback rate (low byte) - $09
    DeltaNLo = 0x09,
    /// Delta-N playback rate (high byte) - $0A
    DeltaNHi = 0x0A,
    /// Linear output level - $0B
    Volume = 0x0B,
    /// Limit address (low byte) - $0C
    LimitLo = 0x0C,
    /// Limit address (high byte) - $0D
    LimitHi = 0x0D,
}

impl Register {
    /// Convert a raw register index to a `Register`.
    ///
    /// Returns `None` for the unused slots $0E/$0F and anything past $0F.
    pub fn from_addr(addr: u8) -> Option<Self> {
        match addr {
            0x00 => Some(Register::Control1),
            0x01 => Some(Register::Control2),
            0x02 => Some(Register::StartLo),
            0x03 => Some(Register::StartHi),
            0x04 => Some(Register::StopLo),
            0x05 => Some(Register::StopHi),
            0x06 => Some(Register::PrescaleLo),
            0x07 => Some(Register::PrescaleHi),
            0x08 => Some(Register::Data),
            0x09 => Some(Register::DeltaNLo),
            0x0A => Some(Register::DeltaNHi),
            0x0B => Some(Register::Volume),
            0x0C => Some(Register::LimitLo),
            0x0D => Some(Register::LimitHi),
            _ => None,
        }
    }

    /// Get the register address value
    pub fn addr(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Control1 => write!(f, "$00 (Control 1)"),
            Register::Control2 => write!(f, "$01 (Control 2)"),
            Register::StartLo => write!(f, "$02 (Start Address Low)"),
            Register::StartHi => write!(f, "$03 (Start Address High)"),
            Register::StopLo => write!(f, "$04 (Stop Address Low)"),
            Register::StopHi => write!(f, "$05 (Stop Address High)"),
            Register::PrescaleLo => write!(f, "$06 (Prescale Low)"),
            Register::PrescaleHi => write!(f, "$07 (Prescale High)"),
            Register::Data => write!(f, "$08 (ADPCM Data)"),
            Register::DeltaNLo => write!(f, "$09 (Delta-N Low)"),
            Register::DeltaNHi => write!(f, "$0A (Delta-N High)"),
            Register::Volume => write!(f, "$0B (Output Level)"),
            Register::LimitLo => write!(f, "$0C (Limit Address Low)"),
            Register::LimitHi => write!(f, "$0D (Limit Address High)"),
        }
    }
}

bitflags! {
    /// Control 1 ($00) operating-mode bits as latched into `portstate`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PortState: u8 {
        /// Start playback / memory access
        const START = 0x80;
        /// 1 = analysis (record), 0 = synthesis
        const REC = 0x40;
        /// 1 = external memory, 0 = CPU data port
        const MEMDATA = 0x20;
        /// Restart at the start address on reaching the end address
        const REPEAT = 0x10;
        /// Speaker off (not latched)
        const SPOFF = 0x08;
        /// Stop and reset the unit
        const RESET = 0x01;
    }
}

/// Operating mode selected by START, REC and MEMDATA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Idle with CPU data port (0x00)
    Idle,
    /// External memory read via $08 (0x20)
    MemoryRead,
    /// CPU analysis without START (0x40)
    RecordIdle,
    /// External memory write via $08 (0x60)
    MemoryWrite,
    /// Synthesis from bytes fed through $08 (0x80)
    CpuSynthesis,
    /// Synthesis from external memory (0xA0)
    MemorySynthesis,
    /// Analysis to the CPU data port (0xC0), not emulated
    CpuAnalysis,
    /// Analysis to external memory (0xE0), not emulated
    MemoryAnalysis,
}

impl PortState {
    /// Bits latched from a control 1 write (SPOFF is not kept)
    pub const LATCHED: PortState = PortState::START
        .union(PortState::REC)
        .union(PortState::MEMDATA)
        .union(PortState::REPEAT)
        .union(PortState::RESET);

    /// Decode the operating mode from the top three bits
    pub fn mode(&self) -> Mode {
        match self.bits() & 0xE0 {
            0x20 => Mode::MemoryRead,
            0x40 => Mode::RecordIdle,
            0x60 => Mode::MemoryWrite,
            0x80 => Mode::CpuSynthesis,
            0xA0 => Mode::MemorySynthesis,
            0xC0 => Mode::CpuAnalysis,
            0xE0 => Mode::MemoryAnalysis,
            _ => Mode::Idle,
        }
    }
}

bitflags! {
    /// Control 2 ($01): L, R, -, -, SAMPLE, DA/AD, RAMTYPE, ROM
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control2: u8 {
        /// Left output enable
        const LEFT = 0x80;
        /// Right output enable
        const RIGHT = 0x40;
        /// Sample bit
        const SAMPLE = 0x08;
        /// DA/AD conversion
        const DA_AD = 0x04;
        /// RAM type (x1 bit / x8 bit)
        const RAM_TYPE = 0x02;
        /// ROM select
        const ROM = 0x01;
    }
}

impl Control2 {
    /// Memory-type selector (bits 0-1)
    pub fn memory_type(&self) -> u8 {
        self.bits() & 0x03
    }

    /// Output slot selector (bits 6-7)
    pub fn pan_index(&self) -> usize {
        ((self.bits() >> 6) & 0x03) as usize
    }
}

/// Raw register bank (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBank {
    /// Last written byte per register index
    pub registers: [u8; REGISTER_COUNT],
}

impl RegisterBank {
    /// Create a new register bank with all values set to 0
    pub fn new() -> Self {
        RegisterBank {
            registers: [0; REGISTER_COUNT],
        }
    }

    /// Read a register value
    pub fn read(&self, addr: u8) -> u8 {
        self.registers[(addr & 0x0F) as usize]
    }

    /// Write a register value
    pub fn write(&mut self, addr: u8, value: u8) {
        self.registers[(addr & 0x0F) as usize] = value;
    }

    /// Combine a low/high register pair into a 16-bit value
    pub fn pair(&self, lo: Register, hi: Register) -> u32 {
        (self.read(hi.addr()) as u32) << 8 | self.read(lo.addr()) as u32
    }

    /// Get all registers as a slice
    pub fn as_slice(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}
