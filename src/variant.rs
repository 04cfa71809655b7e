//! Chip variants carrying a Delta-T unit
//!
//! The unit is shared by the YM2608 (OPNA), YM2610/B (OPNB) and Y8950
//! (MSX-AUDIO). They differ in address geometry, in which control bits are
//! hard-wired and in the prescaler between master clock and sample clock.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DeltaTError;

/// Chip hosting the Delta-T unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChipVariant {
    /// YM2608 (OPNA)
    Ym2608,
    /// YM2610 / YM2610B (OPNB)
    #[default]
    Ym2610,
    /// Y8950 (MSX-AUDIO)
    Y8950,
}

impl ChipVariant {
    /// Address shift from register units to bytes
    pub fn port_shift(&self) -> u32 {
        match self {
            ChipVariant::Ym2610 => 8,
            ChipVariant::Ym2608 | ChipVariant::Y8950 => 5,
        }
    }

    /// Master-clock divider to the native sample clock
    pub fn prescaler(&self) -> u32 {
        match self {
            ChipVariant::Ym2608 | ChipVariant::Ym2610 => 6 * 24,
            ChipVariant::Y8950 => 72,
        }
    }

    /// Apply the hard-wired control 1 bits.
    ///
    /// The YM2610 always uses external memory and has no REC bit.
    pub fn force_control1(&self, value: u8) -> u8 {
        match self {
            ChipVariant::Ym2610 => (value | 0x20) & !0x40,
            _ => value,
        }
    }

    /// Apply the hard-wired control 2 bits.
    ///
    /// The YM2610 has ROM only and no ROM/RAM select bit.
    pub fn force_control2(&self, value: u8) -> u8 {
        match self {
            ChipVariant::Ym2610 => value | 0x01,
            _ => value,
        }
    }

    /// Status bits wired to (BRDY, EOS) on this chip; 0 = not wired
    pub fn status_masks(&self) -> (u8, u8) {
        match self {
            ChipVariant::Ym2608 => (0x08, 0x04),
            ChipVariant::Ym2610 => (0x00, 0x80),
            ChipVariant::Y8950 => (0x08, 0x10),
        }
    }

    /// Frequency base: ratio of sample clock to output rate
    pub fn freqbase(&self, master_clock: u32, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        master_clock as f64 / sample_rate as f64 / self.prescaler() as f64
    }

    /// Master clock the chip usually runs at
    pub fn typical_clock(&self) -> u32 {
        match self {
            ChipVariant::Ym2608 | ChipVariant::Ym2610 => 8_000_000,
            ChipVariant::Y8950 => 3_579_545,
        }
    }

    /// Native output rate for a master clock
    pub fn native_rate(&self, master_clock: u32) -> u32 {
        master_clock / self.prescaler()
    }
}

impl fmt::Display for ChipVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChipVariant::Ym2608 => write!(f, "YM2608"),
            ChipVariant::Ym2610 => write!(f, "YM2610"),
            ChipVariant::Y8950 => write!(f, "Y8950"),
        }
    }
}

impl FromStr for ChipVariant {
    type Err = DeltaTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ym2608" | "opna" => Ok(ChipVariant::Ym2608),
            "ym2610" | "ym2610b" | "opnb" => Ok(ChipVariant::Ym2610),
            "y8950" | "msx-audio" => Ok(ChipVariant::Y8950),
            other => Err(DeltaTError::Config(format!("unknown chip variant '{other}'"))),
        }
    }
}
