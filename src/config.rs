//! Attach-time configuration
//!
//! Everything the host decides once when it wires a Delta-T unit into a
//! chip: which chip, the frequency base, the output range and the status
//! bits the unit drives.

use serde::{Deserialize, Serialize};

use crate::output::Pan;
use crate::variant::ChipVariant;
use crate::{DeltaTError, Result};

/// Default output range (23 bits), giving `volume == register value`
pub const DEFAULT_OUTPUT_RANGE: i32 = 1 << 23;

/// Status-register wiring of the owning chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Identity passed back to the status sink and the memory bridge
    pub chip_id: u8,
    /// Bit raised/cleared for BRDY (0 = not wired)
    pub brdy_mask: u8,
    /// Bit raised for EOS (0 = not wired)
    pub eos_mask: u8,
}

/// Delta-T unit configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaTConfig {
    /// Hosting chip
    pub variant: ChipVariant,
    /// Delta-N to phase-step factor
    pub freqbase: f64,
    /// Output range used to derive the linear volume
    pub output_range: i32,
    /// Status wiring
    pub status: StatusConfig,
    /// Output slot selected on reset
    pub pan: Pan,
}

impl DeltaTConfig {
    /// Configuration for a chip with its native status wiring and a
    /// frequency base of 1.0 (output at the native rate)
    pub fn for_variant(variant: ChipVariant) -> Self {
        let (brdy_mask, eos_mask) = variant.status_masks();
        Self {
            variant,
            freqbase: 1.0,
            output_range: DEFAULT_OUTPUT_RANGE,
            status: StatusConfig {
                chip_id: 0,
                brdy_mask,
                eos_mask,
            },
            pan: Pan::Slot0,
        }
    }

    /// Derive the frequency base from master clock and output rate
    pub fn with_clocks(mut self, master_clock: u32, sample_rate: u32) -> Self {
        self.freqbase = self.variant.freqbase(master_clock, sample_rate);
        self
    }

    /// Override the frequency base
    pub fn with_freqbase(mut self, freqbase: f64) -> Self {
        self.freqbase = freqbase;
        self
    }

    /// Override the status wiring
    pub fn with_status(mut self, status: StatusConfig) -> Self {
        self.status = status;
        self
    }

    /// Override the output range
    pub fn with_output_range(mut self, output_range: i32) -> Self {
        self.output_range = output_range;
        self
    }

    /// Output slot used after reset
    pub fn with_pan(mut self, pan: Pan) -> Self {
        self.pan = pan;
        self
    }

    /// Check the values the unit cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.freqbase.is_finite() || self.freqbase < 0.0 {
            return Err(DeltaTError::Config(format!(
                "freqbase must be finite and non-negative, got {}",
                self.freqbase
            )));
        }
        if self.output_range < 256 {
            return Err(DeltaTError::Config(format!(
                "output range must be at least 256, got {}",
                self.output_range
            )));
        }
        Ok(())
    }
}

impl Default for DeltaTConfig {
    fn default() -> Self {
        Self::for_variant(ChipVariant::default())
    }
}
