//! ADPCM-B Decode Engine
//!
//! Phase accumulator, nibble decoder and output interpolator shared by the
//! external-memory and CPU-memory synthesis paths.

use super::tables::{
    DECODE_MAX, DECODE_MIN, DELTA_DEFAULT, DELTA_MAX, DELTA_MIN, DELTA_TABLE, FORECAST_TABLE,
    STEP_ONE, STEP_SHIFT,
};

/// Decoder state: accumulator pair, adaptive delta and phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    /// Current decoded value
    pub acc: i32,
    /// Value before the last nibble, interpolation origin
    pub prev_acc: i32,
    /// Adaptive step size
    pub adpcmd: i32,
    /// Last interpolated, volume-scaled output
    pub adpcml: i32,
    /// Phase accumulator (16 fractional bits)
    pub now_step: u32,
    /// Phase increment per output tick
    pub step: u32,
    /// Byte currently being split into nibbles
    pub now_data: u8,
}

impl Decoder {
    /// Create a zeroed decoder with the default delta
    pub fn new() -> Self {
        Decoder {
            acc: 0,
            prev_acc: 0,
            adpcmd: DELTA_DEFAULT,
            adpcml: 0,
            now_step: 0,
            step: 0,
            now_data: 0,
        }
    }

    /// State loaded when START is written
    pub fn start(&mut self) {
        self.now_step = 0;
        self.acc = 0;
        self.prev_acc = 0;
        self.adpcml = 0;
        self.adpcmd = DELTA_DEFAULT;
        self.now_data = 0;
    }

    /// State loaded when playback repeats from the start address
    pub fn restart(&mut self) {
        self.acc = 0;
        self.adpcmd = DELTA_DEFAULT;
        self.prev_acc = 0;
    }

    /// Advance the phase by one output tick and return the number of whole
    /// nibbles to consume. The fractional part is kept for interpolation.
    pub fn advance(&mut self) -> u32 {
        self.now_step = self.now_step.wrapping_add(self.step);
        if self.now_step < STEP_ONE {
            return 0;
        }
        let nibbles = self.now_step >> STEP_SHIFT;
        self.now_step &= STEP_ONE - 1;
        nibbles
    }

    /// Apply one 4-bit code to the accumulator and adaptive delta
    pub fn decode_nibble(&mut self, nibble: u8) {
        let code = (nibble & 0x0F) as usize;

        self.prev_acc = self.acc;

        // forecast to next forecast
        self.acc += FORECAST_TABLE[code] * self.adpcmd / 8;
        self.acc = self.acc.clamp(DECODE_MIN, DECODE_MAX);

        // delta to next delta
        self.adpcmd = self.adpcmd * DELTA_TABLE[code] / 64;
        self.adpcmd = self.adpcmd.clamp(DELTA_MIN, DELTA_MAX);
    }

    /// Blend `prev_acc` and `acc` by the elapsed fraction of the current
    /// nibble, scale by `volume` and latch the result into `adpcml`.
    pub fn interpolate(&mut self, volume: i32) -> i32 {
        let frac = self.now_step as i32;
        let blended = self.prev_acc * (STEP_ONE as i32 - frac) + self.acc * frac;
        self.adpcml = (blended >> STEP_SHIFT).wrapping_mul(volume);
        self.adpcml
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
