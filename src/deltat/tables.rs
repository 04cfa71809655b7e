//! Delta-T Decode Tables
//!
//! Shared constants and lookup tables used by the decode engine and the
//! address controller. All tables are process-wide read-only data.

/// Fractional bits of the phase accumulator (`now_step`, `step`).
pub const STEP_SHIFT: u32 = 16;

/// One whole nibble period in phase-accumulator units.
pub const STEP_ONE: u32 = 1 << STEP_SHIFT;

/// Largest adaptive delta.
pub const DELTA_MAX: i32 = 24576;
/// Smallest adaptive delta.
pub const DELTA_MIN: i32 = 127;
/// Adaptive delta loaded on START and on repeat.
pub const DELTA_DEFAULT: i32 = 127;

/// Decoded accumulator range (signed 16 bit).
pub const DECODE_RANGE: i32 = 32768;
/// Lower accumulator clamp.
pub const DECODE_MIN: i32 = -DECODE_RANGE;
/// Upper accumulator clamp.
pub const DECODE_MAX: i32 = DECODE_RANGE - 1;

/// Width of the byte address register. The nibble cursor carries one more bit.
pub const ADDRESS_BITS: u32 = 24;

/// Mask applied to the nibble cursor after each advance.
pub const NIBBLE_ADDRESS_MASK: u32 = (1 << (ADDRESS_BITS + 1)) - 1;

/// Forecast multipliers (rate = x8), indexed by nibble.
///
/// Bit 3 of the nibble selects the direction; bits 0-2 select 1/8 .. 15/8.
pub const FORECAST_TABLE: [i32; 16] = [
    1, 3, 5, 7, 9, 11, 13, 15, //
    -1, -3, -5, -7, -9, -11, -13, -15,
];

/// Delta adaptation multipliers (rate = x64), indexed by nibble.
///
/// 0.9, 0.9, 0.9, 0.9, 1.2, 1.6, 2.0, 2.4; the sign bit does not matter.
pub const DELTA_TABLE: [i32; 16] = [
    57, 57, 57, 57, 77, 102, 128, 153, //
    57, 57, 57, 57, 77, 102, 128, 153,
];

/// Right shift applied to the address shift per memory-type selector.
///
/// 0 = DRAM x1 bit, 1 = ROM, 2 = DRAM x8 bit, 3 = ROM. Encoding 3 is not
/// allowed by the manual but the hardware accepts it and behaves as ROM.
pub const DRAM_RIGHT_SHIFT: [u32; 4] = [3, 0, 0, 0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_table_is_antisymmetric() {
        for n in 0..8 {
            assert_eq!(FORECAST_TABLE[n], -FORECAST_TABLE[n + 8]);
            assert_eq!(FORECAST_TABLE[n], 2 * n as i32 + 1);
        }
    }

    #[test]
    fn test_delta_table_ignores_sign_bit() {
        for n in 0..8 {
            assert_eq!(DELTA_TABLE[n], DELTA_TABLE[n + 8]);
        }
    }

    #[test]
    fn test_reserved_memory_type_maps_like_rom() {
        assert_eq!(DRAM_RIGHT_SHIFT[3], DRAM_RIGHT_SHIFT[1]);
        assert_eq!(DRAM_RIGHT_SHIFT[0], 3);
    }

    #[test]
    fn test_nibble_mask_covers_25_bits() {
        assert_eq!(NIBBLE_ADDRESS_MASK, 0x01FF_FFFF);
    }
}
