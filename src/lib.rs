//! Yamaha ADPCM-B ("Delta-T") unit emulator
//!
//! A bit-accurate emulation of the ADPCM-B playback unit embedded in the
//! YM2608 (OPNA), YM2610/B (OPNB) and Y8950 (MSX-AUDIO). It decodes
//! 4-bit differential samples from external ROM/RAM or from bytes fed by the
//! host CPU, and models the register protocol real software depends on:
//! start/stop/limit addressing, dummy read cycles and BRDY/EOS status edges.
//!
//! # Features
//! - Register-level emulation of all 14 Delta-T registers
//! - External-memory synthesis with repeat, limit wraparound and EOS
//! - CPU-fed synthesis through the data port with BRDY handshaking
//! - External memory read/write through the data port
//! - ROM, x1-bit DRAM and x8-bit DRAM address geometry
//! - Save/restore of the unit state
//! - Offline rendering of ROM samples to WAV
//!
//! ADPCM analysis (recording) is not emulated.
//!
//! # Quick start
//! ```no_run
//! use ym_deltat::{ChipVariant, DeltaT, DeltaTConfig, OutputBus, Pan, SharedStatus};
//!
//! let rom = std::fs::read("adpcm-b.rom").unwrap();
//! let status = SharedStatus::new();
//! let config = DeltaTConfig::for_variant(ChipVariant::Ym2610).with_clocks(8_000_000, 44_100);
//! let mut unit = DeltaT::new(config).with_memory(rom).with_status(status.clone());
//!
//! unit.write(0x01, 0xC0); // left + right
//! unit.write(0x02, 0x00); // start
//! unit.write(0x03, 0x00);
//! unit.write(0x04, 0xFF); // stop
//! unit.write(0x05, 0x00);
//! unit.write(0x09, 0x00); // delta-N
//! unit.write(0x0A, 0x80);
//! unit.write(0x0B, 0xFF); // level
//! unit.write(0x00, 0x80); // start playback
//!
//! let mut bus = OutputBus::new();
//! unit.calc(&mut bus);
//! let sample = bus[Pan::Slot3];
//! ```

#![warn(missing_docs)]

pub mod bridge; // Host memory and status capabilities
pub mod config;
pub mod deltat; // Delta-T unit emulation (core)
pub mod output;
pub mod render; // Offline rendering to PCM / WAV
pub mod snapshot;
pub mod variant;

/// Error types for host-side Delta-T operations
///
/// The emulated data path never fails; these cover configuration, persisted
/// state and file output.
#[derive(thiserror::Error, Debug)]
pub enum DeltaTError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed persisted state
    #[error("Snapshot decode error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Persisted state from another layout version
    #[error("Snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion {
        /// Version found in the data
        found: u32,
        /// Version this build reads
        expected: u32,
    },

    /// Persisted state with a field outside the unit's range
    #[error("Snapshot field {field} out of range: {value}")]
    SnapshotField {
        /// Offending field name
        field: &'static str,
        /// Value found in the data
        value: i64,
    },

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV encoder error
    #[error("WAV write error: {0}")]
    Wav(#[from] hound::Error),
}

/// Result type for Delta-T operations
pub type Result<T> = std::result::Result<T, DeltaTError>;

// Public API exports
pub use bridge::{MemoryBridge, SharedMemory, SharedStatus, StatusSink};
pub use config::{DeltaTConfig, StatusConfig};
pub use deltat::DeltaT;
pub use output::{OutputBus, Pan};
pub use render::{render, write_wav, RenderOutput, RenderSettings};
pub use snapshot::Snapshot;
pub use variant::ChipVariant;
