//! Persisted state
//!
//! A flat save of the raw registers plus the live decode state. Derived
//! values (addresses, step, volume, pan, memory shift) are not stored; they
//! are rebuilt on restore by replaying the registers through the normal write
//! path.

use serde::{Deserialize, Serialize};

use crate::deltat::address::DUMMY_READS;
use crate::deltat::registers::REGISTER_COUNT;
use crate::deltat::tables::{
    DECODE_MAX, DECODE_MIN, DELTA_MAX, DELTA_MIN, NIBBLE_ADDRESS_MASK, STEP_ONE,
};
use crate::{DeltaTError, Result};

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Saved state of one Delta-T unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Layout version, checked on decode
    pub version: u32,
    /// Raw last-written register bytes
    pub registers: [u8; REGISTER_COUNT],
    /// Latched control 1 mode bits
    pub portstate: u8,
    /// Nibble cursor
    pub now_addr: u32,
    /// Phase accumulator
    pub now_step: u32,
    /// Decoded accumulator
    pub acc: i32,
    /// Previous accumulator
    pub prev_acc: i32,
    /// Adaptive delta
    pub adpcmd: i32,
    /// Last output sample
    pub adpcml: i32,
    /// Remaining dummy reads
    pub memread: u8,
    /// Byte latched from the CPU data port
    pub cpu_data: u8,
    /// PCM busy flag
    pub pcm_busy: bool,
}

impl Snapshot {
    /// Encode as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON, rejecting other layout versions and out-of-range
    /// fields
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DeltaTError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check every scalar against the range the unit can hold
    pub fn validate(&self) -> Result<()> {
        check("now_addr", self.now_addr.into(), 0, NIBBLE_ADDRESS_MASK.into())?;
        check("now_step", self.now_step.into(), 0, (STEP_ONE - 1).into())?;
        check("acc", self.acc.into(), DECODE_MIN.into(), DECODE_MAX.into())?;
        check(
            "prev_acc",
            self.prev_acc.into(),
            DECODE_MIN.into(),
            DECODE_MAX.into(),
        )?;
        check("adpcmd", self.adpcmd.into(), DELTA_MIN.into(), DELTA_MAX.into())?;
        check("memread", self.memread.into(), 0, DUMMY_READS.into())?;
        Ok(())
    }
}

fn check(field: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DeltaTError::SnapshotField { field, value })
    }
}
