//! Offline rendering
//!
//! Drives a unit over a ROM image with external-memory playback and collects
//! the output as 16-bit PCM, optionally writing it to a WAV file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bridge::SharedStatus;
use crate::config::DeltaTConfig;
use crate::deltat::{DeltaT, Register};
use crate::output::{OutputBus, Pan};
use crate::snapshot::Snapshot;
use crate::variant::ChipVariant;
use crate::{DeltaTError, Result};

/// Right shift from the output slot to 16-bit PCM (undoes the 8-bit level)
pub const OUTPUT_SHIFT: u32 = 8;

/// Playback parameters for [`render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Hosting chip
    pub variant: ChipVariant,
    /// Chip master clock in Hz
    pub master_clock: u32,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Start address register value ($02/$03)
    pub start: u16,
    /// Stop address register value ($04/$05)
    pub end: u16,
    /// Delta-N rate register value ($09/$0A)
    pub delta_n: u16,
    /// Output level ($0B)
    pub volume: u8,
    /// Loop at the stop address instead of ending
    pub repeat: bool,
    /// Hard cap on rendered samples
    pub max_samples: usize,
}

impl RenderSettings {
    /// Defaults for a chip: typical clock, 44.1 kHz, full level, 60 s cap
    pub fn new(variant: ChipVariant) -> Self {
        Self {
            variant,
            master_clock: variant.typical_clock(),
            sample_rate: 44_100,
            start: 0,
            end: 0,
            delta_n: 0x8000,
            volume: 0xFF,
            repeat: false,
            max_samples: 44_100 * 60,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(DeltaTError::Config("sample rate must be non-zero".into()));
        }
        if self.master_clock == 0 {
            return Err(DeltaTError::Config("master clock must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::new(ChipVariant::default())
    }
}

/// Result of a render
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Mono 16-bit PCM
    pub samples: Vec<i16>,
    /// True when playback stopped on EOS rather than on the sample cap
    pub reached_end: bool,
    /// Unit state after the last tick
    pub snapshot: Snapshot,
}

/// Play `memory` from the configured window until EOS or the sample cap
pub fn render(memory: Vec<u8>, settings: &RenderSettings) -> Result<RenderOutput> {
    settings.validate()?;

    let config = DeltaTConfig::for_variant(settings.variant)
        .with_clocks(settings.master_clock, settings.sample_rate);
    let eos_mask = config.status.eos_mask;
    let status = SharedStatus::new();
    let mut unit = DeltaT::try_new(config)?
        .with_memory(memory)
        .with_status(status.clone());

    program(&mut unit, settings);

    let mut bus = OutputBus::new();
    let mut samples = Vec::with_capacity(settings.max_samples.min(1 << 20));
    let mut reached_end = false;

    while samples.len() < settings.max_samples {
        bus.clear();
        unit.calc(&mut bus);
        if status.contains(eos_mask) {
            reached_end = true;
            break;
        }
        samples.push(to_pcm16(bus[Pan::Slot3]));
    }

    log::debug!(
        "rendered {} samples from {} ({})",
        samples.len(),
        settings.variant,
        if reached_end { "end of sample" } else { "sample cap" }
    );

    Ok(RenderOutput {
        samples,
        reached_end,
        snapshot: unit.snapshot(),
    })
}

fn program(unit: &mut DeltaT, settings: &RenderSettings) {
    let [start_lo, start_hi] = settings.start.to_le_bytes();
    let [end_lo, end_hi] = settings.end.to_le_bytes();
    let [delta_lo, delta_hi] = settings.delta_n.to_le_bytes();

    // left + right, ROM
    unit.write(Register::Control2.addr(), 0xC1);
    unit.write(Register::StartLo.addr(), start_lo);
    unit.write(Register::StartHi.addr(), start_hi);
    unit.write(Register::StopLo.addr(), end_lo);
    unit.write(Register::StopHi.addr(), end_hi);
    unit.write(Register::DeltaNLo.addr(), delta_lo);
    unit.write(Register::DeltaNHi.addr(), delta_hi);
    unit.write(Register::Volume.addr(), settings.volume);

    let control1 = if settings.repeat { 0xB0 } else { 0xA0 };
    unit.write(Register::Control1.addr(), control1);
}

/// Scale an output slot value to 16-bit PCM with saturation
pub fn to_pcm16(value: i32) -> i16 {
    (value >> OUTPUT_SHIFT).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Convert mono samples to stereo (duplicate each sample)
fn mono_to_stereo(mono: &[i16]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &sample in mono {
        stereo.push(sample);
        stereo.push(sample);
    }
    stereo
}

/// Write samples to a 16-bit PCM WAV file with 1 or 2 channels
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    if !(1..=2).contains(&channels) {
        return Err(DeltaTError::Config(format!(
            "unsupported channel count {channels}"
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let frames = if channels == 2 {
        mono_to_stereo(samples)
    } else {
        samples.to_vec()
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in frames {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}
