//! Delta-T (ADPCM-B) unit
//!
//! Register-mapped controller and decoder as embedded in the YM2608,
//! YM2610/B and Y8950. Register writes reconfigure addressing and mode; the
//! host calls [`DeltaT::calc`] once per output tick, which decodes from
//! external memory or from bytes fed through the data port and adds one
//! interpolated sample into the selected output slot.
//!
//! Operating modes (control 1, top three bits):
//!
//! | value | START | REC | MEMDATA | meaning                                  |
//! |-------|-------|-----|---------|------------------------------------------|
//! | `A0`  | 1     | 0   | 1       | synthesis from external memory           |
//! | `80`  | 1     | 0   | 0       | synthesis from the CPU via $08           |
//! | `60`  | 0     | 1   | 1       | external memory write via $08            |
//! | `20`  | 0     | 0   | 1       | external memory read via $08             |
//! | `E0`  | 1     | 1   | 1       | analysis to external memory (not emulated) |
//! | `C0`  | 1     | 1   | 0       | analysis to the CPU (not emulated)       |
//!
//! BRDY is modelled as an immediate clear-then-set edge; the hardware raises
//! it a few master clocks later.

use log::{debug, trace};

use super::address::{AddressController, DUMMY_READS};
use super::decoder::Decoder;
use super::registers::{Control2, Mode, PortState, Register, RegisterBank, REGISTER_COUNT};
use super::tables::{
    DECODE_MAX, DECODE_MIN, DECODE_RANGE, DELTA_MAX, DELTA_MIN, NIBBLE_ADDRESS_MASK, STEP_ONE,
};
use crate::bridge::{MemoryBridge, StatusSink};
use crate::config::DeltaTConfig;
use crate::output::{OutputBus, Pan};
use crate::snapshot::{Snapshot, SNAPSHOT_VERSION};
use crate::Result;

/// One Delta-T unit
pub struct DeltaT {
    config: DeltaTConfig,
    regs: RegisterBank,
    portstate: PortState,
    control2: Control2,
    addr: AddressController,
    decoder: Decoder,
    volume: i32,
    pan: Pan,
    cpu_data: u8,
    pcm_busy: bool,
    memory: Option<Box<dyn MemoryBridge>>,
    status: Option<Box<dyn StatusSink>>,
}

impl DeltaT {
    /// Create a unit in its reset state with nothing attached
    pub fn new(config: DeltaTConfig) -> Self {
        let mut unit = Self {
            config,
            regs: RegisterBank::new(),
            portstate: PortState::empty(),
            control2: Control2::empty(),
            addr: AddressController::new(config.variant.port_shift()),
            decoder: Decoder::new(),
            volume: 0,
            pan: config.pan,
            cpu_data: 0,
            pcm_busy: false,
            memory: None,
            status: None,
        };
        unit.reset();
        unit
    }

    /// Validate the configuration, then create the unit
    pub fn try_new(config: DeltaTConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Attach the external memory
    pub fn with_memory<M: MemoryBridge + 'static>(mut self, memory: M) -> Self {
        self.attach_memory(memory);
        self
    }

    /// Attach the status sink
    pub fn with_status<S: StatusSink + 'static>(mut self, status: S) -> Self {
        self.attach_status(status);
        self
    }

    /// Attach or replace the external memory
    pub fn attach_memory<M: MemoryBridge + 'static>(&mut self, memory: M) {
        self.memory = Some(Box::new(memory));
    }

    /// Attach or replace the status sink
    pub fn attach_status<S: StatusSink + 'static>(&mut self, status: S) {
        self.status = Some(Box::new(status));
    }

    /// Detach the external memory, returning it
    pub fn detach_memory(&mut self) -> Option<Box<dyn MemoryBridge>> {
        self.memory.take()
    }

    /// Reset to the power-on defaults.
    ///
    /// The limit is opened fully and control 2 defaults to ROM so chips
    /// without those registers still play. BRDY is raised so it is visible
    /// as soon as the host unmasks it.
    pub fn reset(&mut self) {
        self.decoder = Decoder::new();
        self.volume = 0;
        self.pan = self.config.pan;
        self.portstate = PortState::MEMDATA;
        self.control2 = Control2::ROM;
        self.addr.reset(self.control2.bits());

        self.raise(self.config.status.brdy_mask);
    }

    /// Write a register. Indices past $0F are ignored.
    pub fn write(&mut self, reg: u8, value: u8) {
        if reg as usize >= REGISTER_COUNT {
            return;
        }
        self.regs.write(reg, value);

        match Register::from_addr(reg) {
            Some(Register::Control1) => self.write_control1(value),
            Some(Register::Control2) => self.write_control2(value),
            Some(Register::StartLo | Register::StartHi) => self.addr.derive_start(&self.regs),
            Some(Register::StopLo | Register::StopHi) => self.addr.derive_end(&self.regs),
            // prescaler only drives analysis
            Some(Register::PrescaleLo | Register::PrescaleHi) => {}
            Some(Register::Data) => self.write_data(value),
            Some(Register::DeltaNLo | Register::DeltaNHi) => self.update_step(),
            Some(Register::Volume) => self.write_volume(value),
            Some(Register::LimitLo | Register::LimitHi) => self.addr.derive_limit(&self.regs),
            None => {}
        }
    }

    fn write_control1(&mut self, value: u8) {
        let value = self.config.variant.force_control1(value);
        self.portstate = PortState::from_bits_truncate(value) & PortState::LATCHED;

        if self.portstate.contains(PortState::START) {
            self.pcm_busy = true;
            self.decoder.start();
            debug!(
                "delta-t start: mode {:#04x}, window {:#x}..={:#x}",
                self.portstate.bits(),
                self.addr.start(),
                self.addr.end()
            );
        }

        if self.portstate.contains(PortState::MEMDATA) {
            self.addr.rewind();
            self.addr.arm_dummy_reads();
        } else {
            self.addr.set_now_addr(0);
        }

        if self.portstate.contains(PortState::RESET) {
            self.portstate = PortState::empty();
            self.pcm_busy = false;
            self.raise(self.config.status.brdy_mask);
            debug!("delta-t reset");
        }
    }

    fn write_control2(&mut self, value: u8) {
        let control2 = Control2::from_bits_retain(self.config.variant.force_control2(value));
        self.pan = Pan::from_index(control2.pan_index());

        if self.control2.memory_type() != control2.memory_type()
            && self.addr.set_memory_type(control2.memory_type(), &self.regs)
        {
            debug!(
                "delta-t memory type {} -> address shift {}",
                control2.memory_type(),
                self.addr.shift()
            );
        }
        self.control2 = control2;
    }

    fn write_data(&mut self, value: u8) {
        match self.portstate.mode() {
            Mode::MemoryWrite => {
                if self.addr.memread() != 0 {
                    self.addr.rewind();
                    self.addr.set_memread(0);
                    trace!("delta-t memory write armed at {:#x}", self.addr.byte_addr());
                }

                if self.addr.at_end() {
                    self.raise(self.config.status.eos_mask);
                    return;
                }

                let chip = self.config.status.chip_id;
                let byte_addr = self.addr.byte_addr();
                if let Some(memory) = self.memory.as_mut() {
                    memory.write_byte(chip, byte_addr, value);
                }
                self.addr.advance_byte();

                // BRDY drops while the byte is written and rises once done
                self.lower(self.config.status.brdy_mask);
                self.raise(self.config.status.brdy_mask);
            }
            Mode::CpuSynthesis => {
                self.cpu_data = value;
                // full: wait until the decoder has taken the byte
                self.lower(self.config.status.brdy_mask);
            }
            _ => {}
        }
    }

    fn update_step(&mut self) {
        let delta_n = self.delta_n();
        self.decoder.step = (delta_n as f64 * self.config.freqbase) as u32;
    }

    fn write_volume(&mut self, value: u8) {
        let old_volume = self.volume;
        self.volume = value as i32 * (self.config.output_range / 256) / DECODE_RANGE;

        // keep the current output continuous across a level change
        if old_volume != 0 {
            self.decoder.adpcml = (self.decoder.adpcml as f64 / old_volume as f64
                * self.volume as f64) as i32;
        }
    }

    /// Read the data port ($08).
    ///
    /// Only meaningful in external memory read mode. The first two reads
    /// after entering the mode are dummy cycles returning 0.
    pub fn read(&mut self) -> u8 {
        if self.portstate.mode() != Mode::MemoryRead {
            return 0;
        }

        if self.addr.memread() != 0 {
            self.addr.rewind();
            self.addr.set_memread(self.addr.memread() - 1);
            trace!("delta-t dummy read, {} left", self.addr.memread());
            return 0;
        }

        if self.addr.at_end() {
            self.raise(self.config.status.eos_mask);
            return 0;
        }

        let value = self.read_memory(self.addr.byte_addr());
        self.addr.advance_byte();

        self.lower(self.config.status.brdy_mask);
        self.raise(self.config.status.brdy_mask);
        value
    }

    /// Produce one output tick and add it into the selected slot of `bus`
    pub fn calc(&mut self, bus: &mut OutputBus) {
        match self.portstate.mode() {
            Mode::MemorySynthesis => self.synthesize_from_memory(bus),
            Mode::CpuSynthesis => self.synthesize_from_cpu(bus),
            // analysis (C0/E0) and the $08 memory modes produce no samples
            _ => {}
        }
    }

    fn synthesize_from_memory(&mut self, bus: &mut OutputBus) {
        let nibbles = self.decoder.advance();
        for _ in 0..nibbles {
            // limit is checked first and wraps to 0, not to the start address
            if self.addr.at_limit() {
                self.addr.set_now_addr(0);
            }

            if self.addr.at_end() {
                if self.portstate.contains(PortState::REPEAT) {
                    self.addr.rewind();
                    self.decoder.restart();
                } else {
                    self.raise(self.config.status.eos_mask);
                    self.pcm_busy = false;
                    self.portstate = PortState::empty();
                    self.decoder.adpcml = 0;
                    self.decoder.prev_acc = 0;
                    debug!("delta-t end of sample at {:#x}", self.addr.byte_addr());
                    return;
                }
            }

            let nibble = if self.addr.now_addr() & 1 != 0 {
                self.decoder.now_data & 0x0F
            } else {
                let byte = self.read_memory(self.addr.byte_addr());
                self.decoder.now_data = byte;
                byte >> 4
            };
            self.addr.advance_nibble();
            self.decoder.decode_nibble(nibble);
        }

        let sample = self.decoder.interpolate(self.volume);
        bus.accumulate(self.pan, sample);
    }

    fn synthesize_from_cpu(&mut self, bus: &mut OutputBus) {
        let nibbles = self.decoder.advance();
        for _ in 0..nibbles {
            let nibble = if self.addr.now_addr() & 1 != 0 {
                let low = self.decoder.now_data & 0x0F;
                self.decoder.now_data = self.cpu_data;
                // byte taken, ready for the next one
                self.raise(self.config.status.brdy_mask);
                low
            } else {
                self.decoder.now_data >> 4
            };
            self.addr.set_now_addr(self.addr.now_addr().wrapping_add(1));
            self.decoder.decode_nibble(nibble);
        }

        let sample = self.decoder.interpolate(self.volume);
        bus.accumulate(self.pan, sample);
    }

    /// Capture the registers and live decode state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            registers: *self.regs.as_slice(),
            portstate: self.portstate.bits(),
            now_addr: self.addr.now_addr(),
            now_step: self.decoder.now_step,
            acc: self.decoder.acc,
            prev_acc: self.decoder.prev_acc,
            adpcmd: self.decoder.adpcmd,
            adpcml: self.decoder.adpcml,
            memread: self.addr.memread(),
            cpu_data: self.cpu_data,
            pcm_busy: self.pcm_busy,
        }
    }

    /// Restore a snapshot and rebuild the derived state from its registers.
    ///
    /// Out-of-range scalars are folded back into the unit's ranges: the
    /// cursor is masked to the nibble bus and the phase to its fraction, the
    /// accumulators and delta are clamped.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.portstate = PortState::from_bits_truncate(snapshot.portstate);
        self.addr.set_now_addr(snapshot.now_addr & NIBBLE_ADDRESS_MASK);
        self.addr.set_memread(snapshot.memread.min(DUMMY_READS));
        self.decoder.now_step = snapshot.now_step & (STEP_ONE - 1);
        self.decoder.acc = snapshot.acc.clamp(DECODE_MIN, DECODE_MAX);
        self.decoder.prev_acc = snapshot.prev_acc.clamp(DECODE_MIN, DECODE_MAX);
        self.decoder.adpcmd = snapshot.adpcmd.clamp(DELTA_MIN, DELTA_MAX);
        self.decoder.adpcml = snapshot.adpcml;
        self.cpu_data = snapshot.cpu_data;
        self.pcm_busy = snapshot.pcm_busy;

        self.post_load(&snapshot.registers);
    }

    /// Rebuild derived state after the raw state was loaded.
    ///
    /// Registers 1-15 are replayed through [`DeltaT::write`]; register 0 is
    /// stored without its side effects. Volume is zeroed first so the replayed
    /// level write does not rescale the restored output sample.
    pub fn post_load(&mut self, registers: &[u8; REGISTER_COUNT]) {
        self.volume = 0;
        for (reg, &value) in registers.iter().enumerate().skip(1) {
            self.write(reg as u8, value);
        }
        self.regs.write(Register::Control1.addr(), registers[0]);

        self.decoder.now_data = self.read_memory(self.addr.byte_addr());
    }

    fn read_memory(&self, addr: u32) -> u8 {
        self.memory.as_ref().map_or(0, |memory| memory.read_byte(addr))
    }

    fn raise(&mut self, mask: u8) {
        if mask == 0 {
            return;
        }
        if let Some(status) = self.status.as_mut() {
            status.set_bits(self.config.status.chip_id, mask);
        }
    }

    fn lower(&mut self, mask: u8) {
        if mask == 0 {
            return;
        }
        if let Some(status) = self.status.as_mut() {
            status.clear_bits(self.config.status.chip_id, mask);
        }
    }

    /// Attach-time configuration
    pub fn config(&self) -> &DeltaTConfig {
        &self.config
    }

    /// Raw register bank
    pub fn registers(&self) -> &RegisterBank {
        &self.regs
    }

    /// Latched control 1 bits
    pub fn portstate(&self) -> PortState {
        self.portstate
    }

    /// Current operating mode
    pub fn mode(&self) -> Mode {
        self.portstate.mode()
    }

    /// Latched control 2 bits (after variant forcing)
    pub fn control2(&self) -> Control2 {
        self.control2
    }

    /// PCM busy flag, mirrored into the chip status
    pub fn pcm_busy(&self) -> bool {
        self.pcm_busy
    }

    /// Address window and cursor
    pub fn address(&self) -> &AddressController {
        &self.addr
    }

    /// Decoder state
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Delta-N rate register pair
    pub fn delta_n(&self) -> u32 {
        self.regs.pair(Register::DeltaNLo, Register::DeltaNHi)
    }

    /// Linear volume derived from $0B
    pub fn volume(&self) -> i32 {
        self.volume
    }

    /// Last output sample
    pub fn adpcml(&self) -> i32 {
        self.decoder.adpcml
    }

    /// Selected output slot
    pub fn pan(&self) -> Pan {
        self.pan
    }

    /// Byte latched from the data port in CPU synthesis mode
    pub fn cpu_data(&self) -> u8 {
        self.cpu_data
    }
}

impl Default for DeltaT {
    fn default() -> Self {
        Self::new(DeltaTConfig::default())
    }
}

impl std::fmt::Debug for DeltaT {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaT")
            .field("variant", &self.config.variant)
            .field("regs", &self.regs.registers)
            .field("portstate", &self.portstate)
            .field("now_addr", &self.addr.now_addr())
            .field("acc", &self.decoder.acc)
            .field("adpcmd", &self.decoder.adpcmd)
            .field("pcm_busy", &self.pcm_busy)
            .finish()
    }
}
