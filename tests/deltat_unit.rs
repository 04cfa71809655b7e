use parking_lot::Mutex;
use std::sync::Arc;

use ym_deltat::deltat::tables::NIBBLE_ADDRESS_MASK;
use ym_deltat::deltat::{Mode, PortState};
use ym_deltat::{
    ChipVariant, DeltaT, DeltaTConfig, MemoryBridge, OutputBus, Pan, SharedMemory, Snapshot,
    StatusSink,
};

const BRDY: u8 = 0x08;
const EOS: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Set(u8),
    Clear(u8),
}

/// Status sink that records every edge in order
#[derive(Clone, Default)]
struct EdgeLog {
    edges: Arc<Mutex<Vec<Edge>>>,
}

impl EdgeLog {
    fn edges(&self) -> Vec<Edge> {
        self.edges.lock().clone()
    }

    fn count(&self, edge: Edge) -> usize {
        self.edges.lock().iter().filter(|&&e| e == edge).count()
    }

    fn clear(&self) {
        self.edges.lock().clear();
    }
}

impl StatusSink for EdgeLog {
    fn set_bits(&mut self, _chip: u8, mask: u8) {
        self.edges.lock().push(Edge::Set(mask));
    }

    fn clear_bits(&mut self, _chip: u8, mask: u8) {
        self.edges.lock().push(Edge::Clear(mask));
    }
}

/// Y8950 unit with BRDY/EOS wired. `freqbase` 2.0 with delta-N $8000 gives
/// exactly one nibble per tick, 4.0 gives two.
fn y8950(memory: Vec<u8>, freqbase: f64) -> (DeltaT, EdgeLog) {
    let log = EdgeLog::default();
    let config = DeltaTConfig::for_variant(ChipVariant::Y8950).with_freqbase(freqbase);
    let unit = DeltaT::try_new(config)
        .unwrap()
        .with_memory(memory)
        .with_status(log.clone());
    (unit, log)
}

/// Program a x1-bit DRAM window (register unit = 4 bytes) on slot 0
fn program_dram_window(unit: &mut DeltaT, start: u8, end: u8, volume: u8) {
    unit.write(0x01, 0x00);
    unit.write(0x02, start);
    unit.write(0x03, 0x00);
    unit.write(0x04, end);
    unit.write(0x05, 0x00);
    unit.write(0x09, 0x00);
    unit.write(0x0A, 0x80);
    unit.write(0x0B, volume);
}

fn tick(unit: &mut DeltaT) -> i32 {
    let mut bus = OutputBus::new();
    unit.calc(&mut bus);
    bus[unit.pan()]
}

#[test]
fn test_reset_defaults() {
    let unit = DeltaT::new(DeltaTConfig::for_variant(ChipVariant::Ym2608));
    assert_eq!(unit.address().limit(), u32::MAX);
    assert_eq!(unit.control2().bits(), 0x01);
    assert_eq!(unit.portstate().bits(), 0x20);
    assert_eq!(unit.decoder().adpcmd, 127);
    assert!(!unit.pcm_busy());
}

#[test]
fn test_out_of_range_register_is_dropped() {
    let mut unit = DeltaT::default();
    let before = *unit.registers();
    unit.write(0x10, 0xFF);
    unit.write(0xFF, 0xFF);
    assert_eq!(*unit.registers(), before);
}

#[test]
fn test_first_tick_decodes_high_then_low_nibble() {
    let (mut unit, _) = y8950(vec![0x12, 0x34, 0x56, 0x78], 4.0);
    program_dram_window(&mut unit, 0, 0, 1);
    unit.write(0x00, 0xA0);

    assert_eq!(tick(&mut unit), 47);
    assert_eq!(unit.decoder().prev_acc, 47);
    assert_eq!(unit.decoder().acc, 126);
    assert_eq!(unit.decoder().adpcmd, 127);
    assert_eq!(unit.address().now_addr(), 2);
}

#[test]
fn test_end_of_sample_raises_eos_once() {
    let (mut unit, log) = y8950(vec![0x12, 0x34, 0x56, 0x78], 4.0);
    program_dram_window(&mut unit, 0, 0, 1);
    unit.write(0x00, 0xA0);
    assert!(unit.pcm_busy());

    // end = 3, compared in nibble space as 6: bytes 0..=2 play
    assert_eq!(tick(&mut unit), 47);
    assert_eq!(tick(&mut unit), 237);
    assert_eq!(tick(&mut unit), 588);
    assert_eq!(log.count(Edge::Set(EOS)), 0);

    assert_eq!(tick(&mut unit), 0);
    assert_eq!(log.count(Edge::Set(EOS)), 1);
    assert!(!unit.pcm_busy());
    assert_eq!(unit.portstate(), PortState::empty());
    assert_eq!(unit.adpcml(), 0);

    for _ in 0..100 {
        assert_eq!(tick(&mut unit), 0);
    }
    assert_eq!(log.count(Edge::Set(EOS)), 1);

    // a new START plays again
    unit.write(0x00, 0xA0);
    assert_eq!(tick(&mut unit), 47);
}

#[test]
fn test_repeat_restarts_without_eos() {
    let (mut unit, log) = y8950(vec![0x12, 0x34, 0x56, 0x78], 4.0);
    program_dram_window(&mut unit, 0, 0, 1);
    unit.write(0x00, 0xB0);

    let first: Vec<i32> = (0..3).map(|_| tick(&mut unit)).collect();
    assert_eq!(first, vec![47, 237, 588]);

    // the restart resets acc/prev_acc/adpcmd before decoding 0x12 again
    for _ in 0..50 {
        let again: Vec<i32> = (0..3).map(|_| tick(&mut unit)).collect();
        assert_eq!(again, first);
    }
    assert_eq!(log.count(Edge::Set(EOS)), 0);
    assert!(unit.pcm_busy());
    assert_eq!(unit.mode(), Mode::MemorySynthesis);
}

#[test]
fn test_limit_wraps_cursor_to_zero() {
    let memory: Vec<u8> = (0..16).collect();
    let (mut unit, log) = y8950(memory, 2.0);
    // start = 4 bytes, limit = 8 bytes, end = 15 bytes
    program_dram_window(&mut unit, 1, 3, 1);
    unit.write(0x0C, 0x02);
    unit.write(0x0D, 0x00);
    assert_eq!(unit.address().start(), 4);
    assert_eq!(unit.address().limit(), 8);
    assert_eq!(unit.address().end(), 15);

    unit.write(0x00, 0xA0);
    assert_eq!(unit.address().now_addr(), 8);

    let cursor: Vec<u32> = (0..12)
        .map(|_| {
            tick(&mut unit);
            unit.address().now_addr()
        })
        .collect();
    assert_eq!(cursor, vec![9, 10, 11, 12, 13, 14, 15, 16, 1, 2, 3, 4]);

    for _ in 0..1000 {
        tick(&mut unit);
    }
    assert_eq!(log.count(Edge::Set(EOS)), 0);
}

#[test]
fn test_external_read_dummy_cycles() {
    let memory: Vec<u8> = (0..64).map(|i| i as u8 ^ 0x80).collect();
    let (mut unit, log) = y8950(memory, 1.0);
    // ROM geometry: register unit = 32 bytes
    unit.write(0x02, 0x01);
    unit.write(0x03, 0x00);
    unit.write(0x04, 0x01);
    unit.write(0x05, 0x00);
    unit.write(0x00, 0x20);
    assert_eq!(unit.mode(), Mode::MemoryRead);

    assert_eq!(unit.read(), 0);
    assert_eq!(unit.address().now_addr(), 64);
    assert_eq!(unit.read(), 0);
    assert_eq!(unit.address().now_addr(), 64);
    assert!(log.edges().is_empty());

    assert_eq!(unit.read(), 32 ^ 0x80);
    assert_eq!(log.edges(), vec![Edge::Clear(BRDY), Edge::Set(BRDY)]);
    assert_eq!(unit.read(), 33 ^ 0x80);

    // bytes 34..=62 remain before the stop address
    for addr in 34..63u8 {
        assert_eq!(unit.read(), addr ^ 0x80);
    }
    log.clear();
    assert_eq!(unit.read(), 0);
    assert_eq!(log.edges(), vec![Edge::Set(EOS)]);
}

#[test]
fn test_read_outside_read_mode_returns_zero() {
    let (mut unit, log) = y8950(vec![0xAA; 64], 1.0);
    unit.write(0x00, 0x00);
    for _ in 0..4 {
        assert_eq!(unit.read(), 0);
    }
    assert!(log.edges().is_empty());
}

#[test]
fn test_external_write_through_data_port() {
    let memory = SharedMemory::zeroed(64);
    let log = EdgeLog::default();
    let config = DeltaTConfig::for_variant(ChipVariant::Y8950);
    let mut unit = DeltaT::new(config)
        .with_memory(memory.clone())
        .with_status(log.clone());

    // ROM geometry, window 32..=63
    unit.write(0x02, 0x01);
    unit.write(0x04, 0x01);
    unit.write(0x00, 0x60);
    assert_eq!(unit.mode(), Mode::MemoryWrite);

    unit.write(0x08, 0xA5);
    assert_eq!(memory.peek(32), 0xA5);
    assert_eq!(log.edges(), vec![Edge::Clear(BRDY), Edge::Set(BRDY)]);

    for value in 1..31u8 {
        unit.write(0x08, value);
    }
    assert_eq!(memory.peek(62), 30);
    assert_eq!(log.count(Edge::Set(EOS)), 0);

    unit.write(0x08, 0xFF);
    assert_eq!(memory.peek(63), 0);
    assert_eq!(log.count(Edge::Set(EOS)), 1);
}

#[test]
fn test_cpu_synthesis_handshake() {
    let (mut unit, log) = y8950(Vec::new(), 2.0);
    unit.write(0x09, 0x00);
    unit.write(0x0A, 0x80);
    unit.write(0x0B, 0x01);
    unit.write(0x00, 0x80);
    assert_eq!(unit.mode(), Mode::CpuSynthesis);
    assert_eq!(unit.address().now_addr(), 0);

    unit.write(0x08, 0x12);
    assert_eq!(unit.cpu_data(), 0x12);
    assert_eq!(log.edges(), vec![Edge::Clear(BRDY)]);

    // the first byte out is the zeroed latch, 0x12 follows
    tick(&mut unit);
    assert_eq!(unit.decoder().acc, 15);
    tick(&mut unit);
    assert_eq!(unit.decoder().acc, 30);
    assert_eq!(log.edges(), vec![Edge::Clear(BRDY), Edge::Set(BRDY)]);

    tick(&mut unit);
    assert_eq!(unit.decoder().acc, 77);
    tick(&mut unit);
    assert_eq!(unit.decoder().acc, 156);
    assert_eq!(log.count(Edge::Set(BRDY)), 2);
}

#[test]
fn test_ym2610_forces_external_memory_mode() {
    let mut unit = DeltaT::new(DeltaTConfig::for_variant(ChipVariant::Ym2610));
    unit.write(0x00, 0x80);
    assert_eq!(unit.mode(), Mode::MemorySynthesis);
    unit.write(0x00, 0x60);
    assert_eq!(unit.mode(), Mode::MemoryRead);
    unit.write(0x01, 0x00);
    assert_eq!(unit.control2().bits(), 0x01);
}

#[test]
fn test_reset_bit_stops_playback() {
    let (mut unit, log) = y8950(vec![0x77; 64], 2.0);
    unit.write(0x00, 0xA0);
    assert!(unit.pcm_busy());

    unit.write(0x00, 0x01);
    assert!(!unit.pcm_busy());
    assert_eq!(unit.portstate(), PortState::empty());
    assert_eq!(log.edges(), vec![Edge::Set(BRDY)]);
    assert_eq!(tick(&mut unit), 0);
}

#[test]
fn test_unattached_collaborators_are_silent() {
    let config = DeltaTConfig::for_variant(ChipVariant::Y8950).with_freqbase(4.0);
    let mut unit = DeltaT::new(config);
    program_dram_window(&mut unit, 0, 0, 1);
    unit.write(0x00, 0xA0);
    for _ in 0..8 {
        tick(&mut unit);
    }
    assert!(!unit.pcm_busy());
    unit.write(0x00, 0x20);
    assert_eq!(unit.read(), 0);
}

#[test]
fn test_pan_selects_slot_and_accumulates() {
    let (mut unit, _) = y8950(vec![0x12, 0x34, 0x56, 0x78], 4.0);
    program_dram_window(&mut unit, 0, 0, 1);
    unit.write(0x01, 0x80);
    assert_eq!(unit.pan(), Pan::Slot2);
    unit.write(0x00, 0xA0);

    let mut bus = OutputBus::new();
    bus.accumulate(Pan::Slot2, 1000);
    unit.calc(&mut bus);
    assert_eq!(bus.slots(), &[0, 0, 1047, 0]);
}

#[test]
fn test_memory_type_change_rederives_window() {
    let (mut unit, _) = y8950(Vec::new(), 1.0);
    unit.write(0x02, 0x04);
    unit.write(0x04, 0x08);
    unit.write(0x0C, 0x10);
    assert_eq!(unit.address().start(), 0x80);
    assert_eq!(unit.address().end(), 0x11F);
    assert_eq!(unit.address().limit(), 0x200);

    unit.write(0x01, 0x00);
    assert_eq!(unit.address().start(), 0x10);
    assert_eq!(unit.address().end(), 0x23);
    assert_eq!(unit.address().limit(), 0x40);

    // pan-only change keeps the geometry
    unit.write(0x01, 0xC0);
    assert_eq!(unit.address().start(), 0x10);
}

#[test]
fn test_volume_change_rescales_output() {
    let (mut unit, _) = y8950(vec![0x12, 0x34, 0x56, 0x78], 4.0);
    program_dram_window(&mut unit, 0, 0, 3);
    unit.write(0x00, 0xA0);
    assert_eq!(unit.volume(), 3);
    assert_eq!(tick(&mut unit), 141);

    unit.write(0x0B, 0x07);
    assert_eq!(unit.volume(), 7);
    assert_eq!(unit.adpcml(), 329);

    unit.write(0x0B, 0x00);
    assert_eq!(unit.adpcml(), 0);

    // no rescale from a zero level
    unit.write(0x0B, 0x05);
    assert_eq!(unit.adpcml(), 0);
}

#[test]
fn test_volume_rescale_chains() {
    let (mut unit, _) = y8950(vec![0x12, 0x34, 0x56, 0x78], 4.0);
    program_dram_window(&mut unit, 0, 0, 3);
    unit.write(0x00, 0xA0);
    tick(&mut unit);
    tick(&mut unit);
    // 237 * 3
    assert_eq!(unit.adpcml(), 711);

    unit.write(0x0B, 0x02);
    // 711 / 3 * 2 = 474
    assert_eq!(unit.adpcml(), 474);
    unit.write(0x0B, 0x07);
    // 474 / 2 * 7 = 1659
    assert_eq!(unit.adpcml(), 1659);
}

#[test]
fn test_snapshot_restore_continues_identically() {
    let memory: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(37) >> 3) as u8).collect();
    let config = DeltaTConfig::for_variant(ChipVariant::Y8950).with_freqbase(1.0);

    let mut live = DeltaT::new(config).with_memory(memory.clone());
    live.write(0x01, 0xC0);
    live.write(0x02, 0x01);
    live.write(0x03, 0x00);
    live.write(0x04, 0x40);
    live.write(0x05, 0x00);
    live.write(0x06, 0x12);
    live.write(0x07, 0x34);
    live.write(0x09, 0x55);
    live.write(0x0A, 0x55);
    live.write(0x0B, 0xC0);
    live.write(0x0C, 0xFF);
    live.write(0x0D, 0x00);
    live.write(0x00, 0xB0);

    for _ in 0..777 {
        tick(&mut live);
    }

    let json = live.snapshot().to_json().unwrap();
    let snapshot = Snapshot::from_json(&json).unwrap();

    let mut restored = DeltaT::new(config).with_memory(memory);
    restored.restore(&snapshot);

    assert_eq!(restored.address().start(), live.address().start());
    assert_eq!(restored.address().end(), live.address().end());
    assert_eq!(restored.address().limit(), live.address().limit());
    assert_eq!(restored.address().now_addr(), live.address().now_addr());
    assert_eq!(restored.volume(), live.volume());
    assert_eq!(restored.pan(), live.pan());
    // now_data is re-fetched, so compare the arithmetic state only
    let (a, b) = (restored.decoder(), live.decoder());
    assert_eq!(
        (a.acc, a.prev_acc, a.adpcmd, a.adpcml, a.now_step, a.step),
        (b.acc, b.prev_acc, b.adpcmd, b.adpcml, b.now_step, b.step)
    );
    assert_eq!(restored.registers(), live.registers());

    for _ in 0..2000 {
        assert_eq!(tick(&mut restored), tick(&mut live));
    }
}

#[test]
fn test_restore_does_not_replay_control1() {
    let (mut unit, _) = y8950(vec![0x42; 256], 2.0);
    unit.write(0x0B, 0x10);
    unit.write(0x00, 0xA0);
    for _ in 0..5 {
        tick(&mut unit);
    }
    let mut snapshot = unit.snapshot();
    // a START replay would zero the accumulator
    snapshot.acc = 1234;

    let (mut other, _) = y8950(vec![0x42; 256], 2.0);
    other.restore(&snapshot);
    assert_eq!(other.decoder().acc, 1234);
    assert_eq!(other.registers().read(0x00), 0xA0);
    assert_eq!(other.mode(), Mode::MemorySynthesis);
}

#[test]
fn test_restore_folds_out_of_range_state() {
    let (mut unit, _) = y8950(vec![0x9F; 256], 4.0);
    program_dram_window(&mut unit, 0, 0x10, 0x40);
    unit.write(0x00, 0xA0);
    tick(&mut unit);

    let mut snapshot = unit.snapshot();
    snapshot.now_addr = u32::MAX;
    snapshot.now_step = u32::MAX;
    snapshot.acc = i32::MAX;
    snapshot.prev_acc = i32::MIN;
    snapshot.adpcmd = 0;
    snapshot.memread = 200;

    let (mut other, _) = y8950(vec![0x9F; 256], 4.0);
    other.restore(&snapshot);
    assert_eq!(other.address().now_addr(), NIBBLE_ADDRESS_MASK);
    assert_eq!(other.address().memread(), 2);
    assert_eq!(other.decoder().now_step, 0xFFFF);
    assert_eq!(other.decoder().acc, 32767);
    assert_eq!(other.decoder().prev_acc, -32768);
    assert_eq!(other.decoder().adpcmd, 127);

    for _ in 0..64 {
        tick(&mut other);
    }
    assert!(other.address().now_addr() <= NIBBLE_ADDRESS_MASK);
}

#[test]
fn test_detach_memory_returns_bridge() {
    let (mut unit, _) = y8950(vec![0x12, 0x34], 2.0);
    assert_eq!(unit.config().variant, ChipVariant::Y8950);
    assert_eq!(unit.config().freqbase, 2.0);

    let memory = unit.detach_memory().unwrap();
    assert_eq!(memory.read_byte(1), 0x34);
    assert!(unit.detach_memory().is_none());
}
