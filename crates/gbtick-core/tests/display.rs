use std::sync::{Arc, Mutex};

use gbtick_core::bus::{BusContext, SystemBus};
use gbtick_core::clock::{BASE_CYCLES_PER_FRAME, Clock};
use gbtick_core::display::Mode;
use gbtick_core::display::timing::LINE_CYCLES;
use gbtick_core::hardware::Model;
use gbtick_core::mmu::Mmu;
use gbtick_core::renderer::{Rect, Renderer};

#[derive(Default)]
struct Recorded {
    rects: Vec<Rect>,
    clears: usize,
}

#[derive(Clone, Default)]
struct RecordingRenderer(Arc<Mutex<Recorded>>);

impl Renderer for RecordingRenderer {
    fn present(&mut self, rect: Rect, pixels: &[u8]) {
        assert_eq!(pixels.len(), rect.width * rect.height);
        self.0.lock().unwrap().rects.push(rect);
    }

    fn clear(&mut self) {
        self.0.lock().unwrap().clears += 1;
    }
}

struct Rig {
    mmu: Mmu,
    clock: Clock,
}

impl Rig {
    fn new(renderer: RecordingRenderer) -> Self {
        Self {
            mmu: Mmu::with_renderer(Model::default(), Box::new(renderer)),
            clock: Clock::new(),
        }
    }

    fn tick(&mut self, n: u64) {
        let mut bus = SystemBus::new(&mut self.mmu, &mut self.clock);
        for _ in 0..n {
            bus.tick_cycle();
        }
    }

    fn stat(&self) -> u8 {
        self.mmu.read(0xFF41)
    }
}

#[test]
fn modes_follow_the_line_schedule() {
    let mut rig = Rig::new(RecordingRenderer::default());
    rig.mmu.write(0xFF40, 0x80);
    assert_eq!(rig.stat() & 0x03, Mode::OamSearch as u8);

    rig.tick(19);
    assert_eq!(rig.mmu.display.mode(), Mode::OamSearch);
    rig.tick(1);
    assert_eq!(rig.mmu.display.mode(), Mode::Transfer);
    assert_eq!(rig.stat() & 0x03, 3);
    rig.tick(43);
    assert_eq!(rig.mmu.display.mode(), Mode::HBlank);
    rig.tick(51);
    assert_eq!(rig.mmu.display.mode(), Mode::OamSearch);
    assert_eq!(rig.mmu.read(0xFF44), 1);
}

#[test]
fn vblank_requests_once_per_frame() {
    let renderer = RecordingRenderer::default();
    let log = renderer.0.clone();
    let mut rig = Rig::new(renderer);
    rig.mmu.write(0xFF40, 0x91);
    rig.mmu.write(0xFF0F, 0x00);

    rig.tick(144 * LINE_CYCLES - 1);
    assert_eq!(rig.mmu.read(0xFF0F) & 0x01, 0);
    rig.tick(1);
    assert_eq!(rig.mmu.read(0xFF44), 144);
    assert_eq!(rig.mmu.display.mode(), Mode::VBlank);
    assert_eq!(rig.mmu.read(0xFF0F) & 0x01, 0x01);
    assert_eq!(rig.mmu.display.frames(), 1);

    {
        let log = log.lock().unwrap();
        assert_eq!(log.rects.len(), 144);
        for (y, rect) in log.rects.iter().enumerate() {
            assert_eq!(*rect, Rect::scanline(y));
        }
    }

    rig.mmu.write(0xFF0F, 0x00);
    rig.tick(BASE_CYCLES_PER_FRAME - 144 * LINE_CYCLES);
    assert_eq!(rig.mmu.read(0xFF44), 0);
    assert_eq!(rig.mmu.read(0xFF0F) & 0x01, 0);
    assert_eq!(rig.mmu.display.frames(), 1);
}

#[test]
fn switching_off_holds_a_disabled_snapshot() {
    let renderer = RecordingRenderer::default();
    let log = renderer.0.clone();
    let mut rig = Rig::new(renderer);
    rig.mmu.write(0xFF40, 0x91);
    rig.tick(5 * LINE_CYCLES + 30);
    assert_eq!(rig.mmu.read(0xFF44), 5);
    assert!(rig.mmu.display.vram_locked());

    rig.mmu.write(0xFF40, 0x11);
    assert_eq!(log.lock().unwrap().clears, 1);
    for _ in 0..3 {
        assert_eq!(rig.mmu.read(0xFF44), 0);
        assert_eq!(rig.stat() & 0x03, Mode::OamSearch as u8);
        assert!(!rig.mmu.display.vram_locked());
        assert!(rig.mmu.display.frame().iter().all(|&p| p == 0));
        rig.tick(1000);
    }

    // Re-enabling restarts the frame from line 0.
    rig.mmu.write(0xFF40, 0x91);
    rig.tick(LINE_CYCLES);
    assert_eq!(rig.mmu.read(0xFF44), 1);
}

#[test]
fn coincidence_requests_stat_on_the_rising_edge() {
    let mut rig = Rig::new(RecordingRenderer::default());
    rig.mmu.write(0xFF45, 2);
    rig.mmu.write(0xFF41, 0x40);
    rig.mmu.write(0xFF40, 0x80);
    rig.mmu.write(0xFF0F, 0x00);

    rig.tick(2 * LINE_CYCLES - 1);
    assert_eq!(rig.stat() & 0x04, 0);
    assert_eq!(rig.mmu.read(0xFF0F) & 0x02, 0);

    rig.tick(1);
    assert_eq!(rig.stat() & 0x04, 0x04);
    assert_eq!(rig.mmu.read(0xFF0F) & 0x02, 0x02);

    rig.mmu.write(0xFF0F, 0x00);
    rig.tick(LINE_CYCLES - 1);
    assert_eq!(rig.mmu.read(0xFF0F) & 0x02, 0);
    rig.tick(1);
    assert_eq!(rig.stat() & 0x04, 0);
}

#[test]
fn hblank_stat_source() {
    let mut rig = Rig::new(RecordingRenderer::default());
    rig.mmu.write(0xFF41, 0x08);
    rig.mmu.write(0xFF40, 0x80);
    rig.mmu.write(0xFF0F, 0x00);
    rig.tick(62);
    assert_eq!(rig.mmu.read(0xFF0F) & 0x02, 0);
    rig.tick(1);
    assert_eq!(rig.mmu.read(0xFF0F) & 0x02, 0x02);
    // Only bits 3-6 of STAT are writable; LY == LYC == 0 sets bit 2.
    rig.mmu.write(0xFF41, 0xFF);
    assert_eq!(rig.stat(), 0x80 | 0x78 | 0x04 | Mode::HBlank as u8);
}
