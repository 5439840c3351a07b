//! The system orchestrator: one CPU, one MMU and the clock they share.

use crate::bus::SystemBus;
use crate::cartridge::Cartridge;
use crate::clock::{BASE_CYCLES_PER_FRAME, Clock};
use crate::cpu::{Cpu, CpuMode};
use crate::hardware::{DmgRevision, Model};
use crate::interrupts::{self, Interrupt};
use crate::joypad::Button;
use crate::mmu::Mmu;
use crate::renderer::{NullRenderer, Renderer};

/// Upper bound on how long a boot ROM may run before it is abandoned, in
/// base cycles (about ten seconds of emulated time).
const BOOT_ROM_CYCLE_LIMIT: u64 = 600 * BASE_CYCLES_PER_FRAME;

// I/O state the boot ROM leaves behind (gbdev.io/pandocs/Power_Up_State.html).
// FF46 is omitted: writing it would start a DMA.
const POST_BOOT_IO: [(u16, u8); 32] = [
    (0xFF05, 0x00),
    (0xFF06, 0x00),
    (0xFF07, 0x00),
    (0xFF10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF13, 0xFF),
    (0xFF14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF17, 0x00),
    (0xFF18, 0xFF),
    (0xFF19, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1D, 0xFF),
    (0xFF1E, 0xBF),
    (0xFF20, 0xFF),
    (0xFF21, 0x00),
    (0xFF22, 0x00),
    (0xFF23, 0xBF),
    (0xFF24, 0x77),
    (0xFF25, 0xF3),
    (0xFF40, 0x91),
    (0xFF42, 0x00),
    (0xFF43, 0x00),
    (0xFF45, 0x00),
    (0xFF47, 0xFC),
    (0xFF4A, 0x00),
    (0xFF4B, 0x00),
    (0xFF0F, 0xE1),
    (0xFFFF, 0x00),
];

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
    pub clock: Clock,
    model: Model,
    boot_rom: Option<Vec<u8>>,
}

impl GameBoy {
    pub fn new(model: Model) -> Self {
        Self::with_renderer(model, Box::new(NullRenderer))
    }

    pub fn with_renderer(model: Model, renderer: Box<dyn Renderer + Send>) -> Self {
        Self {
            cpu: Cpu::new(),
            mmu: Mmu::with_renderer(model, renderer),
            clock: Clock::new(),
            model,
            boot_rom: None,
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Keep a boot ROM image; it is mapped on every [`bootstrap`](Self::bootstrap).
    pub fn set_boot_rom(&mut self, rom: Vec<u8>) {
        self.boot_rom = Some(rom);
    }

    /// Power-cycle the machine with `cart` inserted. Call
    /// [`bootstrap`](Self::bootstrap) afterwards.
    pub fn load_cartridge(&mut self, cart: Cartridge) {
        self.cpu = Cpu::new();
        self.clock = Clock::new();
        self.mmu.power_cycle();
        self.mmu.load_cart(cart);
    }

    /// Bring the machine to the state software expects at 0x0100: run the
    /// boot ROM if one is set, otherwise apply the post-boot presets.
    pub fn bootstrap(&mut self) {
        if let Some(rom) = self.boot_rom.clone() {
            self.cpu = Cpu::new();
            self.mmu.install_boot_rom(rom);
            let deadline = self.clock.base_cycles() + BOOT_ROM_CYCLE_LIMIT;
            while self.mmu.boot_rom_mapped() && self.clock.base_cycles() < deadline {
                self.step();
            }
            if !self.mmu.boot_rom_mapped() {
                log::info!("boot ROM finished after {} cycles", self.clock.cycles());
                return;
            }
            log::warn!("boot ROM did not unmap itself; using post-boot presets");
        }
        self.apply_post_boot_state();
    }

    fn apply_post_boot_state(&mut self) {
        self.cpu = Cpu::post_boot(self.model);
        // Unmaps a boot ROM that never finished.
        self.mmu.write(0xFF50, 0x01);
        for (addr, val) in POST_BOOT_IO {
            self.mmu.write(addr, val);
        }
        if let Model::Dmg(revision) = self.model {
            self.mmu.write(0xFF48, 0xFF);
            self.mmu.write(0xFF49, 0xFF);
            self.mmu.timer.div = match revision {
                DmgRevision::Rev0 => 0x1800,
                _ => 0xABCC,
            };
        }
    }

    /// Execute one instruction (or one idle cycle) and then service
    /// interrupts. Returns the interrupt dispatched, if any.
    pub fn step(&mut self) -> Option<Interrupt> {
        let mut bus = SystemBus::new(&mut self.mmu, &mut self.clock);
        self.cpu.step(&mut bus);

        if self.cpu.mode() == CpuMode::Stopped
            && bus.mmu().interrupts.is_requested(Interrupt::Joypad)
        {
            self.cpu.wake();
        }

        let serviced = interrupts::service(&mut self.cpu, &mut bus);
        self.mmu.commit_latches();
        serviced
    }

    /// Run whole instructions until at least `budget` base cycles have
    /// elapsed. Returns the base cycles actually spent.
    pub fn run_for(&mut self, budget: u64) -> u64 {
        let start = self.clock.base_cycles();
        let target = start + budget;
        while self.clock.base_cycles() < target {
            self.step();
        }
        self.clock.base_cycles() - start
    }

    /// Run until the display finishes a frame, or one frame's worth of base
    /// cycles passes with the LCD off.
    pub fn run_frame(&mut self) {
        let frames = self.mmu.display.frames();
        let deadline = self.clock.base_cycles() + BASE_CYCLES_PER_FRAME;
        while self.mmu.display.frames() == frames && self.clock.base_cycles() < deadline {
            self.step();
        }
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.mmu
            .joypad
            .set_button(button, pressed, &mut self.mmu.interrupts);
    }

    /// Bytes sent over the serial port since the last call.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.mmu.serial.take_output()
    }

    /// Copy of external RAM if the cartridge wrote it since the last call.
    pub fn take_ram_write(&mut self) -> Option<Vec<u8>> {
        let cart = self.mmu.cart.as_mut()?;
        cart.take_ram_dirty().then(|| cart.ram().to_vec())
    }
}
