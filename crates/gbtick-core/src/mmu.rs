//! Memory map and hardware plumbing.
//!
//! The MMU owns every memory device and peripheral. Addresses are routed
//! through a fixed, sorted region table; two rules run before dispatch: the
//! boot ROM overlay, then the OAM DMA lockout.

use crate::audio::{AudioPort, AudioRegisters};
use crate::cartridge::Cartridge;
use crate::display::Display;
use crate::hardware::Model;
use crate::interrupts::InterruptController;
use crate::joypad::Joypad;
use crate::memory::{Hram, MemoryDevice, Oam, Vram, Wram};
use crate::renderer::{NullRenderer, Renderer};
use crate::serial::Serial;
use crate::timer::Timer;

/// OAM DMA copies 160 bytes, one per machine cycle.
pub const DMA_LENGTH: u8 = 0xA0;

/// Highest address covered by the DMA bus lockout.
const DMA_LOCKOUT_END: u16 = 0xFDFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Rom,
    Vram,
    ExternalRam,
    Wram,
    Echo,
    Oam,
    Unusable,
    Io,
    Hram,
    InterruptEnable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRange {
    pub start: u16,
    pub end: u16,
    pub region: Region,
}

const fn range(start: u16, end: u16, region: Region) -> RegionRange {
    RegionRange { start, end, region }
}

/// The address space partition, sorted by address. Every address belongs
/// to exactly one entry.
pub const MEMORY_MAP: [RegionRange; 10] = [
    range(0x0000, 0x7FFF, Region::Rom),
    range(0x8000, 0x9FFF, Region::Vram),
    range(0xA000, 0xBFFF, Region::ExternalRam),
    range(0xC000, 0xDFFF, Region::Wram),
    range(0xE000, 0xFDFF, Region::Echo),
    range(0xFE00, 0xFE9F, Region::Oam),
    range(0xFEA0, 0xFEFF, Region::Unusable),
    range(0xFF00, 0xFF7F, Region::Io),
    range(0xFF80, 0xFFFE, Region::Hram),
    range(0xFFFF, 0xFFFF, Region::InterruptEnable),
];

/// Region owning `addr`, by binary search over [`MEMORY_MAP`].
pub fn region_of(addr: u16) -> Region {
    let idx = MEMORY_MAP.partition_point(|r| r.end < addr);
    match MEMORY_MAP.get(idx) {
        Some(r) if r.start <= addr => r.region,
        _ => panic!("no device owns address {addr:#06X}"),
    }
}

/// OAM DMA: queued by an FF46 write, started at the next instruction
/// boundary, then one byte per machine cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dma {
    Idle,
    Requested { source: u16 },
    Active { source: u16, index: u8 },
}

pub struct Mmu {
    model: Model,
    pub cart: Option<Cartridge>,
    pub vram: Vram,
    pub wram: Wram,
    pub oam: Oam,
    hram: Hram,
    pub display: Display,
    pub timer: Timer,
    pub serial: Serial,
    pub joypad: Joypad,
    pub interrupts: InterruptController,
    audio: Box<dyn AudioPort + Send>,
    boot_rom: Option<Vec<u8>>,
    dma: Dma,
    dma_reg: u8,
    key1_armed: bool,
    double_speed: bool,
}

impl Mmu {
    pub fn new(model: Model) -> Self {
        Self::with_renderer(model, Box::new(NullRenderer))
    }

    pub fn with_renderer(model: Model, renderer: Box<dyn Renderer + Send>) -> Self {
        let cgb = model.is_cgb();
        Self {
            model,
            cart: None,
            vram: Vram::new(),
            wram: Wram::new(),
            oam: Oam::new(),
            hram: Hram::new(),
            display: Display::new(cgb, renderer),
            timer: Timer::new(),
            serial: Serial::new(cgb),
            joypad: Joypad::new(),
            interrupts: InterruptController::new(),
            audio: Box::new(AudioRegisters::new()),
            boot_rom: None,
            dma: Dma::Idle,
            dma_reg: 0xFF,
            key1_armed: false,
            double_speed: false,
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn is_cgb(&self) -> bool {
        self.model.is_cgb()
    }

    pub fn load_cart(&mut self, cart: Cartridge) {
        self.cart = Some(cart);
    }

    pub fn set_audio(&mut self, audio: Box<dyn AudioPort + Send>) {
        self.audio = audio;
    }

    /// Return every device to its power-on state. The cartridge and boot ROM
    /// are dropped; the renderer and audio collaborators are kept.
    pub fn power_cycle(&mut self) {
        let renderer = self.display.replace_renderer(Box::new(NullRenderer));
        let audio = std::mem::replace(&mut self.audio, Box::new(AudioRegisters::new()));
        *self = Self::with_renderer(self.model, renderer);
        self.audio = audio;
    }

    /// Map a boot ROM over the low addresses until software writes a
    /// non-zero value to FF50.
    pub fn install_boot_rom(&mut self, rom: Vec<u8>) {
        self.boot_rom = Some(rom);
    }

    pub fn boot_rom_mapped(&self) -> bool {
        self.boot_rom.is_some()
    }

    pub fn dma_active(&self) -> bool {
        matches!(self.dma, Dma::Active { .. })
    }

    fn boot_byte(&self, addr: u16) -> Option<u8> {
        let rom = self.boot_rom.as_ref()?;
        // The cartridge header (0x0100-0x01FF) stays visible.
        let masked = addr < 0x0100 || (self.is_cgb() && (0x0200..=0x08FF).contains(&addr));
        if masked {
            rom.get(addr as usize).copied()
        } else {
            None
        }
    }

    /// CPU read: applies the boot overlay and the DMA lockout.
    pub fn read(&self, addr: u16) -> u8 {
        if let Some(val) = self.boot_byte(addr) {
            return val;
        }
        if self.dma_active() && (addr <= DMA_LOCKOUT_END || region_of(addr) == Region::Oam) {
            return 0xFF;
        }
        self.read_device(addr, false)
    }

    /// Read used by the DMA engine; bypasses the lockout and the boot overlay.
    pub fn read_privileged(&self, addr: u16) -> u8 {
        self.read_device(addr, true)
    }

    /// CPU write: applies the DMA lockout.
    pub fn write(&mut self, addr: u16, val: u8) {
        if self.dma_active() && (addr <= DMA_LOCKOUT_END || region_of(addr) == Region::Oam) {
            return;
        }
        self.write_device(addr, val);
    }

    fn read_device(&self, addr: u16, privileged: bool) -> u8 {
        match region_of(addr) {
            Region::Rom | Region::ExternalRam => {
                self.cart.as_ref().map(|c| c.read(addr)).unwrap_or(0xFF)
            }
            Region::Vram => {
                if self.display.vram_locked() && !privileged {
                    0xFF
                } else {
                    self.vram.read(addr)
                }
            }
            Region::Wram => self.wram.read(addr),
            Region::Echo => self.wram.read(addr - 0x2000),
            Region::Oam => {
                if self.display.oam_locked() && !privileged {
                    0xFF
                } else {
                    self.oam.read(addr)
                }
            }
            Region::Unusable => 0xFF,
            Region::Io => self.read_io(addr),
            Region::Hram => self.hram.read(addr),
            Region::InterruptEnable => self.interrupts.read_ie(),
        }
    }

    fn write_device(&mut self, addr: u16, val: u8) {
        match region_of(addr) {
            Region::Rom | Region::ExternalRam => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.write(addr, val);
                }
            }
            Region::Vram => {
                if !self.display.vram_locked() {
                    self.vram.write(addr, val);
                }
            }
            Region::Wram => self.wram.write(addr, val),
            Region::Echo => self.wram.write(addr - 0x2000, val),
            Region::Oam => {
                if !self.display.oam_locked() {
                    self.oam.write(addr, val);
                }
            }
            Region::Unusable => {}
            Region::Io => self.write_io(addr, val),
            Region::Hram => self.hram.write(addr, val),
            Region::InterruptEnable => self.interrupts.write_ie(val),
        }
    }

    fn read_io(&self, addr: u16) -> u8 {
        let cgb = self.is_cgb();
        match addr {
            0xFF00 => self.joypad.read(),
            0xFF01 | 0xFF02 => self.serial.read(addr),
            0xFF04..=0xFF07 => self.timer.read(addr),
            0xFF0F => self.interrupts.read_if(),
            0xFF10..=0xFF3F => self.audio.read_register(addr),
            0xFF46 => self.dma_reg,
            0xFF40..=0xFF4B => self.display.read_register(addr),
            0xFF4D if cgb => {
                let speed = if self.double_speed { 0x80 } else { 0x00 };
                0x7E | speed | self.key1_armed as u8
            }
            0xFF4F if cgb => 0xFE | self.vram.bank() as u8,
            0xFF68..=0xFF6B => self.display.read_register(addr),
            0xFF70 if cgb => 0xF8 | self.wram.bank() as u8,
            _ => 0xFF,
        }
    }

    fn write_io(&mut self, addr: u16, val: u8) {
        let cgb = self.is_cgb();
        match addr {
            0xFF00 => self.joypad.write(val),
            0xFF01 | 0xFF02 => self.serial.write(addr, val),
            0xFF04..=0xFF07 => self.timer.write(addr, val),
            0xFF0F => self.interrupts.write_if(val),
            0xFF10..=0xFF3F => self.audio.write_register(addr, val),
            0xFF46 => {
                self.dma_reg = val;
                let page = if val >= 0xE0 { val & 0xDF } else { val };
                self.dma = Dma::Requested {
                    source: (page as u16) << 8,
                };
            }
            0xFF40..=0xFF4B => self.display.write_register(addr, val),
            0xFF4D if cgb => self.key1_armed = val & 0x01 != 0,
            0xFF4F if cgb => self.vram.select_bank(val),
            0xFF50 => {
                if val != 0 && self.boot_rom.take().is_some() {
                    log::debug!("boot ROM unmapped");
                }
            }
            0xFF68..=0xFF6B => self.display.write_register(addr, val),
            0xFF70 if cgb => self.wram.select_bank(val),
            _ => {}
        }
    }

    /// Advance every peripheral by one CPU machine cycle. Units on the base
    /// clock only move when `base_advanced` is set.
    pub fn step_cycle(&mut self, base_advanced: bool, base_cycles: u64) {
        self.timer.step(&mut self.interrupts);
        self.dma_step();

        if base_advanced {
            self.display
                .step(base_cycles, &self.vram, &self.oam, &mut self.interrupts);
            self.serial.step(&mut self.interrupts);
            self.audio.step();
            if let Some(cart) = self.cart.as_mut() {
                cart.step();
            }
        }
    }

    fn dma_step(&mut self) {
        let Dma::Active { source, index } = self.dma else {
            return;
        };
        let val = self.read_privileged(source + index as u16);
        self.oam.dma_store(index as usize, val);
        let next = index + 1;
        self.dma = if next == DMA_LENGTH {
            Dma::Idle
        } else {
            Dma::Active {
                source,
                index: next,
            }
        };
    }

    /// Advance queued latches at an instruction boundary.
    pub fn commit_latches(&mut self) {
        if let Dma::Requested { source } = self.dma {
            log::debug!("OAM DMA from {:04X}", source);
            self.dma = Dma::Active { source, index: 0 };
        }
    }

    pub fn reset_div(&mut self) {
        self.timer.reset_div();
    }

    /// Consume a KEY1 speed-switch request (CGB only).
    pub fn take_speed_switch(&mut self) -> bool {
        if self.is_cgb() && self.key1_armed {
            self.key1_armed = false;
            true
        } else {
            false
        }
    }

    pub fn set_double_speed(&mut self, on: bool) {
        self.double_speed = on;
    }
}
