use super::{BankController, ControllerKind, banked_ram_offset, banked_rom};
use crate::memory::MemoryDevice;

/// MBC5: 9-bit ROM bank (bank 0 is selectable in the switchable window) and
/// a 4-bit RAM bank. On rumble carts bit 3 of the RAM bank drives the motor.
pub struct Mbc5 {
    rom: Vec<u8>,
    ram: Vec<u8>,
    ram_enable: bool,
    rom_bank: u16,
    ram_bank: u8,
    rumble: bool,
    ram_dirty: bool,
}

impl Mbc5 {
    pub fn new(rom: Vec<u8>, ram: Vec<u8>, rumble: bool) -> Self {
        Self {
            rom,
            ram,
            ram_enable: false,
            rom_bank: 1,
            ram_bank: 0,
            rumble,
            ram_dirty: false,
        }
    }
}

impl MemoryDevice for Mbc5 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => banked_rom(&self.rom, 0, addr),
            0x4000..=0x7FFF => banked_rom(&self.rom, self.rom_bank as usize, addr),
            0xA000..=0xBFFF if self.ram_enable => {
                banked_ram_offset(&self.ram, self.ram_bank as usize, addr)
                    .map(|i| self.ram[i])
                    .unwrap_or(0xFF)
            }
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enable = val & 0x0F == 0x0A,
            0x2000..=0x2FFF => {
                self.rom_bank = (self.rom_bank & 0x100) | val as u16;
                log::trace!("MBC5 ROM bank {:03X}", self.rom_bank);
            }
            0x3000..=0x3FFF => {
                self.rom_bank = (self.rom_bank & 0x0FF) | (((val & 0x01) as u16) << 8);
                log::trace!("MBC5 ROM bank {:03X}", self.rom_bank);
            }
            0x4000..=0x5FFF => {
                let mask = if self.rumble { 0x07 } else { 0x0F };
                self.ram_bank = val & mask;
                log::trace!("MBC5 RAM bank {:X}", self.ram_bank);
            }
            0xA000..=0xBFFF if self.ram_enable => {
                if let Some(i) = banked_ram_offset(&self.ram, self.ram_bank as usize, addr) {
                    self.ram[i] = val;
                    self.ram_dirty = true;
                }
            }
            _ => {}
        }
    }
}

impl BankController for Mbc5 {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Mbc5
    }

    fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn take_ram_dirty(&mut self) -> bool {
        std::mem::take(&mut self.ram_dirty)
    }
}
