use super::{BankController, ControllerKind, banked_ram_offset, banked_rom};
use crate::memory::MemoryDevice;

/// MBC1: a 5-bit ROM bank register where 0 selects 1, a 2-bit secondary
/// register, and a mode bit deciding whether the secondary register also
/// banks the 0x0000 window and external RAM.
pub struct Mbc1 {
    rom: Vec<u8>,
    ram: Vec<u8>,
    ram_enable: bool,
    rom_bank: u8,
    upper_bits: u8,
    mode: u8,
    ram_dirty: bool,
}

impl Mbc1 {
    pub fn new(rom: Vec<u8>, ram: Vec<u8>) -> Self {
        Self {
            rom,
            ram,
            ram_enable: false,
            rom_bank: 1,
            upper_bits: 0,
            mode: 0,
            ram_dirty: false,
        }
    }

    fn ram_bank(&self) -> usize {
        if self.mode == 1 {
            self.upper_bits as usize
        } else {
            0
        }
    }
}

impl MemoryDevice for Mbc1 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => {
                let bank = if self.mode == 1 {
                    (self.upper_bits as usize) << 5
                } else {
                    0
                };
                banked_rom(&self.rom, bank, addr)
            }
            0x4000..=0x7FFF => {
                let bank = ((self.upper_bits as usize) << 5) | self.rom_bank as usize;
                banked_rom(&self.rom, bank, addr)
            }
            0xA000..=0xBFFF if self.ram_enable => {
                banked_ram_offset(&self.ram, self.ram_bank(), addr)
                    .map(|i| self.ram[i])
                    .unwrap_or(0xFF)
            }
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enable = val & 0x0F == 0x0A,
            0x2000..=0x3FFF => {
                let bank = val & 0x1F;
                self.rom_bank = if bank == 0 { 1 } else { bank };
                log::trace!("MBC1 ROM bank {:02X}", self.rom_bank);
            }
            0x4000..=0x5FFF => {
                self.upper_bits = val & 0x03;
                log::trace!("MBC1 upper bank bits {:02X}", self.upper_bits);
            }
            0x6000..=0x7FFF => self.mode = val & 0x01,
            0xA000..=0xBFFF if self.ram_enable => {
                if let Some(i) = banked_ram_offset(&self.ram, self.ram_bank(), addr) {
                    self.ram[i] = val;
                    self.ram_dirty = true;
                }
            }
            _ => {}
        }
    }
}

impl BankController for Mbc1 {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Mbc1
    }

    fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn take_ram_dirty(&mut self) -> bool {
        std::mem::take(&mut self.ram_dirty)
    }
}
