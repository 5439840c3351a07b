use super::{BankController, ControllerKind, banked_ram_offset};
use crate::memory::MemoryDevice;

/// 32 KiB cartridge without a mapper, optionally with up to 8 KiB of RAM.
pub struct RomOnly {
    rom: Vec<u8>,
    ram: Vec<u8>,
    ram_dirty: bool,
}

impl RomOnly {
    pub fn new(rom: Vec<u8>, ram: Vec<u8>) -> Self {
        Self {
            rom,
            ram,
            ram_dirty: false,
        }
    }
}

impl MemoryDevice for RomOnly {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.rom.get(addr as usize).copied().unwrap_or(0xFF),
            0xA000..=0xBFFF => banked_ram_offset(&self.ram, 0, addr)
                .map(|i| self.ram[i])
                .unwrap_or(0xFF),
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        if (0xA000..=0xBFFF).contains(&addr)
            && let Some(i) = banked_ram_offset(&self.ram, 0, addr)
        {
            self.ram[i] = val;
            self.ram_dirty = true;
        }
    }
}

impl BankController for RomOnly {
    fn kind(&self) -> ControllerKind {
        ControllerKind::RomOnly
    }

    fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn take_ram_dirty(&mut self) -> bool {
        std::mem::take(&mut self.ram_dirty)
    }
}
