//! Plain RAM devices owned by the MMU.
//!
//! Every device is addressed with absolute CPU addresses; the MMU guarantees
//! it only forwards addresses inside the device's own range.

pub const VRAM_BANK_SIZE: usize = 0x2000;
pub const WRAM_BANK_SIZE: usize = 0x1000;
pub const OAM_SIZE: usize = 0xA0;
pub const HRAM_SIZE: usize = 0x7F;

/// Byte-addressable capability shared by everything mapped into the
/// 16-bit address space.
pub trait MemoryDevice {
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, val: u8);
}

/// Video RAM, 0x8000-0x9FFF. Two banks on CGB, bank 0 only on DMG.
pub struct Vram {
    banks: [[u8; VRAM_BANK_SIZE]; 2],
    bank: usize,
}

impl Vram {
    pub fn new() -> Self {
        Self {
            banks: [[0; VRAM_BANK_SIZE]; 2],
            bank: 0,
        }
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    pub fn select_bank(&mut self, val: u8) {
        self.bank = (val & 0x01) as usize;
    }

    pub fn bank_data(&self, bank: usize) -> &[u8; VRAM_BANK_SIZE] {
        &self.banks[bank & 0x01]
    }
}

impl MemoryDevice for Vram {
    fn read(&self, addr: u16) -> u8 {
        self.banks[self.bank][(addr - 0x8000) as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.banks[self.bank][(addr - 0x8000) as usize] = val;
    }
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

/// Work RAM, 0xC000-0xDFFF. 0xD000-0xDFFF is switchable (banks 1-7) on CGB.
pub struct Wram {
    banks: [[u8; WRAM_BANK_SIZE]; 8],
    bank: usize,
}

impl Wram {
    pub fn new() -> Self {
        Self {
            banks: [[0; WRAM_BANK_SIZE]; 8],
            bank: 1,
        }
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    /// SVBK write. Selecting bank 0 maps bank 1.
    pub fn select_bank(&mut self, val: u8) {
        let bank = (val & 0x07) as usize;
        self.bank = bank.max(1);
    }
}

impl MemoryDevice for Wram {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0xC000..=0xCFFF => self.banks[0][(addr - 0xC000) as usize],
            _ => self.banks[self.bank][(addr - 0xD000) as usize],
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xC000..=0xCFFF => self.banks[0][(addr - 0xC000) as usize] = val,
            _ => self.banks[self.bank][(addr - 0xD000) as usize] = val,
        }
    }
}

impl Default for Wram {
    fn default() -> Self {
        Self::new()
    }
}

/// Sprite attribute memory, 0xFE00-0xFE9F: 40 records of Y, X, tile, flags.
pub struct Oam {
    bytes: [u8; OAM_SIZE],
}

impl Oam {
    pub fn new() -> Self {
        Self {
            bytes: [0; OAM_SIZE],
        }
    }

    pub fn bytes(&self) -> &[u8; OAM_SIZE] {
        &self.bytes
    }

    /// Store one byte of an OAM DMA transfer at `index` (0..0xA0).
    pub fn dma_store(&mut self, index: usize, val: u8) {
        self.bytes[index] = val;
    }
}

impl MemoryDevice for Oam {
    fn read(&self, addr: u16) -> u8 {
        self.bytes[(addr - 0xFE00) as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.bytes[(addr - 0xFE00) as usize] = val;
    }
}

impl Default for Oam {
    fn default() -> Self {
        Self::new()
    }
}

/// High RAM, 0xFF80-0xFFFE.
pub struct Hram {
    bytes: [u8; HRAM_SIZE],
}

impl Hram {
    pub fn new() -> Self {
        Self {
            bytes: [0; HRAM_SIZE],
        }
    }
}

impl MemoryDevice for Hram {
    fn read(&self, addr: u16) -> u8 {
        self.bytes[(addr - 0xFF80) as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.bytes[(addr - 0xFF80) as usize] = val;
    }
}

impl Default for Hram {
    fn default() -> Self {
        Self::new()
    }
}
