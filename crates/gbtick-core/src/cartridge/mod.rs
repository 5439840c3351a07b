//! Cartridge images, header validation and bank controllers (MBC).

mod mbc1;
mod mbc3;
mod mbc5;
mod rom_only;

pub use mbc1::Mbc1;
pub use mbc3::Mbc3;
pub use mbc5::Mbc5;
pub use rom_only::RomOnly;

use crate::error::LoadError;
use crate::memory::MemoryDevice;

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;

const HEADER_END: usize = 0x150;
const TITLE_START: usize = 0x134;
const CGB_FLAG: usize = 0x143;
const CART_TYPE: usize = 0x147;
const ROM_SIZE: usize = 0x148;
const RAM_SIZE: usize = 0x149;
const HEADER_CHECKSUM: usize = 0x14D;

/// A cartridge bank controller. Writes to 0x0000-0x7FFF program its latches;
/// reads from 0x0000-0x7FFF and 0xA000-0xBFFF are translated into the ROM and
/// RAM images.
pub trait BankController: MemoryDevice {
    fn kind(&self) -> ControllerKind;

    /// Current external RAM contents, for the host's save mechanism.
    fn ram(&self) -> &[u8];

    /// Whether external RAM was written since the last call.
    fn take_ram_dirty(&mut self) -> bool;

    /// Advance one base machine cycle. Only controllers with a clock care.
    fn step(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    RomOnly,
    Mbc1,
    Mbc3,
    Mbc5,
}

impl ControllerKind {
    /// Map the header's cartridge-type byte to an emulated controller.
    pub fn from_code(code: u8) -> Result<Self, LoadError> {
        let unimplemented = |controller| Err(LoadError::Unimplemented { code, controller });
        match code {
            0x00 | 0x08 | 0x09 => Ok(ControllerKind::RomOnly),
            0x01..=0x03 => Ok(ControllerKind::Mbc1),
            0x0F..=0x13 => Ok(ControllerKind::Mbc3),
            0x19..=0x1E => Ok(ControllerKind::Mbc5),
            0x05 | 0x06 => unimplemented("MBC2"),
            0x0B..=0x0D => unimplemented("MMM01"),
            0x20 => unimplemented("MBC6"),
            0x22 => unimplemented("MBC7"),
            0xFC => unimplemented("Pocket Camera"),
            0xFD => unimplemented("TAMA5"),
            0xFE => unimplemented("HuC3"),
            0xFF => unimplemented("HuC1"),
            _ => Err(LoadError::UnsupportedCartridgeType(code)),
        }
    }
}

/// Parsed cartridge header (0x0100-0x014F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    pub cgb_flag: u8,
    pub cart_type: u8,
    pub rom_size: usize,
    pub ram_size: usize,
    pub header_checksum: u8,
    pub computed_checksum: u8,
}

impl Header {
    pub fn parse(rom: &[u8]) -> Result<Self, LoadError> {
        if rom.len() < HEADER_END {
            return Err(LoadError::TruncatedHeader { len: rom.len() });
        }

        let rom_code = rom[ROM_SIZE];
        let rom_size = match rom_code {
            0x00..=0x08 => (32 * 1024) << rom_code,
            _ => return Err(LoadError::InvalidRomSizeCode(rom_code)),
        };

        let ram_code = rom[RAM_SIZE];
        let ram_size = match ram_code {
            0x00 => 0,
            0x01 => 0x800,
            0x02 => 0x2000,
            0x03 => 0x8000,
            0x04 => 0x20000,
            0x05 => 0x10000,
            _ => return Err(LoadError::InvalidRamSizeCode(ram_code)),
        };

        let cgb_flag = rom[CGB_FLAG];
        // CGB-aware titles are shortened to make room for the manufacturer
        // code and the CGB flag.
        let title_end = if cgb_flag & 0x80 != 0 { 0x13F } else { 0x144 };
        let raw = &rom[TITLE_START..title_end];
        let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let title = String::from_utf8_lossy(&raw[..len]).trim_end().to_string();

        let computed_checksum = rom[TITLE_START..HEADER_CHECKSUM]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));

        Ok(Self {
            title,
            cgb_flag,
            cart_type: rom[CART_TYPE],
            rom_size,
            ram_size,
            header_checksum: rom[HEADER_CHECKSUM],
            computed_checksum,
        })
    }

    pub fn cgb_supported(&self) -> bool {
        self.cgb_flag & 0x80 != 0
    }

    pub fn cgb_only(&self) -> bool {
        self.cgb_flag == 0xC0
    }

    pub fn has_battery(&self) -> bool {
        matches!(
            self.cart_type,
            0x03 | 0x06 | 0x09 | 0x0D | 0x0F | 0x10 | 0x13 | 0x1B | 0x1E | 0x22 | 0xFF
        )
    }

    pub fn has_rtc(&self) -> bool {
        matches!(self.cart_type, 0x0F | 0x10)
    }

    /// MBC5 rumble carts wire bit 3 of the RAM bank register to the motor.
    pub fn has_rumble(&self) -> bool {
        matches!(self.cart_type, 0x1C..=0x1E)
    }
}

/// A validated cartridge: its header plus the controller owning the images.
pub struct Cartridge {
    header: Header,
    controller: Box<dyn BankController + Send>,
}

impl Cartridge {
    /// Validate `rom` (and optional previously saved external RAM) and build
    /// the matching controller. Images are never padded or truncated.
    pub fn load(rom: Vec<u8>, saved_ram: Option<Vec<u8>>) -> Result<Self, LoadError> {
        let header = Header::parse(&rom)?;
        let kind = ControllerKind::from_code(header.cart_type)?;

        if rom.len() != header.rom_size {
            return Err(LoadError::RomSizeMismatch {
                expected: header.rom_size,
                actual: rom.len(),
            });
        }

        let ram = match saved_ram {
            Some(ram) if ram.len() != header.ram_size => {
                return Err(LoadError::RamSizeMismatch {
                    expected: header.ram_size,
                    actual: ram.len(),
                });
            }
            Some(ram) => ram,
            None => vec![0; header.ram_size],
        };

        if header.computed_checksum != header.header_checksum {
            log::warn!(
                "header checksum mismatch: header says {:02X}, computed {:02X}",
                header.header_checksum,
                header.computed_checksum
            );
        }

        let controller: Box<dyn BankController + Send> = match kind {
            ControllerKind::RomOnly => Box::new(RomOnly::new(rom, ram)),
            ControllerKind::Mbc1 => Box::new(Mbc1::new(rom, ram)),
            ControllerKind::Mbc3 => Box::new(Mbc3::new(rom, ram, header.has_rtc())),
            ControllerKind::Mbc5 => Box::new(Mbc5::new(rom, ram, header.has_rumble())),
        };

        log::info!(
            "Loaded ROM: {} (controller: {:?}, CGB: {}, battery: {})",
            header.title,
            kind,
            if header.cgb_supported() { "yes" } else { "no" },
            if header.has_battery() { "yes" } else { "no" },
        );

        Ok(Self { header, controller })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn kind(&self) -> ControllerKind {
        self.controller.kind()
    }

    pub fn ram(&self) -> &[u8] {
        self.controller.ram()
    }

    pub fn take_ram_dirty(&mut self) -> bool {
        self.controller.take_ram_dirty()
    }

    pub fn step(&mut self) {
        self.controller.step();
    }
}

impl MemoryDevice for Cartridge {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        self.controller.read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, val: u8) {
        self.controller.write(addr, val);
    }
}

/// Number of 16 KiB banks in `rom`.
fn rom_banks(rom: &[u8]) -> usize {
    (rom.len() / ROM_BANK_SIZE).max(1)
}

/// Byte of switchable ROM window 0x4000-0x7FFF (or the fixed window when
/// `addr` < 0x4000) from `bank`, wrapped to the image's bank count.
fn banked_rom(rom: &[u8], bank: usize, addr: u16) -> u8 {
    let bank = bank % rom_banks(rom);
    let offset = bank * ROM_BANK_SIZE + (addr as usize & (ROM_BANK_SIZE - 1));
    rom.get(offset).copied().unwrap_or(0xFF)
}

/// Offset into external RAM for `addr` in 0xA000-0xBFFF and `bank`, wrapped
/// to the RAM image. `None` when the cartridge has no RAM.
fn banked_ram_offset(ram: &[u8], bank: usize, addr: u16) -> Option<usize> {
    if ram.is_empty() {
        return None;
    }
    let offset = bank * RAM_BANK_SIZE + (addr as usize - 0xA000);
    Some(offset % ram.len())
}
