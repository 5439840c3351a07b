use super::{BankController, ControllerKind, banked_ram_offset, banked_rom};
use crate::clock::BASE_CYCLES_PER_SECOND;
use crate::memory::MemoryDevice;

/// MBC3: 7-bit ROM bank (0 selects 1), four RAM banks, and on timer carts a
/// real-time clock whose registers are mapped into 0xA000-0xBFFF by
/// selecting 0x08-0x0C as the RAM bank.
pub struct Mbc3 {
    rom: Vec<u8>,
    ram: Vec<u8>,
    ram_enable: bool,
    rom_bank: u8,
    ram_select: u8,
    rtc: Option<Rtc>,
    latch_pending: bool,
    ram_dirty: bool,
}

impl Mbc3 {
    pub fn new(rom: Vec<u8>, ram: Vec<u8>, has_rtc: bool) -> Self {
        Self {
            rom,
            ram,
            ram_enable: false,
            rom_bank: 1,
            ram_select: 0,
            rtc: has_rtc.then(Rtc::new),
            latch_pending: false,
            ram_dirty: false,
        }
    }
}

impl MemoryDevice for Mbc3 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => banked_rom(&self.rom, 0, addr),
            0x4000..=0x7FFF => banked_rom(&self.rom, self.rom_bank as usize, addr),
            0xA000..=0xBFFF if self.ram_enable => match (self.ram_select, &self.rtc) {
                (0x00..=0x03, _) => banked_ram_offset(&self.ram, self.ram_select as usize, addr)
                    .map(|i| self.ram[i])
                    .unwrap_or(0xFF),
                (0x08..=0x0C, Some(rtc)) => rtc.read_latched(self.ram_select),
                _ => 0xFF,
            },
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enable = val & 0x0F == 0x0A,
            0x2000..=0x3FFF => {
                let bank = val & 0x7F;
                self.rom_bank = if bank == 0 { 1 } else { bank };
                log::trace!("MBC3 ROM bank {:02X}", self.rom_bank);
            }
            0x4000..=0x5FFF => {
                self.ram_select = val & 0x0F;
                log::trace!("MBC3 RAM/RTC select {:02X}", self.ram_select);
            }
            0x6000..=0x7FFF => {
                if self.latch_pending
                    && val == 0x01
                    && let Some(rtc) = self.rtc.as_mut()
                {
                    rtc.latch();
                }
                self.latch_pending = val == 0x00;
            }
            0xA000..=0xBFFF if self.ram_enable => match self.ram_select {
                0x00..=0x03 => {
                    if let Some(i) = banked_ram_offset(&self.ram, self.ram_select as usize, addr) {
                        self.ram[i] = val;
                        self.ram_dirty = true;
                    }
                }
                0x08..=0x0C => {
                    if let Some(rtc) = self.rtc.as_mut() {
                        rtc.write_register(self.ram_select, val);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}

impl BankController for Mbc3 {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Mbc3
    }

    fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn take_ram_dirty(&mut self) -> bool {
        std::mem::take(&mut self.ram_dirty)
    }

    fn step(&mut self) {
        if let Some(rtc) = self.rtc.as_mut() {
            rtc.step();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RtcRegisters {
    seconds: u8,
    minutes: u8,
    hours: u8,
    days: u16,
    halt: bool,
    carry: bool,
}

impl RtcRegisters {
    fn control_byte(&self) -> u8 {
        let mut out = ((self.days >> 8) as u8) & 0x01;
        if self.halt {
            out |= 0x40;
        }
        if self.carry {
            out |= 0x80;
        }
        out
    }
}

/// MBC3 clock, advanced by emulated time only.
#[derive(Debug, Clone)]
struct Rtc {
    regs: RtcRegisters,
    latched: RtcRegisters,
    subsecond_cycles: u64,
}

impl Rtc {
    fn new() -> Self {
        Self {
            regs: RtcRegisters::default(),
            latched: RtcRegisters::default(),
            subsecond_cycles: 0,
        }
    }

    fn latch(&mut self) {
        self.latched = self.regs;
    }

    fn read_latched(&self, reg: u8) -> u8 {
        match reg {
            0x08 => self.latched.seconds & 0x3F,
            0x09 => self.latched.minutes & 0x3F,
            0x0A => self.latched.hours & 0x1F,
            0x0B => (self.latched.days & 0x00FF) as u8,
            0x0C => self.latched.control_byte(),
            _ => 0xFF,
        }
    }

    fn write_register(&mut self, reg: u8, value: u8) {
        match reg {
            0x08 => {
                self.regs.seconds = value & 0x3F;
                self.subsecond_cycles = 0;
            }
            0x09 => self.regs.minutes = value & 0x3F,
            0x0A => self.regs.hours = value & 0x1F,
            0x0B => self.regs.days = (self.regs.days & 0x0100) | value as u16,
            0x0C => {
                self.regs.days = (self.regs.days & 0x00FF) | (((value & 0x01) as u16) << 8);
                self.regs.halt = value & 0x40 != 0;
                self.regs.carry = value & 0x80 != 0;
            }
            _ => {}
        }
        self.latch();
    }

    fn step(&mut self) {
        if self.regs.halt {
            return;
        }
        self.subsecond_cycles += 1;
        if self.subsecond_cycles >= BASE_CYCLES_PER_SECOND {
            self.subsecond_cycles = 0;
            self.second_tick();
        }
    }

    fn second_tick(&mut self) {
        // Out-of-range values written by software keep counting up to the
        // 6-bit limit before wrapping, without carrying into minutes.
        if self.regs.seconds == 59 {
            self.regs.seconds = 0;
            self.minute_tick();
        } else {
            self.regs.seconds = (self.regs.seconds + 1) & 0x3F;
        }
    }

    fn minute_tick(&mut self) {
        if self.regs.minutes == 59 {
            self.regs.minutes = 0;
            self.hour_tick();
        } else {
            self.regs.minutes = (self.regs.minutes + 1) & 0x3F;
        }
    }

    fn hour_tick(&mut self) {
        if self.regs.hours == 23 {
            self.regs.hours = 0;
            self.day_tick();
        } else {
            self.regs.hours = (self.regs.hours + 1) & 0x1F;
        }
    }

    fn day_tick(&mut self) {
        if self.regs.days >= 0x01FF {
            self.regs.days = 0;
            self.regs.carry = true;
        } else {
            self.regs.days += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_seconds(rtc: &mut Rtc, seconds: u64) {
        for _ in 0..seconds * BASE_CYCLES_PER_SECOND {
            rtc.step();
        }
    }

    #[test]
    fn counts_seconds_into_minutes() {
        let mut rtc = Rtc::new();
        rtc.write_register(0x08, 58);
        run_seconds(&mut rtc, 3);
        rtc.latch();
        assert_eq!(rtc.read_latched(0x08), 1);
        assert_eq!(rtc.read_latched(0x09), 1);
    }

    #[test]
    fn halt_freezes_the_clock() {
        let mut rtc = Rtc::new();
        rtc.write_register(0x0C, 0x40);
        run_seconds(&mut rtc, 2);
        rtc.latch();
        assert_eq!(rtc.read_latched(0x08), 0);
        assert_eq!(rtc.read_latched(0x0C), 0x40);
    }

    #[test]
    fn day_counter_overflow_sets_carry() {
        let mut rtc = Rtc::new();
        rtc.write_register(0x0B, 0xFF);
        rtc.write_register(0x0C, 0x01);
        rtc.write_register(0x0A, 23);
        rtc.write_register(0x09, 59);
        rtc.write_register(0x08, 59);
        run_seconds(&mut rtc, 1);
        rtc.latch();
        assert_eq!(rtc.read_latched(0x0B), 0);
        assert_eq!(rtc.read_latched(0x0C), 0x80);
    }

    #[test]
    fn registers_read_the_latched_copy() {
        let mut mbc = Mbc3::new(vec![0; 0x8000], vec![0; 0x2000], true);
        mbc.write(0x0000, 0x0A);
        mbc.write(0x4000, 0x08);
        mbc.write(0xA000, 30);
        assert_eq!(mbc.read(0xA000), 30);

        for _ in 0..BASE_CYCLES_PER_SECOND {
            mbc.step();
        }
        assert_eq!(mbc.read(0xA000), 30);

        mbc.write(0x6000, 0x00);
        mbc.write(0x6000, 0x01);
        assert_eq!(mbc.read(0xA000), 31);
    }
}
