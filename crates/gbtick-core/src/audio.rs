//! Audio register window (0xFF10-0xFF3F).
//!
//! The core owns only the register file. Synthesis lives behind
//! [`AudioPort`], which the MMU steps once per base machine cycle.

/// Audio collaborator driven by the MMU.
pub trait AudioPort {
    /// CPU read from 0xFF10-0xFF3F.
    fn read_register(&self, addr: u16) -> u8;

    /// CPU write to 0xFF10-0xFF3F.
    fn write_register(&mut self, addr: u16, val: u8);

    /// Advance one base machine cycle.
    fn step(&mut self) {}
}

/// Register file with hardware read-back masks and no synthesis.
pub struct AudioRegisters {
    regs: [u8; 0x20],
    wave_ram: [u8; 0x10],
    powered: bool,
}

impl AudioRegisters {
    pub fn new() -> Self {
        Self {
            regs: [0; 0x20],
            wave_ram: [0; 0x10],
            powered: true,
        }
    }

    fn read_mask(addr: u16) -> u8 {
        match addr {
            0xFF10 => 0x80,
            0xFF11 => 0x3F,
            0xFF12 => 0x00,
            0xFF13 => 0xFF,
            0xFF14 => 0xBF,
            0xFF16 => 0x3F,
            0xFF17 => 0x00,
            0xFF18 => 0xFF,
            0xFF19 => 0xBF,
            0xFF1A => 0x7F,
            0xFF1B => 0xFF,
            0xFF1C => 0x9F,
            0xFF1D => 0xFF,
            0xFF1E => 0xBF,
            0xFF20 => 0xFF,
            0xFF21 => 0x00,
            0xFF22 => 0x00,
            0xFF23 => 0xBF,
            0xFF24 => 0x00,
            0xFF25 => 0x00,
            0xFF26 => 0x70,
            _ => 0xFF,
        }
    }
}

impl AudioPort for AudioRegisters {
    fn read_register(&self, addr: u16) -> u8 {
        match addr {
            0xFF30..=0xFF3F => self.wave_ram[(addr - 0xFF30) as usize],
            // Channel status bits stay 0: nothing is ever playing.
            0xFF26 => Self::read_mask(addr) | if self.powered { 0x80 } else { 0 },
            0xFF10..=0xFF2F => self.regs[(addr - 0xFF10) as usize] | Self::read_mask(addr),
            _ => 0xFF,
        }
    }

    fn write_register(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF30..=0xFF3F => self.wave_ram[(addr - 0xFF30) as usize] = val,
            0xFF26 => {
                let on = val & 0x80 != 0;
                if !on {
                    self.regs.fill(0);
                }
                self.powered = on;
            }
            0xFF10..=0xFF2F if self.powered => self.regs[(addr - 0xFF10) as usize] = val,
            _ => {}
        }
    }
}

impl Default for AudioRegisters {
    fn default() -> Self {
        Self::new()
    }
}
