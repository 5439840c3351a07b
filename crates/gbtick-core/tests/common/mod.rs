#![allow(dead_code)]

use gbtick_core::bus::BusContext;
use gbtick_core::cpu::Cpu;

/// Zero-filled cartridge image with a valid header for the given codes.
pub fn rom_image(cart_type: u8, rom_code: u8, ram_code: u8) -> Vec<u8> {
    let mut rom = vec![0u8; (32 * 1024) << rom_code];
    rom[0x134..0x13A].copy_from_slice(b"GBTICK");
    rom[0x147] = cart_type;
    rom[0x148] = rom_code;
    rom[0x149] = ram_code;
    fix_header_checksum(&mut rom);
    rom
}

/// Plain 32 KiB ROM whose entry point at 0x0100 holds `program`.
pub fn rom_with_program(program: &[u8]) -> Vec<u8> {
    let mut rom = rom_image(0x00, 0x00, 0x00);
    rom[0x100..0x100 + program.len()].copy_from_slice(program);
    rom
}

pub fn fix_header_checksum(rom: &mut [u8]) {
    rom[0x14D] = rom[0x134..0x14D]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));
}

/// Flat 64 KiB of RAM that counts every bus call.
pub struct CountingBus {
    pub mem: Vec<u8>,
    pub cycles: u32,
    pub speed_switch: bool,
}

impl CountingBus {
    pub fn new() -> Self {
        Self {
            mem: vec![0; 0x10000],
            cycles: 0,
            speed_switch: false,
        }
    }

    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        self.mem[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl BusContext for CountingBus {
    fn read_cycle(&mut self, addr: u16) -> u8 {
        self.cycles += 1;
        self.mem[addr as usize]
    }

    fn write_cycle(&mut self, addr: u16, val: u8) {
        self.cycles += 1;
        self.mem[addr as usize] = val;
    }

    fn tick_cycle(&mut self) {
        self.cycles += 1;
    }

    fn stop_and_maybe_change_speed(&mut self) -> bool {
        self.cycles += 1;
        std::mem::take(&mut self.speed_switch)
    }
}

/// Run the instruction at `pc` and return the bus calls it issued.
pub fn cycles_for(cpu: &mut Cpu, bus: &mut CountingBus) -> u32 {
    bus.cycles = 0;
    cpu.step(bus);
    bus.cycles
}
