//! Unprefixed opcode table.
//!
//! Handlers decode their operand fields from the opcode byte, so one function
//! covers a whole register or condition group.

use super::alu;
use super::{Cpu, CpuMode, EXTENDED, Execute, Opcode};
use crate::bus::BusContext;

pub static PRIMARY: [Opcode; 256] = build();

const fn build() -> [Opcode; 256] {
    let mut table = [Opcode {
        mnemonic: "",
        execute: illegal,
    }; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = Opcode {
            mnemonic: MNEMONICS[i],
            execute: handler(i as u8),
        };
        i += 1;
    }
    table
}

const fn handler(op: u8) -> Execute {
    match op {
        0x00 => nop,
        0x10 => stop,
        0x08 => ld_a16_sp,
        0x18 => jr,
        0x20 | 0x28 | 0x30 | 0x38 => jr_cc,
        0x01 | 0x11 | 0x21 | 0x31 => ld_rr_d16,
        0x09 | 0x19 | 0x29 | 0x39 => add_hl_rr,
        0x02 | 0x12 | 0x22 | 0x32 => ld_indirect_a,
        0x0A | 0x1A | 0x2A | 0x3A => ld_a_indirect,
        0x03 | 0x13 | 0x23 | 0x33 => inc_rr,
        0x0B | 0x1B | 0x2B | 0x3B => dec_rr,
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => inc_r,
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => dec_r,
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => ld_r_d8,
        0x07 | 0x0F | 0x17 | 0x1F => rotate_a,
        0x27 => daa,
        0x2F => cpl,
        0x37 => scf,
        0x3F => ccf,
        0x76 => halt,
        0x40..=0x7F => ld_r_r,
        0x80..=0xBF => alu_a_r,
        0xC0 | 0xC8 | 0xD0 | 0xD8 => ret_cc,
        0xC9 => ret,
        0xD9 => reti,
        0xC1 | 0xD1 | 0xE1 | 0xF1 => pop,
        0xC5 | 0xD5 | 0xE5 | 0xF5 => push,
        0xC2 | 0xCA | 0xD2 | 0xDA => jp_cc,
        0xC3 => jp,
        0xE9 => jp_hl,
        0xC4 | 0xCC | 0xD4 | 0xDC => call_cc,
        0xCD => call,
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => alu_a_d8,
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => rst,
        0xCB => prefix_cb,
        0xE0 => ldh_a8_a,
        0xF0 => ldh_a_a8,
        0xE2 => ld_c_a,
        0xF2 => ld_a_c,
        0xEA => ld_a16_a,
        0xFA => ld_a_a16,
        0xE8 => add_sp_e8,
        0xF8 => ld_hl_sp_e8,
        0xF9 => ld_sp_hl,
        0xF3 => di,
        0xFB => ei,
        _ => illegal,
    }
}

fn nop(_cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {}

fn illegal(cpu: &mut Cpu, _bus: &mut dyn BusContext, op: u8) {
    cpu.lock_up(op);
}

fn stop(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    // The padding byte after STOP is skipped, not fetched.
    cpu.regs.pc = cpu.regs.pc.wrapping_add(1);
    if !bus.stop_and_maybe_change_speed() {
        cpu.mode = CpuMode::Stopped;
    }
}

fn halt(cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {
    cpu.mode = CpuMode::Halted;
}

fn ld_a16_sp(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let addr = cpu.fetch16(bus);
    bus.write_word_cycle(addr, cpu.regs.sp);
}

fn jr(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let offset = cpu.fetch8(bus) as i8;
    cpu.regs.pc = cpu.regs.pc.wrapping_add(offset as u16);
    bus.tick_cycle();
}

fn jr_cc(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let offset = cpu.fetch8(bus) as i8;
    if cpu.regs.condition(op >> 3) {
        cpu.regs.pc = cpu.regs.pc.wrapping_add(offset as u16);
        bus.tick_cycle();
    }
}

fn ld_rr_d16(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.fetch16(bus);
    cpu.regs.set_pair_sp(op >> 4, val);
}

fn add_hl_rr(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.regs.pair_sp(op >> 4);
    alu::add_hl(&mut cpu.regs, val);
    bus.tick_cycle();
}

/// Address for LD (BC)/(DE)/(HL+)/(HL-), applying the HL post-increment or
/// post-decrement.
fn indirect_addr(cpu: &mut Cpu, op: u8) -> u16 {
    match (op >> 4) & 0x03 {
        0 => cpu.regs.bc(),
        1 => cpu.regs.de(),
        2 => {
            let hl = cpu.regs.hl();
            cpu.regs.set_hl(hl.wrapping_add(1));
            hl
        }
        _ => {
            let hl = cpu.regs.hl();
            cpu.regs.set_hl(hl.wrapping_sub(1));
            hl
        }
    }
}

fn ld_indirect_a(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let addr = indirect_addr(cpu, op);
    bus.write_cycle(addr, cpu.regs.a);
}

fn ld_a_indirect(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let addr = indirect_addr(cpu, op);
    cpu.regs.a = bus.read_cycle(addr);
}

fn inc_rr(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.regs.pair_sp(op >> 4).wrapping_add(1);
    cpu.regs.set_pair_sp(op >> 4, val);
    bus.tick_cycle();
}

fn dec_rr(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.regs.pair_sp(op >> 4).wrapping_sub(1);
    cpu.regs.set_pair_sp(op >> 4, val);
    bus.tick_cycle();
}

fn inc_r(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let r = op >> 3;
    let val = cpu.read_operand(bus, r);
    let res = alu::inc(&mut cpu.regs, val);
    cpu.write_operand(bus, r, res);
}

fn dec_r(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let r = op >> 3;
    let val = cpu.read_operand(bus, r);
    let res = alu::dec(&mut cpu.regs, val);
    cpu.write_operand(bus, r, res);
}

fn ld_r_d8(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.fetch8(bus);
    cpu.write_operand(bus, op >> 3, val);
}

fn rotate_a(cpu: &mut Cpu, _bus: &mut dyn BusContext, op: u8) {
    alu::rotate_a(&mut cpu.regs, op >> 3);
}

fn daa(cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {
    alu::daa(&mut cpu.regs);
}

fn cpl(cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {
    alu::cpl(&mut cpu.regs);
}

fn scf(cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {
    alu::scf(&mut cpu.regs);
}

fn ccf(cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {
    alu::ccf(&mut cpu.regs);
}

fn ld_r_r(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.read_operand(bus, op);
    cpu.write_operand(bus, op >> 3, val);
}

fn alu_a_r(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.read_operand(bus, op);
    alu::alu_op(&mut cpu.regs, op >> 3, val);
}

fn alu_a_d8(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.fetch8(bus);
    alu::alu_op(&mut cpu.regs, op >> 3, val);
}

fn ret_cc(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    bus.tick_cycle();
    if cpu.regs.condition(op >> 3) {
        cpu.regs.pc = cpu.pop16(bus);
        bus.tick_cycle();
    }
}

fn ret(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    cpu.regs.pc = cpu.pop16(bus);
    bus.tick_cycle();
}

fn reti(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    cpu.regs.pc = cpu.pop16(bus);
    bus.tick_cycle();
    cpu.ime = true;
}

fn pop(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let val = cpu.pop16(bus);
    cpu.regs.set_pair_af(op >> 4, val);
}

fn push(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    bus.tick_cycle();
    let val = cpu.regs.pair_af(op >> 4);
    cpu.push16(bus, val);
}

fn jp_cc(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let addr = cpu.fetch16(bus);
    if cpu.regs.condition(op >> 3) {
        cpu.regs.pc = addr;
        bus.tick_cycle();
    }
}

fn jp(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    cpu.regs.pc = cpu.fetch16(bus);
    bus.tick_cycle();
}

fn jp_hl(cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {
    cpu.regs.pc = cpu.regs.hl();
}

fn call_cc(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    let addr = cpu.fetch16(bus);
    if cpu.regs.condition(op >> 3) {
        bus.tick_cycle();
        let ret = cpu.regs.pc;
        cpu.push16(bus, ret);
        cpu.regs.pc = addr;
    }
}

fn call(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let addr = cpu.fetch16(bus);
    bus.tick_cycle();
    let ret = cpu.regs.pc;
    cpu.push16(bus, ret);
    cpu.regs.pc = addr;
}

fn rst(cpu: &mut Cpu, bus: &mut dyn BusContext, op: u8) {
    bus.tick_cycle();
    let ret = cpu.regs.pc;
    cpu.push16(bus, ret);
    cpu.regs.pc = (op & 0x38) as u16;
}

fn prefix_cb(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let op = cpu.fetch8(bus);
    let entry = &EXTENDED[op as usize];
    #[cfg(feature = "cpu-trace")]
    log::trace!("  CB {:02X} {}", op, entry.mnemonic);
    (entry.execute)(cpu, bus, op);
}

fn ldh_a8_a(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let offset = cpu.fetch8(bus);
    bus.write_cycle(0xFF00 | offset as u16, cpu.regs.a);
}

fn ldh_a_a8(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let offset = cpu.fetch8(bus);
    cpu.regs.a = bus.read_cycle(0xFF00 | offset as u16);
}

fn ld_c_a(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    bus.write_cycle(0xFF00 | cpu.regs.c as u16, cpu.regs.a);
}

fn ld_a_c(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    cpu.regs.a = bus.read_cycle(0xFF00 | cpu.regs.c as u16);
}

fn ld_a16_a(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let addr = cpu.fetch16(bus);
    bus.write_cycle(addr, cpu.regs.a);
}

fn ld_a_a16(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let addr = cpu.fetch16(bus);
    cpu.regs.a = bus.read_cycle(addr);
}

fn add_sp_e8(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let offset = cpu.fetch8(bus);
    cpu.regs.sp = alu::sp_offset(&mut cpu.regs, offset);
    bus.tick_cycle();
    bus.tick_cycle();
}

fn ld_hl_sp_e8(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    let offset = cpu.fetch8(bus);
    let val = alu::sp_offset(&mut cpu.regs, offset);
    cpu.regs.set_hl(val);
    bus.tick_cycle();
}

fn ld_sp_hl(cpu: &mut Cpu, bus: &mut dyn BusContext, _op: u8) {
    cpu.regs.sp = cpu.regs.hl();
    bus.tick_cycle();
}

fn di(cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {
    cpu.cancel_ime();
}

fn ei(cpu: &mut Cpu, _bus: &mut dyn BusContext, _op: u8) {
    cpu.request_ime();
}

const MNEMONICS: [&str; 256] = [
    "NOP", "LD BC,d16", "LD (BC),A", "INC BC",
    "INC B", "DEC B", "LD B,d8", "RLCA",
    "LD (a16),SP", "ADD HL,BC", "LD A,(BC)", "DEC BC",
    "INC C", "DEC C", "LD C,d8", "RRCA",
    "STOP", "LD DE,d16", "LD (DE),A", "INC DE",
    "INC D", "DEC D", "LD D,d8", "RLA",
    "JR r8", "ADD HL,DE", "LD A,(DE)", "DEC DE",
    "INC E", "DEC E", "LD E,d8", "RRA",
    "JR NZ,r8", "LD HL,d16", "LD (HL+),A", "INC HL",
    "INC H", "DEC H", "LD H,d8", "DAA",
    "JR Z,r8", "ADD HL,HL", "LD A,(HL+)", "DEC HL",
    "INC L", "DEC L", "LD L,d8", "CPL",
    "JR NC,r8", "LD SP,d16", "LD (HL-),A", "INC SP",
    "INC (HL)", "DEC (HL)", "LD (HL),d8", "SCF",
    "JR C,r8", "ADD HL,SP", "LD A,(HL-)", "DEC SP",
    "INC A", "DEC A", "LD A,d8", "CCF",
    "LD B,B", "LD B,C", "LD B,D", "LD B,E",
    "LD B,H", "LD B,L", "LD B,(HL)", "LD B,A",
    "LD C,B", "LD C,C", "LD C,D", "LD C,E",
    "LD C,H", "LD C,L", "LD C,(HL)", "LD C,A",
    "LD D,B", "LD D,C", "LD D,D", "LD D,E",
    "LD D,H", "LD D,L", "LD D,(HL)", "LD D,A",
    "LD E,B", "LD E,C", "LD E,D", "LD E,E",
    "LD E,H", "LD E,L", "LD E,(HL)", "LD E,A",
    "LD H,B", "LD H,C", "LD H,D", "LD H,E",
    "LD H,H", "LD H,L", "LD H,(HL)", "LD H,A",
    "LD L,B", "LD L,C", "LD L,D", "LD L,E",
    "LD L,H", "LD L,L", "LD L,(HL)", "LD L,A",
    "LD (HL),B", "LD (HL),C", "LD (HL),D", "LD (HL),E",
    "LD (HL),H", "LD (HL),L", "HALT", "LD (HL),A",
    "LD A,B", "LD A,C", "LD A,D", "LD A,E",
    "LD A,H", "LD A,L", "LD A,(HL)", "LD A,A",
    "ADD A,B", "ADD A,C", "ADD A,D", "ADD A,E",
    "ADD A,H", "ADD A,L", "ADD A,(HL)", "ADD A,A",
    "ADC A,B", "ADC A,C", "ADC A,D", "ADC A,E",
    "ADC A,H", "ADC A,L", "ADC A,(HL)", "ADC A,A",
    "SUB B", "SUB C", "SUB D", "SUB E",
    "SUB H", "SUB L", "SUB (HL)", "SUB A",
    "SBC A,B", "SBC A,C", "SBC A,D", "SBC A,E",
    "SBC A,H", "SBC A,L", "SBC A,(HL)", "SBC A,A",
    "AND B", "AND C", "AND D", "AND E",
    "AND H", "AND L", "AND (HL)", "AND A",
    "XOR B", "XOR C", "XOR D", "XOR E",
    "XOR H", "XOR L", "XOR (HL)", "XOR A",
    "OR B", "OR C", "OR D", "OR E",
    "OR H", "OR L", "OR (HL)", "OR A",
    "CP B", "CP C", "CP D", "CP E",
    "CP H", "CP L", "CP (HL)", "CP A",
    "RET NZ", "POP BC", "JP NZ,a16", "JP a16",
    "CALL NZ,a16", "PUSH BC", "ADD A,d8", "RST 00H",
    "RET Z", "RET", "JP Z,a16", "PREFIX CB",
    "CALL Z,a16", "CALL a16", "ADC A,d8", "RST 08H",
    "RET NC", "POP DE", "JP NC,a16", "ILLEGAL",
    "CALL NC,a16", "PUSH DE", "SUB d8", "RST 10H",
    "RET C", "RETI", "JP C,a16", "ILLEGAL",
    "CALL C,a16", "ILLEGAL", "SBC A,d8", "RST 18H",
    "LDH (a8),A", "POP HL", "LD (C),A", "ILLEGAL",
    "ILLEGAL", "PUSH HL", "AND d8", "RST 20H",
    "ADD SP,r8", "JP HL", "LD (a16),A", "ILLEGAL",
    "ILLEGAL", "ILLEGAL", "XOR d8", "RST 28H",
    "LDH A,(a8)", "POP AF", "LD A,(C)", "DI",
    "ILLEGAL", "PUSH AF", "OR d8", "RST 30H",
    "LD HL,SP+r8", "LD SP,HL", "LD A,(a16)", "EI",
    "ILLEGAL", "ILLEGAL", "CP d8", "RST 38H",
];