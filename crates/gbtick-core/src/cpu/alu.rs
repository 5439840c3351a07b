//! Flag-exact arithmetic and logic shared by both opcode tables.
//!
//! Every operation wraps; none of them touch the bus.

use super::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Registers};

#[inline]
fn z(val: u8) -> u8 {
    if val == 0 { FLAG_Z } else { 0 }
}

#[inline]
fn bit(cond: bool, mask: u8) -> u8 {
    if cond { mask } else { 0 }
}

/// ADD A,val (and ADC when `carry_in` is set).
pub fn add(regs: &mut Registers, val: u8, carry_in: bool) {
    let a = regs.a;
    let c = carry_in as u16;
    let sum = a as u16 + val as u16 + c;
    let res = sum as u8;
    regs.set_f(
        z(res)
            | bit((a & 0x0F) as u16 + (val & 0x0F) as u16 + c > 0x0F, FLAG_H)
            | bit(sum > 0xFF, FLAG_C),
    );
    regs.a = res;
}

pub fn adc(regs: &mut Registers, val: u8) {
    let carry = regs.flag(FLAG_C);
    add(regs, val, carry);
}

/// Shared by SUB, SBC and CP. Returns the wrapped difference and leaves A
/// untouched.
fn subtract(regs: &mut Registers, val: u8, carry_in: bool) -> u8 {
    let a = regs.a;
    let c = carry_in as i16;
    let diff = a as i16 - val as i16 - c;
    let res = diff as u8;
    regs.set_f(
        z(res)
            | FLAG_N
            | bit(((a & 0x0F) as i16) - ((val & 0x0F) as i16) - c < 0, FLAG_H)
            | bit(diff < 0, FLAG_C),
    );
    res
}

pub fn sub(regs: &mut Registers, val: u8) {
    regs.a = subtract(regs, val, false);
}

pub fn sbc(regs: &mut Registers, val: u8) {
    let carry = regs.flag(FLAG_C);
    regs.a = subtract(regs, val, carry);
}

pub fn cp(regs: &mut Registers, val: u8) {
    subtract(regs, val, false);
}

pub fn and(regs: &mut Registers, val: u8) {
    regs.a &= val;
    regs.set_f(z(regs.a) | FLAG_H);
}

pub fn xor(regs: &mut Registers, val: u8) {
    regs.a ^= val;
    regs.set_f(z(regs.a));
}

pub fn or(regs: &mut Registers, val: u8) {
    regs.a |= val;
    regs.set_f(z(regs.a));
}

/// Dispatch for the eight-way ALU group selected by bits 3-5 of the opcode
/// (ADD, ADC, SUB, SBC, AND, XOR, OR, CP).
pub fn alu_op(regs: &mut Registers, op: u8, val: u8) {
    match op & 0x07 {
        0 => add(regs, val, false),
        1 => adc(regs, val),
        2 => sub(regs, val),
        3 => sbc(regs, val),
        4 => and(regs, val),
        5 => xor(regs, val),
        6 => or(regs, val),
        _ => cp(regs, val),
    }
}

/// INC r: carry is preserved.
pub fn inc(regs: &mut Registers, val: u8) -> u8 {
    let res = val.wrapping_add(1);
    let carry = regs.f() & FLAG_C;
    regs.set_f(carry | z(res) | bit(val & 0x0F == 0x0F, FLAG_H));
    res
}

/// DEC r: carry is preserved.
pub fn dec(regs: &mut Registers, val: u8) -> u8 {
    let res = val.wrapping_sub(1);
    let carry = regs.f() & FLAG_C;
    regs.set_f(carry | FLAG_N | z(res) | bit(val & 0x0F == 0, FLAG_H));
    res
}

/// ADD HL,rr: zero is preserved, half-carry out of bit 11.
pub fn add_hl(regs: &mut Registers, val: u16) {
    let hl = regs.hl();
    let zero = regs.f() & FLAG_Z;
    regs.set_f(
        zero | bit((hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF, FLAG_H)
            | bit(hl as u32 + val as u32 > 0xFFFF, FLAG_C),
    );
    regs.set_hl(hl.wrapping_add(val));
}

/// SP + signed offset as computed by ADD SP,e8 and LD HL,SP+e8. Flags come
/// from the unsigned low-byte addition; Z and N are cleared.
pub fn sp_offset(regs: &mut Registers, offset: u8) -> u16 {
    let sp = regs.sp;
    regs.set_f(
        bit((sp & 0x000F) + (offset & 0x0F) as u16 > 0x000F, FLAG_H)
            | bit((sp & 0x00FF) + offset as u16 > 0x00FF, FLAG_C),
    );
    sp.wrapping_add(offset as i8 as u16)
}

/// DAA. The correction depends on whether the previous operation was an
/// addition or a subtraction (N) and on its H and C outputs.
pub fn daa(regs: &mut Registers) {
    let subtract = regs.flag(FLAG_N);
    let half = regs.flag(FLAG_H);
    let mut carry = regs.flag(FLAG_C);
    let mut correction = 0u8;

    if half || (!subtract && (regs.a & 0x0F) > 0x09) {
        correction |= 0x06;
    }
    if carry || (!subtract && regs.a > 0x99) {
        correction |= 0x60;
        carry = true;
    }

    regs.a = if subtract {
        regs.a.wrapping_sub(correction)
    } else {
        regs.a.wrapping_add(correction)
    };
    regs.set_f(z(regs.a) | bit(subtract, FLAG_N) | bit(carry, FLAG_C));
}

pub fn cpl(regs: &mut Registers) {
    regs.a = !regs.a;
    regs.set_flag(FLAG_N, true);
    regs.set_flag(FLAG_H, true);
}

pub fn scf(regs: &mut Registers) {
    let zero = regs.f() & FLAG_Z;
    regs.set_f(zero | FLAG_C);
}

pub fn ccf(regs: &mut Registers) {
    let zero = regs.f() & FLAG_Z;
    let carry = if regs.flag(FLAG_C) { 0 } else { FLAG_C };
    regs.set_f(zero | carry);
}

/// Rotate/shift group of the prefixed table, selected by bits 3-5
/// (RLC, RRC, RL, RR, SLA, SRA, SWAP, SRL). Z reflects the result.
pub fn shift_op(regs: &mut Registers, op: u8, val: u8) -> u8 {
    let carry_in = regs.flag(FLAG_C) as u8;
    let (res, carry) = match op & 0x07 {
        0 => (val.rotate_left(1), val & 0x80 != 0),
        1 => (val.rotate_right(1), val & 0x01 != 0),
        2 => ((val << 1) | carry_in, val & 0x80 != 0),
        3 => ((val >> 1) | (carry_in << 7), val & 0x01 != 0),
        4 => (val << 1, val & 0x80 != 0),
        5 => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
        6 => (val.rotate_left(4), false),
        _ => (val >> 1, val & 0x01 != 0),
    };
    regs.set_f(z(res) | bit(carry, FLAG_C));
    res
}

/// RLCA/RRCA/RLA/RRA: the accumulator forms always clear Z.
pub fn rotate_a(regs: &mut Registers, op: u8) {
    let a = regs.a;
    let res = shift_op(regs, op, a);
    regs.a = res;
    let carry = regs.f() & FLAG_C;
    regs.set_f(carry);
}

/// BIT n: carry preserved, H set, Z when the bit is clear.
pub fn test_bit(regs: &mut Registers, n: u8, val: u8) {
    let carry = regs.f() & FLAG_C;
    regs.set_f(carry | FLAG_H | bit(val & (1 << n) == 0, FLAG_Z));
}
