use gbtick_core::cpu::CpuMode;
use gbtick_core::gameboy::GameBoy;
use gbtick_core::hardware::Model;
use gbtick_core::interrupts::Interrupt;
use gbtick_core::joypad::Button;

/// Booted machine executing `program` from WRAM.
fn machine(program: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new(Model::default());
    gb.bootstrap();
    for (i, &b) in program.iter().enumerate() {
        gb.mmu.write(0xC000 + i as u16, b);
    }
    gb.cpu.regs.pc = 0xC000;
    gb.cpu.regs.sp = 0xD000;
    gb.mmu.write(0xFF0F, 0x00);
    gb
}

#[test]
fn vblank_wins_over_timer() {
    let mut gb = machine(&[0x00]);
    gb.cpu.ime = true;
    gb.mmu.write(0xFFFF, 0x05);
    gb.mmu.write(0xFF0F, 0x05);

    let before = gb.clock.cycles();
    assert_eq!(gb.step(), Some(Interrupt::VBlank));
    assert_eq!(gb.cpu.regs.pc, 0x0040);
    assert!(!gb.cpu.ime);
    assert_eq!(gb.mmu.read(0xFF0F), 0xE4);
    assert_eq!(gb.cpu.regs.sp, 0xCFFE);
    assert_eq!(gb.mmu.read(0xCFFE), 0x01);
    assert_eq!(gb.mmu.read(0xCFFF), 0xC0);
    // One cycle of NOP plus two internal cycles and two pushes.
    assert_eq!(gb.clock.cycles() - before, 5);
}

#[test]
fn nothing_fires_when_the_and_is_zero() {
    let mut gb = machine(&[0x00, 0x00]);
    gb.cpu.ime = true;
    gb.mmu.write(0xFFFF, 0x01);
    gb.mmu.write(0xFF0F, 0x04);
    assert_eq!(gb.step(), None);
    assert_eq!(gb.cpu.regs.pc, 0xC001);
    assert!(gb.cpu.ime);
}

#[test]
fn halt_with_interrupts_disabled_exits_without_servicing() {
    let mut gb = machine(&[0x76, 0x00]);
    gb.mmu.write(0xFFFF, 0x04);
    assert_eq!(gb.step(), None);
    assert_eq!(gb.cpu.mode(), CpuMode::Running);
    assert_eq!(gb.cpu.regs.pc, 0xC001);
    assert_eq!(gb.mmu.read(0xFF0F) & 0x1F, 0x00);
}

#[test]
fn halt_waits_for_an_enabled_request() {
    let mut gb = machine(&[0x76, 0x00]);
    gb.cpu.ime = true;
    gb.mmu.write(0xFFFF, 0x04);
    gb.step();
    for _ in 0..100 {
        assert_eq!(gb.step(), None);
        assert!(gb.cpu.is_halted());
    }
    // A request that is not enabled does not wake the CPU.
    gb.mmu.write(0xFF0F, 0x08);
    assert_eq!(gb.step(), None);
    assert!(gb.cpu.is_halted());

    gb.mmu.interrupts.request(Interrupt::Timer);
    assert_eq!(gb.step(), Some(Interrupt::Timer));
    assert_eq!(gb.cpu.mode(), CpuMode::Running);
    assert_eq!(gb.cpu.regs.pc, 0x0050);
    assert_eq!(gb.mmu.read(0xCFFE), 0x01);
}

#[test]
fn ei_takes_effect_after_the_next_instruction() {
    // EI ; NOP ; NOP
    let mut gb = machine(&[0xFB, 0x00, 0x00]);
    gb.mmu.write(0xFFFF, 0x01);
    gb.mmu.write(0xFF0F, 0x01);

    assert_eq!(gb.step(), None);
    assert!(!gb.cpu.ime);
    assert_eq!(gb.cpu.regs.pc, 0xC001);

    assert_eq!(gb.step(), Some(Interrupt::VBlank));
    assert_eq!(gb.mmu.read(0xCFFE), 0x02);
    assert_eq!(gb.mmu.read(0xCFFF), 0xC0);
}

#[test]
fn di_cancels_a_pending_ei() {
    // EI ; DI ; NOP
    let mut gb = machine(&[0xFB, 0xF3, 0x00]);
    gb.mmu.write(0xFFFF, 0x01);
    gb.mmu.write(0xFF0F, 0x01);
    for _ in 0..3 {
        assert_eq!(gb.step(), None);
    }
    assert!(!gb.cpu.ime);
    assert_eq!(gb.cpu.regs.pc, 0xC003);
}

#[test]
fn reti_enables_immediately() {
    let mut gb = machine(&[0xD9]);
    gb.mmu.write(0xCFFE, 0x00);
    gb.mmu.write(0xCFFF, 0xC1);
    gb.cpu.regs.sp = 0xCFFE;
    gb.mmu.write(0xC100, 0x00);
    gb.mmu.write(0xFFFF, 0x04);
    gb.mmu.write(0xFF0F, 0x04);

    assert_eq!(gb.step(), Some(Interrupt::Timer));
    assert_eq!(gb.cpu.regs.pc, 0x0050);
    assert_eq!(gb.mmu.read(0xCFFE), 0x00);
    assert_eq!(gb.mmu.read(0xCFFF), 0xC1);
}

#[test]
fn locked_cpu_takes_no_interrupts() {
    let mut gb = machine(&[0xD3, 0x00]);
    gb.cpu.ime = true;
    gb.mmu.write(0xFFFF, 0x04);
    gb.mmu.write(0xFF0F, 0x04);

    for _ in 0..3 {
        assert_eq!(gb.step(), None);
        assert_eq!(gb.cpu.mode(), CpuMode::Locked);
    }
    assert_eq!(gb.cpu.regs.pc, 0xC001);
    assert_eq!(gb.cpu.regs.sp, 0xD000);
    assert!(gb.cpu.ime);
    assert_eq!(gb.mmu.read(0xFF0F) & 0x1F, 0x04);
}

#[test]
fn only_the_joypad_releases_stop() {
    let mut gb = machine(&[0x10, 0x00, 0x00]);
    gb.cpu.ime = true;
    gb.mmu.write(0xFFFF, 0x04);
    gb.step();
    assert_eq!(gb.cpu.mode(), CpuMode::Stopped);

    gb.mmu.write(0xFF0F, 0x04);
    assert_eq!(gb.step(), None);
    assert_eq!(gb.cpu.mode(), CpuMode::Stopped);
    assert_eq!(gb.cpu.regs.pc, 0xC002);
    assert_eq!(gb.mmu.read(0xFF0F) & 0x04, 0x04);

    gb.set_button(Button::A, true);
    assert_eq!(gb.step(), Some(Interrupt::Timer));
    assert_eq!(gb.cpu.mode(), CpuMode::Running);
    assert_eq!(gb.cpu.regs.pc, 0x0050);
}
