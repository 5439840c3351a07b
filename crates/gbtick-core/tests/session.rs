mod common;

use std::time::{Duration, Instant};

use gbtick_core::clock::BASE_CYCLES_PER_FRAME;
use gbtick_core::error::LoadError;
use gbtick_core::joypad::Button;
use gbtick_core::session::{Session, SessionConfig, SessionEvent};

fn program_rom(cart_type: u8, ram_code: u8, program: &[u8]) -> Vec<u8> {
    let mut rom = common::rom_image(cart_type, 0x00, ram_code);
    rom[0x100..0x100 + program.len()].copy_from_slice(program);
    rom
}

fn drain(session: &Session) -> Vec<SessionEvent> {
    std::iter::from_fn(|| session.poll_event()).collect()
}

#[test]
fn load_rejects_invalid_images() {
    let mut rom = common::rom_image(0x00, 0x00, 0x00);
    rom.truncate(0x4000);
    let err = Session::load(rom, None, SessionConfig::default()).err();
    assert_eq!(
        err,
        Some(LoadError::RomSizeMismatch {
            expected: 0x8000,
            actual: 0x4000
        })
    );
}

#[test]
fn frame_ticks_drive_execution_only_while_started() {
    let rom = program_rom(0x00, 0x00, &[0x18, 0xFE]);
    let session = Session::load(rom, None, SessionConfig::default()).unwrap();
    let initial = session.latest_snapshot().unwrap();
    assert_eq!(initial.cpu.pc, 0x0100);

    let t0 = Instant::now();
    session.frame_tick(t0);
    session.stop();
    assert_eq!(session.latest_snapshot().unwrap().cpu.cycles, initial.cpu.cycles);

    session.start();
    session.frame_tick(t0);
    session.stop();
    let after = session.latest_snapshot().unwrap();
    assert!(after.cpu.cycles >= initial.cpu.cycles + BASE_CYCLES_PER_FRAME);
    assert_eq!(after.cpu.pc, 0x0100);
    assert_eq!(after.frame_counter, initial.frame_counter + 1);
}

#[test]
fn catch_up_is_capped() {
    let rom = program_rom(0x00, 0x00, &[0x18, 0xFE]);
    let config = SessionConfig {
        max_catch_up_frames: 2,
        ..SessionConfig::default()
    };
    let session = Session::load(rom, None, config).unwrap();
    let start = session.latest_snapshot().unwrap().cpu.cycles;

    let t0 = Instant::now();
    session.start();
    session.frame_tick(t0);
    session.frame_tick(t0 + Duration::from_secs(10));
    session.stop();

    let ran = session.latest_snapshot().unwrap().cpu.cycles - start;
    assert!(ran >= 3 * BASE_CYCLES_PER_FRAME);
    assert!(ran < 4 * BASE_CYCLES_PER_FRAME);
}

#[test]
fn ram_writes_are_reported() {
    // LD A,0A ; LD (0000),A ; LD A,42 ; LD (A000),A ; JR -2
    let program = [
        0x3E, 0x0A, 0xEA, 0x00, 0x00, 0x3E, 0x42, 0xEA, 0x00, 0xA0, 0x18, 0xFE,
    ];
    let rom = program_rom(0x03, 0x02, &program);
    let session = Session::load(rom, None, SessionConfig::default()).unwrap();
    session.start();
    session.frame_tick(Instant::now());
    session.stop();

    let events = drain(&session);
    let ram = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::RamWritten(ram) => Some(ram),
            _ => None,
        })
        .expect("RAM write event");
    assert_eq!(ram.len(), 0x2000);
    assert_eq!(ram[0], 0x42);
}

#[test]
fn serial_bytes_are_reported() {
    // LD A,'H' ; LDH (01),A ; LD A,81 ; LDH (02),A ; JR -2
    let program = [0x3E, b'H', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, 0x18, 0xFE];
    let rom = program_rom(0x00, 0x00, &program);
    let session = Session::load(rom, None, SessionConfig::default()).unwrap();
    session.start();
    session.frame_tick(Instant::now());
    session.stop();

    assert!(drain(&session).contains(&SessionEvent::SerialBytes(vec![b'H'])));
}

#[test]
fn cartridge_swap_restarts_the_machine() {
    let rom = program_rom(0x00, 0x00, &[0x00, 0x18, 0xFE]);
    let session = Session::load(rom, None, SessionConfig::default()).unwrap();
    session.start();
    session.frame_tick(Instant::now());
    session.set_button(Button::Start, true);
    session.stop();
    assert_eq!(session.latest_snapshot().unwrap().cpu.pc, 0x0101);

    let next = program_rom(0x00, 0x00, &[0x18, 0xFE]);
    session.load_cartridge(next, None).unwrap();
    let snap = session.latest_snapshot().unwrap();
    assert_eq!(snap.cpu.pc, 0x0100);
    assert_eq!(snap.frame_counter, 0);

    assert!(session.load_cartridge(vec![0; 0x10], None).is_err());
}
