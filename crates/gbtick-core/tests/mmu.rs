mod common;

use gbtick_core::bus::{BusContext, SystemBus};
use gbtick_core::cartridge::Cartridge;
use gbtick_core::clock::Clock;
use gbtick_core::display::Mode;
use gbtick_core::hardware::Model;
use gbtick_core::mmu::{DMA_LENGTH, Mmu};

fn cart_filled(byte: u8) -> Cartridge {
    let mut rom = common::rom_image(0x00, 0x00, 0x00);
    rom[..0x100].fill(byte);
    rom[0x150..].fill(byte);
    Cartridge::load(rom, None).unwrap()
}

#[test]
fn word_round_trip_costs_two_cycles_each() {
    let mut mmu = Mmu::new(Model::default());
    let mut clock = Clock::new();
    let mut bus = SystemBus::new(&mut mmu, &mut clock);
    bus.write_word_cycle(0xC123, 0xBEEF);
    assert_eq!(bus.read_word_cycle(0xC123), 0xBEEF);
    bus.write_word_cycle(0xFF80, 0x1234);
    assert_eq!(bus.read_word_cycle(0xFF80), 0x1234);
    drop(bus);
    assert_eq!(clock.cycles(), 8);
    assert_eq!(mmu.read(0xC123), 0xEF);
    assert_eq!(mmu.read(0xC124), 0xBE);
}

#[test]
fn echo_mirrors_work_ram_both_ways() {
    let mut mmu = Mmu::new(Model::default());
    mmu.write(0xE010, 0x42);
    assert_eq!(mmu.read(0xC010), 0x42);
    mmu.write(0xDDFF, 0x99);
    assert_eq!(mmu.read(0xFDFF), 0x99);
}

#[test]
fn dma_locks_the_bus_until_done() {
    let mut mmu = Mmu::new(Model::default());
    let mut clock = Clock::new();
    for i in 0..DMA_LENGTH as u16 {
        mmu.write(0xC000 + i, i as u8 ^ 0x5A);
    }
    mmu.write(0xFF80, 0x77);

    mmu.write(0xFF46, 0xC0);
    assert!(!mmu.dma_active(), "DMA starts at the next instruction boundary");
    assert_eq!(mmu.read(0xC001), 0x01 ^ 0x5A);
    mmu.commit_latches();
    assert!(mmu.dma_active());

    for addr in [0x0000, 0x4000, 0x8000, 0xA000, 0xC001, 0xE001, 0xFDFF, 0xFE00] {
        assert_eq!(mmu.read(addr), 0xFF, "{addr:04X}");
    }
    assert_eq!(mmu.read_privileged(0xC001), 0x01 ^ 0x5A);
    assert_eq!(mmu.read(0xFF80), 0x77);
    assert_eq!(mmu.read(0xFF46), 0xC0);

    mmu.write(0xC002, 0x00);
    assert_eq!(mmu.read_privileged(0xC002), 0x02 ^ 0x5A);

    let mut bus = SystemBus::new(&mut mmu, &mut clock);
    for _ in 0..DMA_LENGTH {
        bus.tick_cycle();
    }
    drop(bus);
    assert!(!mmu.dma_active());
    for i in 0..DMA_LENGTH as u16 {
        assert_eq!(mmu.read(0xFE00 + i), i as u8 ^ 0x5A);
    }
}

#[test]
fn dma_from_echo_pages_reads_work_ram() {
    let mut mmu = Mmu::new(Model::default());
    mmu.write(0xC000, 0x3C);
    mmu.write(0xFF46, 0xE0);
    mmu.commit_latches();
    let mut clock = Clock::new();
    let mut bus = SystemBus::new(&mut mmu, &mut clock);
    for _ in 0..DMA_LENGTH {
        bus.tick_cycle();
    }
    drop(bus);
    assert_eq!(mmu.read(0xFE00), 0x3C);
}

#[test]
fn boot_rom_masks_low_addresses_until_disabled() {
    let mut mmu = Mmu::new(Model::default());
    mmu.load_cart(cart_filled(0x55));
    mmu.install_boot_rom(vec![0xAA; 0x100]);
    assert_eq!(mmu.read(0x0000), 0xAA);
    assert_eq!(mmu.read(0x00FF), 0xAA);
    assert_eq!(mmu.read(0x0104), 0x00);
    assert_eq!(mmu.read(0x0150), 0x55);

    mmu.write(0xFF50, 0x00);
    assert!(mmu.boot_rom_mapped());
    mmu.write(0xFF50, 0x01);
    assert!(!mmu.boot_rom_mapped());
    assert_eq!(mmu.read(0x0000), 0x55);
}

#[test]
fn cgb_boot_rom_keeps_the_header_visible() {
    let mut mmu = Mmu::new(Model::Cgb);
    mmu.load_cart(cart_filled(0x55));
    mmu.install_boot_rom(vec![0xAA; 0x900]);
    assert_eq!(mmu.read(0x0000), 0xAA);
    assert_eq!(mmu.read(0x0134), b'G');
    assert_eq!(mmu.read(0x0200), 0xAA);
    assert_eq!(mmu.read(0x08FF), 0xAA);
    assert_eq!(mmu.read(0x0900), 0x55);
}

#[test]
fn vram_is_locked_during_pixel_transfer() {
    let mut mmu = Mmu::new(Model::default());
    let mut clock = Clock::new();
    mmu.write(0x8000, 0x12);
    mmu.write(0xFE00, 0x34);
    mmu.write(0xFF40, 0x80);

    let mut bus = SystemBus::new(&mut mmu, &mut clock);
    while bus.mmu().display.mode() != Mode::Transfer {
        bus.tick_cycle();
    }
    let mmu = bus.mmu();
    assert_eq!(mmu.read(0x8000), 0xFF);
    assert_eq!(mmu.read(0xFE00), 0xFF);
    assert_eq!(mmu.read_privileged(0x8000), 0x12);
    mmu.write(0x8000, 0x99);
    assert_eq!(mmu.read_privileged(0x8000), 0x12);

    while bus.mmu().display.mode() != Mode::HBlank {
        bus.tick_cycle();
    }
    assert_eq!(bus.mmu().read(0x8000), 0x12);
}
