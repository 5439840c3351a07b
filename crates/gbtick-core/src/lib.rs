//! Cycle-accurate Game Boy / Game Boy Color execution core.
//!
//! This crate contains the platform-agnostic machine: CPU, bus, cartridge
//! controllers, interrupt controller and display timing, all advanced by one
//! shared machine-cycle clock. Hosts drive it through [`session::Session`]
//! or, single-threaded, through the [`gameboy`] facade.

/// Audio register window and the collaborator trait behind it.
pub mod audio;

/// The per-cycle bus context the CPU executes against.
pub mod bus;

/// Cartridge header validation and bank controllers (MBC).
pub mod cartridge;

/// Machine-cycle clock and frame pacing.
pub mod clock;

/// SM83 CPU core.
pub mod cpu;

/// LCD registers, mode timing and the scanline compositor.
pub mod display;

/// Load-time errors.
pub mod error;

/// High-level facade that wires the CPU, MMU and clock into a single machine.
pub mod gameboy;

/// Console models and revisions.
pub mod hardware;

/// Interrupt controller and dispatch.
pub mod interrupts;

/// Joypad input register.
pub mod joypad;

/// Plain memory devices (VRAM, WRAM, OAM, HRAM).
pub mod memory;

/// Memory map and hardware plumbing.
pub mod mmu;

/// Presentation collaborator interface.
pub mod renderer;

/// Serial port.
pub mod serial;

/// Worker-thread session for hosts.
pub mod session;

/// Value copies of machine state for other threads.
pub mod snapshot;

/// Divider/timer unit.
pub mod timer;

pub use cartridge::Cartridge;
pub use error::LoadError;
pub use gameboy::GameBoy;
pub use hardware::{DmgRevision, Model};
pub use joypad::Button;
pub use session::{Session, SessionConfig, SessionEvent};
pub use snapshot::PresentationSnapshot;
