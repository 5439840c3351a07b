//! Host control surface: a machine running on its own worker thread.
//!
//! The host never touches the live machine. Commands are serialised onto the
//! worker over a channel and processed strictly between execution batches,
//! so `stop` returning means no instruction is in flight. State flows back
//! as events and as immutable [`PresentationSnapshot`] copies.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel as cb;

use crate::cartridge::Cartridge;
use crate::clock::FramePacer;
use crate::error::LoadError;
use crate::gameboy::GameBoy;
use crate::hardware::Model;
use crate::joypad::Button;
use crate::snapshot::PresentationSnapshot;

const DEFAULT_MAX_CATCH_UP_FRAMES: u32 = 4;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: Model,
    pub boot_rom: Option<Vec<u8>>,
    /// Most frames a single tick may owe after the host stalls.
    pub max_catch_up_frames: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: Model::default(),
            boot_rom: None,
            max_catch_up_frames: DEFAULT_MAX_CATCH_UP_FRAMES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// External RAM changed during the last batch; carries a full copy.
    RamWritten(Vec<u8>),
    /// Bytes the game sent over the serial port.
    SerialBytes(Vec<u8>),
}

enum Command {
    Start,
    Stop { ack: cb::Sender<()> },
    FrameTick(Instant),
    LoadCartridge { cart: Cartridge, ack: cb::Sender<()> },
    SetButton(Button, bool),
    Shutdown,
}

type SnapshotSlot = Arc<Mutex<Option<Arc<PresentationSnapshot>>>>;

pub struct Session {
    commands: cb::Sender<Command>,
    events: cb::Receiver<SessionEvent>,
    snapshot: SnapshotSlot,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    /// Validate the cartridge, bootstrap a machine and park it on a worker
    /// thread. The session starts stopped.
    pub fn load(
        rom: Vec<u8>,
        saved_ram: Option<Vec<u8>>,
        config: SessionConfig,
    ) -> Result<Self, LoadError> {
        let cart = Cartridge::load(rom, saved_ram)?;

        let mut gb = GameBoy::new(config.model);
        if let Some(boot) = config.boot_rom {
            gb.set_boot_rom(boot);
        }
        gb.load_cartridge(cart);
        gb.bootstrap();

        let snapshot: SnapshotSlot = Arc::new(Mutex::new(None));
        let (cmd_tx, cmd_rx) = cb::unbounded();
        let (event_tx, event_rx) = cb::unbounded();

        let mut worker = Worker {
            gb,
            pacer: FramePacer::new(config.max_catch_up_frames),
            running: false,
            events: event_tx,
            snapshot: Arc::clone(&snapshot),
        };
        worker.publish();

        let handle = thread::Builder::new()
            .name("gbtick-session".to_string())
            .spawn(move || worker.run(cmd_rx))
            .unwrap_or_else(|e| panic!("failed to spawn session worker: {e}"));

        Ok(Self {
            commands: cmd_tx,
            events: event_rx,
            snapshot,
            worker: Some(handle),
        })
    }

    pub fn start(&self) {
        self.send(Command::Start);
    }

    /// Stop executing. Blocks until the batch in flight has finished.
    pub fn stop(&self) {
        let (ack, done) = cb::bounded(1);
        self.send(Command::Stop { ack });
        Self::wait(&done);
    }

    /// Pacing signal from the host's display refresh. The worker runs as many
    /// base cycles as wall time since the previous tick calls for.
    pub fn frame_tick(&self, now: Instant) {
        self.send(Command::FrameTick(now));
    }

    /// Validate a new cartridge here, then swap it in between batches and
    /// bootstrap it. Blocks until the swap is done.
    pub fn load_cartridge(
        &self,
        rom: Vec<u8>,
        saved_ram: Option<Vec<u8>>,
    ) -> Result<(), LoadError> {
        let cart = Cartridge::load(rom, saved_ram)?;
        let (ack, done) = cb::bounded(1);
        self.send(Command::LoadCartridge { cart, ack });
        Self::wait(&done);
        Ok(())
    }

    pub fn set_button(&self, button: Button, pressed: bool) {
        self.send(Command::SetButton(button, pressed));
    }

    /// Most recent snapshot the worker published.
    pub fn latest_snapshot(&self) -> Option<Arc<PresentationSnapshot>> {
        self.snapshot
            .lock()
            .expect("snapshot mutex poisoned")
            .clone()
    }

    pub fn poll_event(&self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    /// Event channel, for hosts that want to block or `select!` on it.
    pub fn events(&self) -> &cb::Receiver<SessionEvent> {
        &self.events
    }

    fn send(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            panic!("session worker thread vanished");
        }
    }

    fn wait(done: &cb::Receiver<()>) {
        if done.recv().is_err() {
            panic!("session worker thread vanished");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            log::error!("session worker panicked");
        }
    }
}

struct Worker {
    gb: GameBoy,
    pacer: FramePacer,
    running: bool,
    events: cb::Sender<SessionEvent>,
    snapshot: SnapshotSlot,
}

impl Worker {
    fn run(mut self, commands: cb::Receiver<Command>) {
        while let Ok(cmd) = commands.recv() {
            match cmd {
                Command::Start => {
                    if !self.running {
                        log::debug!("session started");
                        self.running = true;
                    }
                }
                Command::Stop { ack } => {
                    if self.running {
                        log::debug!("session stopped");
                    }
                    self.running = false;
                    self.pacer.reset();
                    let _ = ack.send(());
                }
                Command::FrameTick(now) => {
                    if self.running {
                        let budget = self.pacer.budget(now);
                        self.gb.run_for(budget);
                        self.publish();
                    }
                }
                Command::LoadCartridge { cart, ack } => {
                    self.gb.load_cartridge(cart);
                    self.gb.bootstrap();
                    self.pacer.reset();
                    self.publish();
                    let _ = ack.send(());
                }
                Command::SetButton(button, pressed) => self.gb.set_button(button, pressed),
                Command::Shutdown => break,
            }
        }
    }

    fn publish(&mut self) {
        if let Some(ram) = self.gb.take_ram_write() {
            let _ = self.events.send(SessionEvent::RamWritten(ram));
        }
        let serial = self.gb.take_serial_output();
        if !serial.is_empty() {
            let _ = self.events.send(SessionEvent::SerialBytes(serial));
        }

        let snap = Arc::new(PresentationSnapshot::capture(&self.gb));
        *self.snapshot.lock().expect("snapshot mutex poisoned") = Some(snap);
    }
}
