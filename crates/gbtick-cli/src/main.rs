mod config;
mod save;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel as cb;
use gbtick_core::cartridge::Header;
use gbtick_core::clock::{BASE_CYCLES_PER_FRAME, BASE_CYCLES_PER_SECOND};
use gbtick_core::{Model, Session, SessionConfig, SessionEvent};
use log::{error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use config::ModelChoice;
use save::SaveDebouncer;

#[derive(Parser)]
#[command(name = "gbtick", version, about = "Headless Game Boy / Game Boy Color runner")]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// Force DMG mode
    #[arg(long, conflicts_with = "cgb")]
    dmg: bool,

    /// Force CGB mode
    #[arg(long, conflicts_with = "dmg")]
    cgb: bool,

    /// Path to boot ROM file
    #[arg(long)]
    boot_rom: Option<PathBuf>,

    /// Config file (defaults to the per-user gbtick.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `gbtick_core=trace`
    #[arg(long)]
    log_level: Option<String>,

    /// Stop after this many frame ticks
    #[arg(long)]
    frames: Option<u64>,

    /// Quiet frames before external RAM is written to the .sav file
    #[arg(long)]
    save_debounce_frames: Option<u32>,
}

impl Args {
    fn model_choice(&self, configured: ModelChoice) -> ModelChoice {
        if self.dmg {
            ModelChoice::Dmg
        } else if self.cgb {
            ModelChoice::Cgb
        } else {
            configured
        }
    }
}

fn resolve_model(choice: ModelChoice, header: &Header) -> Model {
    match choice {
        ModelChoice::Dmg => Model::Dmg(Default::default()),
        ModelChoice::Cgb => Model::Cgb,
        ModelChoice::Auto if header.cgb_supported() => Model::Cgb,
        ModelChoice::Auto => Model::Dmg(Default::default()),
    }
}

fn frame_period() -> Duration {
    Duration::from_secs_f64(BASE_CYCLES_PER_FRAME as f64 / BASE_CYCLES_PER_SECOND as f64)
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Where events from the worker end up.
struct Host {
    sav: Option<PathBuf>,
    debouncer: SaveDebouncer,
}

impl Host {
    fn handle(&mut self, event: SessionEvent) -> anyhow::Result<()> {
        match event {
            SessionEvent::SerialBytes(bytes) => {
                let mut out = std::io::stdout().lock();
                out.write_all(&bytes)?;
                out.flush()?;
            }
            SessionEvent::RamWritten(ram) => {
                if self.sav.is_some() {
                    self.debouncer.record(ram);
                }
            }
        }
        Ok(())
    }

    fn frame(&mut self) {
        if let Some(ram) = self.debouncer.frame() {
            self.persist(&ram);
        }
    }

    fn finish(&mut self) {
        if let Some(ram) = self.debouncer.flush() {
            self.persist(&ram);
        }
    }

    fn persist(&self, ram: &[u8]) {
        if let Some(path) = &self.sav
            && let Err(e) = save::write_save(path, ram)
        {
            error!("Failed to write save: {e:#}");
        }
    }
}

fn run(args: Args, cfg: config::Config) -> anyhow::Result<()> {
    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("reading ROM {}", args.rom.display()))?;
    let header = Header::parse(&rom).with_context(|| format!("parsing {}", args.rom.display()))?;
    let model = resolve_model(args.model_choice(cfg.model), &header);

    let boot_rom = match args.boot_rom.as_ref().or(cfg.boot_rom.as_ref()) {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("reading boot ROM {}", path.display()))?,
        ),
        None => None,
    };

    let sav = header.has_battery().then(|| save::sav_path(&args.rom));
    let saved_ram = sav
        .as_deref()
        .and_then(|path| save::read_save(path, header.ram_size));

    info!(
        "Starting \"{}\" as {}",
        header.title,
        if model.is_cgb() { "CGB" } else { "DMG" }
    );

    let session = Session::load(
        rom,
        saved_ram,
        SessionConfig {
            model,
            boot_rom,
            ..SessionConfig::default()
        },
    )
    .with_context(|| format!("loading {}", args.rom.display()))?;

    let mut host = Host {
        sav,
        debouncer: SaveDebouncer::new(
            args.save_debounce_frames
                .unwrap_or(cfg.save_debounce_frames),
        ),
    };

    run_session(&session, &mut host, args.frames)?;

    session.stop();
    while let Some(event) = session.poll_event() {
        host.handle(event)?;
    }
    host.finish();

    if let Some(snap) = session.latest_snapshot() {
        info!(
            "Stopped after {} frames ({} CPU cycles)",
            snap.frame_counter, snap.cpu.cycles
        );
    }
    Ok(())
}

fn run_session(session: &Session, host: &mut Host, limit: Option<u64>) -> anyhow::Result<()> {
    let ticker = cb::tick(frame_period());
    let mut ticks = 0u64;
    session.start();

    loop {
        let done = cb::select! {
            recv(ticker) -> now => {
                let now = now.context("frame ticker closed")?;
                session.frame_tick(now);
                host.frame();
                ticks += 1;
                limit.is_some_and(|limit| ticks >= limit)
            }
            recv(session.events()) -> event => match event {
                Ok(event) => {
                    host.handle(event)?;
                    false
                }
                Err(_) => {
                    warn!("Session event channel closed");
                    true
                }
            },
        };
        if done {
            return Ok(());
        }
    }
}

fn main() {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let loaded = config::load_from_file(&config_path);
    let cfg = loaded.as_ref().cloned().unwrap_or_default();

    let level = args
        .log_level
        .clone()
        .or_else(|| cfg.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level);

    if let Err(e) = &loaded {
        warn!(
            "Failed to parse config {}: {e}; using defaults",
            config_path.display()
        );
    }

    if let Err(e) = run(args, cfg) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cgb_flag: u8) -> Header {
        let mut rom = vec![0u8; 0x150];
        rom[0x143] = cgb_flag;
        Header::parse(&rom).unwrap()
    }

    #[test]
    fn auto_model_follows_cgb_flag() {
        assert_eq!(resolve_model(ModelChoice::Auto, &header(0x00)), Model::default());
        assert_eq!(resolve_model(ModelChoice::Auto, &header(0x80)), Model::Cgb);
        assert_eq!(resolve_model(ModelChoice::Auto, &header(0xC0)), Model::Cgb);
    }

    #[test]
    fn forced_model_ignores_header() {
        assert_eq!(resolve_model(ModelChoice::Dmg, &header(0xC0)), Model::default());
        assert_eq!(resolve_model(ModelChoice::Cgb, &header(0x00)), Model::Cgb);
    }

    #[test]
    fn flags_override_configured_model() {
        let args = Args::try_parse_from(["gbtick", "game.gb", "--dmg"]).unwrap();
        assert_eq!(args.model_choice(ModelChoice::Cgb), ModelChoice::Dmg);

        let args = Args::try_parse_from(["gbtick", "game.gb"]).unwrap();
        assert_eq!(args.model_choice(ModelChoice::Cgb), ModelChoice::Cgb);
    }

    #[test]
    fn dmg_and_cgb_conflict() {
        assert!(Args::try_parse_from(["gbtick", "game.gb", "--dmg", "--cgb"]).is_err());
    }

    #[test]
    fn frame_period_matches_refresh_rate() {
        let hz = 1.0 / frame_period().as_secs_f64();
        assert!((hz - 59.7275).abs() < 0.001, "{hz}");
    }
}
