//! Battery-backed RAM persistence next to the ROM file.

use anyhow::Context;
use log::{info, warn};
use std::path::{Path, PathBuf};

pub fn sav_path(rom: &Path) -> PathBuf {
    rom.with_extension("sav")
}

/// Load a save blob if one exists and matches the cartridge's RAM size.
/// A wrong-sized file is ignored rather than handed to the core.
pub fn read_save(path: &Path, expected_len: usize) -> Option<Vec<u8>> {
    if expected_len == 0 {
        return None;
    }
    let data = std::fs::read(path).ok()?;
    if data.len() != expected_len {
        warn!(
            "Ignoring {}: {} bytes, cartridge has {expected_len}",
            path.display(),
            data.len()
        );
        return None;
    }
    info!("Loaded save {}", path.display());
    Some(data)
}

/// Write through a sibling temp file so a crash never leaves a torn save.
pub fn write_save(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let tmp = path.with_extension("sav.tmp");
    std::fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    log::debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

/// Holds the newest RAM image until the game has left RAM alone for
/// `quiet_frames` frames.
pub struct SaveDebouncer {
    quiet_frames: u32,
    pending: Option<Vec<u8>>,
    idle: u32,
}

impl SaveDebouncer {
    pub fn new(quiet_frames: u32) -> Self {
        Self {
            quiet_frames,
            pending: None,
            idle: 0,
        }
    }

    pub fn record(&mut self, ram: Vec<u8>) {
        self.pending = Some(ram);
        self.idle = 0;
    }

    /// Advance by one frame; returns the image once it is due.
    pub fn frame(&mut self) -> Option<Vec<u8>> {
        self.pending.as_ref()?;
        self.idle += 1;
        if self.idle >= self.quiet_frames {
            self.idle = 0;
            return self.pending.take();
        }
        None
    }

    pub fn flush(&mut self) -> Option<Vec<u8>> {
        self.idle = 0;
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_sits_next_to_rom() {
        assert_eq!(
            sav_path(Path::new("/games/tetris.gb")),
            PathBuf::from("/games/tetris.sav")
        );
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.sav");
        let ram: Vec<u8> = (0..0x2000u32).map(|i| i as u8).collect();

        write_save(&path, &ram).unwrap();
        assert_eq!(read_save(&path, ram.len()), Some(ram));
        assert!(!path.with_extension("sav.tmp").exists());
    }

    #[test]
    fn wrong_size_or_missing_save_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.sav");
        assert_eq!(read_save(&path, 0x2000), None);

        std::fs::write(&path, [0u8; 0x800]).unwrap();
        assert_eq!(read_save(&path, 0x2000), None);
        assert_eq!(read_save(&path, 0), None);
    }

    #[test]
    fn debouncer_waits_for_quiet_frames() {
        let mut d = SaveDebouncer::new(3);
        assert_eq!(d.frame(), None);

        d.record(vec![1]);
        assert_eq!(d.frame(), None);
        d.record(vec![2]);
        assert_eq!(d.frame(), None);
        assert_eq!(d.frame(), None);
        assert_eq!(d.frame(), Some(vec![2]));
        assert_eq!(d.frame(), None);
    }

    #[test]
    fn flush_returns_pending_image() {
        let mut d = SaveDebouncer::new(100);
        assert_eq!(d.flush(), None);
        d.record(vec![7; 4]);
        assert_eq!(d.flush(), Some(vec![7; 4]));
        assert_eq!(d.flush(), None);
    }
}
