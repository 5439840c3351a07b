use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SAVE_DEBOUNCE_FRAMES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModelChoice {
    /// Pick from the cartridge header's CGB flag.
    #[default]
    Auto,
    Dmg,
    Cgb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub boot_rom: Option<PathBuf>,
    pub model: ModelChoice,
    /// Quiet frames to wait after the last external RAM write before the
    /// `.sav` file is rewritten.
    pub save_debounce_frames: u32,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boot_rom: None,
            model: ModelChoice::Auto,
            save_debounce_frames: DEFAULT_SAVE_DEBOUNCE_FRAMES,
            log_level: None,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("gbtick").join("gbtick.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("gbtick").join("gbtick.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("gbtick")
            .join("gbtick.toml");
    }

    PathBuf::from("gbtick.toml")
}

/// Read the config at `path`. A missing or unreadable file yields the
/// defaults; only malformed TOML is an error, which the caller reports once
/// logging is up.
pub fn load_from_file(path: &Path) -> Result<Config, toml::de::Error> {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Ok(Config::default()),
    };
    toml::from_str::<Config>(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = load_from_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.save_debounce_frames, DEFAULT_SAVE_DEBOUNCE_FRAMES);
    }

    #[test]
    fn parses_every_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gbtick.toml");
        fs::write(
            &path,
            "boot_rom = \"/roms/cgb_boot.bin\"\n\
             model = \"cgb\"\n\
             save_debounce_frames = 10\n\
             log_level = \"debug\"\n",
        )
        .unwrap();

        let cfg = load_from_file(&path).unwrap();
        assert_eq!(cfg.boot_rom, Some(PathBuf::from("/roms/cgb_boot.bin")));
        assert_eq!(cfg.model, ModelChoice::Cgb);
        assert_eq!(cfg.save_debounce_frames, 10);
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gbtick.toml");
        fs::write(&path, "model = \"dmg\"\n").unwrap();

        let cfg = load_from_file(&path).unwrap();
        assert_eq!(cfg.model, ModelChoice::Dmg);
        assert_eq!(cfg.boot_rom, None);
        assert_eq!(cfg.save_debounce_frames, DEFAULT_SAVE_DEBOUNCE_FRAMES);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gbtick.toml");
        fs::write(&path, "model = \"gba\"\n").unwrap();
        assert!(load_from_file(&path).is_err());

        fs::write(&path, "this is not toml").unwrap();
        assert!(load_from_file(&path).is_err());
    }
}
