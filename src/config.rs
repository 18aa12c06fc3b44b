use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::theme::Theme;

const APP_NAME: &str = "clatter";
const CONFIG_FILENAME: &str = "config.toml";
const SOUND_DIRNAME: &str = "sounds";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Minimum time between keystrokes before the machine jams. Zero disables.
    pub typing_speed_ms: u64,
    pub volume: f32,
    /// Feed the paper up on each carriage return instead of scrolling the view.
    pub typewriter_mode: bool,
    /// 0.0 is a dark room, 1.0 normal lighting.
    pub lighting: f32,
    pub theme: Theme,
    pub font: String,
    pub data_dir: Option<PathBuf>,
    /// Where the built-in clips live. Defaults to `sounds/` in the data dir.
    pub sound_dir: Option<PathBuf>,
    pub sounds: Vec<PathBuf>,
    pub carriage_sounds: Vec<PathBuf>,
    /// Index into the keystroke sounds, 0 being the built-in clip.
    pub keystroke_sound: usize,
    pub carriage_sound: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            typing_speed_ms: 50,
            volume: 0.3,
            typewriter_mode: true,
            lighting: 1.0,
            theme: Theme::Forest,
            font: "Special Elite".to_string(),
            data_dir: None,
            sound_dir: None,
            sounds: Vec::new(),
            carriage_sounds: Vec::new(),
            keystroke_sound: 0,
            carriage_sound: 0,
        }
    }
}

impl Config {
    /// Loads `path`, or the per-user config file when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return Ok(Config::default()),
        };

        match fs::read_to_string(&path) {
            Ok(text) => Config::parse(&text, &path),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn parse(text: &str, path: &Path) -> Result<Config> {
        let mut config: Config = toml::from_str(text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.volume = config.volume.clamp(0.0, 1.0);
        config.lighting = config.lighting.clamp(0.0, 1.0);
        Ok(config)
    }

    pub fn typing_speed(&self) -> Duration {
        Duration::from_millis(self.typing_speed_ms)
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_NAME)))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_NAME))
    }

    pub fn resolved_sound_dir(&self) -> PathBuf {
        self.sound_dir
            .clone()
            .unwrap_or_else(|| self.resolved_data_dir().join(SOUND_DIRNAME))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join(CONFIG_FILENAME))
}
