use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::buffer::MAX_LINE_LEN;
use crate::config::Config;
use crate::error::{Error, Result};

pub const KEYSTROKE_SOUND: &str = "keystroke.mp3";
pub const CARRIAGE_RETURN_SOUND: &str = "carriage-return.mp3";
pub const BELL_SOUND: &str = "bell.mp3";

const FALLBACK_CLIP: Duration = Duration::from_secs(2);
const MIN_CARRIAGE_SHARE: f32 = 0.3;
pub const VOLUME_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    Keystroke,
    CarriageReturn,
    Bell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub kind: CueKind,
    pub path: PathBuf,
    pub volume: f32,
    pub rate: f32,
    /// Stop after this long; `None` plays the whole clip.
    pub play_for: Option<Duration>,
}

pub trait CueSink {
    fn play(&mut self, cue: &Cue) -> Result<()>;
}

pub struct TerminalSink;

impl CueSink for TerminalSink {
    fn play(&mut self, cue: &Cue) -> Result<()> {
        if cue.kind == CueKind::Bell {
            let mut out = io::stdout();
            out.write_all(b"\x07")
                .and_then(|_| out.flush())
                .map_err(|err| Error::Audio(err.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(feature = "sound")]
pub use output::{RodioSink, clip_duration};

#[cfg(not(feature = "sound"))]
pub fn clip_duration(_path: &Path) -> Option<Duration> {
    None
}

#[cfg(feature = "sound")]
mod output {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;
    use std::time::Duration;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::debug;

    use super::{Cue, CueKind, CueSink, TerminalSink};
    use crate::error::{Error, Result};

    /// Without an output device only the bell is heard, on the terminal.
    pub struct RodioSink {
        output: Option<(OutputStream, OutputStreamHandle)>,
    }

    impl RodioSink {
        pub fn open() -> Self {
            let output = match OutputStream::try_default() {
                Ok(output) => Some(output),
                Err(err) => {
                    debug!(target: "typewriter.audio", %err, "audio_output_unavailable");
                    None
                }
            };
            RodioSink { output }
        }
    }

    impl CueSink for RodioSink {
        fn play(&mut self, cue: &Cue) -> Result<()> {
            let Some((_, handle)) = self.output.as_ref() else {
                return TerminalSink.play(cue);
            };
            match start(handle, cue) {
                Err(err) if cue.kind == CueKind::Bell => {
                    debug!(target: "typewriter.audio", %err, "bell_fallback");
                    TerminalSink.play(cue)
                }
                other => other,
            }
        }
    }

    fn start(handle: &OutputStreamHandle, cue: &Cue) -> Result<()> {
        let file = File::open(&cue.path)?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|err| Error::Audio(err.to_string()))?;
        let sink = Sink::try_new(handle).map_err(|err| Error::Audio(err.to_string()))?;
        sink.set_volume(cue.volume);
        sink.set_speed(cue.rate);
        match cue.play_for {
            Some(limit) => sink.append(source.take_duration(limit)),
            None => sink.append(source),
        }
        sink.detach();
        Ok(())
    }

    pub fn clip_duration(path: &Path) -> Option<Duration> {
        let file = File::open(path).ok()?;
        Decoder::new(BufReader::new(file)).ok()?.total_duration()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    pub path: PathBuf,
    pub duration: Option<Duration>,
}

impl Sound {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let duration = clip_duration(&path);
        Sound { path, duration }
    }
}

pub fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp3" | "mpga" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        _ => return None,
    };
    Some(mime)
}

#[derive(Debug, Clone)]
pub struct SoundBank {
    sounds: Vec<Sound>,
    selected: usize,
}

impl SoundBank {
    pub fn new(default: Sound) -> Self {
        SoundBank {
            sounds: vec![default],
            selected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn selected(&self) -> &Sound {
        &self.sounds[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn register(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        match mime_type(&path) {
            Some(mime) => {
                debug!(target: "typewriter.audio", path = %path.display(), mime, "sound_registered");
                self.sounds.push(Sound::load(path));
                true
            }
            None => {
                debug!(target: "typewriter.audio", path = %path.display(), "sound_rejected");
                false
            }
        }
    }

    /// Selects `index`, keeping the current sound when it is out of range.
    pub fn select(&mut self, index: usize) {
        if index < self.sounds.len() {
            self.selected = index;
        }
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.sounds.len();
    }
}

pub struct CuePlayer {
    sink: Box<dyn CueSink>,
    rng: StdRng,
    volume: f32,
    pub keystrokes: SoundBank,
    pub carriage_returns: SoundBank,
    bell: Sound,
}

impl CuePlayer {
    pub fn new(sink: Box<dyn CueSink>, volume: f32, sound_dir: &Path) -> Self {
        Self::with_rng(sink, volume, sound_dir, StdRng::from_os_rng())
    }

    pub fn with_rng(sink: Box<dyn CueSink>, volume: f32, sound_dir: &Path, rng: StdRng) -> Self {
        CuePlayer {
            sink,
            rng,
            volume: volume.clamp(0.0, 1.0),
            keystrokes: SoundBank::new(Sound::load(sound_dir.join(KEYSTROKE_SOUND))),
            carriage_returns: SoundBank::new(Sound::load(sound_dir.join(CARRIAGE_RETURN_SOUND))),
            bell: Sound::load(sound_dir.join(BELL_SOUND)),
        }
    }

    pub fn add_sounds(&mut self, config: &Config) {
        for path in &config.sounds {
            if !self.keystrokes.register(path) {
                warn!(target: "typewriter.audio", path = %path.display(), "keystroke_sound_ignored");
            }
        }
        for path in &config.carriage_sounds {
            if !self.carriage_returns.register(path) {
                warn!(target: "typewriter.audio", path = %path.display(), "carriage_sound_ignored");
            }
        }
        self.keystrokes.select(config.keystroke_sound);
        self.carriage_returns.select(config.carriage_sound);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = ((volume * 10.0).round() / 10.0).clamp(0.0, 1.0);
    }

    pub fn keystroke(&mut self) {
        let rate = self.rng.random_range(0.85..=1.15);
        let jitter: f32 = self.rng.random_range(0.9..=1.1);
        let cue = Cue {
            kind: CueKind::Keystroke,
            path: self.keystrokes.selected().path.clone(),
            volume: (self.volume * jitter).min(1.0),
            rate,
            play_for: None,
        };
        self.play(cue);
    }

    /// Carriage return, trimmed in proportion to the characters on the line.
    pub fn carriage_return(&mut self, line_len: usize) {
        let sound = self.carriage_returns.selected();
        let cue = Cue {
            kind: CueKind::CarriageReturn,
            path: sound.path.clone(),
            volume: self.volume,
            rate: 1.0,
            play_for: Some(carriage_play_time(line_len, sound.duration)),
        };
        self.play(cue);
    }

    pub fn bell(&mut self) {
        let cue = Cue {
            kind: CueKind::Bell,
            path: self.bell.path.clone(),
            volume: self.volume,
            rate: 1.0,
            play_for: None,
        };
        self.play(cue);
    }

    fn play(&mut self, cue: Cue) {
        if let Err(err) = self.sink.play(&cue) {
            debug!(target: "typewriter.audio", kind = ?cue.kind, %err, "cue_dropped");
        }
    }
}

pub fn carriage_play_time(line_len: usize, clip: Option<Duration>) -> Duration {
    let share = (line_len as f32 / MAX_LINE_LEN as f32).min(1.0);
    clip.unwrap_or(FALLBACK_CLIP)
        .mul_f32(share.max(MIN_CARRIAGE_SHARE))
}
