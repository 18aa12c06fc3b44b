use std::time::Instant;

use tracing::{debug, info, warn};

use crate::audio::{CuePlayer, VOLUME_STEP};
use crate::buffer::{Buffer, MAX_LINE_LEN};
use crate::clipboard::{Clipboard, Notice};
use crate::config::Config;
use crate::cursor::Cursor;
use crate::key::{Command, Key};
use crate::onboarding::{Onboarding, Step};
use crate::storage::Persistence;
use crate::theme::{FONTS, Theme};
use crate::throttle::{Throttle, Verdict};

/// Vertical distance the paper feeds per carriage return, in pixels.
pub const LINE_HEIGHT: u32 = 28;
pub const LIGHTING_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Typed,
    CarriageReturn,
    Bell,
    /// Struck too soon after the previous key; the machine is now jammed.
    Jammed,
    Ignored,
    Moved,
    Copied,
    ClearRequested,
    Cleared,
    ClearCancelled,
    Changed,
    Onboarding,
    Quit,
}

pub struct Peripherals {
    pub audio: CuePlayer,
    pub clipboard: Box<dyn Clipboard>,
    pub persistence: Persistence,
}

pub struct Typewriter {
    buffer: Buffer,
    cursor: Cursor,
    throttle: Throttle,
    /// Lines already on the paper when it was mounted.
    restored_feed: u32,
    paper_offset: u32,
    typewriter_mode: bool,
    fullscreen: bool,
    theme: Theme,
    lighting: f32,
    font: &'static str,
    audio: CuePlayer,
    clipboard: Box<dyn Clipboard>,
    persistence: Persistence,
    onboarding: Option<Onboarding>,
    confirm_clear: bool,
    notice: Option<Notice>,
}

impl Typewriter {
    pub fn mount(config: &Config, peripherals: Peripherals, now: Instant) -> Self {
        let Peripherals {
            audio,
            clipboard,
            persistence,
        } = peripherals;

        let buffer = match persistence.load_content() {
            Some(text) => {
                let (buffer, broken) = Buffer::restore(&text);
                if broken > 0 {
                    warn!(
                        target: "typewriter.storage",
                        lines = broken,
                        max = MAX_LINE_LEN,
                        "restored_lines_broken"
                    );
                }
                buffer
            }
            None => Buffer::new(),
        };
        let mut cursor = Cursor::new(now);
        cursor.index = buffer.len();
        let restored_feed = buffer.line_count().saturating_sub(1) as u32;

        let onboarding = (!persistence.onboarding_seen()).then(Onboarding::new);
        let font = FONTS
            .into_iter()
            .find(|f| *f == config.font)
            .unwrap_or(FONTS[0]);

        info!(
            target: "typewriter.session",
            restored = !buffer.is_empty(),
            restored_chars = buffer.len(),
            onboarding = onboarding.is_some(),
            "typewriter_session_started"
        );

        Typewriter {
            buffer,
            cursor,
            throttle: Throttle::new(config.typing_speed()),
            restored_feed,
            paper_offset: 0,
            typewriter_mode: config.typewriter_mode,
            fullscreen: false,
            theme: config.theme,
            lighting: config.lighting.clamp(0.0, 1.0),
            font,
            audio,
            clipboard,
            persistence,
            onboarding,
            confirm_clear: false,
            notice: None,
        }
    }

    pub fn handle_key(&mut self, key: Key, now: Instant) -> Outcome {
        if self.onboarding.is_some() {
            return self.handle_onboarding_key(key);
        }

        if self.confirm_clear {
            self.confirm_clear = false;
            return match key {
                Key::Char('y') | Key::Char('Y') => {
                    self.clear();
                    Outcome::Cleared
                }
                _ => Outcome::ClearCancelled,
            };
        }

        match key {
            // Typewriters can't erase.
            Key::Backspace | Key::Delete => Outcome::Ignored,
            Key::Escape if self.fullscreen => {
                self.toggle_fullscreen();
                Outcome::Changed
            }
            Key::Left => {
                self.cursor.move_left();
                Outcome::Moved
            }
            Key::Right => {
                self.cursor.move_right(&self.buffer);
                Outcome::Moved
            }
            Key::Up => {
                self.cursor.move_up(&self.buffer);
                Outcome::Moved
            }
            Key::Down => {
                self.cursor.move_down(&self.buffer);
                Outcome::Moved
            }
            Key::Char(c) if !c.is_control() => self.strike(c, now),
            Key::Enter => self.strike('\n', now),
            Key::Command(command) => self.run_command(command, now),
            _ => Outcome::Ignored,
        }
    }

    fn strike(&mut self, ch: char, now: Instant) -> Outcome {
        if self.throttle.is_paused(now) {
            return Outcome::Ignored;
        }

        let line_len = self.buffer.line_len_at(self.cursor.index);
        if ch != '\n' && line_len >= MAX_LINE_LEN {
            self.audio.bell();
            debug!(
                target: "typewriter.input",
                line_length = line_len,
                character_attempted = %ch,
                "line_limit_reached"
            );
            return Outcome::Bell;
        }

        if let Verdict::Jam { elapsed } = self.throttle.check(now) {
            debug!(
                target: "typewriter.input",
                typing_speed_limit_ms = self.throttle.min_interval().as_millis() as u64,
                time_diff_ms = elapsed.as_millis() as u64,
                "typing_too_fast_paused"
            );
            return Outcome::Jammed;
        }

        let outcome = if ch == '\n' {
            self.audio.carriage_return(line_len);
            if self.typewriter_mode {
                self.paper_offset += LINE_HEIGHT;
            }
            debug!(target: "typewriter.input", line_length = line_len, "carriage_return_used");
            Outcome::CarriageReturn
        } else {
            self.audio.keystroke();
            Outcome::Typed
        };

        self.buffer.strike(self.cursor.index, ch);
        self.cursor.advance(&self.buffer);
        self.cursor.wake(now);

        let text = self.buffer.text();
        self.persistence.save_content(&text);
        if self.buffer.len() % 50 == 0 {
            debug!(
                target: "typewriter.input",
                character_count = self.buffer.len(),
                line_count = self.buffer.line_count(),
                "typing_milestone"
            );
        }

        outcome
    }

    fn run_command(&mut self, command: Command, now: Instant) -> Outcome {
        match command {
            Command::Copy => {
                self.copy_all(now);
                Outcome::Copied
            }
            Command::Clear => {
                self.confirm_clear = true;
                Outcome::ClearRequested
            }
            Command::Fullscreen => {
                self.toggle_fullscreen();
                Outcome::Changed
            }
            Command::TypewriterMode => {
                self.typewriter_mode = !self.typewriter_mode;
                debug!(target: "typewriter.settings", typewriter_mode = self.typewriter_mode, "typewriter_mode_toggled");
                Outcome::Changed
            }
            Command::Theme => {
                self.theme = self.theme.next();
                debug!(target: "typewriter.settings", theme = self.theme.name(), "background_changed");
                Outcome::Changed
            }
            Command::LightingUp => {
                self.set_lighting(self.lighting + LIGHTING_STEP);
                Outcome::Changed
            }
            Command::LightingDown => {
                self.set_lighting(self.lighting - LIGHTING_STEP);
                Outcome::Changed
            }
            Command::VolumeUp => {
                self.audio.set_volume(self.audio.volume() + VOLUME_STEP);
                Outcome::Changed
            }
            Command::VolumeDown => {
                self.audio.set_volume(self.audio.volume() - VOLUME_STEP);
                Outcome::Changed
            }
            Command::NextSound => {
                self.audio.keystrokes.select_next();
                debug!(
                    target: "typewriter.settings",
                    sound = self.audio.keystrokes.selected_index(),
                    "keystroke_sound_changed"
                );
                Outcome::Changed
            }
            Command::Quit => Outcome::Quit,
        }
    }

    fn handle_onboarding_key(&mut self, key: Key) -> Outcome {
        let Some(onboarding) = self.onboarding.as_mut() else {
            return Outcome::Ignored;
        };
        match key {
            Key::Enter | Key::Right | Key::Char(' ') => match onboarding.next() {
                Step::Advanced => Outcome::Onboarding,
                Step::Finished => {
                    self.close_onboarding("onboarding_completed");
                    Outcome::Changed
                }
            },
            Key::Escape => {
                self.close_onboarding("onboarding_skipped");
                Outcome::Changed
            }
            Key::Command(Command::Quit) => Outcome::Quit,
            _ => Outcome::Ignored,
        }
    }

    fn close_onboarding(&mut self, event: &'static str) {
        self.onboarding = None;
        self.persistence.mark_onboarding_seen();
        debug!(target: "typewriter.session", event, "onboarding_closed");
    }

    pub fn copy_all(&mut self, now: Instant) {
        let text = self.buffer.text();
        debug!(
            target: "typewriter.clipboard",
            character_count = self.buffer.len(),
            line_count = self.buffer.line_count(),
            "text_copied"
        );
        match self.clipboard.copy(&text) {
            Ok(method) => {
                debug!(target: "typewriter.clipboard", ?method, "copy_done");
                self.notice = Some(Notice::copied(now));
            }
            Err(err) => warn!(target: "typewriter.clipboard", %err, "copy_failed"),
        }
    }

    fn clear(&mut self) {
        debug!(
            target: "typewriter.input",
            character_count_cleared = self.buffer.len(),
            "content_cleared"
        );
        self.buffer.clear();
        self.cursor.index = 0;
        self.restored_feed = 0;
        self.paper_offset = 0;
        self.persistence.clear_content();
    }

    fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        debug!(target: "typewriter.settings", is_fullscreen = self.fullscreen, "fullscreen_toggled");
    }

    fn set_lighting(&mut self, lighting: f32) {
        self.lighting = ((lighting * 10.0).round() / 10.0).clamp(0.0, 1.0);
    }

    pub fn tick(&mut self, now: Instant) {
        self.cursor.blink(now);
        if self.notice.as_ref().is_some_and(|n| !n.is_live(now)) {
            self.notice = None;
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn paper_offset(&self) -> u32 {
        self.paper_offset
    }

    /// Lines the paper has moved up since mount, counting a restored page.
    pub fn lines_fed(&self) -> u32 {
        self.restored_feed + self.paper_offset / LINE_HEIGHT
    }

    pub fn is_paused(&self, now: Instant) -> bool {
        self.throttle.is_paused(now)
    }

    pub fn typewriter_mode(&self) -> bool {
        self.typewriter_mode
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn lighting(&self) -> f32 {
        self.lighting
    }

    pub fn font_name(&self) -> &'static str {
        self.font
    }

    pub fn volume(&self) -> f32 {
        self.audio.volume()
    }

    /// Selected keystroke sound and how many there are.
    pub fn keystroke_sound(&self) -> (usize, usize) {
        (
            self.audio.keystrokes.selected_index(),
            self.audio.keystrokes.len(),
        )
    }

    pub fn onboarding(&self) -> Option<&Onboarding> {
        self.onboarding.as_ref()
    }

    pub fn confirming_clear(&self) -> bool {
        self.confirm_clear
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.notice.as_ref().map(|n| n.message)
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }
}
