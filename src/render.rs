use std::io::Write;
use std::time::Instant;

use crossterm::{
    cursor::{Hide, MoveTo},
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use crate::buffer::MAX_LINE_LEN;
use crate::error::Result;
use crate::onboarding::{Onboarding, SLIDES};
use crate::theme::{Background, Rgb, paper_color};
use crate::typewriter::{LINE_HEIGHT, Typewriter};

pub const CHAR_WIDTH: f32 = 15.0;
pub const PAPER_PADDING: f32 = 48.0;
pub const CURSOR_GLYPH: char = '_';

/// Paper width in terminal cells: a full line plus a margin each side.
pub const PAPER_COLS: u16 = MAX_LINE_LEN as u16 + 4;
const MARGIN_COLS: u16 = 2;

const INK: Rgb = Rgb(34, 30, 28);
const FADED_INK: Rgb = Rgb(150, 146, 140);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSpot {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub cols: u16,
    pub rows: u16,
    pub paper_left: u16,
    pub text_left: u16,
    /// Rows available to the paper.
    pub text_rows: u16,
    /// Screen row of the first line of the page; negative once fed past the top.
    pub first_line_row: i32,
    pub status_row: Option<u16>,
}

impl Layout {
    pub fn compute(tw: &Typewriter, cols: u16, rows: u16) -> Self {
        let status_row = (!tw.fullscreen() && rows > 1).then(|| rows - 1);
        let text_rows = if status_row.is_some() { rows - 1 } else { rows };
        let paper_left = cols.saturating_sub(PAPER_COLS) / 2;

        let first_line_row = if tw.typewriter_mode() {
            i32::from(text_rows / 2) - tw.lines_fed() as i32
        } else {
            let cursor_line = tw.buffer().line_index_at(tw.cursor().index) as i32;
            let last_visible = i32::from(text_rows) - 2;
            1 - (cursor_line - last_visible).max(0)
        };

        Layout {
            cols,
            rows,
            paper_left,
            text_left: paper_left + MARGIN_COLS,
            text_rows,
            first_line_row,
            status_row,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub typed: String,
    pub untyped: String,
    pub cursor_glyph: Option<char>,
    /// Vertical paper shift in pixels; negative moves the paper up.
    pub paper_translate: i64,
    pub background: Background,
    pub spot: CursorSpot,
    pub paused: bool,
}

impl View {
    pub fn derive(tw: &Typewriter, layout: &Layout, now: Instant) -> Self {
        let chars = tw.buffer().chars();
        let cursor = tw.cursor().index.min(chars.len());

        View {
            typed: chars[..cursor].iter().collect(),
            untyped: chars[cursor..].iter().collect(),
            cursor_glyph: tw.cursor().visible.then_some(CURSOR_GLYPH),
            paper_translate: -i64::from(tw.paper_offset()),
            background: Background::for_theme(tw.theme(), tw.lighting()),
            spot: cursor_spot(tw, layout),
            paused: tw.is_paused(now),
        }
    }
}

pub fn cursor_spot(tw: &Typewriter, layout: &Layout) -> CursorSpot {
    let buffer = tw.buffer();
    let index = tw.cursor().index;
    let line = buffer.line_index_at(index) as f32;
    let column = tw.cursor().column(buffer) as f32;

    let window_w = f32::from(layout.cols.max(1)) * CHAR_WIDTH;
    let window_h = f32::from(layout.rows.max(1)) * LINE_HEIGHT as f32;
    let area_left = f32::from(layout.text_left) * CHAR_WIDTH - PAPER_PADDING;
    let area_top = layout.first_line_row as f32 * LINE_HEIGHT as f32 - PAPER_PADDING;

    let x = (area_left + PAPER_PADDING + column * CHAR_WIDTH) / window_w * 100.0;
    let y = (area_top + PAPER_PADDING + line * LINE_HEIGHT as f32) / window_h * 100.0;
    CursorSpot {
        x: x.clamp(10.0, 90.0),
        y: y.clamp(10.0, 90.0),
    }
}

pub fn vignette(row_pct: f32, spot: CursorSpot, lighting: f32) -> f32 {
    let distance = ((row_pct - spot.y).abs() / 50.0).min(1.0);
    1.0 - (1.0 - lighting.clamp(0.0, 1.0)) * 0.6 * distance
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.0,
        g: rgb.1,
        b: rgb.2,
    }
}

fn shade(rgb: Rgb, factor: f32) -> Rgb {
    let f = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    Rgb(f(rgb.0), f(rgb.1), f(rgb.2))
}

pub fn draw<W: Write>(out: &mut W, tw: &Typewriter, cols: u16, rows: u16, now: Instant) -> Result<()> {
    let layout = Layout::compute(tw, cols, rows);
    let view = View::derive(tw, &layout, now);

    queue!(out, Clear(ClearType::All))?;
    draw_room(out, &layout, &view, tw.lighting())?;
    draw_paper(out, &layout, tw.lighting())?;
    draw_text(out, &layout, &view)?;

    if let Some(onboarding) = tw.onboarding() {
        draw_onboarding(out, &layout, onboarding)?;
    } else if tw.confirming_clear() {
        draw_dialog(out, &layout, &["Clear the page?", "", "This cannot be undone.", "", "y: clear   any other key: keep"])?;
    }

    if let Some(row) = layout.status_row {
        draw_status(out, tw, &view, row, cols)?;
    }

    queue!(out, Hide)?;
    out.flush()?;
    Ok(())
}

/// Room colour of the cell at `(col, row)`: gradient, corner glow, then vignette.
pub fn room_color(layout: &Layout, view: &View, lighting: f32, col: u16, row: u16) -> Rgb {
    let y = f32::from(row) / f32::from(layout.rows.max(1));
    let x = f32::from(col) / f32::from(layout.cols.max(1));
    let base = view.background.sample(y).lightened(view.background.glow_at(x, y));
    shade(base, vignette(y * 100.0, view.spot, lighting))
}

fn draw_room<W: Write>(out: &mut W, layout: &Layout, view: &View, lighting: f32) -> Result<()> {
    let blank = " ".repeat(usize::from(layout.cols));
    for row in 0..layout.rows {
        queue!(out, MoveTo(0, row))?;
        if view.background.glow.is_none() {
            let rgb = room_color(layout, view, lighting, 0, row);
            queue!(out, SetBackgroundColor(color(rgb)), Print(&blank))?;
            continue;
        }
        let mut last = None;
        for col in 0..layout.cols {
            let rgb = room_color(layout, view, lighting, col, row);
            if last != Some(rgb) {
                queue!(out, SetBackgroundColor(color(rgb)))?;
                last = Some(rgb);
            }
            queue!(out, Print(' '))?;
        }
    }
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_paper<W: Write>(out: &mut W, layout: &Layout, lighting: f32) -> Result<()> {
    let top = (layout.first_line_row - 1).max(0) as u16;
    let width = PAPER_COLS.min(layout.cols);
    let sheet = " ".repeat(usize::from(width));
    let paper = color(paper_color(lighting));
    for row in top..layout.text_rows {
        queue!(out, MoveTo(layout.paper_left, row), SetBackgroundColor(paper), Print(&sheet))?;
    }
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_text<W: Write>(out: &mut W, layout: &Layout, view: &View) -> Result<()> {
    // Screen cell for text column `col` on page row `row`, if it is on screen.
    let cell = |col: usize, row: i32| {
        let x = usize::from(layout.text_left) + col;
        let on_screen = row >= 0 && row < i32::from(layout.text_rows) && x < usize::from(layout.cols);
        on_screen.then(|| (x as u16, row as u16))
    };
    let mut row = layout.first_line_row;
    let mut col: usize = 0;

    queue!(out, SetForegroundColor(color(INK)))?;
    for ch in view.typed.chars() {
        if ch == '\n' {
            row += 1;
            col = 0;
            continue;
        }
        if let Some((x, y)) = cell(col, row) {
            queue!(out, MoveTo(x, y), Print(ch))?;
        }
        col += 1;
    }

    let mut untyped = view.untyped.chars().peekable();
    if let Some(glyph) = view.cursor_glyph {
        if let Some((x, y)) = cell(col, row) {
            queue!(
                out,
                MoveTo(x, y),
                SetAttribute(Attribute::Underlined),
                SetAttribute(Attribute::Bold)
            )?;
            match untyped.peek() {
                Some(ch) if *ch != '\n' => queue!(out, Print(*ch))?,
                _ => queue!(out, Print(glyph))?,
            }
            queue!(out, SetAttribute(Attribute::Reset))?;
        }
    }

    queue!(out, SetForegroundColor(color(FADED_INK)))?;
    let skip_first = view.cursor_glyph.is_some() && untyped.peek().is_some_and(|c| *c != '\n');
    for (i, ch) in untyped.enumerate() {
        if ch == '\n' {
            row += 1;
            col = 0;
            continue;
        }
        if i == 0 && skip_first {
            col += 1;
            continue;
        }
        if let Some((x, y)) = cell(col, row) {
            queue!(out, MoveTo(x, y), Print(ch))?;
        }
        col += 1;
    }
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_dialog<W: Write>(out: &mut W, layout: &Layout, lines: &[&str]) -> Result<()> {
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 6;
    let height = lines.len() as u16 + 2;
    let left = layout.cols.saturating_sub(width) / 2;
    let top = layout.rows.saturating_sub(height) / 2;
    let blank = " ".repeat(usize::from(width));

    queue!(out, SetBackgroundColor(Color::White), SetForegroundColor(Color::Black))?;
    for r in 0..height {
        queue!(out, MoveTo(left, top + r), Print(&blank))?;
    }
    for (i, line) in lines.iter().enumerate() {
        let pad = (width - line.chars().count() as u16) / 2;
        queue!(out, MoveTo(left + pad, top + 1 + i as u16), Print(line))?;
    }
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_onboarding<W: Write>(out: &mut W, layout: &Layout, onboarding: &Onboarding) -> Result<()> {
    let dots: String = (0..SLIDES.len())
        .map(|i| if i == onboarding.index() { '●' } else { '○' })
        .flat_map(|c| [c, ' '])
        .collect();
    let current = onboarding.current();
    let mut lines = vec![dots.trim_end(), "", current.title, ""];
    lines.extend(current.body.lines());
    lines.extend(["", "Enter: next   Esc: skip"]);
    draw_dialog(out, layout, &lines)
}

fn draw_status<W: Write>(out: &mut W, tw: &Typewriter, view: &View, row: u16, cols: u16) -> Result<()> {
    let mut status = String::new();
    if view.paused {
        status.push_str(" JAMMED |");
    }
    let (sound, sounds) = tw.keystroke_sound();
    status.push_str(&format!(
        " {} | {} | light {:.0}% | vol {:.0}% | sound {}/{} | {} ",
        if tw.typewriter_mode() { "TYPEWRITER" } else { "SCROLL" },
        tw.theme().name(),
        tw.lighting() * 100.0,
        tw.volume() * 100.0,
        sound + 1,
        sounds,
        tw.font_name(),
    ));
    if let Some(notice) = tw.notice() {
        status.push_str(&format!("| {notice} "));
    }
    let help = " ^Y copy  ^L clear  ^F full  ^T mode  ^B room  ^S sound  ^←→ vol  ^↑↓ light  ^Q quit ";
    let used = status.chars().count() + help.chars().count();
    let fill = usize::from(cols).saturating_sub(used);

    queue!(
        out,
        MoveTo(0, row),
        SetBackgroundColor(Color::Blue),
        SetForegroundColor(Color::White),
        Print(&status),
        Print(" ".repeat(fill)),
        Print(help),
        ResetColor
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::audio::CuePlayer;
    use crate::audio::tests::RecordingSink;
    use crate::clipboard::tests::MemoryClipboard;
    use crate::config::Config;
    use crate::key::{Command, Key};
    use crate::storage::{CONTENT_KEY, KeyValueStore, MemoryStore, ONBOARDING_KEY, Persistence};
    use crate::typewriter::Peripherals;

    fn mounted(content: &str, config: &Config) -> (Typewriter, Instant) {
        let mut store = MemoryStore::new();
        store.set(ONBOARDING_KEY, "true").unwrap();
        store.set(CONTENT_KEY, content).unwrap();
        let now = Instant::now();
        let peripherals = Peripherals {
            audio: CuePlayer::with_rng(
                Box::new(RecordingSink::default()),
                0.3,
                Path::new("sounds"),
                StdRng::seed_from_u64(1),
            ),
            clipboard: Box::new(MemoryClipboard::default()),
            persistence: Persistence::new(Box::new(store)),
        };
        (Typewriter::mount(config, peripherals, now), now)
    }

    #[test]
    fn view_splits_at_cursor() {
        let (mut tw, now) = mounted("HELLO", &Config::default());
        tw.handle_key(Key::Left, now);
        tw.handle_key(Key::Left, now);
        let layout = Layout::compute(&tw, 80, 24);
        let view = View::derive(&tw, &layout, now);
        assert_eq!(view.typed, "HEL");
        assert_eq!(view.untyped, "LO");
        assert_eq!(view.cursor_glyph, Some(CURSOR_GLYPH));
        assert!(!view.paused);
    }

    #[test]
    fn restored_page_sits_at_typing_line() {
        let (tw, now) = mounted("A\nB\nC", &Config::default());
        let layout = Layout::compute(&tw, 80, 24);
        let view = View::derive(&tw, &layout, now);
        assert_eq!(tw.paper_offset(), 0);
        assert_eq!(view.paper_translate, 0);
        // Last restored line in the middle of 23 text rows.
        assert_eq!(layout.first_line_row, 11 - 2);
    }

    #[test]
    fn paper_translation_follows_offset() {
        let (mut tw, now) = mounted("A", &Config::default());
        tw.handle_key(Key::Enter, now);
        let layout = Layout::compute(&tw, 80, 24);
        let view = View::derive(&tw, &layout, now);
        assert_eq!(view.paper_translate, -i64::from(LINE_HEIGHT));
        assert_eq!(layout.first_line_row, 11 - 1);
    }

    #[test]
    fn overlong_restored_page_draws() {
        let (tw, now) = mounted(&"X".repeat(70_000), &Config::default());
        for (cols, rows) in [(80, 24), (12, 4), (1, 1)] {
            let mut out = Vec::new();
            draw(&mut out, &tw, cols, rows, now).unwrap();
        }
    }

    #[test]
    fn text_is_clipped_to_terminal_width() {
        let text = format!("{}%%", "@".repeat(18));
        let (mut tw, now) = mounted(&text, &Config::default());
        tw.handle_key(Key::Command(Command::Fullscreen), now);
        let mut out = Vec::new();
        draw(&mut out, &tw, 20, 6, now).unwrap();
        let screen = String::from_utf8_lossy(&out);
        assert_eq!(screen.matches('@').count(), 18);
        assert!(!screen.contains('%'));
        assert!(!screen.contains(CURSOR_GLYPH));
    }

    #[test]
    fn forest_glow_lightens_its_corner() {
        let (tw, now) = mounted("", &Config::default());
        let layout = Layout::compute(&tw, 100, 50);
        let view = View::derive(&tw, &layout, now);
        let base = view.background.sample(0.8);
        // Column 20 of 100, row 40 of 50 is the glow centre.
        let lit = room_color(&layout, &view, 1.0, 20, 40);
        assert!(lit.0 > base.0 && lit.1 > base.1 && lit.2 > base.2);
        assert_eq!(room_color(&layout, &view, 1.0, 99, 49), view.background.sample(0.98));
    }

    #[test]
    fn onboarding_draws_current_slide() {
        let peripherals = Peripherals {
            audio: CuePlayer::with_rng(
                Box::new(RecordingSink::default()),
                0.3,
                Path::new("sounds"),
                StdRng::seed_from_u64(1),
            ),
            clipboard: Box::new(MemoryClipboard::default()),
            persistence: Persistence::new(Box::new(MemoryStore::new())),
        };
        let now = Instant::now();
        let mut tw = Typewriter::mount(&Config::default(), peripherals, now);
        tw.handle_key(Key::Enter, now);
        let mut out = Vec::new();
        draw(&mut out, &tw, 120, 40, now).unwrap();
        let screen = String::from_utf8_lossy(&out);
        assert!(screen.contains(SLIDES[1].title));
        assert!(!screen.contains(SLIDES[0].title));
    }

    #[test]
    fn status_shows_volume_and_sound() {
        let (mut tw, now) = mounted("", &Config::default());
        tw.handle_key(Key::Command(Command::VolumeUp), now);
        let mut out = Vec::new();
        draw(&mut out, &tw, 200, 24, now).unwrap();
        let screen = String::from_utf8_lossy(&out);
        assert!(screen.contains("vol 40%"));
        assert!(screen.contains("sound 1/1"));
    }

    #[test]
    fn scroll_mode_keeps_cursor_on_screen() {
        let config = Config {
            typewriter_mode: false,
            ..Config::default()
        };
        let text = vec!["X"; 40].join("\n");
        let (tw, _) = mounted(&text, &config);
        let layout = Layout::compute(&tw, 80, 12);
        let cursor_row = layout.first_line_row + 39;
        assert!(cursor_row >= 0 && cursor_row < i32::from(layout.text_rows));
        assert_eq!(tw.paper_offset(), 0);
    }

    #[test]
    fn fullscreen_hides_status_row() {
        let (mut tw, now) = mounted("", &Config::default());
        assert_eq!(Layout::compute(&tw, 80, 24).status_row, Some(23));
        tw.handle_key(Key::Command(Command::Fullscreen), now);
        let layout = Layout::compute(&tw, 80, 24);
        assert_eq!(layout.status_row, None);
        assert_eq!(layout.text_rows, 24);
    }

    #[test]
    fn paper_is_centred() {
        let (tw, _) = mounted("", &Config::default());
        let layout = Layout::compute(&tw, 84, 24);
        assert_eq!(layout.paper_left, 20);
        assert_eq!(layout.text_left, 22);
    }

    #[test]
    fn cursor_spot_is_clamped() {
        let (tw, _) = mounted(&"X".repeat(40), &Config::default());
        let layout = Layout::compute(&tw, 44, 24);
        let spot = cursor_spot(&tw, &layout);
        assert_eq!(spot.x, 90.0);
        assert!((10.0..=90.0).contains(&spot.y));
    }

    #[test]
    fn vignette_only_darkens_in_low_light() {
        let spot = CursorSpot { x: 50.0, y: 50.0 };
        assert_eq!(vignette(0.0, spot, 1.0), 1.0);
        assert_eq!(vignette(50.0, spot, 0.0), 1.0);
        assert!((vignette(0.0, spot, 0.0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn jammed_machine_shows_pause() {
        let (mut tw, now) = mounted("", &Config::default());
        tw.handle_key(Key::Char('A'), now);
        tw.handle_key(Key::Char('B'), now + Duration::from_millis(5));
        let layout = Layout::compute(&tw, 80, 24);
        assert!(View::derive(&tw, &layout, now + Duration::from_millis(10)).paused);
    }

    #[test]
    fn draw_writes_page_text() {
        let (tw, now) = mounted("HELLO\nWORLD", &Config::default());
        let mut out = Vec::new();
        draw(&mut out, &tw, 80, 24, now).unwrap();
        let screen = String::from_utf8_lossy(&out);
        assert!(screen.contains('H'));
        assert!(screen.contains("TYPEWRITER"));
    }
}
