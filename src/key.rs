use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Copy,
    Clear,
    Fullscreen,
    TypewriterMode,
    Theme,
    LightingUp,
    LightingDown,
    VolumeUp,
    VolumeDown,
    NextSound,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Command(Command),
    Other,
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
                'y' => Key::Command(Command::Copy),
                'l' => Key::Command(Command::Clear),
                'f' => Key::Command(Command::Fullscreen),
                't' => Key::Command(Command::TypewriterMode),
                'b' => Key::Command(Command::Theme),
                's' => Key::Command(Command::NextSound),
                'q' => Key::Command(Command::Quit),
                // ctrl-c included: a typewriter has no interrupt
                _ => Key::Other,
            },
            KeyCode::Up if ctrl => Key::Command(Command::LightingUp),
            KeyCode::Down if ctrl => Key::Command(Command::LightingDown),
            KeyCode::Right if ctrl => Key::Command(Command::VolumeUp),
            KeyCode::Left if ctrl => Key::Command(Command::VolumeDown),
            KeyCode::Char(_) if event.modifiers.contains(KeyModifiers::ALT) => Key::Other,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Esc => Key::Escape,
            _ => Key::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Key {
        Key::from(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn printable_characters_pass_through() {
        assert_eq!(key(KeyCode::Char('a'), KeyModifiers::NONE), Key::Char('a'));
        assert_eq!(key(KeyCode::Char('A'), KeyModifiers::SHIFT), Key::Char('A'));
        assert_eq!(key(KeyCode::Enter, KeyModifiers::NONE), Key::Enter);
    }

    #[test]
    fn ctrl_chords_become_commands() {
        assert_eq!(
            key(KeyCode::Char('y'), KeyModifiers::CONTROL),
            Key::Command(Command::Copy)
        );
        assert_eq!(
            key(KeyCode::Up, KeyModifiers::CONTROL),
            Key::Command(Command::LightingUp)
        );
        assert_eq!(
            key(KeyCode::Left, KeyModifiers::CONTROL),
            Key::Command(Command::VolumeDown)
        );
        assert_eq!(key(KeyCode::Left, KeyModifiers::NONE), Key::Left);
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::CONTROL), Key::Other);
    }

    #[test]
    fn erasing_keys_are_distinct() {
        assert_eq!(key(KeyCode::Backspace, KeyModifiers::NONE), Key::Backspace);
        assert_eq!(key(KeyCode::Delete, KeyModifiers::NONE), Key::Delete);
    }
}
