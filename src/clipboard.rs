use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::clipboard::CopyToClipboard;
use crossterm::execute;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const NOTICE_TIME: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    System,
    Terminal,
}

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<CopyMethod>;
}

pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                debug!(target: "typewriter.clipboard", %err, "system_clipboard_unavailable");
                None
            }
        };
        SystemClipboard { inner }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<CopyMethod> {
        if let Some(clipboard) = self.inner.as_mut() {
            match clipboard.set_text(text.to_owned()) {
                Ok(()) => return Ok(CopyMethod::System),
                Err(err) => {
                    warn!(target: "typewriter.clipboard", %err, "system_copy_failed");
                }
            }
        }
        copy_via_terminal(&mut io::stdout(), text)?;
        Ok(CopyMethod::Terminal)
    }
}

/// Hands `text` to the terminal emulator's clipboard with OSC 52.
pub fn copy_via_terminal<W: Write>(out: &mut W, text: &str) -> Result<()> {
    execute!(out, CopyToClipboard::to_clipboard_from(text))
        .map_err(|err| Error::Clipboard(err.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: &'static str,
    pub until: Instant,
}

impl Notice {
    pub fn copied(now: Instant) -> Self {
        Notice {
            message: "Copied!",
            until: now + NOTICE_TIME,
        }
    }

    pub fn is_live(&self, now: Instant) -> bool {
        now < self.until
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Default)]
    pub(crate) struct MemoryClipboard {
        pub copied: Rc<RefCell<Vec<String>>>,
    }

    impl Clipboard for MemoryClipboard {
        fn copy(&mut self, text: &str) -> Result<CopyMethod> {
            self.copied.borrow_mut().push(text.to_string());
            Ok(CopyMethod::System)
        }
    }

    #[test]
    fn terminal_fallback_writes_osc52() {
        let mut out = Vec::new();
        copy_via_terminal(&mut out, "foo").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\x1b]52;c;Zm9v\x1b\\");
    }

    #[test]
    fn notice_expires_after_two_seconds() {
        let now = Instant::now();
        let notice = Notice::copied(now);
        assert!(notice.is_live(now + Duration::from_millis(1999)));
        assert!(!notice.is_live(now + Duration::from_secs(2)));
    }
}
