use std::time::{Duration, Instant};

use crate::buffer::Buffer;

pub struct Cursor {
    pub index: usize,
    pub visible: bool,
    pub blink_interval: Duration,
    pub last_blink: Instant,
}

impl Cursor {
    pub fn new(now: Instant) -> Self {
        Cursor {
            index: 0,
            visible: true,
            blink_interval: Duration::from_millis(400),
            last_blink: now,
        }
    }

    pub fn blink(&mut self, now: Instant) {
        if now.duration_since(self.last_blink) >= self.blink_interval {
            self.visible = !self.visible;
            self.last_blink = now;
        }
    }

    pub fn wake(&mut self, now: Instant) {
        self.visible = true;
        self.last_blink = now;
    }

    pub fn advance(&mut self, buffer: &Buffer) {
        self.index = (self.index + 1).min(buffer.len());
    }

    pub fn move_left(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn move_right(&mut self, buffer: &Buffer) {
        self.index = (self.index + 1).min(buffer.len());
    }

    pub fn move_up(&mut self, buffer: &Buffer) {
        let line_start = buffer.line_start(self.index);
        if line_start == 0 {
            return;
        }
        let column = self.index - line_start;
        let prev_start = buffer.line_start(line_start - 1);
        let prev_len = line_start - 1 - prev_start;
        self.index = prev_start + column.min(prev_len);
    }

    pub fn move_down(&mut self, buffer: &Buffer) {
        let line_end = buffer.line_end(self.index);
        if line_end >= buffer.len() {
            return;
        }
        let column = self.index - buffer.line_start(self.index);
        let next_start = line_end + 1;
        let next_len = buffer.line_end(next_start) - next_start;
        self.index = next_start + column.min(next_len);
    }

    pub fn column(&self, buffer: &Buffer) -> usize {
        self.index - buffer.line_start(self.index)
    }
}
