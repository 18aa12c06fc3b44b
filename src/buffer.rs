/// Maximum number of characters on one logical line.
pub const MAX_LINE_LEN: usize = 40;

/// Characters are only appended or struck over; nothing is removed except by `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    chars: Vec<char>,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer { chars: Vec::new() }
    }

    pub fn from_text(text: &str) -> Self {
        Self::restore(text).0
    }

    /// Loads saved text, breaking any line longer than [`MAX_LINE_LEN`]
    /// into full-width pieces. Returns the buffer and how many lines had
    /// to be broken.
    pub fn restore(text: &str) -> (Self, usize) {
        let mut chars = Vec::with_capacity(text.len());
        let mut broken = 0;
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                chars.push('\n');
            }
            let line: Vec<char> = line.chars().collect();
            if line.len() > MAX_LINE_LEN {
                broken += 1;
            }
            for (j, piece) in line.chunks(MAX_LINE_LEN).enumerate() {
                if j > 0 {
                    chars.push('\n');
                }
                chars.extend_from_slice(piece);
            }
        }
        (Buffer { chars }, broken)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn lines(&self) -> impl Iterator<Item = &[char]> {
        self.chars.split(|c| *c == '\n')
    }

    pub fn line_count(&self) -> usize {
        self.chars.iter().filter(|c| **c == '\n').count() + 1
    }

    pub fn line_index_at(&self, index: usize) -> usize {
        let index = index.min(self.chars.len());
        self.chars[..index].iter().filter(|c| **c == '\n').count()
    }

    pub fn line_start(&self, index: usize) -> usize {
        let index = index.min(self.chars.len());
        self.chars[..index]
            .iter()
            .rposition(|c| *c == '\n')
            .map_or(0, |nl| nl + 1)
    }

    /// Offset of the newline ending the line containing `index`, or the
    /// buffer length for the last line.
    pub fn line_end(&self, index: usize) -> usize {
        let index = index.min(self.chars.len());
        self.chars[index..]
            .iter()
            .position(|c| *c == '\n')
            .map_or(self.chars.len(), |nl| index + nl)
    }

    pub fn line_len_at(&self, index: usize) -> usize {
        self.line_end(index) - self.line_start(index)
    }

    /// A newline marker under the cursor is never struck over; the character goes in front of it.
    pub fn strike(&mut self, index: usize, ch: char) {
        if ch == '\n' || index >= self.chars.len() {
            self.chars.push(ch);
        } else if self.chars[index] == '\n' {
            self.chars.insert(index, ch);
        } else {
            self.chars[index] = ch;
        }
    }

    pub fn clear(&mut self) {
        self.chars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_queries_on_multiline_text() {
        let buffer = Buffer::from_text("HELLO\nWORLD!\n");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line_index_at(0), 0);
        assert_eq!(buffer.line_index_at(5), 0);
        assert_eq!(buffer.line_index_at(6), 1);
        assert_eq!(buffer.line_start(8), 6);
        assert_eq!(buffer.line_end(8), 12);
        assert_eq!(buffer.line_len_at(8), 6);
        assert_eq!(buffer.line_len_at(13), 0);
    }

    #[test]
    fn line_queries_clamp_out_of_range_index() {
        let buffer = Buffer::from_text("AB");
        assert_eq!(buffer.line_start(10), 0);
        assert_eq!(buffer.line_end(10), 2);
        assert_eq!(buffer.line_index_at(10), 0);
    }

    #[test]
    fn strike_overwrites_inside_text() {
        let mut buffer = Buffer::from_text("CAT");
        buffer.strike(1, 'U');
        assert_eq!(buffer.text(), "CUT");
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn strike_appends_at_end() {
        let mut buffer = Buffer::from_text("CA");
        buffer.strike(2, 'T');
        assert_eq!(buffer.text(), "CAT");
    }

    #[test]
    fn newline_is_always_appended() {
        let mut buffer = Buffer::from_text("CAT");
        buffer.strike(0, '\n');
        assert_eq!(buffer.text(), "CAT\n");
    }

    #[test]
    fn newline_marker_is_never_struck_over() {
        let mut buffer = Buffer::from_text("AB\nCD");
        buffer.strike(2, 'X');
        assert_eq!(buffer.text(), "ABX\nCD");
        assert_eq!(buffer.line_count(), 2);
    }

    #[test]
    fn restore_breaks_overlong_lines() {
        let text = format!("{}\nOK\n{}", "X".repeat(70_000), "Y".repeat(41));
        let (buffer, broken) = Buffer::restore(&text);
        assert_eq!(broken, 2);
        assert!(buffer.lines().all(|l| l.len() <= MAX_LINE_LEN));
        assert_eq!(buffer.line_count(), 70_000 / MAX_LINE_LEN + 1 + 2);
        assert_eq!(buffer.len(), text.chars().count() + 70_000 / MAX_LINE_LEN - 1 + 1);
    }

    #[test]
    fn restore_keeps_lines_that_fit() {
        let text = format!("{}\n\nAB", "Z".repeat(40));
        let (buffer, broken) = Buffer::restore(&text);
        assert_eq!(broken, 0);
        assert_eq!(buffer.text(), text);
    }

    #[test]
    fn lines_skip_markers() {
        let buffer = Buffer::from_text("A\n\nBC");
        let lines: Vec<String> = buffer.lines().map(|l| l.iter().collect()).collect();
        assert_eq!(lines, vec!["A", "", "BC"]);
    }
}
