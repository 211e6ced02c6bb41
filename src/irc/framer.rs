//! Output framing: wrap long outbound text into line-sized chunks.
//!
//! Chunks are bounded in bytes, never split a UTF-8 character, break at
//! whitespace when possible and never at hyphens. Whitespace runs collapse
//! to a single space.

/// Hard IRC line ceiling, CRLF included.
pub const MAX_LINE_LEN: usize = 512;

/// Payload budget of a line once CRLF is accounted for.
pub const MAX_LINE_CONTENT: usize = MAX_LINE_LEN - 2;

/// Wraps text at a fixed byte width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framer {
    width: usize,
}

impl Framer {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Narrow this framer so `overhead` bytes of command and target still fit in a line.
    pub fn for_overhead(&self, overhead: usize) -> Framer {
        Framer::new(self.width.min(MAX_LINE_CONTENT.saturating_sub(overhead)))
    }

    /// Lazily frame `text`. Calling again restarts from the beginning.
    pub fn frame<'a>(&self, text: &'a str) -> Frames<'a> {
        Frames {
            words: text.split_whitespace(),
            carry: None,
            width: self.width,
        }
    }
}

/// Iterator over framed chunks of one message.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    words: std::str::SplitWhitespace<'a>,
    /// Word (or remainder of an oversized word) that did not fit the previous chunk.
    carry: Option<&'a str>,
    width: usize,
}

impl Iterator for Frames<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut line = String::new();

        while let Some(word) = self.carry.take().or_else(|| self.words.next()) {
            let sep = usize::from(!line.is_empty());

            if line.len() + sep + word.len() <= self.width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                continue;
            }

            if word.len() <= self.width {
                // Fits on a fresh line.
                self.carry = Some(word);
                return Some(line);
            }

            // Oversized word: fill what is left of this line with its head.
            let room = self.width.saturating_sub(line.len() + sep);
            let mut cut = floor_char_boundary(word, room);
            if cut == 0 {
                if !line.is_empty() {
                    self.carry = Some(word);
                    return Some(line);
                }
                // Width smaller than the first character: emit it anyway.
                cut = word.chars().next().map_or(word.len(), char::len_utf8);
            }
            if sep == 1 {
                line.push(' ');
            }
            line.push_str(&word[..cut]);
            if cut < word.len() {
                self.carry = Some(&word[cut..]);
            }
            return Some(line);
        }

        (!line.is_empty()).then_some(line)
    }
}

/// Find the last UTF-8 char boundary at or before `byte_index` in `s`.
fn floor_char_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index >= s.len() {
        return s.len();
    }
    let mut i = byte_index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str, width: usize) -> Vec<String> {
        Framer::new(width).frame(text).collect()
    }

    #[test]
    fn test_short_message_single_chunk() {
        assert_eq!(frame("Hello world", 50), vec!["Hello world"]);
    }

    #[test]
    fn test_empty_and_blank_produce_nothing() {
        assert!(frame("", 10).is_empty());
        assert!(frame("   \t ", 10).is_empty());
    }

    #[test]
    fn test_breaks_at_last_fitting_space() {
        assert_eq!(
            frame("Hello beautiful world", 15),
            vec!["Hello beautiful", "world"]
        );
        assert_eq!(frame("Hello beautiful world", 14), vec!["Hello", "beautiful", "world"]);
    }

    #[test]
    fn test_whitespace_normalized() {
        assert_eq!(frame("  a \t b\n\nc  ", 100), vec!["a b c"]);
    }

    #[test]
    fn test_long_word_hard_split_fills_line() {
        assert_eq!(frame("HelloBeautifulWorld", 10), vec!["HelloBeaut", "ifulWorld"]);
        assert_eq!(frame("ab HelloBeautifulWorld", 10), vec!["ab HelloBe", "autifulWor", "ld"]);
    }

    #[test]
    fn test_never_breaks_at_hyphen() {
        assert_eq!(frame("well-known x", 8), vec!["well-kno", "wn x"]);
        assert_eq!(frame("a well-known", 10), vec!["a", "well-known"]);
    }

    #[test]
    fn test_multibyte_never_split() {
        // "é" is 2 bytes; a width of 4 lands inside the second one.
        let chunks = frame("ééé", 3);
        assert_eq!(chunks, vec!["é", "é", "é"]);
        let chunks = frame("Hi 🎉 there", 4);
        assert_eq!(chunks, vec!["Hi", "🎉", "ther", "e"]);
    }

    #[test]
    fn test_width_smaller_than_char_still_progresses() {
        assert_eq!(frame("🎉🎉", 2), vec!["🎉", "🎉"]);
    }

    #[test]
    fn test_restartable() {
        let framer = Framer::new(5);
        let first: Vec<_> = framer.frame("aaa bbb ccc").collect();
        let again: Vec<_> = framer.frame("aaa bbb ccc").collect();
        assert_eq!(first, again);

        let frames = framer.frame("aaa bbb ccc");
        let cloned: Vec<_> = frames.clone().collect();
        assert_eq!(cloned, frames.collect::<Vec<_>>());
    }

    #[test]
    fn test_long_chat_message_bounded_and_rejoins() {
        let words = ["alpha", "beta", "gamma", "delta", "epsilon"];
        let text: String = (0..200)
            .map(|i| words[i % words.len()])
            .collect::<Vec<_>>()
            .join(" ");
        let text = &text[..1000.min(text.len())];
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

        let chunks = frame(text, 400);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.len() <= 400);
            assert!(!chunk.starts_with(' ') && !chunk.ends_with(' '));
        }
        assert_eq!(chunks.join(" "), normalized);
    }

    #[test]
    fn test_for_overhead_caps_width() {
        let framer = Framer::new(400);
        assert_eq!(framer.for_overhead(20).width(), 400);
        assert_eq!(framer.for_overhead(200).width(), MAX_LINE_CONTENT - 200);
    }
}
