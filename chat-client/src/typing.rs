//! Character-by-character reveal of a growing answer.

use std::time::Duration;

/// Delay between two revealed characters.
pub const TYPING_DELAY: Duration = Duration::from_millis(20);

/// How much of a target text has been revealed, counted in characters.
///
/// The target may grow between calls; it is never assumed to shrink below
/// what was already shown.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TypingProjection {
    shown: usize,
}

impl TypingProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Characters revealed so far.
    pub fn shown(&self) -> usize {
        self.shown
    }

    /// Revealed prefix of `target`.
    pub fn visible<'a>(&self, target: &'a str) -> &'a str {
        &target[..byte_offset(target, self.shown)]
    }

    /// Reveals up to `max_chars` more characters of `target` and returns them.
    pub fn advance<'a>(&mut self, target: &'a str, max_chars: usize) -> &'a str {
        let start = byte_offset(target, self.shown);
        let rest = &target[start..];
        let end = byte_offset(rest, max_chars);
        self.shown += rest[..end].chars().count();
        &rest[..end]
    }

    pub fn reset(&mut self) {
        self.shown = 0;
    }
}

/// Byte index after the first `chars` characters, clamped to the end.
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveals_whole_characters() {
        let mut t = TypingProjection::new();
        let target = "สวัสดีครับ";
        assert_eq!(t.advance(target, 2), "สว");
        assert_eq!(t.visible(target), "สว");
        assert_eq!(t.advance(target, 100), "ัสดีครับ");
        assert_eq!(t.shown(), target.chars().count());
        assert_eq!(t.advance(target, 1), "");
    }

    #[test]
    fn follows_a_growing_target() {
        let mut t = TypingProjection::new();
        assert_eq!(t.advance("Hel", 10), "Hel");
        assert_eq!(t.advance("Hello", 10), "lo");
        t.reset();
        assert_eq!(t.visible("Hello"), "");
    }
}
