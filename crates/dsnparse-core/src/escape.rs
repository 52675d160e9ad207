//! Backslash-escape helpers shared by every parsing phase.
//!
//! A backslash marks the character right after it as literal content
//! instead of a structural delimiter. The rule is deliberately shallow:
//! a backslash before *any* character escapes it, and a doubled backslash
//! (`\\@`) is **not** read as "escaped backslash, then a live `@`". The
//! second backslash still escapes the `@`.
//!
//! Positions are byte offsets. All delimiters handled here are ASCII and
//! `\` can never appear inside a multi-byte UTF-8 sequence, so checking the
//! byte before a delimiter is the same as checking the previous character.
//!
//! # Examples
//!
//! ```
//! use dsnparse_core::escape::{is_escaped, unescape, CREDENTIAL_ESCAPES};
//!
//! assert!(is_escaped(3, r"us\@er"));
//! assert_eq!(unescape(CREDENTIAL_ESCAPES, r"us\@er"), "us@er");
//! ```

use std::borrow::Cow;

pub const BACKSLASH: char = '\\';

/// Characters that may be escaped inside the `user:password` block.
pub const CREDENTIAL_ESCAPES: &[char] = &[':', '@'];

/// Characters that may be escaped inside a `key=value` query parameter.
pub const PARAM_ESCAPES: &[char] = &['=', '&'];

/// Returns true when the character at byte offset `pos` is preceded by a
/// backslash.
pub fn is_escaped(pos: usize, text: &str) -> bool {
    pos > 0 && text.as_bytes().get(pos - 1) == Some(&b'\\')
}

/// Drops every backslash whose following character is in `escapable`.
///
/// Backslashes before any other character, or at the very end of `text`,
/// are kept as-is. Borrows `text` when it holds no backslash at all.
pub fn unescape<'a>(escapable: &[char], text: &'a str) -> Cow<'a, str> {
    if !text.contains(BACKSLASH) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == BACKSLASH
            && chars.peek().is_some_and(|next| escapable.contains(next))
        {
            continue;
        }
        out.push(c);
    }

    Cow::Owned(out)
}

/// Byte offset of the first occurrence of `needle` that is not escaped.
pub fn find_unescaped(text: &str, needle: char) -> Option<usize> {
    text.match_indices(needle)
        .map(|(pos, _)| pos)
        .find(|&pos| !is_escaped(pos, text))
}

/// Splits `text` on every un-escaped `delim`.
///
/// Escaped delimiters stay inside their fragment (backslash included);
/// unescaping is left to the caller. Like [`str::split`], an empty input
/// yields a single empty fragment.
pub fn split_unescaped(text: &str, delim: char) -> SplitUnescaped<'_> {
    SplitUnescaped {
        text,
        delim,
        start: 0,
        finished: false,
    }
}

/// Iterator returned by [`split_unescaped`].
#[derive(Debug, Clone)]
pub struct SplitUnescaped<'a> {
    text: &'a str,
    delim: char,
    start: usize,
    finished: bool,
}

impl<'a> Iterator for SplitUnescaped<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let rest = &self.text[self.start..];
        let hit = rest
            .match_indices(self.delim)
            .map(|(pos, _)| self.start + pos)
            .find(|&pos| !is_escaped(pos, self.text));

        match hit {
            Some(end) => {
                let fragment = &self.text[self.start..end];
                self.start = end + self.delim.len_utf8();
                Some(fragment)
            }
            None => {
                self.finished = true;
                Some(rest)
            }
        }
    }
}
