//! IRC color/format codes and translation from game-chat color codes.
//!
//! Game chat uses `^0`..`^9` for colors (Quake 3 style). IRC uses `^C`
//! followed by a two digit color number.

use std::borrow::Cow;

pub const NORMAL: &str = "\x0F";
pub const BOLD: &str = "\x02";
pub const ITALIC: &str = "\x1D";
pub const UNDERLINE: &str = "\x1F";

pub const WHITE: &str = "\x0316";
pub const BLACK: &str = "\x0301";
pub const BLUE: &str = "\x0302";
pub const GREEN: &str = "\x0303";
pub const RED: &str = "\x0304";
pub const BROWN: &str = "\x0305";
pub const PURPLE: &str = "\x0306";
pub const ORANGE: &str = "\x0307";
pub const YELLOW: &str = "\x0308";
pub const LIME: &str = "\x0309";
pub const TEAL: &str = "\x0310";
pub const CYAN: &str = "\x0311";
pub const ROYAL: &str = "\x0312";
pub const MAGENTA: &str = "\x0313";
pub const DARK_GRAY: &str = "\x0314";
pub const LIGHT_GRAY: &str = "\x0315";

/// Reset sequence every outbound message is wrapped with.
pub const RESET: &str = "\x0F\x02";

/// IRC color for each game color digit `^0`..`^9`.
pub const GAME_PALETTE: [&str; 10] = [
    BLACK, RED, GREEN, YELLOW, BLUE, CYAN, MAGENTA, WHITE, ORANGE, DARK_GRAY,
];

const FORMAT_CHARS: &[char] = &['\x02', '\x03', '\x0F', '\x16', '\x1D', '\x1F'];

/// Replace game color codes with IRC ones and wrap the result in [`RESET`].
///
/// Not idempotent: each call adds another pair of reset sequences.
pub fn convert_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + RESET.len() * 2 + 8);
    out.push_str(RESET);

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '^' {
            if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                chars.next();
                out.push_str(GAME_PALETTE[digit as usize]);
                continue;
            }
        }
        out.push(c);
    }

    out.push_str(RESET);
    out
}

/// Remove game color codes (`^0`..`^9`).
pub fn strip_game_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '^' && chars.peek().is_some_and(|d| d.is_ascii_digit()) {
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// Remove IRC format codes, including color numbers following `^C`.
pub fn strip_irc_formatting(text: &str) -> Cow<'_, str> {
    if !text.contains(FORMAT_CHARS) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x03' {
            // foreground: up to two digits, then optional ",bg"
            if take_digits(&mut chars) > 0 {
                let mut lookahead = chars.clone();
                if lookahead.next() == Some(',')
                    && lookahead.peek().is_some_and(|d| d.is_ascii_digit())
                {
                    chars.next();
                    take_digits(&mut chars);
                }
            }
            continue;
        }
        if FORMAT_CHARS.contains(&c) {
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> usize {
    let mut taken = 0;
    while taken < 2 && chars.peek().is_some_and(|d| d.is_ascii_digit()) {
        chars.next();
        taken += 1;
    }
    taken
}
