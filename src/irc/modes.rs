//! Mode string parsing and the ISUPPORT `PREFIX` map.

use std::collections::HashMap;

/// One signed mode change, with its argument if the letter takes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub sign: char,
    pub letter: char,
    pub arg: Option<String>,
}

impl ModeChange {
    /// The change as `+o` / `-v`.
    pub fn delta(&self) -> String {
        format!("{}{}", self.sign, self.letter)
    }
}

/// Letters that take an argument when set.
const ARG_ON_SET: &str = "bkloveIqh";
/// Letters that take an argument when unset (`l` does not).
const ARG_ON_UNSET: &str = "bkoveIqh";

/// Parse channel mode arguments, e.g. `["+ov-l", "alice", "bob"]`.
pub fn parse_channel_modes(args: &[String]) -> Vec<ModeChange> {
    let Some((modes, rest)) = args.split_first() else {
        return Vec::new();
    };
    let mut params = rest.iter();
    let mut sign = '+';
    let mut changes = Vec::new();

    for letter in modes.chars() {
        match letter {
            '+' | '-' => sign = letter,
            _ => {
                let takes_arg = if sign == '+' {
                    ARG_ON_SET.contains(letter)
                } else {
                    ARG_ON_UNSET.contains(letter)
                };
                let arg = if takes_arg { params.next().cloned() } else { None };
                changes.push(ModeChange { sign, letter, arg });
            }
        }
    }
    changes
}

/// Server features advertised in `005` that the session relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Features {
    /// Nick prefix symbol to mode letter, e.g. `@` → `o`.
    pub prefix: HashMap<char, char>,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            prefix: HashMap::from([('@', 'o'), ('+', 'v')]),
        }
    }
}

impl Features {
    /// Apply one `005` reply's tokens.
    pub fn load(&mut self, tokens: &[String]) {
        for token in tokens {
            if let Some(value) = token.strip_prefix("PREFIX=") {
                if let Some(map) = parse_prefix(value) {
                    self.prefix = map;
                }
            }
        }
    }

    /// Split leading prefix symbols off a names-list entry.
    pub fn split_nick<'a>(&self, entry: &'a str) -> (Vec<char>, &'a str) {
        let mut letters = Vec::new();
        let mut rest = entry;
        while let Some(c) = rest.chars().next() {
            match self.prefix.get(&c) {
                Some(&letter) => {
                    letters.push(letter);
                    rest = &rest[c.len_utf8()..];
                }
                None => break,
            }
        }
        (letters, rest)
    }
}

/// Parse `(qaohv)~&@%+` into a symbol → letter map.
fn parse_prefix(value: &str) -> Option<HashMap<char, char>> {
    let inner = value.strip_prefix('(')?;
    let (letters, symbols) = inner.split_once(')')?;
    if letters.chars().count() != symbols.chars().count() {
        return None;
    }
    Some(symbols.chars().zip(letters.chars()).collect())
}
