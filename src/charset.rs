/// Character-set membership tables used by `[...]`, `.`, `\d` and friends.
///
/// A table covers ASCII until a member above U+007F is added, at which point
/// it widens to the whole 16-bit range. Surrogate code points are never
/// selectable in either direction.

use rand::Rng;

use crate::error::GenError;

const ASCII_SIZE: usize = 0x80;
const WIDE_SIZE: usize = 0x1_0000;
const SURROGATE_COUNT: usize = 0x800;

/// Largest code point a set can hold.
pub const MAX_SET_CHAR: char = '\u{FFFF}';

/// Characters matched by `\s`.
const WHITESPACE: &str = " \r\n\x0C\x0B\t";

/// Shorthand class kind, usable as an atom or inside a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shorthand {
    /// `\d`
    Digit,
    /// `\D`
    NonDigit,
    /// `\w`
    Word,
    /// `\W`
    NonWord,
    /// `\s`
    Space,
    /// `\S`
    NonSpace,
}

impl Shorthand {
    pub fn from_escape(ch: char) -> Option<Shorthand> {
        match ch {
            'd' => Some(Shorthand::Digit),
            'D' => Some(Shorthand::NonDigit),
            'w' => Some(Shorthand::Word),
            'W' => Some(Shorthand::NonWord),
            's' => Some(Shorthand::Space),
            'S' => Some(Shorthand::NonSpace),
            _ => None,
        }
    }

    fn is_negated(self) -> bool {
        matches!(
            self,
            Shorthand::NonDigit | Shorthand::NonWord | Shorthand::NonSpace
        )
    }

    /// Whether `ch` belongs to the positive form of this class.
    fn base_matches(self, ch: char) -> bool {
        match self {
            Shorthand::Digit | Shorthand::NonDigit => ch.is_ascii_digit(),
            Shorthand::Word | Shorthand::NonWord => ch.is_ascii_alphanumeric() || ch == '_',
            Shorthand::Space | Shorthand::NonSpace => WHITESPACE.contains(ch),
        }
    }
}

/// A positive or negated set of characters.
///
/// `choices` is kept in step with `members`: for a positive set it counts the
/// members, for a negated set it counts the non-members of the table range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSet {
    positive: bool,
    members: Vec<bool>,
    choices: usize,
}

impl CharSet {
    pub fn new(positive: bool) -> Self {
        CharSet {
            positive,
            members: vec![false; ASCII_SIZE],
            choices: if positive { 0 } else { ASCII_SIZE },
        }
    }

    /// Set built from a shorthand class such as `\d` or `\W`.
    pub fn from_shorthand(kind: Shorthand) -> Self {
        let mut set = CharSet::new(!kind.is_negated());
        for cp in 0..ASCII_SIZE as u32 {
            if let Some(ch) = char::from_u32(cp) {
                if kind.base_matches(ch) {
                    set.add_char(ch);
                }
            }
        }
        set
    }

    /// A negated set excluding only `ch`: every other character is selectable.
    pub fn excluding(ch: char) -> Self {
        let mut set = CharSet::new(false);
        if ch <= MAX_SET_CHAR {
            set.add_char(ch);
        } else {
            set.widen();
        }
        set
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// Number of code points the table covers, surrogates excluded.
    fn universe(&self) -> usize {
        if self.members.len() == WIDE_SIZE {
            WIDE_SIZE - SURROGATE_COUNT
        } else {
            ASCII_SIZE
        }
    }

    fn widen(&mut self) {
        if self.members.len() == WIDE_SIZE {
            return;
        }
        let added = WIDE_SIZE - SURROGATE_COUNT - ASCII_SIZE;
        self.members.resize(WIDE_SIZE, false);
        if !self.positive {
            self.choices += added;
        }
    }

    /// Add a single member. `ch` must not exceed [`MAX_SET_CHAR`].
    pub fn add_char(&mut self, ch: char) {
        debug_assert!(ch <= MAX_SET_CHAR);
        let idx = ch as usize;
        if idx >= self.members.len() {
            self.widen();
        }
        if !self.members[idx] {
            self.members[idx] = true;
            if self.positive {
                self.choices += 1;
            } else {
                self.choices -= 1;
            }
        }
    }

    /// Add every character in `start..=end`.
    pub fn add_range(&mut self, start: char, end: char) {
        debug_assert!(start <= end && end <= MAX_SET_CHAR);
        for cp in start as u32..=end as u32 {
            if let Some(ch) = char::from_u32(cp) {
                self.add_char(ch);
            }
        }
    }

    /// Add the members of a shorthand class; negated shorthands widen the table.
    pub fn add_shorthand(&mut self, kind: Shorthand) {
        if kind.is_negated() {
            self.widen();
        }
        let limit = self.members.len() as u32;
        for cp in 0..limit {
            if let Some(ch) = char::from_u32(cp) {
                if kind.base_matches(ch) != kind.is_negated() {
                    self.add_char(ch);
                }
            }
        }
    }

    /// Membership as a matcher sees it: a negated set accepts anything it
    /// does not list, including characters beyond the table range.
    pub fn matches(&self, ch: char) -> bool {
        let listed = self.members.get(ch as usize).copied().unwrap_or(false);
        listed == self.positive
    }

    /// Characters a valid draw can produce.
    pub fn selectable(&self) -> usize {
        self.choices
    }

    /// Characters of the table range an invalid draw can produce.
    pub fn excludable(&self) -> usize {
        self.universe() - self.choices
    }

    /// A set can be invalidated while some character of its range is excluded.
    pub fn is_invalidatable(&self) -> bool {
        self.excludable() > 0
    }

    /// Draw one character uniformly. With `invert`, the draw comes from the
    /// complement so the result never satisfies the set.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R, invert: bool) -> Result<char, GenError> {
        let count = if invert {
            self.excludable()
        } else {
            self.selectable()
        };
        if count == 0 {
            return Err(GenError::EmptySet);
        }

        let mut remaining = rng.random_range(0..count);
        for (cp, &listed) in self.members.iter().enumerate() {
            let Some(ch) = char::from_u32(cp as u32) else {
                continue;
            };
            if (listed == self.positive) != invert {
                if remaining == 0 {
                    return Ok(ch);
                }
                remaining -= 1;
            }
        }
        Err(GenError::EmptySet)
    }
}
