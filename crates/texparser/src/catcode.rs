//! Category codes and the scoped category code table.
//!
//! Every character read by the lexer is classified using the [CatCodeTable].
//! The table is mutable while the input is being processed
//!     (for example `\makeatletter` makes `@` a letter)
//!     and its assignments follow the same grouping rules as control sequence bindings.
use texparser_stdext::collections::groupingmap::{GroupingMap, Scope};

use CatCode::*;

/// The 16 category codes of TeX.
///
/// Each variant's documentation contains an example character that has the category code in
///     the default table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CatCode {
    /// Starts a control sequence. Example: `\`.
    Escape = 0,
    /// Begins a group. Example: `{`.
    BeginGroup = 1,
    /// Ends a group. Example: `}`.
    EndGroup = 2,
    /// Example: `$`.
    MathShift = 3,
    /// Example: `&`.
    AlignmentTab = 4,
    /// Ends a line. Examples: `\n`, `\r`.
    ///
    /// Two or more consecutive ends of line, modulo intervening spaces,
    ///     produce a `\par` control sequence instead of a space.
    /// An end of line also terminates a comment.
    EndOfLine = 5,
    /// Marks a macro parameter, and is generally followed by a digit. Example: `#`.
    Parameter = 6,
    /// Example: `^`.
    Superscript = 7,
    /// Example: `_`.
    Subscript = 8,
    /// Dropped by the lexer. Example: ASCII null.
    Ignored = 9,
    /// Whitespace. Examples: space and tab.
    Space = 10,
    /// A character that can appear in a multi-character control sequence name.
    /// Examples: `[a-zA-Z]`.
    Letter = 11,
    /// Example: `@`.
    #[default]
    Other = 12,
    /// A single character that behaves like a control sequence. Example: `~`.
    Active = 13,
    /// Starts a comment that runs until the next end of line. Example: `%`.
    Comment = 14,
    /// The lexer returns an error for this character. Example: ASCII delete.
    Invalid = 15,
}

impl TryFrom<u8> for CatCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Escape,
            1 => BeginGroup,
            2 => EndGroup,
            3 => MathShift,
            4 => AlignmentTab,
            5 => EndOfLine,
            6 => Parameter,
            7 => Superscript,
            8 => Subscript,
            9 => Ignored,
            10 => Space,
            11 => Letter,
            12 => Other,
            13 => Active,
            14 => Comment,
            15 => Invalid,
            _ => return Err(value),
        })
    }
}

impl std::fmt::Display for CatCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, *self as u8)
    }
}

impl CatCode {
    /// The category code of a character before any assignment has been made.
    ///
    /// Unlisted code points, including all non-ASCII characters, are [Other].
    pub fn default_for(c: char) -> CatCode {
        match c {
            '\\' => Escape,
            '{' => BeginGroup,
            '}' => EndGroup,
            '$' => MathShift,
            '&' => AlignmentTab,
            '\n' | '\r' => EndOfLine,
            '#' => Parameter,
            '^' => Superscript,
            '_' => Subscript,
            '\u{0}' => Ignored,
            ' ' | '\t' => Space,
            'a'..='z' | 'A'..='Z' => Letter,
            '~' => Active,
            '%' => Comment,
            '\u{7F}' => Invalid,
            _ => Other,
        }
    }
}

/// A category code table with grouping semantics.
///
/// Only assignments are stored; every other character has its [default](CatCode::default_for)
///     category code.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatCodeTable {
    assignments: GroupingMap<char, CatCode>,
}

impl CatCodeTable {
    /// Returns the current category code of the character.
    #[inline]
    pub fn classify(&self, c: char) -> CatCode {
        match self.assignments.get(&c) {
            None => CatCode::default_for(c),
            Some(code) => *code,
        }
    }

    /// Sets the category code of the character in the provided scope.
    pub fn set_category(&mut self, c: char, code: CatCode, scope: Scope) {
        self.assignments.insert(c, code, scope);
    }

    /// Applies temporary category codes and returns the codes they replaced.
    ///
    /// The returned value must be passed back to [CatCodeTable::restore].
    pub fn apply_overrides(&mut self, overrides: &[(char, CatCode)]) -> SavedCatCodes {
        let mut saved = Vec::with_capacity(overrides.len());
        for (c, code) in overrides {
            saved.push((*c, self.classify(*c)));
            self.set_category(*c, *code, Scope::Local);
        }
        SavedCatCodes(saved)
    }

    /// Puts back category codes saved by [CatCodeTable::apply_overrides].
    pub fn restore(&mut self, saved: SavedCatCodes) {
        // Reverse order so that a character listed twice ends at its first saved value.
        for (c, code) in saved.0.into_iter().rev() {
            self.set_category(c, code, Scope::Local);
        }
    }

    pub(crate) fn begin_group(&mut self) {
        self.assignments.begin_group();
    }

    pub(crate) fn end_group(&mut self) {
        // The table's groups are opened and closed together with the binding map's,
        // which reports a missing group first.
        _ = self.assignments.end_group();
    }
}

/// Category codes replaced by [CatCodeTable::apply_overrides].
#[derive(Debug)]
#[must_use = "saved category codes must be restored"]
pub struct SavedCatCodes(Vec<(char, CatCode)>);

impl crate::token::lexer::CatCodeFn for CatCodeTable {
    #[inline]
    fn cat_code(&self, c: char) -> CatCode {
        self.classify(c)
    }
}
