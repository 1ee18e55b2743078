//! The lexer, which reads a stream of characters and outputs objects.
//!
//! The lexer is "just in time": it only produces the next object when that object is requested.
//! Lexing is controlled by category codes which can change while the input is being processed.
//! Consider the following snippet with default category codes:
//! ```tex
//! \makeatletter\my@macro
//! ```
//! If tokenized as a batch, the lexer would return `\makeatletter`, `\my`, `@` and `\macro`.
//! But `\makeatletter` changes `@` to a letter, and so the correct result is `\makeatletter`
//!     followed by the single control sequence `\my@macro`.
//! The lexer therefore consults the category code function for every character it reads.
use crate::catcode::CatCode;
use crate::token::{CommandRef, CsName, Object};

/// How end of line characters are tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EndOfLinePolicy {
    /// A single end of line is a space and a blank line is `\par`, as in TeX.
    #[default]
    Space,
    /// Every end of line produces an [Object::EndOfLine], for line oriented input.
    Token,
    /// Ends of line are dropped.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    InvalidCharacter(char),
    EmptyControlSequence,
    UnterminatedVerbatim,
}

pub trait CatCodeFn {
    fn cat_code(&self, c: char) -> CatCode;
}

impl CatCodeFn for std::collections::HashMap<char, CatCode> {
    fn cat_code(&self, c: char) -> CatCode {
        self.get(&c)
            .copied()
            .unwrap_or_else(|| CatCode::default_for(c))
    }
}

/// The lexer.
#[derive(Debug, Clone)]
pub struct Lexer {
    // Stored as characters so that caret notation can rewrite the source in place.
    source: Vec<char>,
    pos: usize,
    line: usize,
    trim_next_whitespace: bool,
    // Set when a whitespace run ending in a blank line has produced its space but not its `\par`.
    pending_par: bool,
    // Control sequence names are read into a shared buffer to avoid allocating for each one.
    buffer: String,
}

impl Lexer {
    pub fn new(source_code: &str) -> Lexer {
        Lexer {
            source: source_code.replace("\r\n", "\n").chars().collect(),
            pos: 0,
            line: 1,
            trim_next_whitespace: false,
            pending_par: false,
            buffer: Default::default(),
        }
    }

    /// The line number of the next character to be read, starting from 1.
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether all characters have been read.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.source.len() && !self.pending_par
    }

    pub fn next<F: CatCodeFn>(
        &mut self,
        cat_code_fn: &F,
        end_of_line: EndOfLinePolicy,
        retain_comments: bool,
    ) -> Result<Option<Object>, Error> {
        if self.pending_par {
            self.pending_par = false;
            self.trim_next_whitespace = true;
            return Ok(Some(Object::control_sequence("par")));
        }
        while let Some((c, code)) = self.raw_next(cat_code_fn) {
            let object = match code {
                CatCode::Escape => Object::CommandRef(CommandRef::ControlSequence(
                    self.read_control_sequence(cat_code_fn)?,
                )),
                CatCode::EndOfLine if end_of_line == EndOfLinePolicy::Ignore => continue,
                CatCode::EndOfLine if end_of_line == EndOfLinePolicy::Token => {
                    // Spaces at the start of the next line are skipped.
                    self.trim_next_whitespace = true;
                    return Ok(Some(Object::EndOfLine));
                }
                CatCode::EndOfLine | CatCode::Space => {
                    let num_new_lines = self.consume_whitespace(cat_code_fn, end_of_line)
                        + usize::from(code == CatCode::EndOfLine);
                    match (
                        end_of_line == EndOfLinePolicy::Space && num_new_lines >= 2,
                        self.trim_next_whitespace,
                    ) {
                        (true, true) => Object::control_sequence("par"),
                        // The line before the blank line still ends with a space.
                        (true, false) => {
                            self.pending_par = true;
                            Object::Space
                        }
                        (false, true) => continue,
                        (false, false) => Object::Space,
                    }
                }
                CatCode::Parameter => self.read_parameter(c, cat_code_fn),
                CatCode::Superscript => {
                    if self.maybe_apply_caret_notation(c, true) {
                        continue;
                    }
                    Object::Char(c, code)
                }
                CatCode::Active => Object::CommandRef(CommandRef::ActiveCharacter(c)),
                CatCode::Comment => {
                    let mut text = String::new();
                    while let Some((c, code)) = self.raw_peek(cat_code_fn) {
                        if code == CatCode::EndOfLine {
                            break;
                        }
                        text.push(c);
                        self.advance();
                    }
                    self.trim_next_whitespace = true;
                    if !retain_comments {
                        continue;
                    }
                    Object::Comment(text)
                }
                CatCode::Ignored => continue,
                CatCode::Invalid => return Err(Error::InvalidCharacter(c)),
                CatCode::BeginGroup
                | CatCode::EndGroup
                | CatCode::MathShift
                | CatCode::AlignmentTab
                | CatCode::Subscript
                | CatCode::Letter
                | CatCode::Other => Object::Char(c, code),
            };
            self.trim_next_whitespace = match &object {
                Object::CommandRef(CommandRef::ControlSequence(name)) => {
                    name.is_control_word() || name.as_str() == " "
                }
                Object::Comment(_) => true,
                _ => false,
            };
            return Ok(Some(object));
        }
        Ok(None)
    }

    /// Reads raw characters, bypassing tokenization.
    ///
    /// With an end marker, everything up to the marker is returned and the marker is consumed.
    /// Without one, the first character read (after any whitespace the lexer would skip anyway)
    ///     is the delimiter, as in `\verb|text|`.
    pub fn read_verbatim<F: CatCodeFn>(
        &mut self,
        cat_code_fn: &F,
        end: Option<&str>,
    ) -> Result<String, Error> {
        let end: Vec<char> = match end {
            Some(end) => end.chars().collect(),
            None => {
                if self.trim_next_whitespace {
                    while let Some((_, CatCode::Space)) = self.raw_peek(cat_code_fn) {
                        self.advance();
                    }
                }
                match self.raw_next(cat_code_fn) {
                    None => return Err(Error::UnterminatedVerbatim),
                    Some((c, _)) => vec![c],
                }
            }
        };
        self.trim_next_whitespace = false;
        let start = self.pos;
        let mut i = start;
        while i + end.len() <= self.source.len() {
            if self.source[i..i + end.len()] == end[..] {
                let text: String = self.source[start..i].iter().collect();
                while self.pos < i + end.len() {
                    self.advance();
                }
                return Ok(text);
            }
            i += 1;
        }
        Err(Error::UnterminatedVerbatim)
    }

    /// Inserts text in front of the unread input.
    pub fn push_front_text(&mut self, text: &str) {
        self.source.splice(self.pos..self.pos, text.chars());
        self.trim_next_whitespace = false;
    }

    fn read_parameter<F: CatCodeFn>(&mut self, c: char, cat_code_fn: &F) -> Object {
        match self.raw_peek(cat_code_fn) {
            Some((_, CatCode::Parameter)) => {
                self.advance();
                Object::DoubleParam
            }
            Some((d @ '1'..='9', _)) => {
                self.advance();
                Object::Param(d as u8 - b'0')
            }
            _ => Object::Char(c, CatCode::Parameter),
        }
    }

    fn consume_whitespace<F: CatCodeFn>(
        &mut self,
        cat_code_fn: &F,
        end_of_line: EndOfLinePolicy,
    ) -> usize {
        let mut num_new_lines: usize = 0;
        while let Some((_, code)) = self.raw_peek(cat_code_fn) {
            num_new_lines += match code {
                CatCode::Space => 0,
                CatCode::EndOfLine if end_of_line != EndOfLinePolicy::Token => 1,
                _ => break,
            };
            self.advance();
        }
        num_new_lines
    }

    fn read_control_sequence<F: CatCodeFn>(&mut self, cat_code_fn: &F) -> Result<CsName, Error> {
        self.buffer.clear();
        let (first_char, first_code) = match self.raw_next(cat_code_fn) {
            None => return Err(Error::EmptyControlSequence),
            Some(first) => first,
        };
        match first_code {
            CatCode::Letter => {
                self.buffer.push(first_char);
                while let Some((c, code)) = self.raw_peek(cat_code_fn) {
                    match code {
                        CatCode::Letter => {
                            self.advance();
                            self.buffer.push(c);
                        }
                        CatCode::Superscript => {
                            if self.maybe_apply_caret_notation(c, false) {
                                continue;
                            }
                            break;
                        }
                        _ => break,
                    }
                }
            }
            CatCode::Superscript => {
                if self.maybe_apply_caret_notation(first_char, true) {
                    return self.read_control_sequence(cat_code_fn);
                }
                self.buffer.push(first_char);
            }
            // An escape at the end of a line is a control space.
            CatCode::EndOfLine => self.buffer.push(' '),
            _ => self.buffer.push(first_char),
        };
        Ok(CsName::new(&self.buffer))
    }

    fn raw_next<F: CatCodeFn>(&mut self, cat_code_fn: &F) -> Option<(char, CatCode)> {
        let raw = self.raw_peek(cat_code_fn)?;
        self.advance();
        Some(raw)
    }

    #[inline]
    fn raw_peek<F: CatCodeFn>(&self, cat_code_fn: &F) -> Option<(char, CatCode)> {
        let c = *self.source.get(self.pos)?;
        Some((c, cat_code_fn.cat_code(c)))
    }

    fn maybe_apply_caret_notation(&mut self, char_1: char, char_1_consumed: bool) -> bool {
        let char_2_pos = if char_1_consumed {
            self.pos
        } else {
            self.pos + 1
        };
        if self.source.get(char_2_pos) != Some(&char_1) {
            return false;
        }
        let char_3 = match self.source.get(char_2_pos + 1) {
            // If the input is over, don't transform. This is what TeX does; see
            // the TeXBook section 355 and related sections.
            None => return false,
            Some(c) => *c,
        };
        if !char_1_consumed {
            self.advance();
        }
        self.advance();
        if !char_3.is_ascii() {
            return true;
        }
        let u = char_3 as u8;
        let m = if u < 0x40 { u + 0x40 } else { u - 0x40 };
        self.source[self.pos] = m as char;
        true
    }

    fn advance(&mut self) {
        if let Some(c) = self.source.get(self.pos) {
            if *c == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }
}
