//! The object model: tokens, groups and lists of objects.
//!
//! The lexer produces flat tokens.
//! When commands read arguments, balanced `{...}` runs are assembled into
//!     [Object::Group] values, so a macro definition or an argument is a tree.
//! Objects are plain values: cloning an [ObjectList] produces a fully independent tree.
use std::collections::VecDeque;
use std::rc::Rc;

use crate::catcode::CatCode;

pub mod lexer;

/// The name of a control sequence, without the escape character.
///
/// Names are immutable, so cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsName(Rc<str>);

impl CsName {
    pub fn new(name: &str) -> CsName {
        CsName(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a control word, i.e. a name made of letters.
    ///
    /// Names of one non-letter character are control symbols.
    pub fn is_control_word(&self) -> bool {
        let mut chars = self.0.chars();
        match (chars.next(), chars.next()) {
            (None, _) => false,
            (Some(c), None) => c.is_alphabetic(),
            _ => true,
        }
    }
}

impl From<&str> for CsName {
    fn from(name: &str) -> Self {
        CsName::new(name)
    }
}

impl std::fmt::Display for CsName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CsName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CsName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(CsName::new(&name))
    }
}

/// A reference to something that may be bound to a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandRef {
    ControlSequence(CsName),
    ActiveCharacter(char),
}

impl CommandRef {
    /// Returns a reference to the control sequence with the given name.
    pub fn control_sequence(name: &str) -> CommandRef {
        CommandRef::ControlSequence(CsName::new(name))
    }

    /// The name without the escape character.
    pub fn name(&self) -> String {
        match self {
            CommandRef::ControlSequence(name) => name.as_str().to_string(),
            CommandRef::ActiveCharacter(c) => c.to_string(),
        }
    }
}

impl std::fmt::Display for CommandRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandRef::ControlSequence(name) => write!(f, "\\{name}"),
            CommandRef::ActiveCharacter(c) => write!(f, "{c}"),
        }
    }
}

/// How a group object was delimited in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupKind {
    /// A `{...}` group.
    Brace,
    /// Contents read between a custom delimiter pair, like `[...]`.
    ///
    /// Processing such a group does not begin a new scope.
    Delimited(char, char),
}

/// The smallest unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Object {
    /// A character token with its category code.
    Char(char, CatCode),
    /// A control sequence or active character.
    CommandRef(CommandRef),
    /// A list of objects assembled from balanced delimiters.
    Group(ObjectList, GroupKind),
    /// A macro parameter `#n`, with n between 1 and 9.
    Param(u8),
    /// The sequence `##`, which becomes a single parameter character when a macro is expanded.
    DoubleParam,
    Space,
    EndOfLine,
    /// A comment, only produced when comments are retained.
    Comment(String),
    /// A number produced by a command.
    Number(i64),
    /// A string produced by a command.
    Text(String),
    /// A flag produced by a command, like the star in `\section*`.
    Boolean(bool),
}

/// Text that represents an absent optional argument.
pub const NO_VALUE: &str = "-NoValue-";

impl Object {
    #[inline]
    pub fn letter(c: char) -> Object {
        Object::Char(c, CatCode::Letter)
    }

    #[inline]
    pub fn other(c: char) -> Object {
        Object::Char(c, CatCode::Other)
    }

    pub fn control_sequence(name: &str) -> Object {
        Object::CommandRef(CommandRef::control_sequence(name))
    }

    pub fn active_character(c: char) -> Object {
        Object::CommandRef(CommandRef::ActiveCharacter(c))
    }

    /// A brace group holding the provided list.
    pub fn group(list: ObjectList) -> Object {
        Object::Group(list, GroupKind::Brace)
    }

    /// Whether this object is skipped when looking for the next argument.
    #[inline]
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Object::Space | Object::EndOfLine | Object::Comment(_))
    }

    pub fn command_ref(&self) -> Option<&CommandRef> {
        match self {
            Object::CommandRef(command_ref) => Some(command_ref),
            _ => None,
        }
    }

    /// The character of a character token.
    pub fn char(&self) -> Option<char> {
        match self {
            Object::Char(c, _) => Some(*c),
            _ => None,
        }
    }

    pub fn cat_code(&self) -> Option<CatCode> {
        match self {
            Object::Char(_, code) => Some(*code),
            Object::Space => Some(CatCode::Space),
            _ => None,
        }
    }

    /// Whether this is a character token for the character `c` that is not a group delimiter.
    pub fn is_char(&self, c: char) -> bool {
        match self {
            Object::Char(d, code) => {
                *d == c && !matches!(code, CatCode::BeginGroup | CatCode::EndGroup)
            }
            _ => false,
        }
    }

    /// Whether this object is the `\par` control sequence.
    pub fn is_par(&self) -> bool {
        match self {
            Object::CommandRef(CommandRef::ControlSequence(name)) => name.as_str() == "par",
            _ => false,
        }
    }

    /// Whether `\par` appears in this object, including inside nested groups.
    pub fn contains_par(&self) -> bool {
        match self {
            Object::Group(list, _) => list.iter().any(Object::contains_par),
            _ => self.is_par(),
        }
    }

    /// Converts an argument into the list it stands for.
    ///
    /// Groups unwrap to their contents, leaves are converted to character tokens,
    ///     and any other object becomes a list of one.
    pub fn into_list(self) -> ObjectList {
        match self {
            Object::Group(list, _) => list,
            Object::Number(n) => text_to_list(&n.to_string()),
            Object::Text(text) => text_to_list(&text),
            Object::Boolean(b) => {
                let mut list = ObjectList::new();
                list.push_back(Object::control_sequence(boolean_cs_name(b)));
                list
            }
            other => {
                let mut list = ObjectList::new();
                list.push_back(other);
                list
            }
        }
    }
}

fn boolean_cs_name(b: bool) -> &'static str {
    if b {
        "BooleanTrue"
    } else {
        "BooleanFalse"
    }
}

/// Converts a string to character tokens.
///
/// Spaces become [Object::Space] and every other character gets category code [Other](CatCode::Other),
///     which is how TeX's `\string` and `\detokenize` represent text.
pub fn text_to_list(text: &str) -> ObjectList {
    text.chars()
        .map(|c| match c {
            ' ' => Object::Space,
            c => Object::other(c),
        })
        .collect()
}

impl std::fmt::Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::new();
        write_object(&mut s, self, None);
        write!(f, "{s}")
    }
}

/// An ordered, double ended sequence of objects.
///
/// The list is both a container (the result of an expansion) and a cursor over remaining
///     input: objects are consumed from the front and pushed back onto the front.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectList(VecDeque<Object>);

impl ObjectList {
    pub fn new() -> ObjectList {
        ObjectList(VecDeque::new())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn front(&self) -> Option<&Object> {
        self.0.front()
    }

    #[inline]
    pub fn back(&self) -> Option<&Object> {
        self.0.back()
    }

    #[inline]
    pub fn push_front(&mut self, object: Object) {
        self.0.push_front(object)
    }

    #[inline]
    pub fn push_back(&mut self, object: Object) {
        self.0.push_back(object)
    }

    #[inline]
    pub fn pop_front(&mut self) -> Option<Object> {
        self.0.pop_front()
    }

    #[inline]
    pub fn pop_back(&mut self) -> Option<Object> {
        self.0.pop_back()
    }

    /// Pops the first object that is not whitespace, discarding the whitespace before it.
    pub fn pop_front_skip_whitespace(&mut self) -> Option<Object> {
        while let Some(object) = self.0.pop_front() {
            if !object.is_whitespace() {
                return Some(object);
            }
        }
        None
    }

    /// Inserts the whole of `other` in front of this list.
    ///
    /// After the call the first element of this list is the first element of `other`.
    pub fn splice_front(&mut self, mut other: ObjectList) {
        if other.0.len() < self.0.len() {
            while let Some(object) = other.0.pop_back() {
                self.0.push_front(object);
            }
        } else {
            other.0.append(&mut self.0);
            self.0 = other.0;
        }
    }

    /// Moves all of `other` to the back of this list.
    pub fn append(&mut self, mut other: ObjectList) {
        self.0.append(&mut other.0);
    }

    /// Removes leading and trailing whitespace.
    pub fn trim_whitespace(&mut self) {
        while matches!(self.0.front(), Some(o) if o.is_whitespace()) {
            self.0.pop_front();
        }
        while matches!(self.0.back(), Some(o) if o.is_whitespace()) {
            self.0.pop_back();
        }
    }

    /// Whether every object in the list is whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(Object::is_whitespace)
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Object> {
        self.0.iter()
    }

    pub fn get(&self, i: usize) -> Option<&Object> {
        self.0.get(i)
    }

    /// Whether the list ends with the objects in `suffix`.
    pub fn ends_with(&self, suffix: &ObjectList) -> bool {
        if suffix.len() > self.len() {
            return false;
        }
        self.0
            .iter()
            .skip(self.len() - suffix.len())
            .zip(suffix.0.iter())
            .all(|(a, b)| a == b)
    }

    /// Removes the last `n` objects.
    pub fn truncate_back(&mut self, n: usize) {
        let len = self.0.len().saturating_sub(n);
        self.0.truncate(len);
    }
}

impl FromIterator<Object> for ObjectList {
    fn from_iter<T: IntoIterator<Item = Object>>(iter: T) -> Self {
        ObjectList(iter.into_iter().collect())
    }
}

impl From<Vec<Object>> for ObjectList {
    fn from(objects: Vec<Object>) -> Self {
        ObjectList(objects.into())
    }
}

impl Extend<Object> for ObjectList {
    fn extend<T: IntoIterator<Item = Object>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl IntoIterator for ObjectList {
    type Item = Object;
    type IntoIter = std::collections::vec_deque::IntoIter<Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObjectList {
    type Item = &'a Object;
    type IntoIter = std::collections::vec_deque::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for ObjectList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", write_objects(self))
    }
}

/// Renders objects as TeX source.
///
/// A space is written after a control word when the next object is a letter,
///     so that the output can be read back in.
pub fn write_objects<'a, I: IntoIterator<Item = &'a Object>>(objects: I) -> String {
    let mut s = String::new();
    let mut iter = objects.into_iter().peekable();
    while let Some(object) = iter.next() {
        write_object(&mut s, object, iter.peek().copied());
    }
    s
}

/// Renders a single object as it would appear before `next` in [write_objects].
pub(crate) fn render_object(object: &Object, next: Option<&Object>) -> String {
    let mut s = String::new();
    write_object(&mut s, object, next);
    s
}

fn write_object(s: &mut String, object: &Object, next: Option<&Object>) {
    match object {
        Object::Char(c, _) => s.push(*c),
        Object::CommandRef(CommandRef::ControlSequence(name)) => {
            s.push('\\');
            s.push_str(name.as_str());
            if name.is_control_word() && matches!(next, Some(Object::Char(_, CatCode::Letter))) {
                s.push(' ');
            }
        }
        Object::CommandRef(CommandRef::ActiveCharacter(c)) => s.push(*c),
        Object::Group(list, kind) => {
            let (open, close) = match kind {
                GroupKind::Brace => ('{', '}'),
                GroupKind::Delimited(open, close) => (*open, *close),
            };
            s.push(open);
            s.push_str(&write_objects(list));
            s.push(close);
        }
        Object::Param(n) => {
            s.push('#');
            s.push_str(&n.to_string());
        }
        Object::DoubleParam => s.push_str("##"),
        Object::Space => s.push(' '),
        Object::EndOfLine => s.push('\n'),
        Object::Comment(text) => {
            s.push('%');
            s.push_str(text);
            s.push('\n');
        }
        Object::Number(n) => s.push_str(&n.to_string()),
        Object::Text(text) => s.push_str(text),
        Object::Boolean(b) => {
            s.push('\\');
            s.push_str(boolean_cs_name(*b));
        }
    }
}
