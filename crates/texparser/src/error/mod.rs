//! Error handling
//!
//! Errors are structured data: a [Tag] that identifies the error,
//!     positional parameters that fill in the tag's message template,
//!     and an optional source [Location].
//! Messages are only formatted when the error is displayed,
//!     so an embedding application can localize them using [Tag::id].
//!
//! All fallible operations return [Result](crate::prelude::Result), which boxes the error.

pub mod display;

/// The broad category of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// Malformed input relative to the current grammar.
    ///
    /// For example, a missing closing brace or an undefined control sequence.
    Syntax,
    /// Well-formed input that is meaningless in context.
    ///
    /// For example, `\newcommand` on a name that is already defined.
    Semantic,
    /// An input could not be read, or a resource limit was hit.
    Resource,
}

/// A position in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub file: String,
    pub line: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

macro_rules! tags {
    ( $( $variant: ident, $kind: ident, $id: expr, $template: expr, )+ ) => {
        /// Identifies an error or warning.
        ///
        /// Each tag has a stable machine readable [id](Tag::id) and an English message
        ///     [template](Tag::template) with positional `{0}`, `{1}`, ... parameters.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Tag {
            $( $variant, )+
        }

        impl Tag {
            pub fn id(&self) -> &'static str {
                match self {
                    $( Tag::$variant => $id, )+
                }
            }

            pub fn template(&self) -> &'static str {
                match self {
                    $( Tag::$variant => $template, )+
                }
            }

            pub fn kind(&self) -> Kind {
                match self {
                    $( Tag::$variant => Kind::$kind, )+
                }
            }
        }
    };
}

tags!(
    UndefinedControlSequence, Syntax, "tex.error.undefined_cs",
        "undefined control sequence {0}",
    UnexpectedEndOfInput, Syntax, "tex.error.unexpected_eof",
        "unexpected end of input while {0}",
    MissingClosing, Syntax, "tex.error.missing_closing",
        "missing `{0}` before the end of the input",
    ParInArgument, Syntax, "tex.error.par_in_argument",
        "paragraph ended before the argument of {0} was complete",
    UnexpectedEndGroup, Syntax, "tex.error.unexpected_end_group",
        "unexpected {0}: there is no group to end",
    UnbalancedGroups, Syntax, "tex.error.unbalanced_groups",
        "{0} group(s) still open at the end of the input",
    GroupOpenedOutsideFile, Syntax, "tex.error.group_opened_outside_file",
        "cannot end a group that was opened before the current file was input (depth {0})",
    NumberExpected, Syntax, "tex.error.number_expected",
        "expected a number, found {0}",
    CsExpected, Syntax, "tex.error.cs_expected",
        "expected a control sequence, found {0}",
    ExpectedButFound, Syntax, "tex.error.expected_found",
        "expected {0}, found {1}",
    IllegalParameter, Syntax, "tex.error.illegal_param",
        "illegal parameter number #{0} in a macro definition",
    BadParameterText, Syntax, "tex.error.bad_param_text",
        "parameters must be numbered consecutively: found #{0} where #{1} was expected",
    MacroMismatch, Syntax, "tex.error.macro_mismatch",
        "use of {0} does not match its definition",
    InvalidCharacter, Syntax, "tex.error.invalid_char",
        "invalid character {0} in the input",
    EmptyControlSequence, Syntax, "tex.error.empty_cs",
        "escape character at the end of the input",
    UnterminatedVerbatim, Syntax, "tex.error.unterminated_verb",
        "verbatim text for {0} is not terminated",
    UnexpectedParameter, Syntax, "tex.error.unexpected_param",
        "parameter token {0} is not allowed here",
    UnsupportedArgSpec, Syntax, "tex.error.unsupported_arg_spec",
        "unsupported argument specifier `{0}`",
    CannotBePrefixed, Syntax, "tex.error.cannot_be_prefixed",
        "{0} cannot be prefixed by {1}",
    ExtraCommand, Syntax, "tex.error.extra_command",
        "extra {0}",
    EnvironmentMismatch, Syntax, "tex.error.environment_mismatch",
        "\\begin{0} ended by \\end{1}",
    AlreadyDefined, Semantic, "tex.error.already_defined",
        "command {0} is already defined",
    NotDefined, Semantic, "tex.error.not_defined",
        "command {0} is not defined",
    UndefinedEnvironment, Semantic, "tex.error.undefined_environment",
        "environment {0} is not defined",
    DivisionByZero, Semantic, "tex.error.division_by_zero",
        "division by zero in {0}",
    InvalidCatCode, Semantic, "tex.error.invalid_catcode",
        "invalid category code {0}: must be between 0 and 15",
    CharCodeOutOfRange, Semantic, "tex.error.char_code_out_of_range",
        "character code {0} is out of range",
    NumberOutOfRange, Semantic, "tex.error.number_out_of_range",
        "number {0} is out of range",
    Io, Resource, "tex.error.io",
        "could not read {0}: {1}",
    Decode, Resource, "tex.error.decode",
        "could not decode {0} as {1}",
    CapacityExceeded, Resource, "tex.error.capacity_exceeded",
        "capacity exceeded: {0} (limit {1})",
    FileNotFound, Resource, "tex.warning.file_not_found",
        "file {0} not found",
    User, Semantic, "tex.warning.user",
        "{0}",
);

/// Substitutes positional parameters into a template.
///
/// Placeholders without a corresponding parameter are kept as is.
pub fn format_template(template: &str, params: &[String]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let param = after.find('}').and_then(|end| {
            after[..end]
                .parse::<usize>()
                .ok()
                .and_then(|i| params.get(i))
                .map(|param| (end, param))
        });
        match param {
            Some((end, param)) => {
                result.push_str(param);
                rest = &after[end + 1..];
            }
            None => {
                result.push('{');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

/// An error in TeX source code or in the environment the source code is run in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Error {
    pub kind: Kind,
    pub tag: Tag,
    pub params: Vec<String>,
    pub location: Option<Location>,
    pub notes: Vec<String>,
}

impl Error {
    pub fn new<I, P>(tag: Tag, params: I) -> Error
    where
        I: IntoIterator<Item = P>,
        P: ToString,
    {
        Error {
            kind: tag.kind(),
            tag,
            params: params.into_iter().map(|p| p.to_string()).collect(),
            location: None,
            notes: vec![],
        }
    }

    pub fn with_location(mut self, location: Option<Location>) -> Error {
        if self.location.is_none() {
            self.location = location;
        }
        self
    }

    pub fn with_note<N: Into<String>>(mut self, note: N) -> Error {
        self.notes.push(note.into());
        self
    }

    /// The error message with all parameters substituted.
    pub fn message(&self) -> String {
        format_template(self.tag.template(), &self.params)
    }

    /// Whether the error aborts the whole run even when error recovery is enabled.
    pub fn is_fatal(&self) -> bool {
        self.kind == Kind::Resource || self.tag == Tag::UnbalancedGroups
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display::format_error(f, self)
    }
}

impl std::error::Error for Error {}

/// A diagnostic that is reported but does not stop processing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Warning {
    pub tag: Tag,
    pub params: Vec<String>,
    pub location: Option<Location>,
}

impl Warning {
    pub fn message(&self) -> String {
        format_template(self.tag.template(), &self.params)
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display::format_warning(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_template_substitutes_parameters() {
        let params = vec!["\\foo".to_string(), "2".to_string()];
        assert_eq!(
            format_template("expected {1} arguments for {0}", &params),
            "expected 2 arguments for \\foo"
        );
    }

    #[test]
    fn format_template_keeps_unknown_placeholders() {
        let params = vec!["a".to_string()];
        assert_eq!(format_template("{0} {3} {x} {", &params), "a {3} {x} {");
    }

    #[test]
    fn message_and_kind() {
        let error = Error::new(Tag::AlreadyDefined, ["\\foo"]);
        assert_eq!(error.kind, Kind::Semantic);
        assert_eq!(error.message(), "command \\foo is already defined");
        assert_eq!(error.tag.id(), "tex.error.already_defined");
        assert!(!error.is_fatal());
    }

    #[test]
    fn fatal_errors() {
        assert!(Error::new(Tag::Io, ["a.tex", "denied"]).is_fatal());
        assert!(Error::new(Tag::UnbalancedGroups, [1]).is_fatal());
        assert!(!Error::new(Tag::MissingClosing, ["}"]).is_fatal());
    }

    #[test]
    fn location_is_set_once() {
        let first = Some(Location {
            file: "a.tex".into(),
            line: 3,
        });
        let second = Some(Location {
            file: "b.tex".into(),
            line: 4,
        });
        let error = Error::new(Tag::CsExpected, ["a"])
            .with_location(first.clone())
            .with_location(second);
        assert_eq!(error.location, first);
    }
}
