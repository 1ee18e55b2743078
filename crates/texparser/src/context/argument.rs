//! Argument styles and the functions that pop arguments from a context.
//!
//! All functions here are written against `&mut dyn Context<S>` only,
//!     so they behave identically in live mode and in list mode.
use super::Context;
use crate::catcode::CatCode;
use crate::command::Command;
use crate::error::{Error, Tag};
use crate::prelude::Result;
use crate::session::SessionState;
use crate::token::{self, CommandRef, GroupKind, Object, ObjectList, NO_VALUE};

/// The ways in which a command can read an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentStyle {
    /// A brace group or a single object, after skipping whitespace.
    ///
    /// The argument may not contain `\par`.
    MandatoryBrace,
    /// Like [ArgumentStyle::MandatoryBrace], but the argument may span paragraphs.
    MandatoryBraceLong,
    /// An optional `[...]` argument.
    ///
    /// When absent, the default is returned if there is one,
    ///     and otherwise the [NO_VALUE] marker.
    /// Unless the argument is long it may not contain `\par`.
    OptionalBracket {
        default: Option<ObjectList>,
        long: bool,
    },
    /// An argument between a custom pair of delimiters, like `(...)`.
    Delimited {
        open: char,
        close: char,
        default: Option<ObjectList>,
        required: bool,
        long: bool,
    },
    /// Everything up to the delimiter, as for TeX macro parameters like `#1.`.
    ///
    /// Leading whitespace is kept.
    /// If the argument is a single brace group, the braces are removed.
    UntilTokens { delimiter: ObjectList, long: bool },
    /// Raw text read without tokenization.
    ///
    /// With no end marker, the next character delimits the text, as in `\verb|text|`.
    Verbatim { end: Option<String> },
    /// A TeX number: optional signs, then decimal digits, `'` octal, `"` hex or `` ` `` character code.
    Numeric,
    /// A brace group that is fully expanded and then converted to text.
    ///
    /// A lone control sequence becomes its name.
    Label,
    /// Whether the next non-whitespace object is `*`.
    StarModifier,
    /// Whether the next non-whitespace object is the given character.
    TokenModifier(char),
}

impl std::fmt::Display for ArgumentStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgumentStyle::MandatoryBrace => write!(f, "mandatory"),
            ArgumentStyle::MandatoryBraceLong => write!(f, "mandatory, long"),
            ArgumentStyle::OptionalBracket { default: None, .. } => write!(f, "optional `[...]`"),
            ArgumentStyle::OptionalBracket {
                default: Some(default),
                ..
            } => write!(f, "optional `[...]` with default `{default}`"),
            ArgumentStyle::Delimited {
                open,
                close,
                required,
                ..
            } => {
                let kind = if *required { "required" } else { "optional" };
                write!(f, "{kind} `{open}...{close}`")
            }
            ArgumentStyle::UntilTokens { delimiter, .. } => write!(f, "delimited by `{delimiter}`"),
            ArgumentStyle::Verbatim { end: None } => write!(f, "verbatim"),
            ArgumentStyle::Verbatim { end: Some(end) } => write!(f, "verbatim until `{end}`"),
            ArgumentStyle::Numeric => write!(f, "number"),
            ArgumentStyle::Label => write!(f, "label"),
            ArgumentStyle::StarModifier => write!(f, "optional `*`"),
            ArgumentStyle::TokenModifier(c) => write!(f, "optional `{c}`"),
        }
    }
}

pub fn pop_argument<S: SessionState>(
    ctx: &mut dyn Context<S>,
    style: &ArgumentStyle,
) -> Result<Object> {
    match style {
        ArgumentStyle::MandatoryBrace => pop_mandatory(ctx, false),
        ArgumentStyle::MandatoryBraceLong => pop_mandatory(ctx, true),
        ArgumentStyle::OptionalBracket { default, long } => {
            pop_delimited(ctx, '[', ']', default.as_ref(), false, *long)
        }
        ArgumentStyle::Delimited {
            open,
            close,
            default,
            required,
            long,
        } => pop_delimited(ctx, *open, *close, default.as_ref(), *required, *long),
        ArgumentStyle::UntilTokens { delimiter, long } => pop_until(ctx, delimiter, *long),
        ArgumentStyle::Verbatim { end } => Ok(Object::Text(ctx.read_verbatim(end.as_deref())?)),
        ArgumentStyle::Numeric => Ok(Object::Number(pop_number(ctx)?)),
        ArgumentStyle::Label => pop_label(ctx),
        ArgumentStyle::StarModifier => pop_modifier(ctx, '*'),
        ArgumentStyle::TokenModifier(c) => pop_modifier(ctx, *c),
    }
}

/// Pops the next object, assembling a `{...}` run into a group object.
pub fn pop_raw_object<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<Option<Object>> {
    match ctx.next_raw()? {
        Some(Object::Char(_, CatCode::BeginGroup)) => Ok(Some(Object::group(finish_group(ctx)?))),
        other => Ok(other),
    }
}

/// Like [pop_raw_object], but skips leading whitespace.
pub fn pop_object<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<Option<Object>> {
    skip_whitespace(ctx)?;
    pop_raw_object(ctx)
}

/// Pops an optional argument between the delimiters.
///
/// If the next non-whitespace object is not the opening delimiter,
///     nothing at all is consumed and [None] is returned.
/// The argument may not contain `\par`.
pub fn pop_optional<S: SessionState>(
    ctx: &mut dyn Context<S>,
    open: char,
    close: char,
) -> Result<Option<Object>> {
    pop_optional_impl(ctx, open, close, false)
}

fn pop_optional_impl<S: SessionState>(
    ctx: &mut dyn Context<S>,
    open: char,
    close: char,
    long: bool,
) -> Result<Option<Object>> {
    let skipped = skip_whitespace(ctx)?;
    if !matches!(ctx.peek_raw()?, Some(object) if object.is_char(open)) {
        restore(ctx, skipped);
        return Ok(None);
    }
    ctx.next_raw()?;
    let mut contents = ObjectList::new();
    loop {
        match pop_raw_object(ctx)? {
            Some(object) if object.is_char(close) => break,
            Some(object @ Object::Char(_, CatCode::EndGroup)) => {
                ctx.push_front(object);
                return Err(ctx.report_error(Tag::MissingClosing, vec![close.to_string()]));
            }
            Some(object) => contents.push_back(object),
            None => return Err(ctx.report_error(Tag::MissingClosing, vec![close.to_string()])),
        }
    }
    if !long && contents.iter().any(Object::contains_par) {
        return Err(par_in_argument(ctx));
    }
    Ok(Some(Object::Group(contents, GroupKind::Delimited(open, close))))
}

/// Reads the rest of a group whose begin group character has already been consumed.
///
/// Nested groups are assembled into group objects.
pub fn finish_group<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<ObjectList> {
    let mut stack: Vec<ObjectList> = vec![ObjectList::new()];
    loop {
        match ctx.next_raw()? {
            None => return Err(ctx.report_error(Tag::MissingClosing, vec!["}".to_string()])),
            Some(Object::Char(_, CatCode::BeginGroup)) => stack.push(ObjectList::new()),
            Some(Object::Char(_, CatCode::EndGroup)) => {
                let done = stack.pop().unwrap_or_default();
                match stack.last_mut() {
                    None => return Ok(done),
                    Some(parent) => parent.push_back(Object::group(done)),
                }
            }
            Some(object) => {
                if let Some(current) = stack.last_mut() {
                    current.push_back(object);
                }
            }
        }
    }
}

/// Pops a TeX number.
pub fn pop_number<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<i64> {
    let mut negative = false;
    let first = loop {
        let object = match ctx.next_expanded()? {
            None => return Err(end_of_input(ctx, "reading a number")),
            Some(object) => object,
        };
        match object {
            object if object.is_whitespace() => continue,
            Object::Char('-', CatCode::Other) => negative = !negative,
            Object::Char('+', CatCode::Other) => {}
            object => break object,
        }
    };
    let value = match first {
        Object::Number(n) => n,
        Object::Char('\'', CatCode::Other) => read_digits(ctx, 8, None)?,
        Object::Char('"', CatCode::Other) => read_digits(ctx, 16, None)?,
        Object::Char('`', CatCode::Other) => {
            let c = match ctx.next_raw()? {
                Some(Object::Char(c, _)) => c,
                Some(Object::Space) => ' ',
                Some(Object::CommandRef(CommandRef::ActiveCharacter(c))) => c,
                Some(Object::CommandRef(CommandRef::ControlSequence(name))) => {
                    let mut chars = name.as_str().chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => {
                            return Err(ctx.report_error(
                                Tag::NumberExpected,
                                vec![format!("\\{name}")],
                            ))
                        }
                    }
                }
                Some(other) => {
                    return Err(ctx.report_error(Tag::NumberExpected, vec![other.to_string()]))
                }
                None => return Err(end_of_input(ctx, "reading a character code")),
            };
            if matches!(ctx.peek_raw()?, Some(Object::Space)) {
                ctx.next_raw()?;
            }
            c as i64
        }
        Object::Char(c, CatCode::Other) if c.is_ascii_digit() => {
            read_digits(ctx, 10, Some(c as i64 - '0' as i64))?
        }
        Object::CommandRef(command_ref) => match register_index(ctx, &command_ref) {
            Some(index) => ctx.session().register(index),
            None => return Err(not_a_number(ctx, Object::CommandRef(command_ref))),
        },
        other => return Err(not_a_number(ctx, other)),
    };
    Ok(if negative { -value } else { value })
}

fn not_a_number<S: SessionState>(ctx: &mut dyn Context<S>, found: Object) -> Box<Error> {
    let text = found.to_string();
    ctx.push_front(found);
    ctx.report_error(Tag::NumberExpected, vec![text])
}

/// The index of the register the command reference is bound to, if it is bound to one.
pub fn register_index<S: SessionState>(
    ctx: &dyn Context<S>,
    command_ref: &CommandRef,
) -> Option<usize> {
    match ctx.resolve(command_ref)?.command {
        Command::Register(index) => Some(index),
        _ => None,
    }
}

fn read_digits<S: SessionState>(
    ctx: &mut dyn Context<S>,
    radix: u32,
    initial: Option<i64>,
) -> Result<i64> {
    let mut value = initial.unwrap_or(0);
    let mut num_digits = usize::from(initial.is_some());
    while let Some(object) = ctx.next_expanded()? {
        let digit = match &object {
            Object::Char(c, CatCode::Other | CatCode::Letter) => digit_value(*c, radix),
            _ => None,
        };
        match digit {
            Some(d) => {
                value = match value
                    .checked_mul(radix as i64)
                    .and_then(|v| v.checked_add(d))
                {
                    None => {
                        return Err(ctx.report_error(
                            Tag::NumberOutOfRange,
                            vec![format!("{value}{}...", object)],
                        ))
                    }
                    Some(value) => value,
                };
                num_digits += 1;
            }
            None => {
                // A single space after a number is part of the number.
                if object != Object::Space {
                    ctx.push_front(object);
                }
                break;
            }
        }
    }
    if num_digits == 0 {
        let found = match ctx.peek_raw()? {
            None => "the end of the input".to_string(),
            Some(object) => object.to_string(),
        };
        return Err(ctx.report_error(Tag::NumberExpected, vec![found]));
    }
    Ok(value)
}

fn digit_value(c: char, radix: u32) -> Option<i64> {
    // Hexadecimal digits must be uppercase, as in TeX.
    if radix == 16 && c.is_ascii_lowercase() {
        return None;
    }
    c.to_digit(radix).map(i64::from)
}

fn pop_mandatory<S: SessionState>(ctx: &mut dyn Context<S>, long: bool) -> Result<Object> {
    let object = match pop_object(ctx)? {
        None => return Err(end_of_input(ctx, &reading_argument(ctx))),
        Some(object) => object,
    };
    if let Object::Char(c, CatCode::EndGroup) = object {
        ctx.push_front(object);
        return Err(ctx.report_error(
            Tag::ExpectedButFound,
            vec!["an argument".to_string(), c.to_string()],
        ));
    }
    if !long && object.contains_par() {
        return Err(par_in_argument(ctx));
    }
    Ok(object)
}

fn pop_delimited<S: SessionState>(
    ctx: &mut dyn Context<S>,
    open: char,
    close: char,
    default: Option<&ObjectList>,
    required: bool,
    long: bool,
) -> Result<Object> {
    if let Some(object) = pop_optional_impl(ctx, open, close, long)? {
        return Ok(object);
    }
    if required {
        let found = match ctx.peek_raw()? {
            None => "the end of the input".to_string(),
            Some(object) => object.to_string(),
        };
        return Err(ctx.report_error(Tag::ExpectedButFound, vec![open.to_string(), found]));
    }
    Ok(match default {
        Some(default) => Object::Group(default.clone(), GroupKind::Delimited(open, close)),
        None => Object::Text(NO_VALUE.to_string()),
    })
}

fn pop_until<S: SessionState>(
    ctx: &mut dyn Context<S>,
    delimiter: &ObjectList,
    long: bool,
) -> Result<Object> {
    let mut collected = ObjectList::new();
    loop {
        let object = match pop_raw_object(ctx)? {
            None => return Err(end_of_input(ctx, &reading_argument(ctx))),
            Some(object) => object,
        };
        if let Object::Char(c, CatCode::EndGroup) = object {
            ctx.push_front(object);
            return Err(ctx.report_error(
                Tag::ExpectedButFound,
                vec![format!("`{delimiter}`"), c.to_string()],
            ));
        }
        let is_par = object.contains_par();
        collected.push_back(object);
        if collected.ends_with(delimiter) {
            collected.truncate_back(delimiter.len());
            break;
        }
        if !long && is_par {
            return Err(par_in_argument(ctx));
        }
    }
    if collected.len() == 1 && matches!(collected.front(), Some(Object::Group(_, GroupKind::Brace)))
    {
        if let Some(group) = collected.pop_front() {
            return Ok(group);
        }
    }
    Ok(Object::group(collected))
}

fn pop_label<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<Object> {
    let argument = pop_mandatory(ctx, false)?;
    let mut expanded = ctx.expand_fully(argument.into_list())?;
    expanded.trim_whitespace();
    let text = match (expanded.len(), expanded.front()) {
        (1, Some(Object::CommandRef(CommandRef::ControlSequence(name)))) => {
            name.as_str().to_string()
        }
        _ => token::write_objects(&expanded),
    };
    Ok(Object::Text(text))
}

fn pop_modifier<S: SessionState>(ctx: &mut dyn Context<S>, c: char) -> Result<Object> {
    let skipped = skip_whitespace(ctx)?;
    if matches!(ctx.peek_raw()?, Some(object) if object.is_char(c)) {
        ctx.next_raw()?;
        return Ok(Object::Boolean(true));
    }
    restore(ctx, skipped);
    Ok(Object::Boolean(false))
}

fn skip_whitespace<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<ObjectList> {
    let mut skipped = ObjectList::new();
    while matches!(ctx.peek_raw()?, Some(object) if object.is_whitespace()) {
        if let Some(object) = ctx.next_raw()? {
            skipped.push_back(object);
        }
    }
    Ok(skipped)
}

fn restore<S: SessionState>(ctx: &mut dyn Context<S>, skipped: ObjectList) {
    for object in skipped.into_iter().rev() {
        ctx.push_front(object);
    }
}

fn reading_argument<S: SessionState>(ctx: &dyn Context<S>) -> String {
    match ctx.session().current_command() {
        None => "reading an argument".to_string(),
        Some(command_ref) => format!("reading an argument for {command_ref}"),
    }
}

fn end_of_input<S: SessionState>(ctx: &dyn Context<S>, doing: &str) -> Box<crate::error::Error> {
    ctx.report_error(Tag::UnexpectedEndOfInput, vec![doing.to_string()])
}

fn par_in_argument<S: SessionState>(ctx: &dyn Context<S>) -> Box<crate::error::Error> {
    let name = match ctx.session().current_command() {
        None => "a command".to_string(),
        Some(command_ref) => command_ref.to_string(),
    };
    ctx.report_error(Tag::ParInArgument, vec![name])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ListContext, LiveContext};
    use crate::session::Session;
    use std::collections::HashMap;

    fn rest(ctx: &mut dyn Context<()>) -> String {
        let mut remaining = ObjectList::new();
        while let Some(object) = ctx.next_raw().unwrap() {
            remaining.push_back(object);
        }
        token::write_objects(&remaining)
    }

    /// Runs the check against a live context and a list context over the same input.
    fn in_both_modes(input: &str, check: impl Fn(&mut dyn Context<()>)) {
        let mut session = Session::<()>::new(HashMap::new());
        session.push_source("input.tex", input).unwrap();
        check(&mut LiveContext::new(&mut session));

        let mut session = Session::<()>::new(HashMap::new());
        let mut list = session.tokenize(input).unwrap();
        check(&mut ListContext::new(&mut session, &mut list));
    }

    fn pop(ctx: &mut dyn Context<()>, style: ArgumentStyle) -> Object {
        ctx.pop_argument(&style).unwrap()
    }

    #[test]
    fn brace_argument_consumes_exactly_the_balanced_span() {
        in_both_modes("{a{b}{c{d}}}rest {x}", |ctx| {
            let argument = pop(ctx, ArgumentStyle::MandatoryBrace);
            assert_eq!(argument.to_string(), "{a{b}{c{d}}}");
            assert_eq!(rest(ctx), "rest {x}");
        });
    }

    #[test]
    fn single_object_argument() {
        in_both_modes("  x{y}", |ctx| {
            assert_eq!(pop(ctx, ArgumentStyle::MandatoryBrace), Object::letter('x'));
            assert_eq!(rest(ctx), "{y}");
        });
    }

    #[test]
    fn missing_closing_brace() {
        in_both_modes("{a{b}", |ctx| {
            let err = ctx.pop_argument(&ArgumentStyle::MandatoryBrace).unwrap_err();
            assert_eq!(err.tag, Tag::MissingClosing);
        });
    }

    #[test]
    fn par_in_short_argument() {
        in_both_modes("{a{\n\nb}}", |ctx| {
            let err = ctx.pop_argument(&ArgumentStyle::MandatoryBrace).unwrap_err();
            assert_eq!(err.tag, Tag::ParInArgument);
        });
        in_both_modes("{a{\n\nb}}", |ctx| {
            let argument = pop(ctx, ArgumentStyle::MandatoryBraceLong);
            assert_eq!(argument.to_string(), "{a{\\par b}}");
        });
    }

    #[test]
    fn optional_argument_absent_consumes_nothing() {
        in_both_modes(" {x}", |ctx| {
            assert_eq!(ctx.pop_optional('[', ']').unwrap(), None);
            assert_eq!(rest(ctx), " {x}");
        });
    }

    #[test]
    fn optional_argument_present() {
        in_both_modes(" [a{]}b]c", |ctx| {
            let argument = ctx.pop_optional('[', ']').unwrap().unwrap();
            assert_eq!(argument.to_string(), "[a{]}b]");
            assert_eq!(argument.into_list().to_string(), "a{]}b");
            assert_eq!(rest(ctx), "c");
        });
    }

    #[test]
    fn optional_argument_defaults() {
        in_both_modes("x", |ctx| {
            let style = ArgumentStyle::OptionalBracket {
                default: None,
                long: false,
            };
            assert_eq!(pop(ctx, style), Object::Text(NO_VALUE.into()));
            let style = ArgumentStyle::OptionalBracket {
                default: Some(vec![Object::letter('d')].into()),
                long: false,
            };
            assert_eq!(pop(ctx, style).into_list().to_string(), "d");
            assert_eq!(rest(ctx), "x");
        });
    }

    #[test]
    fn required_delimited_argument() {
        in_both_modes("(a)b", |ctx| {
            let style = ArgumentStyle::Delimited {
                open: '(',
                close: ')',
                default: None,
                required: true,
                long: false,
            };
            assert_eq!(pop(ctx, style.clone()).into_list().to_string(), "a");
            let err = ctx.pop_argument(&style).unwrap_err();
            assert_eq!(err.tag, Tag::ExpectedButFound);
            assert_eq!(err.params, vec!["(".to_string(), "b".to_string()]);
        });
    }

    #[test]
    fn long_optional_argument_may_contain_par() {
        in_both_modes(r"[a\par b]x", |ctx| {
            let style = ArgumentStyle::OptionalBracket {
                default: None,
                long: true,
            };
            assert_eq!(pop(ctx, style).into_list().to_string(), r"a\par b");
            assert_eq!(rest(ctx), "x");
        });
        in_both_modes(r"(a\par b)", |ctx| {
            let style = ArgumentStyle::Delimited {
                open: '(',
                close: ')',
                default: None,
                required: true,
                long: false,
            };
            let err = ctx.pop_argument(&style).unwrap_err();
            assert_eq!(err.tag, Tag::ParInArgument);
        });
    }

    #[test]
    fn until_tokens() {
        in_both_modes(" a{b}.{c}.d", |ctx| {
            let style = ArgumentStyle::UntilTokens {
                delimiter: vec![Object::other('.')].into(),
                long: false,
            };
            assert_eq!(pop(ctx, style.clone()).into_list().to_string(), " a{b}");
            assert_eq!(pop(ctx, style).into_list().to_string(), "c");
            assert_eq!(rest(ctx), "d");
        });
    }

    #[test]
    fn until_tokens_par_delimiter_is_allowed() {
        in_both_modes("a b\n\nc", |ctx| {
            let style = ArgumentStyle::UntilTokens {
                delimiter: vec![Object::control_sequence("par")].into(),
                long: false,
            };
            assert_eq!(pop(ctx, style).into_list().to_string(), "a b");
            assert_eq!(rest(ctx), "c");
        });
    }

    macro_rules! numeric_tests {
        ($( ($name: ident, $input: expr, $want: expr, $rest: expr), )+) => {
            $(
                #[test]
                fn $name() {
                    in_both_modes($input, |ctx| {
                        assert_eq!(pop(ctx, ArgumentStyle::Numeric), Object::Number($want));
                        assert_eq!(rest(ctx), $rest);
                    });
                }
            )+
        };
    }

    numeric_tests![
        (numeric_decimal, "123 x", 123, "x"),
        (numeric_signs, " - +-12x", 12, "x"),
        (numeric_negative, "-42", -42, ""),
        (numeric_octal, "'17", 15, ""),
        (numeric_hex, "\"1F", 31, ""),
        (numeric_hex_lowercase_is_not_a_digit, "\"1f", 1, "f"),
        (numeric_character_code, "`a b", 97, "b"),
        (numeric_escaped_character_code, "`\\%", 37, ""),
        (numeric_stops_at_control_sequence, "12\\relax", 12, "\\relax"),
    ];

    #[test]
    fn numeric_requires_digits() {
        in_both_modes("x", |ctx| {
            let err = ctx.pop_argument(&ArgumentStyle::Numeric).unwrap_err();
            assert_eq!(err.tag, Tag::NumberExpected);
            assert_eq!(rest(ctx), "x");
        });
    }

    #[test]
    fn star_modifier() {
        in_both_modes(" *x", |ctx| {
            assert_eq!(pop(ctx, ArgumentStyle::StarModifier), Object::Boolean(true));
            assert_eq!(pop(ctx, ArgumentStyle::StarModifier), Object::Boolean(false));
            assert_eq!(rest(ctx), "x");
        });
        in_both_modes(" x", |ctx| {
            assert_eq!(pop(ctx, ArgumentStyle::StarModifier), Object::Boolean(false));
            assert_eq!(rest(ctx), " x");
        });
    }

    #[test]
    fn token_modifier() {
        in_both_modes("!x", |ctx| {
            assert_eq!(
                pop(ctx, ArgumentStyle::TokenModifier('!')),
                Object::Boolean(true)
            );
            assert_eq!(rest(ctx), "x");
        });
    }

    #[test]
    fn label_of_plain_text() {
        in_both_modes("{ sec:intro }x", |ctx| {
            assert_eq!(
                pop(ctx, ArgumentStyle::Label),
                Object::Text("sec:intro".into())
            );
            assert_eq!(rest(ctx), "x");
        });
    }

    #[test]
    fn verbatim_argument() {
        in_both_modes("|a\\b{|c", |ctx| {
            let style = ArgumentStyle::Verbatim { end: None };
            assert_eq!(pop(ctx, style), Object::Text("a\\b{".into()));
            assert_eq!(rest(ctx), "c");
        });
    }

    #[test]
    fn end_of_input() {
        in_both_modes("   ", |ctx| {
            let err = ctx.pop_argument(&ArgumentStyle::MandatoryBrace).unwrap_err();
            assert_eq!(err.tag, Tag::UnexpectedEndOfInput);
        });
    }
}
