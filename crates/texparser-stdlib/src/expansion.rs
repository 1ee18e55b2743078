//! Primitives for controlling expansion
//!
//! `\expandafter`, `\noexpand`, `\unexpanded`, `\relax`, `\csname`, `\string`, `\detokenize`,
//!     `\number` and `\romannumeral`.

use texparser::catcode::CatCode;
use texparser::command::{self, BuiltIn, Command, StaticTag};
use texparser::context::{argument, ArgumentStyle, Context};
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::token::{self, CommandRef, GroupKind, Object, ObjectList};
use texparser::traits::*;
use texparser_stdext::collections::groupingmap::Scope;

pub const EXPANDAFTER_DOC: &str = "Expand the token after the next one";
pub const RELAX_DOC: &str = "Do nothing";
pub const CSNAME_DOC: &str = "Build a control sequence from the characters up to \\endcsname";
pub const ENDCSNAME_DOC: &str = "End the name started by \\csname";
pub const STRING_DOC: &str = "Convert the next token to characters";
pub const NUMBER_DOC: &str = "Convert a number to characters";
pub const NOEXPAND_DOC: &str = "Prevent the next token from being expanded";
pub const UNEXPANDED_DOC: &str = "Prevent the tokens in a group from being expanded inside \\edef";
pub const DETOKENIZE_DOC: &str = "Convert the tokens in a group to characters";
pub const ROMANNUMERAL_DOC: &str = "Convert a positive number to lowercase roman numerals";

static NO_EXPAND_TAG: StaticTag = StaticTag::new();
static UNEXPANDED_TAG: StaticTag = StaticTag::new();

/// Get the `\expandafter` command.
pub fn get_expandafter<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(expandafter_primitive_fn).with_doc(EXPANDAFTER_DOC)
}

fn expandafter_primitive_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let first = match ctx.next_raw()? {
        None => return Err(end_of_input(ctx, invoker)),
        Some(object) => object,
    };
    ctx.expand_once()?;
    let mut result = ObjectList::new();
    result.push_back(first);
    Ok(result)
}

/// Get the `\noexpand` command.
///
/// When only expansion is happening the command works through [expansion_override_hook],
///     which the session state must install.
/// When processed normally, an expandable command following `\noexpand` does nothing,
///     like `\relax`.
pub fn get_noexpand<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(noexpand_primitive_fn)
        .with_doc(NOEXPAND_DOC)
        .with_tag(NO_EXPAND_TAG.get())
}

fn noexpand_primitive_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let object = match ctx.next_raw()? {
        None => return Err(end_of_input(ctx, invoker)),
        Some(object) => object,
    };
    if let Object::CommandRef(command_ref) = &object {
        if let Some(binding) = ctx.resolve(command_ref) {
            if binding.command.is_expandable() {
                return Ok(ObjectList::new());
            }
        }
    }
    Ok(object.into_list())
}

/// Get the `\unexpanded` command.
///
/// Inside `\edef` the contents of the group are kept as they are.
/// Elsewhere the contents are read normally.
pub fn get_unexpanded<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(unexpanded_primitive_fn)
        .with_doc(UNEXPANDED_DOC)
        .with_tag(UNEXPANDED_TAG.get())
}

fn unexpanded_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    Ok(ctx
        .pop_argument(&ArgumentStyle::MandatoryBraceLong)?
        .into_list())
}

/// Expansion override hook that implements `\noexpand` and `\unexpanded`.
///
/// Session states that provide these commands must call this from
///     [SessionState::expansion_override_hook].
#[inline]
pub fn expansion_override_hook<S: SessionState>(
    invoker: &CommandRef,
    tag: Option<command::Tag>,
    ctx: &mut dyn Context<S>,
) -> Result<Option<ObjectList>> {
    let tag = match tag {
        None => return Ok(None),
        Some(tag) => tag,
    };
    if tag == NO_EXPAND_TAG.get() {
        return match ctx.next_raw()? {
            None => Err(end_of_input(ctx, invoker)),
            Some(object) => Ok(Some(object.into_list())),
        };
    }
    if tag == UNEXPANDED_TAG.get() {
        return unexpanded_primitive_fn(invoker, ctx).map(Some);
    }
    Ok(None)
}

/// Get the `\relax` command.
pub fn get_relax<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(relax_primitive_fn).with_doc(RELAX_DOC)
}

fn relax_primitive_fn<S: SessionState>(_: &CommandRef, _: &mut dyn Context<S>) -> Result<()> {
    Ok(())
}

/// Get the `\csname` command.
///
/// As in TeX, a name that is not defined is bound to `\relax` in the current group.
pub fn get_csname<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(csname_primitive_fn).with_doc(CSNAME_DOC)
}

/// Get the `\endcsname` command.
pub fn get_endcsname<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(endcsname_primitive_fn).with_doc(ENDCSNAME_DOC)
}

fn csname_primitive_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let mut name = String::new();
    loop {
        let object = match ctx.next_expanded()? {
            None => return Err(end_of_input(ctx, invoker)),
            Some(object) => object,
        };
        match object {
            Object::Char(c, _) => name.push(c),
            Object::Space => name.push(' '),
            Object::CommandRef(command_ref) if is_endcsname(ctx, &command_ref) => break,
            other => {
                return Err(ctx.report_error(
                    Tag::ExpectedButFound,
                    vec!["\\endcsname".to_string(), other.to_string()],
                ))
            }
        }
    }
    let command_ref = CommandRef::control_sequence(&name);
    if ctx.resolve(&command_ref).is_none() {
        ctx.bind(
            command_ref.clone(),
            Command::Executable(relax_primitive_fn),
            Scope::Local,
        );
    }
    let mut result = ObjectList::new();
    result.push_back(Object::CommandRef(command_ref));
    Ok(result)
}

fn is_endcsname<S: SessionState>(ctx: &dyn Context<S>, command_ref: &CommandRef) -> bool {
    match ctx.resolve(command_ref) {
        None => false,
        Some(binding) => binding.name().name() == "endcsname",
    }
}

fn endcsname_primitive_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    Err(ctx.report_error(Tag::ExtraCommand, vec![invoker.to_string()]))
}

/// Get the `\string` command.
pub fn get_string<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(string_primitive_fn).with_doc(STRING_DOC)
}

fn string_primitive_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    match ctx.next_raw()? {
        None => Err(end_of_input(ctx, invoker)),
        Some(Object::CommandRef(command_ref)) => Ok(token::text_to_list(&command_ref.to_string())),
        Some(Object::Group(mut contents, GroupKind::Brace)) => {
            // Only the opening brace is converted; the rest of the group is read again.
            contents.push_back(Object::Char('}', CatCode::EndGroup));
            ctx.push_list_front(contents)?;
            Ok(token::text_to_list("{"))
        }
        Some(Object::Char(c, _)) => Ok(vec![Object::other(c)].into()),
        Some(other) => Ok(token::text_to_list(&other.to_string())),
    }
}

/// Get the `\detokenize` command.
pub fn get_detokenize<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(detokenize_primitive_fn).with_doc(DETOKENIZE_DOC)
}

fn detokenize_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let contents = ctx
        .pop_argument(&ArgumentStyle::MandatoryBraceLong)?
        .into_list();
    Ok(token::text_to_list(&token::write_objects(&contents)))
}

/// Get the `\number` command.
pub fn get_number<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(number_primitive_fn).with_doc(NUMBER_DOC)
}

fn number_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    Ok(ctx.pop_argument(&ArgumentStyle::Numeric)?.into_list())
}

/// Get the `\romannumeral` command.
///
/// Zero and negative numbers produce nothing.
pub fn get_romannumeral<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(romannumeral_primitive_fn).with_doc(ROMANNUMERAL_DOC)
}

fn romannumeral_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let n = argument::pop_number(ctx)?;
    // Bounds the length of the output.
    if n > 1_000_000 {
        return Err(ctx.report_error(Tag::NumberOutOfRange, vec![n.to_string()]));
    }
    Ok(token::text_to_list(&roman_numeral(n)))
}

/// Lowercase roman numerals, as TeX writes them.
///
/// Thousands are written as repeated `m`s.
pub fn roman_numeral(n: i64) -> String {
    const NUMERALS: [(i64, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut n = n;
    let mut s = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            s.push_str(numeral);
            n -= value;
        }
    }
    s
}

fn end_of_input<S: SessionState>(
    ctx: &dyn Context<S>,
    invoker: &CommandRef,
) -> Box<texparser::error::Error> {
    ctx.report_error(
        Tag::UnexpectedEndOfInput,
        vec![format!("reading the argument of {invoker}")],
    )
}
