//! Document commands with typed argument specifications, as in the LaTeX `xparse` package
//!
//! A document command is defined as `\NewDocumentCommand<name>{<argument spec>}{<body>}`.
//! The argument spec is a sequence of letters, each describing one argument:
//!
//! | spec | argument |
//! |---|---|
//! | `m` | mandatory |
//! | `o`, `O{default}` | optional `[...]` |
//! | `s` | optional star |
//! | `t<c>` | optional token `<c>` |
//! | `r<o><c>`, `R<o><c>{default}` | required, delimited by `<o>` and `<c>` |
//! | `d<o><c>`, `D<o><c>{default}` | optional, delimited by `<o>` and `<c>` |
//! | `v` | verbatim, delimited by the next character |
//!
//! A `+` before `m`, `o`, `O`, `r`, `R`, `d` or `D` makes the argument long, so it may contain `\par`.
//!
//! Star and token arguments are passed to the body as `\BooleanTrue` or `\BooleanFalse`,
//!     and absent optional arguments without a default as `-NoValue-`.
//! The `\IfBooleanTF` and `\IfNoValueTF` families test for these values.

use crate::newcommand;
use std::rc::Rc;
use texparser::command::{BuiltIn, Command, Overwrite};
use texparser::context::{ArgumentStyle, Context};
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::texmacro::Macro;
use texparser::token::{self, CommandRef, GroupKind, Object, ObjectList, NO_VALUE};
use texparser::traits::*;
use texparser_stdext::collections::groupingmap::Scope;

pub const NEW_DOC: &str = "Define a new document command";
pub const RENEW_DOC: &str = "Redefine an existing document command";
pub const PROVIDE_DOC: &str = "Define a document command unless the name is already defined";
pub const DECLARE_DOC: &str = "Define a document command, replacing any existing definition";
pub const IF_BOOLEAN_DOC: &str = "Branch on a star or token argument";
pub const IF_NO_VALUE_DOC: &str = "Branch on whether an optional argument was given";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Variant {
    New,
    Renew,
    Provide,
    Declare,
}

/// Get the `\NewDocumentCommand` command.
pub fn get_new_document_command<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(new_document_command_fn).with_doc(NEW_DOC)
}

/// Get the `\RenewDocumentCommand` command.
pub fn get_renew_document_command<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(renew_document_command_fn).with_doc(RENEW_DOC)
}

/// Get the `\ProvideDocumentCommand` command.
pub fn get_provide_document_command<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(provide_document_command_fn).with_doc(PROVIDE_DOC)
}

/// Get the `\DeclareDocumentCommand` command.
pub fn get_declare_document_command<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(declare_document_command_fn).with_doc(DECLARE_DOC)
}

fn new_document_command_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    define(invoker, ctx, Variant::New)
}

fn renew_document_command_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    define(invoker, ctx, Variant::Renew)
}

fn provide_document_command_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    define(invoker, ctx, Variant::Provide)
}

fn declare_document_command_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    define(invoker, ctx, Variant::Declare)
}

fn define<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
    variant: Variant,
) -> Result<()> {
    let name = newcommand::pop_command_name(invoker, ctx)?;
    let spec = ctx
        .pop_argument(&ArgumentStyle::MandatoryBrace)?
        .into_list();
    let parameters = parse_arg_spec(ctx, &spec)?;
    let body = ctx
        .pop_argument(&ArgumentStyle::MandatoryBraceLong)?
        .into_list();

    let policy = match variant {
        Variant::New => Overwrite::Forbid,
        Variant::Provide => Overwrite::Skip,
        Variant::Declare => Overwrite::Force,
        Variant::Renew => {
            if ctx.resolve(&name).is_none() {
                return Err(ctx.report_error(Tag::NotDefined, vec![name.to_string()]));
            }
            Overwrite::Force
        }
    };
    let proceed = ctx
        .session()
        .commands_map
        .check_overwrite(&name, policy)
        .map_err(|err| Box::new((*err).with_location(ctx.location())))?;
    if !proceed {
        return Ok(());
    }
    let tex_macro = Macro::new(ObjectList::new(), parameters, &body)
        .map_err(|err| Box::new((*err).with_location(ctx.location())))?;
    ctx.bind(name, Command::Macro(Rc::new(tex_macro)), Scope::Local);
    Ok(())
}

fn parse_arg_spec<S: SessionState>(
    ctx: &dyn Context<S>,
    spec: &ObjectList,
) -> Result<Vec<ArgumentStyle>> {
    let unsupported = |found: &str| ctx.report_error(Tag::UnsupportedArgSpec, vec![found.to_string()]);
    let mut parameters = vec![];
    let mut long = false;
    let mut iter = spec.iter().filter(|object| !object.is_whitespace());
    while let Some(object) = iter.next() {
        let letter = match object.char() {
            None => return Err(unsupported(&object.to_string())),
            Some(letter) => letter,
        };
        let mut delimiters = || match (
            iter.next().and_then(Object::char),
            iter.next().and_then(Object::char),
        ) {
            (Some(open), Some(close)) => Ok((open, close)),
            _ => Err(unsupported(&letter.to_string())),
        };
        let style = match letter {
            '+' => {
                long = true;
                continue;
            }
            'm' if long => ArgumentStyle::MandatoryBraceLong,
            'm' => ArgumentStyle::MandatoryBrace,
            'o' => ArgumentStyle::OptionalBracket {
                default: None,
                long,
            },
            's' | 'v' | 't' if long => return Err(unsupported(&format!("+{letter}"))),
            's' => ArgumentStyle::StarModifier,
            'v' => ArgumentStyle::Verbatim { end: None },
            't' => match iter.next().and_then(Object::char) {
                None => return Err(unsupported("t")),
                Some(c) => ArgumentStyle::TokenModifier(c),
            },
            'r' | 'd' => {
                let (open, close) = delimiters()?;
                ArgumentStyle::Delimited {
                    open,
                    close,
                    default: None,
                    required: letter == 'r',
                    long,
                }
            }
            'O' => ArgumentStyle::OptionalBracket {
                default: Some(spec_default(iter.next()).ok_or_else(|| unsupported("O"))?),
                long,
            },
            'R' | 'D' => {
                let (open, close) = delimiters()?;
                let default = spec_default(iter.next()).ok_or_else(|| unsupported(&letter.to_string()))?;
                ArgumentStyle::Delimited {
                    open,
                    close,
                    default: Some(default),
                    required: letter == 'R',
                    long,
                }
            }
            other => return Err(unsupported(&other.to_string())),
        };
        long = false;
        parameters.push(style);
    }
    if long {
        return Err(unsupported("+"));
    }
    if parameters.len() > 9 {
        return Err(ctx.report_error(
            Tag::IllegalParameter,
            vec![parameters.len().to_string()],
        ));
    }
    Ok(parameters)
}

fn spec_default(object: Option<&Object>) -> Option<ObjectList> {
    match object {
        Some(Object::Group(list, GroupKind::Brace)) => Some(list.clone()),
        _ => None,
    }
}

/// Get the `\IfBooleanTF` command.
pub fn get_if_boolean_tf<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(if_boolean_fn::<S, true, true>).with_doc(IF_BOOLEAN_DOC)
}

/// Get the `\IfBooleanT` command.
pub fn get_if_boolean_t<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(if_boolean_fn::<S, true, false>).with_doc(IF_BOOLEAN_DOC)
}

/// Get the `\IfBooleanF` command.
pub fn get_if_boolean_f<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(if_boolean_fn::<S, false, true>).with_doc(IF_BOOLEAN_DOC)
}

/// Get the `\IfNoValueTF` command.
pub fn get_if_no_value_tf<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(if_no_value_fn::<S, true, true>).with_doc(IF_NO_VALUE_DOC)
}

/// Get the `\IfNoValueT` command.
pub fn get_if_no_value_t<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(if_no_value_fn::<S, true, false>).with_doc(IF_NO_VALUE_DOC)
}

/// Get the `\IfNoValueF` command.
pub fn get_if_no_value_f<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(if_no_value_fn::<S, false, true>).with_doc(IF_NO_VALUE_DOC)
}

/// Get the `\BooleanTrue` command.
pub fn get_boolean_true<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(boolean_fn)
}

/// Get the `\BooleanFalse` command.
pub fn get_boolean_false<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(boolean_fn)
}

fn boolean_fn<S: SessionState>(_: &CommandRef, _: &mut dyn Context<S>) -> Result<()> {
    Ok(())
}

fn if_boolean_fn<S: SessionState, const T: bool, const F: bool>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let mut value = ctx
        .pop_argument(&ArgumentStyle::MandatoryBrace)?
        .into_list();
    value.trim_whitespace();
    let condition = match (value.len(), value.front()) {
        (1, Some(Object::CommandRef(CommandRef::ControlSequence(name)))) => {
            match name.as_str() {
                "BooleanTrue" => Some(true),
                "BooleanFalse" => Some(false),
                _ => None,
            }
        }
        _ => None,
    };
    let condition = match condition {
        None => {
            return Err(ctx.report_error(
                Tag::ExpectedButFound,
                vec!["\\BooleanTrue or \\BooleanFalse".to_string(), value.to_string()],
            ))
        }
        Some(condition) => condition,
    };
    choose_branch::<S, T, F>(ctx, condition)
}

fn if_no_value_fn<S: SessionState, const T: bool, const F: bool>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let value = ctx
        .pop_argument(&ArgumentStyle::MandatoryBraceLong)?
        .into_list();
    let condition = token::write_objects(&value).trim() == NO_VALUE;
    choose_branch::<S, T, F>(ctx, condition)
}

fn choose_branch<S: SessionState, const T: bool, const F: bool>(
    ctx: &mut dyn Context<S>,
    condition: bool,
) -> Result<ObjectList> {
    let true_branch = match T {
        true => Some(ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?),
        false => None,
    };
    let false_branch = match F {
        true => Some(ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?),
        false => None,
    };
    let chosen = if condition { true_branch } else { false_branch };
    Ok(chosen.map(Object::into_list).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::{def, output};
    use std::collections::HashMap;

    fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> {
        HashMap::from([
            ("BooleanFalse", get_boolean_false()),
            ("BooleanTrue", get_boolean_true()),
            ("DeclareDocumentCommand", get_declare_document_command()),
            ("IfBooleanF", get_if_boolean_f()),
            ("IfBooleanT", get_if_boolean_t()),
            ("IfBooleanTF", get_if_boolean_tf()),
            ("IfNoValueF", get_if_no_value_f()),
            ("IfNoValueT", get_if_no_value_t()),
            ("IfNoValueTF", get_if_no_value_tf()),
            ("NewDocumentCommand", get_new_document_command()),
            ("ProvideDocumentCommand", get_provide_document_command()),
            ("RenewDocumentCommand", get_renew_document_command()),
            ("def", def::get_def()),
            ("par", output::get_par()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (
                mandatory_arguments,
                r"\NewDocumentCommand\a{m m}{(#1,#2)}\a{x}y",
                "(x,y)"
            ),
            (no_arguments, r"\NewDocumentCommand{\a}{}{x}\a", "x"),
            (
                star_argument,
                r"\NewDocumentCommand\a{s m}{\IfBooleanTF{#1}{S}{N}#2}\a*{x}\a{y}",
                "SxNy"
            ),
            (
                star_argument_is_boolean,
                r"\NewDocumentCommand\a{s}{#1}\def\BooleanTrue{T}\def\BooleanFalse{F}\a*\a",
                "TF"
            ),
            (
                optional_argument,
                r"\NewDocumentCommand\a{o m}{\IfNoValueTF{#1}{none}{#1}-#2}\a{x}\a[y]{z}",
                "none-xy-z"
            ),
            (
                optional_argument_with_default,
                r"\NewDocumentCommand\a{O{d} m}{#1#2}\a{x}\a[y]{z}",
                "dxyz"
            ),
            (
                token_argument,
                r"\NewDocumentCommand\a{t+ m}{\IfBooleanT{#1}{plus}#2}\a+x\a y",
                "plusxy"
            ),
            (
                if_boolean_f,
                r"\NewDocumentCommand\a{s}{\IfBooleanF{#1}{no star}}\a*\a",
                "no star"
            ),
            (
                required_delimited_argument,
                r"\NewDocumentCommand\a{r()}{[#1]}\a(x)",
                "[x]"
            ),
            (
                required_delimited_argument_with_default,
                r"\NewDocumentCommand\a{R(){d}}{[#1]}\a(x)",
                "[x]"
            ),
            (
                optional_delimited_argument,
                r"\NewDocumentCommand\a{d()}{\IfNoValueF{#1}{[#1]}}\a(x)\a",
                "[x]"
            ),
            (
                optional_delimited_argument_if_no_value_t,
                r"\NewDocumentCommand\a{d()}{\IfNoValueT{#1}{none}}\a(x)\a",
                "none"
            ),
            (
                optional_delimited_argument_with_default,
                r"\NewDocumentCommand\a{D(){d}}{[#1]}\a(x)\a",
                "[x][d]"
            ),
            (
                long_mandatory_argument,
                r"\NewDocumentCommand\a{+m}{(#1)}\def\par{P}\a{x\par}",
                "(xP)"
            ),
            (
                long_optional_argument,
                r"\NewDocumentCommand\a{+o}{(#1)}\def\par{P}\a[x\par]",
                "(xP)"
            ),
            (
                long_optional_argument_with_default,
                r"\NewDocumentCommand\a{+O{d}}{(#1)}\def\par{P}\a[x\par]\a",
                "(xP)(d)"
            ),
            (
                long_delimited_arguments,
                r"\NewDocumentCommand\a{+r()+d<>}{(#1#2)}\def\par{P}\a(x\par)<\par y>",
                "(xPPy)"
            ),
            (
                renew_document_command,
                r"\NewDocumentCommand\a{}{x}\RenewDocumentCommand\a{}{y}\a",
                "y"
            ),
            (
                provide_document_command_keeps_existing,
                r"\def\a{x}\ProvideDocumentCommand\a{}{y}\a",
                "x"
            ),
            (
                provide_document_command_defines,
                r"\ProvideDocumentCommand\a{}{y}\a",
                "y"
            ),
            (
                declare_document_command,
                r"\def\a{x}\DeclareDocumentCommand\a{}{y}\a",
                "y"
            ),
        ),
        output_tests(
            (
                verbatim_argument,
                r"\NewDocumentCommand\a{v}{[#1]}\a|x#y|",
                "[x#y]"
            ),
        ),
        failure_tests(
            (
                new_document_command_already_defined,
                r"\NewDocumentCommand\a{}{x}\NewDocumentCommand\a{}{y}",
                Tag::AlreadyDefined
            ),
            (
                renew_document_command_not_defined,
                r"\RenewDocumentCommand\a{}{y}",
                Tag::NotDefined
            ),
            (
                unsupported_spec,
                r"\NewDocumentCommand\a{q}{}",
                Tag::UnsupportedArgSpec
            ),
            (
                incomplete_delimited_spec,
                r"\NewDocumentCommand\a{r(}{}",
                Tag::UnsupportedArgSpec
            ),
            (
                missing_default_spec,
                r"\NewDocumentCommand\a{O}{}",
                Tag::UnsupportedArgSpec
            ),
            (
                required_argument_missing,
                r"\NewDocumentCommand\a{r()}{}\a x",
                Tag::ExpectedButFound
            ),
            (
                short_mandatory_argument,
                r"\NewDocumentCommand\a{m}{}\a{\par}",
                Tag::ParInArgument
            ),
            (
                short_optional_argument,
                r"\NewDocumentCommand\a{o}{}\a[\par]",
                Tag::ParInArgument
            ),
            (
                short_delimited_argument,
                r"\NewDocumentCommand\a{d()}{}\a(\par)",
                Tag::ParInArgument
            ),
            (
                long_star_spec,
                r"\NewDocumentCommand\a{+s}{}",
                Tag::UnsupportedArgSpec
            ),
            (
                trailing_long_spec,
                r"\NewDocumentCommand\a{m+}{}",
                Tag::UnsupportedArgSpec
            ),
            (
                if_boolean_bad_value,
                r"\IfBooleanTF{x}{a}{b}",
                Tag::ExpectedButFound
            ),
        ),
    ];
}
