//! LaTeX style macro definitions: `\newcommand`, `\renewcommand` and `\providecommand`
//!
//! The three commands share the same syntax,
//!     `\newcommand*<name>[<number of arguments>][<default>]{<body>}`,
//!     and differ only in what happens when the name is already defined.
//! With the star, arguments may not contain `\par`.

use std::rc::Rc;
use texparser::command::{BuiltIn, Command, Overwrite};
use texparser::context::{ArgumentStyle, Context};
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::texmacro::Macro;
use texparser::token::{self, CommandRef, GroupKind, Object, ObjectList};
use texparser::traits::*;
use texparser_stdext::collections::groupingmap::Scope;

pub const NEWCOMMAND_DOC: &str = "Define a new macro; it is an error if the name is already defined";
pub const RENEWCOMMAND_DOC: &str = "Redefine an existing macro";
pub const PROVIDECOMMAND_DOC: &str = "Define a macro unless the name is already defined";

/// Get the `\newcommand` command.
pub fn get_newcommand<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(newcommand_primitive_fn::<S, NEW>).with_doc(NEWCOMMAND_DOC)
}

/// Get the `\renewcommand` command.
pub fn get_renewcommand<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(newcommand_primitive_fn::<S, RENEW>).with_doc(RENEWCOMMAND_DOC)
}

/// Get the `\providecommand` command.
pub fn get_providecommand<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(newcommand_primitive_fn::<S, PROVIDE>).with_doc(PROVIDECOMMAND_DOC)
}

const NEW: u8 = 0;
const RENEW: u8 = 1;
const PROVIDE: u8 = 2;

fn newcommand_primitive_fn<S: SessionState, const VARIANT: u8>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let short = matches!(
        ctx.pop_argument(&ArgumentStyle::StarModifier)?,
        Object::Boolean(true)
    );
    let name = pop_command_name(invoker, ctx)?;
    let tex_macro = pop_macro(ctx, short)?;

    let policy = match VARIANT {
        NEW => Overwrite::Forbid,
        PROVIDE => Overwrite::Skip,
        _ => {
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
        tracing::debug!(command = %name, "keeping the existing definition");
        return Ok(());
    }

    ctx.bind(name, Command::Macro(Rc::new(tex_macro)), Scope::Local);
    Ok(())
}

/// Pops the rest of a definition, `[<number of arguments>][<default>]{<body>}`,
///     and builds the macro.
///
/// A short macro's arguments may not contain `\par`.
pub(crate) fn pop_macro<S: SessionState>(ctx: &mut dyn Context<S>, short: bool) -> Result<Macro> {
    let num_parameters = pop_num_parameters(ctx)?;
    let default = match num_parameters {
        0 => None,
        _ => ctx.pop_optional('[', ']')?.map(Object::into_list),
    };
    let body = ctx
        .pop_argument(&ArgumentStyle::MandatoryBraceLong)?
        .into_list();
    let mandatory = if short {
        ArgumentStyle::MandatoryBrace
    } else {
        ArgumentStyle::MandatoryBraceLong
    };
    let mut parameters = vec![mandatory; num_parameters];
    if let (Some(default), Some(first)) = (default, parameters.first_mut()) {
        *first = ArgumentStyle::OptionalBracket {
            default: Some(default),
            long: !short,
        };
    }
    Ok(Macro::new(ObjectList::new(), parameters, &body)
        .map_err(|err| Box::new((*err).with_location(ctx.location())))?
        .with_long(!short))
}

/// Pops the name of the command being defined: either `\name` or `{\name}`.
pub(crate) fn pop_command_name<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<CommandRef> {
    let object = match ctx.pop_object()? {
        None => {
            return Err(ctx.report_error(
                Tag::UnexpectedEndOfInput,
                vec![format!("reading the name of the command defined by {invoker}")],
            ))
        }
        Some(object) => object,
    };
    let found = match object {
        Object::CommandRef(command_ref) => return Ok(command_ref),
        Object::Group(mut list, GroupKind::Brace) => {
            list.trim_whitespace();
            match (list.len(), list.pop_front()) {
                (1, Some(Object::CommandRef(command_ref))) => return Ok(command_ref),
                (_, first) => {
                    if let Some(first) = first {
                        list.push_front(first);
                    }
                    format!("{{{list}}}")
                }
            }
        }
        other => other.to_string(),
    };
    Err(ctx.report_error(Tag::CsExpected, vec![found]))
}

fn pop_num_parameters<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<usize> {
    let list = match ctx.pop_optional('[', ']')? {
        None => return Ok(0),
        Some(object) => object.into_list(),
    };
    let text = token::write_objects(&list);
    let text = text.trim();
    let n: usize = match text.parse() {
        Ok(n) => n,
        Err(_) => return Err(ctx.report_error(Tag::NumberExpected, vec![text.to_string()])),
    };
    if n > 9 {
        return Err(ctx.report_error(Tag::IllegalParameter, vec![n.to_string()]));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::def;
    use std::collections::HashMap;

    fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("newcommand", get_newcommand()),
            ("providecommand", get_providecommand()),
            ("renewcommand", get_renewcommand()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (newcommand_no_arguments, r"\newcommand\a{x}\a", "x"),
            (newcommand_braced_name, r"\newcommand{\a}{x}\a", "x"),
            (
                newcommand_two_arguments,
                r"\newcommand{\a}[2]{#2#1}\a xy",
                "yx"
            ),
            (
                newcommand_default_argument,
                r"\newcommand\a[2][d]{(#1,#2)}\a{x}\a[y]{z}",
                "(d,x)(y,z)"
            ),
            (
                newcommand_is_long,
                r"\newcommand\a[1]{(#1)}\def\par{P}\a{x\par}",
                "(xP)"
            ),
            (
                newcommand_is_local,
                r"\newcommand\a{x}{\renewcommand\a{y}\a}\a",
                "yx"
            ),
            (
                renewcommand,
                r"\newcommand\a{x}\renewcommand\a{y}\a",
                "y"
            ),
            (
                renewcommand_with_arguments,
                r"\def\a{x}\renewcommand*\a[1]{[#1]}\a{y}",
                "[y]"
            ),
            (
                providecommand_keeps_existing,
                r"\newcommand\a{x}\providecommand\a{y}\a",
                "x"
            ),
            (providecommand_defines, r"\providecommand\a{y}\a", "y"),
        ),
        failure_tests(
            (
                newcommand_already_defined,
                r"\newcommand\a{x}\newcommand\a{y}",
                Tag::AlreadyDefined
            ),
            (renewcommand_not_defined, r"\renewcommand\a{y}", Tag::NotDefined),
            (
                newcommand_star_is_short,
                r"\newcommand*\a[1]{#1}\a{\par}",
                Tag::ParInArgument
            ),
            (newcommand_too_many_arguments, r"\newcommand\a[10]{}", Tag::IllegalParameter),
            (newcommand_bad_number, r"\newcommand\a[x]{}", Tag::NumberExpected),
            (newcommand_character_name, r"\newcommand a{x}", Tag::CsExpected),
            (newcommand_group_name, r"\newcommand{ab}{x}", Tag::CsExpected),
            (newcommand_end_of_input, r"\newcommand", Tag::UnexpectedEndOfInput),
            (newcommand_illegal_parameter, r"\newcommand\a[1]{#2}", Tag::IllegalParameter),
        ),
    ];
}
