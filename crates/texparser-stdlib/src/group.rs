//! Explicit grouping: `\begingroup`, `\endgroup`, `\bgroup`, `\egroup` and `\aftergroup`

use texparser::catcode::CatCode;
use texparser::command::{BuiltIn, Command};
use texparser::context::Context;
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::token::{CommandRef, Object};
use texparser::traits::*;

pub const BEGINGROUP_DOC: &str = "Begin a new group";
pub const ENDGROUP_DOC: &str = "End the current group";
pub const AFTERGROUP_DOC: &str = "Save the next token to be read after the current group ends";

/// Get the `\begingroup` command.
pub fn get_begingroup<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(begingroup_primitive_fn).with_doc(BEGINGROUP_DOC)
}

/// Get the `\endgroup` command.
pub fn get_endgroup<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(endgroup_primitive_fn).with_doc(ENDGROUP_DOC)
}

/// Get the `\bgroup` command, an alias of the `{` character.
pub fn get_bgroup<S>() -> BuiltIn<S> {
    Command::Alias(Object::Char('{', CatCode::BeginGroup)).into()
}

/// Get the `\egroup` command, an alias of the `}` character.
pub fn get_egroup<S>() -> BuiltIn<S> {
    Command::Alias(Object::Char('}', CatCode::EndGroup)).into()
}

/// Get the `\aftergroup` command.
///
/// Outside of any group the saved token is dropped, as in TeX.
pub fn get_aftergroup<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(aftergroup_primitive_fn).with_doc(AFTERGROUP_DOC)
}

fn aftergroup_primitive_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let object = match ctx.next_raw()? {
        None => {
            return Err(ctx.report_error(
                Tag::UnexpectedEndOfInput,
                vec![format!("reading the argument of {invoker}")],
            ))
        }
        Some(object) => object,
    };
    if !ctx.session_mut().push_after_group(object) {
        tracing::debug!("\\aftergroup outside of a group");
    }
    Ok(())
}

fn begingroup_primitive_fn<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<()> {
    ctx.start_group();
    Ok(())
}

fn endgroup_primitive_fn<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<()> {
    ctx.end_group()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::testing::*;
    use std::collections::HashMap;

    fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> {
        HashMap::from([
            ("aftergroup", get_aftergroup()),
            ("begingroup", get_begingroup()),
            ("bgroup", get_bgroup()),
            ("def", def::get_def()),
            ("egroup", get_egroup()),
            ("endgroup", get_endgroup()),
            ("gdef", def::get_gdef()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (
                begingroup_scopes_definitions,
                r"\def\a{x}\begingroup\def\a{y}\a\endgroup\a",
                "yx"
            ),
            (
                global_definition_survives,
                r"\begingroup\gdef\a{y}\endgroup\a",
                "y"
            ),
            (
                bgroup_and_egroup,
                r"\def\a{x}\bgroup\def\a{y}\a\egroup\a",
                "yx"
            ),
            (mixed_delimiters, r"\def\a{x}{\def\a{y}\a\egroup\a", "yx"),
        ),
        live_and_list_tests(
            (aftergroup_character, r"{a\aftergroup bc}d", "acbd"),
            (
                aftergroup_in_order,
                r"{\aftergroup a\aftergroup bc}d",
                "cabd"
            ),
            (
                aftergroup_sees_outer_definition,
                r"\def\a{x}{\def\a{y}\aftergroup\a}",
                "x"
            ),
            (
                aftergroup_with_begingroup,
                r"\begingroup\aftergroup ab\endgroup c",
                "bac"
            ),
            (
                aftergroup_nested_groups,
                r"{{\aftergroup ab}\aftergroup cd}e",
                "badce"
            ),
            (
                aftergroup_in_macro_argument,
                r"\def\inlist#1{{#1}}\inlist{a\aftergroup bc}d",
                "acbd"
            ),
            (aftergroup_outside_group, r"\aftergroup ab", "b"),
        ),
        failure_tests(
            (endgroup_without_group, r"\endgroup", Tag::UnexpectedEndGroup),
            (unclosed_begingroup, r"\begingroup", Tag::UnbalancedGroups),
            (aftergroup_end_of_input, r"{\aftergroup", Tag::UnexpectedEndOfInput),
        ),
    ];
}
