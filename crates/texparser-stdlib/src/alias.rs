//! `\let` aliasing command

use crate::prefix;
use texparser::command::{BuiltIn, Command};
use texparser::context::Context;
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::token::{CommandRef, Object};
use texparser::traits::*;

pub const LET_DOC: &str = "Assign a command or character to a control sequence";

/// Get the `\let` command.
pub fn get_let<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(let_primitive_fn).with_doc(LET_DOC)
}

fn let_primitive_fn<S: HasComponent<prefix::Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let scope = prefix::take_scope(ctx);
    let alias = match ctx.pop_object()? {
        None => return Err(end_of_input(invoker, ctx)),
        Some(Object::CommandRef(command_ref)) => command_ref,
        Some(other) => return Err(ctx.report_error(Tag::CsExpected, vec![other.to_string()])),
    };
    let mut rhs = next_non_space(ctx)?;
    if matches!(&rhs, Some(object) if object.is_char('=')) {
        rhs = ctx.next_raw()?;
        if rhs == Some(Object::Space) {
            rhs = ctx.next_raw()?;
        }
    }
    match rhs {
        None => Err(end_of_input(invoker, ctx)),
        Some(Object::CommandRef(command_ref)) => match ctx.resolve(&command_ref) {
            None => Err(ctx.session().undefined_command_error(&command_ref)),
            Some(binding) => {
                ctx.session_mut()
                    .commands_map
                    .assign_binding(alias, binding, scope);
                Ok(())
            }
        },
        Some(object) => {
            ctx.bind(alias, Command::Alias(object), scope);
            Ok(())
        }
    }
}

fn next_non_space<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<Option<Object>> {
    loop {
        match ctx.next_raw()? {
            Some(Object::Space) => continue,
            other => return Ok(other),
        }
    }
}

fn end_of_input<S: SessionState>(
    invoker: &CommandRef,
    ctx: &dyn Context<S>,
) -> Box<texparser::error::Error> {
    ctx.report_error(
        Tag::UnexpectedEndOfInput,
        vec![format!("reading the right hand side of a {invoker} assignment")],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::testing::*;
    use std::collections::HashMap;

    fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("global", prefix::get_global()),
            ("let", get_let()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (let_for_macro, r"\def\A{abc}\let\B\A\B", "abc"),
            (local, r"\def\A{a}\def\B{b}\let\C=\A{\let\C=\B \C}\C", "ba"),
            (
                global,
                r"\def\A{a}\def\B{b}\let\C=\A{\global\let\C=\B \C}\C",
                "bb"
            ),
            (let_for_macro_equals, r"\def\A{abc}\let\B=\A\B", "abc"),
            (let_for_character, r"\let\a=x\a\a", "xx"),
            (let_for_space_after_equals, r"\def\b{y}\let\a= \b\a", "y"),
            (
                let_keeps_old_definition,
                r"\def\A{old}\let\B\A\def\A{new}\B\A",
                "oldnew"
            ),
            (let_active_character, r"\def\A{abc}\let~\A~", "abc"),
        ),
        failure_tests(
            (let_unknown_cs_name, r"\let \B=\A", Tag::UndefinedControlSequence),
            (let_character_target, r"\let a=b", Tag::CsExpected),
            (let_end_of_input, r"\let", Tag::UnexpectedEndOfInput),
            (let_end_of_input_after_equals, r"\let\a=", Tag::UnexpectedEndOfInput),
        ),
    ];
}
