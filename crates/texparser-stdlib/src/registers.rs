//! Integer registers: `\newcount`, `\advance`, `\multiply`, `\divide` and `\the`
//!
//! A register is allocated by `\newcount\c`, which binds `\c` to a fresh register index.
//! Writing `\c=5` assigns the register and `\the\c` produces its value.
//! Wherever a number is expected, `\c` stands for its current value.

use crate::newcommand::pop_command_name;
use crate::prefix;
use texparser::catcode::CatCode;
use texparser::command::{BuiltIn, Command, Overwrite};
use texparser::context::{argument, Context};
use texparser::error::{Error, Tag};
use texparser::prelude::Result;
use texparser::session::pop_register_value;
use texparser::token::{self, CommandRef, Object, ObjectList};
use texparser::traits::*;
use texparser_stdext::collections::groupingmap::Scope;

pub const NEWCOUNT_DOC: &str = "Allocate a new integer register: \\newcount\\name";
pub const ADVANCE_DOC: &str = "Add an integer to a register: \\advance\\name by <n>";
pub const MULTIPLY_DOC: &str = "Multiply a register by an integer: \\multiply\\name by <n>";
pub const DIVIDE_DOC: &str = "Divide a register by an integer, rounding towards zero";
pub const THE_DOC: &str = "Output the value of a register";

/// Component for the register commands.
#[derive(Default)]
pub struct Component {
    next_index: usize,
}

/// Assigns a register, as in `\c=5` or `\global\c 5`.
///
/// Session states that include the prefix component should use this as their
///     [register_assignment_handler](texparser::session::SessionState::register_assignment_handler),
///     so that `\global` applies to register assignments.
pub fn assignment_handler<S: HasComponent<prefix::Component>>(
    index: usize,
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let scope = prefix::take_scope(ctx);
    let value = pop_register_value(ctx)?;
    ctx.session_mut().set_register(index, value, scope);
    Ok(())
}

/// Get the `\newcount` command.
pub fn get_newcount<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(newcount_primitive_fn).with_doc(NEWCOUNT_DOC)
}

fn newcount_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let name = pop_command_name(invoker, ctx)?;
    ctx.session()
        .commands_map
        .check_overwrite(&name, Overwrite::Forbid)
        .map_err(|err| Box::new((*err).with_location(ctx.location())))?;
    let component: &mut Component = ctx.session_mut().state.component_mut();
    let index = component.next_index;
    component.next_index += 1;
    tracing::debug!(register = %name, index, "allocated register");
    // Allocations are global, as in plain TeX.
    ctx.bind(name, Command::Register(index), Scope::Global);
    ctx.session_mut().set_register(index, 0, Scope::Global);
    Ok(())
}

/// Get the `\advance` command.
pub fn get_advance<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(advance_primitive_fn).with_doc(ADVANCE_DOC)
}

/// Get the `\multiply` command.
pub fn get_multiply<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(multiply_primitive_fn).with_doc(MULTIPLY_DOC)
}

/// Get the `\divide` command.
pub fn get_divide<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(divide_primitive_fn).with_doc(DIVIDE_DOC)
}

macro_rules! create_arithmetic_primitive {
    ($prim_fn: ident, $arithmetic_op: ident) => {
        fn $prim_fn<S: HasComponent<prefix::Component>>(
            invoker: &CommandRef,
            ctx: &mut dyn Context<S>,
        ) -> Result<()> {
            let scope = prefix::take_scope(ctx);
            let index = pop_register(invoker, ctx)?;
            pop_optional_by(ctx)?;
            let rhs = argument::pop_number(ctx)?;
            let lhs = ctx.session().register(index);
            let value = $arithmetic_op(invoker, ctx, lhs, rhs)?;
            ctx.session_mut().set_register(index, value, scope);
            Ok(())
        }
    };
}

// Overflow wraps, as TeX permits it in \advance and \multiply.
fn add<S: SessionState>(_: &CommandRef, _: &dyn Context<S>, lhs: i64, rhs: i64) -> Result<i64> {
    Ok(lhs.wrapping_add(rhs))
}

fn multiply<S: SessionState>(
    _: &CommandRef,
    _: &dyn Context<S>,
    lhs: i64,
    rhs: i64,
) -> Result<i64> {
    Ok(lhs.wrapping_mul(rhs))
}

fn divide<S: SessionState>(
    invoker: &CommandRef,
    ctx: &dyn Context<S>,
    lhs: i64,
    rhs: i64,
) -> Result<i64> {
    if rhs == 0 {
        return Err(ctx.report_error(Tag::DivisionByZero, vec![invoker.to_string()]));
    }
    Ok(lhs.wrapping_div(rhs))
}

create_arithmetic_primitive![advance_primitive_fn, add];
create_arithmetic_primitive![multiply_primitive_fn, multiply];
create_arithmetic_primitive![divide_primitive_fn, divide];

/// Pops a command bound to a register and returns the register's index.
fn pop_register<S: SessionState>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<usize> {
    loop {
        let object = match ctx.next_expanded()? {
            None => {
                return Err(ctx.report_error(
                    Tag::UnexpectedEndOfInput,
                    vec![format!("reading the register for {invoker}")],
                ))
            }
            Some(object) => object,
        };
        if object.is_whitespace() {
            continue;
        }
        if let Object::CommandRef(command_ref) = &object {
            if let Some(index) = argument::register_index(ctx, command_ref) {
                return Ok(index);
            }
        }
        return Err(ctx.report_error(
            Tag::ExpectedButFound,
            vec!["a register".to_string(), object.to_string()],
        ));
    }
}

/// Pops the optional `by` keyword. The letters may be in either case.
fn pop_optional_by<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<()> {
    let first = loop {
        match ctx.next_expanded()? {
            None => return Ok(()),
            Some(object) if object.is_whitespace() => continue,
            Some(object) => break object,
        }
    };
    if !matches!(first, Object::Char('b' | 'B', CatCode::Letter)) {
        ctx.push_front(first);
        return Ok(());
    }
    match ctx.next_expanded()? {
        Some(Object::Char('y' | 'Y', CatCode::Letter)) => Ok(()),
        Some(other) => Err(by_error(ctx, other.to_string())),
        None => Err(by_error(ctx, "the end of the input".to_string())),
    }
}

fn by_error<S: SessionState>(ctx: &dyn Context<S>, found: String) -> Box<Error> {
    ctx.report_error(
        Tag::ExpectedButFound,
        vec!["the keyword `by`".to_string(), found],
    )
}

/// Get the `\the` command.
///
/// Only registers are supported.
/// Any other object following `\the` is passed through unchanged.
pub fn get_the<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(the_primitive_fn).with_doc(THE_DOC)
}

fn the_primitive_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let object = match ctx.next_raw()? {
        None => {
            return Err(ctx.report_error(
                Tag::UnexpectedEndOfInput,
                vec![format!("reading the argument of {invoker}")],
            ))
        }
        Some(object) => object,
    };
    if let Object::CommandRef(command_ref) = &object {
        if let Some(index) = argument::register_index(ctx, command_ref) {
            return Ok(token::text_to_list(&ctx.session().register(index).to_string()));
        }
    }
    Ok(object.into_list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::{def, group};
    use std::collections::HashMap;

    fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> {
        HashMap::from([
            ("advance", get_advance()),
            ("begingroup", group::get_begingroup()),
            ("def", def::get_def()),
            ("divide", get_divide()),
            ("edef", def::get_edef()),
            ("endgroup", group::get_endgroup()),
            ("global", prefix::get_global()),
            ("multiply", get_multiply()),
            ("newcount", get_newcount()),
            ("the", get_the()),
        ])
    }

    macro_rules! arithmetic_test {
        ( $( ($name: ident, $op: expr, $lhs: expr, $rhs: expr, $expected: expr) ),* $(,)? ) => {
            test_suite![
                live_and_list_tests(
                    $(
                        (
                            $name,
                            format!(r"\newcount\c \c={} {}\c {} \the\c", $lhs, $op, $rhs),
                            $expected
                        ),
                    )*
                ),
            ];
        };
    }

    arithmetic_test![
        (advance_base_case, r"\advance", "1", "2", "3"),
        (advance_with_by, r"\advance", "1", "by 2", "3"),
        (advance_with_uppercase_by, r"\advance", "1", "BY 2", "3"),
        (advance_negative, r"\advance", "10", "-2", "8"),
        (
            advance_overflow,
            r"\advance",
            "9223372036854775807",
            "1",
            "-9223372036854775808"
        ),
        (multiply_base_case, r"\multiply", "5", "4", "20"),
        (multiply_with_by, r"\multiply", "5", "by -4", "-20"),
        (divide_base_case, r"\divide", "9", "4", "2"),
        (divide_rounds_towards_zero, r"\divide", "-9", "by 4", "-2"),
    ];

    test_suite![
        live_and_list_tests(
            (new_register_is_zero, r"\newcount\c \the\c", "0"),
            (assignment, r"\newcount\c \c=12 \the\c", "12"),
            (assignment_without_equals, r"\newcount\c \c 12 \the\c", "12"),
            (register_as_number, r"\newcount\a \newcount\b \a=3 \b=\a \the\b", "3"),
            (registers_are_distinct, r"\newcount\a \newcount\b \a=3 \b=4 \the\a\the\b", "34"),
            (assignment_is_local, r"\newcount\c \c=1 {\c=2 }\the\c", "1"),
            (
                assignment_is_local_to_begingroup,
                r"\newcount\c \c=1 \begingroup\c=2 \endgroup\the\c",
                "1"
            ),
            (global_assignment, r"\newcount\c \c=1 {\global\c=2 }\the\c", "2"),
            (advance_is_local, r"\newcount\c {\advance\c 5 }\the\c", "0"),
            (global_advance, r"\newcount\c {\global\advance\c by 5 }\the\c", "5"),
            (newcount_inside_group, r"{\newcount\c \global\c=4 }\the\c", "4"),
            (the_in_edef, r"\newcount\c \c=7 \edef\a{\the\c}\c=8 \a", "7"),
            (the_passes_other_objects_through, r"\the x", "x"),
        ),
        failure_tests(
            (newcount_twice, r"\newcount\c \newcount\c", Tag::AlreadyDefined),
            (advance_not_a_register, r"\def\a{}\advance\a by 1", Tag::ExpectedButFound),
            (advance_bad_keyword, r"\newcount\c \advance\c bx 1", Tag::ExpectedButFound),
            (divide_by_zero, r"\newcount\c \divide\c by 0", Tag::DivisionByZero),
            (assignment_needs_number, r"\newcount\c \c=x", Tag::NumberExpected),
            (the_end_of_input, r"\the", Tag::UnexpectedEndOfInput),
        ),
    ];
}
