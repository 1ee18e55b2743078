//! Category code commands: `\catcode`, `\makeatletter` and `\makeatother`

use crate::prefix;
use texparser::catcode::CatCode;
use texparser::command::BuiltIn;
use texparser::context::Context;
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::token::CommandRef;
use texparser::traits::*;
use texparser_stdext::collections::groupingmap::Scope;

pub const CATCODE_DOC: &str = "Set the category code of a character";
pub const MAKEATLETTER_DOC: &str = "Make `@` a letter, so that it can appear in control words";
pub const MAKEATOTHER_DOC: &str = "Make `@` an other character again";

/// Get the `\catcode` command.
///
/// Usage: `\catcode <character code> [=] <category code>`.
pub fn get_catcode<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(catcode_primitive_fn).with_doc(CATCODE_DOC)
}

/// Get the `\makeatletter` command.
pub fn get_makeatletter<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(makeatletter_primitive_fn).with_doc(MAKEATLETTER_DOC)
}

/// Get the `\makeatother` command.
pub fn get_makeatother<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(makeatother_primitive_fn).with_doc(MAKEATOTHER_DOC)
}

fn catcode_primitive_fn<S: HasComponent<prefix::Component>>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let scope = prefix::take_scope(ctx);
    let char_code = texparser::context::argument::pop_number(ctx)?;
    let c = match u32::try_from(char_code).ok().and_then(char::from_u32) {
        None => {
            return Err(ctx.report_error(Tag::CharCodeOutOfRange, vec![char_code.to_string()]))
        }
        Some(c) => c,
    };
    pop_optional_equals(ctx)?;
    let raw_cat_code = texparser::context::argument::pop_number(ctx)?;
    let cat_code = match u8::try_from(raw_cat_code)
        .ok()
        .and_then(|n| CatCode::try_from(n).ok())
    {
        None => {
            return Err(ctx.report_error(Tag::InvalidCatCode, vec![raw_cat_code.to_string()]))
        }
        Some(cat_code) => cat_code,
    };
    ctx.set_catcode(c, cat_code, scope);
    Ok(())
}

/// Consumes an `=` sign and the spaces around it, if there is one.
pub(crate) fn pop_optional_equals<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<()> {
    loop {
        match ctx.next_expanded()? {
            None => return Ok(()),
            Some(object) if object.is_whitespace() => continue,
            Some(object) if object.is_char('=') => break,
            Some(object) => {
                ctx.push_front(object);
                return Ok(());
            }
        }
    }
    loop {
        match ctx.peek()? {
            Some(object) if object.is_whitespace() => {
                ctx.next_raw()?;
            }
            _ => return Ok(()),
        }
    }
}

fn makeatletter_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    ctx.set_catcode('@', CatCode::Letter, Scope::Local);
    Ok(())
}

fn makeatother_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    ctx.set_catcode('@', CatCode::Other, Scope::Local);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::testing::*;
    use std::collections::HashMap;

    fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> {
        HashMap::from([
            ("catcode", get_catcode()),
            ("def", def::get_def()),
            ("global", prefix::get_global()),
            ("makeatletter", get_makeatletter()),
            ("makeatother", get_makeatother()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (catcode_base_case, r"\catcode 48 11 \def\a0{x}\a0", "x"),
            (catcode_with_equals, r"\catcode 48 = 11 \def\a0{x}\a0", "x"),
            (
                catcode_character_code,
                r"\catcode`\@=11 \def\a@b{x}\a@b",
                "x"
            ),
            (
                catcode_is_local,
                r"{\catcode`\@=11 }\def\a{x}\a@b",
                "x@b"
            ),
            (
                catcode_active_character,
                r"\catcode`\A=13 \def A{x}A",
                "x"
            ),
            (
                catcode_custom_braces,
                r"\catcode`\[=1 \catcode`\]=2 \def\a[x]\a",
                "x"
            ),
            (
                makeatletter,
                r"\makeatletter\def\a@b{x}\a@b\makeatother",
                "x"
            ),
            (
                makeatother,
                r"\makeatletter\makeatother\def\a{x}\a@",
                "x@"
            ),
        ),
        failure_tests(
            (catcode_value_too_large, r"\catcode 48 16 ", Tag::InvalidCatCode),
            (catcode_value_is_negative, r"\catcode 48 -1 ", Tag::InvalidCatCode),
            (catcode_char_is_negative, r"\catcode -1 11 ", Tag::CharCodeOutOfRange),
            (catcode_char_too_large, r"\catcode 1114112 11 ", Tag::CharCodeOutOfRange),
            (catcode_missing_number, r"\catcode a", Tag::NumberExpected),
        ),
    ];
}
