//! Commands that produce output or messages: `\par`, `\message`, `\typeout`, `\warning` and `\PackageWarning`

use texparser::command::BuiltIn;
use texparser::context::{ArgumentStyle, Context};
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::token::{self, CommandRef};
use texparser::traits::*;

pub const PAR_DOC: &str = "End the current paragraph";
pub const MESSAGE_DOC: &str = "Write the fully expanded argument to the terminal";
pub const WARNING_DOC: &str = "Report a warning with the fully expanded argument";
pub const PACKAGE_WARNING_DOC: &str = "Report a warning on behalf of a package: \\PackageWarning{<package>}{<message>}";

const PARAGRAPH_BREAK: &str = "\n\n";

/// Get the `\par` command.
///
/// A paragraph break is emitted unless the output is empty or already ends with one,
///     so consecutive `\par` commands produce a single break.
pub fn get_par<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(par_primitive_fn).with_doc(PAR_DOC)
}

fn par_primitive_fn<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<()> {
    ctx.session_mut().trim_output_end();
    let output = ctx.session().output();
    if output.is_empty() || output.ends_with(PARAGRAPH_BREAK) {
        return Ok(());
    }
    ctx.emit(PARAGRAPH_BREAK);
    Ok(())
}

/// Get the `\message` command.
pub fn get_message<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(message_primitive_fn).with_doc(MESSAGE_DOC)
}

/// Get the `\typeout` command.
///
/// This is the LaTeX name for `\message`.
pub fn get_typeout<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(message_primitive_fn).with_doc(MESSAGE_DOC)
}

fn message_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let text = pop_expanded_text(ctx)?;
    ctx.session().write_message(&text);
    Ok(())
}

/// Get the `\warning` command.
pub fn get_warning<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(warning_primitive_fn).with_doc(WARNING_DOC)
}

fn warning_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let text = pop_expanded_text(ctx)?;
    ctx.report_warning(Tag::User, vec![text]);
    Ok(())
}

/// Get the `\PackageWarning` command.
pub fn get_package_warning<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(package_warning_primitive_fn).with_doc(PACKAGE_WARNING_DOC)
}

fn package_warning_primitive_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let package = pop_expanded_text(ctx)?;
    let text = pop_expanded_text(ctx)?;
    ctx.report_warning(
        Tag::User,
        vec![format!("Package {} Warning: {text}", package.trim())],
    );
    Ok(())
}

fn pop_expanded_text<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<String> {
    let argument = ctx
        .pop_argument(&ArgumentStyle::MandatoryBrace)?
        .into_list();
    let expanded = ctx.expand_fully(argument)?;
    Ok(token::write_objects(&expanded))
}
