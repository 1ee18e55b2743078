//! LaTeX kernel utilities
//!
//! These are the argument juggling macros of the LaTeX kernel,
//!     like `\@firstoftwo` and `\@ifnextchar`, the `\verb` command,
//!     and environments: `\newenvironment`, `\begin` and `\end`.
//! Most of the macros have `@` in their names and so can only be used after `\makeatletter`.
//!
//! ## Environments
//!
//! `\newenvironment{name}[n][default]{begin code}{end code}` defines two macros:
//!     `\name`, taking the arguments and expanding to the begin code,
//!     and `\endname`, expanding to the end code.
//! `\begin{name}` starts a group, records the name in `\@currenvir` and then runs `\name`.
//! `\end{name}` checks the name against `\@currenvir`, runs `\endname` and ends the group.
//! The `document` environment needs no definition and opens no group.

use crate::newcommand::pop_macro;
use std::rc::Rc;
use texparser::command::{BuiltIn, Command, Overwrite};
use texparser::context::{ArgumentStyle, Context};
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::texmacro::Macro;
use texparser::token::{self, CommandRef, Object, ObjectList};
use texparser::traits::*;
use texparser_stdext::collections::groupingmap::Scope;

pub const FIRSTOFONE_DOC: &str = "Expand to the argument";
pub const FIRSTOFTWO_DOC: &str = "Expand to the first of two arguments";
pub const SECONDOFTWO_DOC: &str = "Expand to the second of two arguments";
pub const GOBBLE_DOC: &str = "Discard one argument";
pub const GOBBLETWO_DOC: &str = "Discard two arguments";
pub const IFNEXTCHAR_DOC: &str = "Branch on the next character: \\@ifnextchar<char>{<yes>}{<no>}";
pub const IFSTAR_DOC: &str = "Branch on whether the next character is a star, consuming the star";
pub const NAMEDEF_DOC: &str = "Define a macro whose name is given as text";
pub const NAMEUSE_DOC: &str = "Use a macro whose name is given as text";
pub const VERB_DOC: &str = "Typeset text verbatim: \\verb|<text>|";
pub const NEWENVIRONMENT_DOC: &str =
    "Define a new environment: \\newenvironment{name}[n][default]{begin}{end}";
pub const RENEWENVIRONMENT_DOC: &str = "Redefine an existing environment";
pub const BEGIN_DOC: &str = "Begin an environment";
pub const END_DOC: &str = "End the current environment";

const CURRENT_ENVIRONMENT: &str = "@currenvir";
const DOCUMENT: &str = "document";

/// Get the `\@firstofone` command.
pub fn get_firstofone<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(pick_fn::<S, 1, 0>).with_doc(FIRSTOFONE_DOC)
}

/// Get the `\@firstoftwo` command.
pub fn get_firstoftwo<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(pick_fn::<S, 2, 0>).with_doc(FIRSTOFTWO_DOC)
}

/// Get the `\@secondoftwo` command.
pub fn get_secondoftwo<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(pick_fn::<S, 2, 1>).with_doc(SECONDOFTWO_DOC)
}

/// Get the `\@gobble` command.
pub fn get_gobble<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(pick_fn::<S, 1, NONE>).with_doc(GOBBLE_DOC)
}

/// Get the `\@gobbletwo` command.
pub fn get_gobbletwo<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(pick_fn::<S, 2, NONE>).with_doc(GOBBLETWO_DOC)
}

const NONE: usize = usize::MAX;

/// Pops `N` arguments and expands to the one with index `I`, or to nothing if there is no such index.
fn pick_fn<S: SessionState, const N: usize, const I: usize>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let mut result = ObjectList::new();
    for i in 0..N {
        let argument = ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?;
        if i == I {
            result = argument.into_list();
        }
    }
    Ok(result)
}

/// Get the `\@ifnextchar` command.
pub fn get_ifnextchar<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(ifnextchar_fn).with_doc(IFNEXTCHAR_DOC)
}

fn ifnextchar_fn<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let target = match ctx.pop_object()? {
        None => {
            return Err(ctx.report_error(
                Tag::UnexpectedEndOfInput,
                vec![format!("reading the character for {invoker}")],
            ))
        }
        Some(target) => target,
    };
    let yes = ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?;
    let no = ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?;
    // Spaces before the next character are skipped, but the character itself is left in place.
    let matches = loop {
        let next_is_whitespace = match ctx.peek_raw()? {
            None => break false,
            Some(next) if next.is_whitespace() => true,
            Some(next) => break next_matches(&target, next),
        };
        if next_is_whitespace {
            ctx.next_raw()?;
        }
    };
    Ok(if matches { yes } else { no }.into_list())
}

fn next_matches(target: &Object, next: &Object) -> bool {
    match target {
        Object::Char(c, _) => next.is_char(*c) || next == target,
        _ => next == target,
    }
}

/// Get the `\@ifstar` command.
pub fn get_ifstar<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(ifstar_fn).with_doc(IFSTAR_DOC)
}

fn ifstar_fn<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<ObjectList> {
    let yes = ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?;
    let no = ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?;
    let star = ctx.pop_argument(&ArgumentStyle::StarModifier)?;
    Ok(match star {
        Object::Boolean(true) => yes,
        _ => no,
    }
    .into_list())
}

/// Get the `\@namedef` command.
///
/// `\@namedef{name}` expands to `\def\name`, so the parameter text and body follow as for `\def`.
pub fn get_namedef<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(namedef_fn).with_doc(NAMEDEF_DOC)
}

fn namedef_fn<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<ObjectList> {
    let name = pop_name(ctx)?;
    Ok(vec![Object::control_sequence("def"), Object::control_sequence(&name)].into())
}

/// Get the `\@nameuse` command.
///
/// If the name is not defined, the expansion is empty.
pub fn get_nameuse<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_expansion(nameuse_fn).with_doc(NAMEUSE_DOC)
}

fn nameuse_fn<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<ObjectList> {
    let name = pop_name(ctx)?;
    let command_ref = CommandRef::control_sequence(&name);
    if ctx.resolve(&command_ref).is_none() {
        return Ok(ObjectList::new());
    }
    Ok(vec![Object::CommandRef(command_ref)].into())
}

fn pop_name<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<String> {
    match ctx.pop_argument(&ArgumentStyle::Label)? {
        Object::Text(name) => Ok(name),
        other => Ok(other.to_string()),
    }
}

/// Get the `\verb` command.
///
/// When executed, the text is emitted as is.
/// With a star, spaces are emitted as `␣`.
/// When expanded, as inside `\edef`, the text becomes character objects.
pub fn get_verb<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_both(verb_expansion_fn, verb_execution_fn).with_doc(VERB_DOC)
}

fn verb_expansion_fn<S: SessionState>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let (star, text) = pop_verbatim(ctx)?;
    Ok(token::text_to_list(&render_verbatim(star, &text)))
}

fn verb_execution_fn<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<()> {
    let (star, text) = pop_verbatim(ctx)?;
    ctx.emit(&render_verbatim(star, &text));
    Ok(())
}

fn pop_verbatim<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<(bool, String)> {
    let star = matches!(
        ctx.pop_argument(&ArgumentStyle::StarModifier)?,
        Object::Boolean(true)
    );
    let text = ctx.read_verbatim(None)?;
    Ok((star, text))
}

fn render_verbatim(star: bool, text: &str) -> String {
    if star {
        text.replace(' ', "␣")
    } else {
        text.to_string()
    }
}

/// Get the `\newenvironment` command.
pub fn get_newenvironment<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(newenvironment_primitive_fn::<S, false>).with_doc(NEWENVIRONMENT_DOC)
}

/// Get the `\renewenvironment` command.
pub fn get_renewenvironment<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(newenvironment_primitive_fn::<S, true>).with_doc(RENEWENVIRONMENT_DOC)
}

fn newenvironment_primitive_fn<S: SessionState, const RENEW: bool>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let short = matches!(
        ctx.pop_argument(&ArgumentStyle::StarModifier)?,
        Object::Boolean(true)
    );
    let name = pop_name(ctx)?;
    let begin = pop_macro(ctx, short)?;
    let end_code = ctx
        .pop_argument(&ArgumentStyle::MandatoryBraceLong)?
        .into_list();
    let end = Macro::new(ObjectList::new(), vec![], &end_code)
        .map_err(|err| Box::new((*err).with_location(ctx.location())))?;

    let begin_name = CommandRef::control_sequence(&name);
    let policy = if RENEW {
        if ctx.resolve(&begin_name).is_none() {
            return Err(ctx.report_error(Tag::UndefinedEnvironment, vec![name]));
        }
        Overwrite::Force
    } else {
        Overwrite::Forbid
    };
    ctx.session()
        .commands_map
        .check_overwrite(&begin_name, policy)
        .map_err(|err| Box::new((*err).with_location(ctx.location())))?;
    tracing::debug!(environment = %name, "defining environment");
    ctx.bind(begin_name, Command::Macro(Rc::new(begin)), Scope::Local);
    ctx.bind(
        CommandRef::control_sequence(&format!("end{name}")),
        Command::Macro(Rc::new(end)),
        Scope::Local,
    );
    Ok(())
}

/// Get the `\begin` command.
pub fn get_begin<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(begin_primitive_fn).with_doc(BEGIN_DOC)
}

fn begin_primitive_fn<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<()> {
    let name = pop_name(ctx)?;
    if name == DOCUMENT {
        return Ok(());
    }
    let begin_name = CommandRef::control_sequence(&name);
    if ctx.resolve(&begin_name).is_none() {
        return Err(ctx.report_error(Tag::UndefinedEnvironment, vec![name]));
    }
    ctx.start_group();
    let current = Macro::new(ObjectList::new(), vec![], &token::text_to_list(&name))
        .map_err(|err| Box::new((*err).with_location(ctx.location())))?;
    ctx.bind(
        CommandRef::control_sequence(CURRENT_ENVIRONMENT),
        Command::Macro(Rc::new(current)),
        Scope::Local,
    );
    ctx.push_front(Object::CommandRef(begin_name));
    Ok(())
}

/// Get the `\end` command.
pub fn get_end<S: SessionState>() -> BuiltIn<S> {
    BuiltIn::new_execution(end_primitive_fn).with_doc(END_DOC)
}

fn end_primitive_fn<S: SessionState>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<()> {
    let name = pop_name(ctx)?;
    if name == DOCUMENT {
        return Ok(());
    }
    let current = match ctx.resolve(&CommandRef::control_sequence(CURRENT_ENVIRONMENT)) {
        None => {
            return Err(ctx.report_error(
                Tag::ExtraCommand,
                vec![format!("{invoker}{{{name}}}")],
            ))
        }
        Some(binding) => match &binding.command {
            Command::Macro(tex_macro) => token::write_objects(&tex_macro.instantiate(&[])),
            _ => String::new(),
        },
    };
    if current != name {
        return Err(ctx.report_error(
            Tag::EnvironmentMismatch,
            vec![format!("{{{current}}}"), format!("{{{name}}}")],
        ));
    }
    let end_name = CommandRef::control_sequence(&format!("end{name}"));
    if ctx.resolve(&end_name).is_some() {
        ctx.process_list(vec![Object::CommandRef(end_name)].into())?;
    }
    ctx.end_group()
}
