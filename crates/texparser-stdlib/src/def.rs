//! Primitives for creating user-defined macros (`\def` and friends).

use crate::prefix;
use std::rc::Rc;
use texparser::catcode::CatCode;
use texparser::command::{BuiltIn, Command};
use texparser::context::{ArgumentStyle, Context};
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::texmacro::Macro;
use texparser::token::{CommandRef, GroupKind, Object, ObjectList};
use texparser::traits::*;
use texparser_stdext::collections::groupingmap::Scope;

pub const DEF_DOC: &str = "Define a custom macro";
pub const GDEF_DOC: &str = "Define a custom macro globally";
pub const EDEF_DOC: &str = "Define a custom macro, fully expanding the replacement text first";
pub const XDEF_DOC: &str =
    "Define a custom macro globally, fully expanding the replacement text first";

/// Get the `\def` command.
pub fn get_def<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(def_primitive_fn::<S, false, false>).with_doc(DEF_DOC)
}

/// Get the `\gdef` command.
pub fn get_gdef<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(def_primitive_fn::<S, true, false>).with_doc(GDEF_DOC)
}

/// Get the `\edef` command.
pub fn get_edef<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(def_primitive_fn::<S, false, true>).with_doc(EDEF_DOC)
}

/// Get the `\xdef` command.
pub fn get_xdef<S: HasComponent<prefix::Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(def_primitive_fn::<S, true, true>).with_doc(XDEF_DOC)
}

fn def_primitive_fn<S: HasComponent<prefix::Component>, const GLOBAL: bool, const EXPAND: bool>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let prefixes = ctx.session_mut().state.component_mut().take();
    let name = match ctx.pop_object()? {
        None => {
            return Err(ctx.report_error(
                Tag::UnexpectedEndOfInput,
                vec![format!("reading the name of the macro defined by {invoker}")],
            ))
        }
        Some(Object::CommandRef(command_ref)) => command_ref,
        Some(other) => return Err(ctx.report_error(Tag::CsExpected, vec![other.to_string()])),
    };
    let parameter_text = parse_parameter_text(&name, ctx)?;
    let mut body = ctx
        .pop_argument(&ArgumentStyle::MandatoryBraceLong)?
        .into_list();
    if EXPAND {
        body = ctx.expand_fully(body)?;
    }
    let tex_macro = Macro::from_def_parameters(&parameter_text, &body, prefixes.long)
        .map_err(|err| Box::new((*err).with_location(ctx.location())))?
        .with_protected(prefixes.protected);
    let scope = if GLOBAL { Scope::Global } else { prefixes.scope() };
    ctx.bind(name, Command::Macro(Rc::new(tex_macro)), scope);
    Ok(())
}

/// Reads everything up to the opening brace of the replacement text.
fn parse_parameter_text<S: SessionState>(
    name: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let mut parameter_text = ObjectList::new();
    loop {
        let at_body = match ctx.peek_raw()? {
            None => None,
            Some(object) => Some(matches!(
                object,
                Object::Char(_, CatCode::BeginGroup) | Object::Group(_, GroupKind::Brace)
            )),
        };
        match at_body {
            None => {
                return Err(ctx.report_error(
                    Tag::UnexpectedEndOfInput,
                    vec![format!("reading the parameter text of {name}")],
                ))
            }
            Some(true) => return Ok(parameter_text),
            Some(false) => {
                if let Some(object) = ctx.next_raw()? {
                    parameter_text.push_back(object);
                }
            }
        }
    }
}
