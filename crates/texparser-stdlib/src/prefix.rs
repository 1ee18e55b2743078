//! The `\global`, `\long` and `\protected` prefix commands
//!
//! A prefix does not do anything by itself.
//! It records a flag in the [Component] and leaves the command it prefixes in the input,
//!     and that command reads the flags when it runs.
//!
//! # Developer notes
//!
//! The flags must be reset after every prefixed command,
//!     otherwise `\global` would make all subsequent definitions global.
//! The convention is that every command that accepts a prefix reads the flags
//!     exactly once using [Component::take], which returns the flags and resets them.
//! All code paths within such a command must call [take](Component::take),
//!     even the ones that do not use the result.
//! For example `\gdef` always defines globally, but it still calls `take`.
//!
//! Which commands accept which prefixes is decided by the name of the command's binding.
//! Because `\let` copies bindings, `\let\mydef\def \global\mydef...` works as in TeX.

use texparser::command::{BuiltIn, Command};
use texparser::context::Context;
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::token::{CommandRef, Object};
use texparser::traits::*;
use texparser_stdext::collections::groupingmap::Scope;

pub const GLOBAL_DOC: &str = "Make the following definition global";
pub const LONG_DOC: &str = "Allow the arguments of the following macro to contain \\par";
pub const PROTECTED_DOC: &str = "Keep the following macro from expanding inside \\edef";

/// Commands that accept all prefixes.
const DEFINITIONS: [&str; 4] = ["def", "gdef", "edef", "xdef"];

/// Commands that only accept `\global`.
///
/// Integer registers accept `\global` too.
const ASSIGNMENTS: [&str; 6] = ["let", "catcode", "advance", "multiply", "divide", "newif"];

/// Prefix flags that apply to the next command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Prefixes {
    pub global: bool,
    pub long: bool,
    pub protected: bool,
}

impl Prefixes {
    /// The scope of an assignment made with these prefixes.
    pub fn scope(&self) -> Scope {
        if self.global {
            Scope::Global
        } else {
            Scope::Local
        }
    }

    fn only_global(&self) -> bool {
        !self.long && !self.protected
    }
}

/// Component for the prefix commands.
#[derive(Default)]
pub struct Component {
    prefixes: Prefixes,
}

impl Component {
    /// Returns the current prefixes and resets them.
    ///
    /// See the module documentation for correct usage of this method.
    pub fn take(&mut self) -> Prefixes {
        std::mem::take(&mut self.prefixes)
    }
}

/// Returns the scope given by the current prefixes and resets them.
pub fn take_scope<S: HasComponent<Component>>(ctx: &mut dyn Context<S>) -> Scope {
    ctx.session_mut().state.component_mut().take().scope()
}

/// Get the `\global` command.
pub fn get_global<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(global_primitive_fn).with_doc(GLOBAL_DOC)
}

/// Get the `\long` command.
pub fn get_long<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(long_primitive_fn).with_doc(LONG_DOC)
}

/// Get the `\protected` command.
pub fn get_protected<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(protected_primitive_fn).with_doc(PROTECTED_DOC)
}

fn global_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let prefixes = Prefixes {
        global: true,
        ..Default::default()
    };
    process_prefixes(prefixes, invoker, ctx)
}

fn long_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let prefixes = Prefixes {
        long: true,
        ..Default::default()
    };
    process_prefixes(prefixes, invoker, ctx)
}

fn protected_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let prefixes = Prefixes {
        protected: true,
        ..Default::default()
    };
    process_prefixes(prefixes, invoker, ctx)
}

fn process_prefixes<S: HasComponent<Component>>(
    mut prefixes: Prefixes,
    first: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    loop {
        let object = match ctx.next_expanded()? {
            None => {
                return Err(ctx.report_error(
                    Tag::UnexpectedEndOfInput,
                    vec![format!("reading the command after {first}")],
                ))
            }
            Some(object) => object,
        };
        if object.is_whitespace() {
            continue;
        }
        let command_ref = match object {
            Object::CommandRef(command_ref) => command_ref,
            other => {
                return Err(ctx.report_error(
                    Tag::CannotBePrefixed,
                    vec![other.to_string(), first.to_string()],
                ))
            }
        };
        let binding = match ctx.resolve(&command_ref) {
            None => return Err(ctx.session().undefined_command_error(&command_ref)),
            Some(binding) => binding,
        };
        let name = binding.name().name();
        match name.as_str() {
            "global" => {
                prefixes.global = true;
                continue;
            }
            "long" => {
                prefixes.long = true;
                continue;
            }
            "protected" => {
                prefixes.protected = true;
                continue;
            }
            _ => {}
        }
        let accepted = match binding.command {
            Command::Register(_) => prefixes.only_global(),
            Command::Executable(_) => {
                DEFINITIONS.contains(&name.as_str())
                    || (prefixes.only_global() && ASSIGNMENTS.contains(&name.as_str()))
            }
            _ => false,
        };
        if !accepted {
            return Err(ctx.report_error(
                Tag::CannotBePrefixed,
                vec![command_ref.to_string(), first.to_string()],
            ));
        }
        ctx.session_mut().state.component_mut().prefixes = prefixes;
        ctx.push_front(Object::CommandRef(command_ref));
        return Ok(());
    }
}
