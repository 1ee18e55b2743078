//! Macro debugging with `\tracingmacros`
//!
//! When `\tracingmacros` is positive, every macro expansion writes a trace to the terminal
//!     showing the arguments, the replacement text and the resulting expansion.
//! The trace is produced by [hook], which the session state must invoke from
//!     its [post_macro_expansion_hook](SessionState::post_macro_expansion_hook).

use crate::catcode::pop_optional_equals;
use texparser::command::BuiltIn;
use texparser::context::{argument, Context};
use texparser::prelude::Result;
use texparser::session::Session;
use texparser::texmacro::{self, Macro};
use texparser::token::{write_objects, CommandRef, Object, ObjectList};
use texparser::traits::*;
use texparser_stdext::color::Colorize;

pub const TRACINGMACROS_DOC: &str = "Trace macro expansions if the value is positive";

/// Component for storing state related to macro tracing.
#[derive(Default)]
pub struct Component {
    tracing_macros: i64,
}

impl Component {
    pub fn tracing_macros(&self) -> i64 {
        self.tracing_macros
    }

    pub fn set_tracing_macros(&mut self, value: i64) {
        self.tracing_macros = value;
    }
}

/// Get the `\tracingmacros` command.
///
/// Usage: `\tracingmacros [=] <number>`.
pub fn get_tracingmacros<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(tracingmacros_primitive_fn).with_doc(TRACINGMACROS_DOC)
}

fn tracingmacros_primitive_fn<S: HasComponent<Component>>(
    _: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    pop_optional_equals(ctx)?;
    let value = argument::pop_number(ctx)?;
    ctx.session_mut()
        .state
        .component_mut()
        .set_tracing_macros(value);
    Ok(())
}

/// Writes a trace of the macro expansion to the terminal, if tracing is enabled.
pub fn hook<S: HasComponent<Component>>(
    session: &mut Session<S>,
    invoker: &CommandRef,
    tex_macro: &Macro,
    arguments: &[Object],
    expansion: &ObjectList,
) {
    if session.state.component().tracing_macros <= 0 {
        return;
    }
    let mut trace = String::new();
    trace.push_str(&format!(
        "{}{}\n",
        "Macro expansion trace of ".bold(),
        invoker.to_string().as_str().bold()
    ));
    if let Some(location) = session.location() {
        trace.push_str(&format!(" {} {location}\n", "-->".bright_cyan()));
    }
    trace.push_str("                        ┌──\n");
    trace.push_str("              arguments ");
    if arguments.is_empty() {
        trace.push_str("│ (none)\n                        ");
    }
    for (i, argument) in arguments.iter().enumerate() {
        let rendered = write_objects(&argument.clone().into_list());
        trace.push_str(&format!(
            "│ {}{}={}\n                        ",
            "#".bright_yellow(),
            (i + 1).to_string().as_str().bright_yellow(),
            rendered.as_str().bright_yellow()
        ));
    }
    trace.push_str(&format!(
        "├──\n replacement definition │ {}\n",
        texmacro::pretty_print_template(tex_macro.template())
    ));
    trace.push_str(&format!(
        "                        ├──\n              expansion │ {}\n",
        write_objects(expansion)
    ));
    trace.push_str("                        └──");
    session.write_message(&trace);
}
