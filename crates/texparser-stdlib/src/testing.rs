//! Utilities for writing unit tests of the standard library
//!
//! This re-exports the `texparser-testing` crate and adds a state type
//!     that includes the components needed by the commands in this crate.

pub use texparser_testing::*;

use crate::{conditional, expansion, input, prefix, registers, tracingmacros};
use texparser::command;
use texparser::context::Context;
use texparser::prelude::Result;
use texparser::session::{implement_has_component, Session};
use texparser::texmacro::Macro;
use texparser::token::{CommandRef, Object, ObjectList};
use texparser::traits::*;

/// State type for unit tests in this crate.
#[derive(Default)]
pub struct State {
    pub conditional: conditional::Component,
    pub prefix: prefix::Component,
    pub input: input::Component,
    pub registers: registers::Component,
    pub tracing_macros: tracingmacros::Component,
    pub testing: TestingComponent,
}

impl SessionState for State {
    fn character_handler(object: Object, ctx: &mut dyn Context<Self>) -> Result<()> {
        TestingComponent::character_handler(object, ctx)
    }

    fn undefined_command_handler(
        command_ref: &CommandRef,
        ctx: &mut dyn Context<Self>,
    ) -> Result<()> {
        TestingComponent::undefined_command_handler(command_ref, ctx)
    }

    fn post_macro_expansion_hook(
        session: &mut Session<Self>,
        invoker: &CommandRef,
        tex_macro: &Macro,
        arguments: &[Object],
        expansion: &ObjectList,
    ) {
        tracingmacros::hook(session, invoker, tex_macro, arguments, expansion)
    }

    fn expansion_override_hook(
        invoker: &CommandRef,
        tag: Option<command::Tag>,
        ctx: &mut dyn Context<Self>,
    ) -> Result<Option<ObjectList>> {
        expansion::expansion_override_hook(invoker, tag, ctx)
    }

    fn register_assignment_handler(
        index: usize,
        invoker: &CommandRef,
        ctx: &mut dyn Context<Self>,
    ) -> Result<()> {
        registers::assignment_handler(index, invoker, ctx)
    }
}

implement_has_component![
    State,
    (conditional::Component, conditional),
    (prefix::Component, prefix),
    (input::Component, input),
    (registers::Component, registers),
    (tracingmacros::Component, tracing_macros),
    (TestingComponent, testing),
];
