//! # The texparser standard library
//!
//! This crate contains implementations of TeX primitives and LaTeX kernel commands
//!     for the texparser engine.
//! Every command is written against the [Context](texparser::context::Context) interface only,
//!     so the same command works while reading the document and inside `\edef`.
//!
//! Commands that need state keep it in a component,
//!     and are generic over any session state that has the component.
//! [StdLibState] includes every component and [StdLibState::all_built_ins] every command.

extern crate texparser;
extern crate texparser_stdext;

use std::collections::HashMap;

use texparser::command::{self, BuiltIn};
use texparser::session::{implement_has_component, Session};
use texparser::context::Context;
use texparser::prelude::Result;
use texparser::texmacro::Macro;
use texparser::token::{CommandRef, Object, ObjectList};
use texparser::traits::*;

pub mod alias;
pub mod catcode;
pub mod conditional;
pub mod def;
pub mod expansion;
pub mod group;
pub mod input;
pub mod latex;
pub mod newcommand;
pub mod output;
pub mod prefix;
pub mod registers;
#[cfg(test)]
pub(crate) mod testing;
pub mod tracingmacros;
pub mod xparse;

/// A state struct that is compatible with every command in the standard library.
#[derive(Default)]
pub struct StdLibState {
    pub conditional: conditional::Component,
    pub input: input::Component,
    pub prefix: prefix::Component,
    pub registers: registers::Component,
    pub tracing_macros: tracingmacros::Component,
}

impl SessionState for StdLibState {
    #[inline]
    fn post_macro_expansion_hook(
        session: &mut Session<Self>,
        invoker: &CommandRef,
        tex_macro: &Macro,
        arguments: &[Object],
        expansion: &ObjectList,
    ) {
        tracingmacros::hook(session, invoker, tex_macro, arguments, expansion)
    }

    #[inline]
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
    StdLibState,
    (conditional::Component, conditional),
    (input::Component, input),
    (prefix::Component, prefix),
    (registers::Component, registers),
    (tracingmacros::Component, tracing_macros),
];

impl StdLibState {
    pub fn all_built_ins() -> HashMap<&'static str, BuiltIn<StdLibState>> {
        HashMap::from([
            ("@firstofone", latex::get_firstofone()),
            ("@firstoftwo", latex::get_firstoftwo()),
            ("@gobble", latex::get_gobble()),
            ("@gobbletwo", latex::get_gobbletwo()),
            ("@ifnextchar", latex::get_ifnextchar()),
            ("@ifstar", latex::get_ifstar()),
            ("@input", input::get_at_input()),
            ("@namedef", latex::get_namedef()),
            ("@nameuse", latex::get_nameuse()),
            ("@secondoftwo", latex::get_secondoftwo()),
            //
            ("BooleanFalse", xparse::get_boolean_false()),
            ("BooleanTrue", xparse::get_boolean_true()),
            //
            ("DeclareDocumentCommand", xparse::get_declare_document_command()),
            //
            ("IfBooleanF", xparse::get_if_boolean_f()),
            ("IfBooleanT", xparse::get_if_boolean_t()),
            ("IfBooleanTF", xparse::get_if_boolean_tf()),
            ("IfNoValueF", xparse::get_if_no_value_f()),
            ("IfNoValueT", xparse::get_if_no_value_t()),
            ("IfNoValueTF", xparse::get_if_no_value_tf()),
            ("InputIfFileExists", input::get_input_if_file_exists()),
            //
            ("NewDocumentCommand", xparse::get_new_document_command()),
            //
            ("PackageWarning", output::get_package_warning()),
            ("ProvideDocumentCommand", xparse::get_provide_document_command()),
            //
            ("RenewDocumentCommand", xparse::get_renew_document_command()),
            //
            ("advance", registers::get_advance()),
            ("aftergroup", group::get_aftergroup()),
            //
            ("begin", latex::get_begin()),
            ("begingroup", group::get_begingroup()),
            ("bgroup", group::get_bgroup()),
            //
            ("catcode", catcode::get_catcode()),
            ("csname", expansion::get_csname()),
            //
            ("def", def::get_def()),
            ("detokenize", expansion::get_detokenize()),
            ("divide", registers::get_divide()),
            //
            ("edef", def::get_edef()),
            ("egroup", group::get_egroup()),
            ("else", conditional::get_else()),
            ("end", latex::get_end()),
            ("endcsname", expansion::get_endcsname()),
            ("endgroup", group::get_endgroup()),
            ("expandafter", expansion::get_expandafter()),
            //
            ("fi", conditional::get_fi()),
            //
            ("gdef", def::get_gdef()),
            ("global", prefix::get_global()),
            //
            ("if", conditional::get_if()),
            ("ifcase", conditional::get_ifcase()),
            ("ifcat", conditional::get_ifcat()),
            ("iffalse", conditional::get_iffalse()),
            ("ifnum", conditional::get_ifnum()),
            ("ifodd", conditional::get_ifodd()),
            ("iftrue", conditional::get_iftrue()),
            ("ifx", conditional::get_ifx()),
            ("input", input::get_input()),
            //
            ("let", alias::get_let()),
            ("long", prefix::get_long()),
            //
            ("makeatletter", catcode::get_makeatletter()),
            ("makeatother", catcode::get_makeatother()),
            ("message", output::get_message()),
            ("multiply", registers::get_multiply()),
            //
            ("newcommand", newcommand::get_newcommand()),
            ("newcount", registers::get_newcount()),
            ("newenvironment", latex::get_newenvironment()),
            ("newif", conditional::get_newif()),
            ("noexpand", expansion::get_noexpand()),
            ("number", expansion::get_number()),
            //
            ("or", conditional::get_or()),
            //
            ("par", output::get_par()),
            ("protected", prefix::get_protected()),
            ("providecommand", newcommand::get_providecommand()),
            //
            ("relax", expansion::get_relax()),
            ("renewcommand", newcommand::get_renewcommand()),
            ("renewenvironment", latex::get_renewenvironment()),
            ("romannumeral", expansion::get_romannumeral()),
            //
            ("string", expansion::get_string()),
            //
            ("the", registers::get_the()),
            ("tracingmacros", tracingmacros::get_tracingmacros()),
            ("typeout", output::get_typeout()),
            //
            ("unexpanded", expansion::get_unexpanded()),
            //
            ("verb", latex::get_verb()),
            //
            ("warning", output::get_warning()),
            //
            ("xdef", def::get_xdef()),
        ])
    }

    /// Create a new session that uses the standard library's state and all of its commands.
    pub fn new_session() -> Box<Session<StdLibState>> {
        Session::<StdLibState>::new(StdLibState::all_built_ins())
    }
}

/// A TeX snippet that exercises some error case in the standard library.
pub struct ErrorCase {
    pub description: &'static str,
    pub source_code: &'static str,
}

impl ErrorCase {
    /// Returns a vector of TeX snippets that exercise the error paths of the standard library.
    pub fn all_error_cases() -> Vec<ErrorCase> {
        let mut cases = vec![];
        for (description, source_code) in [
            ("undefined control sequence", r"\elephant"),
            ("undefined control sequence with suggestion", r"\defx"),
            ("invalid character", "\u{7F}"),
            ("empty control sequence", r"\"),
            ("invalid end of group", r"}"),
            ("unclosed group", r"{"),
            ("unclosed \\begingroup", r"\begingroup"),
            ("end of input after \\global", r"\global"),
            ("can't be prefixed by \\global", r"\global \relax"),
            ("can't be prefixed by \\global (character)", r"\global a"),
            ("can't be prefixed by \\long", r"\long \let \a = \def"),
            ("end of input reading macro name", r"\def"),
            ("macro name is a character", r"\def a{}"),
            ("end of input reading replacement text", r"\def\a{"),
            ("parameters out of order", r"\def\a#2{}"),
            ("illegal parameter in replacement text", r"\def\a#1{#2}"),
            ("macro use does not match definition", r"\def\a.{}\a,"),
            ("\\par in short argument", r"\def\a#1{}\a{\par}"),
            ("invalid \\let target", r"\let a = \def"),
            ("end of input in \\let", r"\let"),
            ("category code out of bounds", r"\catcode 0 = 17"),
            ("character code out of bounds", r"\catcode -1 = 11"),
            ("invalid start of number", r"\number X"),
            ("decimal number too big", r"\number 1000000000000000000000"),
            ("end of input in \\csname", r"\csname abc"),
            ("extra \\endcsname", r"\endcsname"),
            ("\\newcommand of an existing command", r"\newcommand\def{}"),
            ("\\renewcommand of an undefined command", r"\renewcommand\undefined{}"),
            ("too many \\newcommand arguments", r"\newcommand\a[10]{}"),
            ("unsupported argument spec", r"\NewDocumentCommand\a{q}{}"),
            ("missing required argument", r"\NewDocumentCommand\a{r()}{}\a x"),
            ("unterminated \\verb", r"\verb|abc"),
            ("end of input in the number of arguments", r"\newcommand\a[1"),
            ("end of input in a false branch", r"\iffalse abc"),
            ("extra \\fi", r"\fi"),
            ("extra \\else", r"\iffalse\else\else\fi"),
            ("extra \\or", r"\iftrue\or\fi"),
            ("invalid relation in \\ifnum", r"\ifnum 1 ! 2 \fi"),
            ("\\newif name without if", r"\newif\foo"),
            ("\\advance of a macro", r"\def\a{}\advance\a by 1"),
            ("division by zero", r"\newcount\c \divide\c 0"),
            ("\\newcount of an existing command", r"\newcount\def"),
            ("end of input after \\noexpand", r"\edef\a{\noexpand}"),
            ("roman numeral too big", r"\romannumeral 99999999"),
            ("undefined environment", r"\begin{elephant}"),
            ("mismatched environments", r"\newenvironment{a}{}{}\begin{a}\end{b}"),
            ("\\end without \\begin", r"\end{a}"),
            ("unclosed environment", r"\newenvironment{a}{}{}\begin{a}"),
        ] {
            cases.push(ErrorCase {
                description,
                source_code,
            })
        }
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("edef", def::get_edef()),
            ("expandafter", expansion::get_expandafter()),
            ("newcommand", newcommand::get_newcommand()),
            ("NewDocumentCommand", xparse::get_new_document_command()),
            ("IfBooleanTF", xparse::get_if_boolean_tf()),
            ("makeatletter", catcode::get_makeatletter()),
            ("@ifnextchar", latex::get_ifnextchar()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (
                newcommand_and_document_command_together,
                r"\newcommand\x[1]{<#1>}\NewDocumentCommand\y{s m}{\IfBooleanTF{#1}{\x{#2}}{#2}}\y*{a}\y{b}",
                "<a>b"
            ),
            (
                latex_optional_argument_pattern,
                r"\makeatletter\def\a{\@ifnextchar[\b{\b[none]}}\def\b[#1]{#1}\a\a[x]",
                "nonex"
            ),
        ),
    ];

    #[test]
    fn all_error_cases() {
        for case in ErrorCase::all_error_cases() {
            let mut session = StdLibState::new_session();
            session.terminal_out = std::rc::Rc::new(std::cell::RefCell::new(std::io::sink()));
            session.push_source("input.tex", case.source_code).unwrap();
            if session.run().is_ok() {
                panic!(
                    "successfully ran {} (`{}`) but expected an error",
                    case.description, case.source_code
                );
            }
        }
    }

    #[test]
    fn all_built_ins_have_docs() {
        for (name, built_in) in StdLibState::all_built_ins() {
            if matches!(name, "bgroup" | "egroup" | "BooleanTrue" | "BooleanFalse") {
                continue;
            }
            assert!(built_in.doc().is_some(), "\\{name} has no documentation");
        }
    }

    #[test]
    fn end_to_end_document() {
        let mut session = StdLibState::new_session();
        session
            .push_source(
                "main.tex",
                r"\newcommand\greet[2][Hello]{#1, #2!}\greet{World}\par\greet[Bye]{now}",
            )
            .unwrap();
        session.run().unwrap();
        assert_eq!(session.output(), "Hello, World!\n\nBye, now!");
    }
}
