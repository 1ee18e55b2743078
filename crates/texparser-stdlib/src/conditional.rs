//! Conditionals: `\if`, `\ifx`, `\ifnum`, `\ifcase` and friends
//!
//! A conditional that evaluates to true expands to nothing and records an open branch.
//! One that evaluates to false skips raw input up to the matching `\else` or `\fi`.
//! The branch commands recognize each other by [tag](texparser::command::Tag),
//!     so `\let\myfi=\fi` works as in TeX.
//!
//! In a list context brace groups are single objects, and so they are skipped as a whole.

use crate::prefix;
use std::rc::Rc;
use texparser::catcode::CatCode;
use texparser::command::{self, Binding, BuiltIn, Command, StaticTag};
use texparser::context::{ArgumentStyle, Context};
use texparser::error::{Error, Tag};
use texparser::prelude::Result;
use texparser::texmacro::Macro;
use texparser::token::{CommandRef, GroupKind, Object, ObjectList};
use texparser::traits::*;

pub const ELSE_DOC: &str = "Start the else branch of a conditional or \\ifcase";
pub const FI_DOC: &str = "End a conditional or \\ifcase";
pub const IF_DOC: &str = "Compare the character codes of the next two unexpandable objects";
pub const IFCASE_DOC: &str = "Select the branch given by a number: \\ifcase<n> ... \\or ... \\else ... \\fi";
pub const IFCAT_DOC: &str = "Compare the category codes of the next two unexpandable objects";
pub const IFFALSE_DOC: &str = "Evaluate the false branch";
pub const IFNUM_DOC: &str = "Compare two numbers: \\ifnum<a><relation><b>";
pub const IFODD_DOC: &str = "Check if a number is odd";
pub const IFTRUE_DOC: &str = "Evaluate the true branch";
pub const IFX_DOC: &str = "Compare the meanings of the next two objects without expanding them";
pub const NEWIF_DOC: &str = "Define a new conditional \\ifname together with \\nametrue and \\namefalse";
pub const OR_DOC: &str = "Begin the next branch of \\ifcase";

/// Component for the conditional commands.
#[derive(Default)]
pub struct Component {
    // One entry for every conditional whose branch is being read, innermost last.
    // It is used to check that \else, \or and \fi are valid where they appear.
    branches: Vec<BranchKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKind {
    // The true branch of a conditional.
    True,
    // The false branch of a conditional, or the default branch of \ifcase.
    Else,
    // A numbered case of \ifcase.
    Switch,
}

fn branches<S: HasComponent<Component>>(ctx: &mut dyn Context<S>) -> &mut Vec<BranchKind> {
    &mut ctx.session_mut().state.component_mut().branches
}

static IF_TAG: StaticTag = StaticTag::new();
static ELSE_TAG: StaticTag = StaticTag::new();
static OR_TAG: StaticTag = StaticTag::new();
static FI_TAG: StaticTag = StaticTag::new();

/// The tag carried by every command that begins a conditional.
///
/// Commands that define new conditionals must attach it, or skipped branches will not nest properly.
pub fn if_tag() -> command::Tag {
    IF_TAG.get()
}

// Where skipping stopped.
enum Stop {
    Else,
    Or,
    Fi,
}

/// Skips raw input up to the `\fi` of the current conditional.
///
/// If `stop_at_branches` is set, skipping also stops at an `\else` or `\or` of the current conditional.
/// Nested conditionals are skipped as a whole.
fn skip<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
    stop_at_branches: bool,
) -> Result<Stop> {
    let mut depth: usize = 0;
    loop {
        let tag = match ctx.next_raw()? {
            None => {
                return Err(ctx.report_error(
                    Tag::UnexpectedEndOfInput,
                    vec![format!("skipping a branch of {invoker}: a \\fi is missing")],
                ))
            }
            Some(Object::CommandRef(command_ref)) => match ctx.resolve(&command_ref) {
                None => continue,
                Some(binding) => binding.tag,
            },
            Some(_) => continue,
        };
        match tag {
            Some(tag) if tag == IF_TAG.get() => depth += 1,
            Some(tag) if tag == FI_TAG.get() => {
                if depth == 0 {
                    return Ok(Stop::Fi);
                }
                depth -= 1;
            }
            Some(tag) if depth == 0 && stop_at_branches && tag == ELSE_TAG.get() => {
                return Ok(Stop::Else)
            }
            Some(tag) if depth == 0 && stop_at_branches && tag == OR_TAG.get() => {
                return Ok(Stop::Or)
            }
            _ => {}
        }
    }
}

fn true_case<S: HasComponent<Component>>(ctx: &mut dyn Context<S>) -> Result<ObjectList> {
    branches(ctx).push(BranchKind::True);
    Ok(ObjectList::new())
}

fn false_case<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    match skip(invoker, ctx, true)? {
        Stop::Else => branches(ctx).push(BranchKind::Else),
        Stop::Fi => {}
        Stop::Or => return Err(extra(ctx, "\\or")),
    }
    Ok(ObjectList::new())
}

macro_rules! create_if_primitive {
    ($if_fn: ident, $if_primitive_fn: ident, $get_if: ident, $doc: expr) => {
        fn $if_primitive_fn<S: HasComponent<Component>>(
            invoker: &CommandRef,
            ctx: &mut dyn Context<S>,
        ) -> Result<ObjectList> {
            match $if_fn(invoker, ctx)? {
                true => true_case(ctx),
                false => false_case(invoker, ctx),
            }
        }

        pub fn $get_if<S: HasComponent<Component>>() -> BuiltIn<S> {
            BuiltIn::new_expansion($if_primitive_fn)
                .with_doc($doc)
                .with_tag(IF_TAG.get())
        }
    };
}

fn if_true<S: SessionState>(_: &CommandRef, _: &mut dyn Context<S>) -> Result<bool> {
    Ok(true)
}

fn if_false<S: SessionState>(_: &CommandRef, _: &mut dyn Context<S>) -> Result<bool> {
    Ok(false)
}

fn if_num<S: SessionState>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<bool> {
    let a = pop_number(ctx)?;
    let relation = pop_relation(invoker, ctx)?;
    let b = pop_number(ctx)?;
    Ok(match relation {
        '<' => a < b,
        '=' => a == b,
        _ => a > b,
    })
}

fn if_odd<S: SessionState>(_: &CommandRef, ctx: &mut dyn Context<S>) -> Result<bool> {
    Ok(pop_number(ctx)? % 2 != 0)
}

fn if_char<S: SessionState>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<bool> {
    let a = pop_char_operand(invoker, ctx)?;
    let b = pop_char_operand(invoker, ctx)?;
    Ok(a.map(|(c, _)| c) == b.map(|(c, _)| c))
}

fn if_cat<S: SessionState>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<bool> {
    let a = pop_char_operand(invoker, ctx)?;
    let b = pop_char_operand(invoker, ctx)?;
    Ok(a.map(|(_, code)| code) == b.map(|(_, code)| code))
}

fn if_x<S: SessionState>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<bool> {
    let a = pop_raw_operand(invoker, ctx)?;
    let a = meaning(ctx, a);
    let b = pop_raw_operand(invoker, ctx)?;
    let b = meaning(ctx, b);
    Ok(same_meaning(&a, &b))
}

create_if_primitive![if_true, if_true_primitive_fn, get_iftrue, IFTRUE_DOC];
create_if_primitive![if_false, if_false_primitive_fn, get_iffalse, IFFALSE_DOC];
create_if_primitive![if_num, if_num_primitive_fn, get_ifnum, IFNUM_DOC];
create_if_primitive![if_odd, if_odd_primitive_fn, get_ifodd, IFODD_DOC];
create_if_primitive![if_char, if_char_primitive_fn, get_if, IF_DOC];
create_if_primitive![if_cat, if_cat_primitive_fn, get_ifcat, IFCAT_DOC];
create_if_primitive![if_x, if_x_primitive_fn, get_ifx, IFX_DOC];

fn pop_number<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<i64> {
    match ctx.pop_argument(&ArgumentStyle::Numeric)? {
        Object::Number(n) => Ok(n),
        other => Err(ctx.report_error(Tag::NumberExpected, vec![other.to_string()])),
    }
}

fn pop_relation<S: SessionState>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<char> {
    loop {
        let object = match ctx.next_expanded()? {
            None => return Err(end_of_input(invoker, ctx)),
            Some(object) => object,
        };
        match object {
            object if object.is_whitespace() => continue,
            Object::Char(c @ ('<' | '=' | '>'), CatCode::Other) => return Ok(c),
            other => {
                let found = other.to_string();
                ctx.push_front(other);
                return Err(ctx.report_error(
                    Tag::ExpectedButFound,
                    vec!["a relation: <, = or >".to_string(), found],
                ));
            }
        }
    }
}

/// Reads the next raw object.
///
/// A group object is opened up: its opening delimiter is returned and the rest is put back.
fn pop_raw_operand<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<Object> {
    match ctx.next_raw()? {
        None => Err(end_of_input(invoker, ctx)),
        Some(Object::Group(contents, kind)) => open_group(ctx, contents, kind),
        Some(object) => Ok(object),
    }
}

fn open_group<S: SessionState>(
    ctx: &mut dyn Context<S>,
    mut contents: ObjectList,
    kind: GroupKind,
) -> Result<Object> {
    let (open, close) = match kind {
        GroupKind::Brace => (
            Object::Char('{', CatCode::BeginGroup),
            Object::Char('}', CatCode::EndGroup),
        ),
        GroupKind::Delimited(open, close) => (Object::other(open), Object::other(close)),
    };
    contents.push_back(close);
    ctx.push_list_front(contents)?;
    Ok(open)
}

/// Reads the character code and category code of the next unexpandable object.
///
/// Commands other than aliases of characters have neither, and so they compare equal to each other.
fn pop_char_operand<S: SessionState>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<Option<(char, CatCode)>> {
    let object = match ctx.next_expanded()? {
        None => return Err(end_of_input(invoker, ctx)),
        Some(Object::Group(contents, kind)) => open_group(ctx, contents, kind)?,
        Some(object) => object,
    };
    Ok(match object {
        Object::Char(c, code) => Some((c, code)),
        Object::Space => Some((' ', CatCode::Space)),
        Object::CommandRef(command_ref) => match ctx.resolve(&command_ref) {
            Some(binding) => match &binding.command {
                Command::Alias(Object::Char(c, code)) => Some((*c, *code)),
                _ => None,
            },
            None => None,
        },
        _ => None,
    })
}

enum Meaning<S> {
    Object(Object),
    Binding(Rc<Binding<S>>),
    Undefined,
}

fn meaning<S: SessionState>(ctx: &dyn Context<S>, object: Object) -> Meaning<S> {
    match object {
        Object::CommandRef(command_ref) => match ctx.resolve(&command_ref) {
            None => Meaning::Undefined,
            Some(binding) => match &binding.command {
                Command::Alias(object) => Meaning::Object(object.clone()),
                _ => Meaning::Binding(binding),
            },
        },
        other => Meaning::Object(other),
    }
}

fn same_meaning<S>(a: &Meaning<S>, b: &Meaning<S>) -> bool {
    match (a, b) {
        (Meaning::Undefined, Meaning::Undefined) => true,
        (Meaning::Object(a), Meaning::Object(b)) => a == b,
        (Meaning::Binding(a), Meaning::Binding(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            match (&a.command, &b.command) {
                (Command::Macro(x), Command::Macro(y)) => x == y,
                (Command::Register(x), Command::Register(y)) => x == y,
                (Command::Macro(_) | Command::Register(_), _)
                | (_, Command::Macro(_) | Command::Register(_)) => false,
                // Primitives are the same if they were built in under the same name.
                _ => a.name() == b.name(),
            }
        }
        _ => false,
    }
}

/// Get the `\ifcase` command.
pub fn get_ifcase<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_expansion(if_case_primitive_fn)
        .with_doc(IFCASE_DOC)
        .with_tag(IF_TAG.get())
}

fn if_case_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    let mut cases_to_skip = pop_number(ctx)?;
    while cases_to_skip != 0 {
        match skip(invoker, ctx, true)? {
            Stop::Or => cases_to_skip -= 1,
            Stop::Else => {
                branches(ctx).push(BranchKind::Else);
                return Ok(ObjectList::new());
            }
            Stop::Fi => return Ok(ObjectList::new()),
        }
        // A negative number never matches a case.
        if cases_to_skip < 0 {
            cases_to_skip = -1;
        }
    }
    branches(ctx).push(BranchKind::Switch);
    Ok(ObjectList::new())
}

/// Get the `\or` command.
pub fn get_or<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_expansion(or_primitive_fn)
        .with_doc(OR_DOC)
        .with_tag(OR_TAG.get())
}

fn or_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    // An \or is only valid in a case of \ifcase.
    if branches(ctx).pop() != Some(BranchKind::Switch) {
        return Err(extra(ctx, &invoker.to_string()));
    }
    skip(invoker, ctx, false)?;
    Ok(ObjectList::new())
}

/// Get the `\else` command.
pub fn get_else<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_expansion(else_primitive_fn)
        .with_doc(ELSE_DOC)
        .with_tag(ELSE_TAG.get())
}

fn else_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    // An \else is only valid in the true branch of a conditional or a case of \ifcase.
    if !matches!(
        branches(ctx).pop(),
        Some(BranchKind::True | BranchKind::Switch)
    ) {
        return Err(extra(ctx, &invoker.to_string()));
    }
    skip(invoker, ctx, false)?;
    Ok(ObjectList::new())
}

/// Get the `\fi` command.
pub fn get_fi<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_expansion(fi_primitive_fn)
        .with_doc(FI_DOC)
        .with_tag(FI_TAG.get())
}

fn fi_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<ObjectList> {
    // Any branch can be ended: \iftrue\fi, \iffalse\else\fi and \ifcase0\fi are all valid.
    if branches(ctx).pop().is_none() {
        return Err(extra(ctx, &invoker.to_string()));
    }
    Ok(ObjectList::new())
}

/// Get the `\newif` command.
///
/// `\newif\iffoo` defines `\iffoo` as `\iffalse`,
///     `\footrue` as `\let\iffoo\iftrue` and `\foofalse` as `\let\iffoo\iffalse`.
pub fn get_newif<S>() -> BuiltIn<S>
where
    S: HasComponent<Component> + HasComponent<prefix::Component>,
{
    BuiltIn::new_execution(newif_primitive_fn).with_doc(NEWIF_DOC)
}

fn newif_primitive_fn<S>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<()>
where
    S: HasComponent<Component> + HasComponent<prefix::Component>,
{
    let scope = prefix::take_scope(ctx);
    let name = match ctx.pop_object()? {
        None => {
            return Err(ctx.report_error(
                Tag::UnexpectedEndOfInput,
                vec![format!("reading the name of the conditional defined by {invoker}")],
            ))
        }
        Some(Object::CommandRef(command_ref @ CommandRef::ControlSequence(_))) => command_ref,
        Some(other) => return Err(ctx.report_error(Tag::CsExpected, vec![other.to_string()])),
    };
    let full_name = name.name();
    let stem = match full_name.strip_prefix("if") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => {
            return Err(ctx.report_error(
                Tag::ExpectedButFound,
                vec!["a name starting with `if`".to_string(), name.to_string()],
            ))
        }
    };
    tracing::debug!(conditional = %name, "defining conditional");
    let binding = Binding {
        name: CommandRef::control_sequence("iffalse"),
        command: Command::Expandable(if_false_primitive_fn::<S>),
        doc: Some(IFFALSE_DOC),
        tag: Some(IF_TAG.get()),
    };
    ctx.session_mut()
        .commands_map
        .assign_binding(name.clone(), Rc::new(binding), scope);
    for (suffix, value) in [("true", "iftrue"), ("false", "iffalse")] {
        let body: ObjectList = vec![
            Object::control_sequence("let"),
            Object::CommandRef(name.clone()),
            Object::control_sequence(value),
        ]
        .into();
        let setter = Macro::new(ObjectList::new(), vec![], &body)
            .map_err(|err| Box::new((*err).with_location(ctx.location())))?;
        ctx.bind(
            CommandRef::control_sequence(&format!("{stem}{suffix}")),
            Command::Macro(Rc::new(setter)),
            scope,
        );
    }
    Ok(())
}

fn extra<S: SessionState>(ctx: &dyn Context<S>, name: &str) -> Box<Error> {
    ctx.report_error(Tag::ExtraCommand, vec![name.to_string()])
}

fn end_of_input<S: SessionState>(invoker: &CommandRef, ctx: &dyn Context<S>) -> Box<Error> {
    ctx.report_error(
        Tag::UnexpectedEndOfInput,
        vec![format!("reading the condition of {invoker}")],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::{alias, def, registers};
    use std::collections::HashMap;

    fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("edef", def::get_edef()),
            ("else", get_else()),
            ("fi", get_fi()),
            ("global", prefix::get_global()),
            ("if", get_if()),
            ("ifcase", get_ifcase()),
            ("ifcat", get_ifcat()),
            ("iffalse", get_iffalse()),
            ("ifnum", get_ifnum()),
            ("ifodd", get_ifodd()),
            ("iftrue", get_iftrue()),
            ("ifx", get_ifx()),
            ("let", alias::get_let()),
            ("newcount", registers::get_newcount()),
            ("newif", get_newif()),
            ("or", get_or()),
        ])
    }

    test_suite![
        live_and_list_tests(
            (iftrue_base_case, r"\iftrue a\else b\fi c", "ac"),
            (iftrue_no_else, r"\iftrue a\fi c", "ac"),
            (
                iftrue_skip_nested_ifs,
                r"\iftrue a\else b\iftrue \else c\fi d\fi e",
                "ae"
            ),
            (iffalse_base_case, r"\iffalse a\else b\fi c", "bc"),
            (iffalse_no_else, r"\iffalse a\fi c", "c"),
            (
                iffalse_skip_nested_ifs,
                r"\iffalse \iftrue a\else b\fi c\else d\fi e",
                "de"
            ),
            (
                iffalse_and_iftrue_1,
                r"\iffalse a\else b\iftrue c\else d\fi e\fi f",
                "bcef"
            ),
            (
                iffalse_and_iftrue_2,
                r"\iftrue a\iffalse b\else c\fi d\else e\fi f",
                "acdf"
            ),
            (iffalse_skips_braces, r"\iffalse {a}\else {b}\fi c", "bc"),
            (renamed_fi, r"\let\endif\fi \iffalse a\endif b", "b"),
            (ifnum_less_than_true, r"\ifnum 4<5a\else b\fi c", "ac"),
            (ifnum_less_than_false, r"\ifnum 5<4a\else b\fi c", "bc"),
            (ifnum_equal_true, r"\ifnum 4=4a\else b\fi c", "ac"),
            (ifnum_equal_false, r"\ifnum 5=4a\else b\fi c", "bc"),
            (ifnum_greater_than_true, r"\ifnum 5>4a\else b\fi c", "ac"),
            (ifnum_greater_than_false, r"\ifnum 4>5a\else b\fi c", "bc"),
            (ifnum_negative, r"\ifnum -3 < 2 a\else b\fi", "a"),
            (ifnum_register, r"\newcount\c \c=7 \ifnum\c>6 a\else b\fi", "a"),
            (ifodd_odd, r"\ifodd 3a\else b\fi c", "ac"),
            (ifodd_even, r"\ifodd 4a\else b\fi c", "bc"),
            (ifodd_negative, r"\ifodd -3a\else b\fi c", "ac"),
            (ifcase_zero_no_ors, r"\ifcase 0 a\else b\fi c", "ac"),
            (ifcase_zero_one_or, r"\ifcase 0 a\or b\else c\fi d", "ad"),
            (ifcase_one, r"\ifcase 1 a\or b\else c\fi d", "bd"),
            (
                ifcase_one_more_cases,
                r"\ifcase 1 a\or b\or c\else d\fi e",
                "be"
            ),
            (ifcase_else_no_ors, r"\ifcase 1 a\else b\fi c", "bc"),
            (ifcase_else_one_or, r"\ifcase 2 a\or b\else c\fi d", "cd"),
            (ifcase_no_matching_case, r"\ifcase 3 a\or b\or c\fi d", "d"),
            (ifcase_negative, r"\ifcase -1 a\or b\else c\fi d", "cd"),
            (
                ifcase_nested,
                r"\ifcase 1 a\or b\ifcase 1 c\or d\or e\else f\fi g\or h\fi i",
                "bdgi"
            ),
            (if_same_characters, r"\if aax\else y\fi", "x"),
            (if_different_characters, r"\if abx\else y\fi", "y"),
            (if_character_alias, r"\let\z=a\if a\z x\else y\fi", "x"),
            (if_expands_macros, r"\def\a{b}\if b\a x\else y\fi", "x"),
            (if_commands_are_equal, r"\if\global\let x\else y\fi", "x"),
            (ifcat_letters, r"\ifcat abx\else y\fi", "x"),
            (ifcat_letter_and_other, r"\ifcat a1x\else y\fi", "y"),
            (ifx_same_macro, r"\def\a{x}\def\b{x}\ifx\a\b T\else F\fi", "T"),
            (ifx_different_macro, r"\def\a{x}\def\b{y}\ifx\a\b T\else F\fi", "F"),
            (ifx_does_not_expand, r"\def\a{x}\ifx\a xT\else F\fi", "F"),
            (ifx_let_alias, r"\let\a=\iftrue \ifx\a\iftrue T\else F\fi", "T"),
            (ifx_characters, r"\ifx aaT\else F\fi", "T"),
            (ifx_undefined, r"\ifx\undefinedA\undefinedB T\else F\fi", "T"),
            (ifx_character_alias, r"\let\a=b\ifx\a bT\else F\fi", "T"),
            (newif_starts_false, r"\newif\iffoo \iffoo a\else b\fi", "b"),
            (newif_true, r"\newif\iffoo \footrue\iffoo a\else b\fi", "a"),
            (
                newif_true_then_false,
                r"\newif\iffoo \footrue\foofalse\iffoo a\else b\fi",
                "b"
            ),
            (
                newif_is_skipped_as_conditional,
                r"\newif\iffoo \iffalse\iffoo a\fi b\else c\fi",
                "c"
            ),
            (newif_meaning, r"\newif\iffoo \ifx\iffoo\iffalse T\else F\fi", "T"),
            (
                newif_is_local,
                r"\newif\iffoo {\footrue}\iffoo a\else b\fi",
                "b"
            ),
            (
                global_newif,
                r"{\global\newif\ifbar}\ifbar a\else b\fi",
                "b"
            ),
        ),
        expansion_equality_tests(
            (
                conditional_in_edef,
                r"\def\b{B}\edef\a{\ifnum 1<2 x\b\else y\fi}\def\b{C}\a",
                "xB"
            ),
            (
                conditional_in_edef_false,
                r"\edef\a{\iffalse x\else y\fi}\a",
                "y"
            ),
        ),
        failure_tests(
            (iftrue_end_of_input, r"\iftrue a\else b", Tag::UnexpectedEndOfInput),
            (iffalse_end_of_input, r"\iffalse a", Tag::UnexpectedEndOfInput),
            (else_not_expected, r"a\else", Tag::ExtraCommand),
            (fi_not_expected, r"a\fi", Tag::ExtraCommand),
            (or_not_expected, r"a\or", Tag::ExtraCommand),
            (or_in_if, r"\iftrue a\or b\fi", Tag::ExtraCommand),
            (or_skipped_by_if, r"\iffalse a\or b\fi", Tag::ExtraCommand),
            (double_else, r"\iffalse a\else b\else c\fi", Tag::ExtraCommand),
            (ifnum_bad_relation, r"\ifnum 1!2 a\fi", Tag::ExpectedButFound),
            (ifnum_missing_number, r"\ifnum a<2 a\fi", Tag::NumberExpected),
            (newif_bad_name, r"\newif\foo", Tag::ExpectedButFound),
            (newif_character, r"\newif a", Tag::CsExpected),
            (newif_end_of_input, r"\newif", Tag::UnexpectedEndOfInput),
        ),
    ];
}
