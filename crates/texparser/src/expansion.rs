//! The expansion engine
//!
//! Processing is a trampoline: when the main loop meets an expandable command,
//!     the command's expansion is pushed back onto the front of the input
//!     and the loop continues from there.
//! The Rust stack therefore only grows with the nesting of groups and of commands that
//!     themselves read expanded input, never with the total number of expansions.

use crate::catcode::CatCode;
use crate::command::{Binding, Command};
use crate::context::{Context, ListContext};
use crate::error::Tag;
use crate::prelude::Result;
use crate::session::SessionState;
use crate::token::{CommandRef, GroupKind, Object, ObjectList};

// Beyond this many "while expanding" notes, an error's backtrace is cut off.
const MAX_NOTES: usize = 8;

/// Expands a command once.
///
/// Returns [None] if the command is not expandable; such commands must be executed instead.
pub fn expand_command<S: SessionState>(
    binding: &Binding<S>,
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<Option<ObjectList>> {
    match &binding.command {
        Command::Macro(tex_macro) => {
            in_frame(ctx, invoker, true, |ctx| tex_macro.call(invoker, ctx)).map(Some)
        }
        Command::Expandable(expand) | Command::Both { expand, .. } => {
            in_frame(ctx, invoker, true, |ctx| expand(invoker, ctx)).map(Some)
        }
        Command::Executable(_) | Command::Alias(_) | Command::Register(_) => Ok(None),
    }
}

/// Executes a command.
///
/// Expandable commands are expanded once and their expansion is put back at the front of
///     the input, to be processed next.
pub fn execute_command<S: SessionState>(
    binding: &Binding<S>,
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    match &binding.command {
        Command::Executable(execute) | Command::Both { execute, .. } => {
            in_frame(ctx, invoker, false, |ctx| execute(invoker, ctx))
        }
        Command::Macro(_) | Command::Expandable(_) => {
            if let Some(expansion) = expand_command(binding, invoker, ctx)? {
                ctx.push_list_front(expansion)?;
            }
            Ok(())
        }
        Command::Alias(object) => {
            ctx.push_front(object.clone());
            Ok(())
        }
        Command::Register(index) => in_frame(ctx, invoker, false, |ctx| {
            S::register_assignment_handler(*index, invoker, ctx)
        }),
    }
}

fn in_frame<S: SessionState, T, F>(
    ctx: &mut dyn Context<S>,
    invoker: &CommandRef,
    is_expansion: bool,
    f: F,
) -> Result<T>
where
    F: FnOnce(&mut dyn Context<S>) -> Result<T>,
{
    ctx.session_mut().enter_command(invoker, is_expansion)?;
    let result = f(ctx);
    ctx.session_mut().leave_command();
    result.map_err(|mut err| {
        if err.notes.len() < MAX_NOTES {
            let doing = if is_expansion { "expanding" } else { "executing" };
            err.notes.push(format!("while {doing} {invoker}"));
        }
        err
    })
}

/// Processes a single object.
pub fn process_object<S: SessionState>(ctx: &mut dyn Context<S>, object: Object) -> Result<()> {
    match object {
        Object::CommandRef(command_ref) => match ctx.resolve(&command_ref) {
            None => S::undefined_command_handler(&command_ref, ctx),
            Some(binding) => execute_command(&binding, &command_ref, ctx),
        },
        Object::Char(_, CatCode::BeginGroup) => {
            ctx.start_group();
            Ok(())
        }
        Object::Char(_, CatCode::EndGroup) => ctx.end_group(),
        Object::Group(contents, GroupKind::Brace) => {
            let depth = ctx.session().group_depth();
            ctx.start_group();
            let result = ctx.process_list(contents);
            while ctx.session().group_depth() > depth {
                ctx.end_group()?;
            }
            result
        }
        Object::Group(mut contents, GroupKind::Delimited(open, close)) => {
            contents.push_front(Object::other(open));
            contents.push_back(Object::other(close));
            ctx.push_list_front(contents)
        }
        Object::Param(_) | Object::DoubleParam | Object::Char(_, CatCode::Parameter) => {
            Err(ctx.report_error(Tag::UnexpectedParameter, vec![object.to_string()]))
        }
        Object::Comment(_) => Ok(()),
        other => S::character_handler(other, ctx),
    }
}

/// Processes objects until the context is exhausted.
pub fn process<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<()> {
    while let Some(object) = ctx.next_raw()? {
        process_object(ctx, object)?;
    }
    Ok(())
}

/// Processes a list in a nested list context.
pub fn process_list<S: SessionState>(ctx: &mut dyn Context<S>, mut list: ObjectList) -> Result<()> {
    process(&mut ListContext::new(ctx.session_mut(), &mut list))
}

/// Expands the next object if it is an expandable command.
///
/// If the expansion is overridden by [SessionState::expansion_override_hook],
///     the objects returned by the hook are put at the front of the input and `false` is returned,
///     so that a caller that expands until there is nothing left to expand reads them as they are.
pub fn expand_once<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<bool> {
    let command_ref = match ctx.peek_raw()? {
        Some(Object::CommandRef(command_ref)) => command_ref.clone(),
        _ => return Ok(false),
    };
    let binding = match ctx.resolve(&command_ref) {
        Some(binding) if binding.command.is_expandable() => binding,
        _ => return Ok(false),
    };
    ctx.next_raw()?;
    if let Some(list) = S::expansion_override_hook(&command_ref, binding.tag, ctx)? {
        ctx.push_list_front(list)?;
        return Ok(false);
    }
    if let Some(expansion) = expand_command(&binding, &command_ref, ctx)? {
        ctx.push_list_front(expansion)?;
    }
    Ok(true)
}

/// Returns the next object after expanding all leading expandable commands.
pub fn next_expanded<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<Option<Object>> {
    while expand_once(ctx)? {}
    ctx.next_raw()
}

/// Expands every expandable command in the list, including inside groups.
///
/// Protected macros, executable commands, aliases and registers are kept as is,
///     as are the objects returned by [SessionState::expansion_override_hook].
/// Undefined control sequences are an error.
pub fn expand_fully<S: SessionState>(
    ctx: &mut dyn Context<S>,
    mut list: ObjectList,
) -> Result<ObjectList> {
    let mut result = ObjectList::new();
    let mut ctx = ListContext::new(ctx.session_mut(), &mut list);
    while let Some(object) = ctx.next_raw()? {
        match object {
            Object::CommandRef(command_ref) => match ctx.resolve(&command_ref) {
                None => return Err(ctx.session().undefined_command_error(&command_ref)),
                Some(binding)
                    if binding.command.is_expandable() && !binding.command.is_protected() =>
                {
                    if let Some(list) =
                        S::expansion_override_hook(&command_ref, binding.tag, &mut ctx)?
                    {
                        result.append(list);
                        continue;
                    }
                    if let Some(expansion) = expand_command(&binding, &command_ref, &mut ctx)? {
                        ctx.push_list_front(expansion)?;
                    }
                }
                Some(_) => result.push_back(Object::CommandRef(command_ref)),
            },
            Object::Group(contents, kind) => {
                let contents = expand_fully(&mut ctx, contents)?;
                result.push_back(Object::Group(contents, kind));
            }
            other => result.push_back(other),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::BuiltIn;
    use crate::context::{ArgumentStyle, LiveContext};
    use crate::session::Session;
    use crate::texmacro::Macro;
    use crate::token::write_objects;
    use std::collections::HashMap;
    use std::rc::Rc;
    use texparser_stdext::collections::groupingmap::Scope;

    fn new_session(built_ins: HashMap<&str, BuiltIn<()>>) -> Box<Session<()>> {
        let mut session = Session::<()>::new(built_ins);
        session.terminal_out = Rc::new(std::cell::RefCell::new(std::io::sink()));
        session
    }

    fn define(session: &mut Session<()>, name: &str, num_parameters: usize, body: &str) {
        let body = session.tokenize(body).unwrap();
        let tex_macro = Macro::new(
            ObjectList::new(),
            vec![ArgumentStyle::MandatoryBrace; num_parameters],
            &body,
        )
        .unwrap();
        session.commands_map.assign(
            CommandRef::control_sequence(name),
            Command::Macro(Rc::new(tex_macro)),
            Scope::Local,
        );
    }

    fn expand_fully_str(session: &mut Session<()>, input: &str) -> Result<String> {
        let list = session.tokenize(input)?;
        let mut ctx = LiveContext::new(session);
        Ok(write_objects(&ctx.expand_fully(list)?))
    }

    fn run(session: &mut Session<()>, input: &str) -> Result<String> {
        session.push_source("input.tex", input)?;
        session.run()?;
        Ok(session.take_output())
    }

    fn set_x_and_y(_: &CommandRef, ctx: &mut dyn Context<()>) -> Result<()> {
        ctx.bind(
            CommandRef::control_sequence("x"),
            Command::Alias(Object::letter('G')),
            Scope::Global,
        );
        ctx.bind(
            CommandRef::control_sequence("y"),
            Command::Alias(Object::letter('L')),
            Scope::Local,
        );
        Ok(())
    }

    fn recurse(_: &CommandRef, ctx: &mut dyn Context<()>) -> Result<ObjectList> {
        ctx.expand_fully(vec![Object::control_sequence("recurse")].into())
    }

    fn emit_argument(_: &CommandRef, ctx: &mut dyn Context<()>) -> Result<()> {
        let argument = ctx.pop_argument(&ArgumentStyle::MandatoryBrace)?;
        ctx.process_list(argument.into_list())
    }

    fn verb_expand(_: &CommandRef, _: &mut dyn Context<()>) -> Result<ObjectList> {
        Ok(vec![Object::letter('E')].into())
    }

    fn verb_execute(_: &CommandRef, ctx: &mut dyn Context<()>) -> Result<()> {
        ctx.emit("X");
        Ok(())
    }

    #[test]
    fn doubling_macro_and_group_restoration() {
        let mut session = new_session(HashMap::new());
        define(&mut session, "foo", 1, "#1#1");
        assert_eq!(expand_fully_str(&mut session, "\\foo{X}").unwrap(), "XX");

        session.start_group();
        define(&mut session, "foo", 0, "Y");
        assert_eq!(expand_fully_str(&mut session, "\\foo").unwrap(), "Y");
        session.end_group().unwrap();
        assert_eq!(expand_fully_str(&mut session, "\\foo{X}").unwrap(), "XX");
    }

    #[test]
    fn expand_fully_is_idempotent() {
        let mut session = new_session(HashMap::from([(
            "exec",
            BuiltIn::new_execution(emit_argument),
        )]));
        define(&mut session, "a", 1, "[#1\\b]");
        define(&mut session, "b", 0, "{\\exec b}");
        let list = session.tokenize("\\a{x} {\\a{y}}").unwrap();
        let mut ctx = LiveContext::new(&mut session);
        let once = ctx.expand_fully(list).unwrap();
        let twice = ctx.expand_fully(once.clone()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(write_objects(&once), "[x{\\exec b}] {[y{\\exec b}]}");
    }

    #[test]
    fn expansions_of_the_same_macro_are_independent() {
        let mut session = new_session(HashMap::new());
        define(&mut session, "foo", 1, "{#1}");
        let binding = session
            .commands_map
            .lookup(&CommandRef::control_sequence("foo"))
            .cloned()
            .unwrap();
        let invoker = CommandRef::control_sequence("foo");
        let mut list = session.tokenize("{a}{a}").unwrap();
        let mut ctx = ListContext::new(&mut session, &mut list);
        let first = expand_command(&binding, &invoker, &mut ctx)
            .unwrap()
            .unwrap();
        let mut modified = match first.front() {
            Some(Object::Group(inner, _)) => inner.clone(),
            other => panic!("expected a group, got {other:?}"),
        };
        modified.push_back(Object::letter('z'));
        let second = expand_command(&binding, &invoker, &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(write_objects(&modified), "az");
        assert_eq!(write_objects(&first), "{a}");
        assert_eq!(write_objects(&second), "{a}");
    }

    #[test]
    fn protected_and_executable_commands_are_kept() {
        let mut session = new_session(HashMap::from([(
            "exec",
            BuiltIn::new_execution(emit_argument),
        )]));
        define(&mut session, "a", 0, "A");
        let body = session.tokenize("P").unwrap();
        let protected = Macro::new(ObjectList::new(), vec![], &body)
            .unwrap()
            .with_protected(true);
        session.commands_map.assign(
            CommandRef::control_sequence("p"),
            Command::Macro(Rc::new(protected)),
            Scope::Local,
        );
        assert_eq!(
            expand_fully_str(&mut session, "\\a\\p\\exec").unwrap(),
            "A\\p\\exec"
        );
    }

    #[test]
    fn expand_fully_undefined_command() {
        let mut session = new_session(HashMap::new());
        let err = expand_fully_str(&mut session, "a\\undefined").unwrap_err();
        assert_eq!(err.tag, Tag::UndefinedControlSequence);
    }

    #[test]
    fn both_commands_expand_in_expand_fully_and_execute_otherwise() {
        let mut session = new_session(HashMap::from([(
            "verb",
            BuiltIn::new_both(verb_expand, verb_execute),
        )]));
        assert_eq!(expand_fully_str(&mut session, "\\verb").unwrap(), "E");
        assert_eq!(run(&mut session, "\\verb").unwrap(), "X");
    }

    #[test]
    fn trampoline_does_not_nest() {
        let mut session = new_session(HashMap::new());
        session.config.max_nesting = 2;
        define(&mut session, "a", 0, "x");
        define(&mut session, "b", 0, "\\a\\a");
        let input = "\\b".repeat(1000);
        assert_eq!(run(&mut session, &input).unwrap(), "x".repeat(2000));
        assert_eq!(session.num_expansions(), 3000);
    }

    #[test]
    fn runaway_recursion_is_a_resource_error() {
        let mut session = new_session(HashMap::from([(
            "recurse",
            BuiltIn::new_expansion(recurse),
        )]));
        session.config.max_nesting = 20;
        session.config.recover_from_errors = true;
        let err = run(&mut session, "\\recurse").unwrap_err();
        assert_eq!(err.tag, Tag::CapacityExceeded);
        assert!(err.is_fatal());
        assert_eq!(err.notes.len(), MAX_NOTES);
        assert_eq!(err.notes[0], "while expanding \\recurse");
    }

    #[test]
    fn expansion_limit() {
        let mut session = new_session(HashMap::new());
        session.config.max_expansions = Some(3);
        define(&mut session, "a", 0, "x");
        let err = run(&mut session, "\\a\\a\\a\\a").unwrap_err();
        assert_eq!(err.tag, Tag::CapacityExceeded);
        assert_eq!(session.output(), "xxx");
    }

    #[test]
    fn errors_note_the_command_being_expanded() {
        let mut session = new_session(HashMap::new());
        define(&mut session, "foo", 1, "#1");
        let err = run(&mut session, "\\foo").unwrap_err();
        assert_eq!(err.tag, Tag::UnexpectedEndOfInput);
        assert_eq!(err.params, vec!["reading an argument for \\foo".to_string()]);
        assert_eq!(err.notes, vec!["while expanding \\foo".to_string()]);
    }

    #[test]
    fn group_objects_scope_bindings() {
        let mut session = new_session(HashMap::from([(
            "set",
            BuiltIn::new_execution(set_x_and_y),
        )]));
        for (name, c) in [("x", 'x'), ("y", 'y')] {
            session.commands_map.assign(
                CommandRef::control_sequence(name),
                Command::Alias(Object::letter(c)),
                Scope::Local,
            );
        }
        let contents = session.tokenize("\\set\\x\\y").unwrap();
        let mut ctx = LiveContext::new(&mut session);
        process_object(&mut ctx, Object::group(contents)).unwrap();
        assert_eq!(ctx.session().group_depth(), 0);
        assert_eq!(run(&mut session, "\\x\\y").unwrap(), "GLGy");
    }

    #[test]
    fn aliases_are_processed_as_their_object() {
        let mut session = new_session(HashMap::new());
        session.commands_map.assign(
            CommandRef::ActiveCharacter('~'),
            Command::Alias(Object::Space),
            Scope::Local,
        );
        session.commands_map.assign(
            CommandRef::control_sequence("bgroup"),
            Command::Alias(Object::Char('{', CatCode::BeginGroup)),
            Scope::Local,
        );
        let err = run(&mut session, "a~b\\bgroup").unwrap_err();
        assert_eq!(err.tag, Tag::UnbalancedGroups);
        assert_eq!(session.output(), "a b");
    }

    #[test]
    fn parameter_tokens_are_not_allowed() {
        let mut session = new_session(HashMap::new());
        let err = run(&mut session, "a#1").unwrap_err();
        assert_eq!(err.tag, Tag::UnexpectedParameter);
        assert_eq!(err.params, vec!["#1".to_string()]);
    }

    #[test]
    fn delimited_groups_are_processed_with_their_delimiters() {
        let mut session = new_session(HashMap::new());
        let mut ctx = LiveContext::new(&mut session);
        let group = Object::Group(
            vec![Object::letter('a')].into(),
            GroupKind::Delimited('[', ']'),
        );
        process_object(&mut ctx, group).unwrap();
        process(&mut ctx).unwrap();
        assert_eq!(session.output(), "[a]");
    }

    #[test]
    fn executable_commands_can_process_arguments() {
        let mut session = new_session(HashMap::from([(
            "exec",
            BuiltIn::new_execution(emit_argument),
        )]));
        define(&mut session, "a", 0, "A");
        assert_eq!(run(&mut session, "\\exec{x\\a}y").unwrap(), "xAy");
    }
}
