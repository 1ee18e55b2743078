//! The interface commands use to read input and change the session
//!
//! Every command receives a `&mut dyn Context<S>`.
//! The context is either *live*, reading from the input sources of the session,
//!     or a *list* context, reading from a list of objects that was produced by
//!     an earlier expansion.
//! Commands cannot tell the difference,
//!     which is what allows a command to behave the same way in `\edef` as in the document body.
//!
//! Implementations only provide the primitive stream operations.
//! Everything else, like popping arguments or expanding, is built on top of them
//!     in the provided methods of [Context].

use crate::catcode::CatCode;
use crate::command::{Binding, Command};
use crate::error::{Error, Location, Tag};
use crate::expansion;
use crate::prelude::Result;
use crate::session::{Session, SessionState};
use crate::token::{self, CommandRef, Object, ObjectList};
use std::rc::Rc;
use texparser_stdext::collections::groupingmap::Scope;

pub mod argument;

pub use argument::ArgumentStyle;

pub trait Context<S: SessionState> {
    fn session(&self) -> &Session<S>;

    fn session_mut(&mut self) -> &mut Session<S>;

    /// Returns this context as a trait object.
    ///
    /// Implementations simply return `self`.
    fn as_dyn(&mut self) -> &mut dyn Context<S>;

    /// Pops the next object, without expanding it or assembling groups.
    fn next_raw(&mut self) -> Result<Option<Object>>;

    /// Returns the next object without consuming it.
    fn peek_raw(&mut self) -> Result<Option<&Object>>;

    /// Puts an object back at the front of the stream.
    fn push_front(&mut self, object: Object);

    /// Puts a list at the front of the stream, so that its first object is read next.
    fn push_list_front(&mut self, list: ObjectList) -> Result<()>;

    /// Reads raw text up to the end marker, bypassing tokenization.
    ///
    /// See [ArgumentStyle::Verbatim].
    fn read_verbatim(&mut self, end: Option<&str>) -> Result<String>;

    /// Whether this context reads from the input sources of the session.
    fn is_live(&self) -> bool;

    fn location(&self) -> Option<Location> {
        self.session().location()
    }

    fn pop_object(&mut self) -> Result<Option<Object>> {
        argument::pop_object(self.as_dyn())
    }

    fn pop_raw_object(&mut self) -> Result<Option<Object>> {
        argument::pop_raw_object(self.as_dyn())
    }

    fn pop_argument(&mut self, style: &ArgumentStyle) -> Result<Object> {
        argument::pop_argument(self.as_dyn(), style)
    }

    fn pop_optional(&mut self, open: char, close: char) -> Result<Option<Object>> {
        argument::pop_optional(self.as_dyn(), open, close)
    }

    fn peek(&mut self) -> Result<Option<Object>> {
        Ok(self.peek_raw()?.cloned())
    }

    /// Returns the binding currently visible for the command reference.
    fn resolve(&self, command_ref: &CommandRef) -> Option<Rc<Binding<S>>> {
        self.session().commands_map.lookup(command_ref).cloned()
    }

    fn bind(&mut self, name: CommandRef, command: Command<S>, scope: Scope) {
        self.session_mut().commands_map.assign(name, command, scope);
    }

    fn start_group(&mut self) {
        self.session_mut().start_group();
    }

    /// Ends the innermost group.
    ///
    /// Objects saved with `\aftergroup` are put at the front of the stream.
    fn end_group(&mut self) -> Result<()> {
        self.session_mut().end_group()?;
        let after_group = self.session_mut().take_after_group();
        if after_group.is_empty() {
            return Ok(());
        }
        self.push_list_front(after_group)
    }

    fn set_catcode(&mut self, c: char, code: CatCode, scope: Scope) {
        self.session_mut().cat_codes_mut().set_category(c, code, scope);
    }

    /// Appends text to the output.
    fn emit(&mut self, text: &str) {
        self.session_mut().emit(text);
    }

    /// Builds an error at the current location.
    ///
    /// The error is returned, not raised; callers typically write `return Err(ctx.report_error(...))`.
    fn report_error(&self, tag: Tag, params: Vec<String>) -> Box<Error> {
        self.session().error(tag, params)
    }

    fn report_warning(&mut self, tag: Tag, params: Vec<String>) {
        self.session_mut().warn(tag, params);
    }

    /// Expands the next object if it is an expandable command.
    ///
    /// Returns whether an expansion happened.
    fn expand_once(&mut self) -> Result<bool> {
        expansion::expand_once(self.as_dyn())
    }

    /// Returns the next object that is not an expandable command.
    fn next_expanded(&mut self) -> Result<Option<Object>> {
        expansion::next_expanded(self.as_dyn())
    }

    /// Expands every expandable command in the list, recursively, without executing anything.
    fn expand_fully(&mut self, list: ObjectList) -> Result<ObjectList> {
        expansion::expand_fully(self.as_dyn(), list)
    }

    /// Processes the list completely, as if it were input.
    fn process_list(&mut self, list: ObjectList) -> Result<()> {
        expansion::process_list(self.as_dyn(), list)
    }
}

/// A context that reads from the input sources of the session.
pub struct LiveContext<'a, S> {
    session: &'a mut Session<S>,
}

impl<'a, S: SessionState> LiveContext<'a, S> {
    pub fn new(session: &'a mut Session<S>) -> LiveContext<'a, S> {
        LiveContext { session }
    }
}

impl<'a, S: SessionState> Context<S> for LiveContext<'a, S> {
    fn session(&self) -> &Session<S> {
        &*self.session
    }

    fn session_mut(&mut self) -> &mut Session<S> {
        self.session
    }

    fn as_dyn(&mut self) -> &mut dyn Context<S> {
        self
    }

    #[inline]
    fn next_raw(&mut self) -> Result<Option<Object>> {
        self.session.next_live_raw()
    }

    #[inline]
    fn peek_raw(&mut self) -> Result<Option<&Object>> {
        self.session.peek_live_raw()
    }

    fn push_front(&mut self, object: Object) {
        self.session.push_live_front(object);
    }

    fn push_list_front(&mut self, list: ObjectList) -> Result<()> {
        self.session.push_live_list_front(list)
    }

    fn read_verbatim(&mut self, end: Option<&str>) -> Result<String> {
        self.session.read_live_verbatim(end)
    }

    fn is_live(&self) -> bool {
        true
    }
}

/// A context that reads from a list of objects.
///
/// Objects consumed by commands are removed from the front of the list.
pub struct ListContext<'a, S> {
    session: &'a mut Session<S>,
    list: &'a mut ObjectList,
}

impl<'a, S: SessionState> ListContext<'a, S> {
    pub fn new(session: &'a mut Session<S>, list: &'a mut ObjectList) -> ListContext<'a, S> {
        ListContext { session, list }
    }
}

impl<'a, S: SessionState> Context<S> for ListContext<'a, S> {
    fn session(&self) -> &Session<S> {
        &*self.session
    }

    fn session_mut(&mut self) -> &mut Session<S> {
        self.session
    }

    fn as_dyn(&mut self) -> &mut dyn Context<S> {
        self
    }

    #[inline]
    fn next_raw(&mut self) -> Result<Option<Object>> {
        Ok(self.list.pop_front())
    }

    #[inline]
    fn peek_raw(&mut self) -> Result<Option<&Object>> {
        Ok(self.list.front())
    }

    fn push_front(&mut self, object: Object) {
        self.list.push_front(object);
    }

    fn push_list_front(&mut self, list: ObjectList) -> Result<()> {
        let limit = self.session.config.max_pending_objects;
        if self.list.len() + list.len() > limit {
            return Err(self.session.error(
                Tag::CapacityExceeded,
                vec!["pending objects".to_string(), limit.to_string()],
            ));
        }
        self.list.splice_front(list);
        Ok(())
    }

    fn read_verbatim(&mut self, end: Option<&str>) -> Result<String> {
        match read_list_verbatim(self.list, end) {
            Some(text) => Ok(text),
            None => {
                let invoker = match self.session.current_command() {
                    None => "a verbatim argument".to_string(),
                    Some(command_ref) => command_ref.to_string(),
                };
                Err(self.session.error(Tag::UnterminatedVerbatim, vec![invoker]))
            }
        }
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Reads verbatim text from a list that has already been tokenized.
///
/// The objects are rendered back to source text one by one until the rendering ends
///     with the end marker.
/// Category codes in effect when the list was tokenized cannot be undone,
///     so the result can differ from reading the same text from live input.
fn read_list_verbatim(list: &mut ObjectList, end: Option<&str>) -> Option<String> {
    let end = match end {
        Some(end) => end.to_string(),
        None => token::render_object(&list.pop_front_skip_whitespace()?, None),
    };
    let mut text = String::new();
    while let Some(object) = list.pop_front() {
        text.push_str(&token::render_object(&object, list.front()));
        if text.ends_with(&end) {
            text.truncate(text.len() - end.len());
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn list_verbatim_with_end_marker() {
        let mut session = Session::<()>::new(HashMap::new());
        let mut list = session.tokenize("a \\foo b\\end{verbatim}rest").unwrap();
        let mut ctx = ListContext::new(&mut session, &mut list);
        assert_eq!(
            ctx.read_verbatim(Some("\\end{verbatim}")).unwrap(),
            "a \\foo b"
        );
        assert_eq!(list.to_string(), "rest");
    }

    #[test]
    fn list_verbatim_unterminated() {
        let mut session = Session::<()>::new(HashMap::new());
        let mut list = session.tokenize("|abc").unwrap();
        let mut ctx = ListContext::new(&mut session, &mut list);
        let err = ctx.read_verbatim(None).unwrap_err();
        assert_eq!(err.tag, Tag::UnterminatedVerbatim);
    }

    #[test]
    fn live_verbatim_sees_pushed_back_objects() {
        let mut session = Session::<()>::new(HashMap::new());
        session.push_source("input.tex", "b|c").unwrap();
        let mut ctx = LiveContext::new(&mut session);
        ctx.push_front(Object::letter('a'));
        ctx.push_front(Object::other('|'));
        assert_eq!(ctx.read_verbatim(None).unwrap(), "ab");
        assert_eq!(ctx.next_raw().unwrap(), Some(Object::letter('c')));
    }

    #[test]
    fn list_capacity() {
        let mut session = Session::<()>::new(HashMap::new());
        session.config.max_pending_objects = 2;
        let mut list = ObjectList::new();
        let mut ctx = ListContext::new(&mut session, &mut list);
        let three: ObjectList = "abc".chars().map(Object::letter).collect();
        let err = ctx.push_list_front(three).unwrap_err();
        assert_eq!(err.tag, Tag::CapacityExceeded);
    }

    #[test]
    fn bindings_are_visible_in_both_modes() {
        let mut session = Session::<()>::new(HashMap::new());
        let foo = CommandRef::control_sequence("foo");
        {
            let mut ctx = LiveContext::new(&mut session);
            ctx.bind(
                foo.clone(),
                Command::Alias(Object::letter('x')),
                Scope::Local,
            );
        }
        let mut list = ObjectList::new();
        let ctx = ListContext::new(&mut session, &mut list);
        assert!(ctx.resolve(&foo).is_some());
    }
}
