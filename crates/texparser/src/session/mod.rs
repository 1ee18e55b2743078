//! The parsing session
//!
//! A [Session] owns everything that changes while a document is processed:
//!     the input sources, the binding table, the category code table, the output buffer
//!     and the diagnostics that have been reported.
//! Commands reach the session through a [Context].

use crate::catcode::{CatCode, CatCodeTable};
use crate::command::{self, BuiltIn};
use crate::config::Config;
use crate::context::{Context, ListContext, LiveContext};
use crate::error::{Error, Location, Tag, Warning};
use crate::expansion;
use crate::prelude::Result;
use crate::texmacro;
use crate::token::lexer::{self, Lexer};
use crate::token::{CommandRef, CsName, Object, ObjectList};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use texparser_stdext::algorithms::spellcheck;
use texparser_stdext::collections::groupingmap::{GroupingMap, Scope};

mod file;

pub use file::{Charset, FileStream, FileSystem};

/// A TeX parsing session.
pub struct Session<S> {
    /// The state
    pub state: S,

    /// The commands map
    pub commands_map: command::Map<S>,

    pub config: Config,

    /// File system operations
    ///
    /// By default this is real operations on the file system.
    /// It is replaceable to support unit testing.
    pub file_system: Box<dyn FileSystem>,

    /// Writer that diagnostics are written to.
    ///
    /// Defaults to standard error.
    pub terminal_out: Rc<RefCell<dyn Write>>,

    /// Writer that diagnostics are also written to.
    ///
    /// Defaults to a sink writer that writes nothing.
    pub log_file: Rc<RefCell<dyn Write>>,

    /// The working directory which is used as the root for relative file paths
    ///
    /// This is [None] if the working directory could not be determined.
    pub working_directory: Option<std::path::PathBuf>,

    cat_codes: CatCodeTable,
    registers: GroupingMap<usize, i64>,
    output: String,
    internal: Internal,
}

#[derive(Default)]
struct Internal {
    // The sources form a stack; the first element is an unnamed base source
    // that is never popped, so there is always somewhere to push objects back to.
    sources: Vec<Source>,
    call_stack: Vec<CommandRef>,
    num_expansions: u64,
    warnings: Vec<Warning>,
    recovered_errors: Vec<Error>,
    // One list per open group, holding the objects saved by \aftergroup.
    after_group: Vec<ObjectList>,
    // The saved objects of the group that was ended last.
    released_after_group: ObjectList,
    // Groups at or below this depth belong to the reader of an enclosing file and cannot be ended.
    group_floor: usize,
}

struct Source {
    name: String,
    lexer: Lexer,
    // Objects pushed back in front of the lexer.
    pending: ObjectList,
    // A boundary source reports the end of input when exhausted instead of being popped.
    boundary: bool,
}

impl Source {
    fn new(name: String, source_code: &str, boundary: bool) -> Source {
        Source {
            name,
            lexer: Lexer::new(source_code),
            pending: ObjectList::new(),
            boundary,
        }
    }
}

/// Implementations of this trait may be used as the state in a session.
///
/// The trait has no required methods, and for any type it can be implemented trivially:
/// ```
/// # use texparser::traits::SessionState;
/// struct SomeNewType;
///
/// impl SessionState for SomeNewType {}
/// ```
///
/// The methods are invoked at certain points while the session is running
///     and offer a way of customizing its behavior.
/// They are dispatched statically.
pub trait SessionState: Sized {
    /// Handles an object that is not a command, like a letter or a space.
    ///
    /// The default implementation appends the object's rendering to the output.
    fn character_handler(object: Object, ctx: &mut dyn Context<Self>) -> Result<()> {
        ctx.emit(&object.to_string());
        Ok(())
    }

    /// Handles a command reference with no binding.
    ///
    /// The default implementation returns an error, with suggestions for similarly named commands.
    fn undefined_command_handler(
        command_ref: &CommandRef,
        ctx: &mut dyn Context<Self>,
    ) -> Result<()> {
        Err(ctx.session().undefined_command_error(command_ref))
    }

    /// Hook that is invoked after a macro is expanded.
    ///
    /// This hook is designed to support macro tracing.
    fn post_macro_expansion_hook(
        session: &mut Session<Self>,
        invoker: &CommandRef,
        tex_macro: &texmacro::Macro,
        arguments: &[Object],
        expansion: &ObjectList,
    ) {
        _ = (session, invoker, tex_macro, arguments, expansion);
    }

    /// Hook that can override the expansion of an expandable command.
    ///
    /// It is invoked whenever an expandable command is about to be expanded without being executed,
    ///     as happens when reading a number or inside `\edef`.
    /// If it returns a list, the command is considered expanded and the objects in the list
    ///     are passed on without being expanded themselves.
    /// This is how `\noexpand` is implemented.
    ///
    /// The default implementation does nothing.
    fn expansion_override_hook(
        invoker: &CommandRef,
        tag: Option<command::Tag>,
        ctx: &mut dyn Context<Self>,
    ) -> Result<Option<ObjectList>> {
        _ = (invoker, tag, ctx);
        Ok(None)
    }

    /// Handles the execution of an integer register, which assigns the register a new value.
    ///
    /// The default implementation reads an optional `=` and a number,
    ///     and makes the assignment in the current group.
    fn register_assignment_handler(
        index: usize,
        invoker: &CommandRef,
        ctx: &mut dyn Context<Self>,
    ) -> Result<()> {
        _ = invoker;
        let value = pop_register_value(ctx)?;
        ctx.session_mut().set_register(index, value, Scope::Local);
        Ok(())
    }
}

/// Reads the right hand side of a register assignment: an optional `=` followed by a number.
pub fn pop_register_value<S: SessionState>(ctx: &mut dyn Context<S>) -> Result<i64> {
    loop {
        match ctx.peek()? {
            Some(object) if object.is_whitespace() => {
                ctx.next_raw()?;
            }
            Some(Object::Char('=', CatCode::Other)) => {
                ctx.next_raw()?;
                break;
            }
            _ => break,
        }
    }
    crate::context::argument::pop_number(ctx)
}

impl SessionState for () {}

impl<S: Default> Session<S> {
    /// Creates a new session with the provided built-in commands.
    pub fn new(initial_built_ins: HashMap<&str, BuiltIn<S>>) -> Box<Session<S>> {
        let initial_built_ins = initial_built_ins
            .into_iter()
            .map(|(name, built_in)| (CsName::new(name), built_in))
            .collect();
        let mut internal = Internal::default();
        internal
            .sources
            .push(Source::new(String::new(), "", true));
        Box::new(Session {
            state: Default::default(),
            commands_map: command::Map::new(initial_built_ins),
            config: Default::default(),
            file_system: Box::new(file::RealFileSystem {}),
            terminal_out: Rc::new(RefCell::new(std::io::stderr())),
            log_file: Rc::new(RefCell::new(std::io::sink())),
            working_directory: match std::env::current_dir() {
                Ok(path_buf) => Some(path_buf),
                Err(err) => {
                    tracing::warn!("failed to determine the working directory: {err}");
                    None
                }
            },
            cat_codes: Default::default(),
            registers: Default::default(),
            output: String::new(),
            internal,
        })
    }
}

impl<S: SessionState> Session<S> {
    /// Runs the session until all input has been processed.
    ///
    /// Input is added using [Session::push_source].
    /// If [Config::recover_from_errors] is set, non-fatal errors are reported and processing
    ///     continues with the next object.
    /// Groups still open at the end of the input are closed and reported as a fatal error.
    pub fn run(&mut self) -> Result<()> {
        self.run_to_completion(|session| expansion::process(&mut LiveContext::new(session)))
    }

    /// Processes a list of objects as if it were the input.
    ///
    /// Errors and unbalanced groups are handled as in [Session::run].
    pub fn run_list(&mut self, mut list: ObjectList) -> Result<()> {
        self.run_to_completion(|session| {
            expansion::process(&mut ListContext::new(session, &mut list))
        })
    }

    fn run_to_completion(&mut self, mut step: impl FnMut(&mut Self) -> Result<()>) -> Result<()> {
        let start_depth = self.group_depth();
        loop {
            match step(self) {
                Ok(()) => break,
                Err(err) => {
                    if err.is_fatal() || !self.config.recover_from_errors {
                        return Err(err);
                    }
                    self.record_recovered_error(*err);
                }
            }
        }
        let num_open = self.group_depth().saturating_sub(start_depth);
        if num_open > 0 {
            while self.group_depth() > start_depth {
                self.end_group()?;
            }
            return Err(self.error(Tag::UnbalancedGroups, vec![num_open.to_string()]));
        }
        Ok(())
    }

    /// Opens a file as a bounded input stream.
    ///
    /// The category code overrides are in effect while the stream is alive.
    /// See [FileStream] for what happens when it is dropped.
    pub fn open_and_tokenize(
        &mut self,
        path: &str,
        charset: Charset,
        overrides: &[(char, crate::catcode::CatCode)],
    ) -> Result<FileStream<'_, S>> {
        let source_code = match self.read_source_file(path, charset)? {
            None => {
                return Err(self.error(
                    Tag::Io,
                    vec![path.to_string(), "file not found".to_string()],
                ))
            }
            Some(source_code) => source_code,
        };
        FileStream::new(self, path, &source_code, overrides)
    }

    /// Like [Session::open_and_tokenize], but returns [None] if the file does not exist.
    pub fn open_source(
        &mut self,
        path: &str,
        charset: Charset,
        overrides: &[(char, crate::catcode::CatCode)],
    ) -> Result<Option<FileStream<'_, S>>> {
        match self.read_source_file(path, charset)? {
            None => Ok(None),
            Some(source_code) => Ok(Some(FileStream::new(self, path, &source_code, overrides)?)),
        }
    }
}

impl<S> Session<S> {
    /// Adds new input to the session.
    ///
    /// Input sources form a stack.
    /// Pushing a source means it is read before whatever input was there before.
    pub fn push_source<N: Into<String>, T: AsRef<str>>(
        &mut self,
        name: N,
        source_code: T,
    ) -> Result<()> {
        self.check_source_limit()?;
        let name = name.into();
        tracing::debug!(name = %name, "pushing source");
        self.internal
            .sources
            .push(Source::new(name, source_code.as_ref(), false));
        Ok(())
    }

    /// Reads a file and pushes it as new input.
    ///
    /// Returns `false` if the file does not exist.
    pub fn push_file_source(&mut self, path: &str, charset: Charset) -> Result<bool> {
        match self.read_source_file(path, charset)? {
            None => Ok(false),
            Some(source_code) => {
                self.push_source(path, source_code)?;
                Ok(true)
            }
        }
    }

    /// Tokenizes the source code with the current category codes.
    ///
    /// Groups are not assembled, so braces appear as character objects.
    pub fn tokenize(&self, source_code: &str) -> Result<ObjectList> {
        let mut lexer = Lexer::new(source_code);
        let mut list = ObjectList::new();
        loop {
            match lexer.next(
                &self.cat_codes,
                self.config.end_of_line,
                self.config.retain_comments,
            ) {
                Ok(Some(object)) => list.push_back(object),
                Ok(None) => return Ok(list),
                Err(err) => return Err(self.lexer_error(err)),
            }
        }
    }

    /// The text output so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Removes and returns the text output so far.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn emit(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Removes spaces at the end of the output.
    pub fn trim_output_end(&mut self) {
        let len = self.output.trim_end_matches(' ').len();
        self.output.truncate(len);
    }

    pub fn cat_codes(&self) -> &CatCodeTable {
        &self.cat_codes
    }

    pub fn cat_codes_mut(&mut self) -> &mut CatCodeTable {
        &mut self.cat_codes
    }

    /// The file and line of the input currently being read.
    pub fn location(&self) -> Option<Location> {
        self.internal
            .sources
            .iter()
            .rev()
            .find(|source| !source.name.is_empty())
            .map(|source| Location {
                file: source.name.clone(),
                line: source.lexer.line(),
            })
    }

    /// The innermost command being expanded or executed.
    pub fn current_command(&self) -> Option<&CommandRef> {
        self.internal.call_stack.last()
    }

    /// Builds an error at the current location.
    pub fn error(&self, tag: Tag, params: Vec<String>) -> Box<Error> {
        Box::new(Error::new(tag, params).with_location(self.location()))
    }

    /// Reports a warning.
    ///
    /// The warning is written to the terminal and the log file, and is kept in the session.
    pub fn warn(&mut self, tag: Tag, params: Vec<String>) {
        let warning = Warning {
            tag,
            params,
            location: self.location(),
        };
        tracing::warn!(id = tag.id(), "{}", warning.message());
        self.write_message(&warning.to_string());
        self.internal.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.internal.warnings
    }

    /// Errors that were reported and skipped over because error recovery is enabled.
    pub fn recovered_errors(&self) -> &[Error] {
        &self.internal.recovered_errors
    }

    /// Number of expansions performed so far.
    pub fn num_expansions(&self) -> u64 {
        self.internal.num_expansions
    }

    /// The error for a command reference with no binding.
    pub fn undefined_command_error(&self, command_ref: &CommandRef) -> Box<Error> {
        let mut error = Error::new(Tag::UndefinedControlSequence, [command_ref])
            .with_location(self.location());
        if let CommandRef::ControlSequence(name) = command_ref {
            let close_names: Vec<String> = spellcheck::find_close_words(
                self.commands_map.control_sequence_names(),
                name.as_str(),
                2,
            )
            .into_iter()
            .take(3)
            .map(|word_diff| format!("\\{}", word_diff.word))
            .collect();
            if !close_names.is_empty() {
                error = error.with_note(format!("did you mean {}?", close_names.join(", ")));
            }
        }
        Box::new(error)
    }

    /// Begins a new group, for the binding table, the category code table and the registers.
    pub fn start_group(&mut self) {
        self.commands_map.start_group();
        self.cat_codes.begin_group();
        self.registers.begin_group();
        self.internal.after_group.push(ObjectList::new());
        tracing::trace!(depth = self.group_depth(), "began group");
    }

    /// Ends the innermost group, rolling back its local assignments.
    ///
    /// Objects saved for the end of the group are available from [Session::take_after_group]
    ///     until the next group ends.
    pub fn end_group(&mut self) -> Result<()> {
        let floor = self.internal.group_floor;
        if floor > 0 && self.group_depth() <= floor {
            return Err(self.error(Tag::GroupOpenedOutsideFile, vec![floor.to_string()]));
        }
        if self.commands_map.end_group().is_err() {
            return Err(self.error(Tag::UnexpectedEndGroup, vec!["}".to_string()]));
        }
        self.cat_codes.end_group();
        // The registers' groups are opened and closed together with the binding map's.
        _ = self.registers.end_group();
        self.internal.released_after_group = self.internal.after_group.pop().unwrap_or_default();
        tracing::trace!(depth = self.group_depth(), "ended group");
        Ok(())
    }

    /// Sets the depth below which groups cannot be ended, returning the previous depth.
    pub(crate) fn replace_group_floor(&mut self, floor: usize) -> usize {
        std::mem::replace(&mut self.internal.group_floor, floor)
    }

    /// Saves an object to be read right after the current group ends, as `\aftergroup` does.
    ///
    /// Returns `false`, dropping the object, if no group is open.
    pub fn push_after_group(&mut self, object: Object) -> bool {
        match self.internal.after_group.last_mut() {
            None => false,
            Some(list) => {
                list.push_back(object);
                true
            }
        }
    }

    /// Removes and returns the objects saved for after the group that was ended last.
    pub fn take_after_group(&mut self) -> ObjectList {
        std::mem::take(&mut self.internal.released_after_group)
    }

    /// The value of an integer register. Registers that were never assigned are zero.
    pub fn register(&self, index: usize) -> i64 {
        self.registers.get(&index).copied().unwrap_or(0)
    }

    pub fn set_register(&mut self, index: usize, value: i64, scope: Scope) {
        tracing::trace!(index, value, ?scope, "assigning register");
        self.registers.insert(index, value, scope);
    }

    /// Number of open groups.
    pub fn group_depth(&self) -> usize {
        self.commands_map.depth()
    }

    pub(crate) fn enter_command(&mut self, invoker: &CommandRef, is_expansion: bool) -> Result<()> {
        if self.internal.call_stack.len() >= self.config.max_nesting {
            return Err(self.error(
                Tag::CapacityExceeded,
                vec![
                    "command nesting".to_string(),
                    self.config.max_nesting.to_string(),
                ],
            ));
        }
        if is_expansion {
            self.internal.num_expansions += 1;
            if let Some(max) = self.config.max_expansions {
                if self.internal.num_expansions > max {
                    return Err(self.error(
                        Tag::CapacityExceeded,
                        vec!["expansions".to_string(), max.to_string()],
                    ));
                }
            }
        }
        self.internal.call_stack.push(invoker.clone());
        Ok(())
    }

    pub(crate) fn leave_command(&mut self) {
        self.internal.call_stack.pop();
    }

    pub(crate) fn next_live_raw(&mut self) -> Result<Option<Object>> {
        loop {
            let source = match self.internal.sources.last_mut() {
                None => return Ok(None),
                Some(source) => source,
            };
            if let Some(object) = source.pending.pop_front() {
                return Ok(Some(object));
            }
            match source.lexer.next(
                &self.cat_codes,
                self.config.end_of_line,
                self.config.retain_comments,
            ) {
                Ok(Some(object)) => return Ok(Some(object)),
                Ok(None) => {}
                Err(err) => return Err(self.lexer_error(err)),
            }
            if source.boundary {
                return Ok(None);
            }
            self.pop_source();
        }
    }

    pub(crate) fn peek_live_raw(&mut self) -> Result<Option<&Object>> {
        loop {
            let source = match self.internal.sources.last_mut() {
                None => return Ok(None),
                Some(source) => source,
            };
            if !source.pending.is_empty() {
                break;
            }
            match source.lexer.next(
                &self.cat_codes,
                self.config.end_of_line,
                self.config.retain_comments,
            ) {
                Ok(Some(object)) => {
                    source.pending.push_back(object);
                    break;
                }
                Ok(None) => {}
                Err(err) => return Err(self.lexer_error(err)),
            }
            if source.boundary {
                return Ok(None);
            }
            self.pop_source();
        }
        Ok(self
            .internal
            .sources
            .last()
            .and_then(|source| source.pending.front()))
    }

    pub(crate) fn push_live_front(&mut self, object: Object) {
        if let Some(source) = self.internal.sources.last_mut() {
            source.pending.push_front(object);
        }
    }

    pub(crate) fn push_live_list_front(&mut self, list: ObjectList) -> Result<()> {
        let limit = self.config.max_pending_objects;
        let source = match self.internal.sources.last_mut() {
            None => return Ok(()),
            Some(source) => source,
        };
        if source.pending.len() + list.len() > limit {
            return Err(self.error(
                Tag::CapacityExceeded,
                vec!["pending objects".to_string(), limit.to_string()],
            ));
        }
        source.pending.splice_front(list);
        Ok(())
    }

    pub(crate) fn read_live_verbatim(&mut self, end: Option<&str>) -> Result<String> {
        let source = match self.internal.sources.last_mut() {
            None => return Err(self.lexer_error(lexer::Error::UnterminatedVerbatim)),
            Some(source) => source,
        };
        // Objects that were pushed back are rendered and read again as raw text.
        if !source.pending.is_empty() {
            let pending = std::mem::take(&mut source.pending);
            source.lexer.push_front_text(&pending.to_string());
        }
        match source.lexer.read_verbatim(&self.cat_codes, end) {
            Ok(text) => Ok(text),
            Err(err) => Err(self.lexer_error(err)),
        }
    }

    pub(crate) fn num_sources(&self) -> usize {
        self.internal.sources.len()
    }

    pub(crate) fn push_boundary_source(&mut self, name: &str, source_code: &str) -> Result<()> {
        self.check_source_limit()?;
        tracing::debug!(name = %name, "opening bounded source");
        self.internal
            .sources
            .push(Source::new(name.to_string(), source_code, true));
        Ok(())
    }

    pub(crate) fn truncate_sources(&mut self, len: usize) {
        self.internal.sources.truncate(len.max(1));
    }

    fn pop_source(&mut self) {
        if let Some(source) = self.internal.sources.pop() {
            tracing::debug!(name = %source.name, "finished source");
        }
    }

    fn check_source_limit(&self) -> Result<()> {
        if self.internal.sources.len() > self.config.max_nesting {
            return Err(self.error(
                Tag::CapacityExceeded,
                vec![
                    "input nesting".to_string(),
                    self.config.max_nesting.to_string(),
                ],
            ));
        }
        Ok(())
    }

    fn lexer_error(&self, err: lexer::Error) -> Box<Error> {
        match err {
            lexer::Error::InvalidCharacter(c) => {
                self.error(Tag::InvalidCharacter, vec![format!("{c:?}")])
            }
            lexer::Error::EmptyControlSequence => self.error(Tag::EmptyControlSequence, vec![]),
            lexer::Error::UnterminatedVerbatim => {
                let invoker = match self.current_command() {
                    None => "a verbatim argument".to_string(),
                    Some(command_ref) => command_ref.to_string(),
                };
                self.error(Tag::UnterminatedVerbatim, vec![invoker])
            }
        }
    }

    fn record_recovered_error(&mut self, error: Error) {
        tracing::error!(id = error.tag.id(), "{}", error.message());
        self.write_message(&error.to_string());
        self.internal.call_stack.clear();
        self.internal.recovered_errors.push(error);
    }

    /// Writes a line to the terminal and to the log file.
    pub fn write_message(&self, text: &str) {
        _ = writeln!(self.terminal_out.borrow_mut(), "{text}");
        _ = writeln!(self.log_file.borrow_mut(), "{text}");
    }
}

/// Helper trait for implementing the component pattern.
///
/// In the component pattern, the state needed by a group of commands is isolated in a
///     _component_, which is a concrete Rust type defined in the same module as the commands.
/// The commands are generic over any session state that contains the component,
///     and this trait gives them access to it.
/// A specific engine composes many commands by including all of their components in its state.
pub trait HasComponent<C>: SessionState {
    /// Return a immutable reference to the component.
    fn component(&self) -> &C;

    /// Return a mutable reference to the component.
    fn component_mut(&mut self) -> &mut C;
}

/// Implements [HasComponent] when the component is a direct field of the state struct.
///
/// ```
/// # mod mylibrary1 { pub struct Component; }
/// # mod mylibrary2 { pub struct Component; }
/// # use texparser::session::implement_has_component;
/// # use texparser::traits::*;
/// struct MyState {
///     component_1: mylibrary1::Component,
///     component_2: mylibrary2::Component,
/// }
///
/// impl SessionState for MyState {}
///
/// implement_has_component![
///     MyState,
///     (mylibrary1::Component, component_1),
///     (mylibrary2::Component, component_2),
/// ];
/// ```
#[macro_export]
macro_rules! implement_has_component {
    ( $type: path, $component: path, $field: ident ) => {
        implement_has_component![$type, ($component, $field),];
    };
    ( $type: path, $(($component: path, $field: ident),)+) => {
        $(
            impl ::texparser::session::HasComponent<$component> for $type {
                #[inline]
                fn component(&self) -> &$component {
                    &self.$field
                }
                #[inline]
                fn component_mut(&mut self) -> &mut $component {
                    &mut self.$field
                }
            }
        )*
    };
}

pub use implement_has_component;
