//! Commands API
//!
//! A command is what a control sequence or active character is bound to.
//! Commands are either user defined macros, created in documents using primitives like `\def`,
//!     or Rust functions provided by the embedding application.
//!
//! ## Expansion vs execution
//!
//! |                                          | Expansion | Execution
//! |------------------------------------------|-----------|-----------
//! Can read objects from the input?           | Yes       | Yes
//! Produces a list that replaces the command? | Yes       | No
//! Can make changes to the session?           | Only by reading input | Yes
//! Is evaluated inside `\edef`?               | Yes       | No
//!
//! Both kinds of function receive the same `&mut dyn Context<S>`,
//!     so a command behaves identically when it reads its arguments from the
//!     live input or from a list produced by an earlier expansion.

use crate::context::Context;
use crate::prelude::Result;
use crate::texmacro;
use crate::token::{CommandRef, Object, ObjectList};
use std::num;
use std::rc::Rc;
use std::sync;

mod map;

pub use map::Map;

/// The Rust type of expansion primitive functions.
///
/// The returned list replaces the invoking command in the input.
pub type ExpansionFn<S> = fn(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<ObjectList>;

/// The Rust type of execution primitive functions.
pub type ExecutionFn<S> = fn(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<()>;

/// A command.
pub enum Command<S> {
    /// A user defined macro.
    ///
    /// Examples: `\newcommand` and `\def` create these.
    Macro(Rc<texmacro::Macro>),

    /// An expansion primitive.
    ///
    /// Examples: `\expandafter`, `\string`.
    Expandable(ExpansionFn<S>),

    /// A primitive that performs operations on the session.
    ///
    /// Examples: `\def`, `\catcode`.
    Executable(ExecutionFn<S>),

    /// A primitive that expands when only expansion is happening (as in `\edef`)
    ///     and executes otherwise.
    ///
    /// Example: `\verb`, which produces its text in `\edef` and emits it directly otherwise.
    Both {
        expand: ExpansionFn<S>,
        execute: ExecutionFn<S>,
    },

    /// A command that stands for a non-command object.
    ///
    /// Created using `\let\cmd=<character>`.
    /// When processed, the object is processed in place of the command.
    Alias(Object),

    /// An integer register, identified by its index.
    ///
    /// Registers are not expandable.
    /// When executed, the register is assigned a new value read from the input;
    ///     see [SessionState::register_assignment_handler](crate::session::SessionState::register_assignment_handler).
    /// When a number is read, the register stands for its current value.
    ///
    /// Example: `\newcount\c` creates one of these.
    Register(usize),
}

impl<S> std::fmt::Display for Command<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Macro(_) => write![f, "a user-defined macro"],
            Command::Expandable(_) => write![f, "an expansion command"],
            Command::Executable(_) => write![f, "an execution command"],
            Command::Both { .. } => write![f, "an expansion and execution command"],
            Command::Alias(object) => write![f, "an alias of the object `{object}`"],
            Command::Register(index) => write![f, "integer register {index}"],
        }
    }
}

impl<S> Command<S> {
    /// Whether expanding the command produces a replacement list.
    pub fn is_expandable(&self) -> bool {
        matches!(
            self,
            Command::Macro(_) | Command::Expandable(_) | Command::Both { .. }
        )
    }

    /// Whether the command is skipped by full expansion even though it is expandable.
    pub fn is_protected(&self) -> bool {
        match self {
            Command::Macro(m) => m.is_protected(),
            _ => false,
        }
    }

    /// Returns a copy that shares no state with this command.
    ///
    /// Regular clones of macros share the macro definition, which is immutable.
    /// This method is for callers that want to modify the definition.
    pub fn clone_deep(&self) -> Command<S> {
        match self {
            Command::Macro(m) => Command::Macro(Rc::new(m.as_ref().clone())),
            other => other.clone(),
        }
    }
}

// We need to implement Clone manually as the derived implementation requires S to be Clone.
impl<S> Clone for Command<S> {
    fn clone(&self) -> Self {
        match self {
            Command::Macro(m) => Command::Macro(m.clone()),
            Command::Expandable(e) => Command::Expandable(*e),
            Command::Executable(e) => Command::Executable(*e),
            Command::Both { expand, execute } => Command::Both {
                expand: *expand,
                execute: *execute,
            },
            Command::Alias(object) => Command::Alias(object.clone()),
            Command::Register(index) => Command::Register(*index),
        }
    }
}

/// A command together with the name it is bound to.
///
/// Bindings are immutable.
/// Redefining a name replaces its binding wholesale,
///     so a binding held by a caller remains valid after a redefinition.
pub struct Binding<S> {
    pub name: CommandRef,
    pub command: Command<S>,
    pub doc: Option<&'static str>,
    pub tag: Option<Tag>,
}

impl<S> Binding<S> {
    pub fn name(&self) -> &CommandRef {
        &self.name
    }

    pub fn clone_deep(&self) -> Binding<S> {
        Binding {
            name: self.name.clone(),
            command: self.command.clone_deep(),
            doc: self.doc,
            tag: self.tag,
        }
    }
}

/// A built-in command. This is a command provided at session initialization.
///
/// This struct is simply a combination of a [Command] and a documentation string for the command.
pub struct BuiltIn<S> {
    cmd: Command<S>,
    doc: Option<&'static str>,
    tag: Option<Tag>,
}

impl<S> BuiltIn<S> {
    /// Create a new expansion built-in command.
    pub fn new_expansion(t: ExpansionFn<S>) -> BuiltIn<S> {
        Command::Expandable(t).into()
    }

    /// Create a new execution built-in command.
    pub fn new_execution(t: ExecutionFn<S>) -> BuiltIn<S> {
        Command::Executable(t).into()
    }

    /// Create a new built-in command that expands or executes depending on the context.
    pub fn new_both(expand: ExpansionFn<S>, execute: ExecutionFn<S>) -> BuiltIn<S> {
        Command::Both { expand, execute }.into()
    }

    /// Set the doc for this built-in command.
    pub fn with_doc(mut self, doc: &'static str) -> BuiltIn<S> {
        self.doc = Some(doc);
        self
    }

    /// Set the tag for this built-in command.
    pub fn with_tag(mut self, tag: Tag) -> BuiltIn<S> {
        self.tag = Some(tag);
        self
    }

    pub fn cmd(&self) -> &Command<S> {
        &self.cmd
    }

    pub fn doc(&self) -> Option<&'static str> {
        self.doc
    }

    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }
}

// We need to implement Clone manually as the derived implementation requires S to be Clone.
impl<S> Clone for BuiltIn<S> {
    fn clone(&self) -> Self {
        Self {
            cmd: self.cmd.clone(),
            doc: self.doc,
            tag: self.tag,
        }
    }
}

impl<S> From<Command<S>> for BuiltIn<S> {
    fn from(cmd: Command<S>) -> Self {
        BuiltIn {
            cmd,
            doc: None,
            tag: None,
        }
    }
}

impl<S> From<Rc<texmacro::Macro>> for BuiltIn<S> {
    fn from(cmd: Rc<texmacro::Macro>) -> Self {
        Command::Macro(cmd).into()
    }
}

/// What to do when defining a name that is already bound.
///
/// The engine itself never refuses a redefinition.
/// Defining commands, like `\newcommand` and `\providecommand`,
///     choose a policy and consult [Map::check_overwrite] before assigning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Overwrite {
    /// Redefinition is an error.
    Forbid,
    /// Redefinition replaces the existing binding.
    Force,
    /// Redefinition is silently skipped, keeping the existing binding.
    Skip,
}

/// A tag is a piece of metadata that is optionally attached to a command.
///
/// Tags let commands recognize other commands by identity rather than by name.
/// For example, a conditional that evaluates to false skips input until it finds a command
///     tagged as `\else` or `\fi`, even if that command was renamed using `\let`.
///
/// Tags are non-zero 32 bit integers, so `Option<Tag>` takes up 4 bytes in memory.
#[derive(PartialEq, Eq, Clone, Copy, Debug, PartialOrd, Ord, Hash)]
pub struct Tag(num::NonZeroU32);

static NEXT_TAG_VALUE: sync::Mutex<u32> = sync::Mutex::new(1);

impl Tag {
    /// Creates a new unique tag.
    ///
    /// ```
    /// # use texparser::command::Tag;
    /// let tag_1 = Tag::new();
    /// let tag_2 = Tag::new();
    /// assert_ne!(tag_1, tag_2);
    /// ```
    // Creating a tag is a global operation and should be explicit.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Tag {
        let mut n = match NEXT_TAG_VALUE.lock() {
            Ok(n) => n,
            Err(poisoned) => poisoned.into_inner(),
        };
        let value = *n;
        *n = value.wrapping_add(1).max(1);
        Tag(num::NonZeroU32::new(value).unwrap_or(num::NonZeroU32::MIN))
    }
}

/// A static tag enables creating a tag in a static variable.
///
/// ```
/// # use texparser::command::StaticTag;
/// static TAG: StaticTag = StaticTag::new();
///
/// assert_eq!(TAG.get(), TAG.get());
/// ```
pub struct StaticTag(sync::OnceLock<Tag>);

impl Default for StaticTag {
    fn default() -> Self {
        StaticTag::new()
    }
}

impl StaticTag {
    pub const fn new() -> StaticTag {
        StaticTag(sync::OnceLock::new())
    }

    /// Returns the tag, creating it on first use.
    pub fn get(&self) -> Tag {
        *self.0.get_or_init(Tag::new)
    }
}
