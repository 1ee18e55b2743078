//! Session configuration
//!
//! With the `serde` feature, a config can be read from JSON.
//! Every field has a default, so a config file only needs to list the fields it changes:
//! ```json
//! { "recover_from_errors": true, "end_of_line": "token" }
//! ```
use crate::token::lexer::EndOfLinePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// How the lexer handles end of line characters.
    pub end_of_line: EndOfLinePolicy,

    /// Whether comments are produced as [Comment](crate::token::Object::Comment) objects.
    pub retain_comments: bool,

    /// Whether [Session::run](crate::session::Session::run) continues after a recoverable error.
    ///
    /// Recovered errors are reported as they happen and counted.
    pub recover_from_errors: bool,

    /// Maximum depth of nested command invocations.
    pub max_nesting: usize,

    /// Maximum number of objects waiting at the front of a stream.
    pub max_pending_objects: usize,

    /// Maximum number of expansions in a run, or [None] for no limit.
    pub max_expansions: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            end_of_line: EndOfLinePolicy::Space,
            retain_comments: false,
            recover_from_errors: false,
            max_nesting: 512,
            max_pending_objects: 1_000_000,
            max_expansions: None,
        }
    }
}
