//! # Texparser: a TeX-like macro expansion engine.
//!
//! This crate reads TeX-like source text and turns it into a stream of objects
//!     (characters, control sequences, groups) while expanding macros and
//!     executing commands provided by the embedding application.
//!
//! The main pieces are:
//! - the [category code table](catcode), which decides how each character is lexed,
//! - the [object model](token) and the [lexer](token::lexer),
//! - the [session](session), which owns the input sources and the scoped [binding table](command::Map),
//! - the [context](context) through which commands read their arguments,
//!     either from the live input or from an already expanded list,
//! - the [expansion engine](expansion),
//! - [errors and warnings](error).
//!
//! A minimal run looks like this:
//! ```
//! use std::collections::HashMap;
//! use texparser::session::Session;
//!
//! let mut session = Session::<()>::new(HashMap::new());
//! session.push_source("input.tex", "Hello, {World}!").unwrap();
//! session.run().unwrap();
//! assert_eq!(session.output(), "Hello, World!");
//! ```

extern crate texparser_stdext;

pub mod catcode;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod expansion;
pub mod prelude;
pub mod session;
pub mod texmacro;
pub mod token;

/// Module that re-exports all of the crate's traits.
///
/// This is useful for getting all of the traits in scope in a Rust module:
/// ```
/// use texparser::traits::*;
/// ```
pub mod traits {
    pub use super::context::Context;
    pub use super::session::HasComponent;
    pub use super::session::SessionState;
}
