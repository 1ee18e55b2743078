//! Generic data structures and algorithms used by the texparser crates.
//!
//! Nothing in this crate knows about TeX.

pub mod algorithms {
    pub mod spellcheck;
}

pub mod collections {
    pub mod groupingmap;
}

pub mod color;
