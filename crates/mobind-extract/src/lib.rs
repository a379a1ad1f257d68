//! API extraction.
//!
//! Turns export metadata into a `PackageSet`, parsing every type written in
//! source syntax and deciding what can be bound:
//! - unsupported members are excluded from their owner with a warning
//! - unsupported package-level declarations are excluded with a warning
//! - a surviving declaration that needs an excluded one is an error

pub mod ast;
pub mod error;
pub mod extract;
pub mod lexer;
pub mod lower;
pub mod parser;

pub use error::{ParseError, ParseResult};
pub use extract::{extract, parse_const_value, Extraction};
pub use parser::parse_type;
