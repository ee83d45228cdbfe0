//! JSON codec for the value model.
//!
//! [`parse`] and [`parse_with`] read UTF-8 bytes into [`crate::Value`]s,
//! optionally tolerating truncated input; [`to_string`] renders a value
//! tree back to JSON text.

mod read;
mod write;

pub use read::{parse, parse_with, ParseError, ParseErrorKind, Position};
pub use write::to_string;
