//! conforma - schema-driven validation and serialization engine
//!
//! This crate executes a compiled schema graph against arbitrary input
//! values, from native [`Value`]s or from a JSON byte stream, and produces
//! either a conforming output value or a structured, path-annotated error
//! report. Serialization walks the same graph in reverse.
//!
//! The schema *compiler* is an external collaborator: this crate consumes a
//! finished [`SchemaGraph`] built through [`GraphBuilder`] and performs no
//! declaration-level checking of its own.
//!
//! # Validation example
//!
//! ```
//! use conforma::{GraphBuilder, Options, SchemaNode, Value};
//!
//! let mut builder = GraphBuilder::new();
//! let item = builder.push(SchemaNode::integer().ge(0.0));
//! let root = builder.push(SchemaNode::sequence(item));
//! let graph = builder.finish().unwrap();
//!
//! let out = Options::default()
//!     .validate_json(&graph, root, b"[1, 2, 3]")
//!     .unwrap();
//! assert_eq!(out, Value::seq(vec![1_i64.into(), 2_i64.into(), 3_i64.into()]));
//! ```
//!
//! # Error reports
//!
//! Every failing field is reported in one pass; entries carry the path to
//! the offending value:
//!
//! ```
//! use conforma::{GraphBuilder, Options, SchemaNode, ValidationFailure};
//!
//! let mut builder = GraphBuilder::new();
//! let int = builder.push(SchemaNode::integer());
//! let root = builder.push(SchemaNode::sequence(int));
//! let graph = builder.finish().unwrap();
//!
//! let err = Options::default()
//!     .with_strict()
//!     .validate_json(&graph, root, b"[1, \"x\", 3.5]")
//!     .unwrap_err();
//! let ValidationFailure::Report(report) = err else { panic!() };
//! assert_eq!(report.len(), 2);
//! ```

#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(unsafe_code)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

extern crate alloc;

pub mod error;
pub mod intern;
pub mod json;
pub mod options;
mod recursion;
pub mod schema;
pub mod ser;
pub mod validate;
pub mod value;

pub use crate::{
    error::{
        ErrorKind, ErrorList, FatalError, HookError, PathSegment, ValidationError,
        ValidationFailure, ValidationReport,
    },
    intern::{CacheConfig, CacheMode, StringCache},
    json::{ParseError, ParseErrorKind, Position},
    options::Options,
    schema::{
        Discriminator, ExtraPolicy, FieldNode, GraphBuilder, GraphError, Hook, HookArgs, NodeId,
        SchemaGraph, SchemaNode, SerHook, UnionMode,
    },
    ser::{SerContinuation, SerError, SerMode},
    validate::Continuation,
    value::{Float, Map, OpaqueValue, Value},
};
