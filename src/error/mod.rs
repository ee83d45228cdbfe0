//! Error types for validation and the assembled report.
//!
//! This module provides:
//! - [`ErrorKind`] - the taxonomy of validation failures
//! - [`ValidationError`] - one path-annotated entry
//! - [`ErrorList`] - entries accumulated across nested attempts
//! - [`ValidationReport`] - the final, deterministic report
//! - [`ValidationFailure`], [`FatalError`], [`HookError`] - call-level
//!   failure plumbing

use alloc::{
    string::String,
    vec::Vec,
};
use core::fmt;

use crate::value::{Map, Value};

mod path;

pub use path::PathSegment;

/// The specific kind of validation error that occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Expected one kind of value, found another.
    TypeMismatch {
        /// The expected type description.
        expected: String,
        /// The found type description.
        found: String,
    },

    /// A numeric bound constraint was violated.
    BoundViolated {
        /// The comparison that failed: `">="`, `">"`, `"<="` or `"<"`.
        op: &'static str,
        /// The bound that was violated.
        limit: f64,
    },

    /// A length constraint was violated.
    LengthOutOfRange {
        min: Option<usize>,
        max: Option<usize>,
        found: usize,
    },

    /// A string did not match the node's pattern constraint.
    PatternMismatch {
        /// The pattern source text.
        pattern: String,
    },

    /// A required field was absent (the field name is the innermost path
    /// segment).
    Missing,

    /// An undeclared field was present and the node forbids extras.
    ExtraForbidden,

    /// A discriminated union could not route the input.
    UnionTagInvalid {
        /// The tag that was found, if one could be extracted.
        tag: Option<String>,
        /// The valid tag set, in declaration order.
        expected: Vec<String>,
    },

    /// The input value graph cycled back into a value already being
    /// validated against the same schema node.
    CycleDetected,

    /// An acyclic input nested deeper than the recursion ceiling.
    RecursionTooDeep {
        /// The configured depth limit.
        limit: usize,
    },

    /// A hook rejected the value.
    UserRaised {
        /// The hook's message.
        message: String,
    },
}

impl ErrorKind {
    /// The stable `type` tag used in the report wire shape.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch { .. } => "type_mismatch",
            ErrorKind::BoundViolated { .. }
            | ErrorKind::LengthOutOfRange { .. }
            | ErrorKind::PatternMismatch { .. } => "constraint_violation",
            ErrorKind::Missing => "missing",
            ErrorKind::ExtraForbidden => "extra_forbidden",
            ErrorKind::UnionTagInvalid { .. } => "union_tag_invalid",
            ErrorKind::CycleDetected => "cycle_detected",
            ErrorKind::RecursionTooDeep { .. } => "recursion_too_deep",
            ErrorKind::UserRaised { .. } => "user_raised",
        }
    }

    /// Message template parameters for the wire shape's `ctx` object, if
    /// this kind carries any.
    #[must_use]
    pub fn ctx(&self) -> Option<Map> {
        match self {
            ErrorKind::TypeMismatch { expected, found } => Some(
                [("expected", expected.as_str()), ("found", found.as_str())]
                    .into_iter()
                    .collect(),
            ),
            ErrorKind::BoundViolated { op, limit } => {
                let mut map = Map::new();
                map.insert("constraint".into(), (*op).into());
                map.insert("limit".into(), (*limit).into());
                Some(map)
            }
            ErrorKind::LengthOutOfRange { min, max, found } => {
                let mut map = Map::new();
                if let Some(min) = min {
                    map.insert("min".into(), int_value(*min));
                }
                if let Some(max) = max {
                    map.insert("max".into(), int_value(*max));
                }
                map.insert("found".into(), int_value(*found));
                Some(map)
            }
            ErrorKind::PatternMismatch { pattern } => {
                let mut map = Map::new();
                map.insert("pattern".into(), pattern.as_str().into());
                Some(map)
            }
            ErrorKind::UnionTagInvalid { tag, expected } => {
                let mut map = Map::new();
                if let Some(tag) = tag {
                    map.insert("tag".into(), tag.as_str().into());
                }
                map.insert(
                    "expected".into(),
                    expected.iter().map(|t| Value::from(t.as_str())).collect(),
                );
                Some(map)
            }
            ErrorKind::RecursionTooDeep { limit } => {
                let mut map = Map::new();
                map.insert("limit".into(), int_value(*limit));
                Some(map)
            }
            _ => None,
        }
    }
}

fn int_value(v: usize) -> Value {
    Value::Int(i64::try_from(v).unwrap_or(i64::MAX))
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TypeMismatch { expected, found } => {
                write!(f, "expected {expected} but found {found}")
            }
            ErrorKind::BoundViolated { op, limit } => {
                write!(f, "value must be {op} {limit}")
            }
            ErrorKind::LengthOutOfRange { min, max, found } => {
                match (min, max) {
                    (Some(min), Some(max)) => {
                        write!(f, "length must be between {min} and {max}")?;
                    }
                    (Some(min), None) => write!(f, "length must be at least {min}")?,
                    (None, Some(max)) => write!(f, "length must be at most {max}")?,
                    (None, None) => write!(f, "length out of range")?,
                }
                write!(f, " but was {found}")
            }
            ErrorKind::PatternMismatch { pattern } => {
                write!(f, "string does not match pattern `{pattern}`")
            }
            ErrorKind::Missing => f.write_str("missing required field"),
            ErrorKind::ExtraForbidden => f.write_str("extra fields are not permitted"),
            ErrorKind::UnionTagInvalid { tag, expected } => {
                match tag {
                    Some(tag) => write!(f, "invalid union tag `{tag}`, ")?,
                    None => f.write_str("unable to extract union tag, ")?,
                }
                format_expected_list(f, expected, "tags")
            }
            ErrorKind::CycleDetected => f.write_str("cyclic reference detected"),
            ErrorKind::RecursionTooDeep { limit } => {
                write!(f, "recursion depth exceeded the limit of {limit}")
            }
            ErrorKind::UserRaised { message } => f.write_str(message),
        }
    }
}

/// Format a list of expected values for error messages.
fn format_expected_list(f: &mut fmt::Formatter<'_>, expected: &[String], none_name: &str) -> fmt::Result {
    match expected {
        [] => write!(f, "there are no {none_name}"),
        [a1] => write!(f, "expected `{a1}`"),
        [a1, a2] => write!(f, "expected either `{a1}` or `{a2}`"),
        [a1, rest @ .., an] => {
            write!(f, "expected one of `{a1}`")?;
            for alt in rest {
                write!(f, ", `{alt}`")?;
            }
            write!(f, ", or `{an}`")
        }
    }
}

/// A validation error with path context and an input snapshot.
///
/// # Path building
///
/// Path segments are appended with the `in_*` builders on the way out of a
/// failed descent (O(1) push) and reversed on display to show the path from
/// outermost to innermost context.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The specific error that occurred.
    pub kind: ErrorKind,
    /// Path segments from innermost to outermost (reversed on display).
    pub path: Vec<PathSegment>,
    /// A snapshot of the offending input value.
    pub input: Value,
}

impl ValidationError {
    /// Create a new validation error with no path context.
    #[must_use]
    pub fn new(kind: ErrorKind, input: Value) -> Self {
        Self {
            kind,
            path: Vec::new(),
            input,
        }
    }

    /// Add a field context to this error's path.
    #[must_use]
    pub fn in_field(mut self, name: impl Into<String>) -> Self {
        self.path.push(PathSegment::Field(name.into()));
        self
    }

    /// Add a sequence index context to this error's path.
    #[must_use]
    pub fn in_index(mut self, index: usize) -> Self {
        self.path.push(PathSegment::Index(index));
        self
    }

    /// Add a union alternative context to this error's path.
    #[must_use]
    pub fn in_tag(mut self, tag: impl Into<String>) -> Self {
        self.path.push(PathSegment::Tag(tag.into()));
        self
    }

    /// Create a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, input: &Value) -> Self {
        Self::new(
            ErrorKind::TypeMismatch {
                expected: expected.into(),
                found: input.kind_name().to_string(),
            },
            input.clone(),
        )
    }

    /// Create a user-raised error.
    #[must_use]
    pub fn user_raised(message: impl Into<String>, input: Value) -> Self {
        Self::new(
            ErrorKind::UserRaised {
                message: message.into(),
            },
            input,
        )
    }

    /// The wire-shape object `{loc, msg, type, input, ctx?}` for this entry.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        let mut map = Map::with_capacity(5);
        map.insert(
            "loc".into(),
            self.path.iter().rev().map(PathSegment::to_loc_value).collect(),
        );
        map.insert("msg".into(), self.kind.to_string().into());
        map.insert("type".into(), self.kind.code().into());
        map.insert("input".into(), self.input.clone());
        if let Some(ctx) = self.kind.ctx() {
            map.insert("ctx".into(), Value::map(ctx));
        }
        Value::map(map)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            write!(f, "in ")?;
            for (i, seg) in self.path.iter().rev().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{seg}")?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for ValidationError {}

/// Errors accumulated across the nested attempts of one validation call.
///
/// The list a failed validation returns is never empty except for the
/// internal sentinel used while a fatal hook error unwinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorList(Vec<ValidationError>);

impl ErrorList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding a single entry.
    #[must_use]
    pub fn one(error: ValidationError) -> Self {
        Self(alloc::vec![error])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn merge(&mut self, other: ErrorList) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Annotate every entry with a field context.
    #[must_use]
    pub fn in_field(self, name: &str) -> Self {
        Self(self.0.into_iter().map(|e| e.in_field(name)).collect())
    }

    /// Annotate every entry with a sequence index context.
    #[must_use]
    pub fn in_index(self, index: usize) -> Self {
        Self(self.0.into_iter().map(|e| e.in_index(index)).collect())
    }

    /// Annotate every entry with a union alternative context.
    #[must_use]
    pub fn in_tag(self, tag: &str) -> Self {
        Self(self.0.into_iter().map(|e| e.in_tag(tag)).collect())
    }

    /// Assemble the final report.
    #[must_use]
    pub fn into_report(self) -> ValidationReport {
        ValidationReport { errors: self.0 }
    }
}

impl IntoIterator for ErrorList {
    type Item = ValidationError;
    type IntoIter = alloc::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<ValidationError> for ErrorList {
    fn from_iter<T: IntoIterator<Item = ValidationError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The final report of a failed validation: every problem found, in
/// deterministic order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// The wire shape: an ordered list of `{loc, msg, type, input, ctx?}`
    /// objects.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        self.errors.iter().map(ValidationError::to_json_value).collect()
    }

    /// The wire shape rendered to a JSON string.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        crate::json::to_string(&self.to_json_value())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.errors.len();
        write!(
            f,
            "{n} validation error{}",
            if n == 1 { "" } else { "s" }
        )?;
        for error in &self.errors {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// A programming error inside a hook, as opposed to a validation failure.
///
/// Fatal errors propagate out of the whole call without being aggregated
/// into the report, and wrap hooks cannot catch them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fatal hook error: {message}")]
pub struct FatalError {
    /// What went wrong inside the hook.
    pub message: String,
}

impl FatalError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The failure a before/after/plain hook may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// A validation failure: becomes a `UserRaised` entry at the current
    /// path and aggregates like any other error.
    Raised(String),
    /// A programming error: aborts the whole call (see [`FatalError`]).
    Fatal(String),
}

impl HookError {
    #[must_use]
    pub fn raised(message: impl Into<String>) -> Self {
        HookError::Raised(message.into())
    }

    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        HookError::Fatal(message.into())
    }
}

/// All the ways a validate call can fail.
#[derive(Debug, thiserror::Error)]
pub enum ValidationFailure {
    /// The JSON input was malformed.
    #[error(transparent)]
    Parse(#[from] crate::json::ParseError),
    /// The input did not conform to the schema.
    #[error(transparent)]
    Report(#[from] ValidationReport),
    /// A hook failed in a way that is not a validation failure.
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl ValidationFailure {
    /// The report, if this failure is one.
    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ValidationFailure::Report(report) => Some(report),
            _ => None,
        }
    }
}
