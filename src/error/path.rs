//! Path segment types for error context tracking.

use alloc::string::String;
use core::fmt;

/// A segment in the error context path.
///
/// Segments describe the location within a value where an error occurred.
/// Paths are built from innermost to outermost (push order) and reversed on
/// display to show outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Error occurred under a mapping key or struct field.
    Field(String),
    /// Error occurred at a sequence element index.
    Index(usize),
    /// Error occurred inside a union alternative with this identifier.
    Tag(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "field '{name}'"),
            PathSegment::Index(idx) => write!(f, "index {idx}"),
            PathSegment::Tag(tag) => write!(f, "alternative '{tag}'"),
        }
    }
}

impl PathSegment {
    /// The wire-shape representation of this segment (a string or an
    /// integer in the report's `loc` array).
    #[must_use]
    pub fn to_loc_value(&self) -> crate::value::Value {
        match self {
            PathSegment::Field(name) => crate::value::Value::from(name.as_str()),
            PathSegment::Index(idx) => {
                crate::value::Value::Int(i64::try_from(*idx).unwrap_or(i64::MAX))
            }
            PathSegment::Tag(tag) => crate::value::Value::from(tag.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_path_segment_display() {
        assert_eq!(
            PathSegment::Field("name".into()).to_string(),
            "field 'name'"
        );
        assert_eq!(PathSegment::Index(5).to_string(), "index 5");
        assert_eq!(
            PathSegment::Tag("int".into()).to_string(),
            "alternative 'int'"
        );
    }
}
