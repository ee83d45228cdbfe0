//! Value module.
//!
//! [`Value`] is the uniform in-memory representation of inputs and outputs,
//! whether the source was native data or parsed JSON. Sequences and
//! mappings are shared handles so value graphs may alias and even cycle;
//! cycle detection works on handle identity (see [`Value::identity`]).

use alloc::{sync::Arc, vec::Vec};
use core::{
    any::Any,
    fmt::{self, Debug, Display, Formatter},
};

use parking_lot::RwLock;

mod float;
mod map;

pub use float::Float;
pub use map::Map;

/// Shared handle to a sequence of values.
pub type SeqHandle = Arc<RwLock<Vec<Value>>>;

/// Shared handle to a mapping.
pub type MapHandle = Arc<RwLock<Map>>;

/// A native extension object carried through validation opaquely.
///
/// Implementations supply a type name that scalar `opaque` schema nodes
/// match on. The engine never looks inside; hooks may downcast via
/// [`OpaqueValue::as_any`].
pub trait OpaqueValue: Any + Send + Sync + Debug {
    /// The type name this object matches in `opaque` schema nodes.
    fn type_name(&self) -> &str;

    /// Downcast support for hooks.
    fn as_any(&self) -> &dyn Any;
}

/// A value that can represent any input or output of the engine.
///
/// The variants form a closed union over JSON-representable data plus
/// `Bytes` and `Opaque` extension objects:
/// - `Seq`: sequences `[a, b, c]`
/// - `Map`: insertion-ordered mappings with arbitrary keys
/// - `Opaque`: a native handle (UUIDs and the like) matched by identity
///   and type name
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(Float),
    String(Arc<str>),
    Bytes(Vec<u8>),
    Seq(SeqHandle),
    Map(MapHandle),
    Opaque(Arc<dyn OpaqueValue>),
}

impl Value {
    /// Wraps a vector of values in a fresh sequence handle.
    #[must_use]
    pub fn seq(items: Vec<Value>) -> Self {
        Value::Seq(Arc::new(RwLock::new(items)))
    }

    /// Wraps a [`Map`] in a fresh mapping handle.
    #[must_use]
    pub fn map(map: Map) -> Self {
        Value::Map(Arc::new(RwLock::new(map)))
    }

    /// Wraps a byte vector.
    #[must_use]
    pub fn bytes(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }

    /// Wraps an opaque extension object.
    #[must_use]
    pub fn opaque(value: Arc<dyn OpaqueValue>) -> Self {
        Value::Opaque(value)
    }

    /// A short name for the value's kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
            Value::Opaque(v) => v.type_name(),
        }
    }

    /// The pointer identity of a shared handle, if this value has one.
    ///
    /// Scalars are copied freely and have no identity; only values that can
    /// participate in reference cycles return `Some`.
    #[must_use]
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Seq(h) => Some(Arc::as_ptr(h) as usize),
            Value::Map(h) => Some(Arc::as_ptr(h).cast::<()>() as usize),
            Value::Opaque(h) => Some(Arc::as_ptr(h).cast::<()>() as usize),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq(&self) -> Option<&SeqHandle> {
        match self {
            Value::Seq(h) => Some(h),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&MapHandle> {
        match self {
            Value::Map(h) => Some(h),
            _ => None,
        }
    }
}

/// Structural equality.
///
/// Shared handles first compare by identity (which also makes `x == x`
/// cheap), then by contents. Opaque values compare by identity only.
/// Comparing graphs that cycle through *distinct* handles is the caller's
/// concern, as with any recursive structure.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::json::to_string(self))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(Float::new(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<alloc::string::String> for Value {
    fn from(value: alloc::string::String) -> Self {
        Value::String(Arc::from(value.as_str()))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::String(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::map(value)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::seq(iter.into_iter().collect())
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Value::map(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42_i64), Value::Int(42));
        assert_eq!(Value::from(1.5), Value::Float(Float::new(1.5)));
        assert_eq!(Value::from("s"), Value::String(Arc::from("s")));
    }

    #[test]
    fn int_and_float_are_distinct() {
        assert_ne!(Value::from(1_i64), Value::from(1.0));
    }

    #[test]
    fn seq_equality_is_structural() {
        let a = Value::seq(vec![1_i64.into(), 2_i64.into()]);
        let b = Value::seq(vec![1_i64.into(), 2_i64.into()]);
        assert_eq!(a, b);
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn identity_only_for_handles() {
        assert_eq!(Value::Null.identity(), None);
        assert_eq!(Value::from("x").identity(), None);
        assert!(Value::seq(vec![]).identity().is_some());
        assert!(Value::map(Map::new()).identity().is_some());
    }

    #[test]
    fn aliased_handles_share_identity() {
        let inner = Value::seq(vec![]);
        let copy = inner.clone();
        assert_eq!(inner.identity(), copy.identity());
    }

    #[test]
    fn kind_names() {
        assert_eq!(Value::Null.kind_name(), "null");
        assert_eq!(Value::from(1_i64).kind_name(), "int");
        assert_eq!(Value::seq(vec![]).kind_name(), "sequence");
        assert_eq!(Value::map(Map::new()).kind_name(), "mapping");
    }
}
