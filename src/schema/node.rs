//! Compiled schema nodes.
//!
//! A [`SchemaNode`] is the immutable representation of one validation and
//! serialization rule. Nodes reference each other by [`NodeId`] through
//! the owning graph, so the ownership structure stays acyclic even when
//! traversal cycles.

use alloc::{
    string::String,
    sync::Arc,
    vec::Vec,
};
use core::fmt;

use indexmap::IndexMap;
use regex::Regex;

use super::hooks::{Hook, SerHook};
use crate::value::Value;

/// Stable identifier of a node within its [`super::SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The scalar type a scalar node accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Bytes,
}

impl ScalarType {
    /// The name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Null => "null",
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }
}

/// Numeric bound constraints, checked after coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumBounds {
    pub ge: Option<f64>,
    pub gt: Option<f64>,
    pub le: Option<f64>,
    pub lt: Option<f64>,
}

impl NumBounds {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ge.is_none() && self.gt.is_none() && self.le.is_none() && self.lt.is_none()
    }
}

/// Length constraints for strings, bytes, sequences and mappings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LenBounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl LenBounds {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Scalar node payload: the accepted type plus its constraints.
#[derive(Debug, Clone)]
pub struct ScalarNode {
    pub ty: ScalarType,
    pub bounds: NumBounds,
    pub length: LenBounds,
    pub pattern: Option<Regex>,
}

impl ScalarNode {
    #[must_use]
    pub fn new(ty: ScalarType) -> Self {
        Self {
            ty,
            bounds: NumBounds::default(),
            length: LenBounds::default(),
            pattern: None,
        }
    }
}

/// Whether undeclared keys fail struct validation or are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtraPolicy {
    /// Undeclared keys are dropped from the output.
    #[default]
    Ignore,
    /// Undeclared keys each produce an `extra_forbidden` error.
    Forbid,
}

/// One declared field of a struct node.
#[derive(Debug, Clone)]
pub struct FieldNode {
    pub node: NodeId,
    pub required: bool,
    /// Applied when the key is absent instead of a `missing` error.
    pub default: Option<Value>,
    /// Alternate lookup key, consulted when the primary name is absent.
    pub alias: Option<String>,
}

impl FieldNode {
    /// A field that must be present (unless it has a default).
    #[must_use]
    pub fn required(node: NodeId) -> Self {
        Self {
            node,
            required: true,
            default: None,
            alias: None,
        }
    }

    /// A field that may be absent; absent fields are omitted from the
    /// output.
    #[must_use]
    pub fn optional(node: NodeId) -> Self {
        Self {
            node,
            required: false,
            default: None,
            alias: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    #[must_use]
    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Struct node payload: an ordered field table.
#[derive(Debug, Clone)]
pub struct StructNode {
    pub fields: IndexMap<String, FieldNode>,
    pub extra: ExtraPolicy,
}

/// Union resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionMode {
    /// Attempt alternatives left to right, first success wins.
    Ordered,
    /// Two passes: every alternative under forced-strict mode first, then
    /// every alternative under the ambient mode.
    Smart,
}

/// A user function mapping the raw input to a discriminator tag.
pub type TagFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// How a discriminated union extracts its tag.
#[derive(Clone)]
pub enum Discriminator {
    /// A fixed field name whose string value is the tag.
    Field(String),
    /// A user-supplied function from the raw input to a tag.
    Call(TagFn),
}

impl fmt::Debug for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminator::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Discriminator::Call(_) => f.write_str("Call(..)"),
        }
    }
}

/// The kind-specific payload of a schema node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Accepts any value unchanged.
    Any,
    Scalar(ScalarNode),
    /// An opaque extension object matched by type name.
    Opaque { type_name: String },
    /// Accepts `Null` or the inner schema.
    Nullable { inner: NodeId },
    Sequence { item: NodeId, length: LenBounds },
    Mapping {
        key: NodeId,
        value: NodeId,
        length: LenBounds,
    },
    Struct(StructNode),
    Union {
        alternatives: Vec<NodeId>,
        mode: UnionMode,
    },
    TaggedUnion {
        discriminator: Discriminator,
        tags: IndexMap<String, NodeId>,
    },
    /// A weak back-reference into the graph; breaks ownership cycles while
    /// preserving traversal cycles.
    Ref(NodeId),
    /// Hooks around a shared inner node without modifying it.
    Wrapper { inner: NodeId },
}

/// The compiled, immutable representation of one validation/serialization
/// rule.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) kind: NodeKind,
    pub(crate) hooks: Vec<Hook>,
    pub(crate) ser_hooks: Vec<SerHook>,
    pub(crate) strict: bool,
    pub(crate) label: Option<String>,
}

impl SchemaNode {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            hooks: Vec::new(),
            ser_hooks: Vec::new(),
            strict: false,
            label: None,
        }
    }

    #[must_use]
    pub fn any() -> Self {
        Self::new(NodeKind::Any)
    }

    #[must_use]
    pub fn null() -> Self {
        Self::new(NodeKind::Scalar(ScalarNode::new(ScalarType::Null)))
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::new(NodeKind::Scalar(ScalarNode::new(ScalarType::Bool)))
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::new(NodeKind::Scalar(ScalarNode::new(ScalarType::Int)))
    }

    #[must_use]
    pub fn float() -> Self {
        Self::new(NodeKind::Scalar(ScalarNode::new(ScalarType::Float)))
    }

    #[must_use]
    pub fn string() -> Self {
        Self::new(NodeKind::Scalar(ScalarNode::new(ScalarType::String)))
    }

    #[must_use]
    pub fn bytes() -> Self {
        Self::new(NodeKind::Scalar(ScalarNode::new(ScalarType::Bytes)))
    }

    /// An opaque extension object whose [`crate::OpaqueValue::type_name`]
    /// must equal `type_name`.
    #[must_use]
    pub fn opaque(type_name: impl Into<String>) -> Self {
        Self::new(NodeKind::Opaque {
            type_name: type_name.into(),
        })
    }

    #[must_use]
    pub fn nullable(inner: NodeId) -> Self {
        Self::new(NodeKind::Nullable { inner })
    }

    #[must_use]
    pub fn sequence(item: NodeId) -> Self {
        Self::new(NodeKind::Sequence {
            item,
            length: LenBounds::default(),
        })
    }

    #[must_use]
    pub fn mapping(key: NodeId, value: NodeId) -> Self {
        Self::new(NodeKind::Mapping {
            key,
            value,
            length: LenBounds::default(),
        })
    }

    /// A struct node with the given fields, in declaration order.
    #[must_use]
    pub fn struct_of(fields: impl IntoIterator<Item = (String, FieldNode)>) -> Self {
        Self::new(NodeKind::Struct(StructNode {
            fields: fields.into_iter().collect(),
            extra: ExtraPolicy::default(),
        }))
    }

    /// An ordered (left-to-right) union.
    ///
    /// A union with a single alternative is meaningless (flattening would
    /// remove it); rejecting that is the schema compiler's concern.
    #[must_use]
    pub fn union(alternatives: Vec<NodeId>) -> Self {
        Self::new(NodeKind::Union {
            alternatives,
            mode: UnionMode::Ordered,
        })
    }

    /// A best-effort ("smart") union.
    #[must_use]
    pub fn smart_union(alternatives: Vec<NodeId>) -> Self {
        Self::new(NodeKind::Union {
            alternatives,
            mode: UnionMode::Smart,
        })
    }

    /// A discriminated union routed by a fixed field name.
    #[must_use]
    pub fn tagged_union(
        field: impl Into<String>,
        tags: impl IntoIterator<Item = (String, NodeId)>,
    ) -> Self {
        Self::new(NodeKind::TaggedUnion {
            discriminator: Discriminator::Field(field.into()),
            tags: tags.into_iter().collect(),
        })
    }

    /// A discriminated union routed by a user-supplied tag function.
    #[must_use]
    pub fn tagged_union_by(
        tag_fn: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
        tags: impl IntoIterator<Item = (String, NodeId)>,
    ) -> Self {
        Self::new(NodeKind::TaggedUnion {
            discriminator: Discriminator::Call(Arc::new(tag_fn)),
            tags: tags.into_iter().collect(),
        })
    }

    /// A weak back-reference to another node in the same graph.
    #[must_use]
    pub fn reference(target: NodeId) -> Self {
        Self::new(NodeKind::Ref(target))
    }

    /// Hooks layered around a shared inner node.
    #[must_use]
    pub fn wrapper(inner: NodeId) -> Self {
        Self::new(NodeKind::Wrapper { inner })
    }

    /// Appends a validation hook. Hooks execute with the last-declared
    /// outermost.
    #[must_use]
    pub fn with_hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Appends a serializer hook.
    #[must_use]
    pub fn with_ser_hook(mut self, hook: SerHook) -> Self {
        self.ser_hooks.push(hook);
        self
    }

    /// Marks this node strict regardless of the per-call flag.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Sets the label used for union alternative tagging and messages.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets a `>=` bound. No effect on non-scalar nodes; rejecting that
    /// misuse is the schema compiler's concern.
    #[must_use]
    pub fn ge(mut self, limit: f64) -> Self {
        if let NodeKind::Scalar(s) = &mut self.kind {
            s.bounds.ge = Some(limit);
        }
        self
    }

    /// Sets a `>` bound.
    #[must_use]
    pub fn gt(mut self, limit: f64) -> Self {
        if let NodeKind::Scalar(s) = &mut self.kind {
            s.bounds.gt = Some(limit);
        }
        self
    }

    /// Sets a `<=` bound.
    #[must_use]
    pub fn le(mut self, limit: f64) -> Self {
        if let NodeKind::Scalar(s) = &mut self.kind {
            s.bounds.le = Some(limit);
        }
        self
    }

    /// Sets a `<` bound.
    #[must_use]
    pub fn lt(mut self, limit: f64) -> Self {
        if let NodeKind::Scalar(s) = &mut self.kind {
            s.bounds.lt = Some(limit);
        }
        self
    }

    /// Sets a minimum length, on scalars and containers alike.
    #[must_use]
    pub fn min_len(mut self, min: usize) -> Self {
        match &mut self.kind {
            NodeKind::Scalar(s) => s.length.min = Some(min),
            NodeKind::Sequence { length, .. } | NodeKind::Mapping { length, .. } => {
                length.min = Some(min);
            }
            _ => {}
        }
        self
    }

    /// Sets a maximum length, on scalars and containers alike.
    #[must_use]
    pub fn max_len(mut self, max: usize) -> Self {
        match &mut self.kind {
            NodeKind::Scalar(s) => s.length.max = Some(max),
            NodeKind::Sequence { length, .. } | NodeKind::Mapping { length, .. } => {
                length.max = Some(max);
            }
            _ => {}
        }
        self
    }

    /// Sets a pattern constraint on a string scalar.
    #[must_use]
    pub fn pattern(mut self, pattern: Regex) -> Self {
        if let NodeKind::Scalar(s) = &mut self.kind {
            s.pattern = Some(pattern);
        }
        self
    }

    /// Makes a struct node reject undeclared keys.
    #[must_use]
    pub fn forbid_extra(mut self) -> Self {
        if let NodeKind::Struct(s) = &mut self.kind {
            s.extra = ExtraPolicy::Forbid;
        }
        self
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    #[must_use]
    pub fn ser_hooks(&self) -> &[SerHook] {
        &self.ser_hooks
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The identifier used when tagging this node's errors inside a union:
    /// the explicit label if set, otherwise a kind-derived name.
    #[must_use]
    pub fn tag_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match &self.kind {
            NodeKind::Any => "any".to_string(),
            NodeKind::Scalar(s) => s.ty.name().to_string(),
            NodeKind::Opaque { type_name } => type_name.clone(),
            NodeKind::Nullable { .. } => "nullable".to_string(),
            NodeKind::Sequence { .. } => "sequence".to_string(),
            NodeKind::Mapping { .. } => "mapping".to_string(),
            NodeKind::Struct(_) => "struct".to_string(),
            NodeKind::Union { .. } | NodeKind::TaggedUnion { .. } => "union".to_string(),
            NodeKind::Ref(id) => alloc::format!("ref{id}"),
            NodeKind::Wrapper { .. } => "wrapped".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_builders_apply_to_scalars() {
        let node = SchemaNode::integer().ge(0.0).lt(10.0);
        let NodeKind::Scalar(s) = node.kind() else {
            panic!("expected scalar");
        };
        assert_eq!(s.bounds.ge, Some(0.0));
        assert_eq!(s.bounds.lt, Some(10.0));
        assert!(s.length.is_empty());
    }

    #[test]
    fn length_builders_apply_to_containers() {
        let node = SchemaNode::sequence(NodeId(0)).min_len(1).max_len(3);
        let NodeKind::Sequence { length, .. } = node.kind() else {
            panic!("expected sequence");
        };
        assert_eq!((length.min, length.max), (Some(1), Some(3)));
    }

    #[test]
    fn tag_labels() {
        assert_eq!(SchemaNode::integer().tag_label(), "int");
        assert_eq!(SchemaNode::opaque("Uuid").tag_label(), "Uuid");
        assert_eq!(
            SchemaNode::string().labeled("name").tag_label(),
            "name"
        );
    }

    #[test]
    fn default_clears_required() {
        let field = FieldNode::required(NodeId(0)).with_default(Value::Int(1));
        assert!(!field.required);
        assert_eq!(field.default, Some(Value::Int(1)));
    }
}
