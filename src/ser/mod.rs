//! Serialization: the reverse walk over the same schema graph.
//!
//! The serializer mirrors the validator pipeline (before/after/wrap/plain
//! hooks, same ordering contract) but reports failures differently: the
//! first error terminates the whole call, no aggregation. Its cycle guard
//! is an independent instance keyed purely on output-object identity; a
//! wrap serializer hook may catch a propagated [`SerError::CircularReference`]
//! from its continuation and substitute a stub representation instead of
//! failing the call.

use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::any::Any;

use crate::{
    json,
    recursion::{ActiveSet, GuardError},
    schema::{
        Discriminator, HookArgs, NodeId, NodeKind, ScalarType, SchemaGraph, SchemaNode, SerFn,
        SerHook,
    },
    value::{Map, Value},
};

/// Output flavor of a serialize call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerMode {
    /// The output value keeps every native kind (bytes, opaque handles).
    Native,
    /// The output value tree is JSON-encodable: bytes become strings and
    /// opaque objects must be lowered by a hook.
    Json,
}

/// All the ways a serialize call can fail. By convention the first error
/// terminates the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SerError {
    /// The output value graph cycles and no wrap hook substituted for it.
    #[error("circular reference detected during serialization")]
    CircularReference,

    /// The output value nests deeper than the recursion ceiling.
    #[error("serialization recursion depth exceeded the limit of {limit}")]
    TooDeep { limit: usize },

    /// The value does not match the schema node it is serialized under.
    #[error("expected {expected} but found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A declared required field is absent from the output value.
    #[error("missing field `{field}` in output value")]
    MissingField { field: String },

    /// A discriminated union could not route the output value.
    #[error("unable to route union output, tag: {tag:?}")]
    InvalidTag { tag: Option<String> },

    /// The value cannot be represented in the requested output mode.
    #[error("cannot represent {kind} in JSON output")]
    Unsupported { kind: String },

    /// Bytes that are not valid UTF-8 cannot become a JSON string.
    #[error("bytes are not valid UTF-8")]
    InvalidUtf8,

    /// A serializer hook failed.
    #[error("{message}")]
    User { message: String },
}

impl SerError {
    #[must_use]
    pub fn user(message: impl Into<String>) -> Self {
        SerError::User {
            message: message.into(),
        }
    }

    fn type_mismatch(expected: impl Into<String>, found: &Value) -> Self {
        SerError::TypeMismatch {
            expected: expected.into(),
            found: found.kind_name().to_string(),
        }
    }
}

/// The rest of a wrap serializer hook's chain, callable zero or more
/// times. Unlike validation, the error is a single [`SerError`]; catching
/// a [`SerError::CircularReference`] here is how cyclic outputs are given
/// a stub representation.
pub struct SerContinuation<'r, 's> {
    inner: &'r mut (dyn FnMut(Value) -> Result<Value, SerError> + 's),
}

impl SerContinuation<'_, '_> {
    pub(crate) fn new<'r, 's>(
        inner: &'r mut (dyn FnMut(Value) -> Result<Value, SerError> + 's),
    ) -> SerContinuation<'r, 's> {
        SerContinuation { inner }
    }

    /// Runs the inner chain on `input`.
    pub fn call(&mut self, input: Value) -> Result<Value, SerError> {
        (self.inner)(input)
    }
}

/// Per-call serializer state.
pub(crate) struct SerRun<'g> {
    pub(crate) graph: &'g SchemaGraph,
    pub(crate) mode: SerMode,
    pub(crate) context: Option<Arc<dyn Any + Send + Sync>>,
    pub(crate) guard: ActiveSet<usize>,
}

impl<'g> SerRun<'g> {
    pub(crate) fn new(
        graph: &'g SchemaGraph,
        mode: SerMode,
        context: Option<Arc<dyn Any + Send + Sync>>,
        recursion_limit: Option<usize>,
    ) -> Self {
        Self {
            graph,
            mode,
            context,
            guard: ActiveSet::new(recursion_limit),
        }
    }

    /// Serializes `value` against the node `id`.
    ///
    /// The cycle guard is entered by the core logic, inside the hook
    /// chain, so a wrap hook can catch [`SerError::CircularReference`]
    /// coming out of its own continuation and substitute a stub.
    pub(crate) fn serialize_node(&mut self, id: NodeId, value: Value) -> Result<Value, SerError> {
        let node = self.graph.node(id);
        run_chain(self, id, node, node.ser_hooks(), value)
    }

    fn enter_frame(&mut self, value: &Value) -> Result<crate::recursion::Frame, SerError> {
        match self.guard.enter(value.identity()) {
            Ok(frame) => Ok(frame),
            Err(GuardError::Cycle) => Err(SerError::CircularReference),
            Err(GuardError::TooDeep(limit)) => Err(SerError::TooDeep { limit }),
        }
    }
}

/// Hook chain fold; same ordering contract as the validator pipeline.
fn run_chain(
    run: &mut SerRun<'_>,
    id: NodeId,
    node: &SchemaNode,
    hooks: &[SerHook],
    value: Value,
) -> Result<Value, SerError> {
    let Some((hook, inner)) = hooks.split_last() else {
        return apply_kind(run, id, node, value);
    };
    match hook {
        SerHook::Before(f) => {
            let value = invoke_hook(run, f, value)?;
            run_chain(run, id, node, inner, value)
        }
        SerHook::After(f) => {
            let value = run_chain(run, id, node, inner, value)?;
            invoke_hook(run, f, value)
        }
        SerHook::Plain(f) => invoke_hook(run, f, value),
        SerHook::Wrap(f) => {
            let context = run.context.clone();
            let mut inner_call =
                |input: Value| -> Result<Value, SerError> { run_chain(run, id, node, inner, input) };
            let args = HookArgs {
                context: context.as_deref(),
                strict: false,
            };
            f(value, SerContinuation::new(&mut inner_call), &args)
        }
    }
}

fn invoke_hook(run: &SerRun<'_>, f: &SerFn, value: Value) -> Result<Value, SerError> {
    let args = HookArgs {
        context: run.context.as_deref(),
        strict: false,
    };
    f(value, &args)
}

/// Applies the node's core logic with the cycle guard held; acquisition
/// pairs with release on every way out of the frame.
fn apply_kind(
    run: &mut SerRun<'_>,
    _id: NodeId,
    node: &SchemaNode,
    value: Value,
) -> Result<Value, SerError> {
    let frame = run.enter_frame(&value)?;
    let result = dispatch(run, node, value);
    run.guard.exit(frame);
    result
}

fn dispatch(run: &mut SerRun<'_>, node: &SchemaNode, value: Value) -> Result<Value, SerError> {
    match node.kind() {
        // The value's own guard frame is already held by `apply_kind`, so
        // only the children of an `Any` go through `lower_any`.
        NodeKind::Any => match run.mode {
            SerMode::Native => Ok(value),
            SerMode::Json => lower_any_inner(run, &value),
        },
        NodeKind::Scalar(scalar) => serialize_scalar(run, scalar.ty, value),
        NodeKind::Opaque { type_name } => match &value {
            Value::Opaque(o) if o.type_name() == type_name => match run.mode {
                SerMode::Native => Ok(value),
                SerMode::Json => Err(SerError::Unsupported {
                    kind: type_name.clone(),
                }),
            },
            _ => Err(SerError::type_mismatch(type_name.clone(), &value)),
        },
        NodeKind::Nullable { inner } => match value {
            Value::Null => Ok(Value::Null),
            other => run.serialize_node(*inner, other),
        },
        NodeKind::Ref(target) => run.serialize_node(*target, value),
        NodeKind::Wrapper { inner } => run.serialize_node(*inner, value),
        NodeKind::Sequence { item, .. } => {
            let Value::Seq(handle) = &value else {
                return Err(SerError::type_mismatch("sequence", &value));
            };
            let items: Vec<Value> = handle.read().clone();
            let mut out = Vec::with_capacity(items.len());
            for item_value in items {
                out.push(run.serialize_node(*item, item_value)?);
            }
            Ok(Value::seq(out))
        }
        NodeKind::Mapping {
            key, value: value_node, ..
        } => {
            let Value::Map(handle) = &value else {
                return Err(SerError::type_mismatch("mapping", &value));
            };
            let entries: Vec<(Value, Value)> = handle.read().entries().to_vec();
            let mut out = Map::with_capacity(entries.len());
            for (entry_key, entry_value) in entries {
                let k = run.serialize_node(*key, entry_key)?;
                let v = run.serialize_node(*value_node, entry_value)?;
                out.insert(k, v);
            }
            Ok(Value::map(out))
        }
        NodeKind::Struct(struct_node) => {
            let Value::Map(handle) = &value else {
                return Err(SerError::type_mismatch("mapping", &value));
            };
            let snapshot = handle.read().clone();
            let mut out = Map::with_capacity(struct_node.fields.len());
            // Declared fields only, in declaration order; undeclared keys
            // in the output value are dropped.
            for (name, field) in &struct_node.fields {
                match snapshot.get_str(name) {
                    Some(field_value) => {
                        let v = run.serialize_node(field.node, field_value.clone())?;
                        out.insert(Value::from(name.as_str()), v);
                    }
                    None if field.required && field.default.is_none() => {
                        return Err(SerError::MissingField { field: name.clone() });
                    }
                    None => {}
                }
            }
            Ok(Value::map(out))
        }
        NodeKind::Union { alternatives, .. } => {
            // Attempt alternatives in declaration order; the first error is
            // kept if none fits.
            let mut first_error = None;
            for id in alternatives {
                match run.serialize_node(*id, value.clone()) {
                    Ok(v) => return Ok(v),
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }
            Err(first_error.unwrap_or(SerError::InvalidTag { tag: None }))
        }
        NodeKind::TaggedUnion {
            discriminator,
            tags,
        } => {
            let tag = extract_tag(discriminator, &value);
            let Some(tag) = tag else {
                return Err(SerError::InvalidTag { tag: None });
            };
            let Some(target) = tags.get(&tag) else {
                return Err(SerError::InvalidTag { tag: Some(tag) });
            };
            run.serialize_node(*target, value)
        }
    }
}

fn extract_tag(discriminator: &Discriminator, value: &Value) -> Option<String> {
    match discriminator {
        Discriminator::Field(name) => {
            let handle = value.as_map()?;
            let tag = handle.read().get_str(name).cloned()?;
            tag.as_str().map(ToString::to_string)
        }
        Discriminator::Call(f) => f(value),
    }
}

fn serialize_scalar(run: &SerRun<'_>, ty: ScalarType, value: Value) -> Result<Value, SerError> {
    match (ty, &value) {
        (ScalarType::Null, Value::Null)
        | (ScalarType::Bool, Value::Bool(_))
        | (ScalarType::Int, Value::Int(_))
        | (ScalarType::Float, Value::Float(_))
        | (ScalarType::String, Value::String(_)) => Ok(value),
        (ScalarType::Bytes, Value::Bytes(bytes)) => match run.mode {
            SerMode::Native => Ok(value),
            SerMode::Json => core::str::from_utf8(bytes)
                .map(Value::from)
                .map_err(|_| SerError::InvalidUtf8),
        },
        _ => Err(SerError::type_mismatch(ty.name(), &value)),
    }
}

/// Serialize a value with no schema guidance (`Any` nodes): structure is
/// preserved, JSON mode lowers bytes and rejects opaque handles, and the
/// cycle guard still applies.
fn lower_any(run: &mut SerRun<'_>, value: Value) -> Result<Value, SerError> {
    let frame = run.enter_frame(&value)?;
    let result = lower_any_inner(run, &value);
    run.guard.exit(frame);
    result
}

fn lower_any_inner(run: &mut SerRun<'_>, value: &Value) -> Result<Value, SerError> {
    match value {
        Value::Bytes(bytes) => core::str::from_utf8(bytes)
            .map(Value::from)
            .map_err(|_| SerError::InvalidUtf8),
        Value::Opaque(o) => Err(SerError::Unsupported {
            kind: o.type_name().to_string(),
        }),
        Value::Seq(handle) => {
            let items: Vec<Value> = handle.read().clone();
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(lower_any(run, item)?);
            }
            Ok(Value::seq(out))
        }
        Value::Map(handle) => {
            let entries: Vec<(Value, Value)> = handle.read().entries().to_vec();
            let mut out = Map::with_capacity(entries.len());
            for (k, v) in entries {
                out.insert(lower_any(run, k)?, lower_any(run, v)?);
            }
            Ok(Value::map(out))
        }
        scalar => Ok(scalar.clone()),
    }
}

/// Serialize `value` against the graph and render it as JSON text.
pub(crate) fn to_json_string(run: &mut SerRun<'_>, root: NodeId, value: Value) -> Result<String, SerError> {
    let lowered = run.serialize_node(root, value)?;
    Ok(json::to_string(&lowered))
}
