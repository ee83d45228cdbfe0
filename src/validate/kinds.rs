//! Core validation logic, one arm per node kind.
//!
//! Sibling sub-validations are all attempted and their errors recorded
//! even after earlier siblings fail, so one call surfaces every problem in
//! one report. Within one value's own chain a failure short-circuits.

use alloc::{
    string::String,
    vec::Vec,
};

use crate::{
    error::{ErrorKind, ErrorList, ValidationError},
    schema::{
        ExtraPolicy, LenBounds, NodeId, NodeKind, ScalarNode, ScalarType, SchemaNode, StructNode,
    },
    value::{Map, Value},
};

use super::{union, Failure, Run};

/// Applies the node's core logic with the recursion guard held.
///
/// Guard acquisition pairs with release on every way out of the frame;
/// a refusal (cycle or depth) surfaces as its dedicated error entry.
pub(crate) fn apply_kind(
    run: &mut Run<'_>,
    id: NodeId,
    node: &SchemaNode,
    value: Value,
) -> Result<Value, Failure> {
    let frame = run.enter_frame(id, &value)?;
    let result = dispatch(run, node, value);
    run.guard.exit(frame);
    result
}

fn dispatch(run: &mut Run<'_>, node: &SchemaNode, value: Value) -> Result<Value, Failure> {
    match node.kind() {
        NodeKind::Any => Ok(value),
        NodeKind::Scalar(scalar) => {
            let strict = run.effective_strict(node);
            validate_scalar(run, scalar, strict, value).map_err(Failure::Invalid)
        }
        NodeKind::Opaque { type_name } => match &value {
            Value::Opaque(o) if o.type_name() == type_name => Ok(value),
            _ => Err(Failure::Invalid(ErrorList::one(
                ValidationError::type_mismatch(type_name.clone(), &value),
            ))),
        },
        NodeKind::Nullable { inner } => match value {
            Value::Null => Ok(Value::Null),
            other => run.validate_node(*inner, other),
        },
        NodeKind::Ref(target) => run.validate_node(*target, value),
        NodeKind::Wrapper { inner } => run.validate_node(*inner, value),
        NodeKind::Sequence { item, length } => validate_sequence(run, *item, *length, value),
        NodeKind::Mapping {
            key,
            value: value_node,
            length,
        } => validate_mapping(run, *key, *value_node, *length, value),
        NodeKind::Struct(node) => validate_struct(run, node, value),
        NodeKind::Union { alternatives, mode } => union::resolve(run, alternatives, *mode, value),
        NodeKind::TaggedUnion {
            discriminator,
            tags,
        } => union::resolve_tagged(run, discriminator, tags, value),
    }
}

// =============================================================================
// Scalars
// =============================================================================

fn validate_scalar(
    run: &Run<'_>,
    scalar: &ScalarNode,
    strict: bool,
    value: Value,
) -> Result<Value, ErrorList> {
    let converted = convert_scalar(run, scalar.ty, strict, &value)
        .ok_or_else(|| ErrorList::one(ValidationError::type_mismatch(scalar.ty.name(), &value)))?;

    let mut errors = ErrorList::new();
    check_bounds(scalar, &converted, &value, &mut errors);
    check_length(scalar.length, &converted, &value, &mut errors);
    check_pattern(scalar, &converted, &value, &mut errors);

    if errors.is_empty() {
        Ok(converted)
    } else {
        Err(errors)
    }
}

/// The documented coercion table. Strict mode accepts exact kinds only;
/// lax mode additionally permits the conversions below. Returns `None` on
/// a type mismatch.
fn convert_scalar(run: &Run<'_>, ty: ScalarType, strict: bool, value: &Value) -> Option<Value> {
    match (ty, value) {
        (ScalarType::Null, Value::Null) => Some(Value::Null),
        (ScalarType::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
        (ScalarType::Int, Value::Int(i)) => Some(Value::Int(*i)),
        (ScalarType::Float, Value::Float(f)) => Some(Value::Float(*f)),
        (ScalarType::String, Value::String(s)) => Some(Value::String(s.clone())),
        (ScalarType::Bytes, Value::Bytes(b)) => Some(Value::Bytes(b.clone())),
        _ if strict => None,

        // Lax coercions.
        (ScalarType::Bool, Value::Int(0)) => Some(Value::Bool(false)),
        (ScalarType::Bool, Value::Int(1)) => Some(Value::Bool(true)),
        (ScalarType::Bool, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        (ScalarType::Int, Value::Float(f)) => {
            let v = f.get();
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                Some(Value::Int(v as i64))
            } else {
                None
            }
        }
        (ScalarType::Int, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Int),
        (ScalarType::Int, Value::Bool(b)) => Some(Value::Int(i64::from(*b))),
        (ScalarType::Float, Value::Int(i)) => {
            #[allow(clippy::cast_precision_loss)]
            Some(Value::from(*i as f64))
        }
        (ScalarType::Float, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::from),
        (ScalarType::String, Value::Bytes(b)) => core::str::from_utf8(b)
            .ok()
            .map(|s| Value::String(run.shared_string(s))),
        (ScalarType::Bytes, Value::String(s)) => Some(Value::Bytes(s.as_bytes().to_vec())),
        _ => None,
    }
}

fn check_bounds(scalar: &ScalarNode, converted: &Value, input: &Value, errors: &mut ErrorList) {
    if scalar.bounds.is_empty() {
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    let v = match converted {
        Value::Int(i) => *i as f64,
        Value::Float(f) => f.get(),
        _ => return,
    };
    let violations = [
        (">=", scalar.bounds.ge.filter(|limit| !(v >= *limit))),
        (">", scalar.bounds.gt.filter(|limit| !(v > *limit))),
        ("<=", scalar.bounds.le.filter(|limit| !(v <= *limit))),
        ("<", scalar.bounds.lt.filter(|limit| !(v < *limit))),
    ];
    for (op, violated) in violations {
        if let Some(limit) = violated {
            errors.push(ValidationError::new(
                ErrorKind::BoundViolated { op, limit },
                input.clone(),
            ));
        }
    }
}

fn check_length(length: LenBounds, converted: &Value, input: &Value, errors: &mut ErrorList) {
    if length.is_empty() {
        return;
    }
    let found = match converted {
        Value::String(s) => s.chars().count(),
        Value::Bytes(b) => b.len(),
        _ => return,
    };
    push_length_error(length, found, input, errors);
}

pub(crate) fn push_length_error(
    length: LenBounds,
    found: usize,
    input: &Value,
    errors: &mut ErrorList,
) {
    let too_short = length.min.is_some_and(|min| found < min);
    let too_long = length.max.is_some_and(|max| found > max);
    if too_short || too_long {
        errors.push(ValidationError::new(
            ErrorKind::LengthOutOfRange {
                min: length.min,
                max: length.max,
                found,
            },
            input.clone(),
        ));
    }
}

fn check_pattern(scalar: &ScalarNode, converted: &Value, input: &Value, errors: &mut ErrorList) {
    let Some(pattern) = &scalar.pattern else {
        return;
    };
    let Value::String(s) = converted else {
        return;
    };
    if !pattern.is_match(s) {
        errors.push(ValidationError::new(
            ErrorKind::PatternMismatch {
                pattern: pattern.as_str().to_string(),
            },
            input.clone(),
        ));
    }
}

// =============================================================================
// Containers
// =============================================================================

fn validate_sequence(
    run: &mut Run<'_>,
    item: NodeId,
    length: LenBounds,
    value: Value,
) -> Result<Value, Failure> {
    let Value::Seq(handle) = &value else {
        return Err(Failure::Invalid(ErrorList::one(
            ValidationError::type_mismatch("sequence", &value),
        )));
    };
    // Snapshot the elements so user hooks never observe a held lock.
    let items: Vec<Value> = handle.read().clone();

    let mut errors = ErrorList::new();
    push_length_error(length, items.len(), &value, &mut errors);

    let mut out = Vec::with_capacity(items.len());
    for (index, item_value) in items.into_iter().enumerate() {
        match run.validate_node(item, item_value) {
            Ok(v) => out.push(v),
            Err(Failure::Invalid(list)) => errors.merge(list.in_index(index)),
            Err(fatal @ Failure::Fatal(_)) => return Err(fatal),
        }
    }

    if errors.is_empty() {
        Ok(Value::seq(out))
    } else {
        Err(Failure::Invalid(errors))
    }
}

fn validate_mapping(
    run: &mut Run<'_>,
    key_node: NodeId,
    value_node: NodeId,
    length: LenBounds,
    value: Value,
) -> Result<Value, Failure> {
    let Value::Map(handle) = &value else {
        return Err(Failure::Invalid(ErrorList::one(
            ValidationError::type_mismatch("mapping", &value),
        )));
    };
    let entries: Vec<(Value, Value)> = handle.read().entries().to_vec();

    let mut errors = ErrorList::new();
    push_length_error(length, entries.len(), &value, &mut errors);

    let mut out = Map::with_capacity(entries.len());
    for (entry_key, entry_value) in entries {
        let label = key_repr(&entry_key);
        // The key and the value of one entry are siblings: both run.
        let key_out = match run.validate_node(key_node, entry_key) {
            Ok(v) => Some(v),
            Err(Failure::Invalid(list)) => {
                errors.merge(list.in_field(&label));
                None
            }
            Err(fatal @ Failure::Fatal(_)) => return Err(fatal),
        };
        let value_out = match run.validate_node(value_node, entry_value) {
            Ok(v) => Some(v),
            Err(Failure::Invalid(list)) => {
                errors.merge(list.in_field(&label));
                None
            }
            Err(fatal @ Failure::Fatal(_)) => return Err(fatal),
        };
        if let (Some(k), Some(v)) = (key_out, value_out) {
            out.insert(k, v);
        }
    }

    if errors.is_empty() {
        Ok(Value::map(out))
    } else {
        Err(Failure::Invalid(errors))
    }
}

fn validate_struct(
    run: &mut Run<'_>,
    node: &StructNode,
    value: Value,
) -> Result<Value, Failure> {
    let Value::Map(handle) = &value else {
        return Err(Failure::Invalid(ErrorList::one(
            ValidationError::type_mismatch("mapping", &value),
        )));
    };
    let snapshot = handle.read().clone();

    let mut errors = ErrorList::new();
    let mut out = Map::with_capacity(node.fields.len());

    // Fields are emitted in declaration order regardless of input order.
    for (name, field) in &node.fields {
        let found = snapshot.get_str(name).or_else(|| {
            field
                .alias
                .as_deref()
                .and_then(|alias| snapshot.get_str(alias))
        });
        match found {
            Some(field_value) => match run.validate_node(field.node, field_value.clone()) {
                Ok(v) => {
                    out.insert(Value::from(name.as_str()), v);
                }
                Err(Failure::Invalid(list)) => errors.merge(list.in_field(name)),
                Err(fatal @ Failure::Fatal(_)) => return Err(fatal),
            },
            None => {
                if let Some(default) = &field.default {
                    out.insert(Value::from(name.as_str()), default.clone());
                } else if field.required {
                    errors.push(
                        ValidationError::new(ErrorKind::Missing, value.clone())
                            .in_field(name.as_str()),
                    );
                }
            }
        }
    }

    if node.extra == ExtraPolicy::Forbid {
        for (entry_key, entry_value) in snapshot.iter() {
            if !is_declared(node, entry_key) {
                errors.push(
                    ValidationError::new(ErrorKind::ExtraForbidden, entry_value.clone())
                        .in_field(key_repr(entry_key)),
                );
            }
        }
    }

    if errors.is_empty() {
        Ok(Value::map(out))
    } else {
        Err(Failure::Invalid(errors))
    }
}

fn is_declared(node: &StructNode, key: &Value) -> bool {
    let Value::String(key) = key else {
        return false;
    };
    node.fields.contains_key(key.as_ref())
        || node
            .fields
            .values()
            .any(|f| f.alias.as_deref() == Some(key.as_ref()))
}

/// Renders a mapping key for a path segment: string keys verbatim, other
/// keys as their JSON text.
pub(crate) fn key_repr(key: &Value) -> String {
    match key {
        Value::String(s) => s.to_string(),
        other => crate::json::to_string(other),
    }
}
