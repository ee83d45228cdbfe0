//! Union resolution strategies.
//!
//! Three strategies, selected per node:
//! - **Ordered**: attempt alternatives left to right, first success wins;
//!   total failure returns every alternative's errors, each tagged with
//!   that alternative's identifier.
//! - **Smart**: pass 1 attempts every alternative under forced-strict
//!   mode; pass 2 (only if pass 1 exhausts) retries under the ambient
//!   mode. First success in declaration order wins in both passes. On
//!   total failure the errors of pass 2, the more permissive pass, are
//!   reported.
//! - **Discriminated**: the tag routes to exactly one alternative; an
//!   unmatched tag produces exactly one error citing the valid tag set.
//!
//! Attempts clone the input, so a failed attempt leaves no trace beyond
//! its recorded errors. Fatal hook errors are never collected; they abort
//! the resolution immediately.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use indexmap::IndexMap;

use crate::{
    error::{ErrorKind, ErrorList, ValidationError},
    schema::{Discriminator, NodeId, UnionMode},
    value::Value,
};

use super::{Failure, Run};

pub(crate) fn resolve(
    run: &mut Run<'_>,
    alternatives: &[NodeId],
    mode: UnionMode,
    value: Value,
) -> Result<Value, Failure> {
    match mode {
        UnionMode::Ordered => attempt_all(run, alternatives, value),
        UnionMode::Smart => {
            // Pass 1: every alternative under forced-strict mode. Errors
            // from this pass are discarded; only the lax pass reports.
            let saved = run.forced_strict;
            run.forced_strict = true;
            let mut first_success = None;
            for id in alternatives {
                match run.validate_node(*id, value.clone()) {
                    Ok(v) => {
                        first_success = Some(v);
                        break;
                    }
                    Err(Failure::Invalid(_)) => {}
                    Err(fatal @ Failure::Fatal(_)) => {
                        run.forced_strict = saved;
                        return Err(fatal);
                    }
                }
            }
            run.forced_strict = saved;
            if let Some(v) = first_success {
                return Ok(v);
            }

            // Pass 2: retry under the ambient mode.
            attempt_all(run, alternatives, value)
        }
    }
}

/// One ordered pass: first success wins; on total failure the collected
/// errors carry one tag per alternative.
fn attempt_all(
    run: &mut Run<'_>,
    alternatives: &[NodeId],
    value: Value,
) -> Result<Value, Failure> {
    let mut collected = ErrorList::new();
    for id in alternatives {
        let label = run.graph.node(*id).tag_label();
        match run.validate_node(*id, value.clone()) {
            Ok(v) => return Ok(v),
            Err(Failure::Invalid(list)) => collected.merge(list.in_tag(&label)),
            Err(fatal @ Failure::Fatal(_)) => return Err(fatal),
        }
    }
    Err(Failure::Invalid(collected))
}

pub(crate) fn resolve_tagged(
    run: &mut Run<'_>,
    discriminator: &Discriminator,
    tags: &IndexMap<String, NodeId>,
    value: Value,
) -> Result<Value, Failure> {
    let tag = extract_tag(discriminator, &value);

    let invalid_tag = |tag: Option<String>| {
        Failure::Invalid(ErrorList::one(ValidationError::new(
            ErrorKind::UnionTagInvalid {
                tag,
                expected: tags.keys().cloned().collect::<Vec<_>>(),
            },
            value.clone(),
        )))
    };

    let Some(tag) = tag else {
        return Err(invalid_tag(None));
    };
    let Some(target) = tags.get(&tag) else {
        return Err(invalid_tag(Some(tag)));
    };

    match run.validate_node(*target, value) {
        Ok(v) => Ok(v),
        Err(Failure::Invalid(list)) => Err(Failure::Invalid(list.in_tag(&tag))),
        Err(fatal @ Failure::Fatal(_)) => Err(fatal),
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
