//! Hook chain execution.
//!
//! A node's hook list executes by folding from the end of the declared
//! sequence inward: the last-declared hook is the outermost. A `Before`
//! hook transforms the raw input and recurses inward; an `After` hook runs
//! on the inner chain's success value on the way back out (so the
//! innermost `After` fires first); a `Wrap` hook receives the remaining
//! inner chain as a [`Continuation`] it may call any number of times,
//! catch failures from, or skip; a `Plain` hook replaces the remaining
//! inner chain and the core logic outright.
//!
//! Fatal hook errors bypass this entire machinery: a wrap hook cannot
//! observe or catch one, and nothing is aggregated around it.

use crate::{
    error::{ErrorList, FatalError, HookError, ValidationError},
    schema::{Hook, HookArgs, HookFn, NodeId, SchemaNode},
    value::Value,
};

use super::{kinds, Failure, Run};

/// The rest of a wrap hook's chain, callable zero or more times.
///
/// Each call re-runs the inner hooks and the node's core logic on the
/// given input. Failures are returned as an [`ErrorList`] the hook may
/// catch, retry with a modified input, or swallow by returning its own
/// result.
pub struct Continuation<'r, 's> {
    inner: &'r mut (dyn FnMut(Value) -> Result<Value, ErrorList> + 's),
}

impl Continuation<'_, '_> {
    pub(crate) fn new<'r, 's>(
        inner: &'r mut (dyn FnMut(Value) -> Result<Value, ErrorList> + 's),
    ) -> Continuation<'r, 's> {
        Continuation { inner }
    }

    /// Runs the inner chain on `input`.
    pub fn call(&mut self, input: Value) -> Result<Value, ErrorList> {
        (self.inner)(input)
    }
}

pub(crate) fn run_chain(
    run: &mut Run<'_>,
    id: NodeId,
    node: &SchemaNode,
    hooks: &[Hook],
    value: Value,
) -> Result<Value, Failure> {
    let Some((hook, inner)) = hooks.split_last() else {
        return kinds::apply_kind(run, id, node, value);
    };
    let strict = run.effective_strict(node);

    match hook {
        Hook::Before(f) => {
            let value = invoke_hook(run, strict, f, value)?;
            run_chain(run, id, node, inner, value)
        }
        Hook::After(f) => {
            let value = run_chain(run, id, node, inner, value)?;
            invoke_hook(run, strict, f, value)
        }
        Hook::Plain(f) => invoke_hook(run, strict, f, value),
        Hook::Wrap(f) => {
            let context = run.context.clone();
            let mut fatal: Option<FatalError> = None;
            let outcome = {
                let fatal_slot = &mut fatal;
                let mut inner_call = |input: Value| -> Result<Value, ErrorList> {
                    match run_chain(run, id, node, inner, input) {
                        Ok(v) => Ok(v),
                        Err(Failure::Invalid(list)) => Err(list),
                        Err(Failure::Fatal(e)) => {
                            // Smuggled past the hook; checked below.
                            *fatal_slot = Some(e);
                            Err(ErrorList::new())
                        }
                    }
                };
                let args = HookArgs {
                    context: context.as_deref(),
                    strict,
                };
                f(value, Continuation::new(&mut inner_call), &args)
            };
            if let Some(fatal) = fatal {
                return Err(Failure::Fatal(fatal));
            }
            outcome.map_err(Failure::Invalid)
        }
    }
}

fn invoke_hook(
    run: &Run<'_>,
    strict: bool,
    f: &HookFn,
    value: Value,
) -> Result<Value, Failure> {
    let snapshot = value.clone();
    let args = HookArgs {
        context: run.context.as_deref(),
        strict,
    };
    match f(value, &args) {
        Ok(v) => Ok(v),
        Err(HookError::Raised(message)) => Err(Failure::Invalid(ErrorList::one(
            ValidationError::user_raised(message, snapshot),
        ))),
        Err(HookError::Fatal(message)) => Err(Failure::Fatal(FatalError::new(message))),
    }
}
