//! User-attachable transformation hooks.
//!
//! Hooks are stored as an ordered sequence on a schema node and executed
//! by folding over that sequence; the last-declared hook is the outermost.
//! See the pipeline module for the execution order contract.

use alloc::sync::Arc;
use core::{any::Any, fmt};

use crate::{
    error::{ErrorList, HookError},
    ser::{SerContinuation, SerError},
    validate::Continuation,
    value::Value,
};

/// What a hook sees besides the value: the caller's opaque context and the
/// effective strictness at this node. The engine passes the context
/// through untouched; mutation is the caller's business via interior
/// mutability in their own type.
#[derive(Clone, Copy)]
pub struct HookArgs<'a> {
    pub context: Option<&'a (dyn Any + Send + Sync)>,
    pub strict: bool,
}

impl fmt::Debug for HookArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookArgs")
            .field("context", &self.context.is_some())
            .field("strict", &self.strict)
            .finish()
    }
}

/// A before/after/plain validation hook.
pub type HookFn = Arc<dyn Fn(Value, &HookArgs<'_>) -> Result<Value, HookError> + Send + Sync>;

/// A wrap validation hook: receives the inner chain as a continuation it
/// may call any number of times, catch failures from, or skip entirely.
pub type WrapFn = Arc<
    dyn Fn(Value, Continuation<'_, '_>, &HookArgs<'_>) -> Result<Value, ErrorList> + Send + Sync,
>;

/// One stage in a node's validation hook chain.
#[derive(Clone)]
pub enum Hook {
    /// Transforms the raw input before anything nested inside it runs.
    Before(HookFn),
    /// Transforms the validated value on the way back out.
    After(HookFn),
    /// Controls the nested chain through a continuation.
    Wrap(WrapFn),
    /// Replaces the nested chain and the core logic outright. At most one
    /// per node; enforcing that is the schema compiler's concern.
    Plain(HookFn),
}

impl Hook {
    pub fn before(
        f: impl Fn(Value, &HookArgs<'_>) -> Result<Value, HookError> + Send + Sync + 'static,
    ) -> Self {
        Hook::Before(Arc::new(f))
    }

    pub fn after(
        f: impl Fn(Value, &HookArgs<'_>) -> Result<Value, HookError> + Send + Sync + 'static,
    ) -> Self {
        Hook::After(Arc::new(f))
    }

    pub fn wrap(
        f: impl Fn(Value, Continuation<'_, '_>, &HookArgs<'_>) -> Result<Value, ErrorList>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Hook::Wrap(Arc::new(f))
    }

    pub fn plain(
        f: impl Fn(Value, &HookArgs<'_>) -> Result<Value, HookError> + Send + Sync + 'static,
    ) -> Self {
        Hook::Plain(Arc::new(f))
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Before(_) => f.write_str("Before(..)"),
            Hook::After(_) => f.write_str("After(..)"),
            Hook::Wrap(_) => f.write_str("Wrap(..)"),
            Hook::Plain(_) => f.write_str("Plain(..)"),
        }
    }
}

/// A before/after/plain serializer hook.
pub type SerFn = Arc<dyn Fn(Value, &HookArgs<'_>) -> Result<Value, SerError> + Send + Sync>;

/// A wrap serializer hook. The continuation's error is catchable; in
/// particular a propagated circular-reference failure can be swallowed and
/// replaced with a stub representation.
pub type SerWrapFn = Arc<
    dyn Fn(Value, SerContinuation<'_, '_>, &HookArgs<'_>) -> Result<Value, SerError> + Send + Sync,
>;

/// One stage in a node's serializer hook chain.
#[derive(Clone)]
pub enum SerHook {
    Before(SerFn),
    After(SerFn),
    Wrap(SerWrapFn),
    Plain(SerFn),
}

impl SerHook {
    pub fn before(
        f: impl Fn(Value, &HookArgs<'_>) -> Result<Value, SerError> + Send + Sync + 'static,
    ) -> Self {
        SerHook::Before(Arc::new(f))
    }

    pub fn after(
        f: impl Fn(Value, &HookArgs<'_>) -> Result<Value, SerError> + Send + Sync + 'static,
    ) -> Self {
        SerHook::After(Arc::new(f))
    }

    pub fn wrap(
        f: impl Fn(Value, SerContinuation<'_, '_>, &HookArgs<'_>) -> Result<Value, SerError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        SerHook::Wrap(Arc::new(f))
    }

    pub fn plain(
        f: impl Fn(Value, &HookArgs<'_>) -> Result<Value, SerError> + Send + Sync + 'static,
    ) -> Self {
        SerHook::Plain(Arc::new(f))
    }
}

impl fmt::Debug for SerHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerHook::Before(_) => f.write_str("Before(..)"),
            SerHook::After(_) => f.write_str("After(..)"),
            SerHook::Wrap(_) => f.write_str("Wrap(..)"),
            SerHook::Plain(_) => f.write_str("Plain(..)"),
        }
    }
}
