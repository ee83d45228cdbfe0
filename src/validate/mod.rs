//! Validation execution.
//!
//! A [`Run`] is the per-call state threaded through one top-level validate
//! invocation: effective strictness, the caller's opaque context, the
//! recursion guard and the interner handle. Runs are created per call and
//! never shared, so concurrent validations against one graph need no
//! locking beyond the interner's own.

use alloc::sync::Arc;
use core::any::Any;

use crate::{
    error::{ErrorKind, ErrorList, FatalError, ValidationError},
    intern::{CacheMode, StringCache},
    recursion::{ActiveSet, GuardError},
    schema::{NodeId, SchemaGraph, SchemaNode},
    value::Value,
};

mod kinds;
mod pipeline;
mod union;

pub use pipeline::Continuation;

/// How one validation attempt failed.
pub(crate) enum Failure {
    /// Ordinary validation errors, aggregated by the collector.
    Invalid(ErrorList),
    /// A hook programming error; propagates uncaught.
    Fatal(FatalError),
}

/// Per-call validation state.
pub(crate) struct Run<'g> {
    pub(crate) graph: &'g SchemaGraph,
    /// The per-call strict flag.
    pub(crate) strict: bool,
    /// Set during the first pass of a smart union.
    pub(crate) forced_strict: bool,
    pub(crate) context: Option<Arc<dyn Any + Send + Sync>>,
    pub(crate) guard: ActiveSet<(NodeId, usize)>,
    pub(crate) cache: Arc<StringCache>,
    pub(crate) cache_mode: CacheMode,
}

impl<'g> Run<'g> {
    pub(crate) fn new(
        graph: &'g SchemaGraph,
        strict: bool,
        recursion_limit: Option<usize>,
        context: Option<Arc<dyn Any + Send + Sync>>,
        cache: Arc<StringCache>,
        cache_mode: CacheMode,
    ) -> Self {
        Self {
            graph,
            strict,
            forced_strict: false,
            context,
            guard: ActiveSet::new(recursion_limit),
            cache,
            cache_mode,
        }
    }

    /// The strictness in force at this node.
    pub(crate) fn effective_strict(&self, node: &SchemaNode) -> bool {
        self.forced_strict || self.strict || node.is_strict()
    }

    /// A shared instance of a validator-produced string, interned when the
    /// cache mode covers values.
    pub(crate) fn shared_string(&self, s: &str) -> Arc<str> {
        match self.cache_mode {
            CacheMode::All => self.cache.intern(s),
            CacheMode::Keys | CacheMode::None => Arc::from(s),
        }
    }

    /// Validates `value` against the node `id`, running its hook pipeline
    /// around the core logic.
    ///
    /// The recursion guard is entered by the core logic, inside the hook
    /// chain, so a wrap hook can observe a cycle error coming out of its
    /// own continuation.
    pub(crate) fn validate_node(&mut self, id: NodeId, value: Value) -> Result<Value, Failure> {
        let node = self.graph.node(id);
        pipeline::run_chain(self, id, node, node.hooks(), value)
    }

    /// Enters the recursion guard for one core application, translating
    /// guard refusals into their dedicated error entries.
    pub(crate) fn enter_frame(
        &mut self,
        id: NodeId,
        value: &Value,
    ) -> Result<crate::recursion::Frame, Failure> {
        let key = value.identity().map(|identity| (id, identity));
        match self.guard.enter(key) {
            Ok(frame) => Ok(frame),
            Err(GuardError::Cycle) => Err(Failure::Invalid(ErrorList::one(
                ValidationError::new(ErrorKind::CycleDetected, value.clone()),
            ))),
            Err(GuardError::TooDeep(limit)) => Err(Failure::Invalid(ErrorList::one(
                ValidationError::new(ErrorKind::RecursionTooDeep { limit }, value.clone()),
            ))),
        }
    }
}
