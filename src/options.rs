//! Per-call options and entry points.

use alloc::{string::String, sync::Arc, vec::Vec};
use core::any::Any;

use crate::{
    error::ValidationFailure,
    intern::{CacheConfig, StringCache},
    json,
    schema::{NodeId, SchemaGraph},
    ser::{self, SerError, SerMode, SerRun},
    validate::{Failure, Run},
    value::Value,
};

/// Default recursion depth ceiling.
pub const DEFAULT_RECURSION_LIMIT: usize = 128;

/// Options for validation and serialization calls.
#[derive(Clone)]
#[non_exhaustive]
pub struct Options {
    /// Reject type coercions; only exact kind matches validate. A node
    /// declared strict is strict regardless of this flag.
    pub strict: bool,
    /// Tolerate truncated JSON input, returning the deepest fully-formed
    /// prefix (JSON entry points only).
    pub allow_partial: bool,
    /// Depth ceiling checked during validation and serialization.
    /// If set to `None`, unbounded recursion is allowed and deep acyclic
    /// inputs can crash the process; cyclic inputs are still caught by the
    /// identity guard. Defaults to `Some(128)`.
    pub recursion_limit: Option<usize>,
    /// String cache configuration for this call.
    pub cache: CacheConfig,
    context: Option<Arc<dyn Any + Send + Sync>>,
    cache_instance: Option<Arc<StringCache>>,
}

impl core::fmt::Debug for Options {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Options")
            .field("strict", &self.strict)
            .field("allow_partial", &self.allow_partial)
            .field("recursion_limit", &self.recursion_limit)
            .field("cache", &self.cache)
            .field("context", &self.context.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strict: false,
            allow_partial: false,
            recursion_limit: Some(DEFAULT_RECURSION_LIMIT),
            cache: CacheConfig::default(),
            context: None,
            cache_instance: None,
        }
    }
}

impl Options {
    /// Reject coercions for the whole call.
    #[must_use]
    pub fn with_strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Tolerate truncated JSON input.
    #[must_use]
    pub fn with_partial(mut self) -> Self {
        self.allow_partial = true;
        self
    }

    /// Set a maximum recursion depth.
    #[must_use]
    pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = Some(recursion_limit);
        self
    }

    /// Disable the recursion depth ceiling.
    #[must_use]
    pub fn without_recursion_limit(mut self) -> Self {
        self.recursion_limit = None;
        self
    }

    /// Use a private string cache with this configuration instead of the
    /// process-wide default instance.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache_instance = Some(Arc::new(StringCache::new(&cache)));
        self.cache = cache;
        self
    }

    /// Share an existing string cache instance.
    #[must_use]
    pub fn with_string_cache(mut self, cache: Arc<StringCache>) -> Self {
        self.cache_instance = Some(cache);
        self
    }

    /// Attach an opaque context object handed to every hook. The engine
    /// passes it through without inspecting it.
    #[must_use]
    pub fn with_context(mut self, context: impl Any + Send + Sync) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    fn cache_handle(&self) -> Arc<StringCache> {
        match &self.cache_instance {
            Some(cache) => Arc::clone(cache),
            None => {
                // Shared default-configuration instance.
                static DEFAULT: once_cell::sync::Lazy<Arc<StringCache>> =
                    once_cell::sync::Lazy::new(|| {
                        Arc::new(StringCache::new(&CacheConfig::default()))
                    });
                Arc::clone(&DEFAULT)
            }
        }
    }

    /// Validate a native value against `root`.
    pub fn validate(
        &self,
        graph: &SchemaGraph,
        root: NodeId,
        input: Value,
    ) -> Result<Value, ValidationFailure> {
        let mut run = Run::new(
            graph,
            self.strict,
            self.recursion_limit,
            self.context.clone(),
            self.cache_handle(),
            self.cache.mode,
        );
        match run.validate_node(root, input) {
            Ok(value) => Ok(value),
            Err(Failure::Invalid(errors)) => Err(ValidationFailure::Report(errors.into_report())),
            Err(Failure::Fatal(fatal)) => Err(ValidationFailure::Fatal(fatal)),
        }
    }

    /// Parse JSON bytes and validate the result against `root`.
    pub fn validate_json(
        &self,
        graph: &SchemaGraph,
        root: NodeId,
        bytes: &[u8],
    ) -> Result<Value, ValidationFailure> {
        let cache = self.cache_handle();
        let input = json::parse_with(bytes, self.allow_partial, &cache, self.cache.mode)?;
        self.validate(graph, root, input)
    }

    /// Serialize a value against `root` in the given mode.
    pub fn serialize(
        &self,
        graph: &SchemaGraph,
        root: NodeId,
        value: &Value,
        mode: SerMode,
    ) -> Result<Value, SerError> {
        let mut run = SerRun::new(graph, mode, self.context.clone(), self.recursion_limit);
        run.serialize_node(root, value.clone())
    }

    /// Serialize a value against `root` and render it as JSON text.
    pub fn to_json(
        &self,
        graph: &SchemaGraph,
        root: NodeId,
        value: &Value,
    ) -> Result<String, SerError> {
        let mut run = SerRun::new(
            graph,
            SerMode::Json,
            self.context.clone(),
            self.recursion_limit,
        );
        ser::to_json_string(&mut run, root, value.clone())
    }

    /// Serialize a value against `root` and render it as JSON bytes.
    pub fn to_json_bytes(
        &self,
        graph: &SchemaGraph,
        root: NodeId,
        value: &Value,
    ) -> Result<Vec<u8>, SerError> {
        self.to_json(graph, root, value).map(String::into_bytes)
    }
}
