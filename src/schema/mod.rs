//! Schema graph: the compiled form this engine executes.
//!
//! The graph is an arena of [`SchemaNode`]s indexed by [`NodeId`]. Nodes
//! are immutable once [`GraphBuilder::finish`] has run, and the graph is
//! safe for unlimited concurrent read-only traversal. Cycles are expressed
//! through `Ref` nodes holding ids, never owning references, so dropping
//! the arena frees everything.
//!
//! Building the graph is the schema *compiler's* job; [`GraphBuilder`] is
//! only the handle such a compiler (or a test) uses to hand the engine a
//! finished graph, and it performs no declaration-level checking.

use alloc::vec::Vec;

mod hooks;
mod node;

pub use hooks::{Hook, HookArgs, HookFn, SerFn, SerHook, SerWrapFn, WrapFn};
pub use node::{
    Discriminator, ExtraPolicy, FieldNode, LenBounds, NodeId, NodeKind, NumBounds, ScalarNode,
    ScalarType, SchemaNode, StructNode, TagFn, UnionMode,
};

/// An immutable arena of schema nodes.
#[derive(Debug)]
pub struct SchemaGraph {
    nodes: Vec<SchemaNode>,
}

impl SchemaGraph {
    /// Looks up a node.
    ///
    /// `NodeId`s are only ever minted by this graph's own builder, so the
    /// index is always in range.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Errors from assembling a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A node id was reserved for a cycle but never defined.
    #[error("schema node {0} was reserved but never defined")]
    UndefinedNode(NodeId),
}

/// Accumulates nodes and hands out ids, including forward ids for cycles.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Option<SchemaNode>>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finished node.
    pub fn push(&mut self, node: SchemaNode) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Some(node));
        id
    }

    /// Reserves an id to be defined later, for cyclic references.
    pub fn reserve(&mut self) -> NodeId {
        let id = self.next_id();
        self.nodes.push(None);
        id
    }

    /// Defines a previously reserved id.
    pub fn define(&mut self, id: NodeId, node: SchemaNode) {
        self.nodes[id.index()] = Some(node);
    }

    /// Seals the graph. Fails if a reserved id was never defined.
    pub fn finish(self) -> Result<SchemaGraph, GraphError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (index, slot) in self.nodes.into_iter().enumerate() {
            match slot {
                Some(node) => nodes.push(node),
                None => {
                    #[allow(clippy::cast_possible_truncation)]
                    return Err(GraphError::UndefinedNode(NodeId(index as u32)));
                }
            }
        }
        Ok(SchemaGraph { nodes })
    }

    fn next_id(&self) -> NodeId {
        #[allow(clippy::cast_possible_truncation)]
        NodeId(self.nodes.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_lookup() {
        let mut builder = GraphBuilder::new();
        let int = builder.push(SchemaNode::integer());
        let seq = builder.push(SchemaNode::sequence(int));
        let graph = builder.finish().unwrap();
        assert_eq!(graph.len(), 2);
        assert!(matches!(graph.node(seq).kind(), NodeKind::Sequence { .. }));
    }

    #[test]
    fn reserve_allows_cycles() {
        let mut builder = GraphBuilder::new();
        let model = builder.reserve();
        let back = builder.push(SchemaNode::reference(model));
        builder.define(
            model,
            SchemaNode::struct_of([("next".into(), FieldNode::optional(back))]),
        );
        let graph = builder.finish().unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn undefined_reservation_fails() {
        let mut builder = GraphBuilder::new();
        let id = builder.reserve();
        assert_eq!(
            builder.finish().unwrap_err(),
            GraphError::UndefinedNode(id)
        );
    }
}
