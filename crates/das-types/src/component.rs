//! Arena-backed assembly graph for component features.
//!
//! A segment assembled from smaller pieces exposes itself as the root
//! component. Each node can point at sub-components (the pieces it is built
//! from) and super-components (assemblies it belongs to). Nodes are stored in
//! a flat vector and referenced by [`ComponentId`], so lookups walk the graph
//! with an explicit stack and tolerate cycles.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::ModelError;
use crate::feature::Feature;

/// Index of a node inside a [`ComponentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ComponentId(usize);

impl ComponentId {
    /// Position of the node in its tree.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ComponentNode {
    feature: Feature,
    sub_components: Vec<ComponentId>,
    super_components: Vec<ComponentId>,
}

impl ComponentNode {
    const fn new(feature: Feature) -> Self {
        Self {
            feature,
            sub_components: Vec::new(),
            super_components: Vec::new(),
        }
    }
}

/// Result of a successful [`ComponentTree::find`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentMatch<'a> {
    /// Node that holds the feature.
    pub id: ComponentId,
    /// Number of sub-component edges walked from the root.
    pub depth: usize,
    /// The matching feature.
    pub feature: &'a Feature,
}

/// Assembly graph rooted at a segment's self component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentTree {
    nodes: Vec<ComponentNode>,
}

impl ComponentTree {
    /// Creates a tree whose root is the segment's own component feature.
    #[must_use]
    pub fn new(root: Feature) -> Self {
        Self {
            nodes: vec![ComponentNode::new(root)],
        }
    }

    /// Identifier of the root component.
    #[must_use]
    pub const fn root(&self) -> ComponentId {
        ComponentId(0)
    }

    /// Number of nodes in the tree, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root is present from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds `feature` as a piece of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownComponent`] if `parent` is not in the tree.
    pub fn add_sub_component(
        &mut self,
        parent: ComponentId,
        feature: Feature,
    ) -> Result<ComponentId, ModelError> {
        self.ensure_present(parent)?;
        let child = self.push(feature);
        self.link(parent, child)?;
        Ok(child)
    }

    /// Adds `feature` as an assembly that `child` belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownComponent`] if `child` is not in the tree.
    pub fn add_super_component(
        &mut self,
        child: ComponentId,
        feature: Feature,
    ) -> Result<ComponentId, ModelError> {
        self.ensure_present(child)?;
        let parent = self.push(feature);
        self.link(parent, child)?;
        Ok(parent)
    }

    /// Records that `child` is a piece of `parent`, both already present.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownComponent`] if either node is missing.
    pub fn link(&mut self, parent: ComponentId, child: ComponentId) -> Result<(), ModelError> {
        self.ensure_present(parent)?;
        self.ensure_present(child)?;
        self.node_mut(parent)?.sub_components.push(child);
        self.node_mut(child)?.super_components.push(parent);
        Ok(())
    }

    /// Feature stored at `id`.
    #[must_use]
    pub fn feature(&self, id: ComponentId) -> Option<&Feature> {
        self.nodes.get(id.0).map(|node| &node.feature)
    }

    /// Direct pieces of `id`.
    #[must_use]
    pub fn sub_components(&self, id: ComponentId) -> &[ComponentId] {
        self.nodes
            .get(id.0)
            .map_or(&[], |node| node.sub_components.as_slice())
    }

    /// Direct assemblies `id` belongs to.
    #[must_use]
    pub fn super_components(&self, id: ComponentId) -> &[ComponentId] {
        self.nodes
            .get(id.0)
            .map_or(&[], |node| node.super_components.as_slice())
    }

    /// Features reported alongside the segment: the root followed by its
    /// direct sub-components and then its direct super-components.
    #[must_use]
    pub fn reportable_features(&self) -> Vec<&Feature> {
        let root = self.root();
        std::iter::once(root)
            .chain(self.sub_components(root).iter().copied())
            .chain(self.super_components(root).iter().copied())
            .filter_map(|id| self.feature(id))
            .collect()
    }

    /// Searches the sub-component graph from the root for `feature_id`.
    ///
    /// The walk is depth-first, iterative, and visits each node once.
    #[must_use]
    pub fn find(&self, feature_id: &str) -> Option<ComponentMatch<'_>> {
        let mut visited = HashSet::new();
        let mut stack = vec![(self.root(), 0_usize)];
        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            if node.feature.feature_id == feature_id {
                return Some(ComponentMatch {
                    id,
                    depth,
                    feature: &node.feature,
                });
            }
            stack.extend(
                node.sub_components
                    .iter()
                    .rev()
                    .map(|child| (*child, depth + 1)),
            );
        }
        None
    }

    fn push(&mut self, feature: Feature) -> ComponentId {
        self.nodes.push(ComponentNode::new(feature));
        ComponentId(self.nodes.len() - 1)
    }

    fn ensure_present(&self, id: ComponentId) -> Result<(), ModelError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(ModelError::UnknownComponent(id.0))
        }
    }

    fn node_mut(&mut self, id: ComponentId) -> Result<&mut ComponentNode, ModelError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(ModelError::UnknownComponent(id.0))
    }
}
