//! Snapshot model of the externally rendered accessibility tree.
//!
//! A [`TreeSnapshot`] is a read-only view of the settings surface at one
//! instant, delivered by the driver's tree-change subscription. Snapshots are
//! consumed inside the event that delivered them and never retained: the
//! external tree may mutate at any time, so a [`NodeId`] is only meaningful
//! within the snapshot that produced it.

use serde::{Deserialize, Serialize};

/// Identifies a node within one [`TreeSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

/// Attributes reported for a single node of the external UI tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Widget role as reported by the environment (e.g. `button`, `text`).
    pub role: String,
    /// Visible text, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
    /// Accessible description, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// Structural identifier assigned by the surface (e.g. `android:id/button1`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl NodeAttributes {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: None,
            description: None,
            resource_id: None,
            clickable: false,
            enabled: true,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn clickable(mut self, clickable: bool) -> Self {
        self.clickable = clickable;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    attributes: NodeAttributes,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A nested, serializable rendition of a tree, used by drivers that adapt
/// serialized accessibility dumps and by test fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableNode {
    #[serde(flatten)]
    pub attributes: NodeAttributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializableNode>,
}

/// An immutable view of the external UI tree at one instant.
///
/// Nodes live in an arena with parent/child links. Nodes carrying visible
/// text are additionally recorded in a flat text index, which serves as the
/// locator's fast path; nodes that only expose an accessible description are
/// deliberately absent from the index and are reached by the exhaustive
/// depth-first fallback.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    nodes: Vec<NodeData>,
    text_index: Vec<(NodeId, String)>,
}

impl TreeSnapshot {
    /// Build a snapshot from a nested serializable tree.
    pub fn from_node(root: &SerializableNode) -> Self {
        let mut builder = SnapshotBuilder::new();
        fn insert(builder: &mut SnapshotBuilder, parent: Option<NodeId>, node: &SerializableNode) {
            let id = builder.insert(parent, node.attributes.clone());
            for child in &node.children {
                insert(builder, Some(id), child);
            }
        }
        insert(&mut builder, None, root);
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn attributes(&self, id: NodeId) -> &NodeAttributes {
        &self.nodes[id.0].attributes
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Fast path: nodes whose visible text contains `needle`
    /// (case-insensitive), in index order.
    pub fn indexed_text_matches<'a>(&'a self, needle: &str) -> impl Iterator<Item = NodeId> + 'a {
        let needle = needle.to_lowercase();
        self.text_index
            .iter()
            .filter(move |(_, text)| text.contains(&needle))
            .map(|(id, _)| *id)
    }

    /// Nodes carrying the given structural identifier, in document order.
    pub fn nodes_by_resource_id<'a>(&'a self, resource_id: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.preorder()
            .filter(move |id| self.attributes(*id).resource_id.as_deref() == Some(resource_id))
    }

    /// Preorder depth-first traversal over the whole snapshot.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            snapshot: self,
            stack: self.root().into_iter().collect(),
        }
    }
}

pub struct Preorder<'a> {
    snapshot: &'a TreeSnapshot,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        for child in self.snapshot.children(id).iter().rev() {
            self.stack.push(*child);
        }
        Some(id)
    }
}

/// Incrementally assembles a [`TreeSnapshot`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    nodes: Vec<NodeData>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the root node. Must be the first insertion.
    pub fn root(&mut self, attributes: NodeAttributes) -> NodeId {
        self.insert(None, attributes)
    }

    /// Insert a child under `parent`.
    pub fn child(&mut self, parent: NodeId, attributes: NodeAttributes) -> NodeId {
        self.insert(Some(parent), attributes)
    }

    fn insert(&mut self, parent: Option<NodeId>, attributes: NodeAttributes) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            attributes,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn build(self) -> TreeSnapshot {
        let text_index = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                node.attributes
                    .text
                    .as_deref()
                    .filter(|text| !text.trim().is_empty())
                    .map(|text| (NodeId(i), text.to_lowercase()))
            })
            .collect();
        TreeSnapshot {
            nodes: self.nodes,
            text_index,
        }
    }
}
