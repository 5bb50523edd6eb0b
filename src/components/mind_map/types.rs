use serde::{Deserialize, Serialize};

/// A point in model space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Handle of a node inside its owning [`MindMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub(crate) usize);

impl NodeIdx {
	pub fn index(self) -> usize {
		self.0
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MindNode {
	pub id: String,
	pub label: String,
	pub color: Option<String>,
	pub link: Option<String>,
	pub position: Option<Position>,
	pub children: Vec<NodeIdx>,
	pub parent: Option<NodeIdx>,
}

impl MindNode {
	pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			color: None,
			link: None,
			position: None,
			children: Vec::new(),
			parent: None,
		}
	}
}

/// Arena holding every node of a mind-map forest.
///
/// Nodes reference each other through [`NodeIdx`]; all mutation goes through
/// `&mut MindMap`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MindMap {
	pub(crate) nodes: Vec<MindNode>,
	pub(crate) roots: Vec<NodeIdx>,
}

impl MindMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn roots(&self) -> &[NodeIdx] {
		&self.roots
	}

	pub fn node(&self, idx: NodeIdx) -> &MindNode {
		&self.nodes[idx.0]
	}

	pub fn node_mut(&mut self, idx: NodeIdx) -> &mut MindNode {
		&mut self.nodes[idx.0]
	}

	/// Adds a root node and returns its handle.
	pub fn push_root(&mut self, node: MindNode) -> NodeIdx {
		let idx = self.alloc(node, None);
		self.roots.push(idx);
		idx
	}

	/// Appends `node` as the last child of `parent`.
	pub fn push_child(&mut self, parent: NodeIdx, node: MindNode) -> NodeIdx {
		let idx = self.alloc(node, Some(parent));
		self.nodes[parent.0].children.push(idx);
		idx
	}

	fn alloc(&mut self, mut node: MindNode, parent: Option<NodeIdx>) -> NodeIdx {
		let idx = NodeIdx(self.nodes.len());
		node.children.clear();
		node.parent = parent;
		self.nodes.push(node);
		idx
	}

	/// Depth of a node, roots being at depth 0.
	pub fn depth(&self, idx: NodeIdx) -> usize {
		let mut depth = 0;
		let mut cur = self.nodes[idx.0].parent;
		while let Some(p) = cur {
			depth += 1;
			cur = self.nodes[p.0].parent;
		}
		depth
	}

	/// Iterates over every node with its handle, in allocation order.
	pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NodeIdx, &MindNode)> {
		self.nodes.iter().enumerate().map(|(i, n)| (NodeIdx(i), n))
	}
}

/// Node identifier as it appears on the wire: the upstream API sends
/// either strings or integers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
	Text(String),
	Number(i64),
}

impl RawId {
	pub fn into_string(self) -> String {
		match self {
			RawId::Text(s) => s,
			RawId::Number(n) => n.to_string(),
		}
	}
}

/// Nested node shape exchanged with the API and with storage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<RawId>,
	#[serde(default, alias = "text", alias = "name")]
	pub label: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<Position>,
	#[serde(default, deserialize_with = "nullable_children")]
	pub children: Vec<RawNode>,
}

fn nullable_children<'de, D>(deserializer: D) -> Result<Vec<RawNode>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Ok(Option::<Vec<RawNode>>::deserialize(deserializer)?.unwrap_or_default())
}
