//! Lookup, traversal and geometry helpers over a [`MindMap`].

use std::collections::HashSet;

use uuid::Uuid;

use super::types::{MindMap, MindNode, NodeIdx, Position};

pub const NODE_HEIGHT: f64 = 36.0;
pub const NODE_MIN_WIDTH: f64 = 64.0;
pub const NODE_MAX_WIDTH: f64 = 240.0;
pub const NODE_PADDING_X: f64 = 14.0;
pub const LABEL_CHAR_WIDTH: f64 = 7.5;

/// Axis-aligned rectangle in model space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min: Position,
	pub max: Position,
}

impl Bounds {
	pub fn from_center(center: Position, width: f64, height: f64) -> Self {
		Self {
			min: Position::new(center.x - width / 2.0, center.y - height / 2.0),
			max: Position::new(center.x + width / 2.0, center.y + height / 2.0),
		}
	}

	pub fn width(&self) -> f64 {
		self.max.x - self.min.x
	}

	pub fn height(&self) -> f64 {
		self.max.y - self.min.y
	}

	pub fn center(&self) -> Position {
		Position::new(
			(self.min.x + self.max.x) / 2.0,
			(self.min.y + self.max.y) / 2.0,
		)
	}

	pub fn contains(&self, p: Position) -> bool {
		p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
	}

	pub fn union(self, other: Bounds) -> Bounds {
		Bounds {
			min: Position::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
			max: Position::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
		}
	}
}

/// Box size of a node, derived from its label.
pub fn node_size(label: &str) -> (f64, f64) {
	let text = label.chars().count() as f64 * LABEL_CHAR_WIDTH;
	(
		(text + 2.0 * NODE_PADDING_X).clamp(NODE_MIN_WIDTH, NODE_MAX_WIDTH),
		NODE_HEIGHT,
	)
}

/// Model-space box of a positioned node.
pub fn node_bounds(node: &MindNode) -> Option<Bounds> {
	let (w, h) = node_size(&node.label);
	node.position.map(|p| Bounds::from_center(p, w, h))
}

/// Pre-order iterator over one subtree.
pub struct PreOrder<'a> {
	map: &'a MindMap,
	stack: Vec<NodeIdx>,
}

impl Iterator for PreOrder<'_> {
	type Item = NodeIdx;

	fn next(&mut self) -> Option<NodeIdx> {
		let idx = self.stack.pop()?;
		self.stack
			.extend(self.map.node(idx).children.iter().rev().copied());
		Some(idx)
	}
}

pub fn preorder(map: &MindMap, start: NodeIdx) -> PreOrder<'_> {
	PreOrder {
		map,
		stack: vec![start],
	}
}

/// Pre-order walk over every root of the forest, in root order.
pub fn walk_forest(map: &MindMap) -> PreOrder<'_> {
	PreOrder {
		map,
		stack: map.roots().iter().rev().copied().collect(),
	}
}

/// First node with `id`, found by depth-first search of the forest.
pub fn find_node(map: &MindMap, id: &str) -> Option<NodeIdx> {
	walk_forest(map).find(|&idx| map.node(idx).id == id)
}

/// True iff `idx` and all its descendants are positioned.
pub fn has_position(map: &MindMap, idx: NodeIdx) -> bool {
	let node = map.node(idx);
	node.position.is_some() && node.children.iter().all(|&c| has_position(map, c))
}

pub fn has_all_positions(map: &MindMap) -> bool {
	map.roots().iter().all(|&r| has_position(map, r))
}

/// Parent/child pairs; edges are not stored, only derived.
pub fn edges(map: &MindMap) -> impl Iterator<Item = (NodeIdx, NodeIdx)> + '_ {
	map.iter()
		.flat_map(|(idx, node)| node.children.iter().map(move |&c| (idx, c)))
}

/// Topmost node whose box contains the model-space point.
///
/// Nodes are painted in arena order, so the last hit wins.
pub fn node_at(map: &MindMap, point: Position) -> Option<NodeIdx> {
	map.iter()
		.rev()
		.find(|(_, node)| node_bounds(node).is_some_and(|b| b.contains(point)))
		.map(|(idx, _)| idx)
}

/// Bounding box of all positioned nodes.
pub fn bounds(map: &MindMap) -> Option<Bounds> {
	map.iter()
		.filter_map(|(_, node)| node_bounds(node))
		.reduce(Bounds::union)
}

/// Appends a new unpositioned child with a fresh unique id.
pub fn add_child(map: &mut MindMap, parent: NodeIdx, label: impl Into<String>) -> NodeIdx {
	let mut id = Uuid::new_v4().simple().to_string();
	while find_node(map, &id).is_some() {
		id = Uuid::new_v4().simple().to_string();
	}
	map.push_child(parent, MindNode::new(id, label))
}

/// Removes `idx` and its whole subtree, compacting the arena.
///
/// Returns the number of removed nodes. Handles held by the caller are
/// invalidated.
pub fn delete_node(map: &mut MindMap, idx: NodeIdx) -> usize {
	let doomed: HashSet<NodeIdx> = preorder(map, idx).collect();
	let mut rebuilt = MindMap::new();
	for &root in map.roots() {
		copy_subtree(map, root, None, &doomed, &mut rebuilt);
	}
	*map = rebuilt;
	doomed.len()
}

fn copy_subtree(
	src: &MindMap,
	idx: NodeIdx,
	parent: Option<NodeIdx>,
	skip: &HashSet<NodeIdx>,
	dst: &mut MindMap,
) {
	if skip.contains(&idx) {
		return;
	}
	let node = src.node(idx).clone();
	let new_idx = match parent {
		Some(p) => dst.push_child(p, node),
		None => dst.push_root(node),
	};
	for &child in &src.node(idx).children {
		copy_subtree(src, child, Some(new_idx), skip, dst);
	}
}
