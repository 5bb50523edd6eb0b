//! Conversion between the nested wire shape and the [`MindMap`] arena.

use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::types::{MindMap, MindNode, NodeIdx, RawNode};
use crate::error::{Error, Result};

/// Accepted top-level document shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
	Wrapped { root: RawNode },
	Forest(Vec<RawNode>),
	Single(RawNode),
}

/// Parses a JSON document (a node, an array of nodes, or `{ "root": node }`).
pub fn parse_document(json: &str) -> Result<MindMap> {
	let roots = match from_json(json)? {
		RawDocument::Wrapped { root } | RawDocument::Single(root) => vec![root],
		RawDocument::Forest(roots) => roots,
	};
	Ok(from_raw(roots))
}

/// Like [`parse_document`], but a document left without any node is an
/// error rather than an empty map.
pub fn parse_import(json: &str) -> Result<MindMap> {
	let map = parse_document(json)?;
	if map.is_empty() {
		return Err(Error::EmptyDocument);
	}
	Ok(map)
}

/// Deserializes JSON with serde_json's nesting limit lifted; trees built
/// with "Add child" have no depth bound.
pub(crate) fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
	let mut de = serde_json::Deserializer::from_str(json);
	de.disable_recursion_limit();
	let value = T::deserialize(&mut de)?;
	de.end()?;
	Ok(value)
}

/// Builds the arena from raw nodes.
///
/// A node without a usable `id` is dropped together with its subtree.
/// Absent `children` and `position` are defaulted.
pub fn from_raw(roots: Vec<RawNode>) -> MindMap {
	let mut map = MindMap::new();
	let mut dropped = 0usize;
	for raw in roots {
		insert(&mut map, None, raw, &mut dropped);
	}
	if dropped > 0 {
		warn!("dropped {} node(s) without an id", dropped);
	}
	debug!("ingested {} node(s), {} root(s)", map.len(), map.roots().len());
	map
}

fn insert(map: &mut MindMap, parent: Option<NodeIdx>, raw: RawNode, dropped: &mut usize) {
	let RawNode {
		id,
		label,
		color,
		link,
		position,
		children,
	} = raw;

	let Some(id) = id.map(|id| id.into_string()).filter(|id| !id.trim().is_empty()) else {
		*dropped += 1;
		return;
	};

	let node = MindNode {
		color: color.filter(|c| !c.is_empty()),
		link: link.filter(|l| !l.is_empty()),
		position,
		..MindNode::new(id, label)
	};
	let idx = match parent {
		Some(p) => map.push_child(p, node),
		None => map.push_root(node),
	};
	for child in children {
		insert(map, Some(idx), child, dropped);
	}
}

/// Converts the arena back into nested raw nodes, positions included.
pub fn to_raw(map: &MindMap) -> Vec<RawNode> {
	map.roots().iter().map(|&r| node_to_raw(map, r)).collect()
}

fn node_to_raw(map: &MindMap, idx: NodeIdx) -> RawNode {
	let node = map.node(idx);
	RawNode {
		id: Some(super::types::RawId::Text(node.id.clone())),
		label: node.label.clone(),
		color: node.color.clone(),
		link: node.link.clone(),
		position: node.position,
		children: node.children.iter().map(|&c| node_to_raw(map, c)).collect(),
	}
}

/// Serializes the arena to the JSON form accepted by [`parse_document`].
pub fn to_json(map: &MindMap) -> Result<String> {
	Ok(serde_json::to_string(&to_raw(map))?)
}
