//! Tree layout: recursive pre-order placement with depth-shrinking spacing.
//!
//! The root of each tree sits on a fixed anchor. The children of a node are
//! spread symmetrically under the parent's x. Spacing on both axes shrinks
//! with `log2(16 * depth + 1)` so deep trees do not run away across the
//! canvas. A small jitter, drawn from an injected [`JitterSource`], keeps
//! edges of dense graphs from stacking on top of each other.

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::types::{MindMap, NodeIdx, Position};

/// Source of the random offsets applied to child positions.
pub trait JitterSource {
	/// Returns an offset in `[-amplitude, amplitude]`.
	fn jitter(&mut self, amplitude: f64) -> f64;
}

/// Exact placement, no jitter.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
	fn jitter(&mut self, _amplitude: f64) -> f64 {
		0.0
	}
}

/// Seedable uniform jitter.
#[derive(Clone, Debug)]
pub struct SeededJitter {
	rng: SmallRng,
}

impl SeededJitter {
	pub fn new(seed: u64) -> Self {
		Self {
			rng: SmallRng::seed_from_u64(seed),
		}
	}
}

impl JitterSource for SeededJitter {
	fn jitter(&mut self, amplitude: f64) -> f64 {
		if amplitude <= 0.0 {
			return 0.0;
		}
		self.rng.gen_range(-amplitude..=amplitude)
	}
}

/// Spacing along one axis: `max(min, base - falloff * log2(16 * depth + 1))`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spacing {
	pub base: f64,
	pub falloff: f64,
	pub min: f64,
}

impl Spacing {
	pub fn at_depth(&self, depth: usize) -> f64 {
		let shrink = self.falloff * (16.0 * depth as f64 + 1.0).log2();
		(self.base - shrink).max(self.min)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Where each tree's root lands (x is usually the canvas centre).
	pub anchor: Position,
	pub horizontal: Spacing,
	pub vertical: Spacing,
	/// Maximum absolute jitter on x.
	pub jitter_x: f64,
	/// Maximum absolute jitter on y.
	pub jitter_y: f64,
	/// Distance between the roots of a forest.
	pub root_spacing: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			anchor: Position::new(400.0, 100.0),
			horizontal: Spacing {
				base: 320.0,
				falloff: 40.0,
				min: 90.0,
			},
			vertical: Spacing {
				base: 150.0,
				falloff: 12.0,
				min: 70.0,
			},
			jitter_x: 12.0,
			jitter_y: 8.0,
			root_spacing: 640.0,
		}
	}
}

impl LayoutConfig {
	/// Default config anchored at the horizontal centre of a canvas.
	pub fn centered(canvas_width: f64) -> Self {
		Self {
			anchor: Position::new(canvas_width / 2.0, 100.0),
			..Self::default()
		}
	}
}

/// Lays out every tree of the forest, overwriting all positions.
pub fn layout_forest(map: &mut MindMap, config: &LayoutConfig, jitter: &mut dyn JitterSource) {
	let roots = map.roots().to_vec();
	let n = roots.len() as f64;
	let start = config.anchor.x - config.root_spacing * (n - 1.0) / 2.0;
	for (i, root) in roots.into_iter().enumerate() {
		let anchor = Position::new(start + i as f64 * config.root_spacing, config.anchor.y);
		layout_tree(map, root, anchor, config, jitter);
	}
	debug!("laid out {} node(s) in {} tree(s)", map.len(), n);
}

/// Places `root` on `anchor` and its descendants below it.
pub fn layout_tree(
	map: &mut MindMap,
	root: NodeIdx,
	anchor: Position,
	config: &LayoutConfig,
	jitter: &mut dyn JitterSource,
) {
	map.node_mut(root).position = Some(anchor);
	layout_children(map, root, 0, config, jitter);
}

/// Positions the children of an already positioned node at `depth`, then
/// recurses into them.
fn layout_children(
	map: &mut MindMap,
	parent: NodeIdx,
	depth: usize,
	config: &LayoutConfig,
	jitter: &mut dyn JitterSource,
) {
	let children = map.node(parent).children.clone();
	if children.is_empty() {
		return;
	}
	let Some(origin) = map.node(parent).position else {
		return;
	};

	let child_depth = depth + 1;
	let dx = config.horizontal.at_depth(child_depth);
	let dy = config.vertical.at_depth(child_depth);
	let start = origin.x - dx * (children.len() as f64 - 1.0) / 2.0;

	for (i, &child) in children.iter().enumerate() {
		let x = start + i as f64 * dx + jitter.jitter(config.jitter_x);
		let y = origin.y + dy + jitter.jitter(config.jitter_y);
		map.node_mut(child).position = Some(Position::new(x, y));
	}
	for child in children {
		layout_children(map, child, child_depth, config, jitter);
	}
}

/// Gives a freshly appended node a position without disturbing the rest of
/// the map: right of its rightmost positioned sibling, or straight under its
/// parent when it is the first child.
pub fn place_appended(map: &mut MindMap, idx: NodeIdx, config: &LayoutConfig) {
	let depth = map.depth(idx);
	let Some(parent) = map.node(idx).parent else {
		let rightmost = map
			.roots()
			.iter()
			.filter(|&&r| r != idx)
			.filter_map(|&r| map.node(r).position)
			.max_by(|a, b| a.x.total_cmp(&b.x));
		map.node_mut(idx).position = Some(match rightmost {
			Some(p) => Position::new(p.x + config.root_spacing, p.y),
			None => config.anchor,
		});
		return;
	};
	let Some(origin) = map.node(parent).position else {
		return;
	};

	let rightmost = map
		.node(parent)
		.children
		.iter()
		.filter(|&&c| c != idx)
		.filter_map(|&c| map.node(c).position)
		.max_by(|a, b| a.x.total_cmp(&b.x));
	let position = match rightmost {
		Some(p) => Position::new(p.x + config.horizontal.at_depth(depth), p.y),
		None => Position::new(origin.x, origin.y + config.vertical.at_depth(depth)),
	};
	map.node_mut(idx).position = Some(position);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::tree::{self, has_all_positions};
	use crate::components::mind_map::types::MindNode;

	const EPS: f64 = 1e-9;

	fn star(n: usize) -> (MindMap, NodeIdx, Vec<NodeIdx>) {
		let mut map = MindMap::new();
		let root = map.push_root(MindNode::new("root", "Root"));
		let kids = (0..n)
			.map(|i| map.push_child(root, MindNode::new(format!("c{i}"), "child")))
			.collect();
		(map, root, kids)
	}

	fn deep_tree() -> MindMap {
		let mut map = MindMap::new();
		let root = map.push_root(MindNode::new("r", "r"));
		let mut level = vec![root];
		for depth in 0..4 {
			let mut next = Vec::new();
			for &p in &level {
				for i in 0..3 {
					next.push(map.push_child(p, MindNode::new(format!("{depth}-{}-{i}", p.index()), "n")));
				}
			}
			level = next;
		}
		map
	}

	fn pos(map: &MindMap, idx: NodeIdx) -> Position {
		map.node(idx).position.unwrap()
	}

	#[test]
	fn every_node_is_positioned() {
		let mut map = deep_tree();
		map.push_root(MindNode::new("lonely", "Lonely"));
		layout_forest(&mut map, &LayoutConfig::default(), &mut SeededJitter::new(7));
		assert!(has_all_positions(&map));
		assert!(map.iter().all(|(_, n)| n.position.is_some()));
	}

	#[test]
	fn root_with_three_children_without_jitter() {
		let (mut map, root, kids) = star(3);
		let config = LayoutConfig::default();
		layout_forest(&mut map, &config, &mut NoJitter);

		let r = pos(&map, root);
		assert_eq!(r, config.anchor);
		let dx = config.horizontal.at_depth(1);
		let dy = config.vertical.at_depth(1);
		let xs: Vec<f64> = kids.iter().map(|&k| pos(&map, k).x).collect();
		assert!((xs[0] - (r.x - dx)).abs() < EPS);
		assert!((xs[1] - r.x).abs() < EPS);
		assert!((xs[2] - (r.x + dx)).abs() < EPS);
		for &k in &kids {
			assert!((pos(&map, k).y - (r.y + dy)).abs() < EPS);
		}
	}

	#[test]
	fn root_with_three_children_within_jitter_bounds() {
		let (mut map, root, kids) = star(3);
		let config = LayoutConfig::default();
		layout_forest(&mut map, &config, &mut SeededJitter::new(42));

		let r = pos(&map, root);
		let dx = config.horizontal.at_depth(1);
		let dy = config.vertical.at_depth(1);
		for (i, &k) in kids.iter().enumerate() {
			let p = pos(&map, k);
			let expected_x = r.x + (i as f64 - 1.0) * dx;
			assert!((p.x - expected_x).abs() <= config.jitter_x + EPS);
			assert!((p.y - (r.y + dy)).abs() <= config.jitter_y + EPS);
		}
	}

	#[test]
	fn children_are_symmetric_about_parent() {
		let mut map = deep_tree();
		let config = LayoutConfig::default();
		layout_forest(&mut map, &config, &mut SeededJitter::new(3));

		for (idx, node) in map.iter() {
			if node.children.is_empty() {
				continue;
			}
			let px = pos(&map, idx).x;
			let mean = node.children.iter().map(|&c| pos(&map, c).x).sum::<f64>()
				/ node.children.len() as f64;
			assert!((mean - px).abs() <= config.jitter_x + EPS);
			// left-to-right order is preserved despite jitter
			let xs: Vec<f64> = node.children.iter().map(|&c| pos(&map, c).x).collect();
			assert!(xs.windows(2).all(|w| w[0] < w[1]));
		}
	}

	#[test]
	fn same_seed_same_layout() {
		let config = LayoutConfig::default();
		let mut a = deep_tree();
		let mut b = deep_tree();
		let mut c = deep_tree();
		layout_forest(&mut a, &config, &mut SeededJitter::new(99));
		layout_forest(&mut b, &config, &mut SeededJitter::new(99));
		layout_forest(&mut c, &config, &mut SeededJitter::new(100));
		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[test]
	fn spacing_shrinks_with_depth_and_clamps() {
		let config = LayoutConfig::default();
		let h = config.horizontal;
		assert_eq!(h.at_depth(0), h.base);
		assert!(h.at_depth(1) < h.at_depth(0));
		assert!(h.at_depth(2) < h.at_depth(1));
		assert_eq!(h.at_depth(50), h.min);
		let expected = h.base - h.falloff * 17f64.log2();
		assert!((h.at_depth(1) - expected).abs() < EPS);
	}

	#[test]
	fn forest_roots_are_centred_on_anchor() {
		let mut map = MindMap::new();
		let a = map.push_root(MindNode::new("a", "A"));
		let b = map.push_root(MindNode::new("b", "B"));
		let config = LayoutConfig::centered(1000.0);
		layout_forest(&mut map, &config, &mut NoJitter);
		assert_eq!(pos(&map, a).x + pos(&map, b).x, 1000.0);
		assert_eq!(pos(&map, b).x - pos(&map, a).x, config.root_spacing);
		assert_eq!(pos(&map, a).y, 100.0);
	}

	#[test]
	fn relayout_overwrites_stale_positions() {
		let (mut map, root, kids) = star(2);
		map.node_mut(kids[0]).position = Some(Position::new(-5000.0, 9000.0));
		layout_forest(&mut map, &LayoutConfig::default(), &mut NoJitter);
		assert!(pos(&map, kids[0]).y > pos(&map, root).y);
		assert!(pos(&map, kids[0]).x < pos(&map, root).x);
	}

	#[test]
	fn appended_child_goes_under_parent_or_beside_sibling() {
		let config = LayoutConfig::default();
		let (mut map, root, _) = star(0);
		layout_forest(&mut map, &config, &mut NoJitter);

		let first = tree::add_child(&mut map, root, "first");
		place_appended(&mut map, first, &config);
		let r = pos(&map, root);
		assert_eq!(pos(&map, first), Position::new(r.x, r.y + config.vertical.at_depth(1)));

		let second = tree::add_child(&mut map, root, "second");
		place_appended(&mut map, second, &config);
		let p = pos(&map, second);
		assert_eq!(p.y, pos(&map, first).y);
		assert_eq!(p.x, pos(&map, first).x + config.horizontal.at_depth(1));
		assert_eq!(pos(&map, root), r);
	}
}
