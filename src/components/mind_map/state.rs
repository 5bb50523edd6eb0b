use log::{debug, info};

use super::layout::{self, LayoutConfig, SeededJitter};
use super::tree;
use super::types::{MindMap, NodeIdx, Position};
use super::viewport::ViewportTransform;

/// `MouseEvent.button` value of the primary button.
pub const PRIMARY_BUTTON: i16 = 0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<NodeIdx>,
	pub start: Position,
	pub node_start: Position,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub last: Position,
}

/// Everything the canvas needs between two frames.
pub struct MindMapState {
	pub map: MindMap,
	pub viewport: ViewportTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<NodeIdx>,
	pub layout: LayoutConfig,
	pub width: f64,
	pub height: f64,
	jitter: SeededJitter,
}

impl MindMapState {
	pub fn new(map: MindMap, width: f64, height: f64, seed: u64) -> Self {
		let mut state = Self {
			map,
			viewport: ViewportTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			layout: LayoutConfig::centered(width),
			width,
			height,
			jitter: SeededJitter::new(seed),
		};
		state.fill_missing_positions();
		state
	}

	/// Positions whatever is not positioned yet.
	///
	/// A map with no positions at all gets a full layout. Otherwise existing
	/// (possibly user-dragged) positions are kept and only the gaps are
	/// filled. Returns true if anything was placed.
	pub fn fill_missing_positions(&mut self) -> bool {
		if tree::has_all_positions(&self.map) {
			return false;
		}
		if self.map.iter().all(|(_, n)| n.position.is_none()) {
			layout::layout_forest(&mut self.map, &self.layout, &mut self.jitter);
			return true;
		}
		let order: Vec<NodeIdx> = tree::walk_forest(&self.map).collect();
		let mut placed = 0;
		for idx in order {
			if self.map.node(idx).position.is_none() {
				layout::place_appended(&mut self.map, idx, &self.layout);
				placed += 1;
			}
		}
		debug!("placed {} new node(s)", placed);
		true
	}

	/// Swaps in new data, keeping the viewport.
	///
	/// Returns true when positions had to be computed, meaning the stored
	/// copy is stale.
	pub fn replace_map(&mut self, map: MindMap) -> bool {
		self.map = map;
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = None;
		self.fill_missing_positions()
	}

	/// Throws away every position and lays the forest out again.
	pub fn relayout(&mut self) {
		layout::layout_forest(&mut self.map, &self.layout, &mut self.jitter);
		self.hover = None;
		info!("regenerated layout for {} node(s)", self.map.len());
	}

	pub fn reset_view(&mut self) {
		self.viewport = self.viewport.reset();
	}

	pub fn fit_view(&mut self) {
		if let Some(bounds) = tree::bounds(&self.map) {
			self.viewport = self.viewport.fitted(bounds, self.width, self.height);
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.layout.anchor.x = width / 2.0;
	}

	pub fn node_at_screen(&self, screen: Position) -> Option<NodeIdx> {
		tree::node_at(&self.map, self.viewport.to_model(screen))
	}

	pub fn pointer_down(&mut self, screen: Position, button: i16) {
		if button != PRIMARY_BUTTON {
			return;
		}
		let hit = self
			.node_at_screen(screen)
			.and_then(|idx| self.map.node(idx).position.map(|p| (idx, p)));
		if let Some((idx, node_start)) = hit {
			self.drag = DragState {
				active: true,
				node: Some(idx),
				start: screen,
				node_start,
				moved: false,
			};
		} else {
			self.pan = PanState {
				active: true,
				last: screen,
			};
		}
	}

	pub fn pointer_move(&mut self, screen: Position) {
		if self.drag.active {
			if let Some(idx) = self.drag.node {
				let k = self.viewport.scale;
				let (dx, dy) = (
					(screen.x - self.drag.start.x) / k,
					(screen.y - self.drag.start.y) / k,
				);
				let to = Position::new(self.drag.node_start.x + dx, self.drag.node_start.y + dy);
				let node = self.map.node_mut(idx);
				if node.position != Some(to) {
					node.position = Some(to);
					self.drag.moved = true;
				}
			}
		} else if self.pan.active {
			let (dx, dy) = (screen.x - self.pan.last.x, screen.y - self.pan.last.y);
			self.viewport = self.viewport.panned(dx, dy);
			self.pan.last = screen;
		} else {
			self.hover = self.node_at_screen(screen);
		}
	}

	/// Ends any drag or pan. Returns true if a node was moved, so the host
	/// can persist the map.
	pub fn pointer_up(&mut self) -> bool {
		let moved = self.drag.active && self.drag.moved;
		if let Some(idx) = self.drag.node.filter(|_| moved) {
			debug!("node {} dropped", self.map.node(idx).id);
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		moved
	}

	/// The pointer left the canvas: nothing may stay grabbed.
	pub fn pointer_leave(&mut self) -> bool {
		self.hover = None;
		self.pointer_up()
	}

	/// Zooms only when a modifier key is held so plain wheel events keep
	/// scrolling the page. Returns true if the event was consumed.
	pub fn wheel(&mut self, screen: Position, delta_y: f64, modifier: bool) -> bool {
		if !modifier {
			return false;
		}
		self.viewport = self.viewport.zoomed(screen, delta_y);
		true
	}

	/// Node to inspect after a double click, if any.
	pub fn double_click(&self, screen: Position) -> Option<NodeIdx> {
		self.node_at_screen(screen)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::types::MindNode;

	fn state() -> MindMapState {
		let mut map = MindMap::new();
		let r = map.push_root(MindNode::new("r", "Root"));
		map.push_child(r, MindNode::new("a", "A"));
		map.push_child(r, MindNode::new("b", "B"));
		MindMapState::new(map, 800.0, 600.0, 1)
	}

	fn screen_of(s: &MindMapState, id: &str) -> Position {
		let idx = tree::find_node(&s.map, id).unwrap();
		s.viewport.to_screen(s.map.node(idx).position.unwrap())
	}

	#[test]
	fn new_state_lays_out_unpositioned_data() {
		let s = state();
		assert!(tree::has_all_positions(&s.map));
		let root = s.map.node(s.map.roots()[0]).position.unwrap();
		assert_eq!(root, Position::new(400.0, 100.0));
	}

	#[test]
	fn dragging_a_node_moves_it_by_delta_over_scale() {
		let mut s = state();
		s.viewport = ViewportTransform {
			x: 10.0,
			y: 20.0,
			scale: 2.0,
		};
		let a = tree::find_node(&s.map, "a").unwrap();
		let before = s.map.node(a).position.unwrap();
		let grab = screen_of(&s, "a");

		s.pointer_down(grab, PRIMARY_BUTTON);
		assert!(s.drag.active);
		s.pointer_move(Position::new(grab.x + 40.0, grab.y - 10.0));
		let after = s.map.node(a).position.unwrap();
		assert!((after.x - (before.x + 20.0)).abs() < 1e-9);
		assert!((after.y - (before.y - 5.0)).abs() < 1e-9);
		assert!(s.pointer_up());
		assert!(!s.drag.active);
		assert_eq!(s.viewport.x, 10.0);
	}

	#[test]
	fn click_without_motion_is_not_a_change() {
		let mut s = state();
		let grab = screen_of(&s, "b");
		s.pointer_down(grab, PRIMARY_BUTTON);
		s.pointer_move(grab);
		assert!(!s.pointer_up());
	}

	#[test]
	fn background_drag_pans() {
		let mut s = state();
		s.viewport.scale = 4.0;
		let empty = Position::new(5.0, 590.0);
		assert!(s.node_at_screen(empty).is_none());
		s.pointer_down(empty, PRIMARY_BUTTON);
		assert!(s.pan.active);
		s.pointer_move(Position::new(25.0, 570.0));
		s.pointer_move(Position::new(45.0, 550.0));
		assert_eq!(s.viewport.x, 10.0);
		assert_eq!(s.viewport.y, -10.0);
		assert!(!s.pointer_up());
		assert!(!s.pan.active);
	}

	#[test]
	fn secondary_button_does_nothing() {
		let mut s = state();
		s.pointer_down(screen_of(&s, "a"), 2);
		assert!(!s.drag.active && !s.pan.active);
	}

	#[test]
	fn leaving_the_canvas_ends_a_drag() {
		let mut s = state();
		let grab = screen_of(&s, "a");
		s.pointer_down(grab, PRIMARY_BUTTON);
		s.pointer_move(Position::new(grab.x + 5.0, grab.y));
		assert!(s.pointer_leave());
		assert!(!s.drag.active);
		assert!(s.hover.is_none());
		let a = tree::find_node(&s.map, "a").unwrap();
		let pinned = s.map.node(a).position;
		s.pointer_move(Position::new(grab.x + 100.0, grab.y + 100.0));
		assert_eq!(s.map.node(a).position, pinned);
	}

	#[test]
	fn hover_tracks_pointer_when_idle() {
		let mut s = state();
		s.pointer_move(screen_of(&s, "b"));
		assert_eq!(s.hover, tree::find_node(&s.map, "b"));
		s.pointer_move(Position::new(1.0, 599.0));
		assert!(s.hover.is_none());
	}

	#[test]
	fn plain_wheel_is_left_to_the_page() {
		let mut s = state();
		assert!(!s.wheel(Position::new(500.0, 300.0), -100.0, false));
		assert_eq!(s.viewport, ViewportTransform::IDENTITY);
		assert!(s.wheel(Position::new(500.0, 300.0), -100.0, true));
		assert!((s.viewport.scale - 0.1f64.exp()).abs() < 1e-9);
	}

	#[test]
	fn double_click_reports_node_under_cursor() {
		let s = state();
		let hit = s.double_click(screen_of(&s, "r")).unwrap();
		assert_eq!(s.map.node(hit).id, "r");
		assert!(s.double_click(Position::new(1.0, 599.0)).is_none());
	}

	#[test]
	fn replacing_data_keeps_dragged_positions() {
		let mut s = state();
		let mut map = s.map.clone();
		let a = tree::find_node(&map, "a").unwrap();
		map.node_mut(a).position = Some(Position::new(-77.0, 333.0));
		let added = tree::add_child(&mut map, a, "new");

		assert!(s.replace_map(map));
		assert_eq!(s.map.node(a).position, Some(Position::new(-77.0, 333.0)));
		let p = s.map.node(added).position.unwrap();
		assert_eq!(p.x, -77.0);
		assert!(p.y > 333.0);
		assert!(!s.replace_map(s.map.clone()));
	}

	#[test]
	fn relayout_reclaims_user_positions() {
		let mut s = state();
		let a = tree::find_node(&s.map, "a").unwrap();
		s.map.node_mut(a).position = Some(Position::new(9999.0, 9999.0));
		s.relayout();
		assert!(s.map.node(a).position.unwrap().x < 9999.0);
	}

	#[test]
	fn fit_and_reset_view() {
		let mut s = state();
		s.fit_view();
		let bounds = tree::bounds(&s.map).unwrap();
		let c = s.viewport.to_screen(bounds.center());
		assert!((c.x - 400.0).abs() < 1e-6 && (c.y - 300.0).abs() < 1e-6);
		s.reset_view();
		assert_eq!(s.viewport, ViewportTransform::IDENTITY);
	}

	#[test]
	fn empty_map_is_fine() {
		let mut s = MindMapState::new(MindMap::new(), 800.0, 600.0, 0);
		s.fit_view();
		s.relayout();
		assert_eq!(s.viewport, ViewportTransform::IDENTITY);
		assert!(s.double_click(Position::new(1.0, 1.0)).is_none());
	}
}
