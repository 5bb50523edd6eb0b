use web_sys::CanvasRenderingContext2d;

use super::state::MindMapState;
use super::tree::{self, Bounds, LABEL_CHAR_WIDTH, NODE_MAX_WIDTH, NODE_PADDING_X};
use super::types::{MindNode, Position};

const BACKGROUND: &str = "#1a1a2e";
const EDGE_COLOR: &str = "rgba(100, 180, 255, 0.6)";
const DEPTH_COLORS: &[&str] = &[
	"#d62728", "#1f77b4", "#2ca02c", "#9467bd", "#ff7f0e", "#17becf", "#8c564b", "#e377c2",
];
const CORNER_RADIUS: f64 = 8.0;

pub fn render(state: &MindMapState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.viewport.x, state.viewport.y);
	let _ = ctx.scale(state.viewport.scale, state.viewport.scale);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &MindMapState, ctx: &CanvasRenderingContext2d) {
	let map = &state.map;
	ctx.set_stroke_style_str(EDGE_COLOR);
	ctx.set_line_width(1.5 / state.viewport.scale);

	for (parent, child) in tree::edges(map) {
		let (Some(from), Some(to)) = (
			tree::node_bounds(map.node(parent)),
			tree::node_bounds(map.node(child)),
		) else {
			continue;
		};
		let [start, control, end] = edge_curve(&from, &to);
		ctx.begin_path();
		ctx.move_to(start.x, start.y);
		ctx.quadratic_curve_to(control.x, control.y, end.x, end.y);
		ctx.stroke();
	}
}

/// Start, control and end point of the quadratic curve joining the bottom
/// centre of the parent to the top centre of the child. The control point
/// sits straight below the parent, halfway down.
fn edge_curve(from: &Bounds, to: &Bounds) -> [Position; 3] {
	let start = Position::new(from.center().x, from.max.y);
	let end = Position::new(to.center().x, to.min.y);
	let control = Position::new(start.x, (start.y + end.y) / 2.0);
	[start, control, end]
}

fn draw_nodes(state: &MindMapState, ctx: &CanvasRenderingContext2d) {
	let map = &state.map;
	let k = state.viewport.scale;
	ctx.set_font("13px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for (idx, node) in map.iter() {
		let Some(b) = tree::node_bounds(node) else {
			continue;
		};
		let fill = node
			.color
			.as_deref()
			.unwrap_or(DEPTH_COLORS[map.depth(idx) % DEPTH_COLORS.len()]);

		rounded_rect(ctx, b.min.x, b.min.y, b.width(), b.height());
		ctx.set_fill_style_str(fill);
		ctx.fill();

		let dragged = state.drag.active && state.drag.node == Some(idx);
		if state.hover == Some(idx) || dragged {
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.9)");
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}

		let c = b.center();
		ctx.set_fill_style_str("white");
		let _ = ctx.fill_text(&fit_label(node), c.x, c.y);

		if node.link.is_some() {
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_line_width(1.0 / k);
			ctx.begin_path();
			ctx.move_to(b.min.x + NODE_PADDING_X, b.max.y - 6.0);
			ctx.line_to(b.max.x - NODE_PADDING_X, b.max.y - 6.0);
			ctx.stroke();
		}
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64) {
	let r = CORNER_RADIUS.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

/// Truncates the label to the widest box a node may get.
fn fit_label(node: &MindNode) -> String {
	let max_chars = ((NODE_MAX_WIDTH - 2.0 * NODE_PADDING_X) / LABEL_CHAR_WIDTH) as usize;
	if node.label.chars().count() <= max_chars {
		return node.label.clone();
	}
	let mut s: String = node.label.chars().take(max_chars.saturating_sub(1)).collect();
	s.push('…');
	s
}
