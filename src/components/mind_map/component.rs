use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::MindMapState;
use super::types::{MindMap, Position};

type SharedState = Rc<RefCell<Option<MindMapState>>>;

/// Callbacks one mounted canvas hands to the browser: the frame callback,
/// the id of its pending frame and the window resize listener.
///
/// The frame callback holds an `Rc` of its own loop, so the loop lives
/// until [`FrameLoop::teardown`] takes the callbacks out.
struct FrameLoop<C> {
	tick: RefCell<Option<C>>,
	frame: Cell<Option<i32>>,
	resize: RefCell<Option<C>>,
}

impl<C> Default for FrameLoop<C> {
	fn default() -> Self {
		Self {
			tick: RefCell::new(None),
			frame: Cell::new(None),
			resize: RefCell::new(None),
		}
	}
}

impl<C> FrameLoop<C> {
	/// Drops the frame callback and hands back what the browser still
	/// references: the pending frame id and the resize listener.
	fn teardown(&self) -> (Option<i32>, Option<C>) {
		drop(self.tick.take());
		(self.frame.take(), self.resize.take())
	}
}

type BrowserLoop = FrameLoop<Closure<dyn FnMut()>>;

impl BrowserLoop {
	fn request_frame(&self, window: &Window) {
		if let Some(ref cb) = *self.tick.borrow() {
			self.frame
				.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}

	fn stop(&self) {
		let (frame, resize) = self.teardown();
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(id) = frame {
			let _ = window.cancel_animation_frame(id);
		}
		if let Some(cb) = resize {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}
}

/// Pointer position relative to the canvas' top-left corner.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Position> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Position::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Runs `f` on the state and, if it reports a change, pushes the updated
/// map back to `map` once the borrow is released.
fn update_map(state: &SharedState, map: RwSignal<MindMap>, f: impl FnOnce(&mut MindMapState) -> bool) {
	let changed = match *state.borrow_mut() {
		Some(ref mut s) => f(s).then(|| s.map.clone()),
		None => None,
	};
	if let Some(m) = changed {
		map.set(m);
	}
}

#[component]
pub fn MindMapCanvas(
	map: RwSignal<MindMap>,
	/// Receives the id of a node double-clicked on the canvas.
	#[prop(optional)]
	inspected: Option<RwSignal<Option<String>>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let frames: Rc<BrowserLoop> = Rc::new(FrameLoop::default());
	let (state_init, frames_init) = (state.clone(), frames.clone());

	let frames_owned = StoredValue::new_local(frames);
	on_cleanup(move || {
		frames_owned.try_with_value(|f| f.stop());
		debug!("mind map canvas unmounted");
	});

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("2d canvas context unavailable");
			return;
		};

		let initial = map.get_untracked();
		let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
		let s = MindMapState::new(initial.clone(), w, h, seed);
		let laid_out = (s.map != initial).then(|| s.map.clone());
		*state_init.borrow_mut() = Some(s);
		info!("mind map canvas ready ({}x{})", w, h);
		if let Some(m) = laid_out {
			map.set(m);
		}

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			let resize: Closure<dyn FnMut()> = Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			});
			let _ = window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());
			*frames_init.resize.borrow_mut() = Some(resize);
		}

		let (state_anim, frames_anim) = (state_init.clone(), frames_init.clone());
		*frames_init.tick.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref s) = *state_anim.borrow() {
				render::render(s, &ctx);
			}
			if let Some(win) = web_sys::window() {
				frames_anim.request_frame(&win);
			}
		}));
		frames_init.request_frame(&window);
	});

	// Outside edits (inspector, storage reload) flow back into the canvas.
	let state_sync = state.clone();
	Effect::new(move |_| {
		let incoming = map.get();
		update_map(&state_sync, map, |s| s.map != incoming && s.replace_map(incoming));
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(p, ev.button());
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(p);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		update_map(&state_mu, map, MindMapState::pointer_up);
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		update_map(&state_ml, map, MindMapState::pointer_leave);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		let modifier = ev.ctrl_key() || ev.meta_key();
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			if s.wheel(p, ev.delta_y(), modifier) {
				ev.prevent_default();
			}
		}
	};

	let state_dc = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		let hit = state_dc
			.borrow()
			.as_ref()
			.and_then(|s| s.double_click(p).map(|idx| s.map.node(idx).id.clone()));
		if let Some(id) = hit {
			debug!("inspect {}", id);
			if let Some(inspected) = inspected {
				inspected.set(Some(id));
			}
		}
	};

	let state_fit = state.clone();
	let on_fit = move |_| {
		if let Some(ref mut s) = *state_fit.borrow_mut() {
			s.fit_view();
		}
	};
	let state_reset = state.clone();
	let on_reset = move |_| {
		if let Some(ref mut s) = *state_reset.borrow_mut() {
			s.reset_view();
		}
	};
	let state_relayout = state.clone();
	let on_relayout = move |_| {
		update_map(&state_relayout, map, |s| {
			s.relayout();
			true
		});
	};

	view! {
		<div class="mind-map">
			<canvas
				node_ref=canvas_ref
				class="mind-map-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:dblclick=on_dblclick
				style="display: block; cursor: grab;"
			/>
			<div class="mind-map-toolbar">
				<button on:click=on_fit>"Fit"</button>
				<button on:click=on_reset>"Reset view"</button>
				<button on:click=on_relayout>"Re-layout"</button>
			</div>
		</div>
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(
		dim(window.inner_width(), 800.0),
		dim(window.inner_height(), 600.0),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn teardown_releases_the_self_referencing_frame_callback() {
		let frames: Rc<FrameLoop<Box<dyn Fn()>>> = Rc::new(FrameLoop::default());
		let inner = frames.clone();
		*frames.tick.borrow_mut() = Some(Box::new(move || inner.frame.set(Some(2))));
		*frames.resize.borrow_mut() = Some(Box::new(|| {}));
		frames.frame.set(Some(1));
		assert_eq!(Rc::strong_count(&frames), 2);

		let (frame, resize) = frames.teardown();
		assert_eq!(frame, Some(1));
		assert!(resize.is_some());
		assert!(frames.tick.borrow().is_none());
		assert_eq!(Rc::strong_count(&frames), 1);

		let (frame, resize) = frames.teardown();
		assert_eq!(frame, None);
		assert!(resize.is_none());
	}
}
