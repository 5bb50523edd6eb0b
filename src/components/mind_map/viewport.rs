use super::tree::Bounds;
use super::types::Position;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;
/// Wheel delta to log-scale factor.
pub const ZOOM_SENSITIVITY: f64 = 0.001;
/// Screen-space margin kept around content by [`ViewportTransform::fitted`].
pub const FIT_MARGIN: f64 = 40.0;

/// Pan/zoom state mapping model space to screen space:
/// `screen = model * scale + (x, y)`.
///
/// Every operation is a pure function of the current state and the input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
	pub x: f64,
	pub y: f64,
	pub scale: f64,
}

impl Default for ViewportTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewportTransform {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		scale: 1.0,
	};

	pub fn to_screen(&self, p: Position) -> Position {
		Position::new(p.x * self.scale + self.x, p.y * self.scale + self.y)
	}

	pub fn to_model(&self, s: Position) -> Position {
		Position::new((s.x - self.x) / self.scale, (s.y - self.y) / self.scale)
	}

	/// Zooms by `exp(-delta_y * ZOOM_SENSITIVITY)`, keeping the model point
	/// under `cursor` fixed on screen.
	#[must_use]
	pub fn zoomed(self, cursor: Position, delta_y: f64) -> Self {
		self.zoomed_by(cursor, (-delta_y * ZOOM_SENSITIVITY).exp())
	}

	/// Multiplies the scale by `factor` (then clamps), anchored at `cursor`.
	#[must_use]
	pub fn zoomed_by(self, cursor: Position, factor: f64) -> Self {
		if !factor.is_finite() || factor <= 0.0 {
			return self;
		}
		let anchor = self.to_model(cursor);
		let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
		Self {
			x: cursor.x - anchor.x * scale,
			y: cursor.y - anchor.y * scale,
			scale,
		}
	}

	/// Pans by a screen-space delta; the delta is divided by the current
	/// scale before it reaches the translation.
	#[must_use]
	pub fn panned(self, dx: f64, dy: f64) -> Self {
		Self {
			x: self.x + dx / self.scale,
			y: self.y + dy / self.scale,
			..self
		}
	}

	#[must_use]
	pub fn reset(self) -> Self {
		Self::IDENTITY
	}

	/// Scales and centres `bounds` inside a `width` x `height` view.
	#[must_use]
	pub fn fitted(self, bounds: Bounds, width: f64, height: f64) -> Self {
		let (bw, bh) = (bounds.width(), bounds.height());
		let (vw, vh) = (width - 2.0 * FIT_MARGIN, height - 2.0 * FIT_MARGIN);
		if bw <= 0.0 || bh <= 0.0 || vw <= 0.0 || vh <= 0.0 {
			return self;
		}
		let scale = (vw / bw).min(vh / bh).clamp(MIN_SCALE, MAX_SCALE);
		let c = bounds.center();
		Self {
			x: width / 2.0 - c.x * scale,
			y: height / 2.0 - c.y * scale,
			scale,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EPS: f64 = 1e-9;

	fn close(a: Position, b: Position) -> bool {
		(a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
	}

	#[test]
	fn screen_and_model_are_inverse() {
		let vt = ViewportTransform {
			x: 37.0,
			y: -12.5,
			scale: 2.5,
		};
		let p = Position::new(10.0, 20.0);
		assert_eq!(vt.to_screen(p), Position::new(62.0, 37.5));
		assert!(close(vt.to_model(vt.to_screen(p)), p));
	}

	#[test]
	fn wheel_up_zooms_in_around_cursor() {
		let cursor = Position::new(500.0, 300.0);
		let before = ViewportTransform::default();
		let under = before.to_model(cursor);
		let after = before.zoomed(cursor, -100.0);
		assert!((after.scale - 0.1f64.exp()).abs() < EPS);
		assert!(close(after.to_screen(under), cursor));
		assert!(close(after.to_model(cursor), Position::new(500.0, 300.0)));
	}

	#[test]
	fn repeated_zoom_keeps_anchor_fixed() {
		let cursor = Position::new(123.0, 456.0);
		let mut vt = ViewportTransform {
			x: -40.0,
			y: 15.0,
			scale: 0.8,
		};
		let anchor = vt.to_model(cursor);
		for delta in [-120.0, -300.0, 80.0, -53.0, 400.0, -1000.0, 2500.0] {
			vt = vt.zoomed(cursor, delta);
			assert!(close(vt.to_model(cursor), anchor));
		}
	}

	#[test]
	fn scale_never_leaves_limits() {
		let cursor = Position::new(10.0, 10.0);
		let mut vt = ViewportTransform::default();
		for _ in 0..50 {
			vt = vt.zoomed(cursor, -500.0);
			assert!(vt.scale <= MAX_SCALE);
		}
		assert_eq!(vt.scale, MAX_SCALE);
		for _ in 0..100 {
			vt = vt.zoomed(cursor, 500.0);
			assert!(vt.scale >= MIN_SCALE);
		}
		assert_eq!(vt.scale, MIN_SCALE);
		assert_eq!(vt.zoomed_by(cursor, f64::NAN), vt);
		assert_eq!(vt.zoomed_by(cursor, 0.0), vt);
	}

	#[test]
	fn pan_divides_by_scale() {
		let vt = ViewportTransform {
			x: 5.0,
			y: 7.0,
			scale: 2.0,
		};
		let panned = vt.panned(30.0, -10.0);
		assert_eq!(panned.x - vt.x, 15.0);
		assert_eq!(panned.y - vt.y, -5.0);
		assert_eq!(panned.scale, 2.0);
	}

	#[test]
	fn reset_is_idempotent() {
		let vt = ViewportTransform {
			x: 1.0,
			y: 2.0,
			scale: 3.0,
		};
		assert_eq!(vt.reset(), ViewportTransform::IDENTITY);
		assert_eq!(ViewportTransform::IDENTITY.reset(), ViewportTransform::IDENTITY);
		assert_eq!(vt.reset().reset(), vt.reset());
	}

	#[test]
	fn fit_centres_content() {
		let bounds = Bounds {
			min: Position::new(-100.0, 0.0),
			max: Position::new(300.0, 200.0),
		};
		let vt = ViewportTransform::default().fitted(bounds, 880.0, 480.0);
		assert!((vt.scale - 2.0).abs() < EPS);
		assert!(close(vt.to_screen(bounds.center()), Position::new(440.0, 240.0)));
		let degenerate = Bounds {
			min: Position::new(0.0, 0.0),
			max: Position::new(0.0, 0.0),
		};
		assert_eq!(vt.fitted(degenerate, 800.0, 600.0), vt);
	}
}
