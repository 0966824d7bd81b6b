//! Pan/zoom state of the drawing surface.

use super::scene::ease_cubic_in_out;

/// Affine view transform: screen = scene * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Screen coordinates to scene coordinates.
	pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Value for an SVG `transform` attribute.
	pub fn to_svg(&self) -> String {
		format!("translate({},{}) scale({})", self.x, self.y, self.k)
	}

	fn lerp(self, to: Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

/// Tunables for [`Viewport`].
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportConfig {
	pub min_scale: f64,
	pub max_scale: f64,
	pub zoom_in_factor: f64,
	pub zoom_out_factor: f64,
	pub zoom_ms: f64,
	pub recenter_ms: f64,
	/// Scale of the canonical placement.
	pub default_scale: f64,
	/// Where the root lands, as a fraction of the surface width/height.
	pub anchor: (f64, f64),
	/// Per-notch wheel factors (zoom in, zoom out).
	pub wheel_factors: (f64, f64),
	/// Pointer travel (px) before a press becomes a drag.
	pub drag_threshold: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.05,
			max_scale: 5.0,
			zoom_in_factor: 1.3,
			zoom_out_factor: 0.7,
			zoom_ms: 250.0,
			recenter_ms: 750.0,
			default_scale: 0.8,
			anchor: (0.25, 0.5),
			wheel_factors: (1.1, 0.9),
			drag_threshold: 3.0,
		}
	}
}

/// A press on the background, and whether it has turned into a drag yet.
#[derive(Clone, Debug, Default)]
struct PanState {
	active: bool,
	moved: bool,
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

#[derive(Clone, Copy, Debug)]
struct Tween {
	from: ViewTransform,
	to: ViewTransform,
	start: f64,
	duration: f64,
}

/// Owns the view transform and the gestures that change it.
///
/// Data updates never touch the transform; only gestures, the explicit
/// zoom/recenter operations and the first placement after a reset do.
#[derive(Clone, Debug)]
pub struct Viewport {
	config: ViewportConfig,
	transform: ViewTransform,
	width: f64,
	height: f64,
	pan: PanState,
	tween: Option<Tween>,
	placed: bool,
}

impl Viewport {
	/// A viewport for a surface of `width` x `height` pixels.
	pub fn new(config: ViewportConfig, width: f64, height: f64) -> Self {
		Self {
			config,
			transform: ViewTransform::default(),
			width,
			height,
			pan: PanState::default(),
			tween: None,
			placed: false,
		}
	}

	/// The current transform.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Surface dimensions.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Root at the configured anchor fraction, default scale.
	pub fn canonical(&self) -> ViewTransform {
		ViewTransform {
			x: self.width * self.config.anchor.0,
			y: self.height * self.config.anchor.1,
			k: self.config.default_scale,
		}
	}

	/// Jump to the canonical placement, once per loaded tree.
	pub fn place_initial(&mut self) {
		if self.placed {
			return;
		}
		self.placed = true;
		self.tween = None;
		self.transform = self.canonical();
	}

	/// Forget the placement so the next loaded tree is placed afresh.
	pub fn unplace(&mut self) {
		self.placed = false;
	}

	/// Animate to the canonical placement.
	pub fn recenter(&mut self, now: f64) {
		let to = self.canonical();
		self.animate_to(to, now, self.config.recenter_ms);
	}

	/// Scale up about the surface centre.
	pub fn zoom_in(&mut self, now: f64) {
		self.scale_by(self.config.zoom_in_factor, now);
	}

	/// Scale down about the surface centre.
	pub fn zoom_out(&mut self, now: f64) {
		self.scale_by(self.config.zoom_out_factor, now);
	}

	fn scale_by(&mut self, factor: f64, now: f64) {
		let to = self.scaled_about(self.transform, factor, self.width / 2.0, self.height / 2.0);
		self.animate_to(to, now, self.config.zoom_ms);
	}

	fn scaled_about(&self, from: ViewTransform, factor: f64, px: f64, py: f64) -> ViewTransform {
		let k = (from.k * factor).clamp(self.config.min_scale, self.config.max_scale);
		let ratio = k / from.k;
		ViewTransform {
			x: px - (px - from.x) * ratio,
			y: py - (py - from.y) * ratio,
			k,
		}
	}

	fn animate_to(&mut self, to: ViewTransform, now: f64, duration: f64) {
		self.tween = Some(Tween {
			from: self.transform,
			to,
			start: now,
			duration,
		});
	}

	/// Wheel zoom about the pointer. Applied immediately.
	pub fn wheel(&mut self, px: f64, py: f64, delta_y: f64) {
		let (zoom_in, zoom_out) = self.config.wheel_factors;
		let factor = if delta_y > 0.0 { zoom_out } else { zoom_in };
		self.tween = None;
		self.transform = self.scaled_about(self.transform, factor, px, py);
	}

	/// Press on the surface. Presses that land on a node never start a pan.
	/// Returns whether a pan began.
	pub fn pointer_down(&mut self, px: f64, py: f64, on_node: bool) -> bool {
		if on_node {
			return false;
		}
		self.tween = None;
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: px,
			start_y: py,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
		true
	}

	/// Pointer motion. Returns whether the transform changed.
	pub fn pointer_move(&mut self, px: f64, py: f64) -> bool {
		if !self.pan.active {
			return false;
		}
		let (dx, dy) = (px - self.pan.start_x, py - self.pan.start_y);
		if !self.pan.moved && dx.hypot(dy) < self.config.drag_threshold {
			return false;
		}
		self.pan.moved = true;
		self.transform.x = self.pan.transform_start_x + dx;
		self.transform.y = self.pan.transform_start_y + dy;
		true
	}

	/// End of a press. Returns whether the press was a drag.
	pub fn pointer_up(&mut self) -> bool {
		let dragged = self.pan.active && self.pan.moved;
		self.pan = PanState::default();
		dragged
	}

	/// Whether a pan is in progress.
	pub fn is_panning(&self) -> bool {
		self.pan.active
	}

	/// New surface size. Leaves the transform alone.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Advance any running animation. Returns whether the transform changed.
	pub fn tick(&mut self, now: f64) -> bool {
		let Some(tween) = self.tween else {
			return false;
		};
		let raw = if tween.duration <= 0.0 {
			1.0
		} else {
			(now - tween.start) / tween.duration
		};
		if raw >= 1.0 {
			self.transform = tween.to;
			self.tween = None;
		} else {
			self.transform = tween.from.lerp(tween.to, ease_cubic_in_out(raw));
		}
		true
	}

	/// Whether a zoom/recenter animation is running.
	pub fn is_animating(&self) -> bool {
		self.tween.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(ViewportConfig::default(), 1200.0, 800.0)
	}

	#[test]
	fn recenter_lands_on_canonical_placement() {
		let mut vp = viewport();
		vp.place_initial();
		vp.wheel(10.0, 10.0, -1.0);
		vp.pointer_down(0.0, 0.0, false);
		vp.pointer_move(50.0, 40.0);
		vp.pointer_up();

		vp.recenter(0.0);
		assert!(vp.is_animating());
		vp.tick(375.0);
		vp.tick(750.0);
		let t = vp.transform();
		assert_eq!(t.k, 0.8);
		assert_eq!((t.x, t.y), (300.0, 400.0));
		assert!(!vp.is_animating());
	}

	#[test]
	fn initial_placement_happens_once() {
		let mut vp = viewport();
		vp.place_initial();
		assert_eq!(vp.transform(), vp.canonical());
		vp.wheel(600.0, 400.0, -1.0);
		let zoomed = vp.transform();
		vp.place_initial();
		assert_eq!(vp.transform(), zoomed);

		vp.unplace();
		vp.place_initial();
		assert_eq!(vp.transform(), vp.canonical());
	}

	#[test]
	fn zoom_buttons_scale_about_centre() {
		let mut vp = viewport();
		vp.place_initial();
		vp.zoom_in(0.0);
		vp.tick(250.0);
		let t = vp.transform();
		assert!((t.k - 0.8 * 1.3).abs() < 1e-9);
		// The scene point under the centre stays put.
		let before = (600.0 - 300.0) / 0.8;
		let (after, _) = t.invert(600.0, 400.0);
		assert!((before - after).abs() < 1e-9);

		vp.zoom_out(300.0);
		vp.tick(550.0);
		assert!((vp.transform().k - 0.8 * 1.3 * 0.7).abs() < 1e-9);
	}

	#[test]
	fn scale_is_clamped() {
		let mut vp = viewport();
		for _ in 0..200 {
			vp.wheel(0.0, 0.0, -1.0);
		}
		assert_eq!(vp.transform().k, 5.0);
		for _ in 0..400 {
			vp.wheel(0.0, 0.0, 1.0);
		}
		assert_eq!(vp.transform().k, 0.05);
	}

	#[test]
	fn press_on_node_does_not_pan() {
		let mut vp = viewport();
		vp.place_initial();
		assert!(!vp.pointer_down(10.0, 10.0, true));
		assert!(!vp.pointer_move(200.0, 200.0));
		assert!(!vp.pointer_up());
		assert_eq!(vp.transform(), vp.canonical());
	}

	#[test]
	fn small_jitter_is_not_a_drag() {
		let mut vp = viewport();
		vp.place_initial();
		assert!(vp.pointer_down(10.0, 10.0, false));
		assert!(!vp.pointer_move(11.0, 11.0));
		assert!(!vp.pointer_up());
		assert!(vp.pointer_down(10.0, 10.0, false));
		assert!(vp.pointer_move(40.0, 10.0));
		assert!(vp.pointer_up());
		assert_eq!(vp.transform().x, vp.canonical().x + 30.0);
	}

	#[test]
	fn resize_keeps_transform() {
		let mut vp = viewport();
		vp.place_initial();
		let before = vp.transform();
		vp.resize(400.0, 300.0);
		assert_eq!(vp.transform(), before);
		assert_eq!(vp.canonical().x, 100.0);
	}
}
