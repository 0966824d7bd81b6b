use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlDivElement, MouseEvent, WheelEvent, Window};

use super::render::{SvgSurface, download_svg};
use super::state::MindMapState;
use super::svg::{EXPORT_FILENAME, NODE_ID_ATTR};
use super::types::{NodeId, TreeNode};

struct Mounted {
	state: MindMapState,
	surface: SvgSurface,
}

type Shared = Rc<RefCell<Option<Mounted>>>;

fn now() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or_default()
}

fn surface_size(container: &HtmlDivElement) -> (f64, f64) {
	let (w, h) = (container.client_width(), container.client_height());
	(
		if w > 0 { w as f64 } else { 800.0 },
		if h > 0 { h as f64 } else { 600.0 },
	)
}

/// Id of the interactive node the event landed in, if any.
fn node_under(ev: &MouseEvent) -> Option<NodeId> {
	let target: Element = ev.target()?.dyn_into().ok()?;
	let node = target.closest(&format!("[{NODE_ID_ATTR}]")).ok()??;
	node.get_attribute(NODE_ID_ATTR).map(NodeId::from_raw)
}

fn local_point(container_ref: NodeRef<leptos::html::Div>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let container = container_ref.get_untracked()?;
	let rect = container.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn with_mounted<R>(shared: &Shared, f: impl FnOnce(&mut Mounted) -> R) -> Option<R> {
	shared.borrow_mut().as_mut().map(f)
}

/// Pannable, zoomable SVG rendering of a mind map.
///
/// A single click on a node reports its id; a double click reports the full
/// node. The surface never binds double-click to zoom.
#[component]
pub fn MindMapView(
	#[prop(into)] data: Signal<Option<Arc<TreeNode>>>,
	#[prop(into)] on_node_click: Callback<NodeId>,
	#[prop(into)] on_node_double_click: Callback<TreeNode>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let mounted: Shared = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (mounted_init, animate_init, resize_cb_init) =
		(mounted.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if mounted_init.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = surface_size(&container);
		let surface = match SvgSurface::mount(&container, w, h) {
			Ok(surface) => surface,
			Err(err) => {
				warn!("could not mount mind map surface: {err:?}");
				return;
			}
		};
		let mut state = MindMapState::new(w, h);
		state.set_data(data.get_untracked(), now());
		*mounted_init.borrow_mut() = Some(Mounted { state, surface });
		info!("mind map surface mounted at {w}x{h}");

		let (mounted_resize, container_resize) = (mounted_init.clone(), container.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = surface_size(&container_resize);
			with_mounted(&mounted_resize, |m| {
				m.state.resize(nw, nh);
				if let Err(err) = m.surface.resize(nw, nh) {
					warn!("resize failed: {err:?}");
				}
			});
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (mounted_anim, animate_inner) = (mounted_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			with_mounted(&mounted_anim, |m| {
				let t = now();
				if m.state.tick(t) {
					let frame = m.state.frame(t);
					let transform = m.state.transform();
					if let Err(err) = m.surface.render(&frame, &transform) {
						warn!("render failed: {err:?}");
					}
				}
			});
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let mounted_data = mounted.clone();
	Effect::new(move |_| {
		let tree = data.get();
		let report = with_mounted(&mounted_data, |m| m.state.set_data(tree, now())).flatten();
		if let Some(report) = report {
			debug!("mind map data updated: {report:?}");
		}
	});

	let mounted_md = mounted.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let on_node = node_under(&ev).is_some();
		if on_node {
			ev.stop_propagation();
		}
		let Some((x, y)) = local_point(container_ref, &ev) else {
			return;
		};
		with_mounted(&mounted_md, |m| m.state.viewport.pointer_down(x, y, on_node));
	};

	let mounted_mm = mounted.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(container_ref, &ev) else {
			return;
		};
		with_mounted(&mounted_mm, |m| {
			if m.state.viewport.pointer_move(x, y) {
				m.state.invalidate();
			}
		});
	};

	let mounted_mu = mounted.clone();
	let on_mouseup = move |_: MouseEvent| {
		with_mounted(&mounted_mu, |m| m.state.viewport.pointer_up());
	};

	let mounted_ml = mounted.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_mounted(&mounted_ml, |m| m.state.viewport.pointer_up());
	};

	let mounted_wh = mounted.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(container_ref, &ev) else {
			return;
		};
		with_mounted(&mounted_wh, |m| {
			m.state.viewport.wheel(x, y, ev.delta_y());
			m.state.invalidate();
		});
	};

	let on_click = move |ev: MouseEvent| {
		let Some(id) = node_under(&ev) else {
			return;
		};
		ev.stop_propagation();
		on_node_click.run(id);
	};

	let mounted_dc = mounted.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(id) = node_under(&ev) else {
			return;
		};
		ev.stop_propagation();
		ev.prevent_default();
		// Release the borrow before handing control to the callback.
		let node = with_mounted(&mounted_dc, |m| m.state.node(&id)).flatten();
		match node {
			Some(node) => on_node_double_click.run(node),
			None => warn!("double-click on unknown node {id}"),
		}
	};

	let mounted_zi = mounted.clone();
	let zoom_in = move |_: MouseEvent| {
		with_mounted(&mounted_zi, |m| m.state.viewport.zoom_in(now()));
	};
	let mounted_zo = mounted.clone();
	let zoom_out = move |_: MouseEvent| {
		with_mounted(&mounted_zo, |m| m.state.viewport.zoom_out(now()));
	};
	let mounted_rc = mounted.clone();
	let recenter = move |_: MouseEvent| {
		with_mounted(&mounted_rc, |m| m.state.viewport.recenter(now()));
	};
	let mounted_ex = mounted.clone();
	let export = move |_: MouseEvent| {
		let Some(doc) = with_mounted(&mounted_ex, |m| m.state.export_svg(now())) else {
			return;
		};
		let Some(document) = web_sys::window().and_then(|w: Window| w.document()) else {
			return;
		};
		match download_svg(&document, &doc, EXPORT_FILENAME) {
			Ok(()) => info!("exported {EXPORT_FILENAME}"),
			Err(err) => warn!("export failed: {err:?}"),
		}
	};

	view! {
		<div class="mind-map">
			<div
				node_ref=container_ref
				class="mind-map-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:click=on_click
				on:dblclick=on_dblclick
			/>
			<div class="viewport-controls">
				<button on:click=zoom_in title="Zoom In">"+"</button>
				<button on:click=zoom_out title="Zoom Out">"−"</button>
				<button on:click=recenter title="Recenter">"⤢"</button>
				<button on:click=export title="Export as SVG">"⤓"</button>
			</div>
			<div class="viewport-hint">
				<span class="hint hint-pan">"Pan / Drag"</span>
				<span class="hint hint-expand">"Double-click to AI Expand"</span>
			</div>
		</div>
	}
}
