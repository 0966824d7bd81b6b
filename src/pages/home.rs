use std::sync::Arc;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;

use crate::components::mind_map::{MindMapView, NodeId, TreeNode};
use crate::components::{ErrorToast, SettingsPanel};
use crate::services::{ai, storage};
use crate::session::Session;

/// Topic form, mind map and the request lifecycle around them.
#[component]
pub fn Home() -> impl IntoView {
	let session = RwSignal::new(Session::restored(storage::load_tree()));
	let settings = RwSignal::new(storage::load_settings());
	let show_settings = RwSignal::new(false);

	let tree: Memo<Option<Arc<TreeNode>>> = Memo::new(move |_| session.with(|s| s.tree().cloned()));
	let loading = Memo::new(move |_| session.with(Session::is_loading));
	let can_generate = Memo::new(move |_| session.with(Session::can_generate));
	let error = Signal::derive(move || session.with(|s| s.error().map(str::to_owned)));

	Effect::new(move |_| tree.with(|t| storage::save_tree(t.as_deref())));
	Effect::new(move |_| settings.with(storage::save_settings));

	let generate = move || {
		let Some(ticket) = session.try_update(Session::begin_generate).flatten() else {
			return;
		};
		let topic = session.with_untracked(|s| s.topic.trim().to_owned());
		let settings = settings.get_untracked();
		spawn_local(async move {
			let result = ai::generate_outline(&topic, &settings).await;
			session.update(|s| {
				s.finish_generate(ticket, result);
			});
		});
	};
	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		generate();
	};

	let on_expand = Callback::new(move |node: TreeNode| {
		let Some(ticket) = session.try_update(Session::begin_expand).flatten() else {
			debug!("ignoring expansion of {} while a request is pending", node.id);
			return;
		};
		let settings = settings.get_untracked();
		spawn_local(async move {
			let result = ai::expand_topic(&node.text, &settings).await;
			session.update(|s| {
				s.finish_expand(ticket, &node.id, result);
			});
		});
	});
	let on_select = Callback::new(move |id: NodeId| debug!("selected {id}"));

	let topic_value = move || session.with(|s| s.topic.clone());
	let set_topic = move |ev: leptos::ev::Event| session.update(|s| s.topic = event_target_value(&ev));

	view! {
		<div class="app">
			<header class="app-header">
				<div class="brand">
					<span class="brand-mark">"✦"</span>
					<h1>"MindSpark " <span class="accent">"AI"</span></h1>
				</div>

				<form class="topic-form" on:submit=on_submit>
					<input
						type="text"
						placeholder="What topic do you want to map out?"
						prop:value=topic_value
						on:input=set_topic
					/>
					<button type="submit" class="primary" disabled=move || !can_generate.get()>
						{move || if loading.get() { "Generating..." } else { "Generate" }}
					</button>
				</form>

				<div class="header-actions">
					<Show when=move || tree.with(Option::is_some)>
						<button on:click=move |_| session.update(Session::reset) title="Reset">
							"↺"
						</button>
					</Show>
					<button on:click=move |_| show_settings.set(true) title="Settings">
						"⚙"
					</button>
				</div>
			</header>

			<main class="app-main">
				<MindMapView data=tree on_node_click=on_select on_node_double_click=on_expand />

				<Show when=move || tree.with(Option::is_none)>
					<div class="empty-state">
						<h2>"AI Powered " <span class="accent">"Mind Mapping"</span></h2>
						<p>
							"Enter a topic to generate an interactive hierarchy. Now supports Gemini and OpenAI compatible endpoints."
						</p>
						<form class="topic-form-compact" on:submit=on_submit>
							<input type="text" placeholder="Enter topic..." prop:value=topic_value on:input=set_topic />
							<button type="submit" class="primary" disabled=move || !can_generate.get()>
								{move || if loading.get() { "Thinking..." } else { "Start Building" }}
							</button>
						</form>
					</div>
				</Show>

				<Show when=move || loading.get()>
					<div class="loading-overlay">
						<div class="loading-pulse"></div>
						<p>
							{move || {
								format!(
									"AI is structuring your ideas using {}...",
									settings.with(|s| s.provider.label()),
								)
							}}
						</p>
					</div>
				</Show>

				<ErrorToast message=error on_dismiss=move |_| session.update(Session::dismiss_error) />
			</main>

			<Show when=move || show_settings.get()>
				<SettingsPanel settings=settings on_close=move |_| show_settings.set(false) />
			</Show>
		</div>
	}
}
