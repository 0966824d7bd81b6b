use leptos::prelude::*;

use crate::services::settings::{AiSettings, DEFAULT_OPENAI_ENDPOINT, DEFAULT_OPENAI_MODEL, Provider};

/// Modal for choosing the model provider and its credentials.
///
/// Edits go straight into `settings`; the owner decides when to persist.
#[component]
pub fn SettingsPanel(settings: RwSignal<AiSettings>, #[prop(into)] on_close: Callback<()>) -> impl IntoView {
	let is = move |provider: Provider| settings.with(|s| s.provider == provider);
	let choose = move |provider: Provider| settings.update(|s| s.provider = provider);

	view! {
		<div class="modal">
			<div class="modal-backdrop" on:click=move |_| on_close.run(())></div>
			<div class="modal-card">
				<div class="modal-header">
					<h3>"AI Configuration"</h3>
					<button class="modal-close" on:click=move |_| on_close.run(()) title="Close">
						"×"
					</button>
				</div>
				<div class="modal-body">
					<label class="field-label">"Provider"</label>
					<div class="provider-toggle">
						<button
							class="provider"
							class:active=move || is(Provider::Gemini)
							on:click=move |_| choose(Provider::Gemini)
						>
							"Gemini"
						</button>
						<button
							class="provider"
							class:active=move || is(Provider::OpenAi)
							on:click=move |_| choose(Provider::OpenAi)
						>
							"OpenAI Compatible"
						</button>
					</div>

					<Show
						when=move || is(Provider::OpenAi)
						fallback=|| {
							view! {
								<p class="provider-note">
									"Using system-configured Gemini API Key. No additional setup required."
								</p>
							}
						}
					>
						<label class="field-label">"Base Endpoint"</label>
						<input
							type="text"
							placeholder=DEFAULT_OPENAI_ENDPOINT
							prop:value=move || settings.with(|s| s.openai_endpoint.clone())
							on:input=move |ev| settings.update(|s| s.openai_endpoint = event_target_value(&ev))
						/>
						<label class="field-label">"Model Name"</label>
						<input
							type="text"
							placeholder=DEFAULT_OPENAI_MODEL
							prop:value=move || settings.with(|s| s.openai_model.clone())
							on:input=move |ev| settings.update(|s| s.openai_model = event_target_value(&ev))
						/>
						<label class="field-label">"API Key"</label>
						<input
							type="password"
							placeholder="sk-..."
							prop:value=move || settings.with(|s| s.openai_api_key.clone())
							on:input=move |ev| settings.update(|s| s.openai_api_key = event_target_value(&ev))
						/>
					</Show>
				</div>
				<div class="modal-footer">
					<button class="primary" on:click=move |_| on_close.run(())>
						"Save & Close"
					</button>
				</div>
			</div>
		</div>
	}
}
