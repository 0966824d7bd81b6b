use leptos::prelude::*;

/// Dismissible error notification pinned to the bottom of the page.
#[component]
pub fn ErrorToast(
	#[prop(into)] message: Signal<Option<String>>,
	#[prop(into)] on_dismiss: Callback<()>,
) -> impl IntoView {
	move || {
		message.get().map(|text| {
			view! {
				<div class="error-toast" role="alert">
					<span class="error-text">{text}</span>
					<button class="error-dismiss" on:click=move |_| on_dismiss.run(()) title="Dismiss">
						"×"
					</button>
				</div>
			}
		})
	}
}
