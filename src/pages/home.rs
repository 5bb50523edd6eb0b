use leptos::prelude::*;
use leptos_router::components::A;
use log::{error, info};
use uuid::Uuid;

use crate::components::mind_map::ingest;
use crate::store::{AppRepository, MapSummary, app_repository};

const SAMPLE_ID: &str = "sample";
const SAMPLE_TITLE: &str = "Sample: Rust ownership";
const SAMPLE_JSON: &str = include_str!("../../assets/sample_mindmap.json");

/// Puts the bundled sample in a fresh repository so first use shows something.
fn seed_sample(repo: &AppRepository) -> Vec<MapSummary> {
	let seeded = ingest::parse_document(SAMPLE_JSON)
		.and_then(|map| repo.seed_once(SAMPLE_ID, SAMPLE_TITLE, &map));
	match seeded {
		Ok(true) => info!("seeded sample mind map"),
		Ok(false) => {}
		Err(e) => error!("failed to seed sample map: {}", e),
	}
	repo.list().unwrap_or_else(|e| {
		error!("failed to read map index: {}", e);
		Vec::new()
	})
}

/// Saved maps plus a JSON import form.
#[component]
pub fn Home() -> impl IntoView {
	let repo = StoredValue::new_local(app_repository());
	let maps = RwSignal::new(repo.with_value(seed_sample));
	let title = RwSignal::new(String::new());
	let json = RwSignal::new(String::new());
	let message = RwSignal::new(None::<String>);

	let refresh = move || {
		if let Ok(listed) = repo.with_value(|r| r.list()) {
			maps.set(listed);
		}
	};

	let on_import = move |_| {
		let parsed = match ingest::parse_import(&json.get_untracked()) {
			Ok(map) => map,
			Err(e) => {
				message.set(Some(e.to_string()));
				return;
			}
		};
		let id = Uuid::new_v4().simple().to_string();
		let name = match title.get_untracked().trim() {
			"" => format!("Imported map ({} nodes)", parsed.len()),
			t => t.to_owned(),
		};
		match repo.with_value(|r| r.save(&id, &name, &parsed)) {
			Ok(()) => {
				message.set(Some(format!("Imported \"{}\".", name)));
				json.set(String::new());
				title.set(String::new());
				refresh();
			}
			Err(e) => message.set(Some(e.to_string())),
		}
	};

	view! {
		<div class="page">
			<h1>"Mind Maps"</h1>
			<p class="subtitle">
				"Open a map, drag nodes to rearrange them, Ctrl+scroll to zoom, double-click to inspect."
			</p>

			<ul class="map-list">
				{move || {
					maps.get()
						.into_iter()
						.map(|summary| {
							let id = summary.id.clone();
							let on_delete = move |_| {
								match repo.with_value(|r| r.delete(&id)) {
									Ok(_) => refresh(),
									Err(e) => error!("failed to delete map {}: {}", id, e),
								}
							};
							view! {
								<li>
									<A href=format!("/map/{}", summary.id)>{summary.title}</A>
									<span class="node-count">{format!(" ({} nodes) ", summary.nodes)}</span>
									<button on:click=on_delete>"Delete"</button>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>

			<section class="import">
				<h2>"Import"</h2>
				<input
					type="text"
					placeholder="Title"
					prop:value=move || title.get()
					on:input=move |ev| title.set(event_target_value(&ev))
				/>
				<textarea
					rows="10"
					placeholder=r#"{"id": "root", "label": "Topic", "children": [...]}"#
					prop:value=move || json.get()
					on:input=move |ev| json.set(event_target_value(&ev))
				/>
				<button on:click=on_import>"Import JSON"</button>
				{move || message.get().map(|m| view! { <p class="message">{m}</p> })}
			</section>
		</div>
	}
}
