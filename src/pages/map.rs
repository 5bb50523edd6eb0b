use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use log::{debug, error, warn};

use crate::components::mind_map::{MindMap, MindMapCanvas, MindNode, ingest, tree};
use crate::store::app_repository;

#[derive(Clone, Debug, PartialEq)]
enum Loaded {
	Pending,
	Found(String),
	Missing,
}

/// Full-screen canvas for one stored map, with a node inspector.
#[component]
pub fn MapPage() -> impl IntoView {
	let params = use_params_map();
	let map_id = Memo::new(move |_| params.with(|p| p.get("id").unwrap_or_default()));
	let repo = StoredValue::new_local(app_repository());

	let map = RwSignal::new(MindMap::new());
	let title = RwSignal::new(String::new());
	let loaded = RwSignal::new(Loaded::Pending);
	let inspected = RwSignal::new(None::<String>);

	Effect::new(move |_| {
		let id = map_id.get();
		inspected.set(None);
		match repo.with_value(|r| r.load(&id)) {
			Ok(Some((name, stored))) => {
				title.set(name);
				map.set(stored);
				loaded.set(Loaded::Found(id));
			}
			Ok(None) => {
				warn!("no stored map with id {}", id);
				map.set(MindMap::new());
				loaded.set(Loaded::Missing);
			}
			Err(e) => {
				error!("failed to load map {}: {}", id, e);
				map.set(MindMap::new());
				loaded.set(Loaded::Missing);
			}
		}
	});

	// Every change (drag, layout, edits) is written back.
	Effect::new(move |_| {
		let current = map.get();
		let Loaded::Found(id) = loaded.get() else {
			return;
		};
		if id != map_id.get_untracked() {
			return;
		}
		let name = title.get_untracked();
		if let Err(e) = repo.with_value(|r| r.save(&id, &name, &current)) {
			error!("failed to save map {}: {}", id, e);
		} else {
			debug!("map {} persisted", id);
		}
	});

	view! {
		<div class="fullscreen-map">
			<MindMapCanvas map=map inspected=inspected fullscreen=true />
			<div class="map-overlay">
				<A href="/">"All maps"</A>
				<h1>{move || title.get()}</h1>
				{move || {
					(loaded.get() == Loaded::Missing)
						.then(|| view! { <p class="message">"This mind map does not exist."</p> })
				}}
				<details class="export">
					<summary>"JSON"</summary>
					<pre>{move || map.with(ingest::to_json).unwrap_or_else(|e| e.to_string())}</pre>
				</details>
			</div>
			{move || {
				let id = inspected.get()?;
				let node = map.with(|m| tree::find_node(m, &id).map(|idx| m.node(idx).clone()));
				node.map(|node| view! { <Inspector node=node map=map inspected=inspected /> })
			}}
		</div>
	}
}

/// Details of the double-clicked node plus the edit actions.
#[component]
fn Inspector(
	node: MindNode,
	map: RwSignal<MindMap>,
	inspected: RwSignal<Option<String>>,
) -> impl IntoView {
	let label = RwSignal::new(node.label.clone());
	let child_label = RwSignal::new(String::new());
	let id = StoredValue::new(node.id.clone());

	let on_rename = move |_| {
		let text = label.get_untracked();
		map.update(|m| {
			if let Some(idx) = id.with_value(|id| tree::find_node(m, id)) {
				m.node_mut(idx).label = text;
			}
		});
	};

	let on_add = move |_| {
		let text = match child_label.get_untracked().trim() {
			"" => "New topic".to_owned(),
			t => t.to_owned(),
		};
		map.update(|m| {
			if let Some(parent) = id.with_value(|id| tree::find_node(m, id)) {
				tree::add_child(m, parent, text);
			}
		});
		child_label.set(String::new());
	};

	let on_delete = move |_| {
		map.update(|m| {
			if let Some(idx) = id.with_value(|id| tree::find_node(m, id)) {
				tree::delete_node(m, idx);
			}
		});
		inspected.set(None);
	};

	let children = node.children.len();
	view! {
		<aside class="inspector">
			<button class="close" on:click=move |_| inspected.set(None)>"×"</button>
			<h2>{node.label.clone()}</h2>
			<dl>
				<dt>"id"</dt>
				<dd>{node.id.clone()}</dd>
				<dt>"children"</dt>
				<dd>{children}</dd>
				{node.color.clone().map(|c| view! {
					<dt>"color"</dt>
					<dd><span class="swatch" style=format!("background: {c}")></span>{c.clone()}</dd>
				})}
				{node.link.clone().map(|href| view! {
					<dt>"link"</dt>
					<dd><a href=href.clone() target="_blank" rel="noopener">{href.clone()}</a></dd>
				})}
			</dl>
			<label>
				"Label "
				<input prop:value=move || label.get() on:input=move |ev| label.set(event_target_value(&ev)) />
			</label>
			<button on:click=on_rename>"Rename"</button>
			<label>
				"New child "
				<input
					prop:value=move || child_label.get()
					on:input=move |ev| child_label.set(event_target_value(&ev))
				/>
			</label>
			<button on:click=on_add>"Add child"</button>
			<button class="danger" on:click=on_delete>"Delete node"</button>
		</aside>
	}
}
