//! Persistence of mind maps behind a key-value interface.
//!
//! Pages receive a [`MindMapRepository`] instead of touching
//! `window.localStorage` themselves; tests run it over [`MemoryStore`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::components::mind_map::{MindMap, RawNode, ingest};
use crate::error::{Error, Result};

/// String key-value storage.
pub trait KeyValueStore {
	fn get(&self, key: &str) -> Result<Option<String>>;
	fn set(&self, key: &str, value: &str) -> Result<()>;
	fn remove(&self, key: &str) -> Result<()>;
}

fn js_error(err: JsValue) -> Error {
	Error::Storage(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
	fn get(&self, key: &str) -> Result<Option<String>> {
		(**self).get(key)
	}

	fn set(&self, key: &str, value: &str) -> Result<()> {
		(**self).set(key, value)
	}

	fn remove(&self, key: &str) -> Result<()> {
		(**self).remove(key)
	}
}

/// `window.localStorage`.
#[derive(Clone, Debug)]
pub struct LocalStore {
	storage: web_sys::Storage,
}

impl LocalStore {
	pub fn new() -> Result<Self> {
		let window = web_sys::window().ok_or(Error::StorageUnavailable)?;
		let storage = window
			.local_storage()
			.map_err(js_error)?
			.ok_or(Error::StorageUnavailable)?;
		Ok(Self { storage })
	}
}

impl KeyValueStore for LocalStore {
	fn get(&self, key: &str) -> Result<Option<String>> {
		self.storage.get_item(key).map_err(js_error)
	}

	fn set(&self, key: &str, value: &str) -> Result<()> {
		self.storage.set_item(key, value).map_err(js_error)
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.storage.remove_item(key).map_err(js_error)
	}
}

/// In-memory store; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	entries: Rc<RefCell<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>> {
		Ok(self.entries.borrow().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<()> {
		self.entries
			.borrow_mut()
			.insert(key.to_owned(), value.to_owned());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.entries.borrow_mut().remove(key);
		Ok(())
	}
}

/// Repository used by the pages.
pub type AppRepository = MindMapRepository<Rc<dyn KeyValueStore>>;

pub const MAPS_PREFIX: &str = "mindmaps";

/// Repository over `localStorage`, or over memory when the browser refuses
/// storage (private mode, sandboxed frames).
pub fn app_repository() -> AppRepository {
	let store: Rc<dyn KeyValueStore> = match LocalStore::new() {
		Ok(local) => Rc::new(local),
		Err(e) => {
			warn!("{}; falling back to in-memory storage", e);
			Rc::new(MemoryStore::default())
		}
	};
	MindMapRepository::new(store, MAPS_PREFIX)
}

/// Listing entry kept in the repository index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
	pub id: String,
	pub title: String,
	pub nodes: usize,
}

#[derive(Serialize, Deserialize)]
struct StoredMap {
	title: String,
	roots: Vec<RawNode>,
}

/// Typed access to mind maps stored under `<prefix>:<id>`, plus an index
/// at `<prefix>:index`.
#[derive(Clone, Debug)]
pub struct MindMapRepository<S> {
	store: S,
	prefix: String,
}

impl<S: KeyValueStore> MindMapRepository<S> {
	pub fn new(store: S, prefix: impl Into<String>) -> Self {
		Self {
			store,
			prefix: prefix.into(),
		}
	}

	fn key(&self, id: &str) -> String {
		format!("{}:{}", self.prefix, id)
	}

	fn index_key(&self) -> String {
		format!("{}:index", self.prefix)
	}

	fn seeded_key(&self) -> String {
		format!("{}:seeded", self.prefix)
	}

	pub fn list(&self) -> Result<Vec<MapSummary>> {
		match self.store.get(&self.index_key())? {
			Some(json) => Ok(serde_json::from_str(&json)?),
			None => Ok(Vec::new()),
		}
	}

	/// Saves `map` the first time this repository is seeded and never again,
	/// so maps the user deleted stay deleted. Returns whether it saved.
	pub fn seed_once(&self, id: &str, title: &str, map: &MindMap) -> Result<bool> {
		if self.store.get(&self.seeded_key())?.is_some() {
			return Ok(false);
		}
		// Repositories filled before the marker existed count as seeded.
		if self.list()?.is_empty() {
			self.save(id, title, map)?;
		}
		self.store.set(&self.seeded_key(), "1")?;
		Ok(true)
	}

	fn write_index(&self, index: &[MapSummary]) -> Result<()> {
		self.store
			.set(&self.index_key(), &serde_json::to_string(index)?)
	}

	pub fn load(&self, id: &str) -> Result<Option<(String, MindMap)>> {
		let Some(json) = self.store.get(&self.key(id))? else {
			return Ok(None);
		};
		let stored: StoredMap = ingest::from_json(&json)?;
		Ok(Some((stored.title, ingest::from_raw(stored.roots))))
	}

	/// Inserts or overwrites a map and updates the index.
	pub fn save(&self, id: &str, title: &str, map: &MindMap) -> Result<()> {
		let stored = StoredMap {
			title: title.to_owned(),
			roots: ingest::to_raw(map),
		};
		self.store
			.set(&self.key(id), &serde_json::to_string(&stored)?)?;

		let mut index = self.list()?;
		let summary = MapSummary {
			id: id.to_owned(),
			title: title.to_owned(),
			nodes: map.len(),
		};
		match index.iter_mut().find(|s| s.id == id) {
			Some(slot) => *slot = summary,
			None => index.push(summary),
		}
		self.write_index(&index)?;
		debug!("saved map {} ({} nodes)", id, map.len());
		Ok(())
	}

	/// Removes a map. Returns false if it did not exist.
	pub fn delete(&self, id: &str) -> Result<bool> {
		let mut index = self.list()?;
		let before = index.len();
		index.retain(|s| s.id != id);
		let existed = self.store.get(&self.key(id))?.is_some();
		self.store.remove(&self.key(id))?;
		if index.len() != before {
			self.write_index(&index)?;
		} else if existed {
			warn!("map {} was stored but missing from the index", id);
		}
		Ok(existed)
	}
}
