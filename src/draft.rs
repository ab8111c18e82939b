use std::collections::HashMap;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::error::{RallyError, Result};
use crate::route_types::Waypoint;

/// Key-value store holding the in-progress waypoint list.
pub trait DraftStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryDraftStore {
    entries: HashMap<String, String>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[wasm_bindgen]
extern "C" {
    /// Any object with the Web Storage methods, e.g. `window.localStorage`.
    pub type DraftStorage;

    #[wasm_bindgen(method, structural, catch, js_name = getItem)]
    fn get_item(this: &DraftStorage, key: &str) -> std::result::Result<Option<String>, JsValue>;

    #[wasm_bindgen(method, structural, catch, js_name = setItem)]
    fn set_item(this: &DraftStorage, key: &str, value: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, structural, catch, js_name = removeItem)]
    fn remove_item(this: &DraftStorage, key: &str) -> std::result::Result<(), JsValue>;
}

/// Draft store backed by a JS `Storage` object.
pub struct JsDraftStore {
    storage: DraftStorage,
}

impl JsDraftStore {
    pub fn new(storage: DraftStorage) -> Self {
        Self { storage }
    }
}

/// Storage throws `Error`/`DOMException` objects (e.g. QuotaExceededError).
fn js_storage_error(e: JsValue) -> RallyError {
    let message = match e.dyn_ref::<js_sys::Error>() {
        Some(err) => String::from(err.message()),
        None => e.as_string().unwrap_or_else(|| format!("{e:?}")),
    };
    RallyError::Storage(message)
}

impl DraftStore for JsDraftStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(js_storage_error)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(js_storage_error)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(js_storage_error)
    }
}

pub fn encode(waypoints: &[Waypoint]) -> Result<String> {
    Ok(serde_json::to_string(waypoints)?)
}

pub fn decode(json: &str) -> Result<Vec<Waypoint>> {
    Ok(serde_json::from_str(json)?)
}
