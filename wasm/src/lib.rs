// draftkeep-wasm: WebAssembly bindings for browser environments

pub mod storage;

use crate::storage::LocalStorage;
use draftkeep_core::{storage_supported, Draft, DraftStore, Drafts, StoreConfig, VersionedStore};
use serde::Serialize;
use std::cell::Cell;
use std::sync::{Arc, Once};
use wasm_bindgen::prelude::*;

static LOGGING: Once = Once::new();

#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    LOGGING.call_once(|| {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    });
}

/// Whether drafts can be persisted in this browser. Warns once if not.
#[wasm_bindgen(js_name = localStorageSupported)]
pub fn local_storage_supported() -> bool {
    storage_supported(&LocalStorage)
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(to_js_error)
}

/// Drafts collection persisted in `localStorage`
#[wasm_bindgen]
pub struct DraftModel {
    inner: DraftStore,
}

#[wasm_bindgen]
impl DraftModel {
    /// `config` is an optional `{ prefix, version, default_expiry_ms }` object
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<DraftModel, JsValue> {
        init_logging();
        let config: StoreConfig = if config.is_undefined() || config.is_null() {
            StoreConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        let store = VersionedStore::with_config(Arc::new(LocalStorage), config);
        Ok(Self {
            inner: DraftStore::from_store(store),
        })
    }

    #[wasm_bindgen(js_name = addDraft)]
    pub fn add_draft(&mut self, draft: JsValue) -> Result<String, JsValue> {
        let draft: Draft = serde_wasm_bindgen::from_value(draft).map_err(to_js_error)?;
        Ok(self.inner.add_draft(draft))
    }

    #[wasm_bindgen(js_name = editDraft)]
    pub fn edit_draft(&mut self, id: &str, draft: JsValue) -> Result<bool, JsValue> {
        let draft: Draft = serde_wasm_bindgen::from_value(draft).map_err(to_js_error)?;
        Ok(self.inner.edit_draft(id, draft))
    }

    #[wasm_bindgen(js_name = deleteDraft)]
    pub fn delete_draft(&mut self, id: &str) -> bool {
        self.inner.delete_draft(id)
    }

    /// The draft as a plain object, or `false` when there is none
    #[wasm_bindgen(js_name = getDraft)]
    pub fn get_draft(&self, id: &str) -> Result<JsValue, JsValue> {
        match self.inner.get_draft(id) {
            Some(draft) => to_js(draft),
            None => Ok(JsValue::FALSE),
        }
    }

    /// Snapshot of every draft keyed by id
    pub fn get(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.get())
    }

    pub fn save(&mut self) -> Result<(), JsValue> {
        self.inner.save().map_err(to_js_error)
    }

    pub fn delete(&mut self) -> Result<(), JsValue> {
        self.inner.delete().map_err(to_js_error)
    }

    /// Move drafts from `from` to `to`. `callback` receives the old record and
    /// returns the new drafts object.
    ///
    /// If `callback` throws, or returns something that is not a drafts object,
    /// nothing is written and the error is rethrown to the caller.
    pub fn migrate(&mut self, from: u32, to: u32, callback: &js_sys::Function) -> Result<JsValue, JsValue> {
        let thrown: Cell<Option<JsValue>> = Cell::new(None);
        let result = self.inner.migrate(from, to, |old: serde_json::Value| {
            to_js(&old)
                .and_then(|arg| callback.call1(&JsValue::NULL, &arg))
                .and_then(|ret| serde_wasm_bindgen::from_value::<Drafts>(ret).map_err(to_js_error))
                .map_err(|e| {
                    let message = e.as_string().unwrap_or_else(|| format!("{:?}", e));
                    thrown.set(Some(e));
                    message
                })
        });
        match result {
            Ok(migrated) => to_js(migrated),
            Err(e) => {
                tracing::warn!("Draft migration from v{} to v{} aborted: {}", from, to, e);
                Err(thrown.take().unwrap_or_else(|| to_js_error(e)))
            }
        }
    }

    #[wasm_bindgen(getter)]
    pub fn version(&self) -> u32 {
        self.inner.version()
    }

    #[wasm_bindgen(setter)]
    pub fn set_version(&mut self, version: u32) {
        self.inner.set_version(version);
    }
}
