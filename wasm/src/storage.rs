// Browser localStorage as a draft storage medium
//
// The handle is looked up on every call rather than held, so the backend stays
// Send + Sync and survives the page disabling storage mid-session.

use draftkeep_core::StorageBackend;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn handle() -> Result<web_sys::Storage, String> {
        let window = web_sys::window().ok_or_else(|| "no window object".to_string())?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| "localStorage is disabled".to_string())
    }
}

fn js_error(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

impl StorageBackend for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Self::handle()?.get_item(key).map_err(js_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        // throws QuotaExceededError when the origin is full
        Self::handle()?.set_item(key, value).map_err(js_error)
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        Self::handle()?.remove_item(key).map_err(js_error)
    }

    fn flush(&self) -> Result<(), String> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        Self::handle().is_ok()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_local_storage_available() {
        assert!(LocalStorage.is_available());
    }

    #[wasm_bindgen_test]
    fn test_local_storage_roundtrip() {
        let storage = LocalStorage;
        storage.set("draftkeep_test_key", "value").unwrap();
        assert_eq!(
            storage.get("draftkeep_test_key").unwrap(),
            Some("value".to_string())
        );
        storage.remove("draftkeep_test_key").unwrap();
        assert_eq!(storage.get("draftkeep_test_key").unwrap(), None);
    }
}
