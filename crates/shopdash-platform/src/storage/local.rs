//! `window.localStorage` backend.
//!
//! Values are stored as UTF-8 strings under the bare key, so entries written
//! by the host page (the bearer token) are readable here and vice versa.

use async_trait::async_trait;
use web_sys::Storage;

use shopdash_core::ports::StoragePort;
use shopdash_types::{DashError, Result};
use crate::http::js_error;

pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| DashError::Storage("No window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| DashError::Storage(js_error(e)))?
            .ok_or_else(|| DashError::Storage("localStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl StoragePort for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .storage
            .get_item(key)
            .map_err(|e| DashError::Storage(js_error(e)))?;
        Ok(value.map(String::into_bytes))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(value)
            .map_err(|e| DashError::Storage(format!("value for {} is not UTF-8: {}", key, e)))?;
        self.storage
            .set_item(key, text)
            .map_err(|e| DashError::Storage(js_error(e)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| DashError::Storage(js_error(e)))
    }

    fn backend_name(&self) -> &str {
        "localstorage"
    }
}
