// ============================================================================
// STORAGE - Almacenamiento clave-valor (localStorage o memoria)
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use serde::{de::DeserializeOwned, Serialize};
use web_sys::{window, Storage};
use crate::errors::StorageError;

/// Contrato mínimo sobre el storage del navegador
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Leer y deserializar JSON; clave ausente → None
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get_item(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    store.set_item(key, &json)
}

/// localStorage del navegador
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    pub fn new() -> Result<Self, StorageError> {
        let storage = window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Backend(format!("Error leyendo localStorage: {:?}", e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Backend(format!("Error guardando en localStorage: {:?}", e)))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Backend(format!("Error eliminando de localStorage: {:?}", e)))
    }
}

/// Storage en memoria: fallback cuando localStorage no está disponible
/// (modo privado, cuota bloqueada) y backend de los tests
#[derive(Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// localStorage si existe; si no, memoria (los datos no sobreviven a recargas)
pub fn open_store() -> Rc<dyn KeyValueStore> {
    match LocalStore::new() {
        Ok(store) => Rc::new(store),
        Err(e) => {
            log::warn!("⚠️ [STORAGE] {} - usando almacenamiento en memoria", e);
            Rc::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_helpers_roundtrip_and_report_corruption() {
        let store = MemoryStore::new();
        assert_eq!(load_json::<Vec<u32>>(&store, "k").unwrap(), None);

        save_json(&store, "k", &vec![1_u32, 2, 3]).unwrap();
        assert_eq!(load_json::<Vec<u32>>(&store, "k").unwrap(), Some(vec![1, 2, 3]));

        store.set_item("k", "{not json").unwrap();
        assert!(matches!(
            load_json::<Vec<u32>>(&store, "k"),
            Err(StorageError::Serde(_))
        ));
    }
}
