use std::collections::HashSet;
use std::rc::Rc;
use serde::Deserialize;
use crate::errors::StorageError;
use crate::models::sync::{PendingAction, PendingQueue, RetryState};
use crate::services::storage::{save_json, KeyValueStore};
use crate::utils::constants::{
    PENDING_QUEUE_KEY, PENDING_RETRY_KEY, QUARANTINE_KEY, UNREADABLE_BACKUP_SUFFIX,
};

/// Resultado de aplicar un intento de sync sobre la cola persistida
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub remaining: usize,
    pub quarantined: usize,
}

/// Formatos aceptados al leer una lista de acciones: la lista plana o el
/// objeto `{actions, ...}` de versiones anteriores
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredActions {
    List(Vec<PendingAction>),
    Wrapped { actions: Vec<PendingAction> },
}

impl StoredActions {
    fn into_actions(self) -> Vec<PendingAction> {
        match self {
            StoredActions::List(actions) | StoredActions::Wrapped { actions } => actions,
        }
    }
}

fn backup_key(key: &str) -> String {
    format!("{}{}", key, UNREADABLE_BACKUP_SUFFIX)
}

/// Persistencia de la cola offline y de la cuarentena
#[derive(Clone)]
pub struct OfflineService {
    store: Rc<dyn KeyValueStore>,
}

impl OfflineService {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cargar la cola; sin clave → cola vacía
    pub fn load_queue(&self) -> Result<PendingQueue, StorageError> {
        let actions = self.load_actions(PENDING_QUEUE_KEY)?;
        Ok(PendingQueue::from_parts(actions, self.load_retry_state()?))
    }

    /// Guardar la cola; vacía → se eliminan las claves
    pub fn save_queue(&self, queue: &PendingQueue) -> Result<(), StorageError> {
        if queue.is_empty() {
            return self.clear_queue();
        }
        save_json(self.store.as_ref(), PENDING_QUEUE_KEY, &queue.actions)?;
        let retry = queue.retry_state();
        if retry == RetryState::default() {
            self.store.remove_item(PENDING_RETRY_KEY)?;
        } else {
            save_json(self.store.as_ref(), PENDING_RETRY_KEY, &retry)?;
        }
        log::debug!("💾 [OFFLINE] Queue guardada: {} acciones, {} reintentos",
                    queue.len(), queue.retry_count);
        Ok(())
    }

    pub fn clear_queue(&self) -> Result<(), StorageError> {
        self.store.remove_item(PENDING_QUEUE_KEY)?;
        self.store.remove_item(PENDING_RETRY_KEY)
    }

    /// Añadir al final de la cola (sin límite de tamaño)
    pub fn append(&self, action: PendingAction) -> Result<usize, StorageError> {
        let mut queue = self.load_queue()?;
        queue.push(action);
        self.save_queue(&queue)?;
        Ok(queue.len())
    }

    pub fn pending_count(&self) -> Result<usize, StorageError> {
        Ok(self.load_actions(PENDING_QUEUE_KEY)?.len())
    }

    /// Leer una lista de acciones. Un valor ilegible se aparta a su clave de
    /// respaldo y la lista empieza vacía, así las acciones nuevas se siguen
    /// guardando. Entradas sin id o en el formato antiguo se reescriben
    /// normalizadas para que los ids sean estables entre lecturas.
    fn load_actions(&self, key: &str) -> Result<Vec<PendingAction>, StorageError> {
        let Some(raw) = self.store.get_item(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<StoredActions>(&raw) {
            Ok(stored) => {
                let mut normalize = matches!(stored, StoredActions::Wrapped { .. });
                let mut actions = stored.into_actions();
                for action in &mut actions {
                    normalize |= action.ensure_id();
                }
                if normalize {
                    log::info!("🔧 [OFFLINE] Normalizando {} acciones en '{}'", actions.len(), key);
                    save_json(self.store.as_ref(), key, &actions)?;
                }
                Ok(actions)
            }
            Err(e) => {
                log::error!("❌ [OFFLINE] Valor ilegible en '{}' ({}), apartado en '{}'",
                            key, e, backup_key(key));
                self.set_aside(key, &raw)?;
                Ok(Vec::new())
            }
        }
    }

    fn set_aside(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        let backup_key = backup_key(key);
        let mut saved: Vec<String> = match self.store.get_item(&backup_key)? {
            Some(existing) => serde_json::from_str(&existing).unwrap_or_else(|_| vec![existing]),
            None => Vec::new(),
        };
        saved.push(raw.to_string());
        save_json(self.store.as_ref(), &backup_key, &saved)?;
        self.store.remove_item(key)
    }

    /// Contador de reintentos; ilegible → se reinicia
    fn load_retry_state(&self) -> Result<RetryState, StorageError> {
        let Some(raw) = self.store.get_item(PENDING_RETRY_KEY)? else {
            return Ok(RetryState::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("⚠️ [OFFLINE] Contador de reintentos ilegible, reiniciando: {}", e);
            RetryState::default()
        }))
    }

    /// Aplicar el resultado de un intento de sync.
    ///
    /// Vuelve a leer la cola antes de escribir, así las acciones añadidas
    /// durante el intento no se pierden. Las entregadas se eliminan por id,
    /// las fallidas suman un intento y las que llegan a `max_attempts` pasan
    /// a cuarentena.
    pub fn reconcile(
        &self,
        delivered: &[String],
        failed: &[String],
        max_attempts: u32,
        now_ms: i64,
    ) -> Result<ReconcileReport, StorageError> {
        let delivered: HashSet<&str> = delivered.iter().map(String::as_str).collect();
        let failed_ids: HashSet<&str> = failed.iter().map(String::as_str).collect();

        let mut queue = self.load_queue()?;
        let mut kept = Vec::with_capacity(queue.len());
        let mut poisoned = Vec::new();

        for mut action in queue.actions.drain(..) {
            if delivered.contains(action.id.as_str()) {
                continue;
            }
            if failed_ids.contains(action.id.as_str()) {
                action.attempts += 1;
                if action.attempts >= max_attempts {
                    log::warn!("☣️ [OFFLINE] Acción {} ({}) en cuarentena tras {} intentos",
                               action.id, action.kind, action.attempts);
                    poisoned.push(action);
                    continue;
                }
            }
            kept.push(action);
        }
        queue.actions = kept;

        if failed_ids.is_empty() {
            queue.reset_retry();
        } else {
            queue.increment_retry(now_ms);
        }

        let quarantined = poisoned.len();
        if !poisoned.is_empty() {
            let mut quarantine = self.load_quarantine()?;
            quarantine.extend(poisoned);
            save_json(self.store.as_ref(), QUARANTINE_KEY, &quarantine)?;
        }
        self.save_queue(&queue)?;

        Ok(ReconcileReport {
            remaining: queue.len(),
            quarantined,
        })
    }

    pub fn load_quarantine(&self) -> Result<Vec<PendingAction>, StorageError> {
        self.load_actions(QUARANTINE_KEY)
    }

    /// Devolver la cuarentena a la cola con los intentos a cero
    pub fn requeue_quarantined(&self) -> Result<usize, StorageError> {
        let quarantine = self.load_quarantine()?;
        if quarantine.is_empty() {
            return Ok(0);
        }

        let moved = quarantine.len();
        let mut queue = self.load_queue()?;
        for mut action in quarantine {
            action.attempts = 0;
            queue.push(action);
        }
        queue.reset_retry();
        self.save_queue(&queue)?;
        self.store.remove_item(QUARANTINE_KEY)?;
        log::info!("♻️ [OFFLINE] {} acciones devueltas a la cola", moved);
        Ok(moved)
    }

    pub fn clear_quarantine(&self) -> Result<(), StorageError> {
        self.store.remove_item(QUARANTINE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStore;
    use serde_json::json;

    fn service() -> OfflineService {
        OfflineService::new(Rc::new(MemoryStore::new()))
    }

    fn action(kind: &str, ts: i64) -> PendingAction {
        PendingAction::new(kind, json!({ "ts": ts }), ts)
    }

    #[test]
    fn append_preserves_order_and_counts() {
        let offline = service();
        assert_eq!(offline.pending_count().unwrap(), 0);

        offline.append(action("a", 1)).unwrap();
        offline.append(action("b", 2)).unwrap();
        assert_eq!(offline.append(action("c", 3)).unwrap(), 3);

        let kinds: Vec<_> = offline.load_queue().unwrap().actions.into_iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec!["a", "b", "c"]);
    }

    #[test]
    fn reconcile_keeps_only_failed_and_new_actions() {
        let offline = service();
        let first = action("first", 1);
        let second = action("second", 2);
        offline.append(first.clone()).unwrap();
        offline.append(second.clone()).unwrap();

        // Llega una acción nueva mientras el intento está en vuelo
        let late = action("late", 3);
        offline.append(late.clone()).unwrap();

        let report = offline
            .reconcile(&[first.id.clone()], &[second.id.clone()], 5, 10)
            .unwrap();
        assert_eq!(report, ReconcileReport { remaining: 2, quarantined: 0 });

        let queue = offline.load_queue().unwrap();
        assert_eq!(queue.actions[0].id, second.id);
        assert_eq!(queue.actions[0].attempts, 1);
        assert_eq!(queue.actions[1].id, late.id);
        assert_eq!(queue.actions[1].attempts, 0);
        assert_eq!(queue.retry_count, 1);
        assert_eq!(queue.last_retry, Some(10));
    }

    #[test]
    fn poison_action_moves_to_quarantine() {
        let offline = service();
        let poison = action("poison", 1);
        offline.append(poison.clone()).unwrap();

        for attempt in 1..=3 {
            let report = offline.reconcile(&[], &[poison.id.clone()], 3, attempt).unwrap();
            if attempt < 3 {
                assert_eq!(report.remaining, 1);
            } else {
                assert_eq!(report, ReconcileReport { remaining: 0, quarantined: 1 });
            }
        }

        assert_eq!(offline.pending_count().unwrap(), 0);
        assert_eq!(offline.load_quarantine().unwrap().len(), 1);

        assert_eq!(offline.requeue_quarantined().unwrap(), 1);
        let queue = offline.load_queue().unwrap();
        assert_eq!(queue.actions[0].attempts, 0);
        assert!(offline.load_quarantine().unwrap().is_empty());
    }

    #[test]
    fn full_success_removes_storage_key() {
        let store = Rc::new(MemoryStore::new());
        let offline = OfflineService::new(store.clone());
        let only = action("only", 1);
        offline.append(only.clone()).unwrap();

        offline.reconcile(&[only.id], &[], 5, 2).unwrap();
        assert_eq!(store.get_item(PENDING_QUEUE_KEY).unwrap(), None);
        assert_eq!(store.get_item(PENDING_RETRY_KEY).unwrap(), None);
    }

    #[test]
    fn queue_key_holds_plain_list_and_retry_lives_apart() {
        let store = Rc::new(MemoryStore::new());
        let offline = OfflineService::new(store.clone());
        let failing = action("failing", 1);
        offline.append(failing.clone()).unwrap();
        offline.reconcile(&[], &[failing.id.clone()], 5, 40).unwrap();

        let raw = store.get_item(PENDING_QUEUE_KEY).unwrap().unwrap();
        let stored: Vec<PendingAction> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].attempts, 1);

        let raw_retry = store.get_item(PENDING_RETRY_KEY).unwrap().unwrap();
        let retry: RetryState = serde_json::from_str(&raw_retry).unwrap();
        assert_eq!(retry, RetryState { retry_count: 1, last_retry: Some(40) });
    }

    #[test]
    fn bare_stored_list_accepts_new_actions_with_stable_ids() {
        let store = Rc::new(MemoryStore::new());
        store
            .set_item(PENDING_QUEUE_KEY, r#"[{"payload":{"q":1},"timestamp":5}]"#)
            .unwrap();
        let offline = OfflineService::new(store.clone());

        assert_eq!(offline.append(action("answer", 6)).unwrap(), 2);

        let first_read = offline.load_queue().unwrap();
        let second_read = offline.load_queue().unwrap();
        assert_eq!(first_read.actions[0].payload, json!({ "q": 1 }));
        assert_eq!(first_read.actions[1].kind, "answer");
        assert_eq!(first_read.actions[0].id, second_read.actions[0].id);

        // Entregar la entrada antigua por id la elimina
        let old_id = first_read.actions[0].id.clone();
        let report = offline.reconcile(&[old_id], &[], 5, 7).unwrap();
        assert_eq!(report.remaining, 1);
    }

    #[test]
    fn previous_object_format_is_read_and_rewritten_as_list() {
        let store = Rc::new(MemoryStore::new());
        store
            .set_item(
                PENDING_QUEUE_KEY,
                r#"{"actions":[{"id":"a","kind":"answer","payload":{},"timestamp":5}],"retry_count":2}"#,
            )
            .unwrap();
        let offline = OfflineService::new(store.clone());

        assert_eq!(offline.pending_count().unwrap(), 1);
        let raw = store.get_item(PENDING_QUEUE_KEY).unwrap().unwrap();
        assert!(raw.starts_with('['));
    }

    #[test]
    fn unreadable_queue_is_set_aside_and_appends_keep_working() {
        let store = Rc::new(MemoryStore::new());
        store.set_item(PENDING_QUEUE_KEY, "{corrupto").unwrap();
        let offline = OfflineService::new(store.clone());

        assert_eq!(offline.append(action("answer", 1)).unwrap(), 1);
        assert_eq!(offline.load_queue().unwrap().actions[0].kind, "answer");

        let backup = backup_key(PENDING_QUEUE_KEY);
        let saved: Vec<String> =
            serde_json::from_str(&store.get_item(&backup).unwrap().unwrap()).unwrap();
        assert_eq!(saved, vec!["{corrupto".to_string()]);

        // Un segundo valor ilegible se suma al respaldo, no lo pisa
        store.set_item(PENDING_QUEUE_KEY, "42").unwrap();
        assert_eq!(offline.pending_count().unwrap(), 0);
        let saved: Vec<String> =
            serde_json::from_str(&store.get_item(&backup).unwrap().unwrap()).unwrap();
        assert_eq!(saved, vec!["{corrupto".to_string(), "42".to_string()]);
    }
}
