use serde::{Deserialize, Serialize};

// ============================================================================
// ACCIÓN PENDIENTE - Mutación del usuario hecha sin conexión
// ============================================================================

/// Acción del usuario registrada mientras no había red.
/// El payload es opaco para la capa de sync; solo `attempts` cambia
/// mientras la acción está en la cola. Las entradas guardadas solo con
/// `{payload, timestamp}` se leen con id y kind vacíos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Milisegundos desde epoch
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub attempts: u32,
}

impl PendingAction {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value, timestamp: i64) -> Self {
        Self {
            id: new_action_id(),
            kind: kind.into(),
            payload,
            timestamp,
            attempts: 0,
        }
    }

    /// Asignar id a una entrada guardada sin él; true si hubo que asignarlo
    pub fn ensure_id(&mut self) -> bool {
        if !self.id.is_empty() {
            return false;
        }
        self.id = new_action_id();
        true
    }
}

fn new_action_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// QUEUE PERSISTENTE CON BACKOFF EXPONENCIAL
// ============================================================================

/// Política de reintentos: base * 2^(n-1), con techo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub base_ms: i64,
    pub max_ms: i64,
}

impl BackoffPolicy {
    /// Espera exigida después de `retry_count` fallos consecutivos
    pub fn delay_ms(&self, retry_count: u32) -> i64 {
        if retry_count == 0 {
            return 0;
        }
        let exponent = (retry_count - 1).min(20);
        self.base_ms.saturating_mul(1_i64 << exponent).min(self.max_ms)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_ms: 30_000,
            max_ms: 300_000,
        }
    }
}

/// Contador de reintentos, guardado aparte de la lista de acciones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryState {
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub last_retry: Option<i64>,
}

/// Vista en memoria de la cola: la lista ordenada de acciones (clave
/// propia en storage) más su estado de reintentos
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingQueue {
    pub actions: Vec<PendingAction>,
    pub retry_count: u32,
    pub last_retry: Option<i64>,
}

impl PendingQueue {
    pub fn from_parts(actions: Vec<PendingAction>, retry: RetryState) -> Self {
        Self {
            actions,
            retry_count: retry.retry_count,
            last_retry: retry.last_retry,
        }
    }

    pub fn retry_state(&self) -> RetryState {
        RetryState {
            retry_count: self.retry_count,
            last_retry: self.last_retry,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn push(&mut self, action: PendingAction) {
        self.actions.push(action);
    }

    pub fn increment_retry(&mut self, now_ms: i64) {
        self.retry_count += 1;
        self.last_retry = Some(now_ms);
    }

    pub fn reset_retry(&mut self) {
        self.retry_count = 0;
        self.last_retry = None;
    }

    /// Determinar si ya pasó la ventana de backoff
    pub fn should_retry(&self, now_ms: i64, policy: &BackoffPolicy) -> bool {
        self.backoff_remaining(now_ms, policy) == 0
    }

    /// Milisegundos que faltan para poder reintentar (0 = ya se puede)
    pub fn backoff_remaining(&self, now_ms: i64, policy: &BackoffPolicy) -> i64 {
        let last_retry = match self.last_retry {
            Some(ts) if self.retry_count > 0 => ts,
            _ => return 0,
        };

        let elapsed = now_ms - last_retry;
        (policy.delay_ms(self.retry_count) - elapsed).max(0)
    }
}

// ============================================================================
// ESTADO DE CONECTIVIDAD (derivado, no se persiste)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityState {
    pub is_online: bool,
    pub pending_count: usize,
    /// Guard de exclusión mutua: como mucho un intento de sync en vuelo
    pub is_syncing: bool,
    pub banner_visible: bool,
    pub just_synced: bool,
    /// Momento (ms) en que se apaga el indicador "sincronizado"
    pub flash_until: Option<i64>,
    pub quarantined_count: usize,
    pub last_error: Option<String>,
}

impl ConnectivityState {
    pub fn new(is_online: bool) -> Self {
        Self {
            is_online,
            pending_count: 0,
            is_syncing: false,
            banner_visible: !is_online,
            just_synced: false,
            flash_until: None,
            quarantined_count: 0,
            last_error: None,
        }
    }

    /// Fase visible para el indicador
    pub fn phase(&self) -> SyncPhase {
        if !self.is_online {
            SyncPhase::Offline {
                pending_count: self.pending_count,
                banner_visible: self.banner_visible,
            }
        } else if self.is_syncing {
            SyncPhase::Syncing
        } else if self.just_synced && self.pending_count == 0 {
            SyncPhase::JustSynced
        } else if self.pending_count > 0 {
            SyncPhase::Pending {
                count: self.pending_count,
            }
        } else {
            SyncPhase::Idle
        }
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Offline {
        pending_count: usize,
        banner_visible: bool,
    },
    Pending {
        count: usize,
    },
    Syncing,
    JustSynced,
}
