/// URL base del backend
/// Configurada en tiempo de compilación (BACKEND_URL en .env), por defecto local
pub const BACKEND_URL: &str = match option_env!("BACKEND_URL") {
    Some(url) => url,
    None => "http://localhost:3000",
};

/// Clave de localStorage con la lista ordenada de acciones pendientes
pub const PENDING_QUEUE_KEY: &str = "estudo_pending_actions";
/// Contador de reintentos de la cola (backoff)
pub const PENDING_RETRY_KEY: &str = "estudo_pending_retry";
/// Sufijo de la clave donde se apartan valores guardados que no se pueden leer
pub const UNREADABLE_BACKUP_SUFFIX: &str = "_unreadable";
/// Acciones que agotaron sus reintentos
pub const QUARANTINE_KEY: &str = "estudo_quarantined_actions";
/// Banco de questões local
pub const QUESTION_BANK_KEY: &str = "estudo_question_bank";

/// Tag registrado en el service worker para Background Sync
pub const DEFAULT_SYNC_TAG: &str = "estudo-pending-actions";

pub const PENDING_CHECK_INTERVAL_MS: u32 = 5_000;
pub const SYNCED_FLASH_MS: u32 = 2_000;
pub const MAX_ACTION_ATTEMPTS: u32 = 5;

/// Comandos que piden el modelo de mayor capacidad
pub const PRO_COMMAND_PREFIXES: [&str; 5] = [
    "/analisar",
    "/explicar",
    "/autopsia",
    "/plano",
    "/material",
];
pub const PRO_LENGTH_THRESHOLD: usize = 200;

/// Texto que reemplaza la respuesta del mentor cuando el stream falla
pub const MENTOR_ERROR_MESSAGE: &str =
    "Desculpe, tive um problema para responder agora. Tente novamente em instantes.";

/// Sentinela de fin del stream SSE
pub const SSE_DONE_SENTINEL: &str = "[DONE]";
