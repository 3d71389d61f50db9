// ============================================================================
// ERRORES - Tipos de error por subsistema
// ============================================================================
// Los services devuelven estos errores tipados; solo se convierten a String
// en el punto donde se loguean.
// ============================================================================

use thiserror::Error;

/// Errores del almacenamiento clave-valor (localStorage o memoria)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("localStorage no disponible")]
    Unavailable,

    #[error("error de almacenamiento: {0}")]
    Backend(String),

    #[error("error de serialización: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errores de la cola offline y del registro de Background Sync
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Background Sync no soportado en este navegador")]
    Unsupported,

    #[error("registro de Background Sync falló: {0}")]
    Registration(String),
}

/// Errores del stream de chat con el mentor
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {error}")]
    Http {
        status: u16,
        error: String,
        details: Option<String>,
    },

    #[error("el servidor reportó un error: {error}")]
    Remote {
        error: String,
        details: Option<String>,
    },

    #[error("evento SSE mal formado: {0}")]
    MalformedEvent(String),

    #[error("stream no es UTF-8 válido")]
    InvalidUtf8,
}
