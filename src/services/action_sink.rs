// ============================================================================
// ACTION SINK - Reenvío de una acción pendiente al backend
// ============================================================================

use futures::future::LocalBoxFuture;
use gloo_net::http::Request;
use crate::errors::SyncError;
use crate::models::sync::PendingAction;

/// Destino de las acciones al reproducir la cola
pub trait ActionSink {
    fn submit<'a>(&'a self, action: &'a PendingAction) -> LocalBoxFuture<'a, Result<(), SyncError>>;
}

/// POST de cada acción al backend (stateless)
#[derive(Clone)]
pub struct HttpActionSink {
    url: String,
}

impl HttpActionSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    async fn post(&self, action: &PendingAction) -> Result<(), SyncError> {
        log::debug!("📤 [SINK] Enviando acción {} ({})", action.id, action.kind);

        let response = Request::post(&self.url)
            .header("Idempotency-Key", &action.id)
            .json(action)
            .map_err(|e| SyncError::Network(format!("Request build error: {}", e)))?
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let body = response.text().await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SyncError::Http { status, body });
        }

        Ok(())
    }
}

impl ActionSink for HttpActionSink {
    fn submit<'a>(&'a self, action: &'a PendingAction) -> LocalBoxFuture<'a, Result<(), SyncError>> {
        Box::pin(self.post(action))
    }
}
