use serde::{Deserialize, Serialize};
use crate::models::BackoffPolicy;
use crate::utils::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url: String,
    pub chat_path: String,
    pub actions_path: String,
    pub language: String,
    pub log_level: String,
    pub sync_config: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: BACKEND_URL.to_string(),
            chat_path: "/api/mentor/chat".to_string(),
            actions_path: "/api/actions".to_string(),
            language: "pt".to_string(),
            log_level: "info".to_string(),
            sync_config: SyncConfig::default(),
        }
    }
}

/// Parámetros de la cola offline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub sync_tag: String,
    pub pending_check_interval_ms: u32,
    pub synced_flash_ms: u32,
    pub max_action_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_tag: DEFAULT_SYNC_TAG.to_string(),
            pending_check_interval_ms: PENDING_CHECK_INTERVAL_MS,
            synced_flash_ms: SYNCED_FLASH_MS,
            max_action_attempts: MAX_ACTION_ATTEMPTS,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let sync_defaults = SyncConfig::default();

        Self {
            backend_url: defaults.backend_url,
            chat_path: option_env!("CHAT_PATH")
                .unwrap_or("/api/mentor/chat").to_string(),
            actions_path: option_env!("ACTIONS_PATH")
                .unwrap_or("/api/actions").to_string(),
            language: option_env!("LANGUAGE")
                .unwrap_or("pt").to_string(),
            log_level: option_env!("LOG_LEVEL")
                .unwrap_or("info").to_string(),
            sync_config: SyncConfig {
                sync_tag: option_env!("SYNC_TAG")
                    .unwrap_or(DEFAULT_SYNC_TAG).to_string(),
                pending_check_interval_ms: option_env!("PENDING_CHECK_INTERVAL_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(sync_defaults.pending_check_interval_ms),
                synced_flash_ms: option_env!("SYNCED_FLASH_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(sync_defaults.synced_flash_ms),
                max_action_attempts: option_env!("MAX_ACTION_ATTEMPTS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(sync_defaults.max_action_attempts),
                backoff: BackoffPolicy {
                    base_ms: option_env!("BACKOFF_BASE_MS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(sync_defaults.backoff.base_ms),
                    max_ms: option_env!("BACKOFF_MAX_MS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(sync_defaults.backoff.max_ms),
                },
            },
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.backend_url.trim_end_matches('/'), self.chat_path)
    }

    pub fn actions_url(&self) -> String {
        format!("{}{}", self.backend_url.trim_end_matches('/'), self.actions_path)
    }

    /// Nivel para wasm_logger; valores desconocidos caen en Info
    pub fn log_level(&self) -> log::Level {
        match self.log_level.to_lowercase().as_str() {
            "error" => log::Level::Error,
            "warn" => log::Level::Warn,
            "debug" => log::Level::Debug,
            "trace" => log::Level::Trace,
            _ => log::Level::Info,
        }
    }
}
