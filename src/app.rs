// ============================================================================
// APP - Composición de services, viewmodels y vistas
// ============================================================================

use std::rc::Rc;
use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use crate::config::AppConfig;
use crate::models::mentor::ChatContext;
use crate::services::network_monitor::{current_status, NetworkMonitor, NetworkStatus};
use crate::services::{
    open_store, BackgroundSyncRegistrar, ForegroundOnly, HttpActionSink, HttpChatTransport,
    LocalQuestionStore, ServiceWorkerRegistrar,
};
use crate::utils::SystemClock;
use crate::viewmodels::{MentorSession, SyncOutcome, SyncViewModel};
use crate::views::{render_connectivity_indicator, render_mentor_panel};

pub struct App {
    config: AppConfig,
    sync: SyncViewModel,
    mentor: Rc<MentorSession>,
    questions: LocalQuestionStore,
    _network_monitor: Option<NetworkMonitor>,
    _pending_check: Interval,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self, JsValue> {
        let store = open_store();
        let clock = Rc::new(SystemClock);

        let registrar: Rc<dyn BackgroundSyncRegistrar> = if ServiceWorkerRegistrar.is_available() {
            Rc::new(ServiceWorkerRegistrar::new())
        } else {
            log::warn!("⚠️ [APP] Background Sync no disponible - solo reintentos en primer plano");
            Rc::new(ForegroundOnly)
        };

        let sync = SyncViewModel::new(
            store.clone(),
            Rc::new(HttpActionSink::new(config.actions_url())),
            registrar,
            clock.clone(),
            config.sync_config.clone(),
            current_status().is_online(),
        );

        let mentor = Rc::new(MentorSession::new(
            Rc::new(HttpChatTransport::new(config.chat_url())),
            clock,
        ));

        // Re-render de las vistas cuando cambia el estado
        {
            let observed = sync.clone();
            let lang = config.language.clone();
            sync.subscribe(move || {
                if let Err(e) = render_connectivity_indicator(&observed.state(), &lang) {
                    log::error!("❌ [APP] Error pintando indicador: {:?}", e);
                }
            });
        }
        {
            let weak = Rc::downgrade(&mentor);
            let lang = config.language.clone();
            mentor.subscribe(move || {
                if let Some(mentor) = weak.upgrade() {
                    if let Err(e) = render_mentor_panel(
                        &mentor.messages(),
                        mentor.is_open(),
                        mentor.is_streaming(),
                        &lang,
                    ) {
                        log::error!("❌ [APP] Error pintando mentor: {:?}", e);
                    }
                }
            });
        }

        let flash_ms = config.sync_config.synced_flash_ms;
        let network_monitor = {
            let sync = sync.clone();
            NetworkMonitor::start(move |status| match status {
                NetworkStatus::Offline => sync.handle_offline(),
                NetworkStatus::Online => {
                    let sync = sync.clone();
                    spawn_local(async move {
                        let outcome = sync.handle_online().await;
                        schedule_flash_expiry(&sync, &outcome, flash_ms);
                    });
                }
            })
        };
        let network_monitor = match network_monitor {
            Ok(monitor) => Some(monitor),
            Err(e) => {
                log::error!("❌ [APP] No se pudo iniciar NetworkMonitor: {:?}", e);
                None
            }
        };

        let pending_check = {
            let sync = sync.clone();
            Interval::new(config.sync_config.pending_check_interval_ms, move || {
                let sync = sync.clone();
                spawn_local(async move {
                    let outcome = sync.tick().await;
                    schedule_flash_expiry(&sync, &outcome, flash_ms);
                });
            })
        };

        render_connectivity_indicator(&sync.state(), &config.language)?;
        log::info!("⏰ [APP] Chequeo de cola cada {} ms", config.sync_config.pending_check_interval_ms);

        Ok(Self {
            questions: LocalQuestionStore::new(store),
            config,
            sync,
            mentor,
            _network_monitor: network_monitor,
            _pending_check: pending_check,
        })
    }

    pub fn sync(&self) -> SyncViewModel {
        self.sync.clone()
    }

    pub fn mentor(&self) -> Rc<MentorSession> {
        self.mentor.clone()
    }

    pub fn questions(&self) -> &LocalQuestionStore {
        &self.questions
    }

    pub fn flash_ms(&self) -> u32 {
        self.config.sync_config.synced_flash_ms
    }

    pub fn chat_context(current_view: String, edital_loaded: Option<String>, session_active: bool) -> ChatContext {
        ChatContext {
            current_view,
            edital_loaded,
            session_active,
        }
    }
}

/// Tras un sync completo, apagar el indicador "sincronizado" al vencer
pub fn schedule_flash_expiry(sync: &SyncViewModel, outcome: &SyncOutcome, flash_ms: u32) {
    if let SyncOutcome::Synced { .. } = outcome {
        let sync = sync.clone();
        Timeout::new(flash_ms, move || sync.expire_flash()).forget();
    }
}
