// ============================================================================
// ESTUDO PWA - NÚCLEO OFFLINE-FIRST (RUST PURO)
// ============================================================================
// - Models: estructuras serializables (cola, mensajes, questões)
// - Services: storage, HTTP, service worker, red
// - State: Rc<RefCell> + subscribers
// - ViewModels: cola offline y sesión del mentor
// - Views: funciones que pintan DOM (sin lógica)
// ============================================================================

pub mod errors;
pub mod config;
pub mod models;
pub mod services;
pub mod state;
pub mod viewmodels;
pub mod views;
pub mod dom;
pub mod utils;
pub mod app;

use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use crate::app::{schedule_flash_expiry, App};
use crate::config::AppConfig;
use crate::models::question::Question;
use crate::services::QuestionStore;
use crate::viewmodels::DispatchOutcome;

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let config = AppConfig::from_env();
    wasm_logger::init(wasm_logger::Config::new(config.log_level()));
    log::info!("🚀 Estudo PWA - núcleo offline + mentor");

    let app = App::new(config)?;
    APP.with(|cell| *cell.borrow_mut() = Some(app));
    Ok(())
}

fn with_app<R>(f: impl FnOnce(&App) -> R) -> Result<R, JsValue> {
    APP.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(f)
            .ok_or_else(|| JsValue::from_str("App no inicializada"))
    })
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ==========================================
// COLA OFFLINE
// ==========================================

/// Acción del usuario (p. ej. responder una questão). Se envía ya si hay red,
/// si no queda en la cola persistente.
#[wasm_bindgen]
pub fn submit_study_action(kind: String, payload_json: &str) -> Result<(), JsValue> {
    let payload: serde_json::Value = serde_json::from_str(payload_json).map_err(js_err)?;
    let (sync, flash_ms) = with_app(|app| (app.sync(), app.flash_ms()))?;

    spawn_local(async move {
        match sync.dispatch_action(&kind, payload).await {
            Ok(DispatchOutcome::Sent) => log::debug!("📤 [APP] Acción '{}' enviada", kind),
            Ok(DispatchOutcome::Queued { pending_count }) => {
                log::info!("📥 [APP] Acción '{}' en cola ({} pendientes)", kind, pending_count);
                if sync.state().is_online {
                    let outcome = sync.sync_pending().await;
                    schedule_flash_expiry(&sync, &outcome, flash_ms);
                }
            }
            Err(e) => log::error!("❌ [APP] No se pudo guardar la acción '{}': {}", kind, e),
        }
    });
    Ok(())
}

#[wasm_bindgen]
pub fn dismiss_offline_banner() -> Result<(), JsValue> {
    with_app(|app| app.sync().dismiss_banner())
}

#[wasm_bindgen]
pub fn pending_action_count() -> Result<usize, JsValue> {
    with_app(|app| app.sync().state().pending_count)
}

#[wasm_bindgen]
pub fn requeue_quarantined_actions() -> Result<usize, JsValue> {
    with_app(|app| app.sync().requeue_quarantined())?.map_err(js_err)
}

// ==========================================
// MENTOR
// ==========================================

#[wasm_bindgen]
pub fn send_mentor_message(
    text: String,
    current_view: String,
    edital_loaded: Option<String>,
    session_active: bool,
) -> Result<(), JsValue> {
    let mentor = with_app(|app| app.mentor())?;
    let context = App::chat_context(current_view, edital_loaded, session_active);

    spawn_local(async move {
        let outcome = mentor.send_message(&text, context).await;
        log::debug!("🧠 [APP] Envío al mentor: {:?}", outcome);
    });
    Ok(())
}

/// `options_json`: array JSON con el texto de cada alternativa
#[wasm_bindgen]
pub fn ask_mentor_about_question(
    question: String,
    options_json: &str,
    correct_index: usize,
    user_index: Option<usize>,
    current_view: String,
    session_active: bool,
) -> Result<(), JsValue> {
    let options: Vec<String> = serde_json::from_str(options_json).map_err(js_err)?;
    let mentor = with_app(|app| app.mentor())?;
    let context = App::chat_context(current_view, None, session_active);

    spawn_local(async move {
        let outcome = mentor
            .ask_about_question(&question, &options, correct_index, user_index, context)
            .await;
        log::debug!("🧠 [APP] Pregunta sobre questão: {:?}", outcome);
    });
    Ok(())
}

#[wasm_bindgen]
pub fn cancel_mentor_reply() -> Result<(), JsValue> {
    with_app(|app| app.mentor().cancel())
}

#[wasm_bindgen]
pub fn clear_mentor_messages() -> Result<(), JsValue> {
    with_app(|app| app.mentor().clear_messages())
}

#[wasm_bindgen]
pub fn set_mentor_open(open: bool) -> Result<(), JsValue> {
    with_app(|app| app.mentor().set_open(open))
}

// ==========================================
// BANCO DE QUESTÕES
// ==========================================

#[wasm_bindgen]
pub fn import_questions(questions_json: &str) -> Result<usize, JsValue> {
    let questions: Vec<Question> = serde_json::from_str(questions_json).map_err(js_err)?;
    with_app(|app| app.questions().bulk_import(questions))?.map_err(js_err)
}

#[wasm_bindgen]
pub fn question_count(subject: Option<String>) -> Result<usize, JsValue> {
    with_app(|app| match subject {
        Some(subject) => app.questions().count_by_subject(&subject),
        None => app.questions().count(),
    })?
    .map_err(js_err)
}

#[wasm_bindgen]
pub fn clear_questions() -> Result<(), JsValue> {
    with_app(|app| app.questions().clear())?.map_err(js_err)
}
