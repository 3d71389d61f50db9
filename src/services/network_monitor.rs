// ============================================================================
// MONITOR DE ESTADO DE RED
// ============================================================================
// Escucha los eventos online/offline de window durante su vida útil.
// Al hacer drop se quitan los listeners.
// ============================================================================

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Event, Window};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, NetworkStatus::Online)
    }
}

/// Estado actual según navigator.onLine (sin window → se asume online)
pub fn current_status() -> NetworkStatus {
    match window() {
        Some(w) if !w.navigator().on_line() => NetworkStatus::Offline,
        _ => NetworkStatus::Online,
    }
}

pub struct NetworkMonitor {
    window: Window,
    online_closure: Closure<dyn FnMut(Event)>,
    offline_closure: Closure<dyn FnMut(Event)>,
}

impl NetworkMonitor {
    /// Registrar listeners; el callback recibe cada transición
    pub fn start<F>(callback: F) -> Result<Self, JsValue>
    where
        F: Fn(NetworkStatus) + 'static,
    {
        let window = window().ok_or_else(|| JsValue::from_str("No window"))?;
        let callback = std::rc::Rc::new(callback);

        let online_closure = Closure::wrap(Box::new({
            let callback = callback.clone();
            move |_event: Event| {
                log::info!("🌐 [NETWORK] ONLINE");
                callback(NetworkStatus::Online);
            }
        }) as Box<dyn FnMut(Event)>);

        let offline_closure = Closure::wrap(Box::new({
            let callback = callback.clone();
            move |_event: Event| {
                log::warn!("📴 [NETWORK] OFFLINE");
                callback(NetworkStatus::Offline);
            }
        }) as Box<dyn FnMut(Event)>);

        window.add_event_listener_with_callback("online", online_closure.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("offline", offline_closure.as_ref().unchecked_ref())?;

        log::info!("✅ [NETWORK] Listeners registrados");

        Ok(Self {
            window,
            online_closure,
            offline_closure,
        })
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            "online",
            self.online_closure.as_ref().unchecked_ref(),
        );
        let _ = self.window.remove_event_listener_with_callback(
            "offline",
            self.offline_closure.as_ref().unchecked_ref(),
        );
        log::info!("🔌 [NETWORK] Listeners eliminados");
    }
}
