// ============================================================================
// BACKGROUND SYNC - Registro de tareas en el service worker instalado
// ============================================================================
// Capacidad opcional: si el navegador no tiene SyncManager, la cola solo se
// reintenta en primer plano (eventos online + chequeo periódico).
// ============================================================================

use futures::future::LocalBoxFuture;
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use crate::errors::SyncError;

pub trait BackgroundSyncRegistrar {
    fn is_available(&self) -> bool;
    fn register<'a>(&'a self, tag: &'a str) -> LocalBoxFuture<'a, Result<(), SyncError>>;
}

/// navigator.serviceWorker.ready → registration.sync.register(tag)
#[derive(Clone, Copy, Default)]
pub struct ServiceWorkerRegistrar;

impl ServiceWorkerRegistrar {
    pub fn new() -> Self {
        Self
    }

    async fn register_tag(tag: &str) -> Result<(), SyncError> {
        let window = web_sys::window().ok_or(SyncError::Unsupported)?;
        let container = Reflect::get(&window.navigator(), &JsValue::from_str("serviceWorker"))
            .map_err(|_| SyncError::Unsupported)?;
        if container.is_undefined() {
            return Err(SyncError::Unsupported);
        }

        let ready = Reflect::get(&container, &JsValue::from_str("ready"))
            .map_err(js_error)?
            .dyn_into::<Promise>()
            .map_err(js_error)?;
        let registration = JsFuture::from(ready).await.map_err(js_error)?;

        let sync = Reflect::get(&registration, &JsValue::from_str("sync")).map_err(js_error)?;
        if sync.is_undefined() {
            return Err(SyncError::Unsupported);
        }

        let register = Reflect::get(&sync, &JsValue::from_str("register"))
            .map_err(js_error)?
            .dyn_into::<Function>()
            .map_err(js_error)?;
        let promise = register
            .call1(&sync, &JsValue::from_str(tag))
            .map_err(js_error)?
            .dyn_into::<Promise>()
            .map_err(js_error)?;
        JsFuture::from(promise).await.map_err(js_error)?;

        log::info!("🔁 [BG-SYNC] Tag '{}' registrado en el service worker", tag);
        Ok(())
    }
}

impl BackgroundSyncRegistrar for ServiceWorkerRegistrar {
    fn is_available(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let has_sw = Reflect::has(&window.navigator(), &JsValue::from_str("serviceWorker"))
            .unwrap_or(false);
        let has_sync = Reflect::has(&window, &JsValue::from_str("SyncManager"))
            .unwrap_or(false);
        has_sw && has_sync
    }

    fn register<'a>(&'a self, tag: &'a str) -> LocalBoxFuture<'a, Result<(), SyncError>> {
        Box::pin(Self::register_tag(tag))
    }
}

/// Sin Background Sync: solo reintentos en primer plano
#[derive(Clone, Copy, Default)]
pub struct ForegroundOnly;

impl BackgroundSyncRegistrar for ForegroundOnly {
    fn is_available(&self) -> bool {
        false
    }

    fn register<'a>(&'a self, _tag: &'a str) -> LocalBoxFuture<'a, Result<(), SyncError>> {
        Box::pin(async { Err(SyncError::Unsupported) })
    }
}

fn js_error(value: JsValue) -> SyncError {
    SyncError::Registration(format!("{:?}", value))
}
