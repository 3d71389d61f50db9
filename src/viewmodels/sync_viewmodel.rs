// ============================================================================
// SYNC VIEWMODEL - Conectividad + cola offline
// ============================================================================
// Mantiene el estado de red y garantiza que las acciones hechas sin conexión
// no se pierdan. La exclusión mutua es un flag (`is_syncing`) comprobado a la
// entrada: todo corre en un solo hilo cooperativo.
// ============================================================================

use std::rc::Rc;
use crate::config::SyncConfig;
use crate::errors::StorageError;
use crate::models::sync::{ConnectivityState, PendingAction};
use crate::services::{ActionSink, BackgroundSyncRegistrar, KeyValueStore, OfflineService};
use crate::state::ReactiveState;
use crate::utils::Clock;

/// Resultado de un intento de sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Cola vacía, nada que hacer
    Idle,
    Offline,
    AlreadySyncing,
    BackingOff { remaining_ms: i64 },
    Synced { replayed: usize },
    /// Todo lo replayado llegó, pero entraron acciones nuevas durante el intento
    MorePending { replayed: usize, pending: usize },
    Partial { replayed: usize, failed: usize, quarantined: usize },
    Failed { message: String },
}

/// Qué pasó con una acción del usuario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Queued { pending_count: usize },
}

/// Limpia `is_syncing` en cualquier salida, incluso si el future se descarta
struct SyncingGuard<'a> {
    state: &'a ReactiveState<ConnectivityState>,
}

impl<'a> SyncingGuard<'a> {
    fn acquire(state: &'a ReactiveState<ConnectivityState>) -> Self {
        state.update(|s| {
            s.is_syncing = true;
            s.last_error = None;
        });
        Self { state }
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.state.update(|s| s.is_syncing = false);
    }
}

#[derive(Clone)]
pub struct SyncViewModel {
    state: ReactiveState<ConnectivityState>,
    offline_service: OfflineService,
    sink: Rc<dyn ActionSink>,
    registrar: Rc<dyn BackgroundSyncRegistrar>,
    clock: Rc<dyn Clock>,
    config: SyncConfig,
}

impl SyncViewModel {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        sink: Rc<dyn ActionSink>,
        registrar: Rc<dyn BackgroundSyncRegistrar>,
        clock: Rc<dyn Clock>,
        config: SyncConfig,
        initially_online: bool,
    ) -> Self {
        let vm = Self {
            state: ReactiveState::new(ConnectivityState::new(initially_online)),
            offline_service: OfflineService::new(store),
            sink,
            registrar,
            clock,
            config,
        };
        vm.refresh_counts();
        vm
    }

    pub fn state(&self) -> ConnectivityState {
        self.state.snapshot()
    }

    pub fn subscribe<F: Fn() + 'static>(&self, callback: F) {
        self.state.subscribe(callback);
    }

    // ==========================================
    // TRANSICIONES DE RED
    // ==========================================

    pub fn handle_offline(&self) {
        log::warn!("📴 [SYNC] Sin conexión - las acciones irán a la cola");
        self.state.update(|s| {
            s.is_online = false;
            s.banner_visible = true;
        });
    }

    /// Vuelve la red: ocultar banner y reconciliar la cola.
    /// La transición online es evidencia fresca de red, ignora el backoff.
    pub async fn handle_online(&self) -> SyncOutcome {
        log::info!("🌐 [SYNC] Conexión restaurada - reconciliando cola");
        self.state.update(|s| {
            s.is_online = true;
            s.banner_visible = false;
        });
        self.run_sync(true).await
    }

    pub fn dismiss_banner(&self) {
        self.state.update(|s| s.banner_visible = false);
    }

    // ==========================================
    // ACCIONES DEL USUARIO
    // ==========================================

    /// Guardar una acción en la cola persistente (sin límite de tamaño)
    pub fn record_action(
        &self,
        kind: &str,
        payload: serde_json::Value,
    ) -> Result<PendingAction, StorageError> {
        let action = PendingAction::new(kind, payload, self.clock.now_ms());
        let count = match self.offline_service.append(action.clone()) {
            Ok(count) => count,
            Err(e) => {
                log::error!("❌ [SYNC] No se pudo guardar la acción '{}': {}", kind, e);
                self.state.update(|s| s.last_error = Some(e.to_string()));
                return Err(e);
            }
        };
        log::info!("📝 [SYNC] Acción '{}' en cola ({} pendientes)", kind, count);
        self.state.update(|s| s.pending_count = count);
        Ok(action)
    }

    /// Enviar ya si hay red y la cola no tiene nada delante; si no, encolar.
    /// Encolar detrás de pendientes mantiene el orden de las acciones.
    pub async fn dispatch_action(
        &self,
        kind: &str,
        payload: serde_json::Value,
    ) -> Result<DispatchOutcome, StorageError> {
        let snapshot = self.state.snapshot();
        if snapshot.is_online && snapshot.pending_count == 0 && !snapshot.is_syncing {
            let action = PendingAction::new(kind, payload.clone(), self.clock.now_ms());
            match self.sink.submit(&action).await {
                Ok(()) => return Ok(DispatchOutcome::Sent),
                Err(e) => log::warn!("⚠️ [SYNC] Envío directo falló, encolando: {}", e),
            }
        }

        self.record_action(kind, payload)?;
        Ok(DispatchOutcome::Queued {
            pending_count: self.state.with(|s| s.pending_count),
        })
    }

    // ==========================================
    // SINCRONIZACIÓN
    // ==========================================

    /// Intento de sync respetando el backoff
    pub async fn sync_pending(&self) -> SyncOutcome {
        self.run_sync(false).await
    }

    /// Chequeo periódico: releer la cola, apagar el indicador caducado y
    /// reintentar si toca
    pub async fn tick(&self) -> SyncOutcome {
        let pending = self.refresh_counts();
        self.expire_flash();

        let snapshot = self.state.snapshot();
        if !snapshot.is_online {
            return SyncOutcome::Offline;
        }
        if pending == 0 || snapshot.is_syncing {
            return SyncOutcome::Idle;
        }
        self.run_sync(false).await
    }

    async fn run_sync(&self, ignore_backoff: bool) -> SyncOutcome {
        let snapshot = self.state.snapshot();
        if !snapshot.is_online {
            return SyncOutcome::Offline;
        }
        if snapshot.is_syncing {
            log::info!("🔄 [SYNC] Sincronización ya en progreso, saltando...");
            return SyncOutcome::AlreadySyncing;
        }

        let queue = match self.offline_service.load_queue() {
            Ok(queue) => queue,
            Err(e) => {
                log::error!("❌ [SYNC] Error cargando queue: {}", e);
                return SyncOutcome::Failed { message: e.to_string() };
            }
        };

        if queue.is_empty() {
            self.state.update(|s| s.pending_count = 0);
            return SyncOutcome::Idle;
        }

        let now = self.clock.now_ms();
        if !ignore_backoff && !queue.should_retry(now, &self.config.backoff) {
            let remaining_ms = queue.backoff_remaining(now, &self.config.backoff);
            log::info!("⏳ [SYNC] Esperando backoff: {}ms restantes", remaining_ms);
            return SyncOutcome::BackingOff { remaining_ms };
        }

        let _guard = SyncingGuard::acquire(&self.state);
        log::info!("🔄 [SYNC] Procesando queue: {} acciones (intento {})",
                   queue.len(), queue.retry_count + 1);

        // Cada acción por separado: una que falla no bloquea a las demás
        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for action in &queue.actions {
            match self.sink.submit(action).await {
                Ok(()) => delivered.push(action.id.clone()),
                Err(e) => {
                    log::warn!("⚠️ [SYNC] Acción {} ({}) falló: {}", action.id, action.kind, e);
                    failed.push(action.id.clone());
                }
            }
        }

        let report = match self.offline_service.reconcile(
            &delivered,
            &failed,
            self.config.max_action_attempts,
            self.clock.now_ms(),
        ) {
            Ok(report) => report,
            Err(e) => {
                log::error!("❌ [SYNC] Error guardando queue actualizada: {}", e);
                self.state.update(|s| s.last_error = Some(e.to_string()));
                return SyncOutcome::Failed { message: e.to_string() };
            }
        };
        self.refresh_counts();

        if failed.is_empty() && report.remaining > 0 {
            log::info!("📥 [SYNC] {} enviadas; {} acciones nuevas llegaron durante el intento",
                       delivered.len(), report.remaining);
            return SyncOutcome::MorePending {
                replayed: delivered.len(),
                pending: report.remaining,
            };
        }

        if failed.is_empty() {
            let flash_until = self.clock.now_ms() + i64::from(self.config.synced_flash_ms);
            self.state.update(|s| {
                s.just_synced = true;
                s.flash_until = Some(flash_until);
            });
            log::info!("✅ [SYNC] Queue procesada: {} acciones enviadas", delivered.len());
            return SyncOutcome::Synced {
                replayed: delivered.len(),
            };
        }

        self.state.update(|s| {
            s.last_error = Some(format!("{} ações pendentes falharam", failed.len()));
        });

        if report.remaining > 0 && self.registrar.is_available() {
            if let Err(e) = self.registrar.register(&self.config.sync_tag).await {
                log::error!("❌ [SYNC] No se pudo registrar Background Sync: {}", e);
            }
        }

        log::warn!("⚠️ [SYNC] {} enviadas, {} fallidas, {} en cuarentena - reintentando más tarde",
                   delivered.len(), failed.len(), report.quarantined);
        SyncOutcome::Partial {
            replayed: delivered.len(),
            failed: failed.len(),
            quarantined: report.quarantined,
        }
    }

    /// Apagar el indicador "sincronizado" cuando vence su ventana
    pub fn expire_flash(&self) {
        let now = self.clock.now_ms();
        let expired = self
            .state
            .with(|s| s.just_synced && s.flash_until.map_or(true, |until| now >= until));
        if expired {
            self.state.update(|s| {
                s.just_synced = false;
                s.flash_until = None;
            });
        }
    }

    /// Releer tamaños persistidos; devuelve el número de pendientes
    pub fn refresh_counts(&self) -> usize {
        let pending = self.offline_service.pending_count().unwrap_or_else(|e| {
            log::error!("❌ [SYNC] Error leyendo queue: {}", e);
            0
        });
        let quarantined = self
            .offline_service
            .load_quarantine()
            .map(|q| q.len())
            .unwrap_or(0);

        let changed = self
            .state
            .with(|s| s.pending_count != pending || s.quarantined_count != quarantined);
        if changed {
            self.state.update(|s| {
                s.pending_count = pending;
                s.quarantined_count = quarantined;
            });
        }
        pending
    }

    // ==========================================
    // CUARENTENA
    // ==========================================

    pub fn quarantined(&self) -> Result<Vec<PendingAction>, StorageError> {
        self.offline_service.load_quarantine()
    }

    pub fn requeue_quarantined(&self) -> Result<usize, StorageError> {
        let moved = self.offline_service.requeue_quarantined()?;
        self.refresh_counts();
        Ok(moved)
    }

    pub fn clear_quarantine(&self) -> Result<(), StorageError> {
        self.offline_service.clear_quarantine()?;
        self.refresh_counts();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::collections::VecDeque;
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::future::LocalBoxFuture;
    use futures::task::LocalSpawnExt;
    use crate::models::sync::SyncPhase;
    use serde_json::json;
    use crate::errors::SyncError;
    use crate::services::MemoryStore;
    use crate::utils::constants::PENDING_QUEUE_KEY;
    use crate::utils::clock::ManualClock;

    /// Sink que falla para los kinds marcados
    #[derive(Default)]
    struct ScriptedSink {
        failing_kinds: RefCell<HashSet<String>>,
        submitted: RefCell<Vec<String>>,
    }

    impl ScriptedSink {
        fn fail_kind(&self, kind: &str) {
            self.failing_kinds.borrow_mut().insert(kind.to_string());
        }

        fn heal(&self) {
            self.failing_kinds.borrow_mut().clear();
        }
    }

    impl ActionSink for ScriptedSink {
        fn submit<'a>(&'a self, action: &'a PendingAction) -> LocalBoxFuture<'a, Result<(), SyncError>> {
            self.submitted.borrow_mut().push(action.kind.clone());
            let fails = self.failing_kinds.borrow().contains(&action.kind);
            Box::pin(async move {
                if fails {
                    Err(SyncError::Network("offline".to_string()))
                } else {
                    Ok(())
                }
            })
        }
    }

    #[derive(Default)]
    struct CountingRegistrar {
        available: bool,
        fails: bool,
        registered: Cell<usize>,
    }

    impl BackgroundSyncRegistrar for CountingRegistrar {
        fn is_available(&self) -> bool {
            self.available
        }

        fn register<'a>(&'a self, _tag: &'a str) -> LocalBoxFuture<'a, Result<(), SyncError>> {
            self.registered.set(self.registered.get() + 1);
            let fails = self.fails;
            Box::pin(async move {
                if fails {
                    Err(SyncError::Registration("sync.register rechazado".to_string()))
                } else {
                    Ok(())
                }
            })
        }
    }

    /// Sink que no responde hasta que el test abre su compuerta
    #[derive(Default)]
    struct GatedSink {
        gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
        submitted: RefCell<Vec<String>>,
    }

    impl ActionSink for GatedSink {
        fn submit<'a>(&'a self, action: &'a PendingAction) -> LocalBoxFuture<'a, Result<(), SyncError>> {
            self.submitted.borrow_mut().push(action.kind.clone());
            let gate = self.gates.borrow_mut().pop_front();
            Box::pin(async move {
                if let Some(gate) = gate {
                    gate.await.map_err(|_| SyncError::Network("compuerta cerrada".to_string()))?;
                }
                Ok(())
            })
        }
    }

    /// Sink que, al replayar la primera acción, simula otro handler
    /// escribiendo una acción nueva en la cola persistida
    struct AppendingSink {
        offline: OfflineService,
        appended: Cell<bool>,
    }

    impl ActionSink for AppendingSink {
        fn submit<'a>(&'a self, _action: &'a PendingAction) -> LocalBoxFuture<'a, Result<(), SyncError>> {
            if !self.appended.replace(true) {
                let late = PendingAction::new("late", json!(null), 0);
                if let Err(e) = self.offline.append(late) {
                    return Box::pin(async move { Err(SyncError::Storage(e)) });
                }
            }
            Box::pin(async { Ok(()) })
        }
    }

    fn vm_with(store: Rc<dyn KeyValueStore>, sink: Rc<dyn ActionSink>, online: bool) -> SyncViewModel {
        SyncViewModel::new(
            store,
            sink,
            Rc::new(CountingRegistrar::default()),
            Rc::new(ManualClock::at(0)),
            SyncConfig::default(),
            online,
        )
    }

    struct Fixture {
        vm: SyncViewModel,
        sink: Rc<ScriptedSink>,
        registrar: Rc<CountingRegistrar>,
        clock: Rc<ManualClock>,
    }

    fn fixture(online: bool) -> Fixture {
        let sink = Rc::new(ScriptedSink::default());
        let registrar = Rc::new(CountingRegistrar {
            available: true,
            ..CountingRegistrar::default()
        });
        let clock = Rc::new(ManualClock::at(1_000_000));
        let config = SyncConfig {
            max_action_attempts: 3,
            ..SyncConfig::default()
        };
        let vm = SyncViewModel::new(
            Rc::new(MemoryStore::new()),
            sink.clone(),
            registrar.clone(),
            clock.clone(),
            config,
            online,
        );
        Fixture { vm, sink, registrar, clock }
    }

    #[test]
    fn offline_actions_are_queued_and_replayed_on_reconnect() {
        let f = fixture(true);
        f.vm.handle_offline();
        assert!(f.vm.state().banner_visible);

        for n in 0..3 {
            f.vm.record_action("answer", json!({ "question": n })).unwrap();
        }
        assert_eq!(f.vm.state().pending_count, 3);

        let outcome = block_on(f.vm.handle_online());
        assert_eq!(outcome, SyncOutcome::Synced { replayed: 3 });

        let state = f.vm.state();
        assert_eq!(state.pending_count, 0);
        assert!(!state.is_syncing);
        assert!(!state.banner_visible);
        assert!(state.just_synced);

        // El indicador "sincronizado" se apaga a los 2000 ms
        f.clock.advance(1_999);
        f.vm.expire_flash();
        assert!(f.vm.state().just_synced);
        f.clock.advance(1);
        f.vm.expire_flash();
        assert!(!f.vm.state().just_synced);
    }

    #[test]
    fn empty_queue_sync_never_sets_flag() {
        let f = fixture(true);
        let flag_seen = Rc::new(Cell::new(false));
        let seen = flag_seen.clone();
        let observer = f.vm.clone();
        f.vm.subscribe(move || {
            if observer.state().is_syncing {
                seen.set(true);
            }
        });

        assert_eq!(block_on(f.vm.sync_pending()), SyncOutcome::Idle);
        assert_eq!(block_on(f.vm.sync_pending()), SyncOutcome::Idle);
        assert_eq!(f.vm.state().pending_count, 0);
        assert!(!flag_seen.get());
    }

    #[test]
    fn failed_actions_stay_queued_without_blocking_others() {
        let f = fixture(true);
        f.vm.handle_offline();
        f.vm.record_action("answer", json!(1)).unwrap();
        f.vm.record_action("poison", json!(2)).unwrap();
        f.vm.record_action("answer", json!(3)).unwrap();
        f.sink.fail_kind("poison");

        let outcome = block_on(f.vm.handle_online());
        assert_eq!(
            outcome,
            SyncOutcome::Partial { replayed: 2, failed: 1, quarantined: 0 }
        );
        let state = f.vm.state();
        assert_eq!(state.pending_count, 1);
        assert!(!state.is_syncing);
        assert!(!state.just_synced);
        assert!(state.last_error.is_some());
        assert_eq!(f.registrar.registered.get(), 1);
    }

    #[test]
    fn periodic_retry_respects_backoff_and_quarantines_poison() {
        let f = fixture(true);
        f.vm.handle_offline();
        f.vm.record_action("poison", json!(null)).unwrap();
        f.sink.fail_kind("poison");

        // Intento 1 (transición online, sin backoff)
        assert!(matches!(block_on(f.vm.handle_online()), SyncOutcome::Partial { .. }));

        // Dentro de la ventana de backoff el tick no reintenta
        f.clock.advance(10_000);
        assert_eq!(
            block_on(f.vm.tick()),
            SyncOutcome::BackingOff { remaining_ms: 20_000 }
        );

        // Intento 2 tras 30 s
        f.clock.advance(20_000);
        assert!(matches!(block_on(f.vm.tick()), SyncOutcome::Partial { quarantined: 0, .. }));

        // Intento 3 tras 60 s más → cuarentena
        f.clock.advance(60_000);
        assert_eq!(
            block_on(f.vm.tick()),
            SyncOutcome::Partial { replayed: 0, failed: 1, quarantined: 1 }
        );
        let state = f.vm.state();
        assert_eq!(state.pending_count, 0);
        assert_eq!(state.quarantined_count, 1);

        // Devolver a la cola y entregar
        f.sink.heal();
        assert_eq!(f.vm.requeue_quarantined().unwrap(), 1);
        assert_eq!(block_on(f.vm.tick()), SyncOutcome::Synced { replayed: 1 });
        assert_eq!(f.vm.state().quarantined_count, 0);
    }

    #[test]
    fn dispatch_sends_directly_when_online_and_queue_is_clear() {
        let f = fixture(true);
        let outcome = block_on(f.vm.dispatch_action("answer", json!({ "q": 1 }))).unwrap();
        assert_eq!(outcome, DispatchOutcome::Sent);
        assert_eq!(f.vm.state().pending_count, 0);

        f.sink.fail_kind("answer");
        let outcome = block_on(f.vm.dispatch_action("answer", json!({ "q": 2 }))).unwrap();
        assert_eq!(outcome, DispatchOutcome::Queued { pending_count: 1 });

        // Con cola no vacía se encola detrás, sin intentar envío directo
        f.sink.heal();
        let before = f.sink.submitted.borrow().len();
        let outcome = block_on(f.vm.dispatch_action("answer", json!({ "q": 3 }))).unwrap();
        assert_eq!(outcome, DispatchOutcome::Queued { pending_count: 2 });
        assert_eq!(f.sink.submitted.borrow().len(), before);
    }

    #[test]
    fn offline_sync_is_a_no_op() {
        let f = fixture(false);
        assert!(f.vm.state().banner_visible);
        f.vm.record_action("answer", json!(1)).unwrap();

        assert_eq!(block_on(f.vm.sync_pending()), SyncOutcome::Offline);
        assert_eq!(block_on(f.vm.tick()), SyncOutcome::Offline);
        assert_eq!(f.vm.state().pending_count, 1);
        assert!(f.sink.submitted.borrow().is_empty());

        f.vm.dismiss_banner();
        assert!(!f.vm.state().banner_visible);
    }

    #[test]
    fn tick_picks_up_actions_written_by_another_handler() {
        let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let sink = Rc::new(ScriptedSink::default());
        let vm = SyncViewModel::new(
            store.clone(),
            sink,
            Rc::new(CountingRegistrar::default()),
            Rc::new(ManualClock::at(0)),
            SyncConfig::default(),
            true,
        );

        // Otra pestaña/handler escribe directamente en la cola persistida
        OfflineService::new(store)
            .append(PendingAction::new("answer", json!(1), 0))
            .unwrap();
        assert_eq!(vm.state().pending_count, 0);

        assert_eq!(block_on(vm.tick()), SyncOutcome::Synced { replayed: 1 });
        assert_eq!(vm.state().pending_count, 0);
    }

    #[test]
    fn second_sync_while_one_is_running_is_skipped() {
        let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let sink = Rc::new(GatedSink::default());
        let (open_first, first_gate) = oneshot::channel();
        let (open_second, second_gate) = oneshot::channel();
        sink.gates.borrow_mut().extend([first_gate, second_gate]);

        let vm = vm_with(store, sink.clone(), false);
        vm.record_action("a", json!(1)).unwrap();
        vm.record_action("b", json!(2)).unwrap();

        let mut pool = LocalPool::new();
        let running = vm.clone();
        let handle = pool
            .spawner()
            .spawn_local_with_handle(async move { running.handle_online().await })
            .unwrap();
        pool.run_until_stalled();
        assert!(vm.state().is_syncing);

        assert_eq!(block_on(vm.handle_online()), SyncOutcome::AlreadySyncing);
        assert_eq!(block_on(vm.sync_pending()), SyncOutcome::AlreadySyncing);

        open_first.send(()).unwrap();
        open_second.send(()).unwrap();
        assert_eq!(pool.run_until(handle), SyncOutcome::Synced { replayed: 2 });

        assert_eq!(*sink.submitted.borrow(), vec!["a".to_string(), "b".to_string()]);
        assert!(!vm.state().is_syncing);
        assert_eq!(vm.state().pending_count, 0);
    }

    #[test]
    fn action_appended_during_sync_keeps_indicator_pending() {
        let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let sink = Rc::new(AppendingSink {
            offline: OfflineService::new(store.clone()),
            appended: Cell::new(false),
        });
        let vm = vm_with(store, sink, false);
        vm.record_action("first", json!(1)).unwrap();

        assert_eq!(
            block_on(vm.handle_online()),
            SyncOutcome::MorePending { replayed: 1, pending: 1 }
        );
        let state = vm.state();
        assert_eq!(state.pending_count, 1);
        assert!(!state.just_synced);
        assert_eq!(state.phase(), SyncPhase::Pending { count: 1 });

        // El siguiente chequeo entrega la acción tardía sin esperar backoff
        assert_eq!(block_on(vm.tick()), SyncOutcome::Synced { replayed: 1 });
        assert!(vm.state().just_synced);
    }

    #[test]
    fn registration_failure_is_logged_and_queue_kept() {
        let sink = Rc::new(ScriptedSink::default());
        sink.fail_kind("answer");
        let registrar = Rc::new(CountingRegistrar {
            available: true,
            fails: true,
            ..CountingRegistrar::default()
        });
        let vm = SyncViewModel::new(
            Rc::new(MemoryStore::new()),
            sink,
            registrar.clone(),
            Rc::new(ManualClock::at(0)),
            SyncConfig::default(),
            false,
        );
        vm.record_action("answer", json!(1)).unwrap();

        assert_eq!(
            block_on(vm.handle_online()),
            SyncOutcome::Partial { replayed: 0, failed: 1, quarantined: 0 }
        );
        assert_eq!(registrar.registered.get(), 1);
        let state = vm.state();
        assert_eq!(state.pending_count, 1);
        assert!(!state.is_syncing);
    }

    #[test]
    fn record_action_survives_list_shaped_and_corrupt_queues() {
        let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        store
            .set_item(PENDING_QUEUE_KEY, r#"[{"payload":{"q":1},"timestamp":5}]"#)
            .unwrap();
        let vm = vm_with(store.clone(), Rc::new(ScriptedSink::default()), false);
        assert_eq!(vm.state().pending_count, 1);

        vm.record_action("answer", json!({ "q": 2 })).unwrap();
        assert_eq!(vm.state().pending_count, 2);

        store.set_item(PENDING_QUEUE_KEY, "no es json").unwrap();
        vm.record_action("answer", json!({ "q": 3 })).unwrap();
        assert_eq!(vm.state().pending_count, 1);
        assert!(vm.state().last_error.is_none());

        assert_eq!(block_on(vm.handle_online()), SyncOutcome::Synced { replayed: 1 });
    }
}
