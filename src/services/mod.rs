pub mod storage;
pub mod offline_service;
pub mod action_sink;
pub mod background_sync;
pub mod network_monitor;
pub mod sse;
pub mod chat_client;
pub mod question_store;

pub use storage::{open_store, KeyValueStore, LocalStore, MemoryStore};
pub use offline_service::{OfflineService, ReconcileReport};
pub use action_sink::{ActionSink, HttpActionSink};
pub use background_sync::{BackgroundSyncRegistrar, ForegroundOnly, ServiceWorkerRegistrar};
pub use network_monitor::{NetworkMonitor, NetworkStatus};
pub use chat_client::{ChatTransport, FragmentStream, HttpChatTransport};
pub use question_store::{LocalQuestionStore, QuestionStore};
