pub mod sync;
pub mod mentor;
pub mod question;

pub use sync::{BackoffPolicy, ConnectivityState, PendingAction, PendingQueue, SyncPhase};
pub use mentor::{ChatContext, ChatRequest, HistoryEntry, HistoryPart, MentorMessage, MentorRole, ModelTier};
pub use question::{Question, QuestionFilter};
