// ============================================================================
// VIEWMODELS - Estado + lógica (sin DOM)
// ============================================================================

pub mod sync_viewmodel;
pub mod mentor_viewmodel;

pub use sync_viewmodel::{DispatchOutcome, SyncOutcome, SyncViewModel};
pub use mentor_viewmodel::{build_question_prompt, MentorSession, SendOutcome};
