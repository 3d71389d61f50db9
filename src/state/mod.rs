// ============================================================================
// STATE MODULE - State Management con Rc<RefCell> + notificaciones
// ============================================================================

pub mod reactivity;
pub mod mentor_state;

pub use reactivity::*;
pub use mentor_state::*;
