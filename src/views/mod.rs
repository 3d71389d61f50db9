// ============================================================================
// VIEWS - Funciones que pintan DOM (sin lógica)
// ============================================================================

pub mod connectivity_indicator;
pub mod mentor_panel;

pub use connectivity_indicator::*;
pub use mentor_panel::*;
