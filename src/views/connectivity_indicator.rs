// ============================================================================
// CONNECTIVITY INDICATOR VIEW - Banner offline / estado de la cola
// ============================================================================

use wasm_bindgen::prelude::*;
use crate::dom::{get_element_by_id, set_text_content, toggle_class};
use crate::models::sync::{ConnectivityState, SyncPhase};
use crate::utils::i18n::{t, t_count};

pub const INDICATOR_ID: &str = "connectivity-indicator";

/// Qué mostrar en el indicador (None = oculto)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorView {
    pub text: String,
    pub class: &'static str,
}

pub fn indicator_view(state: &ConnectivityState, lang: &str) -> Option<IndicatorView> {
    match state.phase() {
        SyncPhase::Idle => None,
        SyncPhase::Offline { pending_count, banner_visible: true } => Some(IndicatorView {
            text: if pending_count > 0 {
                t_count("offline_pending", lang, pending_count)
            } else {
                t("offline", lang)
            },
            class: "connectivity--offline",
        }),
        // Banner descartado: solo queda el contador si hay pendientes
        SyncPhase::Offline { pending_count, banner_visible: false } if pending_count > 0 => {
            Some(IndicatorView {
                text: t_count("pending", lang, pending_count),
                class: "connectivity--pending",
            })
        }
        SyncPhase::Offline { .. } => None,
        SyncPhase::Pending { count } => Some(IndicatorView {
            text: t_count("pending", lang, count),
            class: "connectivity--pending",
        }),
        SyncPhase::Syncing => Some(IndicatorView {
            text: t("syncing", lang),
            class: "connectivity--syncing",
        }),
        SyncPhase::JustSynced => Some(IndicatorView {
            text: t("synced", lang),
            class: "connectivity--synced",
        }),
    }
}

/// Pintar el indicador en #connectivity-indicator (si existe)
pub fn render_connectivity_indicator(state: &ConnectivityState, lang: &str) -> Result<(), JsValue> {
    let Some(element) = get_element_by_id(INDICATOR_ID) else {
        return Ok(());
    };

    let view = indicator_view(state, lang);
    toggle_class(&element, "hidden", view.is_none())?;
    for class in [
        "connectivity--offline",
        "connectivity--pending",
        "connectivity--syncing",
        "connectivity--synced",
    ] {
        toggle_class(&element, class, view.as_ref().map_or(false, |v| v.class == class))?;
    }
    set_text_content(&element, view.as_ref().map_or("", |v| v.text.as_str()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_banner_shows_pending_count() {
        let mut state = ConnectivityState::new(false);
        state.pending_count = 3;
        let view = indicator_view(&state, "pt").unwrap();
        assert_eq!(view.text, "Você está offline (3 pendentes)");
        assert_eq!(view.class, "connectivity--offline");
    }

    #[test]
    fn dismissed_banner_hides_unless_pending() {
        let mut state = ConnectivityState::new(false);
        state.banner_visible = false;
        assert_eq!(indicator_view(&state, "pt"), None);

        state.pending_count = 1;
        assert_eq!(indicator_view(&state, "pt").unwrap().class, "connectivity--pending");
    }

    #[test]
    fn online_phases_map_to_labels() {
        let mut state = ConnectivityState::new(true);
        assert_eq!(indicator_view(&state, "pt"), None);

        state.just_synced = true;
        assert_eq!(indicator_view(&state, "en").unwrap().text, "Synced");

        state.is_syncing = true;
        assert_eq!(indicator_view(&state, "pt").unwrap().text, "Sincronizando...");
    }
}
