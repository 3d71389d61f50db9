// ============================================================================
// MENTOR PANEL VIEW - Transcripción del chat en el sidebar
// ============================================================================

use wasm_bindgen::prelude::*;
use crate::dom::{append_child, clear_children, get_element_by_id, toggle_class, ElementBuilder};
use crate::models::mentor::{MentorMessage, MentorRole};
use crate::utils::i18n::t;

pub const PANEL_ID: &str = "mentor-panel";
pub const MESSAGES_ID: &str = "mentor-messages";

/// Re-render completo de la lista de mensajes
pub fn render_mentor_panel(
    messages: &[MentorMessage],
    is_open: bool,
    is_streaming: bool,
    lang: &str,
) -> Result<(), JsValue> {
    if let Some(panel) = get_element_by_id(PANEL_ID) {
        toggle_class(&panel, "mentor-panel--open", is_open)?;
        toggle_class(&panel, "mentor-panel--streaming", is_streaming)?;
    }

    let Some(list) = get_element_by_id(MESSAGES_ID) else {
        return Ok(());
    };
    clear_children(&list);

    let last = messages.len().saturating_sub(1);
    for (index, message) in messages.iter().enumerate() {
        let (author, class) = match message.role {
            MentorRole::Student => (t("voce", lang), "mentor-message mentor-message--student"),
            MentorRole::Mentor => (t("mentor", lang), "mentor-message mentor-message--mentor"),
        };

        // Placeholder vacío mientras llega el primer fragmento
        let body = if message.content.is_empty() && is_streaming && index == last {
            t("digitando", lang)
        } else {
            message.content.clone()
        };

        let item = ElementBuilder::new("div")?
            .class(class)
            .attr("data-timestamp", &message.timestamp.to_string())?
            .child(ElementBuilder::new("span")?.class("mentor-message__author").text(&author).build())?
            .child(ElementBuilder::new("p")?.class("mentor-message__content").text(&body).build())?
            .build();
        append_child(&list, &item)?;
    }

    list.set_scroll_top(list.scroll_height());
    Ok(())
}
