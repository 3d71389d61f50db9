use crate::models::mentor::MentorMessage;

/// Estado observable de la conversación con el mentor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MentorState {
    pub messages: Vec<MentorMessage>,
    /// Guard single-flight: un solo envío en vuelo
    pub is_streaming: bool,
    /// Consola/sidebar del mentor abierta
    pub is_open: bool,
}
