use serde::{Deserialize, Serialize};
use crate::utils::constants::{PRO_COMMAND_PREFIXES, PRO_LENGTH_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentorRole {
    Student,
    Mentor,
}

impl MentorRole {
    /// Rol en el formato del servicio remoto (user/model alternados)
    pub fn wire_role(&self) -> &'static str {
        match self {
            MentorRole::Student => "user",
            MentorRole::Mentor => "model",
        }
    }
}

/// Un turno de la conversación. El turno del mentor crece en el sitio
/// mientras llegan fragmentos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorMessage {
    pub role: MentorRole,
    pub content: String,
    pub timestamp: i64,
}

impl MentorMessage {
    pub fn student(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: MentorRole::Student,
            content: content.into(),
            timestamp,
        }
    }

    /// Placeholder vacío del mentor, se rellena con el stream
    pub fn mentor_placeholder(timestamp: i64) -> Self {
        Self {
            role: MentorRole::Mentor,
            content: String::new(),
            timestamp,
        }
    }
}

/// Metadatos efímeros de la petición, se reconstruyen en cada mensaje
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub current_view: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edital_loaded: Option<String>,
    pub session_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub parts: Vec<HistoryPart>,
}

impl HistoryEntry {
    /// Convertir la transcripción al formato del servicio.
    /// Se envían pares pregunta/respuesta para que los roles alternen: un
    /// turno del estudiante cuya respuesta quedó vacía (cancelada antes del
    /// primer fragmento) se descarta junto con ella.
    pub fn from_transcript(messages: &[MentorMessage]) -> Vec<HistoryEntry> {
        let mut history = Vec::with_capacity(messages.len());
        let mut turns = messages.iter().peekable();

        while let Some(message) = turns.next() {
            match message.role {
                MentorRole::Student => {
                    let reply = turns.next_if(|next| next.role == MentorRole::Mentor);
                    match reply {
                        Some(reply) if !reply.content.is_empty() && !message.content.is_empty() => {
                            history.push(HistoryEntry::from_message(message));
                            history.push(HistoryEntry::from_message(reply));
                        }
                        _ => {}
                    }
                }
                MentorRole::Mentor if !message.content.is_empty() => {
                    history.push(HistoryEntry::from_message(message));
                }
                MentorRole::Mentor => {}
            }
        }
        history
    }

    fn from_message(message: &MentorMessage) -> HistoryEntry {
        HistoryEntry {
            role: message.role.wire_role().to_string(),
            parts: vec![HistoryPart {
                text: message.content.clone(),
            }],
        }
    }
}

/// Body del POST al endpoint de chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    pub context: ChatContext,
    pub use_pro_model: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Standard,
    Pro,
}

impl ModelTier {
    /// Clasificador determinista: comando conocido o texto largo → Pro
    pub fn for_message(text: &str) -> Self {
        if should_use_pro(text) {
            ModelTier::Pro
        } else {
            ModelTier::Standard
        }
    }

    pub fn is_pro(&self) -> bool {
        matches!(self, ModelTier::Pro)
    }
}

/// true si el texto (trim + minúsculas) empieza por un comando de análisis
/// o si la entrada cruda supera el umbral de longitud
pub fn should_use_pro(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    let is_command = PRO_COMMAND_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix));

    is_command || text.chars().count() > PRO_LENGTH_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_select_pro_tier_case_insensitively() {
        assert!(should_use_pro("/analisar meu simulado"));
        assert!(should_use_pro("  /EXPLICAR crase"));
        assert!(should_use_pro("/Autopsia da prova"));
        assert!(should_use_pro("/plano"));
        assert!(should_use_pro("/material de direito"));
        assert_eq!(ModelTier::for_message("/plano semanal"), ModelTier::Pro);
    }

    #[test]
    fn long_text_selects_pro_tier() {
        let exact = "a".repeat(200);
        let longer = "a".repeat(201);
        assert!(!should_use_pro(&exact));
        assert!(should_use_pro(&longer));
    }

    #[test]
    fn plain_short_text_uses_standard_tier() {
        assert_eq!(
            ModelTier::for_message("Explique decadência administrativa"),
            ModelTier::Standard
        );
        assert!(!should_use_pro("o que é /analisar?"));
        assert!(!should_use_pro("/ajuda"));
    }

    #[test]
    fn history_drops_unanswered_turn_with_its_empty_reply() {
        let transcript = vec![
            MentorMessage::student("Oi", 1),
            // Cancelada antes del primer fragmento
            MentorMessage::mentor_placeholder(2),
            MentorMessage::student("De novo", 3),
            MentorMessage {
                role: MentorRole::Mentor,
                content: "Olá!".to_string(),
                timestamp: 4,
            },
        ];

        let history = HistoryEntry::from_transcript(&transcript);
        let roles: Vec<_> = history.iter().map(|h| h.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "model"]);
        assert_eq!(history[0].parts[0].text, "De novo");
        assert_eq!(history[1].parts[0].text, "Olá!");
    }

    #[test]
    fn request_serializes_with_wire_field_names() {
        let request = ChatRequest {
            message: "Oi".to_string(),
            history: vec![],
            context: ChatContext {
                current_view: "dashboard".to_string(),
                edital_loaded: None,
                session_active: true,
            },
            use_pro_model: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["useProModel"], false);
        assert_eq!(json["context"]["currentView"], "dashboard");
        assert_eq!(json["context"]["sessionActive"], true);
        assert!(json["context"].get("editalLoaded").is_none());
    }
}
