// ============================================================================
// MENTOR VIEWMODEL - Sesión de chat en streaming con el mentor
// ============================================================================
// Transcripción append-only + garantía single-flight. La respuesta del
// mentor es un único placeholder (siempre el último mensaje) que crece en el
// sitio con cada fragmento.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;
use futures::future::{AbortHandle, Abortable};
use futures::StreamExt;
use crate::models::mentor::{ChatContext, ChatRequest, HistoryEntry, MentorMessage, ModelTier};
use crate::services::ChatTransport;
use crate::state::{MentorState, ReactiveState};
use crate::utils::constants::MENTOR_ERROR_MESSAGE;
use crate::utils::Clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Completed,
    /// El stream falló; el placeholder tiene el mensaje de error
    Failed(String),
    Cancelled,
    RejectedEmpty,
    /// Ya hay un envío en vuelo (se rechaza, no se encola)
    RejectedBusy,
}

/// Limpia `is_streaming` en cualquier salida
struct StreamingGuard<'a> {
    state: &'a ReactiveState<MentorState>,
}

impl Drop for StreamingGuard<'_> {
    fn drop(&mut self) {
        self.state.update(|s| s.is_streaming = false);
    }
}

/// Sesión de conversación. Se inyecta explícitamente en las vistas que la
/// necesitan; no existe instancia global implícita.
pub struct MentorSession {
    state: ReactiveState<MentorState>,
    transport: Rc<dyn ChatTransport>,
    clock: Rc<dyn Clock>,
    abort_handle: RefCell<Option<AbortHandle>>,
}

impl MentorSession {
    pub fn new(transport: Rc<dyn ChatTransport>, clock: Rc<dyn Clock>) -> Self {
        Self {
            state: ReactiveState::new(MentorState::default()),
            transport,
            clock,
            abort_handle: RefCell::new(None),
        }
    }

    pub fn messages(&self) -> Vec<MentorMessage> {
        self.state.with(|s| s.messages.clone())
    }

    pub fn is_streaming(&self) -> bool {
        self.state.with(|s| s.is_streaming)
    }

    pub fn is_open(&self) -> bool {
        self.state.with(|s| s.is_open)
    }

    pub fn set_open(&self, open: bool) {
        self.state.update(|s| s.is_open = open);
    }

    pub fn subscribe<F: Fn() + 'static>(&self, callback: F) {
        self.state.subscribe(callback);
    }

    /// Vaciar la transcripción (sin confirmación ni undo)
    pub fn clear_messages(&self) {
        self.state.update(|s| s.messages.clear());
    }

    /// Dejar de consumir el stream en vuelo. Lo recibido se conserva.
    pub fn cancel(&self) {
        if let Some(handle) = self.abort_handle.borrow_mut().take() {
            log::info!("⏹️ [MENTOR] Stream cancelado");
            handle.abort();
        }
    }

    pub async fn send_message(&self, text: &str, context: ChatContext) -> SendOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SendOutcome::RejectedEmpty;
        }
        if self.is_streaming() {
            log::warn!("⚠️ [MENTOR] Envío rechazado: ya hay una respuesta en curso");
            return SendOutcome::RejectedBusy;
        }

        let now = self.clock.now_ms();
        let prior_len = self.state.update(|s| {
            let prior_len = s.messages.len();
            s.messages.push(MentorMessage::student(trimmed, now));
            s.is_streaming = true;
            s.is_open = true;
            s.messages.push(MentorMessage::mentor_placeholder(now));
            prior_len
        });
        let _guard = StreamingGuard { state: &self.state };

        let history = self
            .state
            .with(|s| HistoryEntry::from_transcript(&s.messages[..prior_len]));
        let tier = ModelTier::for_message(text);
        log::info!("🧠 [MENTOR] Modelo {:?} para mensaje de {} caracteres", tier, text.chars().count());

        let request = ChatRequest {
            message: trimmed.to_string(),
            history,
            context,
            use_pro_model: tier.is_pro(),
        };

        let (handle, registration) = AbortHandle::new_pair();
        *self.abort_handle.borrow_mut() = Some(handle);
        let mut fragments = Abortable::new(self.transport.stream_chat(request), registration);

        let mut outcome = SendOutcome::Completed;
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => self.state.update(|s| {
                    if let Some(last) = s.messages.last_mut() {
                        last.content.push_str(&fragment);
                    }
                }),
                Err(e) => {
                    log::error!("❌ [MENTOR] Error en el stream: {}", e);
                    self.state.update(|s| {
                        if let Some(last) = s.messages.last_mut() {
                            last.content = MENTOR_ERROR_MESSAGE.to_string();
                        }
                    });
                    outcome = SendOutcome::Failed(e.to_string());
                    break;
                }
            }
        }

        if fragments.is_aborted() && outcome == SendOutcome::Completed {
            outcome = SendOutcome::Cancelled;
        }
        self.abort_handle.borrow_mut().take();
        outcome
    }

    /// Pregunta sobre una questão concreta: arma el prompt y lo envía
    pub async fn ask_about_question(
        &self,
        question: &str,
        options: &[String],
        correct_index: usize,
        user_index: Option<usize>,
        context: ChatContext,
    ) -> SendOutcome {
        let prompt = build_question_prompt(question, options, correct_index, user_index);
        self.send_message(&prompt, context).await
    }
}

/// Letra de la alternativa: 0 → A, 1 → B...
fn option_letter(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

fn option_line(options: &[String], index: usize) -> Option<String> {
    options
        .get(index)
        .map(|text| format!("{}) {}", option_letter(index), text))
}

pub fn build_question_prompt(
    question: &str,
    options: &[String],
    correct_index: usize,
    user_index: Option<usize>,
) -> String {
    let mut prompt = format!("Questão: {}\n\nAlternativas:\n", question.trim());
    for index in 0..options.len() {
        if let Some(line) = option_line(options, index) {
            prompt.push_str(&line);
            prompt.push('\n');
        }
    }

    let gabarito = option_line(options, correct_index)
        .unwrap_or_else(|| option_letter(correct_index));
    prompt.push_str(&format!("\nGabarito: {}\n", gabarito));

    match user_index {
        Some(chosen) if chosen != correct_index => {
            let answer = option_line(options, chosen).unwrap_or_else(|| option_letter(chosen));
            prompt.push_str(&format!("Minha resposta: {}\n\n", answer));
            prompt.push_str(
                "Explique por que a minha resposta está errada e por que o gabarito está correto.",
            );
        }
        _ => {
            prompt.push('\n');
            prompt.push_str("Explique esta questão e os conceitos envolvidos em cada alternativa.");
        }
    }

    prompt
}
