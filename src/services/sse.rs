//! Decodificador incremental del stream `text/event-stream` del mentor.
//!
//! El servidor envía líneas `data: {"text": "..."}` y termina con
//! `data: [DONE]`. Un evento `{"error": ..., "details": ...}` corta el stream.

use serde::Deserialize;
use crate::errors::ChatError;
use crate::utils::constants::SSE_DONE_SENTINEL;

/// Elemento decodificado del stream
#[derive(Debug)]
pub enum SseItem {
    Text(String),
    Done,
    Error(ChatError),
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Acumula bytes y emite elementos por línea completa.
/// Solo decodifica UTF-8 sobre líneas enteras, así un carácter multibyte
/// partido entre dos chunks no rompe nada.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        if !self.done {
            self.buffer.extend_from_slice(bytes);
        }
    }

    /// Fin del body: la última línea puede no tener salto final
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() && !self.buffer.ends_with(b"\n") {
            self.buffer.push(b'\n');
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Siguiente elemento con contenido, o None si hace falta más input
    pub fn next_item(&mut self) -> Option<SseItem> {
        while !self.done {
            let pos = self.buffer.iter().position(|b| *b == b'\n')?;
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let line = match String::from_utf8(line) {
                Ok(line) => line,
                Err(_) => {
                    self.done = true;
                    return Some(SseItem::Error(ChatError::InvalidUtf8));
                }
            };

            if let Some(item) = self.process_line(&line) {
                return Some(item);
            }
        }
        None
    }

    fn process_line(&mut self, line: &str) -> Option<SseItem> {
        // Comentarios (keep-alive), líneas vacías y campos que no son data
        let data = line.strip_prefix("data:")?;
        let data = data.strip_prefix(' ').unwrap_or(data).trim_end();
        if data.is_empty() {
            return None;
        }

        if data == SSE_DONE_SENTINEL {
            self.done = true;
            self.buffer.clear();
            return Some(SseItem::Done);
        }

        match serde_json::from_str::<StreamPayload>(data) {
            Ok(StreamPayload { error: Some(error), details, .. }) => {
                self.done = true;
                Some(SseItem::Error(ChatError::Remote {
                    error,
                    details: details.map(details_to_string),
                }))
            }
            Ok(StreamPayload { text: Some(text), .. }) if !text.is_empty() => Some(SseItem::Text(text)),
            Ok(_) => None,
            Err(_) => {
                self.done = true;
                Some(SseItem::Error(ChatError::MalformedEvent(data.to_string())))
            }
        }
    }
}

pub(crate) fn details_to_string(details: serde_json::Value) -> String {
    match details {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
