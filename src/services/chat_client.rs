// ============================================================================
// CHAT CLIENT - Stream del endpoint del mentor (SOLO comunicación HTTP)
// ============================================================================

use futures::stream::{self, LocalBoxStream};
use gloo_net::http::Request;
use js_sys::{Reflect, Uint8Array};
use serde::Deserialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;
use crate::errors::ChatError;
use crate::models::mentor::ChatRequest;
use crate::services::sse::{details_to_string, SseDecoder, SseItem};

/// Secuencia perezosa, finita y no reiniciable de fragmentos de texto
pub type FragmentStream = LocalBoxStream<'static, Result<String, ChatError>>;

pub trait ChatTransport {
    fn stream_chat(&self, request: ChatRequest) -> FragmentStream;
}

/// Body de error de una respuesta no-2xx
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct HttpChatTransport {
    url: String,
}

impl HttpChatTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

enum ReadState {
    Connect { url: String, request: ChatRequest },
    Read { reader: ReadableStreamDefaultReader, decoder: SseDecoder },
    Finished,
}

impl ChatTransport for HttpChatTransport {
    fn stream_chat(&self, request: ChatRequest) -> FragmentStream {
        let initial = ReadState::Connect {
            url: self.url.clone(),
            request,
        };

        let fragments = stream::unfold(initial, |state| async move {
            let mut state = state;
            loop {
                state = match state {
                    ReadState::Finished => return None,
                    ReadState::Connect { url, request } => match open_stream(&url, &request).await {
                        Ok(reader) => ReadState::Read {
                            reader,
                            decoder: SseDecoder::new(),
                        },
                        Err(e) => return Some((Err(e), ReadState::Finished)),
                    },
                    ReadState::Read { reader, mut decoder } => {
                        // Vaciar lo ya decodificado antes de leer más bytes
                        match decoder.next_item() {
                            Some(SseItem::Text(text)) => {
                                return Some((Ok(text), ReadState::Read { reader, decoder }));
                            }
                            Some(SseItem::Done) => {
                                let _ = reader.cancel();
                                return None;
                            }
                            Some(SseItem::Error(e)) => {
                                let _ = reader.cancel();
                                return Some((Err(e), ReadState::Finished));
                            }
                            None if decoder.is_done() => return None,
                            None => {}
                        }

                        match read_chunk(&reader).await {
                            Ok(Some(bytes)) => {
                                decoder.push(&bytes);
                                ReadState::Read { reader, decoder }
                            }
                            Ok(None) => {
                                decoder.finish();
                                match decoder.next_item() {
                                    Some(SseItem::Text(text)) => {
                                        return Some((Ok(text), ReadState::Finished));
                                    }
                                    Some(SseItem::Error(e)) => {
                                        return Some((Err(e), ReadState::Finished));
                                    }
                                    _ => return None,
                                }
                            }
                            Err(e) => return Some((Err(e), ReadState::Finished)),
                        }
                    }
                };
            }
        });

        Box::pin(fragments)
    }
}

/// POST + validación del status; devuelve el reader del body
async fn open_stream(url: &str, request: &ChatRequest) -> Result<ReadableStreamDefaultReader, ChatError> {
    log::info!("📤 [CHAT] Enviando mensaje ({} turnos de historial, pro={})",
               request.history.len(), request.use_pro_model);

    let response = Request::post(url)
        .header("Accept", "text/event-stream")
        .json(request)
        .map_err(|e| ChatError::Network(format!("Request build error: {}", e)))?
        .send()
        .await
        .map_err(|e| ChatError::Network(e.to_string()))?;

    if !response.ok() {
        let status = response.status();
        let (error, details) = match response.json::<ErrorPayload>().await {
            Ok(payload) => (payload.error, payload.details.map(details_to_string)),
            Err(_) => (response.status_text(), None),
        };
        log::error!("❌ [CHAT] HTTP {}: {}", status, error);
        return Err(ChatError::Http { status, error, details });
    }

    let body = response
        .body()
        .ok_or_else(|| ChatError::Network("respuesta sin body".to_string()))?;

    Ok(body.get_reader().unchecked_into::<ReadableStreamDefaultReader>())
}

/// reader.read() → Some(bytes) o None al final del body
async fn read_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<Vec<u8>>, ChatError> {
    let result = JsFuture::from(reader.read())
        .await
        .map_err(|e| ChatError::Network(format!("{:?}", e)))?;

    let done = Reflect::get(&result, &JsValue::from_str("done"))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    if done {
        return Ok(None);
    }

    let value = Reflect::get(&result, &JsValue::from_str("value"))
        .map_err(|e| ChatError::Network(format!("{:?}", e)))?;
    Ok(Some(Uint8Array::new(&value).to_vec()))
}
