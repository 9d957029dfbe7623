//! Upstream event streams re-encoded as chat-completion chunks.
//!
//! A [`Reencoder`] is a small state machine fed one decoded upstream frame at
//! a time. [`reencode_stream`] drives it from a live byte stream, pulling the
//! next upstream bytes only when the previous chunk has been taken.

pub mod assemble;
pub mod chunk;

pub use assemble::assemble_completion;
pub use chunk::{ChunkChoice, ChunkDelta, ClientChunk, FunctionDelta, ToolCallDelta};

use crate::config::ProtocolType;
use crate::wire::decode::{self, StreamDecodeError};
use crate::wire::{FinishReason, UpstreamEvent};
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    AwaitingStart,
    StreamingContent,
    Finished,
    Errored,
}

#[derive(Debug, Clone)]
pub struct StreamState {
    pub response_id: Option<String>,
    pub created_at: i64,
    pub phase: StreamPhase,
    pub emitted_any: bool,
}

/// `chatcmpl-<unix millis>-<8 hex>`: ids sort by creation time and the
/// random tail keeps ids minted in the same millisecond apart.
pub fn new_response_id() -> String {
    let tail = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "chatcmpl-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        &tail[..8]
    )
}

pub struct Reencoder {
    protocol: ProtocolType,
    model: String,
    state: StreamState,
    /// Upstream tool slot to the client's zero-based `tool_calls[].index`.
    tool_slots: HashMap<u64, u32>,
}

impl Reencoder {
    pub fn new(protocol: ProtocolType, model: impl Into<String>) -> Self {
        Self {
            protocol,
            model: model.into(),
            state: StreamState {
                response_id: None,
                created_at: 0,
                phase: StreamPhase::AwaitingStart,
                emitted_any: false,
            },
            tool_slots: HashMap::new(),
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.state.phase
    }

    pub fn response_id(&self) -> Option<&str> {
        self.state.response_id.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state.phase,
            StreamPhase::Finished | StreamPhase::Errored
        )
    }

    /// Decode and apply one SSE frame. Frames after a terminal state are
    /// ignored.
    pub fn on_frame(
        &mut self,
        event_name: &str,
        data: &str,
    ) -> Result<Option<ClientChunk>, StreamDecodeError> {
        if self.is_terminal() {
            return Ok(None);
        }
        match decode::decode_event(self.protocol, event_name, data) {
            Ok(event) => Ok(self.on_event(event)),
            Err(err) => {
                self.fail();
                Err(err)
            }
        }
    }

    pub fn fail(&mut self) {
        self.state.phase = StreamPhase::Errored;
    }

    pub fn on_event(&mut self, event: UpstreamEvent) -> Option<ClientChunk> {
        if self.is_terminal() {
            return None;
        }
        match event {
            UpstreamEvent::MessageStart => {
                self.start();
                None
            }
            UpstreamEvent::TextDelta(text) => Some(self.emit(
                ChunkDelta {
                    content: Some(text),
                    ..Default::default()
                },
                None,
            )),
            UpstreamEvent::ReasoningDelta(text) => Some(self.emit(
                ChunkDelta {
                    reasoning_content: Some(text),
                    ..Default::default()
                },
                None,
            )),
            UpstreamEvent::ToolCallStart { slot, id, name } => {
                let index = self.tool_index(slot);
                Some(self.emit(
                    ChunkDelta {
                        tool_calls: Some(vec![ToolCallDelta {
                            index,
                            id: Some(id),
                            kind: Some("function"),
                            function: FunctionDelta {
                                name: Some(name),
                                arguments: Some(String::new()),
                            },
                        }]),
                        ..Default::default()
                    },
                    None,
                ))
            }
            UpstreamEvent::ToolCallArgsDelta { slot, arguments } => {
                let index = self.tool_index(slot);
                Some(self.emit(
                    ChunkDelta {
                        tool_calls: Some(vec![ToolCallDelta {
                            index,
                            id: None,
                            kind: None,
                            function: FunctionDelta {
                                name: None,
                                arguments: Some(arguments),
                            },
                        }]),
                        ..Default::default()
                    },
                    None,
                ))
            }
            UpstreamEvent::Finish(reason) => Some(self.finish(reason)),
            UpstreamEvent::MessageStop => Some(self.finish(FinishReason::Stop)),
            UpstreamEvent::Ignored => None,
        }
    }

    fn start(&mut self) {
        if self.state.phase == StreamPhase::AwaitingStart {
            self.state.response_id = Some(new_response_id());
            self.state.created_at = chrono::Utc::now().timestamp();
            self.state.phase = StreamPhase::StreamingContent;
        }
    }

    fn tool_index(&mut self, slot: u64) -> u32 {
        let next = self.tool_slots.len() as u32;
        *self.tool_slots.entry(slot).or_insert(next)
    }

    fn finish(&mut self, reason: FinishReason) -> ClientChunk {
        let chunk = self.emit(ChunkDelta::default(), Some(reason));
        self.state.phase = StreamPhase::Finished;
        chunk
    }

    /// The one place chunks are built; every chunk of a stream carries the
    /// same id, timestamp and model.
    fn emit(&mut self, mut delta: ChunkDelta, finish_reason: Option<FinishReason>) -> ClientChunk {
        self.start();
        if !self.state.emitted_any {
            delta.role = Some("assistant");
            self.state.emitted_any = true;
        }
        ClientChunk {
            id: self.state.response_id.clone().unwrap_or_default(),
            object: chunk::CHUNK_OBJECT,
            created: self.state.created_at,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }
}

struct Pump {
    frames: BoxStream<'static, Result<eventsource_stream::Event, String>>,
    reencoder: Reencoder,
}

/// Re-encode a live upstream SSE byte stream.
///
/// Yields one chunk per content event and a final chunk with the finish
/// reason, then ends. A malformed frame, a transport error or an upstream
/// that closes before finishing yields a single `Err` and ends the stream
/// without a finish chunk. Dropping the returned stream drops the upstream
/// body.
pub fn reencode_stream<S, E>(
    upstream: S,
    reencoder: Reencoder,
) -> impl Stream<Item = Result<ClientChunk, StreamDecodeError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let frames = upstream
        .eventsource()
        .map(|frame| frame.map_err(|err| err.to_string()))
        .boxed();
    stream::unfold(Pump { frames, reencoder }, |mut pump| async move {
        if pump.reencoder.is_terminal() {
            return None;
        }
        loop {
            let failure = match pump.frames.next().await {
                Some(Ok(frame)) => match pump.reencoder.on_frame(&frame.event, &frame.data) {
                    Ok(Some(chunk)) => return Some((Ok(chunk), pump)),
                    Ok(None) if pump.reencoder.is_terminal() => return None,
                    Ok(None) => continue,
                    Err(err) => err,
                },
                Some(Err(err)) => StreamDecodeError::Upstream(err),
                None => StreamDecodeError::Upstream(
                    "upstream closed the stream before finishing".to_string(),
                ),
            };
            pump.reencoder.fail();
            tracing::warn!(error = %failure, "upstream stream aborted");
            return Some((Err(failure), pump));
        }
    })
}
