//! Incremental decoding of streamed response bodies.
//!
//! [`EventStream`] turns a forward-only stream of byte chunks into a stream of
//! typed events. Each `\n`-terminated line is decoded as soon as it has been
//! buffered, even when it spans several chunks or a chunk boundary splits a
//! UTF-8 sequence. Two framings are supported:
//!
//! - NDJSON (Ollama dialect): one JSON object per line.
//! - Server-sent events (OpenAI dialect): `data: <json>` lines, ending with
//!   `data: [DONE]`. Multi-line `data:` fields are not used by that dialect and
//!   are decoded line by line.
//!
//! The stream ends after a terminal frame, at end of body, or after the first
//! error item. Events already yielded are never retracted.

use std::{
    collections::VecDeque,
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures::{stream::BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::{wire::ApiErrorBody, Result, SharpAiError};

/// Body framing of a streaming response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Framing {
    /// Newline-delimited JSON.
    Ndjson,
    /// Server-sent events carrying JSON in `data:` fields.
    Sse,
}

impl Framing {
    pub(crate) fn media_type(self) -> &'static str {
        match self {
            Self::Ndjson => "application/x-ndjson",
            Self::Sse => "text/event-stream",
        }
    }
}

/// A decoded unit of a streamed response.
pub trait StreamEvent: DeserializeOwned {
    /// Whether this event is the last meaningful frame of the stream.
    fn is_terminal(&self) -> bool {
        false
    }
}

enum Frame<'a> {
    Payload(&'a [u8]),
    Done,
    Skip,
}

/// Lazy, finite sequence of events decoded from a live response body.
///
/// Not restartable: consuming it drains the underlying connection.
pub struct EventStream<T> {
    body: Option<BoxStream<'static, Result<Bytes>>>,
    framing: Framing,
    buffer: Vec<u8>,
    /// Prefix of `buffer` already searched for a newline.
    scanned: usize,
    queue: VecDeque<Result<T>>,
    finished: bool,
    delivered: usize,
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("framing", &self.framing)
            .field("buffered_bytes", &self.buffer.len())
            .field("delivered", &self.delivered)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<T: StreamEvent> EventStream<T> {
    /// Decodes `chunks` with the given framing.
    pub fn new<S, E>(chunks: S, framing: Framing) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<SharpAiError>,
    {
        Self {
            body: Some(chunks.map(|chunk| chunk.map_err(Into::into)).boxed()),
            framing,
            buffer: Vec::with_capacity(256),
            scanned: 0,
            queue: VecDeque::with_capacity(4),
            finished: false,
            delivered: 0,
        }
    }

    /// Decodes newline-delimited JSON.
    pub fn ndjson<S, E>(chunks: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<SharpAiError>,
    {
        Self::new(chunks, Framing::Ndjson)
    }

    /// Decodes server-sent events.
    pub fn sse<S, E>(chunks: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<SharpAiError>,
    {
        Self::new(chunks, Framing::Sse)
    }

    pub(crate) fn from_response(response: reqwest::Response, framing: Framing) -> Self {
        Self::new(response.bytes_stream(), framing)
    }

    /// Number of events yielded so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// True once no further items will be produced.
    pub fn is_finished(&self) -> bool {
        self.finished && self.queue.is_empty()
    }

    /// Drops the connection; bytes arriving afterwards are never read.
    fn finish(&mut self) {
        self.finished = true;
        self.body = None;
        self.buffer.clear();
        self.scanned = 0;
    }

    fn drain_lines(&mut self) {
        while !self.finished {
            let Some(offset) = self.buffer[self.scanned..]
                .iter()
                .position(|byte| *byte == b'\n')
            else {
                self.scanned = self.buffer.len();
                break;
            };
            let end = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.scanned = 0;
            self.decode_line(&line);
        }
    }

    fn flush_remainder(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        self.decode_line(&line);
    }

    fn decode_line(&mut self, raw: &[u8]) {
        let line = trim_line(raw);
        let payload = match frame(self.framing, line) {
            Frame::Skip => return,
            Frame::Done => {
                #[cfg(feature = "tracing")]
                tracing::debug!(events = self.delivered, "stream reached done marker");
                self.finish();
                return;
            }
            Frame::Payload(payload) => payload,
        };

        match decode_frame::<T>(payload) {
            Ok(event) => {
                let terminal = event.is_terminal();
                self.queue.push_back(Ok(event));
                if terminal {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(events = self.delivered + 1, "stream reached terminal event");
                    self.finish();
                }
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(events = self.delivered, "invalid stream frame: {err}");
                self.queue.push_back(Err(err));
                self.finish();
            }
        }
    }
}

impl<T: StreamEvent> Stream for EventStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(item) = this.queue.pop_front() {
                if item.is_ok() {
                    this.delivered += 1;
                }
                return Poll::Ready(Some(item));
            }
            if this.finished {
                return Poll::Ready(None);
            }
            let Some(body) = this.body.as_mut() else {
                this.finished = true;
                return Poll::Ready(None);
            };

            match body.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => {
                    this.buffer.extend_from_slice(&chunk);
                    this.drain_lines();
                }
                Poll::Ready(Some(Err(err))) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        events = this.delivered,
                        category = ?err.kind(),
                        "stream interrupted: {err}"
                    );
                    this.queue.push_back(Err(err));
                    this.finish();
                }
                Poll::Ready(None) => {
                    this.flush_remainder();
                    this.finish();
                }
            }
        }
    }
}

impl<T> Unpin for EventStream<T> {}

fn trim_line(raw: &[u8]) -> &[u8] {
    let mut line = raw;
    while let Some((last, rest)) = line.split_last() {
        if matches!(last, b'\n' | b'\r') {
            line = rest;
        } else {
            break;
        }
    }
    line
}

fn frame(framing: Framing, line: &[u8]) -> Frame<'_> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Frame::Skip;
    }
    match framing {
        Framing::Ndjson => Frame::Payload(line),
        Framing::Sse => {
            let Some(data) = line.strip_prefix(b"data:") else {
                // event:, id:, retry: and `:` comment lines carry no payload.
                return Frame::Skip;
            };
            let data = data.strip_prefix(b" ").unwrap_or(data);
            if std::str::from_utf8(data).map(str::trim) == Ok("[DONE]") {
                Frame::Done
            } else {
                Frame::Payload(data)
            }
        }
    }
}

fn decode_frame<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    let raw = || String::from_utf8_lossy(payload).into_owned();
    if let Ok(error) = serde_json::from_slice::<ApiErrorBody>(payload) {
        if error.is_error() {
            return Err(SharpAiError::Deserialization {
                message: format!(
                    "error frame in stream: {}",
                    error.message().unwrap_or_default()
                ),
                body: raw(),
            });
        }
    }
    serde_json::from_slice::<T>(payload).map_err(|err| SharpAiError::Deserialization {
        message: format!("invalid stream frame: {err}"),
        body: raw(),
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::{stream, StreamExt};
    use serde::Deserialize;

    use super::{EventStream, StreamEvent};
    use crate::SharpAiError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Token {
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        done: bool,
    }

    impl StreamEvent for Token {
        fn is_terminal(&self) -> bool {
            self.done
        }
    }

    fn token(text: &str) -> Token {
        Token {
            token: Some(text.to_owned()),
            done: false,
        }
    }

    fn done() -> Token {
        Token {
            token: None,
            done: true,
        }
    }

    fn chunks(parts: &[&'static [u8]]) -> Vec<Result<Bytes, SharpAiError>> {
        parts
            .iter()
            .map(|part| Ok(Bytes::from_static(part)))
            .collect()
    }

    async fn collect(events: EventStream<Token>) -> Vec<Result<Token, SharpAiError>> {
        events.collect().await
    }

    #[tokio::test]
    async fn yields_frames_in_order_and_stops_at_done() {
        let body = chunks(&[b"{\"token\":\"Hi\"}\n{\"token\":\" there\"}\n{\"done\":true}\n"]);
        let items = collect(EventStream::ndjson(stream::iter(body))).await;

        assert_eq!(items, vec![Ok(token("Hi")), Ok(token(" there")), Ok(done())]);
    }

    #[tokio::test]
    async fn reassembles_frames_split_across_chunks() {
        // "é" is split between the second and third chunk.
        let body = chunks(&[
            b"{\"tok",
            b"en\":\"caf\xc3",
            b"\xa9\"}\n{\"token\"",
            b":\"!\"}\n",
        ]);
        let items = collect(EventStream::ndjson(stream::iter(body))).await;

        assert_eq!(items, vec![Ok(token("café")), Ok(token("!"))]);
    }

    #[tokio::test]
    async fn long_frame_trickled_byte_by_byte_decodes_once() {
        let text = "x".repeat(4_096);
        let frame = format!("{{\"token\":\"{text}\"}}\n{{\"done\":true}}\n");
        let body: Vec<Result<Bytes, SharpAiError>> = frame
            .into_bytes()
            .into_iter()
            .map(|byte| Ok(Bytes::from(vec![byte])))
            .collect();
        let mut events = EventStream::<Token>::ndjson(stream::iter(body));

        assert_eq!(events.next().await, Some(Ok(token(&text))));
        assert_eq!(events.next().await, Some(Ok(done())));
        assert_eq!(events.next().await, None);
        assert_eq!(events.delivered(), 2);
    }

    #[tokio::test]
    async fn ignores_bytes_after_terminal_frame() {
        let body = chunks(&[
            b"{\"token\":\"a\"}\n{\"done\":true}\n{\"token\":\"late\"}\n",
            b"not even json\n",
        ]);
        let items = collect(EventStream::ndjson(stream::iter(body))).await;

        assert_eq!(items, vec![Ok(token("a")), Ok(done())]);
    }

    #[tokio::test]
    async fn connection_drop_keeps_delivered_events() {
        let body = vec![
            Ok(Bytes::from_static(b"{\"token\":\"E1\"}\n")),
            Ok(Bytes::from_static(b"{\"token\":\"E2\"}\n{\"tok")),
            Err(SharpAiError::Network {
                message: "connection reset".to_owned(),
            }),
            Ok(Bytes::from_static(b"en\":\"never\"}\n")),
        ];
        let mut events = EventStream::<Token>::ndjson(stream::iter(body));

        assert_eq!(events.next().await, Some(Ok(token("E1"))));
        assert_eq!(events.next().await, Some(Ok(token("E2"))));
        assert!(matches!(
            events.next().await,
            Some(Err(SharpAiError::Network { .. }))
        ));
        assert_eq!(events.next().await, None);
        assert_eq!(events.delivered(), 2);
        assert!(events.is_finished());
    }

    #[tokio::test]
    async fn invalid_frame_terminates_with_decode_error() {
        let body = chunks(&[b"{\"token\":\"ok\"}\n{\"token\": 5}\n{\"token\":\"after\"}\n"]);
        let items = collect(EventStream::ndjson(stream::iter(body))).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok(token("ok")));
        match &items[1] {
            Err(SharpAiError::Deserialization { body, .. }) => assert_eq!(body, "{\"token\": 5}"),
            other => panic!("expected deserialization error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_frame_from_server_surfaces_as_error_item() {
        let body = chunks(&[b"{\"token\":\"x\"}\n{\"error\":\"out of memory\"}\n"]);
        let items = collect(EventStream::ndjson(stream::iter(body))).await;

        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[1],
            Err(SharpAiError::Deserialization { message, .. }) if message.contains("out of memory")
        ));
    }

    #[tokio::test]
    async fn decodes_unterminated_final_line_at_end_of_body() {
        let body = chunks(&[b"\r\n{\"token\":\"a\"}\r\n\n{\"token\":\"b\"}"]);
        let items = collect(EventStream::ndjson(stream::iter(body))).await;

        assert_eq!(items, vec![Ok(token("a")), Ok(token("b"))]);
    }

    #[tokio::test]
    async fn sse_stops_at_done_marker() {
        let body = chunks(&[
            b": keep-alive\n\nevent: message\ndata: {\"token\":\"Hi\"}\n\n",
            b"data:{\"token\":\" there\"}\n\ndata: [DONE]\n\ndata: {\"token\":\"late\"}\n\n",
        ]);
        let items = collect(EventStream::sse(stream::iter(body))).await;

        assert_eq!(items, vec![Ok(token("Hi")), Ok(token(" there"))]);
    }
}
