//! Streaming bridges.
//!
//! A bridge accumulates one body that is delivered through independent
//! callbacks (chunked transfer, reactive publishers) and is addressed by an
//! exchange id the transport already carries, rather than by a reference to
//! the request or response object.

use crate::framing::{self, FramingError};
use base64::Engine as _;
use bytes::BytesMut;
use dashmap::DashMap;
use pc_common::{AttributeKey, AttributeSink, AttributeValue};
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

/// Payload text recorded for an exchange that declared an empty body.
pub const NO_BODY_MARKER: &str = "null";

/// `payload`, or [`NO_BODY_MARKER`] when the exchange declared no body.
pub fn payload_or_no_body(declared_length: Option<u64>, payload: Option<String>) -> String {
    match declared_length {
        Some(0) => NO_BODY_MARKER.to_string(),
        _ => payload.unwrap_or_else(|| NO_BODY_MARKER.to_string()),
    }
}

/// Transfer properties learned from the exchange headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyFraming {
    pub gzip: bool,
    pub chunked: bool,
}

impl BodyFraming {
    /// Inspect `Content-Encoding` and `Transfer-Encoding` headers.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut framing = Self::default();
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("content-encoding") && has_token(value, "gzip") {
                framing.gzip = true;
            } else if name.eq_ignore_ascii_case("transfer-encoding") && has_token(value, "chunked")
            {
                framing.chunked = true;
            }
        }
        framing
    }
}

fn has_token(value: &str, token: &str) -> bool {
    value.split(',').any(|t| t.trim().eq_ignore_ascii_case(token))
}

#[derive(Debug, Default)]
struct BridgeState {
    buffer: BytesMut,
    first_chunk: bool,
    retrieved: bool,
    framing: BodyFraming,
}

/// Accumulator for one streamed body.
#[derive(Debug)]
pub struct StreamingBridge {
    state: Mutex<BridgeState>,
}

impl Default for StreamingBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingBridge {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BridgeState {
                first_chunk: true,
                ..BridgeState::default()
            }),
        }
    }

    /// Append a chunk. Ignored once the payload was retrieved.
    pub fn append(&self, chunk: &[u8]) {
        self.append_from(chunk, 0);
    }

    /// Append a chunk whose first `body_start` bytes belong to the protocol
    /// envelope rather than the body.
    ///
    /// The offset only applies to the first chunk; an offset past its end
    /// drops that chunk.
    pub fn append_from(&self, chunk: &[u8], body_start: usize) {
        let mut state = self.state.lock();
        if state.retrieved {
            tracing::trace!(len = chunk.len(), "late chunk ignored");
            return;
        }

        if state.first_chunk {
            let Some(body) = chunk.get(body_start..).filter(|b| !b.is_empty()) else {
                return;
            };
            state.buffer = BytesMut::from(body);
            state.first_chunk = false;
        } else {
            state.buffer.extend_from_slice(chunk);
        }
    }

    pub fn observe_headers(&self, framing: BodyFraming) {
        self.state.lock().framing = framing;
    }

    pub fn framing(&self) -> BodyFraming {
        self.state.lock().framing
    }

    pub fn is_retrieved(&self) -> bool {
        self.state.lock().retrieved
    }

    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().buffer.is_empty()
    }

    /// Decode the accumulated body as UTF-8, once.
    pub fn complete(&self) -> Option<String> {
        let mut state = self.state.lock();
        if state.retrieved {
            return None;
        }
        state.retrieved = true;
        Some(String::from_utf8_lossy(&state.buffer).into_owned())
    }

    /// Take the payload once, honouring the observed framing.
    ///
    /// Chunk framing is removed; a gzip body is returned Base64-encoded. An
    /// empty or incomplete body yields `None` but still counts as retrieved.
    pub fn take_payload(&self) -> Option<String> {
        let mut state = self.state.lock();
        if state.retrieved {
            return None;
        }
        state.retrieved = true;

        let body = if state.framing.chunked {
            match framing::dechunk(&state.buffer) {
                Ok(body) => body,
                Err(FramingError::Incomplete) => {
                    tracing::debug!("chunked body incomplete, payload skipped");
                    return None;
                }
                Err(err) => {
                    tracing::debug!(error = %err, "chunk framing invalid, using raw bytes");
                    state.buffer.to_vec()
                }
            }
        } else {
            state.buffer.to_vec()
        };

        if body.is_empty() {
            return None;
        }
        if state.framing.gzip {
            return Some(base64::engine::general_purpose::STANDARD.encode(&body));
        }
        Some(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Bridges keyed by exchange id.
///
/// Lookups are lock-free across exchanges; each bridge guards its own state.
#[derive(Debug)]
pub struct BridgeRegistry<K: Eq + Hash> {
    bridges: DashMap<K, Arc<StreamingBridge>>,
}

impl<K: Eq + Hash> Default for BridgeRegistry<K> {
    fn default() -> Self {
        Self {
            bridges: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + std::fmt::Debug> BridgeRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a bridge for `key`, replacing any previous one.
    pub fn open(&self, key: K) -> Arc<StreamingBridge> {
        let bridge = Arc::new(StreamingBridge::new());
        tracing::trace!(exchange = ?key, "bridge opened");
        self.bridges.insert(key, Arc::clone(&bridge));
        bridge
    }

    pub fn get(&self, key: &K) -> Option<Arc<StreamingBridge>> {
        self.bridges.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Append a chunk to the bridge for `key`. Unknown keys are ignored.
    pub fn append_payload(&self, key: &K, chunk: &[u8]) {
        self.append_payload_from(key, chunk, 0);
    }

    pub fn append_payload_from(&self, key: &K, chunk: &[u8], body_start: usize) {
        match self.get(key) {
            Some(bridge) => bridge.append_from(chunk, body_start),
            None => tracing::trace!(exchange = ?key, "chunk for unknown exchange ignored"),
        }
    }

    /// Record the exchange headers for `key`.
    pub fn observe_headers<'a, I>(&self, key: &K, headers: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if let Some(bridge) = self.get(key) {
            bridge.observe_headers(BodyFraming::from_headers(headers));
        }
    }

    /// Decode the payload for `key` as UTF-8, once.
    pub fn complete_payload(&self, key: &K) -> Option<String> {
        self.get(key)?.complete()
    }

    /// Complete the payload for `key` and attach it to `target`.
    pub fn complete_payload_into(
        &self,
        key: &K,
        target: &dyn AttributeSink,
        attribute: AttributeKey,
    ) -> bool {
        match self.complete_payload(key).filter(|text| !text.is_empty()) {
            Some(text) => {
                target.set_attribute(attribute, AttributeValue::Text(text));
                true
            }
            None => false,
        }
    }

    /// Pull-style accessor; see [`StreamingBridge::take_payload`].
    pub fn get_payload(&self, key: &K) -> Option<String> {
        self.get(key)?.take_payload()
    }

    /// Forget the bridge for `key`.
    pub fn close(&self, key: &K) -> Option<Arc<StreamingBridge>> {
        let removed = self.bridges.remove(key).map(|(_, bridge)| bridge);
        if removed.is_some() {
            tracing::trace!(exchange = ?key, "bridge closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_common::RecordedAttributes;

    #[test]
    fn test_replace_then_grow() {
        let registry = BridgeRegistry::new();
        registry.open(1u64);
        registry.append_payload(&1, b"ab");
        registry.append_payload(&1, b"cd");
        assert_eq!(registry.complete_payload(&1).as_deref(), Some("abcd"));

        registry.append_payload(&1, b"ef");
        assert_eq!(registry.complete_payload(&1), None);
        assert_eq!(registry.get(&1).map(|b| b.len()), Some(4));
    }

    #[test]
    fn test_first_empty_chunk_does_not_count() {
        let bridge = StreamingBridge::new();
        bridge.append(b"");
        bridge.append(b"x");
        bridge.append(b"y");
        assert_eq!(bridge.complete().as_deref(), Some("xy"));
    }

    #[test]
    fn test_body_start_offset() {
        let bridge = StreamingBridge::new();
        bridge.append_from(b"HDRbody", 3);
        bridge.append_from(b"-more", 3);
        assert_eq!(bridge.complete().as_deref(), Some("body-more"));
    }

    #[test]
    fn test_invalid_body_start_is_ignored() {
        let bridge = StreamingBridge::new();
        bridge.append_from(b"abc", 10);
        bridge.append_from(b"abc", 3);
        assert!(bridge.is_empty());
        bridge.append_from(b"def", 0);
        assert_eq!(bridge.complete().as_deref(), Some("def"));
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let registry: BridgeRegistry<&str> = BridgeRegistry::new();
        registry.append_payload(&"missing", b"data");
        assert_eq!(registry.complete_payload(&"missing"), None);
        assert_eq!(registry.get_payload(&"missing"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_payload_once() {
        let registry = BridgeRegistry::new();
        registry.open("req");
        registry.append_payload(&"req", b"{\"a\":1}");
        assert_eq!(registry.get_payload(&"req").as_deref(), Some("{\"a\":1}"));
        assert_eq!(registry.get_payload(&"req"), None);
    }

    #[test]
    fn test_get_payload_empty_is_none() {
        let registry = BridgeRegistry::new();
        registry.open(7u32);
        assert_eq!(registry.get_payload(&7), None);
    }

    #[test]
    fn test_chunked_body_is_deframed() {
        let registry = BridgeRegistry::new();
        registry.open(1u8);
        registry.observe_headers(&1, [("Transfer-Encoding", "chunked")]);
        registry.append_payload(&1, b"3\r\nabc\r\n");
        registry.append_payload(&1, b"2\r\nde\r\n0\r\n\r\n");
        assert_eq!(registry.get_payload(&1).as_deref(), Some("abcde"));
    }

    #[test]
    fn test_incomplete_chunked_body_is_retrieved_without_payload() {
        let registry = BridgeRegistry::new();
        let bridge = registry.open(1u8);
        registry.observe_headers(&1, [("transfer-encoding", "gzip, chunked")]);
        registry.append_payload(&1, b"10\r\nshort");
        assert_eq!(registry.get_payload(&1), None);
        assert!(bridge.is_retrieved());
    }

    #[test]
    fn test_gzip_body_is_base64() {
        let registry = BridgeRegistry::new();
        registry.open(1u8);
        registry.observe_headers(&1, [("Content-Encoding", "gzip")]);
        registry.append_payload(&1, &[0x1f, 0x8b, 0x08]);
        assert_eq!(registry.get_payload(&1).as_deref(), Some("H4sI"));
    }

    #[test]
    fn test_framing_from_headers() {
        let framing = BodyFraming::from_headers([
            ("Content-Type", "application/json"),
            ("CONTENT-ENCODING", "br, gzip"),
        ]);
        assert!(framing.gzip);
        assert!(!framing.chunked);
    }

    #[test]
    fn test_complete_payload_into() {
        let registry = BridgeRegistry::new();
        let rec = RecordedAttributes::new();
        registry.open(1u8);
        registry.append_payload(&1, b"pong");
        assert!(registry.complete_payload_into(&1, &rec, AttributeKey::HttpResponseBody));
        assert!(!registry.complete_payload_into(&1, &rec, AttributeKey::HttpResponseBody));
        assert_eq!(rec.write_count(AttributeKey::HttpResponseBody), 1);
    }

    #[test]
    fn test_close_and_reopen() {
        let registry = BridgeRegistry::new();
        registry.open(1u8);
        registry.append_payload(&1, b"old");
        assert!(registry.close(&1).is_some());
        assert!(registry.close(&1).is_none());

        registry.open(1u8);
        registry.append_payload(&1, b"new");
        assert_eq!(registry.complete_payload(&1).as_deref(), Some("new"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_payload_or_no_body() {
        assert_eq!(payload_or_no_body(Some(0), Some("x".into())), "null");
        assert_eq!(payload_or_no_body(None, None), "null");
        assert_eq!(payload_or_no_body(Some(3), Some("abc".into())), "abc");
    }
}
