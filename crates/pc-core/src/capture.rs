//! Capture-once payload buffers.
//!
//! A buffer is bound to one exchange. Transport hooks append to it as the body
//! is read or written; at the end of the exchange it is materialized, which
//! decodes the accumulated data once and writes a single attribute.
//!
//! Appending clears the captured flag, so a buffer that receives data after a
//! premature capture will capture again on the next materialize.

use crate::charset::{self, Charset};
use bytes::BytesMut;
use pc_common::{AttributeKey, AttributeSink, AttributeValue};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Backing storage for a [`CaptureBuffer`].
pub trait CaptureStorage: Default + Send {
    /// Decode the accumulated contents.
    fn decode(&self, charset: Charset) -> String;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn clear(&mut self);
}

impl CaptureStorage for BytesMut {
    fn decode(&self, charset: Charset) -> String {
        charset.decode(self)
    }

    fn len(&self) -> usize {
        BytesMut::len(self)
    }

    fn clear(&mut self) {
        BytesMut::clear(self)
    }
}

impl CaptureStorage for String {
    fn decode(&self, _charset: Charset) -> String {
        self.clone()
    }

    fn len(&self) -> usize {
        String::len(self)
    }

    fn clear(&mut self) {
        String::clear(self)
    }
}

/// Buffer that accumulates one exchange's body and writes it out once.
pub struct CaptureBuffer<S: CaptureStorage> {
    owner: Arc<dyn AttributeSink>,
    charset: Charset,
    storage: Mutex<S>,
    captured: AtomicBool,
}

/// Byte-oriented buffer, decoded with its charset.
pub type ByteCaptureBuffer = CaptureBuffer<BytesMut>;

/// Character-oriented buffer for writers that already produce text.
pub type CharCaptureBuffer = CaptureBuffer<String>;

impl<S: CaptureStorage> CaptureBuffer<S> {
    pub fn new(owner: Arc<dyn AttributeSink>, charset: Charset) -> Self {
        Self {
            owner,
            charset,
            storage: Mutex::new(S::default()),
            captured: AtomicBool::new(false),
        }
    }

    /// A buffer decoding with the charset named by `content_type`.
    pub fn for_content_type(owner: Arc<dyn AttributeSink>, content_type: Option<&str>) -> Self {
        Self::new(owner, charset::resolve(content_type))
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn is_captured(&self) -> bool {
        self.captured.load(Ordering::Acquire)
    }

    /// Bytes (or UTF-8 bytes, for text) accumulated so far.
    pub fn len(&self) -> usize {
        self.storage.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.lock().is_empty()
    }

    /// Drop the accumulated data and reopen the buffer.
    pub fn reset(&self) {
        self.write_with(S::clear);
    }

    /// Write the body to the owning record as `http.request.body`.
    ///
    /// Returns whether an attribute was written.
    pub fn capture_request_body(&self) -> bool {
        self.materialize_into(self.owner.as_ref(), AttributeKey::HttpRequestBody)
    }

    /// Write the body to `target` as `http.response.body`.
    pub fn capture_response_body(&self, target: &dyn AttributeSink) -> bool {
        self.materialize_into(target, AttributeKey::HttpResponseBody)
    }

    /// Write the body to the owning record under `key`.
    pub fn materialize(&self, key: AttributeKey) -> bool {
        self.materialize_into(self.owner.as_ref(), key)
    }

    /// Decode and write the body to `target` under `key`, once.
    ///
    /// A second call without an intervening append is a no-op, as is a body
    /// that decodes to the empty string.
    pub fn materialize_into(&self, target: &dyn AttributeSink, key: AttributeKey) -> bool {
        let text = {
            let storage = self.storage.lock();
            if self
                .captured
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                tracing::trace!(%key, "payload already captured");
                return false;
            }
            storage.decode(self.charset)
        };
        if text.is_empty() {
            return false;
        }

        tracing::trace!(%key, len = text.len(), charset = %self.charset, "payload captured");
        target.set_attribute(key, AttributeValue::Text(text));
        true
    }

    /// Mutate the storage and reopen capture under one lock, so a concurrent
    /// materialize sees either both or neither.
    fn write_with(&self, f: impl FnOnce(&mut S)) {
        let mut storage = self.storage.lock();
        f(&mut storage);
        self.captured.store(false, Ordering::Release);
    }
}

impl ByteCaptureBuffer {
    pub fn append(&self, data: &[u8]) {
        self.write_with(|buf| buf.extend_from_slice(data));
    }

    pub fn append_byte(&self, byte: u8) {
        self.write_with(|buf| buf.extend_from_slice(&[byte]));
    }
}

impl CharCaptureBuffer {
    pub fn append(&self, text: &str) {
        self.write_with(|buf| buf.push_str(text));
    }

    pub fn append_char(&self, c: char) {
        self.write_with(|buf| buf.push(c));
    }

    /// Append `text`, or the literal `null` when absent.
    pub fn append_opt(&self, text: Option<&str>) {
        self.append(text.unwrap_or("null"));
    }
}

impl<S: CaptureStorage> std::fmt::Debug for CaptureBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBuffer")
            .field("charset", &self.charset)
            .field("len", &self.len())
            .field("captured", &self.is_captured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_common::RecordedAttributes;

    fn recorder() -> Arc<RecordedAttributes> {
        Arc::new(RecordedAttributes::new())
    }

    #[test]
    fn test_capture_request_body_once() {
        let rec = recorder();
        let buf = ByteCaptureBuffer::new(rec.clone(), Charset::utf8());
        buf.append(b"hello ");
        buf.append(b"world");

        assert!(buf.capture_request_body());
        assert!(!buf.capture_request_body());
        assert_eq!(rec.write_count(AttributeKey::HttpRequestBody), 1);
        assert_eq!(
            rec.text(AttributeKey::HttpRequestBody).as_deref(),
            Some("hello world")
        );
    }

    #[test]
    fn test_capture_response_body_into_target() {
        let owner = recorder();
        let target = RecordedAttributes::new();
        let buf = ByteCaptureBuffer::for_content_type(owner.clone(), Some("text/plain"));
        buf.append(b"ok");

        assert!(buf.capture_response_body(&target));
        assert!(owner.is_empty());
        assert_eq!(target.text(AttributeKey::HttpResponseBody).as_deref(), Some("ok"));
    }

    #[test]
    fn test_empty_body_writes_nothing() {
        let rec = recorder();
        let buf = ByteCaptureBuffer::new(rec.clone(), Charset::utf8());
        assert!(!buf.capture_request_body());
        assert!(rec.is_empty());
        assert!(buf.is_captured());
    }

    #[test]
    fn test_append_reopens_capture() {
        let rec = recorder();
        let buf = CharCaptureBuffer::new(rec.clone(), Charset::utf8());
        buf.append("a");
        assert!(buf.capture_request_body());
        buf.append("b");
        assert!(!buf.is_captured());
        assert!(buf.capture_request_body());

        assert_eq!(rec.write_count(AttributeKey::HttpRequestBody), 2);
        assert_eq!(rec.text(AttributeKey::HttpRequestBody).as_deref(), Some("ab"));
    }

    #[test]
    fn test_reset() {
        let rec = recorder();
        let buf = ByteCaptureBuffer::new(rec.clone(), Charset::utf8());
        buf.append(b"stale");
        buf.capture_request_body();
        buf.reset();
        assert!(buf.is_empty());
        assert!(!buf.is_captured());
    }

    #[test]
    fn test_decodes_with_charset() {
        let rec = recorder();
        let buf =
            ByteCaptureBuffer::for_content_type(rec.clone(), Some("text/plain; charset=ISO-8859-2"));
        buf.append(&[0xA3, b'o', b'd', 0xBF]);
        buf.materialize(AttributeKey::DbResponseBody);
        assert_eq!(rec.text(AttributeKey::DbResponseBody).as_deref(), Some("Łodż"));
    }

    #[test]
    fn test_char_buffer_appends() {
        let rec = recorder();
        let buf = CharCaptureBuffer::new(rec.clone(), Charset::utf8());
        buf.append_char('[');
        buf.append_opt(None);
        buf.append_opt(Some(","));
        buf.append_char(']');
        buf.materialize(AttributeKey::GrpcRequestPayload);
        assert_eq!(
            rec.text(AttributeKey::GrpcRequestPayload).as_deref(),
            Some("[null,]")
        );
    }

    #[test]
    fn test_append_byte() {
        let rec = recorder();
        let buf = ByteCaptureBuffer::new(rec.clone(), Charset::utf8());
        for b in b"xyz" {
            buf.append_byte(*b);
        }
        assert_eq!(buf.len(), 3);
    }
}
