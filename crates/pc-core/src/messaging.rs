//! Message header and payload capture.

use crate::charset;
use pc_common::{AttributeKey, AttributeSink, AttributeValue};

/// Render one header as `key=[b0, b1, ...]`, bytes printed as signed values.
///
/// A header without a value renders as `key=null`.
pub fn render_header(key: &str, value: Option<&[u8]>) -> String {
    let Some(bytes) = value else {
        return format!("{}=null", key);
    };
    let rendered: Vec<String> = bytes.iter().map(|b| (*b as i8).to_string()).collect();
    format!("{}=[{}]", key, rendered.join(", "))
}

/// Render every header, in order.
pub fn render_message_headers<'a, I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, Option<&'a [u8]>)>,
{
    headers
        .into_iter()
        .map(|(key, value)| render_header(key, value))
        .collect()
}

/// Attach the rendered headers as `messaging.message.headers`.
pub fn capture_message_headers<'a, I>(sink: &dyn AttributeSink, headers: I)
where
    I: IntoIterator<Item = (&'a str, Option<&'a [u8]>)>,
{
    sink.set_attribute(
        AttributeKey::MessagingHeaders,
        AttributeValue::TextList(render_message_headers(headers)),
    );
}

/// Decode `payload` with the charset named by `content_type` and attach it as
/// `messaging.message.payload`. Returns whether anything was written.
pub fn capture_message_payload(
    sink: &dyn AttributeSink,
    payload: &[u8],
    content_type: Option<&str>,
) -> bool {
    let text = charset::resolve(content_type).decode(payload);
    if text.is_empty() {
        return false;
    }
    sink.set_attribute(AttributeKey::MessagingPayload, AttributeValue::Text(text));
    true
}
