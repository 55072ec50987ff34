//! Charset resolution from MIME content-type headers.
//!
//! Resolution is defensive: anything that cannot be turned into a supported
//! decoder yields UTF-8. Latin-1, US-ASCII and bare UTF-16 labels are matched
//! before the WHATWG registry so they keep their IANA names and decoders.

use encoding_rs::{Encoding, REPLACEMENT, UTF_16BE, UTF_8};

const LATIN1_LABELS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso8859_1",
    "iso_8859_1",
    "iso_8859-1",
    "iso_8859-1:1987",
    "8859_1",
    "latin1",
    "l1",
    "cp819",
    "ibm819",
    "ibm-819",
    "819",
    "iso-ir-100",
    "csisolatin1",
];

const ASCII_LABELS: &[&str] = &[
    "us-ascii",
    "ascii",
    "us",
    "ascii7",
    "646",
    "iso646-us",
    "iso_646.irv:1983",
    "ansi_x3.4-1968",
    "ansi_x3.4-1986",
    "cp367",
    "ibm367",
    "csascii",
];

const UTF16_LABELS: &[&str] = &["utf-16", "utf16", "unicode", "unicodebig"];

/// A text decoder chosen for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// US-ASCII: bytes above 0x7F decode to U+FFFD.
    Ascii,
    /// UTF-16 without a declared byte order: big-endian unless a BOM says otherwise.
    Utf16,
    /// Any other charset known to the WHATWG label registry.
    Whatwg(&'static Encoding),
}

impl Charset {
    pub fn utf8() -> Self {
        Charset::Whatwg(UTF_8)
    }

    /// Look up a charset by its label (case-insensitive, surrounding whitespace ignored).
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let is = |labels: &[&str]| labels.iter().any(|l| l.eq_ignore_ascii_case(label));
        if is(LATIN1_LABELS) {
            return Some(Charset::Latin1);
        }
        if is(ASCII_LABELS) {
            return Some(Charset::Ascii);
        }
        if is(UTF16_LABELS) {
            return Some(Charset::Utf16);
        }
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) if encoding != REPLACEMENT => Some(Charset::Whatwg(encoding)),
            _ => None,
        }
    }

    /// Canonical (IANA) name of the charset.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
            Charset::Utf16 => "UTF-16",
            Charset::Whatwg(encoding) => encoding.name(),
        }
    }

    /// Decode `bytes`; malformed sequences become U+FFFD.
    ///
    /// For the Unicode charsets a leading BOM overrides the declared byte order.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Latin1 => encoding_rs::mem::decode_latin1(bytes).into_owned(),
            Charset::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
                .collect(),
            Charset::Utf16 => UTF_16BE.decode(bytes).0.into_owned(),
            Charset::Whatwg(encoding) => encoding.decode(bytes).0.into_owned(),
        }
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve the charset named by a content-type header.
pub fn resolve(content_type: Option<&str>) -> Charset {
    content_type
        .and_then(charset_param)
        .and_then(Charset::for_label)
        .unwrap_or_default()
}

/// Canonical name of the charset named by a content-type header.
pub fn resolve_name(content_type: Option<&str>) -> &'static str {
    resolve(content_type).name()
}

/// The value of the first `charset=` parameter, with one pair of quotes removed.
fn charset_param(content_type: &str) -> Option<&str> {
    let segment = content_type
        .split(';')
        .skip(1)
        .map(str::trim)
        .find(|s| s.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("charset")))?;

    let value = segment[7..].strip_prefix('=')?;
    let value = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(unquoted) => unquoted,
        None => value,
    };
    Some(value)
}
