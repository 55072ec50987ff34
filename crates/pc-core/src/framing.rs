//! HTTP/1.1 chunked transfer decoding for captured bodies.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// The captured bytes stop inside a chunk.
    #[error("chunked body is incomplete")]
    Incomplete,

    #[error("invalid chunk size line: {0:?}")]
    InvalidSize(String),

    #[error("chunk at offset {offset} is not followed by CRLF")]
    Malformed { offset: usize },
}

/// Strip chunked transfer framing from `raw`.
///
/// Decoding stops at the terminating zero-size chunk; trailers are ignored.
/// A body that ends cleanly on a chunk boundary without the terminator is
/// accepted as-is, since capture may stop before the stream does.
pub fn dechunk(raw: &[u8]) -> Result<Vec<u8>, FramingError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut pos = 0;

    while pos < raw.len() {
        let line_end = find_crlf(&raw[pos..])
            .map(|i| pos + i)
            .ok_or(FramingError::Incomplete)?;
        let size = parse_size_line(&raw[pos..line_end])?;
        pos = line_end + 2;

        if size == 0 {
            return Ok(out);
        }

        let data_end = pos.checked_add(size).ok_or_else(|| {
            FramingError::InvalidSize(String::from_utf8_lossy(&raw[..line_end]).into_owned())
        })?;
        if data_end > raw.len() {
            return Err(FramingError::Incomplete);
        }
        out.extend_from_slice(&raw[pos..data_end]);
        pos = data_end;

        match raw.get(pos..pos + 2) {
            Some(b"\r\n") => pos += 2,
            Some(_) => return Err(FramingError::Malformed { offset: pos }),
            None if pos == raw.len() => return Ok(out),
            None => return Err(FramingError::Incomplete),
        }
    }

    Ok(out)
}

fn find_crlf(bytes: &[u8]) -> Option<usize> {
    bytes.windows(2).position(|w| w == b"\r\n")
}

fn parse_size_line(line: &[u8]) -> Result<usize, FramingError> {
    let text = String::from_utf8_lossy(line);
    let size = text.split(';').next().unwrap_or_default().trim();
    if size.is_empty() {
        return Err(FramingError::InvalidSize(text.into_owned()));
    }
    usize::from_str_radix(size, 16).map_err(|_| FramingError::InvalidSize(text.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dechunk_simple() {
        let raw = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        assert_eq!(dechunk(raw).unwrap(), b"Wikipedia");
    }

    #[test]
    fn test_dechunk_extensions_and_case() {
        let raw = b"A;name=value\r\n0123456789\r\n0\r\n\r\n";
        assert_eq!(dechunk(raw).unwrap(), b"0123456789");
        let raw = b"a\r\nabcdefghij\r\n0\r\n\r\n";
        assert_eq!(dechunk(raw).unwrap(), b"abcdefghij");
    }

    #[test]
    fn test_dechunk_stops_at_terminator() {
        let raw = b"2\r\nhi\r\n0\r\nX-Trailer: 1\r\n\r\n";
        assert_eq!(dechunk(raw).unwrap(), b"hi");
    }

    #[test]
    fn test_dechunk_without_terminator() {
        assert_eq!(dechunk(b"2\r\nhi\r\n").unwrap(), b"hi");
        assert_eq!(dechunk(b"2\r\nhi").unwrap(), b"hi");
        assert_eq!(dechunk(b"").unwrap(), b"");
    }

    #[test]
    fn test_dechunk_incomplete() {
        assert_eq!(dechunk(b"5\r\nhi"), Err(FramingError::Incomplete));
        assert_eq!(dechunk(b"5"), Err(FramingError::Incomplete));
        assert_eq!(dechunk(b"2\r\nhi\r"), Err(FramingError::Incomplete));
    }

    #[test]
    fn test_dechunk_invalid() {
        assert!(matches!(
            dechunk(b"zz\r\nhi\r\n"),
            Err(FramingError::InvalidSize(_))
        ));
        assert!(matches!(
            dechunk(b"\r\nhi\r\n"),
            Err(FramingError::InvalidSize(_))
        ));
        assert_eq!(
            dechunk(b"2\r\nhiXY0\r\n\r\n"),
            Err(FramingError::Malformed { offset: 5 })
        );
    }
}
