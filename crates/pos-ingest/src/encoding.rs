//! Text encoding detection for CSV exports.
//!
//! POS exports arrive as UTF-8 (with or without BOM) or in the legacy Chinese
//! code pages. Candidates are tried in a fixed order against the header scan
//! window and the first clean decode wins.

use encoding_rs::{Encoding, GB18030, GBK, UTF_8};
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

/// Candidate encodings in priority order.
pub const CANDIDATE_ENCODINGS: &[&Encoding] = &[UTF_8, GBK, GB18030];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decoded CSV text with the encoding that produced it.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Returns the prefix of `bytes` holding at most `rows` lines.
fn scan_window(bytes: &[u8], rows: usize) -> &[u8] {
    let mut seen = 0;
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'\n' {
            seen += 1;
            if seen == rows {
                return &bytes[..=idx];
            }
        }
    }
    bytes
}

/// Decodes CSV bytes, detecting the encoding from the first `scan_rows` lines.
///
/// # Errors
///
/// Returns [`IngestError::EmptyFile`] for an empty buffer and
/// [`IngestError::Encoding`] when no candidate decodes the window cleanly.
pub fn decode_text(bytes: &[u8], scan_rows: usize) -> Result<DecodedText> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(IngestError::EmptyFile);
    }
    let window = scan_window(body, scan_rows.max(1));
    let encoding = CANDIDATE_ENCODINGS
        .iter()
        .copied()
        .find(|encoding| {
            encoding
                .decode_without_bom_handling_and_without_replacement(window)
                .is_some()
        })
        .ok_or_else(|| IngestError::Encoding {
            tried: CANDIDATE_ENCODINGS
                .iter()
                .map(|encoding| encoding.name())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        warn!(
            encoding = encoding.name(),
            "undecodable bytes after the header window were replaced"
        );
    }
    debug!(encoding = encoding.name(), bytes = bytes.len(), "decoded CSV text");
    Ok(DecodedText {
        text: text.into_owned(),
        encoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("实收金额,现金\n1,2\n".as_bytes());
        let decoded = decode_text(&bytes, 20).unwrap();
        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.text.starts_with("实收金额"));
    }

    #[test]
    fn test_gbk_fallback() {
        let (bytes, _, _) = GBK.encode("门店名称,实收金额\n万象城店,100\n");
        let decoded = decode_text(&bytes, 20).unwrap();
        assert_eq!(decoded.encoding, GBK);
        assert_eq!(decoded.text, "门店名称,实收金额\n万象城店,100\n");
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(decode_text(b"", 20), Err(IngestError::EmptyFile)));
        assert!(matches!(decode_text(b"  \n", 20), Err(IngestError::EmptyFile)));
    }

    #[test]
    fn test_undecodable_window() {
        // 0xFF is invalid in UTF-8 and not a GBK/GB18030 lead byte.
        let bytes = [0xFF, 0xFF, b'\n'];
        assert!(matches!(
            decode_text(&bytes, 20),
            Err(IngestError::Encoding { .. })
        ));
    }

    #[test]
    fn test_scan_window_stops_at_row_limit() {
        assert_eq!(scan_window(b"a\nb\nc\n", 2), b"a\nb\n");
        assert_eq!(scan_window(b"a\nb", 5), b"a\nb");
    }
}
