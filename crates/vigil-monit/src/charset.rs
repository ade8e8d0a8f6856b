//! Character-set normalisation for status documents.
//!
//! The supervisor may emit its XML in whatever encoding its host is
//! configured for. [`normalise`] transcodes the raw body to UTF-8 and removes
//! the XML declaration so the structural parser never has to reason about
//! encodings.

use encoding_rs::{Encoding, UTF_8};

use crate::error::DecodeError;

const DECLARATION_OPEN: &[u8] = b"<?xml";
const DECLARATION_CLOSE: &[u8] = b"?>";

/// Transcodes a status document to UTF-8.
///
/// The encoding is taken from a byte-order mark when present, otherwise from
/// the `encoding` pseudo-attribute of the XML declaration, and defaults to
/// UTF-8. Any WHATWG encoding label is accepted.
///
/// # Errors
///
/// Returns [`DecodeError::UnsupportedEncoding`] for unknown labels and
/// [`DecodeError::InvalidEncoding`] when the bytes are not valid in the
/// declared encoding.
pub fn normalise(document: &[u8]) -> Result<String, DecodeError> {
    let (encoding, body) = match Encoding::for_bom(document) {
        Some((encoding, bom_length)) => (encoding, document.get(bom_length..).unwrap_or_default()),
        None => (declared_encoding(document)?.unwrap_or(UTF_8), document),
    };
    let decoded = encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(DecodeError::InvalidEncoding {
            encoding: encoding.name(),
        })?;
    Ok(strip_declaration(&decoded).to_owned())
}

/// Reads the `encoding` label from an ASCII-compatible XML declaration.
fn declared_encoding(document: &[u8]) -> Result<Option<&'static Encoding>, DecodeError> {
    let Some(declaration) = declaration_bytes(trim_leading_whitespace(document)) else {
        return Ok(None);
    };
    let Some(label) = pseudo_attribute(declaration, b"encoding") else {
        return Ok(None);
    };
    Encoding::for_label(label)
        .map(Some)
        .ok_or_else(|| DecodeError::UnsupportedEncoding {
            label: String::from_utf8_lossy(label).into_owned(),
        })
}

fn trim_leading_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes.get(start..).unwrap_or_default()
}

fn declaration_bytes(document: &[u8]) -> Option<&[u8]> {
    if !document.starts_with(DECLARATION_OPEN) {
        return None;
    }
    let end = find(document, DECLARATION_CLOSE)?;
    document.get(DECLARATION_OPEN.len()..end)
}

fn pseudo_attribute<'a>(declaration: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
    let start = find(declaration, name)? + name.len();
    let after_name = trim_leading_whitespace(declaration.get(start..)?);
    let after_equals = trim_leading_whitespace(after_name.strip_prefix(b"=")?);
    let (&quote, value) = after_equals.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = value.iter().position(|&byte| byte == quote)?;
    value.get(..end)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn strip_declaration(document: &str) -> &str {
    let trimmed = document.trim_start();
    if !trimmed.starts_with("<?xml") {
        return document;
    }
    match trimmed.find("?>") {
        Some(end) => trimmed.get(end + 2..).unwrap_or(trimmed),
        None => document,
    }
}
