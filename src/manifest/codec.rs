//! On-disk manifest format
//!
//! One record per line: `<hex-digest> *<filename>\n`, sorted by filename.
//! The reader is lenient about the separator (any run of spaces or tabs,
//! `*` marker optional) and salvages every valid line of a damaged file.

use crate::error::ManifestError;
use crate::tree::hasher::is_valid_digest;
use crate::types::Digest;
use std::collections::BTreeMap;

/// Marker written between digest and filename (md5sum binary mode).
const BINARY_MARKER: char = '*';

/// Result of parsing a manifest: the salvaged entries plus one
/// [`ManifestError::Format`] per rejected line.
#[derive(Debug, Default)]
pub struct ParsedManifest {
    pub entries: BTreeMap<String, Digest>,
    pub warnings: Vec<ManifestError>,
}

/// Parse raw manifest bytes. Never fails as a whole.
pub fn parse(raw: &[u8], digest_len: usize) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();

    for (index, line) in raw.split(|b| *b == b'\n').enumerate() {
        let line_no = index + 1;
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }

        let text = match std::str::from_utf8(line) {
            Ok(text) => text,
            Err(_) => {
                parsed.warnings.push(ManifestError::Format {
                    line: line_no,
                    reason: "line is not valid UTF-8".to_string(),
                });
                continue;
            }
        };

        match parse_line(text, digest_len) {
            Ok((name, digest)) => {
                parsed.entries.insert(name, digest);
            }
            Err(reason) => parsed.warnings.push(ManifestError::Format {
                line: line_no,
                reason,
            }),
        }
    }

    parsed
}

fn parse_line(line: &str, digest_len: usize) -> Result<(String, Digest), String> {
    let split = line
        .find(&[' ', '\t'][..])
        .ok_or_else(|| "missing separator between digest and filename".to_string())?;
    let (digest, rest) = line.split_at(split);

    let digest = digest.to_ascii_lowercase();
    if !is_valid_digest(&digest, digest_len) {
        return Err(format!(
            "invalid digest {:?} (expected {} hex characters)",
            digest, digest_len
        ));
    }

    let rest = rest.trim_start_matches(&[' ', '\t'][..]);
    let name = rest.strip_prefix(BINARY_MARKER).unwrap_or(rest);
    if name.is_empty() {
        return Err("missing filename".to_string());
    }

    Ok((name.to_string(), digest))
}

/// Reject names the line format cannot carry.
pub fn validate_filename(name: &str) -> Result<(), ManifestError> {
    if name.is_empty() || name.contains(&['\n', '\r', '\0'][..]) {
        return Err(ManifestError::InvalidFilename(name.to_string()));
    }
    Ok(())
}

/// Render one manifest record, without the line terminator.
pub fn render_line(name: &str, digest: &str) -> Result<String, ManifestError> {
    validate_filename(name)?;
    Ok(format!("{} {}{}", digest, BINARY_MARKER, name))
}

/// Serialize entries sorted by filename.
///
/// `BTreeMap` iteration is the byte-wise lexicographic order of the names.
pub fn serialize(entries: &BTreeMap<String, Digest>) -> Result<Vec<u8>, ManifestError> {
    let mut out = String::new();
    for (name, digest) in entries {
        out.push_str(&render_line(name, digest)?);
        out.push('\n');
    }
    Ok(out.into_bytes())
}
