//! Text encoding support for OCD string fields.
//!
//! OCD versions 8 through 11 store narrow strings in a locale-dependent
//! 8-bit encoding; version 12 uses UTF-8. Object text payloads are always
//! UTF-16LE. Encoding lookup goes through `encoding_rs` labels.

use encoding_rs::{Encoding, WINDOWS_1252};

/// The narrow-string encoding selected for one export run.
///
/// `None` means UTF-8 (version 12 files).
#[derive(Debug, Clone, Copy)]
pub struct NarrowEncoding(Option<&'static Encoding>);

impl NarrowEncoding {
    /// UTF-8 narrow strings (OCD version 12).
    pub fn utf8() -> Self {
        Self(None)
    }

    /// Resolve an 8-bit encoding by WHATWG label (e.g. `"windows-1252"`,
    /// `"ISO-8859-15"`).
    ///
    /// Returns `Err` with the fallback (windows-1252) when the label is
    /// unknown; the caller turns that into a warning.
    pub fn for_label(label: &str) -> std::result::Result<Self, Self> {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => Ok(Self(Some(encoding))),
            None => Err(Self(Some(WINDOWS_1252))),
        }
    }

    /// The default 8-bit encoding used when no label is configured.
    pub fn default_8bit() -> Self {
        Self(Some(WINDOWS_1252))
    }

    /// Encode a string, replacing unmappable characters with the encoding's
    /// substitute (numeric character references for 8-bit encodings).
    pub fn encode(&self, s: &str) -> Vec<u8> {
        match self.0 {
            Some(encoding) => encoding.encode(s).0.into_owned(),
            None => s.as_bytes().to_vec(),
        }
    }

    /// The encoding name, for warning messages.
    pub fn name(&self) -> &'static str {
        match self.0 {
            Some(encoding) => encoding.name(),
            None => "UTF-8",
        }
    }
}

/// Encode a string as UTF-16LE code units, no byte order mark.
pub fn encode_utf16le(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() * 2);
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Decode UTF-16LE bytes, dropping an incomplete trailing code unit and any
/// unpaired trailing surrogate.
///
/// Used to truncate object text safely at a code-unit boundary.
pub fn decode_utf16le_lossy_prefix(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    // A trailing high surrogate has lost its partner to the cut.
    if let Some(&last) = units.last()
        && (0xd800..0xdc00).contains(&last)
    {
        units.pop();
    }
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup() {
        assert!(NarrowEncoding::for_label("windows-1252").is_ok());
        assert!(NarrowEncoding::for_label("ISO-8859-15").is_ok());
        assert!(NarrowEncoding::for_label("no-such-encoding").is_err());
    }

    #[test]
    fn test_narrow_encode() {
        let enc = NarrowEncoding::default_8bit();
        assert_eq!(enc.encode("Hägg"), b"H\xe4gg");
        let utf8 = NarrowEncoding::utf8();
        assert_eq!(utf8.encode("Hägg"), "Hägg".as_bytes());
    }

    #[test]
    fn test_utf16le_roundtrip() {
        let bytes = encode_utf16le("Ab\u{fc}");
        assert_eq!(bytes, [0x41, 0, 0x62, 0, 0xfc, 0]);
        assert_eq!(decode_utf16le_lossy_prefix(&bytes), "Ab\u{fc}");
    }

    #[test]
    fn test_truncation_drops_split_surrogate_pair() {
        // U+1F600 encodes as a surrogate pair; cutting after the high
        // surrogate must not leave a lone surrogate behind.
        let bytes = encode_utf16le("a\u{1f600}");
        assert_eq!(bytes.len(), 6);
        assert_eq!(decode_utf16le_lossy_prefix(&bytes[..4]), "a");
        assert_eq!(decode_utf16le_lossy_prefix(&bytes[..3]), "a");
    }
}
