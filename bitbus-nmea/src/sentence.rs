//! NMEA-0183 sentences and their checksum
//!
//! Sentence format:
//! - `$` start marker
//! - body: address field (talker + type, e.g. `GPGGA`) and comma-separated
//!   data fields
//! - `*` followed by two hex digits: XOR of every body byte
//!
//! The line terminator (`\r\n`) is not part of a [`Sentence`].

use heapless::Vec;

/// Sentence start marker
pub const SENTENCE_START: u8 = b'$';

/// Checksum delimiter
pub const CHECKSUM_DELIMITER: u8 = b'*';

/// Longest line kept, terminator excluded
pub const MAX_SENTENCE_LEN: usize = 1024;

/// Errors that can occur while framing or checking a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SentenceError {
    /// Line exceeds [`MAX_SENTENCE_LEN`]
    Overflow,
    /// Line does not begin with `$`
    MissingStart,
    /// No `*` checksum delimiter
    MissingChecksum,
    /// Checksum field does not match the body
    ChecksumMismatch {
        /// Value of the checksum field
        expected: u32,
        /// XOR of the body bytes
        computed: u8,
    },
}

impl core::fmt::Display for SentenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SentenceError::Overflow => write!(f, "sentence longer than {MAX_SENTENCE_LEN} bytes"),
            SentenceError::MissingStart => f.write_str("sentence does not start with '$'"),
            SentenceError::MissingChecksum => f.write_str("sentence has no '*' checksum"),
            SentenceError::ChecksumMismatch { expected, computed } => write!(
                f,
                "invalid checksum, got {computed:#x} but expected {expected:#x}"
            ),
        }
    }
}

/// XOR of all bytes
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, &byte| acc ^ byte)
}

/// Parse a hex number the way C's `strtoul(s, NULL, 16)` does
///
/// Leading whitespace and an optional `0x` prefix are skipped, digits are
/// consumed up to the first non-hex byte, and no digits at all yield 0.
/// Overflow saturates.
pub fn parse_hex(field: &[u8]) -> u32 {
    let start = field
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(field.len());
    let mut digits = &field[start..];
    if let [b'0', b'x' | b'X', rest @ ..] = digits {
        if rest.first().is_some_and(u8::is_ascii_hexdigit) {
            digits = rest;
        }
    }

    digits
        .iter()
        .map_while(|&b| char::from(b).to_digit(16))
        .fold(0u32, |acc, digit| acc.saturating_mul(16).saturating_add(digit))
}

/// One received line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    line: Vec<u8, MAX_SENTENCE_LEN>,
}

impl Sentence {
    /// Wrap a line (without terminator)
    pub fn new(line: &[u8]) -> Result<Self, SentenceError> {
        let mut buf = Vec::new();
        buf.extend_from_slice(line)
            .map_err(|_| SentenceError::Overflow)?;
        Ok(Self { line: buf })
    }

    pub(crate) fn from_vec(line: Vec<u8, MAX_SENTENCE_LEN>) -> Self {
        Self { line }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.line
    }

    /// The line as text, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.line).ok()
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    fn delimiter(&self) -> Option<usize> {
        self.line.iter().position(|&b| b == CHECKSUM_DELIMITER)
    }

    /// Bytes between `$` and `*` (or the end of the line)
    pub fn body(&self) -> &[u8] {
        let end = self.delimiter().unwrap_or(self.line.len());
        match self.line.first() {
            Some(&SENTENCE_START) => &self.line[1..end],
            _ => &self.line[..end],
        }
    }

    /// Value of the checksum field, if there is one
    pub fn checksum_field(&self) -> Option<u32> {
        self.delimiter().map(|index| parse_hex(&self.line[index + 1..]))
    }

    /// XOR of the body bytes
    pub fn computed_checksum(&self) -> u8 {
        checksum(self.body())
    }

    /// Check the start marker and checksum
    pub fn validate(&self) -> Result<(), SentenceError> {
        if self.line.first() != Some(&SENTENCE_START) {
            return Err(SentenceError::MissingStart);
        }
        let expected = self.checksum_field().ok_or(SentenceError::MissingChecksum)?;
        let computed = self.computed_checksum();
        if expected != u32::from(computed) {
            return Err(SentenceError::ChecksumMismatch { expected, computed });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Address field, e.g. `GPGGA`
    pub fn address(&self) -> &[u8] {
        self.fields().next().unwrap_or(&[])
    }

    /// Two-letter talker ID, e.g. `GP` or `GN`
    pub fn talker(&self) -> Option<&[u8]> {
        self.address().get(..2)
    }

    /// Sentence type after the talker, e.g. `GGA`
    pub fn kind(&self) -> Option<&[u8]> {
        self.address().get(2..).filter(|kind| !kind.is_empty())
    }

    /// Comma-separated body fields, address field first
    pub fn fields(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.body().split(|&b| b == b',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const TXT: &[u8] = b"$GNTXT,01,01,02,u-blox AG - www.u-blox.com*4E";

    #[test]
    fn test_known_sentences_validate() {
        for line in [GGA, TXT] {
            let sentence = Sentence::new(line).unwrap();
            assert_eq!(sentence.validate(), Ok(()));
        }
    }

    #[test]
    fn test_checksum_mismatch() {
        let sentence = Sentence::new(b"$GPGGA,123519*00").unwrap();
        assert_eq!(
            sentence.validate(),
            Err(SentenceError::ChecksumMismatch {
                expected: 0,
                computed: sentence.computed_checksum(),
            })
        );
    }

    #[test]
    fn test_missing_markers() {
        assert_eq!(
            Sentence::new(b"GPGGA,1*47").unwrap().validate(),
            Err(SentenceError::MissingStart)
        );
        assert_eq!(
            Sentence::new(b"$GPGGA,123519").unwrap().validate(),
            Err(SentenceError::MissingChecksum)
        );
    }

    #[test]
    fn test_address_fields() {
        let sentence = Sentence::new(GGA).unwrap();
        assert_eq!(sentence.address(), b"GPGGA");
        assert_eq!(sentence.talker(), Some(&b"GP"[..]));
        assert_eq!(sentence.kind(), Some(&b"GGA"[..]));
        assert_eq!(sentence.fields().nth(1), Some(&b"123519"[..]));
        assert_eq!(sentence.fields().count(), 15);
    }

    #[test]
    fn test_parse_hex_like_strtoul() {
        assert_eq!(parse_hex(b"47"), 0x47);
        assert_eq!(parse_hex(b"4e"), 0x4E);
        assert_eq!(parse_hex(b" 0x1F"), 0x1F);
        assert_eq!(parse_hex(b"7G"), 7);
        assert_eq!(parse_hex(b""), 0);
        assert_eq!(parse_hex(b"zz"), 0);
        assert_eq!(parse_hex(b"0x"), 0);
        assert_eq!(parse_hex(b"FFFFFFFFFF"), u32::MAX);
    }

    #[test]
    fn test_too_long() {
        let long = [b'A'; MAX_SENTENCE_LEN + 1];
        assert_eq!(Sentence::new(&long), Err(SentenceError::Overflow));
    }

    proptest! {
        #[test]
        fn prop_checksum_field_matches_body(body in "[A-Z0-9,.]{0,80}") {
            let sum = checksum(body.as_bytes());
            let line = format!("${}*{:02X}", body, sum);
            let sentence = Sentence::new(line.as_bytes()).unwrap();
            prop_assert_eq!(sentence.validate(), Ok(()));
            prop_assert_eq!(sentence.body(), body.as_bytes());
        }

        #[test]
        fn prop_flipped_body_byte_is_caught(body in "[A-Z0-9,]{1,80}", index in any::<prop::sample::Index>()) {
            let mut bytes = body.into_bytes();
            let sum = checksum(&bytes);
            let at = index.index(bytes.len());
            bytes[at] ^= 0x01;
            let line = format!("${}*{:02X}", std::str::from_utf8(&bytes).unwrap(), sum);
            prop_assert!(!Sentence::new(line.as_bytes()).unwrap().is_valid());
        }
    }
}
