//! Byte-at-a-time line framing
//!
//! u-blox receivers answer DDC reads with 0xFF when they have nothing to
//! send. That filler is never part of a sentence: it discards whatever
//! partial line was collected.

use heapless::Vec;

use crate::sentence::{Sentence, SentenceError, MAX_SENTENCE_LEN};

/// Byte returned by an idle DDC port
pub const IDLE_FILLER: u8 = 0xFF;

/// State machine collecting bytes into sentences
#[derive(Debug, Clone)]
pub struct SentenceParser {
    buffer: Vec<u8, MAX_SENTENCE_LEN>,
    /// `\r` seen but not yet stored; dropped if `\n` follows
    carriage_return: bool,
    state: ParseState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Nothing collected yet
    Idle,
    /// Collecting bytes until the line feed
    InLine,
    /// Line overflowed; skipping to the next line feed
    Discarding,
}

impl Default for SentenceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceParser {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            carriage_return: false,
            state: ParseState::Idle,
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.carriage_return = false;
        self.state = ParseState::Idle;
    }

    /// Bytes collected for the current line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(sentence))` at the end of a non-empty line,
    /// `Ok(None)` when more bytes are needed, or `Err(Overflow)` once when
    /// a line outgrows the buffer (the rest of that line is skipped).
    /// A trailing `\r` is stripped; the checksum is not checked here.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Sentence>, SentenceError> {
        if byte == IDLE_FILLER {
            self.reset();
            return Ok(None);
        }

        match self.state {
            ParseState::Discarding => {
                if byte == b'\n' {
                    self.reset();
                }
                Ok(None)
            }
            ParseState::Idle | ParseState::InLine => {
                match byte {
                    b'\n' => return Ok(self.finish()),
                    b'\r' => {
                        if core::mem::replace(&mut self.carriage_return, true) {
                            self.push(b'\r')?;
                        }
                    }
                    _ => {
                        if core::mem::take(&mut self.carriage_return) {
                            self.push(b'\r')?;
                        }
                        self.push(byte)?;
                    }
                }
                self.state = ParseState::InLine;
                Ok(None)
            }
        }
    }

    fn push(&mut self, byte: u8) -> Result<(), SentenceError> {
        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            self.carriage_return = false;
            self.state = ParseState::Discarding;
            return Err(SentenceError::Overflow);
        }
        Ok(())
    }

    fn finish(&mut self) -> Option<Sentence> {
        let line = core::mem::take(&mut self.buffer);
        self.carriage_return = false;
        self.state = ParseState::Idle;
        if line.is_empty() {
            None
        } else {
            Some(Sentence::from_vec(line))
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete sentence found, if any.
    /// Remaining bytes after a complete sentence are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Sentence>, SentenceError> {
        for &byte in bytes {
            if let Some(sentence) = self.feed(byte)? {
                return Ok(Some(sentence));
            }
        }
        Ok(None)
    }
}
