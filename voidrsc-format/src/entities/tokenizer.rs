//! Resumable byte scanner for `.entities` text.
//!
//! The tokenizer holds no input: feed it chunks of any size and it carries escape,
//! string and partial-token state across the boundaries.

use super::error::ParseError;

const ESCAPE: u8 = b'\\';
const VALUE_END: u8 = b';';

#[inline(always)]
fn is_quote(c: u8) -> bool {
    c == b'"' || c == b'\''
}

#[inline(always)]
fn is_separator(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | b'=')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A complete token, ended by a separator or a brace.
    Token(Vec<u8>),
    Frame(Direction),
    /// A `;`, carrying whatever token bytes were pending when it was seen.
    ValueEnd(Vec<u8>),
}

#[derive(Debug, Default)]
pub struct Tokenizer {
    escape: bool,
    in_string: bool,
    token: Vec<u8>,
    offset: u64,
}

impl Tokenizer {
    pub fn new() -> Tokenizer {
        Tokenizer::default()
    }

    /// Offsets reported with events start counting at `offset`.
    pub fn starting_at(offset: u64) -> Tokenizer {
        Tokenizer {
            offset,
            ..Default::default()
        }
    }

    /// The position of the next byte to be fed.
    #[inline(always)]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Scans `chunk`, calling `on_event` with each event and the offset of the byte that caused it.
    pub fn feed<F>(&mut self, chunk: &[u8], mut on_event: F) -> Result<(), ParseError>
    where
        F: FnMut(Event, u64) -> Result<(), ParseError>,
    {
        for &c in chunk {
            let at = self.offset;
            self.offset += 1;

            if self.escape {
                self.token.push(c);
                self.escape = false;
                continue;
            }

            if c == ESCAPE {
                self.escape = true;
                continue;
            }

            if is_quote(c) {
                self.token.push(c);
                self.in_string = !self.in_string;
                continue;
            }

            if self.in_string {
                self.token.push(c);
                continue;
            }

            match c {
                b'{' => {
                    self.flush(&mut on_event, at)?;
                    on_event(Event::Frame(Direction::Open), at)?;
                }
                b'}' => {
                    self.flush(&mut on_event, at)?;
                    on_event(Event::Frame(Direction::Close), at)?;
                }
                VALUE_END => {
                    let value = std::mem::take(&mut self.token);
                    on_event(Event::ValueEnd(value), at)?;
                }
                c if is_separator(c) => self.flush(&mut on_event, at)?,
                c => self.token.push(c),
            }
        }

        Ok(())
    }

    fn flush<F>(&mut self, on_event: &mut F, at: u64) -> Result<(), ParseError>
    where
        F: FnMut(Event, u64) -> Result<(), ParseError>,
    {
        if self.token.is_empty() {
            return Ok(());
        }
        on_event(Event::Token(std::mem::take(&mut self.token)), at)
    }

    /// Ends the input, returning any trailing token bytes that were never terminated.
    pub fn finish(self) -> Result<Vec<u8>, ParseError> {
        if self.escape {
            return Err(ParseError::DanglingEscape);
        }
        if self.in_string {
            return Err(ParseError::UnterminatedString);
        }
        Ok(self.token)
    }
}
