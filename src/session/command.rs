//! Bus command-line tokenizer.
//!
//! Splits one console line into the tokens the session executes. The
//! tokenizer never touches hardware, so a whole line can be checked before
//! anything is sent.
//!
//! Grammar, left to right, with spaces and commas as separators:
//!
//! | Input | Token |
//! |---|---|
//! | `[` `{` `]` `}` `/` `\` `-` `_` `!` `^` `.` | structural operation |
//! | `W` / `w` | power on / power off |
//! | `(n)` | macro `n` |
//! | `0x2A`, `0b101010`, `42`, optionally `:count` | byte (0..=255), repeated |
//! | `"text"` | the ASCII bytes of `text` |
//! | `r`, `r:count` | read `count` bytes (default 1) |

use crate::error::BusError;

/// One executable unit of a command line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `[`
    Start,
    /// `{`
    StartRead,
    /// `]`
    Stop,
    /// `}`
    StopRead,
    /// `/`
    ClockHigh,
    /// `\`
    ClockLow,
    /// `-`
    DataHigh,
    /// `_`
    DataLow,
    /// `!`
    DataSample,
    /// `^`
    ClockTick,
    /// `.`
    BitRead,
    /// `W`
    PowerOn,
    /// `w`
    PowerOff,
    /// `(n)`
    Macro(u32),
    /// Literal byte written `count` times
    Byte {
        /// Byte value
        value: u8,
        /// Repeat count, at least 1
        count: usize,
    },
    /// Quoted string, quotes stripped
    Text(&'a str),
    /// `r:count`
    Read(usize),
}

/// Iterator over the tokens of a line, with their byte offsets.
///
/// Yields `Err(BusError::Syntax)` at the first unparsable token and stops.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    line: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Tokens<'a> {
    /// Tokenize `line`.
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            pos: 0,
            failed: false,
        }
    }

    /// Check a whole line without executing it.
    pub fn validate(line: &str) -> Result<(), BusError> {
        Tokens::new(line).try_for_each(|item| item.map(|_| ()))
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    /// Take characters while `pred` holds.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Optional `:count` suffix. Absent means 1.
    fn repeat_count(&mut self, start: usize) -> Result<usize, BusError> {
        if !self.rest().starts_with(':') {
            return Ok(1);
        }
        self.pos += 1;
        let digits = self.take_while(|c| c.is_ascii_digit());
        match digits.parse::<usize>() {
            Ok(count) if count > 0 => Ok(count),
            _ => Err(BusError::Syntax { position: start }),
        }
    }

    fn number(&mut self, start: usize) -> Result<Token<'a>, BusError> {
        let word = self.take_while(|c| c.is_ascii_alphanumeric());
        let syntax = BusError::Syntax { position: start };

        let parsed = if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
            u8::from_str_radix(hex, 16)
        } else if let Some(bin) = word.strip_prefix("0b").or_else(|| word.strip_prefix("0B")) {
            u8::from_str_radix(bin, 2)
        } else {
            word.parse::<u8>()
        };
        let value = parsed.map_err(|_| syntax)?;
        let count = self.repeat_count(start)?;
        Ok(Token::Byte { value, count })
    }

    fn text(&mut self, start: usize) -> Result<Token<'a>, BusError> {
        self.pos += 1;
        let rest = self.rest();
        let end = rest.find('"').ok_or(BusError::Syntax { position: start })?;
        self.pos += end + 1;
        Ok(Token::Text(&rest[..end]))
    }

    fn macro_call(&mut self, start: usize) -> Result<Token<'a>, BusError> {
        self.pos += 1;
        let digits = self.take_while(|c| c.is_ascii_digit());
        let num = digits
            .parse::<u32>()
            .map_err(|_| BusError::Syntax { position: start })?;
        if !self.rest().starts_with(')') {
            return Err(BusError::Syntax { position: start });
        }
        self.pos += 1;
        Ok(Token::Macro(num))
    }

    fn read(&mut self, start: usize) -> Result<Token<'a>, BusError> {
        self.pos += 1;
        let count = self.repeat_count(start)?;
        Ok(Token::Read(count))
    }

    fn next_token(&mut self) -> Option<Result<(usize, Token<'a>), BusError>> {
        self.take_while(|c| c == ' ' || c == ',' || c == '\t');
        let start = self.pos;
        let c = self.rest().chars().next()?;

        let single = match c {
            '[' => Some(Token::Start),
            '{' => Some(Token::StartRead),
            ']' => Some(Token::Stop),
            '}' => Some(Token::StopRead),
            '/' => Some(Token::ClockHigh),
            '\\' => Some(Token::ClockLow),
            '-' => Some(Token::DataHigh),
            '_' => Some(Token::DataLow),
            '!' => Some(Token::DataSample),
            '^' => Some(Token::ClockTick),
            '.' => Some(Token::BitRead),
            'W' => Some(Token::PowerOn),
            'w' => Some(Token::PowerOff),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += c.len_utf8();
            return Some(Ok((start, token)));
        }

        let token = match c {
            '0'..='9' => self.number(start),
            '"' => self.text(start),
            '(' => self.macro_call(start),
            'r' => self.read(start),
            _ => Err(BusError::Syntax { position: start }),
        };
        Some(token.map(|t| (start, t)))
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<(usize, Token<'a>), BusError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
