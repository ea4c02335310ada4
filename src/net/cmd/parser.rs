use atoi::FromRadix10SignedChecked;
use bytes::Bytes;
use thiserror::Error;

use crate::net::frame::Frame;

/// Error from reading a command out of a request frame
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandParseError {
    /// The request is not an array of bulk strings
    #[error("Protocol error: expected an array of bulk strings (got {0:?})")]
    BadFrame(Frame),

    /// The command name is not supported
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The command got too few or too many arguments
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    /// An optional argument is not recognized
    #[error("syntax error")]
    Syntax,

    /// An argument that must be an integer is not one
    #[error("value is not an integer or out of range")]
    NotInteger,

    /// An argument that must be a float is not one
    #[error("value is not a valid float")]
    NotFloat,

    /// An argument that must be text is not UTF-8
    #[error("invalid UTF-8 string - {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

/// A parser that extracts values contained within a command frame
#[derive(Debug)]
pub struct CommandParser {
    frames: std::vec::IntoIter<Frame>,
}

impl CommandParser {
    /// Creates a parser over the items of a request frame, which must be an array.
    pub fn new(frame: Frame) -> Result<Self, CommandParseError> {
        match frame {
            Frame::Array(frames) => Ok(Self {
                frames: frames.into_iter(),
            }),
            frame => Err(CommandParseError::BadFrame(frame)),
        }
    }

    /// Parses the next value in the frame as a bytes sequence.
    ///
    /// Returns `None` if there's no value left.
    pub fn next_bytes(&mut self) -> Result<Option<Bytes>, CommandParseError> {
        match self.frames.next() {
            Some(Frame::BulkString(b)) => Ok(Some(b)),
            Some(Frame::SimpleString(s)) => Ok(Some(Bytes::from(s))),
            Some(f) => Err(CommandParseError::BadFrame(f)),
            None => Ok(None),
        }
    }

    /// Parses the next value in the frame as an UTF8 string.
    ///
    /// Returns `None` if there's no value left.
    pub fn next_string(&mut self) -> Result<Option<String>, CommandParseError> {
        match self.next_bytes()? {
            Some(b) => Ok(Some(String::from_utf8(b.to_vec())?)),
            None => Ok(None),
        }
    }

    /// Reads the next value which must be present, as a bytes sequence.
    pub fn bytes(&mut self, cmd: &'static str) -> Result<Bytes, CommandParseError> {
        self.next_bytes()?
            .ok_or(CommandParseError::WrongArity(cmd))
    }

    /// Reads the next value which must be present, as an UTF8 string.
    pub fn string(&mut self, cmd: &'static str) -> Result<String, CommandParseError> {
        self.next_string()?
            .ok_or(CommandParseError::WrongArity(cmd))
    }

    /// Reads the next value which must be present, as a 64-bit integer.
    pub fn integer(&mut self, cmd: &'static str) -> Result<i64, CommandParseError> {
        let b = self.bytes(cmd)?;
        match i64::from_radix_10_signed_checked(&b[..]) {
            (Some(n), used) if used == b.len() && b.last().map_or(false, u8::is_ascii_digit) => {
                Ok(n)
            }
            _ => Err(CommandParseError::NotInteger),
        }
    }

    /// Reads the next value which must be present, as a float. Infinities are accepted,
    /// NaN is not.
    pub fn float(&mut self, cmd: &'static str) -> Result<f64, CommandParseError> {
        let b = self.bytes(cmd)?;
        std::str::from_utf8(&b)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|f| !f.is_nan())
            .ok_or(CommandParseError::NotFloat)
    }

    /// Ensures there are no more values.
    pub fn finish(&mut self, cmd: &'static str) -> Result<(), CommandParseError> {
        match self.frames.next() {
            None => Ok(()),
            Some(_) => Err(CommandParseError::WrongArity(cmd)),
        }
    }
}
