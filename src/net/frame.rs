//! RESP2 frames and their wire encoding.

use std::io::Cursor;

use atoi::FromRadix10SignedChecked;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Reasons a buffer does not hold a valid frame
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// More bytes are needed before a frame can be read
    #[error("frame is incomplete")]
    Incomplete,

    /// The bytes do not follow the RESP2 grammar
    #[error("malformed frame")]
    BadEncoding,

    /// An integer or length is not a valid signed 64-bit decimal
    #[error("invalid integer {0:?}")]
    NotInteger(String),

    /// A simple string or error is not UTF-8
    #[error("invalid UTF-8 in frame - {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

/// A value of the [Redis serialization protocol], version 2. Requests and replies are
/// both frames.
///
/// [Redis serialization protocol]: https://redis.io/docs/reference/protocol-spec/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `+` line of text, no CR or LF inside.
    SimpleString(String),
    /// `-` line of text carrying an error message.
    Error(String),
    /// `:` signed 64-bit integer.
    Integer(i64),
    /// `$` length-prefixed binary-safe string.
    BulkString(Bytes),
    /// `*` length-prefixed sequence of frames.
    Array(Vec<Frame>),
    /// `$-1` or `*-1`.
    Null,
}

impl Frame {
    /// Checks if a complete message frame can be read from the buffer without allocating.
    ///
    /// On success, the cursor is positioned right after the frame, so its position is the
    /// frame's length in bytes. [`Error::Incomplete`] means more data must be buffered first.
    pub fn check(buf: &mut Cursor<&[u8]>) -> Result<(), Error> {
        match get_byte(buf)? {
            b'+' | b'-' => {
                get_line(buf)?;
            }
            b':' => {
                get_decimal(buf)?;
            }
            b'$' => {
                if let Some(len) = get_length(buf)? {
                    // skip the content and its trailing "\r\n"
                    skip(buf, len + 2)?;
                }
            }
            b'*' => {
                if let Some(len) = get_length(buf)? {
                    for _ in 0..len {
                        Frame::check(buf)?;
                    }
                }
            }
            _ => return Err(Error::BadEncoding),
        }
        Ok(())
    }

    /// Reads a frame from the buffer.
    ///
    /// The buffer is expected to have been validated with [`Frame::check`], though
    /// [`Error::Incomplete`] is still reported if it turns out to be short.
    pub fn parse(buf: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        match get_byte(buf)? {
            b'+' => {
                let line = get_line(buf)?;
                Ok(Frame::SimpleString(String::from_utf8(line.to_vec())?))
            }
            b'-' => {
                let line = get_line(buf)?;
                Ok(Frame::Error(String::from_utf8(line.to_vec())?))
            }
            b':' => Ok(Frame::Integer(get_decimal(buf)?)),
            b'$' => {
                let len = match get_length(buf)? {
                    Some(len) => len,
                    None => return Ok(Frame::Null),
                };
                if buf.remaining() < len + 2 {
                    return Err(Error::Incomplete);
                }
                let data = buf.copy_to_bytes(len);
                if buf.get_u8() != b'\r' || buf.get_u8() != b'\n' {
                    return Err(Error::BadEncoding);
                }
                Ok(Frame::BulkString(data))
            }
            b'*' => {
                let len = match get_length(buf)? {
                    Some(len) => len,
                    None => return Ok(Frame::Null),
                };
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(Frame::parse(buf)?);
                }
                Ok(Frame::Array(items))
            }
            _ => Err(Error::BadEncoding),
        }
    }

    /// Appends the wire representation of the frame to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::SimpleString(s) => {
                dst.put_u8(b'+');
                dst.put_slice(s.as_bytes());
                dst.put_slice(b"\r\n");
            }
            Frame::Error(e) => {
                dst.put_u8(b'-');
                dst.put_slice(e.as_bytes());
                dst.put_slice(b"\r\n");
            }
            Frame::Integer(n) => {
                dst.put_u8(b':');
                put_decimal(dst, *n);
            }
            Frame::BulkString(data) => {
                dst.put_u8(b'$');
                put_decimal(dst, data.len() as i64);
                dst.put_slice(data);
                dst.put_slice(b"\r\n");
            }
            Frame::Array(items) => {
                dst.put_u8(b'*');
                put_decimal(dst, items.len() as i64);
                for item in items {
                    item.encode(dst);
                }
            }
            // We use the bulk string representation for null
            Frame::Null => dst.put_slice(b"$-1\r\n"),
        }
    }
}

/// Reads until "\r\n" and returns the bytes in between. A carriage-return or a line-feed
/// that is not part of the terminator is rejected.
fn get_line<'a>(buf: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let data: &'a [u8] = *buf.get_ref();
    let start = buf.position() as usize;
    for (i, b) in data.iter().enumerate().skip(start) {
        match b {
            b'\r' => {
                return match data.get(i + 1) {
                    Some(b'\n') => {
                        buf.set_position((i + 2) as u64);
                        Ok(&data[start..i])
                    }
                    Some(_) => Err(Error::BadEncoding),
                    None => Err(Error::Incomplete),
                };
            }
            b'\n' => return Err(Error::BadEncoding),
            _ => {}
        }
    }
    Err(Error::Incomplete)
}

fn get_decimal(buf: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line(buf)?;
    match i64::from_radix_10_signed_checked(line) {
        (Some(n), used) if used == line.len() && line.last().map_or(false, u8::is_ascii_digit) => {
            Ok(n)
        }
        _ => Err(Error::NotInteger(
            String::from_utf8_lossy(line).into_owned(),
        )),
    }
}

/// Reads the length prefix of a bulk string or an array. Returns `None` for the null
/// length "-1".
fn get_length(buf: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    match get_decimal(buf)? {
        -1 => Ok(None),
        n => usize::try_from(n).map(Some).map_err(|_| Error::BadEncoding),
    }
}

fn get_byte(buf: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !buf.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(buf.get_u8())
}

fn skip(buf: &mut Cursor<&[u8]>, n: usize) -> Result<(), Error> {
    if buf.remaining() < n {
        return Err(Error::Incomplete);
    }
    buf.advance(n);
    Ok(())
}

fn put_decimal(dst: &mut BytesMut, n: i64) {
    dst.put_slice(n.to_string().as_bytes());
    dst.put_slice(b"\r\n");
}
