use bytes::Bytes;

use super::{request, CommandParseError, CommandParser};
use crate::{error::Error, net::frame::Frame, store::Store};

/// Arguments for LPUSH command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LPush {
    key: String,
    value: Bytes,
}

impl LPush {
    /// Creates a new set of arguments
    pub fn new<S>(key: S, value: Bytes) -> Self
    where
        S: ToString,
    {
        Self {
            key: key.to_string(),
            value,
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let key = parser.string("lpush")?;
        let value = parser.bytes("lpush")?;
        parser.finish("lpush")?;
        Ok(Self { key, value })
    }

    /// Responds with the length of the list after the push.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.lpush(&self.key, self.value).await?))
    }
}

impl From<LPush> for Frame {
    fn from(cmd: LPush) -> Self {
        request("LPUSH", [Bytes::from(cmd.key), cmd.value])
    }
}

/// Arguments for LPOP command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LPop {
    key: String,
}

impl LPop {
    /// Creates a new set of arguments
    pub fn new<S>(key: S) -> Self
    where
        S: ToString,
    {
        Self {
            key: key.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let key = parser.string("lpop")?;
        parser.finish("lpop")?;
        Ok(Self { key })
    }

    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(match store.lpop(&self.key).await? {
            Some(value) => Frame::BulkString(value),
            None => Frame::Null,
        })
    }
}

impl From<LPop> for Frame {
    fn from(cmd: LPop) -> Self {
        request("LPOP", [Bytes::from(cmd.key)])
    }
}

/// Arguments for LLEN command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LLen {
    key: String,
}

impl LLen {
    /// Creates a new set of arguments
    pub fn new<S>(key: S) -> Self
    where
        S: ToString,
    {
        Self {
            key: key.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let key = parser.string("llen")?;
        parser.finish("llen")?;
        Ok(Self { key })
    }

    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.llen(&self.key).await?))
    }
}

impl From<LLen> for Frame {
    fn from(cmd: LLen) -> Self {
        request("LLEN", [Bytes::from(cmd.key)])
    }
}
