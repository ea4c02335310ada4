//! Commands operating on a hash table stored under a single key

use bytes::Bytes;

use super::{bulk_array, request, CommandParseError, CommandParser};
use crate::{error::Error, net::frame::Frame, store::Store};

/// Arguments for HSET command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HSet {
    table: String,
    field: String,
    value: Bytes,
}

impl HSet {
    /// Creates a new set of arguments
    pub fn new<S, F>(table: S, field: F, value: Bytes) -> Self
    where
        S: ToString,
        F: ToString,
    {
        Self {
            table: table.to_string(),
            field: field.to_string(),
            value,
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let table = parser.string("hset")?;
        let field = parser.string("hset")?;
        let value = parser.bytes("hset")?;
        parser.finish("hset")?;
        Ok(Self {
            table,
            field,
            value,
        })
    }

    /// Responds with the number of fields that were added.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        let created = store.hset(&self.table, &self.field, self.value).await?;
        Ok(Frame::Integer(created as i64))
    }
}

impl From<HSet> for Frame {
    fn from(cmd: HSet) -> Self {
        request(
            "HSET",
            [Bytes::from(cmd.table), Bytes::from(cmd.field), cmd.value],
        )
    }
}

/// Arguments for HGET command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HGet {
    table: String,
    field: String,
}

impl HGet {
    /// Creates a new set of arguments
    pub fn new<S, F>(table: S, field: F) -> Self
    where
        S: ToString,
        F: ToString,
    {
        Self {
            table: table.to_string(),
            field: field.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let table = parser.string("hget")?;
        let field = parser.string("hget")?;
        parser.finish("hget")?;
        Ok(Self { table, field })
    }

    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(match store.hget(&self.table, &self.field).await? {
            Some(value) => Frame::BulkString(value),
            None => Frame::Null,
        })
    }
}

impl From<HGet> for Frame {
    fn from(cmd: HGet) -> Self {
        request("HGET", [Bytes::from(cmd.table), Bytes::from(cmd.field)])
    }
}

/// Arguments for HGETALL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HGetAll {
    table: String,
}

impl HGetAll {
    /// Creates a new set of arguments
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let table = parser.string("hgetall")?;
        parser.finish("hgetall")?;
        Ok(Self { table })
    }

    /// Responds with a flat array of alternating fields and values.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        let pairs = store.hgetall(&self.table).await?;
        let mut items = Vec::with_capacity(pairs.len() * 2);
        for (field, value) in pairs {
            items.push(field);
            items.push(value);
        }
        Ok(bulk_array(items))
    }
}

impl From<HGetAll> for Frame {
    fn from(cmd: HGetAll) -> Self {
        request("HGETALL", [Bytes::from(cmd.table)])
    }
}

/// Arguments for HLEN command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HLen {
    table: String,
}

impl HLen {
    /// Creates a new set of arguments
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let table = parser.string("hlen")?;
        parser.finish("hlen")?;
        Ok(Self { table })
    }

    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.hlen(&self.table).await?))
    }
}

impl From<HLen> for Frame {
    fn from(cmd: HLen) -> Self {
        request("HLEN", [Bytes::from(cmd.table)])
    }
}

/// Arguments for HDEL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HDel {
    table: String,
    field: String,
}

impl HDel {
    /// Creates a new set of arguments
    pub fn new<S, F>(table: S, field: F) -> Self
    where
        S: ToString,
        F: ToString,
    {
        Self {
            table: table.to_string(),
            field: field.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let table = parser.string("hdel")?;
        let field = parser.string("hdel")?;
        parser.finish("hdel")?;
        Ok(Self { table, field })
    }

    /// Responds with the number of fields that were removed.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.hdel(&self.table, &self.field).await?))
    }
}

impl From<HDel> for Frame {
    fn from(cmd: HDel) -> Self {
        request("HDEL", [Bytes::from(cmd.table), Bytes::from(cmd.field)])
    }
}

/// Arguments for HKEYS command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HKeys {
    table: String,
}

impl HKeys {
    /// Creates a new set of arguments
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let table = parser.string("hkeys")?;
        parser.finish("hkeys")?;
        Ok(Self { table })
    }

    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(bulk_array(store.hkeys(&self.table).await?))
    }
}

impl From<HKeys> for Frame {
    fn from(cmd: HKeys) -> Self {
        request("HKEYS", [Bytes::from(cmd.table)])
    }
}

/// Arguments for HVALS command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HVals {
    table: String,
}

impl HVals {
    /// Creates a new set of arguments
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let table = parser.string("hvals")?;
        parser.finish("hvals")?;
        Ok(Self { table })
    }

    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(bulk_array(store.hvals(&self.table).await?))
    }
}

impl From<HVals> for Frame {
    fn from(cmd: HVals) -> Self {
        request("HVALS", [Bytes::from(cmd.table)])
    }
}

/// Arguments for HEXISTS command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HExists {
    table: String,
    field: String,
}

impl HExists {
    /// Creates a new set of arguments
    pub fn new<S, F>(table: S, field: F) -> Self
    where
        S: ToString,
        F: ToString,
    {
        Self {
            table: table.to_string(),
            field: field.to_string(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let table = parser.string("hexists")?;
        let field = parser.string("hexists")?;
        parser.finish("hexists")?;
        Ok(Self { table, field })
    }

    /// Responds with 1 if the field exists, 0 otherwise.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        let exists = store.hexists(&self.table, &self.field).await?;
        Ok(Frame::Integer(exists as i64))
    }
}

impl From<HExists> for Frame {
    fn from(cmd: HExists) -> Self {
        request("HEXISTS", [Bytes::from(cmd.table), Bytes::from(cmd.field)])
    }
}
