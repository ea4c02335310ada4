use bytes::Bytes;

use super::{request, CommandParseError, CommandParser};
use crate::{error::Error, net::frame::Frame, store::Store};

/// Arguments for GET command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Get {
    key: String,
}

impl Get {
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
        let key = parser.string("get")?;
        parser.finish("get")?;
        Ok(Self { key })
    }

    /// Responds with the key's value, or a null frame when the key does not exist.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(match store.get(&self.key).await? {
            Some(value) => Frame::BulkString(value),
            None => Frame::Null,
        })
    }
}

impl From<Get> for Frame {
    fn from(cmd: Get) -> Self {
        request("GET", [Bytes::from(cmd.key)])
    }
}

/// Arguments for SET command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    /// The key to set a value to
    key: String,
    /// The value to be set
    value: Bytes,
    /// Number of seconds until the key expires
    expire: Option<i64>,
}

impl Set {
    /// Creates a new set of arguments
    pub fn new<S>(key: S, value: Bytes) -> Self
    where
        S: ToString,
    {
        Self {
            key: key.to_string(),
            value,
            expire: None,
        }
    }

    /// Sets the `EX` option. The number of seconds is sent as given, the store decides
    /// whether it is valid.
    pub fn expire(mut self, seconds: i64) -> Self {
        self.expire = Some(seconds);
        self
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let key = parser.string("set")?;
        let value = parser.bytes("set")?;
        let mut expire = None;
        while let Some(opt) = parser.next_string()? {
            if !opt.eq_ignore_ascii_case("ex") {
                return Err(CommandParseError::Syntax);
            }
            let seconds = parser.integer("set").map_err(|e| match e {
                CommandParseError::WrongArity(_) => CommandParseError::Syntax,
                e => e,
            })?;
            expire = Some(seconds);
        }
        Ok(Self { key, value, expire })
    }

    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        match self.expire {
            Some(seconds) => store.set_ex(&self.key, self.value, seconds).await?,
            None => store.set(&self.key, self.value).await?,
        }
        Ok(Frame::SimpleString("OK".to_string()))
    }
}

impl From<Set> for Frame {
    fn from(cmd: Set) -> Self {
        let mut args = vec![Bytes::from(cmd.key), cmd.value];
        if let Some(seconds) = cmd.expire {
            args.push(Bytes::from_static(b"EX"));
            args.push(Bytes::from(seconds.to_string()));
        }
        request("SET", args)
    }
}

/// Arguments for DEL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Del {
    keys: Vec<String>,
}

impl Del {
    /// Creates a new set of arguments.
    ///
    /// DEL requires that the list of keys must have at least 1 element
    pub fn new<S>(keys: &[S]) -> Self
    where
        S: ToString,
    {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let mut keys = vec![parser.string("del")?];
        while let Some(key) = parser.next_string()? {
            keys.push(key);
        }
        Ok(Self { keys })
    }

    /// Responds with the number of keys that were removed.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        let mut count = 0;
        for key in &self.keys {
            count += store.del(key).await?;
        }
        Ok(Frame::Integer(count))
    }
}

impl From<Del> for Frame {
    fn from(cmd: Del) -> Self {
        request("DEL", cmd.keys.into_iter().map(Bytes::from))
    }
}
