//! Implementations for the set of Redis commands used by [`RedisUtils`].
//!
//! Every command has an associated struct holding its arguments. A command can be turned into
//! the request frame sent by the client, parsed back from that frame on the server, and applied
//! to a [`Store`].
//!
//! [`RedisUtils`]: crate::RedisUtils
//! [`Store`]: crate::Store

mod hash;
mod list;
mod parser;
mod string;
mod zset;

use std::convert::TryFrom;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::{
    connection::{Connection, ConnectionError},
    frame::Frame,
};
use crate::{error::Error, store::Store};

pub use self::{
    hash::{HDel, HExists, HGet, HGetAll, HKeys, HLen, HSet, HVals},
    list::{LLen, LPop, LPush},
    parser::{CommandParseError, CommandParser},
    string::{Del, Get, Set},
    zset::{ZAdd, ZRange},
};

/// Enumeration of all the supported Redis commands. Each commands
/// will have an associated struct that contains its arguments' data
#[derive(Debug, PartialEq)]
pub enum Command {
    /// GET key
    Get(Get),
    /// SET key value [EX seconds]
    Set(Set),
    /// DEL key [key ...]
    Del(Del),
    /// HSET key field value
    HSet(HSet),
    /// HGET key field
    HGet(HGet),
    /// HGETALL key
    HGetAll(HGetAll),
    /// HLEN key
    HLen(HLen),
    /// HDEL key field
    HDel(HDel),
    /// HKEYS key
    HKeys(HKeys),
    /// HVALS key
    HVals(HVals),
    /// HEXISTS key field
    HExists(HExists),
    /// LPUSH key element
    LPush(LPush),
    /// LPOP key
    LPop(LPop),
    /// LLEN key
    LLen(LLen),
    /// ZADD key score member
    ZAdd(ZAdd),
    /// ZRANGE key start stop [WITHSCORES]
    ZRange(ZRange),
}

impl Command {
    /// Applies the command to the store and sends back a response through the connection.
    ///
    /// Failures reported by the store are sent to the peer as error frames, only failures
    /// of the connection itself are returned.
    #[tracing::instrument(skip(store, connection))]
    pub async fn apply<S, T>(
        self,
        store: &mut S,
        connection: &mut Connection<T>,
    ) -> Result<(), ConnectionError>
    where
        S: Store,
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let result = match self {
            Command::Get(cmd) => cmd.apply(store).await,
            Command::Set(cmd) => cmd.apply(store).await,
            Command::Del(cmd) => cmd.apply(store).await,
            Command::HSet(cmd) => cmd.apply(store).await,
            Command::HGet(cmd) => cmd.apply(store).await,
            Command::HGetAll(cmd) => cmd.apply(store).await,
            Command::HLen(cmd) => cmd.apply(store).await,
            Command::HDel(cmd) => cmd.apply(store).await,
            Command::HKeys(cmd) => cmd.apply(store).await,
            Command::HVals(cmd) => cmd.apply(store).await,
            Command::HExists(cmd) => cmd.apply(store).await,
            Command::LPush(cmd) => cmd.apply(store).await,
            Command::LPop(cmd) => cmd.apply(store).await,
            Command::LLen(cmd) => cmd.apply(store).await,
            Command::ZAdd(cmd) => cmd.apply(store).await,
            Command::ZRange(cmd) => cmd.apply(store).await,
        };

        let response = match result {
            Ok(frame) => frame,
            Err(err) => error_reply(err),
        };
        debug!(?response);

        connection.write_frame(&response).await
    }
}

impl TryFrom<Frame> for Command {
    type Error = CommandParseError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        let mut parser = CommandParser::new(frame)?;
        let name = parser
            .next_string()?
            .ok_or_else(|| CommandParseError::UnknownCommand(String::new()))?;

        let cmd = match name.to_ascii_lowercase().as_str() {
            "get" => Command::Get(Get::parse_frames(&mut parser)?),
            "set" => Command::Set(Set::parse_frames(&mut parser)?),
            "del" => Command::Del(Del::parse_frames(&mut parser)?),
            "hset" => Command::HSet(HSet::parse_frames(&mut parser)?),
            "hget" => Command::HGet(HGet::parse_frames(&mut parser)?),
            "hgetall" => Command::HGetAll(HGetAll::parse_frames(&mut parser)?),
            "hlen" => Command::HLen(HLen::parse_frames(&mut parser)?),
            "hdel" => Command::HDel(HDel::parse_frames(&mut parser)?),
            "hkeys" => Command::HKeys(HKeys::parse_frames(&mut parser)?),
            "hvals" => Command::HVals(HVals::parse_frames(&mut parser)?),
            "hexists" => Command::HExists(HExists::parse_frames(&mut parser)?),
            "lpush" => Command::LPush(LPush::parse_frames(&mut parser)?),
            "lpop" => Command::LPop(LPop::parse_frames(&mut parser)?),
            "llen" => Command::LLen(LLen::parse_frames(&mut parser)?),
            "zadd" => Command::ZAdd(ZAdd::parse_frames(&mut parser)?),
            "zrange" => Command::ZRange(ZRange::parse_frames(&mut parser)?),
            _ => return Err(CommandParseError::UnknownCommand(name)),
        };
        Ok(cmd)
    }
}

/// Converts an error into the frame sent back to the peer. Error replies coming from a store
/// already carry their error code and are forwarded as they are.
pub(crate) fn error_reply(err: Error) -> Frame {
    match err {
        Error::Command(msg) => Frame::Error(msg),
        err => Frame::Error(format!("ERR {}", err)),
    }
}

/// Builds a request frame out of the command name and its arguments.
fn request<I>(name: &'static str, args: I) -> Frame
where
    I: IntoIterator<Item = Bytes>,
{
    let mut items = vec![Frame::BulkString(Bytes::from_static(name.as_bytes()))];
    items.extend(args.into_iter().map(Frame::BulkString));
    Frame::Array(items)
}

fn bulk_array(items: Vec<Bytes>) -> Frame {
    Frame::Array(items.into_iter().map(Frame::BulkString).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get_ok() {
        assert_command(&[b"GET", b"hello"], Command::Get(Get::new("hello")));
        assert_command(&[b"get", b"hello"], Command::Get(Get::new("hello")));
    }

    #[test]
    fn parse_get_wrong_arity() {
        assert_error(&[b"GET"], CommandParseError::WrongArity("get"));
        assert_error(
            &[b"GET", b"hello", b"world"],
            CommandParseError::WrongArity("get"),
        );
    }

    #[test]
    fn parse_set_ok() {
        assert_command(
            &[b"SET", b"hello", b"world"],
            Command::Set(Set::new("hello", "world".into())),
        );
        assert_command(
            &[b"SET", b"hello", b"world", b"ex", b"10"],
            Command::Set(Set::new("hello", "world".into()).expire(10)),
        );
    }

    #[test]
    fn parse_set_bad_options() {
        assert_error(
            &[b"SET", b"hello", b"world", b"PX", b"10"],
            CommandParseError::Syntax,
        );
        assert_error(
            &[b"SET", b"hello", b"world", b"EX"],
            CommandParseError::Syntax,
        );
        assert_error(
            &[b"SET", b"hello", b"world", b"EX", b"soon"],
            CommandParseError::NotInteger,
        );
    }

    #[test]
    fn parse_del_ok() {
        assert_command(&[b"DEL", b"a"], Command::Del(Del::new(&["a"])));
        assert_command(&[b"DEL", b"a", b"b"], Command::Del(Del::new(&["a", "b"])));
        assert_error(&[b"DEL"], CommandParseError::WrongArity("del"));
    }

    #[test]
    fn parse_hash_commands_ok() {
        assert_command(
            &[b"HSET", b"t", b"f", b"v"],
            Command::HSet(HSet::new("t", "f", "v".into())),
        );
        assert_command(&[b"HGET", b"t", b"f"], Command::HGet(HGet::new("t", "f")));
        assert_command(&[b"HGETALL", b"t"], Command::HGetAll(HGetAll::new("t")));
        assert_command(&[b"HLEN", b"t"], Command::HLen(HLen::new("t")));
        assert_command(&[b"HDEL", b"t", b"f"], Command::HDel(HDel::new("t", "f")));
        assert_command(&[b"HKEYS", b"t"], Command::HKeys(HKeys::new("t")));
        assert_command(&[b"HVALS", b"t"], Command::HVals(HVals::new("t")));
        assert_command(
            &[b"HEXISTS", b"t", b"f"],
            Command::HExists(HExists::new("t", "f")),
        );
        assert_error(&[b"HSET", b"t", b"f"], CommandParseError::WrongArity("hset"));
    }

    #[test]
    fn parse_list_commands_ok() {
        assert_command(
            &[b"LPUSH", b"l", b"a"],
            Command::LPush(LPush::new("l", "a".into())),
        );
        assert_command(&[b"LPOP", b"l"], Command::LPop(LPop::new("l")));
        assert_command(&[b"LLEN", b"l"], Command::LLen(LLen::new("l")));
    }

    #[test]
    fn parse_zset_commands_ok() {
        assert_command(
            &[b"ZADD", b"z", b"1.5", b"x"],
            Command::ZAdd(ZAdd::new("z", 1.5, "x".into())),
        );
        assert_command(
            &[b"ZADD", b"z", b"-inf", b"x"],
            Command::ZAdd(ZAdd::new("z", f64::NEG_INFINITY, "x".into())),
        );
        assert_command(
            &[b"ZRANGE", b"z", b"0", b"-1"],
            Command::ZRange(ZRange::new("z", 0, -1, false)),
        );
        assert_command(
            &[b"ZRANGE", b"z", b"0", b"-1", b"WithScores"],
            Command::ZRange(ZRange::new("z", 0, -1, true)),
        );
        assert_error(&[b"ZADD", b"z", b"nan", b"x"], CommandParseError::NotFloat);
        assert_error(
            &[b"ZRANGE", b"z", b"0", b"-1", b"REV"],
            CommandParseError::Syntax,
        );
    }

    #[test]
    fn parse_invalid_command() {
        assert_error(
            &[b"INVALID"],
            CommandParseError::UnknownCommand("INVALID".into()),
        );
        assert_error(&[], CommandParseError::UnknownCommand(String::new()));

        let err = Command::try_from(Frame::SimpleString("GET".into())).unwrap_err();
        assert_eq!(
            err,
            CommandParseError::BadFrame(Frame::SimpleString("GET".into()))
        );
    }

    #[test]
    fn request_frame_parses_back() {
        let commands = vec![
            Command::Set(Set::new("k", "v".into()).expire(5)),
            Command::Del(Del::new(&["k"])),
            Command::HSet(HSet::new("t", "f", "v".into())),
            Command::ZAdd(ZAdd::new("z", 9.0, "x".into())),
            Command::ZRange(ZRange::new("z", 0, -1, true)),
        ];
        for cmd in commands {
            let frame = match &cmd {
                Command::Set(c) => Frame::from(c.clone()),
                Command::Del(c) => Frame::from(c.clone()),
                Command::HSet(c) => Frame::from(c.clone()),
                Command::ZAdd(c) => Frame::from(c.clone()),
                Command::ZRange(c) => Frame::from(c.clone()),
                _ => unreachable!(),
            };
            assert_eq!(Command::try_from(frame).unwrap(), cmd);
        }
    }

    fn assert_command(args: &[&[u8]], cmd: Command) {
        let parsed = Command::try_from(frame_of(args)).unwrap();
        assert_eq!(parsed, cmd);
    }

    fn assert_error(args: &[&[u8]], err: CommandParseError) {
        let parsed_err = Command::try_from(frame_of(args)).unwrap_err();
        assert_eq!(parsed_err, err);
    }

    fn frame_of(args: &[&[u8]]) -> Frame {
        Frame::Array(
            args.iter()
                .map(|a| Frame::BulkString(Bytes::copy_from_slice(a)))
                .collect(),
        )
    }
}
