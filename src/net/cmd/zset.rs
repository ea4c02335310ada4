//! Commands operating on sorted sets

use bytes::Bytes;

use super::{request, CommandParseError, CommandParser};
use crate::{error::Error, net::frame::Frame, store::Store};

/// Arguments for ZADD command
#[derive(Debug, Clone, PartialEq)]
pub struct ZAdd {
    key: String,
    score: f64,
    member: Bytes,
}

impl ZAdd {
    /// Creates a new set of arguments
    pub fn new<S>(key: S, score: f64, member: Bytes) -> Self
    where
        S: ToString,
    {
        Self {
            key: key.to_string(),
            score,
            member,
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let key = parser.string("zadd")?;
        let score = parser.float("zadd")?;
        let member = parser.bytes("zadd")?;
        parser.finish("zadd")?;
        Ok(Self { key, score, member })
    }

    /// Responds with the number of members that were added, not counting score updates.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        Ok(Frame::Integer(
            store.zadd(&self.key, self.score, self.member).await?,
        ))
    }
}

impl From<ZAdd> for Frame {
    fn from(cmd: ZAdd) -> Self {
        request(
            "ZADD",
            [
                Bytes::from(cmd.key),
                Bytes::from(cmd.score.to_string()),
                cmd.member,
            ],
        )
    }
}

/// Arguments for ZRANGE command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZRange {
    key: String,
    start: i64,
    stop: i64,
    with_scores: bool,
}

impl ZRange {
    /// Creates a new set of arguments. Negative indices count from the end of the set.
    pub fn new<S>(key: S, start: i64, stop: i64, with_scores: bool) -> Self
    where
        S: ToString,
    {
        Self {
            key: key.to_string(),
            start,
            stop,
            with_scores,
        }
    }

    pub(super) fn parse_frames(parser: &mut CommandParser) -> Result<Self, CommandParseError> {
        let key = parser.string("zrange")?;
        let start = parser.integer("zrange")?;
        let stop = parser.integer("zrange")?;
        let with_scores = match parser.next_string()? {
            Some(opt) if opt.eq_ignore_ascii_case("withscores") => true,
            Some(_) => return Err(CommandParseError::Syntax),
            None => false,
        };
        parser.finish("zrange")?;
        Ok(Self {
            key,
            start,
            stop,
            with_scores,
        })
    }

    /// Responds with the members in score order, each one followed by its score when
    /// scores are requested.
    pub(super) async fn apply<S: Store>(self, store: &mut S) -> Result<Frame, Error> {
        let members = store
            .zrange(&self.key, self.start, self.stop, self.with_scores)
            .await?;
        let mut items = Vec::with_capacity(members.len() * 2);
        for m in members {
            items.push(Frame::BulkString(m.member));
            if let Some(score) = m.score {
                items.push(Frame::BulkString(Bytes::from(score.to_string())));
            }
        }
        Ok(Frame::Array(items))
    }
}

impl From<ZRange> for Frame {
    fn from(cmd: ZRange) -> Self {
        let mut args = vec![
            Bytes::from(cmd.key),
            Bytes::from(cmd.start.to_string()),
            Bytes::from(cmd.stop.to_string()),
        ];
        if cmd.with_scores {
            args.push(Bytes::from_static(b"WITHSCORES"));
        }
        request("ZRANGE", args)
    }
}
