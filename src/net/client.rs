use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use super::{
    cmd::{
        Del, Get, HDel, HExists, HGet, HGetAll, HKeys, HLen, HSet, HVals, LLen, LPop, LPush, Set,
        ZAdd, ZRange,
    },
    connection::Connection,
    frame::Frame,
};
use crate::{
    error::Error,
    store::{ScoredMember, Store},
};

/// Provide methods and hold states for manging a connection to a Redis server.
///
/// A connection can be established using the [`connect`] function. Once a connection is
/// established, requests are sent through the [`Store`] methods. Each request waits for its
/// reply before returning. The connection is closed when the client is dropped.
///
/// [`connect`]: Client::connect
#[derive(Debug)]
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Attempt to connect to the Redis server located at the given address.
    ///
    /// Returns a [`Client`] if a connection address exists and we can establish a connection
    /// with the address.
    pub async fn connect<A>(addr: A) -> Result<Self, std::io::Error>
    where
        A: ToSocketAddrs,
    {
        let tcp = TcpStream::connect(addr).await?;
        let conn = Connection::new(tcp);
        Ok(Self { conn })
    }

    async fn request(&mut self, frame: Frame) -> Result<Frame, Error> {
        debug!(request = ?frame);
        self.conn.write_frame(&frame).await?;
        self.read_response().await
    }

    async fn read_response(&mut self) -> Result<Frame, Error> {
        let frame = self.conn.read_frame().await?;
        debug!(response = ?frame);

        match frame {
            Some(Frame::Error(err)) => Err(Error::Command(err)),
            Some(frame) => Ok(frame),
            None => {
                // Server closes socket without sending data
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by server",
                )
                .into())
            }
        }
    }
}

#[async_trait]
impl Store for Client {
    #[tracing::instrument(skip(self))]
    async fn get(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        let response = self.request(Get::new(key).into()).await?;
        optional_bulk(response)
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&mut self, key: &str, value: Bytes) -> Result<(), Error> {
        let response = self.request(Set::new(key, value).into()).await?;
        expect_ok(response)
    }

    #[tracing::instrument(skip(self, value))]
    async fn set_ex(&mut self, key: &str, value: Bytes, seconds: i64) -> Result<(), Error> {
        let response = self
            .request(Set::new(key, value).expire(seconds).into())
            .await?;
        expect_ok(response)
    }

    #[tracing::instrument(skip(self))]
    async fn del(&mut self, key: &str) -> Result<i64, Error> {
        let response = self.request(Del::new(&[key]).into()).await?;
        integer(response)
    }

    #[tracing::instrument(skip(self, value))]
    async fn hset(&mut self, table: &str, field: &str, value: Bytes) -> Result<bool, Error> {
        let response = self.request(HSet::new(table, field, value).into()).await?;
        Ok(integer(response)? > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn hget(&mut self, table: &str, field: &str) -> Result<Option<Bytes>, Error> {
        let response = self.request(HGet::new(table, field).into()).await?;
        optional_bulk(response)
    }

    #[tracing::instrument(skip(self))]
    async fn hgetall(&mut self, table: &str) -> Result<Vec<(Bytes, Bytes)>, Error> {
        let response = self.request(HGetAll::new(table).into()).await?;
        let mut items = bulk_list(response)?.into_iter();
        let mut pairs = Vec::with_capacity(items.len() / 2);
        while let Some(field) = items.next() {
            let value = items
                .next()
                .ok_or_else(|| Error::UnexpectedFrame(Frame::BulkString(field.clone())))?;
            pairs.push((field, value));
        }
        Ok(pairs)
    }

    #[tracing::instrument(skip(self))]
    async fn hlen(&mut self, table: &str) -> Result<i64, Error> {
        let response = self.request(HLen::new(table).into()).await?;
        integer(response)
    }

    #[tracing::instrument(skip(self))]
    async fn hdel(&mut self, table: &str, field: &str) -> Result<i64, Error> {
        let response = self.request(HDel::new(table, field).into()).await?;
        integer(response)
    }

    #[tracing::instrument(skip(self))]
    async fn hkeys(&mut self, table: &str) -> Result<Vec<Bytes>, Error> {
        let response = self.request(HKeys::new(table).into()).await?;
        bulk_list(response)
    }

    #[tracing::instrument(skip(self))]
    async fn hvals(&mut self, table: &str) -> Result<Vec<Bytes>, Error> {
        let response = self.request(HVals::new(table).into()).await?;
        bulk_list(response)
    }

    #[tracing::instrument(skip(self))]
    async fn hexists(&mut self, table: &str, field: &str) -> Result<bool, Error> {
        let response = self.request(HExists::new(table, field).into()).await?;
        Ok(integer(response)? == 1)
    }

    #[tracing::instrument(skip(self, value))]
    async fn lpush(&mut self, key: &str, value: Bytes) -> Result<i64, Error> {
        let response = self.request(LPush::new(key, value).into()).await?;
        integer(response)
    }

    #[tracing::instrument(skip(self))]
    async fn lpop(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        let response = self.request(LPop::new(key).into()).await?;
        optional_bulk(response)
    }

    #[tracing::instrument(skip(self))]
    async fn llen(&mut self, key: &str) -> Result<i64, Error> {
        let response = self.request(LLen::new(key).into()).await?;
        integer(response)
    }

    #[tracing::instrument(skip(self, member))]
    async fn zadd(&mut self, key: &str, score: f64, member: Bytes) -> Result<i64, Error> {
        let response = self.request(ZAdd::new(key, score, member).into()).await?;
        integer(response)
    }

    #[tracing::instrument(skip(self))]
    async fn zrange(
        &mut self,
        key: &str,
        start: i64,
        stop: i64,
        with_scores: bool,
    ) -> Result<Vec<ScoredMember>, Error> {
        let response = self
            .request(ZRange::new(key, start, stop, with_scores).into())
            .await?;
        let mut items = bulk_list(response)?.into_iter();
        let mut members = Vec::with_capacity(items.len());
        while let Some(member) = items.next() {
            let score = if with_scores {
                let raw = items
                    .next()
                    .ok_or_else(|| Error::UnexpectedFrame(Frame::BulkString(member.clone())))?;
                Some(parse_score(raw)?)
            } else {
                None
            };
            members.push(ScoredMember { member, score });
        }
        Ok(members)
    }
}

fn expect_ok(frame: Frame) -> Result<(), Error> {
    match frame {
        Frame::SimpleString(s) if s == "OK" => Ok(()),
        frame => Err(Error::UnexpectedFrame(frame)),
    }
}

fn integer(frame: Frame) -> Result<i64, Error> {
    match frame {
        Frame::Integer(n) => Ok(n),
        frame => Err(Error::UnexpectedFrame(frame)),
    }
}

/// Both `Simple` and `Bulk` frames are accepted. `Null` represents the value not being
/// present and `None` is returned.
fn optional_bulk(frame: Frame) -> Result<Option<Bytes>, Error> {
    match frame {
        Frame::BulkString(b) => Ok(Some(b)),
        Frame::SimpleString(s) => Ok(Some(Bytes::from(s))),
        Frame::Null => Ok(None),
        frame => Err(Error::UnexpectedFrame(frame)),
    }
}

fn bulk_list(frame: Frame) -> Result<Vec<Bytes>, Error> {
    match frame {
        Frame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Frame::BulkString(b) => Ok(b),
                item => Err(Error::UnexpectedFrame(item)),
            })
            .collect(),
        frame => Err(Error::UnexpectedFrame(frame)),
    }
}

fn parse_score(raw: Bytes) -> Result<f64, Error> {
    std::str::from_utf8(&raw)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| Error::UnexpectedFrame(Frame::BulkString(raw.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_score_accepts_redis_formats() {
        assert_eq!(parse_score("9".into()).unwrap(), 9.0);
        assert_eq!(parse_score("1.5".into()).unwrap(), 1.5);
        assert_eq!(parse_score("-inf".into()).unwrap(), f64::NEG_INFINITY);
        assert_eq!(parse_score("1e+20".into()).unwrap(), 1e20);
        assert!(parse_score("x".into()).is_err());
    }

    #[test]
    fn unexpected_reply_shapes_are_errors() {
        assert!(matches!(
            integer(Frame::Null),
            Err(Error::UnexpectedFrame(Frame::Null))
        ));
        assert!(expect_ok(Frame::SimpleString("QUEUED".into())).is_err());
        assert!(bulk_list(Frame::Array(vec![Frame::Integer(1)])).is_err());
        assert_eq!(optional_bulk(Frame::Null).unwrap(), None);
    }
}
