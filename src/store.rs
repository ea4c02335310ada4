//! Define the interface of a Redis store and an in-memory implementation of that interface.

mod memory;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Error;

pub use self::memory::InMemoryStore;

/// A sorted-set member returned by a range query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    /// The member's value
    pub member: Bytes,
    /// The member's score, `None` when scores were not requested
    pub score: Option<f64>,
}

/// The primitives of a Redis store used by [`RedisUtils`].
///
/// Each method maps to exactly one Redis command. Errors are returned as reported by the
/// store.
///
/// [`RedisUtils`]: crate::RedisUtils
#[async_trait]
pub trait Store: Send {
    /// GET: returns the value of a key, or `None` if the key does not exist.
    async fn get(&mut self, key: &str) -> Result<Option<Bytes>, Error>;

    /// SET: sets the value of a key, discarding any previous value and expiration.
    async fn set(&mut self, key: &str, value: Bytes) -> Result<(), Error>;

    /// SET with EX: sets the value of a key that expires after the given number of seconds.
    async fn set_ex(&mut self, key: &str, value: Bytes, seconds: i64) -> Result<(), Error>;

    /// DEL: removes a key and returns the number of keys that were removed.
    async fn del(&mut self, key: &str) -> Result<i64, Error>;

    /// HSET: sets a field of a hash table. Returns `true` if the field was created.
    async fn hset(&mut self, table: &str, field: &str, value: Bytes) -> Result<bool, Error>;

    /// HGET: returns the value of a field, or `None` if it does not exist.
    async fn hget(&mut self, table: &str, field: &str) -> Result<Option<Bytes>, Error>;

    /// HGETALL: returns all fields and their values.
    async fn hgetall(&mut self, table: &str) -> Result<Vec<(Bytes, Bytes)>, Error>;

    /// HLEN: returns the number of fields.
    async fn hlen(&mut self, table: &str) -> Result<i64, Error>;

    /// HDEL: removes a field and returns the number of fields that were removed.
    async fn hdel(&mut self, table: &str, field: &str) -> Result<i64, Error>;

    /// HKEYS: returns all field names.
    async fn hkeys(&mut self, table: &str) -> Result<Vec<Bytes>, Error>;

    /// HVALS: returns all field values.
    async fn hvals(&mut self, table: &str) -> Result<Vec<Bytes>, Error>;

    /// HEXISTS: returns whether a field exists.
    async fn hexists(&mut self, table: &str, field: &str) -> Result<bool, Error>;

    /// LPUSH: prepends a value to a list and returns the length of the list.
    async fn lpush(&mut self, key: &str, value: Bytes) -> Result<i64, Error>;

    /// LPOP: removes and returns the first value of a list, or `None` if it is empty.
    async fn lpop(&mut self, key: &str) -> Result<Option<Bytes>, Error>;

    /// LLEN: returns the length of a list.
    async fn llen(&mut self, key: &str) -> Result<i64, Error>;

    /// ZADD: adds a member or updates its score. Returns the number of members added.
    async fn zadd(&mut self, key: &str, score: f64, member: Bytes) -> Result<i64, Error>;

    /// ZRANGE: returns the members between two ranks, in score order.
    async fn zrange(
        &mut self,
        key: &str,
        start: i64,
        stop: i64,
        with_scores: bool,
    ) -> Result<Vec<ScoredMember>, Error>;
}
