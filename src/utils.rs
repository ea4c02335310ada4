//! Convenience operations over a single store handle.

use bytes::Bytes;

use crate::{
    conf::ClientConfig,
    error::Error,
    net::Client,
    store::{ScoredMember, Store},
};

/// Wraps one store handle and forwards each operation to the matching Redis command.
///
/// Hash operations target the table the facade was created with. Other tables are reached
/// through [`RedisUtils::table`]. Apart from skipping [`hash_set`] and [`hash_del`] on blank
/// input, nothing is validated, retried or translated: the store's reply, or its error, is
/// returned as it is.
///
/// [`hash_set`]: RedisUtils::hash_set
/// [`hash_del`]: RedisUtils::hash_del
#[derive(Debug)]
pub struct RedisUtils<S = Client> {
    store: S,
    hash: String,
}

impl RedisUtils<Client> {
    /// Connects to the server described by the configuration.
    pub async fn connect(conf: &ClientConfig) -> Result<Self, Error> {
        let client = Client::connect(conf.addr()).await?;
        Ok(Self::new(client, conf.hash.clone()))
    }
}

impl<S: Store> RedisUtils<S> {
    /// Wraps an existing store handle. `hash` names the table used by the `hash_*` operations.
    pub fn new<H>(store: S, hash: H) -> Self
    where
        H: ToString,
    {
        Self {
            store,
            hash: hash.to_string(),
        }
    }

    /// Name of the default hash table.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Returns a handle bound to another hash table, sharing this facade's store.
    pub fn table<'a>(&'a mut self, name: &'a str) -> HashTable<'a, S> {
        HashTable {
            store: &mut self.store,
            name,
        }
    }

    fn default_table(&mut self) -> HashTable<'_, S> {
        HashTable {
            store: &mut self.store,
            name: &self.hash,
        }
    }

    /// Adds a member to the sorted set, or updates its score if it is already there.
    /// Returns the number of members added.
    pub async fn sorted_set_add<V>(&mut self, key: &str, score: f64, value: V) -> Result<i64, Error>
    where
        V: Into<Bytes>,
    {
        self.store.zadd(key, score, value.into()).await
    }

    /// Returns the members ranked from `start` to `end` inclusive, in score order. Negative
    /// ranks count from the end, so `(0, -1)` selects everything.
    pub async fn sorted_set_range(
        &mut self,
        key: &str,
        start: i64,
        end: i64,
        with_scores: bool,
    ) -> Result<Vec<ScoredMember>, Error> {
        self.store.zrange(key, start, end, with_scores).await
    }

    /// Prepends a value to the list and returns the list's new length.
    pub async fn list_push_left<V>(&mut self, key: &str, value: V) -> Result<i64, Error>
    where
        V: Into<Bytes>,
    {
        self.store.lpush(key, value.into()).await
    }

    /// Removes and returns the left-most value of the list.
    pub async fn list_pop_left(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        self.store.lpop(key).await
    }

    /// Length of the list, 0 if it does not exist.
    pub async fn list_size(&mut self, key: &str) -> Result<i64, Error> {
        self.store.llen(key).await
    }

    /// See [`HashTable::set`].
    pub async fn hash_set<V>(&mut self, key: &str, value: V) -> Result<Option<bool>, Error>
    where
        V: Into<Bytes>,
    {
        self.default_table().set(key, value).await
    }

    /// See [`HashTable::get`].
    pub async fn hash_get(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        self.default_table().get(key).await
    }

    /// See [`HashTable::get_all`].
    pub async fn hash_get_all(&mut self) -> Result<Vec<(Bytes, Bytes)>, Error> {
        self.default_table().get_all().await
    }

    /// See [`HashTable::len`].
    pub async fn hash_len(&mut self) -> Result<i64, Error> {
        self.default_table().len().await
    }

    /// See [`HashTable::del`].
    pub async fn hash_del(&mut self, key: &str) -> Result<Option<i64>, Error> {
        self.default_table().del(key).await
    }

    /// See [`HashTable::keys`].
    pub async fn hash_keys(&mut self) -> Result<Vec<Bytes>, Error> {
        self.default_table().keys().await
    }

    /// See [`HashTable::vals`].
    pub async fn hash_vals(&mut self) -> Result<Vec<Bytes>, Error> {
        self.default_table().vals().await
    }

    /// See [`HashTable::exists`].
    pub async fn hash_exists(&mut self, key: &str) -> Result<bool, Error> {
        self.default_table().exists(key).await
    }

    /// Sets the value of a key. With `expires` at 0 the key never expires, any other number
    /// of seconds is handed to the store as the key's time to live.
    pub async fn set<V>(&mut self, key: &str, value: V, expires: i64) -> Result<(), Error>
    where
        V: Into<Bytes>,
    {
        if expires == 0 {
            self.store.set(key, value.into()).await
        } else {
            self.store.set_ex(key, value.into(), expires).await
        }
    }

    /// Returns the value of a key, or `None` if it does not exist.
    pub async fn get(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        self.store.get(key).await
    }

    /// Removes a key and returns the number of keys removed.
    pub async fn delete(&mut self, key: &str) -> Result<i64, Error> {
        self.store.del(key).await
    }

    /// Releases the facade and returns the store handle.
    pub fn into_inner(self) -> S {
        self.store
    }
}

/// A hash table bound to a name, borrowed from a [`RedisUtils`].
#[derive(Debug)]
pub struct HashTable<'a, S> {
    store: &'a mut S,
    name: &'a str,
}

impl<'a, S: Store> HashTable<'a, S> {
    /// Name of the table.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Sets a field. Nothing is sent when the field or the value is blank (empty or `"0"`),
    /// in which case `None` is returned. Otherwise returns whether the field was created.
    pub async fn set<V>(&mut self, key: &str, value: V) -> Result<Option<bool>, Error>
    where
        V: Into<Bytes>,
    {
        let value = value.into();
        if is_blank(key.as_bytes()) || is_blank(&value) {
            return Ok(None);
        }
        self.store.hset(self.name, key, value).await.map(Some)
    }

    /// Returns the value of a field.
    pub async fn get(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        self.store.hget(self.name, key).await
    }

    /// Returns every field with its value.
    pub async fn get_all(&mut self) -> Result<Vec<(Bytes, Bytes)>, Error> {
        self.store.hgetall(self.name).await
    }

    /// Number of fields in the table.
    pub async fn len(&mut self) -> Result<i64, Error> {
        self.store.hlen(self.name).await
    }

    /// Removes a field and returns the number of fields removed. Nothing is sent when the
    /// field is blank (empty or `"0"`), in which case `None` is returned.
    pub async fn del(&mut self, key: &str) -> Result<Option<i64>, Error> {
        if is_blank(key.as_bytes()) {
            return Ok(None);
        }
        self.store.hdel(self.name, key).await.map(Some)
    }

    /// Names of all fields.
    pub async fn keys(&mut self) -> Result<Vec<Bytes>, Error> {
        self.store.hkeys(self.name).await
    }

    /// Values of all fields.
    pub async fn vals(&mut self) -> Result<Vec<Bytes>, Error> {
        self.store.hvals(self.name).await
    }

    /// Whether the field exists.
    pub async fn exists(&mut self, key: &str) -> Result<bool, Error> {
        self.store.hexists(self.name, key).await
    }
}

/// Inputs the hash guards treat as missing.
fn is_blank(b: &[u8]) -> bool {
    b.is_empty() || b == b"0"
}
