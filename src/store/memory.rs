use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::{ScoredMember, Store};
use crate::error::Error;

/// A store that keeps everything in memory and follows Redis semantics for the supported
/// commands.
///
/// Clones share the same data. Keys with an expiration are removed lazily, the first time
/// they are accessed after their deadline. Expired keys that are never accessed again are
/// dropped by a full sweep that runs once every [`SWEEP_INTERVAL`] string writes, so they
/// don't pile up. Deadlines are measured with [`tokio::time`], so a paused runtime clock
/// controls expiration.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Db>>,
}

/// Number of string writes between two sweeps of expired keys.
const SWEEP_INTERVAL: usize = 128;

#[derive(Debug, Default)]
struct Db {
    entries: HashMap<String, Entry>,
    // string writes since the last sweep
    writes: usize,
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

#[derive(Debug)]
enum Value {
    String(Bytes),
    Hash(BTreeMap<Bytes, Bytes>),
    List(VecDeque<Bytes>),
    SortedSet(SortedSet),
}

impl Value {
    fn is_empty(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::Hash(h) => h.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::SortedSet(z) => z.scores.is_empty(),
        }
    }
}

/// Members indexed by name and ordered by `(score, member)`.
#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<Bytes, f64>,
    ordered: BTreeSet<ScoreKey>,
}

#[derive(Debug, PartialEq)]
struct ScoreKey(f64, Bytes);

impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then_with(|| self.1.cmp(&other.1))
    }
}

impl SortedSet {
    /// Returns `true` if the member is new, `false` if only its score changed.
    fn insert(&mut self, member: Bytes, score: f64) -> bool {
        match self.scores.insert(member.clone(), score) {
            Some(old) => {
                self.ordered.remove(&ScoreKey(old, member.clone()));
                self.ordered.insert(ScoreKey(score, member));
                false
            }
            None => {
                self.ordered.insert(ScoreKey(score, member));
                true
            }
        }
    }

    fn range(&self, start: i64, stop: i64, with_scores: bool) -> Vec<ScoredMember> {
        let (start, stop) = match rank_bounds(start, stop, self.ordered.len()) {
            Some(bounds) => bounds,
            None => return Vec::new(),
        };
        self.ordered
            .iter()
            .skip(start)
            .take(stop - start + 1)
            .map(|ScoreKey(score, member)| ScoredMember {
                member: member.clone(),
                score: with_scores.then_some(*score),
            })
            .collect()
    }
}

/// Resolves inclusive ranks, where negative ranks count from the end, into positions within
/// a collection of `len` items. Returns `None` when the range selects nothing.
fn rank_bounds(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

impl Db {
    fn expire_if_due(&mut self, key: &str) {
        let now = Instant::now();
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map_or(false, |at| at <= now);
        if expired {
            self.entries.remove(key);
        }
    }

    fn get_live(&mut self, key: &str) -> Option<&mut Value> {
        self.expire_if_due(key);
        self.entries.get_mut(key).map(|e| &mut e.value)
    }

    fn get_or_insert_with<F>(&mut self, key: &str, f: F) -> &mut Value
    where
        F: FnOnce() -> Value,
    {
        self.expire_if_due(key);
        &mut self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: f(),
                expires_at: None,
            })
            .value
    }

    /// Collections are deleted together with their last element.
    fn remove_if_empty(&mut self, key: &str) {
        if self.entries.get(key).map_or(false, |e| e.value.is_empty()) {
            self.entries.remove(key);
        }
    }

    /// Drops every key whose deadline has passed.
    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, e| e.expires_at.map_or(true, |at| at > now));
    }

    /// Only strings carry an expiration, so writing one is where expired keys get swept.
    fn put_string(&mut self, key: &str, value: Bytes, expires_at: Option<Instant>) {
        self.writes += 1;
        if self.writes >= SWEEP_INTERVAL {
            self.writes = 0;
            self.purge_expired();
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::String(value),
                expires_at,
            },
        );
    }

    fn hash(&mut self, key: &str) -> Result<Option<&mut BTreeMap<Bytes, Bytes>>, Error> {
        match self.get_live(key) {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(Some(h)),
            Some(_) => Err(Error::wrong_type()),
        }
    }

    fn list(&mut self, key: &str) -> Result<Option<&mut VecDeque<Bytes>>, Error> {
        match self.get_live(key) {
            None => Ok(None),
            Some(Value::List(l)) => Ok(Some(l)),
            Some(_) => Err(Error::wrong_type()),
        }
    }

    fn sorted_set(&mut self, key: &str) -> Result<Option<&mut SortedSet>, Error> {
        match self.get_live(key) {
            None => Ok(None),
            Some(Value::SortedSet(z)) => Ok(Some(z)),
            Some(_) => Err(Error::wrong_type()),
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        let mut db = self.inner.lock();
        match db.get_live(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(Error::wrong_type()),
        }
    }

    async fn set(&mut self, key: &str, value: Bytes) -> Result<(), Error> {
        self.inner.lock().put_string(key, value, None);
        Ok(())
    }

    async fn set_ex(&mut self, key: &str, value: Bytes, seconds: i64) -> Result<(), Error> {
        let expires_at = u64::try_from(seconds)
            .ok()
            .filter(|s| *s > 0)
            .and_then(|s| Instant::now().checked_add(Duration::from_secs(s)))
            .ok_or_else(|| Error::Command("ERR invalid expire time in 'set' command".into()))?;
        self.inner.lock().put_string(key, value, Some(expires_at));
        Ok(())
    }

    async fn del(&mut self, key: &str) -> Result<i64, Error> {
        let mut db = self.inner.lock();
        db.expire_if_due(key);
        Ok(db.entries.remove(key).is_some() as i64)
    }

    async fn hset(&mut self, table: &str, field: &str, value: Bytes) -> Result<bool, Error> {
        let mut db = self.inner.lock();
        match db.get_or_insert_with(table, || Value::Hash(BTreeMap::new())) {
            Value::Hash(h) => {
                let field = Bytes::copy_from_slice(field.as_bytes());
                Ok(h.insert(field, value).is_none())
            }
            _ => Err(Error::wrong_type()),
        }
    }

    async fn hget(&mut self, table: &str, field: &str) -> Result<Option<Bytes>, Error> {
        let mut db = self.inner.lock();
        Ok(db
            .hash(table)?
            .and_then(|h| h.get(field.as_bytes()).cloned()))
    }

    async fn hgetall(&mut self, table: &str) -> Result<Vec<(Bytes, Bytes)>, Error> {
        let mut db = self.inner.lock();
        Ok(db
            .hash(table)?
            .map(|h| h.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn hlen(&mut self, table: &str) -> Result<i64, Error> {
        let mut db = self.inner.lock();
        Ok(db.hash(table)?.map_or(0, |h| h.len() as i64))
    }

    async fn hdel(&mut self, table: &str, field: &str) -> Result<i64, Error> {
        let mut db = self.inner.lock();
        let removed = db
            .hash(table)?
            .map_or(false, |h| h.remove(field.as_bytes()).is_some());
        db.remove_if_empty(table);
        Ok(removed as i64)
    }

    async fn hkeys(&mut self, table: &str) -> Result<Vec<Bytes>, Error> {
        let mut db = self.inner.lock();
        Ok(db
            .hash(table)?
            .map(|h| h.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn hvals(&mut self, table: &str) -> Result<Vec<Bytes>, Error> {
        let mut db = self.inner.lock();
        Ok(db
            .hash(table)?
            .map(|h| h.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn hexists(&mut self, table: &str, field: &str) -> Result<bool, Error> {
        let mut db = self.inner.lock();
        Ok(db
            .hash(table)?
            .map_or(false, |h| h.contains_key(field.as_bytes())))
    }

    async fn lpush(&mut self, key: &str, value: Bytes) -> Result<i64, Error> {
        let mut db = self.inner.lock();
        match db.get_or_insert_with(key, || Value::List(VecDeque::new())) {
            Value::List(l) => {
                l.push_front(value);
                Ok(l.len() as i64)
            }
            _ => Err(Error::wrong_type()),
        }
    }

    async fn lpop(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        let mut db = self.inner.lock();
        let popped = db.list(key)?.and_then(|l| l.pop_front());
        db.remove_if_empty(key);
        Ok(popped)
    }

    async fn llen(&mut self, key: &str) -> Result<i64, Error> {
        let mut db = self.inner.lock();
        Ok(db.list(key)?.map_or(0, |l| l.len() as i64))
    }

    async fn zadd(&mut self, key: &str, score: f64, member: Bytes) -> Result<i64, Error> {
        let mut db = self.inner.lock();
        match db.get_or_insert_with(key, || Value::SortedSet(SortedSet::default())) {
            Value::SortedSet(z) => Ok(z.insert(member, score) as i64),
            _ => Err(Error::wrong_type()),
        }
    }

    async fn zrange(
        &mut self,
        key: &str,
        start: i64,
        stop: i64,
        with_scores: bool,
    ) -> Result<Vec<ScoredMember>, Error> {
        let mut db = self.inner.lock();
        Ok(db
            .sorted_set(key)?
            .map(|z| z.range(start, stop, with_scores))
            .unwrap_or_default())
    }
}
