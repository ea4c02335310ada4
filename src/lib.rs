//! Convenience helpers for working with a Redis store. [`RedisUtils`] wraps a single store
//! handle and exposes a small set of string, hash, list and sorted-set operations, each one a
//! direct passthrough to the matching Redis command.
//!
//! The crate carries its own minimal Redis client speaking the Redis serialization protocol
//! (RESP), an in-memory store with the same semantics for the supported commands, and a server
//! that exposes any store over the network.

#![deny(rust_2018_idioms)]
#![warn(missing_docs)]

pub mod conf;
pub mod error;
pub mod net;
pub mod store;
pub mod telemetry;
pub mod utils;

mod shutdown;

/// Default host address of the Redis service
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port of the Redis service
pub const DEFAULT_PORT: u16 = 6379;

/// Default name of the hash table targeted by [`RedisUtils`]
pub const DEFAULT_HASH: &str = "apm_custom_goods";

pub use error::Error;
pub use net::{Client, Server};
pub use store::{InMemoryStore, ScoredMember, Store};
pub use utils::{HashTable, RedisUtils};
