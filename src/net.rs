//! RESP wire layer: frames, connections, command parsing, a [`Client`] that implements
//! [`Store`] over TCP and a [`Server`] that exposes any [`Store`] over TCP.
//!
//! [`Store`]: crate::Store

mod client;
pub mod cmd;
pub mod connection;
pub mod frame;
mod server;

pub use self::{client::Client, server::Server};
