//! Asynchronous server that exposes a [`Store`] through the RESP protocol.

use std::{convert::TryFrom, future::Future, io, net::SocketAddr, sync::Arc, time::Duration};

use tokio::{
    net::{TcpListener, TcpStream},
    sync::{broadcast, mpsc, OwnedSemaphorePermit, Semaphore},
    time,
};
use tracing::{debug, error, info};

use super::{
    cmd::Command,
    connection::{Connection, ConnectionError},
    frame::Frame,
};
use crate::{conf::ServerConfig, shutdown::Shutdown, store::Store};

/// Provide methods and hold states for a Redis server. The server exits when `shutdown`
/// finishes, or when it can no longer accept connections.
#[derive(Debug)]
pub struct Server<S, F> {
    listener: Listener<S>,
    shutdown: F,
}

/// The server's runtime state that is shared across all connections.
/// It also owns the socket that accepts inbound connections.
#[derive(Debug)]
struct Listener<S> {
    // Store handle, cloned into every handler
    store: S,

    // Socket accepting inbound TCP connections
    listener: TcpListener,

    /// First delay, in milliseconds, before retrying a failed accept.
    min_backoff_ms: u64,

    /// Largest delay, in milliseconds, before accepting is given up.
    max_backoff_ms: u64,

    // Caps the number of connections served at once.
    //
    // The listener takes a permit before accepting a socket and moves it into the
    // handler. The permit goes back to the semaphore when the handler is dropped, so
    // once the cap is reached the listener sleeps until some connection ends.
    limit_connections: Arc<Semaphore>,

    // Tells active connections that the server is going away.
    //
    // Each handler subscribes a receiver when it is spawned. Nothing is ever sent on
    // this channel. Dropping the sender closes it, every receiver wakes up, and each
    // handler returns as soon as it is between two requests.
    notify_shutdown: broadcast::Sender<()>,

    // Lets the server wait for active connections to finish.
    //
    // Every handler keeps a clone of `shutdown_complete_tx` and drops it on exit. The
    // channel closes when the last sender is gone, and `shutdown_complete_rx.recv()`
    // then returns `None`. The listener drops its own sender before waiting.
    shutdown_complete_rx: mpsc::Receiver<()>,
    shutdown_complete_tx: mpsc::Sender<()>,
}

/// Reads requests from one connection and applies them to the store.
#[derive(Debug)]
struct Handler<S> {
    // Store handle
    store: S,

    // Reads requests and writes replies as frames.
    connection: Connection,

    // Becomes ready when the server shuts down.
    shutdown: Shutdown,

    // Slot in `limit_connections`, returned when the handler is dropped.
    _permit: OwnedSemaphorePermit,

    // Never used to send. Dropping it tells the server this connection is done.
    _shutdown_complete: mpsc::Sender<()>,
}

impl<S, F> Server<S, F> {
    /// Binds the listening socket described by `conf`.
    pub async fn bind(store: S, shutdown: F, conf: &ServerConfig) -> io::Result<Self> {
        info!(?conf, "starting server");
        // Handlers get their receivers from `subscribe()`, so the first one is not needed
        let (notify_shutdown, _) = broadcast::channel(1);
        let (shutdown_complete_tx, shutdown_complete_rx) = mpsc::channel(1);

        let listener = Listener {
            store,
            listener: TcpListener::bind((conf.host, conf.port)).await?,
            // a zero delay would never grow
            min_backoff_ms: conf.min_backoff_ms.max(1),
            max_backoff_ms: conf.max_backoff_ms,
            limit_connections: Arc::new(Semaphore::new(conf.max_connections)),
            notify_shutdown,
            shutdown_complete_rx,
            shutdown_complete_tx,
        };
        Ok(Self { listener, shutdown })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.listener.local_addr()
    }
}

impl<S, F> Server<S, F>
where
    S: Store + Clone + 'static,
    F: Future,
{
    /// Serves connections until `shutdown` finishes, then waits for every active
    /// connection to stop.
    pub async fn run(mut self) {
        // Whichever future finishes first decides how the server stops. Normally `listen`
        // never returns and this waits for `shutdown`.
        tokio::select! {
            result = self.listener.listen() => {
                if let Err(err) = result {
                    // Accepting kept failing past the largest backoff. Errors from single
                    // connections are logged by their handler and never reach here.
                    error!(cause = %err, "failed to accept");
                }
            }
            _ = self.shutdown => {
                info!("shutting down");
            }
        }

        let Listener {
            notify_shutdown,
            shutdown_complete_tx,
            mut shutdown_complete_rx,
            ..
        } = self.listener;

        // Closing the broadcast channel wakes every handler waiting in `Shutdown::recv`.
        drop(notify_shutdown);

        // Only the handlers should hold senders now, so `recv` returns `None` once the
        // last connection has finished.
        drop(shutdown_complete_tx);
        shutdown_complete_rx.recv().await;
    }
}

impl<S> Listener<S> {
    /// Accepts a new connection, retrying with an exponential backoff. Gives up once the
    /// backoff exceeds the configured maximum.
    async fn accept(&mut self) -> io::Result<TcpStream> {
        let mut backoff = self.min_backoff_ms;
        loop {
            match self.listener.accept().await {
                Ok((socket, _)) => return Ok(socket),
                Err(err) => {
                    if backoff > self.max_backoff_ms {
                        return Err(err);
                    }
                }
            }
            time::sleep(Duration::from_millis(backoff)).await;
            backoff <<= 1;
        }
    }
}

impl<S> Listener<S>
where
    S: Store + Clone + 'static,
{
    async fn listen(&mut self) -> io::Result<()> {
        info!("listening for new connections");
        loop {
            // Wait for a free slot before accepting. `acquire_owned` only fails once the
            // semaphore is closed, which never happens while the listener is alive.
            let permit = Arc::clone(&self.limit_connections)
                .acquire_owned()
                .await
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
            // Transient failures are retried inside `accept`. An error here means the
            // server should stop.
            let socket = self.accept().await?;

            let handler = Handler {
                store: self.store.clone(),
                connection: Connection::new(socket),
                shutdown: Shutdown::new(self.notify_shutdown.subscribe()),
                _permit: permit,
                _shutdown_complete: self.shutdown_complete_tx.clone(),
            };
            // One task per connection
            tokio::spawn(async move {
                if let Err(err) = handler.run().await {
                    error!(cause = ?err, "connection error");
                }
            });
        }
    }
}

impl<S> Handler<S>
where
    S: Store,
{
    /// Processes requests one at a time until the client disconnects or the server shuts
    /// down. A request that does not parse gets an error reply and the connection stays open.
    #[tracing::instrument(skip(self))]
    async fn run(mut self) -> Result<(), ConnectionError> {
        while !self.shutdown.is_shutdown() {
            // Wait for the next request, unless the server starts shutting down first.
            // A request being applied always finishes and gets its reply.
            let maybe_frame = tokio::select! {
                res = self.connection.read_frame() => res?,
                _ = self.shutdown.recv() => return Ok(()),
            };
            let frame = match maybe_frame {
                Some(frame) => frame,
                // The client closed the connection cleanly
                None => return Ok(()),
            };

            match Command::try_from(frame) {
                Ok(cmd) => {
                    debug!(?cmd);
                    cmd.apply(&mut self.store, &mut self.connection).await?;
                }
                // Reply with the error and keep serving the connection
                Err(err) => {
                    debug!(cause = %err, "invalid request");
                    self.connection
                        .write_frame(&Frame::Error(format!("ERR {}", err)))
                        .await?;
                }
            }
        }
        Ok(())
    }
}
