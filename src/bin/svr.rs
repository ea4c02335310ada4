use std::net::IpAddr;

use anyhow::Context;
use clap::Parser;
use tokio::signal;

use redis_utils::{
    conf::Configuration,
    telemetry::{get_subscriber, init_subscriber},
    InMemoryStore, Server,
};

/// An in-memory server that speaks enough of the Redis protocol to back RedisUtils.
#[derive(Parser, Debug)]
#[clap(name = "redis-utils-svr", version, author, long_about = None)]
struct Cli {
    /// Configuration file, read before `REDIS_UTILS__*` environment variables.
    #[clap(long)]
    config: Option<String>,

    /// Host address to listen on.
    #[clap(long)]
    host: Option<IpAddr>,

    /// Port to listen on.
    #[clap(long)]
    port: Option<u16>,
}

#[tokio::main]
pub async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("redis-utils-svr", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cli = Cli::parse();

    let mut conf = Configuration::get(cli.config.as_deref())
        .context("could not read configuration")?
        .server;
    if let Some(host) = cli.host {
        conf.host = host;
    }
    if let Some(port) = cli.port {
        conf.port = port;
    }

    let server = Server::bind(InMemoryStore::default(), signal::ctrl_c(), &conf)
        .await
        .with_context(|| format!("could not listen on {}:{}", conf.host, conf.port))?;
    server.run().await;
    Ok(())
}
