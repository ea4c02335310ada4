use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};

use redis_utils::{
    conf::Configuration,
    telemetry::{get_subscriber, init_subscriber},
    RedisUtils,
};

/// Run one RedisUtils operation against a Redis server.
#[derive(Parser)]
#[clap(name = "redis-utils", version, author, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    cmd: Commands,

    /// Configuration file, read before `REDIS_UTILS__*` environment variables.
    #[clap(long)]
    config: Option<String>,

    /// The host address of the server.
    #[clap(long)]
    host: Option<String>,

    /// The port number of the server.
    #[clap(long)]
    port: Option<u16>,

    /// The hash table used by the `h*` commands.
    #[clap(long)]
    hash: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a member to a sorted set.
    Zadd {
        key: String,
        #[clap(allow_negative_numbers = true)]
        score: f64,
        value: String,
    },

    /// List the members of a sorted set between two ranks.
    Zrange {
        key: String,
        #[clap(allow_negative_numbers = true)]
        start: i64,
        #[clap(allow_negative_numbers = true)]
        end: i64,
        /// Print each member's score.
        #[clap(long)]
        withscores: bool,
    },

    /// Prepend a value to a list.
    Lpush { key: String, value: String },

    /// Remove and print the first value of a list.
    Lpop { key: String },

    /// Print the length of a list.
    Llen { key: String },

    /// Set a field of the hash table.
    Hset { key: String, value: String },

    /// Get a field of the hash table.
    Hget { key: String },

    /// Print every field of the hash table with its value.
    Hgetall,

    /// Print the number of fields in the hash table.
    Hlen,

    /// Delete a field of the hash table.
    Hdel { key: String },

    /// Print the field names of the hash table.
    Hkeys,

    /// Print the values of the hash table.
    Hvals,

    /// Check whether a field of the hash table exists.
    Hexists { key: String },

    /// Set key's value.
    Set {
        key: String,
        value: String,
        /// Seconds until the key expires, 0 for never.
        #[clap(long, default_value_t = 0, allow_negative_numbers = true)]
        expires: i64,
    },

    /// Get key's value.
    Get { key: String },

    /// Delete a key.
    Del { key: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("redis-utils", "warn", std::io::stderr);
    init_subscriber(subscriber)?;

    let cli = Cli::parse();

    let mut conf = Configuration::get(cli.config.as_deref())
        .context("could not read configuration")?
        .client;
    if let Some(host) = cli.host {
        conf.host = host;
    }
    if let Some(port) = cli.port {
        conf.port = port;
    }
    if let Some(hash) = cli.hash {
        conf.hash = hash;
    }

    let mut utils = RedisUtils::connect(&conf)
        .await
        .with_context(|| format!("could not connect to {}", conf.addr()))?;
    match cli.cmd {
        Commands::Zadd { key, score, value } => {
            print_integer(utils.sorted_set_add(&key, score, value).await?)
        }
        Commands::Zrange {
            key,
            start,
            end,
            withscores,
        } => {
            let members = utils.sorted_set_range(&key, start, end, withscores).await?;
            let mut items = Vec::with_capacity(members.len() * 2);
            for m in members {
                items.push(m.member);
                if let Some(score) = m.score {
                    items.push(Bytes::from(score.to_string()));
                }
            }
            print_list(&items);
        }
        Commands::Lpush { key, value } => print_integer(utils.list_push_left(&key, value).await?),
        Commands::Lpop { key } => print_optional(utils.list_pop_left(&key).await?),
        Commands::Llen { key } => print_integer(utils.list_size(&key).await?),
        Commands::Hset { key, value } => match utils.hash_set(&key, value).await? {
            Some(created) => print_integer(created as i64),
            None => println!("(skipped)"),
        },
        Commands::Hget { key } => print_optional(utils.hash_get(&key).await?),
        Commands::Hgetall => {
            let items: Vec<Bytes> = utils
                .hash_get_all()
                .await?
                .into_iter()
                .flat_map(|(field, value)| [field, value])
                .collect();
            print_list(&items);
        }
        Commands::Hlen => print_integer(utils.hash_len().await?),
        Commands::Hdel { key } => match utils.hash_del(&key).await? {
            Some(n) => print_integer(n),
            None => println!("(skipped)"),
        },
        Commands::Hkeys => print_list(&utils.hash_keys().await?),
        Commands::Hvals => print_list(&utils.hash_vals().await?),
        Commands::Hexists { key } => print_integer(utils.hash_exists(&key).await? as i64),
        Commands::Set {
            key,
            value,
            expires,
        } => {
            utils.set(&key, value, expires).await?;
            println!("OK");
        }
        Commands::Get { key } => print_optional(utils.get(&key).await?),
        Commands::Del { key } => print_integer(utils.delete(&key).await?),
    }

    Ok(())
}

fn quoted(value: &Bytes) -> String {
    match std::str::from_utf8(value) {
        Ok(s) => format!("\"{}\"", s),
        Err(_) => format!("{:?}", value),
    }
}

fn print_integer(n: i64) {
    println!("(integer) {}", n);
}

fn print_optional(value: Option<Bytes>) {
    match value {
        Some(value) => println!("{}", quoted(&value)),
        None => println!("(nil)"),
    }
}

fn print_list(items: &[Bytes]) {
    if items.is_empty() {
        println!("(empty array)");
    }
    for (i, item) in items.iter().enumerate() {
        println!("{}) {}", i + 1, quoted(item));
    }
}
