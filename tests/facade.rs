use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bytes::Bytes;
use redis_utils::{
    conf::{ClientConfig, ServerConfig},
    net::{connection::Connection, frame::Frame},
    Error, InMemoryStore, RedisUtils, ScoredMember, Server, DEFAULT_HASH,
};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let conf = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..ServerConfig::default()
        };
        let (stop, stopped) = oneshot::channel::<()>();
        let server = Server::bind(
            InMemoryStore::default(),
            async move {
                let _ = stopped.await;
            },
            &conf,
        )
        .await
        .unwrap();
        let addr = server.local_addr().unwrap();
        let task = tokio::spawn(server.run());
        Self { addr, stop, task }
    }

    fn client_config(&self, hash: &str) -> ClientConfig {
        ClientConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            hash: hash.to_string(),
        }
    }

    async fn stop(self) {
        self.stop.send(()).unwrap();
        self.task.await.unwrap();
    }
}

#[tokio::test]
async fn strings_over_tcp() {
    let server = TestServer::start().await;
    let mut utils = RedisUtils::connect(&server.client_config(DEFAULT_HASH))
        .await
        .unwrap();

    assert_eq!(utils.get("k").await.unwrap(), None);
    utils.set("k", "v", 0).await.unwrap();
    assert_eq!(utils.get("k").await.unwrap(), Some(Bytes::from("v")));
    utils.set("k", "w", 60).await.unwrap();
    assert_eq!(utils.get("k").await.unwrap(), Some(Bytes::from("w")));
    assert_eq!(utils.delete("k").await.unwrap(), 1);
    assert_eq!(utils.delete("k").await.unwrap(), 0);
    assert_eq!(utils.get("k").await.unwrap(), None);

    let err = utils.set("k", "v", -1).await.unwrap_err();
    assert!(matches!(err, Error::Command(ref msg) if msg.starts_with("ERR invalid expire time")));

    drop(utils);
    server.stop().await;
}

#[tokio::test]
async fn lists_over_tcp() {
    let server = TestServer::start().await;
    let mut utils = RedisUtils::connect(&server.client_config(DEFAULT_HASH))
        .await
        .unwrap();

    assert_eq!(utils.list_pop_left("jobs").await.unwrap(), None);
    assert_eq!(utils.list_push_left("jobs", "a").await.unwrap(), 1);
    assert_eq!(utils.list_push_left("jobs", "b").await.unwrap(), 2);
    assert_eq!(utils.list_size("jobs").await.unwrap(), 2);
    assert_eq!(
        utils.list_pop_left("jobs").await.unwrap(),
        Some(Bytes::from("b"))
    );
    assert_eq!(utils.list_size("jobs").await.unwrap(), 1);

    drop(utils);
    server.stop().await;
}

#[tokio::test]
async fn sorted_sets_over_tcp() {
    let server = TestServer::start().await;
    let mut utils = RedisUtils::connect(&server.client_config(DEFAULT_HASH))
        .await
        .unwrap();

    assert_eq!(utils.sorted_set_add("rank", 3.0, "c").await.unwrap(), 1);
    assert_eq!(utils.sorted_set_add("rank", 1.5, "a").await.unwrap(), 1);
    assert_eq!(utils.sorted_set_add("rank", 2.0, "b").await.unwrap(), 1);
    assert_eq!(utils.sorted_set_add("rank", 0.5, "c").await.unwrap(), 0);

    let members = utils.sorted_set_range("rank", 0, -1, false).await.unwrap();
    let names: Vec<_> = members.iter().map(|m| m.member.clone()).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
    assert!(members.iter().all(|m| m.score.is_none()));

    assert_eq!(
        utils.sorted_set_range("rank", -2, -1, true).await.unwrap(),
        vec![
            ScoredMember {
                member: "a".into(),
                score: Some(1.5),
            },
            ScoredMember {
                member: "b".into(),
                score: Some(2.0),
            },
        ]
    );
    assert!(utils
        .sorted_set_range("missing", 0, -1, true)
        .await
        .unwrap()
        .is_empty());

    drop(utils);
    server.stop().await;
}

#[tokio::test]
async fn hashes_over_tcp() {
    let server = TestServer::start().await;
    let mut utils = RedisUtils::connect(&server.client_config("goods"))
        .await
        .unwrap();
    assert_eq!(utils.hash(), "goods");

    assert_eq!(utils.hash_set("sku-1", "10").await.unwrap(), Some(true));
    assert_eq!(utils.hash_set("sku-2", "20").await.unwrap(), Some(true));
    assert_eq!(utils.hash_set("sku-1", "11").await.unwrap(), Some(false));
    assert_eq!(utils.hash_set("", "x").await.unwrap(), None);
    assert_eq!(utils.hash_len().await.unwrap(), 2);
    assert_eq!(
        utils.hash_get("sku-1").await.unwrap(),
        Some(Bytes::from("11"))
    );
    assert_eq!(
        utils.hash_get_all().await.unwrap(),
        vec![
            (Bytes::from("sku-1"), Bytes::from("11")),
            (Bytes::from("sku-2"), Bytes::from("20")),
        ]
    );
    assert_eq!(utils.hash_keys().await.unwrap(), vec!["sku-1", "sku-2"]);
    assert_eq!(utils.hash_vals().await.unwrap(), vec!["11", "20"]);
    assert!(utils.hash_exists("sku-2").await.unwrap());
    assert_eq!(utils.hash_del("sku-2").await.unwrap(), Some(1));
    assert_eq!(utils.hash_del("").await.unwrap(), None);
    assert!(!utils.hash_exists("sku-2").await.unwrap());

    let mut other = utils.table("users");
    assert_eq!(other.len().await.unwrap(), 0);
    assert_eq!(other.set("sku-1", "u").await.unwrap(), Some(true));
    assert_eq!(utils.hash_get("sku-1").await.unwrap(), Some(Bytes::from("11")));

    drop(utils);
    server.stop().await;
}

#[tokio::test]
async fn wrong_type_errors_are_propagated() {
    let server = TestServer::start().await;
    let mut utils = RedisUtils::connect(&server.client_config(DEFAULT_HASH))
        .await
        .unwrap();

    utils.set("plain", "v", 0).await.unwrap();
    let err = utils.list_push_left("plain", "x").await.unwrap_err();
    assert!(matches!(err, Error::Command(ref msg) if msg.starts_with("WRONGTYPE")));

    // The connection is still usable after an error reply
    assert_eq!(utils.get("plain").await.unwrap(), Some(Bytes::from("v")));

    drop(utils);
    server.stop().await;
}

#[tokio::test]
async fn invalid_requests_get_error_replies() {
    let server = TestServer::start().await;
    let mut conn = Connection::new(TcpStream::connect(server.addr).await.unwrap());

    let unknown = Frame::Array(vec![Frame::BulkString(Bytes::from("flushall"))]);
    conn.write_frame(&unknown).await.unwrap();
    assert_eq!(
        conn.read_frame().await.unwrap(),
        Some(Frame::Error("ERR unknown command 'flushall'".into()))
    );

    let arity = Frame::Array(vec![Frame::BulkString(Bytes::from("get"))]);
    conn.write_frame(&arity).await.unwrap();
    assert_eq!(
        conn.read_frame().await.unwrap(),
        Some(Frame::Error(
            "ERR wrong number of arguments for 'get' command".into()
        ))
    );

    let get = Frame::Array(vec![
        Frame::BulkString(Bytes::from("GET")),
        Frame::BulkString(Bytes::from("missing")),
    ]);
    conn.write_frame(&get).await.unwrap();
    assert_eq!(conn.read_frame().await.unwrap(), Some(Frame::Null));

    drop(conn);
    server.stop().await;
}

#[tokio::test]
async fn clients_share_one_store() {
    let server = TestServer::start().await;
    let conf = server.client_config(DEFAULT_HASH);
    let mut first = RedisUtils::connect(&conf).await.unwrap();
    let mut second = RedisUtils::connect(&conf).await.unwrap();

    first.set("shared", "1", 0).await.unwrap();
    assert_eq!(second.get("shared").await.unwrap(), Some(Bytes::from("1")));

    drop(first);
    drop(second);
    server.stop().await;
}
