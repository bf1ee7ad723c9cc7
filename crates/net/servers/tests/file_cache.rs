use std::fs;

use tally_net_servers::{ServerCache, ServerCacheError, StaticServerList, Transport};

fn servers() -> StaticServerList {
    StaticServerList::new([
        "tcp://alpha.example:9091",
        "tcp://beta.example:9091",
        "stratum://gamma.example:50001",
        "stratum://delta.example:50001",
    ])
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.json");

    let cache = ServerCache::new(&path, servers());
    assert_eq!(cache.load().unwrap(), 4);
    assert!(path.exists());

    cache.score_up("tcp://alpha.example:9091", 30);
    cache.score_up("stratum://gamma.example:50001", 12);
    cache.score_down("tcp://beta.example:9091", 7);
    cache.record_response_time("tcp://alpha.example:9091", 140);
    cache.record_response_time("tcp://alpha.example:9091", 60);
    cache.save().unwrap();
    assert!(!cache.is_dirty());

    let mut before = cache.records();
    before.sort_by(|a, b| a.url.cmp(&b.url));

    let reloaded = ServerCache::new(&path, servers());
    reloaded.load().unwrap();
    let mut after = reloaded.records();
    after.sort_by(|a, b| a.url.cmp(&b.url));

    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.url, b.url);
        assert_eq!(a.score, b.score);
        assert_eq!(a.response_time, b.response_time);
    }

    let alpha = reloaded.get("tcp://alpha.example:9091").unwrap();
    assert_eq!(alpha.score, 30);
    assert_eq!(alpha.response_time, Some(100));
    assert_eq!(alpha.sample_count, 0);
    assert_eq!(reloaded.get("tcp://beta.example:9091").unwrap().score, -7);
}

#[test]
fn snapshot_uses_wire_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.json");

    let cache = ServerCache::new(&path, StaticServerList::new(["tcp://alpha.example:9091"]));
    cache.load().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let first = &value[0];
    assert_eq!(first["serverUrl"], "tcp://alpha.example:9091");
    assert_eq!(first["serverScore"], 0);
    assert_eq!(first["serverResponseTime"], 999_999_999);
}

#[test]
fn corrupt_snapshot_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.json");
    fs::write(&path, "definitely not json").unwrap();

    let cache = ServerCache::new(&path, servers());
    assert_eq!(cache.load().unwrap(), 4);
    assert!(cache.records().iter().all(|r| r.is_untested()));

    let content = fs::read_to_string(&path).unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(rows.len(), 4);
}

#[test]
fn unwritable_path_keeps_cache_usable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("servers.json");

    let cache = ServerCache::new(&path, servers());
    assert!(matches!(cache.load(), Err(ServerCacheError::Io(_))));
    assert!(cache.is_dirty());
    assert_eq!(cache.len(), 4);

    cache.score_up("stratum://gamma.example:50001", 40);
    cache.record_response_time("stratum://gamma.example:50001", 20);
    let picked = cache.select(Some(Transport::Stratum), 2);
    assert_eq!(picked.len(), 2);
    assert!(picked.contains(&"stratum://gamma.example:50001".to_string()));
    assert!(cache.save().is_err());
}

#[test]
fn untested_server_gets_a_turn() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.json");

    let cache = ServerCache::new(&path, servers());
    cache.load().unwrap();

    for url in ["tcp://alpha.example:9091", "tcp://beta.example:9091"] {
        cache.score_up(url, 50);
        cache.record_response_time(url, 80);
    }
    cache.score_up("stratum://gamma.example:50001", 50);
    cache.record_response_time("stratum://gamma.example:50001", 10);

    let picked = cache.select(None, 2);
    assert_eq!(picked.len(), 2);
    assert_eq!(picked[0], "stratum://delta.example:50001");

    let tcp = cache.select(Some(Transport::Libbitcoin), 2);
    assert_eq!(tcp.len(), 2);
    assert!(tcp.iter().all(|url| url.starts_with("tcp://")));
}
