//! End-to-end tests exercising the public API.

use serde::{Deserialize, Serialize};
use tidemark::{Config, Store, TidemarkError, TimeKey, entity_facade};
use uuid::Uuid;

fn t(millis: i64) -> TimeKey {
    TimeKey::from_millis(millis)
}

#[test]
fn test_basic_insert_and_lookup() {
    let store = Store::new();
    let vessel = Uuid::new_v4();

    let id = store
        .insert("position_report", Some(vessel), t(1_000), &b"57.7N 11.9E"[..])
        .unwrap();

    assert_eq!(store.by_id(id).unwrap().as_ref(), b"57.7N 11.9E");
    assert_eq!(store.by_owner("position_report", Some(vessel)).len(), 1);
    assert_eq!(store.entity_names(), vec!["position_report"]);
}

#[test]
fn test_temporal_query_shapes_against_one_owner() {
    let store = Store::new();
    let vessel = Uuid::new_v4();

    // Out-of-order arrival; the index keeps the partition sorted.
    for (millis, fix) in [(30, "C"), (10, "A"), (20, "B")] {
        store
            .insert("position_report", Some(vessel), t(millis), fix.as_bytes())
            .unwrap();
    }

    let owner = Some(vessel);
    assert_eq!(
        store.exact("position_report", owner, t(20)).unwrap().as_ref(),
        b"B"
    );
    assert!(store.exact("position_report", owner, t(15)).is_none());

    // As-of picks the newest record not after the probe time.
    assert_eq!(
        store.as_of("position_report", owner, t(29)).unwrap().as_ref(),
        b"B"
    );
    assert_eq!(
        store.as_of("position_report", owner, t(30)).unwrap().as_ref(),
        b"C"
    );
    assert!(store.as_of("position_report", owner, t(9)).is_none());

    let from = store.from("position_report", owner, t(20));
    assert_eq!(from.len(), 2);
    assert_eq!(from[0].as_ref(), b"B");

    let until = store.until("position_report", owner, t(20));
    assert_eq!(until.len(), 2);
    assert_eq!(until[1].as_ref(), b"B");

    let range = store.range("position_report", owner, t(10), t(20)).unwrap();
    assert_eq!(range.len(), 2);

    // Degenerate one-point range is valid.
    let point = store.range("position_report", owner, t(20), t(20)).unwrap();
    assert_eq!(point.len(), 1);
}

#[test]
fn test_unscoped_queries_merge_partitions_in_time_order() {
    let store = Store::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    store.insert("track", Some(a), t(10), &b"a10"[..]).unwrap();
    store.insert("track", Some(b), t(5), &b"b5"[..]).unwrap();
    store.insert("track", Some(a), t(20), &b"a20"[..]).unwrap();
    store.insert("track", None, t(15), &b"orphan15"[..]).unwrap();

    let all = store.from_all("track", TimeKey::MIN);
    let order: Vec<&[u8]> = all.iter().map(|p| p.as_ref()).collect();
    assert_eq!(order, vec![&b"b5"[..], &b"a10"[..], &b"orphan15"[..], &b"a20"[..]]);

    // One record per partition, including the ownerless one.
    let as_of = store.as_of_all("track", t(16));
    assert_eq!(as_of.len(), 3);

    let window = store.range_all("track", t(6), t(16)).unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].as_ref(), b"a10");
    assert_eq!(window[1].as_ref(), b"orphan15");
}

#[test]
fn test_duplicate_rejection_is_per_partition() {
    let store = Store::new();
    let radar = Uuid::new_v4();

    store.insert("sweep", Some(radar), t(100), &b"s1"[..]).unwrap();
    let err = store
        .insert("sweep", Some(radar), t(100), &b"s2"[..])
        .unwrap_err();
    assert!(matches!(
        err,
        TidemarkError::DuplicateTimeKey { time } if time == t(100)
    ));

    // Same instant is fine in a different partition or entity type.
    store.insert("sweep", None, t(100), &b"s3"[..]).unwrap();
    store
        .insert("echo", Some(radar), t(100), &b"s4"[..])
        .unwrap();

    let stats = store.stats();
    assert_eq!(stats.record_count, 3);
    assert_eq!(stats.duplicate_insert_count, 1);
    assert_eq!(stats.entity_count, 2);
    assert_eq!(stats.partition_count, 3);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TrackFix {
    latitude: f64,
    longitude: f64,
    speed_knots: f32,
}

entity_facade! {
    /// Track fix history, keyed by tracker device id.
    pub struct TrackFixFacade {
        entity: "track_fix",
        owner: Uuid,
        payload: TrackFix,
    }
}

fn fix(speed_knots: f32) -> TrackFix {
    TrackFix {
        latitude: 57.7,
        longitude: 11.9,
        speed_knots,
    }
}

#[test]
fn test_typed_facade_end_to_end() {
    let store = Store::new();
    let tracker = Uuid::new_v4();
    let fixes = TrackFixFacade::new(store.clone());

    fixes.insert(Some(tracker), t(10), &fix(12.0)).unwrap();
    fixes.insert(Some(tracker), t(20), &fix(14.5)).unwrap();
    fixes.insert(None, t(15), &fix(0.0)).unwrap();

    assert_eq!(fixes.as_of(tracker, t(15)).unwrap(), Some(fix(12.0)));
    assert_eq!(fixes.by_owner(tracker).unwrap().len(), 2);
    assert_eq!(fixes.by_absent_owner().unwrap(), vec![fix(0.0)]);
    assert_eq!(fixes.as_of_absent(t(20)).unwrap(), Some(fix(0.0)));
    assert_eq!(fixes.all().unwrap().len(), 3);

    // The untyped surface sees the same records.
    assert_eq!(store.by_owner("track_fix", Some(tracker)).len(), 2);
}

#[test]
fn test_facade_and_raw_inserts_interleave() {
    let store = Store::new();
    let fixes = TrackFixFacade::new(store.clone());
    let tracker = Uuid::new_v4();

    fixes.insert(Some(tracker), t(10), &fix(12.0)).unwrap();

    // A raw insert at the same time key hits the same partition.
    let err = store
        .insert("track_fix", Some(tracker), t(10), &b"raw"[..])
        .unwrap_err();
    assert!(matches!(err, TidemarkError::DuplicateTimeKey { .. }));

    // A raw payload that is not valid bincode surfaces as a decode error
    // through the typed surface.
    store
        .insert("track_fix", Some(tracker), t(20), &b"\xff"[..])
        .unwrap();
    assert!(fixes.by_owner(tracker).is_err());
}

#[test]
fn test_concurrent_readers_and_writers() {
    let store = Store::new();
    let owners: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

    let mut handles = Vec::new();
    for (lane, owner) in owners.iter().copied().enumerate() {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..100i64 {
                store
                    .insert(
                        "telemetry",
                        Some(owner),
                        t(lane as i64 * 1_000 + i),
                        format!("{lane}:{i}").into_bytes(),
                    )
                    .unwrap();
            }
        }));
    }
    for _ in 0..2 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..200 {
                // Readers observe some consistent snapshot at all times.
                let snapshot = store.from_all("telemetry", TimeKey::MIN);
                assert!(snapshot.len() <= 400);
                let _ = store.as_of_all("telemetry", t(2_000));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = store.stats();
    assert_eq!(stats.record_count, 400);
    assert_eq!(stats.duplicate_insert_count, 0);
    for owner in owners {
        assert_eq!(store.by_owner("telemetry", Some(owner)).len(), 100);
    }
}

#[test]
fn test_store_with_config_and_builder() {
    let config = Config::default()
        .with_partition_capacity_hint(128)
        .with_entity_capacity_hint(8);
    let store = Store::with_config(config).unwrap();
    assert_eq!(store.config().partition_capacity_hint, 128);

    let built = Store::builder()
        .partition_capacity_hint(64)
        .entity_capacity_hint(4)
        .build()
        .unwrap();
    assert_eq!(built.config().entity_capacity_hint, 4);

    let invalid = Config::default().with_partition_capacity_hint(usize::MAX);
    assert!(Store::with_config(invalid).is_err());
}

#[test]
fn test_config_json_roundtrip() {
    let config = Config::default().with_partition_capacity_hint(256);
    let json = serde_json::to_string(&config).unwrap();
    let parsed = Config::from_json(&json).unwrap();
    assert_eq!(parsed.partition_capacity_hint, 256);
}

#[cfg(feature = "toml")]
#[test]
fn test_config_toml_roundtrip() {
    let toml = "partition_capacity_hint = 32\nentity_capacity_hint = 2\n";
    let config = Config::from_toml(toml).unwrap();
    assert_eq!(config.partition_capacity_hint, 32);
    assert_eq!(config.entity_capacity_hint, 2);
}
