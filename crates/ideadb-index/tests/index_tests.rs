use chrono::Utc;
use ideadb_core::error::Error;
use ideadb_core::traits::VectorIndex;
use ideadb_core::types::{popularity_score, InteractionKind, Item};
use ideadb_index::{FlatIndex, ItemStore, Snapshot, SCHEMA_VERSION};
use tempfile::TempDir;

fn item(id: &str, likes: u64, dislikes: u64) -> Item {
    Item {
        id: id.to_string(),
        title: format!("{id} 제목"),
        body: String::new(),
        attributes: Default::default(),
        likes,
        dislikes,
        normalized_text: format!("{id} 본문"),
        popularity_score: popularity_score(likes, dislikes),
        tombstoned: false,
        created_at: Utc::now(),
    }
}

fn unit(dim: usize, axis: usize) -> Vec<f32> {
    let mut v = vec![0f32; dim];
    v[axis % dim] = 1.0;
    v
}

#[test]
fn positions_stay_aligned_across_appends() {
    let mut index = FlatIndex::new(4);
    let mut store = ItemStore::new();

    for i in 0..5 {
        let id = format!("item-{i}");
        let vec_pos = index.insert(&unit(4, i)).expect("insert");
        let row_pos = store.append(item(&id, 0, 0)).expect("append");
        assert_eq!(vec_pos, row_pos, "index and store must assign the same position");
        assert_eq!(vec_pos, i);
    }

    for i in 0..5 {
        let row = store.get(i).expect("row");
        assert_eq!(row.id, format!("item-{i}"), "row {i} holds the {i}-th inserted item");
        assert_eq!(index.vector(i).expect("vector"), unit(4, i).as_slice());
    }
}

#[test]
fn flat_index_rejects_dimension_mismatch() {
    let mut index = FlatIndex::new(4);
    index.insert(&unit(4, 0)).expect("insert");

    let err = index.insert(&[1.0, 0.0, 0.0]).expect_err("short vector");
    assert!(matches!(err, Error::CorruptIndexState(_)), "got {err:?}");

    let err = index.search(&[1.0, 0.0], 3).expect_err("short query");
    assert!(matches!(err, Error::CorruptIndexState(_)), "got {err:?}");
}

#[test]
fn flat_search_orders_by_score_then_position() {
    let mut index = FlatIndex::new(4);
    index.insert(&unit(4, 0)).expect("insert");
    index.insert(&unit(4, 1)).expect("insert");
    index.insert(&unit(4, 0)).expect("insert");

    let hits = index.search(&unit(4, 0), 3).expect("search");
    let positions: Vec<usize> = hits.iter().map(|(p, _)| *p).collect();
    assert_eq!(positions, vec![0, 2, 1], "ties resolve to the earliest insertion");
    assert!((hits[0].1 - 1.0).abs() < 1e-6);
    assert!((hits[1].1 - 1.0).abs() < 1e-6);
    assert!(hits[2].1.abs() < 1e-6);
}

#[test]
fn flat_search_respects_k() {
    let mut index = FlatIndex::new(4);
    for i in 0..3 {
        index.insert(&unit(4, i)).expect("insert");
    }

    assert_eq!(index.search(&unit(4, 0), 2).expect("search").len(), 2);
    assert_eq!(index.search(&unit(4, 0), 10).expect("search").len(), 3, "k beyond len returns all");
    assert!(FlatIndex::new(4).search(&unit(4, 0), 5).expect("search").is_empty());
}

#[test]
fn store_engagement_updates_counters_and_popularity() {
    let mut store = ItemStore::new();
    store.append(item("a", 0, 0)).expect("append");
    assert!((store.find_by_id("a").expect("item").popularity_score - 0.5).abs() < 1e-6);

    let updated = store.update_engagement("a", InteractionKind::Like).expect("like");
    assert_eq!(updated.likes, 1);
    assert!((updated.popularity_score - 1.0).abs() < 1e-6);

    let updated = store.update_engagement("a", InteractionKind::Dislike).expect("dislike");
    assert_eq!(updated.dislikes, 1);
    assert!((updated.popularity_score - 0.5).abs() < 1e-6);

    let updated = store.update_engagement("a", InteractionKind::View).expect("view");
    assert_eq!((updated.likes, updated.dislikes), (1, 1), "views leave counters alone");

    let err = store.update_engagement("missing", InteractionKind::Like).expect_err("unknown id");
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn store_rejects_duplicate_ids() {
    let mut store = ItemStore::new();
    store.append(item("dup", 0, 0)).expect("append");
    let err = store.append(item("dup", 0, 0)).expect_err("duplicate");
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn tombstone_keeps_position_but_hides_from_live_iteration() {
    let mut store = ItemStore::new();
    store.append(item("a", 0, 0)).expect("append");
    store.append(item("b", 0, 0)).expect("append");

    store.tombstone("a").expect("tombstone");
    assert_eq!(store.position_of("a"), Some(0), "position never moves");
    assert!(store.find_by_id("a").expect("row").tombstoned);
    let live: Vec<&str> = store.iter_live().map(|i| i.id.as_str()).collect();
    assert_eq!(live, vec!["b"]);

    let err = store.tombstone("missing").expect_err("unknown id");
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn snapshot_round_trip_preserves_alignment() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("snapshots/ideas.json");

    let mut index = FlatIndex::new(4);
    let mut store = ItemStore::new();
    for i in 0..3 {
        index.insert(&unit(4, i)).expect("insert");
        store.append(item(&format!("item-{i}"), i as u64, 0)).expect("append");
    }

    let snapshot = Snapshot {
        schema_version: SCHEMA_VERSION,
        embedder_id: "hash:xx64:d4".to_string(),
        dim: 4,
        items: store.items().to_vec(),
        vectors: (0..3).map(|p| index.vector(p).expect("vector").to_vec()).collect(),
        interactions: Vec::new(),
    };
    snapshot.save(&path).expect("save");

    let loaded = Snapshot::load(&path).expect("load");
    assert_eq!(loaded.items.len(), 3);
    assert_eq!(loaded.vectors.len(), 3);
    for i in 0..3 {
        assert_eq!(loaded.items[i].id, format!("item-{i}"));
        assert_eq!(loaded.vectors[i], unit(4, i));
    }

    let rebuilt = ItemStore::from_items(loaded.items).expect("rebuild");
    assert_eq!(rebuilt.position_of("item-2"), Some(2));
}

#[test]
fn snapshot_rejects_misaligned_or_corrupt_artifacts() {
    let base = Snapshot {
        schema_version: SCHEMA_VERSION,
        embedder_id: "hash:xx64:d4".to_string(),
        dim: 4,
        items: vec![item("a", 0, 0), item("b", 0, 0)],
        vectors: vec![unit(4, 0), unit(4, 1)],
        interactions: Vec::new(),
    };
    assert!(base.validate().is_ok());

    let missing_vector = Snapshot { vectors: vec![unit(4, 0)], ..clone_snapshot(&base) };
    assert!(matches!(missing_vector.validate(), Err(Error::CorruptIndexState(_))));

    let bad_dim = Snapshot { vectors: vec![unit(4, 0), vec![1.0; 3]], ..clone_snapshot(&base) };
    assert!(matches!(bad_dim.validate(), Err(Error::CorruptIndexState(_))));

    let bad_schema = Snapshot { schema_version: SCHEMA_VERSION + 1, ..clone_snapshot(&base) };
    assert!(matches!(bad_schema.validate(), Err(Error::CorruptIndexState(_))));

    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("garbage.json");
    std::fs::write(&path, b"not json at all").expect("write");
    assert!(matches!(Snapshot::load(&path), Err(Error::CorruptIndexState(_))));
}

fn clone_snapshot(s: &Snapshot) -> Snapshot {
    Snapshot {
        schema_version: s.schema_version,
        embedder_id: s.embedder_id.clone(),
        dim: s.dim,
        items: s.items.clone(),
        vectors: s.vectors.clone(),
        interactions: s.interactions.clone(),
    }
}
