//! Integration tests for lookup tables, the lookup cache and its loaders.
//!
//! Tests cover: coalesced loading across concurrent requesters, loader
//! priority, grouped duplicate keys, index resets, failed loads, and the
//! remote loader running on a local task set.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use formkit_core::header::FIELD_TEXT;
use formkit_core::{FormkitError, Header, Value};
use formkit_lookup::{
    group_attribute, CacheLoader, LookupCache, LookupSource, LookupTable, ReadyCallback,
    RemoteCacheLoader,
};

/// A loader that records its loads and completes them only when told to.
struct ManualLoader {
    name: &'static str,
    types: Vec<&'static str>,
    loads: RefCell<Vec<String>>,
}

impl ManualLoader {
    fn new(name: &'static str, types: &[&'static str]) -> Rc<Self> {
        Rc::new(Self {
            name,
            types: types.to_vec(),
            loads: RefCell::new(Vec::new()),
        })
    }
}

impl CacheLoader for ManualLoader {
    fn is_supported(&self, table_type: &str) -> bool {
        self.types.contains(&table_type)
    }

    fn load(&self, _cache: &Rc<LookupCache>, table_type: &str) {
        self.loads.borrow_mut().push(format!("{}:{table_type}", self.name));
    }
}

fn status_table() -> LookupTable {
    LookupTable::new(
        "Status",
        vec![Header::new("", "O", "Open"), Header::new("", "C", "Closed")],
        false,
    )
}

fn recording_callback(log: &Rc<RefCell<Vec<String>>>, name: &str) -> ReadyCallback {
    let log = Rc::clone(log);
    let name = name.to_string();
    Rc::new(move |t: &str| log.borrow_mut().push(format!("{name}:{t}")))
}

// ═════════════════════════════════════════════════════════════════════
// 1. Coalesced loading
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_three_requesters_share_one_load_on_newest_supporting_loader() {
    let cache = Rc::new(LookupCache::new());
    let l1 = ManualLoader::new("L1", &["Other"]);
    let l2 = ManualLoader::new("L2", &["Status"]);
    cache.register_loader(l1.clone());
    cache.register_loader(l2.clone());

    let log = Rc::new(RefCell::new(Vec::new()));
    for caller in ["first", "second", "third"] {
        let table = cache.lookup_table("Status", Some(recording_callback(&log, caller)));
        assert!(table.is_none());
    }

    assert_eq!(*l2.loads.borrow(), vec!["L2:Status"]);
    assert!(l1.loads.borrow().is_empty());
    assert!(cache.is_loading("Status"));
    assert!(log.borrow().is_empty());

    cache.cache_lookup_table(status_table());

    assert_eq!(
        *log.borrow(),
        vec!["first:Status", "second:Status", "third:Status"]
    );
    assert!(!cache.is_loading("Status"));

    // Later requests hit the cache without a new load or callback.
    let table = cache.lookup_table("Status", Some(recording_callback(&log, "late")));
    assert_eq!(table.map(|t| t.len()), Some(2));
    assert_eq!(l2.loads.borrow().len(), 1);
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn test_newer_loader_wins_when_both_support() {
    let cache = Rc::new(LookupCache::new());
    let old = ManualLoader::new("old", &["Status"]);
    let new = ManualLoader::new("new", &["Status"]);
    cache.register_loader(old.clone());
    cache.register_loader(new.clone());

    cache.lookup_table("Status", None);
    assert!(old.loads.borrow().is_empty());
    assert_eq!(new.loads.borrow().len(), 1);
}

#[test]
fn test_evicted_type_starts_fresh_load() {
    let cache = Rc::new(LookupCache::new());
    let loader = ManualLoader::new("L", &["Status"]);
    cache.register_loader(loader.clone());

    let log = Rc::new(RefCell::new(Vec::new()));
    cache.lookup_table("Status", Some(recording_callback(&log, "dropped")));
    cache.remove_lookup_table("Status");
    cache.lookup_table("Status", Some(recording_callback(&log, "kept")));
    cache.cache_lookup_table(status_table());

    assert_eq!(loader.loads.borrow().len(), 2);
    assert_eq!(*log.borrow(), vec!["kept:Status"]);
}

#[test]
fn test_async_requesters_resolve_together() {
    let cache = Rc::new(LookupCache::new());
    let loader = ManualLoader::new("L", &["Status"]);
    cache.register_loader(loader.clone());

    let mut a = tokio_test::task::spawn(cache.lookup_table_async("Status"));
    let mut b = tokio_test::task::spawn(cache.lookup_table_async("Status"));
    tokio_test::assert_pending!(a.poll());
    tokio_test::assert_pending!(b.poll());
    assert_eq!(loader.loads.borrow().len(), 1);

    cache.cache_lookup_table(status_table());
    let ta = tokio_test::assert_ready_ok!(a.poll());
    let tb = tokio_test::assert_ready_ok!(b.poll());
    assert!(Rc::ptr_eq(&ta, &tb));
}

#[test]
fn test_async_request_for_error_table_fails() {
    let cache = Rc::new(LookupCache::new());
    cache.cache_lookup_table(LookupTable::from_errors(
        "Broken",
        formkit_core::ErrorList::from_error("x", "Broken table."),
    ));
    let result = tokio_test::block_on(cache.lookup_table_async("Broken"));
    match result {
        Err(FormkitError::LookupLoad { table_type, message }) => {
            assert_eq!(table_type, "Broken");
            assert_eq!(message, "Broken table.");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

// ═════════════════════════════════════════════════════════════════════
// 2. Indexed lookup
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_duplicate_keys_grouped_on_first_header() {
    let table = LookupTable::new(
        "City",
        vec![
            Header::new("", "1", "Springfield"),
            Header::new("", "2", "Springfield"),
            Header::new("", "3", "Shelbyville"),
        ],
        false,
    );

    let winner = table.lookup_by_format(FIELD_TEXT, "springfield").unwrap();
    assert_eq!(winner.id, "1");
    let grouped = winner.attribute(&group_attribute(FIELD_TEXT)).and_then(Value::as_header);
    assert_eq!(grouped.map(|h| h.id.as_str()), Some("2"));

    // The id index has no collisions and no group attribute of its own.
    let by_id = table.lookup_by_id("2").unwrap();
    assert!(by_id.attribute(&group_attribute("[i]")).is_none());
}

#[test]
fn test_lookup_after_reset_indexes() {
    let table = LookupTable::new(
        "City",
        vec![Header::new("", "1", "Springfield"), Header::new("", "2", "Springfield")],
        false,
    );
    assert_eq!(table.lookup_by_format(FIELD_TEXT, "SPRINGFIELD").map(|h| h.id), Some("1".into()));

    table.reset_indexes();
    let winner = table.lookup_by_format(FIELD_TEXT, "Springfield").unwrap();
    assert_eq!(winner.id, "1");
    let grouped = winner.attribute(&group_attribute(FIELD_TEXT)).unwrap();
    // Rebuilding does not group the same duplicate twice.
    assert!(grouped.as_header().is_some());
    assert_eq!(table.lookup_by_format("[t]-[i]", "springfield-2").map(|h| h.id), Some("2".into()));
}

// ═════════════════════════════════════════════════════════════════════
// 3. Remote loading
// ═════════════════════════════════════════════════════════════════════

struct MapSource {
    tables: HashMap<String, serde_json::Value>,
    fail: bool,
    calls: Cell<usize>,
}

#[async_trait(?Send)]
impl LookupSource for MapSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<Option<serde_json::Value>> {
        self.calls.set(self.calls.get() + 1);
        tokio::task::yield_now().await;
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(self.tables.get(path).cloned())
    }
}

fn remote_cache(fail: bool) -> Rc<LookupCache> {
    let mut tables = HashMap::new();
    tables.insert(
        "lookup-table/Priority".to_string(),
        serde_json::json!({
            "Type": "Priority",
            "data": [{ "Id": "H", "Text": "High" }, { "Id": "L", "Text": "Low" }]
        }),
    );
    let cache = Rc::new(LookupCache::new());
    cache.register_loader(Rc::new(RemoteCacheLoader::with_template(
        MapSource {
            tables,
            fail,
            calls: Cell::new(0),
        },
        "lookup-table/{0}",
    )));
    cache
}

#[tokio::test]
async fn test_remote_loader_fetches_table() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let cache = remote_cache(false);
            let table = cache.lookup_table_async("Priority").await.unwrap();
            assert_eq!(table.lookup_by_id("h").map(|h| h.text), Some("High".into()));
        })
        .await;
}

#[tokio::test]
async fn test_remote_loader_missing_table() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let cache = remote_cache(false);
            let err = cache.lookup_table_async("Color").await.unwrap_err();
            assert!(err.to_string().contains("Lookup table 'Color' is not found."));
            let table = cache.cached_table("Color").unwrap();
            assert!(table.is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_remote_loader_transport_failure() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let cache = remote_cache(true);
            let err = cache.lookup_table_async("Priority").await.unwrap_err();
            assert!(err.to_string().contains("connection refused"));
            let fired = Rc::new(Cell::new(false));
            let f = Rc::clone(&fired);
            let table = cache.lookup_table("Priority", Some(Rc::new(move |_: &str| f.set(true))));
            assert!(table.unwrap().errors().has_errors());
            assert!(!fired.get());
        })
        .await;
}
