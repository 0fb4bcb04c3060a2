//! Cache loaders and lookup sources for tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use formkit_core::Header;
use formkit_lookup::{CacheLoader, LookupCache, LookupSource, LookupTable};
use serde_json::Value as Json;

/// The headers and case sensitivity of one served table.
#[derive(Debug, Clone)]
struct TableData {
    headers: Vec<Header>,
    case_sensitive: bool,
}

impl TableData {
    fn of(table: &LookupTable) -> (String, Self) {
        (
            table.table_type().to_string(),
            Self {
                headers: table.values(|_| true),
                case_sensitive: table.is_case_sensitive(),
            },
        )
    }

    fn build(&self, table_type: &str) -> LookupTable {
        LookupTable::new(table_type, self.headers.clone(), self.case_sensitive)
    }
}

fn index(tables: Vec<LookupTable>) -> HashMap<String, TableData> {
    tables.iter().map(TableData::of).collect()
}

/// A loader that serves fixed tables immediately and counts its loads.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formkit_lookup::LookupCache;
/// use formkit_test::{table, RecordingLoader};
///
/// let loader = RecordingLoader::new(vec![table("Status", &[("O", "Open")])]);
/// let cache = Rc::new(LookupCache::new());
/// cache.register_loader(loader.clone());
/// assert!(cache.lookup_table("Status", None).is_some());
/// assert_eq!(loader.load_count("Status"), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingLoader {
    tables: RefCell<HashMap<String, TableData>>,
    loads: RefCell<Vec<String>>,
}

impl RecordingLoader {
    /// Creates a loader serving `tables`.
    pub fn new(tables: Vec<LookupTable>) -> Rc<Self> {
        Rc::new(Self {
            tables: RefCell::new(index(tables)),
            loads: RefCell::new(Vec::new()),
        })
    }

    /// Every load so far, by table type, in order.
    pub fn loads(&self) -> Vec<String> {
        self.loads.borrow().clone()
    }

    /// The number of loads of `table_type`.
    pub fn load_count(&self, table_type: &str) -> usize {
        self.loads.borrow().iter().filter(|t| *t == table_type).count()
    }

    /// Replaces the table served for its type by later loads.
    pub fn set_table(&self, table: &LookupTable) {
        let (table_type, data) = TableData::of(table);
        self.tables.borrow_mut().insert(table_type, data);
    }
}

impl CacheLoader for RecordingLoader {
    fn is_supported(&self, table_type: &str) -> bool {
        self.tables.borrow().contains_key(table_type)
    }

    fn load(&self, cache: &Rc<LookupCache>, table_type: &str) {
        self.loads.borrow_mut().push(table_type.to_string());
        let table = self.tables.borrow().get(table_type).map(|d| d.build(table_type));
        if let Some(table) = table {
            cache.cache_lookup_table(table);
        }
    }
}

/// A loader that holds every load until [`DeferredLoader::complete`] is
/// called for its type.
#[derive(Debug, Default)]
pub struct DeferredLoader {
    tables: RefCell<HashMap<String, TableData>>,
    pending: RefCell<BTreeMap<String, Rc<LookupCache>>>,
    loads: RefCell<Vec<String>>,
}

impl DeferredLoader {
    /// Creates a loader that will serve `tables` once completed.
    pub fn new(tables: Vec<LookupTable>) -> Rc<Self> {
        Rc::new(Self {
            tables: RefCell::new(index(tables)),
            ..Self::default()
        })
    }

    /// The number of loads of `table_type`.
    pub fn load_count(&self, table_type: &str) -> usize {
        self.loads.borrow().iter().filter(|t| *t == table_type).count()
    }

    /// Whether a load of `table_type` is waiting for completion.
    pub fn is_pending(&self, table_type: &str) -> bool {
        self.pending.borrow().contains_key(table_type)
    }

    /// Completes the pending load of `table_type`. Returns `false` if there
    /// is none.
    pub fn complete(&self, table_type: &str) -> bool {
        let Some(cache) = self.pending.borrow_mut().remove(table_type) else {
            return false;
        };
        let table = self.tables.borrow().get(table_type).map(|d| d.build(table_type));
        match table {
            Some(table) => {
                cache.cache_lookup_table(table);
                true
            }
            None => false,
        }
    }
}

impl CacheLoader for DeferredLoader {
    fn is_supported(&self, table_type: &str) -> bool {
        self.tables.borrow().contains_key(table_type)
    }

    fn load(&self, cache: &Rc<LookupCache>, table_type: &str) {
        self.loads.borrow_mut().push(table_type.to_string());
        self.pending
            .borrow_mut()
            .insert(table_type.to_string(), Rc::clone(cache));
    }
}

/// A [`LookupSource`] answering from a fixed map of paths to payloads.
///
/// Each fetch yields once before answering, so it completes after the
/// request that started it.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    payloads: HashMap<String, Result<Json, String>>,
    fetches: Rc<RefCell<Vec<String>>>,
}

impl StaticSource {
    /// Creates an empty source; every fetch returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `payload` at `path`.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, payload: Json) -> Self {
        self.payloads.insert(path.into(), Ok(payload));
        self
    }

    /// Fails fetches of `path` with `message`.
    #[must_use]
    pub fn failing(mut self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.payloads.insert(path.into(), Err(message.into()));
        self
    }

    /// The paths fetched so far. Clones of a source share this record.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.borrow().clone()
    }
}

#[async_trait(?Send)]
impl LookupSource for StaticSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<Option<Json>> {
        self.fetches.borrow_mut().push(path.to_string());
        tokio::task::yield_now().await;
        match self.payloads.get(path) {
            Some(Ok(json)) => Ok(Some(json.clone())),
            Some(Err(message)) => Err(anyhow::anyhow!("{message}")),
            None => Ok(None),
        }
    }
}
