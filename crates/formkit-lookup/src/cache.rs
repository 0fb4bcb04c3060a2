//! The lookup cache.
//!
//! A [`LookupCache`] maps table types to loaded [`LookupTable`]s. Requests for
//! a table that is not cached yet are coalesced: the first request starts a
//! load on the most recently registered [`CacheLoader`] that supports the
//! type, and every later request while the load is in flight only queues its
//! ready callback. When the loader stores the table, the queued callbacks fire
//! once each, in the order they were queued.
//!
//! The cache is single-threaded. Each thread has its own global instance,
//! returned by [`LookupCache::global`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use formkit_core::{FormkitError, FormkitResult};

use crate::loader::CacheLoader;
use crate::table::LookupTable;

/// A callback invoked with the table type once a requested table is cached.
pub type ReadyCallback = Rc<dyn Fn(&str)>;

/// An in-flight load and the callbacks waiting for it.
#[derive(Default)]
struct PendingLoad {
    callbacks: Vec<ReadyCallback>,
}

impl PendingLoad {
    fn enqueue(&mut self, callback: Option<ReadyCallback>) {
        if let Some(cb) = callback {
            if !self.callbacks.iter().any(|c| Rc::ptr_eq(c, &cb)) {
                self.callbacks.push(cb);
            }
        }
    }
}

thread_local! {
    static GLOBAL: RefCell<Rc<LookupCache>> = RefCell::new(Rc::new(LookupCache::new()));
}

/// A cache of lookup tables by type.
#[derive(Default)]
pub struct LookupCache {
    tables: RefCell<HashMap<String, Rc<LookupTable>>>,
    pending: RefCell<HashMap<String, PendingLoad>>,
    loaders: RefCell<Vec<Rc<dyn CacheLoader>>>,
}

impl fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cached: Vec<String> = self.tables.borrow().keys().cloned().collect();
        cached.sort();
        let mut loading: Vec<String> = self.pending.borrow().keys().cloned().collect();
        loading.sort();
        f.debug_struct("LookupCache")
            .field("cached", &cached)
            .field("loading", &loading)
            .field("loaders", &self.loaders.borrow().len())
            .finish()
    }
}

impl LookupCache {
    /// Creates an empty cache with no loaders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this thread's global cache.
    pub fn global() -> Rc<Self> {
        GLOBAL.with(|g| Rc::clone(&g.borrow()))
    }

    /// Replaces this thread's global cache.
    pub fn set_global(cache: Rc<Self>) {
        GLOBAL.with(|g| *g.borrow_mut() = cache);
    }

    /// Registers a loader. Loaders registered later are asked first.
    pub fn register_loader(&self, loader: Rc<dyn CacheLoader>) {
        self.loaders.borrow_mut().push(loader);
    }

    /// Returns the number of registered loaders.
    pub fn loader_count(&self) -> usize {
        self.loaders.borrow().len()
    }

    /// Returns the cached table of the given type.
    ///
    /// If the table is not cached, a load is started (or joined, if one is
    /// already in flight) and `on_ready` is queued to be called once the
    /// table is cached. A loader that completes synchronously makes the table
    /// available in the return value of this same call, in which case
    /// `on_ready` has already fired.
    pub fn lookup_table(
        self: &Rc<Self>,
        table_type: &str,
        on_ready: Option<ReadyCallback>,
    ) -> Option<Rc<LookupTable>> {
        if let Some(table) = self.cached_table(table_type) {
            return Some(table);
        }
        self.load_lookup_table(table_type, on_ready);
        self.cached_table(table_type)
    }

    /// Resolves once the table of the given type is cached.
    ///
    /// Fails if no loader supports the type, if the load is abandoned because
    /// the type was evicted while loading, or if the loaded table carries
    /// errors.
    pub async fn lookup_table_async(self: &Rc<Self>, table_type: &str) -> FormkitResult<Rc<LookupTable>> {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let tx = RefCell::new(Some(tx));
        let on_ready: ReadyCallback = Rc::new(move |_: &str| {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(());
            }
        });

        let table = match self.lookup_table(table_type, Some(on_ready)) {
            Some(table) => table,
            None => {
                if !self.is_loading(table_type) {
                    return Err(load_error(table_type, "no loader supports this table type"));
                }
                rx.await
                    .map_err(|_| load_error(table_type, "the load was abandoned"))?;
                self.cached_table(table_type)
                    .ok_or_else(|| load_error(table_type, "the table was evicted"))?
            }
        };

        if table.errors().has_errors() {
            return Err(load_error(table_type, &table.errors().errors_text()));
        }
        Ok(table)
    }

    /// Returns the cached table without starting a load.
    pub fn cached_table(&self, table_type: &str) -> Option<Rc<LookupTable>> {
        self.tables.borrow().get(table_type).cloned()
    }

    /// Returns `true` if the table of the given type is cached.
    pub fn is_cached(&self, table_type: &str) -> bool {
        self.tables.borrow().contains_key(table_type)
    }

    /// Returns `true` if a load of the given type is in flight.
    pub fn is_loading(&self, table_type: &str) -> bool {
        self.pending.borrow().contains_key(table_type)
    }

    /// Evicts a table, so the next request reloads it.
    ///
    /// Callbacks waiting on an in-flight load of the type are dropped.
    pub fn remove_lookup_table(&self, table_type: &str) {
        let removed = self.tables.borrow_mut().remove(table_type).is_some();
        let abandoned = self.pending.borrow_mut().remove(table_type).is_some();
        tracing::debug!(table_type, removed, abandoned, "evicted lookup table");
    }

    /// Stores a table under its type and fires the callbacks queued for it,
    /// in queue order.
    pub fn cache_lookup_table(&self, table: LookupTable) -> Rc<LookupTable> {
        let table_type = table.table_type().to_string();
        let table = Rc::new(table);
        self.tables
            .borrow_mut()
            .insert(table_type.clone(), Rc::clone(&table));
        let pending = self.pending.borrow_mut().remove(&table_type);

        tracing::debug!(
            table_type = %table_type,
            rows = table.len(),
            errors = table.errors().len(),
            waiting = pending.as_ref().map_or(0, |p| p.callbacks.len()),
            "cached lookup table"
        );

        if let Some(pending) = pending {
            for callback in &pending.callbacks {
                callback(&table_type);
            }
        }
        table
    }

    fn load_lookup_table(self: &Rc<Self>, table_type: &str, on_ready: Option<ReadyCallback>) {
        let loader = self
            .loaders
            .borrow()
            .iter()
            .rev()
            .find(|l| l.is_supported(table_type))
            .cloned();

        let Some(loader) = loader else {
            // Nothing would ever complete a queue for this type.
            self.pending.borrow_mut().remove(table_type);
            tracing::warn!(table_type, "no cache loader supports the lookup table type");
            return;
        };

        {
            let mut pending = self.pending.borrow_mut();
            if let Some(load) = pending.get_mut(table_type) {
                load.enqueue(on_ready);
                tracing::trace!(table_type, waiting = load.callbacks.len(), "joined in-flight lookup load");
                return;
            }
            let mut load = PendingLoad::default();
            load.enqueue(on_ready);
            pending.insert(table_type.to_string(), load);
        }

        tracing::debug!(table_type, "loading lookup table");
        loader.load(self, table_type);
    }
}

fn load_error(table_type: &str, message: &str) -> FormkitError {
    FormkitError::LookupLoad {
        table_type: table_type.to_string(),
        message: message.to_string(),
    }
}
