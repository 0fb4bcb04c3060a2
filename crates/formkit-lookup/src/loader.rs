//! Cache loaders.
//!
//! A [`CacheLoader`] knows how to populate one or more table types into a
//! [`LookupCache`]. Three implementations are provided:
//!
//! - [`BaseCacheLoader`] delegates the actual fetching to a [`TableProvider`]
//!   and handles the bookkeeping: it either serves an explicit list of table
//!   types or learns its types from the tables it loads, and it never
//!   overwrites a table that another loader has cached in the meantime.
//! - [`LocalCacheLoader`] owns a private cache holding one table type that is
//!   loaded from a set of named parameters, and reloads it whenever the
//!   parameters change.
//! - [`RemoteCacheLoader`] fetches any table type from a [`LookupSource`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;

use formkit_core::utils::text::format_message;
use formkit_core::{ErrorList, Header, Value, SETTINGS};
use formkit_signals::Signal;

use crate::cache::{LookupCache, ReadyCallback};
use crate::table::LookupTable;

/// Named input parameters of a parameterized table load.
pub type Parameters = BTreeMap<String, Value>;

/// A capability to load lookup tables into a cache.
pub trait CacheLoader {
    /// Returns `true` if this loader can load tables of the given type.
    fn is_supported(&self, table_type: &str) -> bool;

    /// Starts loading the given table type. The loader stores the result with
    /// [`LookupCache::cache_lookup_table`], synchronously or later.
    fn load(&self, cache: &Rc<LookupCache>, table_type: &str);
}

// ── Provider-backed loading ──────────────────────────────────────────

/// The description of one table load handed to a [`TableProvider`].
#[derive(Debug, Clone)]
pub struct TableRequest {
    /// The requested table type.
    pub table_type: String,
    /// Whether the produced table should be case-sensitive.
    pub case_sensitive: bool,
    /// Named input parameters; empty for loaders without parameters.
    pub parameters: Parameters,
}

/// Receives the result of one table load.
///
/// The sink is consumed by the first completion, so a load completes at most
/// once.
pub struct TableSink {
    cache: Rc<LookupCache>,
    request: TableRequest,
    supported: Rc<RefCell<Option<Vec<String>>>>,
}

impl TableSink {
    /// The request this sink completes.
    pub const fn request(&self) -> &TableRequest {
        &self.request
    }

    /// Completes the load with the given headers.
    pub fn complete(self, data: Vec<Header>) {
        let table = LookupTable::new(self.request.table_type.clone(), data, self.request.case_sensitive);
        self.complete_table(table);
    }

    /// Completes the load with a ready-made table.
    pub fn complete_table(self, table: LookupTable) {
        if self.cache.is_cached(&self.request.table_type) {
            tracing::debug!(
                table_type = %self.request.table_type,
                "lookup table already cached by another loader"
            );
            return;
        }
        let loaded_type = table.table_type().to_string();
        self.cache.cache_lookup_table(table);

        let mut supported = self.supported.borrow_mut();
        let types = supported.get_or_insert_with(Vec::new);
        if !types.contains(&loaded_type) {
            types.push(loaded_type);
        }
    }

    /// Completes the load with an empty table carrying `errors`.
    pub fn fail(self, errors: ErrorList) {
        tracing::warn!(
            table_type = %self.request.table_type,
            errors = %errors,
            "lookup table load failed"
        );
        let table = LookupTable::from_errors(self.request.table_type.clone(), errors);
        self.complete_table(table);
    }
}

/// Fetches the data of a table for a [`BaseCacheLoader`].
///
/// Implementations call one of the completion methods on the sink, either
/// before returning or later, e.g. from a spawned task.
pub trait TableProvider {
    /// Loads the table described by `request` into `sink`.
    fn load_table(&self, request: TableRequest, sink: TableSink);
}

impl<F: Fn(TableRequest, TableSink)> TableProvider for F {
    fn load_table(&self, request: TableRequest, sink: TableSink) {
        self(request, sink);
    }
}

/// A loader that serves either an explicit list of table types or the types
/// it has learned from its first loads.
pub struct BaseCacheLoader<P> {
    provider: P,
    case_sensitive: bool,
    supported: Rc<RefCell<Option<Vec<String>>>>,
    parameters: Rc<RefCell<Parameters>>,
}

impl<P: TableProvider> BaseCacheLoader<P> {
    /// Creates a loader for the given table types. With no types, the loader
    /// accepts any type until its first load completes.
    pub fn new(provider: P, case_sensitive: bool, table_types: &[&str]) -> Self {
        let supported = if table_types.is_empty() {
            None
        } else {
            Some(table_types.iter().map(ToString::to_string).collect())
        };
        Self {
            provider,
            case_sensitive,
            supported: Rc::new(RefCell::new(supported)),
            parameters: Rc::new(RefCell::new(Parameters::new())),
        }
    }

    /// Whether loaded tables are case-sensitive.
    pub const fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The table types this loader serves, if known.
    pub fn supported_types(&self) -> Option<Vec<String>> {
        self.supported.borrow().clone()
    }

    /// The provider that fetches the data.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    fn with_parameters(mut self, parameters: Rc<RefCell<Parameters>>) -> Self {
        self.parameters = parameters;
        self
    }
}

impl<P: TableProvider> CacheLoader for BaseCacheLoader<P> {
    fn is_supported(&self, table_type: &str) -> bool {
        self.supported
            .borrow()
            .as_ref()
            .map_or(true, |types| types.iter().any(|t| t == table_type))
    }

    fn load(&self, cache: &Rc<LookupCache>, table_type: &str) {
        if !self.is_supported(table_type) {
            return;
        }
        let request = TableRequest {
            table_type: table_type.to_string(),
            case_sensitive: self.case_sensitive,
            parameters: self.parameters.borrow().clone(),
        };
        let sink = TableSink {
            cache: Rc::clone(cache),
            request: request.clone(),
            supported: Rc::clone(&self.supported),
        };
        self.provider.load_table(request, sink);
    }
}

// ── Local, parameterized loading ─────────────────────────────────────

/// A loader with its own cache that loads a single table type from a set of
/// named parameters.
///
/// # Examples
///
/// ```
/// use formkit_core::{Header, Value};
/// use formkit_lookup::{LocalCacheLoader, Parameters, TableRequest, TableSink};
///
/// let loader = LocalCacheLoader::new(
///     |req: TableRequest, sink: TableSink| {
///         let country = req.parameters.get("country").map(ToString::to_string).unwrap_or_default();
///         let rows = if country == "US" { vec![Header::new("", "CA", "California")] } else { vec![] };
///         sink.complete(rows);
///     },
///     false,
///     "state",
/// );
///
/// let mut params = Parameters::new();
/// params.insert("country".into(), Value::from("US"));
/// loader.set_parameters(params, None);
///
/// assert_eq!(loader.lookup_table(None).map(|t| t.len()), Some(1));
/// ```
pub struct LocalCacheLoader {
    cache: Rc<LookupCache>,
    table_type: String,
    parameters: Rc<RefCell<Parameters>>,
    reloaded: Rc<Signal<String>>,
    notify_reloaded: ReadyCallback,
}

impl LocalCacheLoader {
    /// Creates a local loader of `table_type` backed by `provider`.
    pub fn new<P: TableProvider + 'static>(provider: P, case_sensitive: bool, table_type: &str) -> Self {
        let parameters = Rc::new(RefCell::new(Parameters::new()));
        let inner = BaseCacheLoader::new(provider, case_sensitive, &[table_type])
            .with_parameters(Rc::clone(&parameters));
        let cache = Rc::new(LookupCache::new());
        cache.register_loader(Rc::new(inner));

        let reloaded: Rc<Signal<String>> = Rc::new(Signal::new());
        let signal = Rc::clone(&reloaded);
        let notify_reloaded: ReadyCallback = Rc::new(move |t: &str| {
            signal.send(&t.to_string());
        });

        Self {
            cache,
            table_type: table_type.to_string(),
            parameters,
            reloaded,
            notify_reloaded,
        }
    }

    /// The private cache this loader populates.
    pub const fn cache(&self) -> &Rc<LookupCache> {
        &self.cache
    }

    /// The table type this loader populates.
    pub fn table_type(&self) -> &str {
        &self.table_type
    }

    /// The current input parameters.
    pub fn parameters(&self) -> Parameters {
        self.parameters.borrow().clone()
    }

    /// Fires with the table type after every reload started by
    /// [`set_parameters`](Self::set_parameters) completes.
    pub fn reloaded(&self) -> &Rc<Signal<String>> {
        &self.reloaded
    }

    /// Returns the table, starting a load with the current parameters if it
    /// is not cached.
    pub fn lookup_table(&self, on_ready: Option<ReadyCallback>) -> Option<Rc<LookupTable>> {
        self.cache.lookup_table(&self.table_type, on_ready)
    }

    /// Replaces the input parameters, evicts the table, and reloads it.
    pub fn set_parameters(&self, parameters: Parameters, on_ready: Option<ReadyCallback>) {
        *self.parameters.borrow_mut() = parameters;
        self.cache.remove_lookup_table(&self.table_type);

        // Queue the caller first, then the reload notification.
        if self.cache.lookup_table(&self.table_type, on_ready.clone()).is_some() {
            // Completed synchronously; the caller was notified by the cache.
            (self.notify_reloaded)(&self.table_type);
            return;
        }
        self.cache
            .lookup_table(&self.table_type, Some(Rc::clone(&self.notify_reloaded)));
    }
}

// ── Remote loading ───────────────────────────────────────────────────

/// The transport collaborator a [`RemoteCacheLoader`] fetches tables through.
///
/// `fetch` returns the wire form of the table at `path`, or `None` if the
/// service has no such table.
#[async_trait(?Send)]
pub trait LookupSource {
    /// Fetches the JSON payload at `path`.
    async fn fetch(&self, path: &str) -> anyhow::Result<Option<serde_json::Value>>;
}

/// A loader that fetches any table type from a [`LookupSource`].
///
/// Loads run on the current thread's local task set, so the loader must be
/// used from within a [`tokio::task::LocalSet`].
pub struct RemoteCacheLoader<S> {
    source: Rc<S>,
    uri_template: String,
}

impl<S: LookupSource + 'static> RemoteCacheLoader<S> {
    /// Creates a loader using the configured lookup URI template.
    pub fn new(source: S) -> Self {
        Self::with_template(source, SETTINGS.get().lookup_uri_template.clone())
    }

    /// Creates a loader with an explicit URI template; `{0}` is the table type.
    pub fn with_template(source: S, uri_template: impl Into<String>) -> Self {
        Self {
            source: Rc::new(source),
            uri_template: uri_template.into(),
        }
    }

    /// Returns the path requested for the given table type.
    pub fn path_for(&self, table_type: &str) -> String {
        format_message(&self.uri_template, &[table_type])
    }
}

impl<S: LookupSource + 'static> CacheLoader for RemoteCacheLoader<S> {
    fn is_supported(&self, _table_type: &str) -> bool {
        true
    }

    fn load(&self, cache: &Rc<LookupCache>, table_type: &str) {
        let source = Rc::clone(&self.source);
        let cache = Rc::clone(cache);
        let table_type = table_type.to_string();
        let path = self.path_for(&table_type);

        tokio::task::spawn_local(async move {
            let result = source.fetch(&path).await;
            if cache.is_cached(&table_type) {
                return;
            }
            let table = match result {
                Ok(Some(json)) => match LookupTable::from_json(&json) {
                    Ok(table) => table,
                    Err(e) => {
                        LookupTable::from_errors(table_type.clone(), ErrorList::from_error("parse", e.to_string()))
                    }
                },
                Ok(None) => LookupTable::from_errors(
                    table_type.clone(),
                    ErrorList::from_error(
                        "not_found",
                        format_message("Lookup table '{0}' is not found.", &[&table_type]),
                    ),
                ),
                Err(e) => {
                    tracing::error!(table_type = %table_type, path = %path, error = %e, "lookup fetch failed");
                    LookupTable::from_errors(table_type.clone(), ErrorList::from_error("fetch", e.to_string()))
                }
            };
            cache.cache_lookup_table(table);
        });
    }
}
