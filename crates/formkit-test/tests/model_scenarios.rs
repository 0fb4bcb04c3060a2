//! End-to-end scenarios for the formkit data model.
//!
//! Tests cover: validation and export of a simple form, modification
//! tracking, validation memoization, lookup-backed enumerations sharing one
//! load, readiness, cascading filters, search operators and their operands,
//! criteria summaries, saving and searching through handlers, the remote
//! loader, and URL encoding.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use formkit_core::{FormkitError, FormkitResult, Value, ValueFormat};
use formkit_lookup::{LookupCache, RemoteCacheLoader};
use formkit_model::{
    DataObject, FieldCriteria, ListSortField, Modified, ObjectHandler, PropertyDef, SelectionMode,
};
use formkit_test::{
    header_with, init_test_logging, operators_table, table, CountingValidator, DeferredLoader,
    RecordingLoader, StaticSource, OPERATORS,
};
use serde_json::{json, Value as Json};

// ── Helpers ──────────────────────────────────────────────────────────

fn geography() -> (Rc<LookupCache>, Rc<RecordingLoader>) {
    let states = formkit_lookup::LookupTable::new(
        "State",
        vec![
            header_with("NY", "New York", &[("country", Value::from("US"))]),
            header_with("TX", "Texas", &[("country", Value::from("US"))]),
            header_with("ON", "Ontario", &[("country", Value::from("CA"))]),
        ],
        false,
    );
    let loader = RecordingLoader::new(vec![
        table("Country", &[("US", "United States"), ("CA", "Canada")]),
        states,
    ]);
    let cache = Rc::new(LookupCache::new());
    cache.register_loader(loader.clone());
    (cache, loader)
}

fn operator_cache() -> Rc<LookupCache> {
    let cache = Rc::new(LookupCache::new());
    cache.cache_lookup_table(operators_table());
    cache
}

fn search_criteria(cache: &Rc<LookupCache>) -> Rc<DataObject> {
    DataObject::builder("Search")
        .property(
            "AgeOperator",
            PropertyDef::operator(OPERATORS).label("Age").cache(Rc::clone(cache)),
        )
        .property("Age", PropertyDef::integer())
        .property("Age2", PropertyDef::integer())
        .property("Name", PropertyDef::text())
        .search_criteria()
        .build()
}

fn ids(values: Option<Vec<Value>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_header().map(|h| h.id.clone()))
        .collect()
}

/// Saves into memory and serves reads from a replaceable payload.
#[derive(Default)]
struct MemoryHandler {
    payload: RefCell<Option<Json>>,
    reads: Cell<usize>,
    saved: RefCell<Vec<Json>>,
}

impl MemoryHandler {
    fn serving(payload: Json) -> Rc<Self> {
        Rc::new(Self {
            payload: RefCell::new(Some(payload)),
            ..Self::default()
        })
    }
}

#[async_trait(?Send)]
impl ObjectHandler for MemoryHandler {
    async fn do_read(&self, _obj: &DataObject) -> FormkitResult<Option<Json>> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.payload.borrow().clone())
    }

    async fn do_save(&self, obj: &DataObject) -> FormkitResult<()> {
        self.saved.borrow_mut().push(obj.to_json());
        Ok(())
    }
}

// ═════════════════════════════════════════════════════════════════════
// 1. Validation and export
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_negative_age_fails_minimum_and_still_exports() {
    init_test_logging();
    let person = DataObject::builder("Person")
        .property("Age", PropertyDef::integer().min(0.0))
        .build();
    person.from_json(&json!({"Age": "-5"})).unwrap();
    assert_eq!(person.data_property("Age").unwrap().modified(), Modified::Clean);

    person.validate(true);
    let errors = person.validation_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors_text(), "Age cannot be less than 0.");
    assert_eq!(person.to_json(), json!({"Age": -5}));
}

#[test]
fn test_modified_transitions() {
    let person = DataObject::builder("Person")
        .property("Name", PropertyDef::text())
        .property("Age", PropertyDef::integer())
        .build();
    let name = person.data_property("Name").unwrap();
    assert_eq!(name.modified(), Modified::Unset);
    assert_eq!(person.modified(), Modified::Unset);

    name.set_internal_value(Value::from("Ann"));
    assert_eq!(name.modified(), Modified::Clean);
    assert_eq!(person.modified(), Modified::Clean);

    name.set_internal_value(Value::from("Ann"));
    assert_eq!(name.modified(), Modified::Clean);

    name.set_internal_value(Value::from("Bea"));
    assert_eq!(name.modified(), Modified::Dirty);
    assert_eq!(person.modified(), Modified::Dirty);

    person.set_modified(Modified::Clean);
    assert_eq!(name.modified(), Modified::Clean);
    assert_eq!(person.modified(), Modified::Clean);
}

#[test]
fn test_validation_is_memoized_until_a_value_changes() {
    let counting = CountingValidator::new();
    let person = DataObject::builder("Person")
        .property("Name", PropertyDef::text().validator(counting.clone()))
        .build();
    let name = person.data_property("Name").unwrap();
    name.set_internal_value(Value::from("a"));

    person.validate(false);
    person.validate(false);
    name.validate(false);
    assert_eq!(counting.calls(), 1);
    assert!(person.is_validated());

    // An edit re-validates the property and invalidates its ancestors.
    name.set_internal_value(Value::from("b"));
    assert_eq!(counting.calls(), 2);
    assert!(!person.is_validated());

    person.validate(false);
    assert_eq!(counting.calls(), 2);
    person.validate(true);
    assert_eq!(counting.calls(), 3);
}

#[test]
fn test_data_list_sorting() {
    let people = DataObject::builder("People")
        .property("Id", PropertyDef::integer().key(true))
        .property("Name", PropertyDef::text())
        .sort_criteria(vec![ListSortField::new("Name").nulls_first(true)])
        .build();
    people
        .from_json(&json!([{"Id": 1}, {"Id": 2, "Name": "Bob"}, {"Id": 3, "Name": "Ann"}]))
        .unwrap();
    let names = |list: &DataObject| -> Vec<Value> { list.rows().iter().map(|r| r.value("Name")).collect() };
    assert_eq!(names(&people), [Value::Null, Value::from("Ann"), Value::from("Bob")]);

    people.set_sort_criteria(vec![ListSortField::new("Name").nulls_first(true).descending()]);
    assert_eq!(names(&people), [Value::Null, Value::from("Bob"), Value::from("Ann")]);
}

// ═════════════════════════════════════════════════════════════════════
// 2. Lookup-backed enumerations
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_enumerations_share_one_load_and_become_ready_together() {
    let loader = DeferredLoader::new(vec![table("Status", &[("O", "Open"), ("C", "Closed")])]);
    let cache = Rc::new(LookupCache::new());
    cache.register_loader(loader.clone());

    let ticket = DataObject::builder("Ticket")
        .property("Status", PropertyDef::enumeration("Status").cache(Rc::clone(&cache)))
        .property("PreviousStatus", PropertyDef::enumeration("Status").cache(Rc::clone(&cache)))
        .property("NextStatus", PropertyDef::enumeration("Status").cache(Rc::clone(&cache)))
        .build();
    assert_eq!(loader.load_count("Status"), 1);
    assert!(cache.is_loading("Status"));
    assert!(!ticket.is_ready());

    let status = ticket.data_property("Status").unwrap();
    status.set_internal_value(Value::from("o"));
    assert!(!status.internal_value().as_header().unwrap().is_valid);

    let fired = Rc::new(Cell::new(0));
    let f = Rc::clone(&fired);
    let callback: Rc<dyn Fn()> = Rc::new(move || f.set(f.get() + 1));
    ticket.on_ready(Rc::clone(&callback));
    ticket.on_ready(callback);
    assert_eq!(fired.get(), 0);

    assert!(loader.complete("Status"));
    assert_eq!(fired.get(), 1);
    assert!(ticket.is_ready());
    assert_eq!(loader.load_count("Status"), 1);

    assert_eq!(status.display_string(), "Open");
    assert_eq!(status.transport_value(), Value::from("O"));
    assert_eq!(status.modified(), Modified::Clean);
    let next = ticket.data_property("NextStatus").unwrap();
    assert_eq!(ids(next.possible_values()), ["C", "O"]);

    let later = Rc::new(Cell::new(false));
    let l = Rc::clone(&later);
    ticket.on_ready(Rc::new(move || l.set(true)));
    assert!(later.get());
}

#[test]
fn test_cascading_state_follows_country() {
    let (cache, loader) = geography();
    let address = DataObject::builder("Address")
        .property("Country", PropertyDef::enumeration("Country").cache(Rc::clone(&cache)))
        .property(
            "State",
            PropertyDef::enumeration("State")
                .cascade("country", "Country")
                .cache(Rc::clone(&cache)),
        )
        .build();
    let country = address.data_property("Country").unwrap();
    let state = address.data_property("State").unwrap();
    assert!(address.is_ready());

    country.set_internal_value(Value::from("US"));
    assert_eq!(ids(state.possible_values()), ["NY", "TX"]);
    state.set_internal_value(Value::from("NY"));
    assert_eq!(state.display_string(), "New York");

    country.set_internal_value(Value::from("CA"));
    assert!(state.is_null());
    assert_eq!(state.modified(), Modified::Clean);
    assert_eq!(country.modified(), Modified::Dirty);
    assert_eq!(ids(state.possible_values()), ["ON"]);

    assert_eq!(loader.load_count("Country"), 1);
    assert_eq!(loader.load_count("State"), 1);
}

#[tokio::test]
async fn test_remote_loader_feeds_enumeration() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let source = StaticSource::new().with(
                "lookup/Priority",
                json!({"Type": "Priority", "data": [{"Id": "H", "Text": "High"}, {"Id": "L", "Text": "Low"}]}),
            );
            let cache = Rc::new(LookupCache::new());
            cache.register_loader(Rc::new(RemoteCacheLoader::with_template(source.clone(), "lookup/{0}")));

            let task = DataObject::builder("Task")
                .property("Priority", PropertyDef::enumeration("Priority").cache(Rc::clone(&cache)))
                .build();
            assert!(!task.is_ready());

            cache.lookup_table_async("Priority").await.unwrap();
            assert!(task.is_ready());
            let priority = task.data_property("Priority").unwrap();
            assert_eq!(ids(priority.possible_values()), ["H", "L"]);
            priority.set_value(Value::from("l"), ValueFormat::EditString);
            assert_eq!(priority.display_string(), "Low");
            assert_eq!(source.fetches(), ["lookup/Priority"]);
        })
        .await;
}

// ═════════════════════════════════════════════════════════════════════
// 3. Search operators and criteria
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_operator_shows_as_many_operands_as_it_needs() {
    let cache = operator_cache();
    let search = search_criteria(&cache);
    let op = search.data_property("AgeOperator").unwrap();
    let age = search.data_property("Age").unwrap();
    let age2 = search.data_property("Age2").unwrap();
    assert!(Rc::ptr_eq(&op.companion().unwrap(), &age));
    assert!(Rc::ptr_eq(&op.companion2().unwrap(), &age2));
    assert!(!age.is_visible());
    assert!(!age2.is_visible());

    // No null check and a single-valued operand rule out NULL and IN.
    assert_eq!(ids(op.possible_values()), ["EQ", "BW", "LT"]);

    op.set_internal_value(Value::from("BW"));
    assert!(age.is_visible() && age.is_required());
    assert!(age2.is_visible() && age2.is_required());

    op.set_internal_value(Value::from("EQ"));
    assert!(age.is_visible() && age.is_required());
    assert!(!age2.is_visible());
    assert!(!age2.is_required());
}

#[test]
fn test_null_check_operator_offered_when_enabled() {
    let cache = operator_cache();
    let search = DataObject::builder("Search")
        .property(
            "NameOperator",
            PropertyDef::operator(OPERATORS).null_check(true).cache(cache),
        )
        .property("Name", PropertyDef::text().multi_valued(true))
        .search_criteria()
        .build();
    let op = search.data_property("NameOperator").unwrap();
    // A text operand rules out LT; a multi-valued one allows IN.
    assert_eq!(ids(op.possible_values()), ["EQ", "BW", "IN", "NULL"]);
}

#[test]
fn test_fields_criteria_summary() {
    let cache = operator_cache();
    let search = search_criteria(&cache);
    assert!(!search.has_criteria());
    search.data_property("AgeOperator").unwrap().set_internal_value(Value::from("BW"));
    search.data_property("Age").unwrap().set_internal_value(Value::Int(1));
    search.data_property("Age2").unwrap().set_internal_value(Value::Int(5));
    search.data_property("Name").unwrap().set_internal_value(Value::from("Ann"));
    assert!(search.has_criteria());

    assert_eq!(
        search.fields_criteria(),
        vec![
            FieldCriteria::new("Age", Some("Between".into()), vec!["1".into(), "5".into()]),
            FieldCriteria::new("Name", None, vec!["Ann".into()]),
        ]
    );
}

#[test]
fn test_criteria_import_clears_operator_without_operands() {
    let cache = operator_cache();
    let search = search_criteria(&cache);
    search.from_json(&json!({"AgeOperator": "EQ", "Name": "Ann"})).unwrap();
    let op = search.data_property("AgeOperator").unwrap();
    assert!(op.is_null());
    assert_eq!(op.modified(), Modified::Clean);
    assert_eq!(search.modified(), Modified::Clean);
}

// ═════════════════════════════════════════════════════════════════════
// 4. Operations through handlers
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_save_is_rejected_until_valid() {
    let handler = Rc::new(MemoryHandler::default());
    let customer = DataObject::builder("Customer")
        .property("Name", PropertyDef::text().required(true))
        .property("Age", PropertyDef::positive_integer())
        .handler(handler.clone())
        .build();
    assert!(customer.is_new());

    let err = customer.save_async().await.unwrap_err();
    assert!(matches!(&err, FormkitError::Validation(errors) if errors.errors_text() == "Name is required."));
    assert!(handler.saved.borrow().is_empty());

    customer.data_property("Name").unwrap().set_internal_value(Value::from("Ann"));
    customer.data_property("Age").unwrap().set_internal_value(Value::Int(30));
    customer.data_property("Age").unwrap().set_internal_value(Value::Int(31));
    assert_eq!(customer.modified(), Modified::Dirty);

    customer.save_async().await.unwrap();
    assert_eq!(*handler.saved.borrow(), vec![json!({"Name": "Ann", "Age": 31})]);
    assert!(!customer.is_new());
    assert_eq!(customer.modified(), Modified::Clean);
}

#[tokio::test]
async fn test_read_imports_handler_payload() {
    let handler = MemoryHandler::serving(json!({"Name": "Ann", "Age": "42", "Unknown": true}));
    let customer = DataObject::builder("Customer")
        .property("Name", PropertyDef::text())
        .property("Age", PropertyDef::positive_integer())
        .handler(handler.clone())
        .build();

    customer.read_async().await.unwrap();
    assert_eq!(handler.reads.get(), 1);
    assert_eq!(customer.data_property("Age").unwrap().internal_value(), Value::Int(42));
    assert_eq!(customer.modified(), Modified::Clean);
    assert!(!customer.is_new());
}

#[tokio::test]
async fn test_search_applies_criteria_and_preserves_selection() {
    let cache = operator_cache();
    let handler = MemoryHandler::serving(json!([
        {"Id": 1, "Name": "Cy"},
        {"Id": 2, "Name": "Ann"},
        {"Id": 3, "Name": "Bob"},
    ]));
    let people = DataObject::builder("People")
        .property("Id", PropertyDef::integer().key(true))
        .property("Name", PropertyDef::text())
        .criteria_object(search_criteria(&cache))
        .sort_criteria(vec![ListSortField::new("Name")])
        .selection_mode(SelectionMode::Multiple)
        .handler(handler.clone())
        .build();
    let criteria = people.criteria_object().unwrap();
    assert_eq!(people.applied_criteria(), None);

    // Between needs both operands.
    criteria.data_property("AgeOperator").unwrap().set_internal_value(Value::from("BW"));
    criteria.data_property("Age").unwrap().set_internal_value(Value::Int(20));
    let err = people.search_async(false).await.unwrap_err();
    assert!(matches!(err, FormkitError::Validation(_)));
    assert_eq!(handler.reads.get(), 0);

    criteria.data_property("Age2").unwrap().set_internal_value(Value::Int(30));
    people.search_async(false).await.unwrap();
    assert_eq!(handler.reads.get(), 1);
    assert_eq!(people.applied_criteria_text(), "Age: Between 20 and 30");
    let ids_of = |rows: Vec<Rc<formkit_model::DataRow>>| -> Vec<Value> { rows.iter().map(|r| r.value("Id")).collect() };
    assert_eq!(ids_of(people.rows()), [Value::Int(2), Value::Int(3), Value::Int(1)]);
    assert_eq!(people.modified(), Modified::Clean);

    let bob = Rc::clone(&people.rows()[1]);
    bob.toggle_selection();
    people.rows()[0].toggle_selection();
    assert_eq!(ids_of(people.selected_rows()), [Value::Int(2), Value::Int(3)]);

    *handler.payload.borrow_mut() = Some(json!([{"Id": 3, "Name": "Bob"}, {"Id": 4, "Name": "Dee"}]));
    people.search_async(true).await.unwrap();
    assert_eq!(ids_of(people.selected_rows()), [Value::Int(3)]);

    people.search_async(false).await.unwrap();
    assert!(people.selected_rows().is_empty());
}

// ═════════════════════════════════════════════════════════════════════
// 5. URLs
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_url_round_trip_through_query() {
    let filter = || {
        DataObject::builder("Filter")
            .property("Name", PropertyDef::text())
            .property("Tags", PropertyDef::text().multi_valued(true))
            .property("Age", PropertyDef::integer())
            .build()
    };
    let source = filter();
    source.data_property("Name").unwrap().set_internal_value(Value::from("Ann Lee"));
    source.data_property("Tags").unwrap().set_value(Value::from("a, b"), ValueFormat::EditString);
    source.data_property("Age").unwrap().set_internal_value(Value::Int(42));

    let query = source.to_url_params();
    assert_eq!(query, "Name=Ann%20Lee&Tags=a&Tags=b&Age=42");
    assert_eq!(
        source.format_url("people/{Name}/{Age}?x={Missing}"),
        "people/Ann%20Lee/42?x={Missing}"
    );

    let target = filter();
    target.from_query(&query).unwrap();
    assert_eq!(target.to_json(), source.to_json());
    assert_eq!(
        target.data_property("Tags").unwrap().transport_value(),
        Value::List(vec![Value::from("a"), Value::from("b")])
    );
}
