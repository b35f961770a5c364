//! End-to-end model flows over an in-memory storage backend
//!
//! These tests drive the public API only: a context assembled with
//! `ModelContext::builder`, wrapped by `ModelHaus::from_context`.

use async_trait::async_trait;
use modelhaus::prelude::*;
use modelhaus::model_object::errors::Result as ModelResult;
use modelhaus::model_object::query_builder::{Parameters, Query};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const ORDER_SCHEMA: &str = r#"{
    "primary": ["order_id"],
    "required": ["order_ref"],
    "flag": {"paid": 1, "shipped": 2},
    "fields": {
        "order_id": {"type": "number_natural"},
        "order_ref": {"type": "text", "max": 32, "unique": true},
        "order_status": {"type": "text"},
        "order_total": {"type": "number_natural"},
        "order_flag": {"type": "number_natural"},
        "order_created": {"type": "text_timestamp"},
        "order_modified": {"type": "text_timestamp"}
    }
}"#;

/// Table of rows keyed by primary key. Reads honour an equality filter on
/// the primary key and return every row otherwise.
#[derive(Debug, Default)]
struct MemoryTable {
    rows: Mutex<BTreeMap<i64, Row>>,
    statements: Mutex<Vec<String>>,
}

impl MemoryTable {
    fn with_rows(rows: Vec<Value>) -> Self {
        let table = Self::default();
        {
            let mut stored = table.rows.lock().unwrap();
            for value in rows {
                if let Value::Object(row) = value {
                    let id = row.get("order_id").and_then(Value::as_i64).unwrap();
                    stored.insert(id, row);
                }
            }
        }
        table
    }

    fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageBackend for MemoryTable {
    async fn read(&self, text: &str, parameters: &Parameters) -> ModelResult<Vec<Row>> {
        self.statements.lock().unwrap().push(text.to_string());
        let key = parameters
            .iter()
            .find(|(name, _)| name.ends_with("_FILTER_order_id"))
            .and_then(|(_, value)| value.as_i64());

        let rows = self.rows.lock().unwrap();
        Ok(match key {
            Some(id) => rows.get(&id).cloned().into_iter().collect(),
            None => rows.values().cloned().collect(),
        })
    }

    async fn write(&self, query: &Query) -> ModelResult<u64> {
        self.statements.lock().unwrap().push(query.text.clone());
        Ok(1)
    }
}

fn build(table: &Arc<MemoryTable>, signals: Option<Arc<SignalManager>>) -> ModelHaus {
    let schemas = StaticSchemaSource::new()
        .with_json("order", ORDER_SCHEMA)
        .unwrap();
    let mut builder = ModelContext::builder(Arc::new(schemas))
        .backend("default", Arc::clone(table) as Arc<dyn StorageBackend>)
        .cache(Arc::new(MemoryCache::new()));
    if let Some(signals) = signals {
        builder = builder.signals(signals);
    }
    ModelHaus::from_context(builder.build())
}

fn seeded() -> Arc<MemoryTable> {
    Arc::new(MemoryTable::with_rows(vec![
        json!({"order_id": 1, "order_ref": "A-1", "order_status": "open", "order_total": 120, "order_flag": 1}),
        json!({"order_id": 2, "order_ref": "A-2", "order_status": "closed", "order_total": 80, "order_flag": 3}),
    ]))
}

// ========================================
// Reads
// ========================================

#[tokio::test]
async fn test_search_compiles_filters_and_returns_rows() {
    let table = seeded();
    let haus = build(&table, None);
    let mut order = haus.model("order").await.unwrap();

    order
        .add_filter("order_status", json!(["open", "closed"]))
        .add_order("order_total", SortOrder::Desc)
        .set_limit(5);
    let rows = order.search().await;

    assert_eq!(rows.len(), 2);
    let statement = &table.statements()[0];
    assert!(statement.contains(r#"IN ('open', 'closed')"#));
    assert!(statement.contains(r#"ORDER BY "order"."order_total" DESC"#));
    assert!(statement.ends_with("LIMIT 5"));
    assert!(order.query_state().is_empty());
}

#[tokio::test]
async fn test_load_uses_point_cache_after_first_lookup() {
    let table = seeded();
    let haus = build(&table, None);
    let mut order = haus.model("order").await.unwrap();

    let first = order.load_by_unique("order_id", 2).await;
    assert_eq!(first.get("order_ref"), Some(&json!("A-2")));

    let second = order.load_by_unique("order_id", 2).await;
    assert_eq!(second, first);
    assert_eq!(table.statements().len(), 1);

    let cached = haus
        .context()
        .cache()
        .get("MODELDATA_DEFAULT_ORDER", "PRIMARY_2")
        .await
        .unwrap();
    assert!(cached.is_some());
}

#[tokio::test]
async fn test_load_missing_row_is_empty() {
    let table = seeded();
    let haus = build(&table, None);
    let mut order = haus.model("order").await.unwrap();

    assert!(order.load(99).await.is_empty());
    assert!(order.load(Value::Null).await.is_empty());
}

#[tokio::test]
async fn test_flags_are_read_from_rows() {
    let table = seeded();
    let haus = build(&table, None);
    let mut order = haus.model("order").await.unwrap();

    let row = order.load(2).await;
    assert!(order.is_flag(1, &row));
    assert!(order.is_flag(2, &row));

    let row = order.load(1).await;
    assert!(!order.is_flag(2, &row));
}

// ========================================
// Writes and entries
// ========================================

#[tokio::test]
async fn test_entry_changes_are_saved_once() {
    let table = seeded();
    let signals = Arc::new(SignalManager::new());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    signals.add_callback(move |event| sink.lock().unwrap().push(event.event_type));

    let haus = build(&table, Some(Arc::clone(&signals)));
    let mut order = haus.model("order").await.unwrap();

    let shared = order.load_entry(1).await.unwrap().unwrap();
    {
        let mut entry = shared.lock().await;
        entry.set_field("order_status", "shipped").unwrap();
        assert!(entry.has_changes());
        assert!(entry.save(&mut order).await.unwrap());
        assert!(!entry.save(&mut order).await.unwrap());
    }

    let updates: Vec<String> = table
        .statements()
        .into_iter()
        .filter(|s| s.starts_with("UPDATE"))
        .collect();
    assert_eq!(updates.len(), 1);
    assert!(updates[0].contains(r#""order_status" = :SETFIELD_order_status"#));

    let events = events.lock().unwrap();
    assert!(events.contains(&EventType::FieldSetSuccess));
    assert!(events.contains(&EventType::Update));
}

#[tokio::test]
async fn test_registered_entry_is_shared() {
    let table = seeded();
    let haus = build(&table, None);
    let mut order = haus.model("order").await.unwrap();

    let first = order.load_entry(2).await.unwrap().unwrap();
    let second = order.load_entry(2).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(haus.context().registry().entry_count(), 1);
}

#[tokio::test]
async fn test_save_rejects_invalid_data() {
    let table = seeded();
    let haus = build(&table, None);
    let mut order = haus.model("order").await.unwrap();

    let result = order
        .save(row(json!({"order_status": "open", "order_total": "lots"})))
        .await;
    match result {
        Err(ModelhausError::InvalidData(fields)) => {
            let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
            assert!(names.contains(&"order_ref"));
            assert!(names.contains(&"order_total"));
        }
        other => panic!("expected invalid data, got {:?}", other),
    }
    assert!(table.statements().is_empty());
}

#[tokio::test]
async fn test_stack_saves_every_entry() {
    let table = seeded();
    let haus = build(&table, None);
    let mut order = haus.model("order").await.unwrap();

    let mut stack = EntryStack::new();
    order.add_filter("order_status", json!(["open", "closed"]));
    let added = stack.add_entries(order.entries().await);
    assert_eq!(added, 2);

    stack.set("order_status", "archived").unwrap();
    assert!(stack.is_locked());

    let failures = stack.save(&mut order).await;
    assert!(failures.is_empty());
    assert_eq!(stack.get("order_status"), vec![json!("archived"), json!("archived")]);

    let updates = table
        .statements()
        .iter()
        .filter(|s| s.starts_with("UPDATE"))
        .count();
    assert_eq!(updates, 2);
}

#[tokio::test]
async fn test_delete_by_key_clears_point_cache() {
    let table = seeded();
    let haus = build(&table, None);
    let mut order = haus.model("order").await.unwrap();

    order.load_by_unique("order_id", 1).await;
    assert_eq!(order.delete(Some(json!(1))).await, 1);

    let cached = haus
        .context()
        .cache()
        .get("MODELDATA_DEFAULT_ORDER", "PRIMARY_1")
        .await
        .unwrap();
    assert!(cached.is_none());
    assert!(table.statements().last().unwrap().starts_with("DELETE FROM"));
}

#[tokio::test]
async fn test_unknown_model_is_a_configuration_error() {
    let table = seeded();
    let haus = build(&table, None);

    let result = haus.model("invoice").await;
    assert!(matches!(
        result,
        Err(ModelHausError::Model(ModelhausError::Configuration { .. }))
    ));
}

#[tokio::test]
async fn test_health_check_visits_connections() {
    let table = seeded();
    let haus = build(&table, None);

    assert!(haus.pool().is_none());
    haus.health_check().await.unwrap();
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}
