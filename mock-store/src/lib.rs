//! In-memory record-store backend for integration tests.
//!
//! Speaks the envelope protocol the core expects: every application-level
//! outcome is an HTTP 200 whose body carries a `success` flag, with
//! per-record results (and optional field errors) on write operations.
//! Collections are created on first use; records are JSON objects keyed by
//! an auto-assigned integer `Id`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// One named collection: monotonically assigned ids over JSON object rows.
#[derive(Debug, Default)]
pub struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Map<String, Value>>,
}

pub type Db = Arc<RwLock<HashMap<String, Table>>>;

#[derive(Deserialize)]
struct QueryBody {
    #[serde(default)]
    fields: Vec<String>,
}

#[derive(Deserialize)]
struct FieldsQuery {
    fields: Option<String>,
}

#[derive(Deserialize)]
struct RecordsBody {
    #[serde(default)]
    records: Vec<Value>,
}

#[derive(Deserialize)]
struct IdsBody {
    #[serde(default)]
    ids: Vec<i64>,
}

#[derive(Deserialize)]
struct AggregateBody {
    #[serde(default)]
    aggregators: Vec<AggregatorSpec>,
}

#[derive(Deserialize)]
struct AggregatorSpec {
    id: String,
    function: String,
    #[serde(rename = "where", default)]
    filter: Option<WhereSpec>,
}

#[derive(Deserialize)]
struct WhereSpec {
    field: String,
    equals: Vec<Value>,
}

pub fn app() -> Router {
    app_with_db(Db::default())
}

pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/{collection}/query", post(query_collection))
        .route("/{collection}/aggregate", post(aggregate_collection))
        .route("/{collection}/delete", post(delete_records))
        .route("/{collection}/{id}", get(get_record))
        .route("/{collection}", post(create_records).put(update_records))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn query_collection(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Json(body): Json<QueryBody>,
) -> Json<Value> {
    let db = db.read().await;
    let data: Vec<Value> = db
        .get(&collection)
        .map(|table| {
            table
                .rows
                .values()
                .map(|row| project(row, &body.fields))
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "success": true, "data": data }))
}

async fn get_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, i64)>,
    Query(params): Query<FieldsQuery>,
) -> Json<Value> {
    let db = db.read().await;
    let row = db.get(&collection).and_then(|table| table.rows.get(&id));
    match row {
        Some(row) => {
            let fields: Vec<String> = params
                .fields
                .map(|raw| raw.split(',').map(str::to_string).collect())
                .unwrap_or_default();
            Json(json!({ "success": true, "data": project(row, &fields) }))
        }
        None => Json(json!({ "success": false, "message": "Record does not exist" })),
    }
}

async fn create_records(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Json(body): Json<RecordsBody>,
) -> Json<Value> {
    let mut db = db.write().await;
    let table = db.entry(collection).or_default();

    let results: Vec<Value> = body
        .records
        .into_iter()
        .map(|record| match record {
            Value::Object(mut row) => {
                table.next_id += 1;
                let id = table.next_id;
                row.insert("Id".to_string(), json!(id));
                table.rows.insert(id, row.clone());
                json!({ "success": true, "data": Value::Object(row) })
            }
            _ => json!({ "success": false, "message": "record must be a JSON object" }),
        })
        .collect();

    Json(json!({ "success": true, "results": results }))
}

async fn update_records(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Json(body): Json<RecordsBody>,
) -> Json<Value> {
    let mut db = db.write().await;
    let table = db.entry(collection).or_default();

    let results: Vec<Value> = body
        .records
        .into_iter()
        .map(|record| {
            let Value::Object(mut patch) = record else {
                return json!({ "success": false, "message": "record must be a JSON object" });
            };
            let Some(id) = patch.remove("Id").and_then(|v| v.as_i64()) else {
                return json!({ "success": false, "message": "record is missing a numeric Id" });
            };
            let Some(row) = table.rows.get_mut(&id) else {
                return json!({ "success": false, "message": "Record does not exist" });
            };
            // Patch semantics: present keys overwrite, explicit null clears.
            for (key, value) in patch {
                row.insert(key, value);
            }
            json!({ "success": true, "data": Value::Object(row.clone()) })
        })
        .collect();

    Json(json!({ "success": true, "results": results }))
}

async fn delete_records(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Json(body): Json<IdsBody>,
) -> Json<Value> {
    let mut db = db.write().await;
    let table = db.entry(collection).or_default();

    let results: Vec<Value> = body
        .ids
        .into_iter()
        .map(|id| match table.rows.remove(&id) {
            Some(_) => json!({ "success": true }),
            None => json!({ "success": false, "message": "Record does not exist" }),
        })
        .collect();

    Json(json!({ "success": true, "results": results }))
}

async fn aggregate_collection(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Json(body): Json<AggregateBody>,
) -> Json<Value> {
    let db = db.read().await;
    let empty = Table::default();
    let table = db.get(&collection).unwrap_or(&empty);

    let mut aggregators = Vec::new();
    for spec in body.aggregators {
        if spec.function != "Count" {
            return Json(json!({
                "success": false,
                "message": format!("unsupported aggregate function: {}", spec.function),
            }));
        }
        let value = table
            .rows
            .values()
            .filter(|row| matches_filter(row, spec.filter.as_ref()))
            .count();
        aggregators.push(json!({ "id": spec.id, "value": value }));
    }

    Json(json!({ "success": true, "aggregators": aggregators }))
}

fn matches_filter(row: &Map<String, Value>, filter: Option<&WhereSpec>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let Some(actual) = row.get(&filter.field) else {
        return false;
    };
    filter.equals.iter().any(|target| loose_eq(actual, target))
}

/// Compare a stored value against a filter target, treating the number 7
/// and the string "7" as equal — the dataset carries both spellings.
fn loose_eq(a: &Value, b: &Value) -> bool {
    a == b || comparable(a) == comparable(b)
}

fn comparable(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Keep `Id` plus the requested fields; an empty spec returns the full row.
fn project(row: &Map<String, Value>, fields: &[String]) -> Value {
    if fields.is_empty() {
        return Value::Object(row.clone());
    }
    let mut out = Map::new();
    if let Some(id) = row.get("Id") {
        out.insert("Id".to_string(), id.clone());
    }
    for field in fields {
        if let Some(value) = row.get(field) {
            out.insert(field.clone(), value.clone());
        }
    }
    Value::Object(out)
}
