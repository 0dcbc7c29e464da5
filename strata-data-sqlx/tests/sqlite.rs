use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use strata_core::DataSourceConfig;
use strata_data::{
    Criteria, Entity, FindParams, MetadataHandle, Pageable, Record, Repository, Service, Where,
};
use strata_data_sqlx::SqliteRepository;
use strata_macros::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity)]
#[serde(rename_all = "camelCase")]
#[entity(table = "orders", scope(deletedAt_eq = null))]
struct Order {
    #[entity(id)]
    id: Option<String>,
    status: String,
    total: i64,
    #[serde(default)]
    paid: bool,
    #[entity(created_by)]
    created_by_id: Option<String>,
    #[entity(updated_by)]
    updated_by_id: Option<String>,
    #[entity(soft_delete)]
    deleted_at: Option<String>,
    #[entity(version)]
    version: Option<i64>,
}

type OrderService = Service<Order, SqliteRepository<Order>>;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE orders (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            total INTEGER NOT NULL,
            paid BOOLEAN NOT NULL DEFAULT 0,
            created_by_id TEXT,
            updated_by_id TEXT,
            deleted_at TEXT,
            version INTEGER
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool
}

async fn service() -> OrderService {
    let repo = Arc::new(SqliteRepository::<Order>::new(pool().await, "main"));
    Service::new(repo, MetadataHandle::new(Order::metadata()))
}

async fn seed(service: &OrderService) {
    for (status, total) in [("open", 5), ("closed", 10), ("OPEN", 20)] {
        service
            .create(record(json!({ "status": status, "total": total })), Some("alice"))
            .await
            .unwrap();
    }
}

// ── Metadata ────────────────────────────────────────────────────────────

#[test]
fn derive_reads_serde_names() {
    let meta = Order::metadata();
    assert_eq!(meta.name(), "Order");
    assert_eq!(meta.table(), "orders");
    assert_eq!(meta.created_by(), Some("createdById"));
    assert_eq!(meta.updated_by(), Some("updatedById"));
    assert_eq!(meta.version_column(), Some("version"));
    assert_eq!(meta.soft_delete().len(), 1);
    assert_eq!(meta.soft_delete()[0].0, "deletedAt");
    assert_eq!(meta.scopes().get("deletedAt_eq"), Some(&Value::Null));
}

#[tokio::test]
async fn table_path_includes_connection_name() {
    let repo = SqliteRepository::<Order>::new(pool().await, "main");
    assert_eq!(repo.table_path(), "main.orders");
}

#[tokio::test]
async fn connect_uses_datasource_name() {
    let mut config = DataSourceConfig::new("sqlite::memory:");
    config.name = "reporting".into();
    config.max_connections = Some(1);
    let repo = SqliteRepository::<Order>::connect(&config).await.unwrap();
    assert_eq!(repo.table_path(), "reporting.orders");
}

// ── Writes ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_generates_id_and_stamps_creator() {
    let service = service().await;
    let order = service
        .create(record(json!({ "status": "open", "total": 7 })), Some("alice"))
        .await
        .unwrap();
    assert!(order.id.is_some());
    assert_eq!(order.created_by_id.as_deref(), Some("alice"));
    assert_eq!(order.version, Some(1));
    assert!(!order.paid);
}

#[tokio::test]
async fn update_one_stamps_updater_and_bumps_version() {
    let service = service().await;
    seed(&service).await;
    let updated = service
        .update_one(
            record(json!({ "paid": true })),
            Where::eq("total", 10),
            Some("bob"),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(updated.paid);
    assert_eq!(updated.updated_by_id.as_deref(), Some("bob"));
    assert_eq!(updated.created_by_id.as_deref(), Some("alice"));
    assert_eq!(updated.version, Some(2));
}

#[tokio::test]
async fn update_one_without_match_is_none() {
    let service = service().await;
    seed(&service).await;
    let missing = service
        .update_one(record(json!({ "paid": true })), Where::eq("total", 99), Some("bob"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn update_one_clears_nulled_columns() {
    let service = service().await;
    seed(&service).await;
    let updated = service
        .update_one(
            record(json!({ "createdById": null })),
            Where::eq("total", 10),
            Some("bob"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.created_by_id, None);
    assert_eq!(updated.version, Some(2));

    let stored: Vec<Value> = service
        .query("SELECT created_by_id FROM orders WHERE total = ?", vec![json!(10)])
        .await
        .unwrap();
    assert_eq!(stored, vec![json!({ "createdById": null })]);
}

#[tokio::test]
async fn bulk_update_reports_affected_rows() {
    let service = service().await;
    seed(&service).await;
    let filter = Where::try_from(json!({ "total_lte": 10 })).unwrap();
    let result = service
        .update(record(json!({ "paid": true })), Criteria::Where(filter), Some("bob"))
        .await
        .unwrap();
    assert_eq!(result.affected, 2);
    let paid = service
        .count(Where::eq("paid", true))
        .await
        .unwrap();
    assert_eq!(paid, 2);
}

#[tokio::test]
async fn delete_by_id_hides_row_from_scoped_reads() {
    let service = service().await;
    let order = service
        .create(record(json!({ "status": "open", "total": 3 })), None)
        .await
        .unwrap();
    let id = order.id.clone().unwrap();

    let result = service.delete_by_id(id.clone(), Some("carol")).await.unwrap();
    assert_eq!(result.affected, 1);

    assert!(service
        .find_by_id(id.clone(), FindParams::new())
        .await
        .unwrap()
        .is_none());
    let deleted = service
        .find_by_id(id, FindParams::new().unscoped())
        .await
        .unwrap()
        .unwrap();
    assert!(deleted.deleted_at.is_some());
    assert_eq!(deleted.updated_by_id.as_deref(), Some("carol"));
}

// ── Reads ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn suffix_filters_compile_to_sql() {
    let service = service().await;
    seed(&service).await;
    let filter = Where::try_from(json!({ "total_gte": 10, "status_contains": "PE" })).unwrap();
    let rows = service.find(FindParams::from(filter)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total, 20);
}

#[tokio::test]
async fn any_filter_matches_either_group() {
    let service = service().await;
    seed(&service).await;
    let filter = Where::try_from(json!([{ "total": 5 }, { "status_startsWith": "clo" }])).unwrap();
    let rows = service
        .find(FindParams::from(filter).order_by("total_ASC"))
        .await
        .unwrap();
    let totals: Vec<i64> = rows.iter().map(|o| o.total).collect();
    assert_eq!(totals, vec![5, 10]);
}

#[tokio::test]
async fn find_page_sorts_and_counts() {
    let service = service().await;
    seed(&service).await;
    let page = service
        .find_page(FindParams::new(), &Pageable::new(0, 2).sorted("total_DESC"))
        .await
        .unwrap();
    let totals: Vec<i64> = page.content.iter().map(|o| o.total).collect();
    assert_eq!(totals, vec![20, 10]);
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);
}

#[tokio::test]
async fn raw_query_rows_come_back_camel_case() {
    let service = service().await;
    seed(&service).await;
    let rows: Vec<Value> = service
        .query(
            "SELECT created_by_id, total FROM orders WHERE total > ? ORDER BY total",
            vec![json!(5)],
        )
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            json!({ "createdById": "alice", "total": 10 }),
            json!({ "createdById": "alice", "total": 20 }),
        ]
    );
}
