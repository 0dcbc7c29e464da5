mod common;

use std::sync::Arc;

use common::{Order, User};
use serde_json::{json, Value};
use strata_core::StrataConfig;
use strata_data::{
    EntityService, MetadataHandle, MetadataRegistry, Service, ServiceOptions, ServiceRegistry,
};
use strata_test::{record, MemoryRepository};

type UserService = Service<User, MemoryRepository<User>>;

/// Custom service wrapping the generic one.
struct AuditedOrders {
    inner: Service<Order, MemoryRepository<Order>>,
    built_by_factory: bool,
}

impl EntityService for AuditedOrders {
    type Entity = Order;
    type Repository = MemoryRepository<Order>;

    fn from_repository(
        repository: Arc<MemoryRepository<Order>>,
        metadata: MetadataHandle,
        options: ServiceOptions,
    ) -> Self {
        Self {
            inner: Service::with_options(repository, metadata, options),
            built_by_factory: false,
        }
    }

    fn repository(&self) -> &Arc<MemoryRepository<Order>> {
        self.inner.repository()
    }
}

// ── Caching ─────────────────────────────────────────────────────────────

#[test]
fn same_repository_returns_cached_service() {
    let registry = ServiceRegistry::new();
    let repo = Arc::new(MemoryRepository::<User>::new());
    let first = registry.get_service::<User, _>(&repo);
    let second = registry.get_service::<User, _>(&repo);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
}

#[test]
fn services_are_keyed_by_table_path() {
    let registry = ServiceRegistry::new();
    let main = Arc::new(MemoryRepository::<User>::new());
    let archive = Arc::new(MemoryRepository::<User>::new().with_table_path("archive.users"));
    let a = registry.get_service::<User, _>(&main);
    let b = registry.get_service::<User, _>(&archive);
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 2);
}

#[test]
fn new_repository_for_same_key_rebuilds() {
    let registry = ServiceRegistry::new();
    let old = Arc::new(MemoryRepository::<User>::new());
    let replacement = Arc::new(MemoryRepository::<User>::new());

    let first = registry.get_service::<User, _>(&old);
    let second = registry.get_service::<User, _>(&replacement);
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(second.repository(), &replacement));
    assert_eq!(registry.len(), 1);

    let again = registry.get_service::<User, _>(&replacement);
    assert!(Arc::ptr_eq(&second, &again));
}

#[test]
fn metadata_is_registered_once_and_shared() {
    let metadata = Arc::new(MetadataRegistry::new());
    let registry = ServiceRegistry::builder().metadata(metadata.clone()).build();
    let service = registry.get_service::<User, _>(&Arc::new(MemoryRepository::<User>::new()));

    let handle = metadata.resolve::<User>().unwrap();
    assert_eq!(handle.name(), "User");
    assert_eq!(*service.metadata(), handle);
    assert_eq!(metadata.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_build_one_service() {
    let registry = Arc::new(ServiceRegistry::new());
    let repo = Arc::new(MemoryRepository::<User>::new());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = registry.clone();
            let repo = repo.clone();
            tokio::spawn(async move { registry.get_service::<User, _>(&repo) })
        })
        .collect();

    let mut services: Vec<Arc<UserService>> = Vec::new();
    for handle in handles {
        services.push(handle.await.unwrap());
    }
    assert!(services.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(registry.len(), 1);
}

// ── Factories ───────────────────────────────────────────────────────────

#[test]
fn default_construction_without_factory() {
    let registry = ServiceRegistry::new();
    let service = registry.get::<AuditedOrders>(&Arc::new(MemoryRepository::<Order>::new()));
    assert!(!service.built_by_factory);
}

#[test]
fn factory_overrides_construction() {
    let registry = ServiceRegistry::builder()
        .factory::<AuditedOrders, _>(|repository, metadata, options| AuditedOrders {
            inner: Service::with_options(repository, metadata, options),
            built_by_factory: true,
        })
        .build();
    let repo = Arc::new(MemoryRepository::<Order>::new());
    let service = registry.get::<AuditedOrders>(&repo);
    assert!(service.built_by_factory);
    assert!(Arc::ptr_eq(service.repository(), &repo));
}

#[test]
fn switching_service_type_for_same_key_rebuilds() {
    let registry = ServiceRegistry::new();
    let repo = Arc::new(MemoryRepository::<Order>::new());
    let custom = registry.get::<AuditedOrders>(&repo);
    let generic = registry.get_service::<Order, _>(&repo);
    assert!(Arc::ptr_eq(custom.repository(), generic.repository()));
    assert_eq!(registry.len(), 1);
}

// ── Configuration ───────────────────────────────────────────────────────

#[test]
fn default_case_depth() {
    assert_eq!(ServiceRegistry::new().options().case_depth, 10);
}

#[tokio::test]
async fn case_depth_from_config_reaches_services() {
    let config = StrataConfig::from_yaml_str("strata:\n  service:\n    case_depth: 1\n", "test").unwrap();
    let registry = ServiceRegistry::from_config(&config);
    assert_eq!(registry.options().case_depth, 1);

    let repo = Arc::new(MemoryRepository::<User>::new().with_query_rows(vec![json!({
        "user_id": "u1",
        "profile": { "display_name": "Ann" }
    })]));
    let service = registry.get_service::<User, _>(&repo);
    let rows: Vec<Value> = service.query("SELECT 1", vec![]).await.unwrap();
    assert_eq!(rows, vec![json!({ "userId": "u1", "profile": { "display_name": "Ann" } })]);
}

#[tokio::test]
async fn registry_services_run_operations() {
    let registry = ServiceRegistry::new();
    let repo = Arc::new(MemoryRepository::<User>::new());
    let service = registry.get_service::<User, _>(&repo);
    let user = service
        .create(record(json!({ "name": "Ada" })), Some("root"))
        .await
        .unwrap();
    assert_eq!(user.created_by_id.as_deref(), Some("root"));
    assert_eq!(repo.rows().len(), 1);
}
