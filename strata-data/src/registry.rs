use crate::case::DEFAULT_CASE_DEPTH;
use crate::entity::Entity;
use crate::metadata::{MetadataHandle, MetadataRegistry};
use crate::repository::Repository;
use crate::service::{Service, ServiceOptions};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::config::StrataConfig;

/// A service that can be built from, and cached for, one repository.
///
/// [`Service`] implements it. Custom services usually wrap a `Service` and
/// delegate.
///
/// ```ignore
/// struct OrderService { inner: Service<Order, OrderRepo> }
///
/// impl EntityService for OrderService {
///     type Entity = Order;
///     type Repository = OrderRepo;
///
///     fn from_repository(repo: Arc<OrderRepo>, meta: MetadataHandle, opts: ServiceOptions) -> Self {
///         Self { inner: Service::with_options(repo, meta, opts) }
///     }
///
///     fn repository(&self) -> &Arc<OrderRepo> {
///         self.inner.repository()
///     }
/// }
/// ```
pub trait EntityService: Send + Sync + 'static {
    type Entity: Entity;
    type Repository: Repository<Self::Entity>;

    fn from_repository(
        repository: Arc<Self::Repository>,
        metadata: MetadataHandle,
        options: ServiceOptions,
    ) -> Self;

    fn repository(&self) -> &Arc<Self::Repository>;
}

impl<E: Entity, R: Repository<E>> EntityService for Service<E, R> {
    type Entity = E;
    type Repository = R;

    fn from_repository(repository: Arc<R>, metadata: MetadataHandle, options: ServiceOptions) -> Self {
        Service::with_options(repository, metadata, options)
    }

    fn repository(&self) -> &Arc<R> {
        Service::repository(self)
    }
}

type Factory<S> = Arc<
    dyn Fn(Arc<<S as EntityService>::Repository>, MetadataHandle, ServiceOptions) -> S + Send + Sync,
>;

struct Cached {
    service: Arc<dyn Any + Send + Sync>,
    repository: Arc<dyn Any + Send + Sync>,
    service_type: TypeId,
}

impl Cached {
    fn get<S: EntityService>(&self, repository: &Arc<S::Repository>) -> Option<Arc<S>> {
        if self.service_type != TypeId::of::<S>() {
            return None;
        }
        let cached_repo = self.repository.clone().downcast::<S::Repository>().ok()?;
        if !Arc::ptr_eq(&cached_repo, repository) {
            return None;
        }
        self.service.clone().downcast::<S>().ok()
    }
}

/// One long-lived service per repository table path.
///
/// Lookups are atomic per key: concurrent first requests for the same table
/// construct exactly one service. Factories run while the key is locked and
/// must not call back into the registry.
pub struct ServiceRegistry {
    services: DashMap<String, Cached>,
    factories: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    metadata: Arc<MetadataRegistry>,
    options: ServiceOptions,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ServiceRegistryBuilder {
        ServiceRegistryBuilder {
            metadata: None,
            options: ServiceOptions::default(),
            factories: HashMap::new(),
        }
    }

    /// Registry configured from `strata.service.*` keys.
    pub fn from_config(config: &StrataConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn metadata(&self) -> &Arc<MetadataRegistry> {
        &self.metadata
    }

    pub fn options(&self) -> ServiceOptions {
        self.options
    }

    /// The generic service for entity `E` backed by `repository`.
    pub fn get_service<E: Entity, R: Repository<E>>(&self, repository: &Arc<R>) -> Arc<Service<E, R>> {
        self.get::<Service<E, R>>(repository)
    }

    /// The service of type `S` backed by `repository`.
    ///
    /// A cached service is returned when it was built for this exact
    /// repository instance and service type. Otherwise a new one is built
    /// and replaces the cached entry.
    pub fn get<S: EntityService>(&self, repository: &Arc<S::Repository>) -> Arc<S> {
        let key = repository.table_path();
        match self.services.entry(key) {
            Entry::Occupied(mut slot) => {
                if let Some(service) = slot.get().get::<S>(repository) {
                    return service;
                }
                tracing::warn!(
                    key = slot.key().as_str(),
                    service = type_name::<S>(),
                    "Service key rebound to a different repository or service type, rebuilding"
                );
                let (cached, service) = self.build::<S>(repository);
                slot.insert(cached);
                service
            }
            Entry::Vacant(slot) => {
                let (cached, service) = self.build::<S>(repository);
                tracing::debug!(key = slot.key().as_str(), service = type_name::<S>(), "Service created");
                slot.insert(cached);
                service
            }
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    fn build<S: EntityService>(&self, repository: &Arc<S::Repository>) -> (Cached, Arc<S>) {
        let metadata = self.metadata.resolve_or_register::<S::Entity>();
        let service = match self
            .factories
            .get(&TypeId::of::<S>())
            .and_then(|f| f.downcast_ref::<Factory<S>>())
        {
            Some(factory) => factory(repository.clone(), metadata, self.options),
            None => S::from_repository(repository.clone(), metadata, self.options),
        };
        let service = Arc::new(service);
        let cached = Cached {
            service: service.clone(),
            repository: repository.clone(),
            service_type: TypeId::of::<S>(),
        };
        (cached, service)
    }
}

pub struct ServiceRegistryBuilder {
    metadata: Option<Arc<MetadataRegistry>>,
    options: ServiceOptions,
    factories: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ServiceRegistryBuilder {
    /// Share an existing metadata registry instead of creating one.
    pub fn metadata(mut self, metadata: Arc<MetadataRegistry>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn case_depth(mut self, depth: usize) -> Self {
        self.options.case_depth = depth;
        self
    }

    /// Apply `strata.service.*` keys.
    pub fn config(self, config: &StrataConfig) -> Self {
        let depth = config.get_or("strata.service.case_depth", DEFAULT_CASE_DEPTH);
        self.case_depth(depth)
    }

    /// Override how services of type `S` are constructed.
    pub fn factory<S, F>(mut self, factory: F) -> Self
    where
        S: EntityService,
        F: Fn(Arc<S::Repository>, MetadataHandle, ServiceOptions) -> S + Send + Sync + 'static,
    {
        let factory: Factory<S> = Arc::new(factory);
        self.factories.insert(TypeId::of::<S>(), Box::new(factory));
        self
    }

    pub fn build(self) -> ServiceRegistry {
        ServiceRegistry {
            services: DashMap::new(),
            factories: self.factories,
            metadata: self.metadata.unwrap_or_default(),
            options: self.options,
        }
    }
}
