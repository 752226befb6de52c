//! Engine state shared by the host.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::StorefrontConfig;
use crate::services::addresses::AddressBook;
use crate::services::cart::CartService;
use crate::services::catalog::CatalogClient;
use crate::services::checkout::CheckoutService;
use crate::services::identity::IdentityService;
use crate::services::orders::OrderManager;
use crate::services::payment::{CodeRenderer, DeliveryChannelSelector};
use crate::services::sync::SyncGateway;
use crate::store::{LocalStore, RedbStore, StoreError};

/// The storefront engine.
///
/// This struct is cheaply cloneable via `Arc`. Every service shares one local
/// store, one clock and one sync gateway.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    gateway: SyncGateway,
    identity: IdentityService,
    cart: CartService,
    addresses: AddressBook,
    orders: OrderManager,
}

impl Storefront {
    /// Open the engine on the durable store under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store file cannot be created or opened.
    pub fn open(config: StorefrontConfig) -> Result<Self, StoreError> {
        let store = RedbStore::open_in_dir(&config.data_dir)?;
        let gateway = SyncGateway::new(config.order_api_url.clone());
        Ok(Self::with_parts(config, Arc::new(store), Arc::new(SystemClock), gateway))
    }

    /// Assemble the engine from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        store: Arc<dyn LocalStore>,
        clock: Arc<dyn Clock>,
        gateway: SyncGateway,
    ) -> Self {
        let catalog = CatalogClient::new(config.catalog.clone());
        let identity = IdentityService::new(Arc::clone(&store), Arc::clone(&clock));
        let cart = CartService::new(Arc::clone(&store));
        let addresses = AddressBook::new(Arc::clone(&store));
        let orders = OrderManager::new(
            store,
            Arc::new(gateway.clone()),
            clock,
            config.payee.clone(),
        );

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                catalog,
                gateway,
                identity,
                cart,
                addresses,
                orders,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn gateway(&self) -> &SyncGateway {
        &self.inner.gateway
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityService {
        &self.inner.identity
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressBook {
        &self.inner.addresses
    }

    #[must_use]
    pub fn orders(&self) -> &OrderManager {
        &self.inner.orders
    }

    /// Checkout flow using the host's channel choice and code renderer.
    #[must_use]
    pub fn checkout(
        &self,
        selector: Arc<dyn DeliveryChannelSelector>,
        renderer: Arc<dyn CodeRenderer>,
    ) -> CheckoutService {
        CheckoutService::new(
            self.inner.identity.clone(),
            self.inner.cart.clone(),
            self.inner.addresses.clone(),
            self.inner.orders.clone(),
            selector,
            renderer,
        )
    }
}
