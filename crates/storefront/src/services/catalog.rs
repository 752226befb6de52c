//! Product catalog client.
//!
//! The catalog is a JSON array of products published next to the storefront.
//! It is loaded from a primary source and, failing that, a fallback. Each
//! source is either an `http(s)` URL or a local file path. The parsed catalog
//! is cached for 5 minutes using `moka`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use bazaar_core::{Product, ProductId};

use crate::config::CatalogConfig;

const CACHE_KEY: &str = "catalog";
const CACHE_TTL: Duration = Duration::from_secs(300);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{origin} returned status {status}")]
    Status { origin: String, status: u16 },

    #[error("failed to read {origin}: {err}")]
    Io {
        origin: String,
        #[source]
        err: std::io::Error,
    },

    #[error("malformed catalog from {origin}: {err}")]
    Parse {
        origin: String,
        #[source]
        err: serde_json::Error,
    },

    #[error("invalid product in {origin}: {message}")]
    InvalidProduct { origin: String, message: String },

    #[error("catalog from {0} is empty")]
    Empty(String),

    /// Neither source produced a usable catalog.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Lookup of products by id.
pub trait CatalogLookup {
    fn find(&self, id: &ProductId) -> Option<&Product>;
}

/// A parsed catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog. When ids repeat, the first product wins lookups.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            index.entry(product.id.clone()).or_insert(position);
        }
        Self { products, index }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct non-empty categories, in catalog order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for product in &self.products {
            let category = product.category.as_str();
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }
}

impl CatalogLookup for Catalog {
    fn find(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|&i| self.products.get(i))
    }
}

/// Parse and validate a catalog document.
///
/// # Errors
///
/// Returns `CatalogError::Parse` if the bytes are not a product array,
/// `CatalogError::InvalidProduct` if a product fails validation and
/// `CatalogError::Empty` if the array is empty.
pub fn parse_catalog(origin: &str, bytes: &[u8]) -> Result<Catalog, CatalogError> {
    let products: Vec<Product> = serde_json::from_slice(bytes).map_err(|err| CatalogError::Parse {
        origin: origin.to_string(),
        err,
    })?;

    if products.is_empty() {
        return Err(CatalogError::Empty(origin.to_string()));
    }
    for product in &products {
        product
            .validate()
            .map_err(|message| CatalogError::InvalidProduct {
                origin: origin.to_string(),
                message,
            })?;
    }

    Ok(Catalog::new(products))
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Loads and caches the catalog.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    sources: CatalogConfig,
    cache: Cache<String, Arc<Catalog>>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(sources: CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: super::http_client(FETCH_TIMEOUT),
                sources,
                cache,
            }),
        }
    }

    /// Get the catalog, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unavailable` if neither source yields a
    /// non-empty, valid catalog.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Arc<Catalog>, CatalogError> {
        if let Some(catalog) = self.inner.cache.get(CACHE_KEY).await {
            debug!("Catalog cache hit");
            return Ok(catalog);
        }

        let catalog = Arc::new(self.load().await?);
        self.inner
            .cache
            .insert(CACHE_KEY.to_string(), Arc::clone(&catalog))
            .await;
        Ok(catalog)
    }

    /// Like [`fetch`](Self::fetch), but degrade to an empty catalog.
    pub async fn fetch_or_empty(&self) -> Arc<Catalog> {
        match self.fetch().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "Using empty catalog");
                Arc::new(Catalog::default())
            }
        }
    }

    /// Drop the cached catalog so the next fetch reloads it.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate(CACHE_KEY).await;
    }

    async fn load(&self) -> Result<Catalog, CatalogError> {
        let sources = &self.inner.sources;
        let mut failures = Vec::with_capacity(2);

        for source in std::iter::once(&sources.primary).chain(sources.fallback.as_ref()) {
            match self.load_source(source).await {
                Ok(catalog) => {
                    debug!(source = %source, products = catalog.len(), "Catalog loaded");
                    return Ok(catalog);
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Catalog source failed");
                    failures.push(e.to_string());
                }
            }
        }

        Err(CatalogError::Unavailable(failures.join("; ")))
    }

    async fn load_source(&self, source: &str) -> Result<Catalog, CatalogError> {
        let bytes = if is_url(source) {
            let response = self.inner.client.get(source).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(CatalogError::Status {
                    origin: source.to_string(),
                    status: status.as_u16(),
                });
            }
            response.bytes().await?.to_vec()
        } else {
            tokio::fs::read(Path::new(source))
                .await
                .map_err(|err| CatalogError::Io {
                    origin: source.to_string(),
                    err,
                })?
        };

        parse_catalog(source, &bytes)
    }
}
