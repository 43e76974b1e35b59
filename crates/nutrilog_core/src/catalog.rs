//! crates/nutrilog_core/src/catalog.rs
//!
//! A read-through cache over the local food catalog.
//!
//! The catalog is loaded through an injected `CatalogLoader` on first search and
//! kept until `refresh` or `invalidate` is called.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::FoodReference;
use crate::ports::{CatalogLoader, FoodLookupService, PortResult};

pub struct FoodCatalog {
    loader: Arc<dyn CatalogLoader>,
    cached: RwLock<Option<Arc<Vec<FoodReference>>>>,
}

impl FoodCatalog {
    pub fn new(loader: Arc<dyn CatalogLoader>) -> Self {
        Self {
            loader,
            cached: RwLock::new(None),
        }
    }

    /// Returns the cached foods, loading them if nothing is cached yet.
    pub async fn foods(&self) -> PortResult<Arc<Vec<FoodReference>>> {
        if let Some(foods) = self.cached.read().await.as_ref() {
            return Ok(foods.clone());
        }

        let mut slot = self.cached.write().await;
        // Another caller may have loaded while we waited for the write lock.
        if let Some(foods) = slot.as_ref() {
            return Ok(foods.clone());
        }
        let foods = Arc::new(self.loader.load().await?);
        info!("Loaded {} catalog foods", foods.len());
        *slot = Some(foods.clone());
        Ok(foods)
    }

    /// Reloads the catalog and replaces the cached copy. The old copy stays in
    /// place if loading fails.
    pub async fn refresh(&self) -> PortResult<usize> {
        let foods = Arc::new(self.loader.load().await?);
        let count = foods.len();
        *self.cached.write().await = Some(foods);
        info!("Refreshed food catalog with {} foods", count);
        Ok(count)
    }

    /// Drops the cached copy; the next search loads again.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
        debug!("Food catalog cache invalidated");
    }
}

/// Case-insensitive match where every whitespace-separated term of `query`
/// must appear in the food name.
pub fn matches_query(food: &FoodReference, terms: &[String]) -> bool {
    let name = food.name.to_lowercase();
    terms.iter().all(|term| name.contains(term.as_str()))
}

pub fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .collect()
}

#[async_trait]
impl FoodLookupService for FoodCatalog {
    async fn search(&self, query: &str, limit: usize) -> PortResult<Vec<FoodReference>> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let foods = self.foods().await?;
        Ok(foods
            .iter()
            .filter(|food| matches_query(food, &terms))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FoodSource, Per100g};
    use crate::ports::PortError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingLoader {
        foods: Mutex<Vec<FoodReference>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingLoader {
        fn new(names: &[&str]) -> Self {
            Self {
                foods: Mutex::new(names.iter().map(|n| food(n)).collect()),
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl CatalogLoader for CountingLoader {
        async fn load(&self) -> PortResult<Vec<FoodReference>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PortError::Unexpected("disk on fire".to_string()));
            }
            Ok(self.foods.lock().unwrap().clone())
        }
    }

    fn food(name: &str) -> FoodReference {
        FoodReference {
            source: FoodSource::Catalog,
            external_id: name.to_string(),
            name: name.to_string(),
            brand: None,
            per_100g: Per100g::default(),
        }
    }

    #[tokio::test]
    async fn search_matches_all_terms_case_insensitively() {
        let loader = Arc::new(CountingLoader::new(&[
            "Chicken breast, cooked",
            "Chicken thigh, raw",
            "Rice, white, cooked",
        ]));
        let catalog = FoodCatalog::new(loader);

        let hits = catalog.search("CHICKEN cooked", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Chicken breast, cooked");

        let capped = catalog.search("chicken", 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn blank_query_returns_nothing_without_loading() {
        let loader = Arc::new(CountingLoader::new(&["Apple"]));
        let catalog = FoodCatalog::new(loader.clone());

        assert!(catalog.search("   ", 10).await.unwrap().is_empty());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn loads_once_until_refreshed() {
        let loader = Arc::new(CountingLoader::new(&["Apple"]));
        let catalog = FoodCatalog::new(loader.clone());

        catalog.search("apple", 5).await.unwrap();
        catalog.search("apple", 5).await.unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

        loader.foods.lock().unwrap().push(food("Apple pie"));
        assert_eq!(catalog.search("apple", 5).await.unwrap().len(), 1);

        assert_eq!(catalog.refresh().await.unwrap(), 2);
        assert_eq!(catalog.search("apple", 5).await.unwrap().len(), 2);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);

        catalog.invalidate().await;
        catalog.search("apple", 5).await.unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_copy() {
        let catalog = FoodCatalog::new(Arc::new(CountingLoader::new(&["Banana"])));
        catalog.search("banana", 5).await.unwrap();

        let failing = FoodCatalog {
            loader: Arc::new(CountingLoader {
                fail: true,
                ..CountingLoader::new(&[])
            }),
            cached: RwLock::new(Some(catalog.foods().await.unwrap())),
        };
        assert!(failing.refresh().await.is_err());
        assert_eq!(failing.search("banana", 5).await.unwrap().len(), 1);
    }
}
