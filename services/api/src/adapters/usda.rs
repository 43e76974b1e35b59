//! services/api/src/adapters/usda.rs
//!
//! This module contains the adapter for the USDA FoodData Central search API.
//! It implements the `FoodLookupService` port from the `core` crate.

use async_trait::async_trait;
use nutrilog_core::{
    domain::{FoodReference, FoodSource, Per100g},
    ports::{FoodLookupService, PortError, PortResult},
};
use serde::Deserialize;

/// FoodData Central caps a search page at this many results.
const MAX_PAGE_SIZE: usize = 50;

//=========================================================================================
// FoodData Central Response Shapes
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaFoodNutrient {
    nutrient_id: Option<u32>,
    nutrient_name: Option<String>,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaSearchFood {
    fdc_id: u64,
    description: String,
    brand_name: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<UsdaFoodNutrient>,
}

#[derive(Debug, Deserialize)]
struct UsdaSearchResponse {
    #[serde(default)]
    foods: Vec<UsdaSearchFood>,
}

/// Finds a nutrient value by id first, then by a case-insensitive name fragment.
fn pick_nutrient(nutrients: &[UsdaFoodNutrient], ids: &[u32], names: &[&str]) -> Option<f64> {
    let by_id = nutrients
        .iter()
        .filter(|n| n.nutrient_id.is_some_and(|id| ids.contains(&id)))
        .find_map(|n| n.value);
    by_id.or_else(|| {
        nutrients
            .iter()
            .filter(|n| {
                let name = n.nutrient_name.as_deref().unwrap_or("").to_lowercase();
                names.iter().any(|fragment| name.contains(fragment))
            })
            .find_map(|n| n.value)
    })
}

impl UsdaSearchFood {
    fn to_domain(self) -> FoodReference {
        let n = &self.food_nutrients;
        let per_100g = Per100g {
            kcal: pick_nutrient(n, &[1008], &["energy"]).unwrap_or(0.0),
            protein: pick_nutrient(n, &[1003], &["protein"]).unwrap_or(0.0),
            carbs: pick_nutrient(n, &[1005], &["carbohydrate"]).unwrap_or(0.0),
            fat: pick_nutrient(n, &[1004], &["total lipid", "fat"]).unwrap_or(0.0),
            sugar: pick_nutrient(n, &[2000], &["sugars, total"]),
            fiber: pick_nutrient(n, &[1079], &["fiber"]),
        };
        FoodReference {
            source: FoodSource::Usda,
            external_id: self.fdc_id.to_string(),
            name: self.description,
            brand: self.brand_name,
            per_100g,
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `FoodLookupService` against FoodData Central.
#[derive(Clone)]
pub struct UsdaFoodAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl UsdaFoodAdapter {
    /// Creates a new `UsdaFoodAdapter`.
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

//=========================================================================================
// `FoodLookupService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FoodLookupService for UsdaFoodAdapter {
    async fn search(&self, query: &str, limit: usize) -> PortResult<Vec<FoodReference>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let page_size = limit.min(MAX_PAGE_SIZE).to_string();

        let response = self
            .client
            .get(format!("{}/foods/search", self.base_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Upstream(format!("FoodData Central unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(PortError::Upstream(format!(
                "FoodData Central responded with {}",
                response.status()
            )));
        }

        let body: UsdaSearchResponse = response
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("Malformed FoodData Central reply: {}", e)))?;

        Ok(body
            .foods
            .into_iter()
            .take(limit)
            .map(UsdaSearchFood::to_domain)
            .collect())
    }
}
