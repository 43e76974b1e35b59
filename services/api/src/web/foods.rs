//! services/api/src/web/foods.rs
//!
//! Food search across the three sources (USDA, local catalog, custom foods)
//! and creation of custom foods.

use crate::error::ApiError;
use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use nutrilog_core::{FoodLookupService, FoodReference, FoodSource, NewFood, Per100g};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_SEARCH_LIMIT: i64 = 20;
const MAX_SEARCH_LIMIT: i64 = 100;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchFoodsParams {
    /// Words that must all appear in the food name.
    pub query: Option<String>,
    /// 1 to 100, defaults to 20.
    pub limit: Option<i64>,
    /// `usda` (default), `catalog` or `custom`.
    pub source: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct FoodResponse {
    #[schema(example = "usda")]
    pub source: String,
    pub external_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub kcal_100g: f64,
    pub protein_100g: f64,
    pub carbs_100g: f64,
    pub fat_100g: f64,
    pub sugar_100g: Option<f64>,
    pub fiber_100g: Option<f64>,
}

impl From<FoodReference> for FoodResponse {
    fn from(food: FoodReference) -> Self {
        Self {
            source: food.source.to_string(),
            external_id: food.external_id,
            name: food.name,
            brand: food.brand,
            kcal_100g: food.per_100g.kcal,
            protein_100g: food.per_100g.protein,
            carbs_100g: food.per_100g.carbs,
            fat_100g: food.per_100g.fat,
            sugar_100g: food.per_100g.sugar,
            fiber_100g: food.per_100g.fiber,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateFoodRequest {
    #[schema(example = "Grilled chicken")]
    pub name: String,
    pub brand: Option<String>,
    #[schema(example = 165.0)]
    pub kcal_100g: f64,
    #[schema(example = 31.0)]
    pub protein_100g: f64,
    #[schema(example = 0.0)]
    pub carbs_100g: f64,
    #[schema(example = 3.6)]
    pub fat_100g: f64,
    pub sugar_100g: Option<f64>,
    pub fiber_100g: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct CatalogRefreshResponse {
    pub count: usize,
}

/// Per-100g values must be finite and non-negative.
pub fn checked_per_100g(
    kcal: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    sugar: Option<f64>,
    fiber: Option<f64>,
) -> Result<Per100g, ApiError> {
    let check = |field: &str, value: f64| {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(ApiError::BadRequest(format!("{} must not be negative", field)))
        }
    };
    Ok(Per100g {
        kcal: check("kcal_100g", kcal)?,
        protein: check("protein_100g", protein)?,
        carbs: check("carbs_100g", carbs)?,
        fat: check("fat_100g", fat)?,
        sugar: sugar.map(|v| check("sugar_100g", v)).transpose()?,
        fiber: fiber.map(|v| check("fiber_100g", v)).transpose()?,
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /foods - Search foods
#[utoipa::path(
    get,
    path = "/foods",
    params(SearchFoodsParams),
    responses(
        (status = 200, description = "Matching foods", body = [FoodResponse]),
        (status = 400, description = "Invalid limit or source"),
        (status = 502, description = "The USDA database could not be reached")
    ),
    tag = "foods"
)]
pub async fn search_foods_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchFoodsParams>,
) -> Result<Json<Vec<FoodResponse>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_SEARCH_LIMIT
        )));
    }
    let limit = limit as usize;
    let source = params
        .source
        .as_deref()
        .map(str::parse::<FoodSource>)
        .transpose()?
        .unwrap_or(FoodSource::Usda);
    let query = params.query.unwrap_or_default();

    let foods = match source {
        FoodSource::Usda => state.usda.search(&query, limit).await?,
        FoodSource::Catalog => state.catalog.search(&query, limit).await?,
        FoodSource::Custom => state.foods.search_custom_foods(&query, limit).await?,
    };

    Ok(Json(foods.into_iter().map(FoodResponse::from).collect()))
}

/// POST /foods - Create a custom food
#[utoipa::path(
    post,
    path = "/foods",
    request_body = CreateFoodRequest,
    responses(
        (status = 201, description = "Food created", body = FoodResponse),
        (status = 400, description = "Missing name or negative values")
    ),
    tag = "foods"
)]
pub async fn create_food_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFoodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let per_100g = checked_per_100g(
        req.kcal_100g,
        req.protein_100g,
        req.carbs_100g,
        req.fat_100g,
        req.sugar_100g,
        req.fiber_100g,
    )?;

    let food = state
        .foods
        .create_custom_food(NewFood {
            name,
            brand: req.brand.filter(|b| !b.trim().is_empty()),
            per_100g,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(FoodResponse::from(food))))
}

/// POST /foods/catalog/refresh - Reload the local catalog files
#[utoipa::path(
    post,
    path = "/foods/catalog/refresh",
    responses(
        (status = 200, description = "Catalog reloaded", body = CatalogRefreshResponse),
        (status = 500, description = "The catalog file could not be read")
    ),
    tag = "foods"
)]
pub async fn refresh_catalog_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogRefreshResponse>, ApiError> {
    let count = state.catalog.refresh().await?;
    info!("Food catalog reloaded on request ({} foods)", count);
    Ok(Json(CatalogRefreshResponse { count }))
}
