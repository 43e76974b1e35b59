//! services/api/src/web/meals.rs
//!
//! Meal logging. Every item added to a meal is stored with a frozen macro
//! snapshot computed from the per-100g values the client sends.

use crate::error::ApiError;
use crate::web::dates::{date_or_today, local_now, parse_timestamp};
use crate::web::foods::checked_per_100g;
use crate::web::state::AppState;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use nutrilog_core::stats::{summarize_meals, NutritionTotals};
use nutrilog_core::{
    snapshot_meal_item, DayWindow, FoodSource, LoggedFood, MacroSnapshot, Meal, MealItem,
    MealType, NewMeal, PortError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Smallest quantity a meal item may log.
const MIN_ITEM_GRAMS: f64 = 0.01;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateMealRequest {
    #[schema(example = "2024-01-15T12:30:00")]
    pub eaten_at: String,
    #[schema(example = "lunch")]
    pub meal_type: String,
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMealItemRequest {
    #[schema(example = "usda")]
    pub food_source: String,
    #[schema(example = "171077")]
    pub external_food_id: Option<String>,
    #[schema(example = "Grilled chicken")]
    pub food_name: String,
    pub food_brand: Option<String>,
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
    #[schema(example = 150.0, minimum = 0.01)]
    pub grams: f64,
}

impl AddMealItemRequest {
    /// Validates the request and freezes its macro snapshot.
    pub fn into_item(self) -> Result<(LoggedFood, MacroSnapshot), ApiError> {
        let source = self.food_source.parse::<FoodSource>()?;
        let name = self.food_name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("food_name must not be empty".to_string()));
        }
        if !(self.grams >= MIN_ITEM_GRAMS) {
            return Err(ApiError::BadRequest(format!(
                "grams must be at least {}",
                MIN_ITEM_GRAMS
            )));
        }
        let per_100g = checked_per_100g(
            self.kcal_100g,
            self.protein_100g,
            self.carbs_100g,
            self.fat_100g,
            self.sugar_100g,
            self.fiber_100g,
        )?;
        let snapshot = snapshot_meal_item(per_100g, self.grams)?;

        let food = LoggedFood {
            source,
            external_id: self.external_food_id.filter(|id| !id.trim().is_empty()),
            name,
            brand: self.food_brand.filter(|b| !b.trim().is_empty()),
        };
        Ok((food, snapshot))
    }
}

/// One food logged into a new meal in a single call.
#[derive(Deserialize, ToSchema)]
pub struct QuickAddRequest {
    #[serde(flatten)]
    pub item: AddMealItemRequest,
    /// Defaults to `snack`.
    pub meal_type: Option<String>,
    /// Defaults to now.
    pub eaten_at: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MealItemResponse {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub food_source: String,
    pub external_food_id: Option<String>,
    pub food_name: String,
    pub food_brand: Option<String>,
    pub kcal_100g: f64,
    pub protein_100g: f64,
    pub carbs_100g: f64,
    pub fat_100g: f64,
    pub sugar_100g: Option<f64>,
    pub fiber_100g: Option<f64>,
    pub grams: f64,
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub sugar: Option<f64>,
    pub fiber: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<MealItem> for MealItemResponse {
    fn from(item: MealItem) -> Self {
        let MacroSnapshot {
            per_100g,
            grams,
            absolute,
        } = item.snapshot;
        Self {
            id: item.id,
            meal_id: item.meal_id,
            food_source: item.food.source.to_string(),
            external_food_id: item.food.external_id,
            food_name: item.food.name,
            food_brand: item.food.brand,
            kcal_100g: per_100g.kcal,
            protein_100g: per_100g.protein,
            carbs_100g: per_100g.carbs,
            fat_100g: per_100g.fat,
            sugar_100g: per_100g.sugar,
            fiber_100g: per_100g.fiber,
            grams,
            kcal: absolute.kcal,
            protein: absolute.protein,
            carbs: absolute.carbs,
            fat: absolute.fat,
            sugar: absolute.sugar,
            fiber: absolute.fiber,
            created_at: item.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MealResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub eaten_at: NaiveDateTime,
    pub meal_type: String,
    pub note: Option<String>,
    pub items: Vec<MealItemResponse>,
}

impl From<Meal> for MealResponse {
    fn from(meal: Meal) -> Self {
        Self {
            id: meal.id,
            user_id: meal.user_id,
            eaten_at: meal.eaten_at,
            meal_type: meal.meal_type.to_string(),
            note: meal.note,
            items: meal.items.into_iter().map(MealItemResponse::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct NutritionTotalsResponse {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub sugar: f64,
    pub fiber: f64,
}

impl From<NutritionTotals> for NutritionTotalsResponse {
    fn from(t: NutritionTotals) -> Self {
        Self {
            kcal: t.kcal,
            protein: t.protein,
            carbs: t.carbs,
            fat: t.fat,
            sugar: t.sugar,
            fiber: t.fiber,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DayMealsResponse {
    pub date: NaiveDate,
    pub meals: Vec<MealResponse>,
    pub totals: NutritionTotalsResponse,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteMealResponse {
    pub success: bool,
    pub id: Uuid,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MealsQuery {
    /// `YYYY-MM-DD`, defaults to today.
    pub date: Option<String>,
}

/// Loads a meal and checks that it belongs to `user_id`.
async fn owned_meal(state: &AppState, user_id: Uuid, meal_id: Uuid) -> Result<Meal, ApiError> {
    let meal = state.meals.get_meal(meal_id).await?;
    if meal.user_id != user_id {
        return Err(PortError::Forbidden(format!("Meal {} belongs to another user", meal_id)).into());
    }
    Ok(meal)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /meals - Create an empty meal
#[utoipa::path(
    post,
    path = "/meals",
    request_body = CreateMealRequest,
    responses(
        (status = 201, description = "Meal created", body = MealResponse),
        (status = 400, description = "Invalid timestamp or meal type")
    ),
    tag = "meals"
)]
pub async fn create_meal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateMealRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let meal = state
        .meals
        .create_meal(NewMeal {
            user_id,
            eaten_at: parse_timestamp("eaten_at", &req.eaten_at)?,
            meal_type: req.meal_type.parse::<MealType>()?,
            note: req.note,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MealResponse::from(meal))))
}

/// GET /meals - Meals of one day with their totals
#[utoipa::path(
    get,
    path = "/meals",
    params(MealsQuery),
    responses(
        (status = 200, description = "Meals of the day, oldest first", body = DayMealsResponse),
        (status = 400, description = "Invalid date")
    ),
    tag = "meals"
)]
pub async fn list_meals_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<MealsQuery>,
) -> Result<Json<DayMealsResponse>, ApiError> {
    let date = date_or_today("date", params.date.as_deref())?;
    let meals = state
        .meals
        .list_meals_between(user_id, DayWindow::for_date(date))
        .await?;
    let totals = summarize_meals(&meals);

    Ok(Json(DayMealsResponse {
        date,
        meals: meals.into_iter().map(MealResponse::from).collect(),
        totals: totals.into(),
    }))
}

/// POST /meals/quick - Log one food as a new meal
#[utoipa::path(
    post,
    path = "/meals/quick",
    request_body = QuickAddRequest,
    responses(
        (status = 201, description = "Meal created with its item", body = MealResponse),
        (status = 400, description = "Invalid item")
    ),
    tag = "meals"
)]
pub async fn quick_add_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<QuickAddRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate everything before the meal row exists.
    let (food, snapshot) = req.item.into_item()?;
    let meal_type = req
        .meal_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(str::parse::<MealType>)
        .transpose()?
        .unwrap_or(MealType::Snack);
    let eaten_at = match req.eaten_at.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(raw) => parse_timestamp("eaten_at", raw)?,
        None => local_now(),
    };

    let meal = state
        .meals
        .create_meal(NewMeal {
            user_id,
            eaten_at,
            meal_type,
            note: None,
        })
        .await?;
    state.meals.add_meal_item(meal.id, food, snapshot).await?;
    let meal = state.meals.get_meal(meal.id).await?;

    Ok((StatusCode::CREATED, Json(MealResponse::from(meal))))
}

/// POST /meals/{id}/items - Add a food to a meal
#[utoipa::path(
    post,
    path = "/meals/{id}/items",
    params(("id" = Uuid, Path, description = "The meal to add to")),
    request_body = AddMealItemRequest,
    responses(
        (status = 201, description = "Item added", body = MealItemResponse),
        (status = 400, description = "Invalid item"),
        (status = 403, description = "The meal belongs to another user"),
        (status = 404, description = "No such meal")
    ),
    tag = "meals"
)]
pub async fn add_meal_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(meal_id): Path<Uuid>,
    Json(req): Json<AddMealItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    owned_meal(&state, user_id, meal_id).await?;
    let (food, snapshot) = req.into_item()?;

    let item = state.meals.add_meal_item(meal_id, food, snapshot).await?;

    Ok((StatusCode::CREATED, Json(MealItemResponse::from(item))))
}

/// DELETE /meals/{id} - Delete a meal and its items
#[utoipa::path(
    delete,
    path = "/meals/{id}",
    params(("id" = Uuid, Path, description = "The meal to delete")),
    responses(
        (status = 200, description = "Meal deleted", body = DeleteMealResponse),
        (status = 403, description = "The meal belongs to another user"),
        (status = 404, description = "No such meal")
    ),
    tag = "meals"
)]
pub async fn delete_meal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(meal_id): Path<Uuid>,
) -> Result<Json<DeleteMealResponse>, ApiError> {
    owned_meal(&state, user_id, meal_id).await?;
    state.meals.delete_meal(meal_id).await?;
    info!("Meal {} deleted", meal_id);

    Ok(Json(DeleteMealResponse {
        success: true,
        id: meal_id,
    }))
}
