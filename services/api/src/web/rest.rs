//! services/api/src/web/rest.rs
//!
//! Assembles the REST router and holds the master definition for the OpenAPI
//! specification.

use crate::config::ConfigError;
use crate::error::ApiError;
use crate::web::{auth, foods, meals, middleware::require_auth, profile, state::AppState, stats, workouts};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        profile::me_handler,
        profile::get_profile_handler,
        profile::update_profile_handler,
        profile::targets_handler,
        foods::search_foods_handler,
        foods::create_food_handler,
        foods::refresh_catalog_handler,
        meals::create_meal_handler,
        meals::list_meals_handler,
        meals::quick_add_handler,
        meals::add_meal_item_handler,
        meals::delete_meal_handler,
        workouts::create_workout_handler,
        workouts::list_workouts_handler,
        stats::day_stats_handler,
        stats::week_stats_handler,
    ),
    components(
        schemas(
            auth::SignupRequest, auth::LoginRequest, auth::AuthResponse,
            profile::MeResponse, profile::MeProfileSummary, profile::ProfileResponse,
            profile::UpdateProfileRequest, profile::TargetsResponse,
            foods::FoodResponse, foods::CreateFoodRequest, foods::CatalogRefreshResponse,
            meals::CreateMealRequest, meals::AddMealItemRequest, meals::QuickAddRequest,
            meals::MealResponse, meals::MealItemResponse, meals::NutritionTotalsResponse,
            meals::DayMealsResponse, meals::DeleteMealResponse,
            workouts::CreateWorkoutRequest, workouts::WorkoutResponse, workouts::RunDetailResponse,
            stats::DayStatsResponse, stats::WorkoutTotalsResponse,
            stats::WeekStatsResponse, stats::WeekDayResponse,
        )
    ),
    tags(
        (name = "auth", description = "Signup, login and logout."),
        (name = "me", description = "The signed-in user's profile and targets."),
        (name = "foods", description = "Food search and custom foods."),
        (name = "meals", description = "Meal logging with frozen macro snapshots."),
        (name = "workouts", description = "Workout logging."),
        (name = "stats", description = "Daily and weekly summaries.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the full application router, Swagger UI included.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/me", get(profile::me_handler))
        .route(
            "/me/profile",
            get(profile::get_profile_handler).put(profile::update_profile_handler),
        )
        .route("/me/targets", get(profile::targets_handler))
        .route(
            "/foods",
            get(foods::search_foods_handler).post(foods::create_food_handler),
        )
        .route("/foods/catalog/refresh", post(foods::refresh_catalog_handler))
        .route(
            "/meals",
            get(meals::list_meals_handler).post(meals::create_meal_handler),
        )
        .route("/meals/quick", post(meals::quick_add_handler))
        .route("/meals/{id}", delete(meals::delete_meal_handler))
        .route("/meals/{id}/items", post(meals::add_meal_item_handler))
        .route(
            "/workouts",
            get(workouts::list_workouts_handler).post(workouts::create_workout_handler),
        )
        .route("/stats/day", get(stats::day_stats_handler))
        .route("/stats/week", get(stats::week_stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/signup",
            "/me/targets",
            "/foods/catalog/refresh",
            "/meals/{id}/items",
            "/workouts",
            "/stats/week",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
