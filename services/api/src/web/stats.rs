//! services/api/src/web/stats.rs
//!
//! Daily and weekly summaries for the dashboard.

use crate::error::ApiError;
use crate::web::dates::{date_or_today, local_today};
use crate::web::meals::NutritionTotalsResponse;
use crate::web::profile::TargetsResponse;
use crate::web::state::AppState;
use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::NaiveDate;
use nutrilog_core::{DayStats, WeekDay, WeekStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// `YYYY-MM-DD`, defaults to today.
    pub date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct WorkoutTotalsResponse {
    pub count: usize,
    pub total_duration_min: u64,
    pub total_burn_kcal: i64,
}

#[derive(Serialize, ToSchema)]
pub struct DayStatsResponse {
    pub date: NaiveDate,
    pub nutrition: NutritionTotalsResponse,
    pub workouts: WorkoutTotalsResponse,
    /// Null while the profile is incomplete.
    pub targets: Option<TargetsResponse>,
}

impl From<DayStats> for DayStatsResponse {
    fn from(day: DayStats) -> Self {
        Self {
            date: day.date,
            nutrition: day.nutrition.into(),
            workouts: WorkoutTotalsResponse {
                count: day.workouts.count,
                total_duration_min: day.workouts.total_duration_min,
                total_burn_kcal: day.workouts.total_burn_kcal,
            },
            targets: day.targets.map(TargetsResponse::from),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct WeekDayResponse {
    pub date: NaiveDate,
    pub kcal: f64,
    pub total_burn_kcal: i64,
    pub total_duration_min: u64,
    pub target_calories: Option<i32>,
}

impl From<WeekDay> for WeekDayResponse {
    fn from(day: WeekDay) -> Self {
        Self {
            date: day.date,
            kcal: day.kcal,
            total_burn_kcal: day.total_burn_kcal,
            total_duration_min: day.total_duration_min,
            target_calories: day.target_calories,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct WeekStatsResponse {
    /// Seven days, oldest first, ending on the requested date.
    pub days: Vec<WeekDayResponse>,
    pub target_calories: Option<i32>,
}

impl From<WeekStats> for WeekStatsResponse {
    fn from(week: WeekStats) -> Self {
        Self {
            days: week.days.into_iter().map(WeekDayResponse::from).collect(),
            target_calories: week.target_calories,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /stats/day - Nutrition, exercise and targets for one day
#[utoipa::path(
    get,
    path = "/stats/day",
    params(StatsQuery),
    responses(
        (status = 200, description = "Day summary", body = DayStatsResponse),
        (status = 400, description = "Invalid date")
    ),
    tag = "stats"
)]
pub async fn day_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<DayStatsResponse>, ApiError> {
    let date = date_or_today("date", params.date.as_deref())?;
    let day = state.stats.day_stats(user_id, date, local_today()).await?;
    Ok(Json(day.into()))
}

/// GET /stats/week - The seven days ending on a date
#[utoipa::path(
    get,
    path = "/stats/week",
    params(StatsQuery),
    responses(
        (status = 200, description = "Week chart data", body = WeekStatsResponse),
        (status = 400, description = "Invalid date")
    ),
    tag = "stats"
)]
pub async fn week_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<WeekStatsResponse>, ApiError> {
    let reference = date_or_today("date", params.date.as_deref())?;
    let week = state
        .stats
        .week_stats(user_id, reference, local_today())
        .await?;
    Ok(Json(week.into()))
}
