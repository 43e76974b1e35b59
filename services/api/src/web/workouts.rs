//! services/api/src/web/workouts.rs
//!
//! Workout logging and listing.

use crate::error::ApiError;
use crate::web::dates::{parse_date, parse_timestamp};
use crate::web::state::AppState;
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use nutrilog_core::{DayWindow, NewWorkout, RunDetail, Workout, WorkoutKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// One session may not last longer than a day.
pub const MAX_DURATION_MIN: u32 = 24 * 60;

#[derive(Deserialize, ToSchema)]
pub struct CreateWorkoutRequest {
    #[schema(example = "2024-01-15T08:00:00")]
    pub started_at: String,
    /// `run` or `strength`.
    #[serde(rename = "type")]
    #[schema(example = "run")]
    pub kind: String,
    #[schema(example = 45, minimum = 1, maximum = 1440)]
    pub duration_min: i64,
    #[schema(example = 7, minimum = 1, maximum = 10)]
    pub rpe: Option<i64>,
    pub notes: Option<String>,
    /// Runs only. Stored together with the pace, never alone.
    #[schema(example = 5.5)]
    pub distance_km: Option<f64>,
    /// Seconds per km. Runs only.
    #[schema(example = 300.0)]
    pub avg_pace_sec_per_km: Option<f64>,
}

impl CreateWorkoutRequest {
    pub fn into_new_workout(self, user_id: Uuid) -> Result<NewWorkout, ApiError> {
        let kind = self.kind.parse::<WorkoutKind>()?;
        let started_at = parse_timestamp("started_at", &self.started_at)?;

        let duration_min = u32::try_from(self.duration_min)
            .ok()
            .filter(|d| (1..=MAX_DURATION_MIN).contains(d))
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "duration_min must be between 1 and {}",
                    MAX_DURATION_MIN
                ))
            })?;
        let rpe = self
            .rpe
            .map(|r| {
                u8::try_from(r)
                    .ok()
                    .filter(|r| (1..=10).contains(r))
                    .ok_or_else(|| ApiError::BadRequest("rpe must be between 1 and 10".to_string()))
            })
            .transpose()?;

        for (field, value) in [
            ("distance_km", self.distance_km),
            ("avg_pace_sec_per_km", self.avg_pace_sec_per_km),
        ] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(ApiError::BadRequest(format!("{} must not be negative", field)));
            }
        }

        let run_detail = match (kind, self.distance_km, self.avg_pace_sec_per_km) {
            (WorkoutKind::Run, Some(distance_km), Some(avg_pace_sec_per_km))
                if distance_km > 0.0 && avg_pace_sec_per_km > 0.0 =>
            {
                Some(RunDetail {
                    distance_km,
                    avg_pace_sec_per_km,
                })
            }
            _ => None,
        };

        Ok(NewWorkout {
            user_id,
            started_at,
            kind,
            duration_min,
            rpe,
            notes: self.notes,
            run_detail,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct RunDetailResponse {
    pub distance_km: f64,
    pub avg_pace_sec_per_km: f64,
}

#[derive(Serialize, ToSchema)]
pub struct WorkoutResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: NaiveDateTime,
    #[serde(rename = "type")]
    #[schema(example = "strength")]
    pub kind: String,
    pub duration_min: u32,
    pub rpe: Option<u8>,
    pub notes: Option<String>,
    pub run_details: Option<RunDetailResponse>,
}

impl From<Workout> for WorkoutResponse {
    fn from(w: Workout) -> Self {
        Self {
            id: w.id,
            user_id: w.user_id,
            started_at: w.started_at,
            kind: w.kind.to_string(),
            duration_min: w.duration_min,
            rpe: w.rpe,
            notes: w.notes,
            run_details: w.run_detail.map(|r| RunDetailResponse {
                distance_km: r.distance_km,
                avg_pace_sec_per_km: r.avg_pace_sec_per_km,
            }),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkoutsQuery {
    /// First day included, `YYYY-MM-DD`. Open-ended when absent.
    pub from: Option<String>,
    /// Last day included, `YYYY-MM-DD`. Open-ended when absent.
    pub to: Option<String>,
}

/// Bounds used for an open-ended range; both fit a PostgreSQL `TIMESTAMP`.
fn open_range_bounds() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
        NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /workouts - Log a workout
#[utoipa::path(
    post,
    path = "/workouts",
    request_body = CreateWorkoutRequest,
    responses(
        (status = 201, description = "Workout logged", body = WorkoutResponse),
        (status = 400, description = "Invalid type, duration or RPE")
    ),
    tag = "workouts"
)]
pub async fn create_workout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateWorkoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let workout = state
        .workouts
        .create_workout(req.into_new_workout(user_id)?)
        .await?;
    Ok((StatusCode::CREATED, Json(WorkoutResponse::from(workout))))
}

/// GET /workouts - Workouts in an inclusive date range, newest first
#[utoipa::path(
    get,
    path = "/workouts",
    params(WorkoutsQuery),
    responses(
        (status = 200, description = "Workouts, newest first", body = [WorkoutResponse]),
        (status = 400, description = "Invalid date")
    ),
    tag = "workouts"
)]
pub async fn list_workouts_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<WorkoutsQuery>,
) -> Result<Json<Vec<WorkoutResponse>>, ApiError> {
    let (earliest, latest) = open_range_bounds();
    let parse = |field: &str, raw: Option<&str>, default: NaiveDate| {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_date(field, raw),
            None => Ok(default),
        }
    };
    let from = parse("from", params.from.as_deref(), earliest)?;
    let to = parse("to", params.to.as_deref(), latest)?;

    let workouts = state
        .workouts
        .list_workouts_between(user_id, DayWindow::for_dates(from, to))
        .await?;

    Ok(Json(workouts.into_iter().map(WorkoutResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str) -> CreateWorkoutRequest {
        CreateWorkoutRequest {
            started_at: "2024-01-15T08:00:00".to_string(),
            kind: kind.to_string(),
            duration_min: 30,
            rpe: Some(7),
            notes: None,
            distance_km: Some(5.0),
            avg_pace_sec_per_km: Some(300.0),
        }
    }

    #[test]
    fn run_detail_needs_distance_and_pace() {
        let run = request("run").into_new_workout(Uuid::nil()).unwrap();
        assert_eq!(run.run_detail.map(|r| r.distance_km), Some(5.0));

        let mut no_pace = request("run");
        no_pace.avg_pace_sec_per_km = None;
        assert!(no_pace.into_new_workout(Uuid::nil()).unwrap().run_detail.is_none());

        let strength = request("strength").into_new_workout(Uuid::nil()).unwrap();
        assert!(strength.run_detail.is_none());
    }

    #[test]
    fn duration_and_rpe_are_bounded() {
        let mut zero = request("strength");
        zero.duration_min = 0;
        assert!(zero.into_new_workout(Uuid::nil()).is_err());

        let mut full_day = request("strength");
        full_day.duration_min = 1440;
        assert_eq!(full_day.into_new_workout(Uuid::nil()).unwrap().duration_min, 1440);

        for oversized in [1441, 3_000_000_000, i64::MAX] {
            let mut long = request("strength");
            long.duration_min = oversized;
            assert!(matches!(
                long.into_new_workout(Uuid::nil()),
                Err(ApiError::BadRequest(_))
            ));
        }

        let mut rpe = request("strength");
        rpe.rpe = Some(11);
        assert!(rpe.into_new_workout(Uuid::nil()).is_err());

        let mut swim = request("swim");
        swim.rpe = None;
        assert!(matches!(
            swim.into_new_workout(Uuid::nil()),
            Err(ApiError::Validation(_))
        ));
    }
}
