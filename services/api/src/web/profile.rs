//! services/api/src/web/profile.rs
//!
//! Endpoints for the signed-in user: account info, body profile and the daily
//! targets derived from it.

use crate::error::ApiError;
use crate::web::{dates::local_today, state::AppState};
use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use nutrilog_core::{
    compute_targets, ActivityLevel, Goal, GoalRate, Profile, ProfileUpdate, Sex, Targets,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const HEIGHT_RANGE_CM: RangeInclusive<f64> = 100.0..=250.0;
const WEIGHT_RANGE_KG: RangeInclusive<f64> = 30.0..=300.0;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct MeProfileSummary {
    pub weight_kg: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub profile: Option<MeProfileSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(example = "male")]
    pub sex: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    #[schema(example = "moderate")]
    pub activity_level: Option<String>,
    #[schema(example = "lose")]
    pub goal: Option<String>,
    #[schema(example = "medium")]
    pub goal_rate: Option<String>,
}

impl From<&Profile> for ProfileResponse {
    fn from(p: &Profile) -> Self {
        Self {
            sex: p.sex.map(|v| v.to_string()),
            birthdate: p.birthdate,
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            activity_level: p.activity_level.map(|v| v.to_string()),
            goal: p.goal.map(|v| v.to_string()),
            goal_rate: p.goal_rate.map(|v| v.to_string()),
        }
    }
}

/// A partial profile update. Absent fields keep their stored value.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateProfileRequest {
    #[schema(example = "female")]
    pub sex: Option<String>,
    #[schema(example = "1990-05-15")]
    pub birthdate: Option<String>,
    #[schema(example = 175.0, minimum = 100, maximum = 250)]
    pub height_cm: Option<f64>,
    #[schema(example = 70.0, minimum = 30, maximum = 300)]
    pub weight_kg: Option<f64>,
    #[schema(example = "moderate")]
    pub activity_level: Option<String>,
    #[schema(example = "maintain")]
    pub goal: Option<String>,
    #[schema(example = "medium")]
    pub goal_rate: Option<String>,
}

fn check_range(field: &str, value: f64, range: &RangeInclusive<f64>) -> Result<f64, ApiError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!(
            "{} must be between {} and {}",
            field,
            range.start(),
            range.end()
        )))
    }
}

impl UpdateProfileRequest {
    pub fn into_update(self) -> Result<ProfileUpdate, ApiError> {
        Ok(ProfileUpdate {
            sex: self.sex.as_deref().map(str::parse::<Sex>).transpose()?,
            birthdate: self
                .birthdate
                .as_deref()
                .map(|raw| crate::web::dates::parse_date("birthdate", raw))
                .transpose()?,
            height_cm: self
                .height_cm
                .map(|v| check_range("height_cm", v, &HEIGHT_RANGE_CM))
                .transpose()?,
            weight_kg: self
                .weight_kg
                .map(|v| check_range("weight_kg", v, &WEIGHT_RANGE_KG))
                .transpose()?,
            activity_level: self
                .activity_level
                .as_deref()
                .map(str::parse::<ActivityLevel>)
                .transpose()?,
            goal: self.goal.as_deref().map(str::parse::<Goal>).transpose()?,
            goal_rate: self
                .goal_rate
                .as_deref()
                .map(str::parse::<GoalRate>)
                .transpose()?,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct TargetsResponse {
    pub bmr: i32,
    pub tdee: i32,
    pub target_calories: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub sugar_target_g: i32,
    pub fiber_target_g: i32,
}

impl From<Targets> for TargetsResponse {
    fn from(t: Targets) -> Self {
        Self {
            bmr: t.bmr,
            tdee: t.tdee,
            target_calories: t.target_calories,
            protein_g: t.protein_g,
            carbs_g: t.carbs_g,
            fat_g: t.fat_g,
            sugar_target_g: t.sugar_target_g,
            fiber_target_g: t.fiber_target_g,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /me - The signed-in account
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Account details", body = MeResponse),
        (status = 401, description = "Not signed in")
    ),
    tag = "me"
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state.users.get_user_by_id(user_id).await?;
    let profile = state.profiles.get_profile(user_id).await?;

    Ok(Json(MeResponse {
        id: user.user_id,
        email: user.email,
        created_at: user.created_at,
        profile: profile.map(|p| MeProfileSummary {
            weight_kg: p.weight_kg,
        }),
    }))
}

/// GET /me/profile - The stored body profile
#[utoipa::path(
    get,
    path = "/me/profile",
    responses(
        (status = 200, description = "Profile, with unset fields as null", body = ProfileResponse),
        (status = 401, description = "Not signed in")
    ),
    tag = "me"
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.profiles.get_profile(user_id).await?.unwrap_or_default();
    Ok(Json(ProfileResponse::from(&profile)))
}

/// PUT /me/profile - Partially update the body profile
#[utoipa::path(
    put,
    path = "/me/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "A field is out of range or not a known value"),
        (status = 401, description = "Not signed in")
    ),
    tag = "me"
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let update = req.into_update()?;

    let mut profile = state.profiles.get_profile(user_id).await?.unwrap_or_default();
    profile.apply(update);
    let saved = state.profiles.save_profile(user_id, &profile).await?;

    Ok(Json(ProfileResponse::from(&saved)))
}

/// GET /me/targets - Daily targets as of today
#[utoipa::path(
    get,
    path = "/me/targets",
    responses(
        (status = 200, description = "Computed targets, or null while the profile is incomplete", body = Option<TargetsResponse>),
        (status = 401, description = "Not signed in")
    ),
    tag = "me"
)]
pub async fn targets_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Option<TargetsResponse>>, ApiError> {
    let profile = state.profiles.get_profile(user_id).await?;
    let targets = profile.and_then(|p| compute_targets(&p, local_today()));
    Ok(Json(targets.map(TargetsResponse::from)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_rejects_out_of_range_and_unknown_values() {
        let too_short = UpdateProfileRequest {
            height_cm: Some(99.0),
            ..Default::default()
        };
        assert!(too_short.into_update().is_err());

        let unknown_goal = UpdateProfileRequest {
            goal: Some("bulk".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            unknown_goal.into_update(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn update_accepts_range_edges() {
        let update = UpdateProfileRequest {
            height_cm: Some(250.0),
            weight_kg: Some(30.0),
            sex: Some("female".to_string()),
            ..Default::default()
        }
        .into_update()
        .unwrap();

        assert_eq!(update.height_cm, Some(250.0));
        assert_eq!(update.weight_kg, Some(30.0));
        assert_eq!(update.sex, Some(Sex::Female));
        assert_eq!(update.goal, None);
    }
}
