//! crates/nutrilog_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    DayWindow, FoodReference, LoggedFood, MacroSnapshot, Meal, MealItem, NewFood, NewMeal,
    NewWorkout, Profile, User, UserCredentials, Workout,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Access denied: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream service failed: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports
//=========================================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `PortError::Conflict` when the email is already registered.
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user, or `PortError::Unauthorized` if the session is
    /// unknown or expired.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// `Ok(None)` when the user has no profile row at all.
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>>;

    async fn save_profile(&self, user_id: Uuid, profile: &Profile) -> PortResult<Profile>;
}

#[async_trait]
pub trait MealRepository: Send + Sync {
    async fn create_meal(&self, meal: NewMeal) -> PortResult<Meal>;

    /// Returns the meal with its items.
    async fn get_meal(&self, meal_id: Uuid) -> PortResult<Meal>;

    async fn add_meal_item(
        &self,
        meal_id: Uuid,
        food: LoggedFood,
        snapshot: MacroSnapshot,
    ) -> PortResult<MealItem>;

    /// Meals (with items) whose `eaten_at` falls inside `window`, oldest first.
    async fn list_meals_between(&self, user_id: Uuid, window: DayWindow) -> PortResult<Vec<Meal>>;

    /// Deletes the meal and all of its items.
    async fn delete_meal(&self, meal_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    async fn create_workout(&self, workout: NewWorkout) -> PortResult<Workout>;

    /// Workouts whose `started_at` falls inside `window`, newest first.
    async fn list_workouts_between(
        &self,
        user_id: Uuid,
        window: DayWindow,
    ) -> PortResult<Vec<Workout>>;
}

#[async_trait]
pub trait FoodRepository: Send + Sync {
    async fn create_custom_food(&self, food: NewFood) -> PortResult<FoodReference>;

    async fn search_custom_foods(&self, query: &str, limit: usize) -> PortResult<Vec<FoodReference>>;
}

//=========================================================================================
// Food Lookup Ports
//=========================================================================================

#[async_trait]
pub trait FoodLookupService: Send + Sync {
    /// Returns at most `limit` candidate foods matching `query`.
    async fn search(&self, query: &str, limit: usize) -> PortResult<Vec<FoodReference>>;
}

#[async_trait]
pub trait CatalogLoader: Send + Sync {
    /// Loads the whole local food catalog.
    async fn load(&self) -> PortResult<Vec<FoodReference>>;
}
