pub mod catalog;
pub mod domain;
pub mod error;
pub mod ports;
pub mod snapshot;
pub mod stats;
pub mod targets;

pub use catalog::FoodCatalog;
pub use domain::{
    ActivityLevel, AuthSession, DayWindow, FoodReference, FoodSource, Goal, GoalRate, LoggedFood,
    MacroSnapshot, Meal, MealItem, MealType, NewFood, NewMeal, NewWorkout, Per100g, Profile,
    ProfileUpdate, RunDetail, Sex, User, UserCredentials, Workout, WorkoutKind,
};
pub use error::CoreError;
pub use ports::{
    CatalogLoader, FoodLookupService, FoodRepository, MealRepository, PortError, PortResult,
    ProfileRepository, UserRepository, WorkoutRepository,
};
pub use snapshot::snapshot_meal_item;
pub use stats::{DayStats, NutritionTotals, StatsService, WeekDay, WeekStats, WorkoutTotals};
pub use targets::{compute_targets, Targets};
