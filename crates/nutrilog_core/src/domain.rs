//! crates/nutrilog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

//=========================================================================================
// Closed Enumerations
//=========================================================================================

/// Declares a closed enum with its canonical lowercase spelling.
///
/// Every enum gets `as_str`, `Display` and a `FromStr` that rejects
/// anything outside the listed spellings.
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::InvalidValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

closed_enum!(
    /// Biological sex, used only by the BMR equation.
    Sex, "sex", {
        Male => "male",
        Female => "female",
    }
);

closed_enum!(
    /// Self-reported daily activity, mapped to a fixed TDEE multiplier.
    ActivityLevel, "activity_level", {
        Sedentary => "sedentary",
        Light => "light",
        Moderate => "moderate",
        Very => "very",
        Athlete => "athlete",
    }
);

closed_enum!(
    Goal, "goal", {
        Maintain => "maintain",
        Lose => "lose",
        Gain => "gain",
    }
);

closed_enum!(
    /// How aggressively to move toward a lose/gain goal.
    GoalRate, "goal_rate", {
        Slow => "slow",
        Medium => "medium",
        Fast => "fast",
    }
);

closed_enum!(
    MealType, "meal_type", {
        Breakfast => "breakfast",
        Lunch => "lunch",
        Dinner => "dinner",
        Snack => "snack",
    }
);

closed_enum!(
    WorkoutKind, "type", {
        Run => "run",
        Strength => "strength",
    }
);

closed_enum!(
    /// Where a food's nutrition values came from.
    FoodSource, "food_source", {
        Usda => "usda",
        Catalog => "catalog",
        Custom => "custom",
    }
);

//=========================================================================================
// Users and Auth
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Profile
//=========================================================================================

/// The body and activity profile of one user.
///
/// Every field is optional: a profile is created empty at signup and filled in
/// over time. Target computation only succeeds once the required fields are set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub sex: Option<Sex>,
    pub birthdate: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
    pub goal_rate: Option<GoalRate>,
}

/// A partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub sex: Option<Sex>,
    pub birthdate: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
    pub goal_rate: Option<GoalRate>,
}

impl Profile {
    pub fn apply(&mut self, update: ProfileUpdate) {
        if update.sex.is_some() {
            self.sex = update.sex;
        }
        if update.birthdate.is_some() {
            self.birthdate = update.birthdate;
        }
        if update.height_cm.is_some() {
            self.height_cm = update.height_cm;
        }
        if update.weight_kg.is_some() {
            self.weight_kg = update.weight_kg;
        }
        if update.activity_level.is_some() {
            self.activity_level = update.activity_level;
        }
        if update.goal.is_some() {
            self.goal = update.goal;
        }
        if update.goal_rate.is_some() {
            self.goal_rate = update.goal_rate;
        }
    }
}

//=========================================================================================
// Foods and Meals
//=========================================================================================

/// Nutrition values per 100 g of a food.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Per100g {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub sugar: Option<f64>,
    pub fiber: Option<f64>,
}

/// A candidate food returned by a lookup. Read-only reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodReference {
    pub source: FoodSource,
    pub external_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub per_100g: Per100g,
}

/// A user-defined food stored alongside the meals.
#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub brand: Option<String>,
    pub per_100g: Per100g,
}

/// Absolute nutrition values for a concrete quantity of food.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbsoluteMacros {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub sugar: Option<f64>,
    pub fiber: Option<f64>,
}

/// The frozen nutrition record of one meal item: the per-100g source values,
/// the quantity, and the resulting absolute values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroSnapshot {
    pub per_100g: Per100g,
    pub grams: f64,
    pub absolute: AbsoluteMacros,
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub user_id: Uuid,
    pub eaten_at: NaiveDateTime,
    pub meal_type: MealType,
    pub note: Option<String>,
}

/// The food identity recorded on a meal item next to its snapshot.
#[derive(Debug, Clone)]
pub struct LoggedFood {
    pub source: FoodSource,
    pub external_id: Option<String>,
    pub name: String,
    pub brand: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub eaten_at: NaiveDateTime,
    pub meal_type: MealType,
    pub note: Option<String>,
    pub items: Vec<MealItem>,
}

/// One food logged in a meal. Never modified after creation.
#[derive(Debug, Clone)]
pub struct MealItem {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub food: LoggedFood,
    pub snapshot: MacroSnapshot,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Workouts
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunDetail {
    pub distance_km: f64,
    pub avg_pace_sec_per_km: f64,
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub user_id: Uuid,
    pub started_at: NaiveDateTime,
    pub kind: WorkoutKind,
    pub duration_min: u32,
    pub rpe: Option<u8>,
    pub notes: Option<String>,
    pub run_detail: Option<RunDetail>,
}

#[derive(Debug, Clone)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: NaiveDateTime,
    pub kind: WorkoutKind,
    pub duration_min: u32,
    pub rpe: Option<u8>,
    pub notes: Option<String>,
    /// Only ever present on `run` workouts.
    pub run_detail: Option<RunDetail>,
}

//=========================================================================================
// Time Windows
//=========================================================================================

/// An inclusive range of naive local timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DayWindow {
    /// `[date 00:00:00.000, date 23:59:59.999]`
    pub fn for_date(date: NaiveDate) -> Self {
        Self::for_dates(date, date)
    }

    /// From the start of `from` to the last millisecond of `to`.
    pub fn for_dates(from: NaiveDate, to: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        Self {
            start: from.and_time(NaiveTime::MIN),
            end: to.and_time(end_of_day),
        }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_their_own_spelling() {
        for level in ActivityLevel::ALL {
            assert_eq!(level.as_str().parse::<ActivityLevel>().unwrap(), *level);
        }
        assert_eq!("snack".parse::<MealType>().unwrap(), MealType::Snack);
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let err = "extreme".parse::<ActivityLevel>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidValue { field: "activity_level", .. }));
        assert!("Male".parse::<Sex>().is_err());
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn day_window_covers_whole_day_inclusive() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let window = DayWindow::for_date(date);

        assert!(window.contains(date.and_hms_opt(0, 0, 0).unwrap()));
        assert!(window.contains(date.and_hms_milli_opt(23, 59, 59, 999).unwrap()));
        assert!(!window.contains(date.pred_opt().unwrap().and_hms_milli_opt(23, 59, 59, 999).unwrap()));
        assert!(!window.contains(date.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn profile_update_keeps_unset_fields() {
        let mut profile = Profile {
            weight_kg: Some(80.0),
            goal: Some(Goal::Maintain),
            ..Profile::default()
        };
        profile.apply(ProfileUpdate {
            goal: Some(Goal::Lose),
            ..ProfileUpdate::default()
        });

        assert_eq!(profile.weight_kg, Some(80.0));
        assert_eq!(profile.goal, Some(Goal::Lose));
    }
}
