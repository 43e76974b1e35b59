//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! repository ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use nutrilog_core::domain::{
    AbsoluteMacros, DayWindow, FoodReference, FoodSource, LoggedFood, MacroSnapshot, Meal,
    MealItem, NewFood, NewMeal, NewWorkout, Per100g, Profile, RunDetail, User, UserCredentials,
    Workout,
};
use nutrilog_core::ports::{
    FoodRepository, MealRepository, PortError, PortResult, ProfileRepository, UserRepository,
    WorkoutRepository,
};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the repository ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Parses a stored enum column. The schema's CHECK constraints make a failure
/// here a data-corruption case.
fn parse_column<T: FromStr>(value: &str) -> PortResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| PortError::Unexpected(format!("Corrupt column value: {}", e)))
}

fn parse_optional<T: FromStr>(value: Option<String>) -> PortResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    value.as_deref().map(parse_column).transpose()
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.id,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}

#[derive(FromRow)]
struct ProfileRecord {
    sex: Option<String>,
    birthdate: Option<NaiveDate>,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    activity_level: Option<String>,
    goal: Option<String>,
    goal_rate: Option<String>,
}
impl ProfileRecord {
    fn to_domain(self) -> PortResult<Profile> {
        Ok(Profile {
            sex: parse_optional(self.sex)?,
            birthdate: self.birthdate,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            activity_level: parse_optional(self.activity_level)?,
            goal: parse_optional(self.goal)?,
            goal_rate: parse_optional(self.goal_rate)?,
        })
    }
}

#[derive(FromRow)]
struct FoodRecord {
    id: Uuid,
    name: String,
    brand: Option<String>,
    kcal_100g: f64,
    protein_100g: f64,
    carbs_100g: f64,
    fat_100g: f64,
    sugar_100g: Option<f64>,
    fiber_100g: Option<f64>,
}
impl FoodRecord {
    fn to_domain(self) -> FoodReference {
        FoodReference {
            source: FoodSource::Custom,
            external_id: self.id.to_string(),
            name: self.name,
            brand: self.brand,
            per_100g: Per100g {
                kcal: self.kcal_100g,
                protein: self.protein_100g,
                carbs: self.carbs_100g,
                fat: self.fat_100g,
                sugar: self.sugar_100g,
                fiber: self.fiber_100g,
            },
        }
    }
}

#[derive(FromRow)]
struct MealRecord {
    id: Uuid,
    user_id: Uuid,
    eaten_at: NaiveDateTime,
    meal_type: String,
    note: Option<String>,
}
impl MealRecord {
    fn to_domain(self, items: Vec<MealItem>) -> PortResult<Meal> {
        Ok(Meal {
            id: self.id,
            user_id: self.user_id,
            eaten_at: self.eaten_at,
            meal_type: parse_column(&self.meal_type)?,
            note: self.note,
            items,
        })
    }
}

#[derive(FromRow)]
struct MealItemRecord {
    id: Uuid,
    meal_id: Uuid,
    food_source: String,
    external_food_id: Option<String>,
    food_name: String,
    food_brand: Option<String>,
    kcal_100g: f64,
    protein_100g: f64,
    carbs_100g: f64,
    fat_100g: f64,
    sugar_100g: Option<f64>,
    fiber_100g: Option<f64>,
    grams: f64,
    kcal: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    sugar: Option<f64>,
    fiber: Option<f64>,
    created_at: DateTime<Utc>,
}
impl MealItemRecord {
    fn to_domain(self) -> PortResult<MealItem> {
        Ok(MealItem {
            id: self.id,
            meal_id: self.meal_id,
            food: LoggedFood {
                source: parse_column(&self.food_source)?,
                external_id: self.external_food_id,
                name: self.food_name,
                brand: self.food_brand,
            },
            snapshot: MacroSnapshot {
                per_100g: Per100g {
                    kcal: self.kcal_100g,
                    protein: self.protein_100g,
                    carbs: self.carbs_100g,
                    fat: self.fat_100g,
                    sugar: self.sugar_100g,
                    fiber: self.fiber_100g,
                },
                grams: self.grams,
                absolute: AbsoluteMacros {
                    kcal: self.kcal,
                    protein: self.protein,
                    carbs: self.carbs,
                    fat: self.fat,
                    sugar: self.sugar,
                    fiber: self.fiber,
                },
            },
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct WorkoutRecord {
    id: Uuid,
    user_id: Uuid,
    started_at: NaiveDateTime,
    #[sqlx(rename = "type")]
    kind: String,
    duration_min: i32,
    rpe: Option<i16>,
    notes: Option<String>,
    distance_km: Option<f64>,
    avg_pace_sec_km: Option<f64>,
}
impl WorkoutRecord {
    fn to_domain(self) -> PortResult<Workout> {
        let run_detail = match (self.distance_km, self.avg_pace_sec_km) {
            (Some(distance_km), Some(avg_pace_sec_per_km)) => Some(RunDetail {
                distance_km,
                avg_pace_sec_per_km,
            }),
            _ => None,
        };
        Ok(Workout {
            id: self.id,
            user_id: self.user_id,
            started_at: self.started_at,
            kind: parse_column(&self.kind)?,
            duration_min: u32::try_from(self.duration_min).unwrap_or(0),
            rpe: self.rpe.map(|r| r.clamp(0, 255) as u8),
            notes: self.notes,
            run_detail,
        })
    }
}

const MEAL_ITEM_COLUMNS: &str = "id, meal_id, food_source, external_food_id, food_name, food_brand, \
     kcal_100g, protein_100g, carbs_100g, fat_100g, sugar_100g, fiber_100g, grams, \
     kcal, protein, carbs, fat, sugar, fiber, created_at";

const WORKOUT_SELECT: &str = "SELECT w.id, w.user_id, w.started_at, w.type, w.duration_min, w.rpe, \
     w.notes, r.distance_km, r.avg_pace_sec_km \
     FROM workouts w LEFT JOIN run_details r ON r.workout_id = w.id";

impl DbAdapter {
    async fn items_for_meals(&self, meal_ids: &[Uuid]) -> PortResult<HashMap<Uuid, Vec<MealItem>>> {
        let records = sqlx::query_as::<_, MealItemRecord>(&format!(
            "SELECT {} FROM meal_items WHERE meal_id = ANY($1) ORDER BY created_at ASC",
            MEAL_ITEM_COLUMNS
        ))
        .bind(meal_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut by_meal: HashMap<Uuid, Vec<MealItem>> = HashMap::new();
        for record in records {
            let item = record.to_domain()?;
            by_meal.entry(item.meal_id).or_default().push(item);
        }
        Ok(by_meal)
    }

    async fn get_workout(&self, workout_id: Uuid) -> PortResult<Workout> {
        sqlx::query_as::<_, WorkoutRecord>(&format!("{} WHERE w.id = $1", WORKOUT_SELECT))
            .bind(workout_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Workout {} not found", workout_id))
                }
                _ => unexpected(e),
            })?
            .to_domain()
    }
}

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for DbAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return PortError::Conflict(format!("Email {} is already registered", email));
                }
            }
            unexpected(e)
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(UserCredentials {
            user_id: record.id,
            email: record.email,
            hashed_password: record.password_hash,
        })
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `ProfileRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileRepository for DbAdapter {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT sex, birthdate, height_cm, weight_kg, activity_level, goal, goal_rate \
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(ProfileRecord::to_domain).transpose()
    }

    async fn save_profile(&self, user_id: Uuid, profile: &Profile) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "INSERT INTO profiles \
                 (user_id, sex, birthdate, height_cm, weight_kg, activity_level, goal, goal_rate) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 sex = EXCLUDED.sex, birthdate = EXCLUDED.birthdate, \
                 height_cm = EXCLUDED.height_cm, weight_kg = EXCLUDED.weight_kg, \
                 activity_level = EXCLUDED.activity_level, goal = EXCLUDED.goal, \
                 goal_rate = EXCLUDED.goal_rate, updated_at = NOW() \
             RETURNING sex, birthdate, height_cm, weight_kg, activity_level, goal, goal_rate",
        )
        .bind(user_id)
        .bind(profile.sex.map(|v| v.as_str()))
        .bind(profile.birthdate)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.activity_level.map(|v| v.as_str()))
        .bind(profile.goal.map(|v| v.as_str()))
        .bind(profile.goal_rate.map(|v| v.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }
}

//=========================================================================================
// `MealRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl MealRepository for DbAdapter {
    async fn create_meal(&self, meal: NewMeal) -> PortResult<Meal> {
        let record = sqlx::query_as::<_, MealRecord>(
            "INSERT INTO meals (id, user_id, eaten_at, meal_type, note) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, eaten_at, meal_type, note",
        )
        .bind(Uuid::new_v4())
        .bind(meal.user_id)
        .bind(meal.eaten_at)
        .bind(meal.meal_type.as_str())
        .bind(meal.note)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain(Vec::new())
    }

    async fn get_meal(&self, meal_id: Uuid) -> PortResult<Meal> {
        let record = sqlx::query_as::<_, MealRecord>(
            "SELECT id, user_id, eaten_at, meal_type, note FROM meals WHERE id = $1",
        )
        .bind(meal_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Meal {} not found", meal_id)),
            _ => unexpected(e),
        })?;
        let items = self
            .items_for_meals(&[meal_id])
            .await?
            .remove(&meal_id)
            .unwrap_or_default();
        record.to_domain(items)
    }

    async fn add_meal_item(
        &self,
        meal_id: Uuid,
        food: LoggedFood,
        snapshot: MacroSnapshot,
    ) -> PortResult<MealItem> {
        let per = snapshot.per_100g;
        let abs = snapshot.absolute;
        let record = sqlx::query_as::<_, MealItemRecord>(&format!(
            "INSERT INTO meal_items (id, meal_id, food_source, external_food_id, food_name, \
                 food_brand, kcal_100g, protein_100g, carbs_100g, fat_100g, sugar_100g, fiber_100g, \
                 grams, kcal, protein, carbs, fat, sugar, fiber) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             RETURNING {}",
            MEAL_ITEM_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(meal_id)
        .bind(food.source.as_str())
        .bind(food.external_id)
        .bind(food.name)
        .bind(food.brand)
        .bind(per.kcal)
        .bind(per.protein)
        .bind(per.carbs)
        .bind(per.fat)
        .bind(per.sugar)
        .bind(per.fiber)
        .bind(snapshot.grams)
        .bind(abs.kcal)
        .bind(abs.protein)
        .bind(abs.carbs)
        .bind(abs.fat)
        .bind(abs.sugar)
        .bind(abs.fiber)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_foreign_key_violation() {
                    return PortError::NotFound(format!("Meal {} not found", meal_id));
                }
            }
            unexpected(e)
        })?;
        record.to_domain()
    }

    async fn list_meals_between(&self, user_id: Uuid, window: DayWindow) -> PortResult<Vec<Meal>> {
        let records = sqlx::query_as::<_, MealRecord>(
            "SELECT id, user_id, eaten_at, meal_type, note FROM meals \
             WHERE user_id = $1 AND eaten_at >= $2 AND eaten_at <= $3 \
             ORDER BY eaten_at ASC",
        )
        .bind(user_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut items = self.items_for_meals(&ids).await?;
        records
            .into_iter()
            .map(|r| {
                let meal_items = items.remove(&r.id).unwrap_or_default();
                r.to_domain(meal_items)
            })
            .collect()
    }

    async fn delete_meal(&self, meal_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM meals WHERE id = $1")
            .bind(meal_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Meal {} not found", meal_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `WorkoutRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl WorkoutRepository for DbAdapter {
    async fn create_workout(&self, workout: NewWorkout) -> PortResult<Workout> {
        let workout_id = Uuid::new_v4();
        let duration_min = i32::try_from(workout.duration_min).map_err(|_| {
            PortError::Unexpected(format!(
                "duration_min {} does not fit the workouts table",
                workout.duration_min
            ))
        })?;
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO workouts (id, user_id, started_at, type, duration_min, rpe, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(workout_id)
        .bind(workout.user_id)
        .bind(workout.started_at)
        .bind(workout.kind.as_str())
        .bind(duration_min)
        .bind(workout.rpe.map(i16::from))
        .bind(workout.notes)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        if let Some(run) = workout.run_detail {
            sqlx::query(
                "INSERT INTO run_details (workout_id, distance_km, avg_pace_sec_km) \
                 VALUES ($1, $2, $3)",
            )
            .bind(workout_id)
            .bind(run.distance_km)
            .bind(run.avg_pace_sec_per_km)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        self.get_workout(workout_id).await
    }

    async fn list_workouts_between(
        &self,
        user_id: Uuid,
        window: DayWindow,
    ) -> PortResult<Vec<Workout>> {
        sqlx::query_as::<_, WorkoutRecord>(&format!(
            "{} WHERE w.user_id = $1 AND w.started_at >= $2 AND w.started_at <= $3 \
             ORDER BY w.started_at DESC",
            WORKOUT_SELECT
        ))
        .bind(user_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?
        .into_iter()
        .map(WorkoutRecord::to_domain)
        .collect()
    }
}

//=========================================================================================
// `FoodRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl FoodRepository for DbAdapter {
    async fn create_custom_food(&self, food: NewFood) -> PortResult<FoodReference> {
        let per = food.per_100g;
        let record = sqlx::query_as::<_, FoodRecord>(
            "INSERT INTO foods (id, name, brand, kcal_100g, protein_100g, carbs_100g, fat_100g, \
                 sugar_100g, fiber_100g) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, name, brand, kcal_100g, protein_100g, carbs_100g, fat_100g, \
                 sugar_100g, fiber_100g",
        )
        .bind(Uuid::new_v4())
        .bind(food.name)
        .bind(food.brand)
        .bind(per.kcal)
        .bind(per.protein)
        .bind(per.carbs)
        .bind(per.fat)
        .bind(per.sugar)
        .bind(per.fiber)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn search_custom_foods(&self, query: &str, limit: usize) -> PortResult<Vec<FoodReference>> {
        let patterns: Vec<String> = query
            .split_whitespace()
            .map(|term| format!("%{}%", escape_like(&term.to_lowercase())))
            .collect();
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let records = sqlx::query_as::<_, FoodRecord>(
            "SELECT id, name, brand, kcal_100g, protein_100g, carbs_100g, fat_100g, \
                 sugar_100g, fiber_100g \
             FROM foods WHERE lower(name) LIKE ALL($1) ORDER BY name ASC LIMIT $2",
        )
        .bind(&patterns)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(FoodRecord::to_domain).collect())
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
