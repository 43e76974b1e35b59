//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of every repository port. Used when no
//! `DATABASE_URL` is configured and by the integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nutrilog_core::catalog::{matches_query, query_terms};
use nutrilog_core::domain::{
    DayWindow, FoodReference, FoodSource, LoggedFood, MacroSnapshot, Meal, MealItem, NewFood,
    NewMeal, NewWorkout, Profile, User, UserCredentials, Workout,
};
use nutrilog_core::ports::{
    FoodRepository, MealRepository, PortError, PortResult, ProfileRepository, UserRepository,
    WorkoutRepository,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, (User, String)>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    profiles: HashMap<Uuid, Profile>,
    meals: HashMap<Uuid, Meal>,
    workouts: Vec<Workout>,
    foods: Vec<FoodReference>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|(user, _)| user.email == email) {
            return Err(PortError::Conflict(format!(
                "Email {} is already registered",
                email
            )));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(user.user_id, (user.clone(), hashed_password.to_string()));
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|(user, _)| user.email == email)
            .map(|(user, hash)| UserCredentials {
                user_id: user.user_id,
                email: user.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .map(|(user, _)| user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.tables
            .write()
            .await
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let tables = self.tables.read().await;
        match tables.auth_sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.auth_sessions.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn save_profile(&self, user_id: Uuid, profile: &Profile) -> PortResult<Profile> {
        self.tables
            .write()
            .await
            .profiles
            .insert(user_id, profile.clone());
        Ok(profile.clone())
    }
}

#[async_trait]
impl MealRepository for InMemoryStore {
    async fn create_meal(&self, meal: NewMeal) -> PortResult<Meal> {
        let meal = Meal {
            id: Uuid::new_v4(),
            user_id: meal.user_id,
            eaten_at: meal.eaten_at,
            meal_type: meal.meal_type,
            note: meal.note,
            items: Vec::new(),
        };
        self.tables.write().await.meals.insert(meal.id, meal.clone());
        Ok(meal)
    }

    async fn get_meal(&self, meal_id: Uuid) -> PortResult<Meal> {
        self.tables
            .read()
            .await
            .meals
            .get(&meal_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Meal {} not found", meal_id)))
    }

    async fn add_meal_item(
        &self,
        meal_id: Uuid,
        food: LoggedFood,
        snapshot: MacroSnapshot,
    ) -> PortResult<MealItem> {
        let mut tables = self.tables.write().await;
        let meal = tables
            .meals
            .get_mut(&meal_id)
            .ok_or_else(|| PortError::NotFound(format!("Meal {} not found", meal_id)))?;
        let item = MealItem {
            id: Uuid::new_v4(),
            meal_id,
            food,
            snapshot,
            created_at: Utc::now(),
        };
        meal.items.push(item.clone());
        Ok(item)
    }

    async fn list_meals_between(&self, user_id: Uuid, window: DayWindow) -> PortResult<Vec<Meal>> {
        let tables = self.tables.read().await;
        let mut meals: Vec<Meal> = tables
            .meals
            .values()
            .filter(|m| m.user_id == user_id && window.contains(m.eaten_at))
            .cloned()
            .collect();
        meals.sort_by_key(|m| m.eaten_at);
        Ok(meals)
    }

    async fn delete_meal(&self, meal_id: Uuid) -> PortResult<()> {
        self.tables
            .write()
            .await
            .meals
            .remove(&meal_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Meal {} not found", meal_id)))
    }
}

#[async_trait]
impl WorkoutRepository for InMemoryStore {
    async fn create_workout(&self, workout: NewWorkout) -> PortResult<Workout> {
        let workout = Workout {
            id: Uuid::new_v4(),
            user_id: workout.user_id,
            started_at: workout.started_at,
            kind: workout.kind,
            duration_min: workout.duration_min,
            rpe: workout.rpe,
            notes: workout.notes,
            run_detail: workout.run_detail,
        };
        self.tables.write().await.workouts.push(workout.clone());
        Ok(workout)
    }

    async fn list_workouts_between(
        &self,
        user_id: Uuid,
        window: DayWindow,
    ) -> PortResult<Vec<Workout>> {
        let tables = self.tables.read().await;
        let mut workouts: Vec<Workout> = tables
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id && window.contains(w.started_at))
            .cloned()
            .collect();
        workouts.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(workouts)
    }
}

#[async_trait]
impl FoodRepository for InMemoryStore {
    async fn create_custom_food(&self, food: NewFood) -> PortResult<FoodReference> {
        let food = FoodReference {
            source: FoodSource::Custom,
            external_id: Uuid::new_v4().to_string(),
            name: food.name,
            brand: food.brand,
            per_100g: food.per_100g,
        };
        self.tables.write().await.foods.push(food.clone());
        Ok(food)
    }

    async fn search_custom_foods(&self, query: &str, limit: usize) -> PortResult<Vec<FoodReference>> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.tables.read().await;
        let mut hits: Vec<FoodReference> = tables
            .foods
            .iter()
            .filter(|food| matches_query(food, &terms))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits.truncate(limit);
        Ok(hits)
    }
}
