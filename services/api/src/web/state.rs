//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use nutrilog_core::ports::{
    FoodLookupService, FoodRepository, MealRepository, ProfileRepository, UserRepository,
    WorkoutRepository,
};
use nutrilog_core::{FoodCatalog, StatsService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub meals: Arc<dyn MealRepository>,
    pub workouts: Arc<dyn WorkoutRepository>,
    pub foods: Arc<dyn FoodRepository>,
    pub usda: Arc<dyn FoodLookupService>,
    pub catalog: Arc<FoodCatalog>,
    pub stats: StatsService,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires every repository port to one store (the database adapter or the
    /// in-memory store).
    pub fn with_store<S>(
        store: Arc<S>,
        usda: Arc<dyn FoodLookupService>,
        catalog: Arc<FoodCatalog>,
        config: Arc<Config>,
    ) -> Self
    where
        S: UserRepository
            + ProfileRepository
            + MealRepository
            + WorkoutRepository
            + FoodRepository
            + 'static,
    {
        let profiles: Arc<dyn ProfileRepository> = store.clone();
        let meals: Arc<dyn MealRepository> = store.clone();
        let workouts: Arc<dyn WorkoutRepository> = store.clone();

        Self {
            users: store.clone(),
            stats: StatsService::new(profiles.clone(), meals.clone(), workouts.clone()),
            profiles,
            meals,
            workouts,
            foods: store,
            usda,
            catalog,
            config,
        }
    }
}
