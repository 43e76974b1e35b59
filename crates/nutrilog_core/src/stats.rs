//! crates/nutrilog_core/src/stats.rs
//!
//! Daily and weekly nutrition/exercise aggregation.
//!
//! The fold functions are pure; `StatsService` fetches the inputs through the
//! repository ports and hands them to the folds.

use chrono::{Duration, NaiveDate};
use futures::future::try_join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{DayWindow, Meal, Profile, Workout, WorkoutKind};
use crate::ports::{MealRepository, PortResult, ProfileRepository, WorkoutRepository};
use crate::targets::{compute_targets, Targets};

/// Body weight assumed for burn estimates when the profile has none.
pub const DEFAULT_BODY_WEIGHT_KG: f64 = 70.0;

/// MET-style multiplier for strength sessions, kcal per kg per hour.
const STRENGTH_KCAL_PER_KG_HOUR: f64 = 6.0;

/// Running cost, kcal per kg per km.
const RUN_KCAL_PER_KG_KM: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NutritionTotals {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub sugar: f64,
    pub fiber: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkoutTotals {
    pub count: usize,
    pub total_duration_min: u64,
    pub total_burn_kcal: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayStats {
    pub date: NaiveDate,
    pub nutrition: NutritionTotals,
    pub workouts: WorkoutTotals,
    pub targets: Option<Targets>,
}

/// One entry of the weekly chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub kcal: f64,
    pub total_burn_kcal: i64,
    pub total_duration_min: u64,
    pub target_calories: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekStats {
    /// Seven days, oldest first, ending on the reference date.
    pub days: Vec<WeekDay>,
    pub target_calories: Option<i32>,
}

//=========================================================================================
// Pure Folds
//=========================================================================================

/// Sums the item snapshots of `meals`. Absent sugar/fiber count as zero.
pub fn summarize_meals<'a>(meals: impl IntoIterator<Item = &'a Meal>) -> NutritionTotals {
    meals
        .into_iter()
        .flat_map(|meal| meal.items.iter())
        .fold(NutritionTotals::default(), |mut acc, item| {
            let abs = &item.snapshot.absolute;
            acc.kcal += abs.kcal;
            acc.protein += abs.protein;
            acc.carbs += abs.carbs;
            acc.fat += abs.fat;
            acc.sugar += abs.sugar.unwrap_or(0.0);
            acc.fiber += abs.fiber.unwrap_or(0.0);
            acc
        })
}

/// Estimated kcal burned by one workout, unrounded.
///
/// Runs without a distance record contribute nothing.
pub fn workout_burn_kcal(workout: &Workout, body_weight_kg: f64) -> f64 {
    match workout.kind {
        WorkoutKind::Run => workout
            .run_detail
            .map(|run| RUN_KCAL_PER_KG_KM * body_weight_kg * run.distance_km)
            .unwrap_or(0.0),
        WorkoutKind::Strength => {
            STRENGTH_KCAL_PER_KG_HOUR * body_weight_kg * (f64::from(workout.duration_min) / 60.0)
        }
    }
}

pub fn estimate_burn_kcal<'a>(
    workouts: impl IntoIterator<Item = &'a Workout>,
    body_weight_kg: f64,
) -> f64 {
    workouts
        .into_iter()
        .map(|w| workout_burn_kcal(w, body_weight_kg))
        .sum()
}

/// Builds the stats of `date` from already fetched rows.
///
/// Meals and workouts outside the day are ignored, so callers may pass a wider
/// selection. `targets` come from the current profile and are attached as-is,
/// whatever `date` is.
pub fn summarize_day(
    date: NaiveDate,
    meals: &[Meal],
    workouts: &[Workout],
    profile: Option<&Profile>,
    targets: Option<Targets>,
) -> DayStats {
    let window = DayWindow::for_date(date);
    let nutrition = summarize_meals(meals.iter().filter(|m| window.contains(m.eaten_at)));

    let in_day: Vec<&Workout> = workouts
        .iter()
        .filter(|w| window.contains(w.started_at))
        .collect();
    let body_weight_kg = profile
        .and_then(|p| p.weight_kg)
        .unwrap_or(DEFAULT_BODY_WEIGHT_KG);

    let workouts = WorkoutTotals {
        count: in_day.len(),
        total_duration_min: in_day.iter().map(|w| u64::from(w.duration_min)).sum(),
        total_burn_kcal: estimate_burn_kcal(in_day.iter().copied(), body_weight_kg).round() as i64,
    };

    DayStats {
        date,
        nutrition,
        workouts,
        targets,
    }
}

/// The seven dates ending at `reference`, oldest first.
pub fn week_dates(reference: NaiveDate) -> Vec<NaiveDate> {
    (0..7)
        .rev()
        .map(|offset| reference - Duration::days(offset))
        .collect()
}

/// Collapses seven day summaries into the weekly chart. Days without targets
/// fall back to the reference day's target.
pub fn summarize_week(reference: NaiveDate, days: &[DayStats]) -> WeekStats {
    let reference_target = days
        .iter()
        .find(|d| d.date == reference)
        .and_then(|d| d.targets)
        .map(|t| t.target_calories);

    let days = days
        .iter()
        .map(|day| WeekDay {
            date: day.date,
            kcal: day.nutrition.kcal,
            total_burn_kcal: day.workouts.total_burn_kcal,
            total_duration_min: day.workouts.total_duration_min,
            target_calories: day
                .targets
                .map(|t| t.target_calories)
                .or(reference_target),
        })
        .collect();

    WeekStats {
        days,
        target_calories: reference_target,
    }
}

//=========================================================================================
// Stats Service
//=========================================================================================

/// Reads a user's data through the ports and aggregates it.
#[derive(Clone)]
pub struct StatsService {
    profiles: Arc<dyn ProfileRepository>,
    meals: Arc<dyn MealRepository>,
    workouts: Arc<dyn WorkoutRepository>,
}

impl StatsService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        meals: Arc<dyn MealRepository>,
        workouts: Arc<dyn WorkoutRepository>,
    ) -> Self {
        Self {
            profiles,
            meals,
            workouts,
        }
    }

    /// Nutrition, exercise and targets for one calendar day.
    ///
    /// Targets use the age as of `today`, not as of `date`.
    pub async fn day_stats(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        today: NaiveDate,
    ) -> PortResult<DayStats> {
        let profile = self.profiles.get_profile(user_id).await?;
        let targets = profile.as_ref().and_then(|p| compute_targets(p, today));
        self.day_stats_with_profile(user_id, date, profile.as_ref(), targets)
            .await
    }

    /// The seven days ending at `reference`, oldest first.
    ///
    /// The profile is read and the targets computed once; the per-day reads
    /// run concurrently.
    pub async fn week_stats(
        &self,
        user_id: Uuid,
        reference: NaiveDate,
        today: NaiveDate,
    ) -> PortResult<WeekStats> {
        let profile = self.profiles.get_profile(user_id).await?;
        let targets = profile.as_ref().and_then(|p| compute_targets(p, today));
        let days = try_join_all(week_dates(reference).into_iter().map(|date| {
            self.day_stats_with_profile(user_id, date, profile.as_ref(), targets)
        }))
        .await?;
        Ok(summarize_week(reference, &days))
    }

    async fn day_stats_with_profile(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        profile: Option<&Profile>,
        targets: Option<Targets>,
    ) -> PortResult<DayStats> {
        let window = DayWindow::for_date(date);
        let meals = self.meals.list_meals_between(user_id, window).await?;
        let workouts = self.workouts.list_workouts_between(user_id, window).await?;
        Ok(summarize_day(date, &meals, &workouts, profile, targets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ActivityLevel, FoodSource, Goal, LoggedFood, MacroSnapshot, MealItem, MealType, Per100g,
        RunDetail, Sex,
    };
    use crate::snapshot::snapshot_meal_item;
    use chrono::{NaiveDateTime, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn at(d: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        d.and_hms_opt(h, m, 0).unwrap()
    }

    fn item(snapshot: MacroSnapshot) -> MealItem {
        MealItem {
            id: Uuid::new_v4(),
            meal_id: Uuid::nil(),
            food: LoggedFood {
                source: FoodSource::Custom,
                external_id: None,
                name: "test".to_string(),
                brand: None,
            },
            snapshot,
            created_at: Utc::now(),
        }
    }

    fn meal(eaten_at: NaiveDateTime, items: Vec<MealItem>) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            eaten_at,
            meal_type: MealType::Lunch,
            note: None,
            items,
        }
    }

    fn workout(kind: WorkoutKind, started_at: NaiveDateTime, duration_min: u32, run_km: Option<f64>) -> Workout {
        Workout {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            started_at,
            kind,
            duration_min,
            rpe: None,
            notes: None,
            run_detail: run_km.map(|distance_km| RunDetail {
                distance_km,
                avg_pace_sec_per_km: 300.0,
            }),
        }
    }

    fn weight_only(kg: f64) -> Profile {
        Profile {
            weight_kg: Some(kg),
            ..Profile::default()
        }
    }

    fn complete_profile() -> Profile {
        Profile {
            sex: Some(Sex::Male),
            birthdate: NaiveDate::from_ymd_opt(1989, 1, 1),
            height_cm: Some(180.0),
            weight_kg: Some(80.0),
            activity_level: Some(ActivityLevel::Moderate),
            goal: Some(Goal::Maintain),
            goal_rate: None,
        }
    }

    #[test]
    fn run_plus_strength_burn() {
        let d = date();
        let workouts = vec![
            workout(WorkoutKind::Run, at(d, 7, 0), 30, Some(5.0)),
            workout(WorkoutKind::Strength, at(d, 18, 0), 45, None),
        ];
        let stats = summarize_day(d, &[], &workouts, Some(&weight_only(80.0)), None);

        assert_eq!(stats.workouts.count, 2);
        assert_eq!(stats.workouts.total_duration_min, 75);
        assert_eq!(stats.workouts.total_burn_kcal, 760);
        assert_eq!(stats.targets, None);
    }

    #[test]
    fn run_without_detail_burns_nothing_and_weight_defaults() {
        let d = date();
        let workouts = vec![
            workout(WorkoutKind::Run, at(d, 7, 0), 30, None),
            workout(WorkoutKind::Strength, at(d, 8, 0), 60, None),
        ];
        let stats = summarize_day(d, &[], &workouts, None, None);

        assert_eq!(stats.workouts.count, 2);
        assert_eq!(stats.workouts.total_burn_kcal, 420);
    }

    #[test]
    fn burn_is_rounded_only_at_output() {
        let d = date();
        // 0.25 km at 70 kg is 17.5 kcal per run.
        let workouts = vec![
            workout(WorkoutKind::Run, at(d, 6, 0), 5, Some(0.25)),
            workout(WorkoutKind::Run, at(d, 7, 0), 5, Some(0.25)),
        ];
        // 35, not round(17.5) + round(17.5) = 36
        let stats = summarize_day(d, &[], &workouts, None, None);
        assert_eq!(stats.workouts.total_burn_kcal, 35);
    }

    #[test]
    fn nutrition_sums_only_items_inside_the_day() {
        let d = date();
        let chicken = Per100g {
            kcal: 165.0,
            protein: 31.0,
            carbs: 0.0,
            fat: 3.6,
            sugar: None,
            fiber: None,
        };
        let apple = Per100g {
            kcal: 52.0,
            protein: 0.3,
            carbs: 14.0,
            fat: 0.2,
            sugar: Some(10.0),
            fiber: Some(2.4),
        };
        let meals = vec![
            meal(
                at(d, 0, 0),
                vec![
                    item(snapshot_meal_item(chicken, 150.0).unwrap()),
                    item(snapshot_meal_item(apple, 200.0).unwrap()),
                ],
            ),
            meal(
                d.and_hms_milli_opt(23, 59, 59, 999).unwrap(),
                vec![item(snapshot_meal_item(apple, 100.0).unwrap())],
            ),
            meal(at(d.pred_opt().unwrap(), 23, 0), vec![item(snapshot_meal_item(chicken, 500.0).unwrap())]),
            meal(at(d.succ_opt().unwrap(), 0, 0), vec![item(snapshot_meal_item(chicken, 500.0).unwrap())]),
        ];

        let stats = summarize_day(d, &meals, &[], None, None);

        assert!((stats.nutrition.kcal - (247.5 + 104.0 + 52.0)).abs() < 1e-9);
        assert!((stats.nutrition.protein - (46.5 + 0.6 + 0.3)).abs() < 1e-9);
        assert!((stats.nutrition.sugar - 30.0).abs() < 1e-9);
        assert!((stats.nutrition.fiber - 7.2).abs() < 1e-9);
    }

    #[test]
    fn workouts_outside_the_day_are_ignored() {
        let d = date();
        let workouts = vec![
            workout(WorkoutKind::Strength, at(d.pred_opt().unwrap(), 23, 30), 60, None),
            workout(WorkoutKind::Strength, at(d, 12, 0), 30, None),
        ];
        let stats = summarize_day(d, &[], &workouts, None, None);
        assert_eq!(stats.workouts.count, 1);
        assert_eq!(stats.workouts.total_duration_min, 30);
    }

    #[test]
    fn targets_are_attached_unchanged() {
        let targets = compute_targets(&complete_profile(), date());
        assert!(targets.is_some());
        let stats = summarize_day(date(), &[], &[], Some(&complete_profile()), targets);
        assert_eq!(stats.targets, targets);
    }

    #[test]
    fn huge_durations_do_not_overflow_the_day_total() {
        let d = date();
        let workouts = vec![
            workout(WorkoutKind::Strength, at(d, 7, 0), u32::MAX, None),
            workout(WorkoutKind::Strength, at(d, 18, 0), u32::MAX, None),
        ];
        let stats = summarize_day(d, &[], &workouts, None, None);
        assert_eq!(stats.workouts.total_duration_min, 2 * u64::from(u32::MAX));
    }

    #[test]
    fn week_dates_are_oldest_first() {
        let dates = week_dates(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
        assert_eq!(dates[6], NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn week_falls_back_to_reference_target() {
        let reference = date();
        let profile = complete_profile();
        let targets = compute_targets(&profile, reference);
        let mut days: Vec<DayStats> = week_dates(reference)
            .into_iter()
            .map(|d| summarize_day(d, &[], &[], Some(&profile), targets))
            .collect();
        days[0].targets = None;

        let week = summarize_week(reference, &days);
        let expected = days[6].targets.map(|t| t.target_calories);
        assert_eq!(week.target_calories, expected);
        assert_eq!(week.days[0].target_calories, expected);
        assert_eq!(week.days.len(), 7);
    }

    #[test]
    fn week_without_profile_has_no_targets() {
        let reference = date();
        let days: Vec<DayStats> = week_dates(reference)
            .into_iter()
            .map(|d| summarize_day(d, &[], &[], None, None))
            .collect();
        let week = summarize_week(reference, &days);
        assert_eq!(week.target_calories, None);
        assert!(week.days.iter().all(|d| d.target_calories.is_none()));
    }
}
