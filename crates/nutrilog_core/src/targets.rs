//! crates/nutrilog_core/src/targets.rs
//!
//! Daily energy and macro targets derived from a user's profile.
//!
//! BMR uses the Mifflin-St Jeor equation, TDEE scales it by a fixed activity
//! factor, and the goal shifts the calorie target by a per-rate delta. All
//! rounding is `f64::round` (half away from zero).

use chrono::{Datelike, NaiveDate};

use crate::domain::{ActivityLevel, Goal, GoalRate, Profile, Sex};

/// No target goes below this many kcal per day.
pub const MIN_TARGET_CALORIES: f64 = 1200.0;

/// Upper bound for daily added sugar, in grams.
pub const SUGAR_TARGET_G: i32 = 50;

/// Daily fiber target, in grams.
pub const FIBER_TARGET_G: i32 = 30;

/// The computed daily targets. Recomputed on every request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub bmr: i32,
    pub tdee: i32,
    pub target_calories: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub sugar_target_g: i32,
    pub fiber_target_g: i32,
}

impl ActivityLevel {
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Very => 1.725,
            ActivityLevel::Athlete => 1.9,
        }
    }
}

impl GoalRate {
    /// Daily kcal adjustment as `(lose, gain)`.
    pub fn deltas(&self) -> (f64, f64) {
        match self {
            GoalRate::Slow => (-300.0, 250.0),
            GoalRate::Medium => (-500.0, 400.0),
            GoalRate::Fast => (-700.0, 600.0),
        }
    }
}

/// Whole years between `birthdate` and `on`, one less if the birthday has not
/// come around yet that year.
pub fn age_on(birthdate: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birthdate.year();
    if (on.month(), on.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age
}

/// Mifflin-St Jeor resting energy expenditure, kcal/day.
pub fn bmr(sex: Sex, weight_kg: f64, height_cm: f64, age: i32) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

/// Applies the goal delta and the calorie floor, then rounds.
pub fn target_calories(tdee: f64, goal: Goal, rate: Option<GoalRate>) -> i32 {
    let (lose, gain) = rate.unwrap_or(GoalRate::Medium).deltas();
    let adjusted = match goal {
        Goal::Maintain => tdee,
        Goal::Lose => tdee + lose,
        Goal::Gain => tdee + gain,
    };
    adjusted.max(MIN_TARGET_CALORIES).round() as i32
}

/// Splits a calorie target into protein, carbs and fat grams.
///
/// Protein and fat are fixed per kg of body weight; carbs take whatever budget
/// is left and never go negative.
pub fn macro_split(weight_kg: f64, target_calories: i32, goal: Goal) -> (i32, i32, i32) {
    let protein_per_kg = if goal == Goal::Gain { 1.8 } else { 1.6 };
    let protein = (protein_per_kg * weight_kg).round();
    let fat = (0.8 * weight_kg).round();
    let remaining = f64::from(target_calories) - protein * 4.0 - fat * 9.0;
    let carbs = (remaining / 4.0).round().max(0.0);
    (protein as i32, carbs as i32, fat as i32)
}

/// Computes the daily targets for `profile`, with the age taken as of `on`.
///
/// Returns `None` when any of sex, birthdate, weight, height, activity level or
/// goal is missing. That is a displayable "profile incomplete" state, not an error.
pub fn compute_targets(profile: &Profile, on: NaiveDate) -> Option<Targets> {
    let sex = profile.sex?;
    let birthdate = profile.birthdate?;
    let weight_kg = profile.weight_kg?;
    let height_cm = profile.height_cm?;
    let activity = profile.activity_level?;
    let goal = profile.goal?;

    let bmr = bmr(sex, weight_kg, height_cm, age_on(birthdate, on));
    let tdee = bmr * activity.factor();
    let target_calories = target_calories(tdee, goal, profile.goal_rate);
    let (protein_g, carbs_g, fat_g) = macro_split(weight_kg, target_calories, goal);

    Some(Targets {
        bmr: bmr.round() as i32,
        tdee: tdee.round() as i32,
        target_calories,
        protein_g,
        carbs_g,
        fat_g,
        sugar_target_g: SUGAR_TARGET_G,
        fiber_target_g: FIBER_TARGET_G,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn reference_profile() -> Profile {
        Profile {
            sex: Some(Sex::Male),
            birthdate: NaiveDate::from_ymd_opt(1989, 6, 15),
            height_cm: Some(180.0),
            weight_kg: Some(80.0),
            activity_level: Some(ActivityLevel::Moderate),
            goal: Some(Goal::Maintain),
            goal_rate: None,
        }
    }

    #[test]
    fn maintain_scenario() {
        let targets = compute_targets(&reference_profile(), today()).unwrap();

        assert_eq!(targets.bmr, 1755);
        assert_eq!(targets.tdee, 2720);
        assert_eq!(targets.target_calories, 2720);
        assert_eq!(targets.protein_g, 128);
        assert_eq!(targets.fat_g, 64);
        assert_eq!(targets.carbs_g, 408);
        assert_eq!(targets.sugar_target_g, 50);
        assert_eq!(targets.fiber_target_g, 30);
    }

    #[test]
    fn lose_medium_scenario() {
        let profile = Profile {
            goal: Some(Goal::Lose),
            goal_rate: Some(GoalRate::Medium),
            ..reference_profile()
        };
        let targets = compute_targets(&profile, today()).unwrap();
        assert_eq!(targets.target_calories, 2220);
    }

    #[test]
    fn missing_rate_defaults_to_medium() {
        let explicit = Profile {
            goal: Some(Goal::Gain),
            goal_rate: Some(GoalRate::Medium),
            ..reference_profile()
        };
        let implicit = Profile {
            goal_rate: None,
            ..explicit.clone()
        };
        assert_eq!(
            compute_targets(&explicit, today()),
            compute_targets(&implicit, today())
        );
        // 2720.25 + 400, protein at 1.8 g/kg
        let targets = compute_targets(&implicit, today()).unwrap();
        assert_eq!(targets.target_calories, 3120);
        assert_eq!(targets.protein_g, 144);
    }

    #[test]
    fn rate_is_ignored_when_maintaining() {
        let profile = Profile {
            goal_rate: Some(GoalRate::Fast),
            ..reference_profile()
        };
        assert_eq!(compute_targets(&profile, today()).unwrap().target_calories, 2720);
    }

    #[test]
    fn each_missing_required_field_yields_none() {
        let strip: [fn(&mut Profile); 6] = [
            |p| p.sex = None,
            |p| p.birthdate = None,
            |p| p.weight_kg = None,
            |p| p.height_cm = None,
            |p| p.activity_level = None,
            |p| p.goal = None,
        ];
        for clear in strip {
            let mut profile = reference_profile();
            clear(&mut profile);
            assert_eq!(compute_targets(&profile, today()), None);
        }
        assert_eq!(compute_targets(&Profile::default(), today()), None);
    }

    #[test]
    fn calorie_floor_and_carb_clamp_hold() {
        // Small, old, sedentary, cutting fast: well under the floor.
        let profile = Profile {
            sex: Some(Sex::Female),
            birthdate: NaiveDate::from_ymd_opt(1944, 1, 1),
            height_cm: Some(150.0),
            weight_kg: Some(45.0),
            activity_level: Some(ActivityLevel::Sedentary),
            goal: Some(Goal::Lose),
            goal_rate: Some(GoalRate::Fast),
        };
        let targets = compute_targets(&profile, today()).unwrap();
        assert_eq!(targets.target_calories, 1200);
        assert!(targets.carbs_g >= 0);

        // Heavy body weight on the floor: protein and fat exceed the budget.
        let heavy = Profile {
            weight_kg: Some(300.0),
            height_cm: Some(100.0),
            birthdate: NaiveDate::from_ymd_opt(1924, 1, 1),
            ..profile
        };
        let targets = compute_targets(&heavy, today()).unwrap();
        assert!(targets.target_calories >= 1200);
        assert_eq!(targets.carbs_g, 0);
    }

    #[test]
    fn floor_sweep_over_profiles() {
        for sex in Sex::ALL {
            for activity in ActivityLevel::ALL {
                for goal in Goal::ALL {
                    for rate in GoalRate::ALL {
                        for weight in [30.0, 60.0, 120.0, 300.0] {
                            let profile = Profile {
                                sex: Some(*sex),
                                birthdate: NaiveDate::from_ymd_opt(1950, 3, 1),
                                height_cm: Some(160.0),
                                weight_kg: Some(weight),
                                activity_level: Some(*activity),
                                goal: Some(*goal),
                                goal_rate: Some(*rate),
                            };
                            let targets = compute_targets(&profile, today()).unwrap();
                            assert!(targets.target_calories >= 1200);
                            assert!(targets.carbs_g >= 0);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn age_counts_birthday_not_yet_reached() {
        let birthdate = NaiveDate::from_ymd_opt(1990, 5, 20).unwrap();
        assert_eq!(age_on(birthdate, NaiveDate::from_ymd_opt(2024, 5, 19).unwrap()), 33);
        assert_eq!(age_on(birthdate, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()), 34);
        assert_eq!(age_on(birthdate, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()), 33);
    }

    #[test]
    fn computation_is_deterministic() {
        let profile = reference_profile();
        assert_eq!(compute_targets(&profile, today()), compute_targets(&profile, today()));
    }

    #[test]
    fn absurd_weight_saturates_instead_of_overflowing() {
        let profile = Profile {
            weight_kg: Some(1e12),
            ..reference_profile()
        };
        let targets = compute_targets(&profile, today()).unwrap();
        assert_eq!(targets.protein_g, i32::MAX);
        assert_eq!(targets.fat_g, i32::MAX);
        assert_eq!(targets.carbs_g, 0);
    }

    #[test]
    fn female_offset() {
        assert_eq!(bmr(Sex::Female, 60.0, 165.0, 30), 600.0 + 1031.25 - 150.0 - 161.0);
    }
}
