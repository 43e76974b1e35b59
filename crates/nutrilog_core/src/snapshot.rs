//! crates/nutrilog_core/src/snapshot.rs
//!
//! Freezes a food's nutrition onto a meal item at the moment it is logged.

use crate::domain::{AbsoluteMacros, MacroSnapshot, Per100g};
use crate::error::CoreError;

/// Scales per-100g values to `grams`.
///
/// No rounding happens here; rounding is left to whoever displays the values.
pub fn snapshot_meal_item(per_100g: Per100g, grams: f64) -> Result<MacroSnapshot, CoreError> {
    if !grams.is_finite() || grams <= 0.0 {
        return Err(CoreError::InvalidQuantity(grams));
    }

    let ratio = grams / 100.0;
    let absolute = AbsoluteMacros {
        kcal: per_100g.kcal * ratio,
        protein: per_100g.protein * ratio,
        carbs: per_100g.carbs * ratio,
        fat: per_100g.fat * ratio,
        sugar: per_100g.sugar.map(|v| v * ratio),
        fiber: per_100g.fiber.map(|v| v * ratio),
    };

    Ok(MacroSnapshot {
        per_100g,
        grams,
        absolute,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn chicken() -> Per100g {
        Per100g {
            kcal: 165.0,
            protein: 31.0,
            carbs: 0.0,
            fat: 3.6,
            sugar: None,
            fiber: None,
        }
    }

    #[test]
    fn chicken_breast_150g() {
        let snap = snapshot_meal_item(chicken(), 150.0).unwrap();

        assert!((snap.absolute.kcal - 247.5).abs() < EPS);
        assert!((snap.absolute.protein - 46.5).abs() < EPS);
        assert_eq!(snap.absolute.carbs, 0.0);
        assert!((snap.absolute.fat - 5.4).abs() < EPS);
        assert_eq!(snap.absolute.sugar, None);
        assert_eq!(snap.grams, 150.0);
        assert_eq!(snap.per_100g, chicken());
    }

    #[test]
    fn scales_linearly_including_optional_fields() {
        let per_100g = Per100g {
            sugar: Some(12.0),
            fiber: Some(2.5),
            ..chicken()
        };
        for grams in [0.01, 1.0, 37.5, 100.0, 250.0, 1234.5] {
            let snap = snapshot_meal_item(per_100g, grams).unwrap();
            assert!((snap.absolute.kcal - 165.0 * grams / 100.0).abs() < EPS);
            assert!((snap.absolute.protein - 31.0 * grams / 100.0).abs() < EPS);
            assert!((snap.absolute.fat - 3.6 * grams / 100.0).abs() < EPS);
            assert!((snap.absolute.sugar.unwrap() - 12.0 * grams / 100.0).abs() < EPS);
            assert!((snap.absolute.fiber.unwrap() - 2.5 * grams / 100.0).abs() < EPS);
        }
    }

    #[test]
    fn rejects_non_positive_quantities() {
        assert_eq!(
            snapshot_meal_item(chicken(), 0.0),
            Err(CoreError::InvalidQuantity(0.0))
        );
        assert!(snapshot_meal_item(chicken(), -5.0).is_err());
        assert!(snapshot_meal_item(chicken(), f64::NAN).is_err());
        assert!(snapshot_meal_item(chicken(), f64::INFINITY).is_err());
    }
}
