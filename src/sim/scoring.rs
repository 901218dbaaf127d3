//! Points per crushed ball
//!
//! A lone hit scores its base value. Hits landing within the combo window
//! of the previous one build a combo; from the second consecutive hit each
//! combo step (capped) adds `combo_step` of the base value.

use serde::{Deserialize, Serialize};

use super::state::{Ball, ComboState};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub base_points: u32,
    /// Use a ball's own point value when it carries one
    pub catalog_points: bool,
    pub verified_multiplier: f64,
    pub combo_window_ms: u64,
    pub combo_cap: u32,
    pub combo_step: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ScoringRules {
    fn from(settings: &Settings) -> Self {
        Self {
            base_points: settings.base_points,
            catalog_points: settings.catalog_points,
            verified_multiplier: settings.verified_multiplier,
            combo_window_ms: settings.combo_window_ms,
            combo_cap: settings.combo_cap,
            combo_step: settings.combo_step,
        }
    }
}

impl ComboState {
    /// True while another hit would extend the combo
    pub fn is_active(&self, now_ms: u64, window_ms: u64) -> bool {
        self.last_hit_at
            .is_some_and(|last| now_ms.saturating_sub(last) < window_ms)
    }
}

/// Combo counter after a hit at `now_ms`
pub fn next_combo(combo: ComboState, now_ms: u64, window_ms: u64) -> u32 {
    if combo.is_active(now_ms, window_ms) {
        combo.combo + 1
    } else {
        1
    }
}

/// Unmultiplied value of crushing `ball`
pub fn base_value(ball: &Ball, rules: &ScoringRules) -> u32 {
    match ball.points {
        Some(points) if rules.catalog_points => points,
        _ => rules.base_points,
    }
}

/// Points for a hit plus the combo state to carry forward
pub fn register_hit(
    ball: &Ball,
    verified: bool,
    combo: ComboState,
    now_ms: u64,
    rules: &ScoringRules,
) -> (u32, ComboState) {
    let base = base_value(ball, rules) as f64;
    let base = if verified {
        base * rules.verified_multiplier
    } else {
        base
    };

    let count = next_combo(combo, now_ms, rules.combo_window_ms);
    let bonus = if count > 1 {
        count.min(rules.combo_cap) as f64 * rules.combo_step
    } else {
        0.0
    };
    let points = (base * (1.0 + bonus)).floor() as u32;

    (
        points,
        ComboState {
            combo: count,
            last_hit_at: Some(now_ms),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn ball(points: Option<u32>) -> Ball {
        Ball {
            id: 1,
            pos: Vec2::splat(50.0),
            vel: Vec2::ZERO,
            size: 60.0,
            ad_id: 1,
            brand: "Acme".to_string(),
            logo: String::new(),
            bid: 1.0,
            points,
        }
    }

    #[test]
    fn test_combo_sequence_respects_window() {
        let rules = ScoringRules::default();
        let mut combo = ComboState::default();
        let mut seen = Vec::new();
        for t in [0, 500, 2500] {
            let (_, next) = register_hit(&ball(None), false, combo, t, &rules);
            seen.push(next.combo);
            combo = next;
        }
        assert_eq!(seen, vec![1, 2, 1]);
        assert_eq!(combo.last_hit_at, Some(2500));
    }

    #[test]
    fn test_single_unverified_hit_is_base_value() {
        let rules = ScoringRules::default();
        let (points, combo) = register_hit(&ball(None), false, ComboState::default(), 0, &rules);
        assert_eq!(points, 10);
        assert_eq!(combo.combo, 1);
    }

    #[test]
    fn test_verified_combo_three() {
        let rules = ScoringRules::default();
        let combo = ComboState {
            combo: 2,
            last_hit_at: Some(1000),
        };
        let (points, combo) = register_hit(&ball(None), true, combo, 1500, &rules);
        assert_eq!(combo.combo, 3);
        // floor(20 * (1 + 3 * 0.5))
        assert_eq!(points, 50);
    }

    #[test]
    fn test_combo_contribution_is_capped() {
        let rules = ScoringRules::default();
        let combo = ComboState {
            combo: 11,
            last_hit_at: Some(0),
        };
        let (points, combo) = register_hit(&ball(None), false, combo, 10, &rules);
        assert_eq!(combo.combo, 12);
        assert_eq!(points, 35); // 10 * (1 + 5 * 0.5)
    }

    #[test]
    fn test_points_round_down() {
        let rules = ScoringRules {
            verified_multiplier: 1.5,
            catalog_points: true,
            ..ScoringRules::default()
        };
        let (points, _) = register_hit(&ball(Some(13)), true, ComboState::default(), 0, &rules);
        assert_eq!(points, 19); // floor(19.5)
    }

    #[test]
    fn test_catalog_points_only_when_enabled() {
        let rules = ScoringRules::default();
        assert_eq!(base_value(&ball(Some(17)), &rules), 10);
        let rules = ScoringRules {
            catalog_points: true,
            ..rules
        };
        assert_eq!(base_value(&ball(Some(17)), &rules), 17);
        assert_eq!(base_value(&ball(None), &rules), 10);
    }

    #[test]
    fn test_combo_activity() {
        let combo = ComboState {
            combo: 3,
            last_hit_at: Some(1000),
        };
        assert!(combo.is_active(2999, 2000));
        assert!(!combo.is_active(3000, 2000));
        assert!(!ComboState::default().is_active(0, 2000));
    }
}
