//! Sponsor spend to ball speed
//!
//! Difficulty grows linearly with total spend; speed only grows with its
//! square root.

use crate::ads::Advertisement;

/// `max(1, total bids / minimum bid)`
pub fn difficulty(ads: &[Advertisement], min_bid: f64) -> f64 {
    let total: f64 = ads.iter().filter(|a| a.active).map(|a| a.bid).sum();
    difficulty_for_spend(total, min_bid)
}

/// Difficulty for an already summed spend
pub fn difficulty_for_spend(total_bids: f64, min_bid: f64) -> f64 {
    if !(min_bid > 0.0) || !total_bids.is_finite() {
        return 1.0;
    }
    (total_bids / min_bid).max(1.0)
}

/// Per-tick position multiplier for a difficulty
#[inline]
pub fn speed_scale(base_speed: f32, difficulty: f64) -> f32 {
    base_speed * (difficulty.max(1.0).sqrt() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ad(bid: f64) -> Advertisement {
        Advertisement {
            id: 1,
            advertiser: "0xabc".to_string(),
            logo: String::new(),
            brand_name: "Acme".to_string(),
            bid,
            created_at: 0.0,
            active: true,
            points: None,
        }
    }

    #[test]
    fn test_empty_set_is_base_difficulty() {
        assert_eq!(difficulty(&[], 1.0), 1.0);
        assert_eq!(speed_scale(0.8, difficulty(&[], 1.0)), 0.8);
    }

    #[test]
    fn test_difficulty_is_spend_over_minimum() {
        let ads = vec![ad(1.0), ad(2.0), ad(5.0)];
        assert_eq!(difficulty(&ads, 1.0), 8.0);
        assert_eq!(difficulty(&ads, 2.0), 4.0);
        assert!((speed_scale(0.8, 4.0) - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_minimum() {
        assert_eq!(difficulty_for_spend(10.0, 0.0), 1.0);
        assert_eq!(difficulty_for_spend(f64::INFINITY, 1.0), 1.0);
    }

    proptest! {
        #[test]
        fn prop_difficulty_at_least_one(bids in proptest::collection::vec(0.0f64..1000.0, 0..20)) {
            let ads: Vec<_> = bids.into_iter().map(ad).collect();
            prop_assert!(difficulty(&ads, 1.0) >= 1.0);
        }

        #[test]
        fn prop_difficulty_monotonic(a in 0.0f64..10_000.0, extra in 0.0f64..10_000.0, min in 0.01f64..100.0) {
            prop_assert!(difficulty_for_spend(a + extra, min) >= difficulty_for_spend(a, min));
            prop_assert!(
                speed_scale(0.8, difficulty_for_spend(a + extra, min))
                    >= speed_scale(0.8, difficulty_for_spend(a, min))
            );
        }
    }
}
