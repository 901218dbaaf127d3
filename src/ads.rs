//! Sponsor advertisements
//!
//! Sponsors register a brand against a bid. Every accepted bid is split
//! between the prize pool and the platform fee; both are derived from the
//! current set so they can never drift from it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::REWARD_SCORE_SCALE;
use crate::error::GameError;
use crate::settings::Settings;

/// Catalog advertisements use ids from here upward so they never collide
/// with registered ones
pub const CATALOG_ID_BASE: u64 = 1 << 40;

/// Identity used for catalog and demo sponsors
pub const HOUSE_ADVERTISER: &str = "0xDemo";

/// A sponsor's paid registration (immutable once accepted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: u64,
    /// Sponsor identity (wallet address or similar)
    pub advertiser: String,
    /// Resolvable logo reference (URL, path, emoji)
    pub logo: String,
    pub brand_name: String,
    /// Bid in USD, always >= the minimum at registration time
    pub bid: f64,
    /// Unix timestamp (ms) of registration
    pub created_at: f64,
    pub active: bool,
    /// Points override for catalog brands
    #[serde(default)]
    pub points: Option<u32>,
}

/// What a sponsor submits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRegistration {
    pub brand_name: String,
    pub logo: String,
    pub bid: f64,
    /// Connected identity, if any
    pub advertiser: Option<String>,
}

impl AdRegistration {
    pub fn new(brand_name: impl Into<String>, logo: impl Into<String>, bid: f64) -> Self {
        Self {
            brand_name: brand_name.into(),
            logo: logo.into(),
            bid,
            advertiser: None,
        }
    }

    pub fn with_advertiser(mut self, advertiser: impl Into<String>) -> Self {
        self.advertiser = Some(advertiser.into());
        self
    }
}

/// The registered advertisement set for the current round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdBook {
    ads: Vec<Advertisement>,
    min_bid: f64,
    prize_pool_share: f64,
    next_id: u64,
}

impl AdBook {
    pub fn new(min_bid: f64, prize_pool_share: f64) -> Self {
        Self {
            ads: Vec::new(),
            min_bid,
            prize_pool_share,
            next_id: 1,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.min_bid, settings.prize_pool_share)
    }

    /// Validate and accept a registration
    pub fn register(
        &mut self,
        registration: AdRegistration,
        timestamp: f64,
    ) -> Result<&Advertisement, GameError> {
        let brand_name = registration.brand_name.trim();
        if brand_name.is_empty() {
            log::warn!("Rejected ad registration with empty brand name");
            return Err(GameError::EmptyBrandName);
        }
        // NaN fails this comparison too
        if !(registration.bid >= self.min_bid) {
            log::warn!(
                "Rejected bid {} for {} (minimum {})",
                registration.bid,
                brand_name,
                self.min_bid
            );
            return Err(GameError::InvalidBid {
                bid: registration.bid,
                minimum: self.min_bid,
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let ad = Advertisement {
            id,
            advertiser: registration.advertiser.unwrap_or_else(|| "0x0".to_string()),
            logo: registration.logo,
            brand_name: brand_name.to_string(),
            bid: registration.bid,
            created_at: timestamp,
            active: true,
            points: None,
        };
        log::info!(
            "Registered ad #{} {} at ${:.2}",
            ad.id,
            ad.brand_name,
            ad.bid
        );
        self.ads.push(ad);
        Ok(&self.ads[self.ads.len() - 1])
    }

    /// Register demo sponsors for every catalog brand at `min_bid + [0, 5)`
    pub fn seed_demo<R: Rng>(&mut self, rng: &mut R, timestamp: f64) {
        for (i, brand) in CATALOG.iter().enumerate() {
            let bid = self.min_bid + rng.random_range(0.0..5.0);
            let registration =
                AdRegistration::new(brand.name, brand.logo, bid).with_advertiser(HOUSE_ADVERTISER);
            // Bid is never below the minimum here
            let _ = self.register(registration, timestamp - i as f64 * 1000.0);
        }
    }

    /// Take new intake limits; already accepted ads stay in the set
    pub fn configure(&mut self, settings: &Settings) {
        self.min_bid = settings.min_bid;
        self.prize_pool_share = settings.prize_pool_share;
    }

    pub fn ads(&self) -> &[Advertisement] {
        &self.ads
    }

    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }

    pub fn min_bid(&self) -> f64 {
        self.min_bid
    }

    /// Sum of all active bids
    pub fn total_bids(&self) -> f64 {
        self.ads.iter().filter(|a| a.active).map(|a| a.bid).sum()
    }

    /// Prize pool share of all bids
    pub fn prize_pool(&self) -> f64 {
        self.total_bids() * self.prize_pool_share
    }

    /// Platform fee share of all bids
    pub fn platform_fee(&self) -> f64 {
        self.total_bids() * (1.0 - self.prize_pool_share)
    }

    /// Share of the current prize pool a round score would earn
    pub fn potential_reward(&self, score: u64) -> f64 {
        self.prize_pool() * (score as f64 / REWARD_SCORE_SCALE)
    }
}

/// A placeholder brand shown when nobody has paid for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogBrand {
    pub name: &'static str,
    pub logo: &'static str,
    pub points: u32,
}

const fn brand(name: &'static str, logo: &'static str, points: u32) -> CatalogBrand {
    CatalogBrand { name, logo, points }
}

pub const CATALOG: [CatalogBrand; 16] = [
    brand("Nike", "/logos/IMG_6942.JPG", 10),
    brand("Apple", "/logos/IMG_6943.jpg", 15),
    brand("Google", "/logos/IMG_6944.jpg", 12),
    brand("Amazon", "/logos/IMG_6945.JPG", 18),
    brand("Tesla", "/logos/IMG_6946.JPG", 20),
    brand("Meta", "/logos/IMG_6947.JPG", 14),
    brand("Netflix", "/logos/IMG_6948.PNG", 16),
    brand("Spotify", "/logos/IMG_6949.JPG", 13),
    brand("Twitter", "/logos/IMG_6950.JPG", 11),
    brand("Adobe", "/logos/IMG_6951.JPG", 17),
    brand("Intel", "/logos/IMG_6952.PNG", 15),
    brand("Samsung", "/logos/IMG_6953.JPG", 19),
    brand("Sony", "/logos/IMG_6954.JPG", 14),
    brand("Microsoft", "/logos/IMG_6955.PNG", 16),
    brand("Oracle", "/logos/IMG_6956.JPG", 13),
    brand("IBM", "/logos/IMG_6957.JPG", 12),
];

/// Catalog brands as unpaid advertisements, bid at the minimum
pub fn catalog_advertisements(min_bid: f64) -> Vec<Advertisement> {
    CATALOG
        .iter()
        .enumerate()
        .map(|(i, brand)| Advertisement {
            id: CATALOG_ID_BASE + i as u64,
            advertiser: HOUSE_ADVERTISER.to_string(),
            logo: brand.logo.to_string(),
            brand_name: brand.name.to_string(),
            bid: min_bid,
            created_at: 0.0,
            active: true,
            points: Some(brand.points),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn book() -> AdBook {
        AdBook::new(1.0, 0.7)
    }

    #[test]
    fn test_register_rejects_low_bid() {
        let mut book = book();
        let err = book
            .register(AdRegistration::new("Acme", "acme.png", 0.99), 0.0)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidBid { .. }));
        assert!(book.is_empty());
        assert_eq!(book.prize_pool(), 0.0);
    }

    #[test]
    fn test_register_rejects_nan_and_blank_brand() {
        let mut book = book();
        assert!(
            book.register(AdRegistration::new("Acme", "acme.png", f64::NAN), 0.0)
                .is_err()
        );
        assert_eq!(
            book.register(AdRegistration::new("   ", "x.png", 3.0), 0.0),
            Err(GameError::EmptyBrandName)
        );
        assert!(book.is_empty());
    }

    #[test]
    fn test_minimum_bid_is_accepted() {
        let mut book = book();
        let ad = book
            .register(
                AdRegistration::new(" Acme ", "acme.png", 1.0).with_advertiser("0xabc"),
                42.0,
            )
            .expect("minimum bid accepted");
        assert_eq!(ad.brand_name, "Acme");
        assert_eq!(ad.advertiser, "0xabc");
        assert_eq!(ad.created_at, 42.0);
        assert!(ad.active);
    }

    #[test]
    fn test_prize_pool_split() {
        let mut book = book();
        for bid in [1.0, 2.0, 5.0] {
            book.register(AdRegistration::new("Brand", "logo", bid), 0.0)
                .expect("valid bid");
        }
        assert!((book.total_bids() - 8.0).abs() < 1e-9);
        assert!((book.prize_pool() - 5.6).abs() < 1e-9);
        assert!((book.platform_fee() - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_potential_reward_scales_with_score() {
        let mut book = book();
        assert_eq!(book.potential_reward(500), 0.0);
        for bid in [1.0, 2.0, 5.0] {
            book.register(AdRegistration::new("Brand", "logo", bid), 0.0)
                .expect("valid bid");
        }
        assert!((book.potential_reward(50) - 0.28).abs() < 1e-9);
        let full = book.potential_reward(1000);
        assert!((full - book.prize_pool()).abs() < 1e-9);
        assert_eq!(book.potential_reward(0), 0.0);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut book = book();
        let a = book
            .register(AdRegistration::new("A", "a", 1.0), 0.0)
            .map(|a| a.id)
            .expect("valid");
        let b = book
            .register(AdRegistration::new("B", "b", 1.0), 0.0)
            .map(|a| a.id)
            .expect("valid");
        assert_ne!(a, b);
        assert!((book.total_bids() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_seed_demo_registers_catalog() {
        let mut book = book();
        let mut rng = Pcg32::seed_from_u64(7);
        book.seed_demo(&mut rng, 100_000.0);
        assert_eq!(book.len(), CATALOG.len());
        assert!(book.ads().iter().all(|a| a.bid >= 1.0 && a.bid < 6.0));
        assert!(book.ads().iter().all(|a| a.id < CATALOG_ID_BASE));
    }

    #[test]
    fn test_catalog_ads_are_marked() {
        let ads = catalog_advertisements(1.0);
        assert_eq!(ads.len(), 16);
        assert!(ads.iter().all(|a| a.id >= CATALOG_ID_BASE));
        assert_eq!(ads[4].brand_name, "Tesla");
        assert_eq!(ads[4].points, Some(20));
    }
}
