//! Game rules and tuning
//!
//! Persisted in LocalStorage on the web. Natively the
//! rules are read from the JSON file named by `BRAND_CRUSHER_SETTINGS`.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Rule set presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RulesPreset {
    /// Sponsor-funded rounds: ad balls, 2x verified bonus, ends on timeout or clear
    #[default]
    Classic,
    /// Catalog brands with their own point values, 1.5x verified bonus, endless respawn
    Arcade,
}

impl RulesPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulesPreset::Classic => "Classic",
            RulesPreset::Arcade => "Arcade",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(RulesPreset::Classic),
            "arcade" => Some(RulesPreset::Arcade),
            _ => None,
        }
    }
}

/// Every tunable the simulation and intake read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub preset: RulesPreset,

    // === Sponsors ===
    /// Smallest bid accepted at intake (USD)
    pub min_bid: f64,
    /// Fraction of each bid credited to the prize pool
    pub prize_pool_share: f64,
    /// Prize pool needed before a prize round may start
    pub prize_mode_threshold: f64,
    /// Use placeholder brands when nobody has registered
    pub fallback_catalog: bool,

    // === Round ===
    pub round_duration_secs: u32,
    /// Balls on screen at round start
    pub arena_capacity: usize,
    /// Crushing a ball spawns a replacement (no perfect clear)
    pub respawn_on_hit: bool,

    // === Timers ===
    pub physics_tick_ms: u64,
    pub countdown_tick_ms: u64,
    pub max_substeps: u32,

    // === Arena ===
    pub boundary_min: f32,
    pub boundary_max: f32,
    pub spawn_min: f32,
    pub spawn_max: f32,
    /// Spawn velocity components are drawn from [-max_velocity, max_velocity)
    pub max_velocity: f32,
    pub ball_size_min: f32,
    pub ball_size_max: f32,

    // === Speed ===
    pub base_speed: f32,
    /// When false the speed scale stays at `base_speed` regardless of spend
    pub scale_speed_by_difficulty: bool,

    // === Scoring ===
    pub base_points: u32,
    /// Catalog balls award their brand's own points instead of `base_points`
    pub catalog_points: bool,
    pub verified_multiplier: f64,
    pub combo_window_ms: u64,
    pub combo_cap: u32,
    pub combo_step: f64,

    // === External services ===
    pub verification_delay_ms: u64,
    /// A taken score submission with no answer after this long has failed
    pub submission_timeout_ms: u64,

    // === Demo ===
    /// Autoplayer hit cadence
    pub idle_hit_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: RulesPreset::Classic,

            min_bid: MIN_BID,
            prize_pool_share: PRIZE_POOL_SHARE,
            prize_mode_threshold: 10.0,
            fallback_catalog: true,

            round_duration_secs: ROUND_DURATION_SECS,
            arena_capacity: ARENA_CAPACITY,
            respawn_on_hit: false,

            physics_tick_ms: PHYSICS_TICK_MS,
            countdown_tick_ms: COUNTDOWN_TICK_MS,
            max_substeps: MAX_SUBSTEPS,

            boundary_min: BOUNDARY_MIN,
            boundary_max: BOUNDARY_MAX,
            spawn_min: SPAWN_MIN,
            spawn_max: SPAWN_MAX,
            max_velocity: 1.0,
            ball_size_min: 50.0,
            ball_size_max: 80.0,

            base_speed: BASE_SPEED,
            scale_speed_by_difficulty: true,

            base_points: BASE_POINTS,
            catalog_points: false,
            verified_multiplier: VERIFIED_MULTIPLIER,
            combo_window_ms: COMBO_WINDOW_MS,
            combo_cap: COMBO_CAP,
            combo_step: COMBO_STEP,

            verification_delay_ms: 2000,
            submission_timeout_ms: SUBMISSION_TIMEOUT_MS,

            idle_hit_interval_ms: 700,
        }
    }
}

impl Settings {
    /// Create settings from a rules preset (applies preset defaults)
    pub fn from_preset(preset: RulesPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a rules preset (updates preset-dependent settings)
    pub fn apply_preset(&mut self, preset: RulesPreset) {
        self.preset = preset;
        match preset {
            RulesPreset::Classic => {
                self.arena_capacity = ARENA_CAPACITY;
                self.respawn_on_hit = false;
                self.base_speed = BASE_SPEED;
                self.scale_speed_by_difficulty = true;
                self.catalog_points = false;
                self.verified_multiplier = VERIFIED_MULTIPLIER;
                self.spawn_min = SPAWN_MIN;
                self.spawn_max = SPAWN_MAX;
                self.boundary_min = BOUNDARY_MIN;
            }
            RulesPreset::Arcade => {
                self.arena_capacity = 5;
                self.respawn_on_hit = true;
                self.base_speed = 1.0;
                self.scale_speed_by_difficulty = false;
                self.catalog_points = true;
                self.verified_multiplier = 1.5;
                self.spawn_min = 5.0;
                self.spawn_max = 85.0;
                self.boundary_min = 0.0;
            }
        }
    }

    /// Check ranges and tick lengths
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> SettingsError {
            SettingsError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if !(self.min_bid > 0.0) {
            return Err(invalid("min_bid", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.prize_pool_share) {
            return Err(invalid("prize_pool_share", "must be within 0..=1"));
        }
        if self.physics_tick_ms == 0 {
            return Err(invalid("physics_tick_ms", "must be non-zero"));
        }
        if self.countdown_tick_ms == 0 {
            return Err(invalid("countdown_tick_ms", "must be non-zero"));
        }
        if self.max_substeps == 0 {
            return Err(invalid("max_substeps", "must be non-zero"));
        }
        if self.boundary_min >= self.boundary_max {
            return Err(invalid("boundary_min", "must be below boundary_max"));
        }
        if self.spawn_min >= self.spawn_max {
            return Err(invalid("spawn_min", "must be below spawn_max"));
        }
        if self.ball_size_min >= self.ball_size_max {
            return Err(invalid("ball_size_min", "must be below ball_size_max"));
        }
        if !(self.max_velocity > 0.0) {
            return Err(invalid("max_velocity", "must be positive"));
        }
        if self.verified_multiplier < 1.0 {
            return Err(invalid("verified_multiplier", "must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "brand_crusher_settings";

    /// Environment variable naming a settings file (native only)
    pub const PATH_ENV: &'static str = "BRAND_CRUSHER_SETTINGS";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from the file named by `BRAND_CRUSHER_SETTINGS`, else defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::PATH_ENV) else {
            log::info!("Using default settings");
            return Self::default();
        };

        match std::fs::read_to_string(&path)
            .map_err(SettingsError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path);
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path, e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
        assert!(Settings::from_preset(RulesPreset::Arcade).validate().is_ok());
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(RulesPreset::from_str("ARCADE"), Some(RulesPreset::Arcade));
        assert_eq!(RulesPreset::from_str("classic"), Some(RulesPreset::Classic));
        assert_eq!(RulesPreset::from_str("tetris"), None);
        assert_eq!(RulesPreset::Arcade.as_str(), "Arcade");
    }

    #[test]
    fn test_arcade_preset() {
        let settings = Settings::from_preset(RulesPreset::Arcade);
        assert!(settings.respawn_on_hit);
        assert!(settings.catalog_points);
        assert!(!settings.scale_speed_by_difficulty);
        assert_eq!(settings.arena_capacity, 5);
        assert_eq!(settings.verified_multiplier, 1.5);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{ "combo_window_ms": 1000, "base_speed": 0.5 }"#)
            .expect("valid json");
        assert_eq!(settings.combo_window_ms, 1000);
        assert_eq!(settings.base_speed, 0.5);
        assert_eq!(settings.arena_capacity, ARENA_CAPACITY);
    }

    #[test]
    fn test_json_rejects_inverted_bounds() {
        let err = Settings::from_json(r#"{ "boundary_min": 95.0, "boundary_max": 5.0 }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                field: "boundary_min",
                ..
            }
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_preset() {
        let settings = Settings::from_preset(RulesPreset::Arcade);
        let json = settings.to_json().expect("serializable");
        assert_eq!(Settings::from_json(&json).expect("parses"), settings);
    }
}
