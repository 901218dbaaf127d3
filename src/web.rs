//! Browser bindings
//!
//! The page owns rendering and the animation frame loop; it calls `update`
//! with elapsed milliseconds and reads back JSON snapshots.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::ads::AdRegistration;
use crate::error::ExternalServiceError;
use crate::game::Game;
use crate::identity::{LocalStorageFlagStore, SimulatedVerifier};
use crate::settings::{RulesPreset, Settings};
use crate::sim::{Ball, HitOutcome, RoundMode, RoundStatus};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Brand Crusher (web) starting...");
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Everything the HUD and arena need for one frame
#[derive(Serialize)]
struct Snapshot<'a> {
    preset: &'static str,
    status: RoundStatus,
    score: u64,
    time_remaining: u32,
    combo: u32,
    balls: &'a [Ball],
    prize_pool: f64,
    platform_fee: f64,
    potential_reward: Option<f64>,
    sponsors: usize,
    difficulty: f64,
    verified: bool,
    verifying: bool,
    player: Option<&'a str>,
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebGame, JsValue> {
        let now = js_sys::Date::now();
        let settings = Settings::load();
        let delay = settings.verification_delay_ms;
        let verifier = SimulatedVerifier::new(LocalStorageFlagStore, delay);
        let game = Game::new(settings, now as u64, Box::new(verifier))
            .map_err(js_error)?
            .with_epoch(now);
        log::info!("Started new game with seed: {}", now as u64);
        Ok(WebGame { game })
    }

    pub fn connect(&mut self, address: String) {
        self.game.connect(address);
    }

    pub fn disconnect(&mut self) {
        self.game.disconnect();
    }

    /// Returns the new advertisement id
    pub fn register_ad(&mut self, brand: String, logo: String, bid: f64) -> Result<f64, JsValue> {
        let mut registration = AdRegistration::new(brand, logo, bid);
        if let Some(player) = self.game.player() {
            registration = registration.with_advertiser(player);
        }
        self.game
            .register_ad(registration)
            .map(|id| id as f64)
            .map_err(js_error)
    }

    pub fn start(&mut self, prize_mode: bool) -> Result<(), JsValue> {
        let mode = if prize_mode {
            RoundMode::Prize
        } else {
            RoundMode::Practice
        };
        self.game.start(mode).map_err(js_error)
    }

    pub fn stop(&mut self) {
        self.game.stop();
    }

    /// Points awarded (0 if the ball was already gone)
    pub fn crush(&mut self, ball_id: u32) -> u32 {
        match self.game.crush(ball_id) {
            HitOutcome::Crushed { points, .. } => points,
            HitOutcome::Missed => 0,
        }
    }

    pub fn update(&mut self, delta_ms: f64) {
        self.game.tick(delta_ms.max(0.0) as u64);
    }

    pub fn verify(&mut self) -> Result<(), JsValue> {
        self.game.verify().map_err(js_error)
    }

    pub fn reset_verification(&mut self) {
        self.game.reset_verification();
    }

    /// Switch rule preset ("classic" or "arcade") and remember it
    pub fn set_preset(&mut self, name: String) -> Result<(), JsValue> {
        let preset = RulesPreset::from_str(&name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown preset: {}", name)))?;
        let settings = Settings::from_preset(preset);
        self.game.set_settings(settings.clone()).map_err(js_error)?;
        settings.save();
        Ok(())
    }

    pub fn set_idle_mode(&mut self, idle: bool) {
        self.game.set_idle_mode(idle);
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        let state = self.game.state();
        let ads = self.game.ads();
        let snapshot = Snapshot {
            preset: self.game.settings().preset.as_str(),
            status: state.status(),
            score: state.round.score,
            time_remaining: state.round.time_remaining,
            combo: state.round.combo.combo,
            balls: &state.balls,
            prize_pool: ads.prize_pool(),
            platform_fee: ads.platform_fee(),
            potential_reward: self.game.potential_reward(),
            sponsors: ads.len(),
            difficulty: self.game.difficulty(),
            verified: self.game.is_verified(),
            verifying: self.game.verification().is_verifying(),
            player: self.game.player(),
        };
        serde_json::to_string(&snapshot).map_err(js_error)
    }

    pub fn leaderboard_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.game.leaderboard()).map_err(js_error)
    }

    pub fn notices_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.drain_notices()).map_err(js_error)
    }

    pub fn events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.drain_events()).map_err(js_error)
    }

    /// Queued score submissions for the page to send to the contract
    pub fn take_submissions_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.take_submissions()).map_err(js_error)
    }

    /// Report the contract's answer for a submission taken earlier.
    /// Returns false once the submission has already timed out.
    pub fn report_submission(&mut self, id: f64, ok: bool, reason: String) -> bool {
        let result = if ok {
            Ok(())
        } else {
            Err(ExternalServiceError::Rejected(reason))
        };
        self.game.report_submission(id as u64, result)
    }
}
