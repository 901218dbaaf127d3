//! Game session
//!
//! Owns the sponsor book, the simulation, the leaderboard and the external
//! collaborators (verification, score submission). Hosts drive it with
//! `tick(delta_ms)` and feed clicks through `crush`.
//!
//! External calls never block the loop: verification is polled each tick
//! and score submissions queue in an outbox the host flushes when it can.
//! A submission the host took but never answered times out from `tick`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ads::{AdBook, AdRegistration, catalog_advertisements};
use crate::error::{ExternalServiceError, GameError, SettingsError};
use crate::identity::{VerificationStatus, Verifier};
use crate::leaderboard::Leaderboard;
use crate::settings::Settings;
use crate::sim::{self, GameEvent, GameState, HitOutcome, RoundMode, RoundRules, RoundSummary};

/// Score submission label for players without an identity string
const ANONYMOUS: &str = "Anonymous";

/// A settled score waiting for the external sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub id: u64,
    pub round: u32,
    pub score: u64,
    pub verified: bool,
    pub player_label: String,
}

/// Destination for settled scores (on-chain contract, web API, ...)
pub trait ScoreSink {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), ExternalServiceError>;
}

/// Sink that keeps accepted submissions in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreSink {
    pub accepted: Vec<ScoreSubmission>,
}

impl ScoreSink for MemoryScoreSink {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), ExternalServiceError> {
        self.accepted.push(submission.clone());
        Ok(())
    }
}

/// User-facing notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    AdRegistered {
        ad_id: u64,
        brand: String,
        bid: f64,
    },
    /// Settled round plus its share of the prize pool at that moment
    RoundOver {
        summary: RoundSummary,
        potential_reward: f64,
    },
    LeaderboardUpdated {
        player: String,
        rank: usize,
    },
    /// Round finished without a connected identity; nothing was persisted
    ScoreNotPersisted {
        round: u32,
    },
    VerificationStarted,
    Verified,
    ScoreSubmitted {
        round: u32,
        score: u64,
    },
    SubmissionFailed {
        round: u32,
        reason: String,
    },
}

/// A submission handed to the host, waiting for its answer
#[derive(Debug, Clone)]
struct InFlight {
    submission: ScoreSubmission,
    /// Session clock (ms) when the host took it
    taken_at: u64,
}

pub struct Game {
    settings: Settings,
    ads: AdBook,
    state: GameState,
    leaderboard: Leaderboard,
    verifier: Box<dyn Verifier>,
    player: Option<String>,
    idle_mode: bool,
    /// Wall clock (unix ms) at simulation clock 0
    epoch_ms: f64,
    outbox: VecDeque<ScoreSubmission>,
    in_flight: Vec<InFlight>,
    next_submission: u64,
    notices: Vec<Notice>,
    events: Vec<GameEvent>,
    last_summary: Option<RoundSummary>,
    last_reward: Option<f64>,
}

impl Game {
    /// Create a session; the settings must pass `Settings::validate`
    pub fn new(
        settings: Settings,
        seed: u64,
        verifier: Box<dyn Verifier>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            ads: AdBook::from_settings(&settings),
            settings,
            state: GameState::new(seed),
            leaderboard: Leaderboard::new(),
            verifier,
            player: None,
            idle_mode: false,
            epoch_ms: 0.0,
            outbox: VecDeque::new(),
            in_flight: Vec::new(),
            next_submission: 1,
            notices: Vec::new(),
            events: Vec::new(),
            last_summary: None,
            last_reward: None,
        })
    }

    /// Anchor the simulation clock to wall time for timestamps
    pub fn with_epoch(mut self, epoch_ms: f64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the rules; a running round keeps the rules it started with
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.ads.configure(&settings);
        log::info!("Rules preset now {}", settings.preset.as_str());
        self.settings = settings;
        Ok(())
    }

    pub fn ads(&self) -> &AdBook {
        &self.ads
    }

    pub fn ads_mut(&mut self) -> &mut AdBook {
        &mut self.ads
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn last_summary(&self) -> Option<&RoundSummary> {
        self.last_summary.as_ref()
    }

    /// Prize pool share earned by the last settled round
    pub fn potential_reward(&self) -> Option<f64> {
        self.last_reward
    }

    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    /// Current wall clock in unix ms
    pub fn now(&self) -> f64 {
        self.epoch_ms + self.state.clock_ms as f64
    }

    pub fn connect(&mut self, player: impl Into<String>) {
        let player = player.into();
        log::info!("Player connected: {}", player);
        self.player = Some(player);
    }

    pub fn disconnect(&mut self) {
        self.player = None;
    }

    pub fn set_idle_mode(&mut self, idle: bool) {
        self.idle_mode = idle;
    }

    pub fn verification(&self) -> VerificationStatus {
        self.verifier.status()
    }

    pub fn is_verified(&self) -> bool {
        self.verifier.is_verified()
    }

    /// Current difficulty from registered spend
    pub fn difficulty(&self) -> f64 {
        sim::difficulty(self.ads.ads(), self.ads.min_bid())
    }

    /// Accept a sponsor registration
    ///
    /// Registering mid-round speeds up the running round.
    pub fn register_ad(&mut self, registration: AdRegistration) -> Result<u64, GameError> {
        let now = self.now();
        let ad = self.ads.register(registration, now)?;
        let notice = Notice::AdRegistered {
            ad_id: ad.id,
            brand: ad.brand_name.clone(),
            bid: ad.bid,
        };
        let ad_id = ad.id;
        self.notices.push(notice);

        if self.state.is_running() {
            let difficulty = self.difficulty();
            sim::set_difficulty(&mut self.state, difficulty);
        }
        Ok(ad_id)
    }

    /// Start a round from registered ads, or the catalog when none exist
    pub fn start(&mut self, mode: RoundMode) -> Result<(), GameError> {
        if mode == RoundMode::Prize {
            let pool = self.ads.prize_pool();
            if pool < self.settings.prize_mode_threshold {
                return Err(GameError::PrizePoolTooSmall {
                    pool,
                    required: self.settings.prize_mode_threshold,
                });
            }
        }

        let rules = RoundRules::from(&self.settings);
        let result = if !self.ads.is_empty() {
            let difficulty = self.difficulty();
            sim::start(&mut self.state, self.ads.ads(), difficulty, rules, mode)
        } else if self.settings.fallback_catalog {
            log::info!("No sponsors registered, using the brand catalog");
            let catalog = catalog_advertisements(self.settings.min_bid);
            sim::start(&mut self.state, &catalog, 1.0, rules, mode)
        } else {
            Err(GameError::NoAdvertisements)
        };

        // A restart may have settled the previous round
        self.process_events();
        result
    }

    /// Crush a clicked ball right away
    pub fn crush(&mut self, ball_id: u32) -> HitOutcome {
        let verified = self.is_verified();
        let outcome = sim::hit(&mut self.state, ball_id, verified);
        self.process_events();
        outcome
    }

    /// End the running round early
    pub fn stop(&mut self) -> Option<RoundSummary> {
        let summary = sim::end(&mut self.state, sim::EndReason::Stopped);
        self.process_events();
        summary
    }

    /// Ask the verification provider to verify the connected player
    pub fn verify(&mut self) -> Result<(), GameError> {
        if self.player.is_none() {
            return Err(ExternalServiceError::NotConnected.into());
        }
        if self.verifier.status() == VerificationStatus::Unverified {
            self.verifier.begin(self.state.clock_ms)?;
            self.notices.push(Notice::VerificationStarted);
        }
        Ok(())
    }

    pub fn reset_verification(&mut self) {
        self.verifier.reset();
    }

    /// Advance timers, physics and pending external checks
    pub fn tick(&mut self, delta_ms: u64) {
        let now = self.state.clock_ms.saturating_add(delta_ms);
        let was_verified = self.verifier.is_verified();
        let status = self.verifier.poll(now);
        if status.is_verified() && !was_verified {
            self.notices.push(Notice::Verified);
        }

        let input = sim::TickInput {
            hits: Vec::new(),
            verified: status.is_verified(),
            stop: false,
            idle_mode: self.idle_mode,
        };
        sim::tick(&mut self.state, &input, delta_ms);
        self.process_events();
        self.expire_submissions();
    }

    /// Route simulation events; settlement happens here
    fn process_events(&mut self) {
        for event in self.state.drain_events() {
            if let GameEvent::RoundEnded(summary) = &event {
                self.settle(summary.clone());
            }
            self.events.push(event);
        }
    }

    fn settle(&mut self, summary: RoundSummary) {
        let verified = self.verifier.is_verified();
        match self.player.clone() {
            Some(player) => {
                let rank = self.leaderboard.record_round(
                    &player,
                    summary.score,
                    summary.time_played_secs,
                    verified,
                    self.now(),
                );
                self.notices.push(Notice::LeaderboardUpdated {
                    player: player.clone(),
                    rank,
                });

                if summary.score > 0 {
                    let player_label = if player.is_empty() {
                        ANONYMOUS.to_string()
                    } else {
                        player.chars().take(10).collect()
                    };
                    let submission = ScoreSubmission {
                        id: self.next_submission,
                        round: summary.round,
                        score: summary.score,
                        verified,
                        player_label,
                    };
                    self.next_submission += 1;
                    self.outbox.push_back(submission);
                }
            }
            None => {
                log::info!("Round {} not persisted: no player connected", summary.round);
                self.notices.push(Notice::ScoreNotPersisted {
                    round: summary.round,
                });
            }
        }

        let potential_reward = self.ads.potential_reward(summary.score);
        log::info!(
            "Round {} potential reward ${:.2}",
            summary.round,
            potential_reward
        );
        self.notices.push(Notice::RoundOver {
            summary: summary.clone(),
            potential_reward,
        });
        self.last_summary = Some(summary);
        self.last_reward = Some(potential_reward);
    }

    /// Submissions waiting for the external sink
    pub fn pending_submissions(&self) -> impl Iterator<Item = &ScoreSubmission> {
        self.outbox.iter()
    }

    /// Submissions taken by the host and not yet answered
    pub fn in_flight_submissions(&self) -> usize {
        self.in_flight.len()
    }

    /// Hand every queued submission to the host for asynchronous dispatch
    pub fn take_submissions(&mut self) -> Vec<ScoreSubmission> {
        let taken_at = self.state.clock_ms;
        let submissions: Vec<ScoreSubmission> = self.outbox.drain(..).collect();
        for submission in &submissions {
            self.in_flight.push(InFlight {
                submission: submission.clone(),
                taken_at,
            });
        }
        submissions
    }

    /// Record the answer for a taken submission; failures are not retried
    ///
    /// Returns false for an unknown id, including answers arriving after
    /// the submission already timed out.
    pub fn report_submission(&mut self, id: u64, result: Result<(), ExternalServiceError>) -> bool {
        let Some(index) = self.in_flight.iter().position(|f| f.submission.id == id) else {
            log::warn!("Ignoring answer for unknown score submission {}", id);
            return false;
        };
        let submission = self.in_flight.remove(index).submission;
        match result {
            Ok(()) => {
                log::info!(
                    "Score {} for round {} submitted",
                    submission.score,
                    submission.round
                );
                self.notices.push(Notice::ScoreSubmitted {
                    round: submission.round,
                    score: submission.score,
                });
            }
            Err(e) => {
                log::warn!(
                    "Score submission for round {} failed: {}",
                    submission.round,
                    e
                );
                self.notices.push(Notice::SubmissionFailed {
                    round: submission.round,
                    reason: e.to_string(),
                });
            }
        }
        true
    }

    /// Fail submissions the host has held longer than the timeout
    fn expire_submissions(&mut self) {
        let now = self.state.clock_ms;
        let timeout = self.settings.submission_timeout_ms;
        let expired: Vec<u64> = self
            .in_flight
            .iter()
            .filter(|f| now.saturating_sub(f.taken_at) >= timeout)
            .map(|f| f.submission.id)
            .collect();
        for id in expired {
            self.report_submission(id, Err(ExternalServiceError::TimedOut));
        }
    }

    /// Submit everything queued through `sink`
    pub fn flush_submissions(&mut self, sink: &mut dyn ScoreSink) {
        for submission in self.take_submissions() {
            let result = sink.submit(&submission);
            self.report_submission(submission.id, result);
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
