//! Brand Crusher entry point
//!
//! On the web the page drives `brand_crusher::web::WebGame`. Natively this
//! runs one headless demo round with the autoplayer and prints the results.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Brand Crusher (native) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);

    if let Err(e) = demo::run(seed) {
        log::error!("Demo round failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::wasm_start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::error::Error;

    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use brand_crusher::game::MemoryScoreSink;
    use brand_crusher::identity::{MemoryFlagStore, SimulatedVerifier};
    use brand_crusher::leaderboard::{format_play_time, short_identity};
    use brand_crusher::sim::RoundMode;
    use brand_crusher::{AdRegistration, Game, Settings};

    const PLAYER: &str = "0x9f2c4e71b0d35a8866c1e0f4d2b7a9c3e5f10d42";
    /// Upper bound on demo length, in simulated ms
    const MAX_DEMO_MS: u64 = 5 * 60 * 1000;

    pub fn run(seed: u64) -> Result<(), Box<dyn Error>> {
        let settings = Settings::load();
        let frame_ms = settings.physics_tick_ms;
        let delay = settings.verification_delay_ms;
        let verifier = SimulatedVerifier::new(MemoryFlagStore::default(), delay);
        let mut game = Game::new(settings, seed, Box::new(verifier))?;

        let mut rng = Pcg32::seed_from_u64(seed);
        let now = game.now();
        game.ads_mut().seed_demo(&mut rng, now);
        game.register_ad(
            AdRegistration::new("Rustacean Cola", "/logos/crab.png", 7.5).with_advertiser(PLAYER),
        )?;

        game.connect(PLAYER);
        game.verify()?;
        game.set_idle_mode(true);
        game.start(RoundMode::Prize)?;

        let mut elapsed = 0;
        while game.state().is_running() && elapsed < MAX_DEMO_MS {
            game.tick(frame_ms);
            elapsed += frame_ms;
        }

        let mut sink = MemoryScoreSink::default();
        game.flush_submissions(&mut sink);

        for notice in game.drain_notices() {
            log::info!("{:?}", notice);
        }

        if let Some(summary) = game.last_summary() {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        if let Some(reward) = game.potential_reward() {
            println!("Potential reward ${:.4}", reward);
        }
        println!(
            "Prize pool ${:.2}, platform fee ${:.2}, {} sponsors",
            game.ads().prize_pool(),
            game.ads().platform_fee(),
            game.ads().len()
        );
        for (rank, entry) in game.leaderboard().entries.iter().enumerate() {
            println!(
                "#{} {} score {} time {} games {}{}",
                rank + 1,
                short_identity(&entry.player),
                entry.total_score,
                format_play_time(entry.total_time_secs),
                entry.games_played,
                if entry.verified { " (verified)" } else { "" }
            );
        }
        if let Some(leader) = game.leaderboard().leader() {
            println!("Leader: {}", short_identity(&leader.player));
        }
        println!("{} score submission(s) accepted", sink.accepted.len());
        Ok(())
    }
}
