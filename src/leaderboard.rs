//! Player leaderboard
//!
//! One entry per player identity, accumulated across rounds and never
//! removed. Ranked by total time played, then total score.
//! Lives in memory for the session.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Accumulated totals for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Player identity (wallet address)
    pub player: String,
    pub total_score: u64,
    /// Seconds played across all rounds
    pub total_time_secs: u64,
    pub games_played: u32,
    /// Unix timestamp (ms) of the last settled round
    pub last_played_at: f64,
    pub verified: bool,
}

/// Leaderboard ordering: most time played first, score breaks ties
fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.total_time_secs
        .cmp(&a.total_time_secs)
        .then_with(|| b.total_score.cmp(&a.total_score))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Fold a settled round into the player's entry
    ///
    /// Returns the player's rank afterwards (1-indexed).
    pub fn record_round(
        &mut self,
        player: &str,
        score: u64,
        time_played_secs: u64,
        verified: bool,
        timestamp: f64,
    ) -> usize {
        match self.entries.iter_mut().find(|e| e.player == player) {
            Some(entry) => {
                entry.total_score = entry.total_score.saturating_add(score);
                entry.total_time_secs = entry.total_time_secs.saturating_add(time_played_secs);
                entry.games_played += 1;
                entry.last_played_at = timestamp;
                entry.verified |= verified;
            }
            None => self.entries.push(LeaderboardEntry {
                player: player.to_string(),
                total_score: score,
                total_time_secs: time_played_secs,
                games_played: 1,
                last_played_at: timestamp,
                verified,
            }),
        }

        // Stable sort keeps earlier players ahead on full ties
        self.entries.sort_by(rank_order);
        let rank = self
            .entries
            .iter()
            .position(|e| e.player == player)
            .map_or(self.entries.len(), |i| i + 1);
        log::info!(
            "Leaderboard: {} now ranked #{}",
            short_identity(player),
            rank
        );
        rank
    }

    pub fn get(&self, player: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.player == player)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The current leader (if any)
    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }
}

/// Format seconds played as "2h 5m" or "7m"
pub fn format_play_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Shorten an address to "0x1234...abcd"
pub fn short_identity(identity: &str) -> String {
    let chars: Vec<char> = identity.chars().collect();
    if chars.len() <= 10 {
        return identity.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_round_creates_entry() {
        let mut board = Leaderboard::new();
        assert_eq!(board.record_round("0xaaa", 120, 60, false, 1.0), 1);
        let entry = board.get("0xaaa").expect("created");
        assert_eq!(entry.games_played, 1);
        assert_eq!(entry.total_score, 120);
        assert_eq!(entry.total_time_secs, 60);
    }

    #[test]
    fn test_rounds_accumulate() {
        let mut board = Leaderboard::new();
        board.record_round("0xaaa", 100, 60, false, 1.0);
        board.record_round("0xaaa", 50, 20, true, 2.0);
        assert_eq!(board.len(), 1);
        let entry = board.get("0xaaa").expect("exists");
        assert_eq!(entry.total_score, 150);
        assert_eq!(entry.total_time_secs, 80);
        assert_eq!(entry.games_played, 2);
        assert_eq!(entry.last_played_at, 2.0);
        assert!(entry.verified);
    }

    #[test]
    fn test_sorted_by_time_then_score() {
        let mut board = Leaderboard::new();
        board.record_round("high-score", 900, 10, false, 1.0);
        board.record_round("long-play", 10, 60, false, 1.0);
        board.record_round("tie-better", 500, 10, false, 1.0);
        let order: Vec<&str> = board.entries.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(order, vec!["long-play", "high-score", "tie-better"]);
        assert_eq!(board.leader().map(|e| e.player.as_str()), Some("long-play"));
    }

    #[test]
    fn test_rank_moves_up() {
        let mut board = Leaderboard::new();
        board.record_round("a", 0, 30, false, 1.0);
        assert_eq!(board.record_round("b", 0, 20, false, 1.0), 2);
        assert_eq!(board.record_round("b", 0, 20, false, 2.0), 1);
    }

    #[test]
    fn test_format_play_time() {
        assert_eq!(format_play_time(59), "0m");
        assert_eq!(format_play_time(125), "2m");
        assert_eq!(format_play_time(3600 + 5 * 60), "1h 5m");
    }

    #[test]
    fn test_short_identity() {
        assert_eq!(
            short_identity("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234...5678"
        );
        assert_eq!(short_identity("0xabc"), "0xabc");
    }
}
