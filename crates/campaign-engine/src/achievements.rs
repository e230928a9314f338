//! Achievements unlocked by a finished game.

use campaign_core::GameSessionState;
use serde::{Deserialize, Serialize};

const CROWD_FAVOURITE_POPULARITY: i32 = 90;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Finished the game as a winner.
    FirstElection,
    /// Ended with popularity of 90 or more.
    CrowdFavourite,
}

impl Achievement {
    pub fn id(self) -> &'static str {
        match self {
            Achievement::FirstElection => "first_election",
            Achievement::CrowdFavourite => "crowd_favourite",
        }
    }
}

/// Achievements earned by `state`. Running games earn nothing.
pub fn evaluate_achievements(state: &GameSessionState) -> Vec<Achievement> {
    let mut unlocked = Vec::new();
    if !state.game_over {
        return unlocked;
    }
    if state.winner == Some(true) {
        unlocked.push(Achievement::FirstElection);
    }
    if state.player_state.stats.popularity >= CROWD_FAVOURITE_POPULARITY {
        unlocked.push(Achievement::CrowdFavourite);
    }
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[test]
    fn running_game_unlocks_nothing() {
        let mut s = testkit::fresh_state();
        s.player_state.stats.popularity = 95;
        assert!(evaluate_achievements(&s).is_empty());
    }

    #[test]
    fn winner_and_popularity_unlock() {
        let mut s = testkit::fresh_state();
        s.game_over = true;
        s.winner = Some(true);
        s.player_state.stats.popularity = 90;
        assert_eq!(
            evaluate_achievements(&s),
            vec![Achievement::FirstElection, Achievement::CrowdFavourite]
        );
        s.winner = Some(false);
        assert_eq!(evaluate_achievements(&s), vec![Achievement::CrowdFavourite]);
    }

    #[test]
    fn ids_match_wire_names() {
        for a in [Achievement::FirstElection, Achievement::CrowdFavourite] {
            let json = serde_json::to_string(&a).unwrap();
            assert_eq!(json, format!("\"{}\"", a.id()));
        }
    }
}
