#![deny(warnings)]

//! Utility-based auto-play for headless campaigns.
//!
//! Each action is scored as expected gain (success probability times the
//! value of what it improves, weighted by the player's current needs) minus
//! the risk of a gaffe and the drain on scarce resources.

use anyhow::Context;
use campaign_core::catalog::{ACT_DECLARE_POWER, ACT_REST};
use campaign_core::{ActionDefinition, ActionKind, GameSessionState, PlayerRole, VictoryType};
use campaign_engine::check_affordable;
use serde::Deserialize;
use tracing::debug;

const NOMINATION_PARTY_SUPPORT: i32 = 40;
const ELECTION_POPULARITY: i32 = 50;

/// Tunable weights for [`utility`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Weights {
    pub popularity: f32,
    pub party_support: f32,
    pub funds: f32,
    pub services: f32,
    pub institution: f32,
    /// Value of a point of energy when energy is low.
    pub energy: f32,
    /// Penalty per point of popularity lost to a gaffe.
    pub gaffe: f32,
    /// Energy the bot tries to keep in reserve.
    pub energy_reserve: i32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            popularity: 1.0,
            party_support: 1.0,
            funds: 0.1,
            services: 0.3,
            institution: 0.8,
            energy: 0.12,
            gaffe: 1.0,
            energy_reserve: 25,
        }
    }
}

impl Weights {
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("parsing AI weights")
    }
}

/// Chance that `d20 + stat >= difficulty`.
pub fn success_probability(stat: i32, difficulty: i32) -> f32 {
    let faces = (1..=20).filter(|d20| d20 + stat >= difficulty).count();
    faces as f32 / 20.0
}

/// Whether the compound coup condition holds before the roll.
pub fn coup_ready(state: &GameSessionState) -> bool {
    state.player_state.stats.popularity > 80
        && state.institutions.military > 70
        && state.institutions.congress > 60
}

/// Score `action` for the current state. Higher is better; `f32::NEG_INFINITY`
/// marks an action the bot must never take.
pub fn utility(state: &GameSessionState, action: &ActionDefinition, w: &Weights) -> f32 {
    let stats = &state.player_state.stats;
    if action.id.as_str() == ACT_DECLARE_POWER {
        return if coup_ready(state) {
            1000.0 * success_probability(
                state.player_state.character.stats.get(action.stat_modifier),
                action.difficulty,
            )
        } else {
            f32::NEG_INFINITY
        };
    }
    if action.id.as_str() == ACT_REST {
        let missing = (100 - stats.energy).max(0) as f32;
        return missing * w.energy;
    }

    let stat = state.player_state.character.stats.get(action.stat_modifier);
    let p = success_probability(stat, action.difficulty);

    // Party support matters most while the nomination is still open.
    let party_need = if state.player_state.role == PlayerRole::Candidate
        && stats.party_support < NOMINATION_PARTY_SUPPORT
    {
        2.0
    } else {
        0.5
    };
    let gain = match action.kind {
        ActionKind::Campaign | ActionKind::Attack => 3.0 * w.popularity,
        ActionKind::Party => 3.0 * w.party_support * party_need + 10.0 * w.funds,
        ActionKind::Governance => 4.0 * w.popularity + 5.0 * w.services,
        ActionKind::Institution if state.victory_config.kind == VictoryType::Dictator => {
            5.0 * w.institution
        }
        ActionKind::Institution => 0.0,
        ActionKind::Research | ActionKind::Policy | ActionKind::Personal => 0.2,
    };

    let gaffe_risk = if 1 + stat < action.difficulty {
        0.05 * 5.0 * w.gaffe
    } else {
        0.0
    };
    let energy_left = stats.energy - action.cost.energy;
    let reserve_penalty = if energy_left < w.energy_reserve {
        (w.energy_reserve - energy_left) as f32 * w.energy
    } else {
        0.0
    };
    let spend = action.cost.funds as f32 * w.funds;

    p * gain - gaffe_risk - reserve_penalty - spend
}

/// Best affordable action from `actions`, earliest wins ties.
pub fn choose_action<'a>(
    state: &GameSessionState,
    actions: &[&'a ActionDefinition],
    w: &Weights,
) -> Option<&'a ActionDefinition> {
    let mut best: Option<(&'a ActionDefinition, f32)> = None;
    for &action in actions {
        if check_affordable(state, action).is_err() {
            continue;
        }
        let score = utility(state, action, w);
        if score == f32::NEG_INFINITY {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((action, score));
        }
    }
    if let Some((action, score)) = best {
        debug!(turn = state.current_turn, action = %action.id, score, "bot choice");
    }
    best.map(|(action, _)| action)
}

/// Deterministic election result for headless play.
///
/// A candidate also needs the party nomination.
pub fn election_won(state: &GameSessionState) -> bool {
    let stats = &state.player_state.stats;
    let nominated = state.player_state.role != PlayerRole::Candidate
        || stats.party_support >= NOMINATION_PARTY_SUPPORT;
    nominated && stats.popularity >= ELECTION_POPULARITY
}
