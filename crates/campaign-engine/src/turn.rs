//! Turn resolution: one player action applied to the session state.
//!
//! Order of a turn: affordability gate, cost deduction, d20 skill check,
//! effects, incumbent decay, clock advance (with the primary/election
//! boundary), passive energy regeneration, and finally one history entry
//! tagged with the turn the action was taken on.

use crate::dice::Dice;
use crate::retain_history;
use campaign_core::catalog::{institution_for, ACT_DECLARE_POWER, ACT_REST};
use campaign_core::{
    ActionDefinition, ActionKind, EngineConfig, EventKind, GameSessionState, Phase, PlayerRole,
    TurnEvent,
};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

const MAX_ENERGY: i32 = 100;
const REST_ENERGY: i32 = 30;
const REGEN_ENERGY: i32 = 5;
const CRITICAL_MAGNITUDE: f64 = 1.5;
const GAFFE_PENALTY: i32 = 5;
const SATISFACTION_SHIFT: i32 = 5;
const DECAY_INTERVAL: u32 = 3;
const SERVICES_FLOOR: i32 = 40;
const NOMINATION_PARTY_SUPPORT: i32 = 40;
const COUP_POPULARITY: i32 = 80;
const COUP_MILITARY: i32 = 70;
const COUP_CONGRESS: i32 = 60;

/// A spendable resource named in an action cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Funds,
    Energy,
    Budget,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Funds => "funds",
            Resource::Energy => "energy",
            Resource::Budget => "budget",
        })
    }
}

/// Why a turn was not applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("the game is over")]
    GameOver,
    #[error("insufficient {resource}: required {required}, available {available}")]
    Unaffordable {
        resource: Resource,
        required: i32,
        available: i32,
    },
    #[error("action {action} is not offered to {role:?}")]
    RoleNotPermitted { action: String, role: PlayerRole },
    #[error("action {action} is not available during {phase:?}")]
    PhaseNotPermitted { action: String, phase: Phase },
}

/// Outcome of the d20 skill check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roll {
    pub d20: i32,
    pub stat: i32,
    pub total: i32,
    pub difficulty: i32,
    pub success: bool,
    pub critical: bool,
    pub critical_failure: bool,
}

impl Roll {
    pub fn resolve(d20: i32, stat: i32, difficulty: i32) -> Self {
        let total = d20 + stat;
        Self {
            d20,
            stat,
            total,
            difficulty,
            success: total >= difficulty,
            critical: d20 == 20,
            critical_failure: d20 == 1,
        }
    }
}

/// A resolved turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub state: GameSessionState,
    pub roll: Roll,
    /// The history entry prepended for this action.
    pub event: TurnEvent,
}

/// Check every cost against the matching resource.
pub fn check_affordable(state: &GameSessionState, action: &ActionDefinition) -> Result<(), TurnError> {
    let stats = &state.player_state.stats;
    let checks = [
        (Resource::Funds, action.cost.funds, stats.funds),
        (Resource::Energy, action.cost.energy, stats.energy),
        (Resource::Budget, action.cost.budget, state.governance.budget),
    ];
    for (resource, required, available) in checks {
        if required > 0 && available < required {
            return Err(TurnError::Unaffordable {
                resource,
                required,
                available,
            });
        }
    }
    Ok(())
}

/// Role and phase preconditions.
///
/// The resolver does not call this; action availability is the host's
/// concern. Hosts wanting strict play call it before [`try_process_turn`].
pub fn check_action_allowed(state: &GameSessionState, action: &ActionDefinition) -> Result<(), TurnError> {
    let role = state.player_state.role;
    if !action.offered_to(role, state.victory_config.kind) {
        return Err(TurnError::RoleNotPermitted {
            action: action.id.0.clone(),
            role,
        });
    }
    if let Some(phase) = action.required_phase {
        if phase != state.phase {
            return Err(TurnError::PhaseNotPermitted {
                action: action.id.0.clone(),
                phase: state.phase,
            });
        }
    }
    Ok(())
}

/// Resolve one action, reporting why it was rejected if it was.
pub fn try_process_turn(
    cfg: &EngineConfig,
    state: &GameSessionState,
    action: &ActionDefinition,
    dice: &mut impl Dice,
) -> Result<TurnOutcome, TurnError> {
    if state.game_over {
        return Err(TurnError::GameOver);
    }
    check_affordable(state, action)?;

    let mut next = state.clone();
    {
        let stats = &mut next.player_state.stats;
        stats.funds -= action.cost.funds;
        stats.energy -= action.cost.energy;
        next.governance.budget -= action.cost.budget;
    }

    let stat = state.player_state.character.stats.get(action.stat_modifier);
    let roll = Roll::resolve(dice.d20(), stat, action.difficulty);
    let (message, kind) = apply_effects(&mut next, action, &roll);

    apply_incumbent_decay(&mut next, state.current_turn);

    if !next.game_over {
        advance_clock(cfg, &mut next);
    }
    if action.id.as_str() != ACT_REST && !next.game_over {
        let stats = &mut next.player_state.stats;
        stats.energy = (stats.energy + REGEN_ENERGY).min(MAX_ENERGY);
    }

    let event = TurnEvent::new(state.current_turn, message, kind);
    next.turn_history.insert(0, event.clone());
    retain_history(cfg, &mut next.turn_history);

    debug!(
        turn = state.current_turn,
        action = %action.id,
        d20 = roll.d20,
        total = roll.total,
        dc = roll.difficulty,
        outcome = ?kind,
        "turn resolved"
    );
    Ok(TurnOutcome {
        state: next,
        roll,
        event,
    })
}

/// Resolve one action. A rejected action returns the input state unchanged.
pub fn process_turn(
    cfg: &EngineConfig,
    state: &GameSessionState,
    action: &ActionDefinition,
    dice: &mut impl Dice,
) -> GameSessionState {
    match try_process_turn(cfg, state, action, dice) {
        Ok(outcome) => outcome.state,
        Err(err) => {
            warn!(action = %action.id, turn = state.current_turn, %err, "turn rejected");
            state.clone()
        }
    }
}

fn apply_effects(state: &mut GameSessionState, action: &ActionDefinition, roll: &Roll) -> (String, EventKind) {
    match action.id.as_str() {
        ACT_REST => {
            let stats = &mut state.player_state.stats;
            stats.energy = (stats.energy + REST_ENERGY).min(MAX_ENERGY);
            return ("Rested and recovered 30 energy.".to_string(), EventKind::Info);
        }
        ACT_DECLARE_POWER => return declare_power(state, roll),
        _ => {}
    }

    let mut message = format!(
        "[{}] {}: Rolled {} + {} = {} (DC {}).",
        action.kind.as_str(),
        action.name,
        roll.d20,
        roll.stat,
        roll.total,
        roll.difficulty
    );

    if !roll.success {
        if roll.critical_failure {
            let stats = &mut state.player_state.stats;
            stats.popularity = (stats.popularity - GAFFE_PENALTY).max(0);
            message.push_str(" CRITICAL FAILURE! Major gaffe committed.");
            return (message, EventKind::Critical);
        }
        message.push_str(" Little to no effect.");
        return (message, EventKind::Failure);
    }

    let magnitude = if roll.critical { CRITICAL_MAGNITUDE } else { 1.0 };
    let scaled = |base: i32| (f64::from(base) * magnitude).floor() as i32;
    let stats = &mut state.player_state.stats;
    match action.kind {
        ActionKind::Campaign => {
            stats.popularity += scaled(3);
            message.push_str(" Public support increased.");
        }
        ActionKind::Party => {
            stats.party_support += scaled(3);
            stats.funds += scaled(10);
            message.push_str(" Party standing improved.");
        }
        ActionKind::Governance => {
            state.governance.services += scaled(5);
            state.governance.economy += scaled(2);
            stats.popularity += scaled(4);
            stats.coherence += 2;
            for group in &mut state.demographics {
                group.satisfaction = group.satisfaction.saturating_add(SATISFACTION_SHIFT);
            }
            message.push_str(" Public services improved. Satisfaction up.");
        }
        ActionKind::Attack => {
            stats.popularity += scaled(3);
            for group in &mut state.demographics {
                group.satisfaction = group.satisfaction.saturating_add(-SATISFACTION_SHIFT);
            }
            message.push_str(" Effective criticism. Public satisfaction dropped.");
        }
        ActionKind::Institution => {
            if let Some(which) = institution_for(&action.id) {
                *state.institutions.get_mut(which) += scaled(5);
            }
            message.push_str(" Institutional support grew.");
        }
        ActionKind::Research | ActionKind::Policy | ActionKind::Personal => {}
    }
    (message, EventKind::Success)
}

/// The coup attempt always ends the game; only a successful roll with
/// overwhelming popularity and institutional backing wins it.
fn declare_power(state: &mut GameSessionState, roll: &Roll) -> (String, EventKind) {
    let popularity = state.player_state.stats.popularity;
    let inst = state.institutions;
    let seized = roll.success
        && popularity > COUP_POPULARITY
        && inst.military > COUP_MILITARY
        && inst.congress > COUP_CONGRESS;
    state.game_over = true;
    state.winner = Some(seized);
    info!(
        seized,
        d20 = roll.d20,
        popularity,
        military = inst.military,
        congress = inst.congress,
        "state of exception declared"
    );
    if seized {
        (
            "STATE OF EXCEPTION DECLARED. YOU HAVE SEIZED ABSOLUTE POWER. VICTORY!".to_string(),
            EventKind::Success,
        )
    } else {
        (
            "The coup failed! You have been impeached and arrested.".to_string(),
            EventKind::Critical,
        )
    }
}

/// Governing wears the city down: every third turn economy, services and
/// security each lose a point, and poor services cost popularity every turn.
fn apply_incumbent_decay(state: &mut GameSessionState, turn: u32) {
    if state.player_state.role != PlayerRole::Incumbent {
        return;
    }
    let gov = &mut state.governance;
    if turn % DECAY_INTERVAL == 0 {
        gov.economy -= 1;
        gov.services -= 1;
        gov.security -= 1;
    }
    if gov.services < SERVICES_FLOOR {
        state.player_state.stats.popularity -= 1;
    }
}

fn advance_clock(cfg: &EngineConfig, state: &mut GameSessionState) {
    state.current_turn += 1;
    if state.current_turn > cfg.primary_end_turn && state.phase == Phase::Primary {
        state.phase = Phase::Election;
        let office = state
            .player_state
            .target_office
            .clone()
            .unwrap_or_else(|| "office".to_string());
        let nominated = state.player_state.stats.party_support >= NOMINATION_PARTY_SUPPORT;
        let event = if nominated {
            TurnEvent::new(
                state.current_turn,
                format!("CONVENTION: You are the official nominee for {office}!"),
                EventKind::Success,
            )
        } else {
            TurnEvent::new(
                state.current_turn,
                format!("CONVENTION: Party support too low. You were denied the ticket for {office}."),
                EventKind::Critical,
            )
        };
        info!(turn = state.current_turn, nominated, "election phase begins");
        state.turn_history.insert(0, event);
    }
}
