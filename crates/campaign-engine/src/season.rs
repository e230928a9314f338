//! Season boundary: victory checks, electorate drift and the next-season reset.

use crate::dice::Dice;
use crate::retain_history;
use campaign_core::{
    DemographicGroup, EngineConfig, EventKind, GameSessionState, Phase, PlayerRole, Sphere,
    TurnEvent, VictoryType,
};
use tracing::{debug, info};

const DRIFT_POPULARITY: i32 = 70;
const DRIFT_SUPPORT: i32 = 5;
const SEASON_FUNDS_BONUS: i32 = 50;
const SEASON_ENERGY: i32 = 100;

/// Whether a session is still being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VictoryStatus {
    InProgress,
    Won,
    Lost,
}

pub fn victory_status(state: &GameSessionState) -> VictoryStatus {
    match (state.game_over, state.winner) {
        (false, _) => VictoryStatus::InProgress,
        (true, Some(true)) => VictoryStatus::Won,
        (true, _) => VictoryStatus::Lost,
    }
}

/// Shift the electorate toward a popular player.
///
/// Above 70 popularity one random group gains 5 support and, on a coin flip,
/// swaps its top demand for the player's first agenda issue.
pub fn apply_demographic_drift(state: &GameSessionState, dice: &mut impl Dice) -> Vec<DemographicGroup> {
    let mut groups = state.demographics.clone();
    if state.player_state.stats.popularity <= DRIFT_POPULARITY || groups.is_empty() {
        return groups;
    }
    let idx = dice.pick(groups.len());
    let group = &mut groups[idx];
    group.support = group.support.saturating_add(DRIFT_SUPPORT);

    if let Some(issue) = state.player_state.agenda.first() {
        if !group.demands.contains(issue) && dice.coin() {
            match group.demands.first_mut() {
                Some(top) => *top = issue.clone(),
                None => group.demands.push(issue.clone()),
            }
        }
    }
    debug!(group = %group.id, support = group.support.value(), "demographic drift");
    groups
}

/// Close the season. Either ends the game on a victory condition or resets
/// the clock for season N+1 with progress carried over.
///
/// A finished game is returned unchanged.
pub fn start_next_season(
    cfg: &EngineConfig,
    state: &GameSessionState,
    won_election: bool,
    dice: &mut impl Dice,
) -> GameSessionState {
    if state.game_over {
        return state.clone();
    }
    let player = &state.player_state;
    let next_season = player.season + 1;
    let victory = state.victory_config;

    if victory.kind == VictoryType::Cycles && next_season > victory.value {
        return finish(cfg, state, "Game Over! Cycle limit reached.", EventKind::Info);
    }
    if victory.kind == VictoryType::Office && won_election && player.sphere.level() >= victory.value {
        return finish(
            cfg,
            state,
            "Victory! You have achieved the target office.",
            EventKind::Success,
        );
    }

    let demographics = apply_demographic_drift(state, dice);
    let mut next = state.clone();
    next.current_turn = 1;
    next.phase = Phase::Primary;
    next.demographics = demographics;

    let promoted = won_election && player.sphere == Sphere::Municipal;
    let ps = &mut next.player_state;
    ps.season = next_season;
    ps.role = if won_election {
        PlayerRole::Incumbent
    } else {
        PlayerRole::Opposition
    };
    ps.current_office = if won_election {
        player.target_office.clone()
    } else {
        None
    };
    if promoted {
        ps.sphere = Sphere::State;
    }
    ps.target_office = Some(if promoted { "Governor" } else { "President" }.to_string());
    ps.stats.energy = SEASON_ENERGY;
    ps.stats.funds += SEASON_FUNDS_BONUS;

    let title = match (&ps.role, &ps.current_office) {
        (PlayerRole::Incumbent, Some(office)) => office.clone(),
        (PlayerRole::Incumbent, None) => "office holder".to_string(),
        _ => "Opposition Leader".to_string(),
    };
    info!(
        room = %state.room_id,
        season = next_season,
        role = ?ps.role,
        sphere = ?ps.sphere,
        "season started"
    );
    next.turn_history.insert(
        0,
        TurnEvent::new(
            1,
            format!("Season {next_season} Begins! You are now the {title}. Public opinion has shifted slightly."),
            EventKind::Info,
        ),
    );
    retain_history(cfg, &mut next.turn_history);
    next
}

fn finish(cfg: &EngineConfig, state: &GameSessionState, message: &str, kind: EventKind) -> GameSessionState {
    let mut next = state.clone();
    next.game_over = true;
    next.winner = Some(true);
    next.turn_history
        .insert(0, TurnEvent::new(state.current_turn, message, kind));
    retain_history(cfg, &mut next.turn_history);
    info!(
        room = %state.room_id,
        season = state.player_state.season,
        victory = ?state.victory_config.kind,
        "game won"
    );
    next
}
