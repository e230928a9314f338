#![deny(warnings)]

//! Campaign rules engine.
//!
//! Every operation is a pure function from the current
//! [`GameSessionState`] (plus input) to a new state; the caller owns
//! persistence. Randomness enters only through [`dice::Dice`].

pub mod achievements;
pub mod dice;
pub mod generator;
pub mod init;
pub mod platform;
pub mod season;
pub mod turn;

pub use achievements::{evaluate_achievements, Achievement};
pub use dice::{Dice, RngDice, ScriptedDice, SeededDice};
pub use generator::generate_character;
pub use init::{generate_demographics, initialize_game};
pub use platform::{toggle_agenda_item, toggle_proposal, update_platform, PlatformError};
pub use season::{apply_demographic_drift, start_next_season, victory_status, VictoryStatus};
pub use turn::{
    check_action_allowed, check_affordable, process_turn, try_process_turn, Resource, Roll,
    TurnError, TurnOutcome,
};

use campaign_core::{
    validate_engine_config, validate_room, ActionDefinition, ArchetypeId, Catalog, Character,
    EngineConfig, GameSessionState, Issue, IssueId, PlayerRole, PoliticalParty, Proposal,
    ProposalId, RoomConfig, TurnEvent, ValidationError, VictoryType,
};
use thiserror::Error;

/// Errors from engine setup operations. Turn and season resolution never fail.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),
    #[error("unknown party: {0}")]
    UnknownParty(String),
    #[error("invalid room: {0}")]
    InvalidRoom(#[source] ValidationError),
    #[error("invalid engine config: {0}")]
    InvalidConfig(#[source] ValidationError),
}

/// Drop history beyond the configured limit, keeping the newest entries.
pub(crate) fn retain_history(cfg: &EngineConfig, history: &mut Vec<TurnEvent>) {
    if let Some(limit) = cfg.history_limit {
        history.truncate(limit);
    }
}

/// Content catalog and tuning bundled behind the host-facing operations.
#[derive(Clone, Debug)]
pub struct Engine {
    catalog: Catalog,
    config: EngineConfig,
}

impl Engine {
    pub fn new(catalog: Catalog, config: EngineConfig) -> Result<Self, EngineError> {
        validate_engine_config(&config).map_err(EngineError::InvalidConfig)?;
        Ok(Self { catalog, config })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generate_character(
        &self,
        archetype_id: &ArchetypeId,
        dice: &mut impl Dice,
    ) -> Result<Character, EngineError> {
        generator::generate_character(&self.catalog, archetype_id, dice)
    }

    /// Look up a party by id for [`Engine::initialize_game`].
    pub fn party(&self, id: &str) -> Result<PoliticalParty, EngineError> {
        self.catalog
            .party(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownParty(id.to_string()))
    }

    pub fn initialize_game(
        &self,
        room: &RoomConfig,
        character: Character,
        party: PoliticalParty,
    ) -> Result<GameSessionState, EngineError> {
        validate_room(room).map_err(EngineError::InvalidRoom)?;
        let mut state = init::initialize_game(&self.config, room, character, party);
        retain_history(&self.config, &mut state.turn_history);
        Ok(state)
    }

    pub fn update_platform(
        &self,
        state: &GameSessionState,
        agenda: Vec<IssueId>,
        program: Vec<ProposalId>,
    ) -> GameSessionState {
        platform::update_platform(state, agenda, program)
    }

    pub fn process_turn(
        &self,
        state: &GameSessionState,
        action: &ActionDefinition,
        dice: &mut impl Dice,
    ) -> GameSessionState {
        turn::process_turn(&self.config, state, action, dice)
    }

    pub fn try_process_turn(
        &self,
        state: &GameSessionState,
        action: &ActionDefinition,
        dice: &mut impl Dice,
    ) -> Result<TurnOutcome, TurnError> {
        turn::try_process_turn(&self.config, state, action, dice)
    }

    pub fn start_next_season(
        &self,
        state: &GameSessionState,
        won_election: bool,
        dice: &mut impl Dice,
    ) -> GameSessionState {
        season::start_next_season(&self.config, state, won_election, dice)
    }

    pub fn available_actions(&self, role: PlayerRole, victory: VictoryType) -> Vec<&ActionDefinition> {
        self.catalog.available_actions(role, victory)
    }

    pub fn issues(&self) -> &[Issue] {
        self.catalog.issues()
    }

    pub fn proposals(&self, issue: &IssueId) -> Vec<&Proposal> {
        self.catalog.proposals_for(issue)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::{validate_session, ActionId, EventKind};

    fn engine(history_limit: Option<usize>) -> Engine {
        Engine::new(
            Catalog::default(),
            EngineConfig {
                history_limit,
                ..EngineConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_inverted_turn_limits() {
        let cfg = EngineConfig {
            max_turns: 10,
            primary_end_turn: 12,
            history_limit: None,
        };
        assert!(matches!(
            Engine::new(Catalog::default(), cfg),
            Err(EngineError::InvalidConfig(_))
        ));
        let cfg = EngineConfig {
            history_limit: Some(0),
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(Catalog::default(), cfg),
            Err(EngineError::InvalidConfig(ValidationError::EmptyHistoryLimit))
        ));
    }

    #[test]
    fn rejects_rooms_without_a_city() {
        let e = engine(None);
        let mut room = testkit::room();
        room.location.city = "  ".to_string();
        let err = e
            .initialize_game(&room, testkit::character(), testkit::party())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRoom(ValidationError::EmptyCity)));
        assert!(matches!(e.party("party_x"), Err(EngineError::UnknownParty(_))));
    }

    #[test]
    fn history_limit_keeps_newest_entries() {
        let e = engine(Some(3));
        let rest = e.catalog().action(&ActionId::from("act_rest")).unwrap().clone();
        let mut s = e
            .initialize_game(&testkit::room(), testkit::character(), e.party("party_cent").unwrap())
            .unwrap();
        let mut dice = SeededDice::seeded(3);
        for _ in 0..10 {
            s = e.process_turn(&s, &rest, &mut dice);
        }
        assert_eq!(s.current_turn, 11);
        assert_eq!(s.turn_history.len(), 3);
        assert_eq!(s.turn_history[0].turn, 10);
        assert_eq!(s.turn_history[2].turn, 8);
    }

    #[test]
    fn facade_lookups() {
        let e = engine(None);
        assert_eq!(e.issues().len(), 7);
        assert_eq!(e.proposals(&IssueId::from("issue_health")).len(), 1);
        assert_eq!(e.available_actions(PlayerRole::Opposition, VictoryType::Cycles).len(), 7);
    }

    #[test]
    fn seeded_campaign_replays_exactly() {
        let e = engine(None);
        let play = |seed: u64| {
            let mut dice = SeededDice::seeded(seed);
            let character = e
                .generate_character(&ArchetypeId::from("arch_outsider"), &mut dice)
                .unwrap();
            let mut s = e
                .initialize_game(&testkit::room(), character, e.party("party_prog").unwrap())
                .unwrap();
            s = e.update_platform(
                &s,
                vec![IssueId::from("issue_transport")],
                vec![ProposalId::from("prop_metro")],
            );
            for season in 0..3 {
                while s.current_turn <= s.max_turns && !s.game_over {
                    let actions = e.available_actions(s.player_state.role, s.victory_config.kind);
                    let pick = dice.pick(actions.len());
                    let action = actions[pick].clone();
                    s = e.process_turn(&s, &action, &mut dice);
                    validate_session(&s, e.config()).unwrap();
                }
                s = e.start_next_season(&s, season % 2 == 1, &mut dice);
            }
            s
        };
        let a = play(42);
        assert_eq!(a, play(42));
        assert!(a.turn_history.iter().any(|ev| ev.kind == EventKind::Info));
    }

    #[test]
    fn state_survives_json_round_trip() {
        let e = engine(None);
        let rally = e.catalog().action(&ActionId::from("act_rally")).unwrap().clone();
        let s = e.process_turn(&testkit::fresh_state(), &rally, &mut ScriptedDice::new([20]));
        let json = serde_json::to_string(&s).unwrap();
        let back: GameSessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
        let mut d1 = ScriptedDice::new([7]);
        let mut d2 = ScriptedDice::new([7]);
        assert_eq!(e.process_turn(&back, &rally, &mut d1), e.process_turn(&s, &rally, &mut d2));
    }
}
