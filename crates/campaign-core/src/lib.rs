#![deny(warnings)]

//! Core domain models and invariants for the campaign simulation.
//!
//! This crate defines the serializable session state, the static content
//! types referenced by it, and validation helpers a host can use to enforce
//! invariants the engine itself treats leniently.

pub mod catalog;

pub use catalog::{Catalog, CatalogError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Turns in one season (4 years of monthly turns).
pub const MAX_TURNS: u32 = 48;
/// Last turn of the primary phase (end of year 3).
pub const PRIMARY_END_TURN: u32 = 36;
/// Maximum number of issues a player may campaign on.
pub const MAX_AGENDA_ITEMS: usize = 3;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a campaign issue, e.g. "issue_transport".
    IssueId
);
string_id!(
    /// Identifier of a policy proposal, e.g. "prop_metro".
    ProposalId
);
string_id!(
    /// Identifier of a player action, e.g. "act_rally".
    ActionId
);
string_id!(
    /// Identifier of a character archetype, e.g. "arch_union".
    ArchetypeId
);

/// Role the player occupies during a season.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerRole {
    Candidate,
    Incumbent,
    Opposition,
}

/// Level of government the player operates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sphere {
    Municipal,
    State,
    Federal,
}

impl Sphere {
    /// Office level used by the OFFICE victory mode (1 = Mayor, 2 = State, 3 = Federal).
    pub fn level(self) -> u32 {
        match self {
            Sphere::Municipal => 1,
            Sphere::State => 2,
            Sphere::Federal => 3,
        }
    }
}

/// Season phase: primaries for years 1-3, the election in year 4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Primary,
    Election,
}

impl Phase {
    /// Phase implied by a turn number within a season.
    pub fn for_turn(turn: u32, primary_end_turn: u32) -> Phase {
        if turn > primary_end_turn {
            Phase::Election
        } else {
            Phase::Primary
        }
    }
}

/// How a room is won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VictoryType {
    /// Survive a number of seasons.
    Cycles,
    /// Win an election at or above an office level.
    Office,
    /// Seize absolute power while in office.
    Dictator,
}

/// Victory condition fixed at room creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryConfig {
    #[serde(rename = "type")]
    pub kind: VictoryType,
    /// Cycle count for CYCLES, office level for OFFICE, ignored for DICTATOR.
    pub value: u32,
}

/// Severity tag of a history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Info,
    Success,
    Failure,
    Critical,
}

/// One line of the turn history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEvent {
    pub turn: u32,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl TurnEvent {
    pub fn new(turn: u32, message: impl Into<String>, kind: EventKind) -> Self {
        Self {
            turn,
            message: message.into(),
            kind,
        }
    }
}

/// Category of an action; selects which effects a successful roll applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Research,
    Campaign,
    Party,
    Policy,
    Personal,
    Governance,
    Attack,
    Institution,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Research => "RESEARCH",
            ActionKind::Campaign => "CAMPAIGN",
            ActionKind::Party => "PARTY",
            ActionKind::Policy => "POLICY",
            ActionKind::Personal => "PERSONAL",
            ActionKind::Governance => "GOVERNANCE",
            ActionKind::Attack => "ATTACK",
            ActionKind::Institution => "INSTITUTION",
        }
    }
}

/// Character stat added to the d20 roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatModifier {
    Charisma,
    Intelligence,
    Resources,
}

/// Resources an action consumes. Missing fields cost nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCost {
    pub funds: i32,
    pub energy: i32,
    /// Public treasury, only spent by governing actions.
    pub budget: i32,
}

/// Immutable action definition from the content catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub id: ActionId,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: ActionCost,
    /// Target number for `d20 + stat`.
    pub difficulty: i32,
    pub stat_modifier: StatModifier,
    /// Roles offered this action; empty means every role.
    #[serde(default)]
    pub required_role: Vec<PlayerRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_phase: Option<Phase>,
    /// Only offered in rooms with this victory mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victory_mode: Option<VictoryType>,
}

impl ActionDefinition {
    /// Whether the action is offered to `role` in a room won by `victory`.
    pub fn offered_to(&self, role: PlayerRole, victory: VictoryType) -> bool {
        let role_ok = self.required_role.is_empty() || self.required_role.contains(&role);
        let mode_ok = self.victory_mode.map_or(true, |m| m == victory);
        role_ok && mode_ok
    }
}

/// Base or rolled personal stats of a politician.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub charisma: i32,
    pub intelligence: i32,
    pub resources: i32,
}

impl CharacterStats {
    pub fn get(&self, stat: StatModifier) -> i32 {
        match stat {
            StatModifier::Charisma => self.charisma,
            StatModifier::Intelligence => self.intelligence,
            StatModifier::Resources => self.resources,
        }
    }
}

/// Character class template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archetype {
    pub id: ArchetypeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_stats: CharacterStats,
    /// Themed names drawn by the character generator.
    #[serde(default)]
    pub name_pool: Vec<String>,
}

/// The player-controlled persona. Immutable for the whole game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub archetype_id: ArchetypeId,
    pub stats: CharacterStats,
    #[serde(default)]
    pub flavour_text: String,
}

/// Party affiliation. Bonuses and maluses are narrative only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliticalParty {
    pub id: String,
    pub name: String,
    pub acronym: String,
    #[serde(default)]
    pub spectrum: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub bonuses: Vec<String>,
    #[serde(default)]
    pub maluses: Vec<String>,
}

/// A campaign issue the player can put on the agenda.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub controversial: bool,
}

/// A concrete policy proposal under an issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub issue_id: IssueId,
    pub name: String,
    pub cost: i32,
    /// Demographic id to support change.
    #[serde(default)]
    pub pop_effect: std::collections::BTreeMap<String, i32>,
}

/// An integer percentage clamped to [0, 100].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Percent(u8);

impl Percent {
    pub const MAX: Percent = Percent(100);

    /// Clamp `value` into [0, 100].
    pub fn saturating(value: i32) -> Self {
        Percent(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> i32 {
        i32::from(self.0)
    }

    pub fn saturating_add(self, delta: i32) -> Self {
        Self::saturating(self.value() + delta)
    }
}

impl TryFrom<i32> for Percent {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (0..=100).contains(&value) {
            Ok(Percent(value as u8))
        } else {
            Err(ValidationError::PercentOutOfRange(value))
        }
    }
}

impl From<Percent> for i32 {
    fn from(p: Percent) -> Self {
        p.value()
    }
}

/// A slice of the electorate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemographicGroup {
    pub id: String,
    pub name: String,
    /// Share of the population in percent. Shares need not sum to 100.
    pub size: i32,
    pub support: Percent,
    pub satisfaction: Percent,
    /// Political influence multiplier.
    pub power: f32,
    /// Issues the group cares about, in priority order.
    pub demands: Vec<IssueId>,
}

/// City reality stats. Never clamped; may go negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Governance {
    pub economy: i32,
    pub security: i32,
    pub services: i32,
    /// Public treasury, kept non-negative by the cost gate.
    pub budget: i32,
}

impl Default for Governance {
    fn default() -> Self {
        Self {
            economy: 50,
            security: 50,
            services: 50,
            budget: 100,
        }
    }
}

/// Institutional loyalty accumulators, only relevant to DICTATOR rooms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institutions {
    pub congress: i32,
    pub judiciary: i32,
    pub military: i32,
}

impl Default for Institutions {
    fn default() -> Self {
        Self {
            congress: 30,
            judiciary: 40,
            military: 20,
        }
    }
}

/// One of the three institutions courted in DICTATOR rooms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Institution {
    Congress,
    Judiciary,
    Military,
}

impl Institutions {
    pub fn get_mut(&mut self, which: Institution) -> &mut i32 {
        match which {
            Institution::Congress => &mut self.congress,
            Institution::Judiciary => &mut self.judiciary,
            Institution::Military => &mut self.military,
        }
    }
}

/// Mutable campaign stats of the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Floored at 0 on gaffes but not capped.
    pub popularity: i32,
    pub party_support: i32,
    /// Personal campaign chest; the cost gate keeps it non-negative.
    pub funds: i32,
    /// Always within [0, 100].
    pub energy: i32,
    pub coherence: i32,
}

/// The player's campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub character: Character,
    pub party: PoliticalParty,
    pub role: PlayerRole,
    pub current_office: Option<String>,
    pub target_office: Option<String>,
    pub sphere: Sphere,
    pub season: u32,
    pub stats: PlayerStats,
    pub agenda: Vec<IssueId>,
    pub program: Vec<ProposalId>,
}

/// Where a room is played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioLocation {
    pub city: String,
    pub state: String,
    pub country: String,
}

/// Immutable room settings handed to the initializer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub location: ScenarioLocation,
    pub victory: VictoryConfig,
}

/// Aggregate root of a running game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionState {
    pub room_id: String,
    pub current_turn: u32,
    pub max_turns: u32,
    pub phase: Phase,
    pub player_state: PlayerState,
    pub demographics: Vec<DemographicGroup>,
    pub governance: Governance,
    pub institutions: Institutions,
    pub victory_config: VictoryConfig,
    /// Always written, even when unset, so positional encodings round-trip.
    #[serde(default)]
    pub winner: Option<bool>,
    pub game_over: bool,
    /// Newest first.
    pub turn_history: Vec<TurnEvent>,
    pub location: ScenarioLocation,
}

impl GameSessionState {
    /// In-game (year, month) for the current turn, twelve turns per year.
    pub fn calendar(&self) -> (u32, u32) {
        let turn = self.current_turn.max(1);
        ((turn + 11) / 12, (turn - 1) % 12 + 1)
    }

    /// Whether the season clock has run out and an election result is due.
    pub fn season_complete(&self) -> bool {
        self.current_turn >= self.max_turns
    }
}

/// Engine tuning knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub max_turns: u32,
    pub primary_end_turn: u32,
    /// Keep only the newest N history entries; `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_turns: MAX_TURNS,
            primary_end_turn: PRIMARY_END_TURN,
            history_limit: None,
        }
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("percentage {0} is outside [0, 100]")]
    PercentOutOfRange(i32),
    #[error("victory value {value} is invalid for {kind:?}")]
    InvalidVictoryValue { kind: VictoryType, value: u32 },
    #[error("room id must not be empty")]
    EmptyRoomId,
    #[error("location city must not be empty")]
    EmptyCity,
    #[error("agenda holds {0} issues, at most 3 allowed")]
    AgendaTooLong(usize),
    #[error("issue {0} appears more than once on the agenda")]
    DuplicateAgendaItem(String),
    #[error("unknown issue: {0}")]
    UnknownIssue(String),
    #[error("unknown proposal: {0}")]
    UnknownProposal(String),
    #[error("proposal {proposal} requires issue {issue} on the agenda")]
    ProposalOffAgenda { proposal: String, issue: String },
    #[error("turn {turn} is outside 1..={max}")]
    TurnOutOfRange { turn: u32, max: u32 },
    #[error("phase {phase:?} does not match turn {turn}")]
    PhaseMismatch { phase: Phase, turn: u32 },
    #[error("season must be at least 1")]
    InvalidSeason,
    #[error("primary end turn {primary_end_turn} must be below max turns {max_turns}")]
    InvalidTurnLimits { max_turns: u32, primary_end_turn: u32 },
    #[error("history limit must keep at least one entry")]
    EmptyHistoryLimit,
}

/// Validate a victory condition.
pub fn validate_victory_config(v: &VictoryConfig) -> Result<(), ValidationError> {
    let ok = match v.kind {
        VictoryType::Cycles => v.value >= 1,
        VictoryType::Office => (1..=3).contains(&v.value),
        VictoryType::Dictator => true,
    };
    if !ok {
        return Err(ValidationError::InvalidVictoryValue {
            kind: v.kind,
            value: v.value,
        });
    }
    Ok(())
}

/// Validate room settings before a game is initialized.
pub fn validate_room(room: &RoomConfig) -> Result<(), ValidationError> {
    if room.id.trim().is_empty() {
        return Err(ValidationError::EmptyRoomId);
    }
    if room.location.city.trim().is_empty() {
        return Err(ValidationError::EmptyCity);
    }
    validate_victory_config(&room.victory)
}

/// Validate engine limits.
pub fn validate_engine_config(cfg: &EngineConfig) -> Result<(), ValidationError> {
    if cfg.primary_end_turn >= cfg.max_turns {
        return Err(ValidationError::InvalidTurnLimits {
            max_turns: cfg.max_turns,
            primary_end_turn: cfg.primary_end_turn,
        });
    }
    if cfg.history_limit == Some(0) {
        return Err(ValidationError::EmptyHistoryLimit);
    }
    Ok(())
}

/// Validate an agenda/program pair against the catalog.
///
/// The engine accepts any platform; hosts call this to enforce the agenda
/// cap and the rule that a proposal needs its issue on the agenda.
pub fn validate_platform(
    catalog: &Catalog,
    agenda: &[IssueId],
    program: &[ProposalId],
) -> Result<(), ValidationError> {
    if agenda.len() > MAX_AGENDA_ITEMS {
        return Err(ValidationError::AgendaTooLong(agenda.len()));
    }
    let mut seen: BTreeSet<&IssueId> = BTreeSet::new();
    for issue in agenda {
        if catalog.issue(issue).is_none() {
            return Err(ValidationError::UnknownIssue(issue.0.clone()));
        }
        if !seen.insert(issue) {
            return Err(ValidationError::DuplicateAgendaItem(issue.0.clone()));
        }
    }
    for id in program {
        let proposal = catalog
            .proposal(id)
            .ok_or_else(|| ValidationError::UnknownProposal(id.0.clone()))?;
        if !seen.contains(&proposal.issue_id) {
            return Err(ValidationError::ProposalOffAgenda {
                proposal: id.0.clone(),
                issue: proposal.issue_id.0.clone(),
            });
        }
    }
    Ok(())
}

/// Validate structural invariants of a session.
pub fn validate_session(state: &GameSessionState, cfg: &EngineConfig) -> Result<(), ValidationError> {
    // One turn past the horizon is reachable before the host starts the next season.
    if state.current_turn == 0 || state.current_turn > state.max_turns + 1 {
        return Err(ValidationError::TurnOutOfRange {
            turn: state.current_turn,
            max: state.max_turns,
        });
    }
    if state.phase != Phase::for_turn(state.current_turn, cfg.primary_end_turn) {
        return Err(ValidationError::PhaseMismatch {
            phase: state.phase,
            turn: state.current_turn,
        });
    }
    if state.player_state.season == 0 {
        return Err(ValidationError::InvalidSeason);
    }
    if state.player_state.agenda.len() > MAX_AGENDA_ITEMS {
        return Err(ValidationError::AgendaTooLong(state.player_state.agenda.len()));
    }
    validate_victory_config(&state.victory_config)
}
