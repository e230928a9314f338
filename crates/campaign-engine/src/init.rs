//! Session initialization.

use campaign_core::{
    Character, DemographicGroup, EngineConfig, EventKind, GameSessionState, Governance,
    Institutions, IssueId, Percent, Phase, PlayerRole, PlayerState, PlayerStats, PoliticalParty,
    RoomConfig, ScenarioLocation, Sphere, TurnEvent,
};
use tracing::info;

fn group(id: &str, name: &str, size: i32, support: i32, power: f32, demands: &[&str]) -> DemographicGroup {
    DemographicGroup {
        id: id.to_string(),
        name: name.to_string(),
        size,
        support: Percent::saturating(support),
        satisfaction: Percent::saturating(50),
        power,
        demands: demands.iter().map(|d| IssueId::from(*d)).collect(),
    }
}

/// Electorate for a location. The city name shifts a few points between
/// union workers and business owners so rooms do not all look alike.
pub fn generate_demographics(location: &ScenarioLocation) -> Vec<DemographicGroup> {
    let variance = (location.city.chars().count() % 3) as i32;
    vec![
        group("demo_union", "Union Workers", 30 - variance, 20, 1.2, &["issue_wages", "issue_transport"]),
        group("demo_biz", "Business Owners", 15 + variance, 20, 2.0, &["issue_tax", "issue_security"]),
        group("demo_youth", "Students & Youth", 25, 10, 0.8, &["issue_transport", "issue_environment"]),
        group("demo_retirees", "Retirees", 20, 30, 1.5, &["issue_health", "issue_security"]),
        group("demo_religious", "Religious Groups", 10, 15, 1.3, &["issue_family"]),
    ]
}

/// Build the first-season state for a room.
pub fn initialize_game(
    cfg: &EngineConfig,
    room: &RoomConfig,
    character: Character,
    party: PoliticalParty,
) -> GameSessionState {
    let funds = character.stats.resources * 10;
    info!(
        room = %room.id,
        city = %room.location.city,
        character = %character.name,
        party = %party.acronym,
        victory = ?room.victory.kind,
        "initializing campaign"
    );
    GameSessionState {
        room_id: room.id.clone(),
        current_turn: 1,
        max_turns: cfg.max_turns,
        phase: Phase::Primary,
        demographics: generate_demographics(&room.location),
        governance: Governance::default(),
        institutions: Institutions::default(),
        victory_config: room.victory,
        winner: None,
        game_over: false,
        turn_history: vec![TurnEvent::new(
            1,
            "Season 1 begins. Formulate your agenda!",
            EventKind::Info,
        )],
        location: room.location.clone(),
        player_state: PlayerState {
            character,
            party,
            role: PlayerRole::Candidate,
            current_office: None,
            target_office: Some("Mayor".to_string()),
            sphere: Sphere::Municipal,
            season: 1,
            stats: PlayerStats {
                popularity: 10,
                party_support: 20,
                funds,
                energy: 100,
                coherence: 100,
            },
            agenda: vec![],
            program: vec![],
        },
    }
}
