#![deny(warnings)]

//! Headless CLI: drafts a politician, auto-plays seasons with the utility
//! bot and prints a KPI summary.

use anyhow::{bail, Context, Result};
use campaign_ai::{choose_action, election_won, Weights};
use campaign_core::{
    validate_platform, ArchetypeId, Catalog, EngineConfig, GameSessionState, IssueId, ProposalId,
    RoomConfig, ScenarioLocation, VictoryConfig, VictoryType, MAX_AGENDA_ITEMS,
};
use campaign_engine::{evaluate_achievements, victory_status, Engine, SeededDice};
use persistence::{SessionStore, SqliteStore};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    room: String,
    city: String,
    archetype: String,
    party: String,
    victory: VictoryConfig,
    seed: u64,
    seasons: u32,
    catalog: Option<PathBuf>,
    ai: Option<PathBuf>,
    save: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            room: "cli".to_string(),
            city: "São Paulo".to_string(),
            archetype: "arch_union".to_string(),
            party: "party_cent".to_string(),
            victory: VictoryConfig {
                kind: VictoryType::Cycles,
                value: 3,
            },
            seed: 42,
            seasons: 3,
            catalog: None,
            ai: None,
            save: None,
        }
    }
}

fn parse_victory(text: &str) -> Result<VictoryConfig> {
    let (mode, value) = match text.split_once(':') {
        Some((mode, value)) => (mode, Some(value)),
        None => (text, None),
    };
    let kind = match mode.to_ascii_lowercase().as_str() {
        "cycles" => VictoryType::Cycles,
        "office" => VictoryType::Office,
        "dictator" => VictoryType::Dictator,
        other => bail!("unknown victory mode {other:?}"),
    };
    let value = value
        .map(|v| v.parse::<u32>())
        .transpose()
        .with_context(|| format!("invalid victory value in {text:?}"))?
        .unwrap_or(if kind == VictoryType::Dictator { 0 } else { 1 });
    Ok(VictoryConfig { kind, value })
}

fn parse_args<I: Iterator<Item = String>>(mut it: I) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--room" => args.room = it.next().context("--room needs a value")?,
            "--city" => args.city = it.next().context("--city needs a value")?,
            "--archetype" => args.archetype = it.next().context("--archetype needs a value")?,
            "--party" => args.party = it.next().context("--party needs a value")?,
            "--victory" => args.victory = parse_victory(&it.next().context("--victory needs a value")?)?,
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()).context("--seed needs a number")?,
            "--seasons" => {
                args.seasons = it.next().and_then(|s| s.parse().ok()).context("--seasons needs a number")?
            }
            "--catalog" => args.catalog = Some(it.next().context("--catalog needs a value")?.into()),
            "--ai" => args.ai = Some(it.next().context("--ai needs a value")?.into()),
            "--save" => args.save = Some(it.next().context("--save needs a value")?.into()),
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

/// Campaign on the top demand of the most powerful groups, adopting the
/// first proposal for each issue.
fn campaign_platform(catalog: &Catalog, state: &GameSessionState) -> (Vec<IssueId>, Vec<ProposalId>) {
    let mut groups: Vec<_> = state.demographics.iter().collect();
    groups.sort_by(|a, b| b.power.total_cmp(&a.power));
    let mut agenda: Vec<IssueId> = Vec::new();
    for issue in groups.iter().filter_map(|g| g.demands.first()) {
        if agenda.len() == MAX_AGENDA_ITEMS {
            break;
        }
        if catalog.issue(issue).is_some() && !agenda.contains(issue) {
            agenda.push(issue.clone());
        }
    }
    let program = agenda
        .iter()
        .filter_map(|issue| catalog.proposals_for(issue).first().map(|p| p.id.clone()))
        .collect();
    (agenda, program)
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(?args, "starting CLI");

    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default(),
    };
    let weights = match &args.ai {
        Some(path) => Weights::from_yaml_str(&std::fs::read_to_string(path)?)?,
        None => Weights::default(),
    };
    let engine = Engine::new(catalog, EngineConfig::default())?;
    let mut dice = SeededDice::seeded(args.seed);

    let character = engine.generate_character(&ArchetypeId::from(args.archetype.as_str()), &mut dice)?;
    let party = engine.party(&args.party)?;
    let room = RoomConfig {
        id: args.room.clone(),
        name: format!("{} campaign", args.city),
        location: ScenarioLocation {
            city: args.city.clone(),
            state: String::new(),
            country: String::new(),
        },
        victory: args.victory,
    };
    let mut state = engine.initialize_game(&room, character, party)?;

    let (agenda, program) = campaign_platform(engine.catalog(), &state);
    validate_platform(engine.catalog(), &agenda, &program)?;
    state = engine.update_platform(&state, agenda, program);

    let mut turns_played = 0u32;
    for _ in 0..args.seasons {
        while !state.game_over && state.current_turn <= state.max_turns {
            let actions = engine.catalog().actions_in_phase(
                state.player_state.role,
                state.victory_config.kind,
                state.phase,
            );
            let Some(action) = choose_action(&state, &actions, &weights) else {
                warn!(turn = state.current_turn, "no affordable action");
                break;
            };
            state = engine.process_turn(&state, action, &mut dice);
            turns_played += 1;
        }
        if state.game_over {
            break;
        }
        let won = election_won(&state);
        info!(season = state.player_state.season, won, "election held");
        state = engine.start_next_season(&state, won, &mut dice);
        if state.game_over {
            break;
        }
    }

    let ps = &state.player_state;
    println!(
        "Session OK | room: {} | city: {} | candidate: {} ({}) | party: {}",
        state.room_id, state.location.city, ps.character.name, ps.character.archetype_id, ps.party.acronym
    );
    println!(
        "KPI | turns: {} | season: {} | role: {:?} | office: {} | popularity: {} | party: {} | funds: {} | energy: {} | services: {} | status: {:?}",
        turns_played,
        ps.season,
        ps.role,
        ps.current_office.as_deref().unwrap_or("-"),
        ps.stats.popularity,
        ps.stats.party_support,
        ps.stats.funds,
        ps.stats.energy,
        state.governance.services,
        victory_status(&state),
    );
    let achievements: Vec<&str> = evaluate_achievements(&state).iter().map(|a| a.id()).collect();
    if !achievements.is_empty() {
        println!("Achievements | {}", achievements.join(", "));
    }

    if let Some(path) = &args.save {
        let mut store = SqliteStore::open(path)?;
        let expected = store.load(&state.room_id)?.map(|v| v.version);
        let version = store.save(&state.room_id, &state, expected)?;
        info!(path = %path.display(), version, "session saved");
    }

    Ok(())
}
