use campaign_ai::{choose_action, Weights};
use campaign_core::{ArchetypeId, Catalog, EngineConfig, RoomConfig, ScenarioLocation, VictoryConfig, VictoryType};
use campaign_engine::{generate_character, initialize_game, process_turn, SeededDice};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_autoplay(c: &mut Criterion) {
    let catalog = Catalog::default();
    let cfg = EngineConfig::default();
    let room = RoomConfig {
        id: "bench".into(),
        name: String::new(),
        location: ScenarioLocation {
            city: "Salvador".into(),
            state: "BA".into(),
            country: "Brazil".into(),
        },
        victory: VictoryConfig {
            kind: VictoryType::Dictator,
            value: 0,
        },
    };
    let mut dice = SeededDice::seeded(1);
    let character = generate_character(&catalog, &ArchetypeId::from("arch_tech"), &mut dice).unwrap();
    let party = catalog.party("party_trad").cloned().unwrap();
    let s0 = initialize_game(&cfg, &room, character, party);
    let weights = Weights::default();

    c.bench_function("bot plays 48 turns", |b| {
        b.iter(|| {
            let mut dice = SeededDice::seeded(9);
            let mut s = s0.clone();
            for _ in 0..48 {
                let actions = catalog.available_actions(s.player_state.role, s.victory_config.kind);
                match choose_action(&s, &actions, &weights) {
                    Some(action) => s = process_turn(&cfg, &s, action, &mut dice),
                    None => break,
                }
            }
            black_box(s)
        })
    });
}

criterion_group!(benches, bench_autoplay);
criterion_main!(benches);
