//! Character drafting from archetypes.

use crate::dice::Dice;
use crate::EngineError;
use campaign_core::{ArchetypeId, Catalog, Character, CharacterStats};

const FALLBACK_NAME: &str = "Unknown Politician";

/// Draft a character: a themed name and the archetype's stats nudged by -1, 0 or +1.
pub fn generate_character(
    catalog: &Catalog,
    archetype_id: &ArchetypeId,
    dice: &mut impl Dice,
) -> Result<Character, EngineError> {
    let archetype = catalog
        .archetype(archetype_id)
        .ok_or_else(|| EngineError::UnknownArchetype(archetype_id.0.clone()))?;

    let name = if archetype.name_pool.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        archetype.name_pool[dice.pick(archetype.name_pool.len())].clone()
    };

    let base = archetype.base_stats;
    let mut vary = |v: i32| (v + dice.roll(-1, 1)).max(1);
    let stats = CharacterStats {
        charisma: vary(base.charisma),
        intelligence: vary(base.intelligence),
        resources: vary(base.resources),
    };
    let serial = dice.roll(0, i32::MAX);

    Ok(Character {
        id: format!("char_{}_{:08x}", archetype_id, serial),
        name,
        archetype_id: archetype_id.clone(),
        stats,
        flavour_text: format!("A rising star in the {} movement.", archetype.name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{ScriptedDice, SeededDice};
    use campaign_core::Archetype;

    #[test]
    fn scripted_draft() {
        let catalog = Catalog::default();
        let mut dice = ScriptedDice::new([1, -1, 0, 1, 42]);
        let c = generate_character(&catalog, &ArchetypeId::from("arch_union"), &mut dice).unwrap();
        assert_eq!(c.name, "Maria of the Metalworkers");
        assert_eq!(
            c.stats,
            CharacterStats {
                charisma: 5,
                intelligence: 5,
                resources: 6
            }
        );
        assert_eq!(c.id, "char_arch_union_0000002a");
        assert_eq!(c.flavour_text, "A rising star in the Union Leader movement.");
    }

    #[test]
    fn stats_never_drop_below_one() {
        let mut catalog = Catalog::default();
        catalog.archetypes.push(Archetype {
            id: ArchetypeId::from("arch_nobody"),
            name: "Nobody".to_string(),
            description: String::new(),
            base_stats: CharacterStats {
                charisma: 1,
                intelligence: 1,
                resources: 1,
            },
            name_pool: vec![],
        });
        let mut dice = ScriptedDice::new([-1, -1, -1]);
        let c = generate_character(&catalog, &ArchetypeId::from("arch_nobody"), &mut dice).unwrap();
        assert_eq!(c.name, "Unknown Politician");
        assert_eq!(c.stats.charisma, 1);
        assert_eq!(c.stats.intelligence, 1);
        assert_eq!(c.stats.resources, 1);
    }

    #[test]
    fn unknown_archetype_is_an_error() {
        let mut dice = SeededDice::seeded(1);
        let err = generate_character(&Catalog::default(), &ArchetypeId::from("arch_x"), &mut dice)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownArchetype(id) if id == "arch_x"));
    }

    #[test]
    fn seeded_stats_stay_within_one_of_base() {
        let catalog = Catalog::default();
        for seed in 0..50 {
            let mut dice = SeededDice::seeded(seed);
            let c = generate_character(&catalog, &ArchetypeId::from("arch_heir"), &mut dice).unwrap();
            assert!((3..=5).contains(&c.stats.charisma));
            assert!((5..=7).contains(&c.stats.intelligence));
            assert!((9..=11).contains(&c.stats.resources));
        }
    }
}
