//! Content catalog: archetypes, parties, issues, proposals and actions.
//!
//! The built-in content is returned by [`Catalog::default`]. Admins can ship
//! a YAML content pack; any table the pack omits falls back to the built-in
//! one.

use crate::{
    ActionCost, ActionDefinition, ActionId, ActionKind, Archetype, ArchetypeId, CharacterStats,
    Issue, IssueId, Phase, PlayerRole, PoliticalParty, Proposal, ProposalId, StatModifier,
    VictoryType,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Restores energy instead of rolling for an effect.
pub const ACT_REST: &str = "act_rest";
/// Declare a state of exception: the DICTATOR win attempt.
pub const ACT_DECLARE_POWER: &str = "act_win_dictator";
pub const ACT_LOBBY_CONGRESS: &str = "act_inst_congress";
pub const ACT_MILITARY_PARADE: &str = "act_inst_military";
pub const ACT_PACK_COURTS: &str = "act_inst_courts";

/// Institution courted by an institution action id, if any.
pub fn institution_for(action: &ActionId) -> Option<crate::Institution> {
    match action.as_str() {
        ACT_LOBBY_CONGRESS => Some(crate::Institution::Congress),
        ACT_MILITARY_PARADE => Some(crate::Institution::Military),
        ACT_PACK_COURTS => Some(crate::Institution::Judiciary),
        _ => None,
    }
}

/// Errors produced while loading a content pack.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid content pack: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("duplicate {table} id: {id}")]
    DuplicateId { table: &'static str, id: String },
    #[error("proposal {proposal} references unknown issue {issue}")]
    UnknownIssue { proposal: String, issue: String },
    #[error("action {0} has a negative cost")]
    NegativeCost(String),
}

/// Static reference data for a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub archetypes: Vec<Archetype>,
    pub parties: Vec<PoliticalParty>,
    pub issues: Vec<Issue>,
    pub proposals: Vec<Proposal>,
    /// Ordered common, candidate, incumbent, opposition, then mode-specific.
    pub actions: Vec<ActionDefinition>,
}

/// On-disk content pack; every table is optional.
#[derive(Debug, Default, Deserialize)]
struct ContentPack {
    #[serde(default)]
    archetypes: Option<Vec<Archetype>>,
    #[serde(default)]
    parties: Option<Vec<PoliticalParty>>,
    #[serde(default)]
    issues: Option<Vec<Issue>>,
    #[serde(default)]
    proposals: Option<Vec<Proposal>>,
    #[serde(default)]
    actions: Option<Vec<ActionDefinition>>,
}

impl Catalog {
    /// Parse a YAML content pack layered over the built-in content.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let pack: ContentPack = serde_yaml::from_str(text)?;
        let base = Catalog::default();
        let catalog = Catalog {
            archetypes: pack.archetypes.unwrap_or(base.archetypes),
            parties: pack.parties.unwrap_or(base.parties),
            issues: pack.issues.unwrap_or(base.issues),
            proposals: pack.proposals.unwrap_or(base.proposals),
            actions: pack.actions.unwrap_or(base.actions),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a YAML content pack from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_yaml_str(&text)?;
        info!(
            path = %path.as_ref().display(),
            actions = catalog.actions.len(),
            issues = catalog.issues.len(),
            "loaded content pack"
        );
        Ok(catalog)
    }

    /// Check id uniqueness and cross references.
    pub fn validate(&self) -> Result<(), CatalogError> {
        unique_ids("archetype", self.archetypes.iter().map(|a| a.id.as_str()))?;
        unique_ids("party", self.parties.iter().map(|p| p.id.as_str()))?;
        unique_ids("issue", self.issues.iter().map(|i| i.id.as_str()))?;
        unique_ids("proposal", self.proposals.iter().map(|p| p.id.as_str()))?;
        unique_ids("action", self.actions.iter().map(|a| a.id.as_str()))?;
        for p in &self.proposals {
            if self.issue(&p.issue_id).is_none() {
                return Err(CatalogError::UnknownIssue {
                    proposal: p.id.0.clone(),
                    issue: p.issue_id.0.clone(),
                });
            }
        }
        for a in &self.actions {
            if a.cost.funds < 0 || a.cost.energy < 0 || a.cost.budget < 0 {
                return Err(CatalogError::NegativeCost(a.id.0.clone()));
            }
        }
        Ok(())
    }

    pub fn archetype(&self, id: &ArchetypeId) -> Option<&Archetype> {
        self.archetypes.iter().find(|a| &a.id == id)
    }

    pub fn party(&self, id: &str) -> Option<&PoliticalParty> {
        self.parties.iter().find(|p| p.id == id)
    }

    pub fn issue(&self, id: &IssueId) -> Option<&Issue> {
        self.issues.iter().find(|i| &i.id == id)
    }

    pub fn proposal(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| &p.id == id)
    }

    pub fn action(&self, id: &ActionId) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| &a.id == id)
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Proposals filed under `issue`, in catalog order.
    pub fn proposals_for(&self, issue: &IssueId) -> Vec<&Proposal> {
        self.proposals.iter().filter(|p| &p.issue_id == issue).collect()
    }

    /// Actions offered to `role` in a room won by `victory`.
    pub fn available_actions(&self, role: PlayerRole, victory: VictoryType) -> Vec<&ActionDefinition> {
        self.actions
            .iter()
            .filter(|a| a.offered_to(role, victory))
            .collect()
    }

    /// Like [`Catalog::available_actions`] but also honours `required_phase`.
    pub fn actions_in_phase(
        &self,
        role: PlayerRole,
        victory: VictoryType,
        phase: Phase,
    ) -> Vec<&ActionDefinition> {
        self.available_actions(role, victory)
            .into_iter()
            .filter(|a| a.required_phase.map_or(true, |p| p == phase))
            .collect()
    }
}

fn unique_ids<'a>(
    table: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                table,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn stats(charisma: i32, intelligence: i32, resources: i32) -> CharacterStats {
    CharacterStats {
        charisma,
        intelligence,
        resources,
    }
}

fn archetype(id: &str, name: &str, description: &str, base: CharacterStats, names: &[&str]) -> Archetype {
    Archetype {
        id: ArchetypeId::from(id),
        name: name.to_string(),
        description: description.to_string(),
        base_stats: base,
        name_pool: names.iter().map(|n| n.to_string()).collect(),
    }
}

fn party(id: &str, name: &str, acronym: &str, spectrum: &str, color: &str, bonuses: &[&str], maluses: &[&str]) -> PoliticalParty {
    PoliticalParty {
        id: id.to_string(),
        name: name.to_string(),
        acronym: acronym.to_string(),
        spectrum: spectrum.to_string(),
        color: color.to_string(),
        bonuses: bonuses.iter().map(|b| b.to_string()).collect(),
        maluses: maluses.iter().map(|m| m.to_string()).collect(),
    }
}

fn issue(id: &str, name: &str, description: &str, controversial: bool) -> Issue {
    Issue {
        id: IssueId::from(id),
        name: name.to_string(),
        description: description.to_string(),
        controversial,
    }
}

fn proposal(id: &str, issue: &str, name: &str, cost: i32, effects: &[(&str, i32)]) -> Proposal {
    Proposal {
        id: ProposalId::from(id),
        issue_id: IssueId::from(issue),
        name: name.to_string(),
        cost,
        pop_effect: effects
            .iter()
            .map(|(demo, delta)| (demo.to_string(), *delta))
            .collect::<BTreeMap<_, _>>(),
    }
}

struct ActionSpec<'a> {
    id: &'a str,
    kind: ActionKind,
    name: &'a str,
    description: &'a str,
    cost: ActionCost,
    difficulty: i32,
    stat: StatModifier,
}

fn action(spec: ActionSpec<'_>, roles: &[PlayerRole], mode: Option<VictoryType>) -> ActionDefinition {
    ActionDefinition {
        id: ActionId::from(spec.id),
        kind: spec.kind,
        name: spec.name.to_string(),
        description: spec.description.to_string(),
        cost: spec.cost,
        difficulty: spec.difficulty,
        stat_modifier: spec.stat,
        required_role: roles.to_vec(),
        required_phase: None,
        victory_mode: mode,
    }
}

fn cost(funds: i32, energy: i32, budget: i32) -> ActionCost {
    ActionCost {
        funds,
        energy,
        budget,
    }
}

fn default_actions() -> Vec<ActionDefinition> {
    use ActionKind::*;
    use PlayerRole::*;
    use StatModifier::*;

    let all = [Candidate, Incumbent, Opposition];
    let common = [
        ActionSpec { id: "act_poll", kind: Research, name: "Opinion Poll", description: "Spend funds to accurately gauge demographic support.", cost: cost(5, 10, 0), difficulty: 5, stat: Intelligence },
        ActionSpec { id: "act_dinner", kind: Party, name: "Fundraising Dinner", description: "Schmooze with elites to raise funds.", cost: cost(0, 15, 0), difficulty: 10, stat: Charisma },
        ActionSpec { id: "act_internal", kind: Party, name: "Internal Networking", description: "Meet with party cadres to secure your nomination.", cost: cost(0, 10, 0), difficulty: 10, stat: Intelligence },
        ActionSpec { id: ACT_REST, kind: Personal, name: "Rest & Recover", description: "Take a break to restore energy.", cost: cost(0, 0, 0), difficulty: 0, stat: Resources },
    ];
    let candidate = [
        ActionSpec { id: "act_rally", kind: Campaign, name: "Public Rally", description: "Hold a rally to boost general popularity.", cost: cost(10, 20, 0), difficulty: 12, stat: Charisma },
        ActionSpec { id: "act_media", kind: Campaign, name: "TV Interview", description: "High risk, high reward media appearance.", cost: cost(0, 25, 0), difficulty: 15, stat: Charisma },
    ];
    let incumbent = [
        ActionSpec { id: "act_gov_project", kind: Governance, name: "Public Works Project", description: "Improve city services to boost satisfaction.", cost: cost(0, 20, 20), difficulty: 12, stat: Intelligence },
        ActionSpec { id: "act_gov_law", kind: Governance, name: "Pass Legislation", description: "Fulfill agenda promises. High impact.", cost: cost(0, 30, 0), difficulty: 15, stat: Intelligence },
        ActionSpec { id: "act_gov_speech", kind: Governance, name: "Address the Nation", description: "Explain your policies to maintain coherence.", cost: cost(0, 15, 0), difficulty: 10, stat: Charisma },
    ];
    let opposition = [
        ActionSpec { id: "act_opp_criticize", kind: Attack, name: "Criticize Government", description: "Highlight unmet demands to lower incumbent popularity.", cost: cost(5, 15, 0), difficulty: 12, stat: Charisma },
        ActionSpec { id: "act_opp_investigate", kind: Attack, name: "Launch Investigation", description: "Dig for scandals. Low chance, critical damage.", cost: cost(15, 25, 0), difficulty: 18, stat: Intelligence },
        ActionSpec { id: "act_opp_protest", kind: Campaign, name: "Organize Protest", description: "Mobilize dissatisfied groups.", cost: cost(0, 20, 0), difficulty: 14, stat: Charisma },
    ];
    let dictator = [
        ActionSpec { id: ACT_LOBBY_CONGRESS, kind: Institution, name: "Lobby Congress", description: "Build alliance with lawmakers to pass the Enabling Act.", cost: cost(10, 15, 0), difficulty: 14, stat: Intelligence },
        ActionSpec { id: ACT_MILITARY_PARADE, kind: Institution, name: "Military Parade", description: "Show strength and gain favor with the generals.", cost: cost(0, 20, 10), difficulty: 14, stat: Charisma },
        ActionSpec { id: ACT_PACK_COURTS, kind: Institution, name: "Pack the Courts", description: "Appoint loyal judges to the high court.", cost: cost(0, 20, 0), difficulty: 16, stat: Intelligence },
        ActionSpec { id: ACT_DECLARE_POWER, kind: Governance, name: "Declare State of Exception", description: "Attempt to seize absolute power. Requires massive support across all sectors.", cost: cost(50, 50, 0), difficulty: 25, stat: Charisma },
    ];

    let mut actions = Vec::new();
    actions.extend(common.into_iter().map(|s| action(s, &all, None)));
    actions.extend(candidate.into_iter().map(|s| action(s, &[Candidate], None)));
    actions.extend(incumbent.into_iter().map(|s| action(s, &[Incumbent], None)));
    actions.extend(opposition.into_iter().map(|s| action(s, &[Opposition], None)));
    actions.extend(
        dictator
            .into_iter()
            .map(|s| action(s, &[Incumbent], Some(VictoryType::Dictator))),
    );
    actions
}

impl Default for Catalog {
    fn default() -> Self {
        let archetypes = vec![
            archetype("arch_student", "Student Leader", "Energetic, idealistic, and great at mobilizing crowds, but lacks funding.", stats(8, 6, 2), &["Sofia \"The Voice\"", "Pedro Activist", "Lucas Undergraduate"]),
            archetype("arch_union", "Union Leader", "Strong base of support and negotiation skills. Resistant to scandals.", stats(6, 5, 5), &["Big John", "Maria of the Metalworkers", "Carlos Negotiator"]),
            archetype("arch_heir", "Oligarch Heir", "Born into power. Massive resources and connections, but struggles with popularity.", stats(4, 6, 10), &["Viscountess Julia", "Arthur III", "Richie Rico"]),
            archetype("arch_tech", "Technocrat", "Expert in policy and administration. Poor at public speaking.", stats(3, 10, 6), &["Dr. Silva", "Professor X", "Analyst Santos"]),
            archetype("arch_outsider", "Media Outsider", "A celebrity turned politician. Unpredictable and highly charismatic.", stats(10, 3, 7), &["TV Host Bob", "Influencer K", "Actor Leo"]),
        ];
        let parties = vec![
            party("party_prog", "Progressive Union", "UP", "Left", "red", &["+2 Charisma in low income areas", "Base mobilization cost -20%"], &["-10% Support from Business Sector"]),
            party("party_lib", "Liberal Front", "LF", "Center-Right", "blue", &["+2 Resources per turn", "+15% Campaign Donation efficiency"], &["-2 Charisma in Debate Defense"]),
            party("party_green", "Eco Future", "ECO", "Center-Left", "green", &["Immune to Environmental Scandals", "+3 Charisma with Youth"], &["Cannot accept Industry donations"]),
            party("party_trad", "National Order", "NO", "Right", "slate", &["+3 Defense against Attack Ads", "High loyalty in rural areas"], &["Difficulty forming coalitions"]),
            party("party_cent", "Democratic Center", "DC", "Center", "amber", &["Can form coalition with any spectrum", "+1 Intelligence"], &["No strong base support (0 bonus starting votes)"]),
        ];
        let issues = vec![
            issue("issue_transport", "Public Transport", "Bus fares, metro lines, and traffic.", false),
            issue("issue_health", "Public Health", "Hospital wait times and medicine availability.", false),
            issue("issue_security", "Public Safety", "Crime rates and policing.", true),
            issue("issue_tax", "Tax Reform", "Business incentives vs social funding.", true),
            issue("issue_environment", "Environment", "Parks, pollution, and sustainability.", true),
            issue("issue_wages", "Fair Wages", "Minimum wage and worker rights.", true),
            issue("issue_family", "Family Values", "Traditional values and education.", true),
        ];
        let proposals = vec![
            proposal("prop_metro", "issue_transport", "Expand Metro Lines", 10, &[("demo_youth", 10), ("demo_union", 5), ("demo_biz", 2)]),
            proposal("prop_bus", "issue_transport", "Free Bus Fare (Students)", 5, &[("demo_youth", 15), ("demo_biz", -2)]),
            proposal("prop_hosp", "issue_health", "Build New Hospital", 15, &[("demo_retirees", 12), ("demo_union", 5)]),
            proposal("prop_police", "issue_security", "Increase Police Budget", 8, &[("demo_biz", 8), ("demo_retirees", 10), ("demo_youth", -5)]),
            proposal("prop_taxcut", "issue_tax", "Small Biz Tax Cut", 5, &[("demo_biz", 15), ("demo_union", -5)]),
            proposal("prop_park", "issue_environment", "City Green Belts", 5, &[("demo_youth", 8), ("demo_retirees", 5)]),
        ];
        Catalog {
            archetypes,
            parties,
            issues,
            proposals,
            actions: default_actions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(actions: &[&ActionDefinition]) -> Vec<String> {
        actions.iter().map(|a| a.id.0.clone()).collect()
    }

    #[test]
    fn default_catalog_is_valid() {
        let c = Catalog::default();
        c.validate().unwrap();
        assert_eq!(c.archetypes.len(), 5);
        assert_eq!(c.issues().len(), 7);
        assert_eq!(c.actions.len(), 16);
    }

    #[test]
    fn candidate_gets_common_then_campaign_actions() {
        let c = Catalog::default();
        let got = ids(&c.available_actions(PlayerRole::Candidate, VictoryType::Office));
        assert_eq!(
            got,
            vec!["act_poll", "act_dinner", "act_internal", "act_rest", "act_rally", "act_media"]
        );
    }

    #[test]
    fn dictator_actions_only_for_incumbents_in_dictator_rooms() {
        let c = Catalog::default();
        let inc = c.available_actions(PlayerRole::Incumbent, VictoryType::Dictator);
        assert_eq!(inc.len(), 4 + 3 + 4);
        assert!(inc.iter().any(|a| a.id.as_str() == ACT_DECLARE_POWER));
        let inc_office = c.available_actions(PlayerRole::Incumbent, VictoryType::Office);
        assert!(!inc_office.iter().any(|a| a.kind == ActionKind::Institution));
        let opp = c.available_actions(PlayerRole::Opposition, VictoryType::Dictator);
        assert!(!opp.iter().any(|a| a.id.as_str() == ACT_DECLARE_POWER));
    }

    #[test]
    fn proposals_filter_by_issue() {
        let c = Catalog::default();
        let transport = c.proposals_for(&IssueId::from("issue_transport"));
        assert_eq!(transport.len(), 2);
        assert!(c.proposals_for(&IssueId::from("issue_family")).is_empty());
    }

    #[test]
    fn institution_ids_map_to_institutions() {
        assert_eq!(
            institution_for(&ActionId::from(ACT_PACK_COURTS)),
            Some(crate::Institution::Judiciary)
        );
        assert_eq!(institution_for(&ActionId::from("act_rally")), None);
    }

    #[test]
    fn yaml_pack_overrides_only_given_tables() {
        let yaml = r#"
issues:
  - id: issue_housing
    name: Housing
proposals:
  - id: prop_rent
    issueId: issue_housing
    name: Rent Control
    cost: 7
"#;
        let c = Catalog::from_yaml_str(yaml).unwrap();
        assert_eq!(c.issues().len(), 1);
        assert_eq!(c.proposals_for(&IssueId::from("issue_housing")).len(), 1);
        assert_eq!(c.actions.len(), 16);
    }

    #[test]
    fn yaml_pack_with_dangling_proposal_is_rejected() {
        let yaml = r#"
proposals:
  - id: prop_rent
    issueId: issue_housing
    name: Rent Control
    cost: 7
"#;
        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::UnknownIssue { .. })
        ));
    }

    #[test]
    fn phase_filter_respects_required_phase() {
        let mut c = Catalog::default();
        c.actions[4].required_phase = Some(Phase::Election);
        let primary = c.actions_in_phase(PlayerRole::Candidate, VictoryType::Cycles, Phase::Primary);
        assert!(!primary.iter().any(|a| a.id.as_str() == "act_rally"));
        let election = c.actions_in_phase(PlayerRole::Candidate, VictoryType::Cycles, Phase::Election);
        assert!(election.iter().any(|a| a.id.as_str() == "act_rally"));
    }
}
