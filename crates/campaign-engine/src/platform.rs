//! Agenda and program editing.

use campaign_core::{GameSessionState, IssueId, ProposalId, MAX_AGENDA_ITEMS};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("the agenda already holds {max} issues")]
    AgendaFull { max: usize },
}

/// Replace the player's agenda and program wholesale.
///
/// No validation happens here: use [`campaign_core::validate_platform`] to
/// enforce the agenda cap and issue/proposal coherence.
pub fn update_platform(
    state: &GameSessionState,
    agenda: Vec<IssueId>,
    program: Vec<ProposalId>,
) -> GameSessionState {
    let mut next = state.clone();
    next.player_state.agenda = agenda;
    next.player_state.program = program;
    next
}

/// Add `issue` to the agenda, or remove it if already present.
pub fn toggle_agenda_item(
    state: &GameSessionState,
    issue: &IssueId,
) -> Result<GameSessionState, PlatformError> {
    let mut agenda = state.player_state.agenda.clone();
    if let Some(pos) = agenda.iter().position(|i| i == issue) {
        agenda.remove(pos);
    } else {
        if agenda.len() >= MAX_AGENDA_ITEMS {
            return Err(PlatformError::AgendaFull {
                max: MAX_AGENDA_ITEMS,
            });
        }
        agenda.push(issue.clone());
    }
    Ok(update_platform(state, agenda, state.player_state.program.clone()))
}

/// Add `proposal` to the program, or remove it if already present.
pub fn toggle_proposal(state: &GameSessionState, proposal: &ProposalId) -> GameSessionState {
    let mut program = state.player_state.program.clone();
    if let Some(pos) = program.iter().position(|p| p == proposal) {
        program.remove(pos);
    } else {
        program.push(proposal.clone());
    }
    update_platform(state, state.player_state.agenda.clone(), program)
}
