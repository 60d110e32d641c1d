//! Recording match results, and reopening them for correction.

use crate::logic::advancement::ensure_phase_open;
use crate::logic::cross_group::{remove_playoff_match, sync_playoff_winner};
use crate::logic::ties::apply_playoff_result;
use crate::logic::validation::validate_match_score;
use crate::models::{GroupKind, MatchId, PlayerId, SetScore, Side, Tournament, TournamentError};

/// Validate and store the sets of an unplayed match, then finish it.
///
/// A tie playoff also settles its tie: inside a group the winner gets tiebreak order 1,
/// across groups the owning tiebreak record gets its winner.
pub fn record_match_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    sets: Vec<SetScore>,
) -> Result<Side, TournamentError> {
    let (group, m) = tournament.find_match(match_id)?;
    ensure_phase_open(tournament, &group.category, group.phase)?;
    if m.is_finished {
        return Err(TournamentError::InvalidState);
    }
    let winner = validate_match_score(&tournament.game_config, &sets)?;
    let (group_id, kind, is_tiebreaker) = (group.id, group.kind, m.is_tiebreaker);

    tournament.match_mut(match_id)?.finish(sets);
    match kind {
        GroupKind::Tiebreak => sync_playoff_winner(tournament, match_id),
        GroupKind::Regular if is_tiebreaker => {
            apply_playoff_result(tournament.group_mut(group_id)?, match_id)
        }
        GroupKind::Regular => {}
    }
    log::debug!("Match {} finished, side {:?} won", match_id, winner);
    Ok(winner)
}

/// Clear the result of a finished match so it can be entered again.
///
/// Decisions that depended on the old result go with it: the playoff's own tie order or
/// cross-group winner, and for a round-robin match every tie decision of its group plus
/// the cross-group decisions of its phase.
pub fn reopen_match(tournament: &mut Tournament, match_id: MatchId) -> Result<(), TournamentError> {
    let (group, m) = tournament.find_match(match_id)?;
    ensure_phase_open(tournament, &group.category, group.phase)?;
    if !m.is_finished {
        return Err(TournamentError::InvalidState);
    }
    let (group_id, kind, is_tiebreaker) = (group.id, group.kind, m.is_tiebreaker);
    let (category, phase) = (group.category.clone(), group.phase);
    let on_court: Vec<PlayerId> = m.participants();

    tournament.match_mut(match_id)?.reopen();
    match kind {
        GroupKind::Tiebreak => sync_playoff_winner(tournament, match_id),
        GroupKind::Regular if is_tiebreaker => {
            let group = tournament.group_mut(group_id)?;
            for p in group.players.iter_mut().filter(|p| on_court.contains(&p.id)) {
                p.clear_tiebreak();
            }
        }
        GroupKind::Regular => {
            let group = tournament.group_mut(group_id)?;
            for p in group.players.iter_mut() {
                p.clear_tiebreak();
            }
            group.matches.retain(|m| !m.is_tiebreaker);

            let stale: Vec<Option<MatchId>> = tournament
                .cross_tiebreaks_in(&category, phase)
                .map(|tb| tb.match_id)
                .collect();
            tournament
                .cross_group_tiebreaks
                .retain(|tb| !(tb.category == category && tb.phase == phase));
            for playoff in stale.into_iter().flatten() {
                remove_playoff_match(tournament, playoff);
            }
        }
    }
    log::info!("Match {} reopened", match_id);
    Ok(())
}
