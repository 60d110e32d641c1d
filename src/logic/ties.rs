//! Intra-group ties: detection over a ranking and the three ways to break them.

use crate::logic::advancement::ensure_phase_open;
use crate::logic::ranking::{calculate_ranking, RankingEntry};
use crate::logic::rng::RandomSource;
use crate::models::{
    Group, GroupId, Match, MatchId, PlayerId, Side, TiebreakMethod, Tournament, TournamentError,
};
use serde::Serialize;

/// Players sharing identical standings inside one group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TieGroup {
    /// 1-based standings positions covered by the tie.
    pub positions: Vec<usize>,
    pub players: Vec<PlayerId>,
    pub wins: u32,
    pub set_diff: i64,
    pub game_diff: i64,
}

impl TieGroup {
    fn same_players(&self, ids: &[PlayerId]) -> bool {
        ids.len() == self.players.len() && self.players.iter().all(|p| ids.contains(p))
    }
}

/// Maximal runs of untagged players with identical statistics.
///
/// A player that has not finished a match yet, or that already carries a
/// `tiebreak_order`, is never part of a reported tie.
pub fn detect_ties(ranking: &[RankingEntry]) -> Vec<TieGroup> {
    let mut ties = Vec::new();
    let mut start = 0;
    while start < ranking.len() {
        let key = ranking[start].stats_key();
        let end = ranking[start..]
            .iter()
            .position(|e| e.stats_key() != key)
            .map_or(ranking.len(), |offset| start + offset);

        let open: Vec<(usize, &RankingEntry)> = ranking[start..end]
            .iter()
            .enumerate()
            .filter(|(_, e)| e.tiebreak_order.is_none() && e.matches_played > 0)
            .map(|(i, e)| (start + i + 1, e))
            .collect();
        if open.len() >= 2 {
            ties.push(TieGroup {
                positions: open.iter().map(|(pos, _)| *pos).collect(),
                players: open.iter().map(|(_, e)| e.player_id).collect(),
                wins: key.0,
                set_diff: key.1,
                game_diff: key.2,
            });
        }
        start = end;
    }
    ties
}

/// Ties of a group still waiting for a decision: a tie whose players are all on court in
/// an unplayed playoff match is already being handled.
pub fn open_group_ties(group: &Group) -> Vec<TieGroup> {
    detect_ties(&calculate_ranking(group))
        .into_iter()
        .filter(|tie| {
            !group.matches.iter().any(|m| {
                m.is_tiebreaker && !m.is_finished && tie.players.iter().all(|p| m.involves(*p))
            })
        })
        .collect()
}

/// Group, checked for tie resolution: regular, phase still open, round robin fully played.
fn tie_group<'a>(tournament: &'a Tournament, group_id: GroupId) -> Result<&'a Group, TournamentError> {
    let group = tournament.group(group_id)?;
    if !group.is_regular() {
        return Err(TournamentError::InvalidState);
    }
    ensure_phase_open(tournament, &group.category, group.phase)?;
    if group
        .matches
        .iter()
        .any(|m| !m.is_tiebreaker && !m.is_finished)
    {
        return Err(TournamentError::PhaseIncomplete(group.phase));
    }
    Ok(group)
}

fn find_open_tie(group: &Group, player_ids: &[PlayerId]) -> Result<TieGroup, TournamentError> {
    open_group_ties(group)
        .into_iter()
        .find(|t| t.same_players(player_ids))
        .ok_or(TournamentError::NoSuchTie)
}

fn assign_order(group: &mut Group, ordered: &[PlayerId], method: TiebreakMethod) {
    for (i, id) in ordered.iter().enumerate() {
        if let Some(p) = group.player_mut(*id) {
            p.tiebreak_order = Some(i as u32 + 1);
            p.tiebreak_method = Some(method);
        }
    }
}

/// Break a tie in the order given by the caller (best first).
pub fn resolve_group_tie_manual(
    tournament: &mut Tournament,
    group_id: GroupId,
    ordered_ids: &[PlayerId],
) -> Result<(), TournamentError> {
    let group = tie_group(tournament, group_id)?;
    find_open_tie(group, ordered_ids)?;
    let group = tournament.group_mut(group_id)?;
    assign_order(group, ordered_ids, TiebreakMethod::Manual);
    log::info!("Group {}: tie broken manually", group.name);
    Ok(())
}

/// Break a tie by drawing the order at random.
pub fn resolve_group_tie_random<R: RandomSource>(
    tournament: &mut Tournament,
    group_id: GroupId,
    player_ids: &[PlayerId],
    rng: &mut R,
) -> Result<Vec<PlayerId>, TournamentError> {
    let group = tie_group(tournament, group_id)?;
    let tie = find_open_tie(group, player_ids)?;
    let mut order = tie.players;
    rng.shuffle(&mut order);
    let group = tournament.group_mut(group_id)?;
    assign_order(group, &order, TiebreakMethod::Random);
    log::info!("Group {}: tie broken by draw", group.name);
    Ok(order)
}

/// Schedule a singles playoff between exactly two tied players; the order is assigned
/// when its result is recorded.
pub fn resolve_group_tie_singles(
    tournament: &mut Tournament,
    group_id: GroupId,
    player_ids: &[PlayerId],
) -> Result<MatchId, TournamentError> {
    let group = tie_group(tournament, group_id)?;
    let tie = find_open_tie(group, player_ids)?;
    let [a, b] = tie.players.as_slice() else {
        return Err(TournamentError::SinglesNeedsTwoPlayers(tie.players.len()));
    };
    let playoff = Match::singles(group_id, group.next_round(), *a, *b).as_tiebreaker();
    let match_id = playoff.id;
    let group = tournament.group_mut(group_id)?;
    group.matches.push(playoff);
    log::info!("Group {}: singles playoff scheduled", group.name);
    Ok(match_id)
}

/// Undo a tie decision.
///
/// Every player level with one of the listed players loses its tiebreak order, so the
/// tie is reported again as a whole; playoffs involving them are dropped.
pub fn undo_group_tiebreak(
    tournament: &mut Tournament,
    group_id: GroupId,
    player_ids: &[PlayerId],
) -> Result<(), TournamentError> {
    let group = tournament.group(group_id)?;
    if !group.is_regular() {
        return Err(TournamentError::InvalidState);
    }
    ensure_phase_open(tournament, &group.category, group.phase)?;
    let tagged = group
        .players
        .iter()
        .any(|p| player_ids.contains(&p.id) && p.tiebreak_order.is_some());
    let has_playoff = group
        .matches
        .iter()
        .any(|m| m.is_tiebreaker && player_ids.iter().any(|p| m.involves(*p)));
    if !tagged && !has_playoff {
        return Err(TournamentError::NoSuchTie);
    }

    // The whole tie reopens, not only the listed members.
    let ranking = calculate_ranking(group);
    let keys: Vec<_> = ranking
        .iter()
        .filter(|e| player_ids.contains(&e.player_id))
        .map(|e| e.stats_key())
        .collect();
    let tie: Vec<PlayerId> = ranking
        .iter()
        .filter(|e| keys.contains(&e.stats_key()))
        .map(|e| e.player_id)
        .collect();

    let group = tournament.group_mut(group_id)?;
    for p in group.players.iter_mut().filter(|p| tie.contains(&p.id)) {
        p.clear_tiebreak();
    }
    group
        .matches
        .retain(|m| !(m.is_tiebreaker && tie.iter().any(|p| m.involves(*p))));
    log::info!("Group {}: tie decision undone for {} player(s)", group.name, tie.len());
    Ok(())
}

/// Apply a finished intra-group playoff: winner ranks first inside the tie.
pub(crate) fn apply_playoff_result(group: &mut Group, match_id: MatchId) {
    let Some(m) = group.find_match(match_id) else {
        return;
    };
    let Some(winner) = m.winner() else {
        return;
    };
    let loser = match winner {
        Side::A => Side::B,
        Side::B => Side::A,
    };
    let order: Vec<PlayerId> = m
        .team(winner)
        .iter()
        .chain(m.team(loser).iter())
        .copied()
        .collect();
    assign_order(group, &order, TiebreakMethod::Singles);
}
