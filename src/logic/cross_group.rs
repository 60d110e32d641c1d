//! Ties between players holding the same rank in different groups of one phase.
//!
//! Standings only order players inside a group. When qualification compares groups
//! ("best 3rd places", "best 2nd place", "best four group winners") the candidates are
//! ranked here by wins, game difference and games won. Players still level at the
//! qualification cutoff form a cross-group tie that must be settled manually, by draw or
//! by a singles playoff before the phase can advance. Names never break these ties.

use crate::logic::advancement::{ensure_phase_open, is_phase_complete};
use crate::logic::ranking::calculate_ranking;
use crate::logic::rng::RandomSource;
use crate::logic::validation::repechage_size;
use crate::models::{
    CrossGroupTiebreak, Group, GroupId, GroupKind, Match, MatchId, Phase, PlayerId, TiebreakId,
    TiebreakMethod, Tournament, TournamentError,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// A group's player at the compared rank.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CrossGroupCandidate {
    pub player_id: PlayerId,
    pub name: String,
    pub group_id: GroupId,
    pub group_name: String,
    pub wins: u32,
    pub game_diff: i64,
    pub games_won: u32,
}

impl CrossGroupCandidate {
    fn stats_key(&self) -> (u32, i64, u32) {
        (self.wins, self.game_diff, self.games_won)
    }
}

/// A rank compared across groups and how many of its candidates qualify.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct CrossGroupRequirement {
    /// 0-based rank inside each group.
    pub position: usize,
    pub slots: usize,
}

/// Open tie at a qualification cutoff.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CrossGroupTie {
    pub category: String,
    pub phase: Phase,
    pub position: usize,
    /// Slots still open for the tied players.
    pub slots: usize,
    /// Contenders for those slots, in group order.
    pub players: Vec<PlayerId>,
    pub candidates: Vec<CrossGroupCandidate>,
}

/// Ranks the qualification rules of `phase` compare across groups.
pub fn cross_group_requirements(
    tournament: &Tournament,
    category: &str,
    phase: Phase,
) -> Vec<CrossGroupRequirement> {
    let groups = tournament.groups_in(category, phase).count();
    match phase {
        Phase::One => {
            let slots = repechage_size(groups * 2);
            if slots > 0 {
                vec![CrossGroupRequirement { position: 2, slots }]
            } else {
                Vec::new()
            }
        }
        Phase::Two => match groups {
            3 => vec![CrossGroupRequirement { position: 1, slots: 1 }],
            n if n >= 5 => vec![CrossGroupRequirement { position: 0, slots: 4 }],
            _ => Vec::new(),
        },
        Phase::Three => Vec::new(),
    }
}

/// Candidates at `position` of every group of the phase, best first.
///
/// Stats order first; among equal stats, winners of earlier resolutions for this rank
/// come first, in the order they were decided. Remaining equals keep group order.
pub fn cross_group_ranking(
    tournament: &Tournament,
    category: &str,
    phase: Phase,
    position: usize,
) -> Vec<CrossGroupCandidate> {
    let priority: HashMap<PlayerId, usize> = tournament
        .cross_tiebreaks_in(category, phase)
        .filter(|tb| tb.position == position)
        .filter_map(|tb| tb.winner_id)
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();

    let mut candidates: Vec<CrossGroupCandidate> = tournament
        .groups_in(category, phase)
        .filter_map(|g| {
            let ranking = calculate_ranking(g);
            let entry = ranking.get(position)?;
            Some(CrossGroupCandidate {
                player_id: entry.player_id,
                name: entry.name.clone(),
                group_id: g.id,
                group_name: g.name.clone(),
                wins: entry.wins,
                game_diff: entry.game_diff(),
                games_won: entry.games_won,
            })
        })
        .collect();

    let rank = |c: &CrossGroupCandidate| priority.get(&c.player_id).copied().unwrap_or(usize::MAX);
    candidates.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.game_diff.cmp(&a.game_diff))
            .then_with(|| b.games_won.cmp(&a.games_won))
            .then_with(|| rank(a).cmp(&rank(b)))
    });
    candidates
}

/// Tie at the cutoff when the best `slots` candidates at `position` qualify.
///
/// Looks at the cluster of equal stats straddling the last qualifying slot. Players of
/// that cluster who already won a resolution hold their slots; the rest contend for what
/// is left. Players waiting on a singles playoff are being handled and are left out; if
/// fewer than two contenders remain there is nothing to report.
pub fn detect_cross_group_tie(
    tournament: &Tournament,
    category: &str,
    phase: Phase,
    position: usize,
    slots: usize,
) -> Option<CrossGroupTie> {
    let ranked = cross_group_ranking(tournament, category, phase, position);
    if slots == 0 || ranked.len() <= slots {
        return None;
    }
    let cutoff = ranked[slots - 1].stats_key();
    if ranked[slots].stats_key() != cutoff {
        return None;
    }
    let start = ranked.iter().position(|c| c.stats_key() == cutoff)?;
    let end = ranked[start..]
        .iter()
        .position(|c| c.stats_key() != cutoff)
        .map_or(ranked.len(), |offset| start + offset);

    let records: Vec<&CrossGroupTiebreak> = tournament
        .cross_tiebreaks_in(category, phase)
        .filter(|tb| tb.position == position)
        .collect();
    let decided: HashSet<PlayerId> = records.iter().filter_map(|tb| tb.winner_id).collect();
    let pending: HashSet<PlayerId> = records
        .iter()
        .filter(|tb| tb.is_pending())
        .flat_map(|tb| tb.tied_player_ids.iter().copied())
        .collect();

    let cluster = &ranked[start..end];
    let held = cluster.iter().filter(|c| decided.contains(&c.player_id)).count();
    let open_slots = slots.saturating_sub(start + held);
    if open_slots == 0 {
        return None;
    }

    let contenders: Vec<CrossGroupCandidate> = cluster
        .iter()
        .filter(|c| !decided.contains(&c.player_id) && !pending.contains(&c.player_id))
        .cloned()
        .collect();
    if contenders.len() < 2 {
        return None;
    }
    let mut by_group = contenders;
    by_group.sort_by_key(|c| group_order(tournament, c.group_id));
    Some(CrossGroupTie {
        category: category.to_string(),
        phase,
        position,
        slots: open_slots,
        players: by_group.iter().map(|c| c.player_id).collect(),
        candidates: by_group,
    })
}

fn group_order(tournament: &Tournament, group_id: GroupId) -> usize {
    tournament
        .groups
        .iter()
        .position(|g| g.id == group_id)
        .unwrap_or(usize::MAX)
}

/// Every open cross-group tie of the category's current phase (empty until the phase is
/// fully played).
pub fn pending_cross_group_ties(tournament: &Tournament, category: &str) -> Vec<CrossGroupTie> {
    let Some(phase) = tournament.current_phase(category) else {
        return Vec::new();
    };
    if !is_phase_complete(tournament, category, phase) {
        return Vec::new();
    }
    cross_group_requirements(tournament, category, phase)
        .into_iter()
        .filter_map(|req| detect_cross_group_tie(tournament, category, phase, req.position, req.slots))
        .collect()
}

/// The open tie at `position`, checked for resolution.
fn open_tie(
    tournament: &Tournament,
    category: &str,
    phase: Phase,
    position: usize,
) -> Result<CrossGroupTie, TournamentError> {
    tournament.require_category(category)?;
    ensure_phase_open(tournament, category, phase)?;
    if !is_phase_complete(tournament, category, phase) {
        return Err(TournamentError::PhaseIncomplete(phase));
    }
    let req = cross_group_requirements(tournament, category, phase)
        .into_iter()
        .find(|r| r.position == position)
        .ok_or(TournamentError::NoSuchTie)?;
    detect_cross_group_tie(tournament, category, phase, position, req.slots).ok_or(TournamentError::NoSuchTie)
}

fn decided_record(tie: CrossGroupTie, winner: PlayerId, method: TiebreakMethod) -> CrossGroupTiebreak {
    CrossGroupTiebreak {
        id: Uuid::new_v4(),
        category: tie.category,
        phase: tie.phase,
        position: tie.position,
        winner_id: Some(winner),
        method,
        tied_player_ids: tie.players,
        match_id: None,
        resolved_at: Some(Utc::now()),
    }
}

/// Give the contested slot to `winner_id`.
pub fn resolve_cross_group_tie_manual(
    tournament: &mut Tournament,
    category: &str,
    phase: Phase,
    position: usize,
    winner_id: PlayerId,
) -> Result<TiebreakId, TournamentError> {
    let tie = open_tie(tournament, category, phase, position)?;
    if !tie.players.contains(&winner_id) {
        return Err(TournamentError::PlayerNotFound(winner_id));
    }
    let record = decided_record(tie, winner_id, TiebreakMethod::Manual);
    let id = record.id;
    tournament.cross_group_tiebreaks.push(record);
    log::info!(
        "Category {} {}: cross-group tie at rank {} decided manually",
        category,
        phase,
        position + 1
    );
    Ok(id)
}

/// Give the contested slot to a contender drawn uniformly at random.
pub fn resolve_cross_group_tie_random<R: RandomSource>(
    tournament: &mut Tournament,
    category: &str,
    phase: Phase,
    position: usize,
    rng: &mut R,
) -> Result<PlayerId, TournamentError> {
    let tie = open_tie(tournament, category, phase, position)?;
    let winner = tie.players[rng.pick_index(tie.players.len())];
    tournament
        .cross_group_tiebreaks
        .push(decided_record(tie, winner, TiebreakMethod::Random));
    log::info!(
        "Category {} {}: cross-group tie at rank {} decided by draw",
        category,
        phase,
        position + 1
    );
    Ok(winner)
}

/// Schedule a singles playoff between the two contenders in the phase's playoff group.
/// The slot goes to its winner once the result is recorded.
pub fn resolve_cross_group_tie_singles(
    tournament: &mut Tournament,
    category: &str,
    phase: Phase,
    position: usize,
) -> Result<MatchId, TournamentError> {
    let tie = open_tie(tournament, category, phase, position)?;
    let [a, b] = tie.players.as_slice() else {
        return Err(TournamentError::SinglesNeedsTwoPlayers(tie.players.len()));
    };
    let (a, b) = (*a, *b);

    let existing = tournament
        .groups
        .iter()
        .position(|g| g.kind == GroupKind::Tiebreak && g.belongs_to(category, phase));
    let index = match existing {
        Some(i) => i,
        None => {
            tournament.groups.push(Group::tiebreak(category, phase));
            tournament.groups.len() - 1
        }
    };
    let group = &mut tournament.groups[index];
    let playoff = Match::singles(group.id, group.next_round(), a, b).as_tiebreaker();
    let match_id = playoff.id;
    group.matches.push(playoff);

    tournament.cross_group_tiebreaks.push(CrossGroupTiebreak {
        id: Uuid::new_v4(),
        category: tie.category,
        phase,
        position,
        winner_id: None,
        method: TiebreakMethod::Singles,
        tied_player_ids: tie.players,
        match_id: Some(match_id),
        resolved_at: None,
    });
    log::info!(
        "Category {} {}: singles playoff scheduled for rank {}",
        category,
        phase,
        position + 1
    );
    Ok(match_id)
}

/// Remove a cross-group decision, and its playoff match if it had one.
pub fn undo_cross_group_tiebreak(tournament: &mut Tournament, id: TiebreakId) -> Result<(), TournamentError> {
    let index = tournament
        .cross_group_tiebreaks
        .iter()
        .position(|tb| tb.id == id)
        .ok_or(TournamentError::TiebreakNotFound(id))?;
    let record = &tournament.cross_group_tiebreaks[index];
    ensure_phase_open(tournament, &record.category, record.phase)?;

    let record = tournament.cross_group_tiebreaks.remove(index);
    if let Some(match_id) = record.match_id {
        remove_playoff_match(tournament, match_id);
    }
    log::info!(
        "Category {} {}: cross-group decision at rank {} undone",
        record.category,
        record.phase,
        record.position + 1
    );
    Ok(())
}

/// Drop a playoff match from its synthetic group, and the group once it is empty.
pub(crate) fn remove_playoff_match(tournament: &mut Tournament, match_id: MatchId) {
    for group in tournament.groups.iter_mut().filter(|g| g.kind == GroupKind::Tiebreak) {
        group.matches.retain(|m| m.id != match_id);
    }
    tournament
        .groups
        .retain(|g| g.kind != GroupKind::Tiebreak || !g.matches.is_empty());
}

/// Fill (or clear, for a reopened match) the winner of the record owning this playoff.
pub(crate) fn sync_playoff_winner(tournament: &mut Tournament, match_id: MatchId) {
    let winner = tournament
        .find_match(match_id)
        .ok()
        .and_then(|(_, m)| m.winner().and_then(|side| m.team(side).first().copied()));
    if let Some(record) = tournament
        .cross_group_tiebreaks
        .iter_mut()
        .find(|tb| tb.match_id == Some(match_id))
    {
        record.winner_id = winner;
        record.resolved_at = winner.map(|_| Utc::now());
    }
}
