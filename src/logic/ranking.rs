//! Group standings: aggregation over finished matches and the ordering rules.

use crate::models::{Group, PlayerId, Side};
use serde::Serialize;
use std::cmp::Ordering;

/// Tiebreak order given to players that carry none; sorts them after tagged players.
const UNTAGGED: u32 = u32::MAX;

/// One line of a group's standings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RankingEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub tiebreak_order: Option<u32>,
}

impl RankingEntry {
    fn empty(player_id: PlayerId, name: &str, tiebreak_order: Option<u32>) -> Self {
        Self {
            player_id,
            name: name.to_string(),
            matches_played: 0,
            wins: 0,
            losses: 0,
            sets_won: 0,
            sets_lost: 0,
            games_won: 0,
            games_lost: 0,
            tiebreak_order,
        }
    }

    pub fn set_diff(&self) -> i64 {
        i64::from(self.sets_won) - i64::from(self.sets_lost)
    }

    pub fn game_diff(&self) -> i64 {
        i64::from(self.games_won) - i64::from(self.games_lost)
    }

    /// The statistics the standings order by, tiebreak order aside.
    pub fn stats_key(&self) -> (u32, i64, i64) {
        (self.wins, self.set_diff(), self.game_diff())
    }
}

/// Standings of a group, best first.
///
/// Only finished matches that are not tie playoffs count; each participant is counted
/// once per match. Order: wins, set difference, game difference (all descending), then
/// `tiebreak_order` ascending with untagged players last, then name so the output is
/// deterministic. Players level on everything but the name are left for
/// [`detect_ties`](crate::logic::detect_ties) to report.
pub fn calculate_ranking(group: &Group) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = group
        .players
        .iter()
        .map(|p| RankingEntry::empty(p.id, &p.name, p.tiebreak_order))
        .collect();

    for m in group.matches.iter().filter(|m| m.counts_for_standings()) {
        let Some(winner) = m.winner() else {
            continue;
        };
        let (games_a, games_b) = m.games();
        for pid in m.participants() {
            let Some(side) = m.side_of(pid) else {
                continue;
            };
            let Some(entry) = entries.iter_mut().find(|e| e.player_id == pid) else {
                continue;
            };
            let (sets_for, sets_against, games_for, games_against) = match side {
                Side::A => (m.sets_won_a, m.sets_won_b, games_a, games_b),
                Side::B => (m.sets_won_b, m.sets_won_a, games_b, games_a),
            };
            entry.matches_played += 1;
            if side == winner {
                entry.wins += 1;
            } else {
                entry.losses += 1;
            }
            entry.sets_won += sets_for;
            entry.sets_lost += sets_against;
            entry.games_won += games_for;
            entry.games_lost += games_against;
        }
    }

    entries.sort_by(compare_entries);
    entries
}

/// Standings order between two entries (`Less` = ranked higher).
pub fn compare_entries(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| b.set_diff().cmp(&a.set_diff()))
        .then_with(|| b.game_diff().cmp(&a.game_diff()))
        .then_with(|| {
            a.tiebreak_order
                .unwrap_or(UNTAGGED)
                .cmp(&b.tiebreak_order.unwrap_or(UNTAGGED))
        })
        .then_with(|| a.name.cmp(&b.name))
}
