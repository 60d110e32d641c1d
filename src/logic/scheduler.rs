//! Round-robin schedules for a group.

use crate::models::{GroupId, Match, PlayerId};

/// Build the fixed round-robin schedule for a group's players.
///
/// - 4 players: the doubles round robin. Rounds 1..3 pair (p1+p2 vs p3+p4),
///   (p1+p3 vs p2+p4), (p1+p4 vs p2+p3): everybody partners every other player once
///   and faces every other player twice.
/// - 2 players: a single singles match.
/// - Any other size: circle-method singles round robin (fallback, not used by the
///   normal flow).
///
/// Matches come back unplayed, rounds numbered from 1.
pub fn schedule_matches(group_id: GroupId, players: &[PlayerId]) -> Vec<Match> {
    match players {
        [p1, p2, p3, p4] => vec![
            Match::doubles(group_id, 1, [*p1, *p2], [*p3, *p4]),
            Match::doubles(group_id, 2, [*p1, *p3], [*p2, *p4]),
            Match::doubles(group_id, 3, [*p1, *p4], [*p2, *p3]),
        ],
        [a, b] => vec![Match::singles(group_id, 1, *a, *b)],
        _ => circle_round_robin(group_id, players),
    }
}

/// Classic circle method: fix the first slot, rotate the rest; `None` is the bye.
fn circle_round_robin(group_id: GroupId, players: &[PlayerId]) -> Vec<Match> {
    if players.len() < 2 {
        return Vec::new();
    }
    let mut slots: Vec<Option<PlayerId>> = players.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    let mut matches = Vec::with_capacity(players.len() * (players.len() - 1) / 2);
    for round in 0..n - 1 {
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (slots[i], slots[n - 1 - i]) {
                matches.push(Match::singles(group_id, round as u32 + 1, a, b));
            }
        }
        slots[1..].rotate_right(1);
    }
    matches
}
