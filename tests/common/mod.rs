//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use beach_tennis_tournament::{
    add_player, form_groups, record_match_result, GroupId, MatchId, Phase, PlayerId, SeededRng,
    SetScore, Tournament,
};

pub const CAT: &str = "Open";

/// Tournament with one category and `n` waiting players named P01, P02, ...
pub fn tournament_with_players(n: usize) -> Tournament {
    let mut t = Tournament::with_categories("Beach Open", [CAT]);
    for i in 0..n {
        add_player(&mut t, &format!("P{:02}", i + 1), CAT, false).unwrap();
    }
    t
}

/// Tournament with `n` players already drawn into Phase 1 groups.
pub fn formed(n: usize, seed: u64) -> Tournament {
    let mut t = tournament_with_players(n);
    form_groups(&mut t, CAT, &mut SeededRng::from_seed(seed)).unwrap();
    t
}

pub fn groups_of(t: &Tournament, phase: Phase) -> Vec<GroupId> {
    t.groups_in(CAT, phase).map(|g| g.id).collect()
}

/// Roster order, which is also the schedule slot order p1..p4.
pub fn roster(t: &Tournament, group_id: GroupId) -> Vec<PlayerId> {
    t.group(group_id).unwrap().players.iter().map(|p| p.id).collect()
}

/// Play the three doubles rounds of a group of four:
/// round 1 side A wins 6-a, round 2 side A wins 6-b, round 3 side B wins c-6.
///
/// p1, p2 and p3 all finish on two wins, p4 on none. Game differences are
/// p1 = 6+c-a-b, p2 = 6+b-a-c, p3 = 6+a-b-c.
pub fn play_group(t: &mut Tournament, group_id: GroupId, (a, b, c): (u32, u32, u32)) {
    let ids: Vec<MatchId> = t
        .group(group_id)
        .unwrap()
        .matches
        .iter()
        .filter(|m| !m.is_tiebreaker)
        .map(|m| m.id)
        .collect();
    assert_eq!(ids.len(), 3);
    record_match_result(t, ids[0], vec![SetScore::new(6, a)]).unwrap();
    record_match_result(t, ids[1], vec![SetScore::new(6, b)]).unwrap();
    record_match_result(t, ids[2], vec![SetScore::new(c, 6)]).unwrap();
}

/// Serialized form, for "nothing changed" assertions.
pub fn snapshot(t: &Tournament) -> serde_json::Value {
    serde_json::to_value(t).unwrap()
}
