//! Integration tests for the round robin, group standings and intra-group ties.

mod common;

use beach_tennis_tournament::{
    calculate_ranking, check_advance, detect_ties, open_group_ties, record_match_result,
    resolve_group_tie_manual, resolve_group_tie_random, resolve_group_tie_singles,
    schedule_matches, undo_group_tiebreak, MatchType, Phase, PlayerId, SeededRng, SetScore,
    TiebreakMethod, TournamentError,
};
use common::{formed, groups_of, play_group, roster, snapshot, CAT};
use std::collections::HashSet;
use uuid::Uuid;

fn ids(n: usize) -> Vec<PlayerId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

#[test]
fn four_players_get_three_doubles_rounds() {
    let players = ids(4);
    let matches = schedule_matches(Uuid::new_v4(), &players);
    assert_eq!(matches.len(), 3);

    let mut partners: HashSet<(PlayerId, PlayerId)> = HashSet::new();
    for (i, m) in matches.iter().enumerate() {
        assert_eq!(m.match_type, MatchType::Doubles);
        assert_eq!(m.round, i as u32 + 1);
        assert!(!m.is_finished);
        assert_eq!(m.participants().len(), 4);
        for team in [&m.team_a, &m.team_b] {
            assert_eq!(team.len(), 2);
            let pair = if team[0] < team[1] { (team[0], team[1]) } else { (team[1], team[0]) };
            assert!(partners.insert(pair), "pair partnered twice");
        }
    }
    // 4 choose 2
    assert_eq!(partners.len(), 6);
}

#[test]
fn everybody_faces_everybody_twice() {
    let players = ids(4);
    let matches = schedule_matches(Uuid::new_v4(), &players);
    for a in &players {
        for b in players.iter().filter(|b| *b != a) {
            let faced = matches
                .iter()
                .filter(|m| m.involves(*a) && m.involves(*b) && m.side_of(*a) != m.side_of(*b))
                .count();
            assert_eq!(faced, 2);
        }
    }
}

#[test]
fn two_players_get_one_singles_match() {
    let players = ids(2);
    let matches = schedule_matches(Uuid::new_v4(), &players);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_type, MatchType::Singles);
    assert_eq!(matches[0].team_a, vec![players[0]]);
    assert_eq!(matches[0].team_b, vec![players[1]]);
}

#[test]
fn odd_sizes_fall_back_to_singles_round_robin() {
    let players = ids(5);
    let matches = schedule_matches(Uuid::new_v4(), &players);
    assert_eq!(matches.len(), 10);
    let pairs: HashSet<(PlayerId, PlayerId)> = matches
        .iter()
        .map(|m| {
            let (a, b) = (m.team_a[0], m.team_b[0]);
            if a < b { (a, b) } else { (b, a) }
        })
        .collect();
    assert_eq!(pairs.len(), 10);
    assert!(schedule_matches(Uuid::new_v4(), &ids(1)).is_empty());
}

#[test]
fn ranking_orders_by_wins_then_game_difference() {
    let mut t = formed(8, 1);
    let group_id = groups_of(&t, Phase::One)[0];
    let p = roster(&t, group_id);
    play_group(&mut t, group_id, (0, 1, 2));

    let ranking = calculate_ranking(t.group(group_id).unwrap());
    let order: Vec<PlayerId> = ranking.iter().map(|e| e.player_id).collect();
    assert_eq!(order, vec![p[0], p[1], p[2], p[3]]);

    assert_eq!(ranking[0].wins, 2);
    assert_eq!(ranking[0].game_diff(), 7);
    assert_eq!(ranking[1].game_diff(), 5);
    assert_eq!(ranking[2].game_diff(), 3);
    assert_eq!(ranking[2].games_won, 12);
    assert_eq!(ranking[3].wins, 0);
    assert_eq!(ranking[3].losses, 3);
    assert!(ranking.iter().all(|e| e.matches_played == 3));
    assert!(detect_ties(&ranking).is_empty());
}

#[test]
fn players_without_matches_are_never_tied() {
    let t = formed(8, 2);
    let group = t.group(groups_of(&t, Phase::One)[0]).unwrap();
    let ranking = calculate_ranking(group);
    assert_eq!(ranking.len(), 4);
    assert!(detect_ties(&ranking).is_empty());
}

#[test]
fn three_way_tie_is_detected_and_blocks_advancement() {
    let mut t = formed(8, 3);
    let groups = groups_of(&t, Phase::One);
    let p = roster(&t, groups[0]);
    play_group(&mut t, groups[0], (0, 0, 0));
    play_group(&mut t, groups[1], (0, 1, 2));

    let ties = open_group_ties(t.group(groups[0]).unwrap());
    assert_eq!(ties.len(), 1);
    assert_eq!(ties[0].positions, vec![1, 2, 3]);
    let tied: HashSet<PlayerId> = ties[0].players.iter().copied().collect();
    assert_eq!(tied, HashSet::from([p[0], p[1], p[2]]));
    assert_eq!(ties[0].wins, 2);
    assert_eq!(ties[0].game_diff, 6);

    let check = check_advance(&t, CAT);
    assert!(!check.can_advance);
    assert_eq!(check.phase, Some(Phase::One));
    assert!(check.reason.is_some());

    let before = snapshot(&t);
    assert_eq!(
        resolve_group_tie_singles(&mut t, groups[0], &[p[0], p[1], p[2]]),
        Err(TournamentError::SinglesNeedsTwoPlayers(3))
    );
    assert_eq!(snapshot(&t), before);
}

#[test]
fn manual_resolution_orders_the_tie_and_undo_restores_it() {
    let mut t = formed(8, 4);
    let groups = groups_of(&t, Phase::One);
    let p = roster(&t, groups[0]);
    play_group(&mut t, groups[0], (0, 0, 0));
    play_group(&mut t, groups[1], (0, 1, 2));

    let chosen = [p[2], p[0], p[1]];
    resolve_group_tie_manual(&mut t, groups[0], &chosen).unwrap();

    let group = t.group(groups[0]).unwrap();
    let order: Vec<PlayerId> = calculate_ranking(group).iter().take(3).map(|e| e.player_id).collect();
    assert_eq!(order, chosen.to_vec());
    assert_eq!(group.player(p[2]).unwrap().tiebreak_order, Some(1));
    assert_eq!(group.player(p[2]).unwrap().tiebreak_method, Some(TiebreakMethod::Manual));
    assert!(open_group_ties(group).is_empty());
    assert!(check_advance(&t, CAT).can_advance);

    undo_group_tiebreak(&mut t, groups[0], &chosen).unwrap();
    let group = t.group(groups[0]).unwrap();
    assert!(group.players.iter().all(|pl| pl.tiebreak_order.is_none()));
    assert_eq!(open_group_ties(group).len(), 1);
}

#[test]
fn undoing_one_member_reopens_the_whole_tie() {
    let mut t = formed(8, 4);
    let groups = groups_of(&t, Phase::One);
    let p = roster(&t, groups[0]);
    play_group(&mut t, groups[0], (0, 0, 0));
    play_group(&mut t, groups[1], (0, 1, 2));

    resolve_group_tie_manual(&mut t, groups[0], &[p[2], p[0], p[1]]).unwrap();
    undo_group_tiebreak(&mut t, groups[0], &[p[2]]).unwrap();

    let group = t.group(groups[0]).unwrap();
    assert!(group.players.iter().all(|pl| pl.tiebreak_order.is_none()));
    let ties = open_group_ties(group);
    assert_eq!(ties.len(), 1);
    let tied: HashSet<PlayerId> = ties[0].players.iter().copied().collect();
    assert_eq!(tied, HashSet::from([p[0], p[1], p[2]]));
    assert!(!check_advance(&t, CAT).can_advance);
}

#[test]
fn manual_resolution_rejects_players_outside_the_tie() {
    let mut t = formed(8, 5);
    let groups = groups_of(&t, Phase::One);
    let p = roster(&t, groups[0]);
    play_group(&mut t, groups[0], (0, 0, 0));

    let before = snapshot(&t);
    assert_eq!(
        resolve_group_tie_manual(&mut t, groups[0], &[p[0], p[3]]),
        Err(TournamentError::NoSuchTie)
    );
    assert_eq!(snapshot(&t), before);
}

#[test]
fn ties_cannot_be_resolved_before_the_round_robin_is_played() {
    let mut t = formed(8, 6);
    let groups = groups_of(&t, Phase::One);
    let p = roster(&t, groups[0]);
    assert_eq!(
        resolve_group_tie_manual(&mut t, groups[0], &[p[0], p[1]]),
        Err(TournamentError::PhaseIncomplete(Phase::One))
    );
}

#[test]
fn random_resolution_tags_every_tied_player() {
    let mut t = formed(8, 7);
    let groups = groups_of(&t, Phase::One);
    let p = roster(&t, groups[0]);
    play_group(&mut t, groups[0], (0, 0, 0));

    let order =
        resolve_group_tie_random(&mut t, groups[0], &[p[1], p[0], p[2]], &mut SeededRng::from_seed(9))
            .unwrap();
    assert_eq!(order.len(), 3);
    let group = t.group(groups[0]).unwrap();
    for (i, id) in order.iter().enumerate() {
        let player = group.player(*id).unwrap();
        assert_eq!(player.tiebreak_order, Some(i as u32 + 1));
        assert_eq!(player.tiebreak_method, Some(TiebreakMethod::Random));
    }
}

#[test]
fn singles_playoff_decides_a_two_way_tie() {
    let mut t = formed(8, 8);
    let groups = groups_of(&t, Phase::One);
    let p = roster(&t, groups[0]);
    play_group(&mut t, groups[0], (1, 1, 0));
    play_group(&mut t, groups[1], (0, 1, 2));

    let ties = open_group_ties(t.group(groups[0]).unwrap());
    assert_eq!(ties.len(), 1);
    assert_eq!(ties[0].positions, vec![1, 2]);
    let tied: HashSet<PlayerId> = ties[0].players.iter().copied().collect();
    assert_eq!(tied, HashSet::from([p[1], p[2]]));

    let match_id = resolve_group_tie_singles(&mut t, groups[0], &ties[0].players).unwrap();
    let group = t.group(groups[0]).unwrap();
    let playoff = group.find_match(match_id).unwrap().clone();
    assert!(playoff.is_tiebreaker);
    assert_eq!(playoff.match_type, MatchType::Singles);
    assert_eq!(playoff.round, 4);
    assert!(open_group_ties(group).is_empty());
    assert!(!check_advance(&t, CAT).can_advance);

    record_match_result(&mut t, match_id, vec![SetScore::new(6, 3)]).unwrap();
    let group = t.group(groups[0]).unwrap();
    let winner = playoff.team_a[0];
    let winner_entry = group.player(winner).unwrap();
    assert_eq!(winner_entry.tiebreak_order, Some(1));
    assert_eq!(winner_entry.tiebreak_method, Some(TiebreakMethod::Singles));

    // the playoff never counts in the standings
    let ranking = calculate_ranking(group);
    assert_eq!(ranking[0].player_id, winner);
    assert_eq!(ranking[0].matches_played, 3);
    assert_eq!(ranking[0].wins, 2);
    assert!(check_advance(&t, CAT).can_advance);
}
