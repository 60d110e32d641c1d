//! Integration tests for phase advancement and cross-group tie resolution.

mod common;

use beach_tennis_tournament::{
    add_player, advance_phase, champion, check_advance, cross_group_ranking,
    cross_group_requirements, form_groups, pending_cross_group_ties, plan_bracket, qualifiers,
    record_match_result, reopen_match, resolve_cross_group_tie_manual,
    resolve_cross_group_tie_random, resolve_cross_group_tie_singles, undo_cross_group_tiebreak,
    AdvanceOutcome, GroupKind, MatchType, Phase, PlayerId, PlayerStatus, QualificationType,
    SeededRng, SetScore, TiebreakMethod, Tournament, TournamentError,
};
use common::{formed, groups_of, play_group, roster, snapshot, CAT};

fn play_phase(t: &mut Tournament, phase: Phase, outcome: (u32, u32, u32)) {
    for group_id in groups_of(t, phase) {
        play_group(t, group_id, outcome);
    }
}

fn advance(t: &mut Tournament, seed: u64) -> AdvanceOutcome {
    advance_phase(t, CAT, &mut SeededRng::from_seed(seed)).unwrap()
}

/// Twelve players in groups A, B, C. C's 3rd place is clearly best; A's and B's 3rd
/// places are level for the second repechage slot.
fn repechage_tie() -> (Tournament, [PlayerId; 3]) {
    let mut t = formed(12, 11);
    let groups = groups_of(&t, Phase::One);
    play_group(&mut t, groups[0], (0, 1, 3));
    play_group(&mut t, groups[1], (0, 1, 3));
    play_group(&mut t, groups[2], (0, 1, 2));
    let thirds = [
        roster(&t, groups[0])[2],
        roster(&t, groups[1])[2],
        roster(&t, groups[2])[2],
    ];
    (t, thirds)
}

#[test]
fn eight_players_run_to_a_champion() {
    let mut t = formed(8, 1);
    assert!(!check_advance(&t, CAT).can_advance);
    assert_eq!(
        advance_phase(&mut t, CAT, &mut SeededRng::from_seed(1)),
        Err(TournamentError::PhaseIncomplete(Phase::One))
    );

    play_phase(&mut t, Phase::One, (0, 1, 2));
    assert!(check_advance(&t, CAT).can_advance);
    let AdvanceOutcome::Advanced { phase, groups, qualification } = advance(&mut t, 2) else {
        panic!("expected phase 2");
    };
    assert_eq!(phase, Phase::Two);
    assert_eq!(groups.len(), 1);
    assert_eq!(qualification.direct.len(), 4);
    assert!(qualification.repechage.is_empty());
    assert_eq!(t.current_phase(CAT), Some(Phase::Two));

    for g in t.groups_in(CAT, Phase::One) {
        for p in &g.players {
            if qualification.direct.contains(&p.id) {
                assert_eq!(p.qualification_type, Some(QualificationType::Direct));
            } else {
                assert_eq!(p.status, PlayerStatus::Eliminated);
                assert_eq!(p.eliminated_in_phase, Some(Phase::One));
            }
        }
    }

    play_phase(&mut t, Phase::Two, (0, 1, 2));
    let leader = roster(&t, groups[0])[0];
    let AdvanceOutcome::Advanced { phase, groups, .. } = advance(&mut t, 3) else {
        panic!("expected the final");
    };
    assert_eq!(phase, Phase::Three);
    let final_group = t.group(groups[0]).unwrap();
    assert_eq!(final_group.players.len(), 2);
    assert_eq!(final_group.matches.len(), 1);
    let final_match = final_group.matches[0].clone();
    assert_eq!(final_match.match_type, MatchType::Singles);
    assert_eq!(final_match.team_a, vec![leader]);

    assert_eq!(champion(&t, CAT), None);
    record_match_result(&mut t, final_match.id, vec![SetScore::new(6, 2)]).unwrap();
    assert_eq!(
        advance(&mut t, 4),
        AdvanceOutcome::CategoryCompleted { champion: leader }
    );
    assert_eq!(champion(&t, CAT).map(|p| p.id), Some(leader));
    assert!(t.is_category_completed(CAT));

    assert_eq!(
        add_player(&mut t, "Latecomer", CAT, false),
        Err(TournamentError::CategoryCompleted(CAT.to_string()))
    );
    assert_eq!(
        advance_phase(&mut t, CAT, &mut SeededRng::from_seed(5)),
        Err(TournamentError::CategoryCompleted(CAT.to_string()))
    );
}

#[test]
fn closed_phases_are_locked() {
    let mut t = formed(8, 6);
    play_phase(&mut t, Phase::One, (0, 1, 2));
    advance(&mut t, 7);

    let old_match = t.groups_in(CAT, Phase::One).next().unwrap().matches[0].id;
    let before = snapshot(&t);
    assert_eq!(
        reopen_match(&mut t, old_match),
        Err(TournamentError::PhaseLocked(Phase::One))
    );
    assert_eq!(snapshot(&t), before);
}

#[test]
fn every_viable_bracket_ends_in_a_final_of_two_or_four() {
    for n in 8..=200 {
        let plan = plan_bracket(n);
        assert!(plan.is_viable(), "{} players", n);
        assert_eq!(plan.placed + plan.leftover, n);
        let phase_two = &plan.steps[1];
        assert_eq!(phase_two.players % 4, 0, "{} players", n);
        let finalists = plan.steps[2].players;
        assert!(finalists == 2 || finalists == 4, "{} players -> {} finalists", n, finalists);
    }
}

#[test]
fn repechage_tie_blocks_advancement() {
    let (mut t, [a3, b3, c3]) = repechage_tie();
    let reqs = cross_group_requirements(&t, CAT, Phase::One);
    assert_eq!(reqs.len(), 1);
    assert_eq!((reqs[0].position, reqs[0].slots), (2, 2));

    let ranked = cross_group_ranking(&t, CAT, Phase::One, 2);
    assert_eq!(ranked[0].player_id, c3);
    assert_eq!(ranked[0].game_diff, 3);

    let ties = pending_cross_group_ties(&t, CAT);
    assert_eq!(ties.len(), 1);
    assert_eq!(ties[0].slots, 1);
    assert_eq!(ties[0].players, vec![a3, b3]);

    let before = snapshot(&t);
    assert_eq!(
        advance_phase(&mut t, CAT, &mut SeededRng::from_seed(1)),
        Err(TournamentError::UnresolvedCrossGroupTie {
            phase: Phase::One,
            position: 2
        })
    );
    assert_eq!(snapshot(&t), before);
}

#[test]
fn manual_cross_group_decision_fills_the_repechage() {
    let (mut t, [a3, b3, c3]) = repechage_tie();
    assert_eq!(
        resolve_cross_group_tie_manual(&mut t, CAT, Phase::One, 2, c3),
        Err(TournamentError::PlayerNotFound(c3))
    );
    resolve_cross_group_tie_manual(&mut t, CAT, Phase::One, 2, b3).unwrap();
    assert!(pending_cross_group_ties(&t, CAT).is_empty());
    let record = &t.cross_group_tiebreaks[0];
    assert_eq!(record.winner_id, Some(b3));
    assert_eq!(record.method, TiebreakMethod::Manual);
    assert!(record.resolved_at.is_some());

    let q = qualifiers(&t, CAT, Phase::One).unwrap();
    assert_eq!(q.direct.len(), 6);
    assert_eq!(q.repechage, vec![c3, b3]);

    let AdvanceOutcome::Advanced { groups, .. } = advance(&mut t, 2) else {
        panic!("expected phase 2");
    };
    assert_eq!(groups.len(), 2);
    let a_group = t.groups_in(CAT, Phase::One).find(|g| g.contains(a3)).unwrap();
    assert_eq!(a_group.player(a3).unwrap().status, PlayerStatus::Eliminated);
    let b_group = t.groups_in(CAT, Phase::One).find(|g| g.contains(b3)).unwrap();
    assert_eq!(
        b_group.player(b3).unwrap().qualification_type,
        Some(QualificationType::Repechage)
    );
    assert!(t.groups_in(CAT, Phase::Two).any(|g| g.contains(b3)));
}

#[test]
fn undoing_a_cross_group_decision_reopens_the_tie() {
    let (mut t, [a3, b3, _]) = repechage_tie();
    let id = resolve_cross_group_tie_manual(&mut t, CAT, Phase::One, 2, a3).unwrap();
    undo_cross_group_tiebreak(&mut t, id).unwrap();

    assert!(t.cross_group_tiebreaks.is_empty());
    let ties = pending_cross_group_ties(&t, CAT);
    assert_eq!(ties.len(), 1);
    assert_eq!(ties[0].players, vec![a3, b3]);
    assert_eq!(
        undo_cross_group_tiebreak(&mut t, id),
        Err(TournamentError::TiebreakNotFound(id))
    );
}

#[test]
fn random_cross_group_decision_picks_a_contender() {
    let (mut t, [a3, b3, c3]) = repechage_tie();
    let winner =
        resolve_cross_group_tie_random(&mut t, CAT, Phase::One, 2, &mut SeededRng::from_seed(3))
            .unwrap();
    assert!(winner == a3 || winner == b3);
    assert_eq!(t.cross_group_tiebreaks[0].method, TiebreakMethod::Random);

    let AdvanceOutcome::Advanced { qualification, .. } = advance(&mut t, 4) else {
        panic!("expected phase 2");
    };
    assert_eq!(qualification.repechage, vec![c3, winner]);
}

#[test]
fn singles_playoff_settles_the_repechage() {
    let (mut t, [a3, b3, c3]) = repechage_tie();
    let match_id = resolve_cross_group_tie_singles(&mut t, CAT, Phase::One, 2).unwrap();

    let playoff_group = t
        .groups
        .iter()
        .find(|g| g.kind == GroupKind::Tiebreak)
        .unwrap();
    assert_eq!(playoff_group.name, "Tiebreak Open P1");
    assert_eq!(t.groups_in(CAT, Phase::One).count(), 3);
    assert!(t.cross_group_tiebreaks[0].is_pending());
    assert!(pending_cross_group_ties(&t, CAT).is_empty());
    assert_eq!(
        advance_phase(&mut t, CAT, &mut SeededRng::from_seed(1)),
        Err(TournamentError::PendingTiebreakMatch)
    );

    let (_, playoff) = t.find_match(match_id).unwrap();
    assert_eq!(playoff.team_a, vec![a3]);
    assert_eq!(playoff.team_b, vec![b3]);
    record_match_result(&mut t, match_id, vec![SetScore::new(6, 1)]).unwrap();
    assert_eq!(t.cross_group_tiebreaks[0].winner_id, Some(a3));

    // the playoff does not change Phase 1 standings
    assert_eq!(cross_group_ranking(&t, CAT, Phase::One, 2)[1].games_won, 12);

    let AdvanceOutcome::Advanced { qualification, .. } = advance(&mut t, 2) else {
        panic!("expected phase 2");
    };
    assert_eq!(qualification.repechage, vec![c3, a3]);
}

#[test]
fn reopening_a_group_match_discards_cross_group_decisions() {
    let (mut t, [a3, _, _]) = repechage_tie();
    resolve_cross_group_tie_singles(&mut t, CAT, Phase::One, 2).unwrap();
    let group_match = t.groups_in(CAT, Phase::One).next().unwrap().matches[0].id;

    reopen_match(&mut t, group_match).unwrap();
    assert!(t.cross_group_tiebreaks.is_empty());
    assert!(t.groups.iter().all(|g| g.kind == GroupKind::Regular));

    assert_eq!(
        resolve_cross_group_tie_manual(&mut t, CAT, Phase::One, 2, a3),
        Err(TournamentError::PhaseIncomplete(Phase::One))
    );
}

#[test]
fn three_phase_two_groups_send_winners_and_best_runner_up() {
    let mut t = formed(24, 21);
    play_phase(&mut t, Phase::One, (0, 1, 2));
    let AdvanceOutcome::Advanced { groups, .. } = advance(&mut t, 22) else {
        panic!("expected phase 2");
    };
    assert_eq!(groups.len(), 3);

    play_phase(&mut t, Phase::Two, (0, 1, 2));
    let ties = pending_cross_group_ties(&t, CAT);
    assert_eq!(ties.len(), 1);
    assert_eq!(ties[0].position, 1);
    assert_eq!(ties[0].players.len(), 3);
    assert_eq!(
        resolve_cross_group_tie_singles(&mut t, CAT, Phase::Two, 1),
        Err(TournamentError::SinglesNeedsTwoPlayers(3))
    );

    let runner_up = ties[0].players[1];
    resolve_cross_group_tie_manual(&mut t, CAT, Phase::Two, 1, runner_up).unwrap();
    let winners: Vec<PlayerId> = groups.iter().map(|g| roster(&t, *g)[0]).collect();

    let AdvanceOutcome::Advanced { phase, groups, qualification } = advance(&mut t, 23) else {
        panic!("expected the final");
    };
    assert_eq!(phase, Phase::Three);
    assert_eq!(qualification.direct, winners);
    assert_eq!(qualification.repechage, vec![runner_up]);
    let final_group = t.group(groups[0]).unwrap();
    assert_eq!(final_group.players.len(), 4);
    assert_eq!(final_group.matches.len(), 3);
}

#[test]
fn five_phase_two_groups_send_the_best_four_winners() {
    let mut t = formed(40, 31);
    play_phase(&mut t, Phase::One, (0, 1, 2));
    let AdvanceOutcome::Advanced { groups, .. } = advance(&mut t, 32) else {
        panic!("expected phase 2");
    };
    assert_eq!(groups.len(), 5);

    play_phase(&mut t, Phase::Two, (0, 1, 2));
    let mut chosen = Vec::new();
    for expected_slots in (1..=4).rev() {
        let ties = pending_cross_group_ties(&t, CAT);
        assert_eq!(ties.len(), 1);
        assert_eq!(ties[0].slots, expected_slots);
        let pick = ties[0].players[0];
        resolve_cross_group_tie_manual(&mut t, CAT, Phase::Two, 0, pick).unwrap();
        chosen.push(pick);
    }
    assert!(pending_cross_group_ties(&t, CAT).is_empty());

    let AdvanceOutcome::Advanced { qualification, .. } = advance(&mut t, 33) else {
        panic!("expected the final");
    };
    assert_eq!(qualification.direct, chosen);
}

/// Plays every phase cleanly from Phase 2 onwards and checks the four-player final.
fn run_to_four_player_final(t: &mut Tournament, phase_two_groups: usize, seed: u64) {
    play_phase(t, Phase::One, (0, 1, 2));
    let AdvanceOutcome::Advanced { groups, qualification, .. } = advance(t, seed) else {
        panic!("expected phase 2");
    };
    assert_eq!(groups.len(), phase_two_groups);
    assert!(qualification.repechage.is_empty());

    play_phase(t, Phase::Two, (0, 1, 2));
    assert!(pending_cross_group_ties(t, CAT).is_empty());
    let AdvanceOutcome::Advanced { phase, groups, qualification } = advance(t, seed + 1) else {
        panic!("expected the final");
    };
    assert_eq!(phase, Phase::Three);
    assert_eq!(qualification.all().count(), 4);
    let final_group = t.group(groups[0]).unwrap();
    assert_eq!(final_group.players.len(), 4);
    assert_eq!(final_group.matches.len(), 3);
    assert!(final_group.matches.iter().all(|m| m.match_type == MatchType::Doubles));

    let leader = roster(t, groups[0])[0];
    play_group(t, groups[0], (0, 1, 2));
    assert_eq!(
        advance(t, seed + 2),
        AdvanceOutcome::CategoryCompleted { champion: leader }
    );
}

#[test]
fn two_phase_two_groups_send_their_top_two() {
    let mut t = formed(16, 41);
    run_to_four_player_final(&mut t, 2, 42);
}

#[test]
fn four_phase_two_groups_send_their_winners() {
    let mut t = formed(32, 51);
    run_to_four_player_final(&mut t, 4, 52);
}

#[test]
fn late_groups_discard_earlier_repechage_decisions() {
    let mut t = formed(20, 61);
    play_phase(&mut t, Phase::One, (0, 1, 2));
    loop {
        let ties = pending_cross_group_ties(&t, CAT);
        let Some(tie) = ties.first() else {
            break;
        };
        assert_eq!(tie.position, 2);
        resolve_cross_group_tie_manual(&mut t, CAT, Phase::One, 2, tie.players[0]).unwrap();
    }
    assert_eq!(t.cross_group_tiebreaks.len(), 2);

    for i in 1..=8 {
        add_player(&mut t, &format!("Late {}", i), CAT, false).unwrap();
    }
    let late = form_groups(&mut t, CAT, &mut SeededRng::from_seed(62)).unwrap();
    assert_eq!(late.len(), 2);
    assert!(t.cross_group_tiebreaks.is_empty());

    for group_id in late {
        play_group(&mut t, group_id, (0, 1, 2));
    }
    let ties = pending_cross_group_ties(&t, CAT);
    assert_eq!(ties.len(), 1);
    assert_eq!(ties[0].slots, 2);
    assert_eq!(ties[0].players.len(), 7);
}
