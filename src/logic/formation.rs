//! Group formation: drawing waiting players into groups of four, and the Phase 1 redraw.

use crate::logic::advancement::ensure_phase_open;
use crate::logic::cross_group::remove_playoff_match;
use crate::logic::rng::RandomSource;
use crate::logic::scheduler::schedule_matches;
use crate::logic::validation::{plan_bracket, GROUP_SIZE, MIN_PLAYERS};
use crate::models::{
    group_letter, Group, GroupId, MatchId, Phase, Player, PlayerId, Tournament, TournamentError,
};

/// Form as many Phase 1 groups of four as the category's waiting list allows.
///
/// The first formation of a category needs at least 8 players and a viable bracket plan;
/// later formations (late arrivals during Phase 1) need at least 4. The remainder of the
/// division by four stays on the waiting list. Returns the ids of the new groups.
pub fn form_groups<R: RandomSource>(
    tournament: &mut Tournament,
    category: &str,
    rng: &mut R,
) -> Result<Vec<GroupId>, TournamentError> {
    tournament.require_category(category)?;
    ensure_phase_open(tournament, category, Phase::One)?;

    let existing_groups = tournament.groups_in(category, Phase::One).count();
    let existing_players: usize = tournament
        .groups_in(category, Phase::One)
        .map(|g| g.players.len())
        .sum();
    let waiting: Vec<Player> = tournament.waiting_in(category).cloned().collect();
    let available = waiting.len();

    if existing_groups == 0 {
        if available < MIN_PLAYERS {
            return Err(TournamentError::NotEnoughPlayersToStart {
                required: MIN_PLAYERS,
                available,
            });
        }
    } else if available < GROUP_SIZE {
        return Err(TournamentError::NotEnoughPlayers {
            required: GROUP_SIZE,
            available,
        });
    }

    let num_groups = available / GROUP_SIZE;
    let plan = plan_bracket(existing_players + num_groups * GROUP_SIZE);
    if let Some(reason) = plan.blocking_reason {
        return Err(TournamentError::BracketNotViable(reason));
    }

    let (groups, _) = draw_groups(waiting, num_groups, category, Phase::One, existing_groups, rng);
    let placed: Vec<PlayerId> = groups
        .iter()
        .flat_map(|g| g.players.iter().map(|p| p.id))
        .collect();
    tournament.waiting_list.retain(|p| !placed.contains(&p.id));

    let ids: Vec<GroupId> = groups.iter().map(|g| g.id).collect();
    log::info!(
        "Formed {} group(s) in category {} ({} placed, {} still waiting)",
        groups.len(),
        category,
        placed.len(),
        available - placed.len()
    );
    tournament.groups.extend(groups);

    if existing_groups > 0 {
        // New groups bring new contenders; earlier repechage decisions no longer hold.
        let stale: Vec<Option<MatchId>> = tournament
            .cross_tiebreaks_in(category, Phase::One)
            .map(|tb| tb.match_id)
            .collect();
        if !stale.is_empty() {
            tournament
                .cross_group_tiebreaks
                .retain(|tb| !(tb.category == category && tb.phase == Phase::One));
            for playoff in stale.into_iter().flatten() {
                remove_playoff_match(tournament, playoff);
            }
            log::info!("Category {}: Phase 1 cross-group decisions discarded", category);
        }
    }
    Ok(ids)
}

/// Reshuffle the players of the category's Phase 1 groups into fresh groups.
///
/// Refused once any Phase 1 match has a result. Matches, tie decisions and cross-group
/// tiebreaks of Phase 1 are discarded; letters restart at "A".
pub fn redraw_phase_one<R: RandomSource>(
    tournament: &mut Tournament,
    category: &str,
    rng: &mut R,
) -> Result<Vec<GroupId>, TournamentError> {
    tournament.require_category(category)?;
    ensure_phase_open(tournament, category, Phase::One)?;
    if tournament.current_phase(category).is_none() {
        return Err(TournamentError::InvalidState);
    }
    let played = tournament
        .groups
        .iter()
        .filter(|g| g.belongs_to(category, Phase::One))
        .any(Group::has_finished_match);
    if played {
        return Err(TournamentError::MatchesAlreadyPlayed);
    }

    let players: Vec<Player> = tournament
        .groups_in(category, Phase::One)
        .flat_map(|g| g.players.iter().cloned())
        .collect();
    let num_groups = players.len() / GROUP_SIZE;
    let (groups, _) = draw_groups(players, num_groups, category, Phase::One, 0, rng);

    tournament
        .groups
        .retain(|g| !g.belongs_to(category, Phase::One));
    tournament
        .cross_group_tiebreaks
        .retain(|tb| !(tb.category == category && tb.phase == Phase::One));
    let ids = groups.iter().map(|g| g.id).collect();
    log::info!("Redrew {} Phase 1 group(s) in category {}", groups.len(), category);
    tournament.groups.extend(groups);
    Ok(ids)
}

/// Draw `players` into `num_groups` groups of four for one category and phase.
///
/// Seeds go first and are spread serpentine (A, B, C, C, B, A, ...) so no group gets
/// more than `ceil(seeds / groups)`; shuffled unseeded players fill the remaining slots.
/// Players that do not fit are returned untouched. Letters start at `first_letter`.
pub(crate) fn draw_groups<R: RandomSource>(
    players: Vec<Player>,
    num_groups: usize,
    category: &str,
    phase: Phase,
    first_letter: usize,
    rng: &mut R,
) -> (Vec<Group>, Vec<Player>) {
    if num_groups == 0 {
        return (Vec::new(), players);
    }
    let (mut seeds, mut others): (Vec<Player>, Vec<Player>) = players.into_iter().partition(|p| p.is_seed);
    rng.shuffle(&mut seeds);
    rng.shuffle(&mut others);

    let capacity = num_groups * GROUP_SIZE;
    let mut pool: Vec<Player> = seeds.into_iter().chain(others).collect();
    let leftover = if pool.len() > capacity {
        pool.split_off(capacity)
    } else {
        Vec::new()
    };

    let mut rosters: Vec<Vec<Player>> = vec![Vec::with_capacity(GROUP_SIZE); num_groups];
    let seed_count = pool.iter().take_while(|p| p.is_seed).count();
    let mut pool = pool.into_iter();
    for i in 0..seed_count {
        let lap = i / num_groups;
        let pos = i % num_groups;
        let target = if lap % 2 == 0 { pos } else { num_groups - 1 - pos };
        if let Some(p) = pool.next() {
            rosters[target].push(p.placed());
        }
    }
    for roster in rosters.iter_mut() {
        while roster.len() < GROUP_SIZE {
            match pool.next() {
                Some(p) => roster.push(p.placed()),
                None => break,
            }
        }
    }

    let groups = rosters
        .into_iter()
        .enumerate()
        .map(|(i, roster)| scheduled_group(group_letter(first_letter + i), category, phase, roster))
        .collect();
    (groups, leftover)
}

/// The single Phase 3 group (2 or 4 finalists), in qualification order.
pub(crate) fn final_group(finalists: &[Player], category: &str) -> Group {
    let roster = finalists.iter().map(Player::placed).collect();
    scheduled_group(group_letter(0), category, Phase::Three, roster)
}

fn scheduled_group(name: String, category: &str, phase: Phase, roster: Vec<Player>) -> Group {
    let mut group = Group::new(name, category, phase, roster);
    let ids: Vec<PlayerId> = group.players.iter().map(|p| p.id).collect();
    group.matches = schedule_matches(group.id, &ids);
    group
}
