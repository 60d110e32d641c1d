//! Phase progression: Phase 1 → Phase 2 → Phase 3 → category completed.
//!
//! A category advances only when every match of its current phase is finished and no
//! tie is left open, inside a group or across groups at a qualification cutoff.

use crate::logic::cross_group::{cross_group_ranking, cross_group_requirements, detect_cross_group_tie};
use crate::logic::formation::{draw_groups, final_group};
use crate::logic::ranking::calculate_ranking;
use crate::logic::rng::RandomSource;
use crate::logic::ties::open_group_ties;
use crate::logic::validation::{repechage_size, GROUP_SIZE};
use crate::models::{
    GroupId, Phase, Player, PlayerId, QualificationType, Tournament, TournamentError,
};
use serde::Serialize;

/// Who moves on from a finished phase.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Qualification {
    pub direct: Vec<PlayerId>,
    pub repechage: Vec<PlayerId>,
}

impl Qualification {
    /// Direct qualifiers first, then repechage.
    pub fn all(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.direct.iter().chain(self.repechage.iter()).copied()
    }

    pub fn kind_of(&self, id: PlayerId) -> Option<QualificationType> {
        if self.direct.contains(&id) {
            Some(QualificationType::Direct)
        } else if self.repechage.contains(&id) {
            Some(QualificationType::Repechage)
        } else {
            None
        }
    }
}

/// Answer to "can this category advance now?", with the reason when it cannot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AdvanceCheck {
    pub can_advance: bool,
    pub phase: Option<Phase>,
    pub reason: Option<String>,
}

/// What an advancement produced.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Advanced {
        phase: Phase,
        groups: Vec<GroupId>,
        qualification: Qualification,
    },
    CategoryCompleted {
        champion: PlayerId,
    },
}

/// Refuse changes to a phase the category has already left, or to a completed category.
pub(crate) fn ensure_phase_open(tournament: &Tournament, category: &str, phase: Phase) -> Result<(), TournamentError> {
    if tournament.is_category_completed(category) {
        return Err(TournamentError::CategoryCompleted(category.to_string()));
    }
    match tournament.current_phase(category) {
        Some(current) if current > phase => Err(TournamentError::PhaseLocked(phase)),
        _ => Ok(()),
    }
}

/// Every match of every regular group of the phase is finished.
pub fn is_phase_complete(tournament: &Tournament, category: &str, phase: Phase) -> bool {
    let mut groups = tournament.groups_in(category, phase).peekable();
    groups.peek().is_some() && groups.all(|g| g.is_complete())
}

/// Qualifiers of a phase from its standings and cross-group rankings.
///
/// - Phase 1: top 2 of each group; when they do not fill whole groups of four, the best
///   3rd places complete the last group (repechage).
/// - Phase 2: one or two groups send their top 2; three groups send their winners plus
///   the best 2nd place; four groups send their winners; five or more send the best four
///   winners.
/// - Phase 3: nobody, the category ends.
///
/// Open ties are not checked here; [`advance_phase`] does that first.
pub fn qualifiers(tournament: &Tournament, category: &str, phase: Phase) -> Result<Qualification, TournamentError> {
    let rankings: Vec<Vec<PlayerId>> = tournament
        .groups_in(category, phase)
        .map(|g| calculate_ranking(g).into_iter().map(|e| e.player_id).collect())
        .collect();
    if rankings.is_empty() {
        return Err(TournamentError::InvalidState);
    }
    let top = |n: usize| -> Vec<PlayerId> {
        rankings
            .iter()
            .flat_map(|r| r.iter().take(n).copied())
            .collect()
    };
    let best_across = |position: usize, count: usize| -> Result<Vec<PlayerId>, TournamentError> {
        let ranked = cross_group_ranking(tournament, category, phase, position);
        if ranked.len() < count {
            return Err(TournamentError::BracketNotViable(format!(
                "{} needs {} players ranked #{} across groups but only {} exist",
                phase,
                count,
                position + 1,
                ranked.len()
            )));
        }
        Ok(ranked.iter().take(count).map(|c| c.player_id).collect())
    };

    let qualification = match phase {
        Phase::One => {
            let direct = top(2);
            let repechage = match repechage_size(direct.len()) {
                0 => Vec::new(),
                n => best_across(2, n)?,
            };
            Qualification { direct, repechage }
        }
        Phase::Two => match rankings.len() {
            1 | 2 => Qualification {
                direct: top(2),
                repechage: Vec::new(),
            },
            3 => Qualification {
                direct: top(1),
                repechage: best_across(1, 1)?,
            },
            4 => Qualification {
                direct: top(1),
                repechage: Vec::new(),
            },
            _ => Qualification {
                direct: best_across(0, 4)?,
                repechage: Vec::new(),
            },
        },
        Phase::Three => Qualification::default(),
    };
    Ok(qualification)
}

/// Current phase of the category, if it is ready to advance; otherwise why not.
fn advance_blocker(tournament: &Tournament, category: &str) -> Result<Phase, TournamentError> {
    tournament.require_category(category)?;
    if tournament.is_category_completed(category) {
        return Err(TournamentError::CategoryCompleted(category.to_string()));
    }
    let phase = tournament
        .current_phase(category)
        .ok_or(TournamentError::InvalidState)?;
    if !is_phase_complete(tournament, category, phase) {
        return Err(TournamentError::PhaseIncomplete(phase));
    }
    for group in tournament.groups_in(category, phase) {
        if let Some(tie) = open_group_ties(group).into_iter().next() {
            return Err(TournamentError::UnresolvedGroupTie {
                group: group.name.clone(),
                positions: tie.positions,
            });
        }
    }
    if tournament
        .cross_tiebreaks_in(category, phase)
        .any(|tb| tb.is_pending())
    {
        return Err(TournamentError::PendingTiebreakMatch);
    }
    for req in cross_group_requirements(tournament, category, phase) {
        if detect_cross_group_tie(tournament, category, phase, req.position, req.slots).is_some() {
            return Err(TournamentError::UnresolvedCrossGroupTie {
                phase,
                position: req.position,
            });
        }
    }
    Ok(phase)
}

/// Whether [`advance_phase`] would go through, as a flag plus reason.
pub fn check_advance(tournament: &Tournament, category: &str) -> AdvanceCheck {
    match advance_blocker(tournament, category) {
        Ok(phase) => AdvanceCheck {
            can_advance: true,
            phase: Some(phase),
            reason: None,
        },
        Err(e) => AdvanceCheck {
            can_advance: false,
            phase: tournament.current_phase(category),
            reason: Some(e.to_string()),
        },
    }
}

/// Close the category's current phase and open the next one.
///
/// Non-qualifiers of the closed phase are eliminated there, qualifiers get their
/// qualification badge, and the next phase is drawn: Phase 2 groups of four with seeds
/// spread out, or the single final group. Closing Phase 3 completes the category.
pub fn advance_phase<R: RandomSource>(
    tournament: &mut Tournament,
    category: &str,
    rng: &mut R,
) -> Result<AdvanceOutcome, TournamentError> {
    let phase = advance_blocker(tournament, category)?;

    let Some(next) = phase.next() else {
        let champion = final_leader(tournament, category).ok_or(TournamentError::InvalidState)?;
        tournament.completed_categories.push(category.to_string());
        log::info!("Category {} completed", category);
        return Ok(AdvanceOutcome::CategoryCompleted { champion });
    };

    let qualification = qualifiers(tournament, category, phase)?;
    let carried: Vec<Player> = qualification
        .all()
        .filter_map(|id| {
            tournament
                .groups_in(category, phase)
                .find_map(|g| g.player(id))
                .cloned()
        })
        .collect();

    let new_groups = match next {
        Phase::Three => {
            if carried.len() != 2 && carried.len() != GROUP_SIZE {
                return Err(TournamentError::BracketNotViable(format!(
                    "The final needs 2 or 4 players, {} qualified",
                    carried.len()
                )));
            }
            vec![final_group(&carried, category)]
        }
        _ => {
            let num_groups = carried.len() / GROUP_SIZE;
            let (groups, leftover) = draw_groups(carried, num_groups, category, next, 0, rng);
            if !leftover.is_empty() || groups.is_empty() {
                return Err(TournamentError::BracketNotViable(format!(
                    "{} qualifiers cannot fill groups of four",
                    qualification.all().count()
                )));
            }
            groups
        }
    };

    for group in tournament
        .groups
        .iter_mut()
        .filter(|g| g.is_regular() && g.belongs_to(category, phase))
    {
        for p in group.players.iter_mut() {
            match qualification.kind_of(p.id) {
                Some(kind) => p.qualify(kind),
                None => p.eliminate(phase),
            }
        }
    }

    let ids: Vec<GroupId> = new_groups.iter().map(|g| g.id).collect();
    log::info!(
        "Category {} advanced to {}: {} direct, {} repechage, {} group(s)",
        category,
        next,
        qualification.direct.len(),
        qualification.repechage.len(),
        ids.len()
    );
    tournament.groups.extend(new_groups);
    Ok(AdvanceOutcome::Advanced {
        phase: next,
        groups: ids,
        qualification,
    })
}

fn final_leader(tournament: &Tournament, category: &str) -> Option<PlayerId> {
    let group = tournament.groups_in(category, Phase::Three).next()?;
    calculate_ranking(group).first().map(|e| e.player_id)
}

/// Winner of a completed category.
pub fn champion<'a>(tournament: &'a Tournament, category: &str) -> Option<&'a Player> {
    if !tournament.is_category_completed(category) {
        return None;
    }
    let id = final_leader(tournament, category)?;
    tournament
        .groups
        .iter()
        .filter(|g| g.is_regular() && g.belongs_to(category, Phase::Three))
        .find_map(|g| g.player(id))
}
