//! Pre-checks that run before anything is mutated: match scores and bracket viability.

use crate::models::{GameConfig, Phase, ScoreError, SetScore, Side, TieBreakScore};
use serde::Serialize;

/// Smallest field a three-phase bracket can be built from.
pub const MIN_PLAYERS: usize = 8;

/// Players per round-robin group.
pub const GROUP_SIZE: usize = 4;

/// Repechage slots needed to fill the next phase with groups of four, given the number
/// of direct qualifiers: zero when they already fill whole groups, otherwise enough to
/// complete one more group.
pub fn repechage_size(direct: usize) -> usize {
    let remainder = direct % GROUP_SIZE;
    if remainder == 0 {
        0
    } else {
        (direct / GROUP_SIZE + 1) * GROUP_SIZE - direct
    }
}

/// Check a match score against the tournament rules and return the winning side.
pub fn validate_match_score(config: &GameConfig, sets: &[SetScore]) -> Result<Side, ScoreError> {
    if sets.is_empty() {
        return Err(ScoreError::NoSets);
    }
    let max_sets = config.sets_per_match.max(1);
    if sets.len() > max_sets as usize {
        return Err(ScoreError::TooManySets { max: max_sets });
    }
    let to_win = max_sets / 2 + 1;
    let (mut won_a, mut won_b) = (0u32, 0u32);

    for (i, set) in sets.iter().enumerate() {
        if won_a == to_win || won_b == to_win {
            return Err(ScoreError::SetAfterDecision { set: i });
        }
        let deciding = max_sets > 1 && i as u32 == max_sets - 1;
        let winner = if deciding && config.decisive_set_tie_break {
            validate_super_tie_break(config, set, i)?
        } else {
            validate_set(config, set, i)?
        };
        match winner {
            Side::A => won_a += 1,
            Side::B => won_b += 1,
        }
    }

    if won_a == to_win {
        Ok(Side::A)
    } else if won_b == to_win {
        Ok(Side::B)
    } else {
        Err(ScoreError::Undecided)
    }
}

/// Regular set: `g`-x with a two game margin, `g+1`-`g-1`, or `g+1`-`g` with a tie-break.
fn validate_set(config: &GameConfig, set: &SetScore, index: usize) -> Result<Side, ScoreError> {
    let g = config.games_per_set;
    let (hi, lo) = (set.games_a.max(set.games_b), set.games_a.min(set.games_b));
    let winner = if set.games_a > set.games_b { Side::A } else { Side::B };

    if hi == g + 1 && lo == g {
        let tb = set.tie_break.ok_or(ScoreError::TieBreakMissing { set: index })?;
        check_tie_break(tb, config.tie_break_points, index)?;
        if tie_break_winner(tb) != winner {
            return Err(ScoreError::InvalidTieBreak {
                set: index,
                target: config.tie_break_points,
            });
        }
        return Ok(winner);
    }

    let decided = (hi == g && lo + 2 <= g) || (hi == g + 1 && lo + 1 == g);
    if !decided {
        return Err(ScoreError::InvalidSet { set: index });
    }
    if set.tie_break.is_some() {
        return Err(ScoreError::TieBreakNotAllowed { set: index });
    }
    Ok(winner)
}

/// Deciding set played as a super tie-break: 0-0 games plus the tie-break points.
fn validate_super_tie_break(config: &GameConfig, set: &SetScore, index: usize) -> Result<Side, ScoreError> {
    if set.games_a != 0 || set.games_b != 0 {
        return Err(ScoreError::InvalidSet { set: index });
    }
    let tb = set.tie_break.ok_or(ScoreError::TieBreakMissing { set: index })?;
    check_tie_break(tb, config.tie_break_points, index)?;
    Ok(tie_break_winner(tb))
}

fn check_tie_break(tb: TieBreakScore, target: u32, index: usize) -> Result<(), ScoreError> {
    let (hi, lo) = (tb.a.max(tb.b), tb.a.min(tb.b));
    let valid = hi >= target && hi - lo >= 2 && (hi == target || hi - lo == 2);
    if valid {
        Ok(())
    } else {
        Err(ScoreError::InvalidTieBreak { set: index, target })
    }
}

fn tie_break_winner(tb: TieBreakScore) -> Side {
    if tb.a > tb.b {
        Side::A
    } else {
        Side::B
    }
}

/// One phase of a planned bracket.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PhasePlanStep {
    pub phase: Phase,
    pub groups: usize,
    pub players: usize,
    /// Qualifiers by group rank.
    pub direct: usize,
    /// Qualifiers picked by comparing players across groups.
    pub repechage: usize,
    pub rule: String,
}

/// Full bracket plan computed from a player count alone.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BracketPlan {
    pub player_count: usize,
    /// Players placed in Phase 1 groups.
    pub placed: usize,
    /// Players left on the waiting list.
    pub leftover: usize,
    pub steps: Vec<PhasePlanStep>,
    /// Informational remark for the operator (leftover players).
    pub notice: Option<String>,
    /// Why the bracket cannot be run, if it cannot.
    pub blocking_reason: Option<String>,
}

impl BracketPlan {
    pub fn is_viable(&self) -> bool {
        self.blocking_reason.is_none()
    }

    fn blocked(player_count: usize, reason: String) -> Self {
        Self {
            player_count,
            placed: 0,
            leftover: player_count,
            steps: Vec::new(),
            notice: None,
            blocking_reason: Some(reason),
        }
    }
}

/// Work out whether `player_count` players can complete all three phases, and how.
pub fn plan_bracket(player_count: usize) -> BracketPlan {
    if player_count < MIN_PLAYERS {
        return BracketPlan::blocked(
            player_count,
            format!(
                "At least {} players are needed for a three-phase bracket ({} enrolled)",
                MIN_PLAYERS, player_count
            ),
        );
    }

    let groups_one = player_count / GROUP_SIZE;
    let placed = groups_one * GROUP_SIZE;
    let leftover = player_count - placed;
    let direct_one = groups_one * 2;
    let repechage_one = repechage_size(direct_one);
    if repechage_one > groups_one {
        return BracketPlan::blocked(
            player_count,
            format!(
                "Phase 1 needs {} repechage players but only {} groups provide a 3rd place",
                repechage_one, groups_one
            ),
        );
    }
    let rule_one = if repechage_one > 0 {
        format!("Top 2 of each group + best {} 3rd places", repechage_one)
    } else {
        "Top 2 of each group".to_string()
    };

    let players_two = direct_one + repechage_one;
    let groups_two = players_two / GROUP_SIZE;
    let (direct_two, repechage_two, rule_two) = match groups_two {
        0..=2 => (groups_two * 2, 0, "Top 2 of each group".to_string()),
        3 => (3, 1, "Group winners + best 2nd place".to_string()),
        4 => (4, 0, "Group winners".to_string()),
        n => (4, 0, format!("Best 4 of the {} group winners", n)),
    };
    let finalists = direct_two + repechage_two;

    let notice = (leftover > 0).then(|| {
        format!(
            "{} player(s) will stay on the waiting list: groups are formed in fours",
            leftover
        )
    });

    BracketPlan {
        player_count,
        placed,
        leftover,
        steps: vec![
            PhasePlanStep {
                phase: Phase::One,
                groups: groups_one,
                players: placed,
                direct: direct_one,
                repechage: repechage_one,
                rule: rule_one,
            },
            PhasePlanStep {
                phase: Phase::Two,
                groups: groups_two,
                players: players_two,
                direct: direct_two,
                repechage: repechage_two,
                rule: rule_two,
            },
            PhasePlanStep {
                phase: Phase::Three,
                groups: 1,
                players: finalists,
                direct: 0,
                repechage: 0,
                rule: "Single final group: the top player is champion".to_string(),
            },
        ],
        notice,
        blocking_reason: None,
    }
}
