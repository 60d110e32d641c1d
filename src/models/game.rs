//! Match, set scores and the side/type tags for 2v2 doubles and 1v1 singles.

use crate::models::group::GroupId;
use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which side of the net.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

/// Doubles round-robin match or one-on-one singles (finals of two, tie playoffs).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    Doubles,
    Singles,
}

/// Points of a tie-break (or of a super tie-break deciding set).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TieBreakScore {
    pub a: u32,
    pub b: u32,
}

/// Result of one set. A super tie-break deciding set is recorded as 0-0 games plus the
/// tie-break points.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SetScore {
    pub games_a: u32,
    pub games_b: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_break: Option<TieBreakScore>,
}

impl SetScore {
    pub fn new(games_a: u32, games_b: u32) -> Self {
        Self {
            games_a,
            games_b,
            tie_break: None,
        }
    }

    pub fn with_tie_break(games_a: u32, games_b: u32, points_a: u32, points_b: u32) -> Self {
        Self {
            games_a,
            games_b,
            tie_break: Some(TieBreakScore {
                a: points_a,
                b: points_b,
            }),
        }
    }

    /// Super tie-break played instead of a deciding set.
    pub fn super_tie_break(points_a: u32, points_b: u32) -> Self {
        Self::with_tie_break(0, 0, points_a, points_b)
    }

    /// Winner by games, falling back to tie-break points when games are level.
    pub fn winner(&self) -> Option<Side> {
        use std::cmp::Ordering::*;
        match self.games_a.cmp(&self.games_b) {
            Greater => Some(Side::A),
            Less => Some(Side::B),
            Equal => {
                let tb = self.tie_break?;
                match tb.a.cmp(&tb.b) {
                    Greater => Some(Side::A),
                    Less => Some(Side::B),
                    Equal => None,
                }
            }
        }
    }
}

/// Why a score was refused.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScoreError {
    NoSets,
    TooManySets { max: u32 },
    /// A set with an impossible game count.
    InvalidSet { set: usize },
    TieBreakMissing { set: usize },
    TieBreakNotAllowed { set: usize },
    InvalidTieBreak { set: usize, target: u32 },
    /// A set was entered after one side had already won the match.
    SetAfterDecision { set: usize },
    Undecided,
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::NoSets => write!(f, "No sets entered"),
            ScoreError::TooManySets { max } => write!(f, "A match has at most {} set(s)", max),
            ScoreError::InvalidSet { set } => write!(f, "Set {} has an invalid game score", set + 1),
            ScoreError::TieBreakMissing { set } => write!(f, "Set {} needs a tie-break score", set + 1),
            ScoreError::TieBreakNotAllowed { set } => {
                write!(f, "Set {} cannot carry a tie-break score", set + 1)
            }
            ScoreError::InvalidTieBreak { set, target } => write!(
                f,
                "Tie-break of set {} must reach {} points with a two point margin",
                set + 1,
                target
            ),
            ScoreError::SetAfterDecision { set } => {
                write!(f, "Set {} was entered after the match was already decided", set + 1)
            }
            ScoreError::Undecided => write!(f, "The sets entered do not decide the match"),
        }
    }
}

impl std::error::Error for ScoreError {}

/// A single match: two sides, two players each for doubles, one each for singles.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub group_id: GroupId,
    pub match_type: MatchType,
    pub team_a: Vec<PlayerId>,
    pub team_b: Vec<PlayerId>,
    pub sets: Vec<SetScore>,
    pub sets_won_a: u32,
    pub sets_won_b: u32,
    pub is_finished: bool,
    /// Display/ordering only.
    pub round: u32,
    /// Tie playoff: never counted in standings.
    pub is_tiebreaker: bool,
}

impl Match {
    pub fn doubles(group_id: GroupId, round: u32, team_a: [PlayerId; 2], team_b: [PlayerId; 2]) -> Self {
        Self::build(group_id, round, MatchType::Doubles, team_a.to_vec(), team_b.to_vec())
    }

    pub fn singles(group_id: GroupId, round: u32, a: PlayerId, b: PlayerId) -> Self {
        Self::build(group_id, round, MatchType::Singles, vec![a], vec![b])
    }

    fn build(
        group_id: GroupId,
        round: u32,
        match_type: MatchType,
        team_a: Vec<PlayerId>,
        team_b: Vec<PlayerId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            match_type,
            team_a,
            team_b,
            sets: Vec::new(),
            sets_won_a: 0,
            sets_won_b: 0,
            is_finished: false,
            round,
            is_tiebreaker: false,
        }
    }

    /// Flag this match as a tie playoff.
    pub fn as_tiebreaker(mut self) -> Self {
        self.is_tiebreaker = true;
        self
    }

    /// Every distinct player on court.
    pub fn participants(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = Vec::with_capacity(4);
        for &id in self.team_a.iter().chain(self.team_b.iter()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.side_of(player_id).is_some()
    }

    pub fn side_of(&self, player_id: PlayerId) -> Option<Side> {
        if self.team_a.contains(&player_id) {
            Some(Side::A)
        } else if self.team_b.contains(&player_id) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn team(&self, side: Side) -> &[PlayerId] {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    /// Winning side of a finished match.
    pub fn winner(&self) -> Option<Side> {
        if !self.is_finished {
            return None;
        }
        use std::cmp::Ordering::*;
        match self.sets_won_a.cmp(&self.sets_won_b) {
            Greater => Some(Side::A),
            Less => Some(Side::B),
            Equal => None,
        }
    }

    /// Games won by each side, tie-break points excluded.
    pub fn games(&self) -> (u32, u32) {
        self.sets
            .iter()
            .fold((0, 0), |(a, b), s| (a + s.games_a, b + s.games_b))
    }

    /// Finished and not a tie playoff.
    pub fn counts_for_standings(&self) -> bool {
        self.is_finished && !self.is_tiebreaker
    }

    /// Store already-validated sets and mark the match finished.
    pub fn finish(&mut self, sets: Vec<SetScore>) {
        self.sets_won_a = sets.iter().filter(|s| s.winner() == Some(Side::A)).count() as u32;
        self.sets_won_b = sets.iter().filter(|s| s.winner() == Some(Side::B)).count() as u32;
        self.sets = sets;
        self.is_finished = true;
    }

    pub fn reopen(&mut self) {
        self.sets.clear();
        self.sets_won_a = 0;
        self.sets_won_b = 0;
        self.is_finished = false;
    }
}
