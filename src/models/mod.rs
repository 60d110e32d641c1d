//! Data structures for the tournament: players, matches, groups, tournament snapshot.

mod game;
mod group;
mod player;
mod tournament;

pub use game::{Match, MatchId, MatchType, ScoreError, SetScore, Side, TieBreakScore};
pub use group::{group_letter, tiebreak_group_name, Group, GroupId, GroupKind, Phase};
pub use player::{Player, PlayerId, PlayerStatus, QualificationType, TiebreakMethod};
pub use tournament::{
    CrossGroupTiebreak, GameConfig, TiebreakId, Tournament, TournamentError, TournamentId,
};
