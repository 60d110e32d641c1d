//! Tournament (aggregate root), GameConfig, CrossGroupTiebreak and TournamentError.

use crate::models::game::{Match, MatchId, ScoreError};
use crate::models::group::{Group, GroupId, Phase};
use crate::models::player::{Player, PlayerId, TiebreakMethod};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during tournament operations. Every refusal leaves the
/// tournament exactly as it was.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Tournament or category is not in a state that allows this action.
    InvalidState,
    EmptyName,
    CategoryNotFound(String),
    DuplicateCategory(String),
    /// A player with this name already exists in the category (case-insensitive).
    DuplicatePlayerName(String),
    PlayerNotFound(PlayerId),
    GroupNotFound(GroupId),
    MatchNotFound(MatchId),
    TiebreakNotFound(Uuid),
    /// First formation of a category needs at least this many waiting players.
    NotEnoughPlayersToStart { required: usize, available: usize },
    /// Not enough waiting players to form even one more group.
    NotEnoughPlayers { required: usize, available: usize },
    /// The three-phase bracket cannot be completed with these players.
    BracketNotViable(String),
    /// Matches of the targeted groups have already been played.
    MatchesAlreadyPlayed,
    /// The category has moved past the phase this action targets.
    PhaseLocked(Phase),
    PhaseIncomplete(Phase),
    CategoryCompleted(String),
    UnresolvedGroupTie { group: String, positions: Vec<usize> },
    UnresolvedCrossGroupTie { phase: Phase, position: usize },
    /// A playoff match for a tie has not been played yet.
    PendingTiebreakMatch,
    /// The players given do not form a tie that is currently open.
    NoSuchTie,
    /// Singles playoffs need exactly two tied players.
    SinglesNeedsTwoPlayers(usize),
    InvalidScore(ScoreError),
    Csv(String),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::EmptyName => write!(f, "Name cannot be empty"),
            TournamentError::CategoryNotFound(c) => write!(f, "Category '{}' not found", c),
            TournamentError::DuplicateCategory(c) => write!(f, "Category '{}' already exists", c),
            TournamentError::DuplicatePlayerName(n) => {
                write!(f, "A player named '{}' already exists in this category", n)
            }
            TournamentError::PlayerNotFound(_) => write!(f, "Player not found"),
            TournamentError::GroupNotFound(_) => write!(f, "Group not found"),
            TournamentError::MatchNotFound(_) => write!(f, "Match not found"),
            TournamentError::TiebreakNotFound(_) => write!(f, "Tiebreak not found"),
            TournamentError::NotEnoughPlayersToStart { required, available } => write!(
                f,
                "Need at least {} players to form the first groups ({} waiting)",
                required, available
            ),
            TournamentError::NotEnoughPlayers { required, available } => write!(
                f,
                "Need at least {} waiting players to form a group ({} waiting)",
                required, available
            ),
            TournamentError::BracketNotViable(reason) => write!(f, "{}", reason),
            TournamentError::MatchesAlreadyPlayed => write!(f, "Matches have already been played"),
            TournamentError::PhaseLocked(p) => write!(f, "The category has already moved past {}", p),
            TournamentError::PhaseIncomplete(p) => write!(f, "Not every match of {} is finished", p),
            TournamentError::CategoryCompleted(c) => write!(f, "Category '{}' is already completed", c),
            TournamentError::UnresolvedGroupTie { group, positions } => {
                let list: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
                write!(f, "Group {} has an unresolved tie at positions {}", group, list.join(", "))
            }
            TournamentError::UnresolvedCrossGroupTie { phase, position } => write!(
                f,
                "Players ranked #{} across the groups of {} are tied for a qualification slot",
                position + 1,
                phase
            ),
            TournamentError::PendingTiebreakMatch => write!(f, "A tiebreak match has not been played yet"),
            TournamentError::NoSuchTie => write!(f, "These players are not in an open tie"),
            TournamentError::SinglesNeedsTwoPlayers(n) => {
                write!(f, "A singles playoff needs exactly 2 tied players ({} tied)", n)
            }
            TournamentError::InvalidScore(e) => write!(f, "Invalid score: {}", e),
            TournamentError::Csv(e) => write!(f, "Could not read player list: {}", e),
        }
    }
}

impl std::error::Error for TournamentError {}

impl From<ScoreError> for TournamentError {
    fn from(e: ScoreError) -> Self {
        TournamentError::InvalidScore(e)
    }
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Unique identifier for a cross-group tiebreak record.
pub type TiebreakId = Uuid;

/// Scoring rules shared by every match of the tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// 1 or 3.
    pub sets_per_match: u32,
    pub games_per_set: u32,
    /// Deciding set is played as a super tie-break.
    pub decisive_set_tie_break: bool,
    pub tie_break_points: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sets_per_match: 1,
            games_per_set: 6,
            decisive_set_tie_break: true,
            tie_break_points: 7,
        }
    }
}

/// A resolved (or pending) tie between players holding the same rank in different groups.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CrossGroupTiebreak {
    pub id: TiebreakId,
    pub category: String,
    pub phase: Phase,
    /// 0-based rank inside each group being compared.
    pub position: usize,
    /// None while a singles playoff is pending.
    pub winner_id: Option<PlayerId>,
    pub method: TiebreakMethod,
    pub tied_player_ids: Vec<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl CrossGroupTiebreak {
    pub fn concerns(&self, category: &str, phase: Phase, position: usize) -> bool {
        self.category == category && self.phase == phase && self.position == position
    }

    pub fn is_pending(&self) -> bool {
        self.winner_id.is_none()
    }
}

/// Full tournament snapshot. Engine operations take it by `&mut` and either apply a
/// complete change or refuse without touching it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Independent brackets, in display order.
    pub categories: Vec<String>,
    pub game_config: GameConfig,
    pub groups: Vec<Group>,
    /// Players not yet placed in a group (status waiting).
    pub waiting_list: Vec<Player>,
    pub completed_categories: Vec<String>,
    pub cross_group_tiebreaks: Vec<CrossGroupTiebreak>,
}

impl Tournament {
    /// Create an empty tournament with default scoring rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            categories: Vec::new(),
            game_config: GameConfig::default(),
            groups: Vec::new(),
            waiting_list: Vec::new(),
            completed_categories: Vec::new(),
            cross_group_tiebreaks: Vec::new(),
        }
    }

    /// Create a tournament with its categories already declared.
    pub fn with_categories<I, S>(name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            ..Self::new(name)
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn require_category(&self, category: &str) -> Result<(), TournamentError> {
        if self.has_category(category) {
            Ok(())
        } else {
            Err(TournamentError::CategoryNotFound(category.to_string()))
        }
    }

    pub fn is_category_completed(&self, category: &str) -> bool {
        self.completed_categories.iter().any(|c| c == category)
    }

    /// Replace the scoring rules (only before any match is finished).
    pub fn set_game_config(&mut self, config: GameConfig) -> Result<(), TournamentError> {
        if config.sets_per_match == 0 || config.sets_per_match % 2 == 0 || config.games_per_set == 0 {
            return Err(TournamentError::InvalidState);
        }
        if self.groups.iter().any(Group::has_finished_match) {
            return Err(TournamentError::MatchesAlreadyPlayed);
        }
        self.game_config = config;
        Ok(())
    }

    /// Regular groups of a category in one phase, in creation order.
    pub fn groups_in<'a>(&'a self, category: &'a str, phase: Phase) -> impl Iterator<Item = &'a Group> + 'a {
        self.groups
            .iter()
            .filter(move |g| g.is_regular() && g.belongs_to(category, phase))
    }

    /// Highest phase with regular groups for this category.
    pub fn current_phase(&self, category: &str) -> Option<Phase> {
        self.groups
            .iter()
            .filter(|g| g.is_regular() && g.category == category)
            .map(|g| g.phase)
            .max()
    }

    /// Waiting players of one category, in enrollment order.
    pub fn waiting_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Player> + 'a {
        self.waiting_list.iter().filter(move |p| p.category == category)
    }

    pub fn group(&self, id: GroupId) -> Result<&Group, TournamentError> {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .ok_or(TournamentError::GroupNotFound(id))
    }

    pub fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, TournamentError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(TournamentError::GroupNotFound(id))
    }

    /// The match and the group holding it.
    pub fn find_match(&self, id: MatchId) -> Result<(&Group, &Match), TournamentError> {
        self.groups
            .iter()
            .find_map(|g| g.find_match(id).map(|m| (g, m)))
            .ok_or(TournamentError::MatchNotFound(id))
    }

    pub fn match_mut(&mut self, id: MatchId) -> Result<&mut Match, TournamentError> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.matches.iter_mut())
            .find(|m| m.id == id)
            .ok_or(TournamentError::MatchNotFound(id))
    }

    /// Cross-group tiebreak records of a category in one phase.
    pub fn cross_tiebreaks_in<'a>(
        &'a self,
        category: &'a str,
        phase: Phase,
    ) -> impl Iterator<Item = &'a CrossGroupTiebreak> + 'a {
        self.cross_group_tiebreaks
            .iter()
            .filter(move |tb| tb.category == category && tb.phase == phase)
    }

    /// Every player copy of the category: waiting list first, then group rosters (ids repeat across phases).
    pub fn known_players_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Player> + 'a {
        self.waiting_in(category).chain(
            self.groups
                .iter()
                .filter(move |g| g.category == category)
                .flat_map(|g| g.players.iter()),
        )
    }
}
